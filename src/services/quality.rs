//! Image quality heuristics and document-type guessing.
//!
//! Plain pixel statistics over an RGBA buffer: brightness, contrast,
//! sharpness, colour spread, and a noise/edge-density classifier that tells
//! scanned pages from digitally produced ones.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const SHARPNESS_STRIDE: u32 = 10;
const EDGE_THRESHOLD: f64 = 20.0;
const GRAYSCALE_SPREAD: f64 = 30.0;

const ENHANCE_TARGET_BRIGHTNESS: f64 = 180.0;
const ENHANCE_MIDPOINT: f64 = 128.0;

const CLASSIFY_STRIDE: usize = 4;
const CLASSIFY_OFFSET: usize = 16;
const CLASSIFY_EDGE_DELTA: f64 = 30.0;

/// Raw image statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub width: u32,
    pub height: u32,
    /// Mean per-pixel (R+G+B)/3, in [0, 255].
    pub brightness: f64,
    /// Spread between the darkest and brightest pixel, in [0, 255].
    pub contrast: f64,
    /// Mean edge delta over sampled pixels, 0 when no edges qualify.
    pub sharpness: f64,
    pub is_grayscale: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Scanned,
    Digital,
    Mixed,
}

/// Scanned/digital/mixed guess with its evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypeGuess {
    pub kind: DocumentKind,
    /// In [0, 1].
    pub confidence: f64,
    pub reason: String,
    pub noise_level: f64,
    pub edge_density: f64,
}

impl DocumentTypeGuess {
    /// Safe default when the image cannot be decoded.
    pub fn undecodable() -> Self {
        Self {
            kind: DocumentKind::Digital,
            confidence: 0.3,
            reason: "Image could not be decoded; assuming a digital document".to_string(),
            noise_level: 0.0,
            edge_density: 0.0,
        }
    }
}

/// Full quality assessment of one upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    /// Null when the image could not be decoded.
    pub metrics: Option<QualityMetrics>,
    pub tier: Option<QualityTier>,
    /// Weighted score in [0, 1].
    pub score: Option<f64>,
    /// Confidence percentage in [0, 100].
    pub confidence: Option<u8>,
    pub document_type: DocumentTypeGuess,
}

#[derive(Debug, thiserror::Error)]
pub enum QualityError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

fn pixel_brightness(p: &[u8]) -> f64 {
    (p[0] as f64 + p[1] as f64 + p[2] as f64) / 3.0
}

/// Compute brightness, contrast, sharpness, and the grayscale flag.
pub fn compute_metrics(image: &RgbaImage) -> QualityMetrics {
    let (width, height) = image.dimensions();
    let raw = image.as_raw();

    let mut sum = 0.0;
    let mut spread_sum = 0.0;
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    let mut count = 0usize;

    for p in raw.chunks_exact(4) {
        let b = pixel_brightness(p);
        sum += b;
        min = min.min(b);
        max = max.max(b);
        let (r, g, bl) = (p[0] as i32, p[1] as i32, p[2] as i32);
        spread_sum += ((r - g).abs() + (g - bl).abs() + (bl - r).abs()) as f64;
        count += 1;
    }

    if count == 0 {
        return QualityMetrics {
            width,
            height,
            brightness: 0.0,
            contrast: 0.0,
            sharpness: 0.0,
            is_grayscale: true,
        };
    }

    QualityMetrics {
        width,
        height,
        brightness: sum / count as f64,
        contrast: max - min,
        sharpness: sharpness(image),
        is_grayscale: spread_sum / (count as f64) < GRAYSCALE_SPREAD,
    }
}

/// Mean delta against the left and top neighbours on a sampled grid,
/// counting only deltas above the edge threshold.
fn sharpness(image: &RgbaImage) -> f64 {
    let (width, height) = image.dimensions();
    let at = |x: u32, y: u32| pixel_brightness(&image.get_pixel(x, y).0);

    let mut total = 0.0;
    let mut samples = 0usize;

    for y in (1..height).step_by(SHARPNESS_STRIDE as usize) {
        for x in (1..width).step_by(SHARPNESS_STRIDE as usize) {
            let here = at(x, y);
            for delta in [(here - at(x - 1, y)).abs(), (here - at(x, y - 1)).abs()] {
                if delta > EDGE_THRESHOLD {
                    total += delta;
                    samples += 1;
                }
            }
        }
    }

    if samples == 0 {
        0.0
    } else {
        total / samples as f64
    }
}

fn brightness_score(brightness: f64) -> f64 {
    if (100.0..=200.0).contains(&brightness) {
        1.0
    } else if (60.0..=230.0).contains(&brightness) {
        0.6
    } else {
        0.2
    }
}

fn contrast_score(contrast: f64) -> f64 {
    if contrast > 80.0 {
        1.0
    } else if contrast > 40.0 {
        0.6
    } else {
        0.2
    }
}

fn sharpness_score(sharpness: f64) -> f64 {
    if sharpness > 40.0 {
        1.0
    } else if sharpness > 25.0 {
        0.6
    } else {
        0.2
    }
}

/// Weighted quality score in [0, 1].
pub fn quality_score(metrics: &QualityMetrics) -> f64 {
    0.3 * brightness_score(metrics.brightness)
        + 0.4 * contrast_score(metrics.contrast)
        + 0.3 * sharpness_score(metrics.sharpness)
}

pub fn quality_tier(score: f64) -> QualityTier {
    if score >= 0.8 {
        QualityTier::Excellent
    } else if score >= 0.6 {
        QualityTier::Good
    } else if score >= 0.4 {
        QualityTier::Fair
    } else {
        QualityTier::Poor
    }
}

/// Confidence percentage blending the score with normalized metrics.
pub fn confidence_percent(metrics: &QualityMetrics, score: f64) -> u8 {
    let norm_brightness = (1.0 - (metrics.brightness - 150.0).abs() / 150.0).max(0.0);
    let norm_contrast = (metrics.contrast / 150.0).min(1.0);
    let norm_sharpness = (metrics.sharpness / 60.0).min(1.0);

    let value = 100.0
        * (0.5 * score + 0.2 * norm_brightness + 0.2 * norm_contrast + 0.1 * norm_sharpness);
    value.round().clamp(0.0, 100.0) as u8
}

/// Shift brightness toward a fixed target and stretch contrast around the midpoint.
pub fn enhance(image: &RgbaImage) -> RgbaImage {
    let metrics = compute_metrics(image);
    let shift = ENHANCE_TARGET_BRIGHTNESS - metrics.brightness;
    let factor = if metrics.contrast < 100.0 { 1.2 } else { 1.1 };

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for channel in pixel.0.iter_mut().take(3) {
            let shifted = *channel as f64 + shift;
            let stretched = (shifted - ENHANCE_MIDPOINT) * factor + ENHANCE_MIDPOINT;
            *channel = stretched.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Guess whether a page was scanned or produced digitally.
///
/// Samples every fourth pixel, comparing it with the pixel sixteen positions
/// back (noise) and sixteen ahead (edges). Both totals are divided by the
/// full pixel count, not the number of samples.
pub fn classify_document_type(image: &RgbaImage) -> DocumentTypeGuess {
    let raw = image.as_raw();
    let pixel_count = raw.len() / 4;
    let brightness_at = |i: usize| pixel_brightness(&raw[i * 4..i * 4 + 3]);

    if pixel_count == 0 {
        return DocumentTypeGuess::undecodable();
    }

    let mut noise_total = 0.0;
    let mut edges = 0usize;

    for i in (0..pixel_count).step_by(CLASSIFY_STRIDE) {
        let here = brightness_at(i);
        if i >= CLASSIFY_OFFSET {
            noise_total += (here - brightness_at(i - CLASSIFY_OFFSET)).abs();
        }
        if i + CLASSIFY_OFFSET < pixel_count
            && (here - brightness_at(i + CLASSIFY_OFFSET)).abs() > CLASSIFY_EDGE_DELTA
        {
            edges += 1;
        }
    }

    let noise_level = noise_total / pixel_count as f64;
    let edge_density = edges as f64 / pixel_count as f64;

    let (kind, confidence, reason) = if noise_level > 25.0 && edge_density > 0.15 {
        (
            DocumentKind::Scanned,
            (0.6 + (noise_level - 25.0) / 100.0 + (edge_density - 0.15)).min(0.95),
            format!(
                "High noise ({:.1}) and edge density ({:.2}) typical of a scan or photo",
                noise_level, edge_density
            ),
        )
    } else if noise_level < 15.0 && edge_density < 0.08 {
        (
            DocumentKind::Digital,
            (0.6 + (15.0 - noise_level) / 50.0 + (0.08 - edge_density) * 2.0).min(0.95),
            format!(
                "Low noise ({:.1}) and edge density ({:.2}) typical of a digital document",
                noise_level, edge_density
            ),
        )
    } else {
        (
            DocumentKind::Mixed,
            0.5,
            format!(
                "Noise ({:.1}) and edge density ({:.2}) between scanned and digital",
                noise_level, edge_density
            ),
        )
    };

    DocumentTypeGuess {
        kind,
        confidence,
        reason,
        noise_level,
        edge_density,
    }
}

/// Full assessment of an already decoded image.
pub fn assess(image: &RgbaImage) -> QualityReport {
    let metrics = compute_metrics(image);
    let score = quality_score(&metrics);
    QualityReport {
        tier: Some(quality_tier(score)),
        score: Some(score),
        confidence: Some(confidence_percent(&metrics, score)),
        document_type: classify_document_type(image),
        metrics: Some(metrics),
    }
}

/// Decode and assess raw upload bytes.
///
/// Undecodable input yields null metrics and the safe digital guess.
pub fn assess_bytes(bytes: &[u8]) -> QualityReport {
    match decode(bytes) {
        Ok(image) => assess(&image),
        Err(_) => QualityReport {
            metrics: None,
            tier: None,
            score: None,
            confidence: None,
            document_type: DocumentTypeGuess::undecodable(),
        },
    }
}

pub fn decode(bytes: &[u8]) -> Result<RgbaImage, QualityError> {
    image::load_from_memory(bytes)
        .map(|image| image.to_rgba8())
        .map_err(|e| QualityError::Decode(e.to_string()))
}

/// Decode, enhance, and re-encode as PNG.
pub fn enhance_bytes(bytes: &[u8]) -> Result<Vec<u8>, QualityError> {
    let enhanced = enhance(&decode(bytes)?);
    let mut out = Cursor::new(Vec::new());
    enhanced
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| QualityError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}
