//! Multipart form reading shared by the upload endpoints.

use actix_multipart::Multipart;
use futures_util::StreamExt;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::intake::UploadedFile;

/// Limits applied while reading a multipart body.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    /// Total bytes across every file part.
    pub max_total_bytes: usize,
    pub max_files: usize,
}

/// Read every file part named one of `field_names` into memory.
///
/// Parts without a filename and parts with other names are drained and
/// ignored.
pub async fn read_files(
    payload: &mut Multipart,
    field_names: &[&str],
    limits: UploadLimits,
) -> AppResult<Vec<UploadedFile>> {
    let mut files = Vec::new();
    let mut total: usize = 0;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;

        let accepted_name = field.name().is_some_and(|name| field_names.contains(&name));
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let Some(filename) = filename.filter(|_| accepted_name) else {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
            }
            continue;
        };

        if files.len() >= limits.max_files {
            return Err(AppError::InvalidInput(format!(
                "Too many files: at most {} per request",
                limits.max_files
            )));
        }

        let content_type = field.content_type().map(|m| m.essence_str().to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
            total += chunk.len();
            if total > limits.max_total_bytes {
                return Err(AppError::PayloadTooLarge(format!(
                    "Upload exceeds {} bytes",
                    limits.max_total_bytes
                )));
            }
            data.extend_from_slice(&chunk);
        }

        debug!("Received '{}' ({} bytes)", filename, data.len());
        files.push(UploadedFile {
            filename,
            content_type,
            data,
        });
    }

    Ok(files)
}
