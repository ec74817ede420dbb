//! Report aggregation across a processed batch.

use super::compliance::ComplianceIssue;
use super::extraction::{ExtractionOutcome, text_confidence};
use crate::models::{ReportAggregate, Severity};

/// Mean issue confidence used when no issues were found.
pub const NO_ISSUE_CONFIDENCE: f64 = 0.85;

/// Text confidence used when no document was analyzed.
pub const NO_TEXT_CONFIDENCE: f64 = 0.6;

/// One stored document and its extraction outcome.
#[derive(Debug, Clone, Copy)]
pub struct ProcessedDocument<'a> {
    pub filename: &'a str,
    pub outcome: &'a ExtractionOutcome,
}

/// Derive the report's name, total, confidence, and summary.
///
/// `fallback_name` is used when the batch stored no document at all.
pub fn aggregate_report(
    documents: &[ProcessedDocument<'_>],
    issues: &[ComplianceIssue],
    fallback_name: &str,
) -> ReportAggregate {
    let analyzed: Vec<&ProcessedDocument<'_>> =
        documents.iter().filter(|d| d.outcome.is_analyzed()).collect();

    ReportAggregate {
        name: report_name(documents, &analyzed, fallback_name),
        total_amount: total_amount(documents),
        confidence: report_confidence(&analyzed, issues),
        summary: summary(documents.len(), analyzed.len(), issues),
    }
}

fn report_name(
    documents: &[ProcessedDocument<'_>],
    analyzed: &[&ProcessedDocument<'_>],
    fallback_name: &str,
) -> String {
    let base = match analyzed.first().copied().or(documents.first()) {
        Some(first) => first
            .outcome
            .document()
            .and_then(|d| d.organization.clone().or_else(|| d.document_type.clone()))
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| first.filename.to_string()),
        None => fallback_name.to_string(),
    };

    if documents.len() > 1 {
        format!("{} (+{} more)", base, documents.len() - 1)
    } else {
        base
    }
}

fn total_amount(documents: &[ProcessedDocument<'_>]) -> Option<f64> {
    let amounts: Vec<f64> = documents
        .iter()
        .filter_map(|d| d.outcome.document().and_then(|doc| doc.total_amount))
        .collect();

    if amounts.is_empty() {
        None
    } else {
        Some(amounts.iter().sum())
    }
}

/// 0.6 x mean text confidence + 0.4 x mean issue confidence.
fn report_confidence(analyzed: &[&ProcessedDocument<'_>], issues: &[ComplianceIssue]) -> f64 {
    let text = mean(analyzed.iter().map(|d| text_confidence(d.outcome.text())))
        .unwrap_or(NO_TEXT_CONFIDENCE);
    let issue = mean(issues.iter().map(|i| i.confidence)).unwrap_or(NO_ISSUE_CONFIDENCE);

    (0.6 * text + 0.4 * issue).clamp(0.0, 1.0)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn summary(total: usize, analyzed: usize, issues: &[ComplianceIssue]) -> String {
    let count = |severity: Severity| issues.iter().filter(|i| i.severity == severity).count();

    format!(
        "Analyzed {} of {} document(s): {} critical, {} warning, {} info issue(s) found.",
        analyzed,
        total,
        count(Severity::Critical),
        count(Severity::Warning),
        count(Severity::Info)
    )
}
