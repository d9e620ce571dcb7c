use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ticket_audit_core::TicketId;

use crate::classifier::{ErrorClassification, ProviderFailure};

/// Quality assessment returned by the analysis service for one ticket.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,

    /// Whether a root-cause analysis was found in the ticket history.
    #[serde(default, alias = "rcaDetected")]
    pub rca_detected: bool,
}

impl AnalysisReport {
    /// Parse the raw text a model produced.
    ///
    /// Models often wrap JSON in a Markdown code fence; the fence is stripped
    /// before parsing. Empty or unparseable output is a (recoverable) failure.
    pub fn from_model_output(text: &str) -> Result<Self, ProviderFailure> {
        let body = strip_code_fence(text.trim());
        if body.is_empty() {
            return Err(ProviderFailure::message("analysis returned an empty response"));
        }

        let report: AnalysisReport = serde_json::from_str(body).map_err(|e| {
            ProviderFailure::message(format!("analysis response was not valid JSON: {e}"))
        })?;

        if report.is_empty() {
            return Err(ProviderFailure::message("analysis response contained no assessment"));
        }
        Ok(report)
    }

    /// True when the report carries no assessment at all.
    pub fn is_empty(&self) -> bool {
        self.summary.trim().is_empty() && self.strengths.is_empty() && self.weaknesses.is_empty()
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Why an item has no real analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub classification: ErrorClassification,
    pub reason: String,
}

/// Outcome recorded for one ticket in a batch.
///
/// A result with `error` set is synthetic: it stands in for an analysis that
/// failed and its assessment fields are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub work_item_id: TicketId,
    pub model_id: String,
    pub score: f64,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub rca_detected: bool,
    pub error: Option<AnalysisFailure>,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn from_report(
        work_item_id: TicketId,
        model_id: impl Into<String>,
        report: AnalysisReport,
    ) -> Self {
        Self {
            work_item_id,
            model_id: model_id.into(),
            score: report.score,
            summary: report.summary,
            strengths: report.strengths,
            weaknesses: report.weaknesses,
            rca_detected: report.rca_detected,
            error: None,
            analyzed_at: Utc::now(),
        }
    }

    /// Synthetic result standing in for a failed analysis.
    pub fn failed(
        work_item_id: TicketId,
        model_id: impl Into<String>,
        classification: ErrorClassification,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            work_item_id,
            model_id: model_id.into(),
            score: 0.0,
            summary: String::new(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            rca_detected: false,
            error: Some(AnalysisFailure {
                classification,
                reason: reason.into(),
            }),
            analyzed_at: Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    pub fn classification(&self) -> Option<ErrorClassification> {
        self.error.as_ref().map(|e| e.classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::FatalReason;

    #[test]
    fn parses_fenced_camel_case_output() {
        let text = "```json\n{\"score\": 82, \"summary\": \"Solid handling\", \"strengths\": [\"fast reply\"], \"weaknesses\": [], \"rcaDetected\": true}\n```";
        let report = AnalysisReport::from_model_output(text).unwrap();
        assert_eq!(report.score, 82.0);
        assert_eq!(report.strengths, vec!["fast reply".to_string()]);
        assert!(report.rca_detected);
    }

    #[test]
    fn parses_bare_json() {
        let report =
            AnalysisReport::from_model_output(r#"{"summary":"ok","rca_detected":false}"#).unwrap();
        assert_eq!(report.summary, "ok");
        assert!(!report.rca_detected);
    }

    #[test]
    fn empty_and_garbled_output_are_recoverable_failures() {
        for text in ["", "   ", "```json\n```", "not json", "{}"] {
            let failure = AnalysisReport::from_model_output(text).unwrap_err();
            assert_eq!(
                failure.classify(),
                ErrorClassification::Recoverable,
                "input {text:?} gave {failure}"
            );
        }
    }

    #[test]
    fn synthetic_result_carries_reason() {
        let id: TicketId = "7".parse().unwrap();
        let result = AnalysisResult::failed(
            id.clone(),
            "m",
            ErrorClassification::Fatal(FatalReason::RateLimited),
            "quota exceeded",
        );
        assert!(result.is_failure());
        assert_eq!(result.work_item_id, id);
        assert_eq!(
            result.classification(),
            Some(ErrorClassification::Fatal(FatalReason::RateLimited))
        );
        assert!(result.summary.is_empty());
    }
}
