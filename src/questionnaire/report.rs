use super::fields::{FieldName, FormKind};
use serde::{Deserialize, Serialize};

/// Whether a failing check prevents submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Blocking,
    Advisory,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Blocking => "Error",
            Self::Advisory => "Warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Failed,
    /// Not applicable for this snapshot (e.g. empty parent category).
    Skipped,
    /// Advisory condition met; never blocks.
    Warning,
}

/// Outcome of one catalogue check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub rule: String,
    pub status: CheckStatus,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.status != CheckStatus::Failed
    }

    pub fn is_blocking_failure(&self) -> bool {
        self.status == CheckStatus::Failed && self.severity == Severity::Blocking
    }
}

/// Ordered results of one validation pass, in catalogue order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub form: FormKind,
    pub results: Vec<CheckResult>,
}

impl ValidationReport {
    pub fn new(form: FormKind) -> Self {
        Self {
            form,
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    pub fn extend(&mut self, other: ValidationReport) {
        self.results.extend(other.results);
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results
            .iter()
            .filter(|result| result.is_blocking_failure())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &CheckResult> {
        self.results
            .iter()
            .filter(|result| result.status == CheckStatus::Warning)
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn blocks_submission(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Field that should receive focus after a blocked submission.
    pub fn first_failing_field(&self) -> Option<FieldName> {
        self.failures().find_map(|result| result.field)
    }

    /// Blocking message attached to `field`, if any.
    pub fn error_for(&self, field: FieldName) -> Option<&str> {
        self.failures()
            .find(|result| result.field == Some(field))
            .and_then(|result| result.message.as_deref())
    }

    pub fn summary(&self) -> String {
        match self.failure_count() {
            0 => match self.warnings().count() {
                0 => "all checks passed".to_string(),
                warnings => format!("all checks passed with {warnings} warning(s)"),
            },
            failures => format!("There are {failures} error(s) in the form"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(rule: &str, status: CheckStatus, severity: Severity, field: FieldName) -> CheckResult {
        CheckResult {
            rule: rule.to_string(),
            status,
            severity,
            field: Some(field),
            message: Some(format!("{rule} message")),
        }
    }

    #[test]
    fn summary_counts_blocking_failures_only() {
        let mut report = ValidationReport::new(FormKind::OriginatedTraffic);
        report.push(result(
            "calls_without_minutes",
            CheckStatus::Warning,
            Severity::Advisory,
            FieldName::VoiceTotalMinutes,
        ));
        assert!(!report.blocks_submission());
        assert_eq!(report.summary(), "all checks passed with 1 warning(s)");

        report.push(result(
            "data_2g_sessions_need_volume",
            CheckStatus::Failed,
            Severity::Blocking,
            FieldName::Data2gMegabytes,
        ));
        assert!(report.blocks_submission());
        assert_eq!(report.summary(), "There are 1 error(s) in the form");
        assert_eq!(report.first_failing_field(), Some(FieldName::Data2gMegabytes));
        assert_eq!(
            report.error_for(FieldName::Data2gMegabytes),
            Some("data_2g_sessions_need_volume message")
        );
    }

    #[test]
    fn skipped_counts_as_passed() {
        let skipped = result(
            "broadband_3g_devices",
            CheckStatus::Skipped,
            Severity::Blocking,
            FieldName::Usb3gUsers,
        );
        assert!(skipped.passed());
        assert!(!skipped.is_blocking_failure());
    }
}
