use super::aggregation::{DerivedOutput, DerivedTotal};
use super::debounce::{PendingRecompute, RecomputeScheduler};
use super::engine::{ValidationEngine, NEGATIVE_MESSAGE, NEGATIVE_RULE};
use super::fields::{FieldKind, FieldName, FormKind};
use super::report::{CheckResult, ValidationReport};
use super::snapshot::{is_negative_input, sanitize_fractional, FieldSnapshot, SnapshotParse};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldState {
    Untouched,
    Valid,
    Invalid,
}

/// Decoration the rendering layer should apply to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldStatus {
    pub state: FieldState,
    #[serde(skip)]
    rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

static UNTOUCHED: FieldStatus = FieldStatus {
    state: FieldState::Untouched,
    rule: None,
    message: None,
};

impl FieldStatus {
    fn valid() -> Self {
        Self {
            state: FieldState::Valid,
            rule: None,
            message: None,
        }
    }

    fn invalid(rule: &str, message: Option<String>) -> Self {
        Self {
            state: FieldState::Invalid,
            rule: Some(rule.to_string()),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field '{field}' is not part of the {form} form")]
pub struct FieldNotInForm {
    pub field: FieldName,
    pub form: FormKind,
}

/// Result of applying one edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputOutcome {
    pub field: FieldName,
    /// Value actually stored after sanitizing and clamping.
    pub stored: String,
    pub clamped: bool,
    pub pending: PendingRecompute,
}

/// Recomputed totals and coherence warnings for live display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveUpdate {
    pub totals: Vec<DerivedTotal>,
    pub warnings: Vec<CheckResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SubmissionOutcome {
    Accepted {
        report: ValidationReport,
    },
    Blocked {
        report: ValidationReport,
        focus: Option<FieldName>,
        notice: String,
    },
}

impl SubmissionOutcome {
    pub fn report(&self) -> &ValidationReport {
        match self {
            SubmissionOutcome::Accepted { report } | SubmissionOutcome::Blocked { report, .. } => {
                report
            }
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionOutcome::Accepted { .. })
    }

    /// Blocked when any blocking check failed, focusing the first failing field.
    pub fn from_report(report: ValidationReport) -> Self {
        if report.blocks_submission() {
            let notice = report.summary();
            info!(
                form = %report.form,
                failures = report.failure_count(),
                "submission blocked"
            );
            SubmissionOutcome::Blocked {
                focus: report.first_failing_field(),
                report,
                notice,
            }
        } else {
            SubmissionOutcome::Accepted { report }
        }
    }
}

/// Per-form session deciding when checks run and whether submission proceeds.
#[derive(Debug, Clone)]
pub struct ValidationOrchestrator {
    engine: Arc<ValidationEngine>,
    snapshot: FieldSnapshot,
    statuses: BTreeMap<FieldName, FieldStatus>,
    /// Fields holding a clamped negative input until they are edited again.
    clamped: BTreeSet<FieldName>,
    scheduler: RecomputeScheduler,
}

impl ValidationOrchestrator {
    pub fn new(engine: Arc<ValidationEngine>, scheduler: RecomputeScheduler) -> Self {
        Self {
            engine,
            snapshot: FieldSnapshot::new(),
            statuses: BTreeMap::new(),
            clamped: BTreeSet::new(),
            scheduler,
        }
    }

    /// Start from previously entered values; negative inputs are clamped and flagged.
    pub fn with_snapshot(mut self, mut snapshot: FieldSnapshot) -> Self {
        let clamped = snapshot.clamp_negatives();
        self.snapshot = snapshot;
        self.flag_negative(clamped);
        self
    }

    /// Start from a parsed payload or restored draft, keeping its clamp flags.
    pub fn with_parsed(self, parsed: SnapshotParse) -> Self {
        let SnapshotParse {
            snapshot, clamped, ..
        } = parsed;
        let mut session = self.with_snapshot(snapshot);
        session.flag_negative(clamped);
        session
    }

    pub fn form(&self) -> FormKind {
        self.engine.form()
    }

    pub fn snapshot(&self) -> &FieldSnapshot {
        &self.snapshot
    }

    pub fn status(&self, field: FieldName) -> &FieldStatus {
        self.statuses.get(&field).unwrap_or(&UNTOUCHED)
    }

    pub fn invalid_fields(&self) -> Vec<FieldName> {
        self.statuses
            .iter()
            .filter(|(_, status)| status.state == FieldState::Invalid)
            .map(|(field, _)| *field)
            .collect()
    }

    pub fn pending(&self) -> Option<PendingRecompute> {
        self.scheduler.pending()
    }

    /// Store an edited value and schedule a recomputation.
    pub fn on_input(
        &mut self,
        field: FieldName,
        raw: &str,
        now: Instant,
    ) -> Result<InputOutcome, FieldNotInForm> {
        if !field.belongs_to(self.form()) {
            return Err(FieldNotInForm {
                field,
                form: self.form(),
            });
        }

        let kind = field.kind();
        let clamped = kind.is_numeric() && is_negative_input(raw);
        let stored = if clamped {
            "0".to_string()
        } else if kind == FieldKind::Fractional {
            sanitize_fractional(raw)
        } else {
            raw.to_string()
        };

        if clamped {
            debug!(field = %field, raw, "clamped negative input");
            self.flag_negative([field]);
        } else if self.clamped.remove(&field) {
            self.statuses.insert(field, FieldStatus::valid());
        }

        self.snapshot.set(field, stored.clone());
        let pending = self.scheduler.schedule(now);

        Ok(InputOutcome {
            field,
            stored,
            clamped,
            pending,
        })
    }

    /// Run the recomputation behind `token` if it is still current and due.
    pub fn poll(&mut self, token: PendingRecompute, now: Instant) -> Option<LiveUpdate> {
        if self.scheduler.fire(token, now) {
            Some(self.recompute())
        } else {
            None
        }
    }

    /// Recompute immediately, discarding any pending token.
    pub fn flush(&mut self) -> LiveUpdate {
        self.scheduler.cancel();
        self.recompute()
    }

    /// Clear the field's error and re-run the checks of its group.
    pub fn on_blur(&mut self, field: FieldName) -> ValidationReport {
        let report = self.engine.validate_group(&self.snapshot, field.group());

        self.statuses.insert(field, FieldStatus::valid());
        self.apply(&report);
        self.reflag_negative();
        report
    }

    /// Full validation; blocks when any required field or blocking check fails.
    pub fn submit(&mut self) -> SubmissionOutcome {
        self.scheduler.cancel();
        self.write_back_totals();

        let clamped: Vec<FieldName> = self.clamped.iter().copied().collect();
        let report = self
            .engine
            .validate_submission_with(&self.snapshot, &clamped);

        for field in self.form().fields() {
            self.statuses.insert(field, FieldStatus::valid());
        }
        self.apply(&report);

        SubmissionOutcome::from_report(report)
    }

    fn recompute(&mut self) -> LiveUpdate {
        let totals = self.write_back_totals();
        let warnings = self
            .engine
            .validate(&self.snapshot)
            .warnings()
            .cloned()
            .collect();

        LiveUpdate { totals, warnings }
    }

    fn write_back_totals(&mut self) -> Vec<DerivedTotal> {
        let outcome = self.engine.aggregate(&self.snapshot);

        for rule in self.engine.catalogue().aggregations() {
            if let DerivedOutput::Field(field) = rule.output {
                if let Some(raw) = outcome.snapshot.raw(field) {
                    self.snapshot.set(field, raw);
                }
            }
        }

        outcome.totals
    }

    fn flag_negative(&mut self, fields: impl IntoIterator<Item = FieldName>) {
        for field in fields {
            self.clamped.insert(field);
            self.statuses.insert(
                field,
                FieldStatus::invalid(NEGATIVE_RULE, Some(NEGATIVE_MESSAGE.to_string())),
            );
        }
    }

    fn reflag_negative(&mut self) {
        let clamped: Vec<FieldName> = self.clamped.iter().copied().collect();
        self.flag_negative(clamped);
    }

    fn apply(&mut self, report: &ValidationReport) {
        for result in &report.results {
            let Some(field) = result.field else {
                continue;
            };

            if result.is_blocking_failure() {
                self.statuses
                    .insert(field, FieldStatus::invalid(&result.rule, result.message.clone()));
            } else if self.status(field).rule.as_deref() == Some(result.rule.as_str()) {
                self.statuses.insert(field, FieldStatus::valid());
            }
        }
    }
}
