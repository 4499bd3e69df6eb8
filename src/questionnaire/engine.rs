use super::aggregation::{aggregate, AggregationOutcome, DerivedOutput};
use super::catalogue::RuleCatalogue;
use super::checks::CheckLimits;
use super::fields::{FieldGroup, FieldName, FormKind};
use super::report::{CheckResult, CheckStatus, Severity, ValidationReport};
use super::snapshot::FieldSnapshot;
use tracing::debug;

const REQUIRED_RULE: &str = "required_field";
const REQUIRED_MESSAGE: &str = "This field is required";
pub(crate) const NEGATIVE_RULE: &str = "non_negative";
pub(crate) const NEGATIVE_MESSAGE: &str = "Value cannot be negative";

/// Stateless evaluator applying a rule catalogue to field snapshots.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    catalogue: RuleCatalogue,
    limits: CheckLimits,
}

impl ValidationEngine {
    pub fn new(catalogue: RuleCatalogue, limits: CheckLimits) -> Self {
        Self { catalogue, limits }
    }

    pub fn for_form(form: FormKind, limits: CheckLimits) -> Self {
        Self::new(RuleCatalogue::for_form(form), limits)
    }

    pub fn form(&self) -> FormKind {
        self.catalogue.form()
    }

    pub fn catalogue(&self) -> &RuleCatalogue {
        &self.catalogue
    }

    pub fn limits(&self) -> &CheckLimits {
        &self.limits
    }

    /// Recompute every derived total, overwriting auto-calculated fields.
    pub fn aggregate(&self, snapshot: &FieldSnapshot) -> AggregationOutcome {
        aggregate(self.catalogue.aggregations(), snapshot)
    }

    /// Snapshot with auto-calculated fields filled in where the input left them blank.
    pub fn complete(&self, snapshot: &FieldSnapshot) -> FieldSnapshot {
        let derived = self.aggregate(snapshot).snapshot;
        let mut completed = snapshot.clone();

        for rule in self.catalogue.aggregations() {
            if let DerivedOutput::Field(field) = rule.output {
                if snapshot.is_blank(field) {
                    if let Some(raw) = derived.raw(field) {
                        completed.set(field, raw);
                    }
                }
            }
        }

        completed
    }

    /// Run every cross-field check in catalogue order.
    pub fn validate(&self, snapshot: &FieldSnapshot) -> ValidationReport {
        let completed = self.complete(snapshot);
        let mut report = ValidationReport::new(self.form());

        for check in self.catalogue.checks() {
            report.push(check.evaluate(&completed, &self.limits));
        }

        debug!(
            form = %self.form(),
            failures = report.failure_count(),
            warnings = report.warnings().count(),
            "validation pass complete"
        );
        report
    }

    /// Required fields of `group`, then the checks that read a field of it.
    pub fn validate_group(&self, snapshot: &FieldSnapshot, group: FieldGroup) -> ValidationReport {
        let completed = self.complete(snapshot);
        let mut report = ValidationReport::new(self.form());

        for field in self
            .catalogue
            .required()
            .iter()
            .filter(|field| field.group() == group)
        {
            report.push(required_result(snapshot, *field));
        }

        for check in self
            .catalogue
            .checks()
            .iter()
            .filter(|check| check.references_group(group))
        {
            report.push(check.evaluate(&completed, &self.limits));
        }

        report
    }

    /// Required-field results followed by the full cross-field catalogue.
    pub fn validate_submission(&self, snapshot: &FieldSnapshot) -> ValidationReport {
        self.validate_submission_with(snapshot, &[])
    }

    /// Submission pass that also fails every field whose negative input was clamped.
    pub fn validate_submission_with(
        &self,
        snapshot: &FieldSnapshot,
        clamped: &[FieldName],
    ) -> ValidationReport {
        let mut report = ValidationReport::new(self.form());
        for field in self.catalogue.required() {
            report.push(required_result(snapshot, *field));
        }
        for field in clamped {
            report.push(negative_result(*field));
        }
        report.extend(self.validate(snapshot));
        report
    }

    /// Fields read by checks in `group`, plus the group's own fields.
    pub fn related_fields(&self, group: FieldGroup) -> Vec<FieldName> {
        let mut fields: Vec<FieldName> = self
            .catalogue
            .checks()
            .iter()
            .filter(|check| check.references_group(group))
            .flat_map(|check| check.kind.operands())
            .collect();
        fields.sort();
        fields.dedup();
        fields
    }
}

fn required_result(snapshot: &FieldSnapshot, field: FieldName) -> CheckResult {
    let missing = snapshot.is_blank(field);
    CheckResult {
        rule: REQUIRED_RULE.to_string(),
        status: if missing {
            CheckStatus::Failed
        } else {
            CheckStatus::Passed
        },
        severity: Severity::Blocking,
        field: Some(field),
        message: missing.then(|| REQUIRED_MESSAGE.to_string()),
    }
}

pub(crate) fn negative_result(field: FieldName) -> CheckResult {
    CheckResult {
        rule: NEGATIVE_RULE.to_string(),
        status: CheckStatus::Failed,
        severity: Severity::Blocking,
        field: Some(field),
        message: Some(NEGATIVE_MESSAGE.to_string()),
    }
}
