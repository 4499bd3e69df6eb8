use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use super::aggregation::DerivedTotal;
use super::checks::CheckLimits;
use super::debounce::{RecomputeScheduler, DEFAULT_QUIET_PERIOD};
use super::draft::{Draft, DraftError, DraftStore};
use super::engine::ValidationEngine;
use super::fields::{FieldName, FormKind};
use super::orchestrator::{SubmissionOutcome, ValidationOrchestrator};
use super::report::ValidationReport;
use super::snapshot::SnapshotParse;

/// Validation pass over a full snapshot, as returned to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationView {
    pub form: FormKind,
    pub blocked: bool,
    pub summary: String,
    pub report: ValidationReport,
    pub totals: Vec<DerivedTotal>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored_fields: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub clamped_fields: Vec<FieldName>,
}

#[derive(Debug, thiserror::Error)]
pub enum QuestionnaireServiceError {
    #[error(transparent)]
    Draft(#[from] DraftError),
}

/// Composes one engine per form with the draft store.
pub struct QuestionnaireService<S> {
    mobile_stations: Arc<ValidationEngine>,
    originated_traffic: Arc<ValidationEngine>,
    drafts: Arc<S>,
    quiet_period: Duration,
}

impl<S> QuestionnaireService<S>
where
    S: DraftStore + 'static,
{
    pub fn new(drafts: Arc<S>, limits: CheckLimits) -> Self {
        Self {
            mobile_stations: Arc::new(ValidationEngine::for_form(
                FormKind::MobileStations,
                limits,
            )),
            originated_traffic: Arc::new(ValidationEngine::for_form(
                FormKind::OriginatedTraffic,
                limits,
            )),
            drafts,
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    /// Interactive session over a restored draft, or an empty form when none is saved.
    pub fn session(
        &self,
        form: FormKind,
    ) -> Result<ValidationOrchestrator, QuestionnaireServiceError> {
        let scheduler = RecomputeScheduler::new(self.quiet_period);
        let session = ValidationOrchestrator::new(self.engine(form), scheduler);

        Ok(match self.drafts.load(form)? {
            Some(draft) => session.with_parsed(draft.restore()),
            None => session,
        })
    }

    pub fn engine(&self, form: FormKind) -> Arc<ValidationEngine> {
        match form {
            FormKind::MobileStations => Arc::clone(&self.mobile_stations),
            FormKind::OriginatedTraffic => Arc::clone(&self.originated_traffic),
        }
    }

    /// Submission report over a payload: supplied totals are kept, blank ones derived.
    fn report(&self, form: FormKind, parsed: &SnapshotParse) -> ValidationReport {
        self.engine(form)
            .validate_submission_with(&parsed.snapshot, &parsed.clamped)
    }

    pub fn validate(&self, form: FormKind, parsed: SnapshotParse) -> ValidationView {
        let report = self.report(form, &parsed);
        let totals = self.engine(form).aggregate(&parsed.snapshot).totals;
        let SnapshotParse {
            ignored, clamped, ..
        } = parsed;

        debug!(form = %form, summary = %report.summary(), "validated snapshot");
        ValidationView {
            form,
            blocked: report.blocks_submission(),
            summary: report.summary(),
            report,
            totals,
            ignored_fields: ignored,
            clamped_fields: clamped,
        }
    }

    pub fn totals(&self, form: FormKind, parsed: SnapshotParse) -> Vec<DerivedTotal> {
        self.engine(form).aggregate(&parsed.snapshot).totals
    }

    /// Same report as [`Self::validate`]; an accepted submission discards the form's draft.
    pub fn submit(
        &self,
        form: FormKind,
        parsed: SnapshotParse,
    ) -> Result<SubmissionOutcome, QuestionnaireServiceError> {
        let outcome = SubmissionOutcome::from_report(self.report(form, &parsed));

        if outcome.is_accepted() && self.drafts.clear(form)? {
            info!(form = %form, "submission accepted, draft discarded");
        }

        Ok(outcome)
    }

    pub fn save_draft(
        &self,
        form: FormKind,
        parsed: SnapshotParse,
    ) -> Result<Draft, QuestionnaireServiceError> {
        let draft = Draft::capture(form, &parsed.snapshot, Utc::now());
        self.drafts.save(draft.clone())?;
        Ok(draft)
    }

    pub fn load_draft(&self, form: FormKind) -> Result<Option<Draft>, QuestionnaireServiceError> {
        Ok(self.drafts.load(form)?)
    }

    pub fn discard_draft(&self, form: FormKind) -> Result<bool, QuestionnaireServiceError> {
        Ok(self.drafts.clear(form)?)
    }
}
