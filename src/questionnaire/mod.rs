//! Field validation and cross-field aggregation for the quarterly telecom questionnaires.
//!
//! The engine works on a [`FieldSnapshot`] of raw form values and a [`RuleCatalogue`];
//! the hosting UI owns all rendering state and feeds edits through a
//! [`ValidationOrchestrator`].

pub mod aggregation;
pub mod catalogue;
pub mod checks;
pub mod debounce;
pub mod draft;
pub mod engine;
pub mod fields;
pub mod import;
pub mod orchestrator;
pub mod report;
pub mod router;
pub mod service;
pub mod snapshot;

pub use aggregation::{
    aggregate, format_money, format_number, max_of_sums, sum, AggregationOutcome,
    AggregationRule, Combination, DerivedOutput, DerivedTotal, TotalFormat,
};
pub use catalogue::{CatalogueError, RuleCatalogue};
pub use checks::{CheckKind, CheckLimits, CrossFieldCheck};
pub use debounce::{PendingRecompute, RecomputeScheduler};
pub use draft::{
    Draft, DraftBackend, DraftError, DraftStore, FileDraftStore, InMemoryDraftStore,
};
pub use engine::ValidationEngine;
pub use fields::{FieldGroup, FieldKind, FieldName, FormKind, UnknownField, UnknownForm};
pub use import::{snapshot_from_csv, snapshot_from_json, snapshot_from_path, SnapshotImportError};
pub use orchestrator::{
    FieldNotInForm, FieldState, FieldStatus, InputOutcome, LiveUpdate, SubmissionOutcome,
    ValidationOrchestrator,
};
pub use report::{CheckResult, CheckStatus, Severity, ValidationReport};
pub use router::questionnaire_router;
pub use service::{QuestionnaireService, QuestionnaireServiceError, ValidationView};
pub use snapshot::{FieldSnapshot, FieldValue, SnapshotParse};
