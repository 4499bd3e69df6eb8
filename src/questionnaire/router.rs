use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use super::draft::DraftStore;
use super::fields::FormKind;
use super::import::flatten_values;
use super::orchestrator::SubmissionOutcome;
use super::service::QuestionnaireService;
use super::snapshot::{FieldSnapshot, SnapshotParse};
use crate::error::AppError;

/// Router exposing validation, totals, submission and draft endpoints.
pub fn questionnaire_router<S>(service: Arc<QuestionnaireService<S>>) -> Router
where
    S: DraftStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/questionnaires/:form/validate",
            post(validate_handler::<S>),
        )
        .route(
            "/api/v1/questionnaires/:form/totals",
            post(totals_handler::<S>),
        )
        .route(
            "/api/v1/questionnaires/:form/submit",
            post(submit_handler::<S>),
        )
        .route(
            "/api/v1/questionnaires/:form/draft",
            get(load_draft_handler::<S>)
                .put(save_draft_handler::<S>)
                .delete(discard_draft_handler::<S>),
        )
        .with_state(service)
}

type FieldPayload = BTreeMap<String, Value>;

fn parse_request(form: &str, payload: FieldPayload) -> Result<(FormKind, SnapshotParse), AppError> {
    let form = form.parse::<FormKind>()?;
    Ok((form, FieldSnapshot::from_wire(form, flatten_values(payload))))
}

pub(crate) async fn validate_handler<S>(
    State(service): State<Arc<QuestionnaireService<S>>>,
    Path(form): Path<String>,
    Json(payload): Json<FieldPayload>,
) -> Result<Response, AppError>
where
    S: DraftStore + 'static,
{
    let (form, parsed) = parse_request(&form, payload)?;
    Ok(Json(service.validate(form, parsed)).into_response())
}

pub(crate) async fn totals_handler<S>(
    State(service): State<Arc<QuestionnaireService<S>>>,
    Path(form): Path<String>,
    Json(payload): Json<FieldPayload>,
) -> Result<Response, AppError>
where
    S: DraftStore + 'static,
{
    let (form, parsed) = parse_request(&form, payload)?;
    let totals = service.totals(form, parsed);
    Ok(Json(json!({ "form": form, "totals": totals })).into_response())
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<QuestionnaireService<S>>>,
    Path(form): Path<String>,
    Json(payload): Json<FieldPayload>,
) -> Result<Response, AppError>
where
    S: DraftStore + 'static,
{
    let (form, parsed) = parse_request(&form, payload)?;
    let outcome = service.submit(form, parsed)?;
    let status = match outcome {
        SubmissionOutcome::Accepted { .. } => StatusCode::OK,
        SubmissionOutcome::Blocked { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };

    Ok((status, Json(outcome)).into_response())
}

pub(crate) async fn save_draft_handler<S>(
    State(service): State<Arc<QuestionnaireService<S>>>,
    Path(form): Path<String>,
    Json(payload): Json<FieldPayload>,
) -> Result<Response, AppError>
where
    S: DraftStore + 'static,
{
    let (form, parsed) = parse_request(&form, payload)?;
    let draft = service.save_draft(form, parsed)?;
    Ok(Json(draft).into_response())
}

pub(crate) async fn load_draft_handler<S>(
    State(service): State<Arc<QuestionnaireService<S>>>,
    Path(form): Path<String>,
) -> Result<Response, AppError>
where
    S: DraftStore + 'static,
{
    let form = form.parse::<FormKind>()?;
    match service.load_draft(form)? {
        Some(draft) => Ok(Json(draft).into_response()),
        None => {
            let payload = json!({ "error": format!("no draft saved for {form}") });
            Ok((StatusCode::NOT_FOUND, Json(payload)).into_response())
        }
    }
}

pub(crate) async fn discard_draft_handler<S>(
    State(service): State<Arc<QuestionnaireService<S>>>,
    Path(form): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: DraftStore + 'static,
{
    let form = form.parse::<FormKind>()?;
    if service.discard_draft(form)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}
