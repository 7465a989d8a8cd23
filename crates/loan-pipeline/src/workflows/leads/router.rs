use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{DocumentsStatus, LeadId, LeadStatus, StatusTransitionRequest, TransitionData};
use super::repository::{EventPublisher, LeadRepository, StatusHistoryRepository};
use super::service::LeadLifecycleService;
use super::session::{HeaderSession, SessionError, SessionProvider};
use crate::workflows::eligibility::{EligibilityService, QuickCheckRequest};
use crate::workflows::lenders::acceptance::RecommendationSet;
use crate::workflows::lenders::domain::{verdict_of, LenderEvaluation, LenderId, Verdict};

/// Upper bound on leads scanned for the pipeline report.
const REPORT_SCAN_LIMIT: usize = 500;

/// Shared state behind [`lead_router`].
pub struct LeadApi<R, H, E> {
    pub lifecycle: Arc<LeadLifecycleService<R, H, E>>,
    pub eligibility: Arc<EligibilityService>,
}

/// Router builder exposing the lifecycle, eligibility and recommendation endpoints.
pub fn lead_router<R, H, E>(
    lifecycle: Arc<LeadLifecycleService<R, H, E>>,
    eligibility: Arc<EligibilityService>,
) -> Router
where
    R: LeadRepository + 'static,
    H: StatusHistoryRepository + 'static,
    E: EventPublisher + 'static,
{
    let state = Arc::new(LeadApi {
        lifecycle,
        eligibility,
    });

    Router::new()
        .route(
            "/api/v1/leads/:lead_id/transitions",
            post(transition_handler::<R, H, E>),
        )
        .route(
            "/api/v1/leads/:lead_id/completion",
            get(completion_handler::<R, H, E>),
        )
        .route("/api/v1/leads/:lead_id/tat", get(tat_handler::<R, H, E>))
        .route(
            "/api/v1/leads/:lead_id/history",
            get(history_handler::<R, H, E>),
        )
        .route("/api/v1/pipeline/report", get(report_handler::<R, H, E>))
        .route(
            "/api/v1/eligibility/quick-check",
            post(quick_check_handler::<R, H, E>),
        )
        .route(
            "/api/v1/recommendations/classify",
            post(classify_handler::<R, H, E>),
        )
        .with_state(state)
}

/// Transition body; the lead id comes from the path.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionPayload {
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub documents_status: Option<DocumentsStatus>,
    #[serde(default)]
    pub reason_code: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub additional_data: TransitionData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyPayload {
    pub lead_id: LeadId,
    pub confidence: u8,
    pub evaluations: Vec<LenderEvaluation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerdictView {
    lender_id: LenderId,
    verdict: Verdict,
    verdict_label: &'static str,
}

pub(crate) async fn transition_handler<R, H, E>(
    State(api): State<Arc<LeadApi<R, H, E>>>,
    Path(lead_id): Path<String>,
    headers: HeaderMap,
    payload: Result<axum::Json<TransitionPayload>, JsonRejection>,
) -> Response
where
    R: LeadRepository + 'static,
    H: StatusHistoryRepository + 'static,
    E: EventPublisher + 'static,
{
    let actor = match HeaderSession::new(&headers).current_actor() {
        Ok(actor) => actor,
        Err(error) => return session_rejection(error),
    };
    let axum::Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_request(rejection),
    };

    let request = StatusTransitionRequest {
        lead_id: LeadId(lead_id),
        status: payload.status,
        documents_status: payload.documents_status,
        reason_code: payload.reason_code,
        notes: payload.notes,
        additional_data: payload.additional_data,
    };

    match api.lifecycle.transition(request, &actor) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn completion_handler<R, H, E>(
    State(api): State<Arc<LeadApi<R, H, E>>>,
    Path(lead_id): Path<String>,
) -> Response
where
    R: LeadRepository + 'static,
    H: StatusHistoryRepository + 'static,
    E: EventPublisher + 'static,
{
    match api.lifecycle.completion(&LeadId(lead_id)) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn tat_handler<R, H, E>(
    State(api): State<Arc<LeadApi<R, H, E>>>,
    Path(lead_id): Path<String>,
) -> Response
where
    R: LeadRepository + 'static,
    H: StatusHistoryRepository + 'static,
    E: EventPublisher + 'static,
{
    match api.lifecycle.tat(&LeadId(lead_id)) {
        Ok(tat) => (StatusCode::OK, axum::Json(tat)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn history_handler<R, H, E>(
    State(api): State<Arc<LeadApi<R, H, E>>>,
    Path(lead_id): Path<String>,
) -> Response
where
    R: LeadRepository + 'static,
    H: StatusHistoryRepository + 'static,
    E: EventPublisher + 'static,
{
    match api.lifecycle.history(&LeadId(lead_id)) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn report_handler<R, H, E>(State(api): State<Arc<LeadApi<R, H, E>>>) -> Response
where
    R: LeadRepository + 'static,
    H: StatusHistoryRepository + 'static,
    E: EventPublisher + 'static,
{
    match api.lifecycle.report(REPORT_SCAN_LIMIT) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn quick_check_handler<R, H, E>(
    State(api): State<Arc<LeadApi<R, H, E>>>,
    request: Result<axum::Json<QuickCheckRequest>, JsonRejection>,
) -> Response
where
    R: LeadRepository + 'static,
    H: StatusHistoryRepository + 'static,
    E: EventPublisher + 'static,
{
    let axum::Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return invalid_request(rejection),
    };
    match api.eligibility.quick_check(&request) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Grouping is advisory and stateless; nothing is accepted here.
pub(crate) async fn classify_handler<R, H, E>(
    State(_api): State<Arc<LeadApi<R, H, E>>>,
    payload: Result<axum::Json<ClassifyPayload>, JsonRejection>,
) -> Response
where
    R: LeadRepository + 'static,
    H: StatusHistoryRepository + 'static,
    E: EventPublisher + 'static,
{
    let axum::Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_request(rejection),
    };
    let verdicts: Vec<VerdictView> = payload
        .evaluations
        .iter()
        .map(|evaluation| {
            let verdict = verdict_of(evaluation);
            VerdictView {
                lender_id: evaluation.lender_id.clone(),
                verdict,
                verdict_label: verdict.label(),
            }
        })
        .collect();

    let set = RecommendationSet::new(payload.lead_id, payload.evaluations, payload.confidence);
    let payload = json!({
        "leadId": set.lead_id,
        "confidence": set.confidence,
        "needsHumanReview": set.needs_human_review(),
        "topPick": set.top_pick().map(|evaluation| evaluation.lender_id.clone()),
        "groups": set.groups,
        "verdicts": verdicts,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

fn session_rejection(error: SessionError) -> Response {
    let code = match error {
        SessionError::Unauthenticated => "unauthenticated",
        SessionError::UnknownRole(_) => "unknown_role",
    };
    let payload = json!({
        "code": code,
        "message": error.to_string(),
        "field": serde_json::Value::Null,
    });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

/// Body that could not be decoded, in the same shape as engine errors.
fn invalid_request(rejection: JsonRejection) -> Response {
    let payload = json!({
        "code": "invalid_request",
        "message": rejection.body_text(),
        "field": serde_json::Value::Null,
    });
    (rejection.status(), axum::Json(payload)).into_response()
}
