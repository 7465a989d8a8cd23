use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use loan_pipeline::workflows::eligibility::EligibilityService;
use loan_pipeline::workflows::leads::{
    lead_router, EventPublisher, LeadLifecycleService, LeadRepository, StatusHistoryRepository,
};
use loan_pipeline::workflows::leads::registry::StatusRegistry;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_pipeline_routes<R, H, E>(
    lifecycle: Arc<LeadLifecycleService<R, H, E>>,
    eligibility: Arc<EligibilityService>,
) -> axum::Router
where
    R: LeadRepository + 'static,
    H: StatusHistoryRepository + 'static,
    E: EventPublisher + 'static,
{
    lead_router(lifecycle, eligibility)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/statuses", axum::routing::get(statuses_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Registry as the UI consumes it: labels, phases, steps and TAT targets.
pub(crate) async fn statuses_endpoint() -> Json<serde_json::Value> {
    Json(json!({ "statuses": StatusRegistry::listed() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        load_engine, sample_leads, InMemoryEventLog, InMemoryLeadStore, StaticUniversityDirectory,
    };
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Utc;
    use loan_pipeline::config::EngineConfig;
    use tower::ServiceExt;

    fn app() -> axum::Router {
        let store = Arc::new(InMemoryLeadStore::with_leads(sample_leads(Utc::now())));
        let lifecycle = Arc::new(LeadLifecycleService::new(
            store.clone(),
            store,
            Arc::new(InMemoryEventLog::default()),
        ));
        let (scorer, lenders) = load_engine(&EngineConfig::default()).expect("sample engine");
        let eligibility = Arc::new(EligibilityService::new(
            Arc::new(StaticUniversityDirectory::default()),
            Arc::new(lenders),
            scorer,
        ));
        with_pipeline_routes(lifecycle, eligibility)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 256 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn statuses_lists_every_registry_entry() {
        let response = app()
            .oneshot(
                Request::get("/api/v1/statuses")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let payload = json_body(response).await;
        let statuses = payload["statuses"].as_array().expect("status list");
        assert_eq!(statuses.len(), StatusRegistry::listed().len());
    }

    #[tokio::test]
    async fn pipeline_report_covers_seeded_leads() {
        let response = app()
            .oneshot(
                Request::get("/api/v1/pipeline/report")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let payload = json_body(response).await;
        let total: u64 = payload["phase_counts"]
            .as_array()
            .expect("phase counts")
            .iter()
            .map(|entry| entry["leads"].as_u64().unwrap_or(0))
            .sum();
        assert_eq!(total, 5);
        let breached: Vec<&str> = payload["breached"]
            .as_array()
            .expect("breached")
            .iter()
            .filter_map(|row| row["lead_id"].as_str())
            .collect();
        assert_eq!(breached, vec!["lead-1005", "lead-1002"]);
    }
}
