use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use warp::Filter;
use warp::hyper::body::Bytes;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};

use crate::domain::project::{Project, ProjectStatus};
use crate::domain::scenario::Scenario;
use crate::services::forecast_engine::{ForecastEngine, ForecastError, ForecastRequest, rng_for};
use crate::services::project_yaml::{parse_date, parse_timestamp};
use crate::services::scenario_store::ScenarioStore;

const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Body of `POST /forecast`. Keys are accepted in camelCase or snake_case.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastHttpRequest {
    #[serde(alias = "project_id")]
    pub project_id: String,
    pub name: Option<String>,
    #[serde(alias = "progress_percent")]
    pub progress_percent: f64,
    pub deadline: String,
    #[serde(alias = "created_at")]
    pub created_at: Option<String>,
    pub status: Option<String>,
    pub scenario: Option<Scenario>,
    pub iterations: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub struct ServiceState {
    pub engine: ForecastEngine,
    pub store: Arc<dyn ScenarioStore>,
    pub default_iterations: usize,
    pub seed: Option<u64>,
}

pub fn forecast_routes(
    state: Arc<ServiceState>,
) -> impl Filter<Extract = (WithStatus<Json>,), Error = warp::Rejection> + Clone {
    warp::post()
        .and(warp::path("forecast"))
        .and(warp::path::end())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and_then(move |body: Bytes| {
            let state = Arc::clone(&state);
            async move { Ok::<_, warp::Rejection>(handle_forecast(state, body, Utc::now()).await) }
        })
}

pub async fn serve(state: Arc<ServiceState>, address: SocketAddr) {
    info!(%address, "forecast service listening");
    warp::serve(forecast_routes(state)).run(address).await;
}

async fn handle_forecast(
    state: Arc<ServiceState>,
    body: Bytes,
    now: DateTime<Utc>,
) -> WithStatus<Json> {
    let request: ForecastHttpRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return error_reply(StatusCode::BAD_REQUEST, format!("invalid request body: {e}")),
    };
    let seed = request.seed.or(state.seed);
    let forecast_request = match to_forecast_request(request, state.default_iterations) {
        Ok(forecast_request) => forecast_request,
        Err(e) => return error_reply(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let project_id = forecast_request.project.id.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let mut rng = rng_for(seed, 0);
        state
            .engine
            .run_with_store(&forecast_request, state.store.as_ref(), now, &mut rng)
    })
    .await
    .unwrap_or_else(|e| Err(ForecastError::Worker(e.to_string())));

    match outcome {
        Ok(run) => warp::reply::with_status(warp::reply::json(&run.result), StatusCode::OK),
        Err(ForecastError::Worker(message)) => {
            error!(%project_id, error = %message, "forecast worker failed");
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
        Err(e) => {
            warn!(%project_id, error = %e, "rejected forecast request");
            error_reply(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

fn to_forecast_request(
    request: ForecastHttpRequest,
    default_iterations: usize,
) -> Result<ForecastRequest, ForecastError> {
    let deadline = parse_date(&request.deadline)
        .ok_or_else(|| ForecastError::InvalidDate(request.deadline.clone()))?;
    let created_at = request
        .created_at
        .as_deref()
        .map(|value| parse_timestamp(value).ok_or_else(|| ForecastError::InvalidDate(value.into())))
        .transpose()?;
    let status = match request.status.as_deref() {
        Some(value) => value
            .parse::<ProjectStatus>()
            .map_err(ForecastError::InvalidStatus)?,
        None => ProjectStatus::Active,
    };

    let project = Project {
        name: request.name.unwrap_or_else(|| request.project_id.clone()),
        id: request.project_id,
        deadline,
        status,
        created_at,
    };
    Ok(ForecastRequest::new(project, request.progress_percent)
        .with_scenario(request.scenario)
        .with_iterations(request.iterations.unwrap_or(default_iterations)))
}

fn error_reply(status: StatusCode, message: String) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&ErrorBody { error: message }), status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::scenario_store::{InMemoryScenarioStore, StoreError};
    use serde_json::Value;
    use std::collections::BTreeMap;

    fn test_state(store: Arc<dyn ScenarioStore>) -> Arc<ServiceState> {
        Arc::new(ServiceState {
            engine: ForecastEngine::new(10_000),
            store,
            default_iterations: 500,
            seed: Some(5),
        })
    }

    async fn post(state: Arc<ServiceState>, body: &str) -> (StatusCode, Value) {
        let response = warp::test::request()
            .method("POST")
            .path("/forecast")
            .body(body.to_string())
            .reply(&forecast_routes(state))
            .await;
        let json = serde_json::from_slice(response.body()).unwrap();
        (response.status(), json)
    }

    #[tokio::test]
    async fn forecast_returns_result_json() {
        let state = test_state(Arc::new(InMemoryScenarioStore::new()));
        let body = r#"{
            "projectId": "web",
            "progressPercent": 40,
            "deadline": "2099-01-01",
            "createdAt": "2020-01-01T00:00:00Z"
        }"#;

        let (status, json) = post(state, body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["project_id"], "web");
        assert_eq!(json["iterations"], 500);
        assert!(json["risk_level"].is_string());
        assert_eq!(json["on_track"], true);
        let confidence = json["confidence_percent"].as_u64().unwrap();
        assert!((40..=95).contains(&confidence));
    }

    #[tokio::test]
    async fn forecast_uses_request_scenario_over_store() {
        let store = Arc::new(InMemoryScenarioStore::new());
        store.save("web", &Scenario::new(0, 30).unwrap()).unwrap();
        let state = test_state(store);
        let body = r#"{
            "project_id": "web",
            "progress_percent": 40,
            "deadline": "2099-01-01",
            "scenario": { "teamSizeDelta": 1, "scopeChangePercent": -10 }
        }"#;

        let (status, json) = post(state, body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["adjusted_progress_percent"], 50.0);
    }

    #[tokio::test]
    async fn forecast_applies_stored_scenario() {
        let store = Arc::new(InMemoryScenarioStore::new());
        store.save("web", &Scenario::new(0, 30).unwrap()).unwrap();
        let state = test_state(store);
        let body = r#"{"projectId": "web", "progressPercent": 40, "deadline": "2099-01-01"}"#;

        let (status, json) = post(state, body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["adjusted_progress_percent"], 10.0);
    }

    #[tokio::test]
    async fn forecast_rejects_invalid_input_with_bad_request() {
        let cases = [
            r#"{"projectId": "web", "progressPercent": 140, "deadline": "2099-01-01"}"#,
            r#"{"projectId": "web", "progressPercent": 40, "deadline": "someday"}"#,
            r#"{"projectId": "web", "progressPercent": 40, "deadline": "2099-01-01", "createdAt": "yesterday"}"#,
            r#"{"projectId": "web", "progressPercent": 40, "deadline": "2099-01-01", "iterations": 0}"#,
            r#"{"projectId": "web", "progressPercent": 40, "deadline": "2099-01-01", "scenario": {"scopeChangePercent": 75}}"#,
            r#"{"projectId": "web"}"#,
            "not json",
        ];
        for body in cases {
            let state = test_state(Arc::new(InMemoryScenarioStore::new()));
            let (status, json) = post(state, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert!(json["error"].is_string(), "body: {body}");
        }
    }

    struct PanickingStore;

    impl ScenarioStore for PanickingStore {
        fn save(&self, _: &str, _: &Scenario) -> Result<(), StoreError> {
            panic!("store poisoned")
        }
        fn load(&self, _: &str) -> Result<Option<Scenario>, StoreError> {
            panic!("store poisoned")
        }
        fn clear(&self, _: &str) -> Result<(), StoreError> {
            panic!("store poisoned")
        }
        fn load_all(&self) -> Result<BTreeMap<String, Scenario>, StoreError> {
            panic!("store poisoned")
        }
    }

    #[tokio::test]
    async fn crashed_forecast_worker_returns_server_error() {
        let state = test_state(Arc::new(PanickingStore));
        let body = r#"{"projectId": "web", "progressPercent": 40, "deadline": "2099-01-01"}"#;

        let (status, json) = post(state, body).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn forecast_with_same_seed_is_reproducible() {
        let body = r#"{"projectId": "web", "progressPercent": 40, "deadline": "2099-01-01", "seed": 9}"#;
        let (_, first) = post(test_state(Arc::new(InMemoryScenarioStore::new())), body).await;
        let (_, second) = post(test_state(Arc::new(InMemoryScenarioStore::new())), body).await;
        assert_eq!(first["realistic_days"], second["realistic_days"]);
    }
}
