//! HTTP routes for the reminder API.
//!
//! Thin glue over the engine: each handler validates nothing itself
//! beyond deserialization - classification, idempotency, and input
//! checks all live in `medrem_core`. Every route except `/api/health`
//! sits behind the bearer-token middleware stage.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use chrono::Utc;
use medrem_core::{
    ConfirmReceipt, IntakeRecord, ScheduleDocument, ScheduleSource, SnoozeReceipt, StatusOptions,
    StatusReport,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth;
use crate::error::ApiError;
use crate::state::AppState;

/// Default history range, in days
const DEFAULT_HISTORY_DAYS: i64 = 7;

/// Build the API router.
///
/// Routes are nested under `/api/`; the health probe is mounted
/// outside the auth stage.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/status", get(status))
        .route("/confirm", post(confirm))
        .route("/snooze", post(snooze))
        .route("/history", get(history))
        .route("/config", get(config_get).put(config_put))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let open = Router::new().route("/health", get(health)).with_state(state);

    Router::new().nest("/api", protected).nest("/api", open)
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    /// Whether the schedule document currently loads and validates
    schedule_ok: bool,
}

/// `GET /api/health` - unauthenticated liveness/auth-check probe
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let schedule_ok = state.engine.schedule().load().is_ok();
    Json(HealthResponse {
        status: "ok",
        schedule_ok,
    })
}

#[derive(Deserialize)]
struct StatusQuery {
    /// Opt into serving status with an unreadable intake log
    #[serde(default)]
    degraded: bool,
}

/// `GET /api/status` - today's dose instances, classified
async fn status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusReport>, ApiError> {
    let report = state.engine.status_with(
        Utc::now(),
        StatusOptions {
            degraded: query.degraded,
        },
    )?;
    Ok(Json(report))
}

#[derive(Deserialize)]
struct ConfirmBody {
    medication: String,
    time: String,
}

/// `POST /api/confirm` - record an intake.
///
/// A repeated confirmation for the same day returns 200 with outcome
/// `duplicate`; retried clients are not penalized with an error.
async fn confirm(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConfirmBody>,
) -> Result<Json<ConfirmReceipt>, ApiError> {
    let receipt = state
        .engine
        .confirm(&body.medication, &body.time, Utc::now())?;
    Ok(Json(receipt))
}

#[derive(Deserialize)]
struct SnoozeBody {
    medication: String,
    time: String,
    /// Suppression length; defaults to five minutes
    minutes: Option<i64>,
}

/// `POST /api/snooze` - push the next reminder back
async fn snooze(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SnoozeBody>,
) -> Result<Json<SnoozeReceipt>, ApiError> {
    let receipt =
        state
            .engine
            .snooze(&body.medication, &body.time, Utc::now(), body.minutes)?;
    Ok(Json(receipt))
}

#[derive(Deserialize)]
struct HistoryQuery {
    days: Option<i64>,
}

#[derive(Serialize)]
struct HistoryResponse {
    days: i64,
    history: Vec<IntakeRecord>,
}

/// `GET /api/history?days=N` - recent confirmations, newest first.
///
/// An out-of-range `days` falls back to the default rather than
/// erroring.
async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let days = match query.days {
        Some(days) if (1..=365).contains(&days) => days,
        _ => DEFAULT_HISTORY_DAYS,
    };
    let history = state.engine.history(Utc::now(), days)?;
    Ok(Json(HistoryResponse { days, history }))
}

/// `GET /api/config` - the schedule document as persisted
async fn config_get(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ScheduleDocument>, ApiError> {
    Ok(Json(state.engine.schedule().read_document()?))
}

/// `PUT /api/config` - replace the schedule document.
///
/// The replacement is validated before anything is written; a bad
/// document is the client's fault, not a service failure.
async fn config_put(
    State(state): State<Arc<AppState>>,
    Json(document): Json<ScheduleDocument>,
) -> Result<Json<ScheduleDocument>, ApiError> {
    state
        .engine
        .schedule()
        .write_document(&document)
        .map_err(|err| match err {
            medrem_core::Error::Config(detail) => ApiError::BadRequest(detail),
            other => other.into(),
        })?;
    Ok(Json(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use medrem_core::{JsonlIntakeLog, ReminderEngine, TomlScheduleSource};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const SCHEDULE: &str = r#"
        [[medications]]
        name = "VitD"
        display_text = "Vitamin D3 1000 IE"
        times = ["12:00"]

        [[medications]]
        name = "Statin"
        times = ["08:00", "20:00"]

        [settings]
        reminder_window = 30
        timezone = "Europe/Berlin"
    "#;

    fn test_state(auth_token: Option<&str>) -> (Arc<AppState>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("reminder.toml");
        std::fs::write(&config_path, SCHEDULE).unwrap();

        let engine = ReminderEngine::new(
            TomlScheduleSource::new(config_path),
            JsonlIntakeLog::new(dir.path().join("intake_log.jsonl")),
        );
        let state = Arc::new(AppState {
            engine,
            auth_token: auth_token.map(String::from),
        });
        (state, dir)
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), 256 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_reachable_without_a_token() {
        let (state, _dir) = test_state(Some("secret"));
        let app = router(state);

        let response = app.oneshot(get_request("/api/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["schedule_ok"], true);
    }

    #[tokio::test]
    async fn protected_routes_require_the_configured_token() {
        let (state, _dir) = test_state(Some("secret"));
        let app = router(state);

        let response = app
            .clone()
            .oneshot(get_request("/api/status", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(get_request("/api/status", Some("wrong")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(get_request("/api/status", Some("secret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn without_a_configured_token_the_service_is_open() {
        let (state, _dir) = test_state(None);
        let app = router(state);

        let response = app.oneshot(get_request("/api/status", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn confirm_is_created_then_duplicate() {
        let (state, _dir) = test_state(None);
        let app = router(state);
        let body = serde_json::json!({"medication": "VitD", "time": "12:00"});

        let response = app
            .clone()
            .oneshot(post_json("/api/confirm", None, body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["outcome"], "created");
        assert_eq!(json["medication"], "VitD");
        assert!(json["confirmed_at"].is_string());

        let response = app
            .oneshot(post_json("/api/confirm", None, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["outcome"], "duplicate");
        assert!(json.get("confirmed_at").is_none());
    }

    #[tokio::test]
    async fn confirm_rejects_unknown_inputs() {
        let (state, _dir) = test_state(None);
        let app = router(state);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/confirm",
                None,
                serde_json::json!({"medication": "Ibuprofen", "time": "12:00"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");

        let response = app
            .oneshot(post_json(
                "/api/confirm",
                None,
                serde_json::json!({"medication": "VitD", "time": "noon"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn confirmed_dose_disappears_from_status() {
        let (state, _dir) = test_state(None);
        let app = router(state);

        app.clone()
            .oneshot(post_json(
                "/api/confirm",
                None,
                serde_json::json!({"medication": "VitD", "time": "12:00"}),
            ))
            .await
            .unwrap();

        let response = app.oneshot(get_request("/api/status", None)).await.unwrap();
        let json = body_json(response).await;
        for list in ["overdue", "due", "upcoming"] {
            for item in json[list].as_array().unwrap() {
                assert_ne!(item["medication"], "VitD", "VitD must be excluded");
            }
        }
    }

    #[tokio::test]
    async fn snoozed_dose_surfaces_as_upcoming() {
        let (state, _dir) = test_state(None);
        let app = router(state);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/snooze",
                None,
                serde_json::json!({"medication": "Statin", "time": "20:00"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["medication"], "Statin");
        assert!(json["snoozed_until"].is_string());

        let response = app.oneshot(get_request("/api/status", None)).await.unwrap();
        let json = body_json(response).await;

        let in_upcoming = json["upcoming"]
            .as_array()
            .unwrap()
            .iter()
            .any(|i| i["medication"] == "Statin" && i["time"] == "20:00");
        assert!(in_upcoming, "snoozed dose must be listed as upcoming");

        for list in ["overdue", "due"] {
            let suppressed = json[list]
                .as_array()
                .unwrap()
                .iter()
                .all(|i| !(i["medication"] == "Statin" && i["time"] == "20:00"));
            assert!(suppressed, "snoozed dose must not be {list}");
        }
    }

    #[tokio::test]
    async fn snooze_rejects_out_of_range_duration() {
        let (state, _dir) = test_state(None);
        let app = router(state);

        let response = app
            .oneshot(post_json(
                "/api/snooze",
                None,
                serde_json::json!({"medication": "Statin", "time": "20:00", "minutes": 0}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn history_lists_confirmations() {
        let (state, _dir) = test_state(None);
        let app = router(state);

        for (medication, time) in [("Statin", "08:00"), ("VitD", "12:00")] {
            app.clone()
                .oneshot(post_json(
                    "/api/confirm",
                    None,
                    serde_json::json!({"medication": medication, "time": time}),
                ))
                .await
                .unwrap();
        }

        let response = app.oneshot(get_request("/api/history", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["days"], 7);
        assert_eq!(json["history"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn history_days_out_of_range_falls_back_to_default() {
        let (state, _dir) = test_state(None);
        let app = router(state);

        let response = app
            .oneshot(get_request("/api/history?days=9999", None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["days"], 7);
    }

    #[tokio::test]
    async fn config_roundtrip_and_validation() {
        let (state, _dir) = test_state(None);
        let app = router(state);

        let response = app.clone().oneshot(get_request("/api/config", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let mut document = body_json(response).await;
        assert_eq!(document["medications"].as_array().unwrap().len(), 2);

        // Replace with a grown document
        document["medications"].as_array_mut().unwrap().push(
            serde_json::json!({"name": "Iron", "times": ["07:30"], "days": ["Mon"]}),
        );
        let request = Request::builder()
            .method("PUT")
            .uri("/api/config")
            .header("Content-Type", "application/json")
            .body(Body::from(document.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.clone().oneshot(get_request("/api/config", None)).await.unwrap();
        let document = body_json(response).await;
        assert_eq!(document["medications"].as_array().unwrap().len(), 3);

        // An invalid replacement is rejected and leaves the file alone
        let request = Request::builder()
            .method("PUT")
            .uri("/api/config")
            .header("Content-Type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "medications": [{"name": "Bad", "times": ["25:99"]}],
                    "settings": {"timezone": "Europe/Berlin"}
                })
                .to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(get_request("/api/config", None)).await.unwrap();
        let document = body_json(response).await;
        assert_eq!(document["medications"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unreadable_log_fails_unless_degraded_is_requested() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("reminder.toml");
        std::fs::write(&config_path, SCHEDULE).unwrap();

        // The log path is a directory: every read and write fails
        let engine = ReminderEngine::new(
            TomlScheduleSource::new(config_path),
            JsonlIntakeLog::new(dir.path()),
        );
        let state = Arc::new(AppState {
            engine,
            auth_token: None,
        });
        let app = router(state);

        let response = app.clone().oneshot(get_request("/api/status", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await["error"]["code"],
            "STORAGE_UNAVAILABLE"
        );

        let response = app
            .oneshot(get_request("/api/status?degraded=true", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["degraded"], true);
    }
}
