//! HTTP Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use portfolio_dashboard::{DashboardView, Input};

use crate::session::{DashboardSession, SessionId};
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub provider_available: bool,
    pub models: Vec<String>,
    pub sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub view: DashboardView,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn session_not_found(id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("No dashboard session '{id}'"),
            code: "SESSION_NOT_FOUND".into(),
        }),
    )
}

async fn lookup(state: &AppState, id: &str) -> Result<std::sync::Arc<DashboardSession>, ApiError> {
    match SessionId::parse(id) {
        Some(id) => state.session(id).await.ok_or_else(|| session_not_found(&id.to_string())),
        None => Err(session_not_found(id)),
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/events", post(post_event))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider = state.driver.provider();
    let provider_available = provider.health_check().await.unwrap_or(false);
    let (name, models) = match provider.info().await {
        Ok(info) => (info.name, info.models.into_iter().map(|m| m.id).collect()),
        Err(e) => {
            tracing::warn!("Provider info unavailable: {}", e);
            (provider.name().to_string(), Vec::new())
        }
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: name,
        provider_available,
        models,
        sessions: state.session_count().await,
    })
}

/// Open a dashboard seeded with a fresh snapshot
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let snapshot = state.driver.load_snapshot().await.map_err(|e| {
        tracing::error!("Initial snapshot failed: {}", e);
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
                code: "SOURCE_ERROR".into(),
            }),
        )
    })?;

    let session = DashboardSession::new(snapshot);
    let response = SessionResponse {
        session_id: session.id(),
        created_at: session.created_at(),
        view: session.view().await,
    };
    state.insert(session).await;
    tracing::info!(session = %response.session_id, "session opened");

    Ok((StatusCode::CREATED, Json(response)))
}

/// Current render model
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DashboardView>, ApiError> {
    let session = lookup(&state, &id).await?;
    Ok(Json(session.view().await))
}

/// Apply one user input and return the updated render model
pub async fn post_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<Input>,
) -> Result<Json<DashboardView>, ApiError> {
    let session = lookup(&state, &id).await?;
    Ok(Json(session.apply(input, &state.driver).await))
}

/// Tear down a session, aborting in-flight work
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = SessionId::parse(&id).ok_or_else(|| session_not_found(&id))?;
    let session = state.remove(id).await.ok_or_else(|| session_not_found(&id.to_string()))?;
    session.shutdown().await;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use advisor_core::{AdvisorError, Completion, GenerationOptions, LlmProvider, Message, ModelInfo};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use portfolio_dashboard::{DashboardDriver, DriverConfig, MockPortfolioSource};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    pub(crate) struct StubProvider {
        reply: Option<String>,
        delay: Duration,
    }

    impl StubProvider {
        pub(crate) fn ok(text: &str) -> Self {
            Self { reply: Some(text.into()), delay: Duration::ZERO }
        }

        pub(crate) const fn failing() -> Self {
            Self { reply: None, delay: Duration::ZERO }
        }

        pub(crate) fn slow(delay: Duration) -> Self {
            Self { reply: Some("late".into()), delay }
        }
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "Stub"
        }

        async fn health_check(&self) -> advisor_core::Result<bool> {
            Ok(self.reply.is_some())
        }

        async fn complete(
            &self,
            _messages: &[Message],
            options: &GenerationOptions,
        ) -> advisor_core::Result<Completion> {
            tokio::time::sleep(self.delay).await;
            let content = self
                .reply
                .clone()
                .ok_or_else(|| AdvisorError::ProviderUnavailable("stub offline".into()))?;
            Ok(Completion {
                content,
                model: options.model.clone(),
                usage: None,
                truncated: false,
                finish_reason: None,
            })
        }

        async fn list_models(&self) -> advisor_core::Result<Vec<ModelInfo>> {
            Ok(vec![ModelInfo { id: "stub-flash".into(), name: "Stub Flash".into() }])
        }
    }

    pub(crate) fn driver(provider: StubProvider) -> Arc<DashboardDriver> {
        Arc::new(DashboardDriver::new(
            Arc::new(provider),
            Arc::new(MockPortfolioSource::new(Duration::ZERO)),
            DriverConfig::default(),
        ))
    }

    fn app(provider: StubProvider) -> (Router, AppState) {
        let state = AppState {
            driver: driver(provider),
            sessions: Arc::default(),
        };
        (router(state.clone()), state)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    async fn open(app: &Router) -> String {
        let (status, body) = send(app, "POST", "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(StubProvider::ok("-"));
        let (status, body) = send(&app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["provider"], "Stub");
        assert_eq!(body["provider_available"], true);
        assert_eq!(body["models"], json!(["stub-flash"]));
    }

    #[tokio::test]
    async fn test_create_session_returns_initial_view() {
        let (app, state) = app(StubProvider::ok("-"));
        let (status, body) = send(&app, "POST", "/api/sessions", None).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["view"]["balance"]["whole"], "$22,487,280");
        assert_eq!(body["view"]["advice"]["label"], "Generate Insights");
        assert_eq!(state.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_events_drive_the_dashboard() {
        let (app, _) = app(StubProvider::ok("-"));
        let id = open(&app).await;
        let uri = format!("/api/sessions/{id}/events");

        send(&app, "POST", &uri, Some(json!({"type": "touch_start", "y": 0.0, "scroll_top": 0.0}))).await;
        let (status, view) = send(&app, "POST", &uri, Some(json!({"type": "touch_move", "y": 100.0}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["content_offset"], 40.0);
        assert_eq!(view["indicator"]["opacity"], 1.0);

        let (_, view) = send(&app, "POST", &uri, Some(json!({"type": "touch_end"}))).await;
        assert_eq!(view["content_offset"], 0.0);
        assert_eq!(view["indicator"]["spinning"], false);
    }

    #[tokio::test]
    async fn test_advice_over_http() {
        let (app, state) = app(StubProvider::ok("• Keep 20% in stablecoins"));
        let id = open(&app).await;

        let (_, view) = send(&app, "POST", &format!("/api/sessions/{id}/events"), Some(json!({"type": "fetch_advice"}))).await;
        assert_eq!(view["advice"]["label"], "Analyzing...");
        assert_eq!(view["advice"]["enabled"], false);

        state.session(SessionId::parse(&id).unwrap()).await.unwrap().settle().await;

        let (_, view) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(view["advice"]["kind"], "advice");
        assert_eq!(view["advice"]["text"], "• Keep 20% in stablecoins");

        let (_, view) = send(&app, "POST", &format!("/api/sessions/{id}/events"), Some(json!({"type": "fetch_advice"}))).await;
        assert_eq!(view["advice"]["kind"], "advice");
        assert_eq!(state.session(SessionId::parse(&id).unwrap()).await.unwrap().in_flight().await, 0);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (app, state) = app(StubProvider::slow(Duration::from_secs(60)));
        let id = open(&app).await;
        send(&app, "POST", &format!("/api/sessions/{id}/events"), Some(json!({"type": "fetch_advice"}))).await;

        let (status, _) = send(&app, "DELETE", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.session_count().await, 0);

        let (status, body) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "SESSION_NOT_FOUND");
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_sessions_reaped() {
        let (app, state) = app(StubProvider::ok("-"));
        for _ in 0..3 {
            open(&app).await;
        }
        assert_eq!(state.session_count().await, 3);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(state.reap_idle(Duration::from_secs(60)).await, 3);

        let (_, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(body["sessions"], 0);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let (app, _) = app(StubProvider::ok("-"));

        let (status, body) = send(&app, "GET", "/api/sessions/garbage", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "SESSION_NOT_FOUND");

        let uri = format!("/api/sessions/{}", SessionId::new());
        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
