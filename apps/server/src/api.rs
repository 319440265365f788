//! REST query surface.

use crate::session::{UserId, UserSettings};
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use spread_core::{ComparisonResult, HistoryRecord, LogError, PersistedEntry};
use spread_engine::{rank, StatsSummary};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Default page size for persisted log reads.
const LOG_LIMIT: usize = 100;

/// Create the API router.
pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/spreads", get(spreads_handler))
        .route("/api/compare/:symbol", get(compare_handler))
        .route("/api/history/:symbol", get(history_handler))
        .route("/api/log/:symbol", get(log_handler))
        .route(
            "/api/users/:id/settings",
            get(get_settings_handler)
                .put(put_settings_handler)
                .delete(delete_settings_handler),
        )
        .route("/api/users/:id/tokens/:symbol", post(toggle_token_handler))
        .route("/api/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

/// Serve the API until `shutdown` resolves.
pub async fn serve(
    state: SharedState,
    port: u16,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API listening on http://0.0.0.0:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

#[derive(Debug)]
pub struct ApiError(LogError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "Persisted log unavailable");
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
    }
}

impl From<LogError> for ApiError {
    fn from(err: LogError) -> Self {
        ApiError(err)
    }
}

#[derive(Debug, Deserialize)]
pub struct SpreadsQuery {
    pub limit: Option<usize>,
    pub user: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TokenToggle {
    pub symbol: String,
    pub tracked: bool,
    pub settings: UserSettings,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub comparator: StatsSummary,
    pub users: usize,
    pub tokens: usize,
    pub uptime_secs: u64,
}

async fn health_handler() -> &'static str {
    "OK"
}

/// Ranked spreads across every supported token.
async fn spreads_handler(
    State(state): State<SharedState>,
    Query(query): Query<SpreadsQuery>,
) -> Json<Vec<ComparisonResult>> {
    let orchestrator = &state.orchestrator;
    let limit = query.limit.unwrap_or(orchestrator.config().top_n);
    let results = orchestrator.compare_all().await;

    let ranked = match query.user {
        Some(id) => {
            let settings = state.sessions.get(UserId(id));
            let accepted: Vec<ComparisonResult> =
                results.into_iter().filter(|r| settings.accepts(r)).collect();
            rank(&accepted, limit)
        }
        None => rank(&results, limit),
    };
    Json(ranked)
}

async fn compare_handler(
    State(state): State<SharedState>,
    Path(symbol): Path<String>,
) -> Json<ComparisonResult> {
    Json(state.orchestrator.compare(&symbol).await)
}

async fn history_handler(
    State(state): State<SharedState>,
    Path(symbol): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<HistoryRecord>> {
    let limit = query
        .limit
        .unwrap_or(state.orchestrator.config().history_capacity);
    Json(state.orchestrator.history(&symbol, limit))
}

async fn log_handler(
    State(state): State<SharedState>,
    Path(symbol): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<PersistedEntry>>, ApiError> {
    let limit = query.limit.unwrap_or(LOG_LIMIT);
    let entries = state.orchestrator.persisted(&symbol, limit).await?;
    Ok(Json(entries))
}

async fn get_settings_handler(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Json<UserSettings> {
    Json(state.sessions.get(UserId(id)))
}

async fn put_settings_handler(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(settings): Json<UserSettings>,
) -> Json<UserSettings> {
    Json(state.sessions.update(UserId(id), settings))
}

async fn delete_settings_handler(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> StatusCode {
    match state.sessions.remove(UserId(id)) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

/// Flip whether the user follows `symbol`.
async fn toggle_token_handler(
    State(state): State<SharedState>,
    Path((id, symbol)): Path<(i64, String)>,
) -> Response {
    let registry = state.orchestrator.registry();
    let Some(token) = registry.get(&symbol) else {
        let body = Json(serde_json::json!({ "error": format!("Token {} not supported", symbol.to_uppercase()) }));
        return (StatusCode::NOT_FOUND, body).into_response();
    };

    let user = UserId(id);
    let tracked = state.sessions.toggle_token(user, &token.symbol, &registry.symbols());
    Json(TokenToggle {
        symbol: token.symbol.to_string(),
        tracked,
        settings: state.sessions.get(user),
    })
    .into_response()
}

async fn stats_handler(State(state): State<SharedState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        comparator: state.orchestrator.stats(),
        users: state.sessions.len(),
        tokens: state.orchestrator.registry().len(),
        uptime_secs: state.uptime_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_state;
    use axum::body::Body;
    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use spread_engine::mock::{quote_for_price, MockCexProvider, MockDexProvider};
    use tower::ServiceExt;

    const SOL_MINT: &str = "So11111111111111111111111111111111111111112";
    const JUP_MINT: &str = "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN";

    fn state() -> SharedState {
        let cex = MockCexProvider::new()
            .with_price("SOL", 150.0, 1_000.0)
            .with_price("JUP", 1.0, 100_000.0);
        let dex = MockDexProvider::new()
            .with_quote(SOL_MINT, quote_for_price(153.0, 9, 2_000_000.0))
            .with_quote(JUP_MINT, quote_for_price(1.005, 6, 500_000.0));
        test_state(cex, dex)
    }

    async fn send(state: &SharedState, request: Request<Body>) -> (StatusCode, Value) {
        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = create_router(state()).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_compare_valid() {
        let state = state();
        let (status, body) = send(&state, get("/api/compare/sol")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "SOL");
        assert_eq!(body["is_valid"], true);
        assert_eq!(body["error"], Value::Null);
        assert!((body["spread_pct"].as_f64().unwrap() - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_compare_unsupported_is_ok_but_invalid() {
        let state = state();
        let (status, body) = send(&state, get("/api/compare/DOGE")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_valid"], false);
        assert_eq!(body["error"], "Token DOGE not supported");
        assert_eq!(body["error_kind"], "UnsupportedSymbol");
    }

    #[tokio::test]
    async fn test_spreads_ranked() {
        let state = state();
        let (status, body) = send(&state, get("/api/spreads?limit=5")).await;
        assert_eq!(status, StatusCode::OK);
        let symbols: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["symbol"].as_str().unwrap())
            .collect();
        assert_eq!(symbols, vec!["SOL", "JUP"]);
    }

    #[tokio::test]
    async fn test_spreads_filtered_by_user_threshold() {
        let state = state();
        state.sessions.update(UserId(9), UserSettings::default());
        // JUP at +0.5% is under the default 1% threshold.
        let (_, body) = send(&state, get("/api/spreads?user=9")).await;
        let results = body.as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["symbol"], "SOL");
    }

    #[tokio::test]
    async fn test_history_and_log_after_compare() {
        let state = state();
        send(&state, get("/api/compare/SOL")).await;
        send(&state, get("/api/compare/SOL")).await;

        let (_, history) = send(&state, get("/api/history/SOL?limit=1")).await;
        assert_eq!(history.as_array().unwrap().len(), 1);

        let (status, log) = send(&state, get("/api/log/SOL")).await;
        assert_eq!(status, StatusCode::OK);
        let entries = log.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0]["id"].as_i64() > entries[1]["id"].as_i64());
    }

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let state = state();
        let (_, defaults) = send(&state, get("/api/users/3/settings")).await;
        assert_eq!(defaults["notify_enabled"], true);

        let request = Request::builder()
            .method("PUT")
            .uri("/api/users/3/settings")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"spread_threshold": 2.5, "mode": "degen", "tracked_tokens": ["sol"]}"#))
            .unwrap();
        let (status, updated) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["tracked_tokens"], serde_json::json!(["SOL"]));

        let (_, stored) = send(&state, get("/api/users/3/settings")).await;
        assert_eq!(stored["spread_threshold"], 2.5);
        assert_eq!(stored["mode"], "degen");
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_toggle_token() {
        let state = state();
        let (status, body) = send(&state, request("POST", "/api/users/5/tokens/sol")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "SOL");
        assert_eq!(body["tracked"], false);
        let tracked = body["settings"]["tracked_tokens"].as_array().unwrap();
        assert_eq!(tracked.len(), 6);
        assert!(!tracked.contains(&Value::from("SOL")));

        let (_, body) = send(&state, request("POST", "/api/users/5/tokens/SOL")).await;
        assert_eq!(body["tracked"], true);
        assert_eq!(body["settings"]["tracked_tokens"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_toggle_unsupported_token() {
        let state = state();
        let (status, body) = send(&state, request("POST", "/api/users/5/tokens/doge")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Token DOGE not supported");
        assert!(state.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_delete_settings() {
        let state = state();
        state.sessions.update(UserId(4), UserSettings::default());

        let (status, _) = send(&state, request("DELETE", "/api/users/4/settings")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.sessions.is_empty());

        let (status, _) = send(&state, request("DELETE", "/api/users/4/settings")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stats() {
        let state = state();
        send(&state, get("/api/compare/JUP")).await;
        let (_, stats) = send(&state, get("/api/stats")).await;
        assert_eq!(stats["comparisons"], 1);
        assert_eq!(stats["valid"], 1);
        assert_eq!(stats["tokens"], 7);
    }
}
