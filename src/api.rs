//! REST API server for the FP&A copilot
//!
//! Exposes question answering and the board snapshot over HTTP

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::month::{parse_month, Month};
use crate::planner::Planner;
use crate::report::build_board_report;
use crate::state::LedgerCache;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AskRequest {
    pub query: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct BoardParams {
    pub month: Option<String>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiReply = (StatusCode, Json<ApiResponse>);

fn failure(status: StatusCode, message: String) -> ApiReply {
    (status, Json(ApiResponse::error(message)))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub planner: Arc<Planner>,
    pub cache: Arc<LedgerCache>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "ledger_loaded": state.cache.is_loaded(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Question Endpoint
/// =============================

async fn ask(State(state): State<ApiState>, Json(req): Json<AskRequest>) -> ApiReply {
    let query = req.query.trim();
    if query.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Query must not be empty".into());
    }

    info!(query = %query, "Received question");

    match state.planner.answer_cached(query, &state.cache) {
        Ok(answer) => (StatusCode::OK, Json(ApiResponse::success(answer))),
        Err(e) => {
            warn!(error = %e, "Question failed");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Could not answer: {}", e),
            )
        }
    }
}

/// =============================
/// Months Endpoint
/// =============================

async fn months(State(state): State<ApiState>) -> ApiReply {
    match state.cache.get_or_load() {
        Ok(data) => {
            let months: Vec<Month> = state.planner.available_months(&data);
            (StatusCode::OK, Json(ApiResponse::success(months)))
        }
        Err(e) => failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Could not load ledger: {}", e),
        ),
    }
}

/// =============================
/// Board Snapshot Endpoint
/// =============================

async fn board(State(state): State<ApiState>, Query(params): Query<BoardParams>) -> ApiReply {
    let requested = match params.month.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match parse_month(raw) {
            Ok(month) => Some(month),
            Err(e) => return failure(StatusCode::BAD_REQUEST, e.to_string()),
        },
        _ => None,
    };

    let data = match state.cache.get_or_load() {
        Ok(data) => data,
        Err(e) => {
            return failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Could not load ledger: {}", e),
            )
        }
    };

    let Some(month) = requested.or_else(|| data.latest_actual_month()) else {
        return failure(StatusCode::NOT_FOUND, "No actuals loaded".into());
    };

    let report = build_board_report(&state.planner, &data, month);
    let markdown = report.to_markdown();

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "report": report,
            "markdown": markdown,
        }))),
    )
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/ask", post(ask))
        .route("/api/months", get(months))
        .route("/api/board", get(board))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CashRow, FinanceData, LedgerRow};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn ym(year: i32, month: u32) -> Month {
        Month::new(year, month).unwrap()
    }

    fn test_state() -> ApiState {
        let m = ym(2025, 6);
        let data = FinanceData {
            actuals: vec![
                LedgerRow::new(ym(2025, 5), "A", "Revenue", 900.0),
                LedgerRow::new(m, "A", "Revenue", 1000.0),
                LedgerRow::new(m, "A", "COGS", 400.0),
                LedgerRow::new(m, "A", "Opex:Sales", 150.0),
            ],
            budget: vec![LedgerRow::new(m, "A", "Revenue", 900.0)],
            cash: vec![CashRow { month: m, cash_usd: 2000.0 }],
            fx: vec![],
        };
        ApiState {
            planner: Arc::new(Planner::default()),
            cache: Arc::new(LedgerCache::preloaded(data)),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = create_router(test_state())
            .oneshot(get_req("/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["ledger_loaded"], true);
    }

    #[tokio::test]
    async fn test_ask_returns_answer() {
        let response = create_router(test_state())
            .oneshot(post_json(
                "/api/ask",
                serde_json::json!({ "query": "Opex breakdown for June 2025" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["intent"], "opex_breakdown");
        assert_eq!(json["data"]["figure"]["kind"], "pie");
    }

    #[tokio::test]
    async fn test_ask_rejects_empty_query() {
        let response = create_router(test_state())
            .oneshot(post_json("/api/ask", serde_json::json!({ "query": "   " })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_ask_reports_load_failure() {
        let state = ApiState {
            planner: Arc::new(Planner::default()),
            cache: Arc::new(LedgerCache::new("/nonexistent/fpna-ledger")),
        };
        let response = create_router(state)
            .oneshot(post_json("/api/ask", serde_json::json!({ "query": "cash runway" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_months() {
        let response = create_router(test_state())
            .oneshot(get_req("/api/months"))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["data"], serde_json::json!(["2025-05", "2025-06"]));
    }

    #[tokio::test]
    async fn test_board_defaults_to_latest_month() {
        let response = create_router(test_state())
            .oneshot(get_req("/api/board"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["data"]["report"]["month"], "2025-06");
        assert_eq!(json["data"]["report"]["sections"].as_array().unwrap().len(), 4);
        assert!(json["data"]["markdown"]
            .as_str()
            .unwrap()
            .starts_with("# FP&A Snapshot: Jun 2025"));
    }

    #[tokio::test]
    async fn test_board_invalid_month() {
        let response = create_router(test_state())
            .oneshot(get_req("/api/board?month=2025-13"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
