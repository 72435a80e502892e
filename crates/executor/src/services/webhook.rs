use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::models::{Fill, InboundSignal, Order, Position};
use exchange::ExchangeClient;
use exchange::format::to_exchange_symbol;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use storage::{TradeMemory, TradeMemoryEntry};
use tracing::{info, warn};

use crate::services::execution_service::{
    ExecutionError, ExecutionOutcome, ExecutionReport, ExecutionService,
};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ExecutionService>,
    pub exchange: Arc<dyn ExchangeClient>,
    pub memory: TradeMemory,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/test_trend", get(test_trend))
        .route("/test_moon", get(test_moon))
        .route("/test_crash", get(test_crash))
        .route("/close", post(close))
        .route("/trades", get(trades))
        .route("/activity/{ticker}", get(activity))
        .with_state(state)
}

#[derive(Serialize)]
struct Success<'a> {
    status: &'static str,
    #[serde(flatten)]
    report: &'a ExecutionReport,
}

type Reply = (StatusCode, Json<Value>);

fn reply(result: Result<ExecutionOutcome, ExecutionError>) -> Reply {
    match result {
        Ok(ExecutionOutcome::Executed(report)) => {
            let body = serde_json::to_value(Success {
                status: "success",
                report: &report,
            })
            .unwrap_or_else(|_| json!({ "status": "success" }));
            (StatusCode::OK, Json(body))
        }
        Ok(ExecutionOutcome::Vetoed {
            symbol,
            classification,
            reason,
        }) => (
            StatusCode::OK,
            Json(json!({
                "status": "blocked",
                "symbol": symbol,
                "profile": classification.profile,
                "reason": reason.to_string(),
            })),
        ),
        Err(e @ ExecutionError::MalformedSignal(_)) => bad_request(e.to_string()),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "status": "error", "message": e.to_string() })),
        ),
    }
}

fn bad_request(message: String) -> Reply {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "status": "error", "message": message })),
    )
}

async fn webhook(
    State(state): State<AppState>,
    payload: Result<Json<InboundSignal>, JsonRejection>,
) -> Reply {
    match payload {
        Ok(Json(signal)) => reply(state.service.handle(signal).await),
        Err(rejection) => {
            warn!("Rejecting unreadable signal: {}", rejection.body_text());
            bad_request(rejection.body_text())
        }
    }
}

fn drill(ticker: &str, adx: f64, volatility: &str, reason: &str) -> InboundSignal {
    InboundSignal {
        ticker: Some(ticker.to_string()),
        action: Some("buy".to_string()),
        price: 95_000.0,
        sl: 94_000.0,
        tp1: 96_000.0,
        tp2: 97_000.0,
        trend: Some("Uptrend".to_string()),
        volatility: Some(volatility.to_string()),
        adx,
        reason: Some(reason.to_string()),
    }
}

async fn test_trend(State(state): State<AppState>) -> Reply {
    info!("Running trend drill");
    reply(state.service.handle(drill("BTC_USDT", 20.0, "Normal", "Trend drill")).await)
}

async fn test_moon(State(state): State<AppState>) -> Reply {
    info!("Running parabolic drill");
    reply(state.service.handle(drill("BTC_USDT", 75.0, "High", "Moon drill")).await)
}

async fn test_crash(State(state): State<AppState>) -> Reply {
    info!("Running crash drill");
    reply(state.service.handle(drill("CRASH_BTC", 20.0, "Extreme", "Crash drill")).await)
}

#[derive(Debug, Deserialize)]
struct CloseRequest {
    #[serde(default)]
    ticker: Option<String>,
}

async fn close(
    State(state): State<AppState>,
    payload: Result<Json<CloseRequest>, JsonRejection>,
) -> Reply {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let Some(ticker) = request.ticker.filter(|t| !t.trim().is_empty()) else {
        return bad_request("missing ticker".to_string());
    };

    match state.service.close(&ticker).await {
        Ok(ack) => (
            StatusCode::OK,
            Json(json!({
                "status": "closed",
                "symbol": to_exchange_symbol(&ticker),
                "ack": ack,
            })),
        ),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "status": "error", "message": e.to_string() })),
        ),
    }
}

async fn trades(State(state): State<AppState>) -> Json<HashMap<String, TradeMemoryEntry>> {
    Json(state.memory.snapshot().await)
}

#[derive(Debug, Serialize)]
struct Activity {
    symbol: String,
    positions: Vec<Position>,
    orders: Vec<Order>,
    plans: Vec<Order>,
    history: Vec<Fill>,
    fills: Vec<Fill>,
}

/// Read-only view of one symbol's exchange state. Failed reads show up empty.
async fn activity(State(state): State<AppState>, Path(ticker): Path<String>) -> Json<Activity> {
    let symbol = to_exchange_symbol(&ticker);
    let exchange = &state.exchange;
    let (positions, orders, plans, history, fills) = tokio::join!(
        exchange.get_positions(),
        exchange.get_orders(&symbol),
        exchange.get_plans(&symbol),
        exchange.get_history(&symbol),
        exchange.get_fills(&symbol),
    );

    let activity = Activity {
        positions: or_empty(&symbol, "positions", positions)
            .into_iter()
            .filter(|p| p.symbol == symbol)
            .collect(),
        orders: or_empty(&symbol, "orders", orders),
        plans: or_empty(&symbol, "plans", plans),
        history: or_empty(&symbol, "history", history),
        fills: or_empty(&symbol, "fills", fills),
        symbol,
    };
    Json(activity)
}

fn or_empty<T, E: std::fmt::Display>(symbol: &str, what: &str, result: Result<Vec<T>, E>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(symbol, "Failed to fetch {}: {}", what, e);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::execution_service::ExecutionSettings;
    use crate::services::mocks::{
        MockExchange, MockReasoner, ack_ok, ack_rejected, gateway_timeout, position, usdt, verdict,
    };
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use common::models::{Decision, PositionSide, Profile};
    use tower::ServiceExt;

    fn app(exchange: MockExchange, reasoner: MockReasoner) -> (Router, TradeMemory) {
        let exchange: Arc<dyn ExchangeClient> = Arc::new(exchange);
        let memory = TradeMemory::new();
        let service = ExecutionService::new(
            exchange.clone(),
            Arc::new(reasoner),
            memory.clone(),
            ExecutionSettings::default(),
        );
        let state = AppState {
            service: Arc::new(service),
            exchange,
            memory: memory.clone(),
        };
        (router(state), memory)
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_malformed_webhook_is_bad_request() {
        let mut reasoner = MockReasoner::new();
        reasoner.expect_classify().never();
        let (app, _) = app(MockExchange::new(), reasoner);

        let (status, body) = call(
            app,
            "POST",
            "/webhook",
            Some(json!({"action": "buy", "price": "95000"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_unreadable_webhook_bodies_are_bad_request() {
        let mut reasoner = MockReasoner::new();
        reasoner.expect_classify().never();
        let (app, _) = app(MockExchange::new(), reasoner);

        let (status, body) = call(
            app.clone(),
            "POST",
            "/webhook",
            Some(json!({"ticker": "BTC_USDT", "action": "buy", "price": "abc"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("price"));

        let (status, body) = call(
            app.clone(),
            "POST",
            "/webhook",
            Some(json!({"ticker": 42, "action": "buy", "price": 95000})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");

        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .body(Body::from("ticker=BTC_USDT&action=buy"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_crash_drill_is_blocked() {
        let mut reasoner = MockReasoner::new();
        reasoner
            .expect_classify()
            .withf(|ctx| ctx.symbol == "CRASH_BTC")
            .times(1)
            .returning(|_| verdict(Decision::Approved, Profile::BlackSwan));
        let (app, _) = app(MockExchange::new(), reasoner);

        let (status, body) = call(app, "GET", "/test_crash", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "blocked");
        assert_eq!(body["profile"], "BlackSwan");
    }

    #[tokio::test]
    async fn test_rejected_entry_is_bad_gateway() {
        let mut exchange = MockExchange::new();
        exchange.expect_cancel_all().returning(|_| Ok(ack_ok()));
        exchange.expect_get_positions().returning(|| Ok(vec![]));
        exchange.expect_get_assets().returning(|| Ok(usdt(1_000.0)));
        exchange
            .expect_place_order()
            .returning(|_, _, _| Ok(ack_rejected("40015", "insufficient balance")));
        let mut reasoner = MockReasoner::new();
        reasoner
            .expect_classify()
            .returning(|_| verdict(Decision::Approved, Profile::Standard));
        let (app, _) = app(exchange, reasoner);

        let (status, body) = call(
            app,
            "POST",
            "/webhook",
            Some(json!({"ticker": "BTC_USDT", "action": "BUY", "price": "95000", "adx": 20})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["message"].as_str().unwrap().contains("40015"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trend_drill_reports_execution() {
        let mut exchange = MockExchange::new();
        exchange.expect_cancel_all().returning(|_| Ok(ack_ok()));
        exchange.expect_get_positions().returning(|| Ok(vec![]));
        exchange.expect_get_assets().returning(|| Ok(usdt(1_000.0)));
        exchange.expect_place_order().returning(|_, _, _| Ok(ack_ok()));
        exchange.expect_place_trigger().times(2).returning(|_| Ok(ack_ok()));
        let mut reasoner = MockReasoner::new();
        reasoner
            .expect_classify()
            .returning(|_| verdict(Decision::Approved, Profile::Standard));
        let (app, memory) = app(exchange, reasoner);

        let (status, body) = call(app, "GET", "/test_trend", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["size"], "0.006");
        assert_eq!(body["take_profit"], "97000.0");
        assert!(memory.get("cmt_btcusdt").await.is_some());
    }

    #[tokio::test]
    async fn test_close_and_trades() {
        let mut exchange = MockExchange::new();
        exchange.expect_cancel_all().times(1).returning(|_| Ok(ack_ok()));
        exchange.expect_close_position().times(1).returning(|_| Ok(ack_ok()));
        let (app, memory) = app(exchange, MockReasoner::new());
        memory
            .record(
                "cmt_btcusdt",
                TradeMemoryEntry::new("94000.0".into(), "97000.0", Profile::Standard),
            )
            .await;

        let (status, body) = call(app.clone(), "GET", "/trades", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cmt_btcusdt"]["take_profit"], "97000.0 (Standard)");

        let (status, _) = call(app.clone(), "POST", "/close", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(app.clone(), "POST", "/close", Some(json!({"ticker": "BTC_USDT"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "cmt_btcusdt");

        let (_, body) = call(app, "GET", "/trades", None).await;
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_activity_tolerates_failed_reads() {
        let mut exchange = MockExchange::new();
        exchange.expect_get_positions().returning(|| {
            Ok(vec![
                position("cmt_btcusdt", PositionSide::Long, 0.006, 20.0),
                position("cmt_ethusdt", PositionSide::Short, 1.0, 20.0),
            ])
        });
        exchange
            .expect_get_orders()
            .withf(|s| s == "cmt_btcusdt")
            .returning(|_| Ok(vec![]));
        exchange.expect_get_plans().returning(|_| Err(gateway_timeout()));
        exchange.expect_get_history().returning(|_| Ok(vec![]));
        exchange.expect_get_fills().returning(|_| Ok(vec![]));
        let (app, _) = app(exchange, MockReasoner::new());

        let (status, body) = call(app, "GET", "/activity/BTC_USDT", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "cmt_btcusdt");
        assert_eq!(body["positions"].as_array().unwrap().len(), 1);
        assert_eq!(body["plans"], json!([]));
    }
}
