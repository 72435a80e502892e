//! `mockall` doubles for the exchange and the reasoning service.

use async_trait::async_trait;
use common::models::{
    Asset, Classification, Decision, Fill, Order, OrderAck, Position, PositionSide, Profile, Side,
    TriggerRequest,
};
use exchange::{ExchangeClient, ExchangeError};
use mockall::mock;
use strategy::{Classifier, MarketContext};

mock! {
    pub Exchange {}

    #[async_trait]
    impl ExchangeClient for Exchange {
        async fn get_positions(&self) -> Result<Vec<Position>, ExchangeError>;
        async fn get_orders(&self, symbol: &str) -> Result<Vec<Order>, ExchangeError>;
        async fn get_plans(&self, symbol: &str) -> Result<Vec<Order>, ExchangeError>;
        async fn get_history(&self, symbol: &str) -> Result<Vec<Fill>, ExchangeError>;
        async fn get_fills(&self, symbol: &str) -> Result<Vec<Fill>, ExchangeError>;
        async fn get_assets(&self) -> Result<Vec<Asset>, ExchangeError>;
        async fn cancel_all(&self, symbol: &str) -> Result<OrderAck, ExchangeError>;
        async fn close_position(&self, symbol: &str) -> Result<OrderAck, ExchangeError>;
        async fn place_order(&self, symbol: &str, side: Side, size: &str) -> Result<OrderAck, ExchangeError>;
        async fn place_trigger(&self, request: &TriggerRequest) -> Result<OrderAck, ExchangeError>;
    }
}

mock! {
    pub Reasoner {}

    #[async_trait]
    impl Classifier for Reasoner {
        async fn classify(&self, context: &MarketContext) -> Classification;
    }
}

pub fn ack_ok() -> OrderAck {
    OrderAck {
        code: Some("00000".to_string()),
        msg: Some("success".to_string()),
        order_id: Some("596471064624628269".to_string()),
    }
}

pub fn ack_rejected(code: &str, msg: &str) -> OrderAck {
    OrderAck {
        code: Some(code.to_string()),
        msg: Some(msg.to_string()),
        order_id: None,
    }
}

pub fn position(symbol: &str, side: PositionSide, size: f64, leverage: f64) -> Position {
    Position {
        symbol: symbol.to_string(),
        side,
        size,
        leverage,
        open_value: 0.0,
        unrealized_pnl: 0.0,
    }
}

pub fn usdt(available: f64) -> Vec<Asset> {
    vec![Asset {
        coin: "USDT".to_string(),
        available,
        equity: available,
    }]
}

pub fn verdict(decision: Decision, profile: Profile) -> Classification {
    Classification {
        decision,
        profile,
        reason: "test verdict".to_string(),
    }
}

pub fn gateway_timeout() -> ExchangeError {
    ExchangeError::Status {
        status: 504,
        body: "gateway timeout".to_string(),
    }
}
