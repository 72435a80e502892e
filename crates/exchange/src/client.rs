use async_trait::async_trait;
use common::models::{Asset, Fill, Order, OrderAck, Position, Side, TriggerRequest};

use crate::error::ExchangeError;

#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn get_positions(&self) -> Result<Vec<Position>, ExchangeError>;

    async fn get_orders(&self, symbol: &str) -> Result<Vec<Order>, ExchangeError>;

    async fn get_plans(&self, symbol: &str) -> Result<Vec<Order>, ExchangeError>;

    async fn get_history(&self, symbol: &str) -> Result<Vec<Fill>, ExchangeError>;

    async fn get_fills(&self, symbol: &str) -> Result<Vec<Fill>, ExchangeError>;

    async fn get_assets(&self) -> Result<Vec<Asset>, ExchangeError>;

    async fn cancel_all(&self, symbol: &str) -> Result<OrderAck, ExchangeError>;

    async fn close_position(&self, symbol: &str) -> Result<OrderAck, ExchangeError>;

    async fn place_order(
        &self,
        symbol: &str,
        side: Side,
        size: &str,
    ) -> Result<OrderAck, ExchangeError>;

    async fn place_trigger(&self, request: &TriggerRequest) -> Result<OrderAck, ExchangeError>;
}
