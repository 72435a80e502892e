use std::sync::Arc;

use common::models::{Position, Side};
use exchange::ExchangeClient;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileAction {
    Noop,
    /// An opposite-side position is open; the caller closes it and waits for settlement.
    ClosePosition(Position),
}

pub struct PositionReconciler {
    exchange: Arc<dyn ExchangeClient>,
}

impl PositionReconciler {
    pub fn new(exchange: Arc<dyn ExchangeClient>) -> Self {
        Self { exchange }
    }

    pub async fn reconcile(&self, symbol: &str, desired: Side) -> ReconcileAction {
        match self.exchange.cancel_all(symbol).await {
            Ok(ack) => debug!(symbol, "Cancelled pending orders: {:?}", ack),
            Err(e) => warn!(symbol, "Cancel-all failed, continuing: {}", e),
        }

        let positions = match self.exchange.get_positions().await {
            Ok(positions) => positions,
            Err(e) => {
                warn!(symbol, "Failed to read positions, assuming flat: {}", e);
                return ReconcileAction::Noop;
            }
        };

        let wanted = desired.position_side();
        let open: Vec<&Position> = positions
            .iter()
            .filter(|p| p.symbol == symbol && p.size > 0.0)
            .collect();

        if let Some(opposite) = open.iter().find(|p| p.side != wanted) {
            info!(
                symbol,
                side = %opposite.side,
                size = opposite.size,
                "Opposite position open, closing before {} entry",
                desired
            );
            return ReconcileAction::ClosePosition((*opposite).clone());
        }

        if let Some(same) = open.first() {
            info!(symbol, size = same.size, "Adding to existing {} position", same.side);
        } else {
            debug!(symbol, "No open position");
        }
        ReconcileAction::Noop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mocks::{MockExchange, ack_ok, gateway_timeout, position};
    use common::models::PositionSide;
    use mockall::Sequence;

    const BTC: &str = "cmt_btcusdt";

    fn reconciler(exchange: MockExchange) -> PositionReconciler {
        PositionReconciler::new(Arc::new(exchange))
    }

    #[tokio::test]
    async fn test_flat_is_noop_after_cancel() {
        let mut seq = Sequence::new();
        let mut exchange = MockExchange::new();
        exchange
            .expect_cancel_all()
            .withf(|s| s == BTC)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ack_ok()));
        exchange
            .expect_get_positions()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![position("cmt_ethusdt", PositionSide::Short, 1.0, 20.0)]));

        assert_eq!(reconciler(exchange).reconcile(BTC, Side::Buy).await, ReconcileAction::Noop);
    }

    #[tokio::test]
    async fn test_same_side_is_noop() {
        let mut exchange = MockExchange::new();
        exchange.expect_cancel_all().returning(|_| Ok(ack_ok()));
        exchange
            .expect_get_positions()
            .returning(|| Ok(vec![position(BTC, PositionSide::Short, 0.01, 20.0)]));

        assert_eq!(reconciler(exchange).reconcile(BTC, Side::Sell).await, ReconcileAction::Noop);
    }

    #[tokio::test]
    async fn test_opposite_side_requests_close() {
        let mut exchange = MockExchange::new();
        exchange.expect_cancel_all().returning(|_| Ok(ack_ok()));
        exchange
            .expect_get_positions()
            .returning(|| Ok(vec![position(BTC, PositionSide::Short, 0.02, 20.0)]));

        let action = reconciler(exchange).reconcile(BTC, Side::Buy).await;
        assert!(matches!(
            action,
            ReconcileAction::ClosePosition(ref p) if p.side == PositionSide::Short && p.size == 0.02
        ));
    }

    #[tokio::test]
    async fn test_hedged_positions_close_the_opposite_leg() {
        let mut exchange = MockExchange::new();
        exchange.expect_cancel_all().returning(|_| Ok(ack_ok()));
        exchange.expect_get_positions().returning(|| {
            Ok(vec![
                position(BTC, PositionSide::Long, 0.01, 20.0),
                position(BTC, PositionSide::Short, 0.03, 20.0),
            ])
        });

        let action = reconciler(exchange).reconcile(BTC, Side::Sell).await;
        assert!(matches!(action, ReconcileAction::ClosePosition(ref p) if p.side == PositionSide::Long));
    }

    #[tokio::test]
    async fn test_exchange_failures_are_skipped() {
        let mut exchange = MockExchange::new();
        exchange.expect_cancel_all().times(1).returning(|_| Err(gateway_timeout()));
        exchange
            .expect_get_positions()
            .times(1)
            .returning(|| Err(gateway_timeout()));

        assert_eq!(reconciler(exchange).reconcile(BTC, Side::Buy).await, ReconcileAction::Noop);
    }
}
