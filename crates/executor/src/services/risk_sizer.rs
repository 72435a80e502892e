use std::sync::Arc;

use exchange::ExchangeClient;
use exchange::format::{adjust_size, symbol_rule};
use tracing::{debug, warn};

const MARGIN_COIN: &str = "USDT";

pub struct RiskSizer {
    exchange: Arc<dyn ExchangeClient>,
    default_leverage: f64,
}

impl RiskSizer {
    pub fn new(exchange: Arc<dyn ExchangeClient>, default_leverage: f64) -> Self {
        Self {
            exchange,
            default_leverage,
        }
    }

    pub async fn size_by_margin(&self, symbol: &str, entry_price: f64, risk_fraction: f64) -> String {
        let balance = self.available_balance().await;
        if balance <= 0.0 || !entry_price.is_finite() || entry_price <= 0.0 {
            let min_size = symbol_rule(symbol).min_size;
            warn!(
                symbol,
                balance, entry_price, "Cannot size by margin, using minimum size {}", min_size
            );
            return adjust_size(symbol, min_size);
        }

        let leverage = self.leverage_for(symbol).await;
        let raw = balance * risk_fraction * leverage / entry_price;
        let size = adjust_size(symbol, raw);
        debug!(
            symbol,
            balance, risk_fraction, leverage, raw, "Sized order at {}", size
        );
        size
    }

    async fn available_balance(&self) -> f64 {
        match self.exchange.get_assets().await {
            Ok(assets) => assets
                .iter()
                .find(|a| a.coin.eq_ignore_ascii_case(MARGIN_COIN))
                .map(|a| a.available)
                .filter(|v| v.is_finite())
                .unwrap_or(0.0),
            Err(e) => {
                warn!("Failed to fetch assets: {}", e);
                0.0
            }
        }
    }

    async fn leverage_for(&self, symbol: &str) -> f64 {
        match self.exchange.get_positions().await {
            Ok(positions) => positions
                .iter()
                .find(|p| p.symbol == symbol && p.leverage > 0.0)
                .map(|p| p.leverage)
                .unwrap_or(self.default_leverage),
            Err(e) => {
                warn!(symbol, "Failed to fetch positions for leverage: {}", e);
                self.default_leverage
            }
        }
    }
}
