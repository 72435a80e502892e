use std::sync::Arc;
use std::time::Duration;

use common::config::Config;
use common::models::{
    Classification, InboundSignal, OrderAck, PlanType, Profile, Side, SignalError, TradeSignal,
    TriggerRequest,
};
use exchange::format::{adjust_size, format_price, sanitize_price, to_exchange_symbol};
use exchange::{ExchangeClient, ExchangeError};
use serde::Serialize;
use storage::{TradeMemory, TradeMemoryEntry};
use strategy::{Classifier, Gate, MarketContext, VetoReason, gate};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::services::reconciler::{PositionReconciler, ReconcileAction};
use crate::services::risk_sizer::RiskSizer;
use crate::services::symbol_locks::SymbolLocks;

const MIN_PROFIT_PCT: f64 = 0.015;
const STOP_FALLBACK_PCT: f64 = 0.02;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("malformed signal: {0}")]
    MalformedSignal(#[from] SignalError),
    #[error("entry rejected: code={code} msg={msg}")]
    EntryRejected { code: String, msg: String },
    #[error("entry failed: {0}")]
    EntryFailed(#[source] ExchangeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Classified,
    Gated,
    Reconciled,
    Sized,
    Entered,
    Protected,
    Recorded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionReport {
    pub symbol: String,
    pub side: Side,
    pub profile: Profile,
    pub risk_fraction: f64,
    pub size: String,
    pub stop_loss: String,
    pub take_profit: String,
    pub closed_opposite: bool,
    pub stop_loss_placed: bool,
    pub take_profit_placed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Vetoed {
        symbol: String,
        classification: Classification,
        reason: VetoReason,
    },
    Executed(ExecutionReport),
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutionSettings {
    pub default_leverage: f64,
    pub settle_after_close: Duration,
    pub settle_after_entry: Duration,
}

impl From<&Config> for ExecutionSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_leverage: config.default_leverage,
            settle_after_close: config.settle_after_close,
            settle_after_entry: config.settle_after_entry,
        }
    }
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            default_leverage: 20.0,
            settle_after_close: Duration::from_secs(2),
            settle_after_entry: Duration::from_secs(3),
        }
    }
}

pub struct ExecutionService {
    exchange: Arc<dyn ExchangeClient>,
    classifier: Arc<dyn Classifier>,
    memory: TradeMemory,
    sizer: RiskSizer,
    reconciler: PositionReconciler,
    locks: SymbolLocks,
    settings: ExecutionSettings,
}

impl ExecutionService {
    pub fn new(
        exchange: Arc<dyn ExchangeClient>,
        classifier: Arc<dyn Classifier>,
        memory: TradeMemory,
        settings: ExecutionSettings,
    ) -> Self {
        Self {
            sizer: RiskSizer::new(exchange.clone(), settings.default_leverage),
            reconciler: PositionReconciler::new(exchange.clone()),
            exchange,
            classifier,
            memory,
            locks: SymbolLocks::new(),
            settings,
        }
    }

    /// Malformed payloads fail before any network call.
    pub async fn handle(&self, raw: InboundSignal) -> Result<ExecutionOutcome, ExecutionError> {
        let signal = TradeSignal::try_from(raw).inspect_err(|e| {
            warn!("Rejecting malformed signal: {}", e);
        })?;
        self.execute(signal).await
    }

    pub async fn execute(&self, signal: TradeSignal) -> Result<ExecutionOutcome, ExecutionError> {
        let symbol = to_exchange_symbol(&signal.symbol);
        let _guard = self.locks.acquire(&symbol).await;

        info!(
            symbol = %symbol,
            stage = ?Stage::Received,
            side = %signal.side,
            price = signal.price,
            "Signal received: {}",
            signal.reason
        );

        let classification = self.classifier.classify(&MarketContext::from(&signal)).await;
        info!(
            symbol = %symbol,
            stage = ?Stage::Classified,
            decision = ?classification.decision,
            profile = %classification.profile,
            "Classifier verdict: {}",
            classification.reason
        );

        if let Gate::Veto(reason) = gate(&classification, signal.side) {
            warn!(symbol = %symbol, stage = ?Stage::Gated, "signal vetoed: {}", reason);
            return Ok(ExecutionOutcome::Vetoed {
                symbol,
                classification,
                reason,
            });
        }

        let profile = classification.profile;
        let risk_fraction = profile.risk_fraction();

        let closed_opposite = match self.reconciler.reconcile(&symbol, signal.side).await {
            ReconcileAction::ClosePosition(_) => {
                self.close_and_forget(&symbol).await;
                debug!(symbol = %symbol, "Waiting {:?} for close to settle", self.settings.settle_after_close);
                tokio::time::sleep(self.settings.settle_after_close).await;
                true
            }
            ReconcileAction::Noop => false,
        };
        info!(symbol = %symbol, stage = ?Stage::Reconciled, closed_opposite);

        let size = self
            .sizer
            .size_by_margin(&symbol, signal.price, risk_fraction)
            .await;
        info!(symbol = %symbol, stage = ?Stage::Sized, risk_fraction, size = %size);

        let ack = self
            .exchange
            .place_order(&symbol, signal.side, &size)
            .await
            .map_err(|e| match e {
                ExchangeError::Api { code, msg } => ExecutionError::EntryRejected { code, msg },
                other => ExecutionError::EntryFailed(other),
            })
            .and_then(ensure_accepted)
            .inspect_err(|e| error!(symbol = %symbol, stage = ?Stage::Entered, "entry rejected: {}", e))?;
        info!(
            symbol = %symbol,
            stage = ?Stage::Entered,
            order_id = ack.order_id.as_deref().unwrap_or("-"),
            "Entered {} {}",
            signal.side,
            size
        );

        debug!(symbol = %symbol, "Waiting {:?} for entry to settle", self.settings.settle_after_entry);
        tokio::time::sleep(self.settings.settle_after_entry).await;

        let (stop_loss, take_profit) = protective_levels(&symbol, &signal, profile);
        let protect_size = self.position_size(&symbol, signal.side, &size).await;
        let position_side = signal.side.position_side();

        let stop_loss_placed = self
            .place_trigger(TriggerRequest {
                symbol: symbol.clone(),
                plan_type: PlanType::LossPlan,
                trigger_price: stop_loss.clone(),
                size: protect_size.clone(),
                position_side,
            })
            .await;
        let take_profit_placed = self
            .place_trigger(TriggerRequest {
                symbol: symbol.clone(),
                plan_type: PlanType::ProfitPlan,
                trigger_price: take_profit.clone(),
                size: protect_size,
                position_side,
            })
            .await;
        info!(
            symbol = %symbol,
            stage = ?Stage::Protected,
            stop_loss = %stop_loss,
            take_profit = %take_profit,
            stop_loss_placed,
            take_profit_placed
        );

        self.memory
            .record(&symbol, TradeMemoryEntry::new(stop_loss.clone(), &take_profit, profile))
            .await;
        info!(symbol = %symbol, stage = ?Stage::Recorded, profile = %profile, "execution recorded");

        Ok(ExecutionOutcome::Executed(ExecutionReport {
            symbol,
            side: signal.side,
            profile,
            risk_fraction,
            size,
            stop_loss,
            take_profit,
            closed_opposite,
            stop_loss_placed,
            take_profit_placed,
        }))
    }

    /// The memory entry is dropped only once the exchange accepts the close.
    pub async fn close(&self, ticker: &str) -> Result<OrderAck, ExchangeError> {
        let symbol = to_exchange_symbol(ticker);
        let _guard = self.locks.acquire(&symbol).await;

        if let Err(e) = self.exchange.cancel_all(&symbol).await {
            warn!(symbol = %symbol, "Cancel-all before close failed: {}", e);
        }
        let ack = self.exchange.close_position(&symbol).await?;
        self.memory.remove(&symbol).await;
        info!(symbol = %symbol, "Position closed manually: {:?}", ack);
        Ok(ack)
    }

    async fn close_and_forget(&self, symbol: &str) {
        match self.exchange.close_position(symbol).await {
            Ok(ack) => {
                self.memory.remove(symbol).await;
                info!(symbol, "Closed opposite position: {:?}", ack);
            }
            Err(e) => error!(symbol, "Failed to close opposite position: {}", e),
        }
    }

    async fn position_size(&self, symbol: &str, side: Side, entry_size: &str) -> String {
        let wanted = side.position_side();
        match self.exchange.get_positions().await {
            Ok(positions) => positions
                .iter()
                .find(|p| p.symbol == symbol && p.side == wanted && p.size > 0.0)
                .map(|p| adjust_size(symbol, p.size))
                .unwrap_or_else(|| {
                    debug!(symbol, "Position not visible yet, protecting entry size {}", entry_size);
                    entry_size.to_string()
                }),
            Err(e) => {
                warn!(symbol, "Failed to re-read position, protecting entry size: {}", e);
                entry_size.to_string()
            }
        }
    }

    async fn place_trigger(&self, request: TriggerRequest) -> bool {
        match self.exchange.place_trigger(&request).await {
            Ok(ack) if ack.is_success() => {
                debug!(symbol = %request.symbol, "{} accepted at {}", request.plan_type, request.trigger_price);
                true
            }
            Ok(ack) => {
                error!(
                    symbol = %request.symbol,
                    "{} rejected: code={:?} msg={:?}",
                    request.plan_type,
                    ack.code,
                    ack.msg
                );
                false
            }
            Err(e) => {
                error!(symbol = %request.symbol, "{} failed: {}", request.plan_type, e);
                false
            }
        }
    }
}

fn ensure_accepted(ack: OrderAck) -> Result<OrderAck, ExecutionError> {
    if ack.is_success() {
        return Ok(ack);
    }
    Err(ExecutionError::EntryRejected {
        code: ack.code.unwrap_or_default(),
        msg: ack.msg.unwrap_or_default(),
    })
}

/// Unusable levels fall back to fixed offsets from entry.
pub fn protective_levels(symbol: &str, signal: &TradeSignal, profile: Profile) -> (String, String) {
    let entry = signal.price;
    let direction = signal.side.direction();

    let stop_loss = sanitize_price(symbol, signal.stop_loss, entry, -direction * STOP_FALLBACK_PCT);

    let raw_target = profile.target_rule().target_price(
        signal.side,
        entry,
        signal.take_profit_1,
        signal.take_profit_2,
    );
    let target = sanitize_price(symbol, raw_target, entry, direction * MIN_PROFIT_PCT);

    let profitable = target
        .parse::<f64>()
        .is_ok_and(|t| (t - entry) * direction > 0.0);
    if profitable {
        return (stop_loss, target);
    }

    let corrected = format_price(symbol, entry * (1.0 + direction * MIN_PROFIT_PCT));
    debug!(symbol, "Take-profit {} not beyond entry {}, using {}", target, entry, corrected);
    (stop_loss, corrected)
}
