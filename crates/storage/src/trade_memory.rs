use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::models::Profile;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeMemoryEntry {
    pub stop_loss: String,
    /// Take-profit price with the profile label, e.g. `97000.0 (Standard)`.
    pub take_profit: String,
    pub profile: Profile,
    pub updated_at: DateTime<Utc>,
}

impl TradeMemoryEntry {
    pub fn new(stop_loss: String, take_profit: &str, profile: Profile) -> Self {
        Self {
            stop_loss,
            take_profit: format!("{} ({})", take_profit, profile),
            profile,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Clone, Default)]
pub struct TradeMemory {
    entries: Arc<RwLock<HashMap<String, TradeMemoryEntry>>>,
}

impl TradeMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, symbol: &str, entry: TradeMemoryEntry) {
        debug!("Trade memory {} -> SL={} TP={}", symbol, entry.stop_loss, entry.take_profit);
        let mut entries = self.entries.write().await;
        entries.insert(symbol.to_string(), entry);
    }

    pub async fn remove(&self, symbol: &str) -> Option<TradeMemoryEntry> {
        let mut entries = self.entries.write().await;
        entries.remove(symbol)
    }

    pub async fn get(&self, symbol: &str) -> Option<TradeMemoryEntry> {
        let entries = self.entries.read().await;
        entries.get(symbol).cloned()
    }

    pub async fn snapshot(&self) -> HashMap<String, TradeMemoryEntry> {
        self.entries.read().await.clone()
    }
}
