use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::exchange::PositionSide;
use crate::serde_helpers::f64_lenient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }

    pub fn position_side(&self) -> PositionSide {
        match self {
            Side::Buy => PositionSide::Long,
            Side::Sell => PositionSide::Short,
        }
    }

    /// `+1.0` for buys, `-1.0` for sells. Multiplies distances into the favorable direction.
    pub fn direction(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "long" => Ok(Side::Buy),
            "sell" | "short" => Ok(Side::Sell),
            other => Err(SignalError::InvalidAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("missing ticker")]
    MissingTicker,
    #[error("missing action")]
    MissingAction,
    #[error("invalid action: {0:?}")]
    InvalidAction(String),
    #[error("invalid entry price: {0}")]
    InvalidPrice(f64),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundSignal {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub price: f64,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub sl: f64,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub tp1: f64,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub tp2: f64,
    #[serde(default)]
    pub trend: Option<String>,
    #[serde(default)]
    pub volatility: Option<String>,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub adx: f64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeSignal {
    pub symbol: String,
    pub side: Side,
    pub price: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub trend: String,
    pub volatility: String,
    pub strength: f64,
    pub reason: String,
}

impl TryFrom<InboundSignal> for TradeSignal {
    type Error = SignalError;

    fn try_from(raw: InboundSignal) -> Result<Self, Self::Error> {
        let symbol = raw
            .ticker
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(SignalError::MissingTicker)?;

        let side = raw
            .action
            .filter(|a| !a.trim().is_empty())
            .ok_or(SignalError::MissingAction)?
            .parse::<Side>()?;

        if !raw.price.is_finite() || raw.price <= 0.0 {
            return Err(SignalError::InvalidPrice(raw.price));
        }

        Ok(Self {
            symbol,
            side,
            price: raw.price,
            stop_loss: raw.sl,
            take_profit_1: raw.tp1,
            take_profit_2: raw.tp2,
            trend: raw.trend.unwrap_or_else(|| "Unknown".to_string()),
            volatility: raw.volatility.unwrap_or_else(|| "Unknown".to_string()),
            strength: raw.adx,
            reason: raw.reason.unwrap_or_default(),
        })
    }
}
