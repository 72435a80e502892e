use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Long => "long",
            PositionSide::Short => "short",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "long" | "1" => Some(PositionSide::Long),
            "short" | "2" => Some(PositionSide::Short),
            _ => None,
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    pub size: f64,
    pub leverage: f64,
    pub open_value: f64,
    pub unrealized_pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub order_id: String,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub size: f64,
    pub price: f64,
    pub trigger_price: f64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fill {
    pub trade_id: String,
    pub order_id: String,
    pub symbol: String,
    pub side: String,
    pub price: f64,
    pub size: f64,
    pub fee: f64,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub coin: String,
    pub available: f64,
    pub equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    LossPlan,
    ProfitPlan,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::LossPlan => "loss_plan",
            PlanType::ProfitPlan => "profit_plan",
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerRequest {
    pub symbol: String,
    pub plan_type: PlanType,
    pub trigger_price: String,
    pub size: String,
    pub position_side: PositionSide,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderAck {
    pub code: Option<String>,
    pub msg: Option<String>,
    pub order_id: Option<String>,
}

impl OrderAck {
    pub const SUCCESS_CODES: [&'static str; 2] = ["0", "00000"];

    /// A sentinel code means success. Without any code the exchange must at
    /// least have assigned an order id.
    pub fn is_success(&self) -> bool {
        match self.code.as_deref() {
            Some(code) => Self::SUCCESS_CODES.contains(&code.trim()),
            None => self.order_id.as_deref().is_some_and(|id| !id.is_empty()),
        }
    }
}
