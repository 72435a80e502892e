use common::models::{Asset, Fill, Order, OrderAck, Position, PositionSide};
use common::serde_helpers::{f64_lenient, string_lenient, string_opt_lenient};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ExchangeError;
use crate::traits::RemoteResponse;

#[derive(Deserialize, Debug)]
pub struct PositionResponse {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub side: String,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub size: f64,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub leverage: f64,
    #[serde(default, alias = "openValue", deserialize_with = "f64_lenient")]
    pub open_value: f64,
    #[serde(default, alias = "unrealizePnl", alias = "unrealized_pnl", deserialize_with = "f64_lenient")]
    pub unrealize_pnl: f64,
}

impl RemoteResponse<Position> for PositionResponse {
    fn to_model(&self) -> Option<Position> {
        Some(Position {
            symbol: self.symbol.to_lowercase(),
            side: PositionSide::parse(&self.side)?,
            size: self.size,
            leverage: self.leverage,
            open_value: self.open_value,
            unrealized_pnl: self.unrealize_pnl,
        })
    }
}

#[derive(Deserialize, Debug)]
pub struct OrderResponse {
    #[serde(default, alias = "orderId", deserialize_with = "string_lenient")]
    pub order_id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default, deserialize_with = "string_lenient")]
    pub r#type: String,
    #[serde(default, alias = "orderType", deserialize_with = "string_lenient")]
    pub order_type: String,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub size: f64,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub price: f64,
    #[serde(default, alias = "triggerPrice", deserialize_with = "f64_lenient")]
    pub trigger_price: f64,
    #[serde(default, deserialize_with = "string_lenient")]
    pub status: String,
}

impl RemoteResponse<Order> for OrderResponse {
    fn to_model(&self) -> Option<Order> {
        Some(Order {
            order_id: self.order_id.clone(),
            symbol: self.symbol.to_lowercase(),
            side: self.r#type.clone(),
            order_type: self.order_type.clone(),
            size: self.size,
            price: self.price,
            trigger_price: self.trigger_price,
            status: self.status.clone(),
        })
    }
}

#[derive(Deserialize, Debug)]
pub struct HistoryResponse {
    #[serde(default, alias = "orderId", deserialize_with = "string_lenient")]
    pub order_id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default, deserialize_with = "string_lenient")]
    pub r#type: String,
    #[serde(default, alias = "priceAvg", deserialize_with = "f64_lenient")]
    pub price_avg: f64,
    #[serde(default, alias = "filledQty", deserialize_with = "f64_lenient")]
    pub filled_qty: f64,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub fee: f64,
    #[serde(default, alias = "createTime", deserialize_with = "f64_lenient")]
    pub create_time: f64,
}

impl RemoteResponse<Fill> for HistoryResponse {
    fn to_model(&self) -> Option<Fill> {
        Some(Fill {
            trade_id: self.order_id.clone(),
            order_id: self.order_id.clone(),
            symbol: self.symbol.to_lowercase(),
            side: self.r#type.clone(),
            price: self.price_avg,
            size: self.filled_qty,
            fee: self.fee,
            created_at: self.create_time as i64,
        })
    }
}

#[derive(Deserialize, Debug)]
pub struct FillResponse {
    #[serde(default, alias = "tradeId", deserialize_with = "string_lenient")]
    pub trade_id: String,
    #[serde(default, alias = "orderId", deserialize_with = "string_lenient")]
    pub order_id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default, deserialize_with = "string_lenient")]
    pub direction: String,
    #[serde(default, alias = "fillSize", deserialize_with = "f64_lenient")]
    pub fill_size: f64,
    #[serde(default, alias = "fillValue", deserialize_with = "f64_lenient")]
    pub fill_value: f64,
    #[serde(default, alias = "fillFee", deserialize_with = "f64_lenient")]
    pub fill_fee: f64,
    #[serde(default, alias = "createdTime", deserialize_with = "f64_lenient")]
    pub created_time: f64,
}

impl RemoteResponse<Fill> for FillResponse {
    fn to_model(&self) -> Option<Fill> {
        let price = if self.fill_size > 0.0 {
            self.fill_value / self.fill_size
        } else {
            0.0
        };
        Some(Fill {
            trade_id: self.trade_id.clone(),
            order_id: self.order_id.clone(),
            symbol: self.symbol.to_lowercase(),
            side: self.direction.clone(),
            price,
            size: self.fill_size,
            fee: self.fill_fee,
            created_at: self.created_time as i64,
        })
    }
}

#[derive(Deserialize, Debug)]
pub struct AssetResponse {
    #[serde(default, alias = "coinName", alias = "coin")]
    pub coin_name: String,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub available: f64,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub equity: f64,
}

impl RemoteResponse<Asset> for AssetResponse {
    fn to_model(&self) -> Option<Asset> {
        Some(Asset {
            coin: self.coin_name.to_uppercase(),
            available: self.available,
            equity: self.equity,
        })
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct AckResponse {
    #[serde(default, deserialize_with = "string_opt_lenient")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "string_opt_lenient")]
    pub msg: Option<String>,
    #[serde(default, alias = "orderId", deserialize_with = "string_opt_lenient")]
    pub order_id: Option<String>,
}

impl RemoteResponse<OrderAck> for AckResponse {
    fn to_model(&self) -> Option<OrderAck> {
        Some(OrderAck {
            code: self.code.clone(),
            msg: self.msg.clone(),
            order_id: self.order_id.clone(),
        })
    }
}

/// Decodes a listing that may be a bare array or wrapped as `{"data": ...}` / `{"list": ...}`,
/// converting each entry and skipping those that have no domain representation.
pub fn decode_list<R, T>(value: Value) -> Result<Vec<T>, ExchangeError>
where
    R: DeserializeOwned + RemoteResponse<T>,
{
    let items = unwrap_envelope(value);
    let raw: Vec<R> = match items {
        Value::Null => Vec::new(),
        other => serde_json::from_value(other)?,
    };
    Ok(raw.iter().filter_map(|r| r.to_model()).collect())
}

/// Looks inside a `data` envelope for the order id. Bulk endpoints answer
/// with a bare list; the first entry's `orderId`/`success` decide the outcome.
pub fn decode_ack(value: Value) -> Result<OrderAck, ExchangeError> {
    let value = match value {
        Value::Array(items) => return decode_bulk_ack(items),
        other => other,
    };
    if !value.is_object() {
        return Ok(OrderAck {
            msg: Some(value.to_string()),
            ..Default::default()
        });
    }

    let data = value.get("data").filter(|d| d.is_object()).cloned();
    let mut ack: AckResponse = serde_json::from_value(value)?;
    if ack.order_id.is_none() {
        if let Some(data) = data {
            let inner: AckResponse = serde_json::from_value(data)?;
            ack.order_id = inner.order_id;
        }
    }
    Ok(ack.to_model().unwrap_or_default())
}

fn decode_bulk_ack(items: Vec<Value>) -> Result<OrderAck, ExchangeError> {
    let Some(first) = items.into_iter().next().filter(Value::is_object) else {
        return Ok(OrderAck {
            msg: Some("empty acknowledgement".to_string()),
            ..Default::default()
        });
    };

    let success = match first.get("success") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
        _ => true,
    };
    let error_message = first
        .get("errorMessage")
        .or_else(|| first.get("msg"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let ack: AckResponse = serde_json::from_value(first)?;
    if !success {
        return Ok(OrderAck {
            code: ack.code,
            msg: error_message.or_else(|| Some("rejected".to_string())),
            order_id: None,
        });
    }
    Ok(OrderAck {
        msg: error_message.or(ack.msg.clone()),
        ..ack.to_model().unwrap_or_default()
    })
}

fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            for key in ["data", "list"] {
                if let Some(inner) = map.remove(key) {
                    return unwrap_envelope(inner);
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}
