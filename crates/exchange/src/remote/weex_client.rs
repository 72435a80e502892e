use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use common::config::ExchangeConfig;
use common::models::{Asset, Fill, Order, OrderAck, Position, Side, TriggerRequest};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method};
use serde_json::{Value, json};
use sha2::Sha256;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::client::ExchangeClient;
use crate::error::ExchangeError;
use crate::remote::responses::{
    AssetResponse, FillResponse, HistoryResponse, OrderResponse, PositionResponse, decode_ack,
    decode_list,
};

type HmacSha256 = Hmac<Sha256>;

const POSITIONS_PATH: &str = "/capi/v2/account/position/allPosition";
const ASSETS_PATH: &str = "/capi/v2/account/assets";
const ORDERS_PATH: &str = "/capi/v2/order/current";
const PLANS_PATH: &str = "/capi/v2/order/currentPlan";
const HISTORY_PATH: &str = "/capi/v2/order/history";
const FILLS_PATH: &str = "/capi/v2/order/fills";
const CANCEL_ALL_PATH: &str = "/capi/v2/order/cancelAllOrders";
const CLOSE_POSITIONS_PATH: &str = "/capi/v2/order/closePositions";
const PLACE_ORDER_PATH: &str = "/capi/v2/order/placeOrder";
const PLACE_TPSL_PATH: &str = "/capi/v2/order/placeTpSlOrder";

#[derive(Clone)]
pub struct WeexClient {
    client: Client,
    base_url: String,
    api_key: String,
    secret_key: String,
    passphrase: String,
}

impl WeexClient {
    pub fn new(config: &ExchangeConfig, timeout: Duration) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .user_agent("weex_sentinel/0.1.0")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
            passphrase: config.passphrase.clone(),
        })
    }

    /// `base64(HMAC-SHA256(secret, timestamp + METHOD + path + query + body))`
    fn sign(
        &self,
        timestamp: &str,
        method: &Method,
        path: &str,
        query: &str,
        body: &str,
    ) -> Result<String, ExchangeError> {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| ExchangeError::Signing(e.to_string()))?;
        mac.update(timestamp.as_bytes());
        mac.update(method.as_str().as_bytes());
        mac.update(path.as_bytes());
        mac.update(query.as_bytes());
        mac.update(body.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, ExchangeError> {
        let query = if params.is_empty() {
            String::new()
        } else {
            let joined = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            format!("?{}", joined)
        };
        self.send(Method::GET, path, &query, String::new()).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ExchangeError> {
        self.send(Method::POST, path, "", body.to_string()).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &str,
        body: String,
    ) -> Result<Value, ExchangeError> {
        let timestamp = Utc::now().timestamp_millis().to_string();
        let signature = self.sign(&timestamp, &method, path, query, &body)?;
        let url = format!("{}{}{}", self.base_url, path, query);

        debug!("{} {}{} body={}", method, path, query, body);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("ACCESS-KEY", &self.api_key)
            .header("ACCESS-SIGN", signature)
            .header("ACCESS-TIMESTAMP", &timestamp)
            .header("ACCESS-PASSPHRASE", &self.passphrase)
            .header("Content-Type", "application/json")
            .header("locale", "en-US");
        if method == Method::POST {
            request = request.body(body);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        debug!("{} {} -> {} {}", method, path, status, text);

        let value: Option<Value> = if text.trim().is_empty() {
            Some(Value::Null)
        } else {
            serde_json::from_str(&text).ok()
        };

        if let Some(err) = value.as_ref().and_then(business_error) {
            error!("WEEX {} {} rejected: {}", method, path, err);
            return Err(err);
        }

        if !status.is_success() {
            error!("WEEX {} {} failed: HTTP {} {}", method, path, status, text);
            return Err(ExchangeError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        match value {
            Some(value) => Ok(value),
            None => Ok(serde_json::from_str(&text)?),
        }
    }

    async fn cancel_kind(&self, symbol: &str, kind: &str) -> Result<OrderAck, ExchangeError> {
        let body = json!({ "symbol": symbol, "cancelOrderType": kind });
        decode_ack(self.post(CANCEL_ALL_PATH, &body).await?)
    }
}

/// An object carrying a non-success `code` is a business rejection, whatever the HTTP status.
fn business_error(value: &Value) -> Option<ExchangeError> {
    let code = match value.get("code")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if OrderAck::SUCCESS_CODES.contains(&code.trim()) {
        return None;
    }
    let msg = value
        .get("msg")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(ExchangeError::Api { code, msg })
}

fn client_oid() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl ExchangeClient for WeexClient {
    async fn get_positions(&self) -> Result<Vec<Position>, ExchangeError> {
        decode_list::<PositionResponse, _>(self.get(POSITIONS_PATH, &[]).await?)
    }

    async fn get_orders(&self, symbol: &str) -> Result<Vec<Order>, ExchangeError> {
        decode_list::<OrderResponse, _>(self.get(ORDERS_PATH, &[("symbol", symbol)]).await?)
    }

    async fn get_plans(&self, symbol: &str) -> Result<Vec<Order>, ExchangeError> {
        decode_list::<OrderResponse, _>(self.get(PLANS_PATH, &[("symbol", symbol)]).await?)
    }

    async fn get_history(&self, symbol: &str) -> Result<Vec<Fill>, ExchangeError> {
        let params = [("symbol", symbol), ("pageSize", "100")];
        decode_list::<HistoryResponse, _>(self.get(HISTORY_PATH, &params).await?)
    }

    async fn get_fills(&self, symbol: &str) -> Result<Vec<Fill>, ExchangeError> {
        let params = [("symbol", symbol), ("limit", "100")];
        decode_list::<FillResponse, _>(self.get(FILLS_PATH, &params).await?)
    }

    async fn get_assets(&self) -> Result<Vec<Asset>, ExchangeError> {
        decode_list::<AssetResponse, _>(self.get(ASSETS_PATH, &[]).await?)
    }

    async fn cancel_all(&self, symbol: &str) -> Result<OrderAck, ExchangeError> {
        let normal = self.cancel_kind(symbol, "normal").await;
        let plan = self.cancel_kind(symbol, "plan").await;
        normal.and(plan)
    }

    async fn close_position(&self, symbol: &str) -> Result<OrderAck, ExchangeError> {
        info!("Closing position on {}", symbol);
        let body = json!({ "symbol": symbol });
        decode_ack(self.post(CLOSE_POSITIONS_PATH, &body).await?)
    }

    async fn place_order(
        &self,
        symbol: &str,
        side: Side,
        size: &str,
    ) -> Result<OrderAck, ExchangeError> {
        // 1 = open long, 2 = open short
        let open_type = match side {
            Side::Buy => "1",
            Side::Sell => "2",
        };
        let body = json!({
            "symbol": symbol,
            "client_oid": client_oid(),
            "size": size,
            "type": open_type,
            "order_type": "0",
            "match_price": "1",
        });

        info!("Placing Order: {} {} {}", side, size, symbol);
        decode_ack(self.post(PLACE_ORDER_PATH, &body).await?)
    }

    async fn place_trigger(&self, request: &TriggerRequest) -> Result<OrderAck, ExchangeError> {
        let body = json!({
            "symbol": request.symbol,
            "clientOrderId": client_oid(),
            "planType": request.plan_type.as_str(),
            "triggerPrice": request.trigger_price,
            "executePrice": "0",
            "size": request.size,
            "positionSide": request.position_side.as_str(),
            "marginMode": 1,
        });

        info!(
            "Placing {} for {} {} @ {} size={}",
            request.plan_type, request.symbol, request.position_side, request.trigger_price, request.size
        );
        decode_ack(self.post(PLACE_TPSL_PATH, &body).await?)
    }
}
