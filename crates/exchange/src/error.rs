use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("exchange rejected request: code={code} msg={msg}")]
    Api { code: String, msg: String },
    #[error("failed to sign request: {0}")]
    Signing(String),
}
