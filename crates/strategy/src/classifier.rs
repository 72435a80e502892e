use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::config::ClassifierConfig;
use common::models::{Classification, Side, TradeSignal};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::chat::{ChatMessage, ChatRequest, ChatResponse, ResponseFormat};
use crate::prompt::{SYSTEM_PROMPT, user_prompt};
use crate::verdict::parse_verdict;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("no API key configured")]
    MissingCredentials,
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response carried no content")]
    EmptyResponse,
    #[error("unparsable verdict: {0}")]
    Parse(String),
}

impl ClassifierError {
    fn fallback_reason(&self) -> &'static str {
        match self {
            ClassifierError::MissingCredentials => "Fallback",
            ClassifierError::Status { .. } => "API Error",
            _ => "Exception",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketContext {
    pub symbol: String,
    pub action: Side,
    pub trend: String,
    pub volatility: String,
    pub strength: f64,
}

impl From<&TradeSignal> for MarketContext {
    fn from(signal: &TradeSignal) -> Self {
        Self {
            symbol: signal.symbol.clone(),
            action: signal.side,
            trend: signal.trend.clone(),
            volatility: signal.volatility.clone(),
            strength: signal.strength,
        }
    }
}

/// Maps market context to a risk verdict. Infallible by contract: an
/// unreachable service yields the fail-open fallback.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, context: &MarketContext) -> Classification;
}

pub struct GroqClassifier {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GroqClassifier {
    pub fn new(config: &ClassifierConfig, timeout: Duration) -> Result<Self, ClassifierError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    async fn try_classify(&self, context: &MarketContext) -> Result<Classification, ClassifierError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ClassifierError::MissingCredentials)?;

        let prompt = user_prompt(context);
        debug!("Classifier prompt for {}:\n{}", context.symbol, prompt);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            temperature: Some(0.0),
            response_format: Some(ResponseFormat::json_object()),
        };

        let started = Instant::now();
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        let chat: ChatResponse =
            serde_json::from_str(&text).map_err(|e| ClassifierError::Parse(e.to_string()))?;
        let content = chat.first_content().ok_or(ClassifierError::EmptyResponse)?;

        let classification = parse_verdict(content)?;
        debug!(
            "Classifier answered in {:.3}s: {}",
            started.elapsed().as_secs_f64(),
            content
        );
        Ok(classification)
    }
}

#[async_trait]
impl Classifier for GroqClassifier {
    async fn classify(&self, context: &MarketContext) -> Classification {
        match self.try_classify(context).await {
            Ok(classification) => {
                info!(
                    symbol = %context.symbol,
                    decision = ?classification.decision,
                    profile = %classification.profile,
                    "Classified: {}",
                    classification.reason
                );
                classification
            }
            Err(e) => {
                warn!(symbol = %context.symbol, "Classifier unavailable, failing open: {}", e);
                Classification::fallback(e.fallback_reason())
            }
        }
    }
}
