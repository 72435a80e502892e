use std::sync::Arc;

use dotenvy::dotenv;
use tracing::{debug, info, warn};

use common::config::Config;
use common::logger;
use exchange::{ExchangeClient, WeexClient};
use storage::TradeMemory;
use strategy::{Classifier, GroqClassifier};

use crate::services::execution_service::{ExecutionService, ExecutionSettings};
use crate::services::webhook::{AppState, router};

mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    debug!("System starting up...");

    let config = Config::from_env()?;
    debug!("Loaded configuration: {:?}", config);

    let exchange: Arc<dyn ExchangeClient> =
        Arc::new(WeexClient::new(&config.exchange, config.http_timeout)?);
    let classifier: Arc<dyn Classifier> =
        Arc::new(GroqClassifier::new(&config.classifier, config.http_timeout)?);
    if config.classifier.api_key.is_none() {
        warn!("GROQ_API_KEY not set, every signal will use the fallback classification");
    }

    match exchange.get_assets().await {
        Ok(assets) => {
            for asset in assets.iter().filter(|a| a.available > 0.0) {
                info!("Balance: {} available={} equity={}", asset.coin, asset.available, asset.equity);
            }
        }
        Err(e) => warn!("Failed to fetch account assets: {}", e),
    }

    let memory = TradeMemory::new();
    let service = Arc::new(ExecutionService::new(
        exchange.clone(),
        classifier,
        memory.clone(),
        ExecutionSettings::from(&config),
    ));

    let app = router(AppState {
        service,
        exchange,
        memory,
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Sentinel listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
