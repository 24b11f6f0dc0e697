use std::sync::Arc;

use orb_core::{config::Config, model::client::CompletionClient};
use orb_openrouter::OpenRouterClient;

#[tokio::main]
async fn main() -> Result<(), orb_core::Error> {
    orb_core::logging::init("orb")?;

    let result = run().await;
    if let Err(e) = &result {
        tracing::error!(error = ?e, "orb terminated with an unhandled error");
    }
    result
}

async fn run() -> Result<(), orb_core::Error> {
    let cfg = Arc::new(Config::load()?);

    let client = OpenRouterClient::from_config(&cfg)?;
    if client.is_configured() {
        tracing::info!(model = client.model(), "completion service configured");
    } else {
        tracing::warn!("OPENROUTER_KEY is not set; replies will explain that AI is not configured");
    }
    let completion: Arc<dyn CompletionClient> = Arc::new(client);

    orb_telegram::router::run_polling(cfg, completion)
        .await
        .map_err(|e| orb_core::Error::External(format!("telegram bot failed: {e:#}")))?;

    Ok(())
}
