use std::error::Error;

use api::{AppState, api_address};
use tracing::{Level, debug, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file when present,
    // before the filter reads RUST_LOG.
    let dotenv = dotenvy::dotenv();

    ai_llm_service::telemetry::init("info", Level::INFO);
    if let Err(err) = dotenv {
        debug!(error = %err, "no .env loaded");
    }

    let state = AppState::from_env()?;
    let address = api_address();
    info!(
        provider = ?state.llm.config().provider,
        model = %state.llm.config().model,
        "delegate model configured"
    );

    api::start(state, &address).await?;

    Ok(())
}
