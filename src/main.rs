//! Deep link generator: replies to captioned media with a `t.me` start link.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use deeplink_bot::bot::{AppState, Mode};
use deeplink_bot::config::{Config, Variant};
use deeplink_bot::platform::telegram;

#[tokio::main]
async fn main() -> Result<()> {
    deeplink_bot::init_logging();

    let config = Config::from_env(Variant::Reply).context("Failed to load configuration")?;

    info!("Configuration loaded successfully");
    info!("  Bot username: @{}", config.telegram.bot_username);
    info!("  Telegram timeout: {:?}", config.telegram.timeout);

    let state = Arc::new(AppState::new(config, Mode::Reply));

    info!("Bot is starting...");
    telegram::run(state).await?;

    Ok(())
}
