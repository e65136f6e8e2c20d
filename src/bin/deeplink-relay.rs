//! Deep link relay: shortens the start link, re-sends the media with it and
//! deletes the original message.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use deeplink_bot::bot::{AppState, Mode};
use deeplink_bot::config::{Config, Variant};
use deeplink_bot::platform::telegram;
use deeplink_bot::shortener::ViralboxClient;

#[tokio::main]
async fn main() -> Result<()> {
    deeplink_bot::init_logging();

    let config = Config::from_env(Variant::Relay).context("Failed to load configuration")?;
    let shortener_config = config
        .shortener
        .clone()
        .context("Shortener configuration missing")?;

    info!("Configuration loaded successfully");
    info!("  Bot username: @{}", config.telegram.bot_username);
    info!("  Telegram timeout: {:?}", config.telegram.timeout);

    let shortener = ViralboxClient::new(shortener_config)?;

    let state = Arc::new(AppState::new(config, Mode::Relay(Box::new(shortener))));

    info!("Bot is starting...");
    telegram::run(state).await?;

    Ok(())
}
