pub mod bot;
pub mod config;
pub mod deeplink;
pub mod platform;
pub mod shortener;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,deeplink_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
