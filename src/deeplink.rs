use std::sync::LazyLock;

use regex::Regex;

static MESSAGE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Message ID:\s*(\d+)").expect("message id pattern is valid")
});

/// Find the first `Message ID: <digits>` in a caption and return the digits.
///
/// The match is case-sensitive and unanchored. Digits are returned as text,
/// leading zeros included, since they are only ever embedded into a URL.
pub fn extract_message_id(caption: &str) -> Option<&str> {
    MESSAGE_ID_PATTERN
        .captures(caption)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// `https://t.me/<username>?start=<payload>`
pub fn build_deep_link(bot_username: &str, payload: &str) -> String {
    format!("https://t.me/{}?start={}", bot_username, payload)
}

/// A deep link built for one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    pub bot_username: String,
    pub payload: String,
    /// Shortened form, when the shortening service produced one
    pub short_url: Option<String>,
}

impl DeepLink {
    pub fn new(bot_username: &str, payload: &str) -> Self {
        Self {
            bot_username: bot_username.to_string(),
            payload: payload.to_string(),
            short_url: None,
        }
    }

    /// Build a link from a caption, or `None` if it carries no message id.
    pub fn from_caption(bot_username: &str, caption: &str) -> Option<Self> {
        extract_message_id(caption).map(|id| Self::new(bot_username, id))
    }

    pub fn long_url(&self) -> String {
        build_deep_link(&self.bot_username, &self.payload)
    }

    pub fn with_short_url(mut self, short_url: Option<String>) -> Self {
        self.short_url = short_url;
        self
    }

    /// The URL to show the user: short form if available, long form otherwise.
    pub fn effective_url(&self) -> String {
        self.short_url.clone().unwrap_or_else(|| self.long_url())
    }
}
