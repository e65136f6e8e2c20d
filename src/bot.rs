use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::deeplink::DeepLink;
use crate::platform::{Attachment, ChatGateway, IncomingMedia, MessageRef};
use crate::shortener::{shorten_or_none, UrlShortener};

pub const START_TEXT: &str = "Send media with caption containing 'Message ID:'";
pub const CAPTION_MISSING_TEXT: &str = "❌ Caption missing.";
pub const ID_NOT_FOUND_TEXT: &str = "❌ 'Message ID:' not found in caption.";

/// How a media message is answered
pub enum Mode {
    /// Reply with the deep link as text
    Reply,
    /// Shorten the link, re-send the media with it, delete the original
    Relay(Box<dyn UrlShortener>),
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Reply => "reply",
            Mode::Relay(_) => "relay",
        }
    }
}

/// Shared application state. Read-only once built.
pub struct AppState {
    pub config: Config,
    pub mode: Mode,
}

impl AppState {
    pub fn new(config: Config, mode: Mode) -> Self {
        Self { config, mode }
    }

    fn bot_username(&self) -> &str {
        &self.config.telegram.bot_username
    }
}

/// What a media handler did with one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    CaptionMissing,
    IdNotFound,
    Replied {
        link: String,
    },
    Relayed {
        link: String,
        kind: &'static str,
        deleted: bool,
    },
}

pub fn success_text(link: &str) -> String {
    format!("✅ Deep Link Generated:\n\n🔗 {}", link)
}

pub fn relay_caption(link: &str) -> String {
    format!(
        "🔗 <b>Short Deep Link:</b>\n{}",
        html_escape::encode_text(link)
    )
}

pub async fn handle_start(gateway: &dyn ChatGateway, command: MessageRef) -> Result<()> {
    gateway.reply_text(command, START_TEXT).await
}

/// Handle one inbound media message according to the configured mode.
pub async fn handle_media(
    state: &AppState,
    gateway: &dyn ChatGateway,
    msg: &IncomingMedia,
) -> Result<Outcome> {
    info!(
        "Media from chat {} (message {}, {})",
        msg.message.chat_id,
        msg.message.message_id,
        msg.attachment.as_ref().map(Attachment::kind).unwrap_or("none")
    );

    let caption = match msg.caption.as_deref().filter(|c| !c.is_empty()) {
        Some(c) => c,
        None => {
            debug!("No caption on message {}", msg.message.message_id);
            gateway.reply_text(msg.message, CAPTION_MISSING_TEXT).await?;
            return Ok(Outcome::CaptionMissing);
        }
    };

    let link = match DeepLink::from_caption(state.bot_username(), caption) {
        Some(link) => link,
        None => {
            debug!("No message id in caption of message {}", msg.message.message_id);
            gateway.reply_text(msg.message, ID_NOT_FOUND_TEXT).await?;
            return Ok(Outcome::IdNotFound);
        }
    };

    match &state.mode {
        Mode::Reply => reply_with_link(gateway, msg, link).await,
        Mode::Relay(shortener) => relay_with_link(gateway, shortener.as_ref(), msg, link).await,
    }
}

async fn reply_with_link(
    gateway: &dyn ChatGateway,
    msg: &IncomingMedia,
    link: DeepLink,
) -> Result<Outcome> {
    let url = link.long_url();
    gateway.reply_text(msg.message, &success_text(&url)).await?;
    Ok(Outcome::Replied { link: url })
}

async fn relay_with_link(
    gateway: &dyn ChatGateway,
    shortener: &dyn UrlShortener,
    msg: &IncomingMedia,
    link: DeepLink,
) -> Result<Outcome> {
    let short = shorten_or_none(shortener, &link.long_url()).await;
    let url = link.with_short_url(short).effective_url();

    let Some(attachment) = msg.attachment.as_ref() else {
        // The dispatcher only routes photo/video/document messages here.
        warn!("Message {} has no relayable media", msg.message.message_id);
        gateway.reply_text(msg.message, &success_text(&url)).await?;
        return Ok(Outcome::Replied { link: url });
    };

    gateway
        .send_media(msg.message, attachment, &relay_caption(&url))
        .await?;

    let deleted = match gateway.delete(msg.message).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                "Could not delete message {} in chat {}: {:#}",
                msg.message.message_id, msg.message.chat_id, e
            );
            false
        }
    };

    Ok(Outcome::Relayed {
        link: url,
        kind: attachment.kind(),
        deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelegramConfig;
    use crate::shortener::ShortenError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Text(String),
        Media(&'static str, String, String),
        Delete(i32),
    }

    #[derive(Default)]
    struct FakeGateway {
        calls: Mutex<Vec<Call>>,
        fail_send: bool,
        fail_delete: bool,
    }

    impl FakeGateway {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatGateway for FakeGateway {
        async fn reply_text(&self, _to: MessageRef, text: &str) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Text(text.to_string()));
            Ok(())
        }

        async fn send_media(
            &self,
            _to: MessageRef,
            attachment: &Attachment,
            caption_html: &str,
        ) -> Result<()> {
            if self.fail_send {
                anyhow::bail!("Bad Request: wrong file identifier");
            }
            self.calls.lock().unwrap().push(Call::Media(
                attachment.kind(),
                attachment.file_id().to_string(),
                caption_html.to_string(),
            ));
            Ok(())
        }

        async fn delete(&self, message: MessageRef) -> Result<()> {
            if self.fail_delete {
                anyhow::bail!("Bad Request: message can't be deleted");
            }
            self.calls
                .lock()
                .unwrap()
                .push(Call::Delete(message.message_id));
            Ok(())
        }
    }

    struct FixedShortener(Option<&'static str>);

    #[async_trait]
    impl UrlShortener for FixedShortener {
        async fn shorten(&self, _long_url: &str) -> Result<String, ShortenError> {
            match self.0 {
                Some(url) => Ok(url.to_string()),
                None => Err(ShortenError::Network("connection refused".to_string())),
            }
        }
    }

    fn state(mode: Mode) -> AppState {
        AppState::new(
            Config {
                telegram: TelegramConfig {
                    bot_token: "123:abc".to_string(),
                    bot_username: "DemoBot".to_string(),
                    timeout: Duration::from_secs(20),
                },
                shortener: None,
            },
            mode,
        )
    }

    fn media(caption: Option<&str>, attachment: Attachment) -> IncomingMedia {
        IncomingMedia {
            message: MessageRef {
                chat_id: 42,
                message_id: 7,
            },
            caption: caption.map(str::to_string),
            attachment: Some(attachment),
        }
    }

    fn photo(caption: Option<&str>) -> IncomingMedia {
        media(caption, Attachment::Photo("photo-big".to_string()))
    }

    const CAPTION: &str = "check this out, Message ID: 9876 enjoy";
    const LONG: &str = "https://t.me/DemoBot?start=9876";

    #[tokio::test]
    async fn test_start_replies_with_hint() {
        let gateway = FakeGateway::default();
        handle_start(&gateway, photo(None).message).await.unwrap();
        assert_eq!(gateway.calls(), vec![Call::Text(START_TEXT.to_string())]);
    }

    #[tokio::test]
    async fn test_missing_caption_both_modes() {
        for mode in [Mode::Reply, Mode::Relay(Box::new(FixedShortener(None)))] {
            let gateway = FakeGateway::default();
            let outcome = handle_media(&state(mode), &gateway, &photo(None))
                .await
                .unwrap();
            assert_eq!(outcome, Outcome::CaptionMissing);
            assert_eq!(
                gateway.calls(),
                vec![Call::Text(CAPTION_MISSING_TEXT.to_string())]
            );
        }
    }

    #[tokio::test]
    async fn test_empty_caption_counts_as_missing() {
        let gateway = FakeGateway::default();
        let outcome = handle_media(&state(Mode::Reply), &gateway, &photo(Some("")))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::CaptionMissing);
    }

    #[tokio::test]
    async fn test_id_not_found_both_modes() {
        for mode in [Mode::Reply, Mode::Relay(Box::new(FixedShortener(Some("x"))))] {
            let gateway = FakeGateway::default();
            let outcome = handle_media(&state(mode), &gateway, &photo(Some("just a cat")))
                .await
                .unwrap();
            assert_eq!(outcome, Outcome::IdNotFound);
            assert_eq!(
                gateway.calls(),
                vec![Call::Text(ID_NOT_FOUND_TEXT.to_string())]
            );
        }
    }

    #[tokio::test]
    async fn test_reply_mode_sends_link_text() {
        let gateway = FakeGateway::default();
        let outcome = handle_media(&state(Mode::Reply), &gateway, &photo(Some(CAPTION)))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Replied {
                link: LONG.to_string()
            }
        );
        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            Call::Text(text) => {
                assert!(text.contains(LONG));
                assert_eq!(text, &success_text(LONG));
            }
            other => panic!("expected a text reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_relay_falls_back_when_service_down() {
        let gateway = FakeGateway::default();
        let state = state(Mode::Relay(Box::new(FixedShortener(None))));
        let outcome = handle_media(&state, &gateway, &photo(Some(CAPTION)))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Relayed {
                link: LONG.to_string(),
                kind: "photo",
                deleted: true
            }
        );
        assert_eq!(
            gateway.calls(),
            vec![
                Call::Media("photo", "photo-big".to_string(), relay_caption(LONG)),
                Call::Delete(7),
            ]
        );
        assert!(relay_caption(LONG).contains(LONG));
    }

    #[tokio::test]
    async fn test_relay_uses_short_link() {
        let gateway = FakeGateway::default();
        let state = state(Mode::Relay(Box::new(FixedShortener(Some(
            "https://vb.in/xyz",
        )))));
        handle_media(&state, &gateway, &photo(Some(CAPTION)))
            .await
            .unwrap();
        match &gateway.calls()[0] {
            Call::Media(_, _, caption) => {
                assert!(caption.contains("https://vb.in/xyz"));
                assert!(!caption.contains(LONG));
                assert!(caption.contains("<b>Short Deep Link:</b>"));
            }
            other => panic!("expected media, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_relay_keeps_media_kind() {
        let cases = [
            (Attachment::Video("vid".to_string()), "video"),
            (Attachment::Document("doc".to_string()), "document"),
            (Attachment::Photo("pic".to_string()), "photo"),
        ];
        for (attachment, kind) in cases {
            let gateway = FakeGateway::default();
            let state = state(Mode::Relay(Box::new(FixedShortener(None))));
            let file_id = attachment.file_id().to_string();
            handle_media(&state, &gateway, &media(Some(CAPTION), attachment))
                .await
                .unwrap();
            assert_eq!(
                gateway.calls()[0],
                Call::Media(kind, file_id, relay_caption(LONG))
            );
        }
    }

    #[tokio::test]
    async fn test_relay_delete_failure_is_not_fatal() {
        let gateway = FakeGateway {
            fail_delete: true,
            ..Default::default()
        };
        let state = state(Mode::Relay(Box::new(FixedShortener(None))));
        let outcome = handle_media(&state, &gateway, &photo(Some(CAPTION)))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Relayed {
                link: LONG.to_string(),
                kind: "photo",
                deleted: false
            }
        );
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_relay_send_failure_keeps_original() {
        let gateway = FakeGateway {
            fail_send: true,
            ..Default::default()
        };
        let state = state(Mode::Relay(Box::new(FixedShortener(None))));
        let result = handle_media(&state, &gateway, &photo(Some(CAPTION))).await;
        assert!(result.is_err());
        assert!(!gateway
            .calls()
            .iter()
            .any(|call| matches!(call, Call::Delete(_))));
    }

    #[test]
    fn test_relay_caption_escapes_html() {
        assert_eq!(
            relay_caption("https://x.io/?a=1&b=2"),
            "🔗 <b>Short Deep Link:</b>\nhttps://x.io/?a=1&amp;b=2"
        );
    }
}
