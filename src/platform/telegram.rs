use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, MessageId, ParseMode, ReplyParameters};
use teloxide::utils::command::BotCommands;
use tracing::{debug, info};

use crate::bot::AppState;
use crate::config::TelegramConfig;
use crate::platform::{Attachment, ChatGateway, IncomingMedia, MessageRef};

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase")]
enum Command {
    /// The deep-link payload, if the user arrived through one.
    #[command(description = "show usage")]
    Start(String),
}

/// Pick the attachment in priority order: photo, video, document.
fn attachment_of(msg: &Message) -> Option<Attachment> {
    if let Some(sizes) = msg.photo() {
        // Sizes are ordered smallest first
        if let Some(largest) = sizes.last() {
            return Some(Attachment::Photo(largest.file.id.0.clone()));
        }
    }
    if let Some(video) = msg.video() {
        return Some(Attachment::Video(video.file.id.0.clone()));
    }
    msg.document()
        .map(|doc| Attachment::Document(doc.file.id.0.clone()))
}

fn is_media(msg: &Message) -> bool {
    msg.photo().is_some() || msg.video().is_some() || msg.document().is_some()
}

pub fn message_ref(msg: &Message) -> MessageRef {
    MessageRef {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
    }
}

pub fn incoming_media(msg: &Message) -> IncomingMedia {
    IncomingMedia {
        message: message_ref(msg),
        caption: msg.caption().map(str::to_string),
        attachment: attachment_of(msg),
    }
}

/// [`ChatGateway`] over the Telegram Bot API
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatGateway for TelegramGateway {
    async fn reply_text(&self, to: MessageRef, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(to.chat_id), text)
            .reply_parameters(ReplyParameters::new(MessageId(to.message_id)))
            .await
            .context("Failed to send reply")?;
        Ok(())
    }

    async fn send_media(
        &self,
        to: MessageRef,
        attachment: &Attachment,
        caption_html: &str,
    ) -> Result<()> {
        let chat_id = ChatId(to.chat_id);
        let file = InputFile::file_id(FileId(attachment.file_id().to_string()));

        match attachment {
            Attachment::Photo(_) => {
                self.bot
                    .send_photo(chat_id, file)
                    .caption(caption_html)
                    .parse_mode(ParseMode::Html)
                    .await
            }
            Attachment::Video(_) => {
                self.bot
                    .send_video(chat_id, file)
                    .caption(caption_html)
                    .parse_mode(ParseMode::Html)
                    .await
            }
            Attachment::Document(_) => {
                self.bot
                    .send_document(chat_id, file)
                    .caption(caption_html)
                    .parse_mode(ParseMode::Html)
                    .await
            }
        }
        .with_context(|| format!("Failed to send {}", attachment.kind()))?;

        Ok(())
    }

    async fn delete(&self, message: MessageRef) -> Result<()> {
        self.bot
            .delete_message(ChatId(message.chat_id), MessageId(message.message_id))
            .await
            .context("Failed to delete original message")?;
        Ok(())
    }
}

/// Build the Bot API client. The configured timeout bounds connecting and
/// each request, and idle pooled connections are closed after the same span.
///
/// The request timeout must exceed the dispatcher's long-polling timeout,
/// which [`TelegramConfig`] guarantees.
pub fn build_bot(config: &TelegramConfig) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .connect_timeout(config.timeout)
        .timeout(config.timeout)
        .pool_idle_timeout(config.timeout)
        .build()
        .context("Failed to build Telegram HTTP client")?;
    Ok(Bot::with_client(&config.bot_token, client))
}

/// Run the Telegram dispatcher until Ctrl-C.
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let bot = build_bot(&state.config.telegram)?;

    info!("Starting Telegram platform ({} mode)...", state.mode.name());

    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::filter(|msg: Message| is_media(&msg)).endpoint(handle_media));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            debug!("Ignoring update {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> Result<()> {
    match cmd {
        Command::Start(payload) => {
            debug!("/start from chat {} (payload {:?})", msg.chat.id.0, payload);
            let gateway = TelegramGateway::new(bot);
            crate::bot::handle_start(&gateway, message_ref(&msg)).await
        }
    }
}

async fn handle_media(bot: Bot, msg: Message, state: Arc<AppState>) -> Result<()> {
    let gateway = TelegramGateway::new(bot);
    let outcome = crate::bot::handle_media(&state, &gateway, &incoming_media(&msg)).await?;
    debug!("Message {} handled: {:?}", msg.id.0, outcome);
    Ok(())
}
