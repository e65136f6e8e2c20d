pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// The media attached to an inbound message, by file id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// Largest available size of the photo
    Photo(String),
    Video(String),
    Document(String),
}

impl Attachment {
    pub fn kind(&self) -> &'static str {
        match self {
            Attachment::Photo(_) => "photo",
            Attachment::Video(_) => "video",
            Attachment::Document(_) => "document",
        }
    }

    pub fn file_id(&self) -> &str {
        match self {
            Attachment::Photo(id) | Attachment::Video(id) | Attachment::Document(id) => id,
        }
    }
}

/// A message in a chat: what replies quote and what deletes remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

/// A media message received from the chat platform
#[derive(Debug, Clone)]
pub struct IncomingMedia {
    pub message: MessageRef,
    pub caption: Option<String>,
    /// `None` only if the message carried none of the supported kinds
    pub attachment: Option<Attachment>,
}

/// Outbound actions the handlers need from the chat platform.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Reply to `to` with plain text.
    async fn reply_text(&self, to: MessageRef, text: &str) -> Result<()>;

    /// Send `attachment` back into the chat of `to` with an HTML caption.
    async fn send_media(
        &self,
        to: MessageRef,
        attachment: &Attachment,
        caption_html: &str,
    ) -> Result<()>;

    async fn delete(&self, message: MessageRef) -> Result<()>;
}
