use chrono::{DateTime, Utc};
use url::Url;

use crate::domain::{ChatId, MessageId, MessageRef, UserId};

/// Sender of an incoming message.
#[derive(Clone, Debug)]
pub struct Author {
    pub id: UserId,
    pub username: Option<String>,
    pub full_name: String,
}

/// A plain (non-command) text message.
#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    /// `None` for anonymous admins and channel posts.
    pub author: Option<Author>,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl TextMessage {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef::new(self.chat_id, self.message_id)
    }
}

/// A `/command` addressed to the bot.
#[derive(Clone, Debug)]
pub struct Command {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    /// Lowercased, without the leading `/` or `@botname` suffix.
    pub name: String,
    pub args: String,
}

/// A single inline URL button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkButton {
    pub label: String,
    pub url: Url,
}

/// Outgoing message rendered in HTML parse mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub html: String,
    pub link: Option<LinkButton>,
    pub reply_to: Option<MessageId>,
}

impl OutgoingMessage {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            link: None,
            reply_to: None,
        }
    }

    pub fn with_link(mut self, link: LinkButton) -> Self {
        self.link = Some(link);
        self
    }

    pub fn reply_to(mut self, message_id: MessageId) -> Self {
        self.reply_to = Some(message_id);
        self
    }
}
