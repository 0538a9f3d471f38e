//! Telegram adapter (teloxide).
//!
//! This crate implements the `modbot-core` MessagingPort over the Telegram Bot API
//! and owns update dispatching.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode},
};

pub mod handlers;
pub mod router;

use modbot_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{port::MessagingPort, types::OutgoingMessage},
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_message(&self, chat_id: ChatId, msg: &OutgoingMessage) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_message(Self::tg_chat(chat_id), msg.html.clone())
            .parse_mode(ParseMode::Html);

        if let Some(link) = &msg.link {
            req = req.reply_markup(InlineKeyboardMarkup::new(vec![vec![
                InlineKeyboardButton::url(link.label.clone(), link.url.clone()),
            ]]));
        }
        if let Some(reply_to) = msg.reply_to {
            req = req
                .reply_to_message_id(Self::tg_msg_id(reply_to))
                .allow_sending_without_reply(true);
        }

        let sent = req.await.map_err(Self::map_err)?;
        Ok(MessageRef::new(chat_id, MessageId(sent.id.0)))
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.bot
            .delete_message(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}
