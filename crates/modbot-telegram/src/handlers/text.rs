use teloxide::prelude::*;

use modbot_core::{
    domain::{ChatId, MessageId},
    messaging::types::TextMessage,
};

use super::author_of;
use crate::router::AppState;

pub async fn handle_text(msg: &Message, text: &str, state: &AppState) {
    let incoming = TextMessage {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        author: msg.from().map(author_of),
        text: text.to_string(),
        sent_at: msg.date,
    };

    state.moderator.on_text(&incoming).await;
}
