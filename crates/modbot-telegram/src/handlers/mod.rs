//! Telegram update handlers.
//!
//! Each handler converts a teloxide `Message` into a core model and calls into
//! the `Moderator`. Failures are logged by the core and never returned to the
//! dispatcher, so one bad update cannot stall the receive loop.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{MessageEntityKind, User},
};

use modbot_core::{domain::UserId, messaging::types::Author};

use crate::router::AppState;

mod commands;
mod text;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        // Only text is moderated; stickers, photos, service messages pass through untracked.
        return Ok(());
    };

    if starts_with_bot_command(&msg) {
        commands::handle_command(&msg, text, &state).await;
    } else {
        text::handle_text(&msg, text, &state).await;
    }
    Ok(())
}

/// Telegram marks commands with a `bot_command` entity; a leading `/` alone is plain text.
fn starts_with_bot_command(msg: &Message) -> bool {
    msg.entities().is_some_and(|entities| {
        entities
            .iter()
            .any(|e| e.offset == 0 && matches!(e.kind, MessageEntityKind::BotCommand))
    })
}

pub(crate) fn author_of(user: &User) -> Author {
    Author {
        id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        full_name: user.full_name(),
    }
}
