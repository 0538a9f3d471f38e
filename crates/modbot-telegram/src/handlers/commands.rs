use teloxide::prelude::*;
use tracing::debug;

use modbot_core::{
    domain::{ChatId, MessageId, UserId},
    messaging::types::Command,
};

use crate::router::AppState;

#[derive(Debug, PartialEq, Eq)]
struct ParsedCommand {
    name: String,
    /// Bot named after `@`, if the command was addressed explicitly.
    addressee: Option<String>,
    args: String,
}

fn parse_command(text: &str) -> ParsedCommand {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let args = parts.next().unwrap_or("").trim().to_string();

    let head = first.trim_start_matches('/');
    let (name, addressee) = match head.split_once('@') {
        Some((name, bot)) => (name, Some(bot.to_string())),
        None => (head, None),
    };

    ParsedCommand {
        name: name.to_lowercase(),
        addressee,
        args,
    }
}

pub async fn handle_command(msg: &Message, text: &str, state: &AppState) {
    let parsed = parse_command(text);
    if parsed.name.is_empty() {
        return;
    }
    if let Some(bot) = &parsed.addressee {
        if !bot.eq_ignore_ascii_case(&state.bot_username) {
            debug!(command = %parsed.name, addressee = %bot, "command addressed to another bot");
            return;
        }
    }

    let user = msg.from();
    let cmd = Command {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        user_id: user.map(|u| UserId(u.id.0 as i64)),
        username: user.and_then(|u| u.username.clone()),
        name: parsed.name,
        args: parsed.args,
    };

    state.moderator.on_command(&cmd).await;
}
