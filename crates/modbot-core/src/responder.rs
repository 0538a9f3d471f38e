use crate::{
    config::Config,
    domain::MessageId,
    formatting::escape_html,
    messaging::types::{LinkButton, OutgoingMessage},
};

pub const WELCOME_TEXT: &str = "👋 Welcome to the group! I'm your group management bot. \
I'll help keep things tidy here.";

/// Reply to `/start`: fixed welcome text plus one URL button.
///
/// Not admin-gated and stateless, so repeated calls produce the same reply.
pub fn on_start(cfg: &Config, reply_to: MessageId) -> OutgoingMessage {
    OutgoingMessage::html(escape_html(WELCOME_TEXT))
        .with_link(LinkButton {
            label: cfg.welcome_link_label.clone(),
            url: cfg.welcome_link_url.clone(),
        })
        .reply_to(reply_to)
}
