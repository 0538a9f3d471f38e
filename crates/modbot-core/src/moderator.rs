//! Message and command handling, independent of the chat platform.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    audit::{AuditEvent, AuditLogger},
    config::Config,
    domain::UserId,
    formatting::mention_html,
    messaging::{
        port::MessagingPort,
        types::{Command, OutgoingMessage, TextMessage},
    },
    moderation::{find_mention, ModerationRules, ModerationVerdict},
    reaper::Reaper,
    responder,
    retention::RetentionStore,
    security::{AdminGate, UNAUTHORIZED_REPLY},
};

pub struct Moderator {
    cfg: Arc<Config>,
    rules: ModerationRules,
    gate: AdminGate,
    store: Arc<RetentionStore>,
    messenger: Arc<dyn MessagingPort>,
    reaper: Arc<Reaper>,
    audit: Option<AuditLogger>,
}

impl Moderator {
    pub fn new(
        cfg: Arc<Config>,
        store: Arc<RetentionStore>,
        messenger: Arc<dyn MessagingPort>,
        reaper: Arc<Reaper>,
        audit: Option<AuditLogger>,
    ) -> Self {
        Self {
            rules: ModerationRules::new(cfg.long_message_threshold),
            gate: AdminGate::new(UserId(cfg.admin_user_id)),
            cfg,
            store,
            messenger,
            reaper,
            audit,
        }
    }

    /// Record a text message for retention, then apply every triggered rule.
    ///
    /// Returns the verdicts that were acted on (empty means the message was allowed).
    /// Platform failures are logged, never returned.
    pub async fn on_text(&self, msg: &TextMessage) -> Vec<ModerationVerdict> {
        self.store.record(msg.chat_id, msg.message_id, msg.sent_at);

        let actions = self.rules.actions(&msg.text);
        for action in &actions {
            match action {
                ModerationVerdict::WarnLongMessage => self.warn_long_message(msg).await,
                ModerationVerdict::DeleteMention => self.delete_mention(msg).await,
                ModerationVerdict::Allow => {}
            }
        }
        actions
    }

    async fn warn_long_message(&self, msg: &TextMessage) {
        let addressee = match &msg.author {
            Some(author) => format!(", {}", mention_html(author.id, &author.full_name)),
            None => String::new(),
        };
        let html = format!(
            "Please keep your messages concise{addressee}! Long messages can be difficult to read."
        );
        let reply = OutgoingMessage::html(html).reply_to(msg.message_id);

        if let Err(e) = self.messenger.send_message(msg.chat_id, &reply).await {
            warn!(
                chat_id = msg.chat_id.0,
                message_id = msg.message_id.0,
                error = %e,
                "could not send long-message warning"
            );
            return;
        }

        let length = msg.text.chars().count();
        debug!(chat_id = msg.chat_id.0, length, "warned about long message");
        if let Some(audit) = &self.audit {
            audit.record(AuditEvent::long_message_warning(
                msg.message_ref(),
                msg.author.as_ref().map(|a| a.id),
                msg.author.as_ref().and_then(|a| a.username.as_deref()),
                length,
            ));
        }
    }

    async fn delete_mention(&self, msg: &TextMessage) {
        let target = msg.message_ref();
        let username = msg
            .author
            .as_ref()
            .and_then(|a| a.username.as_deref())
            .unwrap_or("unknown");

        match self.messenger.delete_message(target).await {
            Ok(()) => {
                self.store.forget(target);
                info!(
                    chat_id = target.chat_id.0,
                    message_id = target.message_id.0,
                    username,
                    "deleted message containing a mention"
                );
                if let Some(audit) = &self.audit {
                    audit.record(AuditEvent::mention_deleted(
                        target,
                        msg.author.as_ref().map(|a| a.id),
                        msg.author.as_ref().and_then(|a| a.username.as_deref()),
                        find_mention(&msg.text).unwrap_or("@"),
                    ));
                }
            }
            Err(e) => {
                // Left in the store; the reaper gets another chance at it.
                error!(
                    chat_id = target.chat_id.0,
                    message_id = target.message_id.0,
                    username,
                    error = %e,
                    "could not delete message with mention"
                );
                if let Some(audit) = &self.audit {
                    audit.record(AuditEvent::delete_failed(
                        target,
                        "mention",
                        &e.to_string(),
                    ));
                }
            }
        }
    }

    /// Dispatch a bot command. Unknown commands are ignored.
    pub async fn on_command(&self, cmd: &Command) {
        match cmd.name.as_str() {
            "start" => {
                let reply = responder::on_start(&self.cfg, cmd.message_id);
                self.reply(cmd, reply).await;
            }
            "stats" => {
                if self.admin_only(cmd).await {
                    let reply = OutgoingMessage::html(self.stats_html()).reply_to(cmd.message_id);
                    self.reply(cmd, reply).await;
                }
            }
            "sweep" => {
                if self.admin_only(cmd).await {
                    let report = self.reaper.sweep_once().await;
                    let html = format!(
                        "🧹 Sweep finished: {} deleted, {} failed.",
                        report.deleted, report.failed
                    );
                    self.reply(cmd, OutgoingMessage::html(html).reply_to(cmd.message_id))
                        .await;
                }
            }
            other => {
                debug!(command = other, args = %cmd.args, "ignoring unknown command");
            }
        }
    }

    /// Guard for privileged commands: on rejection the caller is told and the effect skipped.
    async fn admin_only(&self, cmd: &Command) -> bool {
        if self.gate.authorize(cmd.user_id) {
            return true;
        }

        info!(
            user_id = cmd.user_id.map(|u| u.0),
            command = %cmd.name,
            "rejected privileged command"
        );
        if let Some(audit) = &self.audit {
            audit.record(AuditEvent::auth_rejected(
                cmd.user_id,
                cmd.username.as_deref(),
                &cmd.name,
            ));
        }
        self.reply(
            cmd,
            OutgoingMessage::html(UNAUTHORIZED_REPLY).reply_to(cmd.message_id),
        )
        .await;
        false
    }

    fn stats_html(&self) -> String {
        format!(
            "📊 <b>Moderation status</b>\n\
             Tracked messages: {}\n\
             Chats: {}\n\
             Retention: {}s, sweep every {}s\n\
             Long message threshold: {} characters",
            self.store.len(),
            self.store.chat_count(),
            self.reaper.retention().as_secs(),
            self.cfg.sweep_interval.as_secs(),
            self.rules.long_message_threshold(),
        )
    }

    async fn reply(&self, cmd: &Command, msg: OutgoingMessage) {
        if let Err(e) = self.messenger.send_message(cmd.chat_id, &msg).await {
            warn!(
                chat_id = cmd.chat_id.0,
                command = %cmd.name,
                error = %e,
                "could not reply to command"
            );
        }
    }
}
