use std::sync::Arc;

use anyhow::Context;
use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

use modbot_core::{
    audit::AuditLogger,
    config::Config,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    moderator::Moderator,
    reaper::Reaper,
    retention::RetentionStore,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub moderator: Arc<Moderator>,
    /// Our own username; `/cmd@other_bot` is not for us.
    pub bot_username: String,
}

/// Connect, start the reaper and serve updates until Ctrl-C.
///
/// The dispatcher delivers updates of one chat sequentially, so messages from
/// the same conversation are moderated in arrival order.
pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    // Fail fast on a bad token instead of polling forever.
    let me = bot
        .get_me()
        .await
        .context("could not authenticate with Telegram (check BOT_TOKEN)")?;
    info!(
        bot = %me.username(),
        admin_user_id = cfg.admin_user_id,
        long_message_threshold = cfg.long_message_threshold,
        retention_secs = cfg.retention_window.as_secs(),
        "modbot started"
    );

    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));

    let audit = cfg
        .audit_log_path
        .as_ref()
        .map(|path| AuditLogger::new(path.clone(), cfg.audit_log_json));
    if let Some(audit) = &audit {
        info!(path = %audit.path().display(), "audit log enabled");
    }

    let store = Arc::new(RetentionStore::new());
    let reaper = Arc::new(Reaper::new(
        store.clone(),
        messenger.clone(),
        cfg.retention_window,
        audit.clone(),
    ));

    let cancel = CancellationToken::new();
    let reaper_task = reaper.clone().spawn(cfg.sweep_interval, cancel.clone());

    let moderator = Arc::new(Moderator::new(
        cfg,
        store,
        messenger,
        reaper,
        audit,
    ));
    let state = Arc::new(AppState {
        moderator,
        bot_username: me.username().to_string(),
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            trace!(update_id = upd.id, "unhandled update");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("dispatcher stopped, shutting down reaper");
    cancel.cancel();
    if let Err(e) = reaper_task.await {
        warn!(error = %e, "reaper task ended abnormally");
    }

    Ok(())
}
