//! Periodic purge of messages older than the retention window.
//!
//! - one `tokio::time::interval` loop, first tick fires immediately
//! - sweeps run to completion before the next tick is awaited, so they never overlap
//! - per-entry delete failures are logged and swallowed; the entry is dropped either way

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    audit::{AuditEvent, AuditLogger},
    messaging::port::MessagingPort,
    retention::RetentionStore,
};

/// Result of one sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub deleted: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.deleted + self.failed
    }
}

pub struct Reaper {
    store: Arc<RetentionStore>,
    messenger: Arc<dyn MessagingPort>,
    retention: Duration,
    audit: Option<AuditLogger>,
}

impl Reaper {
    pub fn new(
        store: Arc<RetentionStore>,
        messenger: Arc<dyn MessagingPort>,
        retention: Duration,
        audit: Option<AuditLogger>,
    ) -> Self {
        Self {
            store,
            messenger,
            retention,
            audit,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub async fn sweep_once(&self) -> SweepReport {
        self.sweep_at(Utc::now()).await
    }

    /// Delete everything older than the retention window at `now`.
    ///
    /// Expired entries leave the store before any delete is attempted, so an
    /// entry is never attempted twice even if this call is interrupted.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let expired = self.store.sweep(now, self.retention);
        let mut report = SweepReport::default();

        for tracked in expired {
            let msg = tracked.message;
            match self.messenger.delete_message(msg).await {
                Ok(()) => {
                    report.deleted += 1;
                    info!(
                        chat_id = msg.chat_id.0,
                        message_id = msg.message_id.0,
                        "auto-deleted message"
                    );
                    if let Some(audit) = &self.audit {
                        audit.record(AuditEvent::auto_deleted(msg));
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        chat_id = msg.chat_id.0,
                        message_id = msg.message_id.0,
                        error = %e,
                        "could not auto-delete message"
                    );
                    if let Some(audit) = &self.audit {
                        audit.record(AuditEvent::delete_failed(
                            msg,
                            "auto-delete",
                            &e.to_string(),
                        ));
                    }
                }
            }
        }

        if report.total() > 0 {
            info!(
                deleted = report.deleted,
                failed = report.failed,
                remaining = self.store.len(),
                "sweep finished"
            );
        }
        report
    }

    /// Run `sweep_once` every `every` until `cancel` fires.
    pub fn spawn(self: Arc<Self>, every: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = interval(every);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                every_secs = every.as_secs(),
                retention_secs = self.retention.as_secs(),
                "reaper started"
            );

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tick.tick() => {
                        let report = self.sweep_once().await;
                        debug!(?report, "sweep tick");
                    }
                }
            }

            info!("reaper stopped");
        })
    }
}
