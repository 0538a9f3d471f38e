use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{port::MessagingPort, types::OutgoingMessage},
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* Telegram API calls (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between sends to the same chat (Telegram ~1 msg/sec per chat).
    pub per_chat_send_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_send_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration, now: Instant) -> Self {
        Self { interval, next: now }
    }

    /// No reservation is outstanding; dropping this limiter loses nothing.
    fn is_idle_at(&self, now: Instant) -> bool {
        self.next <= now
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve_at(&mut self, now: Instant) -> Duration {
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// MessagingPort decorator that spaces out outbound calls.
///
/// Sends observe both the global and the per-chat interval. Deletions are only
/// globally spaced so a reaper sweep over a busy chat does not crawl at one
/// call per second. Nothing is retried here.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_chat: Mutex<HashMap<ChatId, IntervalLimiter>>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval, Instant::now())),
            per_chat: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve a send slot for `chat_id`.
    ///
    /// Limiters of chats with no pending slot are pruned whenever a new chat
    /// shows up, so the map only holds recently active chats.
    async fn reserve_chat_at(&self, chat_id: ChatId, now: Instant) -> Duration {
        let mut map = self.per_chat.lock().await;
        if !map.contains_key(&chat_id) {
            map.retain(|_, lim| !lim.is_idle_at(now));
        }
        map.entry(chat_id)
            .or_insert_with(|| IntervalLimiter::new(self.cfg.per_chat_send_interval, now))
            .reserve_at(now)
    }

    async fn throttle_chat(&self, chat_id: ChatId) {
        let now = Instant::now();
        let global_wait = { self.global.lock().await.reserve_at(now) };
        let chat_wait = self.reserve_chat_at(chat_id, now).await;

        let wait = global_wait.max(chat_wait);
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }

    async fn throttle_global(&self) {
        let wait = { self.global.lock().await.reserve_at(Instant::now()) };
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    async fn send_message(&self, chat_id: ChatId, msg: &OutgoingMessage) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_message(chat_id, msg).await
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.throttle_global().await;
        self.inner.delete_message(msg).await
    }
}
