//! In-memory `MessagingPort` used by unit tests.

use std::{collections::HashSet, sync::Mutex};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{port::MessagingPort, types::OutgoingMessage},
    Result,
};

#[derive(Default)]
pub struct FakeMessenger {
    next_id: Mutex<i32>,
    sends: Mutex<Vec<(ChatId, OutgoingMessage)>>,
    deletes: Mutex<Vec<MessageRef>>,
    failing_deletes: Mutex<HashSet<MessageRef>>,
    fail_sends: Mutex<bool>,
}

impl FakeMessenger {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(10_000),
            ..Default::default()
        }
    }

    /// Make `delete_message` fail for this message (still recorded as attempted).
    pub fn fail_delete_of(&self, msg: MessageRef) {
        self.failing_deletes.lock().unwrap().insert(msg);
    }

    pub fn fail_all_sends(&self) {
        *self.fail_sends.lock().unwrap() = true;
    }

    pub fn sends(&self) -> Vec<(ChatId, OutgoingMessage)> {
        self.sends.lock().unwrap().clone()
    }

    pub fn sent_html(&self) -> Vec<String> {
        self.sends().into_iter().map(|(_, m)| m.html).collect()
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_message(&self, chat_id: ChatId, msg: &OutgoingMessage) -> Result<MessageRef> {
        if *self.fail_sends.lock().unwrap() {
            return Err(Error::External("telegram error: send refused".to_string()));
        }
        self.sends.lock().unwrap().push((chat_id, msg.clone()));
        let mut guard = self.next_id.lock().unwrap();
        let id = *guard;
        *guard += 1;
        Ok(MessageRef::new(chat_id, MessageId(id)))
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.deletes.lock().unwrap().push(msg);
        if self.failing_deletes.lock().unwrap().contains(&msg) {
            return Err(Error::External(
                "telegram error: message can't be deleted".to_string(),
            ));
        }
        Ok(())
    }
}

/// Config with defaults, admin `1`.
pub fn test_config() -> crate::config::Config {
    crate::config::Config::from_lookup(|key| match key {
        "BOT_TOKEN" => Some("123:test".to_string()),
        "ADMIN_USER_ID" => Some("1".to_string()),
        _ => None,
    })
    .expect("test config")
}
