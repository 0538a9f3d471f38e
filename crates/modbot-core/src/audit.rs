use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{
    domain::{MessageRef, UserId},
    errors::Error,
    Result,
};

const AUDIT_MAX_TEXT: usize = 500;

/// RFC3339 timestamp in UTC.
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEvent {
    fn base(event: &str, msg: Option<MessageRef>) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: event.to_string(),
            chat_id: msg.map(|m| m.chat_id.0),
            message_id: msg.map(|m| m.message_id.0),
            user_id: None,
            username: None,
            reason: None,
            error: None,
        }
    }

    fn by(mut self, user_id: Option<UserId>, username: Option<&str>) -> Self {
        self.user_id = user_id.map(|u| u.0);
        self.username = username.map(|s| s.to_string());
        self
    }

    pub fn long_message_warning(
        msg: MessageRef,
        user_id: Option<UserId>,
        username: Option<&str>,
        length: usize,
    ) -> Self {
        let mut ev = Self::base("long_message_warning", Some(msg)).by(user_id, username);
        ev.reason = Some(format!("{length} characters"));
        ev
    }

    pub fn mention_deleted(
        msg: MessageRef,
        user_id: Option<UserId>,
        username: Option<&str>,
        mention: &str,
    ) -> Self {
        let mut ev = Self::base("mention_deleted", Some(msg)).by(user_id, username);
        ev.reason = Some(format!("contains {mention}"));
        ev
    }

    pub fn auto_deleted(msg: MessageRef) -> Self {
        Self::base("auto_deleted", Some(msg))
    }

    pub fn delete_failed(msg: MessageRef, context: &str, error: &str) -> Self {
        let mut ev = Self::base("delete_failed", Some(msg));
        ev.reason = Some(context.to_string());
        ev.error = Some(error.to_string());
        ev
    }

    pub fn auth_rejected(user_id: Option<UserId>, username: Option<&str>, command: &str) -> Self {
        let mut ev = Self::base("auth_rejected", None).by(user_id, username);
        ev.reason = Some(format!("/{command}"));
        ev
    }
}

/// Append-only audit file. Writes are synchronous and small.
#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
    json: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, mut event: AuditEvent) -> Result<()> {
        if let Some(s) = &event.reason {
            event.reason = Some(truncate_text(s, AUDIT_MAX_TEXT));
        }
        if let Some(s) = &event.error {
            event.error = Some(truncate_text(s, AUDIT_MAX_TEXT));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(60));

        let value = serde_json::to_value(&event)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::External(
                "audit event is not a JSON object".to_string(),
            ));
        };
        for (k, v) in obj {
            out.push('\n');
            out.push_str(k);
            out.push_str(": ");
            match v {
                serde_json::Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
        }
        out.push('\n');

        file.write_all(out.as_bytes())?;
        Ok(())
    }

    /// Write, logging instead of propagating failures.
    pub fn record(&self, event: AuditEvent) {
        if let Err(e) = self.write(event) {
            tracing::warn!(path = %self.path.display(), error = %e, "audit write failed");
        }
    }
}

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}
