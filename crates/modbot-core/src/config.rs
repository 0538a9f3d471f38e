use std::{collections::HashMap, env, fs, path::Path, path::PathBuf, time::Duration};

use url::Url;

use crate::{errors::Error, Result};

pub const DEFAULT_LONG_MESSAGE_THRESHOLD: usize = 500;
pub const DEFAULT_RETENTION_SECS: u64 = 600;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_WELCOME_LINK_URL: &str = "https://example.com";
pub const DEFAULT_WELCOME_LINK_LABEL: &str = "Visit My Website";

/// Typed configuration, read once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub bot_token: String,
    pub admin_user_id: i64,

    // Moderation
    pub long_message_threshold: usize,
    pub retention_window: Duration,
    pub sweep_interval: Duration,

    // /start reply
    pub welcome_link_url: Url,
    pub welcome_link_label: String,

    // Audit
    pub audit_log_path: Option<PathBuf>,
    pub audit_log_json: bool,
}

impl Config {
    /// Load from the process environment, falling back to `.env` (if present).
    ///
    /// The process environment is only read, never written.
    pub fn load() -> Result<Self> {
        let dotenv = read_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok().or_else(|| dotenv.get(key).cloned()))
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Required
        let bot_token = lookup("BOT_TOKEN").and_then(non_empty).ok_or_else(|| {
            Error::Config("BOT_TOKEN environment variable is required".to_string())
        })?;

        let admin_raw = lookup("ADMIN_USER_ID").and_then(non_empty).ok_or_else(|| {
            Error::Config("ADMIN_USER_ID environment variable is required".to_string())
        })?;
        let admin_user_id = admin_raw.trim().parse::<i64>().map_err(|_| {
            Error::Config(format!("ADMIN_USER_ID must be an integer, got {admin_raw:?}"))
        })?;

        // Moderation knobs
        let long_message_threshold =
            parse_opt::<usize>(&lookup, "LONG_MESSAGE_THRESHOLD")?
                .unwrap_or(DEFAULT_LONG_MESSAGE_THRESHOLD);
        let retention_window = Duration::from_secs(
            parse_opt::<u64>(&lookup, "DELETE_AFTER_SECONDS")?.unwrap_or(DEFAULT_RETENTION_SECS),
        );
        let sweep_secs = parse_opt::<u64>(&lookup, "SWEEP_INTERVAL_SECONDS")?
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);
        if sweep_secs == 0 {
            return Err(Error::Config(
                "SWEEP_INTERVAL_SECONDS must be greater than zero".to_string(),
            ));
        }
        let sweep_interval = Duration::from_secs(sweep_secs);

        // Welcome button
        let url_raw = lookup("WELCOME_LINK_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_WELCOME_LINK_URL.to_string());
        let welcome_link_url = Url::parse(url_raw.trim()).map_err(|e| {
            Error::Config(format!("WELCOME_LINK_URL is not a valid URL ({url_raw:?}): {e}"))
        })?;
        let welcome_link_label = lookup("WELCOME_LINK_LABEL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_WELCOME_LINK_LABEL.to_string());

        // Audit logging
        let audit_log_path = lookup("AUDIT_LOG_PATH")
            .and_then(non_empty)
            .map(PathBuf::from);
        let audit_log_json = lookup("AUDIT_LOG_JSON")
            .map(|s| parse_bool(&s))
            .unwrap_or(false);

        Ok(Self {
            bot_token,
            admin_user_id,
            long_message_threshold,
            retention_window,
            sweep_interval,
            welcome_link_url,
            welcome_link_label,
            audit_log_path,
            audit_log_json,
        })
    }
}

fn read_dotenv_if_present(path: &Path) -> HashMap<String, String> {
    match fs::read_to_string(path) {
        Ok(contents) => parse_dotenv(&contents),
        Err(_) => HashMap::new(),
    }
}

fn parse_dotenv(contents: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = &val[1..val.len() - 1];
        }

        vars.insert(key.to_string(), val.to_string());
    }
    vars
}

fn parse_opt<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |k: &str| map.get(k).map(|v| v.to_string())
    }

    #[test]
    fn defaults_apply_when_only_required_vars_set() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "123:abc"),
            ("ADMIN_USER_ID", "42"),
        ]))
        .unwrap();

        assert_eq!(cfg.bot_token, "123:abc");
        assert_eq!(cfg.admin_user_id, 42);
        assert_eq!(cfg.long_message_threshold, 500);
        assert_eq!(cfg.retention_window, Duration::from_secs(600));
        assert_eq!(cfg.sweep_interval, Duration::from_secs(60));
        assert_eq!(cfg.welcome_link_url.as_str(), "https://example.com/");
        assert_eq!(cfg.welcome_link_label, "Visit My Website");
        assert!(cfg.audit_log_path.is_none());
        assert!(!cfg.audit_log_json);
    }

    #[test]
    fn missing_token_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[("ADMIN_USER_ID", "42")])).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("BOT_TOKEN")));

        let err = Config::from_lookup(lookup_from(&[("BOT_TOKEN", "  "), ("ADMIN_USER_ID", "1")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn admin_id_must_be_an_integer() {
        let err = Config::from_lookup(lookup_from(&[("BOT_TOKEN", "t")])).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("ADMIN_USER_ID")));

        let err = Config::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "t"),
            ("ADMIN_USER_ID", "alice"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let cfg = Config::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "t"),
            ("ADMIN_USER_ID", " -1001 "),
        ]))
        .unwrap();
        assert_eq!(cfg.admin_user_id, -1001);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "t"),
            ("ADMIN_USER_ID", "7"),
            ("LONG_MESSAGE_THRESHOLD", "280"),
            ("DELETE_AFTER_SECONDS", "3600"),
            ("SWEEP_INTERVAL_SECONDS", "30"),
            ("WELCOME_LINK_URL", "https://rules.example.org/group"),
            ("WELCOME_LINK_LABEL", "Group rules"),
            ("AUDIT_LOG_PATH", "/tmp/modbot-audit.log"),
            ("AUDIT_LOG_JSON", "yes"),
        ]))
        .unwrap();

        assert_eq!(cfg.long_message_threshold, 280);
        assert_eq!(cfg.retention_window, Duration::from_secs(3600));
        assert_eq!(cfg.sweep_interval, Duration::from_secs(30));
        assert_eq!(cfg.welcome_link_url.host_str(), Some("rules.example.org"));
        assert_eq!(cfg.welcome_link_label, "Group rules");
        assert_eq!(
            cfg.audit_log_path.as_deref(),
            Some(Path::new("/tmp/modbot-audit.log"))
        );
        assert!(cfg.audit_log_json);
    }

    #[test]
    fn dotenv_lines_are_parsed_into_a_lookup_map() {
        let vars = parse_dotenv(
            "# comment\n\
             BOT_TOKEN = \"123:quoted\"\n\
             ADMIN_USER_ID=42\n\
             WELCOME_LINK_LABEL='Group rules'\n\
             not a pair\n\
             =orphan\n",
        );

        assert_eq!(vars.len(), 3);
        assert_eq!(vars["BOT_TOKEN"], "123:quoted");
        assert_eq!(vars["ADMIN_USER_ID"], "42");
        assert_eq!(vars["WELCOME_LINK_LABEL"], "Group rules");

        let cfg = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(cfg.bot_token, "123:quoted");
        assert_eq!(cfg.admin_user_id, 42);
    }

    #[test]
    fn missing_dotenv_file_yields_nothing() {
        assert!(read_dotenv_if_present(Path::new("/nonexistent/modbot/.env")).is_empty());
    }

    #[test]
    fn invalid_optional_values_are_rejected() {
        for (key, value) in [
            ("LONG_MESSAGE_THRESHOLD", "many"),
            ("DELETE_AFTER_SECONDS", "-5"),
            ("SWEEP_INTERVAL_SECONDS", "0"),
            ("WELCOME_LINK_URL", "not a url"),
        ] {
            let res = Config::from_lookup(lookup_from(&[
                ("BOT_TOKEN", "t"),
                ("ADMIN_USER_ID", "1"),
                (key, value),
            ]));
            assert!(res.is_err(), "{key}={value} should be rejected");
        }
    }
}
