//! Per-message moderation policies.
//!
//! Both checks are heuristics: the mention check fires on any token of the
//! form `@x`, including e-mail fragments and stray punctuation.

/// Outcome of evaluating one message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModerationVerdict {
    Allow,
    WarnLongMessage,
    DeleteMention,
}

#[derive(Clone, Copy, Debug)]
pub struct ModerationRules {
    long_message_threshold: usize,
}

impl ModerationRules {
    pub fn new(long_message_threshold: usize) -> Self {
        Self {
            long_message_threshold,
        }
    }

    pub fn long_message_threshold(&self) -> usize {
        self.long_message_threshold
    }

    /// Primary verdict: length first, then mentions.
    pub fn evaluate(&self, text: &str) -> ModerationVerdict {
        self.actions(text)
            .first()
            .copied()
            .unwrap_or(ModerationVerdict::Allow)
    }

    /// Every triggered action, in the order they are applied.
    ///
    /// A long message that also contains a mention gets both the warning and
    /// the deletion; the warning reply is not retracted afterwards.
    pub fn actions(&self, text: &str) -> Vec<ModerationVerdict> {
        let mut out = Vec::with_capacity(2);
        if self.is_too_long(text) {
            out.push(ModerationVerdict::WarnLongMessage);
        }
        if find_mention(text).is_some() {
            out.push(ModerationVerdict::DeleteMention);
        }
        out
    }

    /// Length in characters, not bytes.
    pub fn is_too_long(&self, text: &str) -> bool {
        text.chars().count() > self.long_message_threshold
    }
}

/// First whitespace-delimited token that starts with `@` and has at least one more character.
pub fn find_mention(text: &str) -> Option<&str> {
    text.split_whitespace()
        .find(|word| word.starts_with('@') && word.chars().count() > 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ModerationRules {
        ModerationRules::new(500)
    }

    #[test]
    fn short_plain_text_is_allowed() {
        assert_eq!(rules().evaluate("hello"), ModerationVerdict::Allow);
        assert!(rules().actions("hello").is_empty());
        assert_eq!(rules().evaluate(""), ModerationVerdict::Allow);
    }

    #[test]
    fn threshold_is_exclusive() {
        let at_limit = "a".repeat(500);
        let over = "a".repeat(501);
        assert_eq!(rules().evaluate(&at_limit), ModerationVerdict::Allow);
        assert_eq!(rules().evaluate(&over), ModerationVerdict::WarnLongMessage);
        assert_eq!(
            rules().evaluate(&"a".repeat(600)),
            ModerationVerdict::WarnLongMessage
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 500 two-byte characters are 1000 bytes but still within the limit.
        let text = "é".repeat(500);
        assert_eq!(text.len(), 1000);
        assert_eq!(rules().evaluate(&text), ModerationVerdict::Allow);
    }

    #[test]
    fn long_message_wins_over_mention_for_primary_verdict() {
        let text = format!("@spammer {}", "a".repeat(600));
        assert_eq!(rules().evaluate(&text), ModerationVerdict::WarnLongMessage);
        assert_eq!(
            rules().actions(&text),
            vec![
                ModerationVerdict::WarnLongMessage,
                ModerationVerdict::DeleteMention
            ]
        );
    }

    #[test]
    fn mention_token_triggers_delete() {
        assert_eq!(
            rules().evaluate("check out @spambot now"),
            ModerationVerdict::DeleteMention
        );
        assert_eq!(rules().evaluate("@x"), ModerationVerdict::DeleteMention);
        // Heuristic: any @-prefixed token counts.
        assert_eq!(rules().evaluate("@@"), ModerationVerdict::DeleteMention);
        assert_eq!(rules().evaluate("ping\t@ops"), ModerationVerdict::DeleteMention);
    }

    #[test]
    fn non_leading_or_bare_at_is_not_a_mention() {
        for text in ["mail me at bob@example.com", "@ alone", "a @ b", "x@y"] {
            assert_eq!(rules().evaluate(text), ModerationVerdict::Allow, "{text}");
        }
    }

    #[test]
    fn find_mention_stops_at_first_token() {
        assert_eq!(find_mention("hi @one and @two"), Some("@one"));
        assert_eq!(find_mention("nothing here"), None);
    }
}
