use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const MESSAGE_PREFIX: &str = "Auto commit: Atualizações automáticas em ";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Message of an automatic commit, stamped with local wall-clock time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMessage(String);

impl CommitMessage {
    pub fn at(time: NaiveDateTime) -> Self {
        Self(format!("{}{}", MESSAGE_PREFIX, time.format(TIMESTAMP_FORMAT)))
    }

    /// Recover the timestamp from an automatic commit message. Only the
    /// exact zero-padded form produced by [`CommitMessage::at`] is accepted.
    pub fn parse(message: &str) -> Option<NaiveDateTime> {
        let stamp = message.strip_prefix(MESSAGE_PREFIX)?;
        let time = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
        (time.format(TIMESTAMP_FORMAT).to_string() == stamp).then_some(time)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
