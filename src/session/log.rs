// ABOUTME: JSONL chat history logger — appends each message to a session-scoped log file.
// ABOUTME: One file per session, named from the start timestamp and session id prefix.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChatError, Result};

/// Who produced a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Agent => "agent",
        }
    }
}

/// A single history record: one JSON object per line in the log file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// UTC wall-clock time in RFC 3339, sortable as written.
    pub timestamp: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Append-only logger for one chat session.
///
/// The log file is not created until the first write; every write opens
/// the file in append mode and drops the handle, so the file is durable
/// and readable by other processes between messages.
pub struct HistoryLogger {
    log_path: PathBuf,
}

impl HistoryLogger {
    /// Create a logger writing under `log_dir`, creating the directory as needed.
    ///
    /// The file name embeds the current UTC time and, when given, the
    /// first 8 characters of the session id, so concurrent sessions in
    /// one directory get distinct files that sort chronologically.
    pub fn new(log_dir: impl AsRef<Path>, session_id: Option<&str>) -> Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let session_suffix = session_id
            .map(|id| format!("_{}", id.chars().take(8).collect::<String>()))
            .unwrap_or_default();
        let log_path = log_dir.join(format!("chat_history_{timestamp}{session_suffix}.log"));

        debug!(path = %log_path.display(), "session history bound");
        Ok(Self { log_path })
    }

    /// Append one message as a newline-terminated JSON line.
    pub fn log_message(
        &self,
        role: Role,
        content: &str,
        metadata: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> Result<()> {
        let entry = LogEntry {
            timestamp: Utc::now().to_rfc3339(),
            role,
            content: content.to_string(),
            metadata: metadata.cloned(),
        };
        let line = serde_json::to_string(&entry)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Append a full user/agent exchange: user entry first, then agent.
    ///
    /// The two writes are sequential, not atomic — a failure in between
    /// leaves a user entry with no paired response.
    pub fn log_exchange(
        &self,
        user_message: &str,
        agent_response: &str,
        metadata: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> Result<()> {
        self.log_message(Role::User, user_message, metadata)?;
        self.log_message(Role::Agent, agent_response, metadata)
    }

    /// Location of the log file, whether or not it exists yet.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Read all entries back in write order.
    ///
    /// A missing file yields an empty history. Blank lines are skipped;
    /// any other unparseable line is an error, not silently dropped.
    pub fn read_history(&self) -> Result<Vec<LogEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line)
                .map_err(|source| ChatError::malformed_log(&self.log_path, index + 1, source))?;
            entries.push(entry);
        }
        Ok(entries)
    }
}
