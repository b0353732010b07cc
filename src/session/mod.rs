// ABOUTME: Session module — durable per-session conversation history.
// ABOUTME: Provides JSONL logging of user/agent messages and ordered read-back.

pub mod log;

pub use log::{HistoryLogger, LogEntry, Role};
