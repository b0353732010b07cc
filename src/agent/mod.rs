// ABOUTME: Agent module — invocation client and reply-stream decoding.
// ABOUTME: One request/response round trip per prompt, correlated by session id.

pub mod client;
pub mod stream;

pub use client::{AgentClient, Invocation};
pub use stream::{EventDecoder, StreamEvent};
