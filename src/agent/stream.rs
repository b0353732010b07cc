// ABOUTME: Reply-stream event model — content chunks and opaque trace records.
// ABOUTME: Reassembles newline-delimited JSON events across arbitrary HTTP chunk boundaries.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use crate::error::{ChatError, Result};

/// One decoded event from the agent's reply stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A fragment of the agent's reply text, already UTF-8 decoded.
    Chunk(String),
    /// An opaque diagnostic payload, passed through unmodified.
    Trace(serde_json::Value),
}

/// Wire shape of one event line. A single line may carry a chunk,
/// a trace record, or both.
#[derive(Debug, Deserialize)]
struct WireEvent {
    chunk: Option<WireChunk>,
    trace: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WireChunk {
    bytes: Option<String>,
}

/// Incremental decoder for the newline-delimited event stream.
///
/// HTTP chunk boundaries carry no meaning: bytes are buffered until a
/// full newline-terminated line is available, then each line is parsed
/// independently. Buffering happens at the byte level so a multi-byte
/// UTF-8 sequence split across network chunks decodes intact.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: Vec<u8>,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw response bytes, returning all events completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<StreamEvent>> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            decode_line(&line[..newline], &mut events)?;
        }
        Ok(events)
    }

    /// Flush any trailing data not terminated by a newline.
    pub fn finish(self) -> Result<Vec<StreamEvent>> {
        let mut events = Vec::new();
        decode_line(&self.buffer, &mut events)?;
        Ok(events)
    }
}

/// Parse one event line, appending zero, one, or two events.
fn decode_line(line: &[u8], events: &mut Vec<StreamEvent>) -> Result<()> {
    if line.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(());
    }

    let event: WireEvent = serde_json::from_slice(line)
        .map_err(|e| ChatError::Stream(format!("unparseable event line: {e}")))?;

    if let Some(chunk) = event.chunk {
        if let Some(encoded) = chunk.bytes {
            let raw = BASE64
                .decode(encoded.as_bytes())
                .map_err(|e| ChatError::Stream(format!("invalid chunk base64: {e}")))?;
            let text = String::from_utf8(raw)
                .map_err(|e| ChatError::Stream(format!("chunk is not valid UTF-8: {e}")))?;
            events.push(StreamEvent::Chunk(text));
        }
    }

    if let Some(trace) = event.trace {
        events.push(StreamEvent::Trace(trace));
    }

    Ok(())
}
