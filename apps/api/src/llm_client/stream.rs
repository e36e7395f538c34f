//! Server-sent-event decoding for streamed Messages API responses.

use async_stream::try_stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;

use super::{AnthropicErrorBody, LlmError};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamPayload {
    ContentBlockDelta { delta: Delta },
    MessageStop,
    Error { error: AnthropicErrorBody },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Delta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, PartialEq)]
pub(crate) enum StreamEvent {
    Text(String),
    Stop,
    Error(String),
}

/// Decodes one SSE line. Only `data:` lines carry payloads; event names,
/// comments, pings and non-text deltas yield `None`.
pub(crate) fn parse_sse_line(line: &str) -> Option<StreamEvent> {
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }
    match serde_json::from_str::<StreamPayload>(data).ok()? {
        StreamPayload::ContentBlockDelta {
            delta: Delta::TextDelta { text },
        } => Some(StreamEvent::Text(text)),
        StreamPayload::MessageStop => Some(StreamEvent::Stop),
        StreamPayload::Error { error } => Some(StreamEvent::Error(error.message)),
        _ => None,
    }
}

/// Turns a raw response body into text deltas. Bytes are buffered until a
/// full line is available so multi-byte characters split across chunks
/// decode intact.
pub(crate) fn text_deltas<S>(body: S) -> impl Stream<Item = Result<String, LlmError>> + Send
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    try_stream! {
        let mut body = Box::pin(body);
        let mut buffer: Vec<u8> = Vec::new();
        let mut finished = false;

        while !finished {
            let Some(chunk) = body.next().await else {
                break;
            };
            buffer.extend_from_slice(&chunk?);

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&line);
                match parse_sse_line(line.trim_end()) {
                    Some(StreamEvent::Text(text)) => yield text,
                    Some(StreamEvent::Stop) => {
                        finished = true;
                        break;
                    }
                    Some(StreamEvent::Error(message)) => {
                        Err(LlmError::Stream(message))?;
                    }
                    None => {}
                }
            }
        }

        if !finished {
            Err(LlmError::Stream("stream ended before message_stop".to_string()))?;
        }
    }
}
