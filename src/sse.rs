//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! With `alt=sse` the Gemini API sends every response chunk as a `data:` event
//! holding one `GenerateContentResponse`.  This module turns the raw byte
//! stream into a stream of parsed chunks, buffering partial events and
//! partial UTF-8 sequences across network reads.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::{Error, GenerateContentResponse, Result};

/// Process a stream of bytes into a stream of response chunks.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<GenerateContentResponse>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + Send + 'static,
{
    // Convert reqwest errors to our error type
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    let buffer: Vec<u8> = Vec::new();

    stream::unfold(
        (stream, buffer, false),
        move |(mut stream, mut buffer, mut done)| async move {
            loop {
                if let Some((event, remaining)) = extract_event(&buffer) {
                    buffer = remaining;
                    match event {
                        Some(event) => return Some((event, (stream, buffer, done))),
                        None => continue,
                    }
                }
                if done {
                    return None;
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));
                    }
                    Some(Err(e)) => {
                        return Some((Err(e), (stream, buffer, done)));
                    }
                    None => {
                        // Flush an event the server did not terminate with a blank line.
                        done = true;
                        if buffer.iter().any(|b| !b.is_ascii_whitespace()) {
                            buffer.extend_from_slice(b"\n\n");
                        }
                    }
                }
            }
        },
    )
}

/// Extract one complete event from the front of the buffer.
///
/// Returns `None` when the buffer holds no complete event yet. The inner
/// `Option` is `None` for events that carry no data (comments, keep-alives).
#[allow(clippy::type_complexity)]
fn extract_event(buffer: &[u8]) -> Option<(Option<Result<GenerateContentResponse>>, Vec<u8>)> {
    let end = buffer.windows(2).position(|w| w == b"\n\n")?;
    let rest = buffer[end + 2..].to_vec();

    let event_text = match std::str::from_utf8(&buffer[..end]) {
        Ok(text) => text,
        Err(e) => return Some((Some(Err(e.into())), rest)),
    };

    let data = event_data(event_text);
    let Some(data) = data else {
        return Some((None, rest));
    };

    let parsed = serde_json::from_str::<GenerateContentResponse>(&data).map_err(|e| {
        Error::serialization(
            format!("Failed to parse event JSON: {e}"),
            Some(Box::new(e)),
        )
    });
    Some((Some(parsed), rest))
}

/// Joins the `data:` lines of one event, ignoring comments and other fields.
fn event_data(event_text: &str) -> Option<String> {
    let mut data: Option<String> = None;
    for line in event_text.lines() {
        let Some(value) = line.strip_prefix("data:") else {
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);
        match data.as_mut() {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(value);
            }
            None => data = Some(value.to_string()),
        }
    }
    data.filter(|d| !d.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    const CHUNK: &[u8] =
        br#"data: {"candidates": [{"content": {"parts": [{"text": "Hi"}],"role": "model"}}]}"#;

    fn chunk_event() -> Vec<u8> {
        let mut event = CHUNK.to_vec();
        event.extend_from_slice(b"\r\n\r\n");
        event
    }

    #[tokio::test]
    async fn parse_single_event() {
        let data = chunk_event();
        let stream = Box::pin(stream::once(async move { Ok(Bytes::from(data)) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(event.text().unwrap(), "Hi");
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn parse_multiple_events() {
        let mut data = chunk_event();
        data.extend(chunk_event());
        let stream = Box::pin(stream::once(async move { Ok(Bytes::from(data)) }));

        let events: Vec<_> = process_sse(stream).collect().await;
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.is_ok()));
    }

    #[tokio::test]
    async fn handle_split_event() {
        let data = chunk_event();
        let (first, second) = data.split_at(20);
        let stream = Box::pin(stream::iter(vec![
            Ok(Bytes::copy_from_slice(first)),
            Ok(Bytes::copy_from_slice(second)),
        ]));

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(event.text().unwrap(), "Hi");
    }

    #[tokio::test]
    async fn handle_split_utf8() {
        let data = "data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"h\u{e9}\"}]}}]}\n\n"
            .as_bytes()
            .to_vec();
        let split = data.iter().position(|b| *b == 0xc3).unwrap() + 1;
        let (first, second) = data.split_at(split);
        let stream = Box::pin(stream::iter(vec![
            Ok(Bytes::copy_from_slice(first)),
            Ok(Bytes::copy_from_slice(second)),
        ]));

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(event.text().unwrap(), "h\u{e9}");
    }

    #[tokio::test]
    async fn skip_comments_and_flush_trailing_event() {
        let mut data = b": keep-alive\n\n".to_vec();
        data.extend_from_slice(CHUNK);
        let stream = Box::pin(stream::once(async move { Ok(Bytes::from(data)) }));

        let events: Vec<_> = process_sse(stream).collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().text().unwrap(), "Hi");
    }

    #[tokio::test]
    async fn handle_malformed_event() {
        let data = b"data: {not json}\n\n";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap();
        assert!(matches!(event, Err(Error::Serialization { .. })));
    }

    #[test]
    fn multi_line_data_is_joined() {
        assert_eq!(
            event_data("event: x\ndata: {\"a\":\ndata: 1}"),
            Some("{\"a\":\n1}".to_string())
        );
        assert_eq!(event_data(": comment"), None);
        assert_eq!(event_data("data:"), None);
    }

    #[test]
    fn empty_stream_ends_immediately() {
        let stream = Box::pin(stream::empty());
        let events: Vec<_> = tokio_test::block_on(process_sse(stream).collect());
        assert!(events.is_empty());
    }
}
