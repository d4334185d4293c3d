//! Upstream SSE decoding for streaming completions
//!
//! The upstream sends `data: <json>` frames separated by a blank line and
//! terminates with `data: [DONE]`. Each JSON chunk carries the next piece of
//! text in `choices[0].delta.content`.

use super::InferenceError;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

/// Maximum SSE buffer size (1 MB) before we give up on an upstream that never
/// delimits its frames
const MAX_SSE_BUFFER_SIZE: usize = 1024 * 1024;

const DONE_MARKER: &str = "[DONE]";

/// Content fragments in upstream emission order
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, InferenceError>> + Send>>;

/// A decoded SSE frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Data(String),
    Done,
}

/// Incremental SSE frame decoder.
///
/// Works on raw bytes so multi-byte characters split across network chunks
/// are reassembled before decoding.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a network chunk and return every frame it completed
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, InferenceError> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((end, delimiter_len)) = find_frame_end(&self.buffer) {
            let frame: Vec<u8> = self.buffer.drain(..end + delimiter_len).collect();
            if let Some(event) = parse_frame(&String::from_utf8_lossy(&frame[..end])) {
                events.push(event);
            }
        }

        if self.buffer.len() > MAX_SSE_BUFFER_SIZE {
            return Err(InferenceError::InvalidResponse(format!(
                "SSE buffer exceeded maximum size ({} bytes)",
                MAX_SSE_BUFFER_SIZE
            )));
        }

        Ok(events)
    }

    /// Flush a trailing frame the upstream did not terminate
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        let text = String::from_utf8_lossy(&rest);
        if text.trim().is_empty() {
            return None;
        }
        parse_frame(&text)
    }
}

/// Position of the first blank-line frame delimiter and its length
fn find_frame_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));

    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn parse_frame(frame: &str) -> Option<SseEvent> {
    let data_lines: Vec<&str> = frame
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.trim())
        .collect();

    if data_lines.is_empty() {
        return None;
    }

    let data = data_lines.join("\n");
    if data == DONE_MARKER {
        Some(SseEvent::Done)
    } else {
        Some(SseEvent::Data(data))
    }
}

/// Extract the text delta from one streamed chunk. Empty deltas yield `None`.
pub fn delta_content(data: &str) -> Result<Option<String>, InferenceError> {
    let chunk: Value = serde_json::from_str(data)
        .map_err(|e| InferenceError::InvalidResponse(format!("Malformed stream chunk: {}", e)))?;

    if let Some(error) = chunk.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("stream aborted by upstream")
            .to_string();
        return Err(InferenceError::Upstream {
            status: 200,
            message,
        });
    }

    let content = chunk
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Ok(content)
}

struct FragmentState<S> {
    inner: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, InferenceError>>,
    finished: bool,
}

impl<S> FragmentState<S> {
    /// Queue fragments from decoded events; stops at `[DONE]` or the first error
    fn absorb(&mut self, events: impl IntoIterator<Item = SseEvent>) {
        for event in events {
            match event {
                SseEvent::Done => {
                    self.finished = true;
                    return;
                }
                SseEvent::Data(data) => match delta_content(&data) {
                    Ok(Some(fragment)) => self.pending.push_back(Ok(fragment)),
                    Ok(None) => {}
                    Err(e) => {
                        self.pending.push_back(Err(e));
                        self.finished = true;
                        return;
                    }
                },
            }
        }
    }

    fn fail(&mut self, error: InferenceError) {
        self.pending.push_back(Err(error));
        self.finished = true;
    }
}

/// Turn an upstream SSE byte stream into content fragments.
///
/// The byte stream is owned by the returned stream, so dropping it releases
/// the upstream connection whether the stream finished, failed or was
/// abandoned by the consumer.
pub fn fragment_stream<S, E>(bytes: S) -> FragmentStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = FragmentState {
        inner: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.inner.next().await {
                Some(Ok(chunk)) => match state.decoder.push(&chunk) {
                    Ok(events) => state.absorb(events),
                    Err(e) => state.fail(e),
                },
                Some(Err(e)) => {
                    state.fail(InferenceError::RequestFailed(format!("Stream read error: {}", e)))
                }
                None => {
                    let trailing = state.decoder.finish();
                    state.absorb(trailing);
                    state.finished = true;
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn chunk(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    fn byte_stream(parts: Vec<Vec<u8>>) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p))))
    }

    #[test]
    fn test_decoder_splits_frames() {
        let mut decoder = SseDecoder::new();
        let events = decoder
            .push(b"data: {\"a\":1}\n\ndata: [DONE]\n\n")
            .unwrap();
        assert_eq!(
            events,
            vec![SseEvent::Data("{\"a\":1}".to_string()), SseEvent::Done]
        );
    }

    #[test]
    fn test_decoder_handles_partial_frames() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\"").unwrap().is_empty());
        let events = decoder.push(b":1}\r\n\r\n").unwrap();
        assert_eq!(events, vec![SseEvent::Data("{\"a\":1}".to_string())]);
    }

    #[test]
    fn test_decoder_ignores_comments() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": keep-alive\n\n").unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_decoder_finish_flushes_trailing_frame() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: [DONE]").unwrap();
        assert_eq!(decoder.finish(), Some(SseEvent::Done));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_delta_content_variants() {
        let data = r#"{"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(delta_content(data).unwrap(), Some("Hel".to_string()));

        let role_only = r#"{"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(delta_content(role_only).unwrap(), None);

        let error = r#"{"error":{"message":"overloaded"}}"#;
        assert!(matches!(
            delta_content(error),
            Err(InferenceError::Upstream { .. })
        ));

        assert!(matches!(
            delta_content("not json"),
            Err(InferenceError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_fragment_stream_preserves_order() {
        let body = format!("{}{}{}data: [DONE]\n\n", chunk("Hel"), chunk("lo"), chunk(" world"));
        let fragments: Vec<String> = fragment_stream(byte_stream(vec![body.into_bytes()]))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(fragments, vec!["Hel", "lo", " world"]);
    }

    #[tokio::test]
    async fn test_fragment_stream_reassembles_split_utf8() {
        let body = format!("{}data: [DONE]\n\n", chunk("héllo")).into_bytes();
        let split = body.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let parts = vec![body[..split].to_vec(), body[split..].to_vec()];

        let fragments: Vec<String> = fragment_stream(byte_stream(parts))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(fragments, vec!["héllo"]);
    }

    #[tokio::test]
    async fn test_fragment_stream_stops_at_done() {
        let body = format!("{}data: [DONE]\n\n{}", chunk("a"), chunk("ignored"));
        let fragments: Vec<_> = fragment_stream(byte_stream(vec![body.into_bytes()]))
            .collect()
            .await;
        assert_eq!(fragments.len(), 1);
    }

    #[tokio::test]
    async fn test_fragment_stream_surfaces_upstream_error() {
        let body = format!(
            "{}data: {{\"error\":{{\"message\":\"boom\"}}}}\n\n{}",
            chunk("partial"),
            chunk("never")
        );
        let items: Vec<_> = fragment_stream(byte_stream(vec![body.into_bytes()]))
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_fragment_stream_read_error() {
        let parts: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from(chunk("ok"))),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let items: Vec<_> = fragment_stream(stream::iter(parts)).collect().await;
        assert_eq!(items.len(), 2);
        assert!(matches!(items[1], Err(InferenceError::RequestFailed(_))));
    }

    /// Sets its flag when the owning byte stream is dropped
    struct ReleaseFlag(Arc<AtomicBool>);

    impl Drop for ReleaseFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_dropping_stream_releases_upstream() {
        let released = Arc::new(AtomicBool::new(false));
        let flag = ReleaseFlag(released.clone());

        let parts: Vec<Result<Bytes, std::io::Error>> = vec![Ok(Bytes::from(chunk("first")))];
        let upstream = stream::iter(parts)
            .chain(stream::pending())
            .map(move |item| {
                let _held = &flag;
                item
            });

        let mut fragments = fragment_stream(upstream);
        assert_eq!(fragments.next().await.unwrap().unwrap(), "first");
        assert!(!released.load(Ordering::SeqCst));

        drop(fragments);
        assert!(released.load(Ordering::SeqCst));
    }
}
