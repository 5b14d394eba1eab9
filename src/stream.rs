use std::convert::Infallible;
use std::time::Duration;
use axum::body::{Body, Bytes};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Upper bound on one streamed generation. On expiry the outbound stream is
/// closed and the upstream read abandoned.
pub const RELAY_DEADLINE: Duration = Duration::from_secs(120);

/// Accumulates raw bytes and yields complete lines. The trailing partial
/// line is carried over to the next push, so a read boundary can fall
/// anywhere - inside a frame, inside a multi-byte character - without
/// corrupting output. Lines never contain a newline byte, so decoding whole
/// lines is safe.
#[derive(Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line);
            lines.push(text.trim_end_matches(['\n', '\r']).to_string());
        }
        lines
    }
}

/// Extracts the content delta from one upstream line. Blank lines, the
/// end-of-stream sentinel, non-data lines, and empty deltas all yield None.
/// A malformed frame is logged and skipped; it must never abort an
/// otherwise-healthy stream.
pub fn parse_delta(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let data = line.strip_prefix(DATA_PREFIX)?.trim();
    if data == DONE_SENTINEL {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(frame) => {
            let delta = frame["choices"][0]["delta"]["content"]
                .as_str()
                .unwrap_or_default();
            if delta.is_empty() {
                None
            } else {
                Some(delta.to_string())
            }
        }
        Err(e) => {
            warn!("skipping malformed stream frame: {}", e);
            None
        }
    }
}

/// Re-frames the upstream completion stream as an event stream of
/// `data: {"content": <delta>}` frames, in arrival order. The response body
/// is fed by a spawned task; if the client disconnects, the channel send
/// fails and the upstream read stops with it.
pub fn relay_response(upstream: reqwest::Response) -> Response {
    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::spawn(async move {
        if tokio::time::timeout(RELAY_DEADLINE, relay_loop(upstream, tx))
            .await
            .is_err()
        {
            warn!("streaming relay exceeded deadline, closing stream");
        }
    });

    let body = ReceiverStream::new(rx)
        .map(|frame| Ok::<_, Infallible>(Bytes::from(frame)));

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

async fn relay_loop(upstream: reqwest::Response, tx: mpsc::Sender<String>) {
    let mut lines = LineBuffer::default();
    let mut accumulated = String::new();
    let mut body = upstream.bytes_stream();

    while let Some(chunk) = body.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("upstream stream read failed: {}", e);
                break;
            }
        };

        for line in lines.push(&bytes) {
            let Some(delta) = parse_delta(&line) else { continue };
            accumulated.push_str(&delta);
            let frame = format!(
                "data: {}\n\n",
                serde_json::json!({ "content": delta })
            );
            if tx.send(frame).await.is_err() {
                debug!("client disconnected, aborting relay");
                return;
            }
        }
    }

    debug!("relay complete, {} chars emitted", accumulated.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(content: &str) -> String {
        format!(
            "data: {}\n\n",
            json!({ "choices": [{ "delta": { "content": content } }] })
        )
    }

    /// Feeds `transcript` in `chunk_size`-byte slices and returns the
    /// concatenated deltas.
    fn feed(transcript: &[u8], chunk_size: usize) -> String {
        let mut lines = LineBuffer::default();
        let mut accumulated = String::new();
        for chunk in transcript.chunks(chunk_size) {
            for line in lines.push(chunk) {
                if let Some(delta) = parse_delta(&line) {
                    accumulated.push_str(&delta);
                }
            }
        }
        accumulated
    }

    #[test]
    fn reassembles_whole_feed() {
        let transcript = format!(
            "{}{}{}data: [DONE]\n\n",
            frame(">be Albert Einstein\n"),
            frame(">born in Ulm, 1879\n"),
            frame(">publish four papers in 1905")
        );
        let expected = ">be Albert Einstein\n>born in Ulm, 1879\n>publish four papers in 1905";
        assert_eq!(feed(transcript.as_bytes(), transcript.len()), expected);
    }

    #[test]
    fn arbitrary_byte_splits_do_not_corrupt_output() {
        let transcript = format!(
            "{}{}{}data: [DONE]\n\n",
            frame(">be mé, Zürich édition ✨\n"),
            frame(">日本語のテキスト\n"),
            frame(">done")
        );
        let whole = feed(transcript.as_bytes(), transcript.len());
        for chunk_size in 1..=17 {
            assert_eq!(
                feed(transcript.as_bytes(), chunk_size),
                whole,
                "chunk size {}",
                chunk_size
            );
        }
    }

    #[test]
    fn malformed_frame_is_skipped_not_fatal() {
        let transcript = format!(
            "{}data: {{not json at all\n\n{}",
            frame(">first\n"),
            frame(">second")
        );
        assert_eq!(feed(transcript.as_bytes(), 7), ">first\n>second");
    }

    #[test]
    fn sentinel_blank_and_foreign_lines_are_ignored() {
        assert_eq!(parse_delta(""), None);
        assert_eq!(parse_delta("data: [DONE]"), None);
        assert_eq!(parse_delta(": keep-alive comment"), None);
        assert_eq!(parse_delta("event: ping"), None);
    }

    #[test]
    fn empty_delta_is_ignored() {
        let line = format!("data: {}", json!({ "choices": [{ "delta": {} }] }));
        assert_eq!(parse_delta(&line), None);
        let line = format!("data: {}", json!({ "choices": [] }));
        assert_eq!(parse_delta(&line), None);
    }

    #[test]
    fn carriage_returns_are_stripped() {
        let mut lines = LineBuffer::default();
        let out = lines.push(b"data: [DONE]\r\n");
        assert_eq!(out, vec!["data: [DONE]".to_string()]);
    }
}
