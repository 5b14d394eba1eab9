use serde::Serialize;
use reqwest::Client;
use tracing::error;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::prompt::ChatMessage;

/// Higher temperature for more creative greentexts (0.7-0.9 works well).
pub const TEMPERATURE: f32 = 0.8;

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    max_completion_tokens: u64,
    stream: bool,
    temperature: f32,
}

/// Issues the chat-completion call and returns the raw response, leaving the
/// body untouched so the caller can either stream it or collect it. A
/// non-success status is captured for the log and surfaced as a 502.
pub async fn call_completion(
    client: &Client,
    config: &Config,
    messages: &[ChatMessage],
    max_tokens: u64,
    stream: bool,
) -> Result<reqwest::Response> {
    let body = ChatRequest {
        messages,
        max_completion_tokens: max_tokens,
        stream,
        temperature: TEMPERATURE,
    };

    let response = client
        .post(config.completion_endpoint())
        .header("api-key", &config.completion_api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            error!("completion request failed: {}", e);
            AppError::UpstreamUnavailable
        })?;

    let status = response.status();
    if !status.is_success() {
        // Diagnostics only; the upstream body is never shown to the client.
        let text = response.text().await.unwrap_or_default();
        error!("completion endpoint returned {}: {}", status, text);
        return Err(AppError::UpstreamService(status.as_u16()));
    }

    Ok(response)
}

/// First choice's message content from a non-streaming completion body.
/// Absent fields degrade to an empty string.
pub fn extract_content(body: &serde_json::Value) -> String {
    body["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

/// Truncates over-long model output to `max_chars` characters, replacing the
/// tail with an ellipsis. Counts characters, not bytes, so multi-byte text
/// is never split.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let truncated: String = text.chars().take(keep).collect();
    format!("{}...", truncated)
}
