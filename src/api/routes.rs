use axum::{
    routing::{get, post},
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
};
use tower_http::cors::{CorsLayer, Any};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::api::models::{GenerationRequest, GenerationResponse};
use crate::{llm, prompt, stream, wiki, AppState};

/// Overall deadline for one request up to the point the completion stream
/// opens; the relay itself runs under its own deadline.
const HANDLER_TIMEOUT: Duration = Duration::from_secs(90);

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/generate", post(generate_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

/// Client key for admission control. Proxy headers first, then a shared
/// bucket for everything unidentified.
fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

async fn generate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    // The gate runs before any look at the body, so malformed requests
    // still count against the limit.
    let key = client_key(&headers);
    if !state.limiter.admit(&key) {
        warn!(client = %key, "rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    let Json(body) = body.map_err(|e| {
        warn!("request body rejected: {}", e);
        AppError::InvalidInput
    })?;
    let request = GenerationRequest::from_value(&body)?;
    info!(
        url = %request.url,
        style = %request.style,
        max_chars = request.max_chars,
        "processing generation request"
    );

    match tokio::time::timeout(HANDLER_TIMEOUT, process_generation(&state, &request)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(url = %request.url, "request processing timed out");
            Err(AppError::HandlerTimeout)
        }
    }
}

async fn process_generation(state: &AppState, request: &GenerationRequest) -> Result<Response> {
    let article =
        wiki::fetch_summary(&request.url, state.config.wiki_api_base.as_deref()).await?;
    info!(
        title = %article.title,
        extract_len = article.extract.len(),
        "article summary fetched"
    );

    let messages = prompt::build_messages(
        &article.extract,
        request.style,
        request.max_chars,
        &article.title,
    );
    let max_tokens = prompt::calculate_max_tokens(request.max_chars as i64);

    let upstream = llm::call_completion(
        &state.http,
        &state.config,
        &messages,
        max_tokens,
        state.config.streaming,
    )
    .await?;

    if state.config.streaming {
        return Ok(stream::relay_response(upstream));
    }

    let body: Value = upstream.json().await.map_err(|e| {
        warn!("completion body parse failed: {}", e);
        AppError::UpstreamUnavailable
    })?;
    let content = llm::extract_content(&body);
    let greentext = llm::truncate_with_ellipsis(&content, request.max_chars as usize);

    Ok(Json(GenerationResponse { success: true, greentext }).into_response())
}
