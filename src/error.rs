use axum::{
    response::{IntoResponse, Response},
    Json,
    http::StatusCode,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    success: bool,
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid URL provided")]
    InvalidInput,

    #[error("Invalid URL provided")]
    InvalidUrl,

    #[error("Only wikipedia.org URLs allowed")]
    DisallowedHost,

    #[error("Invalid wikipedia article URL")]
    MissingTitle,

    #[error("Article not found")]
    ArticleNotFound,

    #[error("Wikipedia request timed out. Please try again.")]
    WikiTimeout,

    #[error("Wikipedia fetch failed: {0}")]
    WikiStatus(u16),

    #[error("Failed to fetch article: {0}")]
    FetchError(String),

    #[error("AI service error: {0}. Please try again later.")]
    UpstreamService(u16),

    #[error("AI service unavailable. Please try again later.")]
    UpstreamUnavailable,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Request processing timed out")]
    HandlerTimeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            // All article-fetch faults surface as client errors, matching the
            // observed status mapping of the generate endpoint.
            AppError::InvalidInput
            | AppError::InvalidUrl
            | AppError::DisallowedHost
            | AppError::MissingTitle
            | AppError::ArticleNotFound
            | AppError::WikiTimeout
            | AppError::WikiStatus(_)
            | AppError::FetchError(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamService(_) | AppError::UpstreamUnavailable => {
                StatusCode::BAD_GATEWAY
            }
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::HandlerTimeout => StatusCode::REQUEST_TIMEOUT,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            success: false,
            error: self.to_string(),
        });

        (self.status(), body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::WikiTimeout
        } else {
            AppError::FetchError(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_faults_map_to_bad_request() {
        for err in [
            AppError::InvalidUrl,
            AppError::DisallowedHost,
            AppError::MissingTitle,
            AppError::ArticleNotFound,
            AppError::WikiTimeout,
            AppError::WikiStatus(503),
        ] {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn upstream_and_limit_statuses() {
        assert_eq!(
            AppError::UpstreamService(500).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AppError::HandlerTimeout.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
