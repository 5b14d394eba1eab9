pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod rate_limit;
pub mod stream;
pub mod wiki;

use std::sync::Arc;
use config::Config;
use rate_limit::RateLimiter;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState {
            config: Arc::new(config),
            http: reqwest::Client::new(),
            limiter: Arc::new(RateLimiter::default()),
        }
    }
}
