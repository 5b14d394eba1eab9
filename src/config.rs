use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use crate::error::{AppError, Result};

#[derive(Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub completion_base: String,
    pub completion_deployment: String,
    pub completion_api_version: String,
    pub completion_api_key: String,
    /// Relay model output as server-sent events instead of a single payload.
    pub streaming: bool,
    /// Overrides the per-host Wikipedia summary endpoint, e.g. to point at a
    /// local mirror or a test stub.
    pub wiki_api_base: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        let completion_base = env::var("AZURE_OPENAI_BASE")
            .map_err(|_| AppError::ConfigError("AZURE_OPENAI_BASE is not set".to_string()))?;
        let completion_deployment = env::var("AZURE_OPENAI_DEPLOYMENT")
            .map_err(|_| AppError::ConfigError("AZURE_OPENAI_DEPLOYMENT is not set".to_string()))?;
        let completion_api_version = env::var("AZURE_OPENAI_API_VERSION")
            .map_err(|_| AppError::ConfigError("AZURE_OPENAI_API_VERSION is not set".to_string()))?;

        // A missing key is a startup fault. It must never be sent downstream
        // as an empty credential.
        let completion_api_key = env::var("AZURE_OPENAI_API_KEY")
            .map_err(|_| AppError::ConfigError("AZURE_OPENAI_API_KEY is not set".to_string()))?;
        if completion_api_key.trim().is_empty() {
            return Err(AppError::ConfigError(
                "AZURE_OPENAI_API_KEY is empty".to_string(),
            ));
        }

        let streaming = env::var("STREAMING_ENABLED")
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        let wiki_api_base = env::var("WIKI_API_BASE").ok();

        // Load server configuration with defaults
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let port = port
            .parse::<u16>()
            .map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let server_addr = SocketAddr::new(ip, port);

        Ok(Config {
            server_addr,
            completion_base,
            completion_deployment,
            completion_api_version,
            completion_api_key,
            streaming,
            wiki_api_base,
        })
    }

    /// Full chat-completions URL for the configured deployment.
    pub fn completion_endpoint(&self) -> String {
        format!(
            "{}openai/deployments/{}/chat/completions?api-version={}",
            self.completion_base, self.completion_deployment, self.completion_api_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server_addr: "127.0.0.1:3000".parse().unwrap(),
            completion_base: "https://example.openai.azure.com/".to_string(),
            completion_deployment: "gpt-4.1-nano".to_string(),
            completion_api_version: "2024-02-01".to_string(),
            completion_api_key: "secret".to_string(),
            streaming: true,
            wiki_api_base: None,
        }
    }

    #[test]
    fn completion_endpoint_includes_deployment_and_version() {
        let endpoint = test_config().completion_endpoint();
        assert_eq!(
            endpoint,
            "https://example.openai.azure.com/openai/deployments/gpt-4.1-nano/chat/completions?api-version=2024-02-01"
        );
    }
}
