use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://usa-v1.onrender.com";

/// Trait for settings that can be looked up in the environment
pub trait EnvSetting {
    /// The environment variable name for this setting
    const VAR_NAME: &'static str;

    /// Find the value by checking environment variables, loading `.env` first
    fn find() -> Option<String> {
        // Missing .env is fine
        let _ = dotenvy::dotenv();

        env::var(Self::VAR_NAME).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Connection settings for the remote quiz service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
    /// No timeout unless set: a hung call keeps the page loading.
    pub timeout: Option<Duration>,
}

impl EnvSetting for ServiceConfig {
    const VAR_NAME: &'static str = "QUIZ_API_URL";
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: Self::find().unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: None,
        }
    }
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Join an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = ServiceConfig::new("http://localhost:8000/");
        assert_eq!(config.endpoint("/questions/verify"), "http://localhost:8000/questions/verify");
        assert_eq!(ServiceConfig::new("http://h").endpoint("questions/generate"), "http://h/questions/generate");
    }
}
