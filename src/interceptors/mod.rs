use async_trait::async_trait;
use std::fmt::Debug;

/// Observes each request/response exchange with the quiz service.
#[async_trait]
pub trait Interceptor: Send + Sync + Debug {
    async fn save(&self, endpoint: &str, request: &str, response: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

pub mod file;
pub use file::FileInterceptor;
