pub mod http;
pub mod mock;

pub use http::*;
pub use mock::*;

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::ApiError;
use crate::models::{Question, Verdict};
use crate::wire::GenerationRequest;

/// Remote quiz service abstraction.
///
/// Implementors own transport and payload encoding; normalization of the
/// question type, subject and difficulty happens before anything is sent.
/// Errors are surfaced as-is and never retried.
#[async_trait]
pub trait QuizService: Send + Sync + Debug {
    /// Generate a fresh question set.
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>, ApiError>;

    /// Judge a free-text (or unverifiable multiple choice) answer.
    async fn verify(&self, question: &str, answer: &str, question_type: &str) -> Result<Verdict, ApiError>;

    /// Ask a free-text question about the subject and return the answer text.
    async fn ask_follow_up(&self, subject: &str, question: &str) -> Result<String, ApiError>;

    /// Clone this service into a boxed trait object
    fn clone_box(&self) -> Box<dyn QuizService>;
}

impl Clone for Box<dyn QuizService> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl QuizService for Box<dyn QuizService> {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>, ApiError> {
        self.as_ref().generate(request).await
    }

    async fn verify(&self, question: &str, answer: &str, question_type: &str) -> Result<Verdict, ApiError> {
        self.as_ref().verify(question, answer, question_type).await
    }

    async fn ask_follow_up(&self, subject: &str, question: &str) -> Result<String, ApiError> {
        self.as_ref().ask_follow_up(subject, question).await
    }

    fn clone_box(&self) -> Box<dyn QuizService> {
        self.as_ref().clone_box()
    }
}
