pub mod answers;
pub mod capture;
pub mod clients;
pub mod config;
pub mod error;
pub mod interceptors;
pub mod models;
pub mod options;
pub mod orchestrator;
pub mod store;
pub mod subjects;
pub mod wire;

// Convenient re-exports
pub use clients::{HttpQuizService, MockQuizService, QuizService};
pub use error::{ApiError, QuizError, ValidationError};
pub use orchestrator::{GenerationOutcome, Phase, QuizPage};
pub use store::SessionStore;
pub use wire::normalize_question_type;
