//! Request/response payloads for the remote quiz service and the
//! normalization applied before anything goes over the wire.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::models::{AnswerType, CapturedImage, Difficulty};

/// Map a user-facing question type onto the service vocabulary.
///
/// Case-insensitive; unknown values are lower-cased and passed through, so the
/// mapping is total and `normalize(normalize(x)) == normalize(x)`.
pub fn normalize_question_type(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    match lowered.as_str() {
        "short answer" => "short_answer".to_string(),
        "multiple choice" => "multiple_choice".to_string(),
        "descriptive" => "description".to_string(),
        _ => lowered,
    }
}

/// Everything needed for one generation call. Lives only for that call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub subject: String,
    pub answer_type: AnswerType,
    pub difficulty: Difficulty,
    pub question_count: u8,
    pub image: Option<CapturedImage>,
    /// Text accumulated in the chat tab, used as question source material.
    pub source_text: Option<String>,
}

impl GenerationRequest {
    /// The JSON sent as the `data` multipart part.
    pub fn data(&self) -> GenerateData {
        GenerateData {
            subject: self.subject.to_lowercase(),
            question_type: normalize_question_type(self.answer_type.label()),
            difficulty: self.difficulty.label().to_lowercase(),
            number_of_questions: self.question_count,
            source_text: self
                .source_text
                .as_ref()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GenerateData {
    pub subject: String,
    pub question_type: String,
    pub difficulty: String,
    pub number_of_questions: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VerifyBody {
    pub question: String,
    pub answer: String,
    pub question_type: String,
}

impl VerifyBody {
    pub fn new(question: &str, answer: &str, question_type: &str) -> Self {
        Self {
            question: question.to_string(),
            answer: answer.to_string(),
            question_type: normalize_question_type(question_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FollowUpBody {
    pub subject: String,
    pub question: String,
}

impl FollowUpBody {
    pub fn new(subject: &str, question: &str) -> Self {
        Self { subject: subject.to_lowercase(), question: question.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "Follow-up answer", description = "Answer to a free-text question; may itself be JSON-encoded")]
pub struct FollowUpAnswer {
    pub answer: String,
}

/// Resolve the follow-up answer text.
///
/// The service sometimes returns `{"answer": "{\"answer\": \"...\"}"}`. The
/// first step parses the raw string as JSON; the second extracts a non-empty
/// string `answer` from it. Anything else keeps the raw text.
pub fn unwrap_follow_up_answer(raw: String) -> String {
    let inner = match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => value,
        Err(_) => return raw,
    };
    match inner.get("answer").and_then(|a| a.as_str()) {
        Some(answer) if !answer.is_empty() => {
            trace!(target: "quizmaker::wire", "Unwrapped double-encoded follow-up answer");
            answer.to_string()
        }
        _ => raw,
    }
}
