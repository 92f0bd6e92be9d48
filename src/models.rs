//! Domain types shared by the store, the service client and the views.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ValidationError};
use crate::wire::normalize_question_type;

/// Kind of a generated question, in the service's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[serde(alias = "multiple choice")]
    MultipleChoice,
    #[serde(alias = "short answer")]
    ShortAnswer,
    #[serde(alias = "descriptive")]
    Description,
}

impl QuestionType {
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::ShortAnswer => "short_answer",
            Self::Description => "description",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Outcome of grading one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    Correct,
    Incorrect,
}

impl QuestionStatus {
    pub fn from_correct(correct: bool) -> Self {
        if correct { Self::Correct } else { Self::Incorrect }
    }

    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

/// How a question collects its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind<'a> {
    /// Exclusive single selection among the listed choices.
    SingleSelect(&'a [String]),
    /// Free-text area.
    FreeText,
}

/// A generated question as returned by `POST /questions/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "Question", description = "One generated quiz question")]
pub struct Question {
    /// Question text; may span several lines.
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// Ordered choices, only for multiple choice questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<QuestionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl Question {
    pub fn multiple_choice(question: impl Into<String>, choices: Vec<String>, correct_answer: Option<String>) -> Self {
        Self {
            question: question.into(),
            kind: QuestionType::MultipleChoice,
            choices: Some(choices),
            correct_answer,
            status: None,
            feedback: None,
        }
    }

    pub fn free_text(question: impl Into<String>, kind: QuestionType) -> Self {
        Self {
            question: question.into(),
            kind,
            choices: None,
            correct_answer: None,
            status: None,
            feedback: None,
        }
    }

    /// Enforce the choices invariant on a question received from the service.
    ///
    /// Choices are dropped from free-text questions; a multiple choice
    /// question without choices cannot be answered and is rejected.
    pub fn into_checked(mut self) -> Result<Self, ApiError> {
        match self.kind {
            QuestionType::MultipleChoice => {
                let has_choices = self.choices.as_ref().map_or(false, |c| !c.is_empty());
                if !has_choices {
                    return Err(ApiError::Decode(format!(
                        "multiple choice question without choices: {}",
                        self.question
                    )));
                }
            }
            QuestionType::ShortAnswer | QuestionType::Description => {
                self.choices = None;
            }
        }
        // Grading state is owned by the client.
        self.status = None;
        self.feedback = None;
        Ok(self)
    }

    pub fn input_kind(&self) -> InputKind<'_> {
        match (&self.kind, &self.choices) {
            (QuestionType::MultipleChoice, Some(choices)) => InputKind::SingleSelect(choices),
            _ => InputKind::FreeText,
        }
    }

    pub fn is_graded(&self) -> bool {
        self.status.is_some()
    }

    /// Grade without a network call when the correct choice is known.
    pub fn grade_locally(&self, answer: &str) -> Option<QuestionStatus> {
        match (self.kind, &self.correct_answer) {
            (QuestionType::MultipleChoice, Some(correct)) => Some(QuestionStatus::from_correct(answer == correct)),
            _ => None,
        }
    }

    /// Set the verdict once. Returns false when the question was already graded.
    pub fn record(&mut self, status: QuestionStatus, feedback: Option<String>) -> bool {
        if self.status.is_some() {
            return false;
        }
        self.status = Some(status);
        self.feedback = feedback;
        true
    }
}

/// Verdict returned by `POST /questions/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "Verdict", description = "Judgement of a free-text answer")]
pub struct Verdict {
    pub correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    /// Reference to the uploaded source document; empty for seed subjects.
    pub source_reference: String,
}

impl Subject {
    pub fn new(name: impl Into<String>, source_reference: impl Into<String>) -> Self {
        Self { name: name.into(), source_reference: source_reference.into() }
    }

    pub fn seed() -> Vec<Subject> {
        ["Math", "English", "History"]
            .into_iter()
            .map(|name| Subject::new(name, ""))
            .collect()
    }
}

/// Answer type offered by the option selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerType {
    Random,
    MultipleChoice,
    ShortAnswer,
    Descriptive,
}

impl AnswerType {
    pub const ALL: [AnswerType; 4] = [Self::Random, Self::MultipleChoice, Self::ShortAnswer, Self::Descriptive];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Random => "Random",
            Self::MultipleChoice => "Multiple Choice",
            Self::ShortAnswer => "Short Answer",
            Self::Descriptive => "Descriptive",
        }
    }
}

impl fmt::Display for AnswerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AnswerType {
    type Err = ValidationError;

    /// Accepts display labels and service names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wire = normalize_question_type(s.trim());
        Self::ALL
            .into_iter()
            .find(|t| normalize_question_type(t.label()) == wire)
            .ok_or_else(|| ValidationError::UnknownOption { kind: "answer type", value: s.to_string() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Medium, Self::Hard];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownOption { kind: "difficulty", value: s.to_string() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// A single in-memory image ready to be attached to a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub bytes: Bytes,
    pub file_name: String,
    pub mime: String,
}

impl CapturedImage {
    pub fn new(bytes: impl Into<Bytes>, file_name: impl Into<String>, mime: impl Into<String>) -> Self {
        Self { bytes: bytes.into(), file_name: file_name.into(), mime: mime.into() }
    }

    /// Frames grabbed from a camera are always sent as `captured.png`.
    pub fn from_frame(bytes: impl Into<Bytes>) -> Self {
        Self::new(bytes, "captured.png", "image/png")
    }

    /// Short textual stand-in for the image preview.
    pub fn preview(&self) -> String {
        format!("{} ({}, {} bytes)", self.file_name, self.mime, self.bytes.len())
    }
}
