//! Quiz option form: answer type, difficulty and question count.

use crate::error::ValidationError;
use crate::models::{AnswerType, Difficulty};

pub const MIN_QUESTIONS: u8 = 1;
pub const MAX_QUESTIONS: u8 = 10;

/// Pure form state. Nothing here talks to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOptions {
    answer_type: Option<AnswerType>,
    difficulty: Option<Difficulty>,
    question_count: u8,
}

impl Default for QuizOptions {
    fn default() -> Self {
        Self { answer_type: None, difficulty: None, question_count: MIN_QUESTIONS }
    }
}

impl QuizOptions {
    pub fn answer_type(&self) -> Option<AnswerType> {
        self.answer_type
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    pub fn question_count(&self) -> u8 {
        self.question_count
    }

    pub fn select_answer_type(&mut self, answer_type: AnswerType) {
        self.answer_type = Some(answer_type);
    }

    pub fn select_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = Some(difficulty);
    }

    /// Set the count, clamped to `MIN_QUESTIONS..=MAX_QUESTIONS`.
    pub fn set_question_count(&mut self, count: i64) {
        self.question_count = count.clamp(i64::from(MIN_QUESTIONS), i64::from(MAX_QUESTIONS)) as u8;
    }

    pub fn increment(&mut self) {
        if self.question_count < MAX_QUESTIONS {
            self.question_count += 1;
        }
    }

    pub fn decrement(&mut self) {
        if self.question_count > MIN_QUESTIONS {
            self.question_count -= 1;
        }
    }

    /// Both selections made; the count always has a value.
    pub fn is_complete(&self) -> bool {
        self.answer_type.is_some() && self.difficulty.is_some()
    }

    /// The selections needed for a generation request.
    pub fn require(&self) -> Result<(AnswerType, Difficulty, u8), ValidationError> {
        let answer_type = self.answer_type.ok_or(ValidationError::MissingAnswerType)?;
        let difficulty = self.difficulty.ok_or(ValidationError::MissingDifficulty)?;
        Ok((answer_type, difficulty, self.question_count))
    }
}
