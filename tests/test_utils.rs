#![allow(dead_code)]

use std::sync::Arc;

use quizmaker::clients::{MockHandle, MockQuizService};
use quizmaker::models::{AnswerType, Difficulty, Question, QuestionType, Verdict};
use quizmaker::{QuizPage, SessionStore};

/// A page on "Math" backed by a scriptable mock service.
pub fn mock_page() -> (QuizPage<MockQuizService>, Arc<MockHandle>) {
    let (service, handle) = MockQuizService::new();
    let mut page = QuizPage::new(service, SessionStore::new());
    page.select_subject("Math").expect("seed subject");
    (page, handle)
}

/// Same, with answer type and difficulty already chosen.
pub fn ready_to_generate(answer_type: AnswerType) -> (QuizPage<MockQuizService>, Arc<MockHandle>) {
    let (mut page, handle) = mock_page();
    page.options_mut().select_answer_type(answer_type);
    page.options_mut().select_difficulty(Difficulty::Easy);
    (page, handle)
}

pub fn abc_question(correct: Option<&str>) -> Question {
    Question::multiple_choice(
        "Which letter comes second?",
        vec!["A".to_string(), "B".to_string(), "C".to_string()],
        correct.map(str::to_string),
    )
}

pub fn short_question(text: &str) -> Question {
    Question::free_text(text, QuestionType::ShortAnswer)
}

pub fn verdict(correct: bool, feedback: Option<&str>) -> Verdict {
    Verdict { correct, feedback: feedback.map(str::to_string) }
}
