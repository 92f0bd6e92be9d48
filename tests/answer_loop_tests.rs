mod test_utils;

use std::time::Duration;

use quizmaker::answers::ItemOutcome;
use quizmaker::models::{AnswerType, QuestionStatus};
use quizmaker::{ApiError, ValidationError};

use crate::test_utils::{abc_question, ready_to_generate, short_question, verdict};

#[tokio::test]
async fn known_multiple_choice_is_graded_locally() {
    let (mut page, handle) = ready_to_generate(AnswerType::MultipleChoice);
    handle.push_generation(Ok(vec![abc_question(Some("B")), abc_question(Some("B"))]));
    page.generate().await.unwrap();

    page.set_answer(0, "B").unwrap();
    page.set_answer(1, "A").unwrap();
    let report = page.submit().await.unwrap();

    assert_eq!(report.outcomes, vec![ItemOutcome::Local(QuestionStatus::Correct), ItemOutcome::Local(QuestionStatus::Incorrect)]);
    let questions = page.store().questions();
    assert_eq!(questions[0].status, Some(QuestionStatus::Correct));
    assert_eq!(questions[1].status, Some(QuestionStatus::Incorrect));
    assert_eq!(handle.verify_calls(), 0);
}

#[tokio::test]
async fn short_answer_uses_verification_endpoint() {
    let (mut page, handle) = ready_to_generate(AnswerType::ShortAnswer);
    handle.push_generation(Ok(vec![short_question("Capital of France?")]));
    handle.push_verdict(Ok(verdict(true, Some("Good"))));
    page.generate().await.unwrap();

    page.set_answer(0, "Paris").unwrap();
    page.submit().await.unwrap();

    let question = page.store().question(0).unwrap();
    assert_eq!(question.status, Some(QuestionStatus::Correct));
    assert_eq!(question.feedback.as_deref(), Some("Good"));

    let calls = handle.calls();
    match calls.last() {
        Some(quizmaker::clients::MockCall::Verify(body)) => {
            assert_eq!(body.question, "Capital of France?");
            assert_eq!(body.answer, "Paris");
            assert_eq!(body.question_type, "short_answer");
        }
        other => panic!("expected verify call, got {:?}", other),
    }
}

#[tokio::test]
async fn multiple_choice_without_known_answer_is_verified_remotely() {
    let (mut page, handle) = ready_to_generate(AnswerType::MultipleChoice);
    handle.push_generation(Ok(vec![abc_question(None)]));
    handle.push_verdict(Ok(verdict(false, None)));
    page.generate().await.unwrap();

    page.set_answer(0, "C").unwrap();
    let report = page.submit().await.unwrap();

    assert_eq!(report.outcomes, vec![ItemOutcome::Verified(QuestionStatus::Incorrect)]);
    assert_eq!(handle.verify_calls(), 1);
}

#[tokio::test]
async fn one_failed_verification_does_not_block_the_batch() {
    let (mut page, handle) = ready_to_generate(AnswerType::ShortAnswer);
    handle.push_generation(Ok(vec![short_question("one"), short_question("two"), short_question("three")]));
    handle.push_verdict(Ok(verdict(true, None)));
    handle.push_verdict(Err(ApiError::Network("connection reset".into())));
    handle.push_verdict(Ok(verdict(false, Some("Not quite"))));
    page.generate().await.unwrap();

    for i in 0..3 {
        page.set_answer(i, format!("answer {}", i)).unwrap();
    }
    let report = page.submit().await.unwrap();

    assert_eq!(report.graded(), 2);
    assert_eq!(report.failed(), 1);
    let questions = page.store().questions();
    assert_eq!(questions[0].status, Some(QuestionStatus::Correct));
    assert_eq!(questions[1].status, None);
    assert_eq!(questions[2].status, Some(QuestionStatus::Incorrect));
    assert_eq!(questions[2].feedback.as_deref(), Some("Not quite"));
}

#[tokio::test]
async fn answers_are_one_shot() {
    let (mut page, handle) = ready_to_generate(AnswerType::MultipleChoice);
    handle.push_generation(Ok(vec![abc_question(Some("A"))]));
    page.generate().await.unwrap();

    assert!(page.can_submit());
    page.set_answer(0, "A").unwrap();
    page.submit().await.unwrap();

    assert!(!page.can_submit());
    assert_eq!(page.submit().await, Err(ValidationError::AlreadySubmitted));
    assert_eq!(page.set_answer(0, "B"), Err(ValidationError::QuestionLocked(0)));
    assert!(page.answers().is_read_only(page.store(), 0));
}

#[tokio::test]
async fn multiple_choice_answer_must_be_a_choice() {
    let (mut page, handle) = ready_to_generate(AnswerType::MultipleChoice);
    handle.push_generation(Ok(vec![abc_question(Some("A"))]));
    page.generate().await.unwrap();

    assert_eq!(
        page.set_answer(0, "D"),
        Err(ValidationError::UnknownChoice { index: 0, choice: "D".to_string() })
    );
    assert_eq!(page.set_answer(4, "A"), Err(ValidationError::QuestionOutOfRange(4)));
}

#[tokio::test]
async fn submit_without_questions_is_rejected() {
    let (mut page, _handle) = ready_to_generate(AnswerType::ShortAnswer);
    assert!(!page.can_submit());
    assert_eq!(page.submit().await, Err(ValidationError::NoQuestions));
}

#[tokio::test]
async fn sheet_is_locked_while_batch_runs() {
    let (mut page, handle) = ready_to_generate(AnswerType::ShortAnswer);
    handle.push_generation(Ok(vec![short_question("Capital of Italy?")]));
    page.generate().await.unwrap();
    page.set_answer(0, "Rome").unwrap();

    let store = page.store().clone();
    let mut rx = store.subscribe();
    let gate = handle.hold_next_verify();
    handle.push_verdict(Ok(verdict(true, None)));

    let (report, seen) = tokio::join!(page.submit(), async {
        let seen = rx.wait_for(|state| state.is_submitting()).await.is_ok();
        gate.send(()).ok();
        seen
    });

    assert!(seen);
    assert_eq!(report.unwrap().graded(), 1);
    assert!(!store.is_submitting());
}

#[tokio::test]
async fn abandoned_submission_unlocks_the_sheet() {
    let (mut page, handle) = ready_to_generate(AnswerType::ShortAnswer);
    handle.push_generation(Ok(vec![short_question("Capital of Spain?")]));
    page.generate().await.unwrap();
    page.set_answer(0, "Madrid").unwrap();
    let _gate = handle.hold_next_verify();

    let timed_out = tokio::time::timeout(Duration::from_millis(20), page.submit()).await;
    assert!(timed_out.is_err());

    assert!(!page.store().is_submitting());
    assert!(page.can_submit());
    page.set_answer(0, "madrid").unwrap();

    handle.push_verdict(Ok(verdict(true, None)));
    let report = page.submit().await.unwrap();
    assert_eq!(report.outcomes, vec![ItemOutcome::Verified(QuestionStatus::Correct)]);
}
