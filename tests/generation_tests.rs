mod test_utils;

use quizmaker::capture::InputTab;
use quizmaker::clients::MockCall;
use quizmaker::models::{AnswerType, QuestionType};
use quizmaker::{ApiError, GenerationOutcome, Phase, QuizError, ValidationError};

use crate::test_utils::{abc_question, mock_page, ready_to_generate, short_question};

#[tokio::test]
async fn generation_requires_answer_type_and_difficulty() {
    let (mut page, handle) = mock_page();
    let err = page.generate().await.unwrap_err();
    assert!(matches!(err, QuizError::Validation(ValidationError::MissingAnswerType)));

    page.options_mut().select_answer_type(AnswerType::ShortAnswer);
    let err = page.generate().await.unwrap_err();
    assert!(matches!(err, QuizError::Validation(ValidationError::MissingDifficulty)));

    assert!(handle.calls().is_empty());
    assert_eq!(page.phase(), Phase::OptionsPending);
}

#[tokio::test]
async fn successful_generation_populates_store() {
    let (mut page, handle) = ready_to_generate(AnswerType::MultipleChoice);
    page.options_mut().increment();
    page.options_mut().increment();
    handle.push_generation(Ok(vec![abc_question(Some("B")), abc_question(None), abc_question(None)]));

    let outcome = page.generate().await.unwrap();

    assert_eq!(outcome, GenerationOutcome::Ready(3));
    assert_eq!(page.phase(), Phase::Ready);
    assert_eq!(page.store().question_count(), 3);
    assert!(!page.store().is_loading());
    assert_eq!(page.answers().answers().len(), 3);

    match &handle.calls()[0] {
        MockCall::Generate { data, has_image } => {
            assert_eq!(data.subject, "math");
            assert_eq!(data.question_type, "multiple_choice");
            assert_eq!(data.difficulty, "easy");
            assert_eq!(data.number_of_questions, 3);
            assert_eq!(data.source_text, None);
            assert!(!has_image);
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test]
async fn failed_generation_sets_error_and_allows_retry() {
    let (mut page, handle) = ready_to_generate(AnswerType::Descriptive);
    handle.push_generation(Err(ApiError::Service { status: 500, message: "model overloaded".into() }));
    handle.push_generation(Ok(vec![quizmaker::models::Question::free_text("Explain", QuestionType::Description)]));

    let err = page.generate().await.unwrap_err();
    assert!(matches!(err, QuizError::Api(ApiError::Service { status: 500, .. })));
    assert_eq!(page.phase(), Phase::Error);
    assert_eq!(page.store().error().as_deref(), Some("Failed to generate quiz: model overloaded"));
    assert!(page.can_generate());

    let outcome = page.generate().await.unwrap();
    assert_eq!(outcome, GenerationOutcome::Ready(1));
    assert_eq!(page.store().error(), None);
    assert_eq!(page.phase(), Phase::Ready);
}

#[tokio::test]
async fn malformed_multiple_choice_is_a_service_failure() {
    let (mut page, handle) = ready_to_generate(AnswerType::MultipleChoice);
    handle.push_generation(Ok(vec![quizmaker::models::Question::multiple_choice("Pick", vec![], None)]));

    let err = page.generate().await.unwrap_err();
    assert!(matches!(err, QuizError::Api(ApiError::Decode(_))));
    assert_eq!(page.phase(), Phase::Error);
}

#[tokio::test]
async fn only_one_generation_in_flight() {
    let (mut page, handle) = ready_to_generate(AnswerType::ShortAnswer);
    let store = page.store().clone();
    let gate = handle.hold_next_generation();
    handle.push_generation(Ok(vec![short_question("one")]));

    let (first, second) = tokio::join!(page.generate(), async {
        assert!(store.is_loading());
        let second = store.begin_generation();
        gate.send(()).ok();
        second
    });

    assert_eq!(second, Err(ValidationError::GenerationInFlight));
    assert_eq!(first.unwrap(), GenerationOutcome::Ready(1));
}

#[tokio::test]
async fn late_generation_is_discarded_when_subject_switches() {
    let (mut page, handle) = ready_to_generate(AnswerType::ShortAnswer);
    let store = page.store().clone();
    let gate = handle.hold_next_generation();
    handle.push_generation(Ok(vec![short_question("stale")]));

    let (outcome, _) = tokio::join!(page.generate(), async {
        store.switch_subject("History").unwrap();
        gate.send(()).ok();
    });

    assert_eq!(outcome.unwrap(), GenerationOutcome::Discarded);
    assert!(store.questions().is_empty());
    assert_eq!(store.active_subject().as_deref(), Some("History"));
    assert!(!store.is_loading());
}

#[tokio::test]
async fn picked_image_is_attached_on_import_tab_only() {
    let (mut page, handle) = ready_to_generate(AnswerType::ShortAnswer);
    let path = std::env::temp_dir().join(format!("quizmaker-page-{}.png", std::process::id()));
    tokio::fs::write(&path, [0x89, b'P', b'N', b'G']).await.unwrap();

    let picked = page.pick_image(&path).await.unwrap().clone();
    assert_eq!(picked.mime, "image/png");

    let request = page.build_request().unwrap();
    assert_eq!(request.image, Some(picked));

    page.select_tab(InputTab::Text);
    assert_eq!(page.build_request().unwrap().image, None);

    page.select_tab(InputTab::Import);
    handle.push_generation(Ok(vec![short_question("q")]));
    page.generate().await.unwrap();
    assert!(matches!(handle.calls()[0], MockCall::Generate { has_image: true, .. }));

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn image_capture_is_refused_on_text_tab() {
    let (mut page, _handle) = mock_page();
    page.select_tab(InputTab::Text);
    assert!(matches!(page.open_camera(), Err(QuizError::Capture(_))));
}
