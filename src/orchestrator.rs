//! Quiz page orchestration: subject selection, input capture, option
//! selection, generation and the answer loop, composed over one
//! [`SessionStore`].

use std::path::Path;

use tracing::{info, instrument, warn};

use crate::answers::{AnswerSheet, SubmissionReport};
use crate::capture::{FrameSource, InputCapture, InputTab};
use crate::clients::QuizService;
use crate::error::{QuizError, ValidationError};
use crate::models::CapturedImage;
use crate::options::QuizOptions;
use crate::store::SessionStore;
use crate::wire::GenerationRequest;

/// Where the page is in the quiz flow.
///
/// Derived from the store and the page's capture state rather than stored,
/// so it can never disagree with what the views show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No subject selected yet.
    Idle,
    /// Camera open or a chat answer outstanding.
    CapturingInput,
    /// Waiting for answer type and difficulty, or for the user to submit.
    OptionsPending,
    Generating,
    /// Questions are on screen.
    Ready,
    /// Last generation failed; the form is enabled for a retry.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Questions stored; carries how many.
    Ready(usize),
    /// The session moved on while the call was outstanding.
    Discarded,
}

#[derive(Debug)]
pub struct QuizPage<S: QuizService = Box<dyn QuizService>> {
    service: S,
    store: SessionStore,
    options: QuizOptions,
    capture: InputCapture,
    answers: AnswerSheet,
}

impl<S: QuizService> QuizPage<S> {
    pub fn new(service: S, store: SessionStore) -> Self {
        Self {
            service,
            store,
            options: QuizOptions::default(),
            capture: InputCapture::default(),
            answers: AnswerSheet::default(),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn options(&self) -> &QuizOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut QuizOptions {
        &mut self.options
    }

    pub fn capture(&self) -> &InputCapture {
        &self.capture
    }

    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    pub fn phase(&self) -> Phase {
        let state = self.store.snapshot();
        if state.active_subject.is_none() {
            Phase::Idle
        } else if state.loading {
            Phase::Generating
        } else if state.error.is_some() {
            Phase::Error
        } else if !state.questions.is_empty() {
            Phase::Ready
        } else if state.is_thinking() || self.capture.is_capturing() {
            Phase::CapturingInput
        } else {
            Phase::OptionsPending
        }
    }

    /// Switch the active subject. Everything in progress is reset: capture,
    /// options, answers, questions and errors.
    pub fn select_subject(&mut self, name: &str) -> Result<(), ValidationError> {
        self.store.switch_subject(name)?;
        self.options = QuizOptions::default();
        self.capture = InputCapture::default();
        self.answers = AnswerSheet::default();
        Ok(())
    }

    pub fn select_tab(&mut self, tab: InputTab) {
        self.capture.tab = tab;
    }

    pub fn open_camera(&mut self) -> Result<(), QuizError> {
        self.require_import_tab()?;
        self.capture.image.open_camera();
        Ok(())
    }

    pub fn cancel_camera(&mut self) {
        self.capture.image.cancel_camera();
    }

    pub async fn capture_frame<F: FrameSource + ?Sized>(&mut self, source: &F) -> Result<&CapturedImage, QuizError> {
        self.require_import_tab()?;
        let image = self.capture.image.capture(source).await?;
        self.store.clear_error();
        Ok(image)
    }

    pub async fn pick_image(&mut self, path: &Path) -> Result<&CapturedImage, QuizError> {
        self.require_import_tab()?;
        let image = self.capture.image.pick_file(path).await?;
        self.store.clear_error();
        Ok(image)
    }

    pub fn clear_image(&mut self) {
        self.capture.image.clear();
    }

    fn require_import_tab(&self) -> Result<(), QuizError> {
        match self.capture.tab {
            InputTab::Import => Ok(()),
            InputTab::Text => Err(crate::error::CaptureError::WrongTab.into()),
        }
    }

    /// Send a chat message on the text tab; the answer joins the source text.
    pub async fn ask(&mut self, message: &str) -> Result<String, QuizError> {
        let subject = self.store.active_subject().ok_or(ValidationError::NoActiveSubject)?;
        self.capture.tab = InputTab::Text;
        self.capture.chat.ask(&self.service, &self.store, &subject, message).await
    }

    /// Submit control state for generation.
    pub fn can_generate(&self) -> bool {
        self.options.is_complete() && !self.store.is_loading() && self.store.active_subject().is_some()
    }

    /// Compose the request from the current subject, options and capture.
    pub fn build_request(&self) -> Result<GenerationRequest, ValidationError> {
        let subject = self.store.active_subject().ok_or(ValidationError::NoActiveSubject)?;
        let (answer_type, difficulty, question_count) = self.options.require()?;
        Ok(GenerationRequest {
            subject,
            answer_type,
            difficulty,
            question_count,
            image: self.capture.attached_image(),
            source_text: self.capture.attached_text(),
        })
    }

    /// Generate a question set. Also the retry path after an error.
    ///
    /// On failure the store keeps a human-readable error and the error is
    /// returned; nothing is retried automatically.
    #[instrument(target = "quizmaker::orchestrator", skip(self))]
    pub async fn generate(&mut self) -> Result<GenerationOutcome, QuizError> {
        let request = self.build_request()?;
        let ticket = self.store.begin_generation()?;
        self.answers = AnswerSheet::default();

        info!(
            target: "quizmaker::orchestrator",
            subject = %request.subject,
            answer_type = %request.answer_type,
            difficulty = %request.difficulty,
            count = request.question_count,
            "Generating quiz"
        );

        match self.service.generate(&request).await {
            Ok(questions) => {
                let count = questions.len();
                if self.store.finish_generation(ticket, Ok(questions)) {
                    self.answers = AnswerSheet::new(count);
                    Ok(GenerationOutcome::Ready(count))
                } else {
                    Ok(GenerationOutcome::Discarded)
                }
            }
            Err(e) => {
                warn!(target: "quizmaker::orchestrator", error = %e, "Quiz generation failed");
                self.store.finish_generation(ticket, Err(e.user_message()));
                Err(e.into())
            }
        }
    }

    pub fn set_answer(&mut self, index: usize, value: impl Into<String>) -> Result<(), ValidationError> {
        self.answers.set_answer(&self.store, index, value)
    }

    pub fn can_submit(&self) -> bool {
        self.answers.can_submit(&self.store)
    }

    /// Run the verification loop over the current questions.
    pub async fn submit(&mut self) -> Result<SubmissionReport, ValidationError> {
        self.answers.submit(&self.service, &self.store).await
    }
}
