//! Answer sheet and the sequential verification loop.

use tracing::{debug, info, instrument, warn};

use crate::clients::QuizService;
use crate::error::{ApiError, ValidationError};
use crate::models::{InputKind, QuestionStatus};
use crate::store::SessionStore;

/// What happened to one question during a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Graded against the known correct choice, no network call.
    Local(QuestionStatus),
    /// Graded by the verification endpoint.
    Verified(QuestionStatus),
    /// Verification failed; the question stays ungraded.
    Failed(ApiError),
    /// The session moved on (subject switch or new quiz) before this
    /// question was graded.
    Discarded,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl SubmissionReport {
    pub fn graded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ItemOutcome::Local(_) | ItemOutcome::Verified(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o, ItemOutcome::Failed(_))).count()
    }
}

/// The user's answers for the current question set. Whether a batch is
/// running lives in the store so subscribers see it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    answers: Vec<String>,
}

impl AnswerSheet {
    /// Blank answers for `count` questions.
    pub fn new(count: usize) -> Self {
        Self { answers: vec![String::new(); count] }
    }

    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(index).map(String::as_str)
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// Inputs of a graded question are read-only, as is every input while a
    /// batch runs.
    pub fn is_read_only(&self, store: &SessionStore, index: usize) -> bool {
        store.is_submitting() || store.question(index).map_or(true, |q| q.is_graded())
    }

    /// Edit one answer. Multiple choice answers must be one of the choices.
    pub fn set_answer(&mut self, store: &SessionStore, index: usize, value: impl Into<String>) -> Result<(), ValidationError> {
        let question = store.question(index).ok_or(ValidationError::QuestionOutOfRange(index))?;
        if store.is_submitting() {
            return Err(ValidationError::SubmissionInProgress);
        }
        if question.is_graded() {
            return Err(ValidationError::QuestionLocked(index));
        }
        let value = value.into();
        if let InputKind::SingleSelect(choices) = question.input_kind() {
            if !choices.iter().any(|c| *c == value) {
                return Err(ValidationError::UnknownChoice { index, choice: value });
            }
        }
        if self.answers.len() <= index {
            self.answers.resize(index + 1, String::new());
        }
        self.answers[index] = value;
        Ok(())
    }

    /// Submission is one-shot: disabled once anything is graded and while a
    /// batch is running.
    pub fn can_submit(&self, store: &SessionStore) -> bool {
        !store.is_submitting() && store.question_count() > 0 && !store.any_graded()
    }

    /// Grade every question in order, one at a time.
    ///
    /// A failed verification leaves that question ungraded and the loop moves
    /// on. If the session moves to a new epoch mid-batch, the remaining
    /// questions are reported as discarded. Dropping the future ends the
    /// batch and unlocks the sheet.
    #[instrument(target = "quizmaker::answers", skip_all, fields(questions = store.question_count()))]
    pub async fn submit<S: QuizService + ?Sized>(&self, service: &S, store: &SessionStore) -> Result<SubmissionReport, ValidationError> {
        let batch = store.begin_submission()?;
        let ticket = batch.ticket();
        let questions = store.questions();
        let mut report = SubmissionReport::default();

        for (index, question) in questions.iter().enumerate() {
            if !store.is_current(ticket) {
                report.outcomes.push(ItemOutcome::Discarded);
                continue;
            }
            let answer = self.answers.get(index).cloned().unwrap_or_default();

            if let Some(status) = question.grade_locally(&answer) {
                let outcome = if store.record_verdict(ticket, index, status, None) {
                    ItemOutcome::Local(status)
                } else {
                    ItemOutcome::Discarded
                };
                report.outcomes.push(outcome);
                continue;
            }

            debug!(target: "quizmaker::answers", index, "Verifying answer");
            match service.verify(&question.question, &answer, question.kind.wire_name()).await {
                Ok(verdict) => {
                    let status = QuestionStatus::from_correct(verdict.correct);
                    let outcome = if store.record_verdict(ticket, index, status, verdict.feedback) {
                        ItemOutcome::Verified(status)
                    } else {
                        ItemOutcome::Discarded
                    };
                    report.outcomes.push(outcome);
                }
                Err(e) => {
                    warn!(target: "quizmaker::answers", index, error = %e, "Verification failed, leaving question ungraded");
                    report.outcomes.push(ItemOutcome::Failed(e));
                }
            }
        }

        drop(batch);
        info!(target: "quizmaker::answers", graded = report.graded(), failed = report.failed(), "Submission finished");
        Ok(report)
    }
}
