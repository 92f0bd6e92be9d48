//! Session store: the single shared state container for a quiz session.
//!
//! The state sits behind a `tokio::sync::watch` channel. Handles are cheap to
//! clone and every mutation goes through one of the named operations below,
//! so a subject switch is always a full reset. Views can `subscribe()` to be
//! woken on every change.
//!
//! Results of asynchronous calls are tagged with a [`Ticket`] taken when the
//! call started. Switching subject or starting a new generation moves the
//! store to a new epoch, and results carrying an older ticket are dropped.
//!
//! Outstanding follow-up questions and verification batches are visible in
//! the state too. Each is held by an [`ActivityGuard`] that clears its flag
//! when dropped, so an abandoned call never leaves the page locked.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::ValidationError;
use crate::models::{Question, QuestionStatus, Subject};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub questions: Vec<Question>,
    pub subjects: Vec<Subject>,
    pub active_subject: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    epoch: u64,
    follow_up: Option<u64>,
    submission: Option<u64>,
    next_activity: u64,
}

impl SessionState {
    fn new(subjects: Vec<Subject>) -> Self {
        Self {
            questions: Vec::new(),
            subjects,
            active_subject: None,
            loading: false,
            error: None,
            epoch: 0,
            follow_up: None,
            submission: None,
            next_activity: 0,
        }
    }

    /// A follow-up question is waiting for its answer.
    pub fn is_thinking(&self) -> bool {
        self.follow_up.is_some()
    }

    /// A verification batch is running.
    pub fn is_submitting(&self) -> bool {
        self.submission.is_some()
    }

    pub fn has_subject(&self, name: &str) -> bool {
        self.subjects.iter().any(|s| s.name == name)
    }

    pub fn any_graded(&self) -> bool {
        self.questions.iter().any(Question::is_graded)
    }

    pub fn score(&self) -> (usize, usize) {
        let correct = self
            .questions
            .iter()
            .filter(|q| q.status.map_or(false, QuestionStatus::is_correct))
            .count();
        (correct, self.questions.len())
    }

    fn advance(&mut self) -> Ticket {
        self.epoch += 1;
        Ticket(self.epoch)
    }

    fn slot(&mut self, activity: Activity) -> &mut Option<u64> {
        match activity {
            Activity::FollowUp => &mut self.follow_up,
            Activity::Submission => &mut self.submission,
        }
    }

    fn claim(&mut self, activity: Activity) -> u64 {
        self.next_activity += 1;
        let id = self.next_activity;
        *self.slot(activity) = Some(id);
        id
    }
}

/// Marks which epoch an asynchronous result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    FollowUp,
    Submission,
}

/// Holds one in-progress flag in the store; dropping it clears the flag.
///
/// A guard only clears the flag it set. If a subject switch already reset
/// the flag, or a newer call claimed it, dropping an old guard is a no-op.
#[must_use = "the activity ends when the guard is dropped"]
#[derive(Debug)]
pub struct ActivityGuard {
    store: SessionStore,
    activity: Activity,
    id: u64,
    ticket: Ticket,
}

impl ActivityGuard {
    /// Epoch the activity started in.
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        let (activity, id) = (self.activity, self.id);
        let cleared = self.store.tx.send_if_modified(|state| {
            let slot = state.slot(activity);
            if *slot == Some(id) {
                *slot = None;
                true
            } else {
                false
            }
        });
        debug!(target: "quizmaker::store", ?activity, cleared, "Activity ended");
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Store seeded with the default subjects and no active subject.
    pub fn new() -> Self {
        Self::with_subjects(Subject::seed())
    }

    pub fn with_subjects(subjects: Vec<Subject>) -> Self {
        let (tx, _rx) = watch::channel(SessionState::new(subjects));
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn questions(&self) -> Vec<Question> {
        self.tx.borrow().questions.clone()
    }

    pub fn question(&self, index: usize) -> Option<Question> {
        self.tx.borrow().questions.get(index).cloned()
    }

    pub fn question_count(&self) -> usize {
        self.tx.borrow().questions.len()
    }

    pub fn subjects(&self) -> Vec<Subject> {
        self.tx.borrow().subjects.clone()
    }

    pub fn active_subject(&self) -> Option<String> {
        self.tx.borrow().active_subject.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.tx.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.tx.borrow().error.clone()
    }

    pub fn is_thinking(&self) -> bool {
        self.tx.borrow().is_thinking()
    }

    pub fn is_submitting(&self) -> bool {
        self.tx.borrow().is_submitting()
    }

    pub fn any_graded(&self) -> bool {
        self.tx.borrow().any_graded()
    }

    /// Ticket for the current epoch.
    pub fn ticket(&self) -> Ticket {
        Ticket(self.tx.borrow().epoch)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.tx.borrow().epoch == ticket.0
    }

    /// Append a subject. Names are trimmed and must be non-empty and unique;
    /// a source document reference is required.
    pub fn add_subject(&self, name: &str, source_reference: Option<&str>) -> Result<(), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptySubjectName);
        }
        let reference = source_reference
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(ValidationError::MissingSourceDocument)?;

        let mut outcome = Ok(());
        self.tx.send_if_modified(|state| {
            if state.has_subject(name) {
                outcome = Err(ValidationError::DuplicateSubject(name.to_string()));
                return false;
            }
            state.subjects.push(Subject::new(name, reference));
            true
        });
        if outcome.is_ok() {
            info!(target: "quizmaker::store", subject = name, "Added subject");
        }
        outcome
    }

    /// Make `name` the active subject and drop everything derived from the
    /// previous one. Always a full reset, even when re-selecting the same subject.
    pub fn switch_subject(&self, name: &str) -> Result<Ticket, ValidationError> {
        let mut outcome = Err(ValidationError::UnknownSubject(name.to_string()));
        self.tx.send_if_modified(|state| {
            if !state.has_subject(name) {
                return false;
            }
            state.active_subject = Some(name.to_string());
            state.questions.clear();
            state.error = None;
            state.loading = false;
            state.follow_up = None;
            state.submission = None;
            outcome = Ok(state.advance());
            true
        });
        if outcome.is_ok() {
            info!(target: "quizmaker::store", subject = name, "Switched subject");
        }
        outcome
    }

    /// Enter the loading state for a new question set.
    ///
    /// Fails while another generation is outstanding. Clears the previous
    /// questions, error and any running verification batch, and starts a new
    /// epoch.
    pub fn begin_generation(&self) -> Result<Ticket, ValidationError> {
        let mut outcome = Err(ValidationError::GenerationInFlight);
        self.tx.send_if_modified(|state| {
            if state.active_subject.is_none() {
                outcome = Err(ValidationError::NoActiveSubject);
                return false;
            }
            if state.loading {
                return false;
            }
            state.loading = true;
            state.questions.clear();
            state.error = None;
            state.submission = None;
            outcome = Ok(state.advance());
            true
        });
        outcome
    }

    /// Apply a generation result. Returns false if the ticket is stale, in
    /// which case nothing changes.
    pub fn finish_generation(&self, ticket: Ticket, result: Result<Vec<Question>, String>) -> bool {
        let applied = self.tx.send_if_modified(|state| {
            if state.epoch != ticket.0 {
                return false;
            }
            state.loading = false;
            match result {
                Ok(questions) => {
                    state.questions = questions;
                    state.error = None;
                }
                Err(message) => {
                    state.questions.clear();
                    state.error = Some(message);
                }
            }
            true
        });
        if !applied {
            warn!(target: "quizmaker::store", "Discarding stale generation result");
        }
        applied
    }

    /// Grade question `index`. Stale tickets, unknown indices and questions
    /// that already carry a status are left untouched.
    pub fn record_verdict(&self, ticket: Ticket, index: usize, status: QuestionStatus, feedback: Option<String>) -> bool {
        let applied = self.tx.send_if_modified(|state| {
            if state.epoch != ticket.0 {
                return false;
            }
            state
                .questions
                .get_mut(index)
                .map_or(false, |question| question.record(status, feedback))
        });
        debug!(target: "quizmaker::store", index, ?status, applied, "Recorded verdict");
        applied
    }

    /// Mark a follow-up question as outstanding until the guard drops.
    /// Only one may be outstanding at a time.
    pub fn begin_follow_up(&self) -> Result<ActivityGuard, ValidationError> {
        let mut outcome = Err(ValidationError::FollowUpInFlight);
        self.tx.send_if_modified(|state| {
            if state.is_thinking() {
                return false;
            }
            let id = state.claim(Activity::FollowUp);
            outcome = Ok((id, Ticket(state.epoch)));
            true
        });
        let (id, ticket) = outcome?;
        Ok(ActivityGuard { store: self.clone(), activity: Activity::FollowUp, id, ticket })
    }

    /// Start a verification batch over the current questions.
    ///
    /// Fails while another batch runs, once any question is graded, and when
    /// there are no questions.
    pub fn begin_submission(&self) -> Result<ActivityGuard, ValidationError> {
        let mut outcome = Err(ValidationError::SubmissionInProgress);
        self.tx.send_if_modified(|state| {
            if state.is_submitting() {
                return false;
            }
            if state.any_graded() {
                outcome = Err(ValidationError::AlreadySubmitted);
                return false;
            }
            if state.questions.is_empty() {
                outcome = Err(ValidationError::NoQuestions);
                return false;
            }
            let id = state.claim(Activity::Submission);
            outcome = Ok((id, Ticket(state.epoch)));
            true
        });
        let (id, ticket) = outcome?;
        Ok(ActivityGuard { store: self.clone(), activity: Activity::Submission, id, ticket })
    }

    pub fn clear_error(&self) {
        self.tx.send_if_modified(|state| state.error.take().is_some());
    }
}
