use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::debug;

use super::QuizService;
use crate::error::ApiError;
use crate::models::{Question, Verdict};
use crate::wire::{unwrap_follow_up_answer, FollowUpBody, GenerateData, GenerationRequest, VerifyBody};

/// A request the mock received, already normalized as it would be on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Generate { data: GenerateData, has_image: bool },
    Verify(VerifyBody),
    FollowUp(FollowUpBody),
}

#[derive(Debug, Default)]
struct MockState {
    generations: VecDeque<Result<Vec<Question>, ApiError>>,
    verdicts: VecDeque<Result<Verdict, ApiError>>,
    follow_ups: VecDeque<Result<String, ApiError>>,
    calls: Vec<MockCall>,
    generation_gate: Option<oneshot::Receiver<()>>,
    verify_gate: Option<oneshot::Receiver<()>>,
    follow_up_gate: Option<oneshot::Receiver<()>>,
}

/// Script responses for a [`MockQuizService`] and inspect what it was asked.
///
/// Responses are consumed in order. An exhausted queue answers with a
/// network error so unexpected calls show up in tests.
#[derive(Debug, Default)]
pub struct MockHandle {
    state: Mutex<MockState>,
}

impl MockHandle {
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push_generation(&self, result: Result<Vec<Question>, ApiError>) {
        self.state().generations.push_back(result);
    }

    pub fn push_verdict(&self, result: Result<Verdict, ApiError>) {
        self.state().verdicts.push_back(result);
    }

    /// Queue a raw follow-up `answer` field; it goes through the same unwrap
    /// as the HTTP client.
    pub fn push_follow_up(&self, result: Result<String, ApiError>) {
        self.state().follow_ups.push_back(result);
    }

    /// Hold the next generation call until the returned sender fires or drops.
    pub fn hold_next_generation(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state().generation_gate = Some(rx);
        tx
    }

    /// Hold the next verification call, like [`Self::hold_next_generation`].
    pub fn hold_next_verify(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state().verify_gate = Some(rx);
        tx
    }

    /// Hold the next follow-up call, like [`Self::hold_next_generation`].
    pub fn hold_next_follow_up(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state().follow_up_gate = Some(rx);
        tx
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    pub fn verify_calls(&self) -> usize {
        self.state().calls.iter().filter(|c| matches!(c, MockCall::Verify(_))).count()
    }

    fn exhausted(endpoint: &str) -> ApiError {
        ApiError::Network(format!("mock: no scripted response for {}", endpoint))
    }
}

async fn pass(gate: Option<oneshot::Receiver<()>>, endpoint: &str) {
    if let Some(gate) = gate {
        debug!(target: "quizmaker::mock", endpoint, "Call held");
        let _ = gate.await;
    }
}

/// In-memory stand-in for the remote quiz service.
#[derive(Debug, Clone)]
pub struct MockQuizService {
    handle: Arc<MockHandle>,
}

impl MockQuizService {
    pub fn new() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle::default());
        (Self { handle: handle.clone() }, handle)
    }
}

#[async_trait]
impl QuizService for MockQuizService {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>, ApiError> {
        let gate = {
            let mut state = self.handle.state();
            state.calls.push(MockCall::Generate { data: request.data(), has_image: request.image.is_some() });
            state.generation_gate.take()
        };
        pass(gate, "generate").await;
        let result = self
            .handle
            .state()
            .generations
            .pop_front()
            .unwrap_or_else(|| Err(MockHandle::exhausted("generate")));
        result.and_then(|questions| questions.into_iter().map(Question::into_checked).collect())
    }

    async fn verify(&self, question: &str, answer: &str, question_type: &str) -> Result<Verdict, ApiError> {
        let gate = {
            let mut state = self.handle.state();
            state.calls.push(MockCall::Verify(VerifyBody::new(question, answer, question_type)));
            state.verify_gate.take()
        };
        pass(gate, "verify").await;
        self.handle
            .state()
            .verdicts
            .pop_front()
            .unwrap_or_else(|| Err(MockHandle::exhausted("verify")))
    }

    async fn ask_follow_up(&self, subject: &str, question: &str) -> Result<String, ApiError> {
        let gate = {
            let mut state = self.handle.state();
            state.calls.push(MockCall::FollowUp(FollowUpBody::new(subject, question)));
            state.follow_up_gate.take()
        };
        pass(gate, "follow-up").await;
        self.handle
            .state()
            .follow_ups
            .pop_front()
            .unwrap_or_else(|| Err(MockHandle::exhausted("follow-up")))
            .map(unwrap_follow_up_answer)
    }

    fn clone_box(&self) -> Box<dyn QuizService> {
        Box::new(self.clone())
    }
}
