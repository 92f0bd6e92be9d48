use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::{debug, error, info, instrument, warn};

use super::QuizService;
use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::interceptors::Interceptor;
use crate::models::{Question, Verdict};
use crate::wire::{unwrap_follow_up_answer, FollowUpAnswer, FollowUpBody, GenerationRequest, VerifyBody};

const GENERATE_PATH: &str = "questions/generate";
const VERIFY_PATH: &str = "questions/verify";
const FOLLOW_UP_PATH: &str = "questions/answers/generate";

/// reqwest-backed client for the remote quiz service.
#[derive(Clone, Debug)]
pub struct HttpQuizService {
    config: ServiceConfig,
    http: Client,
    interceptor: Option<Arc<dyn Interceptor>>,
}

impl HttpQuizService {
    pub fn new(config: ServiceConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| ApiError::Network(e.to_string()))?;
        info!(target: "quizmaker::client", base_url = %config.base_url, "Creating quiz service client");
        Ok(Self { config, http, interceptor: None })
    }

    /// Record every exchange through the given interceptor.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Turn a response into its body text, mapping non-2xx to `ServiceError`.
    async fn read_success(response: Response) -> Result<String, ApiError> {
        let status = response.status();
        debug!(target: "quizmaker::client", status = %status, "Received response");

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(target: "quizmaker::client", status = %status, error = %message, "Quiz service error");
            return Err(ApiError::Service { status: status.as_u16(), message });
        }

        response.text().await.map_err(|e| {
            error!(target: "quizmaker::client", error = %e, "Failed to read response body");
            ApiError::Network(e.to_string())
        })
    }

    async fn record(&self, endpoint: &str, request: &str, response: &str) {
        if let Some(interceptor) = &self.interceptor {
            if let Err(e) = interceptor.save(endpoint, request, response).await {
                warn!(target: "quizmaker::client", error = %e, endpoint, "Failed to record exchange");
            }
        }
    }

    fn network(e: reqwest::Error) -> ApiError {
        error!(target: "quizmaker::client", error = %e, "HTTP request failed");
        ApiError::Network(e.to_string())
    }
}

#[async_trait]
impl QuizService for HttpQuizService {
    #[instrument(target = "quizmaker::client", skip(self, request), fields(subject = %request.subject, count = request.question_count, has_image = request.image.is_some()))]
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>, ApiError> {
        let data = serde_json::to_string(&request.data()).map_err(|e| ApiError::Decode(e.to_string()))?;
        let mut form = Form::new().text("data", data.clone());

        if let Some(image) = &request.image {
            let part = Part::bytes(image.bytes.to_vec())
                .file_name(image.file_name.clone())
                .mime_str(&image.mime)
                .map_err(|e| ApiError::Decode(format!("invalid image content type '{}': {}", image.mime, e)))?;
            form = form.part("textbook_image", part);
        }

        debug!(target: "quizmaker::client", "Sending generation request");
        let response = self
            .http
            .post(self.config.endpoint(GENERATE_PATH))
            .multipart(form)
            .send()
            .await
            .map_err(Self::network)?;

        let body = Self::read_success(response).await?;
        self.record(GENERATE_PATH, &data, &body).await;

        let questions: Vec<Question> = serde_json::from_str(&body).map_err(|e| {
            error!(target: "quizmaker::client", error = %e, "Failed to parse generated questions");
            ApiError::Decode(e.to_string())
        })?;
        let questions = questions
            .into_iter()
            .map(Question::into_checked)
            .collect::<Result<Vec<_>, _>>()?;

        info!(target: "quizmaker::client", question_count = questions.len(), "Generated questions");
        Ok(questions)
    }

    #[instrument(target = "quizmaker::client", skip(self, question, answer))]
    async fn verify(&self, question: &str, answer: &str, question_type: &str) -> Result<Verdict, ApiError> {
        let body = VerifyBody::new(question, answer, question_type);
        let request_text = serde_json::to_string(&body).unwrap_or_default();

        let response = self
            .http
            .post(self.config.endpoint(VERIFY_PATH))
            .json(&body)
            .send()
            .await
            .map_err(Self::network)?;

        let text = Self::read_success(response).await?;
        self.record(VERIFY_PATH, &request_text, &text).await;

        let verdict: Verdict = serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))?;
        debug!(target: "quizmaker::client", correct = verdict.correct, "Verified answer");
        Ok(verdict)
    }

    #[instrument(target = "quizmaker::client", skip(self, question), fields(question_len = question.len()))]
    async fn ask_follow_up(&self, subject: &str, question: &str) -> Result<String, ApiError> {
        let body = FollowUpBody::new(subject, question);
        let request_text = serde_json::to_string(&body).unwrap_or_default();

        let response = self
            .http
            .post(self.config.endpoint(FOLLOW_UP_PATH))
            .json(&body)
            .send()
            .await
            .map_err(Self::network)?;

        let text = Self::read_success(response).await?;
        self.record(FOLLOW_UP_PATH, &request_text, &text).await;

        let envelope: FollowUpAnswer = serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))?;
        let answer = unwrap_follow_up_answer(envelope.answer);
        info!(target: "quizmaker::client", answer_len = answer.len(), "Received follow-up answer");
        Ok(answer)
    }

    fn clone_box(&self) -> Box<dyn QuizService> {
        Box::new(self.clone())
    }
}
