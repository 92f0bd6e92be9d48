use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Quiz service error: {0}")]
    Api(#[from] ApiError),
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
}

/// Failures talking to the remote quiz service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced a response (connect, DNS, TLS, body stream).
    #[error("Network error: {0}")]
    Network(String),
    /// The service answered with a non-success status.
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },
    /// The service answered 2xx but the body did not match the contract.
    #[error("Malformed service response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text shown in the page's error banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Could not reach the quiz service. Check your connection and try again.".to_string(),
            ApiError::Service { status, message } if message.trim().is_empty() => {
                format!("Failed to generate quiz (status {})", status)
            }
            ApiError::Service { message, .. } => format!("Failed to generate quiz: {}", message.trim()),
            ApiError::Decode(_) => "The quiz service returned an unexpected response.".to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Select an answer type first")]
    MissingAnswerType,
    #[error("Select a difficulty first")]
    MissingDifficulty,
    #[error("Select a subject first")]
    NoActiveSubject,
    #[error("A quiz is already being generated")]
    GenerationInFlight,
    #[error("Still waiting for the previous answer")]
    FollowUpInFlight,
    #[error("Subject name cannot be empty")]
    EmptySubjectName,
    #[error("Please upload a PDF file")]
    MissingSourceDocument,
    #[error("Source document must be a PDF: {0}")]
    NotPdf(String),
    #[error("Subject '{0}' already exists")]
    DuplicateSubject(String),
    #[error("Unknown subject '{0}'")]
    UnknownSubject(String),
    #[error("Answers were already submitted")]
    AlreadySubmitted,
    #[error("Answers are being verified")]
    SubmissionInProgress,
    #[error("No questions to answer")]
    NoQuestions,
    #[error("Question {0} does not exist")]
    QuestionOutOfRange(usize),
    #[error("Question {0} is already graded")]
    QuestionLocked(usize),
    #[error("'{choice}' is not a choice of question {index}")]
    UnknownChoice { index: usize, choice: String },
    #[error("Message cannot be empty")]
    EmptyMessage,
    #[error("Unknown {kind} '{value}'")]
    UnknownOption { kind: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Camera is not open")]
    CameraClosed,
    #[error("Image capture is only available on the import tab")]
    WrongTab,
    #[error("Failed to read image '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Frame source failed: {0}")]
    FrameSource(String),
    #[error("Captured frame was empty")]
    EmptyFrame,
}
