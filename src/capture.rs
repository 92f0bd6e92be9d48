//! Input capture: the image tab (file picker or camera) and the text tab
//! (conversational follow-up questions whose answers become source text).

use std::path::Path;
use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use futures_core::Stream;
use tokio::process::Command;
use tracing::{debug, error, info, instrument};

use crate::clients::QuizService;
use crate::error::{CaptureError, QuizError, ValidationError};
use crate::models::{CapturedImage, ChatMessage};
use crate::store::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputTab {
    /// Photograph or pick an image of the source page.
    #[default]
    Import,
    /// Build source text by chatting.
    Text,
}

/// Something that can produce a single still frame.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn grab(&self) -> Result<CapturedImage, CaptureError>;
}

/// Grabs a frame by running an external capture program that writes one
/// PNG image to stdout, e.g. `fswebcam --png 0 -`.
#[derive(Debug, Clone)]
pub struct CommandFrameSource {
    program: String,
    args: Vec<String>,
}

impl CommandFrameSource {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    /// Split a shell-like command line on whitespace.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

#[async_trait]
impl FrameSource for CommandFrameSource {
    #[instrument(target = "quizmaker::capture", skip(self), fields(program = %self.program))]
    async fn grab(&self) -> Result<CapturedImage, CaptureError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| CaptureError::FrameSource(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(target: "quizmaker::capture", status = %output.status, "Capture program failed");
            return Err(CaptureError::FrameSource(format!("{} exited with {}: {}", self.program, output.status, stderr.trim())));
        }
        if output.stdout.is_empty() {
            return Err(CaptureError::EmptyFrame);
        }
        debug!(target: "quizmaker::capture", bytes = output.stdout.len(), "Grabbed frame");
        Ok(CapturedImage::from_frame(output.stdout))
    }
}

/// Content type for a picked file, from its extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum ImageState {
    #[default]
    Empty,
    CameraOpen,
    Captured(CapturedImage),
}

/// Image tab. Holds at most one image; while it is held the preview
/// replaces the capture controls until cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageCapture {
    state: ImageState,
}

impl ImageCapture {
    pub fn image(&self) -> Option<&CapturedImage> {
        match &self.state {
            ImageState::Captured(image) => Some(image),
            _ => None,
        }
    }

    pub fn is_camera_open(&self) -> bool {
        matches!(self.state, ImageState::CameraOpen)
    }

    /// Open the live camera view. Opening discards any held image.
    pub fn open_camera(&mut self) {
        self.state = ImageState::CameraOpen;
    }

    /// Leave the camera view without capturing.
    pub fn cancel_camera(&mut self) {
        if self.is_camera_open() {
            self.state = ImageState::Empty;
        }
    }

    /// Grab one frame from `source` and close the camera.
    pub async fn capture<F: FrameSource + ?Sized>(&mut self, source: &F) -> Result<&CapturedImage, CaptureError> {
        if !self.is_camera_open() {
            return Err(CaptureError::CameraClosed);
        }
        let image = source.grab().await?;
        info!(target: "quizmaker::capture", preview = %image.preview(), "Captured frame");
        self.state = ImageState::Captured(image);
        self.image().ok_or(CaptureError::EmptyFrame)
    }

    /// File picker: load an image from disk.
    pub async fn pick_file(&mut self, path: &Path) -> Result<&CapturedImage, CaptureError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| CaptureError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if bytes.is_empty() {
            return Err(CaptureError::EmptyFrame);
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let image = CapturedImage::new(bytes, file_name, mime_for_path(path));
        info!(target: "quizmaker::capture", preview = %image.preview(), "Picked image file");
        self.state = ImageState::Captured(image);
        self.image().ok_or(CaptureError::EmptyFrame)
    }

    pub fn clear(&mut self) {
        self.state = ImageState::Empty;
    }
}

/// Text tab: a conversation whose assistant answers accumulate into the
/// source text for generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatCapture {
    messages: Vec<ChatMessage>,
    buffer: String,
}

impl ChatCapture {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Accumulated answers, newline-joined.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Send one user message and wait for the answer.
    ///
    /// Blank messages are rejected without a call. The store shows the
    /// thinking flag while the call is outstanding. A failed call is logged
    /// and leaves only the user message in the log.
    pub async fn ask<S: QuizService + ?Sized>(
        &mut self,
        service: &S,
        store: &SessionStore,
        subject: &str,
        message: &str,
    ) -> Result<String, QuizError> {
        if message.trim().is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        let thinking = store.begin_follow_up()?;
        self.messages.push(ChatMessage::user(message));
        let result = service.ask_follow_up(subject, message).await;
        drop(thinking);

        match result {
            Ok(answer) => {
                self.messages.push(ChatMessage::assistant(answer.clone()));
                self.buffer.push('\n');
                self.buffer.push_str(&answer);
                Ok(answer)
            }
            Err(e) => {
                error!(target: "quizmaker::capture", error = %e, "Error fetching answer");
                Err(e.into())
            }
        }
    }
}

/// Progressive prefixes of `text`, one more character per `delay`.
/// Presentation only: the full answer is already known.
pub fn typewriter(text: String, delay: Duration) -> impl Stream<Item = String> {
    stream! {
        let mut shown = String::with_capacity(text.len());
        for ch in text.chars() {
            shown.push(ch);
            yield shown.clone();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Both capture modes behind the tab control.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputCapture {
    pub tab: InputTab,
    pub image: ImageCapture,
    pub chat: ChatCapture,
}

impl InputCapture {
    /// Camera view open.
    pub fn is_capturing(&self) -> bool {
        self.image.is_camera_open()
    }

    /// Image attached to generation, if on the import tab.
    pub fn attached_image(&self) -> Option<CapturedImage> {
        match self.tab {
            InputTab::Import => self.image.image().cloned(),
            InputTab::Text => None,
        }
    }

    /// Source text attached to generation, if on the text tab.
    pub fn attached_text(&self) -> Option<String> {
        match self.tab {
            InputTab::Text if !self.chat.buffer().trim().is_empty() => Some(self.chat.buffer().to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    struct StillFrame(Vec<u8>);

    #[async_trait]
    impl FrameSource for StillFrame {
        async fn grab(&self) -> Result<CapturedImage, CaptureError> {
            Ok(CapturedImage::from_frame(self.0.clone()))
        }
    }

    #[tokio::test]
    async fn capture_requires_open_camera_and_closes_it() {
        let mut image = ImageCapture::default();
        let source = StillFrame(vec![1, 2, 3]);
        assert!(matches!(image.capture(&source).await, Err(CaptureError::CameraClosed)));

        image.open_camera();
        assert!(image.is_camera_open());
        let captured = image.capture(&source).await.unwrap().clone();
        assert_eq!(captured.file_name, "captured.png");
        assert!(!image.is_camera_open());
        assert_eq!(image.image(), Some(&captured));

        image.clear();
        assert_eq!(image.image(), None);
    }

    #[test]
    fn cancel_keeps_nothing() {
        let mut image = ImageCapture::default();
        image.open_camera();
        image.cancel_camera();
        assert!(!image.is_camera_open());
        assert!(image.image().is_none());
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for_path(Path::new("page.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("page.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn command_line_parsing() {
        let source = CommandFrameSource::parse("fswebcam --png 0 -").unwrap();
        assert_eq!(source.program, "fswebcam");
        assert_eq!(source.args, vec!["--png", "0", "-"]);
        assert!(CommandFrameSource::parse("   ").is_none());
    }

    #[tokio::test]
    async fn typewriter_reveals_prefixes() {
        let frames: Vec<String> = typewriter("añb".to_string(), Duration::ZERO).collect().await;
        assert_eq!(frames, vec!["a", "añ", "añb"]);
    }
}
