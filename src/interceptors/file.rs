use super::Interceptor;
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Writes one markdown transcript per exchange into `base_path`.
#[derive(Debug)]
pub struct FileInterceptor {
    base_path: PathBuf,
}

impl FileInterceptor {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn file_name(endpoint: &str) -> String {
        let timestamp = Utc::now();
        let slug: String = endpoint
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{}_{}.md", slug.trim_matches('_'), timestamp.format("%Y%m%d_%H%M%S_%6f"))
    }
}

#[async_trait]
impl Interceptor for FileInterceptor {
    async fn save(&self, endpoint: &str, request: &str, response: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        fs::create_dir_all(&self.base_path).await?;
        let file_path = self.base_path.join(Self::file_name(endpoint));

        let content = format!(
            "# POST /{}\n\n## Request\n\n```json\n{}\n```\n\n## Response\n\n```json\n{}\n```\n",
            endpoint.trim_start_matches('/'),
            request,
            response
        );

        let mut file = fs::File::create(&file_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_transcript_file() {
        let dir = std::env::temp_dir().join(format!("quizmaker-transcripts-{}", std::process::id()));
        let interceptor = FileInterceptor::new(dir.clone());
        interceptor
            .save("questions/verify", r#"{"question":"q"}"#, r#"{"correct":true}"#)
            .await
            .unwrap();

        let mut entries = fs::read_dir(&dir).await.unwrap();
        let entry = entries.next_entry().await.unwrap().expect("one transcript");
        let name = entry.file_name().to_string_lossy().to_string();
        assert!(name.starts_with("questions_verify_"));
        let content = fs::read_to_string(entry.path()).await.unwrap();
        assert!(content.contains("# POST /questions/verify"));
        assert!(content.contains(r#"{"correct":true}"#));

        let _ = fs::remove_dir_all(&dir).await;
    }
}
