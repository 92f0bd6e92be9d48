//! Add-subject form.

use std::path::{Path, PathBuf};

use crate::error::ValidationError;
use crate::store::SessionStore;

/// Pending input of the "add subject" dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectDraft {
    pub name: String,
    pub document: Option<PathBuf>,
}

impl SubjectDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), document: None }
    }

    pub fn with_document(mut self, path: impl Into<PathBuf>) -> Self {
        self.document = Some(path.into());
        self
    }

    /// Reference stored with the subject for its source PDF.
    pub fn source_reference(path: &Path) -> Result<String, ValidationError> {
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(ValidationError::NotPdf(path.display().to_string()));
        }
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(format!("file://{}", absolute.display()))
    }

    /// Validate and append to the store. The draft is reset on success.
    pub fn submit(&mut self, store: &SessionStore) -> Result<String, ValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptySubjectName);
        }
        let path = self.document.as_deref().ok_or(ValidationError::MissingSourceDocument)?;
        let reference = Self::source_reference(path)?;
        store.add_subject(&name, Some(&reference))?;
        *self = Self::default();
        Ok(name)
    }
}
