//! In-memory drag payloads

use super::context::{DataSource, DropDataError, DropFormat};
use std::path::PathBuf;

/// A drag payload held in memory.
///
/// Used by backends whose OS delivers the payload up front (GLFW file drops)
/// and by the headless backend to script drag sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedDataSource {
    files: Vec<PathBuf>,
    text: Option<String>,
}

impl OwnedDataSource {
    /// Empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload with a file list
    pub fn with_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Payload with text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

impl DataSource for OwnedDataSource {
    fn formats(&self) -> Vec<DropFormat> {
        let mut formats = Vec::with_capacity(2);
        if !self.files.is_empty() {
            formats.push(DropFormat::Files);
        }
        if self.text.is_some() {
            formats.push(DropFormat::Text);
        }
        formats
    }

    fn read_files(&self) -> Result<Vec<PathBuf>, DropDataError> {
        if self.files.is_empty() {
            return Err(DropDataError::FormatUnavailable(DropFormat::Files));
        }
        Ok(self.files.clone())
    }

    fn read_text(&self) -> Result<String, DropDataError> {
        self.text
            .clone()
            .ok_or(DropDataError::FormatUnavailable(DropFormat::Text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_follow_contents() {
        assert!(OwnedDataSource::new().formats().is_empty());

        let files = OwnedDataSource::new().with_files(["a.txt", "b.png"]);
        assert_eq!(files.formats(), vec![DropFormat::Files]);
        assert_eq!(files.read_files().unwrap().len(), 2);
        assert!(files.read_text().is_err());

        let both = files.with_text("hi");
        assert_eq!(both.formats(), vec![DropFormat::Files, DropFormat::Text]);
    }
}
