//! Image-to-text extraction.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::MediaError;
use crate::tool;

/// Extracts printed text from an image file.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// `languages` are hints in the extractor's own codes (e.g. `"eng"`).
    async fn extract_text(&self, image: &Path, languages: &[String]) -> Result<String, MediaError>;
}

/// Tesseract OCR run as a subprocess.
#[derive(Debug, Clone)]
pub struct Tesseract {
    binary: String,
}

impl Default for Tesseract {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Tesseract {
    pub fn new(binary: Option<String>) -> Self {
        Self {
            binary: binary.unwrap_or_else(|| "tesseract".to_string()),
        }
    }
}

#[async_trait]
impl TextExtractor for Tesseract {
    async fn extract_text(&self, image: &Path, languages: &[String]) -> Result<String, MediaError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(language_arg(languages));
        let stdout = tool::run("tesseract", &mut cmd).await?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }
}

/// Join language hints the way tesseract expects (`eng+ita+deu`).
fn language_arg(languages: &[String]) -> String {
    if languages.is_empty() {
        return "eng".to_string();
    }
    languages.join("+")
}
