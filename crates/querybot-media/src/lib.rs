//! Media collaborators: speech-to-text, OCR, audio conversion and the
//! result-image bundler.

pub mod bundle;
pub mod convert;
pub mod error;
pub mod ocr;
pub mod transcribe;

mod tool;

pub use bundle::ArtifactBundler;
pub use error::{BundleError, MediaError};
pub use ocr::{Tesseract, TextExtractor};
pub use transcribe::{Transcriber, Transcription};
