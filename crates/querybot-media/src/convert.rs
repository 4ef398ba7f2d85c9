//! Audio container conversion via ffmpeg.
//!
//! Telegram voice notes are OGG/Opus; whisper.cpp only reads 16 kHz WAV.

use std::path::Path;

use tokio::process::Command;

use crate::error::MediaError;
use crate::tool;

const FFMPEG: &str = "ffmpeg";

/// Transcode `input` into 16 kHz mono 16-bit PCM WAV at `output`.
pub async fn to_wav16k(input: &Path, output: &Path) -> Result<(), MediaError> {
    let mut cmd = Command::new(FFMPEG);
    cmd.args(["-y", "-loglevel", "error", "-i"])
        .arg(input)
        .args(["-ar", "16000", "-ac", "1", "-c:a", "pcm_s16le"])
        .arg(output);
    tool::run(FFMPEG, &mut cmd).await?;
    Ok(())
}
