//! Helper for running external command-line tools.

use tokio::process::Command;
use tracing::debug;

use crate::error::MediaError;

/// Run `cmd` to completion and return its stdout.
///
/// A missing binary maps to `Spawn`, a non-zero exit to `ToolFailed`.
pub(crate) async fn run(tool: &'static str, cmd: &mut Command) -> Result<Vec<u8>, MediaError> {
    debug!(tool, "running external tool");
    let output = cmd
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| MediaError::Spawn { tool, source })?;

    if !output.status.success() {
        return Err(MediaError::ToolFailed {
            tool,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let err = run("nope", &mut Command::new("querybot-definitely-not-installed"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Spawn { tool: "nope", .. }));
    }
}
