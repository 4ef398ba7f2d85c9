//! Turns backend result groups into the reply text and the pending images.

use tracing::debug;

use querybot_backend::ResultGroup;
use querybot_core::types::ImageRef;

/// What a successful query produces for the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Answer {
    /// Plaintext of every kept subresult, newline-joined. Empty when the
    /// backend returned nothing textual.
    pub text: String,
    /// Images of every kept subresult, in group order.
    pub images: Vec<ImageRef>,
}

/// Select the answer from ordered result groups.
///
/// The first group is dropped when it only echoes the interpreted input;
/// every remaining group contributes its text and images in order.
pub fn select(groups: Vec<ResultGroup>) -> Answer {
    let skip = match groups.first() {
        Some(first) if first.is_input_echo() => {
            debug!(title = %first.title, "skipping input interpretation group");
            1
        }
        _ => 0,
    };

    let mut lines = Vec::new();
    let mut images = Vec::new();
    for sub in groups.into_iter().skip(skip).flat_map(|g| g.subresults) {
        if let Some(text) = sub.plaintext {
            lines.push(text);
        }
        images.extend(sub.images);
    }

    Answer {
        text: lines.join("\n"),
        images,
    }
}
