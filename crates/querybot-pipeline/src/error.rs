use thiserror::Error;

use querybot_channels::TransportError;
use querybot_media::{BundleError, MediaError};

use crate::replies;

/// Why handling an event ended without its normal reply.
///
/// Every variant maps to exactly one user-facing message; none of them
/// propagate past [`handle_event`](crate::dispatch::handle_event).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unsupported message kind: {kind}")]
    Unsupported { kind: String },

    #[error("audio could not be transcribed")]
    Unrecognized,

    #[error("backend produced no usable result")]
    NoResult,

    #[error("no pending result for this conversation")]
    NoPendingResult,

    #[error("image bundle failed: {0}")]
    Fetch(#[from] BundleError),

    #[error("media processing failed: {0}")]
    Media(#[from] MediaError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("event handler panicked")]
    Panicked,
}

impl DispatchError {
    /// The reply sent to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            DispatchError::Unsupported { .. } => replies::UNSUPPORTED,
            DispatchError::Unrecognized => replies::AUDIO_UNRECOGNIZED,
            DispatchError::NoResult => replies::NO_RESULT,
            DispatchError::NoPendingResult => replies::NO_PREVIOUS,
            DispatchError::Media(MediaError::NotConfigured(_)) => replies::VOICE_DISABLED,
            DispatchError::Fetch(_)
            | DispatchError::Media(_)
            | DispatchError::Transport(_)
            | DispatchError::Io(_)
            | DispatchError::Panicked => replies::GENERIC_FAILURE,
        }
    }

    /// Expected outcomes of normal use, as opposed to faults worth a warning.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            DispatchError::Unsupported { .. }
                | DispatchError::Unrecognized
                | DispatchError::NoResult
                | DispatchError::NoPendingResult
                | DispatchError::Media(MediaError::NotConfigured(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_outcomes_have_specific_replies() {
        assert_eq!(DispatchError::NoResult.user_message(), replies::NO_RESULT);
        assert_eq!(DispatchError::NoPendingResult.user_message(), replies::NO_PREVIOUS);
        assert_eq!(
            DispatchError::Unrecognized.user_message(),
            replies::AUDIO_UNRECOGNIZED
        );
        assert!(DispatchError::NoResult.is_expected());
    }

    #[test]
    fn disabled_voice_is_not_a_generic_failure() {
        let err = DispatchError::from(MediaError::NotConfigured("off".into()));
        assert_eq!(err.user_message(), replies::VOICE_DISABLED);
        assert!(err.is_expected());
    }

    #[test]
    fn faults_get_generic_reply() {
        let err = DispatchError::from(TransportError::SendFailed("net".into()));
        assert_eq!(err.user_message(), replies::GENERIC_FAILURE);
        assert!(!err.is_expected());
        assert_eq!(DispatchError::Panicked.user_message(), replies::GENERIC_FAILURE);
    }
}
