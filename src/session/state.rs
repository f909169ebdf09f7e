//! Session states.

use std::fmt;

use crate::application::{Button, RtSequence};

/// Where a session stands with its pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No pairing stored for this pump.
    Unpaired,
    /// Paired, no exchange in flight.
    Idle,
    /// A button status was sent and its confirmation is outstanding.
    AwaitingConfirmation {
        /// Button that was sent.
        button: Button,
        /// RT sequence of the status packet.
        sequence: RtSequence,
    },
    /// Paired, but the link can no longer be trusted. Only `connect`,
    /// `disconnect` and `unpair` are accepted.
    Aborted,
}

impl SessionState {
    /// Whether a pairing is held.
    pub fn is_paired(&self) -> bool {
        !matches!(self, SessionState::Unpaired)
    }

    /// Whether an exchange is in flight.
    pub fn is_awaiting_confirmation(&self) -> bool {
        matches!(self, SessionState::AwaitingConfirmation { .. })
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unpaired => write!(f, "unpaired"),
            SessionState::Idle => write!(f, "idle"),
            SessionState::AwaitingConfirmation { button, sequence } => write!(
                f,
                "awaiting confirmation of {button:?} (seq {})",
                sequence.value()
            ),
            SessionState::Aborted => write!(f, "aborted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paired_states() {
        assert!(!SessionState::Unpaired.is_paired());
        assert!(SessionState::Idle.is_paired());
        assert!(SessionState::Aborted.is_paired());

        let awaiting = SessionState::AwaitingConfirmation {
            button: Button::Check,
            sequence: RtSequence::new(4),
        };
        assert!(awaiting.is_paired());
        assert!(awaiting.is_awaiting_confirmation());
        assert_eq!(awaiting.to_string(), "awaiting confirmation of Check (seq 4)");
    }
}
