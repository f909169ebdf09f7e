//! Session error types.

use std::time::Duration;

use thiserror::Error;

use super::state::SessionState;
use crate::application::{ApplicationCommand, ApplicationError};
use crate::core::{ChannelError, CryptoError, PumpAddress, StoreError, TransportAddress};
use crate::transport::{FramingError, TransportCommand};

/// The pump answered with something that does not fit the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Wrong transport command.
    #[error("expected transport {expected:?}, got {actual:?}")]
    UnexpectedTransportCommand {
        /// What the exchange needed.
        expected: TransportCommand,
        /// What arrived.
        actual: TransportCommand,
    },

    /// Wrong application command.
    #[error("expected {expected}, got {actual}")]
    UnexpectedApplicationCommand {
        /// What the exchange needed.
        expected: ApplicationCommand,
        /// What arrived.
        actual: ApplicationCommand,
    },

    /// Packet addressed to someone else.
    #[error("expected address {expected}, got {actual}")]
    UnexpectedAddress {
        /// Address the pump replies with.
        expected: TransportAddress,
        /// Address on the packet.
        actual: TransportAddress,
    },
}

/// Errors returned by [`Session`](super::Session) and
/// [`PumpManager`](super::PumpManager).
#[derive(Debug, Error)]
pub enum SessionError {
    /// Malformed transport packet.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Authentication, replay or nonce failure.
    #[error("crypto error: {0}")]
    Crypto(CryptoError),

    /// Authentic but malformed application packet.
    #[error("application error: {0}")]
    Application(ApplicationError),

    /// The pump reported an error.
    #[error("pump reported error {code:#06x}")]
    PumpReported {
        /// Application error report command, `None` for a transport
        /// `ErrorResponse`.
        command: Option<ApplicationCommand>,
        /// Pump error code.
        code: u16,
    },

    /// Unexpected response.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Pump state store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Channel failure.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// No confirmation within the allotted time.
    #[error("no confirmation within {0:?}")]
    Timeout(Duration),

    /// Another session already holds this pump.
    #[error("pump {0} is already acquired")]
    AlreadyAcquired(PumpAddress),

    /// Operation not allowed in the current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// Rejected operation.
        operation: &'static str,
        /// State at the time.
        state: SessionState,
    },

    /// The channel has not been connected.
    #[error("session is not connected")]
    NotConnected,
}

impl From<CryptoError> for SessionError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Application(app) => app.into(),
            CryptoError::Framing(framing) => SessionError::Framing(framing),
            other => SessionError::Crypto(other),
        }
    }
}

impl From<ApplicationError> for SessionError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::PumpReported { command, code } => SessionError::PumpReported {
                command: Some(command),
                code,
            },
            other => SessionError::Application(other),
        }
    }
}

impl SessionError {
    /// Whether the link can no longer be trusted and must be reconnected.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::Crypto(_)
                | SessionError::Channel(_)
                | SessionError::Timeout(_)
                | SessionError::Store(_)
        )
    }

    /// Whether the failed step may be retried as is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Channel(_))
    }

    /// Whether the error is about the caller's usage, not the link.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            SessionError::AlreadyAcquired(_)
                | SessionError::InvalidState { .. }
                | SessionError::NotConnected
        )
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Nonce;

    #[test]
    fn test_crypto_errors_are_fatal() {
        let replay: SessionError = CryptoError::ReplayDetected {
            received: Nonce::new(3),
            floor: Nonce::new(5),
        }
        .into();
        assert!(replay.is_session_fatal());
        assert!(!replay.is_retryable());

        let auth: SessionError = CryptoError::AuthenticationFailed.into();
        assert!(auth.is_session_fatal());
    }

    #[test]
    fn test_pump_report_is_routed() {
        let err: SessionError = CryptoError::Application(ApplicationError::PumpReported {
            command: ApplicationCommand::RtErrorReport,
            code: 0x0102,
        })
        .into();
        assert!(matches!(
            err,
            SessionError::PumpReported {
                command: Some(ApplicationCommand::RtErrorReport),
                code: 0x0102
            }
        ));
        assert!(!err.is_session_fatal());
        assert_eq!(err.to_string(), "pump reported error 0x0102");
    }

    #[test]
    fn test_non_fatal_errors() {
        let protocol: SessionError = ProtocolError::UnexpectedApplicationCommand {
            expected: ApplicationCommand::CtrlConnectResponse,
            actual: ApplicationCommand::RtKeepAlive,
        }
        .into();
        assert!(!protocol.is_session_fatal());

        let framing: SessionError = FramingError::UnsupportedVersion(0x20).into();
        assert!(!framing.is_session_fatal());
    }

    #[test]
    fn test_channel_errors_retryable() {
        let err: SessionError = ChannelError::Closed.into();
        assert!(err.is_session_fatal());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_usage_errors() {
        let err = SessionError::InvalidState {
            operation: "send button status",
            state: SessionState::Unpaired,
        };
        assert!(err.is_usage_error());
        assert!(!err.is_session_fatal());
        assert_eq!(err.to_string(), "cannot send button status while unpaired");
    }
}
