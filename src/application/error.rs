//! Application layer error types.

use thiserror::Error;

use super::command::{ApplicationCommand, PayloadShape};

/// Errors from encoding or decoding application packets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplicationError {
    /// Packet shorter than the application header.
    #[error("application packet too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum expected size.
        expected: usize,
        /// Actual size.
        actual: usize,
    },

    /// Unknown application version byte.
    #[error("unsupported application version: 0x{0:02x}")]
    UnsupportedVersion(u8),

    /// Service id not in the service table.
    #[error("unknown service: 0x{0:02x}")]
    UnknownService(u8),

    /// Command id not known for its service.
    #[error("unknown command 0x{id:04x} for service 0x{service:02x}")]
    UnknownCommand {
        /// Service byte.
        service: u8,
        /// Command id.
        id: u16,
    },

    /// Payload does not have the shape the command requires.
    #[error("{command} expects {expected}, got {actual} bytes")]
    PayloadShape {
        /// Command whose payload was wrong.
        command: ApplicationCommand,
        /// Required shape.
        expected: PayloadShape,
        /// Payload length received.
        actual: usize,
    },

    /// The pump sent an error report.
    #[error("pump reported error 0x{code:04x} via {command}")]
    PumpReported {
        /// Error report command.
        command: ApplicationCommand,
        /// Pump error code.
        code: u16,
    },

    /// A typed payload helper was given the wrong command.
    #[error("expected {expected}, got {actual}")]
    UnexpectedCommand {
        /// Command the helper parses.
        expected: ApplicationCommand,
        /// Command it was given.
        actual: ApplicationCommand,
    },

    /// Unknown RT button code.
    #[error("unknown button code: 0x{0:02x}")]
    UnknownButton(u8),
}
