//! Transport layer error types.
//!
//! A framing error always rejects the whole packet. Nothing from a frame
//! that failed to decode is ever handed to the layers above.

use thiserror::Error;

/// Errors that can occur while framing or parsing a transport packet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingError {
    /// Packet is too short to hold a header and integrity check.
    #[error("packet too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum expected size.
        expected: usize,
        /// Actual size received.
        actual: usize,
    },

    /// Unknown transport version byte.
    #[error("unsupported transport version: 0x{0:02x}")]
    UnsupportedVersion(u8),

    /// Command id not in the transport command table.
    #[error("unknown transport command: 0x{0:02x}")]
    UnknownCommand(u8),

    /// Reserved flag bits set.
    #[error("invalid flags: 0x{0:02x} (reserved bits must be 0)")]
    ReservedBits(u8),

    /// Declared payload length disagrees with the bytes present.
    #[error("length mismatch: header declares {declared} payload bytes, {actual} present")]
    LengthMismatch {
        /// Payload length from the header.
        declared: usize,
        /// Payload bytes actually present.
        actual: usize,
    },

    /// Integrity check does not match the packet contents.
    #[error("integrity check mismatch: computed 0x{computed:04x}, received 0x{received:04x}")]
    IntegrityMismatch {
        /// CRC computed over the received bytes.
        computed: u16,
        /// CRC carried by the packet.
        received: u16,
    },

    /// Payload exceeds the protocol maximum.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Offending payload size.
        size: usize,
        /// Protocol maximum.
        max: usize,
    },
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, FramingError>;
