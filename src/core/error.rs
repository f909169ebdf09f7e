//! Error types shared across the Combo protocol layers.

use std::io;

use thiserror::Error;

use super::types::Nonce;
use crate::application::ApplicationError;
use crate::transport::{FramingError, TransportCommand};

/// Errors in the cipher and nonce engine.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Only DATA packets carry ciphertext.
    #[error("expected a DATA packet, got {0:?}")]
    NotData(TransportCommand),

    /// AEAD encryption failed.
    #[error("AEAD encryption failed")]
    EncryptionFailed,

    /// AEAD tag did not verify (wrong key, tampered ciphertext or header).
    #[error("authentication failed (invalid tag or corrupted)")]
    AuthenticationFailed,

    /// Nonce not strictly greater than the last accepted one.
    #[error("replay detected: nonce {received} is not above floor {floor}")]
    ReplayDetected {
        /// Nonce carried by the packet.
        received: Nonce,
        /// Last accepted nonce.
        floor: Nonce,
    },

    /// Nonce counter exhausted - the pairing must be renewed.
    #[error("nonce counter exhausted - pairing must be renewed")]
    NonceExhausted,

    /// Pairing key material is unusable.
    #[error("invalid key material: expected at least {expected} bytes, got {actual}")]
    InvalidKeyMaterial {
        /// Minimum accepted size.
        expected: usize,
        /// Size supplied.
        actual: usize,
    },

    /// Key derivation failed.
    #[error("key derivation failed")]
    KeyDerivationFailed,

    /// The ciphertext does not fit in a transport packet.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// The authenticated plaintext is not a valid application packet.
    #[error("application error: {0}")]
    Application(#[from] ApplicationError),
}

impl CryptoError {
    /// Whether this error means the peer or the link cannot be trusted any more.
    pub fn is_security_error(&self) -> bool {
        matches!(
            self,
            CryptoError::AuthenticationFailed
                | CryptoError::ReplayDetected { .. }
                | CryptoError::NonceExhausted
        )
    }
}

/// Errors reported by a persistent pump state store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store holds no valid pairing.
    #[error("pump state store is not valid")]
    Invalid,

    /// The backing storage failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors from the packet channel.
///
/// These are the only errors the connect retry loop retries.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel is closed (locally or by the peer).
    #[error("channel closed")]
    Closed,

    /// The link could not be established.
    #[error("channel open failed: {0}")]
    OpenFailed(String),

    /// A received frame exceeds what the channel accepts.
    #[error("oversized frame: {0} bytes")]
    OversizedFrame(usize),

    /// A byte stream no longer lines up with packet boundaries.
    #[error("stream desynchronized: {0}")]
    Desynchronized(FramingError),

    /// I/O error on the underlying link.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
