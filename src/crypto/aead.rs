//! Sealing and opening DATA payloads.
//!
//! Payloads are sealed with XChaCha20-Poly1305. The associated data covers
//! the header fields that name the packet: transport version, command id,
//! address and the 64-bit nonce counter. The sequence bit is a transport
//! duplicate detector and the payload length follows from the ciphertext,
//! so neither is bound.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};

use crate::core::{CryptoError, Nonce, TransportAddress, AEAD_NONCE_SIZE, AEAD_TAG_SIZE, TRANSPORT_VERSION};
use crate::transport::TransportCommand;

use super::keys::CipherKey;

/// Length of the associated data built by [`construct_aad`].
pub const AAD_SIZE: usize = 11;

/// Associated data for a DATA packet.
///
/// ```text
/// [ version | command id | address | nonce counter (LE64) ]
/// ```
pub fn construct_aad(
    command: TransportCommand,
    address: TransportAddress,
    nonce: Nonce,
) -> [u8; AAD_SIZE] {
    let mut aad = [0u8; AAD_SIZE];
    aad[0] = TRANSPORT_VERSION;
    aad[1] = command.id();
    aad[2] = address.as_byte();
    aad[3..].copy_from_slice(&nonce.to_le_bytes());
    aad
}

fn cipher(key: &CipherKey) -> XChaCha20Poly1305 {
    XChaCha20Poly1305::new(key.as_bytes().into())
}

/// Seal `plaintext`; the Poly1305 tag is appended to the result.
pub fn encrypt(
    key: &CipherKey,
    nonce: &[u8; AEAD_NONCE_SIZE],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let payload = Payload { msg: plaintext, aad };
    cipher(key)
        .encrypt(&XNonce::from(*nonce), payload)
        .map_err(|_| CryptoError::EncryptionFailed)
}

/// Open a sealed payload.
///
/// Anything that does not verify, including input shorter than the tag,
/// is [`CryptoError::AuthenticationFailed`].
pub fn decrypt(
    key: &CipherKey,
    nonce: &[u8; AEAD_NONCE_SIZE],
    aad: &[u8],
    sealed: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < AEAD_TAG_SIZE {
        return Err(CryptoError::AuthenticationFailed);
    }
    let payload = Payload { msg: sealed, aad };
    cipher(key)
        .decrypt(&XNonce::from(*nonce), payload)
        .map_err(|_| CryptoError::AuthenticationFailed)
}
