//! Sealing application packets into DATA frames and opening them again.
//!
//! The engine holds no counters. Callers own the tx nonce and the rx floor
//! and decide when they are persisted; the engine only advances the tx
//! nonce it is handed, and only after the frame has been built.

use crate::application::ApplicationPacket;
use crate::core::{CryptoError, Nonce, TransportAddress};
use crate::transport::{TransportCommand, TransportPacket};

use super::aead::{construct_aad, decrypt, encrypt};
use super::keys::CipherKey;
use super::nonce::construct_nonce;

/// Encrypt an application packet and frame it as a transport DATA packet.
///
/// The frame carries the current value of `tx_nonce`, which is then
/// advanced exactly once. On error `tx_nonce` is left untouched.
pub fn encrypt_and_frame(
    packet: &ApplicationPacket,
    key: &CipherKey,
    address: TransportAddress,
    tx_nonce: &mut Nonce,
) -> Result<TransportPacket, CryptoError> {
    let nonce = *tx_nonce;
    let next = nonce.next()?;

    let aad = construct_aad(TransportCommand::Data, address, nonce);
    let ciphertext = encrypt(key, &construct_nonce(address, nonce), &aad, &packet.encode())?;
    let frame = TransportPacket::new(TransportCommand::Data, address, nonce, ciphertext)?;

    *tx_nonce = next;
    Ok(frame)
}

/// Verify and decrypt a DATA packet into an application packet.
///
/// The nonce must be strictly above `rx_floor`. This is checked before the
/// AEAD so replayed frames are rejected without touching the cipher.
/// Raising the floor on success is the caller's job.
pub fn decrypt_and_verify(
    packet: &TransportPacket,
    key: &CipherKey,
    rx_floor: Nonce,
) -> Result<ApplicationPacket, CryptoError> {
    if packet.command() != TransportCommand::Data {
        return Err(CryptoError::NotData(packet.command()));
    }

    let nonce = packet.nonce();
    if nonce <= rx_floor {
        return Err(CryptoError::ReplayDetected {
            received: nonce,
            floor: rx_floor,
        });
    }

    let address = packet.address();
    let aad = construct_aad(TransportCommand::Data, address, nonce);
    let plaintext = decrypt(key, &construct_nonce(address, nonce), &aad, packet.payload())?;

    Ok(ApplicationPacket::decode(&plaintext)?)
}
