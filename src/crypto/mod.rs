//! Combo protocol - Cipher & Nonce Engine
//!
//! Authenticated encryption of application packets inside transport DATA
//! packets:
//! - XChaCha20-Poly1305 AEAD
//! - Nonce construction (address | zeros | counter)
//! - Per-direction keys derived from pairing key material
//! - Replay rejection against a strictly increasing rx floor

mod aead;
mod engine;
mod keys;
mod nonce;

pub use aead::{construct_aad, decrypt, encrypt, AAD_SIZE};
pub use engine::{decrypt_and_verify, encrypt_and_frame};
pub use keys::{CipherKey, PairingKeys};
pub use nonce::{construct_nonce, parse_nonce};
