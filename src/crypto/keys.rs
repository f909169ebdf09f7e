//! Cipher key handling.
//!
//! The pairing handshake leaves behind opaque [`KeyMaterial`]. Two
//! independent per-direction keys are derived from it with HKDF-SHA256, so
//! the client and the pump never encrypt under the same key.

use std::fmt;

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::core::{
    CryptoError, KeyMaterial, CIPHER_KEY_SIZE, KEY_DERIVATION_SALT, KEY_INFO_CLIENT_TO_PUMP,
    KEY_INFO_PUMP_TO_CLIENT,
};

/// A key for AEAD operations.
///
/// Zeroized on drop. The bytes never leave the crate; callers only pass
/// the handle around.
#[derive(Clone)]
pub struct CipherKey {
    key: [u8; CIPHER_KEY_SIZE],
}

impl CipherKey {
    pub(crate) fn from_bytes(key: [u8; CIPHER_KEY_SIZE]) -> Self {
        Self { key }
    }

    pub(crate) fn as_bytes(&self) -> &[u8; CIPHER_KEY_SIZE] {
        &self.key
    }
}

impl Drop for CipherKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CipherKey([REDACTED])")
    }
}

/// The two directional keys of a pairing.
#[derive(Clone, Debug)]
pub struct PairingKeys {
    client_to_pump: CipherKey,
    pump_to_client: CipherKey,
}

impl PairingKeys {
    /// Derive both directional keys from pairing key material.
    pub fn derive(material: &KeyMaterial) -> Result<Self, CryptoError> {
        let hk = Hkdf::<Sha256>::new(Some(KEY_DERIVATION_SALT), material.expose());
        Ok(Self {
            client_to_pump: expand(&hk, KEY_INFO_CLIENT_TO_PUMP)?,
            pump_to_client: expand(&hk, KEY_INFO_PUMP_TO_CLIENT)?,
        })
    }

    /// Key for packets the client sends.
    pub fn client_to_pump(&self) -> &CipherKey {
        &self.client_to_pump
    }

    /// Key for packets the pump sends.
    pub fn pump_to_client(&self) -> &CipherKey {
        &self.pump_to_client
    }
}

fn expand(hk: &Hkdf<Sha256>, info: &[u8]) -> Result<CipherKey, CryptoError> {
    let mut okm = [0u8; CIPHER_KEY_SIZE];
    hk.expand(info, &mut okm)
        .map_err(|_| CryptoError::KeyDerivationFailed)?;
    let key = CipherKey::from_bytes(okm);
    okm.zeroize();
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(byte: u8) -> KeyMaterial {
        KeyMaterial::new(vec![byte; 16]).unwrap()
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = PairingKeys::derive(&material(0x11)).unwrap();
        let b = PairingKeys::derive(&material(0x11)).unwrap();
        assert_eq!(a.client_to_pump().as_bytes(), b.client_to_pump().as_bytes());
        assert_eq!(a.pump_to_client().as_bytes(), b.pump_to_client().as_bytes());
    }

    #[test]
    fn test_directions_differ() {
        let keys = PairingKeys::derive(&material(0x11)).unwrap();
        assert_ne!(
            keys.client_to_pump().as_bytes(),
            keys.pump_to_client().as_bytes()
        );
    }

    #[test]
    fn test_different_material_different_keys() {
        let a = PairingKeys::derive(&material(0x11)).unwrap();
        let b = PairingKeys::derive(&material(0x12)).unwrap();
        assert_ne!(a.client_to_pump().as_bytes(), b.client_to_pump().as_bytes());
    }

    #[test]
    fn test_debug_is_redacted() {
        let keys = PairingKeys::derive(&material(0x11)).unwrap();
        let debug = format!("{keys:?}");
        assert!(debug.contains("REDACTED"));
    }
}
