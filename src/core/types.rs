//! Shared protocol types.

use std::fmt;
use std::str::FromStr;

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::constants::MIN_KEY_MATERIAL_SIZE;
use super::error::CryptoError;

/// Radio address of a pump (48-bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PumpAddress([u8; 6]);

impl PumpAddress {
    /// Create an address from raw bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Get the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for PumpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// Error returned when parsing a [`PumpAddress`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid pump address: {0:?}")]
pub struct ParsePumpAddressError(String);

impl FromStr for PumpAddress {
    type Err = ParsePumpAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in &mut bytes {
            let part = parts
                .next()
                .filter(|p| p.len() == 2)
                .ok_or_else(|| ParsePumpAddressError(s.to_owned()))?;
            *byte =
                u8::from_str_radix(part, 16).map_err(|_| ParsePumpAddressError(s.to_owned()))?;
        }
        if parts.next().is_some() {
            return Err(ParsePumpAddressError(s.to_owned()));
        }
        Ok(Self(bytes))
    }
}

impl From<[u8; 6]> for PumpAddress {
    fn from(bytes: [u8; 6]) -> Self {
        Self::new(bytes)
    }
}

/// Transport layer address byte.
///
/// The high nibble is the source, the low nibble the destination. The
/// pairing handshake hands out the address the client uses; the pump
/// replies with the nibbles swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportAddress(u8);

impl TransportAddress {
    /// Create from the raw byte.
    pub const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// Create from source and destination nibbles.
    pub const fn new(source: u8, destination: u8) -> Self {
        Self(((source & 0x0F) << 4) | (destination & 0x0F))
    }

    /// Get the raw byte.
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// Source nibble.
    pub const fn source(self) -> u8 {
        self.0 >> 4
    }

    /// Destination nibble.
    pub const fn destination(self) -> u8 {
        self.0 & 0x0F
    }

    /// The address with source and destination exchanged.
    pub const fn swapped(self) -> Self {
        Self::new(self.destination(), self.source())
    }
}

impl fmt::Display for TransportAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

/// Per-direction nonce counter.
///
/// Transmitted in every transport header. For DATA packets it is bound into
/// the AEAD nonce and the associated data, so it is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Nonce(u64);

impl Nonce {
    /// The initial receive floor; every real nonce is greater.
    pub const ZERO: Self = Self(0);

    /// First transmit nonce of a fresh pairing.
    pub const FIRST: Self = Self(1);

    /// Create from a raw counter value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw counter value.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The following nonce, or an error when the counter space is exhausted.
    pub fn next(self) -> Result<Self, CryptoError> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(CryptoError::NonceExhausted)
    }

    /// Little-endian wire representation.
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    /// Parse from the little-endian wire representation.
    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_le_bytes(bytes))
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque secret produced by the pairing handshake.
///
/// Zeroized on drop. `Debug` never prints the bytes.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial(Vec<u8>);

impl KeyMaterial {
    /// Wrap raw key material.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, CryptoError> {
        let bytes = bytes.into();
        if bytes.len() < MIN_KEY_MATERIAL_SIZE {
            return Err(CryptoError::InvalidKeyMaterial {
                expected: MIN_KEY_MATERIAL_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes))
    }

    /// Length of the material in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the material is empty (never true for a constructed value).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial([{} bytes])", self.0.len())
    }
}

/// Everything a successful pairing handshake leaves behind.
///
/// Immutable for the lifetime of a pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpPairingData {
    /// Identifier the pump reported during pairing.
    pub pump_id: String,
    /// Shared secret the cipher keys are derived from.
    pub key_material: KeyMaterial,
    /// Transport address the client sends with.
    pub key_response_address: TransportAddress,
}

impl PumpPairingData {
    /// Bundle the pairing results.
    pub fn new(
        pump_id: impl Into<String>,
        key_material: KeyMaterial,
        key_response_address: TransportAddress,
    ) -> Self {
        Self {
            pump_id: pump_id.into(),
            key_material,
            key_response_address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pump_address_display_parse() {
        let address = PumpAddress::new([0x00, 0x0E, 0x2F, 0xA1, 0x5B, 0xC4]);
        let text = address.to_string();
        assert_eq!(text, "00:0E:2F:A1:5B:C4");
        assert_eq!(text.parse::<PumpAddress>().unwrap(), address);
    }

    #[test]
    fn test_pump_address_parse_rejects_garbage() {
        assert!("00:0E:2F:A1:5B".parse::<PumpAddress>().is_err());
        assert!("00:0E:2F:A1:5B:C4:11".parse::<PumpAddress>().is_err());
        assert!("00:0E:2F:A1:5B:ZZ".parse::<PumpAddress>().is_err());
        assert!("000E2FA15BC4".parse::<PumpAddress>().is_err());
    }

    #[test]
    fn test_transport_address_nibbles() {
        let address = TransportAddress::new(0x1, 0x0);
        assert_eq!(address.as_byte(), 0x10);
        assert_eq!(address.source(), 0x1);
        assert_eq!(address.destination(), 0x0);
        assert_eq!(address.swapped().as_byte(), 0x01);
        assert_eq!(address.swapped().swapped(), address);
    }

    #[test]
    fn test_nonce_next() {
        assert_eq!(Nonce::ZERO.next().unwrap(), Nonce::FIRST);
        assert_eq!(Nonce::new(41).next().unwrap().value(), 42);
        assert!(matches!(
            Nonce::new(u64::MAX).next(),
            Err(CryptoError::NonceExhausted)
        ));
    }

    #[test]
    fn test_key_material_minimum_length() {
        assert!(KeyMaterial::new(vec![0u8; MIN_KEY_MATERIAL_SIZE]).is_ok());
        assert!(matches!(
            KeyMaterial::new(vec![0u8; 4]),
            Err(CryptoError::InvalidKeyMaterial { actual: 4, .. })
        ));
    }

    #[test]
    fn test_key_material_debug_is_redacted() {
        let material = KeyMaterial::new(vec![0xAB; 16]).unwrap();
        let debug = format!("{material:?}");
        assert!(!debug.contains("ab") && !debug.contains("AB"));
        assert!(debug.contains("16 bytes"));
    }
}
