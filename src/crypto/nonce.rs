//! Nonce construction for XChaCha20-Poly1305
//!
//! AEAD nonces are 24 bytes:
//! - Transport address (1 byte)
//! - Zeros (15 bytes)
//! - Counter (8 bytes, LE64)
//!
//! Each direction has its own key, so the counter alone would be unique;
//! the address byte keeps nonces apart should two links ever share a key.

use crate::core::{Nonce, TransportAddress, AEAD_NONCE_SIZE};

/// Construct a 24-byte XChaCha20-Poly1305 nonce.
///
/// Layout:
/// ```text
/// [ address (1) | zeros (15) | counter (8) ]
/// ```
pub fn construct_nonce(address: TransportAddress, counter: Nonce) -> [u8; AEAD_NONCE_SIZE] {
    let mut nonce = [0u8; AEAD_NONCE_SIZE];
    nonce[0] = address.as_byte();
    nonce[16..24].copy_from_slice(&counter.to_le_bytes());
    nonce
}

/// Parse a nonce back into its components.
///
/// Useful for debugging and testing.
pub fn parse_nonce(nonce: &[u8; AEAD_NONCE_SIZE]) -> (TransportAddress, Nonce) {
    let mut counter = [0u8; 8];
    counter.copy_from_slice(&nonce[16..24]);
    (
        TransportAddress::from_byte(nonce[0]),
        Nonce::from_le_bytes(counter),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_construction() {
        let nonce = construct_nonce(TransportAddress::new(1, 0), Nonce::new(42));

        assert_eq!(nonce[0], 0x10);
        assert_eq!(&nonce[1..16], &[0u8; 15]);
        assert_eq!(&nonce[16..24], &42u64.to_le_bytes());
    }

    #[test]
    fn test_nonce_roundtrip() {
        let address = TransportAddress::new(0, 1);
        let counter = Nonce::new(0xDEAD_BEEF_CAFE_BABE);

        let (parsed_address, parsed_counter) = parse_nonce(&construct_nonce(address, counter));
        assert_eq!(parsed_address, address);
        assert_eq!(parsed_counter, counter);
    }

    #[test]
    fn test_directions_never_collide() {
        let counter = Nonce::new(7);
        let client = TransportAddress::new(1, 0);
        assert_ne!(
            construct_nonce(client, counter),
            construct_nonce(client.swapped(), counter)
        );
    }
}
