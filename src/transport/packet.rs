//! Transport packet encoding and decoding.
//!
//! Wire format (little-endian):
//! ```text
//! +---------+--------+----------+---------+-------------+-----------+---------+
//! | Version | Flags  | Length N | Address | Nonce       | Payload   | CRC-16  |
//! | 1 byte  | 1 byte | 2 bytes  | 1 byte  | 8 bytes     | N bytes   | 2 bytes |
//! +---------+--------+----------+---------+-------------+-----------+---------+
//! ```
//! Flags: bit 7 is the sequence bit, bits 5..6 are reserved, bits 0..4 hold
//! the [`TransportCommand`] id. The CRC covers everything before it.

use crate::core::{
    Nonce, TransportAddress, COMMAND_ID_MASK, INTEGRITY_CHECK_SIZE, MAX_TRANSPORT_PAYLOAD,
    MIN_TRANSPORT_PACKET_SIZE, RESERVED_FLAGS_MASK, SEQUENCE_BIT_MASK, TRANSPORT_HEADER_SIZE,
    TRANSPORT_VERSION,
};

use super::command::TransportCommand;
use super::crc::crc16_mcrf4xx;
use super::error::{FramingError, TransportResult};

/// A transport layer packet.
///
/// The integrity check is not stored; it is recomputed from the other
/// fields on encode and verified on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportPacket {
    command: TransportCommand,
    sequence_bit: bool,
    address: TransportAddress,
    nonce: Nonce,
    payload: Vec<u8>,
}

impl TransportPacket {
    /// Create a packet with the sequence bit cleared.
    pub fn new(
        command: TransportCommand,
        address: TransportAddress,
        nonce: Nonce,
        payload: Vec<u8>,
    ) -> TransportResult<Self> {
        if payload.len() > MAX_TRANSPORT_PAYLOAD {
            return Err(FramingError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_TRANSPORT_PAYLOAD,
            });
        }
        Ok(Self {
            command,
            sequence_bit: false,
            address,
            nonce,
            payload,
        })
    }

    /// Create a packet without payload (control commands).
    pub fn control(command: TransportCommand, address: TransportAddress) -> Self {
        Self {
            command,
            sequence_bit: false,
            address,
            nonce: Nonce::ZERO,
            payload: Vec::new(),
        }
    }

    /// Return the packet with the given sequence bit.
    pub fn with_sequence_bit(mut self, sequence_bit: bool) -> Self {
        self.sequence_bit = sequence_bit;
        self
    }

    /// Transport command.
    pub fn command(&self) -> TransportCommand {
        self.command
    }

    /// Sequence bit.
    pub fn sequence_bit(&self) -> bool {
        self.sequence_bit
    }

    /// Transport address byte.
    pub fn address(&self) -> TransportAddress {
        self.address
    }

    /// Nonce carried in the header.
    pub fn nonce(&self) -> Nonce {
        self.nonce
    }

    /// Payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the packet, returning the payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Flags byte (sequence bit and command id).
    pub fn flags(&self) -> u8 {
        let sequence = if self.sequence_bit { SEQUENCE_BIT_MASK } else { 0 };
        sequence | self.command.id()
    }

    /// Serialize the header (13 bytes).
    pub fn header_bytes(&self) -> [u8; TRANSPORT_HEADER_SIZE] {
        let mut buf = [0u8; TRANSPORT_HEADER_SIZE];
        buf[0] = TRANSPORT_VERSION;
        buf[1] = self.flags();
        // Length is bounded by MAX_TRANSPORT_PAYLOAD at construction.
        buf[2..4].copy_from_slice(&(self.payload.len() as u16).to_le_bytes());
        buf[4] = self.address.as_byte();
        buf[5..13].copy_from_slice(&self.nonce.to_le_bytes());
        buf
    }

    /// The integrity check this packet encodes with.
    pub fn integrity_check(&self) -> u16 {
        let mut covered = Vec::with_capacity(TRANSPORT_HEADER_SIZE + self.payload.len());
        covered.extend_from_slice(&self.header_bytes());
        covered.extend_from_slice(&self.payload);
        crc16_mcrf4xx(&covered)
    }

    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        TRANSPORT_HEADER_SIZE + self.payload.len() + INTEGRITY_CHECK_SIZE
    }

    /// Encode the packet for the channel.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&self.header_bytes());
        buf.extend_from_slice(&self.payload);
        let crc = crc16_mcrf4xx(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Decode and validate a complete packet.
    pub fn decode(bytes: &[u8]) -> TransportResult<Self> {
        let total = frame_length(bytes)?;
        let payload_len = total - MIN_TRANSPORT_PACKET_SIZE;
        if bytes.len() != total {
            return Err(FramingError::LengthMismatch {
                declared: payload_len,
                actual: bytes.len().saturating_sub(MIN_TRANSPORT_PACKET_SIZE),
            });
        }

        let crc_offset = TRANSPORT_HEADER_SIZE + payload_len;
        let received = u16::from_le_bytes([bytes[crc_offset], bytes[crc_offset + 1]]);
        let computed = crc16_mcrf4xx(&bytes[..crc_offset]);
        if received != computed {
            return Err(FramingError::IntegrityMismatch { computed, received });
        }

        let flags = bytes[1];
        let command = TransportCommand::from_id(flags & COMMAND_ID_MASK)
            .ok_or(FramingError::UnknownCommand(flags & COMMAND_ID_MASK))?;

        let mut nonce = [0u8; 8];
        nonce.copy_from_slice(&bytes[5..13]);

        Ok(Self {
            command,
            sequence_bit: flags & SEQUENCE_BIT_MASK != 0,
            address: TransportAddress::from_byte(bytes[4]),
            nonce: Nonce::from_le_bytes(nonce),
            payload: bytes[TRANSPORT_HEADER_SIZE..crc_offset].to_vec(),
        })
    }
}

/// Total frame size announced by a header.
///
/// Needs only the first [`TRANSPORT_HEADER_SIZE`] bytes, so stream based
/// channels can use it to find packet boundaries.
pub fn frame_length(header: &[u8]) -> TransportResult<usize> {
    if header.len() < TRANSPORT_HEADER_SIZE {
        return Err(FramingError::TooShort {
            expected: MIN_TRANSPORT_PACKET_SIZE,
            actual: header.len(),
        });
    }
    if header[0] != TRANSPORT_VERSION {
        return Err(FramingError::UnsupportedVersion(header[0]));
    }
    if header[1] & RESERVED_FLAGS_MASK != 0 {
        return Err(FramingError::ReservedBits(header[1]));
    }
    let payload_len = usize::from(u16::from_le_bytes([header[2], header[3]]));
    if payload_len > MAX_TRANSPORT_PAYLOAD {
        return Err(FramingError::PayloadTooLarge {
            size: payload_len,
            max: MAX_TRANSPORT_PAYLOAD,
        });
    }
    Ok(MIN_TRANSPORT_PACKET_SIZE + payload_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(command: TransportCommand, payload: Vec<u8>) -> TransportPacket {
        TransportPacket::new(
            command,
            TransportAddress::new(1, 0),
            Nonce::new(0x0102_0304_0506_0708),
            payload,
        )
        .unwrap()
    }

    #[test]
    fn test_encode_layout() {
        let packet = sample(TransportCommand::Data, vec![0xAA, 0xBB]).with_sequence_bit(true);
        let bytes = packet.encode();

        assert_eq!(bytes.len(), TRANSPORT_HEADER_SIZE + 2 + INTEGRITY_CHECK_SIZE);
        // version | seq+Data | len=2 | addr 0x10 | nonce LE | payload
        assert_eq!(hex::encode(&bytes[..15]), "10830200100807060504030201aabb");
        assert_eq!(&bytes[15..], &crc16_mcrf4xx(&bytes[..15]).to_le_bytes());
        assert_eq!(packet.integrity_check(), crc16_mcrf4xx(&bytes[..15]));
    }

    #[test]
    fn test_roundtrip_every_command() {
        for (i, command) in TransportCommand::ALL.into_iter().enumerate() {
            for sequence_bit in [false, true] {
                let packet = sample(command, vec![i as u8; i * 7]).with_sequence_bit(sequence_bit);
                let decoded = TransportPacket::decode(&packet.encode()).unwrap();
                assert_eq!(decoded, packet);
            }
        }
    }

    #[test]
    fn test_roundtrip_max_payload() {
        let packet = sample(TransportCommand::Data, vec![0x5A; MAX_TRANSPORT_PAYLOAD]);
        assert_eq!(TransportPacket::decode(&packet.encode()).unwrap(), packet);
    }

    #[test]
    fn test_payload_too_large_rejected() {
        let result = TransportPacket::new(
            TransportCommand::Data,
            TransportAddress::new(1, 0),
            Nonce::FIRST,
            vec![0; MAX_TRANSPORT_PAYLOAD + 1],
        );
        assert!(matches!(result, Err(FramingError::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_decode_too_short() {
        for len in 0..MIN_TRANSPORT_PACKET_SIZE {
            let bytes = vec![TRANSPORT_VERSION; len];
            assert!(TransportPacket::decode(&bytes).is_err(), "len {len}");
        }
        assert!(matches!(
            TransportPacket::decode(&[TRANSPORT_VERSION; 4]),
            Err(FramingError::TooShort { actual: 4, .. })
        ));
    }

    #[test]
    fn test_decode_truncated_and_trailing_bytes() {
        let bytes = sample(TransportCommand::Data, vec![1, 2, 3, 4]).encode();

        assert!(matches!(
            TransportPacket::decode(&bytes[..bytes.len() - 1]),
            Err(FramingError::LengthMismatch { declared: 4, actual: 3 })
        ));

        let mut longer = bytes.clone();
        longer.push(0);
        assert!(matches!(
            TransportPacket::decode(&longer),
            Err(FramingError::LengthMismatch { declared: 4, actual: 5 })
        ));
    }

    #[test]
    fn test_decode_bad_version() {
        let mut bytes = sample(TransportCommand::KeepAlive, vec![]).encode();
        bytes[0] = 0x20;
        assert_eq!(
            TransportPacket::decode(&bytes),
            Err(FramingError::UnsupportedVersion(0x20))
        );
    }

    #[test]
    fn test_decode_reserved_bits() {
        let mut bytes = sample(TransportCommand::KeepAlive, vec![]).encode();
        bytes[1] |= 0x40;
        assert!(matches!(
            TransportPacket::decode(&bytes),
            Err(FramingError::ReservedBits(_))
        ));
    }

    #[test]
    fn test_decode_unknown_command_with_valid_crc() {
        let mut bytes = sample(TransportCommand::KeepAlive, vec![]).encode();
        bytes[1] = 0x1F;
        let crc = crc16_mcrf4xx(&bytes[..TRANSPORT_HEADER_SIZE]);
        bytes[TRANSPORT_HEADER_SIZE..].copy_from_slice(&crc.to_le_bytes());
        assert_eq!(
            TransportPacket::decode(&bytes),
            Err(FramingError::UnknownCommand(0x1F))
        );
    }

    #[test]
    fn test_any_flipped_bit_is_rejected() {
        let bytes = sample(TransportCommand::Data, vec![9, 8, 7, 6, 5]).encode();
        for bit in 0..bytes.len() * 8 {
            let mut tampered = bytes.clone();
            tampered[bit / 8] ^= 1 << (bit % 8);
            assert!(
                TransportPacket::decode(&tampered).is_err(),
                "flipping bit {bit} was accepted"
            );
        }
    }

    #[test]
    fn test_frame_length_from_header() {
        let bytes = sample(TransportCommand::Data, vec![0; 40]).encode();
        assert_eq!(
            frame_length(&bytes[..TRANSPORT_HEADER_SIZE]).unwrap(),
            bytes.len()
        );
    }
}
