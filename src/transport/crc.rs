//! CRC-16/MCRF4XX integrity check.
//!
//! Reflected polynomial 0x8408, initial value 0xFFFF, no final XOR.

use crc::{Crc, CRC_16_MCRF4XX};

const MCRF4XX: Crc<u16> = Crc::<u16>::new(&CRC_16_MCRF4XX);

/// Compute the CRC-16/MCRF4XX of `data`.
pub fn crc16_mcrf4xx(data: &[u8]) -> u16 {
    MCRF4XX.checksum(data)
}
