//! Combo protocol - Transport Layer
//!
//! Lowest protocol layer. Frames raw bytes into command + payload +
//! integrity-check packets and rejects anything malformed before it can
//! reach the layers above:
//!
//! - **Commands**: [`TransportCommand`], the closed transport command table
//! - **Packets**: [`TransportPacket`] encoding/decoding
//! - **Integrity**: CRC-16/MCRF4XX over header and payload
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          Session State Machine          │
//! ├─────────────────────────────────────────┤
//! │           Application Layer             │
//! ├─────────────────────────────────────────┤
//! │        Cipher & Nonce Engine            │
//! ├─────────────────────────────────────────┤
//! │           Transport Layer               │  ← This module
//! ├─────────────────────────────────────────┤
//! │            Packet Channel               │
//! └─────────────────────────────────────────┘
//! ```

mod command;
mod crc;
mod error;
mod packet;

pub use command::TransportCommand;
pub use crc::crc16_mcrf4xx;
pub use error::*;
pub use packet::{frame_length, TransportPacket};
