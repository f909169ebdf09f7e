//! Protocol constants for the Combo link.
//!
//! These values are fixed by the protocol and MUST NOT be changed.

use std::time::Duration;

// =============================================================================
// TRANSPORT LAYER
// =============================================================================

/// Transport layer protocol version (major 1, minor 0).
pub const TRANSPORT_VERSION: u8 = 0x10;

/// Transport header size (version + flags + length + address + nonce).
pub const TRANSPORT_HEADER_SIZE: usize = 1 + 1 + 2 + 1 + NONCE_SIZE;

/// Transport integrity check size (CRC-16).
pub const INTEGRITY_CHECK_SIZE: usize = 2;

/// Smallest possible transport packet (header + empty payload + check).
pub const MIN_TRANSPORT_PACKET_SIZE: usize = TRANSPORT_HEADER_SIZE + INTEGRITY_CHECK_SIZE;

/// Largest payload a transport packet may carry.
pub const MAX_TRANSPORT_PAYLOAD: usize = 1024;

/// Largest possible transport packet.
pub const MAX_TRANSPORT_PACKET_SIZE: usize = MIN_TRANSPORT_PACKET_SIZE + MAX_TRANSPORT_PAYLOAD;

/// Sequence bit in the flags byte.
pub const SEQUENCE_BIT_MASK: u8 = 0x80;

/// Reserved bits in the flags byte (must be zero).
pub const RESERVED_FLAGS_MASK: u8 = 0x60;

/// Command id bits in the flags byte.
pub const COMMAND_ID_MASK: u8 = 0x1F;

// =============================================================================
// APPLICATION LAYER
// =============================================================================

/// Application layer protocol version (major 1, minor 0).
pub const APPLICATION_VERSION: u8 = 0x10;

/// Application header size (version + service + command id).
pub const APPLICATION_HEADER_SIZE: usize = 1 + 1 + 2;

/// Marker byte for "button status changed" in RT button status payloads.
pub const RT_BUTTON_STATUS_CHANGED: u8 = 0xB7;

/// Marker byte for "button status unchanged" in RT button status payloads.
pub const RT_BUTTON_STATUS_UNCHANGED: u8 = 0x48;

/// RT mode service version requested on activation (major, minor).
pub const RT_MODE_SERVICE_VERSION: (u8, u8) = (1, 0);

// =============================================================================
// CRYPTOGRAPHIC CONSTANTS
// =============================================================================

/// Poly1305 authentication tag size.
pub const AEAD_TAG_SIZE: usize = 16;

/// XChaCha20 nonce size.
pub const AEAD_NONCE_SIZE: usize = 24;

/// Size of a derived cipher key.
pub const CIPHER_KEY_SIZE: usize = 32;

/// Size of the nonce counter carried in every transport header.
pub const NONCE_SIZE: usize = 8;

/// Minimum amount of pairing key material accepted for key derivation.
pub const MIN_KEY_MATERIAL_SIZE: usize = 16;

/// HKDF salt for pairing key derivation.
pub const KEY_DERIVATION_SALT: &[u8] = b"combo-protocol pairing v1";

/// HKDF info label for the client -> pump direction.
pub const KEY_INFO_CLIENT_TO_PUMP: &[u8] = b"client->pump";

/// HKDF info label for the pump -> client direction.
pub const KEY_INFO_PUMP_TO_CLIENT: &[u8] = b"pump->client";

// =============================================================================
// SESSION DEFAULTS
// =============================================================================

/// Default number of attempts when opening the channel.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 3;

/// Default delay between channel open attempts.
pub const DEFAULT_CONNECT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Default time to wait for an RT button confirmation.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Default client serial sent with `CtrlConnect`.
pub const DEFAULT_CLIENT_SERIAL: u32 = 0x0001_0203;
