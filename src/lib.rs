//! # Combo Protocol
//!
//! Client side of the link to a Combo insulin pump: a layered,
//! authenticated packet protocol over a reliable radio channel.
//!
//! - **Integrity**: every transport packet carries a CRC-16 and is rejected
//!   whole if anything is malformed
//! - **Authenticity**: application packets travel encrypted with
//!   XChaCha20-Poly1305 under per-direction keys derived from the pairing
//! - **Freshness**: tx nonces strictly increase and are persisted before
//!   use; inbound nonces at or below the last accepted one are replays
//! - **Discipline**: one session per pump, explicit state machine, no
//!   silent retries of sends
//!
//! ## Feature Flags
//!
//! - `session` (default): channels, retry, session state machine and pump
//!   manager (pulls in `tokio` and `tracing`)
//!
//! Without `session` the crate is a pure codec and crypto library.
//!
//! ## Modules
//!
//! - [`core`]: constants, error types, shared types and store contracts
//! - [`transport`]: transport packet codec
//! - [`crypto`]: cipher and nonce engine
//! - [`application`]: application command codec
//! - [`store`]: in-memory pump state store
//! - [`channel`]: packet channels and retry policy (requires `session`)
//! - [`session`]: session state machine and pump manager (requires `session`)
//!
//! ## Example Usage
//!
//! ```rust
//! use combo_protocol::prelude::*;
//!
//! let keys = PairingKeys::derive(&KeyMaterial::new(vec![0x42; 16])?)?;
//! let status = ButtonStatus {
//!     sequence: RtSequence::new(0),
//!     button: Button::Check,
//!     changed: true,
//! };
//!
//! let mut tx_nonce = Nonce::FIRST;
//! let frame = encrypt_and_frame(
//!     &status.to_packet(),
//!     keys.client_to_pump(),
//!     TransportAddress::new(1, 0),
//!     &mut tx_nonce,
//! )?;
//! let bytes = frame.encode();
//!
//! let received = TransportPacket::decode(&bytes)?;
//! let packet = decrypt_and_verify(&received, keys.client_to_pump(), Nonce::ZERO)?;
//! assert_eq!(ButtonStatus::from_packet(&packet)?, status);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Layers usable without a runtime
pub mod application;
pub mod core;
pub mod crypto;
pub mod store;
pub mod transport;

// Channel adapters (feature-gated)
#[cfg(feature = "session")]
#[cfg_attr(docsrs, doc(cfg(feature = "session")))]
pub mod channel;

// Session layer (feature-gated)
#[cfg(feature = "session")]
#[cfg_attr(docsrs, doc(cfg(feature = "session")))]
pub mod session;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::*;

    pub use crate::application::{
        ApplicationCommand, ApplicationError, ApplicationPacket, Button, ButtonConfirmation,
        ButtonStatus, RtSequence, ServiceId,
    };
    pub use crate::crypto::{decrypt_and_verify, encrypt_and_frame, CipherKey, PairingKeys};
    pub use crate::store::MemoryStoreProvider;
    pub use crate::transport::{FramingError, TransportCommand, TransportPacket, TransportResult};

    #[cfg(feature = "session")]
    pub use crate::channel::{MemoryChannel, PacketChannel, RetryPolicy, StreamChannel};

    #[cfg(feature = "session")]
    pub use crate::session::{
        PumpManager, Session, SessionConfig, SessionConfigBuilder, SessionError, SessionResult,
        SessionState,
    };
}

// Re-export commonly used items at crate root
pub use crate::core::{
    ChannelError, CryptoError, Nonce, PumpAddress, PumpPairingData, PumpStateStore,
    PumpStateStoreProvider, StoreError,
};
pub use crate::transport::{FramingError, TransportPacket};

#[cfg(feature = "session")]
pub use crate::session::{PumpManager, Session, SessionConfig, SessionError};
