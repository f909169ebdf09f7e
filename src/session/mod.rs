//! Combo protocol - Session Layer
//!
//! Drives one pump at a time through pairing, connection and RT mode:
//!
//! - [`Session`]: state machine, nonce persistence, button exchanges
//! - [`PumpManager`]: one live session per pump
//! - [`SessionConfig`] / [`SessionConfigBuilder`]: tunables
//!
//! # State machine
//!
//! ```text
//!                complete_pairing
//!   Unpaired ─────────────────────────► Idle ◄──────────────┐
//!      ▲                                 │ send_button_status│ confirmation
//!      │ unpair (from any paired state)  ▼                   │ or non-fatal error
//!      └──────────────────────── AwaitingConfirmation ───────┘
//!                                        │ timeout / fatal error
//!                                        ▼
//!                                     Aborted ── connect ──► Idle
//! ```

mod config;
mod error;
mod manager;
#[allow(clippy::module_inception)]
mod session;
mod state;

pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{ProtocolError, SessionError, SessionResult};
pub use manager::{PumpLease, PumpManager};
pub use session::Session;
pub use state::SessionState;
