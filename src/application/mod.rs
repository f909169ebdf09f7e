//! Combo protocol - Application Layer
//!
//! Pump-domain commands carried inside encrypted transport DATA packets.
//! Pure format mapping: no I/O and no state.
//!
//! - [`ApplicationCommand`] / [`ServiceId`]: the closed command table
//! - [`ApplicationPacket`]: shape-checked encode/decode
//! - [`rt`]: RT mode button status, confirmation and display payloads
//! - [`control`]: control service payloads

pub mod control;
pub mod rt;

mod command;
mod error;
mod packet;

pub use command::{ApplicationCommand, PayloadShape, ServiceId};
pub use error::ApplicationError;
pub use packet::ApplicationPacket;
pub use rt::{Button, ButtonConfirmation, ButtonStatus, DisplayUpdate, RtSequence};
