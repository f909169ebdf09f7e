//! Combo protocol - Core types, errors, constants and storage contracts.
//!
//! This module has no async or I/O dependencies and is shared by every
//! layer above it.

mod constants;
mod error;
mod traits;
mod types;

pub use constants::*;
pub use error::*;
pub use traits::*;
pub use types::*;
