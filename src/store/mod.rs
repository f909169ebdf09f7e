//! Pump state store implementations.
//!
//! Platforms normally provide their own [`PumpStateStoreProvider`] backed
//! by durable storage. [`MemoryStoreProvider`] keeps everything in process
//! and is what the tests and in-process tools use.
//!
//! [`PumpStateStoreProvider`]: crate::core::PumpStateStoreProvider

mod memory;

pub use memory::{MemoryStateStore, MemoryStoreProvider};
