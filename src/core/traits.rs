//! Storage contracts the protocol core depends on.
//!
//! The core never persists anything itself. A platform supplies a
//! [`PumpStateStoreProvider`] that hands out one [`PumpStateStore`] per pump.

use super::error::StoreError;
use super::types::{Nonce, PumpAddress, PumpPairingData};

/// Durable state for exactly one pump.
///
/// # Requirements
///
/// - `retrieve_pairing_data` MUST fail with [`StoreError::Invalid`] while the
///   store is not valid
/// - `store_pairing_data` MUST mark the store valid
/// - `reset` MUST clear every field and mark the store invalid
/// - `set_current_tx_nonce` MUST be durable when it returns `Ok`, because
///   the session transmits the nonce right afterwards
pub trait PumpStateStore: Send {
    /// Load the pairing data.
    fn retrieve_pairing_data(&self) -> Result<PumpPairingData, StoreError>;

    /// Save the pairing data, its pump ID, and mark the store valid.
    fn store_pairing_data(&mut self, data: &PumpPairingData) -> Result<(), StoreError>;

    /// Whether a pairing is stored.
    fn is_valid(&self) -> bool;

    /// Forget everything about this pump.
    fn reset(&mut self) -> Result<(), StoreError>;

    /// Stored pump identifier.
    fn pump_id(&self) -> Result<String, StoreError>;

    /// Overwrite the stored pump identifier.
    fn set_pump_id(&mut self, pump_id: &str) -> Result<(), StoreError>;

    /// Next nonce to use for an outgoing packet.
    fn current_tx_nonce(&self) -> Result<Nonce, StoreError>;

    /// Persist the next nonce to use for an outgoing packet.
    fn set_current_tx_nonce(&mut self, nonce: Nonce) -> Result<(), StoreError>;
}

/// Source of per-pump stores.
///
/// Access to stores of *different* addresses MUST NOT interfere.
pub trait PumpStateStoreProvider: Send + Sync {
    /// Store for the given pump address (valid or not).
    fn store_for(&self, address: PumpAddress) -> Box<dyn PumpStateStore>;

    /// Addresses whose store currently holds a valid pairing.
    fn paired_addresses(&self) -> Vec<PumpAddress>;
}
