//! In-memory pump state store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::{
    Nonce, PumpAddress, PumpPairingData, PumpStateStore, PumpStateStoreProvider, StoreError,
};

#[derive(Debug, Default, Clone)]
struct Entry {
    pairing: Option<PumpPairingData>,
    pump_id: String,
    tx_nonce: Nonce,
}

#[derive(Debug, Default)]
struct Shared {
    entries: Mutex<HashMap<PumpAddress, Entry>>,
    fail_writes: AtomicBool,
}

impl Shared {
    // A panic while holding the lock cannot leave an entry half-written,
    // so a poisoned map is still consistent.
    fn entries(&self) -> MutexGuard<'_, HashMap<PumpAddress, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("writes disabled".into()));
        }
        Ok(())
    }
}

/// Process-local store provider.
///
/// Cloning is cheap and every clone sees the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreProvider {
    shared: Arc<Shared>,
}

impl MemoryStoreProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with [`StoreError::Backend`].
    ///
    /// Simulates storage that has gone read-only.
    pub fn set_fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Concrete store for `address`.
    pub fn memory_store(&self, address: PumpAddress) -> MemoryStateStore {
        MemoryStateStore {
            address,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl PumpStateStoreProvider for MemoryStoreProvider {
    fn store_for(&self, address: PumpAddress) -> Box<dyn PumpStateStore> {
        Box::new(self.memory_store(address))
    }

    fn paired_addresses(&self) -> Vec<PumpAddress> {
        let mut addresses: Vec<_> = self
            .shared
            .entries()
            .iter()
            .filter(|(_, entry)| entry.pairing.is_some())
            .map(|(address, _)| *address)
            .collect();
        addresses.sort();
        addresses
    }
}

/// Store for one pump inside a [`MemoryStoreProvider`].
#[derive(Debug, Clone)]
pub struct MemoryStateStore {
    address: PumpAddress,
    shared: Arc<Shared>,
}

impl MemoryStateStore {
    /// Address this store belongs to.
    pub fn address(&self) -> PumpAddress {
        self.address
    }

    fn read<T>(&self, f: impl FnOnce(&Entry) -> T) -> Result<T, StoreError> {
        let entries = self.shared.entries();
        match entries.get(&self.address) {
            Some(entry) if entry.pairing.is_some() => Ok(f(entry)),
            _ => Err(StoreError::Invalid),
        }
    }

    fn write_valid(&self, f: impl FnOnce(&mut Entry)) -> Result<(), StoreError> {
        self.shared.check_writable()?;
        let mut entries = self.shared.entries();
        match entries.get_mut(&self.address) {
            Some(entry) if entry.pairing.is_some() => {
                f(entry);
                Ok(())
            }
            _ => Err(StoreError::Invalid),
        }
    }
}

impl PumpStateStore for MemoryStateStore {
    fn retrieve_pairing_data(&self) -> Result<PumpPairingData, StoreError> {
        self.shared
            .entries()
            .get(&self.address)
            .and_then(|entry| entry.pairing.clone())
            .ok_or(StoreError::Invalid)
    }

    fn store_pairing_data(&mut self, data: &PumpPairingData) -> Result<(), StoreError> {
        self.shared.check_writable()?;
        let mut entries = self.shared.entries();
        let entry = entries.entry(self.address).or_default();
        if entry.pairing.is_none() {
            entry.tx_nonce = Nonce::FIRST;
        }
        entry.pairing = Some(data.clone());
        entry.pump_id = data.pump_id.clone();
        Ok(())
    }

    fn is_valid(&self) -> bool {
        self.shared
            .entries()
            .get(&self.address)
            .is_some_and(|entry| entry.pairing.is_some())
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        self.shared.check_writable()?;
        self.shared.entries().remove(&self.address);
        Ok(())
    }

    fn pump_id(&self) -> Result<String, StoreError> {
        self.read(|entry| entry.pump_id.clone())
    }

    fn set_pump_id(&mut self, pump_id: &str) -> Result<(), StoreError> {
        self.write_valid(|entry| entry.pump_id = pump_id.to_owned())
    }

    fn current_tx_nonce(&self) -> Result<Nonce, StoreError> {
        self.read(|entry| entry.tx_nonce)
    }

    fn set_current_tx_nonce(&mut self, nonce: Nonce) -> Result<(), StoreError> {
        self.write_valid(|entry| entry.tx_nonce = nonce)
    }
}
