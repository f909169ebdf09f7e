//! Pump manager: hands out at most one live session per pump.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::config::SessionConfig;
use super::error::{SessionError, SessionResult};
use super::session::Session;
use crate::channel::PacketChannel;
use crate::core::{PumpAddress, PumpStateStoreProvider};

type Acquired = Arc<Mutex<HashSet<PumpAddress>>>;

fn lock(acquired: &Mutex<HashSet<PumpAddress>>) -> MutexGuard<'_, HashSet<PumpAddress>> {
    acquired.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Exclusive claim on a pump address, released on drop.
#[derive(Debug)]
pub struct PumpLease {
    address: PumpAddress,
    acquired: Acquired,
}

impl PumpLease {
    /// Leased address.
    pub fn address(&self) -> PumpAddress {
        self.address
    }
}

impl Drop for PumpLease {
    fn drop(&mut self) {
        lock(&self.acquired).remove(&self.address);
        debug!(address = %self.address, "pump lease released");
    }
}

/// Entry point for talking to pumps.
///
/// Wraps the platform's store provider and makes sure no two sessions for
/// the same pump are alive at once. Sessions for different pumps are
/// independent.
#[derive(Debug)]
pub struct PumpManager<P> {
    provider: P,
    config: SessionConfig,
    acquired: Acquired,
}

impl<P: PumpStateStoreProvider> PumpManager<P> {
    /// Create a manager over `provider`.
    pub fn new(provider: P, config: SessionConfig) -> Self {
        Self {
            provider,
            config,
            acquired: Arc::default(),
        }
    }

    /// The store provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Addresses of all paired pumps.
    pub fn paired_pump_addresses(&self) -> Vec<PumpAddress> {
        self.provider.paired_addresses()
    }

    /// Start a session with the pump at `address` over `channel`.
    ///
    /// Fails with [`SessionError::AlreadyAcquired`] while another session
    /// for the same pump is alive. Unpaired pumps can be acquired too, to
    /// complete a pairing.
    pub fn acquire_pump<C: PacketChannel>(
        &self,
        address: PumpAddress,
        channel: C,
    ) -> SessionResult<Session<C>> {
        if !lock(&self.acquired).insert(address) {
            return Err(SessionError::AlreadyAcquired(address));
        }
        let lease = PumpLease {
            address,
            acquired: Arc::clone(&self.acquired),
        };
        debug!(%address, "pump acquired");

        // On error the lease drops here and frees the address again.
        let store = self.provider.store_for(address);
        let session = Session::new(address, channel, store, self.config.clone())?;
        Ok(session.with_lease(lease))
    }

    /// Whether a live session holds `address`.
    pub fn is_acquired(&self, address: PumpAddress) -> bool {
        lock(&self.acquired).contains(&address)
    }

    /// End a session, returning its channel.
    pub async fn release_pump<C: PacketChannel>(&self, session: Session<C>) -> C {
        session.release().await
    }
}
