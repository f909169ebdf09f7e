//! In-process channel pair over tokio queues.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tokio::sync::{mpsc, Mutex};

use super::PacketChannel;
use crate::core::ChannelError;

/// One end of an in-process packet link.
///
/// Created in pairs with [`MemoryChannel::pair`]; whatever one end sends
/// the other receives. Frames sent while the receiving end is closed stay
/// queued until it is reopened.
#[derive(Debug)]
pub struct MemoryChannel {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    open: AtomicBool,
    failing_opens: AtomicU32,
    open_attempts: AtomicU32,
}

impl MemoryChannel {
    /// Create two connected, closed ends.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (Self::new(a_tx, b_rx), Self::new(b_tx, a_rx))
    }

    fn new(tx: mpsc::UnboundedSender<Vec<u8>>, rx: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        Self {
            tx,
            rx: Mutex::new(rx),
            open: AtomicBool::new(false),
            failing_opens: AtomicU32::new(0),
            open_attempts: AtomicU32::new(0),
        }
    }

    /// Make the next `count` calls to `open` fail.
    pub fn fail_next_opens(&self, count: u32) {
        self.failing_opens.store(count, Ordering::SeqCst);
    }

    /// Number of times `open` has been called.
    pub fn open_attempts(&self) -> u32 {
        self.open_attempts.load(Ordering::SeqCst)
    }

    /// Whether this end is open.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), ChannelError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ChannelError::Closed)
        }
    }
}

impl PacketChannel for MemoryChannel {
    async fn open(&self) -> Result<(), ChannelError> {
        let attempt = self.open_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let should_fail = self
            .failing_opens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(ChannelError::OpenFailed(format!(
                "simulated failure on attempt {attempt}"
            )));
        }
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, packet: Vec<u8>) -> Result<(), ChannelError> {
        self.ensure_open()?;
        self.tx.send(packet).map_err(|_| ChannelError::Closed)
    }

    async fn receive(&self) -> Result<Vec<u8>, ChannelError> {
        self.ensure_open()?;
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(ChannelError::Closed)
    }

    async fn close(&self) -> Result<(), ChannelError> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }
}
