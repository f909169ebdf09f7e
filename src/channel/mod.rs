//! Combo protocol - Packet Channel
//!
//! The session talks to the pump through a [`PacketChannel`]: an ordered,
//! reliable, packet-oriented link that carries encoded transport packets.
//! The radio stack behind it is the platform's business.
//!
//! - [`MemoryChannel`]: in-process channel pair
//! - [`StreamChannel`]: transport packets over any async byte stream
//! - [`RetryPolicy`]: bounded retry of channel operations

use std::future::Future;

use crate::core::ChannelError;

mod memory;
mod retry;
mod stream;

pub use memory::MemoryChannel;
pub use retry::RetryPolicy;
pub use stream::StreamChannel;

/// Packet-oriented link to one pump.
///
/// # Requirements
///
/// - Packets are delivered whole, in order, without loss while open
/// - `receive` has no implicit timeout
/// - Methods take `&self`; implementations synchronize internally so a
///   send can be issued while a receive is pending
pub trait PacketChannel: Send + Sync {
    /// Establish the link.
    fn open(&self) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// Send one encoded packet.
    fn send(&self, packet: Vec<u8>) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// Receive one encoded packet.
    fn receive(&self) -> impl Future<Output = Result<Vec<u8>, ChannelError>> + Send;

    /// Tear the link down. Closing a closed channel is not an error.
    fn close(&self) -> impl Future<Output = Result<(), ChannelError>> + Send;
}
