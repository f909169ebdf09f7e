//! Transport packets over an async byte stream.
//!
//! Streams (serial links, RFCOMM sockets, TCP bridges) have no packet
//! boundaries, so the channel recovers them from the transport header:
//! read the fixed header, ask the codec how long the packet is, then read
//! the rest.

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use super::PacketChannel;
use crate::core::{ChannelError, MAX_TRANSPORT_PACKET_SIZE, TRANSPORT_HEADER_SIZE};
use crate::transport::{frame_length, FramingError};

/// [`PacketChannel`] over a reader/writer pair.
///
/// The stream is expected to be connected already; `open` only re-enables
/// I/O after a `close`. A header that fails validation leaves the stream
/// at an unknown offset, so it is reported as
/// [`ChannelError::Desynchronized`] and the channel closes itself.
///
/// `receive` is cancellation safe: bytes of a partly read frame stay
/// buffered and the next call carries on with the same frame, so wrapping
/// it in a timeout never shifts the stream offset.
#[derive(Debug)]
pub struct StreamChannel<R, W> {
    reader: Mutex<FrameReader<R>>,
    writer: Mutex<W>,
    open: AtomicBool,
}

impl<R, W> StreamChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap a connected stream. The channel starts closed.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(FrameReader {
                inner: reader,
                partial: Vec::new(),
            }),
            writer: Mutex::new(writer),
            open: AtomicBool::new(false),
        }
    }

    /// Consume the channel, returning the stream halves.
    ///
    /// Bytes of a partly received frame are discarded.
    pub fn into_inner(self) -> (R, W) {
        (self.reader.into_inner().inner, self.writer.into_inner())
    }

    fn ensure_open(&self) -> Result<(), ChannelError> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ChannelError::Closed)
        }
    }

    fn desynchronized(&self, err: FramingError) -> ChannelError {
        self.open.store(false, Ordering::SeqCst);
        match err {
            FramingError::PayloadTooLarge { size, .. } => ChannelError::OversizedFrame(size),
            other => ChannelError::Desynchronized(other),
        }
    }
}

/// Read half plus the frame being assembled.
#[derive(Debug)]
struct FrameReader<R> {
    inner: R,
    partial: Vec<u8>,
}

impl<R> FrameReader<R> {
    /// Length the partial frame has to reach: the header first, then the
    /// whole packet once the header says how long it is.
    fn target_len(&self) -> Result<usize, FramingError> {
        if self.partial.len() < TRANSPORT_HEADER_SIZE {
            Ok(TRANSPORT_HEADER_SIZE)
        } else {
            frame_length(&self.partial[..TRANSPORT_HEADER_SIZE])
        }
    }
}

impl<R, W> PacketChannel for StreamChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn open(&self) -> Result<(), ChannelError> {
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, packet: Vec<u8>) -> Result<(), ChannelError> {
        self.ensure_open()?;
        if packet.len() > MAX_TRANSPORT_PACKET_SIZE {
            return Err(ChannelError::OversizedFrame(packet.len()));
        }
        let mut writer = self.writer.lock().await;
        writer.write_all(&packet).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn receive(&self) -> Result<Vec<u8>, ChannelError> {
        self.ensure_open()?;
        let mut reader = self.reader.lock().await;

        loop {
            let target = match reader.target_len() {
                Ok(target) => target,
                Err(err) => {
                    reader.partial.clear();
                    return Err(self.desynchronized(err));
                }
            };
            let missing = target - reader.partial.len();
            if missing == 0 {
                return Ok(mem::take(&mut reader.partial));
            }

            // `read` consumes nothing when cancelled; whatever it returns
            // is appended before the next await.
            let mut chunk = vec![0u8; missing];
            let n = reader.inner.read(&mut chunk).await?;
            if n == 0 {
                reader.partial.clear();
                return Err(ChannelError::Closed);
            }
            reader.partial.extend_from_slice(&chunk[..n]);
        }
    }

    async fn close(&self) -> Result<(), ChannelError> {
        if self.open.swap(false, Ordering::SeqCst) {
            self.writer.lock().await.flush().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::{Nonce, TransportAddress, MAX_TRANSPORT_PAYLOAD};
    use crate::transport::{TransportCommand, TransportPacket};

    fn packet(payload_len: usize) -> TransportPacket {
        TransportPacket::new(
            TransportCommand::Data,
            TransportAddress::new(1, 0),
            Nonce::new(3),
            vec![0xA5; payload_len],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_packets_recovered_from_stream() {
        let (client_io, pump_io) = tokio::io::duplex(4096);
        let (client_r, client_w) = tokio::io::split(client_io);
        let (pump_r, pump_w) = tokio::io::split(pump_io);
        let client = StreamChannel::new(client_r, client_w);
        let pump = StreamChannel::new(pump_r, pump_w);
        client.open().await.unwrap();
        pump.open().await.unwrap();

        let first = packet(0);
        let second = packet(40);
        client.send(first.encode()).await.unwrap();
        client.send(second.encode()).await.unwrap();

        let received = pump.receive().await.unwrap();
        assert_eq!(TransportPacket::decode(&received).unwrap(), first);
        let received = pump.receive().await.unwrap();
        assert_eq!(TransportPacket::decode(&received).unwrap(), second);
    }

    #[tokio::test]
    async fn test_max_payload_fits() {
        let (client_io, pump_io) = tokio::io::duplex(4 * MAX_TRANSPORT_PAYLOAD);
        let (client_r, client_w) = tokio::io::split(client_io);
        let (pump_r, pump_w) = tokio::io::split(pump_io);
        let client = StreamChannel::new(client_r, client_w);
        let pump = StreamChannel::new(pump_r, pump_w);
        client.open().await.unwrap();
        pump.open().await.unwrap();

        let big = packet(MAX_TRANSPORT_PAYLOAD);
        client.send(big.encode()).await.unwrap();
        assert_eq!(pump.receive().await.unwrap(), big.encode());
    }

    #[tokio::test]
    async fn test_garbage_header_desynchronizes() {
        let (client_io, pump_io) = tokio::io::duplex(256);
        let (_client_r, mut client_w) = tokio::io::split(client_io);
        let (pump_r, pump_w) = tokio::io::split(pump_io);
        let pump = StreamChannel::new(pump_r, pump_w);
        pump.open().await.unwrap();

        client_w.write_all(&[0x42; TRANSPORT_HEADER_SIZE]).await.unwrap();

        assert!(matches!(
            pump.receive().await,
            Err(ChannelError::Desynchronized(FramingError::UnsupportedVersion(0x42)))
        ));
        assert!(matches!(pump.receive().await, Err(ChannelError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_receive_keeps_alignment() {
        let (client_io, pump_io) = tokio::io::duplex(4096);
        let (_client_r, mut client_w) = tokio::io::split(client_io);
        let (pump_r, pump_w) = tokio::io::split(pump_io);
        let pump = StreamChannel::new(pump_r, pump_w);
        pump.open().await.unwrap();

        let first = packet(20).encode();
        let second = packet(3).encode();

        // Time out part way through the header, then part way through the body.
        client_w.write_all(&first[..5]).await.unwrap();
        let timed_out = tokio::time::timeout(Duration::from_millis(20), pump.receive()).await;
        assert!(timed_out.is_err());

        client_w.write_all(&first[5..TRANSPORT_HEADER_SIZE + 4]).await.unwrap();
        let timed_out = tokio::time::timeout(Duration::from_millis(20), pump.receive()).await;
        assert!(timed_out.is_err());

        client_w.write_all(&first[TRANSPORT_HEADER_SIZE + 4..]).await.unwrap();
        client_w.write_all(&second).await.unwrap();

        assert_eq!(pump.receive().await.unwrap(), first);
        assert_eq!(pump.receive().await.unwrap(), second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_frame_survives_reopen() {
        let (client_io, pump_io) = tokio::io::duplex(4096);
        let (_client_r, mut client_w) = tokio::io::split(client_io);
        let (pump_r, pump_w) = tokio::io::split(pump_io);
        let pump = StreamChannel::new(pump_r, pump_w);
        pump.open().await.unwrap();

        let frame = packet(8).encode();
        client_w.write_all(&frame[..7]).await.unwrap();
        let timed_out = tokio::time::timeout(Duration::from_millis(20), pump.receive()).await;
        assert!(timed_out.is_err());

        pump.close().await.unwrap();
        pump.open().await.unwrap();
        client_w.write_all(&frame[7..]).await.unwrap();

        assert_eq!(pump.receive().await.unwrap(), frame);
    }

    #[tokio::test]
    async fn test_eof_is_closed() {
        let (client_io, pump_io) = tokio::io::duplex(256);
        let (pump_r, pump_w) = tokio::io::split(pump_io);
        let pump = StreamChannel::new(pump_r, pump_w);
        pump.open().await.unwrap();
        drop(client_io);

        assert!(matches!(pump.receive().await, Err(ChannelError::Closed)));
    }

    #[tokio::test]
    async fn test_closed_channel_rejects_io() {
        let (client_io, _pump_io) = tokio::io::duplex(256);
        let (client_r, client_w) = tokio::io::split(client_io);
        let client = StreamChannel::new(client_r, client_w);

        assert!(matches!(client.send(vec![0; 15]).await, Err(ChannelError::Closed)));
        client.open().await.unwrap();
        client.close().await.unwrap();
        assert!(matches!(client.receive().await, Err(ChannelError::Closed)));
    }
}
