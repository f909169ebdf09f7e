//! Scripted pump for session tests.
//!
//! Speaks the pump side of the protocol using the library's own codecs
//! and the pump->client key.

#![allow(dead_code)]

use std::time::Duration;

use combo_protocol::application::{control, ApplicationCommand, ApplicationPacket};
use combo_protocol::channel::{MemoryChannel, PacketChannel};
use combo_protocol::core::{KeyMaterial, Nonce, PumpAddress, PumpPairingData, TransportAddress};
use combo_protocol::crypto::{decrypt_and_verify, encrypt_and_frame, PairingKeys};
use combo_protocol::session::{Session, SessionConfig, SessionConfigBuilder};
use combo_protocol::store::MemoryStoreProvider;
use combo_protocol::transport::{TransportCommand, TransportPacket};
use combo_protocol::PumpStateStoreProvider;

pub const CLIENT_ADDRESS: TransportAddress = TransportAddress::new(1, 0);

pub fn pump_address() -> PumpAddress {
    PumpAddress::new([0x00, 0x0E, 0x2F, 0xA1, 0x5B, 0xC4])
}

pub fn key_material() -> KeyMaterial {
    KeyMaterial::new(
        hex::decode("8f3b2a1c0d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60").unwrap(),
    )
    .unwrap()
}

pub fn pairing_data(pump_id: &str) -> PumpPairingData {
    PumpPairingData::new(pump_id, key_material(), CLIENT_ADDRESS)
}

pub fn test_config() -> SessionConfig {
    SessionConfigBuilder::new()
        .connect_retry_delay(Duration::ZERO)
        .confirmation_timeout(Duration::from_millis(200))
        .build()
}

/// A paired session plus the pump on the other end of its channel.
pub fn paired_session(
    provider: &MemoryStoreProvider,
    pump_id: &str,
) -> (Session<MemoryChannel>, FakePump) {
    let (client_channel, pump_channel) = MemoryChannel::pair();
    let mut session = Session::new(
        pump_address(),
        client_channel,
        provider.store_for(pump_address()),
        test_config(),
    )
    .unwrap();
    session.complete_pairing(pairing_data(pump_id)).unwrap();
    (session, FakePump::new(pump_channel))
}

/// Pump side of the link.
pub struct FakePump {
    channel: MemoryChannel,
    keys: PairingKeys,
    address: TransportAddress,
    tx_nonce: Nonce,
    rx_floor: Nonce,
    tx_bit: bool,
}

impl FakePump {
    pub fn new(channel: MemoryChannel) -> Self {
        Self {
            channel,
            keys: PairingKeys::derive(&key_material()).unwrap(),
            address: CLIENT_ADDRESS.swapped(),
            tx_nonce: Nonce::FIRST,
            rx_floor: Nonce::ZERO,
            tx_bit: false,
        }
    }

    pub fn channel(&self) -> &MemoryChannel {
        &self.channel
    }

    /// Highest client nonce accepted so far.
    pub fn rx_floor(&self) -> Nonce {
        self.rx_floor
    }

    pub async fn open(&self) {
        self.channel.open().await.unwrap();
    }

    pub async fn recv_transport(&mut self) -> TransportPacket {
        let bytes = self.channel.receive().await.unwrap();
        let packet = TransportPacket::decode(&bytes).unwrap();
        assert_eq!(packet.address(), CLIENT_ADDRESS);
        packet
    }

    /// Receive and decrypt the next application packet from the client.
    pub async fn recv_app(&mut self) -> ApplicationPacket {
        let packet = self.recv_transport().await;
        assert_eq!(packet.command(), TransportCommand::Data);
        let app = decrypt_and_verify(&packet, self.keys.client_to_pump(), self.rx_floor).unwrap();
        self.rx_floor = packet.nonce();
        app
    }

    /// Receive with a deadline; `None` if the client sent nothing.
    pub async fn try_recv_raw(&self, wait: Duration) -> Option<Vec<u8>> {
        tokio::time::timeout(wait, self.channel.receive())
            .await
            .ok()
            .map(|r| r.unwrap())
    }

    fn next_bit(&mut self) -> bool {
        let bit = self.tx_bit;
        self.tx_bit = !bit;
        bit
    }

    pub async fn send_control(&mut self, command: TransportCommand) {
        let packet = TransportPacket::control(command, self.address).with_sequence_bit(self.next_bit());
        self.channel.send(packet.encode()).await.unwrap();
    }

    /// Encrypt into a DATA frame without sending it.
    pub fn seal(&mut self, packet: &ApplicationPacket) -> TransportPacket {
        encrypt_and_frame(
            packet,
            self.keys.pump_to_client(),
            self.address,
            &mut self.tx_nonce,
        )
        .unwrap()
        .with_sequence_bit(self.next_bit())
    }

    /// Encrypt and send; returns the bytes put on the wire.
    pub async fn send_app(&mut self, packet: &ApplicationPacket) -> Vec<u8> {
        let bytes = self.seal(packet).encode();
        self.channel.send(bytes.clone()).await.unwrap();
        bytes
    }

    pub async fn send_raw(&self, bytes: Vec<u8>) {
        self.channel.send(bytes).await.unwrap();
    }

    /// Answer the regular connection handshake.
    pub async fn accept_connection(&mut self) {
        self.open().await;

        let request = self.recv_transport().await;
        assert_eq!(request.command(), TransportCommand::RequestRegularConnection);
        self.send_control(TransportCommand::RegularConnectionRequestAccepted)
            .await;

        let connect = self.recv_app().await;
        assert_eq!(connect.command(), ApplicationCommand::CtrlConnect);
        self.respond(ApplicationCommand::CtrlConnectResponse).await;

        let activate = self.recv_app().await;
        assert_eq!(activate.command(), ApplicationCommand::CtrlActivateService);
        assert_eq!(activate.payload(), &[0x48, 1, 0]);
        self.respond(ApplicationCommand::CtrlActivateServiceResponse)
            .await;
    }

    pub async fn respond(&mut self, command: ApplicationCommand) {
        let response = control::response(command).unwrap();
        self.send_app(&response).await;
    }
}
