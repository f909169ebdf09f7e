//! Session with one pump.
//!
//! A [`Session`] owns everything that must stay consistent for a pump: the
//! channel, the pump's state store, the tx nonce and rx floor, the
//! transport sequence bits and the RT sequence. Every operation takes
//! `&mut self`, so a nonce is always persisted before the next one can be
//! drawn.
//!
//! # Error routing
//!
//! Failures that leave the link untrusted (crypto, channel, store,
//! timeout) move a paired session to [`SessionState::Aborted`]; only
//! `connect` recovers from there. Anything else abandons just the current
//! exchange, returning `AwaitingConfirmation` to `Idle`.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::error::{ProtocolError, SessionError, SessionResult};
use super::manager::PumpLease;
use super::state::SessionState;
use crate::application::{
    control, rt, ApplicationCommand, ApplicationPacket, Button, ButtonConfirmation, ButtonStatus,
    RtSequence, ServiceId,
};
use crate::channel::PacketChannel;
use crate::core::{
    ChannelError, CryptoError, Nonce, PumpAddress, PumpPairingData, PumpStateStore,
    TransportAddress,
};
use crate::crypto::{decrypt_and_verify, encrypt_and_frame, PairingKeys};
use crate::transport::{TransportCommand, TransportPacket};

/// Keys and addressing of a stored pairing.
struct Link {
    pump_id: String,
    keys: PairingKeys,
    address: TransportAddress,
}

impl Link {
    fn new(data: &PumpPairingData) -> Result<Self, CryptoError> {
        Ok(Self {
            pump_id: data.pump_id.clone(),
            keys: PairingKeys::derive(&data.key_material)?,
            address: data.key_response_address,
        })
    }
}

/// A session with one pump over a [`PacketChannel`].
pub struct Session<C> {
    address: PumpAddress,
    channel: C,
    store: Box<dyn PumpStateStore>,
    config: SessionConfig,
    state: SessionState,
    link: Option<Link>,
    connected: bool,
    tx_nonce: Nonce,
    rx_floor: Nonce,
    tx_sequence_bit: bool,
    rx_sequence_bit: Option<bool>,
    rt_sequence: RtSequence,
    pending: VecDeque<ApplicationPacket>,
    lease: Option<PumpLease>,
}

impl<C> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address)
            .field("state", &self.state)
            .field("connected", &self.connected)
            .field("tx_nonce", &self.tx_nonce)
            .field("rx_floor", &self.rx_floor)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl<C: PacketChannel> Session<C> {
    /// Create a session from whatever `store` holds.
    ///
    /// A valid store yields an `Idle` session resuming at the stored tx
    /// nonce (never below [`Nonce::FIRST`]); otherwise the session starts `Unpaired`. The channel is not
    /// opened until [`connect`](Self::connect).
    pub fn new(
        address: PumpAddress,
        channel: C,
        mut store: Box<dyn PumpStateStore>,
        config: SessionConfig,
    ) -> SessionResult<Self> {
        let (state, link, tx_nonce) = if store.is_valid() {
            let data = store.retrieve_pairing_data()?;
            let mut tx_nonce = store.current_tx_nonce()?;
            // Nonce zero is never sent; a store that was only given pairing
            // data starts at the first usable nonce.
            if tx_nonce < Nonce::FIRST {
                store.set_current_tx_nonce(Nonce::FIRST)?;
                tx_nonce = Nonce::FIRST;
            }
            (SessionState::Idle, Some(Link::new(&data)?), tx_nonce)
        } else {
            (SessionState::Unpaired, None, Nonce::ZERO)
        };
        debug!(%address, %state, %tx_nonce, "session created");

        Ok(Self {
            address,
            channel,
            store,
            config,
            state,
            link,
            connected: false,
            tx_nonce,
            rx_floor: Nonce::ZERO,
            tx_sequence_bit: false,
            rx_sequence_bit: None,
            rt_sequence: RtSequence::default(),
            pending: VecDeque::new(),
            lease: None,
        })
    }

    pub(crate) fn with_lease(mut self, lease: PumpLease) -> Self {
        self.lease = Some(lease);
        self
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Address of the pump.
    pub fn address(&self) -> PumpAddress {
        self.address
    }

    /// Pump identifier, if paired.
    pub fn pump_id(&self) -> Option<&str> {
        self.link.as_ref().map(|link| link.pump_id.as_str())
    }

    /// Nonce the next outgoing packet will carry.
    pub fn tx_nonce(&self) -> Nonce {
        self.tx_nonce
    }

    /// Highest nonce accepted from the pump.
    pub fn rx_floor(&self) -> Nonce {
        self.rx_floor
    }

    /// Whether the channel is connected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The underlying channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Record a finished pairing handshake.
    ///
    /// Stores the pairing data and starts the tx nonce at
    /// [`Nonce::FIRST`]. If the nonce cannot be stored the pairing is
    /// rolled back.
    pub fn complete_pairing(&mut self, data: PumpPairingData) -> SessionResult<()> {
        if self.state != SessionState::Unpaired {
            return Err(self.invalid_state("complete pairing"));
        }

        let link = Link::new(&data)?;
        self.store.store_pairing_data(&data)?;
        if let Err(err) = self.store.set_current_tx_nonce(Nonce::FIRST) {
            if let Err(reset_err) = self.store.reset() {
                warn!(address = %self.address, error = %reset_err, "could not roll back pairing");
            }
            return Err(err.into());
        }

        info!(address = %self.address, pump_id = %link.pump_id, "pairing completed");
        self.link = Some(link);
        self.tx_nonce = Nonce::FIRST;
        self.rx_floor = Nonce::ZERO;
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Open the channel and bring the pump into RT mode.
    ///
    /// Opening is retried according to the configured policy. On any
    /// failure the session ends up `Aborted`.
    pub async fn connect(&mut self) -> SessionResult<()> {
        if !self.state.is_paired() {
            return Err(self.invalid_state("connect"));
        }

        let result = self.establish().await;
        if let Err(err) = &result {
            warn!(address = %self.address, error = %err, "connect failed");
            self.connected = false;
            self.state = SessionState::Aborted;
        }
        result
    }

    async fn establish(&mut self) -> SessionResult<()> {
        let address = self.address;
        let channel = &self.channel;
        self.config
            .retry_policy()
            .run(
                || channel.open(),
                |err, attempt| warn!(%address, attempt, error = %err, "opening channel failed"),
            )
            .await?;

        self.connected = true;
        self.tx_sequence_bit = false;
        self.rx_sequence_bit = None;
        self.pending.clear();

        self.send_control(TransportCommand::RequestRegularConnection)
            .await?;
        self.expect_transport(TransportCommand::RegularConnectionRequestAccepted)
            .await?;

        self.send_packet(control::connect(self.config.client_serial))
            .await?;
        self.expect_application(ApplicationCommand::CtrlConnectResponse)
            .await?;

        let (major, minor) = self.config.rt_service_version;
        self.send_packet(control::activate_service(ServiceId::RtMode, major, minor))
            .await?;
        self.expect_application(ApplicationCommand::CtrlActivateServiceResponse)
            .await?;

        self.state = SessionState::Idle;
        info!(%address, tx_nonce = %self.tx_nonce, "connected");
        Ok(())
    }

    /// Leave RT mode and close the channel. The pairing is kept.
    ///
    /// The goodbye packets are best effort; only a failure to close the
    /// channel is reported.
    pub async fn disconnect(&mut self) -> SessionResult<()> {
        if self.connected {
            if matches!(self.state, SessionState::Idle | SessionState::AwaitingConfirmation { .. }) {
                if let Err(err) = self.send_packet(control::disconnect()).await {
                    debug!(address = %self.address, error = %err, "CtrlDisconnect not sent");
                }
            }
            if let Err(err) = self.send_control(TransportCommand::Disconnect).await {
                debug!(address = %self.address, error = %err, "transport disconnect not sent");
            }
        }

        self.connected = false;
        self.pending.clear();
        if self.state.is_awaiting_confirmation() {
            self.state = SessionState::Idle;
        }
        self.channel.close().await?;
        info!(address = %self.address, "disconnected");
        Ok(())
    }

    /// Encrypt and send an application packet.
    ///
    /// The advanced tx nonce is persisted before anything reaches the
    /// channel; if persisting fails nothing is sent.
    pub async fn send_application_packet(&mut self, packet: ApplicationPacket) -> SessionResult<()> {
        self.ensure_ready("send")?;
        let result = self.send_packet(packet).await;
        self.route(result)
    }

    /// Next inbound application packet.
    ///
    /// Packets set aside while waiting for a button confirmation come
    /// first. There is no timeout.
    pub async fn receive_application_packet(&mut self) -> SessionResult<ApplicationPacket> {
        if let Some(packet) = self.pending.pop_front() {
            return Ok(packet);
        }
        self.ensure_ready("receive")?;
        let result = self.receive_data_packet().await;
        self.route(result)
    }

    /// Send an RT button status and start waiting for its confirmation.
    pub async fn send_button_status(
        &mut self,
        button: Button,
        changed: bool,
    ) -> SessionResult<RtSequence> {
        if self.state != SessionState::Idle {
            return Err(self.invalid_state("send button status"));
        }
        if !self.connected {
            return Err(SessionError::NotConnected);
        }

        let sequence = self.rt_sequence;
        let status = ButtonStatus {
            sequence,
            button,
            changed,
        };
        let result = self.send_packet(status.to_packet()).await;
        self.route(result)?;

        self.rt_sequence = sequence.next();
        self.state = SessionState::AwaitingConfirmation { button, sequence };
        debug!(address = %self.address, ?button, sequence = sequence.value(), "button status sent");
        Ok(sequence)
    }

    /// Wait for the confirmation of the outstanding button status.
    ///
    /// Other packets arriving meanwhile are queued for
    /// [`receive_application_packet`](Self::receive_application_packet).
    /// If nothing confirms the status within `timeout` the session is
    /// aborted; the status is never assumed confirmed and never resent.
    pub async fn wait_for_button_confirmation(
        &mut self,
        timeout: Duration,
    ) -> SessionResult<ButtonConfirmation> {
        let SessionState::AwaitingConfirmation { button, sequence } = self.state else {
            return Err(self.invalid_state("wait for confirmation"));
        };
        if !self.connected {
            return Err(SessionError::NotConnected);
        }

        let result = self.await_confirmation(button, sequence, timeout).await;
        self.route(result)
    }

    async fn await_confirmation(
        &mut self,
        button: Button,
        sequence: RtSequence,
        timeout: Duration,
    ) -> SessionResult<ButtonConfirmation> {
        let deadline = Instant::now() + timeout;
        loop {
            let packet = match tokio::time::timeout_at(deadline, self.receive_data_packet()).await {
                Ok(packet) => packet?,
                Err(_) => return Err(SessionError::Timeout(timeout)),
            };

            if packet.command() == ApplicationCommand::RtButtonConfirmation {
                // A confirmation that does not parse cannot be ours; it is
                // queued like any other unrelated packet.
                let confirmed = ButtonConfirmation::from_packet(&packet)
                    .ok()
                    .filter(|confirmation| confirmation.confirms(sequence, button));
                if let Some(confirmation) = confirmed {
                    self.state = SessionState::Idle;
                    debug!(address = %self.address, sequence = sequence.value(), "button confirmed");
                    return Ok(confirmation);
                }
            }

            debug!(
                address = %self.address,
                command = %packet.command(),
                "queueing packet received while awaiting confirmation"
            );
            self.pending.push_back(packet);
        }
    }

    /// Press a button: send its status and wait for the confirmation
    /// using the configured timeout.
    pub async fn press_button(&mut self, button: Button) -> SessionResult<ButtonConfirmation> {
        self.send_button_status(button, true).await?;
        let timeout = self.config.confirmation_timeout;
        self.wait_for_button_confirmation(timeout).await
    }

    /// Send an RT keep-alive.
    pub async fn send_rt_keep_alive(&mut self) -> SessionResult<()> {
        self.ensure_ready("send keep-alive")?;
        let sequence = self.rt_sequence;
        let result = self.send_packet(rt::keep_alive(sequence)).await;
        self.route(result)?;
        self.rt_sequence = sequence.next();
        Ok(())
    }

    /// Forget the pairing.
    ///
    /// The store is cleared first and the session becomes `Unpaired`
    /// before the pump is told. Telling the pump is best effort: a failure
    /// is returned but the pairing stays gone.
    pub async fn unpair(&mut self) -> SessionResult<()> {
        if !self.state.is_paired() {
            return Err(self.invalid_state("unpair"));
        }

        self.store.reset()?;
        let link = self.link.take();
        let tx_nonce = self.tx_nonce;
        self.state = SessionState::Unpaired;
        self.tx_nonce = Nonce::ZERO;
        self.rx_floor = Nonce::ZERO;
        self.rt_sequence = RtSequence::default();
        self.pending.clear();
        info!(address = %self.address, "pairing removed");

        let mut result = Ok(());
        if self.connected {
            if let Some(link) = link {
                result = self.send_unbind(&link, tx_nonce).await;
            }
            if let Err(err) = self.channel.close().await {
                debug!(address = %self.address, error = %err, "channel close failed");
            }
            self.connected = false;
        }
        if let Err(err) = &result {
            warn!(address = %self.address, error = %err, "pump not notified of unpairing");
        }
        result
    }

    // The store is already reset, so this nonce is deliberately not
    // persisted.
    async fn send_unbind(&mut self, link: &Link, tx_nonce: Nonce) -> SessionResult<()> {
        let mut nonce = tx_nonce;
        let frame = encrypt_and_frame(
            &control::unbind(),
            link.keys.client_to_pump(),
            link.address,
            &mut nonce,
        )?
        .with_sequence_bit(self.take_tx_sequence_bit());
        self.channel.send(frame.encode()).await?;
        Ok(())
    }

    /// End the session, freeing the pump for other sessions.
    ///
    /// Disconnects first if needed and hands the channel back.
    pub async fn release(mut self) -> C {
        if self.connected {
            if let Err(err) = self.disconnect().await {
                debug!(address = %self.address, error = %err, "disconnect on release failed");
            }
        }
        info!(address = %self.address, "session released");
        let Session { channel, lease, .. } = self;
        drop(lease);
        channel
    }

    // ------------------------------------------------------------------
    // Outbound
    // ------------------------------------------------------------------

    async fn send_packet(&mut self, packet: ApplicationPacket) -> SessionResult<()> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        let link = self
            .link
            .as_ref()
            .ok_or(SessionError::InvalidState {
                operation: "send",
                state: self.state,
            })?;

        let mut next = self.tx_nonce;
        let frame = encrypt_and_frame(&packet, link.keys.client_to_pump(), link.address, &mut next)?;
        self.store.set_current_tx_nonce(next)?;
        self.tx_nonce = next;

        let frame = frame.with_sequence_bit(self.take_tx_sequence_bit());
        debug!(
            address = %self.address,
            command = %packet.command(),
            nonce = %frame.nonce(),
            "sending application packet"
        );
        self.channel.send(frame.encode()).await?;
        Ok(())
    }

    async fn send_control(&mut self, command: TransportCommand) -> SessionResult<()> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        let address = self.link_address()?;
        let packet = TransportPacket::control(command, address)
            .with_sequence_bit(self.take_tx_sequence_bit());
        debug!(address = %self.address, ?command, "sending transport packet");
        self.channel.send(packet.encode()).await?;
        Ok(())
    }

    fn take_tx_sequence_bit(&mut self) -> bool {
        let bit = self.tx_sequence_bit;
        self.tx_sequence_bit = !bit;
        bit
    }

    // ------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------

    async fn read_transport(&mut self) -> SessionResult<TransportPacket> {
        let expected = self.link_address()?.swapped();
        loop {
            let bytes = self.channel.receive().await?;
            let packet = TransportPacket::decode(&bytes)?;

            if packet.address() != expected {
                return Err(ProtocolError::UnexpectedAddress {
                    expected,
                    actual: packet.address(),
                }
                .into());
            }
            if self.rx_sequence_bit == Some(packet.sequence_bit()) {
                warn!(
                    address = %self.address,
                    command = ?packet.command(),
                    "dropping packet with repeated sequence bit"
                );
                continue;
            }
            self.rx_sequence_bit = Some(packet.sequence_bit());
            return Ok(packet);
        }
    }

    async fn expect_transport(&mut self, expected: TransportCommand) -> SessionResult<TransportPacket> {
        let packet = self.read_transport().await?;
        match packet.command() {
            actual if actual == expected => Ok(packet),
            TransportCommand::ErrorResponse => Err(pump_error(&packet)),
            actual => Err(ProtocolError::UnexpectedTransportCommand { expected, actual }.into()),
        }
    }

    async fn receive_data_packet(&mut self) -> SessionResult<ApplicationPacket> {
        loop {
            let packet = self.read_transport().await?;
            match packet.command() {
                TransportCommand::Data => return self.open_data(&packet),
                TransportCommand::KeepAlive => {
                    debug!(address = %self.address, "transport keep-alive");
                }
                TransportCommand::ErrorResponse => return Err(pump_error(&packet)),
                TransportCommand::Disconnect => {
                    info!(address = %self.address, "pump disconnected");
                    self.connected = false;
                    return Err(ChannelError::Closed.into());
                }
                actual => {
                    return Err(ProtocolError::UnexpectedTransportCommand {
                        expected: TransportCommand::Data,
                        actual,
                    }
                    .into());
                }
            }
        }
    }

    async fn expect_application(
        &mut self,
        expected: ApplicationCommand,
    ) -> SessionResult<ApplicationPacket> {
        let packet = self.receive_data_packet().await?;
        if packet.command() != expected {
            return Err(ProtocolError::UnexpectedApplicationCommand {
                expected,
                actual: packet.command(),
            }
            .into());
        }
        Ok(packet)
    }

    fn open_data(&mut self, packet: &TransportPacket) -> SessionResult<ApplicationPacket> {
        let link = self.link.as_ref().ok_or(SessionError::InvalidState {
            operation: "receive",
            state: self.state,
        })?;

        let result = decrypt_and_verify(packet, link.keys.pump_to_client(), self.rx_floor);
        // An authentic packet consumes its nonce even if its content is
        // rejected.
        if matches!(result, Ok(_) | Err(CryptoError::Application(_))) {
            self.rx_floor = packet.nonce();
        }
        if let Err(err) = &result {
            if err.is_security_error() {
                warn!(address = %self.address, error = %err, "rejected inbound packet");
            }
        }
        Ok(result?)
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    fn link_address(&self) -> SessionResult<TransportAddress> {
        self.link
            .as_ref()
            .map(|link| link.address)
            .ok_or(SessionError::InvalidState {
                operation: "use the link",
                state: self.state,
            })
    }

    fn invalid_state(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState {
            operation,
            state: self.state,
        }
    }

    fn ensure_ready(&self, operation: &'static str) -> SessionResult<()> {
        match self.state {
            SessionState::Idle | SessionState::AwaitingConfirmation { .. } if self.connected => {
                Ok(())
            }
            SessionState::Idle | SessionState::AwaitingConfirmation { .. } => {
                Err(SessionError::NotConnected)
            }
            SessionState::Unpaired | SessionState::Aborted => Err(self.invalid_state(operation)),
        }
    }

    fn route<T>(&mut self, result: SessionResult<T>) -> SessionResult<T> {
        if let Err(err) = &result {
            if err.is_session_fatal() {
                if self.state.is_paired() {
                    warn!(address = %self.address, error = %err, "session aborted");
                    self.state = SessionState::Aborted;
                }
                self.connected = false;
            } else if !err.is_usage_error() && self.state.is_awaiting_confirmation() {
                debug!(address = %self.address, error = %err, "exchange abandoned");
                self.state = SessionState::Idle;
            }
        }
        result
    }
}

fn pump_error(packet: &TransportPacket) -> SessionError {
    let code = match packet.payload() {
        [lo, hi, ..] => u16::from_le_bytes([*lo, *hi]),
        [code] => u16::from(*code),
        [] => 0,
    };
    SessionError::PumpReported {
        command: None,
        code,
    }
}
