//! Transport layer command identifiers.

/// Transport command carried in the low five bits of the flags byte.
///
/// Closed set: decoding an id outside this table is a framing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransportCommand {
    /// Encrypted application packet.
    Data = 0x03,
    /// Acknowledges a reliable packet.
    AckResponse = 0x05,
    /// Transport-level error report (1-byte code).
    ErrorResponse = 0x06,
    /// Pairing: open a pairing connection.
    RequestPairingConnection = 0x09,
    /// Pairing: pump accepted the pairing connection.
    PairingConnectionRequestAccepted = 0x0A,
    /// Pairing: request key exchange.
    KeyRequest = 0x0C,
    /// Pairing: fetch the keys the pump generated.
    GetAvailableKeys = 0x0F,
    /// Pairing: pump's key reply.
    KeyResponse = 0x11,
    /// Pairing: request the pump identifier.
    RequestId = 0x12,
    /// Pairing: pump identifier reply.
    IdResponse = 0x14,
    /// Open a regular (paired) connection.
    RequestRegularConnection = 0x17,
    /// Pump accepted the regular connection.
    RegularConnectionRequestAccepted = 0x18,
    /// Tear down the connection.
    Disconnect = 0x1B,
    /// Link keep-alive, carries no payload.
    KeepAlive = 0x1D,
}

impl TransportCommand {
    /// Every command, in id order.
    pub const ALL: [TransportCommand; 14] = [
        Self::Data,
        Self::AckResponse,
        Self::ErrorResponse,
        Self::RequestPairingConnection,
        Self::PairingConnectionRequestAccepted,
        Self::KeyRequest,
        Self::GetAvailableKeys,
        Self::KeyResponse,
        Self::RequestId,
        Self::IdResponse,
        Self::RequestRegularConnection,
        Self::RegularConnectionRequestAccepted,
        Self::Disconnect,
        Self::KeepAlive,
    ];

    /// Parse a command from its 5-bit id.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x03 => Some(Self::Data),
            0x05 => Some(Self::AckResponse),
            0x06 => Some(Self::ErrorResponse),
            0x09 => Some(Self::RequestPairingConnection),
            0x0A => Some(Self::PairingConnectionRequestAccepted),
            0x0C => Some(Self::KeyRequest),
            0x0F => Some(Self::GetAvailableKeys),
            0x11 => Some(Self::KeyResponse),
            0x12 => Some(Self::RequestId),
            0x14 => Some(Self::IdResponse),
            0x17 => Some(Self::RequestRegularConnection),
            0x18 => Some(Self::RegularConnectionRequestAccepted),
            0x1B => Some(Self::Disconnect),
            0x1D => Some(Self::KeepAlive),
            _ => None,
        }
    }

    /// The 5-bit id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Whether the command belongs to the pairing handshake.
    pub fn is_pairing(self) -> bool {
        match self {
            Self::RequestPairingConnection
            | Self::PairingConnectionRequestAccepted
            | Self::KeyRequest
            | Self::GetAvailableKeys
            | Self::KeyResponse
            | Self::RequestId
            | Self::IdResponse => true,
            Self::Data
            | Self::AckResponse
            | Self::ErrorResponse
            | Self::RequestRegularConnection
            | Self::RegularConnectionRequestAccepted
            | Self::Disconnect
            | Self::KeepAlive => false,
        }
    }
}
