//! Application layer services and commands.

use std::fmt;

/// Service an application command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServiceId {
    /// Connection control, binding and service management.
    Control = 0x00,
    /// Remote terminal: button presses, display frames.
    RtMode = 0x48,
    /// Direct command mode.
    CommandMode = 0xB7,
}

impl ServiceId {
    /// Parse a service id byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Control),
            0x48 => Some(Self::RtMode),
            0xB7 => Some(Self::CommandMode),
            _ => None,
        }
    }

    /// Byte representation.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Payload layout an application command requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// No payload.
    Empty,
    /// Exactly this many bytes.
    Exact(usize),
    /// At least this many bytes.
    AtLeast(usize),
}

impl PayloadShape {
    /// Whether a payload of `len` bytes fits this shape.
    pub fn accepts(self, len: usize) -> bool {
        match self {
            PayloadShape::Empty => len == 0,
            PayloadShape::Exact(n) => len == n,
            PayloadShape::AtLeast(n) => len >= n,
        }
    }
}

impl fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadShape::Empty => write!(f, "no payload"),
            PayloadShape::Exact(n) => write!(f, "exactly {n} bytes"),
            PayloadShape::AtLeast(n) => write!(f, "at least {n} bytes"),
        }
    }
}

/// Application layer command.
///
/// Closed set; every variant has a fixed service, id and payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationCommand {
    /// Start an application session (client serial).
    CtrlConnect,
    /// Pump accepted the application session.
    CtrlConnectResponse,
    /// Bind the client during pairing.
    CtrlBind,
    /// Pump confirmed the bind.
    CtrlBindResponse,
    /// Tell the pump to forget this client.
    CtrlUnbind,
    /// Pump confirmed the unbind.
    CtrlUnbindResponse,
    /// Activate a service (service id, major, minor).
    CtrlActivateService,
    /// Pump activated the service.
    CtrlActivateServiceResponse,
    /// Deactivate every service.
    CtrlDeactivateAllServices,
    /// Pump deactivated every service.
    CtrlDeactivateAllServicesResponse,
    /// End the application session.
    CtrlDisconnect,
    /// Control service error report.
    CtrlServiceError,
    /// RT: a button is pressed or released.
    RtButtonStatus,
    /// RT: pump confirms a button status.
    RtButtonConfirmation,
    /// RT: keep the RT session alive.
    RtKeepAlive,
    /// RT: a display frame row block.
    RtDisplay,
    /// RT: pump played a sound.
    RtAudio,
    /// RT: pump vibrated.
    RtVibration,
    /// RT: pump paused RT mode.
    RtPause,
    /// RT: pump released RT mode.
    RtRelease,
    /// RT service error report.
    RtErrorReport,
}

impl ApplicationCommand {
    /// Every command.
    pub const ALL: [ApplicationCommand; 21] = [
        Self::CtrlConnect,
        Self::CtrlConnectResponse,
        Self::CtrlBind,
        Self::CtrlBindResponse,
        Self::CtrlUnbind,
        Self::CtrlUnbindResponse,
        Self::CtrlActivateService,
        Self::CtrlActivateServiceResponse,
        Self::CtrlDeactivateAllServices,
        Self::CtrlDeactivateAllServicesResponse,
        Self::CtrlDisconnect,
        Self::CtrlServiceError,
        Self::RtButtonStatus,
        Self::RtButtonConfirmation,
        Self::RtKeepAlive,
        Self::RtDisplay,
        Self::RtAudio,
        Self::RtVibration,
        Self::RtPause,
        Self::RtRelease,
        Self::RtErrorReport,
    ];

    /// Service and command id.
    pub fn code(self) -> (ServiceId, u16) {
        use ServiceId::{Control, RtMode};
        match self {
            Self::CtrlConnect => (Control, 0x9055),
            Self::CtrlConnectResponse => (Control, 0xA055),
            Self::CtrlBind => (Control, 0x9095),
            Self::CtrlBindResponse => (Control, 0xA095),
            Self::CtrlUnbind => (Control, 0x9096),
            Self::CtrlUnbindResponse => (Control, 0xA096),
            Self::CtrlActivateService => (Control, 0x9066),
            Self::CtrlActivateServiceResponse => (Control, 0xA066),
            Self::CtrlDeactivateAllServices => (Control, 0x906A),
            Self::CtrlDeactivateAllServicesResponse => (Control, 0xA06A),
            Self::CtrlDisconnect => (Control, 0x005A),
            Self::CtrlServiceError => (Control, 0xAA00),
            Self::RtButtonStatus => (RtMode, 0x0565),
            Self::RtButtonConfirmation => (RtMode, 0x0566),
            Self::RtKeepAlive => (RtMode, 0x0562),
            Self::RtDisplay => (RtMode, 0x0555),
            Self::RtAudio => (RtMode, 0x0549),
            Self::RtVibration => (RtMode, 0x055A),
            Self::RtPause => (RtMode, 0x0569),
            Self::RtRelease => (RtMode, 0x0596),
            Self::RtErrorReport => (RtMode, 0x05AA),
        }
    }

    /// Look a command up by service and id.
    pub fn from_code(service: ServiceId, id: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == (service, id))
    }

    /// Service this command belongs to.
    pub fn service(self) -> ServiceId {
        self.code().0
    }

    /// Required payload shape.
    pub fn payload_shape(self) -> PayloadShape {
        use PayloadShape::{AtLeast, Empty, Exact};
        match self {
            Self::CtrlConnect => Exact(4),
            Self::CtrlConnectResponse => Empty,
            Self::CtrlBind => Exact(1),
            Self::CtrlBindResponse
            | Self::CtrlUnbind
            | Self::CtrlUnbindResponse => Empty,
            Self::CtrlActivateService => Exact(3),
            Self::CtrlActivateServiceResponse
            | Self::CtrlDeactivateAllServices
            | Self::CtrlDeactivateAllServicesResponse
            | Self::CtrlDisconnect => Empty,
            Self::CtrlServiceError | Self::RtErrorReport => Exact(2),
            Self::RtButtonStatus => Exact(4),
            Self::RtButtonConfirmation => Exact(3),
            Self::RtKeepAlive | Self::RtPause | Self::RtRelease => Exact(2),
            Self::RtDisplay => AtLeast(4),
            Self::RtAudio | Self::RtVibration => Exact(6),
        }
    }

    /// Whether the pump uses this command to report an error.
    pub fn is_error_report(self) -> bool {
        matches!(self, Self::CtrlServiceError | Self::RtErrorReport)
    }
}

impl fmt::Display for ApplicationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
