//! Application packet encoding and decoding.
//!
//! Wire format (carried as DATA plaintext):
//! ```text
//! +---------+---------+------------------+-----------+
//! | Version | Service | Command ID       | Payload   |
//! | 1 byte  | 1 byte  | 2 bytes (LE16)   | N bytes   |
//! +---------+---------+------------------+-----------+
//! ```

use crate::core::{APPLICATION_HEADER_SIZE, APPLICATION_VERSION};

use super::command::{ApplicationCommand, ServiceId};
use super::error::ApplicationError;

/// An application layer packet with a payload of the right shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationPacket {
    command: ApplicationCommand,
    payload: Vec<u8>,
}

impl ApplicationPacket {
    /// Create a packet, checking the payload shape.
    pub fn new(command: ApplicationCommand, payload: Vec<u8>) -> Result<Self, ApplicationError> {
        let expected = command.payload_shape();
        if !expected.accepts(payload.len()) {
            return Err(ApplicationError::PayloadShape {
                command,
                expected,
                actual: payload.len(),
            });
        }
        Ok(Self { command, payload })
    }

    pub(crate) fn from_parts_unchecked(command: ApplicationCommand, payload: Vec<u8>) -> Self {
        Self { command, payload }
    }

    /// Create a packet for a command without payload.
    pub fn empty(command: ApplicationCommand) -> Result<Self, ApplicationError> {
        Self::new(command, Vec::new())
    }

    /// The command.
    pub fn command(&self) -> ApplicationCommand {
        self.command
    }

    /// The payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the packet, returning command and payload.
    pub fn into_parts(self) -> (ApplicationCommand, Vec<u8>) {
        (self.command, self.payload)
    }

    /// Serialize to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let (service, id) = self.command.code();
        let mut buf = Vec::with_capacity(APPLICATION_HEADER_SIZE + self.payload.len());
        buf.push(APPLICATION_VERSION);
        buf.push(service.as_byte());
        buf.extend_from_slice(&id.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Parse bytes into a packet.
    ///
    /// Error report commands never decode to a packet; they surface as
    /// [`ApplicationError::PumpReported`] carrying the pump's code.
    pub fn decode(bytes: &[u8]) -> Result<Self, ApplicationError> {
        if bytes.len() < APPLICATION_HEADER_SIZE {
            return Err(ApplicationError::TooShort {
                expected: APPLICATION_HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        if bytes[0] != APPLICATION_VERSION {
            return Err(ApplicationError::UnsupportedVersion(bytes[0]));
        }
        let service =
            ServiceId::from_byte(bytes[1]).ok_or(ApplicationError::UnknownService(bytes[1]))?;
        let id = u16::from_le_bytes([bytes[2], bytes[3]]);
        let command = ApplicationCommand::from_code(service, id).ok_or(
            ApplicationError::UnknownCommand {
                service: bytes[1],
                id,
            },
        )?;

        let packet = Self::new(command, bytes[APPLICATION_HEADER_SIZE..].to_vec())?;
        if command.is_error_report() {
            let code = u16::from_le_bytes([packet.payload[0], packet.payload[1]]);
            return Err(ApplicationError::PumpReported { command, code });
        }
        Ok(packet)
    }
}
