//! RT mode payloads.
//!
//! In RT mode the client simulates the pump's physical buttons. Every RT
//! packet starts with a 16-bit RT sequence number (LE16) that the sender
//! increments per packet; confirmations echo the sequence of the status
//! they confirm.

use std::fmt;

use crate::core::{RT_BUTTON_STATUS_CHANGED, RT_BUTTON_STATUS_UNCHANGED};

use super::command::ApplicationCommand;
use super::error::ApplicationError;
use super::packet::ApplicationPacket;

/// RT sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RtSequence(u16);

impl RtSequence {
    /// Create from a raw value.
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Raw value.
    pub const fn value(self) -> u16 {
        self.0
    }

    /// The following sequence number (wraps).
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    fn from_payload(payload: &[u8]) -> Self {
        Self(u16::from_le_bytes([payload[0], payload[1]]))
    }
}

impl fmt::Display for RtSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pump buttons (and chords) the client can assert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Button {
    /// All buttons released.
    NoButton = 0x0F,
    /// Menu.
    Menu = 0x03,
    /// Check (OK).
    Check = 0x0C,
    /// Up.
    Up = 0x30,
    /// Down.
    Down = 0xC0,
    /// Menu and up together (back).
    MenuUp = 0x33,
    /// Up and down together.
    UpDown = 0xF0,
}

impl Button {
    /// Parse a button code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x0F => Some(Self::NoButton),
            0x03 => Some(Self::Menu),
            0x0C => Some(Self::Check),
            0x30 => Some(Self::Up),
            0xC0 => Some(Self::Down),
            0x33 => Some(Self::MenuUp),
            0xF0 => Some(Self::UpDown),
            _ => None,
        }
    }

    /// Code on the wire.
    pub fn code(self) -> u8 {
        self as u8
    }
}

fn expect_command(
    packet: &ApplicationPacket,
    expected: ApplicationCommand,
) -> Result<(), ApplicationError> {
    if packet.command() != expected {
        return Err(ApplicationError::UnexpectedCommand {
            expected,
            actual: packet.command(),
        });
    }
    Ok(())
}

fn parse_button(code: u8) -> Result<Button, ApplicationError> {
    Button::from_code(code).ok_or(ApplicationError::UnknownButton(code))
}

/// `RtButtonStatus` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonStatus {
    /// RT sequence of this packet.
    pub sequence: RtSequence,
    /// Asserted button.
    pub button: Button,
    /// Whether the button state changed since the last status.
    pub changed: bool,
}

impl ButtonStatus {
    /// Build the application packet.
    pub fn to_packet(&self) -> ApplicationPacket {
        let seq = self.sequence.value().to_le_bytes();
        let changed = if self.changed {
            RT_BUTTON_STATUS_CHANGED
        } else {
            RT_BUTTON_STATUS_UNCHANGED
        };
        rt_packet(
            ApplicationCommand::RtButtonStatus,
            vec![seq[0], seq[1], self.button.code(), changed],
        )
    }

    /// Parse from an application packet.
    pub fn from_packet(packet: &ApplicationPacket) -> Result<Self, ApplicationError> {
        expect_command(packet, ApplicationCommand::RtButtonStatus)?;
        let payload = packet.payload();
        Ok(Self {
            sequence: RtSequence::from_payload(payload),
            button: parse_button(payload[2])?,
            changed: payload[3] == RT_BUTTON_STATUS_CHANGED,
        })
    }
}

/// `RtButtonConfirmation` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonConfirmation {
    /// RT sequence of the confirmed status.
    pub sequence: RtSequence,
    /// Confirmed button.
    pub button: Button,
}

impl ButtonConfirmation {
    /// Build the application packet.
    pub fn to_packet(&self) -> ApplicationPacket {
        let seq = self.sequence.value().to_le_bytes();
        rt_packet(
            ApplicationCommand::RtButtonConfirmation,
            vec![seq[0], seq[1], self.button.code()],
        )
    }

    /// Parse from an application packet.
    pub fn from_packet(packet: &ApplicationPacket) -> Result<Self, ApplicationError> {
        expect_command(packet, ApplicationCommand::RtButtonConfirmation)?;
        let payload = packet.payload();
        Ok(Self {
            sequence: RtSequence::from_payload(payload),
            button: parse_button(payload[2])?,
        })
    }

    /// Whether this confirms the given status.
    pub fn confirms(&self, sequence: RtSequence, button: Button) -> bool {
        self.sequence == sequence && self.button == button
    }
}

/// `RtDisplay` payload: one block of display rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayUpdate {
    /// RT sequence of this packet.
    pub sequence: RtSequence,
    /// Why the pump sent the update.
    pub reason: u8,
    /// Index of the row block.
    pub index: u8,
    /// Packed pixels.
    pub pixels: Vec<u8>,
}

impl DisplayUpdate {
    /// Parse from an application packet.
    pub fn from_packet(packet: &ApplicationPacket) -> Result<Self, ApplicationError> {
        expect_command(packet, ApplicationCommand::RtDisplay)?;
        let payload = packet.payload();
        Ok(Self {
            sequence: RtSequence::from_payload(payload),
            reason: payload[2],
            index: payload[3],
            pixels: payload[4..].to_vec(),
        })
    }
}

/// Build an `RtKeepAlive` packet.
pub fn keep_alive(sequence: RtSequence) -> ApplicationPacket {
    rt_packet(
        ApplicationCommand::RtKeepAlive,
        sequence.value().to_le_bytes().to_vec(),
    )
}

// Payload sizes here match the command table, so no shape check is needed.
fn rt_packet(command: ApplicationCommand, payload: Vec<u8>) -> ApplicationPacket {
    debug_assert!(command.payload_shape().accepts(payload.len()));
    ApplicationPacket::from_parts_unchecked(command, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_codes_roundtrip() {
        for button in [
            Button::NoButton,
            Button::Menu,
            Button::Check,
            Button::Up,
            Button::Down,
            Button::MenuUp,
            Button::UpDown,
        ] {
            assert_eq!(Button::from_code(button.code()), Some(button));
        }
        assert_eq!(Button::from_code(0x00), None);
    }

    #[test]
    fn test_button_status_payload() {
        let status = ButtonStatus {
            sequence: RtSequence::new(0x0102),
            button: Button::Check,
            changed: true,
        };
        let packet = status.to_packet();
        assert_eq!(packet.command(), ApplicationCommand::RtButtonStatus);
        assert_eq!(packet.payload(), &[0x02, 0x01, 0x0C, 0xB7]);
        assert_eq!(ButtonStatus::from_packet(&packet).unwrap(), status);

        let unchanged = ButtonStatus {
            changed: false,
            ..status
        };
        assert_eq!(unchanged.to_packet().payload()[3], 0x48);
    }

    #[test]
    fn test_button_confirmation_matching() {
        let confirmation = ButtonConfirmation {
            sequence: RtSequence::new(7),
            button: Button::Up,
        };
        let parsed = ButtonConfirmation::from_packet(&confirmation.to_packet()).unwrap();
        assert!(parsed.confirms(RtSequence::new(7), Button::Up));
        assert!(!parsed.confirms(RtSequence::new(8), Button::Up));
        assert!(!parsed.confirms(RtSequence::new(7), Button::Down));
    }

    #[test]
    fn test_parse_with_wrong_command() {
        let packet = keep_alive(RtSequence::new(1));
        assert_eq!(
            ButtonConfirmation::from_packet(&packet),
            Err(ApplicationError::UnexpectedCommand {
                expected: ApplicationCommand::RtButtonConfirmation,
                actual: ApplicationCommand::RtKeepAlive,
            })
        );
    }

    #[test]
    fn test_unknown_button_in_confirmation() {
        let packet =
            ApplicationPacket::new(ApplicationCommand::RtButtonConfirmation, vec![1, 0, 0x99])
                .unwrap();
        assert_eq!(
            ButtonConfirmation::from_packet(&packet),
            Err(ApplicationError::UnknownButton(0x99))
        );
    }

    #[test]
    fn test_display_update() {
        let mut payload = vec![0x05, 0x00, 0x01, 0x02];
        payload.extend_from_slice(&[0xFF; 96]);
        let packet = ApplicationPacket::new(ApplicationCommand::RtDisplay, payload).unwrap();
        let update = DisplayUpdate::from_packet(&packet).unwrap();
        assert_eq!(update.sequence, RtSequence::new(5));
        assert_eq!(update.reason, 1);
        assert_eq!(update.index, 2);
        assert_eq!(update.pixels.len(), 96);
    }

    #[test]
    fn test_sequence_wraps() {
        assert_eq!(RtSequence::new(u16::MAX).next(), RtSequence::new(0));
    }
}
