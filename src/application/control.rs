//! Control service payloads.

use super::command::{ApplicationCommand, ServiceId};
use super::packet::ApplicationPacket;

/// `CtrlConnect` carrying the client serial.
pub fn connect(client_serial: u32) -> ApplicationPacket {
    ApplicationPacket::from_parts_unchecked(
        ApplicationCommand::CtrlConnect,
        client_serial.to_le_bytes().to_vec(),
    )
}

/// `CtrlActivateService` for a service at the given version.
pub fn activate_service(service: ServiceId, major: u8, minor: u8) -> ApplicationPacket {
    ApplicationPacket::from_parts_unchecked(
        ApplicationCommand::CtrlActivateService,
        vec![service.as_byte(), major, minor],
    )
}

/// `CtrlDisconnect`.
pub fn disconnect() -> ApplicationPacket {
    ApplicationPacket::from_parts_unchecked(ApplicationCommand::CtrlDisconnect, Vec::new())
}

/// `CtrlUnbind`: tells the pump to forget this client.
pub fn unbind() -> ApplicationPacket {
    ApplicationPacket::from_parts_unchecked(ApplicationCommand::CtrlUnbind, Vec::new())
}

/// Empty response to a control request, as the pump sends it.
///
/// Returns `None` if `command` is not an empty-payload control command.
pub fn response(command: ApplicationCommand) -> Option<ApplicationPacket> {
    ApplicationPacket::empty(command)
        .ok()
        .filter(|packet| packet.command().service() == ServiceId::Control)
}

/// An error report (`CtrlServiceError` or `RtErrorReport`) with the given code.
///
/// Returns `None` for commands that are not error reports.
pub fn error_report(command: ApplicationCommand, code: u16) -> Option<ApplicationPacket> {
    command
        .is_error_report()
        .then(|| ApplicationPacket::from_parts_unchecked(command, code.to_le_bytes().to_vec()))
}

/// Read the client serial from a `CtrlConnect` packet.
pub fn client_serial(packet: &ApplicationPacket) -> Option<u32> {
    if packet.command() != ApplicationCommand::CtrlConnect {
        return None;
    }
    let bytes: [u8; 4] = packet.payload().get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationError;

    #[test]
    fn test_connect_serial() {
        let packet = connect(0xDEAD_BEEF);
        assert_eq!(packet.payload(), &[0xEF, 0xBE, 0xAD, 0xDE]);
        assert_eq!(client_serial(&packet), Some(0xDEAD_BEEF));
        assert_eq!(
            client_serial(&activate_service(ServiceId::RtMode, 1, 0)),
            None
        );
    }

    #[test]
    fn test_activate_service_decodes() {
        let packet = activate_service(ServiceId::RtMode, 1, 0);
        let decoded = ApplicationPacket::decode(&packet.encode()).unwrap();
        assert_eq!(decoded.payload(), &[0x48, 1, 0]);
    }

    #[test]
    fn test_empty_control_packets() {
        assert_eq!(disconnect().encode(), vec![0x10, 0x00, 0x5A, 0x00]);
        assert_eq!(unbind().encode(), vec![0x10, 0x00, 0x96, 0x90]);
        assert!(response(ApplicationCommand::CtrlConnectResponse).is_some());
        assert!(response(ApplicationCommand::CtrlConnect).is_none());
        assert!(response(ApplicationCommand::RtKeepAlive).is_none());
    }

    #[test]
    fn test_error_report_only_for_report_commands() {
        assert!(error_report(ApplicationCommand::RtKeepAlive, 1).is_none());
        let report = error_report(ApplicationCommand::RtErrorReport, 0x0102).unwrap();
        assert_eq!(
            ApplicationPacket::decode(&report.encode()),
            Err(ApplicationError::PumpReported {
                command: ApplicationCommand::RtErrorReport,
                code: 0x0102,
            })
        );
    }
}
