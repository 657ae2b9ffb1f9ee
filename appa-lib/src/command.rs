//! Command codes and the payload size catalog.

use crate::constants::FRAME_MAX_DATA_SIZE;
use crate::error::AppaError;
use num_enum::{FromPrimitive, IntoPrimitive};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, FromPrimitive, Display)]
#[repr(u8)]
pub enum Command {
    ReadInformation = 0x00,
    ReadDisplay = 0x01,
    ReadProtocolVersion = 0x03,
    ReadBatteryLife = 0x04,
    WriteUartConfiguration = 0x05,
    CalReading = 0x10,
    ReadMemory = 0x1a,
    ReadHarmonicsData = 0x1b,

    // Generic responses
    Failure = 0x70,
    Success = 0x7f,

    // Calibration
    CalEnter = 0x80,
    CalWriteFunctionCode = 0x85,
    CalWriteRangeCode = 0x87,
    CalWriteMemory = 0x8a,
    CalExit = 0x8f,

    // Firmware upgrade
    OtaEnter = 0xa0,
    OtaSendInformation = 0xa1,
    OtaSendFirmwarePackage = 0xa2,
    OtaStartUpgradeProcedure = 0xa3,

    #[num_enum(catch_all)]
    Unknown(u8),
}

impl Command {
    pub fn code(self) -> u8 {
        self.into()
    }

    /// Commands whose payload length varies up to the catalog maximum.
    fn has_variable_request(self) -> bool {
        matches!(
            self,
            Command::ReadMemory | Command::CalWriteMemory | Command::OtaSendFirmwarePackage
        )
    }

    fn has_variable_response(self) -> bool {
        matches!(self, Command::ReadMemory)
    }

    /// True for every command a meter may legitimately send back.
    pub fn is_response(self) -> bool {
        response_size(self).is_ok()
    }
}

/// Request payload size; for variable commands this is the maximum.
pub fn request_size(command: Command) -> Result<usize, AppaError> {
    let size = match command {
        Command::ReadInformation => 0,
        Command::ReadDisplay => 0,
        Command::ReadProtocolVersion => 0,
        Command::ReadBatteryLife => 0,
        Command::WriteUartConfiguration => 1,
        Command::CalReading => 0,
        Command::ReadMemory => 4,
        Command::ReadHarmonicsData => 0,
        Command::CalEnter => 0,
        Command::CalWriteFunctionCode => 1,
        Command::CalWriteRangeCode => 1,
        Command::CalWriteMemory => FRAME_MAX_DATA_SIZE,
        Command::CalExit => 0,
        Command::OtaEnter => 0,
        Command::OtaSendInformation => 13,
        Command::OtaSendFirmwarePackage => FRAME_MAX_DATA_SIZE,
        Command::OtaStartUpgradeProcedure => 1,
        Command::Failure | Command::Success | Command::Unknown(_) => {
            return Err(AppaError::UnknownCommand(command.code()));
        }
    };
    Ok(size)
}

/// Response payload size; for Read Memory this is the maximum.
pub fn response_size(command: Command) -> Result<usize, AppaError> {
    let size = match command {
        Command::ReadInformation => 52,
        Command::ReadDisplay => 12,
        Command::ReadProtocolVersion => 4,
        Command::ReadBatteryLife => 4,
        Command::CalReading => 23,
        Command::ReadMemory => FRAME_MAX_DATA_SIZE,
        Command::ReadHarmonicsData => 50,
        Command::Failure => 1,
        Command::Success => 0,
        Command::WriteUartConfiguration
        | Command::CalEnter
        | Command::CalWriteFunctionCode
        | Command::CalWriteRangeCode
        | Command::CalWriteMemory
        | Command::CalExit
        | Command::OtaEnter
        | Command::OtaSendInformation
        | Command::OtaSendFirmwarePackage
        | Command::OtaStartUpgradeProcedure
        | Command::Unknown(_) => {
            return Err(AppaError::UnknownCommand(command.code()));
        }
    };
    Ok(size)
}

pub fn is_request_size_valid(command: Command, length: usize) -> bool {
    match request_size(command) {
        Ok(max) if command.has_variable_request() => length <= max,
        Ok(size) => length == size,
        Err(_) => false,
    }
}

pub fn is_response_size_valid(command: Command, length: usize) -> bool {
    match response_size(command) {
        Ok(max) if command.has_variable_response() => length <= max,
        Ok(size) => length == size,
        Err(_) => false,
    }
}
