use crate::codec::{ensure_remaining, read_u8, read_u16_le, write_u8, write_u16_le};
use crate::command::{Command, is_request_size_valid, is_response_size_valid, request_size};
use crate::display::{ReadDisplayRaw, ReadDisplayResponse};
use crate::error::AppaError;
use crate::frame::Frame;
use crate::info::{ReadInformationRaw, ReadInformationResponse};
use bytes::{Bytes, BytesMut};
use zerocopy::{FromBytes, IntoBytes};

/// Read Memory request: `{device_number: u8, memory_address: u16 LE, data_length: u8}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadMemoryRequest {
    pub device_number: u8,
    pub memory_address: u16,
    pub data_length: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadMemoryResponse {
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ReadInformation,
    ReadDisplay,
    ReadProtocolVersion,
    ReadMemory(ReadMemoryRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Information(ReadInformationResponse),
    Display(ReadDisplayResponse),
    /// Raw 32-bit protocol version word
    ProtocolVersion(u32),
    Memory(ReadMemoryResponse),
    Success,
    Failure { code: u8 },
    /// Valid frame for a command this library does not interpret
    Generic(Frame),
}

impl Request {
    pub fn command(&self) -> Command {
        match self {
            Request::ReadInformation => Command::ReadInformation,
            Request::ReadDisplay => Command::ReadDisplay,
            Request::ReadProtocolVersion => Command::ReadProtocolVersion,
            Request::ReadMemory(_) => Command::ReadMemory,
        }
    }

    pub fn to_frame(&self) -> Frame {
        match self {
            Request::ReadMemory(request) => {
                let mut payload = BytesMut::with_capacity(4);
                write_u8(&mut payload, request.device_number);
                write_u16_le(&mut payload, request.memory_address);
                write_u8(&mut payload, request.data_length);
                Frame::from_small_payload(Command::ReadMemory, payload.freeze())
            }
            other => Frame::empty(other.command()),
        }
    }
}

impl TryFrom<&Frame> for Request {
    type Error = AppaError;

    fn try_from(frame: &Frame) -> Result<Self, Self::Error> {
        let command = frame.command();
        if !is_request_size_valid(command, frame.payload_len()) {
            return Err(AppaError::InvalidLength {
                command: command.code(),
                length: frame.payload_len(),
            });
        }
        match command {
            Command::ReadInformation => Ok(Request::ReadInformation),
            Command::ReadDisplay => Ok(Request::ReadDisplay),
            Command::ReadProtocolVersion => Ok(Request::ReadProtocolVersion),
            Command::ReadMemory => {
                let mut buf = frame.payload().clone();
                ensure_remaining(&buf, request_size(Command::ReadMemory)?)?;
                Ok(Request::ReadMemory(ReadMemoryRequest {
                    device_number: read_u8(&mut buf),
                    memory_address: read_u16_le(&mut buf),
                    data_length: read_u8(&mut buf),
                }))
            }
            other => Err(AppaError::UnknownCommand(other.code())),
        }
    }
}

/// Check command and catalog size before a payload is parsed.
///
/// A Failure frame in place of the expected response is surfaced as
/// [`AppaError::DeviceFailure`].
pub fn expect_response(frame: &Frame, expected: Command) -> Result<&Bytes, AppaError> {
    let command = frame.command();
    if command == Command::Failure && expected != Command::Failure {
        let code = frame.payload().first().copied().unwrap_or(0);
        return Err(AppaError::DeviceFailure(code));
    }
    if command != expected {
        return Err(AppaError::UnexpectedCommand {
            expected: expected.code(),
            actual: command.code(),
        });
    }
    if !is_response_size_valid(command, frame.payload_len()) {
        return Err(AppaError::InvalidLength {
            command: command.code(),
            length: frame.payload_len(),
        });
    }
    Ok(frame.payload())
}

pub fn decode_read_information(frame: &Frame) -> Result<ReadInformationResponse, AppaError> {
    let payload = expect_response(frame, Command::ReadInformation)?;
    let raw = ReadInformationRaw::read_from_bytes(payload.as_ref())
        .map_err(|_| AppaError::InvalidFrame("Failed to parse information: incorrect size".to_string()))?;
    Ok(ReadInformationResponse::from(raw))
}

pub fn decode_read_display(frame: &Frame) -> Result<ReadDisplayResponse, AppaError> {
    let payload = expect_response(frame, Command::ReadDisplay)?;
    let raw = ReadDisplayRaw::read_from_bytes(payload.as_ref())
        .map_err(|_| AppaError::InvalidFrame("Failed to parse display data: incorrect size".to_string()))?;
    Ok(ReadDisplayResponse::from(raw))
}

pub fn decode_read_protocol_version(frame: &Frame) -> Result<u32, AppaError> {
    let payload = expect_response(frame, Command::ReadProtocolVersion)?;
    let bytes: [u8; 4] = payload.as_ref().try_into()?;
    Ok(u32::from_le_bytes(bytes))
}

pub fn decode_read_memory(frame: &Frame) -> Result<ReadMemoryResponse, AppaError> {
    let payload = expect_response(frame, Command::ReadMemory)?;
    Ok(ReadMemoryResponse { data: payload.clone() })
}

impl TryFrom<Frame> for Response {
    type Error = AppaError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        match frame.command() {
            Command::ReadInformation => Ok(Response::Information(decode_read_information(&frame)?)),
            Command::ReadDisplay => Ok(Response::Display(decode_read_display(&frame)?)),
            Command::ReadProtocolVersion => Ok(Response::ProtocolVersion(decode_read_protocol_version(&frame)?)),
            Command::ReadMemory => Ok(Response::Memory(decode_read_memory(&frame)?)),
            Command::Success => {
                expect_response(&frame, Command::Success)?;
                Ok(Response::Success)
            }
            Command::Failure => {
                let payload = expect_response(&frame, Command::Failure)?;
                Ok(Response::Failure { code: payload[0] })
            }
            command if command.is_response() => {
                expect_response(&frame, command)?;
                Ok(Response::Generic(frame))
            }
            command => Err(AppaError::UnknownCommand(command.code())),
        }
    }
}

impl Response {
    /// Encode as the meter would send it.
    pub fn to_frame(&self) -> Result<Frame, AppaError> {
        match self {
            Response::Information(info) => {
                let raw = ReadInformationRaw::from(info);
                Frame::new(Command::ReadInformation, Bytes::copy_from_slice(raw.as_bytes()))
            }
            Response::Display(display) => {
                let raw = ReadDisplayRaw::from(*display);
                Frame::new(Command::ReadDisplay, Bytes::copy_from_slice(raw.as_bytes()))
            }
            Response::ProtocolVersion(version) => {
                Frame::new(Command::ReadProtocolVersion, Bytes::copy_from_slice(&version.to_le_bytes()))
            }
            Response::Memory(memory) => Frame::new(Command::ReadMemory, memory.data.clone()),
            Response::Success => Ok(Frame::empty(Command::Success)),
            Response::Failure { code } => Frame::new(Command::Failure, Bytes::copy_from_slice(&[*code])),
            Response::Generic(frame) => Ok(frame.clone()),
        }
    }
}
