//! Common test utilities and shared imports

// Shared by several test files; not every helper is used in each
#![allow(dead_code)]
#![allow(unused_imports)]

pub use appa_lib::command::Command;
pub use appa_lib::display::{DataContent, DisplayData, Dot, FunctionCode, ReadDisplayResponse, Unit};
pub use appa_lib::error::AppaError;
pub use appa_lib::frame::Frame;
pub use appa_lib::info::ReadInformationResponse;
pub use appa_lib::message::{Request, Response};
pub use appa_lib::sink::{ChannelSample, SinkEvent};
pub use appa_lib::transport::Transport;
pub use bytes::Bytes;
pub use hex;

use std::collections::VecDeque;
use std::time::Duration;

/// Decode hex string to bytes for testing
pub fn hex_to_bytes(hex_data: &str) -> Bytes {
    Bytes::from(hex::decode(hex_data).expect("Failed to decode hex"))
}

/// Encode a complete wire frame
pub fn frame_bytes(command: Command, payload: &[u8]) -> Vec<u8> {
    Frame::new(command, Bytes::copy_from_slice(payload))
        .expect("payload too large")
        .to_bytes()
        .to_vec()
}

pub fn reading(value: i32, dot: Dot, unit: Unit) -> DisplayData {
    DisplayData {
        reading: value,
        dot,
        unit,
        data_content: DataContent::MeasuringData,
        overload: false,
    }
}

pub fn display_frame(function_code: FunctionCode, primary: DisplayData, secondary: DisplayData) -> Vec<u8> {
    let response = Response::Display(ReadDisplayResponse {
        function_code,
        auto_test: false,
        range_code: 0,
        auto_range: true,
        primary,
        secondary,
    });
    response.to_frame().expect("display frame").to_bytes().to_vec()
}

pub fn information_frame(model_name: &str, model_id: u16) -> Vec<u8> {
    let response = Response::Information(ReadInformationResponse {
        model_name: model_name.to_string(),
        serial_number: "12345678".to_string(),
        model_id,
        firmware_version: 100,
    });
    response.to_frame().expect("information frame").to_bytes().to_vec()
}

pub fn memory_frame(data: &[u8]) -> Vec<u8> {
    frame_bytes(Command::ReadMemory, data)
}

/// Five byte storage record as the meter stores it.
pub fn storage_entry(value: i32, dot: Dot, unit: Unit) -> Vec<u8> {
    let le = value.to_le_bytes();
    let dot: u8 = dot.into();
    let unit: u8 = unit.into();
    vec![le[0], le[1], le[2], (unit << 3) | dot, 0x00]
}

type Responder = Box<dyn FnMut(&Frame) -> Option<Vec<u8>>>;

/// In-memory meter: answers every written request through `responder`
/// and hands the bytes back `chunk_size` at a time.
pub struct ScriptedTransport {
    pub inbound: VecDeque<u8>,
    pub written: Vec<Frame>,
    pub chunk_size: usize,
    responder: Responder,
}

impl ScriptedTransport {
    pub fn new(responder: impl FnMut(&Frame) -> Option<Vec<u8>> + 'static) -> Self {
        Self {
            inbound: VecDeque::new(),
            written: Vec::new(),
            chunk_size: usize::MAX,
            responder: Box::new(responder),
        }
    }

    /// Transport that never answers; bytes are queued by the test.
    pub fn silent() -> Self {
        Self::new(|_| None)
    }

    pub fn queue(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    pub fn written_commands(&self) -> Vec<Command> {
        self.written.iter().map(Frame::command).collect()
    }

    fn drain_into(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.chunk_size).min(self.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..n)) {
            *slot = byte;
        }
        n
    }
}

impl Transport for ScriptedTransport {
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, AppaError> {
        Ok(self.drain_into(buf))
    }

    fn read_blocking(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, AppaError> {
        if self.inbound.is_empty() {
            return Err(AppaError::Timeout("scripted read"));
        }
        Ok(self.drain_into(buf))
    }

    fn write_blocking(&mut self, data: &[u8], _timeout: Duration) -> Result<(), AppaError> {
        let frame = Frame::try_from(Bytes::copy_from_slice(data))?;
        if let Some(reply) = (self.responder)(&frame) {
            self.inbound.extend(reply);
        }
        self.written.push(frame);
        Ok(())
    }
}

/// Meter that answers identification and display requests.
pub fn live_meter(model_name: &'static str, model_id: u16, display: Vec<u8>) -> ScriptedTransport {
    ScriptedTransport::new(move |frame| match frame.command() {
        Command::ReadInformation => Some(information_frame(model_name, model_id)),
        Command::ReadDisplay => Some(display.clone()),
        _ => None,
    })
}

pub fn samples(events: &[SinkEvent]) -> Vec<ChannelSample> {
    events
        .iter()
        .filter_map(|event| match event {
            SinkEvent::Sample(sample) => Some(*sample),
            _ => None,
        })
        .collect()
}
