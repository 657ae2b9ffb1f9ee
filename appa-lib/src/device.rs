use crate::command::Command;
use crate::config::DataSource;
use crate::constants::{
    HANDSHAKE_TIMEOUT, READ_BLOCKING_TIMEOUT, READ_CHUNK_SIZE, STALE_FRAME_TIMEOUT, WRITE_BLOCKING_TIMEOUT,
};
use crate::display::{DisplayData, ReadDisplayResponse};
use crate::error::AppaError;
use crate::frame::Frame;
use crate::framer::{FrameReader, FrameResult};
use crate::info::DeviceIdentity;
use crate::message::{
    ReadMemoryRequest, Request, decode_read_display, decode_read_information, decode_read_memory, decode_read_protocol_version,
};
use crate::model::{ModelId, StorageFamily};
use crate::storage::{
    StorageInfo, StorageInfos, decode_storage_entries, decode_storage_info, encode_read_storage,
    storage_info_request,
};
use bytes::Bytes;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::transport::Transport;

/// Per-acquisition state owned by a session.
#[derive(Debug, Clone, Default)]
pub struct DeviceContext {
    pub identity: Option<DeviceIdentity>,
    pub data_source: DataSource,
    /// Layout of the store being replayed, `None` when live
    pub storage: Option<StorageInfo>,
    pub request_pending: bool,
    pub request_sent_at: Option<Instant>,
    pub error_counter: u32,
    /// Storage entries forwarded so far
    pub entries_read: u32,
    /// Storage page request awaiting its reply
    pub storage_request: Option<ReadMemoryRequest>,
    /// The page in flight was sent more than once
    pub storage_retried: bool,
    /// Replies arriving before this instant answer an abandoned request
    pub discard_until: Option<Instant>,
}

impl DeviceContext {
    pub fn model(&self) -> ModelId {
        self.identity.as_ref().map(|id| id.model_id).unwrap_or_default()
    }

    pub fn clear_pending(&mut self) {
        self.request_pending = false;
        self.request_sent_at = None;
    }

    pub fn set_pending(&mut self, now: Instant) {
        self.request_pending = true;
        self.request_sent_at = Some(now);
    }
}

/// Handle to one APPA meter on a byte transport.
pub struct AppaDmm<T: Transport> {
    transport: T,
    reader: FrameReader,
    backlog: VecDeque<Frame>,
    identity: Option<DeviceIdentity>,
}

impl<T: Transport> AppaDmm<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            reader: FrameReader::with_stale_timeout(STALE_FRAME_TIMEOUT),
            backlog: VecDeque::new(),
            identity: None,
        }
    }

    /// Identity from the last successful [`identify`](Self::identify).
    pub fn identity(&self) -> Option<&DeviceIdentity> {
        self.identity.as_ref()
    }

    pub fn model(&self) -> ModelId {
        self.identity.as_ref().map(|id| id.model_id).unwrap_or_default()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn send(&mut self, request: &Request) -> Result<(), AppaError> {
        let frame = request.to_frame();
        debug!(command = %frame.command(), "Sending request");
        self.transport.write_blocking(&frame.to_bytes(), WRITE_BLOCKING_TIMEOUT)
    }

    /// Non-blocking: everything the transport has buffered, as frames.
    ///
    /// Frames left over from a blocking exchange come first.
    pub fn poll_frames(&mut self) -> Result<Vec<FrameResult>, AppaError> {
        let mut results: Vec<FrameResult> = self.backlog.drain(..).map(Ok).collect();
        let mut buf = [0u8; READ_CHUNK_SIZE];
        let n = self.transport.read_nonblocking(&mut buf)?;
        if n > 0 {
            results.extend(self.reader.feed(&buf[..n]));
        }
        Ok(results)
    }

    /// Block until one valid frame arrives or `timeout` expires.
    ///
    /// Frames that fail the checksum are skipped.
    pub fn receive_frame(&mut self, timeout: Duration) -> Result<Frame, AppaError> {
        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; READ_CHUNK_SIZE];
        loop {
            if let Some(frame) = self.backlog.pop_front() {
                return Ok(frame);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(AppaError::Timeout("response frame"));
            }
            let slice = (deadline - now).min(READ_BLOCKING_TIMEOUT);
            let n = self.transport.read_blocking(&mut buf, slice)?;
            for result in self.reader.feed(&buf[..n]) {
                match result {
                    Ok(frame) => self.backlog.push_back(frame),
                    Err(e) => debug!("Skipping bad frame: {}", e),
                }
            }
        }
    }

    /// Send `request` and wait for the matching response frame.
    ///
    /// Frames for other commands are dropped; a Failure frame is returned so
    /// the decoder can report it.
    pub fn transact(&mut self, request: &Request, timeout: Duration) -> Result<Frame, AppaError> {
        self.send(request)?;
        let expected = request.command();
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let frame = self.receive_frame(remaining)?;
            if frame.command() == expected || frame.command() == Command::Failure {
                return Ok(frame);
            }
            debug!(
                expected = %expected,
                actual = %frame.command(),
                "Dropping unrelated frame"
            );
        }
    }

    /// Identification handshake.
    ///
    /// Flushes stale input, requests the device information and waits up to
    /// the handshake timeout for a well formed answer.
    pub fn identify(&mut self) -> Result<DeviceIdentity, AppaError> {
        self.transport.flush()?;
        self.reader.reset();
        self.backlog.clear();

        self.send(&Request::ReadInformation)?;
        let deadline = Instant::now() + HANDSHAKE_TIMEOUT;
        let response = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let frame = self.receive_frame(remaining)?;
            match decode_read_information(&frame) {
                Ok(response) => break response,
                Err(e) if e.is_data_error() => debug!("Ignoring frame during handshake: {}", e),
                Err(e) => return Err(e),
            }
        };

        let identity = DeviceIdentity::from(&response);
        if let ModelId::Unknown(id) = identity.model_id {
            warn!("Unknown model id 0x{:04x}, treating as single display meter", id);
        }
        if identity.model_id == ModelId::Invalid {
            warn!(model_id = response.model_id, "Device reported an invalid model");
            return Err(AppaError::UnsupportedModel(
                format!("0x{:04x}", response.model_id),
                "identification",
            ));
        }
        info!("{}", identity);
        self.identity = Some(identity.clone());
        Ok(identity)
    }

    pub fn read_display(&mut self) -> Result<ReadDisplayResponse, AppaError> {
        let frame = self.transact(&Request::ReadDisplay, HANDSHAKE_TIMEOUT)?;
        decode_read_display(&frame)
    }

    pub fn protocol_version(&mut self) -> Result<u32, AppaError> {
        let frame = self.transact(&Request::ReadProtocolVersion, HANDSHAKE_TIMEOUT)?;
        decode_read_protocol_version(&frame)
    }

    pub fn read_memory(&mut self, request: ReadMemoryRequest) -> Result<Bytes, AppaError> {
        let frame = self.transact(&Request::ReadMemory(request), HANDSHAKE_TIMEOUT)?;
        Ok(decode_read_memory(&frame)?.data)
    }

    /// Read and decode MEM/LOG metadata for the identified model.
    pub fn storage_info(&mut self) -> Result<StorageInfos, AppaError> {
        let model = self.model();
        if model == ModelId::Invalid {
            return Err(AppaError::InvalidConfig("device not identified".to_string()));
        }
        if model.storage_family() != StorageFamily::Series200500 {
            return Err(AppaError::UnsupportedModel(model.to_string(), "MEM/LOG replay"));
        }
        let data = self.read_memory(storage_info_request())?;
        decode_storage_info(model, &data)
    }

    /// Blocking read of up to `count` stored entries starting at `start`.
    pub fn read_storage(&mut self, info: &StorageInfo, start: u32, count: u32) -> Result<Vec<DisplayData>, AppaError> {
        let request = encode_read_storage(info, start, count)?;
        let data = self.read_memory(request)?;
        decode_storage_entries(info, &data)
    }
}
