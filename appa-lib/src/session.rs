//! Poll-driven acquisition loop.
//!
//! Each call to [`Session::poll`] drains whatever the transport has
//! buffered, forwards complete frames to the sink, keeps one request in
//! flight and reports whether acquisition should continue. Nothing blocks
//! except the bounded request write.

use crate::config::DataSource;
use crate::constants::{RESPONSE_TIMEOUT, STORAGE_ERROR_LIMIT};
use crate::device::{AppaDmm, DeviceContext};
use crate::display::{DisplayData, FunctionCode, ReadDisplayResponse};
use crate::error::AppaError;
use crate::frame::Frame;
use crate::limits::Limits;
use crate::measurement::{Measurement, interpret};
use crate::message::{ReadMemoryRequest, Request, decode_read_display, decode_read_memory};
use crate::model::ChannelRole;
use crate::sink::{ChannelSample, SessionSink, SinkEvent};
use crate::storage::{StorageInfo, decode_storage_entries, encode_read_storage};
use crate::transport::Transport;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Whether the caller should keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    Continue,
    Stop,
}

pub struct Session<T: Transport, L: Limits> {
    dmm: AppaDmm<T>,
    limits: L,
    context: DeviceContext,
    response_timeout: Duration,
}

impl<T: Transport, L: Limits> Session<T, L> {
    /// Build a session for an identified meter.
    ///
    /// Storage sources read the MEM/LOG metadata here, so an unsupported
    /// model fails before acquisition starts.
    pub fn new(mut dmm: AppaDmm<T>, data_source: DataSource, limits: L) -> Result<Self, AppaError> {
        let identity = dmm
            .identity()
            .cloned()
            .ok_or_else(|| AppaError::InvalidConfig("device not identified".to_string()))?;

        let storage = match data_source.storage_kind() {
            Some(kind) => {
                let infos = dmm.storage_info()?;
                let info = *infos.get(kind);
                info!(
                    "{} storage: {} entries, rate {} s",
                    kind, info.amount, info.rate
                );
                Some(info)
            }
            None => None,
        };

        Ok(Self {
            dmm,
            limits,
            context: DeviceContext {
                identity: Some(identity),
                data_source,
                storage,
                ..DeviceContext::default()
            },
            response_timeout: RESPONSE_TIMEOUT,
        })
    }

    /// How long a request may go unanswered before it is sent again.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn context(&self) -> &DeviceContext {
        &self.context
    }

    pub fn limits(&self) -> &L {
        &self.limits
    }

    pub fn device_mut(&mut self) -> &mut AppaDmm<T> {
        &mut self.dmm
    }

    pub fn into_device(self) -> AppaDmm<T> {
        self.dmm
    }

    pub fn start(&mut self) {
        self.limits.start();
        self.context.clear_pending();
        self.context.error_counter = 0;
        self.context.entries_read = 0;
        self.context.storage_request = None;
        self.context.storage_retried = false;
        self.context.discard_until = None;
        info!(source = %self.context.data_source, "Acquisition started");
    }

    /// Run one acquisition step.
    pub fn poll(&mut self, sink: &mut dyn SessionSink) -> Result<PollStatus, AppaError> {
        match self.context.data_source {
            DataSource::Live => self.poll_live(sink),
            DataSource::Mem | DataSource::Log => self.poll_storage(sink),
        }
    }

    fn poll_live(&mut self, sink: &mut dyn SessionSink) -> Result<PollStatus, AppaError> {
        for result in self.dmm.poll_frames()? {
            match result.and_then(|frame| decode_read_display(&frame)) {
                Ok(response) => {
                    self.emit_display(&response, sink);
                    self.context.clear_pending();
                }
                Err(e) => debug!("Dropping frame: {}", e),
            }
        }

        self.resend_if_stale();
        if !self.context.request_pending {
            self.dmm.send(&Request::ReadDisplay)?;
            self.context.set_pending(Instant::now());
        }

        Ok(self.status())
    }

    /// Storage replay.
    ///
    /// Read Memory replies carry no address, so at most one page request is
    /// in flight. When a request had to be sent again, a reply to the
    /// abandoned copy may still arrive after the accepted one; replies are
    /// dropped for one response timeout before the next page is requested.
    fn poll_storage(&mut self, sink: &mut dyn SessionSink) -> Result<PollStatus, AppaError> {
        let Some(info) = self.context.storage else {
            return Err(AppaError::InvalidConfig("storage layout not loaded".to_string()));
        };
        let total = info.stored_entries();

        for result in self.dmm.poll_frames()? {
            let Some(request) = self.context.storage_request else {
                debug!("Dropping storage reply with no request in flight");
                continue;
            };
            match result.and_then(|frame| decode_storage_reply(&info, &request, &frame)) {
                Ok(entries) => {
                    self.accept_storage_reply();
                    for entry in entries {
                        if self.context.entries_read >= total {
                            break;
                        }
                        self.context.entries_read += 1;
                        self.emit_storage_entry(&entry, self.context.entries_read, sink);
                        if self.limits.limit_reached() {
                            return Ok(PollStatus::Stop);
                        }
                    }
                }
                Err(e) => self.storage_error(e)?,
            }
        }

        if self.context.entries_read >= total {
            info!(entries = self.context.entries_read, "Storage replay complete");
            return Ok(PollStatus::Stop);
        }

        let now = Instant::now();
        if let Some(until) = self.context.discard_until {
            if now < until {
                return Ok(self.status());
            }
            self.context.discard_until = None;
        }

        if self.request_timed_out(now) {
            self.storage_error(AppaError::Timeout("storage read"))?;
        }
        if !self.context.request_pending {
            let remaining = total - self.context.entries_read;
            let request = encode_read_storage(&info, self.context.entries_read, remaining)?;
            self.dmm.send(&Request::ReadMemory(request))?;
            self.context.set_pending(now);
            self.context.storage_request = Some(request);
        }

        Ok(self.status())
    }

    fn accept_storage_reply(&mut self) {
        self.context.error_counter = self.context.error_counter.saturating_sub(1);
        self.context.clear_pending();
        self.context.storage_request = None;
        if std::mem::take(&mut self.context.storage_retried) {
            self.context.discard_until = Some(Instant::now() + self.response_timeout);
        }
    }

    /// Count a failed page read and give the request up, aborting once the
    /// error limit is exceeded.
    fn storage_error(&mut self, e: AppaError) -> Result<(), AppaError> {
        warn!("Storage read failed: {}", e);
        if self.context.error_counter > STORAGE_ERROR_LIMIT {
            error!("Too many storage read errors, aborting");
            return Err(e);
        }
        self.context.error_counter += 1;
        self.context.clear_pending();
        self.context.storage_request = None;
        self.context.storage_retried = true;
        Ok(())
    }

    fn request_timed_out(&self, now: Instant) -> bool {
        self.context.request_pending
            && self
                .context
                .request_sent_at
                .is_some_and(|sent| now.saturating_duration_since(sent) > self.response_timeout)
    }

    fn resend_if_stale(&mut self) {
        if self.request_timed_out(Instant::now()) {
            debug!("No response to last request, sending again");
            self.context.clear_pending();
        }
    }

    fn status(&self) -> PollStatus {
        if self.limits.limit_reached() {
            PollStatus::Stop
        } else {
            PollStatus::Continue
        }
    }

    fn emit_sample(&mut self, role: ChannelRole, measurement: Measurement, sink: &mut dyn SessionSink) {
        sink.send(SinkEvent::Sample(ChannelSample {
            channel: role,
            measurement,
        }));
        self.limits.on_samples_read(1);
    }

    fn emit_reading(
        &mut self,
        data: &DisplayData,
        function_code: FunctionCode,
        auto_range: bool,
        role: ChannelRole,
        sink: &mut dyn SessionSink,
    ) {
        let reading = interpret(data, function_code, auto_range, role);
        if let Some(status) = reading.status() {
            status.log(role);
        }
        self.emit_sample(role, reading.measurement(), sink);
    }

    fn emit_display(&mut self, response: &ReadDisplayResponse, sink: &mut dyn SessionSink) {
        sink.send(SinkEvent::FrameBegin);
        self.emit_reading(
            &response.primary,
            response.function_code,
            response.auto_range,
            ChannelRole::Primary,
            sink,
        );
        if self.context.model().has_secondary_display() {
            self.emit_reading(
                &response.secondary,
                response.function_code,
                response.auto_range,
                ChannelRole::Secondary,
                sink,
            );
        }
        sink.send(SinkEvent::FrameEnd);
        self.limits.on_frame();
    }

    fn emit_storage_entry(&mut self, entry: &DisplayData, number: u32, sink: &mut dyn SessionSink) {
        sink.send(SinkEvent::FrameBegin);
        self.emit_reading(entry, FunctionCode::None, false, ChannelRole::Primary, sink);
        if self.context.model().supports_channel(ChannelRole::SampleIndex) {
            self.emit_sample(ChannelRole::SampleIndex, Measurement::sample_index(number), sink);
        }
        sink.send(SinkEvent::FrameEnd);
        self.limits.on_frame();
    }
}

/// Decode a Read Memory reply for `request`, rejecting one of the wrong size.
fn decode_storage_reply(
    info: &StorageInfo,
    request: &ReadMemoryRequest,
    frame: &Frame,
) -> Result<Vec<DisplayData>, AppaError> {
    let memory = decode_read_memory(frame)?;
    if memory.data.len() != request.data_length as usize {
        return Err(AppaError::InvalidLength {
            command: frame.command().code(),
            length: memory.data.len(),
        });
    }
    decode_storage_entries(info, &memory.data)
}
