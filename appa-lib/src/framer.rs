//! Resynchronizing frame reader for the serial byte stream.
//!
//! The meter link carries no delimiters beyond the `55 55` start marker, so
//! the reader walks a small state machine per byte. Anything that cannot be
//! the start of a valid response frame is dropped and scanning resumes with
//! the next marker. State survives between calls, so frames split across
//! any number of reads are reassembled.

use crate::command::{Command, is_response_size_valid};
use crate::constants::{FRAME_CHECKSUM_SIZE, FRAME_HEADER_SIZE, FRAME_MAX_SIZE, FRAME_START_BYTE};
use crate::error::AppaError;
use crate::frame::Frame;
use bytes::{BufMut, BytesMut};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

pub type FrameResult = Result<Frame, AppaError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing buffered, waiting for the first marker byte
    Seeking,
    /// One marker byte buffered
    Seeking2,
    /// Both marker bytes buffered, next byte is the command
    CommandByte,
    /// Header up to command buffered, next byte is the payload length
    LengthByte { command: Command },
    /// Collecting payload and checksum until `expected` bytes are buffered
    Accumulating { expected: usize },
}

#[derive(Debug)]
pub struct FrameReader {
    state: State,
    buffer: BytesMut,
    stale_timeout: Option<Duration>,
    last_progress: Option<Instant>,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReader {
    pub fn new() -> Self {
        Self {
            state: State::Seeking,
            buffer: BytesMut::with_capacity(FRAME_MAX_SIZE),
            stale_timeout: None,
            last_progress: None,
        }
    }

    /// Discard a partial frame that has not grown for longer than `timeout`.
    pub fn with_stale_timeout(timeout: Duration) -> Self {
        Self {
            stale_timeout: Some(timeout),
            ..Self::new()
        }
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = State::Seeking;
    }

    /// True when no partial frame is held.
    pub fn is_idle(&self) -> bool {
        self.state == State::Seeking
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Consume one chunk and return every frame completed by it, in order.
    ///
    /// Once a marker pair has been seen, an unknown command, an invalid length
    /// or a checksum failure is reported as an `Err` item. After a checksum
    /// failure the bytes of the rejected frame are scanned again for the
    /// next marker.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<FrameResult> {
        self.feed_at(chunk, Instant::now())
    }

    /// [`feed`](Self::feed) with an explicit clock, for staleness handling.
    pub fn feed_at(&mut self, chunk: &[u8], now: Instant) -> Vec<FrameResult> {
        if let (Some(timeout), Some(last)) = (self.stale_timeout, self.last_progress) {
            if !self.is_idle() && now.saturating_duration_since(last) > timeout {
                debug!(
                    buffered = self.buffer.len(),
                    "Dropping stale partial frame: {}",
                    hex::encode(&self.buffer)
                );
                self.reset();
            }
        }
        if !chunk.is_empty() {
            self.last_progress = Some(now);
        }

        let mut frames = Vec::new();
        for &byte in chunk {
            self.push(byte, &mut frames);
        }
        frames
    }

    fn push(&mut self, byte: u8, out: &mut Vec<FrameResult>) {
        match self.state {
            State::Seeking => {
                if byte == FRAME_START_BYTE {
                    self.buffer.put_u8(byte);
                    self.state = State::Seeking2;
                }
            }
            State::Seeking2 => {
                if byte == FRAME_START_BYTE {
                    self.buffer.put_u8(byte);
                    self.state = State::CommandByte;
                } else {
                    self.reset();
                }
            }
            State::CommandByte => {
                let command = Command::from(byte);
                if command.is_response() {
                    self.buffer.put_u8(byte);
                    self.state = State::LengthByte { command };
                } else if byte != FRAME_START_BYTE {
                    // a third marker byte keeps the last two as the marker
                    trace!("Discarding frame with command 0x{:02x}", byte);
                    self.reset();
                    out.push(Err(AppaError::UnknownCommand(byte)));
                }
            }
            State::LengthByte { command } => {
                let length = byte as usize;
                if is_response_size_valid(command, length) {
                    self.buffer.put_u8(byte);
                    self.state = State::Accumulating {
                        expected: FRAME_HEADER_SIZE + length + FRAME_CHECKSUM_SIZE,
                    };
                } else {
                    debug!(%command, length, "Discarding frame with invalid length");
                    self.reset();
                    out.push(Err(AppaError::InvalidLength {
                        command: command.code(),
                        length,
                    }));
                    // a lost length byte leaves the next marker here
                    self.push(byte, out);
                }
            }
            State::Accumulating { expected } => {
                self.buffer.put_u8(byte);
                if self.buffer.len() > FRAME_MAX_SIZE {
                    warn!("Frame buffer overflow, resynchronizing");
                    self.reset();
                    return;
                }
                if self.buffer.len() < expected {
                    return;
                }

                let raw = self.buffer.split().freeze();
                self.state = State::Seeking;
                match Frame::try_from(raw.clone()) {
                    Ok(frame) => {
                        debug!(command = %frame.command(), "Received frame: {}", hex::encode(&raw));
                        out.push(Ok(frame));
                    }
                    Err(e) => {
                        debug!("Rejected frame {}: {}", hex::encode(&raw), e);
                        out.push(Err(e));
                        // a corrupted length byte may have swallowed the next marker
                        for &b in &raw[1..] {
                            self.push(b, out);
                        }
                    }
                }
            }
        }
    }
}
