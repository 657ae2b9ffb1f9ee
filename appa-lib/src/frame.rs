use crate::codec::checksum;
use crate::command::Command;
use crate::constants::{FRAME_CHECKSUM_SIZE, FRAME_HEADER_SIZE, FRAME_MAX_DATA_SIZE, FRAME_START_BYTE};
use crate::error::AppaError;
use bytes::{BufMut, Bytes, BytesMut};

/// One protocol message: `55 55 <command> <length> <payload..> <checksum>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: Command,
    payload: Bytes,
}

impl Frame {
    pub fn new(command: Command, payload: impl Into<Bytes>) -> Result<Self, AppaError> {
        let payload = payload.into();
        if payload.len() > FRAME_MAX_DATA_SIZE {
            return Err(AppaError::InvalidLength {
                command: command.code(),
                length: payload.len(),
            });
        }
        Ok(Self { command, payload })
    }

    /// Frame without payload, used by all plain read requests.
    pub fn empty(command: Command) -> Self {
        Self {
            command,
            payload: Bytes::new(),
        }
    }

    /// For payloads built inside the crate, which never exceed the limit.
    pub(crate) fn from_small_payload(command: Command, payload: Bytes) -> Self {
        debug_assert!(payload.len() <= FRAME_MAX_DATA_SIZE);
        Self { command, payload }
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    fn header(&self) -> [u8; FRAME_HEADER_SIZE] {
        [
            FRAME_START_BYTE,
            FRAME_START_BYTE,
            self.command.code(),
            self.payload.len() as u8,
        ]
    }

    /// Checksum over header and payload as it appears on the wire.
    pub fn checksum(&self) -> u8 {
        self.payload
            .iter()
            .fold(checksum(&self.header()), |acc, b| acc.wrapping_add(*b))
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(FRAME_HEADER_SIZE + self.payload.len() + FRAME_CHECKSUM_SIZE);
        out.put_slice(&self.header());
        out.put_slice(&self.payload);
        out.put_u8(self.checksum());
        out.freeze()
    }
}

impl TryFrom<Bytes> for Frame {
    type Error = AppaError;

    /// Parse one complete wire frame. Catalog sizes are checked by the
    /// command codec, not here.
    fn try_from(mut bytes: Bytes) -> Result<Self, Self::Error> {
        let min = FRAME_HEADER_SIZE + FRAME_CHECKSUM_SIZE;
        if bytes.len() < min {
            return Err(AppaError::InsufficientData {
                expected: min,
                actual: bytes.len(),
            });
        }
        if bytes[0] != FRAME_START_BYTE || bytes[1] != FRAME_START_BYTE {
            return Err(AppaError::InvalidFrame(format!(
                "bad start marker {:02x}{:02x}",
                bytes[0], bytes[1]
            )));
        }

        let declared = bytes[3] as usize;
        let expected = FRAME_HEADER_SIZE + declared + FRAME_CHECKSUM_SIZE;
        if bytes.len() != expected {
            return Err(AppaError::InvalidLength {
                command: bytes[2],
                length: bytes.len(),
            });
        }

        let received = bytes[expected - 1];
        let computed = checksum(&bytes[..expected - 1]);
        if computed != received {
            return Err(AppaError::ChecksumMismatch { computed, received });
        }

        let command = Command::from(bytes[2]);
        let mut payload = bytes.split_off(FRAME_HEADER_SIZE);
        payload.truncate(declared);
        Frame::new(command, payload)
    }
}
