use std::array::TryFromSliceError;
use std::io;
use thiserror::Error;

/// The primary error type for the `appa-lib` library.
#[derive(Error, Debug)]
pub enum AppaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Timeout waiting for {0}")]
    Timeout(&'static str),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Checksum mismatch: computed 0x{computed:02x}, received 0x{received:02x}")]
    ChecksumMismatch { computed: u8, received: u8 },

    #[error("Invalid length {length} for command 0x{command:02x}")]
    InvalidLength { command: u8, length: usize },

    #[error("Insufficient data: expected at least {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("Unknown command 0x{0:02x}")]
    UnknownCommand(u8),

    #[error("Unexpected command: expected 0x{expected:02x}, got 0x{actual:02x}")]
    UnexpectedCommand { expected: u8, actual: u8 },

    #[error("Device reported failure (code 0x{0:02x})")]
    DeviceFailure(u8),

    #[error("Model {0} does not support {1}")]
    UnsupportedModel(String, &'static str),

    #[error("Storage entry {start} out of range (capacity {capacity})")]
    StorageRange { start: u32, capacity: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AppaError {
    /// Malformed or unexpected data from the device, recoverable by resyncing.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            AppaError::InvalidFrame(_)
                | AppaError::ChecksumMismatch { .. }
                | AppaError::InvalidLength { .. }
                | AppaError::InsufficientData { .. }
                | AppaError::UnknownCommand(_)
                | AppaError::UnexpectedCommand { .. }
                | AppaError::DeviceFailure(_)
        )
    }
}

impl From<TryFromSliceError> for AppaError {
    fn from(_: TryFromSliceError) -> Self {
        AppaError::InvalidFrame("Failed to convert slice to array".to_string())
    }
}
