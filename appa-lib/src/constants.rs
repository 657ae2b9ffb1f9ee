// Protocol constants for APPA-family meters

use std::time::Duration;

/// Start marker byte, sent twice at the beginning of every frame
pub const FRAME_START_BYTE: u8 = 0x55;

/// Size of frame header: two start bytes, command, length (4 bytes)
pub const FRAME_HEADER_SIZE: usize = 4;

/// Size of trailing checksum (1 byte)
pub const FRAME_CHECKSUM_SIZE: usize = 1;

/// Largest payload any command may carry (64 bytes)
pub const FRAME_MAX_DATA_SIZE: usize = 64;

/// Largest complete frame on the wire (69 bytes)
pub const FRAME_MAX_SIZE: usize = FRAME_HEADER_SIZE + FRAME_MAX_DATA_SIZE + FRAME_CHECKSUM_SIZE;

/// Readings at or above this value are word codes, not numbers
pub const WORDCODE_TABLE_MIN: i32 = 0x700000;

/// Length of the model name field in Read Information
pub const MODEL_NAME_LENGTH: usize = 32;

/// Length of the serial number field in Read Information
pub const SERIAL_NUMBER_LENGTH: usize = 16;

/// Size of one display data record (reading + dot/unit + content/overload)
pub const DISPLAY_DATA_SIZE: usize = 5;

/// Default serial framing
pub const DEFAULT_SERIALCOMM: &str = "9600/8n1";

/// Vendor reported when the model name carries no vendor prefix
pub const DEFAULT_VENDOR: &str = "APPA";

/// Text shown for unknown table lookups
pub const STRING_NA: &str = "N/A";

/// Overall budget for the identification handshake
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Single blocking read slice used while waiting for a response
pub const READ_BLOCKING_TIMEOUT: Duration = Duration::from_millis(100);

/// Bounded write timeout for requests
pub const WRITE_BLOCKING_TIMEOUT: Duration = Duration::from_millis(50);

/// Storage info location: memory device, address and length
pub const STORAGE_INFO_DEVICE: u8 = 0;
pub const STORAGE_INFO_ADDRESS: u16 = 0x000a;
pub const STORAGE_INFO_LENGTH: u8 = 6;

/// Consecutive storage read failures tolerated before aborting
pub const STORAGE_ERROR_LIMIT: u32 = 10;

/// A live request without answer is re-sent after this long
pub const RESPONSE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Read buffer size for one poll
pub const READ_CHUNK_SIZE: usize = 256;

/// A partial frame that stops growing for this long is dropped
pub const STALE_FRAME_TIMEOUT: Duration = Duration::from_millis(500);
