use crate::constants::{DEFAULT_VENDOR, MODEL_NAME_LENGTH, SERIAL_NUMBER_LENGTH};
use crate::model::ModelId;
use std::fmt;
use zerocopy::byteorder::little_endian::U16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Wire layout of the Read Information response payload (52 bytes).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ReadInformationRaw {
    pub model_name: [u8; MODEL_NAME_LENGTH],       // ASCII, space padded
    pub serial_number: [u8; SERIAL_NUMBER_LENGTH], // ASCII, space padded
    pub model_id: U16,
    pub firmware_version: U16, // major * 100 + minor
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReadInformationResponse {
    pub model_name: String,
    pub serial_number: String,
    pub model_id: u16,
    pub firmware_version: u16,
}

/// Space/NUL padded ASCII field to a trimmed string.
fn padded_ascii(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).trim().to_string()
}

fn write_padded(dest: &mut [u8], value: &str) {
    dest.fill(b' ');
    let bytes = value.as_bytes();
    let n = bytes.len().min(dest.len());
    dest[..n].copy_from_slice(&bytes[..n]);
}

impl From<ReadInformationRaw> for ReadInformationResponse {
    fn from(raw: ReadInformationRaw) -> Self {
        Self {
            model_name: padded_ascii(&raw.model_name),
            serial_number: padded_ascii(&raw.serial_number),
            model_id: raw.model_id.get(),
            firmware_version: raw.firmware_version.get(),
        }
    }
}

impl From<&ReadInformationResponse> for ReadInformationRaw {
    fn from(info: &ReadInformationResponse) -> Self {
        let mut raw = ReadInformationRaw {
            model_name: [b' '; MODEL_NAME_LENGTH],
            serial_number: [b' '; SERIAL_NUMBER_LENGTH],
            model_id: U16::new(info.model_id),
            firmware_version: U16::new(info.firmware_version),
        };
        write_padded(&mut raw.model_name, &info.model_name);
        write_padded(&mut raw.serial_number, &info.serial_number);
        raw
    }
}

impl ReadInformationResponse {
    /// Split the model name at its last space into vendor and model.
    ///
    /// Names without a space belong to APPA itself.
    pub fn vendor_and_model(&self) -> (String, String) {
        match self.model_name.rfind(' ') {
            Some(pos) => (
                self.model_name[..pos].to_string(),
                self.model_name[pos + 1..].to_string(),
            ),
            None => (DEFAULT_VENDOR.to_string(), self.model_name.clone()),
        }
    }

    /// Firmware version as `major.minor`, e.g. `1.00`.
    pub fn version_string(&self) -> String {
        format!("{}.{:02}", self.firmware_version / 100, self.firmware_version % 100)
    }
}

/// Identity derived once at identification time and kept for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceIdentity {
    pub vendor: String,
    pub model: String,
    pub version: String,
    pub serial_number: String,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub model_id: ModelId,
}

impl From<&ReadInformationResponse> for DeviceIdentity {
    fn from(info: &ReadInformationResponse) -> Self {
        let (vendor, model) = info.vendor_and_model();
        Self {
            vendor,
            model,
            version: info.version_string(),
            serial_number: info.serial_number.clone(),
            model_id: ModelId::from(info.model_id),
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vendor: {}, Model: {}, APPA-Model: {}, Version: {}, Serial number: {}, Model ID: {}",
            self.vendor,
            self.model,
            self.model_id,
            self.version,
            self.serial_number,
            self.model_id.id()
        )
    }
}
