//! Onboard MEM/LOG storage: metadata decode, paging and entry decode.
//!
//! Both stores are addressed through Read Memory. A store is split over
//! `mem_count` memory devices of `entry_count` entries each; an absolute
//! entry number maps to a device and an address inside it.

use crate::codec::{ensure_remaining, read_u16_be};
use crate::constants::{
    DISPLAY_DATA_SIZE, FRAME_MAX_DATA_SIZE, STORAGE_INFO_ADDRESS, STORAGE_INFO_DEVICE, STORAGE_INFO_LENGTH,
};
use crate::display::{DisplayData, DisplayDataRaw};
use crate::error::AppaError;
use crate::message::ReadMemoryRequest;
use crate::model::{ModelId, StorageFamily};
use strum_macros::{Display, EnumString};
use tracing::{debug, error};
use zerocopy::FromBytes;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum StorageKind {
    #[strum(serialize = "mem")]
    Mem,
    #[strum(serialize = "log")]
    Log,
}

/// Addressable layout and fill state of one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StorageInfo {
    /// Logging interval in seconds (LOG only)
    pub rate: u16,
    /// Number of entries currently stored
    pub amount: u16,
    /// Bytes per entry, at least one display data record
    pub entry_size: u16,
    /// Entries per memory device
    pub entry_count: u32,
    /// Address of the first entry inside each memory device
    pub mem_offset: u16,
    /// Number of memory devices the store spans
    pub mem_count: u8,
    /// Device number of the first memory device
    pub mem_start: u8,
}

/// Layout constants of the 200 and 500 series.
pub mod series_200_500 {
    pub const ENTRY_SIZE: u16 = 5;
    pub const MEM_ENTRY_COUNT: u32 = 500;
    pub const MEM_ADDRESS: u16 = 0x0500;
    pub const MEM_MEM_COUNT: u8 = 2;
    pub const LOG_ENTRY_COUNT: u32 = 10000;
    pub const LOG_ADDRESS: u16 = 0x1000;
    pub const LOG_MEM_COUNT: u8 = 4;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StorageInfos {
    pub mem: StorageInfo,
    pub log: StorageInfo,
}

impl StorageInfos {
    pub fn get(&self, kind: StorageKind) -> &StorageInfo {
        match kind {
            StorageKind::Mem => &self.mem,
            StorageKind::Log => &self.log,
        }
    }
}

impl StorageInfo {
    /// Total number of addressable entries.
    pub fn capacity(&self) -> u32 {
        self.mem_count as u32 * self.entry_count
    }

    /// Entries to replay. An erased store reports up to 0xFFFF, more than
    /// the layout can hold.
    pub fn stored_entries(&self) -> u32 {
        (self.amount as u32).min(self.capacity())
    }

    pub fn is_configured(&self) -> bool {
        self.entry_size as usize >= DISPLAY_DATA_SIZE && self.entry_count > 0 && self.mem_count > 0
    }
}

/// Read Memory request that fetches the storage metadata block.
pub fn storage_info_request() -> ReadMemoryRequest {
    ReadMemoryRequest {
        device_number: STORAGE_INFO_DEVICE,
        memory_address: STORAGE_INFO_ADDRESS,
        data_length: STORAGE_INFO_LENGTH,
    }
}

/// Decode the six byte metadata block (big-endian words) for `model`.
///
/// Only the 200 and 500 series layouts are known. The 150 series orders
/// the words `mem.amount, log.amount, log.rate` and the 170/S series keep
/// a rotating log, but their memory maps (entry size, offsets, device
/// count) are not documented, so both families report `UnsupportedModel`.
pub fn decode_storage_info(model: ModelId, data: &[u8]) -> Result<StorageInfos, AppaError> {
    let mut buf = data;
    ensure_remaining(&buf, STORAGE_INFO_LENGTH as usize)?;

    match model.storage_family() {
        StorageFamily::Series200500 => {
            use series_200_500::*;

            let log_rate = read_u16_be(&mut buf);
            let log_amount = read_u16_be(&mut buf);
            let mem_amount = read_u16_be(&mut buf);

            let infos = StorageInfos {
                mem: StorageInfo {
                    rate: 0,
                    amount: mem_amount,
                    entry_size: ENTRY_SIZE,
                    entry_count: MEM_ENTRY_COUNT,
                    mem_offset: MEM_ADDRESS,
                    mem_count: MEM_MEM_COUNT,
                    mem_start: 0,
                },
                log: StorageInfo {
                    rate: log_rate,
                    amount: log_amount,
                    entry_size: ENTRY_SIZE,
                    entry_count: LOG_ENTRY_COUNT,
                    mem_offset: LOG_ADDRESS,
                    mem_count: LOG_MEM_COUNT,
                    mem_start: 0,
                },
            };
            debug!(?infos, "Decoded storage info");
            Ok(infos)
        }
        StorageFamily::Series150 | StorageFamily::Series170S => {
            error!(%model, "Storage layout of this model is not known");
            Err(AppaError::UnsupportedModel(model.to_string(), "MEM/LOG replay"))
        }
        StorageFamily::None => {
            error!(%model, "Your device doesn't support MEM/LOG or invalid information");
            Err(AppaError::UnsupportedModel(model.to_string(), "MEM/LOG"))
        }
    }
}

/// Build the Read Memory request for up to `entry_count` entries from `start_entry`.
///
/// The count is clamped to what fits one frame and to the end of the
/// current memory device, so a request never straddles two devices.
pub fn encode_read_storage(
    info: &StorageInfo,
    start_entry: u32,
    entry_count: u32,
) -> Result<ReadMemoryRequest, AppaError> {
    if !info.is_configured() {
        return Err(AppaError::InvalidConfig("storage layout not loaded".to_string()));
    }
    if start_entry >= info.capacity() {
        return Err(AppaError::StorageRange {
            start: start_entry,
            capacity: info.capacity(),
        });
    }

    let entry_size = info.entry_size as u32;
    let position = start_entry % info.entry_count;
    let count = entry_count
        .min(FRAME_MAX_DATA_SIZE as u32 / entry_size)
        .min(info.entry_count - position);

    let device_number = (start_entry / info.entry_count) as u8 + info.mem_start;
    let memory_address = info.mem_offset as u32 + position * entry_size;

    Ok(ReadMemoryRequest {
        device_number,
        memory_address: memory_address as u16,
        data_length: (count * entry_size) as u8,
    })
}

/// Split a storage read into display records, skipping per-entry fill bytes.
pub fn decode_storage_entries(info: &StorageInfo, data: &[u8]) -> Result<Vec<DisplayData>, AppaError> {
    if !info.is_configured() {
        return Err(AppaError::InvalidConfig("storage layout not loaded".to_string()));
    }
    let entry_size = info.entry_size as usize;
    let chunks = data.chunks_exact(entry_size);
    if !chunks.remainder().is_empty() {
        debug!(
            trailing = chunks.remainder().len(),
            "Ignoring partial storage entry"
        );
    }

    chunks
        .map(|entry| {
            DisplayDataRaw::read_from_bytes(&entry[..DISPLAY_DATA_SIZE])
                .map(DisplayData::from)
                .map_err(|_| AppaError::InvalidFrame("Failed to parse storage entry".to_string()))
        })
        .collect()
}
