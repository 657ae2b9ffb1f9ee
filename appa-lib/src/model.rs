use num_enum::{FromPrimitive, IntoPrimitive};
use strum_macros::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Model identifiers reported in the Read Information response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum ModelId {
    #[strum(to_string = "INVALID")]
    Invalid = 0x00,
    #[strum(to_string = "APPA 150")]
    Appa150 = 0x01,
    #[strum(to_string = "APPA 150B")]
    Appa150B = 0x02,
    #[strum(to_string = "APPA 208")]
    Appa208 = 0x03,
    #[strum(to_string = "APPA 208B")]
    Appa208B = 0x04,
    #[strum(to_string = "APPA 506")]
    Appa506 = 0x05,
    #[strum(to_string = "APPA 506B")]
    Appa506B = 0x06,
    #[strum(to_string = "APPA 506B")]
    Appa506B2 = 0x600,
    #[strum(to_string = "APPA 501")]
    Appa501 = 0x07,
    #[strum(to_string = "APPA 502")]
    Appa502 = 0x08,
    #[strum(to_string = "APPA S1")]
    S1 = 0x09,
    #[strum(to_string = "APPA S2")]
    S2 = 0x0a,
    #[strum(to_string = "APPA S3")]
    S3 = 0x0b,
    #[strum(to_string = "APPA 172")]
    Appa172 = 0x0c,
    #[strum(to_string = "APPA 173")]
    Appa173 = 0x0d,
    #[strum(to_string = "APPA 175")]
    Appa175 = 0x0e,
    #[strum(to_string = "APPA 177")]
    Appa177 = 0x0f,
    #[strum(to_string = "APPA sFlex-10A")]
    SFlex10A = 0x10,
    #[strum(to_string = "APPA sFlex-18A")]
    SFlex18A = 0x11,
    #[strum(to_string = "APPA A17N")]
    A17N = 0x12,
    #[strum(to_string = "APPA S0")]
    S0 = 0x13,
    #[strum(to_string = "APPA 179")]
    Appa179 = 0x14,
    #[strum(to_string = "APPA 503")]
    Appa503 = 0x15,
    #[strum(to_string = "APPA 505")]
    Appa505 = 0x16,

    #[num_enum(catch_all)]
    #[strum(to_string = "N/A")]
    Unknown(u16),
}

impl Default for ModelId {
    fn default() -> Self {
        ModelId::Invalid
    }
}

/// Logical output channels of one acquisition frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChannelRole {
    #[strum(to_string = "Main")]
    Primary,
    #[strum(to_string = "Sub")]
    Secondary,
    /// Entry number during storage replay, carried in the secondary slot
    #[strum(to_string = "Sub")]
    SampleIndex,
}

/// Grouping used to pick the storage memory layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFamily {
    /// 150 series, metadata `mem.amount, log.amount, log.rate`
    Series150,
    /// 200 and 500 series, metadata `log.rate, log.amount, mem.amount`
    Series200500,
    /// 170 and S series, rotating `(rate, amount)` log metadata
    Series170S,
    None,
}

impl ModelId {
    pub fn id(self) -> u16 {
        self.into()
    }

    pub fn is_valid(self) -> bool {
        !matches!(self, ModelId::Invalid | ModelId::Unknown(_))
    }

    /// Whether the meter has a second display that Read Display fills in.
    pub fn has_secondary_display(self) -> bool {
        match self {
            ModelId::Appa208
            | ModelId::Appa208B
            | ModelId::Appa501
            | ModelId::Appa502
            | ModelId::Appa503
            | ModelId::Appa505
            | ModelId::Appa506
            | ModelId::Appa506B
            | ModelId::Appa506B2 => true,
            ModelId::Appa150
            | ModelId::Appa150B
            | ModelId::Appa172
            | ModelId::Appa173
            | ModelId::Appa175
            | ModelId::Appa177
            | ModelId::Appa179
            | ModelId::SFlex10A
            | ModelId::SFlex18A
            | ModelId::A17N
            | ModelId::S0
            | ModelId::S1
            | ModelId::S2
            | ModelId::S3
            | ModelId::Invalid
            | ModelId::Unknown(_) => false,
        }
    }

    pub fn supports_channel(self, role: ChannelRole) -> bool {
        match role {
            ChannelRole::Primary => true,
            ChannelRole::Secondary | ChannelRole::SampleIndex => self.has_secondary_display(),
        }
    }

    pub fn storage_family(self) -> StorageFamily {
        match self {
            ModelId::Appa150 | ModelId::Appa150B => StorageFamily::Series150,
            ModelId::Appa208
            | ModelId::Appa208B
            | ModelId::Appa501
            | ModelId::Appa502
            | ModelId::Appa503
            | ModelId::Appa505
            | ModelId::Appa506
            | ModelId::Appa506B
            | ModelId::Appa506B2 => StorageFamily::Series200500,
            ModelId::S1
            | ModelId::S2
            | ModelId::S3
            | ModelId::Appa172
            | ModelId::Appa173
            | ModelId::Appa175
            | ModelId::Appa177
            | ModelId::Appa179 => StorageFamily::Series170S,
            ModelId::SFlex10A
            | ModelId::SFlex18A
            | ModelId::A17N
            | ModelId::S0
            | ModelId::Invalid
            | ModelId::Unknown(_) => StorageFamily::None,
        }
    }
}
