use crate::error::AppaError;
use crate::limits::SoftwareLimits;
use crate::storage::StorageKind;
use serialport::{DataBits, Parity, StopBits};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use strum_macros::{Display, EnumString};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Line settings in `<baud>/<bits><parity><stop>` form, e.g. `9600/8n1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl FromStr for SerialSettings {
    type Err = AppaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppaError::InvalidConfig(format!("invalid serialcomm '{s}'"));

        let (baud, frame) = s.split_once('/').ok_or_else(invalid)?;
        let baud_rate = baud.trim().parse::<u32>().map_err(|_| invalid())?;
        if baud_rate == 0 {
            return Err(invalid());
        }

        let frame = frame.trim().as_bytes();
        if frame.len() != 3 {
            return Err(invalid());
        }
        let data_bits = match frame[0] {
            b'5' => DataBits::Five,
            b'6' => DataBits::Six,
            b'7' => DataBits::Seven,
            b'8' => DataBits::Eight,
            _ => return Err(invalid()),
        };
        let parity = match frame[1].to_ascii_lowercase() {
            b'n' => Parity::None,
            b'e' => Parity::Even,
            b'o' => Parity::Odd,
            _ => return Err(invalid()),
        };
        let stop_bits = match frame[2] {
            b'1' => StopBits::One,
            b'2' => StopBits::Two,
            _ => return Err(invalid()),
        };

        Ok(Self {
            baud_rate,
            data_bits,
            parity,
            stop_bits,
        })
    }
}

impl fmt::Display for SerialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = match self.data_bits {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        };
        let parity = match self.parity {
            Parity::None => 'n',
            Parity::Even => 'e',
            Parity::Odd => 'o',
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        write!(f, "{}/{}{}{}", self.baud_rate, bits, parity, stop)
    }
}

/// Where samples come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum DataSource {
    #[default]
    #[strum(serialize = "Live")]
    Live,
    #[strum(serialize = "MEM")]
    Mem,
    #[strum(serialize = "LOG")]
    Log,
}

impl DataSource {
    /// Storage area replayed by this source, `None` for live readings.
    pub fn storage_kind(self) -> Option<StorageKind> {
        match self {
            DataSource::Live => None,
            DataSource::Mem => Some(StorageKind::Mem),
            DataSource::Log => Some(StorageKind::Log),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ConnectionKind {
    #[default]
    Serial,
    /// Bluetooth LE, selected by a `bt/` connection prefix
    Ble,
}

impl ConnectionKind {
    pub fn from_conn(conn: &str) -> Self {
        if conn.starts_with("bt/") {
            ConnectionKind::Ble
        } else {
            ConnectionKind::Serial
        }
    }
}

/// Options accepted by the driver as `key=value` pairs.
#[derive(Debug, Clone, Default)]
pub struct DriverConfig {
    pub conn: String,
    pub connection: ConnectionKind,
    pub serial: SerialSettings,
    pub data_source: DataSource,
    pub limit_samples: u64,
    pub limit_frames: u64,
    pub limit_msec: u64,
}

impl DriverConfig {
    pub fn new(conn: impl Into<String>) -> Self {
        let conn = conn.into();
        Self {
            connection: ConnectionKind::from_conn(&conn),
            conn,
            ..Self::default()
        }
    }

    /// Serialcomm string in effect.
    pub fn serialcomm(&self) -> String {
        self.serial.to_string()
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), AppaError> {
        let number = |value: &str| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| AppaError::InvalidConfig(format!("{key}: expected a number, got '{value}'")))
        };
        match key {
            "conn" => {
                self.connection = ConnectionKind::from_conn(value);
                self.conn = value.to_string();
            }
            "serialcomm" => self.serial = value.parse()?,
            "data_source" => {
                self.data_source = value
                    .parse()
                    .map_err(|_| AppaError::InvalidConfig(format!("unknown data source '{value}'")))?;
            }
            "limit_samples" => self.limit_samples = number(value)?,
            "limit_frames" => self.limit_frames = number(value)?,
            "limit_msec" => self.limit_msec = number(value)?,
            other => return Err(AppaError::InvalidConfig(format!("unknown option '{other}'"))),
        }
        Ok(())
    }

    pub fn limits(&self) -> SoftwareLimits {
        let limit_time = (self.limit_msec > 0).then(|| Duration::from_millis(self.limit_msec));
        SoftwareLimits::new(self.limit_samples, self.limit_frames, limit_time)
    }
}
