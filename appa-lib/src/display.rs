use crate::codec::i24_from_le_bytes;
use modular_bitfield::prelude::*;
use num_enum::{FromPrimitive, IntoPrimitive};
use strum_macros::Display;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Decimal point position as shown on the meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoPrimitive, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Dot {
    #[strum(to_string = "99999")]
    None = 0x00,
    #[strum(to_string = "9999.9")]
    Dp1 = 0x01,
    #[strum(to_string = "999.99")]
    Dp2 = 0x02,
    #[strum(to_string = "99.999")]
    Dp3 = 0x03,
    #[strum(to_string = "9.9999")]
    Dp4 = 0x04,

    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Display unit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoPrimitive, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Unit {
    #[strum(to_string = "")]
    None = 0x00,
    #[strum(to_string = "V")]
    Volt = 0x01,
    #[strum(to_string = "mV")]
    MilliVolt = 0x02,
    #[strum(to_string = "A")]
    Ampere = 0x03,
    #[strum(to_string = "mA")]
    MilliAmpere = 0x04,
    #[strum(to_string = "dB")]
    Decibel = 0x05,
    #[strum(to_string = "dBm")]
    DecibelMilliWatt = 0x06,
    #[strum(to_string = "mF")]
    MilliFarad = 0x07,
    #[strum(to_string = "µF")]
    MicroFarad = 0x08,
    #[strum(to_string = "nF")]
    NanoFarad = 0x09,
    #[strum(to_string = "GΩ")]
    GigaOhm = 0x0a,
    #[strum(to_string = "MΩ")]
    MegaOhm = 0x0b,
    #[strum(to_string = "kΩ")]
    KiloOhm = 0x0c,
    #[strum(to_string = "Ω")]
    Ohm = 0x0d,
    #[strum(to_string = "%")]
    Percent = 0x0e,
    #[strum(to_string = "MHz")]
    MegaHertz = 0x0f,
    #[strum(to_string = "kHz")]
    KiloHertz = 0x10,
    #[strum(to_string = "Hz")]
    Hertz = 0x11,
    #[strum(to_string = "°C")]
    DegreeCelsius = 0x12,
    #[strum(to_string = "°F")]
    DegreeFahrenheit = 0x13,
    #[strum(to_string = "s")]
    Second = 0x14,
    #[strum(to_string = "ms")]
    MilliSecond = 0x15,
    #[strum(to_string = "µs")]
    MicroSecond = 0x16,
    #[strum(to_string = "ns")]
    NanoSecond = 0x17,
    #[strum(to_string = "µA")]
    MicroAmpere = 0x18,
    #[strum(to_string = "min")]
    Minute = 0x19,
    #[strum(to_string = "kW")]
    KiloWatt = 0x1a,
    #[strum(to_string = "PF")]
    PowerFactor = 0x1b,

    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Which statistic a reading represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoPrimitive, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum DataContent {
    MeasuringData = 0x00,
    Frequency = 0x01,
    Cycle = 0x02,
    Duty = 0x03,
    MemoryStamp = 0x04,
    MemorySave = 0x05,
    MemoryLoad = 0x06,
    LogSave = 0x07,
    LogLoad = 0x08,
    LogRate = 0x09,
    RelDelta = 0x0a,
    RelPercent = 0x0b,
    RelReference = 0x0c,
    Maximum = 0x0d,
    Minimum = 0x0e,
    Average = 0x0f,
    PeakHoldMax = 0x10,
    PeakHoldMin = 0x11,
    Dbm = 0x12,
    Db = 0x13,
    AutoHold = 0x14,
    Setup = 0x15,
    LogStamp = 0x16,
    LogMax = 0x17,
    LogMin = 0x18,
    LogTp = 0x19,
    Hold = 0x1a,
    CurrentOutput = 0x1b,
    CurOut0To20mAPercent = 0x1c,
    CurOut4To20mAPercent = 0x1d,

    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Rotary switch / mode selector position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoPrimitive, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum FunctionCode {
    None = 0x00,
    AcV = 0x01,
    DcV = 0x02,
    AcMv = 0x03,
    DcMv = 0x04,
    Ohm = 0x05,
    Continuity = 0x06,
    Diode = 0x07,
    Cap = 0x08,
    AcA = 0x09,
    DcA = 0x0a,
    AcMa = 0x0b,
    DcMa = 0x0c,
    DegC = 0x0d,
    DegF = 0x0e,
    Frequency = 0x0f,
    Duty = 0x10,
    HzV = 0x11,
    HzMv = 0x12,
    HzA = 0x13,
    HzMa = 0x14,
    AcDcV = 0x15,
    AcDcMv = 0x16,
    AcDcA = 0x17,
    AcDcMa = 0x18,
    LpfV = 0x19,
    LpfMv = 0x1a,
    LpfA = 0x1b,
    LpfMa = 0x1c,
    AcUa = 0x1d,
    DcUa = 0x1e,
    DcAOut = 0x1f,
    DcAOutSlowLinear = 0x20,
    DcAOutFastLinear = 0x21,
    DcAOutSlowStep = 0x22,
    DcAOutFastStep = 0x23,
    LoopPower = 0x24,
    Hart250Ohm = 0x25,
    VoltSense = 0x26,
    PeakHoldV = 0x27,
    PeakHoldMv = 0x28,
    PeakHoldA = 0x29,
    PeakHoldMa = 0x2a,
    LozAcV = 0x2b,
    LozDcV = 0x2c,
    LozAcDcV = 0x2d,
    LozLpfV = 0x2e,
    LozHzV = 0x2f,
    LozPeakHoldV = 0x30,
    Battery = 0x31,
    AcW = 0x32,
    DcW = 0x33,
    Pf = 0x34,
    FlexAcA = 0x35,
    FlexLpfA = 0x36,
    FlexPeakHoldA = 0x37,
    FlexHzA = 0x38,
    VHarm = 0x39,
    Inrush = 0x3a,
    AHarm = 0x3b,
    FlexInrush = 0x3c,
    FlexAHarm = 0x3d,
    PeakHoldUa = 0x3e,
    AcUaHfr = 0x3f,
    AcVHfr = 0x40,
    AcMvHfr = 0x41,
    AcAHfr = 0x42,
    AcMaHfr = 0x43,
    AcUaHfr2 = 0x44,
    DcVPv = 0x45,
    AcVPv = 0x46,
    AcVPvHfr = 0x47,
    AcDcVPv = 0x48,

    #[num_enum(catch_all)]
    Unknown(u8),
}

impl Default for Dot {
    fn default() -> Self {
        Dot::None
    }
}

impl Default for Unit {
    fn default() -> Self {
        Unit::None
    }
}

impl Default for DataContent {
    fn default() -> Self {
        DataContent::MeasuringData
    }
}

impl Default for FunctionCode {
    fn default() -> Self {
        FunctionCode::None
    }
}

// Bit-packed bytes of the display payload. The 7-bit code sits in the low
// bits and the flag in bit 7.

#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionByte {
    pub function_code: B7,
    pub auto_test: bool,
}

#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeByte {
    pub range_code: B7,
    pub auto_range: bool,
}

#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotUnitByte {
    pub dot: B3,
    pub unit: B5,
}

#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentByte {
    pub data_content: B7,
    pub overload: bool,
}

/// Wire layout of one reading: `i24 LE`, dot/unit, content/overload.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct DisplayDataRaw {
    pub reading: [u8; 3],
    pub dot_unit: u8,
    pub content: u8,
}

/// Wire layout of the Read Display response payload.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ReadDisplayRaw {
    pub function: u8,
    pub range: u8,
    pub primary: DisplayDataRaw,
    pub secondary: DisplayDataRaw,
}

/// One decoded reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayData {
    /// Sign-extended 24-bit value, or a word code (>= 0x700000)
    pub reading: i32,
    pub dot: Dot,
    pub unit: Unit,
    pub data_content: DataContent,
    pub overload: bool,
}

impl From<DisplayDataRaw> for DisplayData {
    fn from(raw: DisplayDataRaw) -> Self {
        let dot_unit = DotUnitByte::from_bytes([raw.dot_unit]);
        let content = ContentByte::from_bytes([raw.content]);
        Self {
            reading: i24_from_le_bytes(raw.reading),
            dot: Dot::from(dot_unit.dot()),
            unit: Unit::from(dot_unit.unit()),
            data_content: DataContent::from(content.data_content()),
            overload: content.overload(),
        }
    }
}

impl From<DisplayData> for DisplayDataRaw {
    fn from(data: DisplayData) -> Self {
        let le = data.reading.to_le_bytes();
        let dot: u8 = data.dot.into();
        let unit: u8 = data.unit.into();
        let content: u8 = data.data_content.into();
        Self {
            reading: [le[0], le[1], le[2]],
            dot_unit: DotUnitByte::new()
                .with_dot(dot & 0x07)
                .with_unit(unit & 0x1f)
                .into_bytes()[0],
            content: ContentByte::new()
                .with_data_content(content & 0x7f)
                .with_overload(data.overload)
                .into_bytes()[0],
        }
    }
}

/// Decoded Read Display response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReadDisplayResponse {
    pub function_code: FunctionCode,
    pub auto_test: bool,
    pub range_code: u8,
    pub auto_range: bool,
    pub primary: DisplayData,
    pub secondary: DisplayData,
}

impl From<ReadDisplayRaw> for ReadDisplayResponse {
    fn from(raw: ReadDisplayRaw) -> Self {
        let function = FunctionByte::from_bytes([raw.function]);
        let range = RangeByte::from_bytes([raw.range]);
        Self {
            function_code: FunctionCode::from(function.function_code()),
            auto_test: function.auto_test(),
            range_code: range.range_code(),
            auto_range: range.auto_range(),
            primary: raw.primary.into(),
            secondary: raw.secondary.into(),
        }
    }
}

impl From<ReadDisplayResponse> for ReadDisplayRaw {
    fn from(response: ReadDisplayResponse) -> Self {
        let function_code: u8 = response.function_code.into();
        Self {
            function: FunctionByte::new()
                .with_function_code(function_code & 0x7f)
                .with_auto_test(response.auto_test)
                .into_bytes()[0],
            range: RangeByte::new()
                .with_range_code(response.range_code & 0x7f)
                .with_auto_range(response.auto_range)
                .into_bytes()[0],
            primary: response.primary.into(),
            secondary: response.secondary.into(),
        }
    }
}
