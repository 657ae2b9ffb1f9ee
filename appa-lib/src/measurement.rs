//! Display semantics: raw display records to physical measurements.

use crate::display::{DataContent, DisplayData, Dot, FunctionCode, Unit};
use crate::model::ChannelRole;
use crate::wordcode::{Severity, WordCode, is_wordcode, is_wordcode_dash};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use strum_macros::Display;
use tracing::{error, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Quantity {
    Voltage,
    Current,
    Power,
    Capacitance,
    Resistance,
    Difference,
    Frequency,
    Temperature,
    Time,
    PowerFactor,
    Continuity,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SiUnit {
    #[strum(to_string = "V")]
    Volt,
    #[strum(to_string = "A")]
    Ampere,
    #[strum(to_string = "dBV")]
    DecibelVolt,
    #[strum(to_string = "dBm")]
    DecibelMw,
    #[strum(to_string = "F")]
    Farad,
    #[strum(to_string = "Ω")]
    Ohm,
    #[strum(to_string = "%")]
    Percentage,
    #[strum(to_string = "Hz")]
    Hertz,
    #[strum(to_string = "°C")]
    Celsius,
    #[strum(to_string = "°F")]
    Fahrenheit,
    #[strum(to_string = "s")]
    Second,
    #[strum(to_string = "W")]
    Watt,
    #[strum(to_string = "")]
    Unitless,
}

/// Measurement qualifier flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct MqFlags(u32);

impl MqFlags {
    pub const AC: MqFlags = MqFlags(0x01);
    pub const DC: MqFlags = MqFlags(0x02);
    pub const RMS: MqFlags = MqFlags(0x04);
    pub const DIODE: MqFlags = MqFlags(0x08);
    pub const HOLD: MqFlags = MqFlags(0x10);
    pub const MAX: MqFlags = MqFlags(0x20);
    pub const MIN: MqFlags = MqFlags(0x40);
    pub const AUTORANGE: MqFlags = MqFlags(0x80);
    pub const RELATIVE: MqFlags = MqFlags(0x100);
    pub const AVG: MqFlags = MqFlags(0x200);
    pub const REFERENCE: MqFlags = MqFlags(0x400);

    const NAMES: [(MqFlags, &'static str); 11] = [
        (MqFlags::AC, "AC"),
        (MqFlags::DC, "DC"),
        (MqFlags::RMS, "RMS"),
        (MqFlags::DIODE, "DIODE"),
        (MqFlags::HOLD, "HOLD"),
        (MqFlags::MAX, "MAX"),
        (MqFlags::MIN, "MIN"),
        (MqFlags::AUTORANGE, "AUTO"),
        (MqFlags::RELATIVE, "REL"),
        (MqFlags::AVG, "AVG"),
        (MqFlags::REFERENCE, "REF"),
    ];

    pub const fn empty() -> Self {
        MqFlags(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: MqFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: MqFlags) {
        self.0 |= other.0;
    }
}

impl BitOr for MqFlags {
    type Output = MqFlags;

    fn bitor(self, rhs: MqFlags) -> MqFlags {
        MqFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for MqFlags {
    fn bitor_assign(&mut self, rhs: MqFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for MqFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (flag, name) in MqFlags::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A physical reading ready for the sink.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measurement {
    /// Scaled value in SI base units; `+inf` when there is no valid number
    pub value: f64,
    pub unit: SiUnit,
    pub quantity: Quantity,
    pub flags: MqFlags,
    /// Decimal digits after the point in the SI base unit
    pub digits: i8,
}

impl Measurement {
    /// Placeholder emitted when a reading has no physical meaning.
    pub fn undefined() -> Self {
        Self {
            value: f64::INFINITY,
            unit: SiUnit::Unitless,
            quantity: Quantity::Count,
            flags: MqFlags::empty(),
            digits: 0,
        }
    }

    /// Entry number during storage replay.
    pub fn sample_index(index: u32) -> Self {
        Self {
            value: index as f64,
            unit: SiUnit::Unitless,
            quantity: Quantity::Count,
            flags: MqFlags::empty(),
            digits: 0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_finite() {
            let precision = self.digits.max(0) as usize;
            write!(f, "{:.*}", precision, self.value)?;
        } else {
            f.write_str("OL")?;
        }
        if self.unit != SiUnit::Unitless {
            write!(f, " {}", self.unit)?;
        }
        if !self.flags.is_empty() {
            write!(f, " [{}]", self.flags)?;
        }
        Ok(())
    }
}

/// Text the meter shows instead of a number.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusMessage {
    pub text: String,
    pub severity: Severity,
}

impl StatusMessage {
    /// Report through tracing at the level matching the severity.
    pub fn log(&self, role: ChannelRole) {
        match self.severity {
            Severity::Error => error!("ERROR [{}]: {}", role, self.text),
            Severity::Info => warn!("MESSAGE [{}]: {}", role, self.text),
            Severity::Silent => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Value(Measurement),
    Status(StatusMessage),
}

impl Reading {
    /// The measurement to forward; word codes become [`Measurement::undefined`].
    pub fn measurement(&self) -> Measurement {
        match self {
            Reading::Value(measurement) => *measurement,
            Reading::Status(_) => Measurement::undefined(),
        }
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        match self {
            Reading::Value(_) => None,
            Reading::Status(status) => Some(status),
        }
    }
}

/// Digits and divisor implied by the decimal point position.
fn dot_scale(dot: Dot) -> (i8, f64) {
    match dot {
        Dot::Dp1 => (1, 10.0),
        Dot::Dp2 => (2, 100.0),
        Dot::Dp3 => (3, 1000.0),
        Dot::Dp4 => (4, 10000.0),
        Dot::None | Dot::Unknown(_) => (0, 1.0),
    }
}

/// SI unit, quantity, scale factor and digit adjustment for a display unit.
fn unit_semantics(unit: Unit) -> (SiUnit, Option<Quantity>, f64, i8) {
    match unit {
        Unit::Volt => (SiUnit::Volt, Some(Quantity::Voltage), 1.0, 0),
        Unit::MilliVolt => (SiUnit::Volt, Some(Quantity::Voltage), 1e-3, 3),
        Unit::Ampere => (SiUnit::Ampere, Some(Quantity::Current), 1.0, 0),
        Unit::MilliAmpere => (SiUnit::Ampere, Some(Quantity::Current), 1e-3, 3),
        Unit::MicroAmpere => (SiUnit::Ampere, Some(Quantity::Current), 1e-6, 6),
        Unit::Decibel => (SiUnit::DecibelVolt, Some(Quantity::Power), 1.0, 0),
        Unit::DecibelMilliWatt => (SiUnit::DecibelMw, Some(Quantity::Power), 1.0, 0),
        Unit::MilliFarad => (SiUnit::Farad, Some(Quantity::Capacitance), 1e-3, 3),
        Unit::MicroFarad => (SiUnit::Farad, Some(Quantity::Capacitance), 1e-6, 6),
        Unit::NanoFarad => (SiUnit::Farad, Some(Quantity::Capacitance), 1e-9, 9),
        Unit::GigaOhm => (SiUnit::Ohm, Some(Quantity::Resistance), 1e9, -9),
        Unit::MegaOhm => (SiUnit::Ohm, Some(Quantity::Resistance), 1e6, -6),
        Unit::KiloOhm => (SiUnit::Ohm, Some(Quantity::Resistance), 1e3, -3),
        Unit::Ohm => (SiUnit::Ohm, Some(Quantity::Resistance), 1.0, 0),
        Unit::Percent => (SiUnit::Percentage, Some(Quantity::Difference), 1.0, 0),
        Unit::MegaHertz => (SiUnit::Hertz, Some(Quantity::Frequency), 1e6, -6),
        Unit::KiloHertz => (SiUnit::Hertz, Some(Quantity::Frequency), 1e3, -3),
        Unit::Hertz => (SiUnit::Hertz, Some(Quantity::Frequency), 1.0, 0),
        Unit::DegreeCelsius => (SiUnit::Celsius, Some(Quantity::Temperature), 1.0, 0),
        Unit::DegreeFahrenheit => (SiUnit::Fahrenheit, Some(Quantity::Temperature), 1.0, 0),
        Unit::Second => (SiUnit::Second, Some(Quantity::Time), 1.0, 0),
        Unit::MilliSecond => (SiUnit::Second, Some(Quantity::Time), 1e-3, 3),
        Unit::MicroSecond => (SiUnit::Second, Some(Quantity::Time), 1e-6, 6),
        Unit::NanoSecond => (SiUnit::Second, Some(Quantity::Time), 1e-9, 9),
        Unit::Minute => (SiUnit::Second, Some(Quantity::Time), 60.0, 0),
        Unit::KiloWatt => (SiUnit::Watt, Some(Quantity::Power), 1e3, -3),
        Unit::PowerFactor => (SiUnit::Unitless, Some(Quantity::PowerFactor), 1.0, 0),
        Unit::None | Unit::Unknown(_) => (SiUnit::Unitless, None, 1.0, 0),
    }
}

fn data_content_flags(content: DataContent, role: ChannelRole) -> MqFlags {
    let secondary = role == ChannelRole::Secondary;
    let hold = if secondary { MqFlags::HOLD } else { MqFlags::empty() };
    match content {
        DataContent::Maximum => MqFlags::MAX,
        DataContent::Minimum => MqFlags::MIN,
        DataContent::Average => MqFlags::AVG,
        DataContent::PeakHoldMax => MqFlags::MAX | hold,
        DataContent::PeakHoldMin => MqFlags::MIN | hold,
        DataContent::AutoHold | DataContent::Hold => hold,
        DataContent::RelDelta | DataContent::RelPercent => {
            if secondary {
                MqFlags::REFERENCE
            } else {
                MqFlags::RELATIVE
            }
        }
        // unit alone carries enough information for the rest
        _ => MqFlags::empty(),
    }
}

enum Coupling {
    Ac,
    Dc,
    AcDc,
    Continuity,
    Diode,
    Other,
}

fn function_coupling(function_code: FunctionCode) -> Coupling {
    use FunctionCode::*;
    match function_code {
        PeakHoldUa | AcUa | AcMv | AcMa | LpfMv | LpfMa | AcV | AcA | LpfV | LpfA | LozAcV | AcW | LozLpfV
        | VHarm | Inrush | AHarm | FlexInrush | FlexAHarm | AcUaHfr | AcAHfr | AcMaHfr | AcUaHfr2 | AcVHfr
        | AcMvHfr | AcVPv | AcVPvHfr => Coupling::Ac,
        DcUa | DcMv | DcMa | DcV | DcA | DcAOut | DcAOutSlowLinear | DcAOutFastLinear | DcAOutSlowStep
        | DcAOutFastStep | LoopPower | LozDcV | DcW | FlexAcA | FlexLpfA | FlexPeakHoldA | DcVPv => Coupling::Dc,
        Continuity => Coupling::Continuity,
        Diode => Coupling::Diode,
        AcDcMv | AcDcMa | AcDcV | AcDcA | VoltSense | LozAcDcV | AcDcVPv => Coupling::AcDc,
        _ => Coupling::Other,
    }
}

fn status_for(reading: i32, unit: Unit) -> StatusMessage {
    match WordCode::from_reading(reading) {
        Some(WordCode::Definition) => {
            let suffix = match unit {
                Unit::DegreeCelsius => " °C",
                Unit::DegreeFahrenheit => " °F",
                _ => "",
            };
            StatusMessage {
                text: format!("{}{}", WordCode::Definition, suffix),
                severity: Severity::Info,
            }
        }
        Some(code) => StatusMessage {
            text: code.to_string(),
            severity: code.severity(),
        },
        None => StatusMessage {
            text: crate::constants::STRING_NA.to_string(),
            severity: Severity::Info,
        },
    }
}

/// Interpret one display record.
///
/// `function_code` and `auto_range` come from the enclosing Read Display
/// response; storage entries carry neither and pass `FunctionCode::None`
/// and `false`.
pub fn interpret(data: &DisplayData, function_code: FunctionCode, auto_range: bool, role: ChannelRole) -> Reading {
    let is_dash = is_wordcode_dash(data.reading);
    if is_wordcode(data.reading) && !is_dash {
        return Reading::Status(status_for(data.reading, data.unit));
    }

    let (mut digits, divisor) = dot_scale(data.dot);
    let (unit, mut quantity, unit_factor, digit_shift) = unit_semantics(data.unit);
    let factor = unit_factor / divisor;
    digits += digit_shift;

    let mut flags = data_content_flags(data.data_content, role);
    if auto_range {
        flags |= MqFlags::AUTORANGE;
    }

    let electrical = matches!(unit, SiUnit::Volt | SiUnit::Ampere | SiUnit::Watt);
    match function_coupling(function_code) {
        Coupling::Ac if electrical => flags |= MqFlags::AC | MqFlags::RMS,
        Coupling::AcDc if electrical => flags |= MqFlags::AC | MqFlags::DC | MqFlags::RMS,
        Coupling::Dc => flags |= MqFlags::DC,
        Coupling::Diode => flags |= MqFlags::DIODE | MqFlags::DC,
        Coupling::Continuity => quantity = Some(Quantity::Continuity),
        Coupling::Ac | Coupling::AcDc | Coupling::Other => {}
    }

    let Some(quantity) = quantity else {
        return Reading::Value(Measurement::undefined());
    };

    let value = if data.overload || is_dash {
        f64::INFINITY
    } else {
        data.reading as f64 * factor
    };

    Reading::Value(Measurement {
        value,
        unit,
        quantity,
        flags,
        digits,
    })
}
