//! Word codes: readings at or above `0x700000` that stand for display text.

use crate::constants::{STRING_NA, WORDCODE_TABLE_MIN};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum WordCode {
    #[strum(to_string = "")]
    Space = 0x700000,
    #[strum(to_string = "Full")]
    Full = 0x700001,
    #[strum(to_string = "Beep")]
    Beep = 0x700002,
    #[strum(to_string = "Auto Power-Off")]
    AutoPowerOff = 0x700003,
    #[strum(to_string = "Backlight")]
    Backlight = 0x700004,
    #[strum(to_string = "Hazard")]
    Hazard = 0x700005,
    #[strum(to_string = "On")]
    On = 0x700006,
    #[strum(to_string = "Off")]
    Off = 0x700007,
    #[strum(to_string = "Reset")]
    Reset = 0x700008,
    #[strum(to_string = "Start")]
    Start = 0x700009,
    #[strum(to_string = "View")]
    View = 0x70000a,
    #[strum(to_string = "Pause")]
    Pause = 0x70000b,
    #[strum(to_string = "Fuse")]
    Fuse = 0x70000c,
    #[strum(to_string = "Probe")]
    Probe = 0x70000d,
    #[strum(to_string = "Definition")]
    Definition = 0x70000e,
    #[strum(to_string = "Clr")]
    Clr = 0x70000f,
    #[strum(to_string = "Er")]
    Er = 0x700010,
    #[strum(to_string = "Er1")]
    Er1 = 0x700011,
    #[strum(to_string = "Er2")]
    Er2 = 0x700012,
    #[strum(to_string = "Er3")]
    Er3 = 0x700013,
    #[strum(to_string = "-----")]
    Dash = 0x700014,
    #[strum(to_string = "-")]
    Dash1 = 0x700015,
    #[strum(to_string = "Test")]
    Test = 0x700016,
    #[strum(to_string = "--")]
    Dash2 = 0x700017,
    #[strum(to_string = "Battery")]
    Battery = 0x700018,
    #[strum(to_string = "diSLt")]
    DiSlt = 0x700019,
    #[strum(to_string = "Noise")]
    Noise = 0x70001a,
    #[strum(to_string = "Filter")]
    Filter = 0x70001b,
    #[strum(to_string = "PASS")]
    Pass = 0x70001c,
    #[strum(to_string = "null")]
    Null = 0x70001d,
    #[strum(to_string = "0 - 20")]
    Range0To20 = 0x70001e,
    #[strum(to_string = "4 - 20")]
    Range4To20 = 0x70001f,
    #[strum(to_string = "Rate")]
    Rate = 0x700020,
    #[strum(to_string = "Save")]
    Save = 0x700021,
    #[strum(to_string = "Load")]
    Load = 0x700022,
    #[strum(to_string = "Yes")]
    Yes = 0x700023,
    #[strum(to_string = "Send")]
    Send = 0x700024,
    #[strum(to_string = "Auto Hold")]
    AutoHold = 0x700025,
    #[strum(to_string = "Auto")]
    Auto = 0x700026,
    #[strum(to_string = "Continuity")]
    Continuity = 0x700027,
    #[strum(to_string = "CAL")]
    Cal = 0x700028,
    #[strum(to_string = "Version")]
    Version = 0x700029,
    #[strum(to_string = "OL")]
    Ol = 0x70002a,
    #[strum(to_string = "FULL")]
    BatteryFull = 0x70002b,
    #[strum(to_string = "HALF")]
    BatteryHalf = 0x70002c,
    #[strum(to_string = "Lo")]
    Lo = 0x70002d,
    #[strum(to_string = "Hi")]
    Hi = 0x70002e,
    #[strum(to_string = "Digits")]
    Digits = 0x70002f,
    #[strum(to_string = "Ready")]
    Ready = 0x700030,
    #[strum(to_string = "dISC")]
    Disc = 0x700031,
    #[strum(to_string = "outF")]
    OutF = 0x700032,
    #[strum(to_string = "OLA")]
    Ola = 0x700033,
    #[strum(to_string = "OLV")]
    Olv = 0x700034,
    #[strum(to_string = "OLVA")]
    Olva = 0x700035,
    #[strum(to_string = "BAD")]
    Bad = 0x700036,
    #[strum(to_string = "TEMP")]
    Temp = 0x700037,
}

/// How loudly a word code should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Severity {
    Error,
    Info,
    Silent,
}

impl WordCode {
    pub fn from_reading(reading: i32) -> Option<Self> {
        if reading < WORDCODE_TABLE_MIN {
            return None;
        }
        WordCode::try_from(reading as u32).ok()
    }

    pub fn is_dash(self) -> bool {
        matches!(self, WordCode::Dash | WordCode::Dash1 | WordCode::Dash2)
    }

    pub fn severity(self) -> Severity {
        match self {
            WordCode::Battery
            | WordCode::Hazard
            | WordCode::Fuse
            | WordCode::Probe
            | WordCode::Er
            | WordCode::Er1
            | WordCode::Er2
            | WordCode::Er3 => Severity::Error,
            WordCode::Space | WordCode::Dash | WordCode::Dash1 | WordCode::Dash2 => Severity::Silent,
            _ => Severity::Info,
        }
    }
}

pub fn is_wordcode(reading: i32) -> bool {
    reading >= WORDCODE_TABLE_MIN
}

/// Dashes are placeholders that still go through the numeric path.
pub fn is_wordcode_dash(reading: i32) -> bool {
    WordCode::from_reading(reading).is_some_and(WordCode::is_dash)
}

/// Display text for a word-code reading, `N/A` if the code is not known.
pub fn wordcode_name(reading: i32) -> String {
    match WordCode::from_reading(reading) {
        Some(code) => code.to_string(),
        None => STRING_NA.to_string(),
    }
}
