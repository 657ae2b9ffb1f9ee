//! Display record interpretation: scaling, flags and word codes

mod common;

use appa_lib::measurement::{Measurement, MqFlags, Quantity, Reading, SiUnit, interpret};
use appa_lib::model::ChannelRole;
use appa_lib::wordcode::Severity;
use common::*;

fn primary(data: &DisplayData, function_code: FunctionCode) -> Measurement {
    interpret(data, function_code, false, ChannelRole::Primary).measurement()
}

fn assert_close(actual: f64, expected: f64) {
    let tolerance = expected.abs() * 1e-9 + 1e-12;
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn test_dot_and_unit_scaling_table() {
    let cases = [
        (12345, Dot::Dp3, Unit::Volt, 12.345, 3, SiUnit::Volt, Quantity::Voltage),
        (12345, Dot::Dp2, Unit::MilliVolt, 0.12345, 5, SiUnit::Volt, Quantity::Voltage),
        (1500, Dot::Dp1, Unit::MicroAmpere, 0.00015, 7, SiUnit::Ampere, Quantity::Current),
        (2500, Dot::Dp3, Unit::MilliAmpere, 0.0025, 6, SiUnit::Ampere, Quantity::Current),
        (4700, Dot::Dp2, Unit::NanoFarad, 4.7e-8, 11, SiUnit::Farad, Quantity::Capacitance),
        (1000, Dot::Dp3, Unit::MicroFarad, 1e-6, 9, SiUnit::Farad, Quantity::Capacitance),
        (12, Dot::Dp1, Unit::MilliFarad, 0.0012, 4, SiUnit::Farad, Quantity::Capacitance),
        (10000, Dot::Dp4, Unit::KiloOhm, 1000.0, 1, SiUnit::Ohm, Quantity::Resistance),
        (2200, Dot::Dp3, Unit::MegaOhm, 2.2e6, -3, SiUnit::Ohm, Quantity::Resistance),
        (15, Dot::Dp1, Unit::GigaOhm, 1.5e9, -8, SiUnit::Ohm, Quantity::Resistance),
        (5000, Dot::Dp2, Unit::KiloHertz, 50000.0, -1, SiUnit::Hertz, Quantity::Frequency),
        (100, Dot::Dp2, Unit::MegaHertz, 1e6, -4, SiUnit::Hertz, Quantity::Frequency),
        (253, Dot::Dp1, Unit::DegreeCelsius, 25.3, 1, SiUnit::Celsius, Quantity::Temperature),
        (3, Dot::None, Unit::Minute, 180.0, 0, SiUnit::Second, Quantity::Time),
        (250, Dot::Dp1, Unit::MilliSecond, 0.025, 4, SiUnit::Second, Quantity::Time),
        (12, Dot::Dp1, Unit::KiloWatt, 1200.0, -2, SiUnit::Watt, Quantity::Power),
        (-105, Dot::Dp1, Unit::DecibelMilliWatt, -10.5, 1, SiUnit::DecibelMw, Quantity::Power),
        (99, Dot::Dp2, Unit::PowerFactor, 0.99, 2, SiUnit::Unitless, Quantity::PowerFactor),
        (505, Dot::Dp1, Unit::Percent, 50.5, 1, SiUnit::Percentage, Quantity::Difference),
    ];

    for (value, dot, unit, expected, digits, si_unit, quantity) in cases {
        let m = primary(&reading(value, dot, unit), FunctionCode::None);
        assert_close(m.value, expected);
        assert_eq!(m.digits, digits, "digits for {} {}", dot, unit);
        assert_eq!(m.unit, si_unit);
        assert_eq!(m.quantity, quantity);
    }
}

#[test]
fn test_unknown_dot_is_treated_as_no_dot() {
    let m = primary(&reading(42, Dot::Unknown(7), Unit::Volt), FunctionCode::DcV);
    assert_close(m.value, 42.0);
    assert_eq!(m.digits, 0);
}

#[test]
fn test_negative_reading() {
    let m = primary(&reading(-1234, Dot::Dp2, Unit::Volt), FunctionCode::DcV);
    assert_close(m.value, -12.34);
}

#[test]
fn test_wordcode_boundary() {
    let below = primary(&reading(0x6fffff, Dot::None, Unit::Volt), FunctionCode::DcV);
    assert_close(below.value, 0x6fffff as f64);
    assert_eq!(below.quantity, Quantity::Voltage);

    let space = interpret(&reading(0x700000, Dot::None, Unit::Volt), FunctionCode::DcV, false, ChannelRole::Primary);
    let status = space.status().expect("word code should yield a status");
    assert_eq!(status.severity, Severity::Silent);
    assert_eq!(space.measurement(), Measurement::undefined());
}

#[test]
fn test_dash_goes_through_numeric_path() {
    let dash = interpret(&reading(0x700014, Dot::Dp2, Unit::Volt), FunctionCode::AcV, false, ChannelRole::Primary);
    assert!(matches!(dash, Reading::Value(_)));
    let m = dash.measurement();
    assert!(m.value.is_infinite() && m.value > 0.0);
    assert_eq!(m.unit, SiUnit::Volt);
    assert_eq!(m.quantity, Quantity::Voltage);
    assert_eq!(m.digits, 2);
    assert!(m.flags.contains(MqFlags::AC | MqFlags::RMS));
}

#[test]
fn test_overload_takes_precedence_over_reading() {
    let mut data = reading(12345, Dot::Dp3, Unit::Volt);
    data.overload = true;
    let m = primary(&data, FunctionCode::DcV);
    assert_eq!(m.value, f64::INFINITY);
    assert_eq!(m.unit, SiUnit::Volt);
    assert_eq!(m.digits, 3);
}

#[test]
fn test_error_wordcode_severity() {
    let fuse = interpret(&reading(0x70000c, Dot::None, Unit::Ampere), FunctionCode::DcA, false, ChannelRole::Primary);
    let status = fuse.status().expect("status");
    assert_eq!(status.text, "Fuse");
    assert_eq!(status.severity, Severity::Error);
}

#[test]
fn test_definition_wordcode_carries_temperature_unit() {
    let def = interpret(
        &reading(0x70000e, Dot::None, Unit::DegreeCelsius),
        FunctionCode::DegC,
        false,
        ChannelRole::Secondary,
    );
    assert_eq!(def.status().expect("status").text, "Definition °C");
}

#[test]
fn test_unknown_wordcode_is_not_available() {
    let unknown = interpret(&reading(0x7000ff, Dot::None, Unit::Volt), FunctionCode::DcV, false, ChannelRole::Primary);
    let status = unknown.status().expect("status");
    assert_eq!(status.text, "N/A");
    assert_eq!(status.severity, Severity::Info);
}

#[test]
fn test_missing_unit_falls_back_to_count() {
    let m = primary(&reading(77, Dot::Dp1, Unit::None), FunctionCode::DcV);
    assert_eq!(m, Measurement::undefined());
    assert_eq!(m.quantity, Quantity::Count);
    assert!(m.flags.is_empty());
}

#[test]
fn test_ac_flags_only_for_electrical_units() {
    let volts = primary(&reading(2300, Dot::Dp1, Unit::Volt), FunctionCode::AcV);
    assert_eq!(volts.flags, MqFlags::AC | MqFlags::RMS);

    // the secondary of AC V shows frequency
    let hertz = interpret(&reading(500, Dot::Dp1, Unit::Hertz), FunctionCode::AcV, false, ChannelRole::Secondary)
        .measurement();
    assert!(hertz.flags.is_empty());
}

#[test]
fn test_acdc_flags() {
    let m = primary(&reading(500, Dot::Dp2, Unit::Ampere), FunctionCode::AcDcA);
    assert_eq!(m.flags, MqFlags::AC | MqFlags::DC | MqFlags::RMS);
}

#[test]
fn test_dc_flag_applies_to_any_unit() {
    let m = primary(&reading(500, Dot::Dp2, Unit::MilliAmpere), FunctionCode::DcMa);
    assert_eq!(m.flags, MqFlags::DC);
}

#[test]
fn test_diode_and_continuity() {
    let diode = primary(&reading(612, Dot::Dp3, Unit::Volt), FunctionCode::Diode);
    assert_eq!(diode.flags, MqFlags::DIODE | MqFlags::DC);
    assert_eq!(diode.quantity, Quantity::Voltage);

    let beep = primary(&reading(12, Dot::Dp1, Unit::Ohm), FunctionCode::Continuity);
    assert_eq!(beep.quantity, Quantity::Continuity);
    assert_eq!(beep.unit, SiUnit::Ohm);
}

#[test]
fn test_data_content_flags() {
    let mut data = reading(100, Dot::None, Unit::Volt);

    data.data_content = DataContent::Maximum;
    assert_eq!(primary(&data, FunctionCode::None).flags, MqFlags::MAX);

    data.data_content = DataContent::Average;
    assert_eq!(primary(&data, FunctionCode::None).flags, MqFlags::AVG);

    data.data_content = DataContent::PeakHoldMin;
    assert_eq!(primary(&data, FunctionCode::None).flags, MqFlags::MIN);
    let sub = interpret(&data, FunctionCode::None, false, ChannelRole::Secondary).measurement();
    assert_eq!(sub.flags, MqFlags::MIN | MqFlags::HOLD);

    data.data_content = DataContent::Hold;
    assert!(primary(&data, FunctionCode::None).flags.is_empty());
    let sub = interpret(&data, FunctionCode::None, false, ChannelRole::Secondary).measurement();
    assert_eq!(sub.flags, MqFlags::HOLD);

    data.data_content = DataContent::RelDelta;
    assert_eq!(primary(&data, FunctionCode::None).flags, MqFlags::RELATIVE);
    let sub = interpret(&data, FunctionCode::None, false, ChannelRole::Secondary).measurement();
    assert_eq!(sub.flags, MqFlags::REFERENCE);
}

#[test]
fn test_autorange_flag() {
    let data = reading(100, Dot::None, Unit::Volt);
    let m = interpret(&data, FunctionCode::DcV, true, ChannelRole::Primary).measurement();
    assert_eq!(m.flags, MqFlags::DC | MqFlags::AUTORANGE);
}

#[test]
fn test_measurement_display() {
    let m = primary(&reading(12345, Dot::Dp3, Unit::Volt), FunctionCode::DcV);
    assert_eq!(m.to_string(), "12.345 V [DC]");
    let sample = Measurement::sample_index(3);
    assert_eq!(sample.to_string(), "3");
    assert_eq!(Measurement::undefined().to_string(), "OL");
}
