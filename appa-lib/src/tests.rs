use crate::codec::{checksum, i24_from_le_bytes};
use crate::command::Command;
use crate::display::{DataContent, Dot, FunctionCode, Unit};
use crate::frame::Frame;
use crate::info::DeviceIdentity;
use crate::message::{Request, Response, decode_read_display, decode_read_information};
use crate::model::ModelId;
use bytes::Bytes;

const READ_DISPLAY_RESPONSE: &str = "5555010c02803930000b00e80300880121";
const READ_INFORMATION_RESPONSE: &str = "5555003441505041203530364220202020202020202020202020202020202020202020203132333435363738202020202020202006006400eb";

fn frame_from_hex(hex_data: &str) -> Frame {
    let bytes = Bytes::from(hex::decode(hex_data).expect("Failed to decode hex"));
    Frame::try_from(bytes).expect("Failed to parse frame")
}

#[test]
fn test_read_information_request() {
    let bytes = Request::ReadInformation.to_frame().to_bytes();
    assert_eq!(hex::encode(&bytes), "55550000aa");
}

#[test]
fn test_read_display_request() {
    let bytes = Request::ReadDisplay.to_frame().to_bytes();
    assert_eq!(hex::encode(&bytes), "55550100ab");
}

#[test]
fn test_checksum_is_byte_sum() {
    assert_eq!(checksum(&[0x55, 0x55, 0x00, 0x00]), 0xaa);
    assert_eq!(checksum(&[0xff, 0x02]), 0x01);
}

#[test]
fn test_parse_read_display() {
    let frame = frame_from_hex(READ_DISPLAY_RESPONSE);
    assert_eq!(frame.command(), Command::ReadDisplay);
    assert_eq!(frame.payload_len(), 12);

    let display = decode_read_display(&frame).expect("Failed to decode display");
    assert_eq!(display.function_code, FunctionCode::DcV);
    assert!(display.auto_range);
    assert!(!display.auto_test);
    assert_eq!(display.range_code, 0);

    assert_eq!(display.primary.reading, 12345);
    assert_eq!(display.primary.dot, Dot::Dp3);
    assert_eq!(display.primary.unit, Unit::Volt);
    assert_eq!(display.primary.data_content, DataContent::MeasuringData);
    assert!(!display.primary.overload);

    assert_eq!(display.secondary.reading, 1000);
    assert_eq!(display.secondary.unit, Unit::Hertz);
    assert_eq!(display.secondary.data_content, DataContent::Frequency);
}

#[test]
fn test_parse_read_information() {
    let frame = frame_from_hex(READ_INFORMATION_RESPONSE);
    let info = decode_read_information(&frame).expect("Failed to decode information");
    assert_eq!(info.model_name, "APPA 506B");
    assert_eq!(info.serial_number, "12345678");
    assert_eq!(info.model_id, 0x06);
    assert_eq!(info.firmware_version, 100);

    let identity = DeviceIdentity::from(&info);
    assert_eq!(identity.vendor, "APPA");
    assert_eq!(identity.model, "506B");
    assert_eq!(identity.version, "1.00");
    assert_eq!(identity.model_id, ModelId::Appa506B);
}

#[test]
fn test_response_roundtrip_display() {
    let frame = frame_from_hex(READ_DISPLAY_RESPONSE);
    let response = Response::try_from(frame.clone()).expect("Failed to decode response");
    let encoded = response.to_frame().expect("Failed to encode response");
    assert_eq!(encoded.to_bytes(), frame.to_bytes());
}

#[test]
fn test_failure_frame_in_place_of_display() {
    let frame = frame_from_hex("55557001021d");
    let err = decode_read_display(&frame).unwrap_err();
    assert!(matches!(err, crate::error::AppaError::DeviceFailure(0x02)));
    assert!(matches!(Response::try_from(frame), Ok(Response::Failure { code: 0x02 })));
}

#[test]
fn test_i24_sign_extension() {
    assert_eq!(i24_from_le_bytes([0xff, 0xff, 0xff]), -1);
    assert_eq!(i24_from_le_bytes([0x00, 0x00, 0x80]), -8388608);
    assert_eq!(i24_from_le_bytes([0xff, 0xff, 0x7f]), 8388607);
    assert_eq!(i24_from_le_bytes([0x39, 0x30, 0x00]), 12345);
}

#[test]
fn test_model_secondary_display() {
    assert!(ModelId::Appa506B.has_secondary_display());
    assert!(ModelId::from(0x600u16).has_secondary_display());
    assert!(!ModelId::Appa172.has_secondary_display());
    assert!(!ModelId::from(0x1234u16).is_valid());
    assert_eq!(ModelId::from(0x06u16).to_string(), "APPA 506B");
}

#[test]
fn test_bad_checksum_rejected() {
    let bytes = Bytes::from(hex::decode("55550100ac").expect("Failed to decode hex"));
    assert!(matches!(
        Frame::try_from(bytes),
        Err(crate::error::AppaError::ChecksumMismatch {
            computed: 0xab,
            received: 0xac
        })
    ));
}
