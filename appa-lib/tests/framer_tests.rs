//! Byte-stream framing and resynchronization

mod common;

use appa_lib::framer::FrameReader;
use common::*;
use std::time::{Duration, Instant};

const READ_DISPLAY_RESPONSE: &str = "5555010c02803930000b00e80300880121";
const PROTOCOL_VERSION_RESPONSE: &str = "5555030401000000b2";

fn ok_frames(results: Vec<appa_lib::framer::FrameResult>) -> Vec<Frame> {
    results.into_iter().filter_map(Result::ok).collect()
}

#[test]
fn test_single_frame_in_one_chunk() {
    let mut reader = FrameReader::new();
    let frames = ok_frames(reader.feed(&hex_to_bytes(READ_DISPLAY_RESPONSE)));
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].command(), Command::ReadDisplay);
    assert!(reader.is_idle());
}

#[test]
fn test_every_split_point_yields_the_same_frame() {
    let bytes = hex_to_bytes(READ_DISPLAY_RESPONSE);
    for split in 0..=bytes.len() {
        let mut reader = FrameReader::new();
        let mut frames = ok_frames(reader.feed(&bytes[..split]));
        frames.extend(ok_frames(reader.feed(&bytes[split..])));
        assert_eq!(frames.len(), 1, "split at {}", split);
        assert_eq!(frames[0].to_bytes(), bytes, "split at {}", split);
    }
}

#[test]
fn test_byte_by_byte_feed() {
    let bytes = hex_to_bytes(READ_DISPLAY_RESPONSE);
    let mut reader = FrameReader::new();
    let mut frames = Vec::new();
    for byte in bytes.iter() {
        frames.extend(ok_frames(reader.feed(&[*byte])));
    }
    assert_eq!(frames.len(), 1);
}

#[test]
fn test_garbage_prefix_is_skipped() {
    let mut stream = vec![0x00, 0x13, 0x55, 0x42, 0xff];
    stream.extend_from_slice(&hex_to_bytes(READ_DISPLAY_RESPONSE));
    let mut reader = FrameReader::new();
    let frames = ok_frames(reader.feed(&stream));
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].command(), Command::ReadDisplay);
}

#[test]
fn test_extra_start_byte_keeps_alignment() {
    let mut stream = vec![0x55];
    stream.extend_from_slice(&hex_to_bytes(PROTOCOL_VERSION_RESPONSE));
    let mut reader = FrameReader::new();
    let frames = ok_frames(reader.feed(&stream));
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].command(), Command::ReadProtocolVersion);
}

#[test]
fn test_multiple_frames_per_chunk() {
    let mut stream = hex_to_bytes(READ_DISPLAY_RESPONSE).to_vec();
    stream.extend_from_slice(&hex_to_bytes(PROTOCOL_VERSION_RESPONSE));
    stream.extend_from_slice(&hex_to_bytes(READ_DISPLAY_RESPONSE));
    let mut reader = FrameReader::new();
    let commands: Vec<Command> = ok_frames(reader.feed(&stream)).iter().map(Frame::command).collect();
    assert_eq!(
        commands,
        vec![Command::ReadDisplay, Command::ReadProtocolVersion, Command::ReadDisplay]
    );
}

#[test]
fn test_bad_checksum_reported_then_resync() {
    let mut corrupt = hex_to_bytes(READ_DISPLAY_RESPONSE).to_vec();
    let last = corrupt.len() - 1;
    corrupt[last] ^= 0x01;
    corrupt.extend_from_slice(&hex_to_bytes(PROTOCOL_VERSION_RESPONSE));

    let mut reader = FrameReader::new();
    let results = reader.feed(&corrupt);
    assert_eq!(results.len(), 2);
    assert!(matches!(results[0], Err(AppaError::ChecksumMismatch { .. })));
    let frame = results[1].as_ref().expect("second frame should parse");
    assert_eq!(frame.command(), Command::ReadProtocolVersion);
}

#[test]
fn test_request_commands_are_not_frames() {
    // calibration commands never come back from the meter
    let stream = frame_bytes(Command::CalEnter, &[]);
    let mut reader = FrameReader::new();
    let results = reader.feed(&stream);
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(AppaError::UnknownCommand(0x80))));
    assert!(reader.is_idle());
}

#[test]
fn test_invalid_length_is_discarded() {
    // Read Display with an 11 byte payload
    let mut stream = vec![0x55, 0x55, 0x01, 0x0b];
    stream.extend_from_slice(&hex_to_bytes(PROTOCOL_VERSION_RESPONSE));
    let mut reader = FrameReader::new();
    let results = reader.feed(&stream);
    assert_eq!(results.len(), 2);
    assert!(matches!(
        results[0],
        Err(AppaError::InvalidLength {
            command: 0x01,
            length: 11
        })
    ));
    let frame = results[1].as_ref().expect("protocol version frame");
    assert_eq!(frame.command(), Command::ReadProtocolVersion);
}

#[test]
fn test_length_byte_lost_before_next_marker() {
    // the length byte never arrived, the next frame starts right after the command
    let mut stream = vec![0x55, 0x55, 0x03];
    stream.extend_from_slice(&hex_to_bytes(PROTOCOL_VERSION_RESPONSE));
    let mut reader = FrameReader::new();
    let results = reader.feed(&stream);
    assert!(matches!(results[0], Err(AppaError::InvalidLength { command: 0x03, .. })));
    let frames = ok_frames(results);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].command(), Command::ReadProtocolVersion);
}

#[test]
fn test_garbage_between_frames_at_every_chunk_size() {
    let first = hex_to_bytes(PROTOCOL_VERSION_RESPONSE);
    let second = hex_to_bytes(READ_DISPLAY_RESPONSE);
    let garbage = [0x00, 0x55, 0x13, 0xff, 0x55, 0x55, 0xc0, 0x42];
    let mut stream = first.to_vec();
    stream.extend_from_slice(&garbage);
    stream.extend_from_slice(&second);

    for chunk_size in 1..=stream.len() {
        let mut reader = FrameReader::new();
        let mut results = Vec::new();
        for chunk in stream.chunks(chunk_size) {
            results.extend(reader.feed(chunk));
        }
        let errors = results.iter().filter(|r| r.is_err()).count();
        let frames: Vec<Bytes> = ok_frames(results).iter().map(Frame::to_bytes).collect();
        assert_eq!(frames, vec![first.clone(), second.clone()], "chunk size {}", chunk_size);
        // only `55 55 c0` opens a frame
        assert_eq!(errors, 1, "chunk size {}", chunk_size);
        assert!(reader.is_idle(), "chunk size {}", chunk_size);
    }
}

/// Flip every bit of `frame` except the checksum, append `trailer` and
/// check that the trailing frames survive. Past the marker every flip must
/// also be reported.
fn assert_bit_flips_resync(frame: &[u8], trailer: &[Bytes]) {
    let mut tail = Vec::new();
    for t in trailer {
        tail.extend_from_slice(t);
    }
    for index in 0..frame.len() - 1 {
        for bit in 0..8 {
            let mut stream = frame.to_vec();
            stream[index] ^= 1 << bit;
            stream.extend_from_slice(&tail);

            let mut reader = FrameReader::new();
            let results = reader.feed(&stream);
            let errors = results.iter().filter(|r| r.is_err()).count();
            let frames: Vec<Bytes> = ok_frames(results).iter().map(Frame::to_bytes).collect();
            assert_eq!(frames, trailer, "byte {} bit {}", index, bit);
            if index >= 2 {
                assert!(errors > 0, "byte {} bit {} went unreported", index, bit);
            }
        }
    }
}

#[test]
fn test_single_bit_flips_in_fixed_size_frame() {
    let frame = hex_to_bytes(PROTOCOL_VERSION_RESPONSE);
    assert_bit_flips_resync(&frame, &[hex_to_bytes(READ_DISPLAY_RESPONSE)]);
}

#[test]
fn test_single_bit_flips_in_memory_frame() {
    // a corrupted length byte can still be valid for Read Memory and
    // reach into the frames behind it
    let frame = memory_frame(&[0x10, 0x20, 0x30, 0x40, 0x60, 0x70]);
    assert_eq!(hex::encode(&frame), "55551a061020304060703a");
    let display = hex_to_bytes(READ_DISPLAY_RESPONSE);
    assert_bit_flips_resync(&frame, &[display.clone(), display]);
}

#[test]
fn test_stale_partial_frame_is_dropped() {
    let bytes = hex_to_bytes(PROTOCOL_VERSION_RESPONSE);
    let mut reader = FrameReader::with_stale_timeout(Duration::from_millis(100));
    let start = Instant::now();

    assert!(reader.feed_at(&bytes[..5], start).is_empty());
    assert!(!reader.is_idle());

    // the remainder arrives too late and no longer completes a frame
    let late = start + Duration::from_millis(500);
    assert!(reader.feed_at(&bytes[5..], late).is_empty());

    let frames = ok_frames(reader.feed_at(&bytes, late));
    assert_eq!(frames.len(), 1);
}

#[test]
fn test_reset_discards_partial_frame() {
    let bytes = hex_to_bytes(READ_DISPLAY_RESPONSE);
    let mut reader = FrameReader::new();
    reader.feed(&bytes[..6]);
    assert_eq!(reader.buffered(), 6);
    reader.reset();
    assert!(reader.is_idle());
    assert_eq!(reader.buffered(), 0);
}

#[test]
fn test_memory_response_of_any_length_up_to_64() {
    let data: Vec<u8> = (0..64).collect();
    let stream = memory_frame(&data);
    let mut reader = FrameReader::new();
    let frames = ok_frames(reader.feed(&stream));
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].payload().as_ref(), data.as_slice());
}
