//! Integration tests for the Alpha protocol engine
//!
//! These tests drive whole frames through the public API:
//! - Frame grammar and stream parsing
//! - Command decoding with per-packet error scoping
//! - Checksum scopes against captured device traffic
//! - Payload rewriting over streams

use alpha_protocol::checksum;
use alpha_protocol::rewrite::remove_all;
use alpha_protocol::{
    parse_all_frames, parse_frame, Address, Checksum, ChecksumScope, ChecksumStatus, Command,
    CommandError, CommandRegistry, Frame, FrameError, MessageToken, Packet, PayloadRewriter,
    Tables, WriteTextFileCommand,
};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// Decode every packet of a single frame with the built-in registry
    pub fn decode_all(bytes: &[u8], scope: ChecksumScope) -> Vec<Result<Command, CommandError>> {
        let frame = parse_frame(bytes).unwrap();
        let registry = CommandRegistry::new();
        frame
            .decode(&registry, scope)
            .into_iter()
            .map(|p| p.command)
            .collect()
    }

    /// Unwrap a Write Text File command
    pub fn write_text(result: &Result<Command, CommandError>) -> &WriteTextFileCommand {
        match result {
            Ok(Command::WriteTextFile(cmd)) => cmd,
            other => panic!("expected write text file, got {other:?}"),
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn test_end_to_end_hello() {
    let frame = parse_frame(b"]!Z00]\"A1Hello]#]$").unwrap();
    assert_eq!(frame.header, Address::new(b'Z', *b"00"));
    assert_eq!(frame.packets.len(), 1);

    let commands = helpers::decode_all(b"]!Z00]\"A1Hello]#]$", ChecksumScope::Content);
    let cmd = helpers::write_text(&commands[0]);
    assert_eq!(cmd.file_label, b'1');
    assert!(cmd.mode.is_none());
    assert_eq!(
        cmd.tokens,
        vec![
            MessageToken::Char(b'H'),
            MessageToken::Char(b'e'),
            MessageToken::Char(b'l'),
            MessageToken::Char(b'l'),
            MessageToken::Char(b'o'),
        ]
    );
}

#[test]
fn test_label_bang_then_unknown_mode_is_message() {
    let commands = helpers::decode_all(b"]!Z00]\"A!1Hello]#]$", ChecksumScope::Content);
    let cmd = helpers::write_text(&commands[0]);
    assert_eq!(cmd.file_label, b'!');
    assert!(cmd.mode.is_none());
    assert_eq!(cmd.message, b"1Hello");
}

#[test]
fn test_mode_bytes_that_look_like_text() {
    // '2' is a display position and '1' a mode code, so the field is taken
    let commands = helpers::decode_all(b"]!Z00]\"A!21Hello]#]$", ChecksumScope::Content);
    let cmd = helpers::write_text(&commands[0]);
    let mode = cmd.mode.unwrap();
    assert_eq!(mode.display_position.code, b'2');
    assert_eq!(mode.mode.code, b'1');
    assert_eq!(cmd.message, b"Hello");
}

#[test]
fn test_special_mode_without_identifier_is_rejected() {
    let commands = helpers::decode_all(b"]!Z00]\"A! n]#]\"A1ok]#]$", ChecksumScope::Content);
    assert!(matches!(
        commands[0],
        Err(CommandError::InvalidModeField { offset: 4, .. })
    ));
    assert_eq!(helpers::write_text(&commands[1]).message, b"ok");
}

#[test]
fn test_priority_label_rejected() {
    let commands = helpers::decode_all(b"]!Z00]\"A0 bHello]#]$", ChecksumScope::Content);
    assert_eq!(
        commands[0],
        Err(CommandError::InvalidFileLabel {
            offset: 1,
            label: 0x30
        })
    );
}

#[test]
fn test_unknown_command_keeps_siblings() {
    let input = b"]!Z00]\"A1one]#]\"\x99xyz]#]\"A2two]#]$";
    let commands = helpers::decode_all(input, ChecksumScope::Content);
    assert_eq!(commands.len(), 3);
    assert_eq!(helpers::write_text(&commands[0]).message, b"one");
    assert_eq!(commands[1], Err(CommandError::UnknownCommand { code: 0x99 }));
    assert_eq!(helpers::write_text(&commands[2]).message, b"two");
}

#[test]
fn test_device_capture_checksums() {
    let mut input = vec![0u8; 20];
    input.extend_from_slice(b"]!Z00]\"E$AAU000AFF00!AL04BAFF00]#0583]\"E2!A1]#010F]$");

    let frame = parse_frame(&input).unwrap();
    let registry = CommandRegistry::new();

    for decoded in frame.decode(&registry, ChecksumScope::Transmission) {
        assert_eq!(decoded.checksum, ChecksumStatus::Valid);
        assert!(matches!(
            decoded.command,
            Ok(Command::WriteSpecialFunction(_))
        ));
    }

    // Content-only sums leave out the STX/ETX codes
    let decoded = frame.decode(&registry, ChecksumScope::Content);
    match decoded[1].checksum {
        ChecksumStatus::Mismatch(m) => {
            assert_eq!(m.expected, 0x010A);
            assert_eq!(m.actual, 0x010F);
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
    assert_eq!(frame.encode(), input);
}

#[test]
fn test_inline_mode_changes() {
    let input = b"]!Z00]\"AA \x62Thank You]; \x61for using];&nXthe demo]#]$";
    let commands = helpers::decode_all(input, ChecksumScope::Content);
    let cmd = helpers::write_text(&commands[0]);

    let segments = cmd.segments(Tables::builtin());
    let texts: Vec<&[u8]> = segments.iter().map(|s| s.text.as_slice()).collect();
    assert_eq!(texts, vec![&b"Thank You"[..], b"for using", b"the demo"]);
    assert_eq!(segments[2].mode.unwrap().special.unwrap().name, "FIREWORKS");
}

#[test]
fn test_stream_error_reports_offset() {
    let input = b"]!Z00]\"A1ok]#]$\0\0]!Z0";
    let results: Vec<_> = parse_all_frames(input).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert_eq!(results[1], Err(FrameError::MalformedHeader { offset: 17 }));
}

// ============================================================================
// Rewriting
// ============================================================================

#[test]
fn test_strip_demo_message() {
    let boilerplate = "Thank You for using the demo";
    let mut input = vec![0u8; 5];
    let content = format!("AA bHello {boilerplate}");
    let sealed = Packet::with_checksum(content.into_bytes(), ChecksumScope::Content);
    let frame = Frame::new(Address::new(b'Z', *b"00"), vec![sealed]);
    frame.encode_into(&mut input);

    let outcome = PayloadRewriter::new(boilerplate)
        .rewrite_stream(&input)
        .unwrap();
    assert_eq!(outcome.packets_rewritten, 1);

    let frame = parse_frame(&outcome.bytes).unwrap();
    assert_eq!(frame.leading_pad, 5);
    assert_eq!(frame.packets[0].content, b"AA bHello ");
    assert_eq!(frame.packets[0].verify(ChecksumScope::Content), Ok(()));

    let again = PayloadRewriter::new(boilerplate)
        .rewrite_stream(&outcome.bytes)
        .unwrap();
    assert_eq!(again.packets_rewritten, 0);
    assert_eq!(again.bytes, outcome.bytes);
}

#[test]
fn test_empty_target_changes_nothing() {
    let input = b"]!Z00]\"A1Hello]#]$";
    let outcome = PayloadRewriter::new(Vec::new()).rewrite_stream(input).unwrap();
    assert_eq!(outcome.packets_rewritten, 0);
    assert_eq!(outcome.bytes, input);
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn text_byte() -> impl Strategy<Value = u8> {
        0x20u8..=0x7E
    }

    /// Printable content that never holds an End-Of-Text marker
    fn text(max: usize) -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(text_byte(), 0..max)
            .prop_filter("content must not end the packet", |c| !contains_end_of_text(c))
    }

    fn contains_end_of_text(bytes: &[u8]) -> bool {
        bytes.windows(2).any(|w| w == b"]#")
    }

    /// Type codes stay clear of ']' so a header never looks like a marker
    fn type_code() -> impl Strategy<Value = u8> {
        prop_oneof![0x20u8..0x5D, 0x5Eu8..0x7F]
    }

    fn address_byte() -> impl Strategy<Value = u8> {
        prop_oneof![b'0'..=b'9', Just(b'?')]
    }

    fn address() -> impl Strategy<Value = Address> {
        (type_code(), address_byte(), address_byte())
            .prop_map(|(t, a, b)| Address::new(t, [a, b]))
    }

    fn packet() -> impl Strategy<Value = Packet> {
        (text(40), any::<bool>()).prop_map(|(content, sealed)| {
            if sealed {
                Packet::with_checksum(content, ChecksumScope::Content)
            } else {
                Packet::new(content)
            }
        })
    }

    fn frame() -> impl Strategy<Value = Frame> {
        (
            address(),
            prop::collection::vec(address(), 0..3),
            prop::collection::vec(packet(), 1..4),
            0usize..8,
            0usize..8,
        )
            .prop_map(|(header, repeats, packets, leading, trailing)| {
                repeats
                    .into_iter()
                    .fold(Frame::new(header, packets), Frame::with_repeat)
                    .with_padding(leading, trailing)
            })
    }

    /// Small alphabet so targets occur often
    fn ab_text(max: usize) -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(prop::sample::select(b"ab ".to_vec()), 0..max)
    }

    /// Brackets and hashes around a removable byte
    fn marker_text(max: usize) -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(prop::sample::select(b"]#X a".to_vec()), 0..max)
            .prop_filter("content must not end the packet", |c| !contains_end_of_text(c))
    }

    proptest! {
        #[test]
        fn checksum_round_trip(content in text(64)) {
            prop_assert!(checksum::verify(&content, checksum::compute(&content).as_bytes()));
            let sum = Checksum::compute(&content);
            prop_assert_eq!(sum.value(), checksum::sum(&content));
        }

        #[test]
        fn checksum_tracks_every_byte(content in text(64), index in any::<prop::sample::Index>()) {
            prop_assume!(!content.is_empty());
            let i = index.index(content.len());
            let mut changed = content.clone();
            changed[i] = if changed[i] == b'~' { b' ' } else { changed[i] + 1 };
            prop_assert_ne!(Checksum::compute(&content), Checksum::compute(&changed));
        }

        #[test]
        fn frame_round_trip(frame in frame()) {
            let encoded = frame.encode();
            prop_assert_eq!(encoded.len(), frame.encoded_len());

            let parsed = parse_frame(&encoded).unwrap();
            prop_assert_eq!(&parsed, &frame);
            prop_assert_eq!(parsed.encode(), encoded);
        }

        #[test]
        fn frame_stream_round_trip(frames in prop::collection::vec(frame(), 1..4)) {
            let encoded: Vec<u8> = frames.iter().flat_map(Frame::encode).collect();
            let parsed: Vec<Frame> = parse_all_frames(&encoded)
                .collect::<Result<_, _>>()
                .unwrap();
            prop_assert_eq!(parsed.len(), frames.len());
            let reencoded: Vec<u8> = parsed.iter().flat_map(Frame::encode).collect();
            prop_assert_eq!(reencoded, encoded);
        }

        #[test]
        fn rewrite_is_idempotent(content in ab_text(32), target in ab_text(4)) {
            let rewriter = PayloadRewriter::new(target);
            let packet = Packet::new(content);
            let once = rewriter.rewrite_packet(&packet);
            let twice = rewriter.rewrite_packet(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn rewrite_removes_target(content in ab_text(32), target in ab_text(4)) {
            prop_assume!(!target.is_empty());
            let rewritten = PayloadRewriter::new(target.clone()).rewrite_packet(&Packet::new(content));
            prop_assert!(!PayloadRewriter::new(target).matches(&rewritten.content));
            prop_assert!(rewritten.checksum_status(ChecksumScope::Content).is_acceptable());
        }

        #[test]
        fn rewrite_without_target_is_noop(content in ab_text(32), sealed in any::<bool>()) {
            let packet = if sealed {
                Packet::with_checksum(content, ChecksumScope::Transmission)
            } else {
                Packet::new(content)
            };
            let rewriter = PayloadRewriter::new(b"z".to_vec());
            prop_assert_eq!(rewriter.rewrite_packet(&packet), packet);
        }

        #[test]
        fn rewritten_stream_still_parses(
            contents in prop::collection::vec(marker_text(24), 1..4),
            sealed in any::<bool>(),
        ) {
            let packets: Vec<Packet> = contents
                .into_iter()
                .map(|c| if sealed { Packet::with_checksum(c, ChecksumScope::Content) } else { Packet::new(c) })
                .collect();
            let count = packets.len();
            let input = Frame::new(Address::new(b'Z', *b"00"), packets).encode();

            let outcome = PayloadRewriter::new(b"X".to_vec()).rewrite_stream(&input).unwrap();
            let frame = parse_frame(&outcome.bytes).unwrap();
            prop_assert_eq!(frame.packets.len(), count);
            for packet in &frame.packets {
                prop_assert!(!contains_end_of_text(&packet.content));
            }
        }

        #[test]
        fn remove_all_never_grows(content in ab_text(32), target in ab_text(4)) {
            prop_assert!(remove_all(&content, &target).len() <= content.len());
        }
    }
}
