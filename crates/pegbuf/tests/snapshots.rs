#![allow(missing_docs)]
#![expect(clippy::needless_raw_string_hashes)]

use core::fmt::Write;

use pegbuf::{
    ActionInput, BufferInput, BufferOptions, InputError, Marker, SliceSource, SourceError,
    unescape::{Remap, Unescape, UnescapeJ, UnescapeX},
};

fn render_errors(errors: &[InputError]) -> String {
    let mut out = String::new();
    for err in errors {
        writeln!(out, "{err}").unwrap();
    }
    out
}

#[test]
fn snapshot_input_error_messages() {
    let errors = [
        InputError::Overflow {
            requested: 9,
            capacity: 8,
        },
        InputError::Source(SourceError::new("connection reset")),
        InputError::InvalidOptions("chunk_size must be non-zero"),
        InputError::RewindPastWindow {
            byte: 0,
            retained_from: 10,
        },
        InputError::MarkerAhead {
            byte: 3,
            current: 0,
        },
    ];
    insta::assert_snapshot!(render_errors(&errors), @r#"
    overflow: 9 bytes of lookahead exceed the buffer capacity of 8
    byte source failed: connection reset
    invalid buffer options: chunk_size must be non-zero
    cannot rewind to byte 0: the buffer only retains bytes from 10
    marker at byte 3 is ahead of the current position 0
    "#);
}

#[test]
fn snapshot_unescape_error_messages() {
    const ESCAPES: Remap = Remap::new(b"n", b"\n");
    let at = |bytes: &'static [u8]| ActionInput::new(bytes, Marker::default(), &"snap");
    let mut out = Vec::new();
    let mut rendered = String::new();
    let results = [
        ESCAPES.apply(&at(b"q"), &mut out),
        ESCAPES.apply(&at(b"nn"), &mut out),
        UnescapeX.apply(&at(b"x4g"), &mut out),
        UnescapeJ.apply(&at(b"udc00"), &mut out),
    ];
    for result in results {
        let err = result.unwrap_err();
        writeln!(rendered, "fatal={} {err}", err.is_fatal()).unwrap();
    }
    insta::assert_snapshot!(rendered, @r#"
    fatal=true grammar/action mismatch: character 'q' has no mapping at 1:1
    fatal=true grammar/action mismatch: escape span of 2 bytes has the wrong shape at 1:1
    fatal=true grammar/action mismatch: byte 0x67 is not a hexadecimal digit at 1:1
    fatal=false invalid escaped unicode code point 0xDC00 at 1:1
    "#);
}

#[test]
fn snapshot_position_after_lines() {
    let mut input = BufferInput::new(
        SliceSource::new(b"first\r\nsecond\nthird"),
        BufferOptions::default(),
        "snap.peg",
    )
    .unwrap();
    let available = input.fill(32).unwrap();
    input.consume(available);

    insta::assert_snapshot!(input.position().to_string(), @"snap.peg:3:6");
    insta::assert_debug_snapshot!(input.position(), @r#"
    Position {
        byte: 19,
        line: 3,
        column: 6,
        source: "snap.peg",
    }
    "#);
}
