#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pegbuf::{
    BufferInput, BufferOptions, ByteSource, InputError, Marker, RewindMode,
    SliceSource,
    eol::LfCrlf,
    unescape::{Unescape, UnescapeJ, UnescapeU, UnescapeX},
};

#[derive(Debug, Arbitrary)]
enum Op {
    Ensure(u8),
    Fill(u8),
    Consume(u8),
    ConsumeEol,
    Discard,
    Open,
    Close { commit: bool },
    Save,
    Restore,
    Decode,
}

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    maximum: u8,
    chunk_size: u8,
    max_pull: u8,
    ops: Vec<Op>,
    data: &'a [u8],
}

type Buffer<'a> = BufferInput<SliceSource<'a>, LfCrlf, &'static str>;

/// Drives `ops` until a `Close`, asserting the window always mirrors `data`.
/// Returns `Some(commit)` for a `Close`, `None` once the ops run out.
fn run<'a>(
    input: &mut Buffer<'a>,
    ops: &mut std::slice::Iter<'_, Op>,
    data: &[u8],
    saved: &mut Marker,
) -> Option<bool> {
    while let Some(op) = ops.next() {
        match op {
            Op::Ensure(n) => {
                let _ = input.ensure_available(usize::from(*n));
            }
            Op::Fill(n) => {
                let _ = input.fill(usize::from(*n));
            }
            Op::Consume(n) => input.consume(usize::from(*n).min(input.occupied())),
            Op::ConsumeEol => {
                let _ = input.consume_eol();
            }
            Op::Discard => input.discard(),
            Op::Open => {
                let opened = (input.byte(), input.line(), input.column());
                let mut guard = input.auto_rewind(RewindMode::Active);
                match run(&mut guard, ops, data, saved) {
                    Some(true) => guard.commit(),
                    _ => {
                        drop(guard);
                        assert_eq!((input.byte(), input.line(), input.column()), opened);
                    }
                }
            }
            Op::Close { commit } => return Some(*commit),
            Op::Save => *saved = input.rewind_save(),
            Op::Restore => match input.rewind_restore(saved) {
                Ok(()) | Err(InputError::RewindPastWindow { .. }) => {}
                Err(e) => panic!("unexpected restore failure: {e}"),
            },
            Op::Decode => decode(input, saved),
        }
        let byte = input.byte();
        assert_eq!(input.current(), &data[byte..byte + input.occupied()]);
    }
    None
}

/// Feeds the span since `saved` to the decoders; they must never panic.
fn decode<R: ByteSource>(input: &BufferInput<R, LfCrlf, &'static str>, saved: &Marker) {
    let Ok(span) = input.action_input(saved) else {
        return;
    };
    let mut out = Vec::new();
    let _ = UnescapeJ.try_apply(&span, &mut out);
    let _ = UnescapeU.apply(&span, &mut out);
    let _ = UnescapeX.apply(&span, &mut out);
}

fuzz_target!(|case: Input<'_>| {
    let options = BufferOptions {
        maximum: usize::from(case.maximum).max(1),
        chunk_size: usize::from(case.chunk_size).max(1),
    };
    let source = SliceSource::new(case.data).with_max_pull(usize::from(case.max_pull).max(1));
    let mut input = BufferInput::new(source, options, "fuzz").expect("options are non-zero");
    let mut saved = Marker::default();
    let mut ops = case.ops.iter();
    run(&mut input, &mut ops, case.data, &mut saved);
});
