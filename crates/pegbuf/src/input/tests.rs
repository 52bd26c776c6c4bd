use alloc::{rc::Rc, vec::Vec};
use core::cell::RefCell;

use quickcheck::{Arbitrary, Gen, QuickCheck};

use super::*;
use crate::{
    eol::Lf,
    source::{self, SliceSource},
};

/// Byte `k` of the stream produced by [`endless`].
fn stream_byte(k: usize) -> u8 {
    u8::try_from(k % 251).unwrap()
}

/// A source that never ends and always fills the whole request.
fn endless() -> impl ByteSource {
    let mut next = 0usize;
    source::from_fn(move |dst: &mut [u8]| {
        for b in dst.iter_mut() {
            *b = stream_byte(next);
            next += 1;
        }
        Ok(dst.len())
    })
}

/// Wraps `inner`, recording the length of every pull request.
fn recording<R: ByteSource>(mut inner: R) -> (impl ByteSource, Rc<RefCell<Vec<usize>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let src = source::from_fn(move |dst: &mut [u8]| {
        sink.borrow_mut().push(dst.len());
        inner.pull(dst)
    });
    (src, log)
}

fn opts(maximum: usize, chunk_size: usize) -> BufferOptions {
    BufferOptions {
        maximum,
        chunk_size,
    }
}

fn slice_input(data: &[u8], maximum: usize, chunk: usize) -> BufferInput<SliceSource<'_>, Lf, &'static str> {
    BufferInput::with_eol(SliceSource::new(data), opts(maximum, chunk), "test").unwrap()
}

#[test]
fn overflow_is_distinct_from_end_of_input() {
    let mut input = BufferInput::new(endless(), opts(4, 4), "endless").unwrap();
    assert_eq!(
        input.ensure_available(9),
        Err(InputError::Overflow {
            requested: 9,
            capacity: 8
        })
    );
    input.ensure_available(8).unwrap();
    assert_eq!(input.occupied(), 8);
    assert_eq!(input.capacity(), 8);
}

#[test]
fn end_of_input_is_not_an_error() {
    let mut input = slice_input(b"", 16, 4);
    input.ensure_available(4).unwrap();
    assert!(input.is_empty().unwrap());
    assert_eq!(input.size(3).unwrap(), 0);
}

#[test]
fn satisfied_request_does_not_pull() {
    let (src, log) = recording(SliceSource::new(b"abcdefgh"));
    let mut input = BufferInput::new(src, opts(16, 4), "rec").unwrap();
    input.ensure_available(2).unwrap();
    input.ensure_available(2).unwrap();
    input.ensure_available(4).unwrap();
    assert_eq!(*log.borrow(), [4]);
}

#[test]
fn pull_requests_at_least_one_chunk_bounded_by_free_space() {
    let (src, log) = recording(endless());
    let mut input = BufferInput::new(src, opts(16, 4), "rec").unwrap();
    input.ensure_available(1).unwrap(); // max(1, 4) = 4
    input.ensure_available(10).unwrap(); // max(10 - 4, 4) = 6
    input.consume(8);
    input.ensure_available(12).unwrap(); // max(12 - 2, 4) = 10, free after end = 10
    assert_eq!(*log.borrow(), [4, 6, 10]);
    assert_eq!(input.free_after_end(), 0);
}

#[test]
fn single_pull_per_request_even_when_short() {
    let mut input = BufferInput::new(
        SliceSource::new(b"abcdefgh").with_max_pull(2),
        opts(16, 4),
        "short",
    )
    .unwrap();
    input.ensure_available(4).unwrap();
    assert_eq!(input.occupied(), 2);
    assert_eq!(input.fill(4).unwrap(), 4);
    assert_eq!(input.current(), b"abcd");
}

#[test]
fn fill_stops_at_end_of_input() {
    let mut input = BufferInput::new(
        SliceSource::new(b"abc").with_max_pull(1),
        opts(16, 4),
        "short",
    )
    .unwrap();
    assert_eq!(input.fill(8).unwrap(), 3);
}

#[test]
fn peek_stays_inside_window() {
    let mut input = slice_input(b"xyz", 16, 4);
    assert_eq!(input.peek(0), None);
    input.ensure_available(1).unwrap();
    assert_eq!(input.peek(0), Some(b'x'));
    assert_eq!(input.peek_char(2), Some('z'));
    assert_eq!(input.peek(3), None);
}

#[test]
fn consume_tracks_lines_and_columns() {
    let mut input = slice_input(b"ab\ncd", 16, 4);
    input.ensure_available(5).unwrap();
    input.consume(5);
    assert_eq!((input.byte(), input.line(), input.column()), (5, 2, 3));
}

#[test]
fn consume_in_line_moves_column_only() {
    let mut input = slice_input(b"ab", 16, 4);
    input.ensure_available(2).unwrap();
    input.consume_in_line(2);
    assert_eq!((input.byte(), input.line(), input.column()), (2, 1, 3));
}

#[test]
fn consume_eol_matches_policy() {
    let mut input = BufferInput::new(SliceSource::new(b"\r\nx\n"), opts(16, 4), "eol").unwrap();
    assert!(input.consume_eol().unwrap());
    assert_eq!((input.byte(), input.line(), input.column()), (2, 2, 1));
    assert!(!input.consume_eol().unwrap());
    input.consume_in_line(1);
    assert!(input.consume_eol().unwrap());
    assert_eq!((input.byte(), input.line(), input.column()), (4, 3, 1));
    assert!(!input.consume_eol().unwrap());
}

#[test]
#[should_panic(expected = "past window end")]
fn consume_in_line_beyond_window_panics() {
    let mut input = slice_input(b"ab", 16, 4);
    input.consume_in_line(1);
}

#[test]
fn discard_preserves_retained_bytes() {
    let data: Vec<u8> = (0..64).map(stream_byte).collect();
    let mut input = slice_input(&data, 32, 8);
    input.ensure_available(30).unwrap();
    input.consume(20);
    let before = input.current().to_vec();
    let position = input.position();

    input.discard();

    assert_eq!(input.free_before_current(), 0);
    assert_eq!(input.current(), before.as_slice());
    assert_eq!(input.position(), position);
    input.ensure_available(30).unwrap();
    assert_eq!(input.peek(29), Some(stream_byte(49)));
}

#[test]
fn discard_below_threshold_is_a_no_op() {
    let mut input = slice_input(b"abcdefghij", 16, 8);
    input.ensure_available(10).unwrap();
    input.consume(8);
    input.discard();
    assert_eq!(input.free_before_current(), 8);
    input.consume(1);
    input.discard();
    assert_eq!(input.free_before_current(), 0);
    assert_eq!(input.current(), b"j");
}

#[test]
fn discard_keeps_bytes_pinned_by_live_guard() {
    let data: Vec<u8> = (0..64).map(stream_byte).collect();
    let mut input = slice_input(&data, 40, 8);
    input.ensure_available(40).unwrap();
    input.consume(10);
    {
        let mut guard = input.auto_rewind(RewindMode::Active);
        guard.consume(20);
        guard.discard();
        // Compacted up to the guard's snapshot, not up to the current byte.
        assert_eq!(guard.free_before_current(), 20);
        assert_eq!(guard.peek(0), Some(stream_byte(30)));
    }
    assert_eq!(input.byte(), 10);
    assert_eq!(input.free_before_current(), 0);
    assert_eq!(input.peek(0), Some(stream_byte(10)));

    input.consume(20);
    input.discard();
    assert_eq!(input.free_before_current(), 0);
    assert_eq!(input.peek(0), Some(stream_byte(30)));
}

#[test]
fn discard_deferred_while_guard_pins_front() {
    let mut input = slice_input(b"0123456789abcdef", 16, 4);
    input.ensure_available(16).unwrap();
    let mut guard = input.auto_rewind(RewindMode::Active);
    guard.consume(12);
    guard.discard();
    assert_eq!(guard.free_before_current(), 12);
}

#[test]
fn nested_guards_restore_outer_snapshot() {
    let mut input = slice_input(b"one\ntwo\nthree", 32, 4);
    input.ensure_available(13).unwrap();
    input.consume(2);
    let start = *input.marker();
    {
        let mut outer = input.auto_rewind(RewindMode::Active);
        outer.consume(3);
        {
            let mut inner = outer.auto_rewind(RewindMode::Active);
            inner.consume(5);
            assert_eq!(inner.line(), 3);
        }
        assert_eq!(outer.byte(), 5);
        assert_eq!(outer.line(), 2);
    }
    assert_eq!(*input.marker(), start);
    assert_eq!(input.pinned, None);
}

#[test]
fn committed_guard_keeps_position() {
    let mut input = slice_input(b"abc\ndef", 16, 4);
    input.ensure_available(7).unwrap();
    let mut guard = input.auto_rewind(RewindMode::Active);
    guard.consume(5);
    let after = *guard.marker();
    guard.commit();
    assert_eq!(*input.marker(), after);
    assert_eq!(input.pinned, None);
}

#[test]
fn inner_commit_outer_rewind() {
    let mut input = slice_input(b"abcdef", 16, 4);
    input.ensure_available(6).unwrap();
    {
        let mut outer = input.auto_rewind(RewindMode::Active);
        let mut inner = outer.auto_rewind(RewindMode::Active);
        inner.consume(4);
        assert!(inner.finish(true));
        assert_eq!(outer.byte(), 4);
    }
    assert_eq!(input.byte(), 0);
}

#[test]
fn inactive_guard_is_pass_through() {
    let mut input = slice_input(b"abc", 16, 4);
    input.ensure_available(3).unwrap();
    {
        let mut guard = input.auto_rewind(RewindMode::Inactive);
        assert_eq!(guard.mode(), RewindMode::Inactive);
        assert!(guard.snapshot().is_none());
        guard.consume(2);
    }
    assert_eq!(input.byte(), 2);
    assert_eq!(input.pinned, None);
}

#[test]
fn guard_restores_on_error_path() {
    fn fails<R: ByteSource, E: Eol, S>(input: &mut BufferInput<R, E, S>) -> Result<bool, InputError> {
        input.consume(1);
        input.ensure_available(1000)?;
        Ok(true)
    }
    let mut input = slice_input(b"abc", 16, 4);
    input.ensure_available(3).unwrap();
    let result = input.attempt(fails);
    assert!(matches!(result, Err(InputError::Overflow { .. })));
    assert_eq!(input.byte(), 0);
}

#[test]
fn attempt_commits_only_on_match() {
    let mut input = slice_input(b"abc", 16, 4);
    let miss = input.attempt(|i| -> Result<bool, InputError> {
        i.ensure_available(2)?;
        i.consume(2);
        Ok(false)
    });
    assert_eq!(miss, Ok(false));
    assert_eq!(input.byte(), 0);
    let hit = input.attempt(|i| -> Result<bool, InputError> {
        i.ensure_available(2)?;
        i.consume(2);
        Ok(true)
    });
    assert_eq!(hit, Ok(true));
    assert_eq!(input.byte(), 2);
}

#[test]
fn rewind_restore_rejects_discarded_marker() {
    let data: Vec<u8> = (0..32).map(stream_byte).collect();
    let mut input = slice_input(&data, 24, 4);
    input.ensure_available(20).unwrap();
    let early = input.rewind_save();
    input.consume(10);
    input.discard();
    assert_eq!(
        input.rewind_restore(&early),
        Err(InputError::RewindPastWindow {
            byte: 0,
            retained_from: 10
        })
    );
}

#[test]
fn rewind_restore_rebases_after_discard() {
    let data: Vec<u8> = (0..32).map(stream_byte).collect();
    let mut input = slice_input(&data, 24, 4);
    input.ensure_available(20).unwrap();
    input.consume(10);
    let mark = input.rewind_save();
    assert_eq!(mark.offset(), 10);

    let mut guard = input.auto_rewind(RewindMode::Active);
    guard.consume(6);
    guard.discard();
    guard.rewind_restore(&mark).unwrap();
    assert_eq!(guard.byte(), 10);
    assert_eq!(guard.marker().offset(), 0);
    assert_eq!(guard.free_before_current(), 0);
    assert_eq!(guard.peek(0), Some(stream_byte(10)));
    guard.commit();
}

#[test]
fn action_input_spans_consumed_bytes() {
    let mut input = slice_input(b"say \"hi\"\n", 16, 4);
    input.ensure_available(9).unwrap();
    input.consume(5);
    let begin = input.rewind_save();
    input.consume(2);
    let span = input.action_input(&begin).unwrap();
    assert_eq!(span.as_bytes(), b"hi");
    assert_eq!(span.to_str(), Ok("hi"));
    assert_eq!(span.position().column, 6);
    assert_eq!(*span.source(), "test");
}

#[test]
fn action_input_rejects_marker_ahead() {
    let mut input = slice_input(b"abcdef", 16, 4);
    input.ensure_available(6).unwrap();
    input.consume(3);
    let ahead = input.rewind_save();
    input.rewind_restore(&Marker::default()).unwrap();
    assert_eq!(
        input.action_input(&ahead).unwrap_err(),
        InputError::MarkerAhead {
            byte: 3,
            current: 0
        }
    );
}

#[test]
fn source_errors_propagate() {
    let src = source::from_fn(|_: &mut [u8]| Err(SourceError::new("connection reset")));
    let mut input = BufferInput::new(src, BufferOptions::default(), "net").unwrap();
    assert_eq!(
        input.is_empty(),
        Err(InputError::Source(SourceError::new("connection reset")))
    );
}

#[test]
fn over_reporting_source_is_rejected() {
    let src = source::from_fn(|dst: &mut [u8]| Ok(dst.len() + 1));
    let mut input = BufferInput::new(src, BufferOptions::default(), "liar").unwrap();
    assert!(matches!(input.ensure_available(1), Err(InputError::Source(_))));
    assert_eq!(input.occupied(), 0);
}

#[test]
fn invalid_options_rejected() {
    let err = BufferInput::new(endless(), opts(8, 0), "zero").unwrap_err();
    assert_eq!(err, InputError::InvalidOptions("chunk_size must be non-zero"));
}

// ─────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Ensure(usize),
    Consume(usize),
    Discard,
    Open,
    Close { commit: bool },
}

impl Arbitrary for Op {
    fn arbitrary(g: &mut Gen) -> Self {
        match u8::arbitrary(g) % 6 {
            0 | 1 => Op::Ensure(usize::arbitrary(g) % 33),
            2 => Op::Consume(usize::arbitrary(g) % 17),
            3 => Op::Discard,
            4 => Op::Open,
            _ => Op::Close {
                commit: bool::arbitrary(g),
            },
        }
    }
}

fn tests_count() -> u64 {
    if is_ci::cached() { 10_000 } else { 1_000 }
}

/// Property: with a discard before every request of at most `maximum`
/// bytes and no live guard, the buffer never overflows and every byte it
/// shows is the next byte of the source, in order.
#[test]
fn window_mirrors_source_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(ops: Vec<Op>, max_pull: usize) -> bool {
        const MAXIMUM: usize = 32;
        let data: Vec<u8> = (0..4096).map(stream_byte).collect();
        let src = SliceSource::new(&data).with_max_pull(1 + max_pull % 40);
        let mut input = BufferInput::new(src, opts(MAXIMUM, 8), "prop").unwrap();
        for op in ops {
            match op {
                Op::Ensure(n) => {
                    input.discard();
                    if input.ensure_available(n.min(MAXIMUM)).is_err() {
                        return false;
                    }
                }
                Op::Consume(n) => {
                    let n = n.min(input.occupied());
                    input.consume(n);
                }
                Op::Discard | Op::Open | Op::Close { .. } => input.discard(),
            }
            let byte = input.byte();
            let window_ok = input
                .current()
                .iter()
                .enumerate()
                .all(|(i, b)| *b == data[byte + i]);
            if !window_ok {
                return false;
            }
        }
        true
    }

    QuickCheck::new()
        .tests(tests_count())
        .quickcheck(prop as fn(Vec<Op>, usize) -> bool);
}

enum Outcome {
    Failed,
    Closed { commit: bool },
    Exhausted,
}

/// Property: however guards nest, commit and interleave with discards, an
/// uncommitted guard always restores exactly the position it was opened at,
/// and the window under the restored position still mirrors the source.
#[test]
fn nested_rewind_quickcheck() {
    fn run<R: ByteSource>(
        input: &mut BufferInput<R, Lf, &'static str>,
        ops: &mut core::slice::Iter<'_, Op>,
        data: &[u8],
    ) -> Outcome {
        while let Some(op) = ops.next() {
            match op {
                Op::Ensure(n) => {
                    // Overflow is legitimate while guards pin old bytes.
                    let _ = input.ensure_available(*n);
                }
                Op::Consume(n) => {
                    let n = (*n).min(input.occupied());
                    input.consume(n);
                }
                Op::Discard => input.discard(),
                Op::Open => {
                    let opened = *input.marker();
                    let mut guard = input.auto_rewind(RewindMode::Active);
                    match run(&mut guard, ops, data) {
                        Outcome::Failed => return Outcome::Failed,
                        Outcome::Closed { commit: true } => guard.commit(),
                        Outcome::Closed { commit: false } | Outcome::Exhausted => {
                            drop(guard);
                            let now = input.marker();
                            if (now.byte(), now.line(), now.column())
                                != (opened.byte(), opened.line(), opened.column())
                            {
                                return Outcome::Failed;
                            }
                        }
                    }
                }
                Op::Close { commit } => return Outcome::Closed { commit: *commit },
            }
            let byte = input.byte();
            if !input
                .current()
                .iter()
                .enumerate()
                .all(|(i, b)| *b == data[byte + i])
            {
                return Outcome::Failed;
            }
        }
        Outcome::Exhausted
    }

    #[allow(clippy::needless_pass_by_value)]
    fn prop(ops: Vec<Op>) -> bool {
        let data: Vec<u8> = b"ab\ncd\n\nefgh\nijklmnop\nq".repeat(64);
        let mut input =
            BufferInput::with_eol(SliceSource::new(&data).with_max_pull(7), opts(48, 8), "nest")
                .unwrap();
        let mut iter = ops.iter();
        !matches!(run(&mut input, &mut iter, &data), Outcome::Failed)
    }

    QuickCheck::new()
        .tests(tests_count())
        .quickcheck(prop as fn(Vec<Op>) -> bool);
}
