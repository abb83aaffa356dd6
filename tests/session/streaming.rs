use hexview::{Event, HexViewError, Pending, ReaderState, ViewerConfig};

use super::{default_harness, harness};
use crate::common::{pattern, temp_file, ProgressEvent, ReadCall, ScriptedSource, Step};

const SEVENTEEN: &[u8] = b"0123456789ABCDEFG";

#[test]
fn test_seventeen_bytes_from_file() {
    let file = temp_file(SEVENTEEN);
    let mut h = default_harness();
    h.session.open(file.path()).unwrap();
    assert_eq!(h.session.handle().path().as_deref(), Some(file.path()));
    h.session.run_to_end().unwrap();

    assert_eq!(h.views.address(), "00000000\n00000010");
    assert_eq!(
        h.views.hex(),
        "30 31 32 33 34 35 36 37 38 39 41 42 43 44 45 46\n47"
    );
    assert_eq!(h.views.ascii(), "0123456789ABCDEF\nG");
    assert_eq!(h.session.reader_state(), ReaderState::Eof);
}

#[test]
fn test_seventeen_bytes_in_two_chunks() {
    let mut h = default_harness();
    h.session
        .open_source(Box::new(ScriptedSource::chunked(SEVENTEEN, &[10, 7])))
        .unwrap();
    h.session.run_to_end().unwrap();

    assert_eq!(h.views.address(), "00000000\n00000010");
    assert_eq!(
        h.views.hex(),
        "30 31 32 33 34 35 36 37 38 39 41 42 43 44 45 46\n47"
    );
    assert_eq!(h.views.ascii(), "0123456789ABCDEF\nG");
}

#[test]
fn test_output_independent_of_chunk_size() {
    let data = pattern(1000);
    let file = temp_file(&data);

    let mut reference = default_harness();
    reference.session.open(file.path()).unwrap();
    reference.session.run_to_end().unwrap();

    for chunk_size in [1, 3, 15, 16, 17, 100, 999] {
        let mut h = harness(ViewerConfig {
            chunk_size,
            ..ViewerConfig::default()
        });
        h.session.open(file.path()).unwrap();
        h.session.run_to_end().unwrap();
        assert_eq!(h.views.address(), reference.views.address(), "chunk {chunk_size}");
        assert_eq!(h.views.hex(), reference.views.hex(), "chunk {chunk_size}");
        assert_eq!(h.views.ascii(), reference.views.ascii(), "chunk {chunk_size}");
    }
}

#[test]
fn test_row_count_and_last_row_length() {
    for len in [1usize, 15, 16, 17, 32, 33, 160] {
        let mut h = default_harness();
        h.session
            .open_source(Box::new(ScriptedSource::chunked(&pattern(len), &[len])))
            .unwrap();
        h.session.run_to_end().unwrap();

        let rows = h.views.address().lines().count();
        assert_eq!(rows, len.div_ceil(16), "len {len}");

        let hex = h.views.hex();
        let last = hex.lines().last().unwrap();
        let expected = if len % 16 == 0 { 16 } else { len % 16 };
        assert_eq!(last.split(' ').count(), expected, "len {len}");
    }
}

#[test]
fn test_row_addresses_are_row_starts() {
    let mut h = default_harness();
    h.session
        .open_source(Box::new(ScriptedSource::chunked(&pattern(100), &[7, 50, 43])))
        .unwrap();
    h.session.run_to_end().unwrap();

    let address = h.views.address();
    let rows: Vec<&str> = address.lines().collect();
    for offset in [0u64, 5, 16, 31, 47, 99] {
        let row = (offset / 16) as usize;
        assert_eq!(rows[row], format!("{:08x}", offset - offset % 16));
    }
}

#[test]
fn test_notify_sequence_and_sentinel() {
    let data = pattern(40);
    let mut h = default_harness();
    h.session.load_plugin("recorder").unwrap();
    h.session
        .open_source(Box::new(ScriptedSource::chunked(&data, &[16, 4, 20])))
        .unwrap();
    h.session.run_to_end().unwrap();

    let calls = h.calls.borrow().clone();
    assert_eq!(calls.len(), 4);
    assert_eq!(
        calls.iter().map(|c| c.offset).collect::<Vec<_>>(),
        vec![0, 16, 20, 40]
    );
    assert_eq!(calls[3], ReadCall { offset: 40, bytes: None });

    let joined: Vec<u8> = calls.iter().filter_map(|c| c.bytes.clone()).flatten().collect();
    assert_eq!(joined, data);
}

#[test]
fn test_empty_file_sends_no_sentinel() {
    let file = temp_file(b"");
    let mut h = default_harness();
    h.session.load_plugin("recorder").unwrap();
    h.session.open(file.path()).unwrap();
    h.session.run_to_end().unwrap();

    assert!(h.calls.borrow().is_empty());
    assert!(h.views.is_empty());
    assert_eq!(h.session.reader_state(), ReaderState::Eof);
}

#[test]
fn test_close_before_reading_sends_no_sentinel() {
    let file = temp_file(b"never read");
    let mut h = default_harness();
    h.session.load_plugin("recorder").unwrap();
    h.session.open(file.path()).unwrap();
    h.session.close();

    assert!(h.calls.borrow().is_empty());
    assert!(!h.session.is_open());
    assert_eq!(h.session.reader_state(), ReaderState::Idle);
}

#[test]
fn test_close_between_chunks() {
    let data = pattern(48);
    let mut h = harness(ViewerConfig {
        chunk_size: 16,
        ..ViewerConfig::default()
    });
    h.session.load_plugin("recorder").unwrap();
    h.session.load_plugin("strings").unwrap();
    let strings_view = h.session.plugins().get("strings").unwrap().view().clone();
    h.session
        .open_source(Box::new(ScriptedSource::chunked(&data, &[16, 16, 16])))
        .unwrap();

    assert_eq!(h.session.dispatch(Event::Readable), Pending::Yield);
    assert_eq!(h.session.reader_state(), ReaderState::Idling);
    assert!(!h.views.is_empty());

    h.session.close();
    assert_eq!(h.session.reader_state(), ReaderState::Idle);
    assert!(h.views.is_empty());
    assert_ne!(h.session.plugins().get("strings").unwrap().view(), &strings_view);
    assert_eq!(h.session.plugins().names(), vec!["recorder", "strings"]);

    // Nothing is armed any more
    assert_eq!(h.session.dispatch(Event::Idle), Pending::Done);
    assert_eq!(h.session.dispatch(Event::Readable), Pending::Done);
    assert!(h.views.is_empty());

    let calls = h.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].offset, 0);
    assert_eq!(calls[0].bytes.as_deref(), Some(&data[..16]));
    assert_eq!(h.session.handle().bytes_consumed(), 0);
}

#[test]
fn test_zero_length_reads_are_retried() {
    let mut h = default_harness();
    h.session.load_plugin("recorder").unwrap();
    h.session
        .open_source(Box::new(ScriptedSource::new([
            Step::Data(b"ab".to_vec()),
            Step::Empty,
            Step::WouldBlock,
            Step::Empty,
            Step::Data(b"cd".to_vec()),
        ])))
        .unwrap();
    h.session.run_to_end().unwrap();

    assert_eq!(h.views.hex(), "61 62 63 64");
    assert_eq!(h.views.ascii(), "abcd");
    let calls = h.calls.borrow();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2], ReadCall { offset: 4, bytes: None });
}

#[test]
fn test_read_error_is_reported_once_and_closes() {
    let mut h = default_harness();
    h.session.load_plugin("recorder").unwrap();
    h.session
        .open_source(Box::new(ScriptedSource::new([
            Step::Data(b"abc".to_vec()),
            Step::Fail,
            Step::Data(b"never".to_vec()),
        ])))
        .unwrap();

    let err = h.session.run_to_end().unwrap_err();
    assert!(matches!(err, HexViewError::Read { offset: 3, .. }));
    assert!(err.is_fatal_to_session());

    let messages = h.reporter.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("0x3"), "{}", messages[0]);

    assert!(!h.session.is_open());
    assert!(h.views.is_empty());
    // Only the chunk read before the failure, no end-of-stream call
    assert_eq!(h.calls.borrow().len(), 1);
    assert!(h.session.take_error().is_none());
}

#[test]
fn test_uppercase_from_config() {
    let mut h = harness(ViewerConfig {
        uppercase: true,
        ..ViewerConfig::default()
    });
    h.session
        .open_source(Box::new(ScriptedSource::chunked(&[0xde, 0xad, 0xbe, 0xef], &[4])))
        .unwrap();
    h.session.run_to_end().unwrap();
    assert_eq!(h.views.hex(), "DE AD BE EF");
    assert_eq!(h.views.ascii(), "....");
}

#[test]
fn test_determinate_progress_for_files() {
    let file = temp_file(&pattern(64));
    let mut h = harness(ViewerConfig {
        chunk_size: 16,
        progress_interval_ms: 0,
        ..ViewerConfig::default()
    });
    h.session.open(file.path()).unwrap();
    h.session.run_to_end().unwrap();

    let events = h.progress.events();
    assert_eq!(events.first(), Some(&ProgressEvent::Determinate(0.0, "0.0%".into())));
    assert!(events.contains(&ProgressEvent::Determinate(0.5, "50.0%".into())));
    assert_eq!(
        events[events.len() - 2],
        ProgressEvent::Determinate(1.0, "100.0%".into())
    );
    assert_eq!(events.last(), Some(&ProgressEvent::Finish));
}

#[test]
fn test_pulse_progress_for_unknown_size() {
    let mut h = harness(ViewerConfig {
        progress_interval_ms: 0,
        ..ViewerConfig::default()
    });
    h.session
        .open_source(Box::new(ScriptedSource::chunked(&pattern(30), &[10, 10, 10])))
        .unwrap();
    h.session.run_to_end().unwrap();

    let events = h.progress.events();
    let pulses = events.iter().filter(|e| **e == ProgressEvent::Pulse).count();
    assert_eq!(pulses, 4);
    assert_eq!(events.last(), Some(&ProgressEvent::Finish));
}

#[test]
fn test_progress_is_rate_limited() {
    let mut h = default_harness();
    h.session
        .open_source(Box::new(
            ScriptedSource::chunked(&pattern(64), &[16, 16, 16, 16]).with_size(64),
        ))
        .unwrap();
    h.session.run_to_end().unwrap();

    // Only the opening update; every chunk falls inside the interval
    let events = h.progress.events();
    assert_eq!(
        events,
        vec![
            ProgressEvent::Determinate(0.0, "0.0%".into()),
            ProgressEvent::Finish
        ]
    );
}

#[test]
fn test_reopen_resets_counters_and_views() {
    let first = temp_file(&pattern(40));
    let second = temp_file(b"xy");
    let mut h = default_harness();

    h.session.open(first.path()).unwrap();
    h.session.run_to_end().unwrap();
    assert_eq!(h.session.handle().bytes_consumed(), 40);

    h.session.open(second.path()).unwrap();
    assert_eq!(h.session.handle().bytes_consumed(), 0);
    assert!(h.views.is_empty());
    h.session.run_to_end().unwrap();
    assert_eq!(h.views.ascii(), "xy");
    assert_eq!(h.session.handle().total_size(), Some(2));
}

#[test]
fn test_open_error_is_reported() {
    let mut h = default_harness();
    let err = h.session.open("/nonexistent/hexview/doc.bin").unwrap_err();
    assert!(matches!(err, HexViewError::Open { .. }));
    assert_eq!(h.reporter.messages().len(), 1);
    assert!(h.reporter.messages()[0].contains("doc.bin"));
}
