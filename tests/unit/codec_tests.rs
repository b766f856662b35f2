//! Unit tests for the NDJSON wire codec.
//!
//! Covers:
//! - single and batched line decoding
//! - partial delivery buffered until the newline arrives
//! - the maximum line length guard
//! - newline-terminated encoding

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use gfxtap::service::codec::{WireCodec, MAX_LINE_BYTES};
use gfxtap::AppError;

// ── Decoding ────────────────────────────────────────────────────────────────

/// A complete JSON object on a single newline-terminated line is decoded
/// without error and returned without the trailing `\n`.
#[test]
fn single_line_decodes_without_newline() {
    let mut codec = WireCodec::new();
    let mut buf = BytesMut::from("{\"id\":1,\"result\":null}\n");

    let result = codec
        .decode(&mut buf)
        .expect("decode must succeed for a valid line");

    assert_eq!(
        result,
        Some("{\"id\":1,\"result\":null}".to_owned()),
        "codec must return the line content without the trailing newline"
    );
}

/// Two reply lines delivered in one buffer are decoded as two separate items
/// by successive `decode` calls.
#[test]
fn batched_lines_decode_separately() {
    let mut codec = WireCodec::new();
    let raw = concat!(
        "{\"id\":1,\"result\":{\"devices\":[]}}\n",
        "{\"id\":2,\"error\":\"no such device\"}\n",
    );
    let mut buf = BytesMut::from(raw);

    let first = codec.decode(&mut buf).expect("first decode must succeed");
    assert!(first.is_some(), "first line must be decoded");

    let second = codec.decode(&mut buf).expect("second decode must succeed");
    assert!(second.is_some(), "second line must be decoded");

    let third = codec
        .decode(&mut buf)
        .expect("buffer now empty, decode must return None");
    assert!(third.is_none(), "no further lines must be present");
}

/// A line that arrives without its terminating `\n` is not emitted yet; once
/// the newline arrives the complete line is yielded.
#[test]
fn partial_line_waits_for_newline() {
    let mut codec = WireCodec::new();

    let mut buf = BytesMut::from("{\"id\":7,\"resu");
    let result = codec
        .decode(&mut buf)
        .expect("partial decode must not error");
    assert!(
        result.is_none(),
        "partial line must not be emitted before the newline arrives"
    );

    buf.extend_from_slice(b"lt\":null}\n");
    let result = codec
        .decode(&mut buf)
        .expect("decode must succeed after newline");
    assert_eq!(
        result,
        Some("{\"id\":7,\"result\":null}".to_owned()),
        "complete line must be emitted after the newline arrives"
    );
}

/// A trailing line left in the buffer at EOF is still yielded by
/// `decode_eof` even without a terminating newline.
#[test]
fn decode_eof_flushes_trailing_line() {
    let mut codec = WireCodec::new();
    let mut buf = BytesMut::from("{\"id\":3,\"result\":null}");

    let result = codec
        .decode_eof(&mut buf)
        .expect("decode_eof must succeed for a trailing line");

    assert_eq!(
        result,
        Some("{\"id\":3,\"result\":null}".to_owned()),
        "trailing content must be flushed at EOF"
    );
}

// ── Length guard ────────────────────────────────────────────────────────────

/// A line exceeding `MAX_LINE_BYTES` fails the decode with `AppError::Rpc`
/// containing `"line too long"` instead of growing the buffer.
#[test]
fn oversized_line_is_rejected() {
    let mut codec = WireCodec::new();

    let big_line = "a".repeat(MAX_LINE_BYTES + 1) + "\n";
    let mut buf = BytesMut::from(big_line.as_str());

    let result = codec.decode(&mut buf);

    match result {
        Err(AppError::Rpc(msg)) => assert!(
            msg.contains("line too long"),
            "error must mention 'line too long', got: {msg}"
        ),
        other => panic!("expected Err(AppError::Rpc(\"line too long …\")), got: {other:?}"),
    }
}

/// A line exactly at `MAX_LINE_BYTES` is still accepted.
#[test]
fn line_at_limit_is_accepted() {
    let mut codec = WireCodec::new();

    let line = "a".repeat(MAX_LINE_BYTES) + "\n";
    let mut buf = BytesMut::from(line.as_str());

    let result = codec
        .decode(&mut buf)
        .expect("a line at the limit must decode");
    assert_eq!(
        result.map(|s| s.len()),
        Some(MAX_LINE_BYTES),
        "the full line must be returned"
    );
}

// ── Encoding ────────────────────────────────────────────────────────────────

/// Encoding appends exactly one `\n` to the item.
#[test]
fn encode_appends_newline() {
    let mut codec = WireCodec::new();
    let mut buf = BytesMut::new();

    codec
        .encode("{\"id\":1,\"method\":\"server/info\",\"params\":{}}".to_owned(), &mut buf)
        .expect("encode must succeed");

    assert_eq!(
        &buf[..],
        b"{\"id\":1,\"method\":\"server/info\",\"params\":{}}\n",
        "encoded line must end with a single newline"
    );
}
