//! Unit tests for `AppError` display formats and conversions.

use gfxtap::AppError;

#[test]
fn prefixed_variants_name_their_domain() {
    assert_eq!(
        AppError::Config("bad value".into()).to_string(),
        "config: bad value"
    );
    assert_eq!(
        AppError::Connect("refused".into()).to_string(),
        "connect: refused"
    );
    assert_eq!(
        AppError::Rpc("trace/event: failed".into()).to_string(),
        "rpc: trace/event: failed"
    );
    assert_eq!(AppError::Io("broken pipe".into()).to_string(), "io: broken pipe");
}

#[test]
fn end_of_stream_display_is_fixed() {
    assert_eq!(AppError::EndOfStream.to_string(), "end of stream");
}

/// The not-found message quotes the user's spec verbatim.
#[test]
fn target_not_found_quotes_the_spec() {
    let err = AppError::TargetNotFound("com.example.game".into());
    assert_eq!(
        err.to_string(),
        "could not find \"com.example.game\" to trace on any device"
    );
}

/// The ambiguity report is pre-rendered; display adds no prefix, so the
/// multi-line listing reaches the user unchanged.
#[test]
fn ambiguous_target_displays_report_verbatim() {
    let report = "multiple targets match \"game\":\n  Pixel 7:\n    app://one\n    app://two\n";
    let err = AppError::AmbiguousTarget(report.to_owned());
    assert_eq!(err.to_string(), report);
}

#[test]
fn error_messages_have_no_trailing_period() {
    let errors = [
        AppError::Config("bad value".into()),
        AppError::Connect("refused".into()),
        AppError::EndOfStream,
        AppError::TargetNotFound("game".into()),
    ];
    for err in errors {
        let s = err.to_string();
        assert!(
            !s.ends_with('.'),
            "error message must not end with a period: {s}"
        );
    }
}

// ── Conversions ─────────────────────────────────────────────────────────────

#[test]
fn toml_errors_become_config_errors() {
    let parse_err = toml::from_str::<toml::Value>("not = = toml").expect_err("invalid toml");
    let err: AppError = parse_err.into();
    assert!(
        matches!(err, AppError::Config(_)),
        "TOML parse failures must map to Config, got: {err:?}"
    );
    assert!(err.to_string().contains("invalid config"));
}

#[test]
fn io_errors_become_io_errors() {
    let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
    let err: AppError = io_err.into();
    assert!(
        matches!(err, AppError::Io(_)),
        "I/O failures must map to Io, got: {err:?}"
    );
}
