//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure, including CLI-level
    /// rejections such as an unknown API name.
    Config(String),
    /// Could not establish a connection to the capture daemon.
    Connect(String),
    /// Request/response failure against the capture daemon. The message
    /// carries the wire method that failed.
    Rpc(String),
    /// The daemon closed the status stream. Benign: the poll loop treats
    /// this as completion, never as a failure.
    EndOfStream,
    /// No trace target matched the user's spec on any device.
    TargetNotFound(String),
    /// More than one trace target matched; carries the rendered candidate
    /// listing grouped by device.
    AmbiguousTarget(String),
    /// File-system or socket I/O failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Connect(msg) => write!(f, "connect: {msg}"),
            Self::Rpc(msg) => write!(f, "rpc: {msg}"),
            Self::EndOfStream => write!(f, "end of stream"),
            Self::TargetNotFound(spec) => {
                write!(f, "could not find \"{spec}\" to trace on any device")
            }
            Self::AmbiguousTarget(report) => write!(f, "{report}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
