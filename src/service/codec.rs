//! Line framing for the capture daemon wire protocol.
//!
//! The daemon speaks newline-delimited JSON over a single TCP stream. This
//! codec wraps [`tokio_util::codec::LinesCodec`] with a fixed maximum line
//! length so a misbehaving daemon cannot make the client buffer an unbounded
//! amount of data for one message. Use it as the codec parameter for both
//! [`tokio_util::codec::FramedRead`] and [`tokio_util::codec::FramedWrite`].

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::{AppError, Result};

/// Maximum accepted line length: 1 MiB.
///
/// Inbound lines beyond this limit fail the decode with [`AppError::Rpc`]
/// instead of growing the read buffer.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// Newline-delimited JSON codec for the daemon connection.
///
/// Each `\n`-terminated UTF-8 line is one complete wire message. The length
/// limit is enforced on decode only; encoding writes `item\n` unchecked.
#[derive(Debug)]
pub struct WireCodec(LinesCodec);

impl WireCodec {
    /// Create a codec with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self(LinesCodec::new_with_max_length(MAX_LINE_BYTES))
    }
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for WireCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode(src).map_err(map_codec_error)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode_eof(src).map_err(map_codec_error)
    }
}

impl Encoder<String> for WireCodec {
    type Error = AppError;

    /// Encode `item` as a `\n`-terminated line into `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] on underlying I/O failures.
    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        self.0.encode(item, dst).map_err(map_codec_error)
    }
}

/// Map a [`LinesCodecError`] to an [`AppError`].
fn map_codec_error(e: LinesCodecError) -> AppError {
    match e {
        LinesCodecError::MaxLineLengthExceeded => {
            AppError::Rpc(format!("line too long: exceeded {MAX_LINE_BYTES} bytes"))
        }
        LinesCodecError::Io(io_err) => AppError::Io(io_err.to_string()),
    }
}
