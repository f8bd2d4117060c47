//! Errors surfaced by the decoder.

use std::io;

/// The set of errors the decoder can surface to a caller.
///
/// Any variant other than end-of-stream transitions the owning
/// [`DecoderState`](crate::decoder::DecoderState) into a sticky error state:
/// once returned, the same error is returned again on every subsequent call
/// until the state is torn down. See spec.md §7.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    /// The underlying byte source failed on a read.
    #[error("read from byte source failed: {0}")]
    ReadError(#[source] io::Error),

    /// The underlying byte source failed on a forward skip.
    #[error("seek on byte source failed: {0}")]
    SeekError(#[source] io::Error),

    /// The internal buffer failed to grow to the required capacity.
    #[error("failed to grow decode buffer to {requested} bytes")]
    NoMemory {
        /// The capacity that was requested.
        requested: usize,
    },

    /// A structurally invalid record: truncation mid-record, an invalid
    /// header field, an unresolvable byte order, a bounded counter that
    /// was exceeded, or a missing cross-record dependency.
    #[error("malformed datagram: {0}")]
    BadData(String),

    /// A structurally valid record whose variant or sub-variant is not
    /// implemented by this decoder.
    #[error("unsupported datagram: {0}")]
    Unsupported(String),
}

impl DecoderError {
    pub(crate) fn bad_data(msg: impl Into<String>) -> Self {
        DecoderError::BadData(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        DecoderError::Unsupported(msg.into())
    }
}
