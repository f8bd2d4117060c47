//! The abstract byte-stream source the decoder reads from.
//!
//! Deliberately minimal, per spec.md §1: the decoder only ever needs to
//! read a run of bytes, skip forward over a run of bytes, and learn
//! whether the source is exhausted. Memory layout, backing storage
//! (file, socket, in-memory buffer) and allocation policy are the
//! caller's concern.

use crate::error::DecoderError;
use std::io::Read;

/// A sequential, forward-only byte source.
///
/// A blanket implementation is provided for any [`std::io::Read`], so most
/// callers never need to implement this trait directly.
pub trait ByteSource {
    /// Reads up to `buf.len()` bytes, filling `buf` from the front.
    ///
    /// Returns the number of bytes actually read. `Ok(0)` means the
    /// source is exhausted (end-of-stream) *and* no partial read occurred;
    /// callers asking for a non-empty `buf` and receiving fewer bytes than
    /// requested, but more than zero, have hit a short/truncated read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, DecoderError>;

    /// Discards the next `n` bytes without materializing them.
    fn skip(&mut self, n: usize) -> Result<(), DecoderError>;
}

impl<R: Read> ByteSource for R {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, DecoderError> {
        let mut total = 0;
        while total < buf.len() {
            match Read::read(self, &mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(DecoderError::ReadError(e)),
            }
        }
        Ok(total)
    }

    fn skip(&mut self, n: usize) -> Result<(), DecoderError> {
        // The source is not assumed to be `Seek` (e.g. a socket), so we
        // discard by reading into a scratch buffer.
        let mut scratch = [0u8; 4096];
        let mut remaining = n;
        while remaining > 0 {
            let chunk = remaining.min(scratch.len());
            match Read::read(self, &mut scratch[..chunk]) {
                Ok(0) => return Err(DecoderError::SeekError(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "end of stream while skipping",
                ))),
                Ok(n) => remaining -= n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(DecoderError::SeekError(e)),
            }
        }
        Ok(())
    }
}
