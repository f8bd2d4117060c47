//! The 16-bit checksum verifier (spec.md §4.4).

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::endian::StreamOrder;
use crate::error::DecoderError;

/// Offset of `datagram_type` within the 20-byte raw header; the checksum
/// covers the 15 header bytes from here through `serial_number`.
const CHECKSUM_HEADER_START: usize = 5;

/// The tolerated values for the end-marker byte. The format's canonical
/// value is `0x03` (ETX); `0x00` is an observed in-the-wild deviation
/// that is preserved rather than rejected (spec.md §9 open question).
const ETX_VALUES: [u8; 2] = [0x03, 0x00];

/// Outcome of checking a record's checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumOutcome {
    /// The checksum matched, or the producer omitted it (file checksum of
    /// zero against a nonzero computed sum is tolerated per spec.md §4.4).
    Ok,
    /// The checksum did not match.
    Mismatch { expected: u16, computed: u16 },
}

/// Verifies the checksum of a record given its raw (pre-swap) 20-byte
/// header and its raw (pre-swap) body, the latter including the trailing
/// `[ETX][checksum_lo][checksum_hi]` (or reversed, per `order`) bytes.
///
/// Returns `Err(BadData)` if the end-marker byte is neither `0x03` nor
/// `0x00`; that is a framing defect, not a checksum mismatch.
pub fn verify(
    header_raw: &[u8; crate::header::HEADER_SIZE],
    body: &[u8],
    order: StreamOrder,
) -> Result<ChecksumOutcome, DecoderError> {
    if body.len() < 3 {
        return Err(DecoderError::bad_data(
            "body too short to contain an end-marker and checksum",
        ));
    }

    let etx = body[body.len() - 3];
    if !ETX_VALUES.contains(&etx) {
        return Err(DecoderError::bad_data(format!(
            "end-marker byte {:#04x} is neither 0x03 nor 0x00",
            etx
        )));
    }

    let checksum_bytes = &body[body.len() - 2..];
    let file_checksum = match order {
        StreamOrder::Native => LittleEndian::read_u16(checksum_bytes),
        StreamOrder::Swapped => BigEndian::read_u16(checksum_bytes),
    };

    let covered_header = &header_raw[CHECKSUM_HEADER_START..];
    let covered_body = &body[..body.len() - 3];

    let mut sum: u16 = 0;
    for &b in covered_header.iter().chain(covered_body.iter()) {
        sum = sum.wrapping_add(b as u16);
    }

    if file_checksum == 0 && sum != 0 {
        // Some producers omit the checksum entirely.
        return Ok(ChecksumOutcome::Ok);
    }

    if file_checksum == sum {
        Ok(ChecksumOutcome::Ok)
    } else {
        Ok(ChecksumOutcome::Mismatch {
            expected: file_checksum,
            computed: sum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HEADER_SIZE;

    fn header_raw() -> [u8; HEADER_SIZE] {
        [
            0x10, 0x00, 0x00, 0x00, // bytes_in_datagram
            0x02, // STX
            0x44, // datagram_type
            0x00, 0x00, // model
            0x00, 0x00, 0x00, 0x00, // date
            0x00, 0x00, 0x00, 0x00, // time_ms
            0x00, 0x00, // counter
            0x00, 0x00, // serial
        ]
    }

    #[test]
    fn accepts_matching_checksum() {
        let header = header_raw();
        let covered = &header[CHECKSUM_HEADER_START..];
        let mut sum: u16 = 0;
        for &b in covered {
            sum = sum.wrapping_add(b as u16);
        }
        let mut body = vec![0x03];
        body.extend_from_slice(&sum.to_le_bytes());

        assert_eq!(
            verify(&header, &body, StreamOrder::Native).unwrap(),
            ChecksumOutcome::Ok
        );
    }

    #[test]
    fn rejects_mismatched_checksum() {
        let header = header_raw();
        let body = vec![0x03, 0xAB, 0xCD];
        match verify(&header, &body, StreamOrder::Native).unwrap() {
            ChecksumOutcome::Mismatch { .. } => {}
            ChecksumOutcome::Ok => panic!("expected mismatch"),
        }
    }

    #[test]
    fn accepts_zero_file_checksum() {
        let header = header_raw();
        let body = vec![0x03, 0x00, 0x00];
        assert_eq!(
            verify(&header, &body, StreamOrder::Native).unwrap(),
            ChecksumOutcome::Ok
        );
    }

    #[test]
    fn tolerates_zero_etx() {
        let header = header_raw();
        let body = vec![0x00, 0x00, 0x00];
        assert_eq!(
            verify(&header, &body, StreamOrder::Native).unwrap(),
            ChecksumOutcome::Ok
        );
    }

    #[test]
    fn rejects_bad_etx() {
        let header = header_raw();
        let body = vec![0xFF, 0x00, 0x00];
        assert!(verify(&header, &body, StreamOrder::Native).is_err());
    }
}
