//! The 20-byte record header (spec.md §3) and its structural validator
//! (spec.md §4.3).

use byteorder::{ByteOrder, LittleEndian};
use chrono::NaiveDate;

use crate::error::DecoderError;

/// Size of the fixed header, in bytes. Verified against the sum of its
/// field widths by [`header_size_is_twenty_bytes`].
pub const HEADER_SIZE: usize = 20;

/// The undocumented directory-like variant exempted from timestamp
/// validation and checksum verification (spec.md §4.3, §4.4).
pub const UNKNOWN2_TYPE: u8 = 0x74;

const STX: u8 = 0x02;

/// The fixed 20-byte record header, decoded into host types.
///
/// The wire layout is always read as if little-endian ("fixed
/// little-endian-native-order layout", spec.md §3); [`Header::swap`]
/// then corrects the multi-byte fields in place if the stream turns out
/// to be big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    /// Total length from the field after this count through the
    /// checksum, inclusive.
    pub bytes_in_datagram: u32,
    /// Must equal `0x02`.
    pub start_identifier: u8,
    /// Selects the body variant.
    pub datagram_type: u8,
    /// Hardware model number; also a fallback endianness signal.
    pub em_model_number: u16,
    /// `YYYYMMDD`, or `0`.
    pub date: u32,
    /// Milliseconds past midnight.
    pub time_ms: u32,
    pub counter: u16,
    pub serial_number: u16,
}

impl Header {
    /// Parses a header from exactly [`HEADER_SIZE`] raw bytes, interpreting
    /// every multi-byte field as little-endian without regard to the
    /// stream's actual byte order. Callers swap afterwards if needed.
    pub fn parse(raw: &[u8; HEADER_SIZE]) -> Header {
        Header {
            bytes_in_datagram: LittleEndian::read_u32(&raw[0..4]),
            start_identifier: raw[4],
            datagram_type: raw[5],
            em_model_number: LittleEndian::read_u16(&raw[6..8]),
            date: LittleEndian::read_u32(&raw[8..12]),
            time_ms: LittleEndian::read_u32(&raw[12..16]),
            counter: LittleEndian::read_u16(&raw[16..18]),
            serial_number: LittleEndian::read_u16(&raw[18..20]),
        }
    }

    /// Byte-swaps every multi-byte field in place. Single-byte fields
    /// (`start_identifier`, `datagram_type`) are untouched.
    pub fn swap(&mut self) {
        self.bytes_in_datagram = self.bytes_in_datagram.swap_bytes();
        self.em_model_number = self.em_model_number.swap_bytes();
        self.date = self.date.swap_bytes();
        self.time_ms = self.time_ms.swap_bytes();
        self.counter = self.counter.swap_bytes();
        self.serial_number = self.serial_number.swap_bytes();
    }

    /// The number of body bytes that follow the header: everything up to
    /// and including the checksum, minus the 16 bytes of header already
    /// accounted for in `bytes_in_datagram`'s count (spec.md §3, §4.7).
    pub fn body_size(&self) -> u32 {
        self.bytes_in_datagram + 4 - HEADER_SIZE as u32
    }
}

/// Validates the structural sanity of a (possibly already byte-order
/// corrected) header, per spec.md §4.3.
pub fn validate(header: &Header) -> Result<(), DecoderError> {
    if header.start_identifier != STX {
        return Err(DecoderError::bad_data(format!(
            "start_identifier {:#04x} != 0x02",
            header.start_identifier
        )));
    }
    if header.bytes_in_datagram < 16 {
        return Err(DecoderError::bad_data(format!(
            "bytes_in_datagram {} < 16",
            header.bytes_in_datagram
        )));
    }
    if header.bytes_in_datagram > (1 << 27) {
        return Err(DecoderError::bad_data(format!(
            "bytes_in_datagram {} > 2^27",
            header.bytes_in_datagram
        )));
    }

    // The UNKNOWN2 carve-out: its timestamp fields are garbage in the wild.
    if header.datagram_type == UNKNOWN2_TYPE {
        return Ok(());
    }

    if header.time_ms > 86_399_999 {
        return Err(DecoderError::bad_data(format!(
            "time_ms {} exceeds one day",
            header.time_ms
        )));
    }
    if header.date != 0 && !is_valid_gregorian_date(header.date) {
        return Err(DecoderError::bad_data(format!(
            "date {} is not a valid Gregorian date in [1970, 2100]",
            header.date
        )));
    }

    Ok(())
}

/// Checks whether `date` (as `YYYYMMDD`) is both within the accepted year
/// range and a real Gregorian calendar date (spec.md §4.3).
pub fn is_valid_gregorian_date(date: u32) -> bool {
    if !(19_700_000 < date && date < 21_000_000) {
        return false;
    }
    let year = (date / 10_000) as i32;
    let month = (date / 100) % 100;
    let day = date % 100;
    if !(1..=12).contains(&month) {
        return false;
    }
    NaiveDate::from_ymd_opt(year, month, day).is_some()
}
