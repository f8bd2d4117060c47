//! The byte-order resolver (spec.md §4.1): decides, once per stream, from
//! the first header's `date` and `em_model_number` fields, whether the
//! stream is in the host's native order or needs swapping.

use crate::error::DecoderError;
use crate::header::is_valid_gregorian_date;
use crate::model::is_known_model;

/// Two palindromic dates whose byte representation equals its own
/// reversal; the date-based test is inconclusive for these and falls
/// through to the model-number table.
const PALINDROMIC_DATES: [u32; 2] = [20_001_025, 20_790_529];

/// The stream-wide byte order, resolved once and sticky for the lifetime
/// of the decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOrder {
    /// The stream matches the host's native byte order; no swapping needed.
    Native,
    /// The stream is the opposite of the host's order; every multi-byte
    /// field must be byte-swapped after decoding.
    Swapped,
}

impl StreamOrder {
    pub fn needs_swap(self) -> bool {
        matches!(self, StreamOrder::Swapped)
    }
}

/// Resolves the stream's byte order from the first header's raw (i.e.
/// un-swapped, little-endian-decoded) `date` and `em_model_number` fields.
pub fn resolve(date: u32, em_model_number: u16) -> Result<StreamOrder, DecoderError> {
    if date != 0 && !PALINDROMIC_DATES.contains(&date) {
        if is_valid_gregorian_date(date) {
            return Ok(StreamOrder::Native);
        }
        if is_valid_gregorian_date(date.swap_bytes()) {
            return Ok(StreamOrder::Swapped);
        }
        // Fall through to the model-number table: a corrupt date
        // shouldn't prevent byte-order resolution if the model agrees.
    }

    if is_known_model(em_model_number) {
        return Ok(StreamOrder::Native);
    }
    if is_known_model(em_model_number.swap_bytes()) {
        return Ok(StreamOrder::Swapped);
    }

    Err(DecoderError::bad_data(
        "unable to resolve stream byte order from first header's date or model number",
    ))
}
