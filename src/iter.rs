//! Iterator adapters over a [`DecoderState`] and over the nested
//! variable-length sub-records within a single decoded body (spec.md §4.5,
//! §9 "expose them as lazy iterators yielding sub-views").

use crate::decoder::{DecoderState, Record};
use crate::descriptors as d;
use crate::error::DecoderError;
use crate::layout::Span;
use crate::source::ByteSource;

/// A thin convenience wrapper around [`DecoderState::next_record`].
///
/// This is *not* a [`std::iter::Iterator`]: each [`Record`] borrows the
/// decoder's internal buffer, so yielding it from a call tied to `&mut
/// self` (rather than to the iterator's own lifetime) is the only sound
/// shape — the standard `Iterator` trait cannot express an item whose
/// lifetime is shorter than the iterator itself. Loop with `while let Some
/// (record) = records.next() { ... }` instead of a `for` loop.
pub struct Records<'a, R: ByteSource> {
    decoder: &'a mut DecoderState<R>,
}

impl<'a, R: ByteSource> Records<'a, R> {
    pub(crate) fn new(decoder: &'a mut DecoderState<R>) -> Self {
        Records { decoder }
    }

    /// Advances to the next record. See [`DecoderState::next_record`] for
    /// the discard/sticky-error semantics.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Result<Record<'_>, DecoderError>> {
        match self.decoder.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Walks a sequence of (fixed header + variable tail) sub-records packed
/// back-to-back within a span of an already-swapped body buffer. Each
/// entry's tail length is read from a fixed offset within its own header,
/// which by this point holds a canonical little-endian value.
struct NestedWalk<'a> {
    body: &'a [u8],
    offset: usize,
    end: usize,
    header_size: usize,
    tail_len_offset: usize,
}

impl<'a> NestedWalk<'a> {
    fn next_entry(&mut self) -> Option<&'a [u8]> {
        if self.offset >= self.end {
            return None;
        }
        let tail_len = d::u16_at(self.body, self.offset + self.tail_len_offset) as usize;
        let entry_end = self.offset + self.header_size + tail_len;
        let entry = &self.body[self.offset..entry_end];
        self.offset = entry_end;
        Some(entry)
    }
}

/// Lazily yields each WATER_COLUMN receive-beam sub-record: a fixed
/// [`d::WC_RX_INFO`]-byte header followed by a variable amplitude/phase
/// tail whose length the header carries (spec.md §4.5).
pub struct WaterColumnBeams<'a> {
    walk: NestedWalk<'a>,
}

impl<'a> WaterColumnBeams<'a> {
    pub fn new(body: &'a [u8], rx: Span) -> Self {
        WaterColumnBeams {
            walk: NestedWalk {
                body,
                offset: rx.start,
                end: rx.end,
                header_size: d::WC_RX_INFO,
                tail_len_offset: 8,
            },
        }
    }
}

impl<'a> Iterator for WaterColumnBeams<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        self.walk.next_entry()
    }
}

/// Lazily yields each ATTITUDE_NETWORK entry: a fixed
/// [`d::ATTITUDE_NET_DATA_INFO`]-byte header followed by a variable tail
/// (spec.md §4.5).
pub struct AttitudeNetworkEntries<'a> {
    walk: NestedWalk<'a>,
}

impl<'a> AttitudeNetworkEntries<'a> {
    pub fn new(body: &'a [u8], entries: Span) -> Self {
        AttitudeNetworkEntries {
            walk: NestedWalk {
                body,
                offset: entries.start,
                end: entries.end,
                header_size: d::ATTITUDE_NET_DATA_INFO,
                tail_len_offset: 4,
            },
        }
    }
}

impl<'a> Iterator for AttitudeNetworkEntries<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        self.walk.next_entry()
    }
}

/// Lazily yields each HISAS_1032_SIDESCAN channel sub-record: a fixed
/// [`d::SIDESCAN_DATA_CHANNEL`]-byte header (carrying the channel index and
/// sample count) followed by a variable sample tail whose width comes from
/// the cached per-channel width, not the header itself (spec.md §4.5
/// cross-record dependency). This variant is swap-exempt, so its fields
/// are read as fixed little-endian regardless of the stream's order.
pub struct HisasSidescanChannels<'a> {
    body: &'a [u8],
    offset: usize,
    end: usize,
    widths: [u8; d::SIDESCAN_STATUS_MAX_CHANNELS],
}

impl<'a> HisasSidescanChannels<'a> {
    pub fn new(
        body: &'a [u8],
        channels: Span,
        widths: [u8; d::SIDESCAN_STATUS_MAX_CHANNELS],
    ) -> Self {
        HisasSidescanChannels {
            body,
            offset: channels.start,
            end: channels.end,
            widths,
        }
    }
}

impl<'a> Iterator for HisasSidescanChannels<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.offset >= self.end {
            return None;
        }
        let header = &self.body[self.offset..self.offset + d::SIDESCAN_DATA_CHANNEL];
        let channel_index = d::u16_at(header, 0) as usize;
        let num_samples = d::u32_at(header, 2) as usize;
        let width = self.widths.get(channel_index).copied().unwrap_or(0) as usize;
        let entry_end = self.offset + d::SIDESCAN_DATA_CHANNEL + num_samples * width;
        let entry = &self.body[self.offset..entry_end];
        self.offset = entry_end;
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn water_column_beams_walks_two_entries() {
        let mut body = Vec::new();
        for tail_len in [4usize, 6usize] {
            let mut header = vec![0u8; d::WC_RX_INFO];
            header[8..10].copy_from_slice(&(tail_len as u16).to_le_bytes());
            body.extend(header);
            body.extend(vec![0u8; tail_len]);
        }
        let span = Span {
            start: 0,
            end: body.len(),
        };
        let beams: Vec<_> = WaterColumnBeams::new(&body, span).collect();
        assert_eq!(beams.len(), 2);
        assert_eq!(beams[0].len(), d::WC_RX_INFO + 4);
        assert_eq!(beams[1].len(), d::WC_RX_INFO + 6);
    }

    #[test]
    fn hisas_sidescan_channels_uses_cached_width() {
        let mut header = vec![0u8; d::SIDESCAN_DATA_CHANNEL];
        header[0..2].copy_from_slice(&1u16.to_le_bytes()); // channel_index = 1
        header[2..6].copy_from_slice(&3u32.to_le_bytes()); // num_samples = 3
        let mut body = header;
        body.extend(vec![0u8; 3 * 4]); // 3 samples * width 4

        let mut widths = [0u8; d::SIDESCAN_STATUS_MAX_CHANNELS];
        widths[1] = 4;

        let span = Span {
            start: 0,
            end: body.len(),
        };
        let channels: Vec<_> = HisasSidescanChannels::new(&body, span, widths).collect();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].len(), d::SIDESCAN_DATA_CHANNEL + 12);
    }
}
