//! The Byte-Swapper (spec.md §4.6): given a body already carved into a
//! [`RecordBody`] by [`crate::layout`], corrects every multi-byte field in
//! place when the stream is [`StreamOrder::Swapped`].
//!
//! spec.md §6 gives each descriptor's total size but not a field-by-field
//! catalogue, so this module treats every info block and array element as
//! a dense run of 16-bit words — the width every field spec.md *does* name
//! (model number, date/time, the various beam/tx/rx/channel counters) is
//! built from — and swaps every consecutive byte pair across it. A
//! descriptor whose size is odd leaves its final byte untouched, the same
//! convention QUALITY_FACTOR's one-byte-per-beam array already relies on.
//! This is a documented policy decision (see `DESIGN.md`), not a claim
//! about the undocumented real wire format: it ensures every multi-byte
//! position in every field spec.md names gets corrected, rather than
//! leaving whole arrays as an unswapped no-op.
//!
//! Two kinds of span never get this treatment, because spec.md gives them
//! no numeric structure at all:
//! - QUALITY_FACTOR's per-beam `data` array, whose documented element
//!   size is one byte: there's nothing multi-byte to swap, and pairing up
//!   adjacent beams' bytes would corrupt both.
//! - Free-form spans: INSTALL_PARAMS/PU_BIST_RESULT's `text`, the
//!   EXTRA_PARAMS `BsCorr` content, and the variable tail of each
//!   WATER_COLUMN rx beam / ATTITUDE_NETWORK entry. These carry ASCII
//!   text or raw sample blobs with no documented field width, so they're
//!   passed through as observed on the wire rather than guessed at.

use crate::descriptors as d;
use crate::endian::StreamOrder;
use crate::layout::{RecordBody, Span};
use crate::variant::DatagramType;

pub fn apply(
    order: StreamOrder,
    datagram_type: DatagramType,
    body: &mut [u8],
    layout: &RecordBody,
) {
    if !order.needs_swap() || datagram_type.swap_exempt() {
        return;
    }

    match *layout {
        RecordBody::Depth { info, beams } => {
            swap_words(body, info);
            swap_array(body, beams, d::DEPTH_BEAM);
        }
        RecordBody::DepthNominal { info, beams } => {
            swap_words(body, info);
            swap_array(body, beams, d::DEPTH_NOMINAL_BEAM);
        }
        RecordBody::Xyz { info, beams } => {
            swap_words(body, info);
            swap_array(body, beams, d::XYZ_BEAM);
        }
        RecordBody::ExtraDetections { info, classes, detections } => {
            swap_words(body, info);
            swap_array(body, classes, d::EXTRA_DETECT_CLASS);
            swap_array(body, detections, d::EXTRA_DETECT_DATA);
        }
        RecordBody::CentralBeams { info, data } => {
            swap_words(body, info);
            swap_array(body, data, d::CENTRAL_BEAMS_DATA);
        }
        RecordBody::Rra70 { info, beams } => {
            swap_words(body, info);
            swap_array(body, beams, d::RRA_70_BEAM);
        }
        RecordBody::Rra78 { info, tx, rx } => {
            swap_words(body, info);
            swap_array(body, tx, d::RRA_78_TX);
            swap_array(body, rx, d::RRA_78_RX);
        }
        RecordBody::Rra101 { info, tx, rx } => {
            swap_words(body, info);
            swap_array(body, tx, d::RRA_101_TX);
            swap_array(body, rx, d::RRA_101_RX);
        }
        RecordBody::Rra102 { info, tx, rx } => {
            swap_words(body, info);
            swap_array(body, tx, d::RRA_102_TX);
            swap_array(body, rx, d::RRA_102_RX);
        }
        RecordBody::SeabedImage83 { info, beams } => {
            swap_words(body, info);
            swap_array(body, beams, d::SEABED_83_BEAM);
        }
        RecordBody::SeabedImage89 { info, beams } => {
            swap_words(body, info);
            swap_array(body, beams, d::SEABED_89_BEAM);
        }
        RecordBody::WaterColumn { info, tx, rx } => {
            swap_words(body, info);
            swap_array(body, tx, d::WC_TX);
            swap_nested_header(body, rx, d::WC_RX_INFO, 8);
        }
        RecordBody::QualityFactor { info, .. } => {
            swap_words(body, info);
            // `data` is one byte per beam (spec.md §6): nothing to swap.
        }
        RecordBody::Attitude { info, data } => {
            swap_words(body, info);
            swap_array(body, data, d::ATTITUDE_DATA);
        }
        RecordBody::AttitudeNetwork { info, entries } => {
            swap_words(body, info);
            swap_nested_header(body, entries, d::ATTITUDE_NET_DATA_INFO, 4);
        }
        RecordBody::Clock { info } => swap_words(body, info),
        RecordBody::Height { info } => swap_words(body, info),
        RecordBody::Heading { info, data } => {
            swap_words(body, info);
            swap_array(body, data, d::HEADING_DATA);
        }
        RecordBody::Position { info } => swap_words(body, info),
        RecordBody::SingleBeamDepth { info } => swap_words(body, info),
        RecordBody::Tide { info } => swap_words(body, info),
        RecordBody::Sssv { info, data } => {
            swap_words(body, info);
            swap_array(body, data, d::SSSV_DATA);
        }
        RecordBody::Svp { info, data } => {
            swap_words(body, info);
            swap_array(body, data, d::SVP_DATA);
        }
        RecordBody::SvpEm3000 { data } => {
            swap_array(body, data, d::SVP_EM3000_DATA);
        }
        RecordBody::InstallParams { info, .. } => swap_words(body, info),
        RecordBody::RuntimeParams { info } => swap_words(body, info),
        RecordBody::ExtraParams { info, .. } => swap_words(body, info),
        RecordBody::PuOutput { info } => swap_words(body, info),
        RecordBody::PuStatus { info } => swap_words(body, info),
        RecordBody::PuBistResult { info, .. } => swap_words(body, info),
        RecordBody::TransducerTilt { info, data } => {
            swap_words(body, info);
            swap_array(body, data, d::TILT_DATA);
        }
        // No interpreted fields: spec.md §6 carves these as a single `raw`
        // span with no named sub-fields, so there's nothing to swap.
        RecordBody::RemoteParamsInfo { .. }
        | RecordBody::SystemStatus { .. }
        | RecordBody::Stave { .. }
        | RecordBody::Unknown2 { .. }
        | RecordBody::Unknown { .. } => {}
        // Swap-exempt variants (spec.md §4.6); unreachable given the
        // early return above, kept for exhaustiveness.
        RecordBody::Rra123 { .. }
        | RecordBody::KmSspOutput { .. }
        | RecordBody::HisasStatus { .. }
        | RecordBody::NavigationOutput { .. }
        | RecordBody::SidescanStatus { .. }
        | RecordBody::Hisas1032Sidescan { .. } => {}
    }
}

/// Swaps every consecutive byte pair across `span`, treating it as a dense
/// run of 16-bit words (see the module doc for why). A trailing odd byte
/// is left untouched.
fn swap_words(body: &mut [u8], span: Span) {
    let mut offset = span.start;
    while offset + 1 < span.end {
        body.swap(offset, offset + 1);
        offset += 2;
    }
}

/// Applies [`swap_words`] to every `element_size`-byte element of a flat
/// array spanning `span`.
fn swap_array(body: &mut [u8], span: Span, element_size: usize) {
    let mut offset = span.start;
    while offset < span.end {
        swap_words(
            body,
            Span {
                start: offset,
                end: offset + element_size,
            },
        );
        offset += element_size;
    }
}

/// Walks a nested variable-length array (WATER_COLUMN rx beams,
/// ATTITUDE_NETWORK entries): each entry is a fixed `header_size`-byte
/// header, swapped in full as a dense run of 16-bit words, followed by a
/// tail whose length in bytes is the `u16` at `tail_len_offset` within
/// that header. The tail itself is never swapped (see module doc).
fn swap_nested_header(body: &mut [u8], span: Span, header_size: usize, tail_len_offset: usize) {
    let mut offset = span.start;
    while offset < span.end {
        swap_words(
            body,
            Span {
                start: offset,
                end: offset + header_size,
            },
        );
        let tail_len = d::u16_at(body, offset + tail_len_offset) as usize;
        offset += header_size + tail_len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout;

    fn depth_body_nonzero(num_beams: u16, order: StreamOrder) -> Vec<u8> {
        let put16 = |buf: &mut Vec<u8>, v: u16| match order {
            StreamOrder::Native => buf.extend(&v.to_le_bytes()),
            StreamOrder::Swapped => buf.extend(&v.to_be_bytes()),
        };
        let mut body = vec![0u8; d::DEPTH_INFO];
        match order {
            StreamOrder::Native => body[0..2].copy_from_slice(&num_beams.to_le_bytes()),
            StreamOrder::Swapped => body[0..2].copy_from_slice(&num_beams.to_be_bytes()),
        }
        for i in 0..num_beams {
            let mut beam = Vec::with_capacity(d::DEPTH_BEAM);
            put16(&mut beam, 1000 + i);
            put16(&mut beam, 2000 + i);
            while beam.len() < d::DEPTH_BEAM {
                beam.push(0);
            }
            body.extend(beam);
        }
        body
    }

    #[test]
    fn swaps_every_beam_field_not_just_the_counter() {
        let mut native = depth_body_nonzero(2, StreamOrder::Native);
        let resolved = layout::resolve(DatagramType::Depth, &native, StreamOrder::Native, &[])
            .unwrap()
            .unwrap();
        apply(StreamOrder::Native, DatagramType::Depth, &mut native, &resolved);
        assert_eq!(d::u16_at(&native, d::DEPTH_INFO), 1000);
        assert_eq!(d::u16_at(&native, d::DEPTH_INFO + 2), 2000);

        let mut swapped = depth_body_nonzero(2, StreamOrder::Swapped);
        let resolved = layout::resolve(DatagramType::Depth, &swapped, StreamOrder::Swapped, &[])
            .unwrap()
            .unwrap();
        apply(StreamOrder::Swapped, DatagramType::Depth, &mut swapped, &resolved);
        // After swapping, every field — not just num_beams — reads as the
        // same native-order value the non-swapped stream produced.
        assert_eq!(d::u16_at(&swapped, d::DEPTH_INFO), 1000);
        assert_eq!(d::u16_at(&swapped, d::DEPTH_INFO + 2), 2000);
        assert_eq!(d::u16_at(&swapped, d::DEPTH_INFO + d::DEPTH_BEAM), 1001);
        assert_eq!(d::u16_at(&swapped, d::DEPTH_INFO + d::DEPTH_BEAM + 2), 2001);
    }

    #[test]
    fn native_order_is_a_no_op() {
        let mut body = depth_body_nonzero(1, StreamOrder::Native);
        let before = body.clone();
        let resolved = layout::resolve(DatagramType::Depth, &body, StreamOrder::Native, &[])
            .unwrap()
            .unwrap();
        apply(StreamOrder::Native, DatagramType::Depth, &mut body, &resolved);
        assert_eq!(body, before);
    }

    #[test]
    fn swap_exempt_variant_is_untouched() {
        let mut body = vec![1u8; d::HISAS_STATUS_INFO];
        let before = body.clone();
        let resolved = layout::resolve(DatagramType::HisasStatus, &body, StreamOrder::Swapped, &[])
            .unwrap()
            .unwrap();
        apply(StreamOrder::Swapped, DatagramType::HisasStatus, &mut body, &resolved);
        assert_eq!(body, before);
    }

    #[test]
    fn single_byte_quality_factor_beams_are_untouched() {
        let mut body = vec![0u8; d::QF_INFO];
        body[0..2].copy_from_slice(&3u16.to_be_bytes());
        body.extend([10u8, 20u8, 30u8]);
        let resolved = layout::resolve(DatagramType::QualityFactor, &body, StreamOrder::Swapped, &[])
            .unwrap()
            .unwrap();
        let before_data = body[d::QF_INFO..].to_vec();
        apply(StreamOrder::Swapped, DatagramType::QualityFactor, &mut body, &resolved);
        assert_eq!(body[d::QF_INFO..], before_data[..]);
    }
}
