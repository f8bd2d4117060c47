//! Fixed descriptor sizes (spec.md §6) and the small byte-level reading
//! helpers shared by the layout resolver and byte-swapper.
//!
//! Every size named here is enforced by the layout resolver: a short read
//! against one of these constants is always a [`DecoderError::BadData`].

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::endian::StreamOrder;

pub const HEADER: usize = 20;

pub const DEPTH_INFO: usize = 12;
pub const DEPTH_BEAM: usize = 16;

pub const XYZ_INFO: usize = 20;
pub const XYZ_BEAM: usize = 20;

pub const DEPTH_NOMINAL_INFO: usize = 8;
pub const DEPTH_NOMINAL_BEAM: usize = 14;

pub const EXTRA_DETECT_INFO: usize = 36;
pub const EXTRA_DETECT_CLASS: usize = 16;
pub const EXTRA_DETECT_DATA: usize = 68;

pub const CENTRAL_BEAMS_INFO: usize = 16;
pub const CENTRAL_BEAMS_DATA: usize = 6;

pub const RRA_101_INFO: usize = 30;
pub const RRA_101_TX: usize = 12;
pub const RRA_101_RX: usize = 16;

pub const RRA_70_INFO: usize = 4;
pub const RRA_70_BEAM: usize = 8;

pub const RRA_102_INFO: usize = 20;
pub const RRA_102_TX: usize = 20;
pub const RRA_102_RX: usize = 12;

pub const RRA_78_INFO: usize = 16;
pub const RRA_78_TX: usize = 24;
pub const RRA_78_RX: usize = 16;

pub const SEABED_83_INFO: usize = 16;
pub const SEABED_83_BEAM: usize = 6;

pub const SEABED_89_INFO: usize = 16;
pub const SEABED_89_BEAM: usize = 6;

pub const WC_INFO: usize = 24;
pub const WC_TX: usize = 6;
pub const WC_RX_INFO: usize = 10;

pub const QF_INFO: usize = 4;

pub const ATTITUDE_INFO: usize = 2;
pub const ATTITUDE_DATA: usize = 12;

pub const ATTITUDE_NET_INFO: usize = 4;
pub const ATTITUDE_NET_DATA_INFO: usize = 11;

pub const CLOCK_INFO: usize = 9;
pub const HEIGHT_INFO: usize = 5;

pub const HEADING_INFO: usize = 2;
pub const HEADING_DATA: usize = 4;

pub const POSITION_INFO: usize = 18;
pub const SB_DEPTH_INFO: usize = 13;
pub const TIDE_INFO: usize = 11;

pub const SSSV_INFO: usize = 2;
pub const SSSV_DATA: usize = 4;

pub const SVP_INFO: usize = 12;
pub const SVP_DATA: usize = 8;
pub const SVP_EM3000_DATA: usize = 4;

pub const INSTALL_PARAMS_INFO: usize = 2;
pub const RUNTIME_PARAMS_INFO: usize = 33;
pub const EXTRA_PARAMS_INFO: usize = 2;

pub const PU_OUTPUT_INFO: usize = 88;
pub const PU_STATUS_INFO: usize = 69;
pub const PU_BIST_INFO: usize = 4;

pub const TILT_INFO: usize = 2;
pub const TILT_DATA: usize = 4;

pub const HISAS_STATUS_INFO: usize = 100;

pub const SIDESCAN_STATUS_CHANNEL: usize = 128;
pub const SIDESCAN_STATUS_INFO: usize = 1025;
pub const SIDESCAN_STATUS_MAX_CHANNELS: usize = 6;

pub const SIDESCAN_DATA_INFO: usize = 256;
pub const SIDESCAN_DATA_CHANNEL: usize = 64;

pub const NAVIGATION_OUTPUT_INFO: usize = 112;

/// Reads a `u16` at `offset` from `buf`, assuming the crate's canonical
/// on-wire convention (little-endian) — correct once [`crate::swap`] has
/// run, or already correct for a native-order stream.
pub fn u16_at(buf: &[u8], offset: usize) -> u16 {
    LittleEndian::read_u16(&buf[offset..offset + 2])
}

/// Reads a `u32` at `offset` from `buf`, same convention as [`u16_at`].
pub fn u32_at(buf: &[u8], offset: usize) -> u32 {
    LittleEndian::read_u32(&buf[offset..offset + 4])
}

/// Reads an `f32` at `offset` from `buf`, same convention as [`u16_at`].
pub fn f32_at(buf: &[u8], offset: usize) -> f32 {
    LittleEndian::read_f32(&buf[offset..offset + 4])
}

/// Reads a `u16` at `offset` honoring `order` directly, without requiring
/// the buffer to have been swapped first. The layout resolver uses this
/// to read length-prefix counters before the byte-swapper has run
/// (spec.md §4.5: "counters read before swap").
pub fn u16_ordered(buf: &[u8], offset: usize, order: StreamOrder) -> u16 {
    match order {
        StreamOrder::Native => LittleEndian::read_u16(&buf[offset..offset + 2]),
        StreamOrder::Swapped => BigEndian::read_u16(&buf[offset..offset + 2]),
    }
}

/// Reads a `u32` at `offset` honoring `order` directly, same rationale as
/// [`u16_ordered`].
pub fn u32_ordered(buf: &[u8], offset: usize, order: StreamOrder) -> u32 {
    match order {
        StreamOrder::Native => LittleEndian::read_u32(&buf[offset..offset + 4]),
        StreamOrder::Swapped => BigEndian::read_u32(&buf[offset..offset + 4]),
    }
}

