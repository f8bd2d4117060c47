//! The Layout Resolver (spec.md §4.5): carves a record's body into its
//! fixed descriptors and variable-length arrays, using only counters read
//! from the raw (pre-swap) buffer, before any byte-swapping happens.
//!
//! Resolution never mutates the buffer; [`crate::swap`] does that
//! afterwards, walking exactly the ranges this module identifies.
//!
//! Counters are read with [`StreamOrder`] applied locally to just those
//! bytes (spec.md §4.5: "counters read before swap") rather than waiting
//! for the buffer-wide swap pass. The five variants spec.md §4.6 exempts
//! from swapping are read as fixed little-endian regardless of stream
//! order, since their payloads are already a fixed network order or a
//! bag of bytes (see `DESIGN.md`).

use crate::descriptors as d;
use crate::endian::StreamOrder;
use crate::error::DecoderError;
use crate::variant::DatagramType;

/// Maximum accepted tx-sector / beam count for RRA-78, RRA-101, RRA-102
/// and WATER_COLUMN (spec.md §4.5 bounded counters).
const MAX_TX_SECTORS: u16 = 20;

/// Maximum accepted channel count for SIDESCAN_STATUS and
/// HISAS_1032_SIDESCAN (spec.md §4.5 bounded counters).
const MAX_SIDESCAN_CHANNELS: u16 = 6;

/// A resolved record body: named byte ranges (as offsets into the body
/// slice) for each fixed descriptor and array the variant defines.
///
/// Every range has already been bounds-checked against the body length;
/// holding a `RecordBody` is a guarantee those slices are in range.
#[derive(Debug, Clone, Copy)]
pub enum RecordBody {
    Depth { info: Span, beams: Span },
    DepthNominal { info: Span, beams: Span },
    Xyz { info: Span, beams: Span },
    ExtraDetections { info: Span, classes: Span, detections: Span },
    CentralBeams { info: Span, data: Span },
    Rra70 { info: Span, beams: Span },
    Rra78 { info: Span, tx: Span, rx: Span },
    Rra101 { info: Span, tx: Span, rx: Span },
    Rra102 { info: Span, tx: Span, rx: Span },
    Rra123 { raw: Span },
    SeabedImage83 { info: Span, beams: Span },
    SeabedImage89 { info: Span, beams: Span },
    WaterColumn { info: Span, tx: Span, rx: Span },
    QualityFactor { info: Span, data: Span },
    Attitude { info: Span, data: Span },
    AttitudeNetwork { info: Span, entries: Span },
    Clock { info: Span },
    Height { info: Span },
    Heading { info: Span, data: Span },
    Position { info: Span },
    SingleBeamDepth { info: Span },
    Tide { info: Span },
    Sssv { info: Span, data: Span },
    Svp { info: Span, data: Span },
    SvpEm3000 { data: Span },
    KmSspOutput { raw: Span },
    InstallParams { info: Span, text: Span },
    RemoteParamsInfo { raw: Span },
    RuntimeParams { info: Span },
    ExtraParams { info: Span, content: ExtraParamsContent },
    PuOutput { info: Span },
    PuStatus { info: Span },
    PuBistResult { info: Span, text: Span },
    TransducerTilt { info: Span, data: Span },
    SystemStatus { raw: Span },
    Stave { raw: Span },
    HisasStatus { info: Span },
    NavigationOutput { info: Span },
    SidescanStatus { info: Span },
    Hisas1032Sidescan { info: Span, channels: Span },
    Unknown2 { raw: Span },
    Unknown { raw: Span },
}

/// spec.md §4.5: only content `6` ("bscorr.txt") is implemented; every
/// other content code is a structural gap, not a corrupt record, so it
/// surfaces as [`DecoderError::Unsupported`] rather than being decoded.
#[derive(Debug, Clone, Copy)]
pub enum ExtraParamsContent {
    BsCorr(Span),
}

/// A byte range within a record's body, expressed as start/end offsets
/// rather than a borrow, so a `RecordBody` can be computed before the
/// buffer is byte-swapped and still be valid after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    fn new(start: usize, end: usize) -> Span {
        Span { start, end }
    }

    pub fn len(self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn of<'a>(self, body: &'a [u8]) -> &'a [u8] {
        &body[self.start..self.end]
    }
}

/// EXTRA_DETECTIONS version/element-size gate (spec.md §4.5): unlike every
/// other layout-kind failure, a mismatch here is explicitly *not* fatal —
/// the caller discards the record and moves on (spec.md §4.7 step 10,
/// §7 recovery policy).
const EXTRA_DETECT_VERSION: u16 = 1;
const EXTRA_DETECT_NBYTES_CLASS: u16 = 16;
const EXTRA_DETECT_NBYTES_DETECT: u16 = 68;

/// Resolves `body`'s layout for the given `datagram_type`. `order` is the
/// stream's resolved byte order, used to read counters correctly ahead of
/// the byte-swap pass. `sidescan_widths` supplies the per-channel sample
/// width cached from the most recent SIDESCAN_STATUS record on this
/// stream (spec.md §4.5 cross-record dependency).
///
/// Returns `Ok(None)` for the one layout-kind failure spec.md §4.5 and §7
/// treat as discardable rather than fatal: an EXTRA_DETECTIONS record
/// whose version or element-size fields don't match what this crate
/// implements. Every other failure (bounded-counter violation, bad
/// sub-variant, missing cross-record dependency) is `Err`.
pub fn resolve(
    datagram_type: DatagramType,
    body: &[u8],
    order: StreamOrder,
    sidescan_widths: &[u8],
) -> Result<Option<RecordBody>, DecoderError> {
    let cursor = Cursor::new(body);
    let u16f = |offset: usize| d::u16_ordered(body, offset, order);
    use DatagramType::*;
    let resolved = match datagram_type {
        Depth => {
            let info = cursor.take(d::DEPTH_INFO)?;
            let num_beams = u16f(info.start);
            let beams = cursor.take_array(num_beams as usize, d::DEPTH_BEAM)?;
            RecordBody::Depth { info, beams }
        }
        DepthNominal => {
            let info = cursor.take(d::DEPTH_NOMINAL_INFO)?;
            let num_beams = u16f(info.start);
            let beams = cursor.take_array(num_beams as usize, d::DEPTH_NOMINAL_BEAM)?;
            RecordBody::DepthNominal { info, beams }
        }
        Xyz => {
            let info = cursor.take(d::XYZ_INFO)?;
            let num_beams = u16f(info.start);
            let beams = cursor.take_array(num_beams as usize, d::XYZ_BEAM)?;
            RecordBody::Xyz { info, beams }
        }
        ExtraDetections => {
            let info = cursor.take(d::EXTRA_DETECT_INFO)?;
            let num_classes = u16f(info.start);
            let num_detections = u16f(info.start + 2);
            let datagram_version = u16f(info.start + 4);
            let nbytes_class = u16f(info.start + 6);
            let nbytes_detect = u16f(info.start + 8);
            if datagram_version != EXTRA_DETECT_VERSION
                || nbytes_class != EXTRA_DETECT_NBYTES_CLASS
                || nbytes_detect != EXTRA_DETECT_NBYTES_DETECT
            {
                return Ok(None);
            }
            let classes = cursor.take_array(num_classes as usize, d::EXTRA_DETECT_CLASS)?;
            let detections = cursor.take_array(num_detections as usize, d::EXTRA_DETECT_DATA)?;
            RecordBody::ExtraDetections {
                info,
                classes,
                detections,
            }
        }
        CentralBeams => {
            let info = cursor.take(d::CENTRAL_BEAMS_INFO)?;
            let num_beams = u16f(info.start);
            let data = cursor.take_array(num_beams as usize, d::CENTRAL_BEAMS_DATA)?;
            RecordBody::CentralBeams { info, data }
        }
        Rra70 => {
            let info = cursor.take(d::RRA_70_INFO)?;
            let num_beams = u16f(info.start);
            let beams = cursor.take_array(num_beams as usize, d::RRA_70_BEAM)?;
            RecordBody::Rra70 { info, beams }
        }
        Rra78 => {
            let info = cursor.take(d::RRA_78_INFO)?;
            let tx_sectors = bounded_tx_sectors(u16f(info.start))?;
            let nrx = u16f(info.start + 2);
            let tx = cursor.take_array(tx_sectors as usize, d::RRA_78_TX)?;
            let rx = cursor.take_array(nrx as usize, d::RRA_78_RX)?;
            RecordBody::Rra78 { info, tx, rx }
        }
        Rra101 => {
            let info = cursor.take(d::RRA_101_INFO)?;
            let tx_sectors = bounded_tx_sectors(u16f(info.start))?;
            let nrx = u16f(info.start + 2);
            let tx = cursor.take_array(tx_sectors as usize, d::RRA_101_TX)?;
            let rx = cursor.take_array(nrx as usize, d::RRA_101_RX)?;
            RecordBody::Rra101 { info, tx, rx }
        }
        Rra102 => {
            let info = cursor.take(d::RRA_102_INFO)?;
            let tx_sectors = bounded_tx_sectors(u16f(info.start))?;
            let nrx = u16f(info.start + 2);
            let tx = cursor.take_array(tx_sectors as usize, d::RRA_102_TX)?;
            let rx = cursor.take_array(nrx as usize, d::RRA_102_RX)?;
            RecordBody::Rra102 { info, tx, rx }
        }
        // Swap-exempt: fixed network order, read unconditionally as LE.
        Rra123 => RecordBody::Rra123 {
            raw: cursor.take_remainder(),
        },
        SeabedImage83 => {
            let info = cursor.take(d::SEABED_83_INFO)?;
            let num_beams = u16f(info.start);
            let beams = cursor.take_array(num_beams as usize, d::SEABED_83_BEAM)?;
            RecordBody::SeabedImage83 { info, beams }
        }
        SeabedImage89 => {
            let info = cursor.take(d::SEABED_89_INFO)?;
            let num_beams = u16f(info.start);
            let beams = cursor.take_array(num_beams as usize, d::SEABED_89_BEAM)?;
            RecordBody::SeabedImage89 { info, beams }
        }
        WaterColumn => {
            let info = cursor.take(d::WC_INFO)?;
            let tx_sectors = bounded_tx_sectors(u16f(info.start))?;
            let tx = cursor.take_array(tx_sectors as usize, d::WC_TX)?;
            let num_rx = u16f(info.start + 2);
            let rx = cursor.take_nested(num_rx as usize, d::WC_RX_INFO, |entry_info| {
                Ok(d::u16_ordered(entry_info, 8, order) as usize)
            })?;
            RecordBody::WaterColumn { info, tx, rx }
        }
        QualityFactor => {
            let info = cursor.take(d::QF_INFO)?;
            let num_beams = u16f(info.start);
            let npar = u16f(info.start + 2);
            if npar != 1 {
                return Err(DecoderError::unsupported(format!(
                    "QUALITY_FACTOR npar {} is not 1",
                    npar
                )));
            }
            let data = cursor.take_array(num_beams as usize, 1)?;
            RecordBody::QualityFactor { info, data }
        }
        Attitude => {
            let info = cursor.take(d::ATTITUDE_INFO)?;
            let num_entries = u16f(info.start);
            let data = cursor.take_array(num_entries as usize, d::ATTITUDE_DATA)?;
            RecordBody::Attitude { info, data }
        }
        AttitudeNetwork => {
            let info = cursor.take(d::ATTITUDE_NET_INFO)?;
            let num_entries = u16f(info.start);
            let entries = cursor.take_nested(
                num_entries as usize,
                d::ATTITUDE_NET_DATA_INFO,
                |entry_info| Ok(d::u16_ordered(entry_info, 4, order) as usize),
            )?;
            RecordBody::AttitudeNetwork { info, entries }
        }
        Clock => RecordBody::Clock {
            info: cursor.take(d::CLOCK_INFO)?,
        },
        Height => RecordBody::Height {
            info: cursor.take(d::HEIGHT_INFO)?,
        },
        Heading => {
            let info = cursor.take(d::HEADING_INFO)?;
            let num_entries = u16f(info.start);
            let data = cursor.take_array(num_entries as usize, d::HEADING_DATA)?;
            RecordBody::Heading { info, data }
        }
        Position => RecordBody::Position {
            info: cursor.take(d::POSITION_INFO)?,
        },
        SingleBeamDepth => RecordBody::SingleBeamDepth {
            info: cursor.take(d::SB_DEPTH_INFO)?,
        },
        Tide => RecordBody::Tide {
            info: cursor.take(d::TIDE_INFO)?,
        },
        Sssv => {
            let info = cursor.take(d::SSSV_INFO)?;
            let num_entries = u16f(info.start);
            let data = cursor.take_array(num_entries as usize, d::SSSV_DATA)?;
            RecordBody::Sssv { info, data }
        }
        Svp => {
            let info = cursor.take(d::SVP_INFO)?;
            let num_entries = u16f(info.start + 10);
            let data = cursor.take_array(num_entries as usize, d::SVP_DATA)?;
            RecordBody::Svp { info, data }
        }
        SvpEm3000 => {
            let num_entries = cursor.remaining_len() / d::SVP_EM3000_DATA;
            let data = cursor.take_array(num_entries, d::SVP_EM3000_DATA)?;
            RecordBody::SvpEm3000 { data }
        }
        // Swap-exempt: fixed network order, read unconditionally as LE.
        KmSspOutput => RecordBody::KmSspOutput {
            raw: cursor.take_remainder(),
        },
        InstallParamsStart | InstallParamsStop | InstallParamsRemote => {
            let info = cursor.take(d::INSTALL_PARAMS_INFO)?;
            let text = cursor.take_remainder();
            RecordBody::InstallParams { info, text }
        }
        RemoteParamsInfo => RecordBody::RemoteParamsInfo {
            raw: cursor.take_remainder(),
        },
        RuntimeParams => RecordBody::RuntimeParams {
            info: cursor.take(d::RUNTIME_PARAMS_INFO)?,
        },
        ExtraParams => {
            let info = cursor.take(d::EXTRA_PARAMS_INFO)?;
            let content_code = u16f(info.start);
            let content = match content_code {
                6 => ExtraParamsContent::BsCorr(cursor.take_remainder()),
                other => {
                    return Err(DecoderError::unsupported(format!(
                        "EXTRA_PARAMS content {} is not implemented",
                        other
                    )))
                }
            };
            RecordBody::ExtraParams { info, content }
        }
        PuOutput => RecordBody::PuOutput {
            info: cursor.take(d::PU_OUTPUT_INFO)?,
        },
        PuStatus => RecordBody::PuStatus {
            info: cursor.take(d::PU_STATUS_INFO)?,
        },
        PuBistResult => {
            let info = cursor.take(d::PU_BIST_INFO)?;
            let text = cursor.take_remainder();
            RecordBody::PuBistResult { info, text }
        }
        TransducerTilt => {
            let info = cursor.take(d::TILT_INFO)?;
            let num_samples = u16f(info.start);
            let data = cursor.take_array(num_samples as usize, d::TILT_DATA)?;
            RecordBody::TransducerTilt { info, data }
        }
        SystemStatus => RecordBody::SystemStatus {
            raw: cursor.take_remainder(),
        },
        Stave => RecordBody::Stave {
            raw: cursor.take_remainder(),
        },
        // Swap-exempt below: counters read as fixed little-endian,
        // independent of the stream's resolved order (spec.md §4.6).
        HisasStatus => RecordBody::HisasStatus {
            info: cursor.take(d::HISAS_STATUS_INFO)?,
        },
        NavigationOutput => RecordBody::NavigationOutput {
            info: cursor.take(d::NAVIGATION_OUTPUT_INFO)?,
        },
        SidescanStatus => {
            let info = cursor.take(d::SIDESCAN_STATUS_INFO)?;
            let num_channels = d::u16_at(body, info.start);
            if num_channels > MAX_SIDESCAN_CHANNELS {
                return Err(DecoderError::bad_data(format!(
                    "SIDESCAN_STATUS num_channels {} exceeds {}",
                    num_channels, MAX_SIDESCAN_CHANNELS
                )));
            }
            RecordBody::SidescanStatus { info }
        }
        Hisas1032Sidescan => {
            let info = cursor.take(d::SIDESCAN_DATA_INFO)?;
            let num_channels = d::u16_at(body, info.start);
            if num_channels > MAX_SIDESCAN_CHANNELS {
                return Err(DecoderError::bad_data(format!(
                    "HISAS_1032_SIDESCAN num_channels {} exceeds {}",
                    num_channels, MAX_SIDESCAN_CHANNELS
                )));
            }
            let channels = cursor.take_nested(num_channels as usize, d::SIDESCAN_DATA_CHANNEL, {
                |channel_header| {
                    let channel_index = d::u16_at(channel_header, 0) as usize;
                    let num_samples = d::u32_at(channel_header, 2) as usize;
                    let width = sidescan_widths.get(channel_index).copied().unwrap_or(0);
                    if width == 0 {
                        return Err(DecoderError::bad_data(format!(
                            "HISAS_1032_SIDESCAN channel {} has no cached sample width \
                             from a prior SIDESCAN_STATUS record",
                            channel_index
                        )));
                    }
                    Ok(num_samples * width as usize)
                }
            })?;
            RecordBody::Hisas1032Sidescan { info, channels }
        }
        Unknown2 => RecordBody::Unknown2 {
            raw: cursor.take_remainder(),
        },
        Unknown(_) => RecordBody::Unknown {
            raw: cursor.take_remainder(),
        },
    };

    cursor.finish(body.len())?;
    Ok(Some(resolved))
}

fn bounded_tx_sectors(tx_sectors: u16) -> Result<u16, DecoderError> {
    if tx_sectors > MAX_TX_SECTORS {
        return Err(DecoderError::bad_data(format!(
            "tx_sectors {} exceeds {}",
            tx_sectors, MAX_TX_SECTORS
        )));
    }
    Ok(tx_sectors)
}

/// A one-shot forward-only cursor over a body slice, used only to carve
/// [`Span`]s. It reads bytes solely to size nested variable-length tails;
/// it never mutates the buffer.
struct Cursor<'a> {
    body: &'a [u8],
    offset: std::cell::Cell<usize>,
}

impl<'a> Cursor<'a> {
    fn new(body: &'a [u8]) -> Cursor<'a> {
        Cursor {
            body,
            offset: std::cell::Cell::new(0),
        }
    }

    fn take(&self, size: usize) -> Result<Span, DecoderError> {
        let start = self.offset.get();
        let end = start + size;
        if end > self.body.len() {
            return Err(DecoderError::bad_data(format!(
                "descriptor of {} bytes at offset {} overruns body of {} bytes",
                size,
                start,
                self.body.len()
            )));
        }
        self.offset.set(end);
        Ok(Span::new(start, end))
    }

    fn take_array(&self, count: usize, element_size: usize) -> Result<Span, DecoderError> {
        self.take(
            count
                .checked_mul(element_size)
                .ok_or_else(|| DecoderError::bad_data("array size overflow"))?,
        )
    }

    /// Walks `count` fixed-size headers, each followed by a variable tail
    /// whose length `tail_len` computes from the header's own bytes
    /// (spec.md §4.5 nested variable-length records), returning the span
    /// covering the whole walked region.
    fn take_nested(
        &self,
        count: usize,
        header_size: usize,
        tail_len: impl Fn(&[u8]) -> Result<usize, DecoderError>,
    ) -> Result<Span, DecoderError> {
        let start = self.offset.get();
        for _ in 0..count {
            let header = self.take(header_size)?;
            let len = tail_len(header.of(self.body))?;
            self.take(len)?;
        }
        Ok(Span::new(start, self.offset.get()))
    }

    fn take_remainder(&self) -> Span {
        let start = self.offset.get();
        self.offset.set(self.body.len());
        Span::new(start, self.body.len())
    }

    fn remaining_len(&self) -> usize {
        self.body.len() - self.offset.get()
    }

    fn finish(&self, body_len: usize) -> Result<(), DecoderError> {
        if self.offset.get() > body_len {
            return Err(DecoderError::bad_data(
                "layout resolver cursor overran the record body",
            ));
        }
        Ok(())
    }
}
