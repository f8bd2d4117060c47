//! The Decoder State Machine (spec.md §4.7): ties the Frame Reader, the
//! ByteOrder Resolver, the Header Validator, the Checksum Verifier, the
//! Layout Resolver and the Byte-Swapper into the per-record decode loop.

use crate::checksum::{self, ChecksumOutcome};
use crate::descriptors as d;
use crate::endian::{self, StreamOrder};
use crate::error::DecoderError;
use crate::header::{self, Header, HEADER_SIZE, UNKNOWN2_TYPE};
use crate::iter::Records;
use crate::layout::{self, RecordBody};
use crate::source::ByteSource;
use crate::swap;
use crate::variant::DatagramType;

/// Byte offset of `num_channels` within a SIDESCAN_STATUS `info` block, and
/// the layout of its fixed per-channel table: each of up to
/// [`d::SIDESCAN_STATUS_MAX_CHANNELS`] slots is
/// [`d::SIDESCAN_STATUS_CHANNEL`] bytes wide, with `bytes_per_sample` at
/// offset 0 of its slot. Neither offset is swapped: SIDESCAN_STATUS is
/// swap-exempt (spec.md §4.6) and `bytes_per_sample` is single-byte.
const SIDESCAN_NUM_CHANNELS_OFFSET: usize = 0;
const SIDESCAN_CHANNEL_TABLE_OFFSET: usize = 2;
const SIDESCAN_CHANNEL_WIDTH_OFFSET: usize = 0;

/// Per-[`DecoderState`] policy knobs (spec.md §6).
#[derive(Debug, Clone, Copy)]
pub struct DecoderOptions {
    /// When `true`, WATER_COLUMN bodies are skipped without being
    /// allocated or validated.
    pub ignore_wc: bool,
    /// When `true`, a checksum mismatch is tolerated (downgraded to a
    /// debug event) instead of discarding the record.
    pub ignore_checksum: bool,
    /// Gating level for optional diagnostic events; `0` disables them.
    pub debug_level: i32,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            ignore_wc: false,
            ignore_checksum: false,
            debug_level: 0,
        }
    }
}

/// A decoded record: its header, variant tag, the corrected body bytes,
/// and the resolved layout identifying where within `body` each descriptor
/// and array lives.
///
/// Borrowed from the owning [`DecoderState`]; valid only until the next
/// call to [`DecoderState::next_record`] (spec.md §3 Lifecycle).
#[derive(Debug)]
pub struct Record<'a> {
    pub header: Header,
    pub datagram_type: DatagramType,
    pub body: &'a [u8],
    pub layout: RecordBody,
}

/// A replayable summary of a fatal error. `DecoderError` itself isn't
/// `Clone` (it wraps `io::Error`), so the sticky-error state keeps just
/// enough to reconstruct an equivalent error on every subsequent call
/// (spec.md §7: "the same error is returned again ... until teardown").
#[derive(Debug, Clone)]
enum Sticky {
    Read(String),
    Seek(String),
    NoMemory(usize),
    BadData(String),
    Unsupported(String),
}

impl Sticky {
    fn capture(err: &DecoderError) -> Sticky {
        match err {
            DecoderError::ReadError(e) => Sticky::Read(e.to_string()),
            DecoderError::SeekError(e) => Sticky::Seek(e.to_string()),
            DecoderError::NoMemory { requested } => Sticky::NoMemory(*requested),
            DecoderError::BadData(msg) => Sticky::BadData(msg.clone()),
            DecoderError::Unsupported(msg) => Sticky::Unsupported(msg.clone()),
        }
    }

    fn replay(&self) -> DecoderError {
        match self {
            Sticky::Read(msg) => DecoderError::ReadError(std::io::Error::new(
                std::io::ErrorKind::Other,
                msg.clone(),
            )),
            Sticky::Seek(msg) => DecoderError::SeekError(std::io::Error::new(
                std::io::ErrorKind::Other,
                msg.clone(),
            )),
            Sticky::NoMemory(requested) => DecoderError::NoMemory {
                requested: *requested,
            },
            Sticky::BadData(msg) => DecoderError::BadData(msg.clone()),
            Sticky::Unsupported(msg) => DecoderError::Unsupported(msg.clone()),
        }
    }
}

#[derive(Debug, Clone)]
enum Status {
    Reading,
    AtEndOfStream,
    InError(Sticky),
}

/// The outcome of one attempt at reading a single frame from the byte
/// source: either nothing was left, a record was fully decoded, or the
/// record was discarded per spec.md §4.7's swallow-and-continue policy.
enum Attempt {
    Eof,
    Discarded,
    Decoded,
}

/// Owns the byte source, the reusable decode buffer, the stream's sticky
/// resolved byte order, and the per-channel sidescan sample-width cache.
/// Reused across every record of a stream; released on teardown
/// (spec.md §3 Lifecycle, §5 Concurrency & Resource Model).
pub struct DecoderState<R: ByteSource> {
    source: R,
    options: DecoderOptions,
    body_buf: Vec<u8>,
    body_len: usize,
    order: Option<StreamOrder>,
    sidescan_widths: [u8; d::SIDESCAN_STATUS_MAX_CHANNELS],
    status: Status,
    last_header: Header,
    last_datagram_type: DatagramType,
    last_layout: Option<RecordBody>,
}

impl<R: ByteSource> DecoderState<R> {
    /// Creates a decoder over `source` with the given policy knobs. The
    /// byte source is considered open from this point on; call
    /// [`Self::close`] to release it.
    pub fn new(source: R, options: DecoderOptions) -> DecoderState<R> {
        DecoderState {
            source,
            options,
            body_buf: Vec::new(),
            body_len: 0,
            order: None,
            sidescan_widths: [0; d::SIDESCAN_STATUS_MAX_CHANNELS],
            status: Status::Reading,
            last_header: Header {
                bytes_in_datagram: 0,
                start_identifier: 0,
                datagram_type: 0,
                em_model_number: 0,
                date: 0,
                time_ms: 0,
                counter: 0,
                serial_number: 0,
            },
            last_datagram_type: DatagramType::Unknown(0),
            last_layout: None,
        }
    }

    /// The stream's resolved byte order, once the first record has been
    /// decoded; `None` before that.
    pub fn stream_order(&self) -> Option<StreamOrder> {
        self.order
    }

    /// The per-channel sample-width cache last populated by a
    /// SIDESCAN_STATUS record, for constructing a
    /// [`crate::iter::HisasSidescanChannels`] over a HISAS_1032_SIDESCAN
    /// record's channel span. Zeroed for any channel no SIDESCAN_STATUS
    /// has covered yet.
    pub fn sidescan_widths(&self) -> [u8; d::SIDESCAN_STATUS_MAX_CHANNELS] {
        self.sidescan_widths
    }

    /// Releases the byte source. Calling this more than once is a no-op
    /// (spec.md §8: "idempotence of teardown").
    pub fn close(mut self) -> R {
        self.status = Status::AtEndOfStream;
        self.source
    }

    /// An iterator adapter over [`Self::next_record`].
    pub fn records(&mut self) -> Records<'_, R> {
        Records::new(self)
    }

    /// Decodes and returns the next record, or `Ok(None)` at end-of-stream.
    ///
    /// Discardable failures — a checksum mismatch (unless
    /// `ignore_checksum` is set), an EXTRA_DETECTIONS record whose
    /// version/element-size gate doesn't match, and a WATER_COLUMN body
    /// skipped by `ignore_wc` — are swallowed internally; the loop moves
    /// on to the next record without surfacing an error (spec.md §4.7,
    /// §7 Recovery policy). Any other error is sticky: it is returned
    /// again on every subsequent call until the state is torn down.
    pub fn next_record(&mut self) -> Result<Option<Record<'_>>, DecoderError> {
        match &self.status {
            Status::AtEndOfStream => return Ok(None),
            Status::InError(sticky) => return Err(sticky.replay()),
            Status::Reading => {}
        }

        loop {
            match self.attempt_one() {
                Ok(Attempt::Eof) => {
                    self.status = Status::AtEndOfStream;
                    return Ok(None);
                }
                Ok(Attempt::Discarded) => continue,
                Ok(Attempt::Decoded) => {
                    return Ok(Some(Record {
                        header: self.last_header,
                        datagram_type: self.last_datagram_type,
                        body: &self.body_buf[..self.body_len],
                        layout: self
                            .last_layout
                            .expect("Decoded implies a resolved layout"),
                    }));
                }
                Err(e) => {
                    self.status = Status::InError(Sticky::capture(&e));
                    return Err(e);
                }
            }
        }
    }

    /// One pass of spec.md §4.7 steps 1-11: read a header, resolve byte
    /// order on the first call, validate, read the body, checksum it,
    /// resolve its layout, and byte-swap it. Never loops internally;
    /// [`Self::next_record`] retries by calling this again.
    fn attempt_one(&mut self) -> Result<Attempt, DecoderError> {
        let mut header_raw = [0u8; HEADER_SIZE];
        let n = self.source.read(&mut header_raw)?;
        if n == 0 {
            return Ok(Attempt::Eof);
        }
        if n != HEADER_SIZE {
            return Err(DecoderError::bad_data(format!(
                "truncated header: got {} of {} bytes",
                n, HEADER_SIZE
            )));
        }

        let mut header = Header::parse(&header_raw);

        let order = match self.order {
            Some(order) => order,
            None => {
                let order = endian::resolve(header.date, header.em_model_number)?;
                self.order = Some(order);
                self.debug(&format!("resolved stream byte order as {:?}", order));
                order
            }
        };

        if order.needs_swap() {
            header.swap();
        }

        header::validate(&header)?;

        let body_size = header.body_size() as usize;
        let datagram_type = DatagramType::from_raw(header.datagram_type);

        if self.options.ignore_wc && datagram_type == DatagramType::WaterColumn {
            self.source.skip(body_size)?;
            self.debug("skipped WATER_COLUMN body per ignore_wc policy");
            return Ok(Attempt::Discarded);
        }

        self.grow_buffer(body_size)?;
        let n = self.source.read(&mut self.body_buf[..body_size])?;
        if n != body_size {
            return Err(DecoderError::bad_data(format!(
                "truncated body: got {} of {} bytes",
                n, body_size
            )));
        }

        if header.datagram_type != UNKNOWN2_TYPE {
            match checksum::verify(&header_raw, &self.body_buf[..body_size], order)? {
                ChecksumOutcome::Ok => {}
                ChecksumOutcome::Mismatch { expected, computed } => {
                    if self.options.ignore_checksum {
                        self.debug(&format!(
                            "checksum mismatch tolerated: expected {:#06x}, computed {:#06x}",
                            expected, computed
                        ));
                    } else {
                        self.debug(&format!(
                            "discarding record with bad checksum: expected {:#06x}, computed {:#06x}",
                            expected, computed
                        ));
                        return Ok(Attempt::Discarded);
                    }
                }
            }
        }

        let layout = match layout::resolve(
            datagram_type,
            &self.body_buf[..body_size],
            order,
            &self.sidescan_widths,
        )? {
            Some(layout) => layout,
            None => {
                self.debug(
                    "discarding EXTRA_DETECTIONS record with unrecognized version/size gate",
                );
                return Ok(Attempt::Discarded);
            }
        };

        if order.needs_swap() {
            swap::apply(
                order,
                datagram_type,
                &mut self.body_buf[..body_size],
                &layout,
            );
        }

        if datagram_type == DatagramType::SidescanStatus {
            self.cache_sidescan_widths(body_size);
        }

        self.body_len = body_size;
        self.last_header = header;
        self.last_datagram_type = datagram_type;
        self.last_layout = Some(layout);
        Ok(Attempt::Decoded)
    }

    /// Updates the per-channel sample-width cache from a just-decoded
    /// SIDESCAN_STATUS record, consumed later by HISAS_1032_SIDESCAN
    /// (spec.md §4.5 cross-record dependency).
    fn cache_sidescan_widths(&mut self, body_size: usize) {
        let body = &self.body_buf[..body_size];
        let num_channels = (d::u16_at(body, SIDESCAN_NUM_CHANNELS_OFFSET) as usize)
            .min(d::SIDESCAN_STATUS_MAX_CHANNELS);
        for channel in 0..num_channels {
            let slot = SIDESCAN_CHANNEL_TABLE_OFFSET + channel * d::SIDESCAN_STATUS_CHANNEL;
            self.sidescan_widths[channel] = body[slot + SIDESCAN_CHANNEL_WIDTH_OFFSET];
        }
    }

    /// Grows the reusable body buffer to at least `required` bytes,
    /// reallocating to `1.5 * required` (rounded up) and discarding old
    /// contents when it's too small. The buffer never shrinks
    /// (spec.md §4.2).
    fn grow_buffer(&mut self, required: usize) -> Result<(), DecoderError> {
        if self.body_buf.len() < required {
            let tripled = required
                .checked_mul(3)
                .ok_or(DecoderError::NoMemory {
                    requested: required,
                })?;
            let grown = (tripled + 1) / 2;
            self.body_buf = vec![0u8; grown];
        }
        Ok(())
    }

    fn debug(&self, msg: &str) {
        if self.options.debug_level > 0 {
            log::debug!("{}", msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Builds one well-formed native-order DEPTH record with `num_beams`
    /// zeroed beams.
    fn depth_stream(date: u32, num_beams: u16) -> Vec<u8> {
        let mut body = vec![0u8; d::DEPTH_INFO];
        body[0..2].copy_from_slice(&num_beams.to_le_bytes());
        body.extend(vec![0u8; num_beams as usize * d::DEPTH_BEAM]);
        body.push(0x03); // ETX

        // total on-wire body = body.len() (info/beams/ETX) + 2 (checksum);
        // bytes_in_datagram = total_body + HEADER_SIZE - 4 (header.body_size()'s inverse).
        let bytes_in_datagram = (body.len() + 2 + HEADER_SIZE - 4) as u32;

        let mut header = Vec::with_capacity(HEADER_SIZE);
        header.extend(&bytes_in_datagram.to_le_bytes());
        header.push(0x02); // STX
        header.push(1); // DatagramType::Depth.raw()
        header.extend(&2040u16.to_le_bytes()); // em_model_number
        header.extend(&date.to_le_bytes());
        header.extend(&0u32.to_le_bytes()); // time_ms
        header.extend(&0u16.to_le_bytes()); // counter
        header.extend(&0u16.to_le_bytes()); // serial_number
        assert_eq!(header.len(), HEADER_SIZE);

        // The checksum covers everything up to but excluding the ETX byte
        // (spec.md §4.4), which is `body`'s last byte here.
        let mut sum: u16 = 0;
        for &b in header[5..].iter().chain(body[..body.len() - 1].iter()) {
            sum = sum.wrapping_add(b as u16);
        }

        let mut record = header;
        record.extend(&body);
        record.extend(&sum.to_le_bytes());
        record
    }

    /// Like [`depth_stream`], but each beam's first two fields get
    /// distinct, non-zero values, so a missed byte-swap anywhere in the
    /// array is observable rather than masked by all-zero bytes.
    fn depth_stream_with_beams(date: u32, num_beams: u16) -> Vec<u8> {
        let mut body = vec![0u8; d::DEPTH_INFO];
        body[0..2].copy_from_slice(&num_beams.to_le_bytes());
        for i in 0..num_beams {
            let mut beam = vec![0u8; d::DEPTH_BEAM];
            beam[0..2].copy_from_slice(&(1000 + i).to_le_bytes());
            beam[2..4].copy_from_slice(&(2000 + i).to_le_bytes());
            body.extend(beam);
        }
        body.push(0x03); // ETX

        let bytes_in_datagram = (body.len() + 2 + HEADER_SIZE - 4) as u32;
        let mut header = Vec::with_capacity(HEADER_SIZE);
        header.extend(&bytes_in_datagram.to_le_bytes());
        header.push(0x02);
        header.push(1);
        header.extend(&2040u16.to_le_bytes());
        header.extend(&date.to_le_bytes());
        header.extend(&0u32.to_le_bytes());
        header.extend(&0u16.to_le_bytes());
        header.extend(&0u16.to_le_bytes());

        let mut sum: u16 = 0;
        for &b in header[5..].iter().chain(body[..body.len() - 1].iter()) {
            sum = sum.wrapping_add(b as u16);
        }

        let mut record = header;
        record.extend(&body);
        record.extend(&sum.to_le_bytes());
        record
    }

    #[test]
    fn decodes_minimal_depth_record_then_eof() {
        let stream = depth_stream(20_200_101, 0);
        let mut decoder = DecoderState::new(Cursor::new(stream), DecoderOptions::default());

        let record = decoder.next_record().unwrap().expect("one record");
        assert_eq!(record.datagram_type, DatagramType::Depth);
        match record.layout {
            RecordBody::Depth { beams, .. } => assert!(beams.is_empty()),
            other => panic!("expected Depth, got {:?}", other),
        }

        assert!(decoder.next_record().unwrap().is_none());
        assert!(decoder.next_record().unwrap().is_none(), "eof is sticky");
    }

    #[test]
    fn autodetects_swapped_stream() {
        const NUM_BEAMS: u16 = 2;
        let native = depth_stream_with_beams(20_200_101, NUM_BEAMS);

        let mut swapped = native.clone();
        swapped[0..4].reverse(); // bytes_in_datagram (u32)
        swapped[6..8].reverse(); // em_model_number (u16)
        swapped[8..12].reverse(); // date (u32)
        swapped[12..16].reverse(); // time_ms (u32)
        swapped[16..18].reverse(); // counter (u16)
        swapped[18..20].reverse(); // serial_number (u16)
        swapped[20..22].reverse(); // num_beams inside the body info block
        let beams_start = HEADER_SIZE + d::DEPTH_INFO;
        for i in 0..NUM_BEAMS as usize {
            let beam_start = beams_start + i * d::DEPTH_BEAM;
            swapped[beam_start..beam_start + 2].reverse();
            swapped[beam_start + 2..beam_start + 4].reverse();
        }
        let len = swapped.len();
        swapped[len - 2..].reverse(); // trailing checksum (u16)

        let mut native_decoder = DecoderState::new(Cursor::new(native), DecoderOptions::default());
        let native_record = native_decoder.next_record().unwrap().expect("one record");
        let native_beams = match native_record.layout {
            RecordBody::Depth { beams, .. } => beams,
            other => panic!("expected Depth, got {:?}", other),
        };
        let native_values: Vec<(u16, u16)> = (0..native_beams.len() / d::DEPTH_BEAM)
            .map(|i| {
                let start = native_beams.start + i * d::DEPTH_BEAM;
                (
                    d::u16_at(native_record.body, start),
                    d::u16_at(native_record.body, start + 2),
                )
            })
            .collect();
        assert_eq!(native_values, vec![(1000, 2000), (1001, 2001)]);

        let mut decoder = DecoderState::new(Cursor::new(swapped), DecoderOptions::default());
        let record = decoder.next_record().unwrap().expect("one record");
        assert_eq!(decoder.stream_order(), Some(StreamOrder::Swapped));
        let swapped_beams = match record.layout {
            RecordBody::Depth { beams, .. } => beams,
            other => panic!("expected Depth, got {:?}", other),
        };
        assert_eq!(swapped_beams.len(), NUM_BEAMS as usize * d::DEPTH_BEAM);
        let swapped_values: Vec<(u16, u16)> = (0..swapped_beams.len() / d::DEPTH_BEAM)
            .map(|i| {
                let start = swapped_beams.start + i * d::DEPTH_BEAM;
                (
                    d::u16_at(record.body, start),
                    d::u16_at(record.body, start + 2),
                )
            })
            .collect();
        assert_eq!(
            native_values, swapped_values,
            "swapped-stream beam fields must decode to the same values as the native stream"
        );
    }

    #[test]
    fn bad_checksum_is_discarded_then_next_record_decodes() {
        let mut bad = depth_stream(20_200_101, 0);
        let len = bad.len();
        bad[len - 1] ^= 0xFF; // corrupt the checksum so it's neither right nor zero
        bad[len - 2] ^= 0xFF;
        let good = depth_stream(20_200_101, 0);

        let mut stream = bad;
        stream.extend(good);

        let mut decoder = DecoderState::new(Cursor::new(stream), DecoderOptions::default());
        let record = decoder.next_record().unwrap().expect("the good record");
        assert_eq!(record.datagram_type, DatagramType::Depth);
        assert!(decoder.next_record().unwrap().is_none());
    }

    #[test]
    fn rra78_tx_sector_overflow_is_fatal_and_sticky() {
        let mut body = vec![0u8; d::RRA_78_INFO];
        body[0..2].copy_from_slice(&21u16.to_le_bytes());
        body.push(0x03);

        // total on-wire body = body.len() (info/beams/ETX) + 2 (checksum);
        // bytes_in_datagram = total_body + HEADER_SIZE - 4 (header.body_size()'s inverse).
        let bytes_in_datagram = (body.len() + 2 + HEADER_SIZE - 4) as u32;
        let mut header = Vec::with_capacity(HEADER_SIZE);
        header.extend(&bytes_in_datagram.to_le_bytes());
        header.push(0x02);
        header.push(7); // DatagramType::Rra78.raw()
        header.extend(&2040u16.to_le_bytes());
        header.extend(&20_200_101u32.to_le_bytes());
        header.extend(&0u32.to_le_bytes());
        header.extend(&0u16.to_le_bytes());
        header.extend(&0u16.to_le_bytes());

        let mut sum: u16 = 0;
        for &b in header[5..].iter().chain(body[..body.len() - 1].iter()) {
            sum = sum.wrapping_add(b as u16);
        }
        let mut stream = header;
        stream.extend(&body);
        stream.extend(&sum.to_le_bytes());

        let mut decoder = DecoderState::new(Cursor::new(stream), DecoderOptions::default());
        let err1 = decoder.next_record().unwrap_err();
        assert!(matches!(err1, DecoderError::BadData(_)));
        let err2 = decoder.next_record().unwrap_err();
        assert!(matches!(err2, DecoderError::BadData(_)), "error is sticky");
    }
}
