//! A [sans-I/O](https://sans-io.readthedocs.io/how-to-sans-io.html)
//! streaming decoder for the Kongsberg-style EM multibeam-sonar binary
//! datagram format ("EMX"): a length-prefixed, tagged, checksum-framed
//! record stream produced by shipboard sonar processing units.
//!
//! The decoder is built from independently testable stages:
//!
//! - [`endian`]: resolves the stream's byte order once, from the first
//!   record's header.
//! - [`header`]: the fixed 20-byte record header and its structural
//!   validator.
//! - [`checksum`]: the 16-bit additive checksum verifier.
//! - [`variant`]: the datagram-type tag and its swap-exempt variants.
//! - [`layout`]: carves a record body into its fixed descriptor and
//!   variable-length arrays.
//! - [`swap`]: in-place byte-swap correction of exactly the fields
//!   [`layout`] identified.
//! - [`decoder`]: the state machine tying the above into one
//!   `next_record` call per record, including the skip-water-column and
//!   ignore-checksum policy knobs and the corrupt-record recovery loop.
//! - [`iter`]: iterator adapters over a decoder and over a record's nested
//!   variable-length sub-records.
//!
//! Typical usage:
//!
//! ```no_run
//! use emx::{DecoderOptions, DecoderState};
//! use std::fs::File;
//!
//! let file = File::open("example.all").unwrap();
//! let mut decoder = DecoderState::new(file, DecoderOptions::default());
//! let mut records = decoder.records();
//! while let Some(record) = records.next() {
//!     let record = record.unwrap();
//!     println!("{:?}", record.datagram_type);
//! }
//! ```

pub mod checksum;
pub mod decoder;
pub mod descriptors;
pub mod endian;
pub mod error;
pub mod header;
pub mod iter;
pub mod layout;
pub mod model;
pub mod source;
pub mod swap;
pub mod variant;

pub use checksum::ChecksumOutcome;
pub use decoder::{DecoderOptions, DecoderState, Record};
pub use endian::StreamOrder;
pub use error::DecoderError;
pub use header::Header;
pub use iter::{AttitudeNetworkEntries, HisasSidescanChannels, Records, WaterColumnBeams};
pub use layout::{ExtraParamsContent, RecordBody, Span};
pub use model::{em3000d_sample_rate, is_known_model, Head};
pub use source::ByteSource;
pub use variant::DatagramType;
