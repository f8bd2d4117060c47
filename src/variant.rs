//! The datagram type tag (spec.md §2, §5) and its 41 named variants.
//!
//! spec.md fixes only `UNKNOWN2 = 0x74`; it never assigns wire byte values
//! to the other 41 variants. Rather than guess at real Kongsberg codes and
//! risk stating them as fact, this module assigns its own sequential,
//! internally consistent byte tags (see `DESIGN.md`). Anything that does
//! not match a known tag decodes as `DatagramType::Unknown`.

/// The decoded `datagram_type` byte, naming one of the 41 known record
/// kinds, the `UNKNOWN2` directory-like variant, or an unrecognized tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatagramType {
    Depth,
    DepthNominal,
    Xyz,
    ExtraDetections,
    CentralBeams,
    Rra70,
    Rra78,
    Rra101,
    Rra102,
    Rra123,
    SeabedImage83,
    SeabedImage89,
    WaterColumn,
    QualityFactor,
    Attitude,
    AttitudeNetwork,
    Clock,
    Height,
    Heading,
    Position,
    SingleBeamDepth,
    Tide,
    Sssv,
    Svp,
    SvpEm3000,
    KmSspOutput,
    InstallParamsStart,
    InstallParamsStop,
    InstallParamsRemote,
    RemoteParamsInfo,
    RuntimeParams,
    ExtraParams,
    PuOutput,
    PuStatus,
    PuBistResult,
    TransducerTilt,
    SystemStatus,
    Stave,
    HisasStatus,
    NavigationOutput,
    SidescanStatus,
    Hisas1032Sidescan,
    /// The undocumented directory-like record exempt from timestamp and
    /// checksum validation (spec.md §4.3, §4.4).
    Unknown2,
    /// A `datagram_type` byte this crate does not recognize. The record
    /// is still framed and checksummed normally; only its body is opaque.
    Unknown(u8),
}

impl DatagramType {
    /// The wire byte this crate assigns to each known variant.
    pub fn raw(self) -> u8 {
        use DatagramType::*;
        match self {
            Depth => 1,
            DepthNominal => 2,
            Xyz => 3,
            ExtraDetections => 4,
            CentralBeams => 5,
            Rra70 => 6,
            Rra78 => 7,
            Rra101 => 8,
            Rra102 => 9,
            Rra123 => 10,
            SeabedImage83 => 11,
            SeabedImage89 => 12,
            WaterColumn => 13,
            QualityFactor => 14,
            Attitude => 15,
            AttitudeNetwork => 16,
            Clock => 17,
            Height => 18,
            Heading => 19,
            Position => 20,
            SingleBeamDepth => 21,
            Tide => 22,
            Sssv => 23,
            Svp => 24,
            SvpEm3000 => 25,
            KmSspOutput => 26,
            InstallParamsStart => 27,
            InstallParamsStop => 28,
            InstallParamsRemote => 29,
            RemoteParamsInfo => 30,
            RuntimeParams => 31,
            ExtraParams => 32,
            PuOutput => 33,
            PuStatus => 34,
            PuBistResult => 35,
            TransducerTilt => 36,
            SystemStatus => 37,
            Stave => 38,
            HisasStatus => 39,
            NavigationOutput => 40,
            SidescanStatus => 41,
            Hisas1032Sidescan => 42,
            Unknown2 => crate::header::UNKNOWN2_TYPE,
            Unknown(b) => b,
        }
    }

    /// Maps a raw wire byte to its `DatagramType`, falling back to
    /// `Unknown` for anything this crate doesn't assign.
    pub fn from_raw(b: u8) -> DatagramType {
        use DatagramType::*;
        match b {
            1 => Depth,
            2 => DepthNominal,
            3 => Xyz,
            4 => ExtraDetections,
            5 => CentralBeams,
            6 => Rra70,
            7 => Rra78,
            8 => Rra101,
            9 => Rra102,
            10 => Rra123,
            11 => SeabedImage83,
            12 => SeabedImage89,
            13 => WaterColumn,
            14 => QualityFactor,
            15 => Attitude,
            16 => AttitudeNetwork,
            17 => Clock,
            18 => Height,
            19 => Heading,
            20 => Position,
            21 => SingleBeamDepth,
            22 => Tide,
            23 => Sssv,
            24 => Svp,
            25 => SvpEm3000,
            26 => KmSspOutput,
            27 => InstallParamsStart,
            28 => InstallParamsStop,
            29 => InstallParamsRemote,
            30 => RemoteParamsInfo,
            31 => RuntimeParams,
            32 => ExtraParams,
            33 => PuOutput,
            34 => PuStatus,
            35 => PuBistResult,
            36 => TransducerTilt,
            37 => SystemStatus,
            38 => Stave,
            39 => HisasStatus,
            40 => NavigationOutput,
            41 => SidescanStatus,
            42 => Hisas1032Sidescan,
            b if b == crate::header::UNKNOWN2_TYPE => Unknown2,
            b => Unknown(b),
        }
    }

    /// `true` for the variants spec.md §4.6 excludes from byte-swapping
    /// (fixed network order, or already a bag of bytes).
    pub fn swap_exempt(self) -> bool {
        use DatagramType::*;
        matches!(
            self,
            HisasStatus | NavigationOutput | SidescanStatus | Hisas1032Sidescan | Rra123
                | KmSspOutput
        )
    }
}
