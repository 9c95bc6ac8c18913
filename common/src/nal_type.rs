use std::fmt;

/// Classification of a NAL unit, pulled from the `nal_unit_type` column of Table 7-1.
///
/// Only the types a segmenter acts on are named; everything else collapses into `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NalType {
    Slice,
    Dpa,
    Dpb,
    Dpc,
    IdrSlice,
    Sei,
    Sps,
    Pps,
    Aud,
    EndSequence,
    EndStream,
    FillerData,
    SpsExt,
    AuxiliarySlice,
    #[default]
    Unknown,
}

/// How a decoder input queue should treat a unit of a given type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferFlag {
    /// Codec specific data (parameter sets).
    Config,
    /// Random access point. SEI usually travels in front of the IDR slice it describes.
    KeyFrame,
    Frame,
}

impl NalType {
    pub fn from_nal_unit_type(nal_unit_type: u8) -> Self {
        match nal_unit_type & 0x1F {
            1 => NalType::Slice,
            2 => NalType::Dpa,
            3 => NalType::Dpb,
            4 => NalType::Dpc,
            5 => NalType::IdrSlice,
            6 => NalType::Sei,
            7 => NalType::Sps,
            8 => NalType::Pps,
            9 => NalType::Aud,
            10 => NalType::EndSequence,
            11 => NalType::EndStream,
            12 => NalType::FillerData,
            13 => NalType::SpsExt,
            19 => NalType::AuxiliarySlice,
            _ => NalType::Unknown,
        }
    }

    /// Parameter sets carry no timing.
    pub fn is_parameter_set(&self) -> bool {
        matches!(self, NalType::Sps | NalType::Pps)
    }

    pub fn buffer_flag(&self) -> BufferFlag {
        match self {
            NalType::Sps | NalType::Pps => BufferFlag::Config,
            NalType::Sei | NalType::IdrSlice => BufferFlag::KeyFrame,
            _ => BufferFlag::Frame,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NalType::Slice => "SLICE",
            NalType::Dpa => "DPA",
            NalType::Dpb => "DPB",
            NalType::Dpc => "DPC",
            NalType::IdrSlice => "IDR_SLICE",
            NalType::Sei => "SEI",
            NalType::Sps => "SPS",
            NalType::Pps => "PPS",
            NalType::Aud => "AUD",
            NalType::EndSequence => "END_SEQUENCE",
            NalType::EndStream => "END_STREAM",
            NalType::FillerData => "FILLER_DATA",
            NalType::SpsExt => "SPS_EXT",
            NalType::AuxiliarySlice => "AUXILIARY_SLICE",
            NalType::Unknown => "UNKNOWN",
        }
    }
}

impl From<u8> for NalType {
    fn from(header_byte: u8) -> Self {
        NalType::from_nal_unit_type(header_byte)
    }
}

impl fmt::Display for NalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BufferFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferFlag::Config => f.write_str("config"),
            BufferFlag::KeyFrame => f.write_str("keyframe"),
            BufferFlag::Frame => f.write_str("frame"),
        }
    }
}
