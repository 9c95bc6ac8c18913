use crate::nal_type::NalType;

/// The one-byte header that follows every start code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalUnitHeader {
    /// `forbidden_zero_bit` shall be equal to 0.
    pub forbidden_zero_bit: bool,

    /// `nal_ref_idc` not equal to 0 marks parameter sets and slices of reference pictures.
    /// It shall be equal to 0 for NAL units having `nal_unit_type` equal to 6, 9, 10, 11, or 12.
    pub nal_ref_idc: u8,

    /// `nal_unit_type` specifies the type of `RBSP` data structure contained in the NAL unit.
    pub nal_unit_type: u8,
}

impl NalUnitHeader {
    pub fn parse(byte: u8) -> Self {
        Self {
            forbidden_zero_bit: byte >> 7 == 1,
            nal_ref_idc: (byte >> 5) & 0b11,
            nal_unit_type: byte & 0b0001_1111,
        }
    }

    pub fn nal_type(&self) -> NalType {
        NalType::from_nal_unit_type(self.nal_unit_type)
    }
}

/// Per-unit metadata threaded through the policy chain.
///
/// Every stage receives it by `&mut` and may overwrite any field; the parser emits whatever the
/// chain leaves in `pts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NalHeader {
    pub nal_type: NalType,

    /// Byte count, start code included.
    pub size: usize,

    /// Presentation timestamp in microseconds.
    pub pts: i64,
}

impl NalHeader {
    pub fn new(nal_type: NalType, size: usize) -> Self {
        Self {
            nal_type,
            size,
            pts: 0,
        }
    }
}

/// A segmented unit as handed to a decoder input queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NalUnit {
    pub header: NalHeader,

    /// Raw bytes, leading start code included.
    pub data: Vec<u8>,
}

impl NalUnit {
    pub fn nal_type(&self) -> NalType {
        self.header.nal_type
    }

    pub fn size(&self) -> usize {
        self.header.size
    }

    pub fn pts(&self) -> i64 {
        self.header.pts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_byte() {
        let sps = NalUnitHeader::parse(0x67);
        assert!(!sps.forbidden_zero_bit);
        assert_eq!(sps.nal_ref_idc, 3);
        assert_eq!(sps.nal_unit_type, 7);
        assert_eq!(sps.nal_type(), NalType::Sps);

        let sei = NalUnitHeader::parse(0x06);
        assert_eq!(sei.nal_ref_idc, 0);
        assert_eq!(sei.nal_type(), NalType::Sei);

        let corrupt = NalUnitHeader::parse(0xE5);
        assert!(corrupt.forbidden_zero_bit);
        assert_eq!(corrupt.nal_type(), NalType::IdrSlice);
    }
}
