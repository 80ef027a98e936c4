//! DDP wire layout: byte offsets, bit fields and the size-code table.
//!
//! Both the reader (decode) and the writer (encode) go through these
//! definitions; neither side hard-codes a position or mask.

pub const DDP_PORT: u16 = 4048;

pub const FLAGS_OFFSET: usize = 0;
pub const SEQUENCE_OFFSET: usize = 1;
pub const DATA_TYPE_OFFSET: usize = 2;
pub const ID_OFFSET: usize = 3;
pub const DATA_OFFSET_RANGE: std::ops::Range<usize> = 4..8;
pub const DATA_LENGTH_RANGE: std::ops::Range<usize> = 8..10;
pub const TIMECODE_SECONDS_RANGE: std::ops::Range<usize> = 10..12;
pub const TIMECODE_FRACTION_RANGE: std::ops::Range<usize> = 12..14;

pub const HEADER_LEN: usize = 10;
pub const HEADER_LEN_WITH_TIMECODE: usize = 14;

pub const fn header_len(has_timecode: bool) -> usize {
    if has_timecode {
        HEADER_LEN_WITH_TIMECODE
    } else {
        HEADER_LEN
    }
}

/// A field packed into a single header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub shift: u8,
    pub width: u8,
}

impl BitField {
    pub const fn new(shift: u8, width: u8) -> Self {
        Self { shift, width }
    }

    /// Mask of the field once shifted down to bit 0.
    pub const fn max(self) -> u8 {
        ((1u16 << self.width) - 1) as u8
    }

    pub const fn mask(self) -> u8 {
        self.max() << self.shift
    }

    pub const fn extract(self, byte: u8) -> u8 {
        (byte & self.mask()) >> self.shift
    }

    pub const fn is_set(self, byte: u8) -> bool {
        self.extract(byte) != 0
    }

    /// Place `value` into the field. Callers check `value <= max()` first.
    pub const fn place(self, value: u8) -> u8 {
        (value << self.shift) & self.mask()
    }

    pub const fn place_flag(self, value: bool) -> u8 {
        if value { self.mask() } else { 0 }
    }
}

// Byte 0. Bit 5 is reserved.
pub const VERSION: BitField = BitField::new(6, 2);
pub const TIMECODE_FLAG: BitField = BitField::new(4, 1);
pub const STORAGE_FLAG: BitField = BitField::new(3, 1);
pub const REPLY_FLAG: BitField = BitField::new(2, 1);
pub const QUERY_FLAG: BitField = BitField::new(1, 1);
pub const PUSH_FLAG: BitField = BitField::new(0, 1);

// Byte 1. The high nibble is ignored on decode and written as zero.
pub const SEQUENCE_NUMBER: BitField = BitField::new(0, 4);

// Byte 2. Bit 6 is reserved.
pub const NON_STANDARD_FLAG: BitField = BitField::new(7, 1);
pub const TYPE_CODE: BitField = BitField::new(3, 3);
pub const SIZE_CODE: BitField = BitField::new(0, 3);

/// Bits per pixel indexed by size code; codes past the end are invalid.
pub const BITS_PER_PIXEL_BY_SIZE_CODE: [u8; 7] = [0, 1, 4, 8, 16, 24, 32];

pub fn bits_per_pixel_for_size_code(code: u8) -> Option<u8> {
    BITS_PER_PIXEL_BY_SIZE_CODE.get(code as usize).copied()
}

pub fn size_code_for_bits_per_pixel(bits_per_pixel: u8) -> Option<u8> {
    BITS_PER_PIXEL_BY_SIZE_CODE
        .iter()
        .position(|&bpp| bpp == bits_per_pixel)
        .map(|code| code as u8)
}
