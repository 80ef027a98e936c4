use super::error::DdpError;
use super::layout::{self, BitField};

pub struct DdpReader<'a> {
    payload: &'a [u8],
}

impl<'a> DdpReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), DdpError> {
        if self.payload.len() < needed {
            return Err(DdpError::TooShort {
                needed,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, DdpError> {
        self.payload
            .get(offset)
            .copied()
            .ok_or(DdpError::TooShort {
                needed: offset + 1,
                actual: self.payload.len(),
            })
    }

    pub fn read_field(&self, offset: usize, field: BitField) -> Result<u8, DdpError> {
        Ok(field.extract(self.read_u8(offset)?))
    }

    pub fn read_flag(&self, offset: usize, field: BitField) -> Result<bool, DdpError> {
        Ok(field.is_set(self.read_u8(offset)?))
    }

    pub fn read_u16_be(&self, range: std::ops::Range<usize>) -> Result<u16, DdpError> {
        let bytes = self.read_slice(range)?;
        let bytes: [u8; 2] = bytes.try_into().map_err(|_| DdpError::TooShort {
            needed: 2,
            actual: bytes.len(),
        })?;
        Ok(u16::from_be_bytes(bytes))
    }

    pub fn read_u32_be(&self, range: std::ops::Range<usize>) -> Result<u32, DdpError> {
        let bytes = self.read_slice(range)?;
        let bytes: [u8; 4] = bytes.try_into().map_err(|_| DdpError::TooShort {
            needed: 4,
            actual: bytes.len(),
        })?;
        Ok(u32::from_be_bytes(bytes))
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], DdpError> {
        self.payload.get(range.clone()).ok_or(DdpError::TooShort {
            needed: range.end,
            actual: self.payload.len(),
        })
    }

    /// Everything from `start` to the end of the buffer (possibly empty).
    pub fn read_tail(&self, start: usize) -> Result<&'a [u8], DdpError> {
        self.payload.get(start..).ok_or(DdpError::TooShort {
            needed: start,
            actual: self.payload.len(),
        })
    }

    /// Map the raw size code to bits per pixel.
    pub fn read_bits_per_pixel(&self) -> Result<u8, DdpError> {
        let code = self.read_field(layout::DATA_TYPE_OFFSET, layout::SIZE_CODE)?;
        layout::bits_per_pixel_for_size_code(code).ok_or(DdpError::UnknownSizeCode { code })
    }
}
