use super::error::UdpError;
use super::layout;

pub struct UdpReader<'a> {
    bytes: &'a [u8],
}

impl<'a> UdpReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Datagram body after the 8-byte UDP header.
    pub fn body(&self) -> Result<&'a [u8], UdpError> {
        self.bytes
            .get(layout::UDP_HEADER_LEN..)
            .ok_or(UdpError::TooShort {
                needed: layout::UDP_HEADER_LEN,
                actual: self.bytes.len(),
            })
    }
}
