//! RGB views over packet payloads.
//!
//! Pixel data is the payload clipped to the declared data length, so a
//! truncated or padded datagram never reads past what was received.

use serde::Serialize;

use super::packet::Packet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Packet {
    /// Payload bytes covered by the declared data length.
    pub fn pixel_data(&self) -> &[u8] {
        let len = (self.header.data_length as usize).min(self.payload.len());
        &self.payload[..len]
    }

    /// Complete RGB triples in the pixel data; a trailing partial triple is
    /// skipped.
    pub fn rgb_pixels(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.pixel_data().chunks_exact(3).map(|chunk| Rgb {
            r: chunk[0],
            g: chunk[1],
            b: chunk[2],
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_data().len() / 3
    }
}
