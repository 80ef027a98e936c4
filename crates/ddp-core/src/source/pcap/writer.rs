use std::io::Write;
use std::net::SocketAddr;

use etherparse::PacketBuilder;

use crate::source::SourceError;

use super::error::PcapSourceError;
use super::layout;

/// Minimal PCAPNG writer: one section, one raw-IP interface.
///
/// Frames are written as enhanced packet blocks with microsecond
/// timestamps, so captures round-trip through [`super::PcapFileSource`].
pub struct PcapNgWriter<W: Write> {
    out: W,
}

impl<W: Write> PcapNgWriter<W> {
    /// Write the section header and interface description.
    pub fn new(mut out: W) -> Result<Self, SourceError> {
        out.write_all(&block(layout::BLOCK_SECTION_HEADER, &section_header_body()))?;
        out.write_all(&block(
            layout::BLOCK_INTERFACE_DESCRIPTION,
            &interface_desc_body(),
        ))?;
        Ok(Self { out })
    }

    pub fn write_frame(&mut self, ts: f64, data: &[u8]) -> Result<(), SourceError> {
        let body = enhanced_packet_body(ts, data)?;
        self.out
            .write_all(&block(layout::BLOCK_ENHANCED_PACKET, &body))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SourceError> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Wrap a UDP body in an IP + UDP header (raw-IP link type).
///
/// # Errors
/// Fails when source and destination use different address families.
pub fn raw_udp_frame(
    src: SocketAddr,
    dst: SocketAddr,
    body: &[u8],
) -> Result<Vec<u8>, SourceError> {
    let builder = match (src, dst) {
        (SocketAddr::V4(src), SocketAddr::V4(dst)) => {
            PacketBuilder::ipv4(src.ip().octets(), dst.ip().octets(), layout::FRAME_TTL)
                .udp(src.port(), dst.port())
        }
        (SocketAddr::V6(src), SocketAddr::V6(dst)) => {
            PacketBuilder::ipv6(src.ip().octets(), dst.ip().octets(), layout::FRAME_TTL)
                .udp(src.port(), dst.port())
        }
        _ => {
            return Err(PcapSourceError::pcap(
                "udp frame build",
                format!("address family mismatch: {src} -> {dst}"),
            )
            .into());
        }
    };
    let mut frame = Vec::with_capacity(builder.size(body.len()));
    builder
        .write(&mut frame, body)
        .map_err(|e| PcapSourceError::pcap("udp frame build", e))?;
    Ok(frame)
}

fn block(block_type: u32, body: &[u8]) -> Vec<u8> {
    let total_len = (8 + body.len() + 4) as u32;
    let mut block = Vec::with_capacity(total_len as usize);
    block.extend_from_slice(&block_type.to_be_bytes());
    block.extend_from_slice(&total_len.to_be_bytes());
    block.extend_from_slice(body);
    block.extend_from_slice(&total_len.to_be_bytes());
    block
}

fn section_header_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&layout::BYTE_ORDER_MAGIC.to_be_bytes());
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    // Section length unknown.
    body.extend_from_slice(&(-1i64).to_be_bytes());
    body
}

fn interface_desc_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&layout::LINKTYPE_RAW.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&layout::SNAPLEN.to_be_bytes());
    body
}

fn enhanced_packet_body(ts: f64, data: &[u8]) -> Result<Vec<u8>, PcapSourceError> {
    let cap_len = u32::try_from(data.len())
        .map_err(|_| PcapSourceError::pcap("pcapng writer", "frame too large"))?;
    let ts_us = (ts.max(0.0) / layout::SECONDS_PER_MICRO).round() as u64;
    let ts_high = (ts_us >> 32) as u32;
    let ts_low = (ts_us & 0xFFFF_FFFF) as u32;

    let mut body = Vec::with_capacity(20 + data.len() + 3);
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&ts_high.to_be_bytes());
    body.extend_from_slice(&ts_low.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(data);
    let pad_len = (4 - (data.len() % 4)) % 4;
    body.resize(body.len() + pad_len, 0);
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::{PcapNgWriter, block, raw_udp_frame};

    #[test]
    fn blocks_are_length_framed() {
        let bytes = block(6, &[1, 2, 3, 4]);
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[4..8], &16u32.to_be_bytes());
        assert_eq!(&bytes[12..16], &16u32.to_be_bytes());
    }

    #[test]
    fn writer_starts_with_pcapng_magic() {
        let writer = PcapNgWriter::new(Vec::new()).unwrap();
        let bytes = writer.into_inner();
        assert_eq!(&bytes[..4], &[0x0a, 0x0d, 0x0d, 0x0a]);
    }

    #[test]
    fn frames_are_padded_to_four_bytes() {
        let mut writer = PcapNgWriter::new(Vec::new()).unwrap();
        let start = writer.out.len();
        writer.write_frame(1.0, &[0u8; 5]).unwrap();
        let written = writer.into_inner().len() - start;
        assert_eq!(written % 4, 0);
        assert_eq!(written, 8 + 20 + 8 + 4);
    }

    #[test]
    fn raw_udp_frame_rejects_mixed_families() {
        let src = "10.0.0.1:4048".parse().unwrap();
        let dst = "[::1]:4048".parse().unwrap();
        assert!(raw_udp_frame(src, dst, &[]).is_err());
    }

    #[test]
    fn raw_udp_frame_has_ip_and_udp_headers() {
        let src = "10.0.0.1:4048".parse().unwrap();
        let dst = "10.0.0.2:4048".parse().unwrap();
        let frame = raw_udp_frame(src, dst, &[1, 2, 3]).unwrap();
        assert_eq!(frame.len(), 20 + 8 + 3);
        assert_eq!(frame[0] >> 4, 4);
    }
}
