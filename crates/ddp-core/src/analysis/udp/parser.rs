use std::net::{IpAddr, SocketAddr};

use etherparse::{NetSlice, SlicedPacket, TransportSlice};
use pcap_parser::Linktype;

use super::error::UdpError;
use super::reader::UdpReader;

/// UDP datagram lifted out of a captured frame.
pub struct UdpDatagram<'a> {
    pub src: SocketAddr,
    pub dst: SocketAddr,
    pub body: &'a [u8],
}

impl UdpDatagram<'_> {
    pub fn involves_port(&self, port: u16) -> bool {
        self.src.port() == port || self.dst.port() == port
    }
}

/// Slice a link-layer frame down to its UDP datagram.
///
/// Returns `Ok(None)` for unsupported link types and non-UDP traffic.
pub fn parse_udp_datagram(
    linktype: Linktype,
    data: &[u8],
) -> Result<Option<UdpDatagram<'_>>, UdpError> {
    let sliced = match linktype {
        Linktype::ETHERNET => {
            SlicedPacket::from_ethernet(data).map_err(|e| UdpError::Slice(e.to_string()))?
        }
        Linktype::RAW | Linktype::IPV4 | Linktype::IPV6 => {
            SlicedPacket::from_ip(data).map_err(|e| UdpError::Slice(e.to_string()))?
        }
        _ => return Ok(None),
    };

    let net = sliced.net.ok_or(UdpError::MissingNetworkLayer)?;
    let udp = match sliced.transport {
        Some(TransportSlice::Udp(udp)) => udp,
        _ => return Ok(None),
    };

    let (src_ip, dst_ip) = match net {
        NetSlice::Ipv4(ref ipv4) => (
            IpAddr::V4(ipv4.header().source_addr()),
            IpAddr::V4(ipv4.header().destination_addr()),
        ),
        NetSlice::Ipv6(ref ipv6) => (
            IpAddr::V6(ipv6.header().source_addr()),
            IpAddr::V6(ipv6.header().destination_addr()),
        ),
    };

    let ip_payload = net.ip_payload_ref().ok_or(UdpError::MissingIpPayload)?;
    let body = UdpReader::new(ip_payload.payload).body()?;

    Ok(Some(UdpDatagram {
        src: SocketAddr::new(src_ip, udp.source_port()),
        dst: SocketAddr::new(dst_ip, udp.destination_port()),
        body,
    }))
}

#[cfg(test)]
mod tests {
    use super::parse_udp_datagram;
    use crate::analysis::udp::error::UdpError;
    use etherparse::PacketBuilder;
    use pcap_parser::Linktype;

    #[test]
    fn parse_udp_ok() {
        let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4([192, 168, 0, 1], [192, 168, 0, 2], 64)
            .udp(50000, 4048);
        let body = [0x41, 0x01, 0x0b, 0x01];
        let mut frame = Vec::<u8>::with_capacity(builder.size(body.len()));
        builder.write(&mut frame, &body).unwrap();

        let datagram = parse_udp_datagram(Linktype::ETHERNET, &frame)
            .unwrap()
            .unwrap();
        assert_eq!(datagram.src.to_string(), "192.168.0.1:50000");
        assert_eq!(datagram.dst.port(), 4048);
        assert!(datagram.involves_port(4048));
        assert!(!datagram.involves_port(6454));
        assert_eq!(datagram.body, body);
    }

    #[test]
    fn parse_raw_ip_udp() {
        let builder = PacketBuilder::ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64).udp(4048, 4048);
        let body = [1u8, 2, 3];
        let mut frame = Vec::<u8>::with_capacity(builder.size(body.len()));
        builder.write(&mut frame, &body).unwrap();

        let datagram = parse_udp_datagram(Linktype::RAW, &frame).unwrap().unwrap();
        assert_eq!(datagram.body, body);
    }

    #[test]
    fn parse_non_udp() {
        let builder = PacketBuilder::ethernet2([1, 1, 1, 1, 1, 1], [2, 2, 2, 2, 2, 2])
            .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
            .tcp(1000, 4048, 0, 0);
        let body = [0u8; 4];
        let mut frame = Vec::<u8>::with_capacity(builder.size(body.len()));
        builder.write(&mut frame, &body).unwrap();

        assert!(parse_udp_datagram(Linktype::ETHERNET, &frame).unwrap().is_none());
    }

    #[test]
    fn parse_unsupported_linktype() {
        assert!(parse_udp_datagram(Linktype::NULL, &[0u8; 32]).unwrap().is_none());
    }

    #[test]
    fn parse_slice_error() {
        let result = parse_udp_datagram(Linktype::ETHERNET, &[]);
        assert!(matches!(result, Err(UdpError::Slice(_))));
    }
}
