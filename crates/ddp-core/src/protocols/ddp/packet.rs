use serde::{Deserialize, Serialize};

use crate::protocols::common::hex::serde_hex;

/// Flags carried in the first header byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    /// Protocol version (2 bits).
    pub version: u8,
    /// A timecode follows the fixed header.
    pub timecode: bool,
    pub storage: bool,
    pub reply: bool,
    pub query: bool,
    pub push: bool,
}

/// Payload data type descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataType {
    /// `false` when the vendor-defined bit is set.
    pub standard: bool,
    /// Type code (3 bits), opaque to the codec.
    pub type_code: u8,
    /// One of 0, 1, 4, 8, 16, 24 or 32.
    pub bits_per_pixel: u8,
}

/// Optional synchronization value carried after the fixed header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timecode {
    pub seconds: u16,
    pub fractional_seconds: u16,
}

/// Decoded DDP header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub flags: Flags,
    /// Sequence number (4 bits).
    pub sequence_number: u8,
    pub data_type: DataType,
    pub source_or_destination_id: u8,
    /// Byte offset of the payload within the logical frame.
    pub data_offset: u32,
    /// Declared payload length; not checked against the payload.
    pub data_length: u16,
    /// Present iff `flags.timecode` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timecode: Option<Timecode>,
}

/// A DDP packet: header plus the bytes following it.
///
/// # Examples
/// ```
/// use ddp_core::{Packet, decode, encode};
///
/// let bytes = [0x40, 0x0f, 0x92, 0x01, 0x45, 0x67, 0x89, 0x10, 0x10, 0x11];
/// let packet: Packet = decode(&bytes)?;
/// assert_eq!(packet.header.sequence_number, 15);
/// assert!(packet.payload.is_empty());
/// assert_eq!(encode(&packet)?, bytes);
/// # Ok::<(), ddp_core::DdpError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub header: Header,
    #[serde(with = "serde_hex", default)]
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(header: Header, payload: Vec<u8>) -> Self {
        Self { header, payload }
    }

    /// Header size on the wire for this packet's flags.
    pub fn header_len(&self) -> usize {
        super::layout::header_len(self.header.flags.timecode)
    }

    /// Total encoded size.
    pub fn wire_len(&self) -> usize {
        self.header_len() + self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{DataType, Flags, Header, Packet, Timecode};

    fn sample() -> Packet {
        Packet::new(
            Header {
                flags: Flags {
                    version: 1,
                    timecode: true,
                    push: true,
                    ..Flags::default()
                },
                sequence_number: 3,
                data_type: DataType {
                    standard: true,
                    type_code: 1,
                    bits_per_pixel: 8,
                },
                source_or_destination_id: 1,
                data_offset: 0,
                data_length: 3,
                timecode: Some(Timecode {
                    seconds: 0,
                    fractional_seconds: 0,
                }),
            },
            vec![0xff, 0x00, 0x10],
        )
    }

    #[test]
    fn json_payload_is_hex() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["payload"], "ff0010");
        assert_eq!(value["header"]["data_type"]["bits_per_pixel"], 8);
        assert_eq!(value["header"]["timecode"]["seconds"], 0);
    }

    #[test]
    fn json_omits_absent_timecode() {
        let mut packet = sample();
        packet.header.flags.timecode = false;
        packet.header.timecode = None;
        let value = serde_json::to_value(&packet).unwrap();
        assert!(value["header"].get("timecode").is_none());

        let back: Packet = serde_json::from_value(value).unwrap();
        assert_eq!(back, packet);
    }

    #[test]
    fn zero_timecode_is_not_absent() {
        let packet = sample();
        let json = serde_json::to_string(&packet).unwrap();
        let back: Packet = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.header.timecode,
            Some(Timecode {
                seconds: 0,
                fractional_seconds: 0
            })
        );
    }

    #[test]
    fn wire_len_accounts_for_timecode() {
        let mut packet = sample();
        assert_eq!(packet.wire_len(), 17);
        packet.header.flags.timecode = false;
        assert_eq!(packet.wire_len(), 13);
    }
}
