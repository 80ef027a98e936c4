use super::error::DdpError;
use super::layout;
use super::packet::{DataType, Flags, Header, Packet, Timecode};
use super::reader::DdpReader;

/// Decode a DDP packet from raw datagram bytes.
///
/// The payload is everything after the header; the declared data length is
/// kept as metadata and never compared with it.
///
/// # Errors
/// - [`DdpError::TooShort`] below 10 bytes, or below 14 bytes when the
///   timecode flag is set.
/// - [`DdpError::UnknownSizeCode`] when the size code is 7.
pub fn decode(bytes: &[u8]) -> Result<Packet, DdpError> {
    let reader = DdpReader::new(bytes);
    reader.require_len(layout::HEADER_LEN)?;

    let flags = read_flags(&reader)?;
    let sequence_number = reader.read_field(layout::SEQUENCE_OFFSET, layout::SEQUENCE_NUMBER)?;
    let data_type = DataType {
        standard: !reader.read_flag(layout::DATA_TYPE_OFFSET, layout::NON_STANDARD_FLAG)?,
        type_code: reader.read_field(layout::DATA_TYPE_OFFSET, layout::TYPE_CODE)?,
        bits_per_pixel: reader.read_bits_per_pixel()?,
    };
    let source_or_destination_id = reader.read_u8(layout::ID_OFFSET)?;
    let data_offset = reader.read_u32_be(layout::DATA_OFFSET_RANGE)?;
    let data_length = reader.read_u16_be(layout::DATA_LENGTH_RANGE)?;

    let timecode = if flags.timecode {
        reader.require_len(layout::HEADER_LEN_WITH_TIMECODE)?;
        Some(Timecode {
            seconds: reader.read_u16_be(layout::TIMECODE_SECONDS_RANGE)?,
            fractional_seconds: reader.read_u16_be(layout::TIMECODE_FRACTION_RANGE)?,
        })
    } else {
        None
    };

    let payload = reader.read_tail(layout::header_len(flags.timecode))?;

    Ok(Packet {
        header: Header {
            flags,
            sequence_number,
            data_type,
            source_or_destination_id,
            data_offset,
            data_length,
            timecode,
        },
        payload: payload.to_vec(),
    })
}

fn read_flags(reader: &DdpReader<'_>) -> Result<Flags, DdpError> {
    let offset = layout::FLAGS_OFFSET;
    Ok(Flags {
        version: reader.read_field(offset, layout::VERSION)?,
        timecode: reader.read_flag(offset, layout::TIMECODE_FLAG)?,
        storage: reader.read_flag(offset, layout::STORAGE_FLAG)?,
        reply: reader.read_flag(offset, layout::REPLY_FLAG)?,
        query: reader.read_flag(offset, layout::QUERY_FLAG)?,
        push: reader.read_flag(offset, layout::PUSH_FLAG)?,
    })
}

#[cfg(test)]
mod tests {
    use super::decode;
    use crate::protocols::ddp::error::DdpError;
    use crate::protocols::ddp::packet::{DataType, Flags, Header, Packet, Timecode};

    const SIMPLE: [u8; 10] = [0x40, 0x0f, 0x92, 0x01, 0x45, 0x67, 0x89, 0x10, 0x10, 0x11];
    const WITH_TIMECODE: [u8; 14] = [
        0x50, 0x0f, 0x92, 0x01, 0x45, 0x67, 0x89, 0x10, 0x10, 0x11, 0x10, 0x11, 0x11, 0x10,
    ];

    fn simple_header() -> Header {
        Header {
            flags: Flags {
                version: 1,
                ..Flags::default()
            },
            sequence_number: 15,
            data_type: DataType {
                standard: false,
                type_code: 2,
                bits_per_pixel: 4,
            },
            source_or_destination_id: 1,
            data_offset: 1_164_413_200,
            data_length: 4113,
            timecode: None,
        }
    }

    #[test]
    fn decode_simple_message() {
        let packet = decode(&SIMPLE).unwrap();
        assert_eq!(packet, Packet::new(simple_header(), Vec::new()));
    }

    #[test]
    fn decode_message_with_timecode() {
        let packet = decode(&WITH_TIMECODE).unwrap();
        let mut header = simple_header();
        header.flags.timecode = true;
        header.timecode = Some(Timecode {
            seconds: 4113,
            fractional_seconds: 4368,
        });
        assert_eq!(packet, Packet::new(header, Vec::new()));
    }

    #[test]
    fn decode_keeps_trailing_payload() {
        let mut bytes = SIMPLE.to_vec();
        bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        let packet = decode(&bytes).unwrap();
        assert_eq!(packet.payload, vec![0xde, 0xad, 0xbe, 0xef]);
        // Declared length stays as-is even though it disagrees.
        assert_eq!(packet.header.data_length, 4113);
    }

    #[test]
    fn decode_rejects_short_buffers() {
        for len in 0..10 {
            let err = decode(&SIMPLE[..len]).unwrap_err();
            assert_eq!(
                err,
                DdpError::TooShort {
                    needed: 10,
                    actual: len
                }
            );
        }
    }

    #[test]
    fn decode_requires_timecode_bytes() {
        for len in 10..14 {
            let err = decode(&WITH_TIMECODE[..len]).unwrap_err();
            assert_eq!(
                err,
                DdpError::TooShort {
                    needed: 14,
                    actual: len
                }
            );
        }
    }

    #[test]
    fn decode_size_codes() {
        let expected = [0u8, 1, 4, 8, 16, 24, 32];
        for (code, bpp) in expected.iter().enumerate() {
            let mut bytes = SIMPLE;
            bytes[2] = 0x90 | code as u8;
            let packet = decode(&bytes).unwrap();
            assert_eq!(packet.header.data_type.bits_per_pixel, *bpp);
        }
        let mut bytes = SIMPLE;
        bytes[2] = 0x97;
        assert_eq!(
            decode(&bytes).unwrap_err(),
            DdpError::UnknownSizeCode { code: 7 }
        );
    }

    #[test]
    fn decode_ignores_reserved_bits() {
        let mut bytes = SIMPLE;
        bytes[0] |= 0x20;
        bytes[1] |= 0xf0;
        bytes[2] |= 0x40;
        assert_eq!(decode(&bytes).unwrap(), decode(&SIMPLE).unwrap());
    }

    #[test]
    fn decode_standard_flag_is_inverted_bit() {
        let mut bytes = SIMPLE;
        bytes[2] &= 0x7f;
        let packet = decode(&bytes).unwrap();
        assert!(packet.header.data_type.standard);
    }

    #[test]
    fn decode_single_flag_bits() {
        let cases: [(u8, fn(&Flags) -> bool); 4] = [
            (0x08, |f| f.storage),
            (0x04, |f| f.reply),
            (0x02, |f| f.query),
            (0x01, |f| f.push),
        ];
        let base = decode(&SIMPLE).unwrap().header.flags;
        for (bit, get) in cases {
            let mut bytes = SIMPLE;
            bytes[0] |= bit;
            let flags = decode(&bytes).unwrap().header.flags;
            assert!(get(&flags));
            let set_count = [flags.storage, flags.reply, flags.query, flags.push]
                .iter()
                .filter(|v| **v)
                .count();
            assert_eq!(set_count, 1);
            assert_eq!(flags.version, base.version);
            assert!(!flags.timecode);
        }
    }
}
