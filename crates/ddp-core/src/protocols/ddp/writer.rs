use super::error::DdpError;
use super::layout::{self, BitField};
use super::packet::{Flags, Header, Packet};

/// Encode a DDP packet into its exact wire bytes.
///
/// The payload is appended verbatim; the declared data length is written as
/// given and not compared with the payload.
///
/// # Errors
/// - [`DdpError::UnsupportedBitsPerPixel`] when bits per pixel is not one of
///   0, 1, 4, 8, 16, 24 or 32.
/// - [`DdpError::MissingTimecode`] when the timecode flag is set without a
///   timecode value.
/// - [`DdpError::FieldOutOfRange`] when version, type code or sequence number
///   do not fit their bit field.
pub fn encode(packet: &Packet) -> Result<Vec<u8>, DdpError> {
    let header = &packet.header;
    let flags_byte = flags_byte(&header.flags)?;
    let sequence_byte = fit("sequence number", layout::SEQUENCE_NUMBER, header.sequence_number)?;
    let data_type_byte = data_type_byte(header)?;

    let timecode = if header.flags.timecode {
        Some(header.timecode.ok_or(DdpError::MissingTimecode)?)
    } else {
        None
    };

    let mut bytes = Vec::with_capacity(packet.wire_len());
    bytes.push(flags_byte);
    bytes.push(sequence_byte);
    bytes.push(data_type_byte);
    bytes.push(header.source_or_destination_id);
    bytes.extend_from_slice(&header.data_offset.to_be_bytes());
    bytes.extend_from_slice(&header.data_length.to_be_bytes());
    if let Some(timecode) = timecode {
        bytes.extend_from_slice(&timecode.seconds.to_be_bytes());
        bytes.extend_from_slice(&timecode.fractional_seconds.to_be_bytes());
    }
    bytes.extend_from_slice(&packet.payload);
    Ok(bytes)
}

fn flags_byte(flags: &Flags) -> Result<u8, DdpError> {
    Ok(fit("version", layout::VERSION, flags.version)?
        | layout::TIMECODE_FLAG.place_flag(flags.timecode)
        | layout::STORAGE_FLAG.place_flag(flags.storage)
        | layout::REPLY_FLAG.place_flag(flags.reply)
        | layout::QUERY_FLAG.place_flag(flags.query)
        | layout::PUSH_FLAG.place_flag(flags.push))
}

fn data_type_byte(header: &Header) -> Result<u8, DdpError> {
    let data_type = &header.data_type;
    let size_code = layout::size_code_for_bits_per_pixel(data_type.bits_per_pixel).ok_or(
        DdpError::UnsupportedBitsPerPixel {
            value: data_type.bits_per_pixel,
        },
    )?;
    Ok(layout::NON_STANDARD_FLAG.place_flag(!data_type.standard)
        | fit("type code", layout::TYPE_CODE, data_type.type_code)?
        | layout::SIZE_CODE.place(size_code))
}

fn fit(field: &'static str, bits: BitField, value: u8) -> Result<u8, DdpError> {
    if value > bits.max() {
        return Err(DdpError::FieldOutOfRange {
            field,
            value,
            max: bits.max(),
        });
    }
    Ok(bits.place(value))
}
