use thiserror::Error;

/// Errors returned by DDP decoding and encoding.
///
/// # Examples
/// ```
/// use ddp_core::{DdpError, decode};
///
/// let err = decode(&[0x40, 0x00]).unwrap_err();
/// assert!(matches!(err, DdpError::TooShort { needed: 10, actual: 2 }));
/// assert_eq!(err.id(), "DDP-TOO-SHORT");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DdpError {
    #[error("packet too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("unknown size code: {code}")]
    UnknownSizeCode { code: u8 },
    #[error("unsupported bits per pixel: {value}")]
    UnsupportedBitsPerPixel { value: u8 },
    #[error("timecode flag set but no timecode value supplied")]
    MissingTimecode,
    #[error("{field} out of range: {value} (max {max})")]
    FieldOutOfRange {
        field: &'static str,
        value: u8,
        max: u8,
    },
}

impl DdpError {
    /// Stable identifier used when aggregating errors in reports.
    pub fn id(&self) -> &'static str {
        match self {
            DdpError::TooShort { .. } => "DDP-TOO-SHORT",
            DdpError::UnknownSizeCode { .. } => "DDP-UNKNOWN-SIZE-CODE",
            DdpError::UnsupportedBitsPerPixel { .. } => "DDP-UNSUPPORTED-BPP",
            DdpError::MissingTimecode => "DDP-MISSING-TIMECODE",
            DdpError::FieldOutOfRange { .. } => "DDP-FIELD-OUT-OF-RANGE",
        }
    }
}
