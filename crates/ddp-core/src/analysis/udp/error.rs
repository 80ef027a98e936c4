use thiserror::Error;

/// Errors returned while slicing a captured frame down to UDP.
#[derive(Debug, Error)]
pub enum UdpError {
    #[error("frame slice error: {0}")]
    Slice(String),
    #[error("missing network layer in frame")]
    MissingNetworkLayer,
    #[error("missing IP payload in frame")]
    MissingIpPayload,
    #[error("datagram too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
}
