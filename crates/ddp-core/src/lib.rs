//! DDP core library: packet codec plus offline capture analysis.
//!
//! The heart of the crate is the Distributed Display Protocol codec in
//! `protocols::ddp`: [`decode`] turns a datagram into a [`Packet`] and
//! [`encode`] turns a packet back into the exact wire bytes. Both are pure
//! functions with no I/O or shared state, so they can be called from any
//! thread without locking.
//!
//! Around the codec, `source` reads PCAP/PCAPNG captures and `analysis`
//! slices frames down to UDP, decodes DDP datagrams (port 4048) and
//! aggregates them into a deterministic [`Report`].
//!
//! Invariants:
//! - Bits per pixel in a decoded packet is always one of 0, 1, 4, 8, 16, 24, 32.
//! - A decoded timecode is present iff the timecode flag is set.
//! - `decode(encode(p)) == p` for every packet `encode` accepts with a
//!   consistent timecode.
//!
//! Version française (résumé):
//! Cette crate fournit le codec DDP (décodage/encodage purs, sans état) et
//! une analyse hors ligne de captures : sources -> UDP -> décodage DDP ->
//! rapport déterministe.
//!
//! # Examples
//! ```
//! use ddp_core::{decode, encode};
//!
//! let bytes = [
//!     0x50, 0x0f, 0x92, 0x01, 0x45, 0x67, 0x89, 0x10, 0x10, 0x11, 0x10, 0x11, 0x11, 0x10,
//! ];
//! let packet = decode(&bytes)?;
//! let timecode = packet.header.timecode.expect("timecode flag set");
//! assert_eq!(timecode.seconds, 4113);
//! assert_eq!(encode(&packet)?, bytes);
//! # Ok::<(), ddp_core::DdpError>(())
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
pub mod protocols;
mod source;

pub use analysis::{AnalysisError, analyze_pcap_file, analyze_source};
pub use protocols::common::hex::{HexError, parse_hex, to_hex};
pub use protocols::ddp::layout::DDP_PORT;
pub use protocols::ddp::{
    DataType, DdpError, Flags, Header, Packet, Rgb, Timecode, decode, encode,
};
pub use source::{
    CapturedFrame, FrameSource, MemorySource, PcapFileSource, PcapNgWriter, SourceError,
    raw_udp_frame,
};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Capture analysis report with deterministic ordering.
///
/// # Examples
/// ```
/// use ddp_core::make_stub_report;
///
/// let report = make_stub_report("capture.pcapng", 123);
/// assert_eq!(report.report_version, ddp_core::REPORT_VERSION);
/// assert!(report.streams.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    pub tool: ToolInfo,
    /// RFC3339 timestamp; the last capture timestamp when known.
    pub generated_at: String,
    pub input: InputInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// Decoded DDP streams sorted by source, destination and id.
    pub streams: Vec<StreamSummary>,
    /// Decode failures grouped by error id, sorted by id.
    pub errors: Vec<ErrorSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Capture-wide counters (timestamps may be absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Every frame in the capture, DDP or not.
    pub packets_total: u64,
    /// UDP datagrams to or from the DDP port, including malformed ones.
    pub ddp_datagrams: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Per-stream counters for successfully decoded packets.
///
/// A stream is one (source endpoint, destination endpoint,
/// source/destination id) triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSummary {
    /// Source endpoint in `ip:port` form.
    pub src: String,
    /// Destination endpoint in `ip:port` form.
    pub dst: String,
    pub source_or_destination_id: u8,
    pub packets: u64,
    /// Sum of actual payload sizes (not declared lengths).
    pub payload_bytes: u64,
    pub push_packets: u64,
    pub timecode_packets: u64,
    pub query_packets: u64,
    pub reply_packets: u64,
    /// Distinct bits-per-pixel values seen, ascending.
    pub bits_per_pixel: Vec<u8>,
    /// Largest `data_offset + payload length` seen.
    pub max_extent: u64,
    /// Packets per second between this stream's first and last packet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pps: Option<f64>,
}

/// Decode failures sharing one error id.
///
/// # Examples
/// ```
/// use ddp_core::ErrorSummary;
///
/// let summary = ErrorSummary {
///     id: "DDP-TOO-SHORT".to_string(),
///     message: "packet too short: need 10 bytes, got 4".to_string(),
///     count: 1,
///     examples: vec!["source 10.0.0.1:4048 @ 1970-01-01T00:00:00Z".to_string()],
/// };
/// assert_eq!(summary.count, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorSummary {
    /// Stable error identifier (e.g., `DDP-UNKNOWN-SIZE-CODE`).
    pub id: String,
    /// Message of the first occurrence.
    pub message: String,
    pub count: u64,
    /// At most three contexts, formatted as `source ip:port @ ts`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Build a report with base fields filled and empty aggregates.
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "ddp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        capture_summary: None,
        streams: vec![],
        errors: vec![],
    }
}
