use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::protocols::ddp;
use crate::source::{CapturedFrame, FrameSource, PcapFileSource, SourceError};
use crate::{CaptureSummary, DEFAULT_GENERATED_AT, Report, make_stub_report};

mod errors;
mod streams;
mod udp;

use errors::ErrorStats;
use streams::{StreamKey, StreamStats, add_stream_packet, build_stream_summaries};
use udp::parse_udp_datagram;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Analyse a `.pcap`/`.pcapng` capture and summarise its DDP traffic.
///
/// UDP datagrams are treated as DDP when either endpoint uses `port`
/// (normally [`crate::DDP_PORT`]).
///
/// # Errors
/// Fails only when the capture itself cannot be read. Malformed DDP
/// datagrams are counted in [`Report::errors`].
pub fn analyze_pcap_file(path: &Path, port: u16) -> Result<Report, AnalysisError> {
    let source = PcapFileSource::open(path)?;
    analyze_source(path, source, port)
}

/// Analyse frames from any source; `path` is only used for report metadata.
pub fn analyze_source<S: FrameSource>(
    path: &Path,
    mut source: S,
    port: u16,
) -> Result<Report, AnalysisError> {
    let mut frames_total = 0u64;
    let mut ddp_datagrams = 0u64;
    let mut first_ts = None;
    let mut last_ts = None;
    let mut stream_stats: HashMap<StreamKey, StreamStats> = HashMap::new();
    let mut error_stats = ErrorStats::default();

    while let Some(CapturedFrame { ts, linktype, data }) = source.next_frame()? {
        frames_total += 1;
        update_ts_bounds(&mut first_ts, &mut last_ts, ts);

        let datagram = match parse_udp_datagram(linktype, &data) {
            Ok(Some(datagram)) if datagram.involves_port(port) => datagram,
            _ => continue,
        };
        ddp_datagrams += 1;
        match ddp::decode(datagram.body) {
            Ok(packet) => add_stream_packet(&mut stream_stats, &datagram, &packet, ts),
            Err(err) => error_stats.record(&err, datagram.src, ts),
        }
    }

    let input_bytes = path.metadata().map(|meta| meta.len()).unwrap_or(0);
    let mut report = make_stub_report(&path.display().to_string(), input_bytes);
    report.capture_summary = Some(CaptureSummary {
        packets_total: frames_total,
        ddp_datagrams,
        time_start: ts_to_rfc3339(first_ts),
        time_end: ts_to_rfc3339(last_ts),
    });
    report.generated_at = report
        .capture_summary
        .as_ref()
        .and_then(|summary| summary.time_end.clone().or(summary.time_start.clone()))
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());

    report.streams = build_stream_summaries(stream_stats);
    report.errors = error_stats.into_summaries();
    Ok(report)
}

pub(crate) fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: Option<f64>) {
    let Some(ts) = ts else {
        return;
    };
    if first.is_none_or(|existing| ts < existing) {
        *first = Some(ts);
    }
    if last.is_none_or(|existing| ts > existing) {
        *last = Some(ts);
    }
}

pub(crate) fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
