use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use ddp_core::{
    CapturedFrame, DDP_PORT, DataType, Flags, Header, MemorySource, Packet, PcapNgWriter,
    Timecode, analyze_pcap_file, analyze_source, encode, raw_udp_frame,
};
use pcap_parser::Linktype;
use tempfile::TempDir;

fn endpoint(text: &str) -> SocketAddr {
    text.parse().expect("socket addr")
}

fn rgb_packet(offset: u32, pixels: &[u8], push: bool) -> Vec<u8> {
    let packet = Packet::new(
        Header {
            flags: Flags {
                version: 1,
                push,
                ..Flags::default()
            },
            sequence_number: 1,
            data_type: DataType {
                standard: true,
                type_code: 1,
                bits_per_pixel: 8,
            },
            source_or_destination_id: 1,
            data_offset: offset,
            data_length: pixels.len() as u16,
            timecode: None,
        },
        pixels.to_vec(),
    );
    encode(&packet).expect("encode")
}

fn write_capture(path: &Path, datagrams: &[(&str, &str, Vec<u8>)]) {
    let mut writer = PcapNgWriter::new(File::create(path).expect("create")).expect("writer");
    for (idx, (src, dst, body)) in datagrams.iter().enumerate() {
        let frame = raw_udp_frame(endpoint(src), endpoint(dst), body).expect("frame");
        writer.write_frame(idx as f64, &frame).expect("write frame");
    }
    writer.flush().expect("flush");
}

fn sample_capture(temp: &TempDir) -> PathBuf {
    let path = temp.path().join("input.pcapng");
    let mut bad_size = rgb_packet(0, &[0; 3], false);
    bad_size[2] |= 0x07;
    write_capture(
        &path,
        &[
            ("10.0.0.1:4048", "10.0.0.2:4048", rgb_packet(0, &[255; 9], false)),
            ("10.0.0.1:4048", "10.0.0.2:4048", rgb_packet(9, &[128; 9], true)),
            ("10.0.0.3:4048", "10.0.0.2:4048", rgb_packet(0, &[1; 3], true)),
            ("10.0.0.1:4048", "10.0.0.2:4048", vec![0x41, 0x01]),
            ("10.0.0.1:4048", "10.0.0.2:4048", bad_size),
            ("10.0.0.1:6454", "10.0.0.2:6454", b"Art-Net\0".to_vec()),
        ],
    );
    path
}

#[test]
fn capture_report_summarises_streams_and_errors() {
    let temp = TempDir::new().expect("tempdir");
    let path = sample_capture(&temp);

    let report = analyze_pcap_file(&path, DDP_PORT).expect("analyze");
    let summary = report.capture_summary.as_ref().expect("summary");
    assert_eq!(summary.packets_total, 6);
    assert_eq!(summary.ddp_datagrams, 5);
    assert_eq!(summary.time_start.as_deref(), Some("1970-01-01T00:00:00Z"));
    assert_eq!(summary.time_end.as_deref(), Some("1970-01-01T00:00:05Z"));
    assert_eq!(report.generated_at, "1970-01-01T00:00:05Z");

    assert_eq!(report.streams.len(), 2);
    let first = &report.streams[0];
    assert_eq!(first.src, "10.0.0.1:4048");
    assert_eq!(first.packets, 2);
    assert_eq!(first.payload_bytes, 18);
    assert_eq!(first.push_packets, 1);
    assert_eq!(first.bits_per_pixel, vec![8]);
    assert_eq!(first.max_extent, 18);
    assert_eq!(first.pps, Some(2.0));
    assert_eq!(report.streams[1].src, "10.0.0.3:4048");

    let ids: Vec<_> = report.errors.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["DDP-TOO-SHORT", "DDP-UNKNOWN-SIZE-CODE"]);
    assert_eq!(report.errors[0].count, 1);
    assert_eq!(
        report.errors[0].examples,
        vec!["source 10.0.0.1:4048 @ 1970-01-01T00:00:03Z"]
    );
}

#[test]
fn capture_report_is_deterministic() {
    let temp = TempDir::new().expect("tempdir");
    let path = sample_capture(&temp);

    let a = serde_json::to_value(analyze_pcap_file(&path, DDP_PORT).expect("analyze"))
        .expect("json");
    let b = serde_json::to_value(analyze_pcap_file(&path, DDP_PORT).expect("analyze"))
        .expect("json");
    assert_eq!(a, b);
}

#[test]
fn memory_source_without_timestamps() {
    let mut packet = Packet::default();
    packet.header.flags.timecode = true;
    packet.header.timecode = Some(Timecode::default());
    let body = encode(&packet).expect("encode");
    let frame = raw_udp_frame(endpoint("[::1]:4048"), endpoint("[::1]:4048"), &body)
        .expect("frame");

    let source = MemorySource::from(vec![CapturedFrame {
        ts: None,
        linktype: Linktype::RAW,
        data: frame,
    }]);
    let report = analyze_source(Path::new("memory"), source, DDP_PORT).expect("analyze");
    let summary = report.capture_summary.as_ref().expect("summary");
    assert!(summary.time_start.is_none());
    assert_eq!(report.generated_at, ddp_core::DEFAULT_GENERATED_AT);
    assert_eq!(report.streams.len(), 1);
    assert_eq!(report.streams[0].timecode_packets, 1);
    assert_eq!(report.streams[0].src, "[::1]:4048");
    assert!(report.streams[0].pps.is_none());
    assert_eq!(report.input.bytes, 0);
}

fn memory_frame(ts: f64, src: &str, dst: &str, body: &[u8]) -> CapturedFrame {
    CapturedFrame {
        ts: Some(ts),
        linktype: Linktype::RAW,
        data: raw_udp_frame(endpoint(src), endpoint(dst), body).expect("frame"),
    }
}

#[test]
fn stream_rate_uses_stream_span_not_capture_span() {
    let mut source = MemorySource::new();
    let body = rgb_packet(0, &[7; 3], true);
    for (ts, src) in [
        (0.0, "10.0.0.1:4048"),
        (1.0, "10.0.0.1:4048"),
        (9.0, "10.0.0.2:4048"),
        (10.0, "10.0.0.2:4048"),
    ] {
        source.push(memory_frame(ts, src, "10.0.0.9:4048", &body));
    }

    let report = analyze_source(Path::new("memory"), source, DDP_PORT).expect("analyze");
    assert_eq!(report.streams.len(), 2);
    assert_eq!(report.streams[0].pps, Some(2.0));
    assert_eq!(report.streams[1].pps, Some(2.0));
}

#[test]
fn analysis_port_selects_ddp_datagrams() {
    let body = rgb_packet(0, &[7; 3], true);
    let frames = || {
        let mut source = MemorySource::new();
        source.push(memory_frame(0.0, "127.0.0.1:50000", "127.0.0.1:5568", &body));
        source.push(memory_frame(1.0, "127.0.0.1:50000", "127.0.0.1:4048", &body));
        source
    };

    let default_port = analyze_source(Path::new("memory"), frames(), DDP_PORT).expect("analyze");
    assert_eq!(default_port.streams.len(), 1);
    assert_eq!(default_port.streams[0].dst, "127.0.0.1:4048");

    let custom = analyze_source(Path::new("memory"), frames(), 5568).expect("analyze");
    let summary = custom.capture_summary.as_ref().expect("summary");
    assert_eq!(summary.packets_total, 2);
    assert_eq!(summary.ddp_datagrams, 1);
    assert_eq!(custom.streams.len(), 1);
    assert_eq!(custom.streams[0].dst, "127.0.0.1:5568");
}
