use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;

use crate::StreamSummary;
use crate::protocols::ddp::Packet;

use super::udp::UdpDatagram;
use super::update_ts_bounds;

#[derive(Debug, Hash, PartialEq, Eq)]
pub(crate) struct StreamKey {
    pub src: SocketAddr,
    pub dst: SocketAddr,
    pub source_or_destination_id: u8,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct StreamStats {
    pub packets: u64,
    pub payload_bytes: u64,
    pub push_packets: u64,
    pub timecode_packets: u64,
    pub query_packets: u64,
    pub reply_packets: u64,
    pub bits_per_pixel: BTreeSet<u8>,
    pub max_extent: u64,
    pub first_ts: Option<f64>,
    pub last_ts: Option<f64>,
}

pub(crate) fn add_stream_packet(
    stats: &mut HashMap<StreamKey, StreamStats>,
    datagram: &UdpDatagram<'_>,
    packet: &Packet,
    ts: Option<f64>,
) {
    let header = &packet.header;
    let key = StreamKey {
        src: datagram.src,
        dst: datagram.dst,
        source_or_destination_id: header.source_or_destination_id,
    };
    let entry = stats.entry(key).or_default();
    entry.packets += 1;
    entry.payload_bytes += packet.payload.len() as u64;
    entry.push_packets += u64::from(header.flags.push);
    entry.timecode_packets += u64::from(header.flags.timecode);
    entry.query_packets += u64::from(header.flags.query);
    entry.reply_packets += u64::from(header.flags.reply);
    entry.bits_per_pixel.insert(header.data_type.bits_per_pixel);
    let extent = header.data_offset as u64 + packet.payload.len() as u64;
    entry.max_extent = entry.max_extent.max(extent);
    update_ts_bounds(&mut entry.first_ts, &mut entry.last_ts, ts);
}

pub(crate) fn build_stream_summaries(stats: HashMap<StreamKey, StreamStats>) -> Vec<StreamSummary> {
    let mut streams: Vec<(StreamKey, StreamSummary)> = stats
        .into_iter()
        .map(|(key, stats)| {
            let pps = match (stats.first_ts, stats.last_ts) {
                (Some(start), Some(end)) if end > start => {
                    Some(stats.packets as f64 / (end - start))
                }
                _ => None,
            };
            let summary = StreamSummary {
                src: key.src.to_string(),
                dst: key.dst.to_string(),
                source_or_destination_id: key.source_or_destination_id,
                packets: stats.packets,
                payload_bytes: stats.payload_bytes,
                push_packets: stats.push_packets,
                timecode_packets: stats.timecode_packets,
                query_packets: stats.query_packets,
                reply_packets: stats.reply_packets,
                bits_per_pixel: stats.bits_per_pixel.into_iter().collect(),
                max_extent: stats.max_extent,
                pps,
            };
            (key, summary)
        })
        .collect();

    streams.sort_by(|(a, _), (b, _)| {
        a.src
            .cmp(&b.src)
            .then_with(|| a.dst.cmp(&b.dst))
            .then_with(|| a.source_or_destination_id.cmp(&b.source_or_destination_id))
    });
    streams.into_iter().map(|(_, summary)| summary).collect()
}
