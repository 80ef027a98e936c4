//! PCAP/PCAPNG capture files.
//!
//! File I/O and block parsing live here; the source emits raw frames with
//! their link type and timestamp and knows nothing about DDP. The writer is
//! the inverse used when recording live traffic.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod writer;

pub use parser::PcapFileSource;
pub use writer::{PcapNgWriter, raw_udp_frame};
