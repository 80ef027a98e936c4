//! DDP (Distributed Display Protocol) packet codec.
//!
//! `parser::decode` turns a datagram into a [`Packet`]; `writer::encode`
//! produces the exact wire bytes back. Both are pure functions over the
//! bit-field and size-code definitions in `layout`, so the two directions
//! cannot drift apart. Timecode presence follows the timecode flag: decode
//! only reads it when flagged, encode refuses a flagged packet without one.
//!
//! The declared data length is metadata. Neither direction compares it with
//! the payload; `pixels` clips to whichever is shorter when reading pixels.
//!
//! Version française (résumé):
//! Codec DDP sans état : `decode` (octets -> paquet) et `encode`
//! (paquet -> octets). Les positions de bits et la table des tailles sont
//! partagées dans `layout`.

pub mod error;
pub mod layout;
pub mod packet;
pub mod parser;
pub mod pixels;
pub mod reader;
pub mod writer;

pub use error::DdpError;
pub use packet::{DataType, Flags, Header, Packet, Timecode};
pub use parser::decode;
pub use pixels::Rgb;
pub use writer::encode;
