//! Protocol decoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`: byte offsets, bit fields and lookup tables (source of truth)
//! - `reader`: safe byte access for decoding
//! - `parser` / `writer`: domain-level decode and encode (no raw indexing)
//! - `error`: explicit, actionable errors
//!
//! Codecs are pure and contain no I/O; sources and analysis layers handle
//! file access and aggregation.

pub(crate) mod common;
pub mod ddp;
