//! Byte primitives shared by the pack and object-store crates: zlib framing,
//! CRC32, varints, and a small progress-reporting trait threaded through
//! pack assembly and ingest.
#![deny(rust_2018_idioms)]

pub mod hash;
pub mod progress;
pub mod varint;
pub mod zlib;
