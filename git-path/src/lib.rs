//! Filesystem path helpers. The object graph itself is storage-agnostic,
//! but the concrete on-disk loose backends in `git-odb` and `git-ref` need
//! to resolve symlinked repository paths the way Git itself does, which is
//! what this crate provides.
#![deny(rust_2018_idioms)]

mod realpath;

pub use realpath::{function::realpath, Error};
