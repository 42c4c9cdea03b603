//! Block and streaming zlib compression, used to frame pack entry payloads
//! and for any caller that needs exact end-of-block detection so it
//! can hand back unconsumed trailing bytes to continue reading the next
//! entry.

use std::io;

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

/// Compress `data` as one zlib block.
pub fn compress(data: &[u8], level: Compression) -> Vec<u8> {
    let mut compressor = Compress::new(level, true);
    let mut out = Vec::with_capacity(data.len() / 2 + 16);
    compressor
        .compress_vec(data, &mut out, FlushCompress::Finish)
        .expect("in-memory compression cannot fail");
    out
}

/// Decompress a complete, self-contained zlib block.
pub fn decompress_to_vec(data: &[u8], expected_len: usize) -> Result<Vec<u8>, Error> {
    let mut decompressor = Decompress::new(true);
    let mut out = vec![0u8; expected_len];
    let status = decompressor
        .decompress(data, &mut out, FlushDecompress::Finish)
        .map_err(Error::Inflate)?;
    let produced = decompressor.total_out() as usize;
    out.truncate(produced);
    match status {
        Status::StreamEnd => Ok(out),
        _ if produced == expected_len => Ok(out),
        _ => Err(Error::Truncated {
            expected: expected_len,
            actual: produced,
        }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("zlib stream is corrupt")]
    Inflate(#[from] flate2::DecompressError),
    #[error("zlib stream ended after {actual} bytes, expected {expected}")]
    Truncated { expected: usize, actual: usize },
}

/// A streaming inflater that consumes input buffers incrementally and knows
/// the moment the underlying zlib stream ends, returning whatever bytes of
/// the input buffer it didn't need. This is what lets a pack reader stop
/// exactly at an entry boundary and resume parsing the next header from the
/// same buffer.
pub struct StreamingInflate {
    inner: Decompress,
    done: bool,
}

impl Default for StreamingInflate {
    fn default() -> Self {
        Self {
            inner: Decompress::new(true),
            done: false,
        }
    }
}

/// The result of feeding one buffer into [`StreamingInflate`].
pub struct InflateStep {
    /// Newly produced decompressed bytes.
    pub output: Vec<u8>,
    /// How many bytes of the input buffer were consumed.
    pub input_consumed: usize,
    /// Whether the zlib stream reached its end during this call.
    pub stream_ended: bool,
}

impl StreamingInflate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed (part of) the compressed stream, producing however many
    /// decompressed bytes `out_hint` is willing to hold at once.
    pub fn step(&mut self, input: &[u8], out_hint: usize) -> Result<InflateStep, Error> {
        let before_in = self.inner.total_in();
        let before_out = self.inner.total_out();
        let mut out = vec![0u8; out_hint.max(1)];
        let status = self
            .inner
            .decompress(input, &mut out, FlushDecompress::None)
            .map_err(Error::Inflate)?;
        let produced = (self.inner.total_out() - before_out) as usize;
        out.truncate(produced);
        let consumed = (self.inner.total_in() - before_in) as usize;
        if matches!(status, Status::StreamEnd) {
            self.done = true;
        }
        Ok(InflateStep {
            output: out,
            input_consumed: consumed,
            stream_ended: self.done,
        })
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

/// Decompress a zlib block embedded at the start of `input`, returning the
/// decompressed bytes and the number of input bytes the zlib stream actually
/// consumed (so the caller can keep reading whatever follows).
pub fn decompress_prefix(input: &[u8], expected_len: usize) -> Result<(Vec<u8>, usize), Error> {
    let mut inflate = StreamingInflate::new();
    let mut out = Vec::with_capacity(expected_len);
    let mut offset = 0;
    loop {
        let step = inflate.step(&input[offset..], expected_len - out.len() + 1)?;
        out.extend_from_slice(&step.output);
        offset += step.input_consumed;
        if step.stream_ended {
            return Ok((out, offset));
        }
        if step.input_consumed == 0 && step.output.is_empty() {
            return Err(Error::Truncated {
                expected: expected_len,
                actual: out.len(),
            });
        }
    }
}
