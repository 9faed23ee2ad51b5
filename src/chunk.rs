//! Bounded chunked copying.
//!
//! Every payload copy in the crate (reader to sink, reader to writer, file to
//! writer) goes through [`Chunks`], which owns the single
//! [`READ_BUFFER_SIZE`] window used for that copy. The sequence of chunks is
//! finite and not restartable: it ends when the source reports zero bytes or
//! the byte limit is reached.

use std::io::{self, Read};

use crate::{Error, READ_BUFFER_SIZE, Result};

/// Something that fills a buffer with the next payload bytes.
///
/// Returning `Ok(0)` means the payload is exhausted.
pub trait ChunkSource {
    /// Reads up to `buf.len()` bytes into `buf`.
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize>;
}

impl<S: ChunkSource + ?Sized> ChunkSource for &mut S {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_chunk(buf)
    }
}

/// Adapts any [`io::Read`] into a [`ChunkSource`].
#[derive(Debug)]
pub struct IoSource<R>(pub R);

impl<R: Read> ChunkSource for IoSource<R> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.0.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// A lending iterator over fixed-size payload chunks.
pub struct Chunks<S> {
    source: S,
    buf: Vec<u8>,
    limit: Option<u64>,
    produced: u64,
    finished: bool,
}

impl<S: ChunkSource> Chunks<S> {
    /// Chunks until the source is exhausted.
    pub fn new(source: S) -> Self {
        Self {
            source,
            buf: vec![0u8; READ_BUFFER_SIZE],
            limit: None,
            produced: 0,
            finished: false,
        }
    }

    /// Chunks until `limit` bytes were produced or the source is exhausted.
    pub fn bounded(source: S, limit: u64) -> Self {
        let mut chunks = Self::new(source);
        chunks.limit = Some(limit);
        chunks
    }

    /// Returns the next chunk, or `None` once the sequence has ended.
    pub fn next_chunk(&mut self) -> Result<Option<&[u8]>> {
        if self.finished {
            return Ok(None);
        }
        let want = match self.limit {
            Some(limit) => {
                let left = limit - self.produced;
                if left == 0 {
                    self.finished = true;
                    return Ok(None);
                }
                left.min(self.buf.len() as u64) as usize
            }
            None => self.buf.len(),
        };
        let n = match self.source.read_chunk(&mut self.buf[..want]) {
            Ok(n) => n,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };
        if n == 0 {
            self.finished = true;
            return Ok(None);
        }
        self.produced += n as u64;
        Ok(Some(&self.buf[..n]))
    }

    /// Bytes produced so far.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// Returns `true` if a bounded sequence ended before its limit.
    pub fn fell_short(&self) -> bool {
        self.finished && self.limit.is_some_and(|limit| self.produced < limit)
    }

    /// Returns the underlying source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

/// Drives `chunks` into `sink` and returns the number of bytes delivered.
///
/// The sink reports how many bytes it accepted; accepting fewer than offered
/// is a failure. Any failure is reported as [`Error::Transfer`] carrying the
/// count delivered so far and `expected` for reference.
pub(crate) fn pump<S, F>(chunks: &mut Chunks<S>, expected: u64, mut sink: F) -> Result<u64>
where
    S: ChunkSource,
    F: FnMut(&[u8]) -> Result<usize>,
{
    let mut delivered = 0u64;
    loop {
        let chunk = match chunks.next_chunk() {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => return Err(Error::transfer(delivered, expected, e.to_string())),
        };
        let offered = chunk.len();
        match sink(chunk) {
            Ok(accepted) if accepted == offered => delivered += accepted as u64,
            Ok(accepted) => {
                delivered += accepted as u64;
                return Err(Error::transfer(
                    delivered,
                    expected,
                    format!("sink accepted {} of {} bytes", accepted, offered),
                ));
            }
            Err(e) => return Err(Error::transfer(delivered, expected, e.to_string())),
        }
    }
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_chunk_sizes() {
        let data = vec![7u8; READ_BUFFER_SIZE * 2 + 100];
        let mut chunks = Chunks::new(IoSource(Cursor::new(&data)));
        let mut sizes = Vec::new();
        while let Some(chunk) = chunks.next_chunk().unwrap() {
            sizes.push(chunk.len());
        }
        assert_eq!(sizes, vec![READ_BUFFER_SIZE, READ_BUFFER_SIZE, 100]);
        assert_eq!(chunks.produced(), data.len() as u64);
        assert!(!chunks.fell_short());
        // Finished sequences stay finished.
        assert!(chunks.next_chunk().unwrap().is_none());
    }

    #[test]
    fn test_bounded_stops_at_limit() {
        let data = vec![1u8; 10_000];
        let mut chunks = Chunks::bounded(IoSource(Cursor::new(&data)), 9000);
        let mut total = 0;
        while let Some(chunk) = chunks.next_chunk().unwrap() {
            total += chunk.len();
        }
        assert_eq!(total, 9000);
        assert!(!chunks.fell_short());
    }

    #[test]
    fn test_bounded_short_source() {
        let mut chunks = Chunks::bounded(IoSource(Cursor::new(vec![0u8; 3])), 4);
        while chunks.next_chunk().unwrap().is_some() {}
        assert!(chunks.fell_short());
        assert_eq!(chunks.produced(), 3);
    }

    #[test]
    fn test_pump_reports_partial_count() {
        let data = vec![0u8; READ_BUFFER_SIZE + 10];
        let mut chunks = Chunks::new(IoSource(Cursor::new(&data)));
        let mut calls = 0;
        let err = pump(&mut chunks, data.len() as u64, |chunk| {
            calls += 1;
            if calls == 1 {
                Ok(chunk.len())
            } else {
                Err(io::Error::other("disk full").into())
            }
        })
        .unwrap_err();
        assert_eq!(err.transferred(), Some(READ_BUFFER_SIZE as u64));
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }

    #[test]
    fn test_pump_detects_short_accept() {
        let mut chunks = Chunks::new(IoSource(Cursor::new(vec![0u8; 10])));
        let err = pump(&mut chunks, 10, |chunk| Ok(chunk.len() - 1)).unwrap_err();
        assert_eq!(err.transferred(), Some(9));
    }
}
