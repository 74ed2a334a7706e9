//! The tape abstraction C4-C9 are written against: `read`, `peek`, `toss`.
//! Two concrete transports implement it, chosen by the driver based on
//! whether the input is seekable, mirroring the distinction the historical
//! implementation draws between regular files and pipes/tapes.

use std::io::{Read, Seek, SeekFrom};

use crate::error::StreamError;

/// Non-seekable framing over an archive byte stream.
pub trait ArchiveReader {
    /// Fills `dst` completely; a short read is a fatal stream error.
    fn read_exact(&mut self, dst: &mut [u8]) -> Result<(), StreamError>;

    /// Non-destructive lookahead of up to `dst.len()` bytes. Returns the
    /// number of bytes actually available; this is less than `dst.len()`
    /// only at true end of file.
    fn peek(&mut self, dst: &mut [u8]) -> Result<usize, StreamError>;

    /// Discards exactly `n` bytes already known to exist (padding, a
    /// skipped payload). `n` may be zero.
    fn toss(&mut self, n: u64) -> Result<(), StreamError>;

    /// Total bytes consumed so far, used for the final block-count report.
    fn input_bytes(&self) -> u64;
}

const SCRATCH_SIZE: usize = 65536;

/// Wraps any `Read + Seek`; `toss` becomes a real seek.
pub struct SeekableReader<R> {
    inner: R,
    input_bytes: u64,
    peek_buf: Vec<u8>,
}

impl<R: Read + Seek> SeekableReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            input_bytes: 0,
            peek_buf: Vec::new(),
        }
    }
}

impl<R: Read + Seek> ArchiveReader for SeekableReader<R> {
    fn read_exact(&mut self, dst: &mut [u8]) -> Result<(), StreamError> {
        if !self.peek_buf.is_empty() {
            let take = self.peek_buf.len().min(dst.len());
            dst[..take].copy_from_slice(&self.peek_buf[..take]);
            self.peek_buf.drain(..take);
            if take == dst.len() {
                self.input_bytes += take as u64;
                return Ok(());
            }
            self.inner.read_exact(&mut dst[take..]).map_err(|e| {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    StreamError::PrematureEof
                } else {
                    StreamError::Io(e)
                }
            })?;
            self.input_bytes += dst.len() as u64;
            return Ok(());
        }

        self.inner.read_exact(dst).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                StreamError::PrematureEof
            } else {
                StreamError::Io(e)
            }
        })?;
        self.input_bytes += dst.len() as u64;
        Ok(())
    }

    fn peek(&mut self, dst: &mut [u8]) -> Result<usize, StreamError> {
        if self.peek_buf.len() < dst.len() {
            let mut extra = vec![0u8; dst.len() - self.peek_buf.len()];
            let mut got = 0;
            while got < extra.len() {
                match self.inner.read(&mut extra[got..])? {
                    0 => break,
                    n => got += n,
                }
            }
            extra.truncate(got);
            self.peek_buf.extend_from_slice(&extra);
        }
        let n = self.peek_buf.len().min(dst.len());
        dst[..n].copy_from_slice(&self.peek_buf[..n]);
        Ok(n)
    }

    fn toss(&mut self, n: u64) -> Result<(), StreamError> {
        if n == 0 {
            return Ok(());
        }
        let from_peek = (self.peek_buf.len() as u64).min(n);
        self.peek_buf.drain(..from_peek as usize);
        let remaining = n - from_peek;
        if remaining > 0 {
            self.inner.seek(SeekFrom::Current(remaining as i64))?;
        }
        self.input_bytes += n;
        Ok(())
    }

    fn input_bytes(&self) -> u64 {
        self.input_bytes
    }
}

/// Wraps any plain `Read`; `toss` is a discard-read loop through a reusable
/// scratch buffer since pipes and tape devices can't seek backward or
/// forward.
pub struct PipeReader<R> {
    inner: R,
    input_bytes: u64,
    peek_buf: Vec<u8>,
    scratch: Box<[u8; SCRATCH_SIZE]>,
}

impl<R: Read> PipeReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            input_bytes: 0,
            peek_buf: Vec::new(),
            scratch: Box::new([0u8; SCRATCH_SIZE]),
        }
    }
}

impl<R: Read> ArchiveReader for PipeReader<R> {
    fn read_exact(&mut self, dst: &mut [u8]) -> Result<(), StreamError> {
        if !self.peek_buf.is_empty() {
            let take = self.peek_buf.len().min(dst.len());
            dst[..take].copy_from_slice(&self.peek_buf[..take]);
            self.peek_buf.drain(..take);
            if take < dst.len() {
                self.inner.read_exact(&mut dst[take..]).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::UnexpectedEof {
                        StreamError::PrematureEof
                    } else {
                        StreamError::Io(e)
                    }
                })?;
            }
            self.input_bytes += dst.len() as u64;
            return Ok(());
        }

        self.inner.read_exact(dst).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                StreamError::PrematureEof
            } else {
                StreamError::Io(e)
            }
        })?;
        self.input_bytes += dst.len() as u64;
        Ok(())
    }

    fn peek(&mut self, dst: &mut [u8]) -> Result<usize, StreamError> {
        if self.peek_buf.len() < dst.len() {
            let mut extra = vec![0u8; dst.len() - self.peek_buf.len()];
            let mut got = 0;
            while got < extra.len() {
                match self.inner.read(&mut extra[got..])? {
                    0 => break,
                    n => got += n,
                }
            }
            extra.truncate(got);
            self.peek_buf.extend_from_slice(&extra);
        }
        let n = self.peek_buf.len().min(dst.len());
        dst[..n].copy_from_slice(&self.peek_buf[..n]);
        Ok(n)
    }

    fn toss(&mut self, n: u64) -> Result<(), StreamError> {
        let mut remaining = n;
        let from_peek = (self.peek_buf.len() as u64).min(remaining);
        self.peek_buf.drain(..from_peek as usize);
        remaining -= from_peek;

        while remaining > 0 {
            let chunk = remaining.min(SCRATCH_SIZE as u64) as usize;
            self.inner.read_exact(&mut self.scratch[..chunk]).map_err(|e| {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    StreamError::PrematureEof
                } else {
                    StreamError::Io(e)
                }
            })?;
            remaining -= chunk as u64;
        }
        self.input_bytes += n;
        Ok(())
    }

    fn input_bytes(&self) -> u64 {
        self.input_bytes
    }
}
