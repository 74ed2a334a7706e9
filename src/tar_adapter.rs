//! Adapts the `tar` crate's entry iterator into this crate's normalized
//! [`Record`] shape, so the dispatcher and writers never need to know tar's
//! block framing is different from the four cpio dialects'. Per the PURPOSE
//! & SCOPE non-goals, tar/ustar header decoding itself is someone else's
//! problem (the `tar` crate's); this module only adapts its output shape.

use std::io::Read;

use tar::{Entry, EntryType};

use crate::error::StreamError;
use crate::header::{FileKind, Record};
use crate::reader::ArchiveReader;

/// Presents any [`ArchiveReader`] as a plain [`std::io::Read`] so the `tar`
/// crate, which knows nothing of our tape abstraction, can consume it.
/// Built on `peek`+`toss` rather than `read_exact` since `Read::read` may
/// return short.
pub struct AsStdRead<'a> {
    inner: &'a mut dyn ArchiveReader,
}

impl<'a> AsStdRead<'a> {
    pub fn new(inner: &'a mut dyn ArchiveReader) -> Self {
        Self { inner }
    }
}

impl Read for AsStdRead<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self
            .inner
            .peek(buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        if n == 0 {
            return Ok(0);
        }
        self.inner
            .toss(n as u64)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        Ok(n)
    }
}

/// Wraps a single tar entry's payload reader as an [`ArchiveReader`]. `toss`
/// discards real entry bytes up to what's left of the payload and silently
/// ignores any excess requested beyond that: the 512-byte block padding tar
/// pads to is skipped internally by the crate when the next entry is
/// requested, not by us.
pub struct TarEntryReader<'a, R: Read> {
    entry: Entry<'a, R>,
    remaining: u64,
    consumed: u64,
}

impl<'a, R: Read> ArchiveReader for TarEntryReader<'a, R> {
    fn read_exact(&mut self, dst: &mut [u8]) -> Result<(), StreamError> {
        self.entry.read_exact(dst).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                StreamError::PrematureEof
            } else {
                StreamError::Io(e)
            }
        })?;
        self.remaining = self.remaining.saturating_sub(dst.len() as u64);
        self.consumed += dst.len() as u64;
        Ok(())
    }

    fn peek(&mut self, _dst: &mut [u8]) -> Result<usize, StreamError> {
        // Never called: tar symlink/hardlink targets travel as a header
        // field (`tar_linkname`), not as payload bytes to peek at.
        Ok(0)
    }

    fn toss(&mut self, n: u64) -> Result<(), StreamError> {
        let take = n.min(self.remaining);
        let mut scratch = [0u8; 8192];
        let mut left = take;
        while left > 0 {
            let chunk = (left.min(scratch.len() as u64)) as usize;
            self.entry.read_exact(&mut scratch[..chunk]).map_err(|e| {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    StreamError::PrematureEof
                } else {
                    StreamError::Io(e)
                }
            })?;
            left -= chunk as u64;
        }
        self.remaining -= take;
        self.consumed += take;
        Ok(())
    }

    fn input_bytes(&self) -> u64 {
        self.consumed
    }
}

fn file_kind_for(entry_type: EntryType) -> Option<FileKind> {
    match entry_type {
        EntryType::Regular | EntryType::Continuous | EntryType::GNUSparse => Some(FileKind::Regular),
        EntryType::Directory => Some(FileKind::Directory),
        EntryType::Symlink => Some(FileKind::Symlink),
        EntryType::Link => Some(FileKind::Regular), // resolved via tar_linkname in write_hard_link
        EntryType::Char => Some(FileKind::CharDevice),
        EntryType::Block => Some(FileKind::BlockDevice),
        EntryType::Fifo => Some(FileKind::Fifo),
        _ => None,
    }
}

fn type_bits(kind: Option<FileKind>) -> u32 {
    match kind {
        Some(FileKind::Regular) => libc::S_IFREG,
        Some(FileKind::Directory) => libc::S_IFDIR,
        Some(FileKind::Symlink) => libc::S_IFLNK,
        Some(FileKind::CharDevice) => libc::S_IFCHR,
        Some(FileKind::BlockDevice) => libc::S_IFBLK,
        Some(FileKind::Fifo) => libc::S_IFIFO,
        Some(FileKind::Socket) => libc::S_IFSOCK,
        None => 0,
    }
}

/// Converts one `tar::Entry` into a normalized record and a payload reader
/// over the same entry, consuming it. The dispatcher then treats this
/// exactly like a cpio record decoded by [`crate::header::decode_one`].
pub fn decode_tar_entry<R: Read>(entry: Entry<'_, R>) -> Result<(Record, TarEntryReader<'_, R>), StreamError> {
    let header = entry.header().clone();
    let entry_type = header.entry_type();
    let is_ustar = header.as_ustar().is_some();
    let size = entry.size();
    let link_name = entry
        .link_name()
        .ok()
        .flatten()
        .map(|p| p.to_string_lossy().into_owned().into_bytes());
    let name = entry
        .path()
        .map(|p| p.to_string_lossy().into_owned().into_bytes())
        .unwrap_or_default();

    let file_kind = file_kind_for(entry_type);
    let mode = header.mode().unwrap_or(0o644) | type_bits(file_kind);

    let record = Record {
        dialect: if is_ustar { crate::dialect::Dialect::Ustar } else { crate::dialect::Dialect::Tar },
        ino: 0,
        dev_major: 0,
        dev_minor: 0,
        mode,
        file_kind,
        uid: header.uid().unwrap_or(0) as u32,
        gid: header.gid().unwrap_or(0) as u32,
        nlink: 1,
        mtime: header.mtime().unwrap_or(0) as i64,
        filesize: size,
        rdev_major: header.device_major().ok().flatten().unwrap_or(0),
        rdev_minor: header.device_minor().ok().flatten().unwrap_or(0),
        chksum: 0,
        name,
        tar_linkname: link_name,
    };

    let reader = TarEntryReader {
        entry,
        remaining: size,
        consumed: 0,
    };
    Ok((record, reader))
}
