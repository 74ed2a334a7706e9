//! Header decoding: format auto-detection plus the four per-dialect
//! decoders that read directly off an [`ArchiveReader`](crate::reader::ArchiveReader)
//! into one normalized [`Record`]. tar/ustar is handled separately by
//! [`crate::tar_adapter`], which delegates block parsing to the `tar` crate
//! entirely and only adapts its entry shape into a [`Record`].

mod detect;
mod new_ascii;
mod old_ascii;
mod old_binary;

pub use detect::{detect_format, DetectedFormat};

use crate::dialect::Dialect;
use crate::error::MemberError;
use crate::reader::ArchiveReader;

pub const TRAILER_NAME: &[u8] = b"TRAILER!!!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
    CharDevice,
    BlockDevice,
    Fifo,
    Socket,
}

impl FileKind {
    pub fn from_mode(mode: u32) -> Option<Self> {
        match mode & libc::S_IFMT {
            libc::S_IFREG => Some(FileKind::Regular),
            libc::S_IFDIR => Some(FileKind::Directory),
            libc::S_IFLNK => Some(FileKind::Symlink),
            libc::S_IFCHR => Some(FileKind::CharDevice),
            libc::S_IFBLK => Some(FileKind::BlockDevice),
            libc::S_IFIFO => Some(FileKind::Fifo),
            libc::S_IFSOCK => Some(FileKind::Socket),
            _ => None,
        }
    }
}

/// The normalized record descriptor every dialect decodes into. Lives for
/// one iteration of the driver's main loop; name storage is reused in
/// place across records rather than reallocated per header.
#[derive(Debug, Clone)]
pub struct Record {
    pub dialect: Dialect,
    pub ino: u64,
    pub dev_major: u32,
    pub dev_minor: u32,
    pub mode: u32,
    pub file_kind: Option<FileKind>,
    pub uid: u32,
    pub gid: u32,
    pub nlink: u32,
    pub mtime: i64,
    pub filesize: u64,
    pub rdev_major: u32,
    pub rdev_minor: u32,
    pub chksum: u32,
    /// Path bytes, NUL excluded.
    pub name: Vec<u8>,
    /// Only present for tar/ustar (hard and symlink target travels inline).
    pub tar_linkname: Option<Vec<u8>>,
}

impl Record {
    pub fn is_trailer(&self) -> bool {
        self.name == TRAILER_NAME
    }

    /// The `(ino, dev_major, dev_minor)` key hard-link groups are keyed on.
    pub fn identity(&self) -> (u64, u32, u32) {
        (self.ino, self.dev_major, self.dev_minor)
    }

    pub fn permission_bits(&self) -> u32 {
        self.mode & 0o7777
    }
}

/// Reads the next record for a fixed (already-detected) cpio dialect.
/// `swap` is true when the archive's binary headers were found to be in
/// reverse byte order; it has no effect on ASCII dialects.
pub fn decode_one(
    dialect: Dialect,
    reader: &mut dyn ArchiveReader,
    swap: bool,
) -> Result<(Record, Option<MemberError>, bool), crate::error::StreamError> {
    match dialect {
        Dialect::OldBinary => old_binary::decode(reader, swap),
        Dialect::OldAscii => old_ascii::decode(reader),
        Dialect::NewAscii => new_ascii::decode(reader, false),
        Dialect::NewCrc => new_ascii::decode(reader, true),
        Dialect::Tar | Dialect::Ustar => unreachable!("tar/ustar is handled by tar_adapter"),
    }
}

/// Reads a NUL-terminated name of `namesize` bytes (including the NUL).
/// Per the malformed-name rule: `namesize == 0`, or a name whose last byte
/// isn't NUL, is reported and the caller should skip the record.
pub(crate) fn read_name(
    reader: &mut dyn ArchiveReader,
    namesize: usize,
) -> Result<(Vec<u8>, Option<MemberError>), crate::error::StreamError> {
    if namesize == 0 {
        return Ok((Vec::new(), Some(MemberError::Malformed("zero-length name".into()))));
    }
    let mut buf = vec![0u8; namesize];
    reader.read_exact(&mut buf)?;
    if buf[namesize - 1] != 0 {
        return Ok((
            Vec::new(),
            Some(MemberError::Malformed("name not NUL-terminated".into())),
        ));
    }
    buf.truncate(namesize - 1);
    Ok((buf, None))
}
