use bytemuck::{Pod, Zeroable};

use super::{read_name, FileKind, Record};
use crate::dialect::Dialect;
use crate::error::{MemberError, StreamError};
use crate::numeric::swab_array;
use crate::reader::ArchiveReader;

/// 13 native-endian 16-bit fields, magic included; swapped wholesale before
/// interpretation when the archive turned out to be reverse byte order.
/// mtime and filesize are each split across two shorts, high half first.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy)]
struct OldBinaryRaw {
    magic: u16,
    dev: u16,
    ino: u16,
    mode: u16,
    uid: u16,
    gid: u16,
    nlink: u16,
    rdev: u16,
    mtime_hi: u16,
    mtime_lo: u16,
    namesize: u16,
    filesize_hi: u16,
    filesize_lo: u16,
}

const HEADER_LEN: usize = std::mem::size_of::<OldBinaryRaw>();

pub fn decode(
    reader: &mut dyn ArchiveReader,
    swap: bool,
) -> Result<(Record, Option<MemberError>, bool), StreamError> {
    let mut buf = [0u8; HEADER_LEN];
    reader.read_exact(&mut buf)?;
    if swap {
        swab_array(&mut buf, HEADER_LEN / 2);
    }
    let raw: OldBinaryRaw = bytemuck::pod_read_unaligned(&buf);

    let namesize = raw.namesize as usize;
    let (name, name_err) = read_name(reader, namesize)?;
    reader.toss(Dialect::OldBinary.padding_for((HEADER_LEN + namesize) as u64))?;

    let mtime = ((raw.mtime_hi as u32) << 16) | raw.mtime_lo as u32;
    let mut filesize = ((raw.filesize_hi as u32) << 16) | raw.filesize_lo as u32;

    let mut rdev_major = ((raw.rdev >> 8) & 0xff) as u32;
    let mut rdev_minor = (raw.rdev & 0xff) as u32;
    let file_kind = FileKind::from_mode(raw.mode as u32);
    let is_device = matches!(file_kind, Some(FileKind::CharDevice) | Some(FileKind::BlockDevice));
    if is_device && filesize != 0 && rdev_major == 0 && rdev_minor == 1 {
        rdev_major = (filesize >> 8) & 0xff;
        rdev_minor = filesize & 0xff;
        filesize = 0;
    }

    let record = Record {
        dialect: Dialect::OldBinary,
        ino: raw.ino as u64,
        dev_major: ((raw.dev >> 8) & 0xff) as u32,
        dev_minor: (raw.dev & 0xff) as u32,
        mode: raw.mode as u32,
        file_kind,
        uid: raw.uid as u32,
        gid: raw.gid as u32,
        nlink: raw.nlink as u32,
        mtime: mtime as i64,
        filesize: filesize as u64,
        rdev_major,
        rdev_minor,
        chksum: 0,
        name,
        tar_linkname: None,
    };

    Ok((record, name_err, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::PipeReader;
    use std::io::Cursor;

    fn header_bytes(swap: bool, name: &str, payload_len: u32) -> Vec<u8> {
        let raw = OldBinaryRaw {
            magic: 0o070707,
            dev: 0,
            ino: 42,
            mode: 0o100644,
            uid: 0,
            gid: 0,
            nlink: 1,
            rdev: 0,
            mtime_hi: 0,
            mtime_lo: 1000,
            namesize: (name.len() + 1) as u16,
            filesize_hi: (payload_len >> 16) as u16,
            filesize_lo: (payload_len & 0xffff) as u16,
        };
        let mut bytes = bytemuck::bytes_of(&raw).to_vec();
        if swap {
            swab_array(&mut bytes, HEADER_LEN / 2);
        }
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(0);
        let total = HEADER_LEN + name.len() + 1;
        let pad = Dialect::OldBinary.padding_for(total as u64);
        bytes.extend(std::iter::repeat(0u8).take(pad as usize));
        bytes
    }

    #[test]
    fn decodes_native_order() {
        let mut bytes = header_bytes(false, "a", 4);
        bytes.extend_from_slice(b"abcd");
        let mut r = PipeReader::new(Cursor::new(bytes));
        let (record, err, _) = decode(&mut r, false).unwrap();
        assert!(err.is_none());
        assert_eq!(record.ino, 42);
        assert_eq!(record.filesize, 4);
        assert_eq!(record.name, b"a");
    }

    #[test]
    fn decodes_swapped_order() {
        let bytes = header_bytes(true, "bb", 0);
        let mut r = PipeReader::new(Cursor::new(bytes));
        let (record, err, _) = decode(&mut r, true).unwrap();
        assert!(err.is_none());
        assert_eq!(record.ino, 42);
        assert_eq!(record.name, b"bb");
    }
}
