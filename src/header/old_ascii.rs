use super::{read_name, FileKind, Record};
use crate::dialect::Dialect;
use crate::error::{MemberError, StreamError};
use crate::numeric::{from_ascii, FromAsciiResult};
use crate::reader::ArchiveReader;

/// Field widths after the 6-byte magic, in order: dev, ino, mode, uid, gid,
/// nlink, rdev, mtime, namesize, filesize. old-ascii has no padding
/// anywhere: name and payload both follow immediately.
const FIELD_WIDTHS: [usize; 10] = [6, 6, 6, 6, 6, 6, 6, 11, 6, 11];

pub fn decode(
    reader: &mut dyn ArchiveReader,
) -> Result<(Record, Option<MemberError>, bool), StreamError> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;

    let total_width: usize = FIELD_WIDTHS.iter().sum();
    let mut buf = vec![0u8; total_width];
    reader.read_exact(&mut buf)?;

    let mut off = 0;
    let mut fields: [FromAsciiResult; 10] = std::array::from_fn(|i| {
        let w = FIELD_WIDTHS[i];
        let v = from_ascii(&buf[off..off + w], 3);
        off += w;
        v
    });
    let filesize = std::mem::replace(&mut fields[9], from_ascii(&[], 3));
    let [dev, ino, mode, uid, gid, nlink, rdev, mtime, namesize, _] = fields;

    let all_fields = [&dev, &ino, &mode, &uid, &gid, &nlink, &rdev, &mtime, &namesize, &filesize];
    let malformed = all_fields.iter().any(|f| f.malformed);
    let out_of_range = all_fields.iter().any(|f| f.out_of_range);

    let (name, name_err) = read_name(reader, namesize.value as usize)?;

    let (mut filesize_val, mut rdev_major, mut rdev_minor) = (
        filesize.value,
        ((rdev.value >> 8) & 0xff) as u32,
        (rdev.value & 0xff) as u32,
    );

    let file_kind = FileKind::from_mode(mode.value as u32);
    let is_device = matches!(file_kind, Some(FileKind::CharDevice) | Some(FileKind::BlockDevice));
    // HP fixup: device files historically stash the real rdev in the
    // filesize field when rdev itself is the sentinel (0, 1).
    if is_device && filesize_val != 0 && rdev_major == 0 && rdev_minor == 1 {
        rdev_major = ((filesize_val >> 8) & 0xff) as u32;
        rdev_minor = (filesize_val & 0xff) as u32;
        filesize_val = 0;
    }

    let record = Record {
        dialect: Dialect::OldAscii,
        ino: ino.value,
        dev_major: ((dev.value >> 8) & 0xff) as u32,
        dev_minor: (dev.value & 0xff) as u32,
        mode: mode.value as u32,
        file_kind,
        uid: uid.value as u32,
        gid: gid.value as u32,
        nlink: nlink.value as u32,
        mtime: mtime.value as i64,
        filesize: filesize_val,
        rdev_major,
        rdev_minor,
        chksum: 0,
        name,
        tar_linkname: None,
    };

    let err = name_err.or_else(|| {
        if malformed {
            Some(MemberError::Malformed(
                "malformed numeric header field".to_string(),
            ))
        } else {
            None
        }
    });

    Ok((record, err, out_of_range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::PipeReader;
    use std::io::Cursor;

    fn header_bytes(name: &str, payload_len: usize) -> Vec<u8> {
        let mut s = String::from("070707");
        // dev, ino, mode (file, 0644), uid, gid, nlink, rdev
        s += &format!("{:06o}", 0); // dev
        s += &format!("{:06o}", 42); // ino
        s += &format!("{:06o}", 0o100644); // mode
        s += &format!("{:06o}", 0); // uid
        s += &format!("{:06o}", 0); // gid
        s += &format!("{:06o}", 1); // nlink
        s += &format!("{:06o}", 0); // rdev
        s += &format!("{:011o}", 1000); // mtime
        s += &format!("{:06o}", name.len() + 1); // namesize incl NUL
        s += &format!("{:011o}", payload_len); // filesize
        let mut bytes = s.into_bytes();
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(0);
        bytes
    }

    #[test]
    fn decodes_regular_file_header() {
        let bytes = header_bytes("a.txt", 6);
        let mut r = PipeReader::new(Cursor::new(bytes));
        let (record, err, _) = decode(&mut r).unwrap();
        assert!(err.is_none());
        assert_eq!(record.name, b"a.txt");
        assert_eq!(record.filesize, 6);
        assert_eq!(record.ino, 42);
        assert_eq!(record.file_kind, Some(FileKind::Regular));
    }
}
