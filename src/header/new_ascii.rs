use super::{read_name, FileKind, Record};
use crate::dialect::Dialect;
use crate::error::{MemberError, StreamError};
use crate::numeric::{from_ascii, FromAsciiResult};
use crate::reader::ArchiveReader;

/// 13 fields of 8 hex digits each, in order: ino, mode, uid, gid, nlink,
/// mtime, filesize, dev_major, dev_minor, rdev_major, rdev_minor, namesize,
/// chksum.
const FIELD_COUNT: usize = 13;
const FIELD_WIDTH: usize = 8;
const HEADER_LEN: u64 = 6 + (FIELD_COUNT * FIELD_WIDTH) as u64;

pub fn decode(
    reader: &mut dyn ArchiveReader,
    is_crc: bool,
) -> Result<(Record, Option<MemberError>, bool), StreamError> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;

    let mut buf = vec![0u8; FIELD_COUNT * FIELD_WIDTH];
    reader.read_exact(&mut buf)?;

    let fields: [FromAsciiResult; FIELD_COUNT] = std::array::from_fn(|i| {
        let start = i * FIELD_WIDTH;
        from_ascii(&buf[start..start + FIELD_WIDTH], 4)
    });
    let malformed = fields.iter().any(|f| f.malformed);
    let out_of_range = fields.iter().any(|f| f.out_of_range);
    let [ino, mode, uid, gid, nlink, mtime, filesize, dev_major, dev_minor, rdev_major, rdev_minor, namesize, chksum] =
        fields;

    let dialect = if is_crc { Dialect::NewCrc } else { Dialect::NewAscii };

    let (name, name_err) = read_name(reader, namesize.value as usize)?;

    let name_pad = dialect.padding_for(HEADER_LEN + namesize.value);
    reader.toss(name_pad)?;

    let record = Record {
        dialect,
        ino: ino.value,
        dev_major: dev_major.value as u32,
        dev_minor: dev_minor.value as u32,
        mode: mode.value as u32,
        file_kind: FileKind::from_mode(mode.value as u32),
        uid: uid.value as u32,
        gid: gid.value as u32,
        nlink: nlink.value as u32,
        mtime: mtime.value as i64,
        filesize: filesize.value,
        rdev_major: rdev_major.value as u32,
        rdev_minor: rdev_minor.value as u32,
        chksum: chksum.value as u32,
        name,
        tar_linkname: None,
    };

    // A bad name takes priority over a merely out-of-range numeric field in
    // the diagnostic surfaced; either way the caller skips this record.
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
