//! The `-t`/`-tv` listing surface: a bare name per member, or a long
//! `ls -l`-shaped line when verbose.

use std::mem::MaybeUninit;

use numtoa::NumToA;

use crate::header::{FileKind, Record};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn type_char(kind: Option<FileKind>) -> u8 {
    match kind {
        Some(FileKind::Regular) => b'-',
        Some(FileKind::Directory) => b'd',
        Some(FileKind::Symlink) => b'l',
        Some(FileKind::CharDevice) => b'c',
        Some(FileKind::BlockDevice) => b'b',
        Some(FileKind::Fifo) => b'p',
        Some(FileKind::Socket) => b's',
        None => b'?',
    }
}

fn push_perm_triplet(out: &mut String, bits: u32, setid: bool, setid_char: char) {
    out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
    out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
    out.push(if setid {
        if bits & 0o1 != 0 {
            setid_char
        } else {
            setid_char.to_ascii_uppercase()
        }
    } else if bits & 0o1 != 0 {
        'x'
    } else {
        '-'
    });
}

fn mode_string(record: &Record) -> String {
    let mut s = String::with_capacity(10);
    s.push(type_char(record.file_kind) as char);
    push_perm_triplet(
        &mut s,
        (record.mode >> 6) & 0o7,
        record.mode & libc::S_ISUID as u32 != 0,
        's',
    );
    push_perm_triplet(
        &mut s,
        (record.mode >> 3) & 0o7,
        record.mode & libc::S_ISGID as u32 != 0,
        's',
    );
    push_perm_triplet(&mut s, record.mode & 0o7, record.mode & libc::S_ISVTX as u32 != 0, 't');
    s
}

/// Formats the mtime column the way `ls -l` does: time-of-day within the
/// last six months, year otherwise.
fn format_mtime(mtime: i64, now: i64) -> String {
    const SIX_MONTHS_SECS: i64 = 60 * 60 * 24 * 30 * 6;
    let mut tm: MaybeUninit<libc::tm> = MaybeUninit::uninit();
    let t = mtime as libc::time_t;
    let broken = unsafe {
        if libc::localtime_r(&t, tm.as_mut_ptr()).is_null() {
            return String::from("??? ?? ?????");
        }
        tm.assume_init()
    };

    let month = MONTHS.get(broken.tm_mon as usize).copied().unwrap_or("???");
    let mut day_buf = [0u8; 4];
    let day = (broken.tm_mday as u32).numtoa_str(10, &mut day_buf);

    if (now - mtime).abs() > SIX_MONTHS_SECS {
        let mut year_buf = [0u8; 8];
        let year = ((broken.tm_year + 1900) as u32).numtoa_str(10, &mut year_buf);
        format!("{month} {day:>2} {year:>5}")
    } else {
        let mut h_buf = [0u8; 4];
        let mut m_buf = [0u8; 4];
        let hour = (broken.tm_hour as u32).numtoa_str(10, &mut h_buf);
        let minute = (broken.tm_min as u32).numtoa_str(10, &mut m_buf);
        format!("{month} {day:>2} {hour:0>2}:{minute:0>2}")
    }
}

/// One `ls -l`-style line, without a trailing newline.
pub fn long_format(record: &Record, numeric_uid: bool, now: i64) -> String {
    let owner = if numeric_uid {
        record.uid.to_string()
    } else {
        resolve_user_name(record.uid).unwrap_or_else(|| record.uid.to_string())
    };
    let group = if numeric_uid {
        record.gid.to_string()
    } else {
        resolve_group_name(record.gid).unwrap_or_else(|| record.gid.to_string())
    };

    let size_or_dev = match record.file_kind {
        Some(FileKind::CharDevice) | Some(FileKind::BlockDevice) => {
            format!("{:>3}, {:>3}", record.rdev_major, record.rdev_minor)
        }
        _ => record.filesize.to_string(),
    };

    format!(
        "{} {:>3} {:<8} {:<8} {:>8} {} {}",
        mode_string(record),
        record.nlink,
        owner,
        group,
        size_or_dev,
        format_mtime(record.mtime, now),
        String::from_utf8_lossy(&record.name),
    )
}

fn resolve_user_name(uid: u32) -> Option<String> {
    let mut buf = [0u8; 1024];
    let mut pwd: MaybeUninit<libc::passwd> = MaybeUninit::uninit();
    let mut result: *mut libc::passwd = std::ptr::null_mut();
    let ret = unsafe {
        libc::getpwuid_r(uid, pwd.as_mut_ptr(), buf.as_mut_ptr() as *mut _, buf.len(), &mut result)
    };
    if ret != 0 || result.is_null() {
        return None;
    }
    let pwd = unsafe { pwd.assume_init() };
    let name = unsafe { std::ffi::CStr::from_ptr(pwd.pw_name) };
    Some(name.to_string_lossy().into_owned())
}

fn resolve_group_name(gid: u32) -> Option<String> {
    let mut buf = [0u8; 1024];
    let mut grp: MaybeUninit<libc::group> = MaybeUninit::uninit();
    let mut result: *mut libc::group = std::ptr::null_mut();
    let ret = unsafe {
        libc::getgrgid_r(gid, grp.as_mut_ptr(), buf.as_mut_ptr() as *mut _, buf.len(), &mut result)
    };
    if ret != 0 || result.is_null() {
        return None;
    }
    let grp = unsafe { grp.assume_init() };
    let name = unsafe { std::ffi::CStr::from_ptr(grp.gr_name) };
    Some(name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    fn sample_record() -> Record {
        Record {
            dialect: Dialect::NewAscii,
            ino: 1,
            dev_major: 0,
            dev_minor: 0,
            mode: 0o100644,
            file_kind: Some(FileKind::Regular),
            uid: 0,
            gid: 0,
            nlink: 1,
            mtime: 1_700_000_000,
            filesize: 123,
            rdev_major: 0,
            rdev_minor: 0,
            chksum: 0,
            name: b"a.txt".to_vec(),
            tar_linkname: None,
        }
    }

    #[test]
    fn mode_string_has_dash_prefix_for_regular_file() {
        assert_eq!(mode_string(&sample_record()), "-rw-r--r--");
    }

    #[test]
    fn long_format_includes_name_and_size() {
        let line = long_format(&sample_record(), true, 1_700_000_000);
        assert!(line.contains("a.txt"));
        assert!(line.contains("123"));
    }
}
