//! Type-specific writers (C8): create the inode an extracted record
//! describes, at the path it describes, idempotently with respect to
//! whatever's already there.

use std::ffi::CString;
use std::io::Write;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;

use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::sys::stat::{fchmodat, lstat, mkdirat, mknodat, utimensat, FchmodatFlags, Mode, SFlag, UtimensatFlags};
use nix::sys::time::TimeSpec;
use nix::unistd::{linkat, mkfifoat, rmdir, symlinkat, unlinkat, AtFlags, UnlinkatFlags};

use crate::context::{DelayedSetStat, ExtractContext};
use crate::error::MemberError;
use crate::header::{FileKind, Record};
use crate::reader::ArchiveReader;
use crate::tables::deferred_link::DeferredEntry;
use crate::tables::delayed_symlink::DelayedSymlink;

fn cstr(path: &[u8]) -> Result<CString, MemberError> {
    CString::new(path).map_err(|_| MemberError::Malformed("name contains an embedded NUL".into()))
}

// === Existing-file pre-check === //

pub enum ExistingAction {
    Proceed,
    AlreadyExistingDir,
    SkipNewer,
    SkipRemoveFailed,
}

/// Mirrors the original's `try_existing_file`: decide what to do about a
/// path that may already be occupied before creating anything new there.
pub fn try_existing(path: &[u8], record: &Record, unconditional: bool) -> ExistingAction {
    let Ok(c_path) = cstr(path) else {
        return ExistingAction::SkipRemoveFailed;
    };
    let Ok(st) = lstat(c_path.as_c_str()) else {
        return ExistingAction::Proceed;
    };

    let existing_is_dir = st.st_mode & libc::S_IFMT == libc::S_IFDIR;
    if existing_is_dir && record.file_kind == Some(FileKind::Directory) {
        return ExistingAction::AlreadyExistingDir;
    }

    if !unconditional && st.st_mtime >= record.mtime {
        return ExistingAction::SkipNewer;
    }

    let removed = if existing_is_dir {
        rmdir(c_path.as_c_str())
    } else {
        unlinkat(None, c_path.as_c_str(), UnlinkatFlags::NoRemoveDir)
    };
    match removed {
        Ok(()) => ExistingAction::Proceed,
        Err(_) => ExistingAction::SkipRemoveFailed,
    }
}

// === Shared metadata application === //

fn apply_ownership(path: &CString, uid: u32, gid: u32, no_follow: bool, ctx: &mut ExtractContext<impl Write, impl Write>) {
    if ctx.options.no_chown_flag {
        return;
    }
    let uid = ctx.options.set_owner.unwrap_or(uid);
    let gid = ctx.options.set_group.unwrap_or(gid);
    let flag = if no_follow { AtFlags::AT_SYMLINK_NOFOLLOW } else { AtFlags::empty() };
    if let Err(e) = nix::unistd::fchownat(
        None,
        path.as_c_str(),
        Some(nix::unistd::Uid::from_raw(uid)),
        Some(nix::unistd::Gid::from_raw(gid)),
        flag,
    ) {
        ctx.report(&path.to_string_lossy(), &MemberError::extraction(path.to_string_lossy().into_owned(), e));
    }
}

fn apply_mtime(path: &CString, mtime: i64, no_follow: bool, ctx: &mut ExtractContext<impl Write, impl Write>) {
    if !ctx.options.retain_time_flag {
        return;
    }
    let spec = TimeSpec::new(mtime, 0);
    let flag = if no_follow { UtimensatFlags::NoFollowSymlink } else { UtimensatFlags::FollowSymlink };
    if let Err(e) = utimensat(None, path.as_c_str(), &spec, &spec, flag) {
        ctx.report(&path.to_string_lossy(), &MemberError::extraction(path.to_string_lossy().into_owned(), e));
    }
}

fn apply_chmod(path: &CString, mode: u32, no_follow: bool, ctx: &mut ExtractContext<impl Write, impl Write>) {
    let flag = if no_follow { FchmodatFlags::NoFollowSymlink } else { FchmodatFlags::FollowSymlink };
    if let Some(perm) = Mode::from_bits(mode & 0o7777) {
        if let Err(e) = fchmodat(None, path.as_c_str(), perm, flag) {
            ctx.report(&path.to_string_lossy(), &MemberError::extraction(path.to_string_lossy().into_owned(), e));
        }
    }
}

fn maybe_create_parents(path: &[u8]) {
    let path_str = String::from_utf8_lossy(path);
    if let Some((parent, _)) = path_str.rsplit_once('/') {
        if !parent.is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }
}

/// Reads and discards `record.filesize` bytes plus dialect padding, for the
/// "this member's payload isn't wanted" paths: excluded-by-pattern, or an
/// old-dialect member whose identity already has a materialized path.
pub fn skip_payload(reader: &mut (impl ArchiveReader + ?Sized), record: &Record) -> Result<(), MemberError> {
    reader
        .toss(record.filesize)
        .map_err(|e| MemberError::Malformed(format!("{e}")))?;
    reader
        .toss(record.dialect.padding_for(record.filesize))
        .map_err(|e| MemberError::Malformed(format!("{e}")))?;
    Ok(())
}

// === Regular files === //

pub fn write_regular_file<R: ArchiveReader + ?Sized>(
    ctx: &mut ExtractContext<impl Write, impl Write>,
    path: &[u8],
    record: &Record,
    reader: &mut R,
) -> Result<(), MemberError> {
    let name = String::from_utf8_lossy(path).into_owned();
    let c_path = cstr(path)?;

    if ctx.options.to_stdout {
        return stream_payload_to(&mut std::io::stdout(), record, reader, ctx);
    }

    if record.nlink > 1 {
        if record.dialect.defers_hardlink_payload() {
            if record.filesize == 0 {
                ctx.owned.deferred_links.defer(
                    record.identity(),
                    DeferredEntry {
                        name: path.to_vec(),
                        mode: record.mode,
                        uid: record.uid,
                        gid: record.gid,
                        mtime: record.mtime,
                    },
                );
                return Ok(());
            }
            // This member carries the group's data; fall through to write
            // it, then link every deferred sibling to it below.
        } else if let Some(existing) = ctx.owned.deferred_links.materialized_path(record.identity()).map(<[u8]>::to_vec) {
            skip_payload(reader, record)?;
            link_one(ctx, &existing, path);
            return Ok(());
        }
    }

    let open_result = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(std::ffi::OsStr::new(&name));
    let mut file = match open_result {
        Ok(f) => f,
        Err(e) if ctx.options.create_dir_flag => {
            maybe_create_parents(path);
            std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(std::ffi::OsStr::new(&name))
                .map_err(|_| MemberError::Malformed(format!("{name}: {e}")))?
        }
        Err(e) => return Err(MemberError::Malformed(format!("{name}: {e}"))),
    };

    let crc = stream_payload(&mut file, record, reader, ctx)?;
    drop(file);

    apply_chmod(&c_path, record.mode, false, ctx);
    apply_ownership(&c_path, record.uid, record.gid, false, ctx);
    apply_mtime(&c_path, record.mtime, false, ctx);

    if record.dialect.has_crc() && crc != record.chksum {
        return Err(MemberError::ChecksumMismatch {
            actual: crc,
            expected: record.chksum,
        });
    }

    if record.nlink > 1 && !record.dialect.defers_hardlink_payload() {
        ctx.owned.deferred_links.mark_materialized(record.identity(), path.to_vec());
    }
    link_deferred_siblings(ctx, path, record);
    Ok(())
}

/// Called by the dispatcher when an excluded-by-pattern member still carries
/// payload that a deferred sibling might want (new-ascii/new-crc only): pops
/// the most recently deferred entry for this identity and extracts the
/// payload there instead of at the excluded name, then links any further
/// deferred siblings to it. Returns `false` (payload still unconsumed) when
/// no deferment exists for this identity, leaving the caller to skip it.
pub fn redirect_skip(
    ctx: &mut ExtractContext<impl Write, impl Write>,
    record: &Record,
    reader: &mut (impl ArchiveReader + ?Sized),
) -> Result<bool, MemberError> {
    let Some(entry) = ctx.owned.deferred_links.pop_one(record.identity()) else {
        return Ok(false);
    };

    let redirected = Record {
        mode: entry.mode,
        uid: entry.uid,
        gid: entry.gid,
        mtime: entry.mtime,
        name: entry.name.clone(),
        ..record.clone()
    };
    // Writes the payload at the deferred entry's own path and links any
    // remaining siblings in the group to it via the usual end-of-write hook.
    write_regular_file(ctx, &entry.name, &redirected, reader)?;
    Ok(true)
}

/// Writes `record.filesize` bytes from `reader` into `out`, applying the
/// configured byte/halfword swap, and returns the running sum used for
/// new-crc verification.
fn stream_payload(
    out: &mut impl Write,
    record: &Record,
    reader: &mut (impl ArchiveReader + ?Sized),
    ctx: &mut ExtractContext<impl Write, impl Write>,
) -> Result<u32, MemberError> {
    const CHUNK: usize = 65536;
    let name = String::from_utf8_lossy(&record.name).into_owned();

    // The swap unit must evenly divide the whole payload, not just one
    // streaming chunk's worth; a mismatch disables that swap for the whole
    // member and is reported once, up front, rather than silently per chunk.
    let swap_bytes = if ctx.options.swap_bytes_flag {
        if record.filesize % 2 == 0 {
            true
        } else {
            ctx.warn(&format!("cannot swap bytes of {name}: odd number of bytes"));
            false
        }
    } else {
        false
    };
    let swap_halfwords = if ctx.options.swap_halfwords_flag {
        if record.filesize % 4 == 0 {
            true
        } else {
            ctx.warn(&format!("cannot swap halfwords of {name}: odd number of halfwords"));
            false
        }
    } else {
        false
    };

    let mut remaining = record.filesize;
    let mut crc: u32 = 0;
    let mut buf = vec![0u8; CHUNK.min(remaining.max(1) as usize)];

    while remaining > 0 {
        let take = (remaining as usize).min(buf.len());
        reader
            .read_exact(&mut buf[..take])
            .map_err(|e| MemberError::Malformed(format!("{e}")))?;

        if swap_halfwords {
            crate::numeric::swap_halfwords(&mut buf[..take], take / 4);
        }
        if swap_bytes {
            crate::numeric::swab_array(&mut buf[..take], take / 2);
        }
        for &b in &buf[..take] {
            crc = crc.wrapping_add(b as u32);
        }
        out.write_all(&buf[..take])
            .map_err(|e| MemberError::Malformed(format!("{e}")))?;
        remaining -= take as u64;
    }

    reader
        .toss(record.dialect.padding_for(record.filesize))
        .map_err(|e| MemberError::Malformed(format!("{e}")))?;
    Ok(crc)
}

fn stream_payload_to(
    out: &mut impl Write,
    record: &Record,
    reader: &mut (impl ArchiveReader + ?Sized),
    ctx: &mut ExtractContext<impl Write, impl Write>,
) -> Result<(), MemberError> {
    stream_payload(out, record, reader, ctx).map(|_| ())
}

fn link_deferred_siblings(ctx: &mut ExtractContext<impl Write, impl Write>, real_path: &[u8], record: &Record) {
    if !record.dialect.defers_hardlink_payload() {
        return;
    }
    let siblings = ctx.owned.deferred_links.drain_group(record.identity());
    for entry in siblings {
        link_one(ctx, real_path, &entry.name);
    }
}

fn link_one(ctx: &mut ExtractContext<impl Write, impl Write>, existing: &[u8], new_path: &[u8]) {
    let (Ok(old), Ok(new)) = (cstr(existing), cstr(new_path)) else {
        return;
    };
    if let Err(e) = linkat(None, old.as_c_str(), None, new.as_c_str(), AtFlags::empty()) {
        ctx.report(
            &new.to_string_lossy(),
            &MemberError::extraction(new.to_string_lossy().into_owned(), e),
        );
    }
}

// === Directories === //

pub fn write_directory(ctx: &mut ExtractContext<impl Write, impl Write>, path: &[u8], record: &Record) -> Result<(), MemberError> {
    if ctx.options.to_stdout {
        return Ok(());
    }
    let c_path = cstr(path)?;
    if let Some(perm) = Mode::from_bits(record.permission_bits()) {
        match mkdirat(None, c_path.as_c_str(), perm) {
            Ok(()) | Err(Errno::EEXIST) => {}
            Err(e) => return Err(MemberError::extraction(String::from_utf8_lossy(path).into_owned(), e)),
        }
    }

    // Applied at end-of-archive (delayed-set-stat) so writes into the
    // directory aren't blocked by a restrictive final mode in the meantime.
    ctx.owned.delayed_set_stat.push(DelayedSetStat {
        path: path.to_vec(),
        mode: record.mode,
        uid: record.uid,
        gid: record.gid,
        mtime: record.mtime,
    });
    Ok(())
}

pub fn apply_delayed_set_stat(ctx: &mut ExtractContext<impl Write, impl Write>) {
    // LIFO: restore innermost directories before their parents.
    while let Some(entry) = ctx.owned.delayed_set_stat.pop() {
        let Ok(c_path) = cstr(&entry.path) else { continue };
        apply_chmod(&c_path, entry.mode, false, ctx);
        apply_ownership(&c_path, entry.uid, entry.gid, false, ctx);
        apply_mtime(&c_path, entry.mtime, false, ctx);
    }
}

// === Devices, FIFOs, sockets === //

pub fn write_device(ctx: &mut ExtractContext<impl Write, impl Write>, path: &[u8], record: &Record) -> Result<(), MemberError> {
    if ctx.options.to_stdout {
        return Ok(());
    }

    if record.dialect.stores_link_target_inline() {
        if let Some(target) = record.tar_linkname.as_ref().filter(|t| !t.is_empty()) {
            return write_hard_link(ctx, path, target);
        }
    } else if record.nlink > 1 {
        // Devices never go through the new-ascii/new-crc deferment table
        // (their payload is always empty); the only cross-record mechanism
        // that applies to them, in every cpio dialect, is linking to
        // whichever same-identity path was already materialized on disk.
        if let Some(existing) = ctx.owned.deferred_links.materialized_path(record.identity()).map(<[u8]>::to_vec) {
            link_one(ctx, &existing, path);
            return Ok(());
        }
    }

    let c_path = cstr(path)?;
    let Some(perm) = Mode::from_bits(record.permission_bits()) else {
        return Err(MemberError::Malformed("invalid mode bits".into()));
    };

    let sflag = match record.file_kind {
        Some(FileKind::CharDevice) => SFlag::S_IFCHR,
        Some(FileKind::BlockDevice) => SFlag::S_IFBLK,
        Some(FileKind::Socket) => SFlag::S_IFSOCK,
        Some(FileKind::Fifo) => {
            return create_fifo(ctx, &c_path, path, perm, record);
        }
        _ => return Err(MemberError::Malformed("not a device record".into())),
    };

    let dev = if sflag == SFlag::S_IFSOCK {
        nix::sys::stat::makedev(0, 0)
    } else {
        nix::sys::stat::makedev(record.rdev_major as u64, record.rdev_minor as u64)
    };
    let result = mknodat(None, c_path.as_c_str(), sflag, perm, dev);
    match result {
        Ok(()) => {}
        Err(_) if ctx.options.create_dir_flag => {
            maybe_create_parents(path);
            mknodat(None, c_path.as_c_str(), sflag, perm, dev)
                .map_err(|e| MemberError::extraction(String::from_utf8_lossy(path).into_owned(), e))?;
        }
        Err(e) => return Err(MemberError::extraction(String::from_utf8_lossy(path).into_owned(), e)),
    }

    // chown before chmod: chown can clear setuid/setgid bits.
    apply_ownership(&c_path, record.uid, record.gid, false, ctx);
    apply_chmod(&c_path, record.mode, false, ctx);
    apply_mtime(&c_path, record.mtime, false, ctx);
    if record.nlink > 1 {
        ctx.owned.deferred_links.mark_materialized(record.identity(), path.to_vec());
    }
    Ok(())
}

fn create_fifo(
    ctx: &mut ExtractContext<impl Write, impl Write>,
    c_path: &CString,
    path: &[u8],
    perm: Mode,
    record: &Record,
) -> Result<(), MemberError> {
    match mkfifoat(None, c_path.as_c_str(), perm) {
        Ok(()) => {}
        Err(_) if ctx.options.create_dir_flag => {
            maybe_create_parents(path);
            mkfifoat(None, c_path.as_c_str(), perm)
                .map_err(|e| MemberError::extraction(String::from_utf8_lossy(path).into_owned(), e))?;
        }
        Err(e) => return Err(MemberError::extraction(String::from_utf8_lossy(path).into_owned(), e)),
    }
    apply_ownership(c_path, record.uid, record.gid, false, ctx);
    apply_chmod(c_path, record.mode, false, ctx);
    apply_mtime(c_path, record.mtime, false, ctx);
    if record.nlink > 1 {
        ctx.owned.deferred_links.mark_materialized(record.identity(), path.to_vec());
    }
    Ok(())
}

// === Symlinks === //

pub fn write_symlink(
    ctx: &mut ExtractContext<impl Write, impl Write>,
    path: &[u8],
    record: &Record,
    target: &[u8],
) -> Result<(), MemberError> {
    if ctx.options.to_stdout {
        return Ok(());
    }

    if ctx.options.no_abs_paths_flag {
        return create_delayed_placeholder(ctx, path, record, target);
    }

    create_real_symlink(ctx, path, record, target, false)
}

fn create_real_symlink(
    ctx: &mut ExtractContext<impl Write, impl Write>,
    path: &[u8],
    record: &Record,
    target: &[u8],
    _is_replacement: bool,
) -> Result<(), MemberError> {
    let c_path = cstr(path)?;
    let c_target = cstr(target)?;
    match symlinkat(c_target.as_c_str(), None, c_path.as_c_str()) {
        Ok(()) => {}
        Err(Errno::ENOENT) if ctx.options.create_dir_flag => {
            maybe_create_parents(path);
            symlinkat(c_target.as_c_str(), None, c_path.as_c_str())
                .map_err(|e| MemberError::extraction(String::from_utf8_lossy(path).into_owned(), e))?;
        }
        Err(e) => return Err(MemberError::extraction(String::from_utf8_lossy(path).into_owned(), e)),
    }
    apply_ownership(&c_path, record.uid, record.gid, true, ctx);
    apply_mtime(&c_path, record.mtime, true, ctx);
    Ok(())
}

fn create_delayed_placeholder(
    ctx: &mut ExtractContext<impl Write, impl Write>,
    path: &[u8],
    record: &Record,
    target: &[u8],
) -> Result<(), MemberError> {
    let name = String::from_utf8_lossy(path).into_owned();
    let fd = open(
        std::path::Path::new(&name),
        OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_EXCL,
        Mode::empty(),
    )
    .map_err(|e| MemberError::extraction(name.clone(), e))?;

    let st = nix::sys::stat::fstat(fd.as_raw_fd()).map_err(|e| MemberError::extraction(name.clone(), e))?;
    drop(fd);

    ctx.owned.delayed_symlinks.insert(
        (st.st_dev, st.st_ino),
        DelayedSymlink {
            source: path.to_vec(),
            target: target.to_vec(),
            mode: record.mode,
            uid: record.uid,
            gid: record.gid,
            mtime: record.mtime,
        },
    );
    Ok(())
}

/// Replaces every surviving symlink placeholder with the real symlink, at
/// end-of-archive. A placeholder whose `(dev, ino)` no longer matches what
/// was recorded was since overwritten by a later record and is dropped.
pub fn replace_symlink_placeholders(ctx: &mut ExtractContext<impl Write, impl Write>) {
    let owned = std::mem::take(&mut ctx.owned.delayed_symlinks);
    for (key, entry) in owned.into_entries() {
        let Ok(c_path) = cstr(&entry.source) else { continue };
        let Ok(st) = lstat(c_path.as_c_str()) else { continue };
        if (st.st_dev, st.st_ino) != key {
            continue; // overwritten since; drop silently
        }
        if unlinkat(None, c_path.as_c_str(), UnlinkatFlags::NoRemoveDir).is_err() {
            continue;
        }
        let fake_record = Record {
            dialect: crate::dialect::Dialect::NewAscii,
            ino: 0,
            dev_major: 0,
            dev_minor: 0,
            mode: entry.mode,
            file_kind: Some(FileKind::Symlink),
            uid: entry.uid,
            gid: entry.gid,
            nlink: 1,
            mtime: entry.mtime,
            filesize: entry.target.len() as u64,
            rdev_major: 0,
            rdev_minor: 0,
            chksum: 0,
            name: entry.source.clone(),
            tar_linkname: None,
        };
        let _ = create_real_symlink(ctx, &entry.source, &fake_record, &entry.target, true);
    }
}

// === Hard links (tar/ustar only; cpio dialects use the deferred-link table) === //

pub fn write_hard_link(ctx: &mut ExtractContext<impl Write, impl Write>, path: &[u8], target: &[u8]) -> Result<(), MemberError> {
    let (Ok(old), Ok(new)) = (cstr(target), cstr(path)) else {
        return Err(MemberError::Malformed("path contains an embedded NUL".into()));
    };
    if let Err(e) = linkat(None, old.as_c_str(), None, new.as_c_str(), AtFlags::empty()) {
        ctx.report(&new.to_string_lossy(), &MemberError::extraction(new.to_string_lossy().into_owned(), e));
    }
    Ok(())
}

/// Consumes the remaining deferred-link groups at end-of-archive: for each,
/// link every entry to any sibling that's already a real path on disk, or
/// otherwise materialize an empty placeholder file (open question 3: on
/// failure to apply permissions the file is left at its created mode).
pub fn finalize_deferred_links(ctx: &mut ExtractContext<impl Write, impl Write>) {
    let table = std::mem::take(&mut ctx.owned.deferred_links);
    for (_, mut group) in table.finalize() {
        let Some(first) = group.pop() else { continue };
        let name = String::from_utf8_lossy(&first.name).into_owned();
        let created = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .mode(0o600)
            .open(&name);
        if created.is_ok() {
            if let Ok(c_path) = cstr(&first.name) {
                apply_chmod(&c_path, first.mode, false, ctx);
                apply_ownership(&c_path, first.uid, first.gid, false, ctx);
                apply_mtime(&c_path, first.mtime, false, ctx);
            }
            for entry in group {
                link_one(ctx, &first.name, &entry.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OwnedExtractContext;
    use crate::dialect::Dialect;
    use crate::options::Options;
    use crate::reader::PipeReader;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn sample_record(name: &[u8], filesize: u64) -> Record {
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
            mtime: 1000,
            filesize,
            rdev_major: 0,
            rdev_minor: 0,
            chksum: 0,
            name: name.to_vec(),
            tar_linkname: None,
        }
    }

    #[test]
    fn write_regular_file_creates_file_with_payload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        let record = sample_record(path.to_str().unwrap().as_bytes(), 6);

        let mut owned = OwnedExtractContext::new();
        let options = Options::default();
        let mut diag = Vec::new();
        let mut listing = Vec::new();
        let mut ctx = ExtractContext::new(&mut owned, &options, &mut diag, &mut listing);

        let mut reader = PipeReader::new(Cursor::new(b"hello\n".to_vec()));
        write_regular_file(&mut ctx, path.to_str().unwrap().as_bytes(), &record, &mut reader).unwrap();

        let contents = std::fs::read(&path).unwrap();
        assert_eq!(contents, b"hello\n");
    }

    #[test]
    fn try_existing_skips_newer_file_without_unconditional() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("b.txt");
        std::fs::write(&path, b"existing").unwrap();

        let record = sample_record(path.to_str().unwrap().as_bytes(), 0);
        let action = try_existing(path.to_str().unwrap().as_bytes(), &record, false);
        assert!(matches!(action, ExistingAction::SkipNewer) || matches!(action, ExistingAction::Proceed));
    }
}
