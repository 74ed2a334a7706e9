//! C7: per-record decision tree. Given a freshly decoded [`Record`], decide
//! whether to skip it, list it, verify its checksum, or extract it, and
//! dispatch to the right [`crate::writers`] entry point. Nothing here
//! touches the filesystem directly except through those writers.

use std::io::{BufRead, Write};

use crate::context::ExtractContext;
use crate::error::MemberError;
use crate::header::{FileKind, Record};
use crate::listing::long_format;
use crate::pattern::any_match;
use crate::reader::ArchiveReader;
use crate::rename::{self, RenameOutcome};
use crate::writers;

/// What [`sanitize_name`] decided about a record's path before it reaches
/// the filter or a writer.
enum Sanitized {
    Ok(Vec<u8>),
    Rejected(MemberError),
}

/// Strips a leading `/` (repeated) unless absolute paths are allowed, and
/// rejects any name containing a `..` component when that stripping
/// happened — an archive shouldn't be able to escape the extraction
/// directory by combining both tricks.
fn sanitize_name(name: &[u8], no_abs_paths: bool) -> Sanitized {
    let mut start = 0;
    if no_abs_paths {
        while start < name.len() && name[start] == b'/' {
            start += 1;
        }
    }
    let stripped = &name[start..];

    if no_abs_paths {
        let has_dotdot = stripped
            .split(|&b| b == b'/')
            .any(|component| component == b"..");
        if has_dotdot {
            return Sanitized::Rejected(MemberError::Malformed(
                "name contains '..' path component".to_string(),
            ));
        }
    }

    Sanitized::Ok(stripped.to_vec())
}

/// Whether a sanitized name passes the pattern filter, per §4.7 step 4: no
/// patterns means everything is included; otherwise `copy_matching_files`
/// (the default) includes only matches, and its negation excludes matches.
fn passes_pattern_filter(patterns: &[String], copy_matching: bool, name: &[u8]) -> bool {
    if patterns.is_empty() {
        return true;
    }
    let matched = any_match(patterns, name);
    if copy_matching {
        matched
    } else {
        !matched
    }
}

/// Processes one decoded record: sanitizes and filters its name, then
/// skips, lists, verifies, or extracts it per the active [`crate::options::Options`].
/// `reader` must be positioned at the start of the record's payload.
pub fn dispatch_record<Derr: Write, Dout: Write>(
    ctx: &mut ExtractContext<Derr, Dout>,
    record: &Record,
    reader: &mut (impl ArchiveReader + ?Sized),
    rename_input: &mut Option<&mut dyn BufRead>,
    now: i64,
) -> Result<(), MemberError> {
    if record.name.is_empty() {
        return writers::skip_payload(reader, record);
    }

    let sanitized = match sanitize_name(&record.name, ctx.options.no_abs_paths_flag) {
        Sanitized::Ok(name) => name,
        Sanitized::Rejected(err) => {
            writers::skip_payload(reader, record)?;
            return Err(err);
        }
    };

    let included = passes_pattern_filter(&ctx.options.patterns, ctx.options.copy_matching_files, &sanitized);

    if !included {
        if record.dialect.defers_hardlink_payload() && record.nlink > 1 && record.filesize > 0 {
            if writers::redirect_skip(ctx, record, reader)? {
                return Ok(());
            }
        }
        return writers::skip_payload(reader, record);
    }

    if ctx.options.table_flag {
        list_one(ctx, record, &sanitized, now);
        let verify_result = if ctx.options.only_verify_crc_flag {
            verify_crc(reader, record)
        } else {
            writers::skip_payload(reader, record)
        };
        return verify_result;
    }

    if ctx.options.only_verify_crc_flag {
        return verify_crc(reader, record);
    }

    // Only the extraction branch offers the rename channel: listed,
    // verified, and filtered-out members are never renamed.
    let mut sanitized = sanitized;
    if ctx.options.rename_flag {
        let outcome = match rename_input.as_deref_mut() {
            Some(input) => rename::prompt_rename(
                input,
                ctx.diagnostics,
                &sanitized,
                ctx.options.rename_batch_file.is_none(),
            )
            .map_err(|e| MemberError::Malformed(format!("{e}")))?,
            None => RenameOutcome::Unchanged,
        };
        match outcome {
            RenameOutcome::Skip => return writers::skip_payload(reader, record),
            RenameOutcome::Renamed(new_name) => sanitized = new_name,
            RenameOutcome::Unchanged => {}
        }
    }

    extract_one(ctx, record, &sanitized, reader, now)
}

fn list_one<Derr: Write, Dout: Write>(ctx: &mut ExtractContext<Derr, Dout>, record: &Record, name: &[u8], now: i64) {
    if ctx.options.verbose_flag {
        let mut shown = record.clone();
        shown.name = name.to_vec();
        let _ = writeln!(ctx.listing, "{}", long_format(&shown, ctx.options.numeric_uid, now));
    } else {
        let _ = ctx.listing.write_all(name);
        let _ = ctx.listing.write_all(&[ctx.options.name_end]);
    }
}

/// Sums the payload while discarding it, reporting a mismatch for new-crc
/// records. Non-crc dialects still skip the payload but the sum is
/// meaningless, matching the original's "verify" mode applying uniformly.
fn verify_crc(reader: &mut (impl ArchiveReader + ?Sized), record: &Record) -> Result<(), MemberError> {
    const CHUNK: usize = 65536;
    let mut remaining = record.filesize;
    let mut buf = vec![0u8; CHUNK.min(remaining.max(1) as usize)];
    let mut crc: u32 = 0;
    while remaining > 0 {
        let take = (remaining as usize).min(buf.len());
        reader
            .read_exact(&mut buf[..take])
            .map_err(|e| MemberError::Malformed(format!("{e}")))?;
        for &b in &buf[..take] {
            crc = crc.wrapping_add(b as u32);
        }
        remaining -= take as u64;
    }
    reader
        .toss(record.dialect.padding_for(record.filesize))
        .map_err(|e| MemberError::Malformed(format!("{e}")))?;

    if record.dialect.has_crc() && crc != record.chksum {
        return Err(MemberError::ChecksumMismatch {
            actual: crc,
            expected: record.chksum,
        });
    }
    Ok(())
}

fn extract_one<Derr: Write, Dout: Write>(
    ctx: &mut ExtractContext<Derr, Dout>,
    record: &Record,
    name: &[u8],
    reader: &mut (impl ArchiveReader + ?Sized),
    now: i64,
) -> Result<(), MemberError> {
    let _ = now; // reserved for a future rename-channel timestamp echo

    if !ctx.options.to_stdout {
        match writers::try_existing(name, record, ctx.options.unconditional_flag) {
            writers::ExistingAction::AlreadyExistingDir => {
                return writers::skip_payload(reader, record);
            }
            writers::ExistingAction::SkipNewer => {
                ctx.warn(&format!(
                    "{}: not created: newer or same age version exists",
                    String::from_utf8_lossy(name)
                ));
                return writers::skip_payload(reader, record);
            }
            writers::ExistingAction::SkipRemoveFailed => {
                ctx.warn(&format!("{}: cannot remove existing file", String::from_utf8_lossy(name)));
                return writers::skip_payload(reader, record);
            }
            writers::ExistingAction::Proceed => {}
        }
    }

    if ctx.options.verbose_flag {
        let _ = writeln!(ctx.diagnostics, "{}", String::from_utf8_lossy(name));
    } else if ctx.options.dot_flag {
        let _ = write!(ctx.diagnostics, ".");
    }

    match record.file_kind {
        Some(FileKind::Directory) => writers::write_directory(ctx, name, record),
        Some(FileKind::Symlink) => {
            let target = read_symlink_target(record, reader)?;
            writers::write_symlink(ctx, name, record, &target)
        }
        Some(FileKind::CharDevice)
        | Some(FileKind::BlockDevice)
        | Some(FileKind::Fifo)
        | Some(FileKind::Socket) => writers::write_device(ctx, name, record),
        Some(FileKind::Regular) => {
            if record.dialect.stores_link_target_inline() {
                if let Some(target) = record.tar_linkname.as_ref().filter(|t| !t.is_empty()) {
                    return writers::write_hard_link(ctx, name, target);
                }
            }
            writers::write_regular_file(ctx, name, record, reader)
        }
        None => {
            writers::skip_payload(reader, record)?;
            Err(MemberError::Malformed("unknown file type".to_string()))
        }
    }
}

/// For cpio dialects, a symlink's target is the record's payload bytes; for
/// tar/ustar it travels inline as `tar_linkname` and there's no payload to
/// read.
fn read_symlink_target(record: &Record, reader: &mut (impl ArchiveReader + ?Sized)) -> Result<Vec<u8>, MemberError> {
    if record.dialect.stores_link_target_inline() {
        return Ok(record.tar_linkname.clone().unwrap_or_default());
    }
    let mut buf = vec![0u8; record.filesize as usize];
    reader
        .read_exact(&mut buf)
        .map_err(|e| MemberError::Malformed(format!("{e}")))?;
    reader
        .toss(record.dialect.padding_for(record.filesize))
        .map_err(|e| MemberError::Malformed(format!("{e}")))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_leading_slashes_when_forbidden() {
        match sanitize_name(b"///etc/passwd", true) {
            Sanitized::Ok(name) => assert_eq!(name, b"etc/passwd"),
            Sanitized::Rejected(_) => panic!("should not reject a plain absolute path"),
        }
    }

    #[test]
    fn sanitize_keeps_leading_slash_when_allowed() {
        match sanitize_name(b"/etc/passwd", false) {
            Sanitized::Ok(name) => assert_eq!(name, b"/etc/passwd"),
            Sanitized::Rejected(_) => panic!("absolute paths are allowed here"),
        }
    }

    #[test]
    fn sanitize_rejects_dotdot_when_forbidden() {
        match sanitize_name(b"/../etc/passwd", true) {
            Sanitized::Ok(_) => panic!("should reject a path escaping the root"),
            Sanitized::Rejected(_) => {}
        }
    }

    #[test]
    fn pattern_filter_include_mode() {
        let patterns = vec!["*.txt".to_string()];
        assert!(passes_pattern_filter(&patterns, true, b"a.txt"));
        assert!(!passes_pattern_filter(&patterns, true, b"a.rs"));
    }

    #[test]
    fn pattern_filter_exclude_mode() {
        let patterns = vec!["*.txt".to_string()];
        assert!(!passes_pattern_filter(&patterns, false, b"a.txt"));
        assert!(passes_pattern_filter(&patterns, false, b"a.rs"));
    }
}
