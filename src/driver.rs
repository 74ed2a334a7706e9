//! C9: the top-level driver. Ties format detection, the per-dialect and
//! tar/ustar decode loops, the C7 dispatcher, and end-of-archive
//! finalization together into the state machine in the design notes:
//!
//! ```text
//! INIT -> READ_HEADER -> CLASSIFY
//! CLASSIFY --trailer--> DONE
//! CLASSIFY --skip--> CONSUME_PAYLOAD -> READ_HEADER
//! CLASSIFY --list/verify/extract--> DO_IT -> READ_HEADER
//! DONE -> FINALIZE
//! ```

use std::io::{BufRead, Write};

use crate::context::{ExtractContext, OwnedExtractContext};
use crate::dialect::Dialect;
use crate::dispatcher;
use crate::header;
use crate::options::Options;
use crate::reader::ArchiveReader;
use crate::tar_adapter;

pub struct RunOutcome {
    pub had_errors: bool,
    pub block_count: u64,
}

/// Resets the process umask to 0 for the duration of one run and restores
/// the caller's prior value on drop, so that an early return from a fatal
/// stream error (`?` on `detect_format`/`run_cpio`/`run_tar`) can't leave the
/// umask permanently zeroed out from underneath the rest of the process.
struct UmaskGuard {
    previous: libc::mode_t,
}

impl UmaskGuard {
    fn reset_to_zero() -> Self {
        let previous = unsafe { libc::umask(0) };
        Self { previous }
    }
}

impl Drop for UmaskGuard {
    fn drop(&mut self) {
        unsafe {
            libc::umask(self.previous);
        }
    }
}

/// Picks the transport implementation the way the original distinguishes a
/// seekable regular file from a pipe or tape device: `fstat` the descriptor
/// and only hand out the seeking reader for `S_ISREG`.
pub fn choose_reader(file: std::fs::File) -> Box<dyn ArchiveReader> {
    use std::os::fd::AsRawFd;
    let is_regular = nix::sys::stat::fstat(file.as_raw_fd())
        .map(|st| st.st_mode & libc::S_IFMT as u32 == libc::S_IFREG as u32)
        .unwrap_or(false);
    if is_regular {
        Box::new(crate::reader::SeekableReader::new(file))
    } else {
        Box::new(crate::reader::PipeReader::new(file))
    }
}

/// Runs one archive through to completion: loads the pattern file if one is
/// configured, resets the umask so mode bits from the archive apply
/// verbatim, detects the wire format, dispatches every record, and finalizes
/// the two cross-record tables and the delayed directory metadata queue.
/// Returns the run's had-errors flag and the final block count; only a fatal
/// stream-level failure (the archive couldn't be framed into records at all)
/// propagates as an `Err`.
pub fn run<Derr: Write, Dout: Write>(
    reader: &mut dyn ArchiveReader,
    options: &Options,
    diagnostics: &mut Derr,
    listing: &mut Dout,
    mut rename_input: Option<&mut dyn BufRead>,
    now: i64,
) -> anyhow::Result<RunOutcome> {
    let mut effective = options.clone();
    if let Some(path) = &options.pattern_file_name {
        let file = std::fs::File::open(path)?;
        effective.patterns.extend(crate::pattern::load_pattern_file(file)?);
    }

    // Mode bits from the archive should apply verbatim; the previous umask
    // would otherwise silently mask them out during mkdir/open/mknod.
    // Restored via `UmaskGuard` on every exit path, including a fatal error.
    let _umask_guard = UmaskGuard::reset_to_zero();

    let mut owned = OwnedExtractContext::new();
    let mut ctx = ExtractContext::new(&mut owned, &effective, diagnostics, listing);

    let detected = header::detect_format(reader)?;
    if detected.junk_skipped > 0 {
        ctx.warn(&format!("{} bytes of junk skipped", detected.junk_skipped));
    }

    let result = if matches!(detected.dialect, Dialect::Tar | Dialect::Ustar) {
        run_tar(&mut ctx, reader, detected.dialect, &mut rename_input, now)
    } else {
        if detected.swap_binary {
            ctx.warn("archive header has reverse byte order");
        }
        run_cpio(&mut ctx, reader, detected.dialect, detected.swap_binary, &mut rename_input, now)
    };
    result?;

    crate::writers::replace_symlink_placeholders(&mut ctx);
    crate::writers::apply_delayed_set_stat(&mut ctx);
    if detected.dialect.defers_hardlink_payload() {
        crate::writers::finalize_deferred_links(&mut ctx);
    }

    drop(_umask_guard);

    let had_errors = ctx.owned.had_errors();
    let block_count = (reader.input_bytes() + effective.io_block_size.max(1) - 1) / effective.io_block_size.max(1);
    if !effective.quiet_flag {
        writeln!(ctx.diagnostics, "{block_count} block(s)")?;
    }

    Ok(RunOutcome { had_errors, block_count })
}

fn run_cpio<Derr: Write, Dout: Write>(
    ctx: &mut ExtractContext<Derr, Dout>,
    reader: &mut dyn ArchiveReader,
    dialect: Dialect,
    swap: bool,
    rename_input: &mut Option<&mut dyn BufRead>,
    now: i64,
) -> anyhow::Result<()> {
    loop {
        let (record, decode_err, out_of_range) = header::decode_one(dialect, reader, swap)?;

        if out_of_range {
            ctx.report(
                &String::from_utf8_lossy(&record.name),
                &crate::error::MemberError::OutOfRange("numeric header field out of range".to_string()),
            );
        }

        if let Some(err) = decode_err {
            ctx.report(&String::from_utf8_lossy(&record.name), &err);
            crate::writers::skip_payload(reader, &record).ok();
            continue;
        }

        if record.is_trailer() {
            return Ok(());
        }

        if let Err(err) = dispatcher::dispatch_record(ctx, &record, reader, rename_input, now) {
            ctx.report(&String::from_utf8_lossy(&record.name), &err);
        }
    }
}

fn run_tar<Derr: Write, Dout: Write>(
    ctx: &mut ExtractContext<Derr, Dout>,
    reader: &mut dyn ArchiveReader,
    dialect: Dialect,
    rename_input: &mut Option<&mut dyn BufRead>,
    now: i64,
) -> anyhow::Result<()> {
    let _ = dialect; // Ustar vs. plain tar only changes the record's own field, decoded per-entry below.
    let mut archive = tar::Archive::new(tar_adapter::AsStdRead::new(reader));
    let mut entries = archive.entries()?;
    while let Some(entry) = entries.next() {
        let entry = entry?;
        let (record, mut payload) = tar_adapter::decode_tar_entry(entry)?;
        if let Err(err) = dispatcher::dispatch_record(ctx, &record, &mut payload, rename_input, now) {
            ctx.report(&String::from_utf8_lossy(&record.name), &err);
        }
    }
    Ok(())
}
