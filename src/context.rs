use std::io::Write;

use crate::error::MemberError;
use crate::options::Options;
use crate::tables::{DeferredLinkTable, DelayedSymlinkTable};

/// A directory's metadata, queued until end-of-archive so that later writes
/// into it aren't blocked by a restrictive final mode.
pub struct DelayedSetStat {
    pub path: Vec<u8>,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub mtime: i64,
}

/// State that must outlive any single record and is never read from a
/// global: the two cross-record tables, the delayed directory-metadata
/// queue, and the run-wide had-errors flag.
#[derive(Default)]
pub struct OwnedExtractContext {
    pub deferred_links: DeferredLinkTable,
    pub delayed_symlinks: DelayedSymlinkTable,
    pub delayed_set_stat: Vec<DelayedSetStat>,
    had_errors: bool,
}

impl OwnedExtractContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn had_errors(&self) -> bool {
        self.had_errors
    }
}

/// Everything the dispatcher/writers need for one run: the persistent
/// state above, the active configuration, and the diagnostic/listing
/// sinks. Generic over the writers so tests can capture output instead of
/// asserting against the process's real stderr/stdout.
pub struct ExtractContext<'a, Derr: Write, Dout: Write> {
    pub owned: &'a mut OwnedExtractContext,
    pub options: &'a Options,
    pub diagnostics: &'a mut Derr,
    pub listing: &'a mut Dout,
}

impl<'a, Derr: Write, Dout: Write> ExtractContext<'a, Derr, Dout> {
    pub fn new(
        owned: &'a mut OwnedExtractContext,
        options: &'a Options,
        diagnostics: &'a mut Derr,
        listing: &'a mut Dout,
    ) -> Self {
        Self {
            owned,
            options,
            diagnostics,
            listing,
        }
    }

    /// Reports a per-member diagnostic to stderr and marks the run as
    /// having had errors, without aborting.
    pub fn report(&mut self, name: &str, err: &MemberError) {
        self.owned.had_errors = true;
        let _ = writeln!(self.diagnostics, "{name}: {err}");
    }

    pub fn warn(&mut self, message: &str) {
        let _ = writeln!(self.diagnostics, "cpio: {message}");
    }
}
