use std::collections::HashMap;

pub type PlaceholderKey = (u64, u64); // (dev, ino) of the placeholder file

pub struct DelayedSymlink {
    pub source: Vec<u8>,
    pub target: Vec<u8>,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub mtime: i64,
}

/// Placeholder-and-replace bookkeeping for symlinks created under "no
/// absolute paths" mode. A zero-permission empty regular file stands in for
/// the symlink until end-of-archive so that an absolute target is never
/// visible on disk, even momentarily.
#[derive(Default)]
pub struct DelayedSymlinkTable {
    entries: HashMap<PlaceholderKey, DelayedSymlink>,
}

impl DelayedSymlinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: PlaceholderKey, entry: DelayedSymlink) {
        self.entries.insert(key, entry);
    }

    /// Consumes the table at end-of-archive; the caller is responsible for
    /// re-checking each placeholder's identity before replacing it, since a
    /// later record may have overwritten it in the meantime.
    pub fn into_entries(self) -> Vec<(PlaceholderKey, DelayedSymlink)> {
        self.entries.into_iter().collect()
    }
}
