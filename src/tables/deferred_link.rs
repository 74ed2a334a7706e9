use std::collections::HashMap;

use smallvec::SmallVec;

pub type Identity = (u64, u32, u32);

#[derive(Clone)]
pub struct DeferredEntry {
    pub name: Vec<u8>,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub mtime: i64,
}

/// Cross-record bookkeeping for new-ascii/new-crc hard-link groups whose
/// payload is attached to only one member. Entries for a given identity are
/// kept in a small inline vector (groups are rarely larger than 2-3 links)
/// and examined LIFO, matching the original's linked-list iteration order.
///
/// Also doubles as the bookkeeping for old-ascii/old-binary's simpler
/// immediate-link trick (Design Notes open question 2): `materialized`
/// remembers the first real path written for a given identity so later
/// same-identity members can hard-link to it instead of writing the
/// payload again. That trick only works because those dialects attach
/// payload to every occurrence of a link, not just the last one.
#[derive(Default)]
pub struct DeferredLinkTable {
    groups: HashMap<Identity, SmallVec<[DeferredEntry; 2]>>,
    materialized: HashMap<Identity, Vec<u8>>,
}

impl DeferredLinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `identity` now has a real file on disk at `path`, for
    /// old-ascii/old-binary's immediate-link trick.
    pub fn mark_materialized(&mut self, identity: Identity, path: Vec<u8>) {
        self.materialized.entry(identity).or_insert(path);
    }

    pub fn materialized_path(&self, identity: Identity) -> Option<&[u8]> {
        self.materialized.get(&identity).map(|v| v.as_slice())
    }

    pub fn defer(&mut self, identity: Identity, entry: DeferredEntry) {
        self.groups.entry(identity).or_default().push(entry);
    }

    /// Pops the most recently deferred entry for `identity`, for the
    /// "excluded member happens to be the data carrier" redirect case: its
    /// name becomes the real extraction path, and any further entries for
    /// the same identity are left behind to be linked to it once it exists.
    pub fn pop_one(&mut self, identity: Identity) -> Option<DeferredEntry> {
        let entries = self.groups.get_mut(&identity)?;
        let popped = entries.pop();
        if entries.is_empty() {
            self.groups.remove(&identity);
        }
        popped
    }

    /// Drains every entry deferred for `identity`, in LIFO order, for the
    /// ordinary case: a data-bearing member of the group was just
    /// extracted and every sibling link should point at it.
    pub fn drain_group(&mut self, identity: Identity) -> SmallVec<[DeferredEntry; 2]> {
        self.groups.remove(&identity).unwrap_or_default()
    }

    /// Consumes the table at end-of-archive, returning every remaining
    /// group whose members never received data (all links stayed empty).
    pub fn finalize(self) -> Vec<(Identity, SmallVec<[DeferredEntry; 2]>)> {
        self.groups.into_iter().collect()
    }
}
