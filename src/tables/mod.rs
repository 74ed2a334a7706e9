pub mod deferred_link;
pub mod delayed_symlink;

pub use deferred_link::DeferredLinkTable;
pub use delayed_symlink::DelayedSymlinkTable;
