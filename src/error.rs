/// A single non-fatal diagnostic raised while processing one archive member.
///
/// These never abort the run; the driver reports them through
/// [`crate::context::ExtractContext::report`] and folds them into the
/// run-wide had-errors flag. Only [`anyhow::Error`] (propagated with `?` out
/// of the reader) represents the fatal, run-aborting case.
#[derive(thiserror::Error, Debug)]
pub enum MemberError {
    #[error("{0}")]
    Malformed(String),

    #[error("{path}: {source}")]
    Extraction { path: String, source: nix::Error },

    #[error("checksum error (0x{actual:08x}, should be 0x{expected:08x})")]
    ChecksumMismatch { actual: u32, expected: u32 },

    #[error("{0}")]
    OutOfRange(String),
}

impl MemberError {
    pub fn extraction(path: impl Into<String>, source: nix::Error) -> Self {
        MemberError::Extraction {
            path: path.into(),
            source,
        }
    }
}

/// A fatal stream-level failure: the input could not even be framed into
/// records. This is the only error category that aborts the run.
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    #[error("premature end of file")]
    PrematureEof,

    #[error("not enough input for header")]
    ShortHeader,

    #[error("i/o error reading archive: {0}")]
    Io(#[from] std::io::Error),
}
