use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when reading or charting benchmark logs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A log file name does not follow the `<machine>-<runtime><version>-<mode>` pattern.
    #[error("cannot parse log name '{file}': expected '<machine>-<runtime><version>-<mode>'")]
    InvalidFileName {
        /// The file name (or stem) that could not be parsed.
        file: String,
    },

    /// A log did not contain the expected number of timing blocks.
    #[error("expected {expected} blocks, got {actual} in {}", .file.display())]
    UnexpectedBlockCount {
        /// The log file.
        file: PathBuf,

        /// The number of blocks every log must contain.
        expected: usize,

        /// The number of blocks found in the file.
        actual: usize,
    },

    /// A timing block has measurements that do not line up.
    #[error(
        "block '{title}' in {} has {workers} worker counts for {elapsed} elapsed times",
        .file.display()
    )]
    InconsistentBlock {
        /// The log file.
        file: PathBuf,

        /// Title of the offending block.
        title: String,

        /// Number of worker counts found in the block.
        workers: usize,

        /// Number of elapsed times found in the block.
        elapsed: usize,
    },

    /// The results directory holds no log files.
    #[error("no .log files found in {}", .dir.display())]
    NoLogFiles {
        /// The directory that was searched.
        dir: PathBuf,
    },

    /// A file or directory could not be read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// The file or directory being accessed.
        path: PathBuf,

        /// The underlying I/O error.
        source: io::Error,
    },

    /// A chart could not be drawn.
    #[error("failed to render chart {}: {message}", .path.display())]
    Render {
        /// The image that was being rendered.
        path: PathBuf,

        /// Description of the drawing failure.
        message: String,
    },

    /// The requested image format is not one the renderer supports.
    #[error("chart format '{0}' is not supported")]
    UnsupportedFormat(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A specialized `Result` type for log operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn block_count_error_states_expected_and_actual() {
        let error = Error::UnexpectedBlockCount {
            file: PathBuf::from("results/m-python3.14-GIL.log"),
            expected: 6,
            actual: 4,
        };

        assert_eq!(
            error.to_string(),
            "expected 6 blocks, got 4 in results/m-python3.14-GIL.log"
        );
    }
}
