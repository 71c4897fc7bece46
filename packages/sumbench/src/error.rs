use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while driving, collecting or charting benchmarks.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A summation strategy or worker process failed.
    #[error(transparent)]
    Pools(#[from] sum_pools::Error),

    /// A benchmark log could not be read or charted.
    #[error(transparent)]
    Logs(#[from] bench_logs::Error),

    /// Driver settings could not be parsed or are out of range.
    #[error("invalid configuration in {}: {message}", .path.display())]
    Config {
        /// The configuration file, or a placeholder for settings from elsewhere.
        path: PathBuf,

        /// Description of the problem.
        message: String,
    },

    /// A file, directory or subprocess could not be accessed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// The file, directory or program being accessed.
        path: PathBuf,

        /// The underlying I/O error.
        source: io::Error,
    },

    /// Benchmark output could not be written.
    #[error("failed to write benchmark output: {0}")]
    Output(#[source] io::Error),

    /// A strategy produced a total that differs from the closed-form sum.
    #[error("{strategy}.{workload} returned {actual}, expected {expected}")]
    TotalMismatch {
        /// Name of the strategy that produced the total.
        strategy: String,

        /// Name of the summation function.
        workload: String,

        /// The closed-form sum of the range.
        expected: u128,

        /// The total that was returned.
        actual: u64,
    },

    /// A collection target name was not recognized.
    #[error("unknown collection target '{0}', expected 'native' or 'python'")]
    UnknownTarget(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A specialized `Result` type for sumbench operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
