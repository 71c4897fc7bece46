use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors that can occur when executing a summation strategy.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The worker threads of a thread pool could not be started.
    #[error("failed to start thread pool: {0}")]
    ThreadPoolBuild(#[source] rayon::ThreadPoolBuildError),

    /// A worker process could not be started.
    #[error("failed to spawn worker process '{program}': {source}")]
    WorkerSpawn {
        /// The program that was being started.
        program: String,

        /// The underlying I/O error.
        source: io::Error,
    },

    /// Communication with a running worker process failed.
    #[error("failed to communicate with worker process {worker_index}: {source}")]
    WorkerIo {
        /// Index of the worker within the process pool.
        worker_index: usize,

        /// The underlying I/O error.
        source: io::Error,
    },

    /// A worker process exited with a failure status.
    #[error("worker process {worker_index} exited with {status}")]
    WorkerFailed {
        /// Index of the worker within the process pool.
        worker_index: usize,

        /// The exit status reported by the operating system.
        status: ExitStatus,
    },

    /// Reading or writing the worker protocol streams failed.
    #[error("worker protocol I/O failed: {0}")]
    Io(#[source] io::Error),

    /// A worker process or its parent sent a line that does not follow the worker protocol.
    #[error("malformed worker protocol line '{line}': {problem}")]
    WorkerProtocol {
        /// The offending line, without its line terminator.
        line: String,

        /// A human-readable description of the problem.
        problem: String,
    },

    /// A workload name did not match any known workload.
    #[error("unknown workload '{0}', expected 'loop' or 'vectorized'")]
    UnknownWorkload(String),

    /// A lock mode name did not match any known lock mode.
    #[error("unknown lock mode '{0}', expected 'GIL' or 'free_thread'")]
    UnknownLockMode(String),
}

impl Error {
    pub(crate) fn protocol(line: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::WorkerProtocol {
            line: line.into(),
            problem: problem.into(),
        }
    }
}

/// A specialized `Result` type for summation operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
