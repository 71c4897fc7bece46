// Filesystem trait abstraction for mocking in tests.

use std::fmt::Debug;
use std::io;

/// Abstraction over the system files that sumbench reads.
///
/// This trait is automatically mocked by mockall in test builds, generating `MockFilesystem`.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Filesystem: Debug + Send + Sync + 'static {
    /// Reads the processor description published by the kernel (`/proc/cpuinfo` on Linux).
    ///
    /// Returns an error if the platform does not publish one or it cannot be read.
    fn read_cpuinfo(&self) -> io::Result<String>;
}
