// Real filesystem implementation that delegates to std::fs.
//
// This is a trivial forwarder to system APIs and is excluded from coverage and mutation testing.

use std::io;

use crate::pal::Filesystem;

/// Real filesystem implementation that uses the operating system's filesystem.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetFilesystem;

// Trivial forwarder to system APIs - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl Filesystem for BuildTargetFilesystem {
    fn read_cpuinfo(&self) -> io::Result<String> {
        std::fs::read_to_string("/proc/cpuinfo")
    }
}
