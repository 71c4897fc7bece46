// Filesystem abstraction for sumbench.
//
// Production code reads through `BuildTargetFilesystem`; tests substitute `MockFilesystem`.

mod abstractions;
mod real;

pub(crate) use abstractions::*;
pub(crate) use real::*;
