// Platform abstraction layer for sumbench.
//
// Abstracts the operating system facts the collector depends on so they can be mocked in tests.

mod filesystem;

pub(crate) use filesystem::*;
