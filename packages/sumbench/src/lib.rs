#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Benchmark harness that compares sequential, thread pool and process pool summation with and
//! without a global execution lock.
//!
//! The harness is a pipeline of commands of the `sumbench` binary:
//!
//! 1. `sumbench collect` identifies the machine ([`machine_name()`]) and runs a benchmark
//!    [`Target`] once per lock mode, writing each captured log into a results directory
//!    ([`collect()`]).
//! 2. `sumbench drive` is the native benchmark: a [`Driver`] sweeps all strategies and worker
//!    counts and prints the timing log to stdout. Its process pool re-invokes the binary as
//!    `sumbench worker`.
//! 3. `sumbench chart` parses the logs and renders comparison charts with [`bench_logs`].
//!
//! `sumbench scoping` runs an unrelated micro-benchmark, see [`scoping`].
//!
//! # Configuration
//!
//! The driver starts from [`DriverConfig::default()`], applies an optional TOML file and then
//! any command line flags. The lock mode comes from `--lock-mode`, else from the
//! `SUMBENCH_GIL` environment variable (`0` disables the lock), else the lock is enabled.
//!
//! # Logging
//!
//! Diagnostics are emitted through `tracing` and written to stderr by the binary, filtered by
//! `RUST_LOG`. Stdout carries only benchmark output so that it can be captured verbatim.

mod collector;
mod config;
mod driver;
mod error;
mod machine;
mod pal;

pub mod scoping;

pub use collector::*;
pub use config::*;
pub use driver::*;
pub use error::*;
pub use machine::*;
