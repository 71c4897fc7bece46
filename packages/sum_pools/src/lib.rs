#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Partitioned summation of integer ranges, executed with interchangeable strategies so that
//! their wall-clock cost can be compared.
//!
//! The building blocks are:
//!
//! * [`partition_range()`] splits `1..=total` into contiguous [`Partition`]s.
//! * [`Workload`] is the function applied to each partition: a scalar loop or a vectorized
//!   block summation.
//! * [`Strategy`] decides where partitions execute: sequentially, on a [`ThreadPool`] or on a
//!   [`ProcessPool`] of worker processes.
//! * [`ExecutionLock`] optionally serializes all worker threads of a process behind one global
//!   lock ([`LockMode::Gil`]), which makes it possible to compare lock-bound and free-threaded
//!   execution of the same code.
//!
//! Whatever the strategy, the total is always the closed-form sum of the range.
//!
//! # Example
//!
//! ```
//! use new_zealand::nz;
//! use sum_pools::{LockMode, Strategy, SumRunner, WorkerCommand, Workload, partition_range};
//!
//! let runner = SumRunner::new(LockMode::Gil, WorkerCommand::new("sumbench").arg("worker"));
//! let partitions = partition_range(1_000_000, nz!(10));
//!
//! for strategy in [Strategy::Sequential, Strategy::ThreadPool] {
//!     let total = runner
//!         .run(strategy, &partitions, nz!(10), Workload::Vectorized)
//!         .unwrap();
//!
//!     assert_eq!(total, 500_000_500_000);
//! }
//! ```
//!
//! # Process pool workers
//!
//! A [`ProcessPool`] does not know how to sum anything by itself. It starts the program given
//! by a [`WorkerCommand`] and talks to it through the line protocol in [`protocol`]. The
//! program only has to call [`protocol::serve_worker()`] on its stdin and stdout.

mod error;
mod lock;
mod partition;
mod processpool;
mod strategy;
mod threadpool;
mod workload;

pub mod protocol;

pub use error::*;
pub use lock::*;
pub use partition::*;
pub use processpool::*;
pub use strategy::*;
pub use threadpool::*;
pub use workload::*;
