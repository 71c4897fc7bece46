//! Micro-benchmark of where a hot loop keeps its counter.
//!
//! The same counting loop runs three times: against a process-global static, against a local
//! variable, and inside a function whose loop index and accumulator are both process-global
//! statics. The differences show what it costs to keep loop state outside the function that
//! runs the loop.

use std::hint::black_box;
use std::io::Write;
use std::sync::atomic::{self, AtomicU64};
use std::time::Instant;

use crate::Error;

/// Default number of loop iterations per variant.
pub const DEFAULT_ITERATIONS: u64 = 100_000_000;

static GLOBAL_COUNT: AtomicU64 = AtomicU64::new(0);

// Loop state of the function that sums through globals.
static GLOBAL_SUM: AtomicU64 = AtomicU64::new(0);
static GLOBAL_INDEX: AtomicU64 = AtomicU64::new(0);

/// One way of keeping the loop counter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum CounterPlacement {
    /// A process-global static updated directly from the loop.
    Global,

    /// A variable local to the function running the loop.
    Local,

    /// A function whose loop index and accumulator are process-global statics. It adds the
    /// index on every iteration, so its result is `0 + 1 + ... + (iterations - 1)`.
    GlobalViaFunction,
}

impl CounterPlacement {
    /// All placements, in the order they are measured.
    pub const ALL: [Self; 3] = [Self::Global, Self::Local, Self::GlobalViaFunction];

    /// Label printed in front of the elapsed time.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "in global scope",
            Self::Local => "in function scope",
            Self::GlobalViaFunction => "in global scope(in function)",
        }
    }

    /// Runs `iterations` loop iterations with this placement and returns the final value of
    /// the accumulator.
    #[must_use]
    pub fn count(self, iterations: u64) -> u64 {
        match self {
            Self::Global => count_global(iterations),
            Self::Local => count_local(iterations),
            Self::GlobalViaFunction => count_global_via_function(iterations),
        }
    }
}

fn count_global(iterations: u64) -> u64 {
    GLOBAL_COUNT.store(0, atomic::Ordering::Relaxed);

    for _ in 0..iterations {
        GLOBAL_COUNT.fetch_add(black_box(1), atomic::Ordering::Relaxed);
    }

    GLOBAL_COUNT.load(atomic::Ordering::Relaxed)
}

fn count_local(iterations: u64) -> u64 {
    let mut count: u64 = 0;

    for _ in 0..iterations {
        count = black_box(count).wrapping_add(1);
    }

    count
}

fn count_global_via_function(iterations: u64) -> u64 {
    GLOBAL_SUM.store(0, atomic::Ordering::Relaxed);

    for i in 0..iterations {
        GLOBAL_INDEX.store(black_box(i), atomic::Ordering::Relaxed);

        let index = GLOBAL_INDEX.load(atomic::Ordering::Relaxed);
        let sum = GLOBAL_SUM.load(atomic::Ordering::Relaxed);
        GLOBAL_SUM.store(sum.wrapping_add(index), atomic::Ordering::Relaxed);
    }

    GLOBAL_SUM.load(atomic::Ordering::Relaxed)
}

/// Runs every placement and writes the count and elapsed time of each to `out`.
///
/// # Errors
///
/// Fails if `out` cannot be written.
pub fn run(out: &mut impl Write, iterations: u64) -> crate::Result<()> {
    for placement in CounterPlacement::ALL {
        let start = Instant::now();
        let count = placement.count(iterations);
        let elapsed = start.elapsed();

        writeln!(out, "{count}").map_err(Error::Output)?;
        writeln!(
            out,
            "{}: elapsed time: {}",
            placement.label(),
            elapsed.as_secs_f64()
        )
        .map_err(Error::Output)?;
    }

    Ok(())
}
