use std::fmt;
use std::hint::black_box;
use std::ops::Range;
use std::str::FromStr;

use crate::Error;

/// Number of integers materialized at a time by [`Workload::Vectorized`].
///
/// Keeps memory use bounded no matter how large a partition is.
const VECTOR_BLOCK_LEN: usize = 64 * 1024;

/// Number of independent accumulators used by [`Workload::Vectorized`].
const VECTOR_LANES: usize = 8;

/// The summation function applied to every partition.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Workload {
    /// Scalar loop that visits every integer and adds it to a single accumulator.
    ///
    /// Each element passes through an optimization barrier so the compiler cannot replace the
    /// loop with the closed-form sum.
    Loop,

    /// Fills a block array with consecutive integers and sums it with independent lane
    /// accumulators, the shape that vector units execute well.
    Vectorized,
}

impl Workload {
    /// All workloads, in the order the benchmark driver runs them.
    pub const ALL: [Self; 2] = [Self::Loop, Self::Vectorized];

    /// Sums all integers in `range`.
    #[must_use]
    pub fn sum(self, range: Range<u64>) -> u64 {
        match self {
            Self::Loop => sum_loop(range),
            Self::Vectorized => sum_vectorized(range),
        }
    }

    /// Function-style name used in timing lines, e.g. `sum_loop`.
    #[must_use]
    pub fn function_name(self) -> &'static str {
        match self {
            Self::Loop => "sum_loop",
            Self::Vectorized => "sum_vectorized",
        }
    }

    /// Suffix appended to block titles, empty for the plain loop.
    #[must_use]
    pub fn title_suffix(self) -> &'static str {
        match self {
            Self::Loop => "",
            Self::Vectorized => "-Vectorized",
        }
    }

    /// Short name used on the command line and in the worker protocol.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loop => "loop",
            Self::Vectorized => "vectorized",
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Workload {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loop" => Ok(Self::Loop),
            "vectorized" => Ok(Self::Vectorized),
            _ => Err(Error::UnknownWorkload(s.to_string())),
        }
    }
}

#[expect(
    clippy::arithmetic_side_effects,
    reason = "partitions never extend past MAX_TOTAL, whose sum fits into u64"
)]
fn sum_loop(range: Range<u64>) -> u64 {
    let mut count: u64 = 0;

    for i in range {
        count += black_box(i);
    }

    count
}

#[expect(
    clippy::arithmetic_side_effects,
    reason = "partitions never extend past MAX_TOTAL, whose sum fits into u64"
)]
fn sum_vectorized(range: Range<u64>) -> u64 {
    let mut buffer = vec![0_u64; VECTOR_BLOCK_LEN];
    let mut total: u64 = 0;
    let mut next = range.start;

    while next < range.end {
        let remaining = range.end - next;
        let len = usize::try_from(remaining).map_or(VECTOR_BLOCK_LEN, |r| r.min(VECTOR_BLOCK_LEN));

        let block = buffer
            .get_mut(..len)
            .expect("len is clamped to the buffer length");

        for (slot, value) in block.iter_mut().zip(next..) {
            *slot = value;
        }

        total += sum_lanes(black_box(block));
        next += u64::try_from(len).expect("block length always fits into u64");
    }

    total
}

#[expect(
    clippy::arithmetic_side_effects,
    reason = "partitions never extend past MAX_TOTAL, whose sum fits into u64"
)]
fn sum_lanes(values: &[u64]) -> u64 {
    let mut lanes = [0_u64; VECTOR_LANES];

    let chunks = values.chunks_exact(VECTOR_LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        for (lane, value) in lanes.iter_mut().zip(chunk) {
            *lane += value;
        }
    }

    lanes.iter().sum::<u64>() + remainder.iter().sum::<u64>()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn loop_sums_small_range() {
        assert_eq!(Workload::Loop.sum(1..11), 55);
        assert_eq!(Workload::Loop.sum(5..5), 0);
    }

    #[test]
    fn vectorized_sums_small_range() {
        assert_eq!(Workload::Vectorized.sum(1..11), 55);
        assert_eq!(Workload::Vectorized.sum(5..5), 0);
    }

    #[test]
    fn vectorized_spans_multiple_blocks() {
        // Three full blocks plus a ragged tail that is not a multiple of the lane count.
        let end = 1 + 3 * VECTOR_BLOCK_LEN as u64 + 13;

        assert_eq!(
            Workload::Vectorized.sum(1..end),
            Workload::Loop.sum(1..end)
        );
    }

    #[test]
    fn workloads_agree_on_offset_range() {
        let range = 123_456..654_321;

        assert_eq!(
            Workload::Loop.sum(range.clone()),
            Workload::Vectorized.sum(range)
        );
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for workload in Workload::ALL {
            assert_eq!(workload.as_str().parse::<Workload>().unwrap(), workload);
        }

        "numpy".parse::<Workload>().unwrap_err();
    }

    #[test]
    fn title_suffix_marks_vectorized_blocks() {
        assert_eq!(Workload::Loop.title_suffix(), "");
        assert_eq!(Workload::Vectorized.title_suffix(), "-Vectorized");
        assert_eq!(Workload::Vectorized.function_name(), "sum_vectorized");
    }
}
