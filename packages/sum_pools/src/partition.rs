use std::num::NonZero;
use std::ops::Range;

/// One contiguous sub-range of the summed integers, assigned to a single worker.
///
/// The range is half-open: `start` is included, `end` is not.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Partition {
    index: usize,
    start: u64,
    end: u64,
}

impl Partition {
    /// Creates a partition covering `start..end`.
    ///
    /// # Panics
    ///
    /// Panics if `start > end`.
    #[must_use]
    pub fn new(index: usize, start: u64, end: u64) -> Self {
        assert!(start <= end, "partition start {start} is after end {end}");

        Self { index, start, end }
    }

    /// Position of this partition in the sequence it was created in.
    ///
    /// Pooled strategies return per-partition results ordered by this index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// First integer in the partition.
    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// One past the last integer in the partition.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of integers in the partition.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the partition contains no integers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The integers of the partition as a range.
    #[must_use]
    pub fn range(&self) -> Range<u64> {
        self.start..self.end
    }
}

/// The largest `total` whose sum `1 + 2 + ... + total` still fits into a `u64`.
///
/// Workloads accumulate in `u64`, so every strategy is only defined for totals up to this value.
pub const MAX_TOTAL: u64 = 6_074_000_999;

/// Splits `1..=total` into `count` contiguous partitions of equal size.
///
/// Partition `i` covers `div * i + 1 .. div * i + div + 1` where `div = total / count`. The last
/// partition absorbs the remainder when `total` is not a multiple of `count`, so the union of all
/// partitions is always exactly `1..=total`.
///
/// # Example
///
/// ```
/// use new_zealand::nz;
/// use sum_pools::partition_range;
///
/// let partitions = partition_range(10, nz!(3));
///
/// assert_eq!(partitions.len(), 3);
/// assert_eq!(partitions[0].range(), 1..4);
/// assert_eq!(partitions[2].range(), 7..11);
/// ```
///
/// # Panics
///
/// Panics if `total` is greater than [`MAX_TOTAL`].
#[must_use]
#[expect(
    clippy::integer_division,
    reason = "partition sizes are whole numbers by definition, remainder is handled explicitly"
)]
#[expect(
    clippy::arithmetic_side_effects,
    reason = "all values are bounded by total, which is a valid u64"
)]
pub fn partition_range(total: u64, count: NonZero<usize>) -> Vec<Partition> {
    assert!(
        total <= MAX_TOTAL,
        "total {total} exceeds {MAX_TOTAL}, its sum does not fit into u64"
    );

    let count_u64 =
        u64::try_from(count.get()).expect("usize always fits into u64 on supported targets");
    let div = total / count_u64;
    let last_index = count.get() - 1;

    (0..count.get())
        .zip(0..count_u64)
        .map(|(index, i)| {
            let start = div * i + 1;
            let end = if index == last_index {
                total + 1
            } else {
                start + div
            };

            Partition::new(index, start, end)
        })
        .collect()
}

/// The closed-form sum `total * (total + 1) / 2` of `1..=total`.
///
/// Every strategy must produce this value for any partitioning of the same range.
#[must_use]
#[expect(
    clippy::integer_division,
    reason = "the product of two consecutive integers is always even"
)]
pub fn closed_form_sum(total: u64) -> u128 {
    let total = u128::from(total);

    total
        .checked_mul(total.saturating_add(1))
        .map_or(u128::MAX, |product| product / 2)
}
