use std::fmt;
use std::path::Path;

use crate::Error;

/// One titled section of a benchmark log with its measurements.
///
/// Sequential blocks hold a single elapsed time and no worker counts. Pooled blocks hold one
/// worker count per elapsed time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimingBlock {
    /// The title between the `####` delimiters.
    pub title: String,

    /// The worker counts of a pooled sweep, empty for sequential blocks.
    pub max_wks: Vec<u32>,

    /// Elapsed (or average) seconds, one per measured run.
    pub elapsed: Vec<f64>,
}

impl TimingBlock {
    /// Creates a block with no measurements.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            max_wks: Vec::new(),
            elapsed: Vec::new(),
        }
    }

    /// Whether the block measures a strategy without a worker count sweep.
    #[must_use]
    pub fn is_sequential(&self) -> bool {
        self.max_wks.is_empty()
    }

    /// The `(worker count, seconds)` pairs of a pooled block.
    pub fn points(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.max_wks.iter().copied().zip(self.elapsed.iter().copied())
    }

    /// Checks that the measurements line up: a sequential block has exactly one elapsed time,
    /// a pooled block has one elapsed time per worker count.
    pub(crate) fn validate(&self, file: &Path) -> crate::Result<()> {
        let consistent = if self.is_sequential() {
            self.elapsed.len() == 1
        } else {
            self.max_wks.len() == self.elapsed.len()
        };

        if consistent {
            Ok(())
        } else {
            Err(Error::InconsistentBlock {
                file: file.to_path_buf(),
                title: self.title.clone(),
                workers: self.max_wks.len(),
                elapsed: self.elapsed.len(),
            })
        }
    }
}

/// Formats the delimiter line that starts a block, e.g. `#### ThreadPool ####`.
#[must_use]
pub fn title_line(title: &str) -> String {
    format!("#### {title} ####")
}

/// Whether a timing line reports a single run or the mean of several.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum TimingKind {
    /// The duration of one run, written as `elapsed time`.
    Elapsed,

    /// The mean duration of repeated runs, written as `average time`.
    Average,
}

impl TimingKind {
    fn label(self) -> &'static str {
        match self {
            Self::Elapsed => "elapsed time",
            Self::Average => "average time",
        }
    }
}

/// One measurement line of a benchmark log.
///
/// Renders as `thread_pool.sum_loop(max_wks = 4) elapsed time : 0.0123`, with the
/// `(max_wks = N)` part only present for pooled strategies.
#[derive(Clone, Debug, PartialEq)]
pub struct TimingLine<'a> {
    /// Name of the execution strategy.
    pub strategy: &'a str,

    /// Name of the summation function.
    pub workload: &'a str,

    /// Worker count of pooled strategies.
    pub max_workers: Option<usize>,

    /// Whether `seconds` is a single run or a mean.
    pub kind: TimingKind,

    /// The measured wall-clock time.
    pub seconds: f64,
}

impl fmt::Display for TimingLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.strategy, self.workload)?;

        if let Some(max_workers) = self.max_workers {
            write!(f, "(max_wks = {max_workers})")?;
        }

        write!(f, " {} : {}", self.kind.label(), self.seconds)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn timing_line_for_sequential_run() {
        let line = TimingLine {
            strategy: "sequential",
            workload: "sum_loop",
            max_workers: None,
            kind: TimingKind::Elapsed,
            seconds: 1.25,
        };

        assert_eq!(line.to_string(), "sequential.sum_loop elapsed time : 1.25");
    }

    #[test]
    fn timing_line_for_pooled_average() {
        let line = TimingLine {
            strategy: "thread_pool",
            workload: "sum_vectorized",
            max_workers: Some(12),
            kind: TimingKind::Average,
            seconds: 0.5,
        };

        assert_eq!(
            line.to_string(),
            "thread_pool.sum_vectorized(max_wks = 12) average time : 0.5"
        );
    }

    #[test]
    fn title_line_is_delimited() {
        assert_eq!(title_line("ProcessPool"), "#### ProcessPool ####");
    }

    #[test]
    fn validation_matches_block_shape() {
        let path = Path::new("x.log");

        let mut sequential = TimingBlock::new("SEQUENTIAL");
        sequential.validate(path).unwrap_err();
        sequential.elapsed.push(1.0);
        sequential.validate(path).unwrap();
        assert!(sequential.is_sequential());

        let pooled = TimingBlock {
            title: "ThreadPool".to_string(),
            max_wks: vec![1, 2],
            elapsed: vec![1.0],
        };
        pooled.validate(path).unwrap_err();

        let pooled = TimingBlock {
            elapsed: vec![1.0, 0.5],
            ..pooled
        };
        pooled.validate(path).unwrap();
        assert_eq!(pooled.points().collect::<Vec<_>>(), vec![(1, 1.0), (2, 0.5)]);
    }
}
