use std::fmt;
use std::num::NonZero;

use crate::{ExecutionLock, LockMode, Partition, ProcessPool, ThreadPool, WorkerCommand, Workload};

/// How the partitions of a summation are executed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Strategy {
    /// One partition after another on the calling thread.
    Sequential,

    /// A [`ThreadPool`] created for the run, sized by the worker count.
    ThreadPool,

    /// A [`ProcessPool`] created for the run, sized by the worker count.
    ProcessPool,
}

impl Strategy {
    /// All strategies, in the order the benchmark driver runs them.
    pub const ALL: [Self; 3] = [Self::Sequential, Self::ThreadPool, Self::ProcessPool];

    /// Function-style name used in timing lines, e.g. `thread_pool`.
    #[must_use]
    pub fn function_name(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::ThreadPool => "thread_pool",
            Self::ProcessPool => "process_pool",
        }
    }

    /// Title of the log block that holds this strategy's measurements.
    #[must_use]
    pub fn block_title(self) -> &'static str {
        match self {
            Self::Sequential => "SEQUENTIAL",
            Self::ThreadPool => "ThreadPool",
            Self::ProcessPool => "ProcessPool",
        }
    }

    /// Whether the strategy is measured over a sweep of worker counts.
    #[must_use]
    pub fn is_pooled(self) -> bool {
        !matches!(self, Self::Sequential)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

/// Sums every partition on the calling thread.
#[must_use]
pub fn sequential(partitions: &[Partition], workload: Workload, lock: &ExecutionLock) -> u64 {
    partitions
        .iter()
        .map(|partition| lock.run(|| workload.sum(partition.range())))
        .sum()
}

/// Sums the partitions on a freshly created pool of `max_workers` threads.
///
/// Every partition is summed while holding `lock`, so in [`LockMode::Gil`] the threads take
/// turns instead of running in parallel.
///
/// # Errors
///
/// Fails if the pool's threads cannot be started.
pub fn thread_pool(
    partitions: &[Partition],
    max_workers: NonZero<usize>,
    workload: Workload,
    lock: &ExecutionLock,
) -> crate::Result<u64> {
    let pool = ThreadPool::new(max_workers)?;

    Ok(pool
        .map(partitions, |partition| {
            lock.run(|| workload.sum(partition.range()))
        })
        .into_iter()
        .sum())
}

/// Sums the partitions on a freshly created pool of up to `max_workers` worker processes.
///
/// # Errors
///
/// Fails if any worker process cannot be started or does not answer correctly.
pub fn process_pool(
    partitions: &[Partition],
    max_workers: NonZero<usize>,
    workload: Workload,
    command: &WorkerCommand,
) -> crate::Result<u64> {
    let pool = ProcessPool::new(command.clone(), max_workers);

    Ok(pool.map(partitions, workload)?.into_iter().sum())
}

/// Executes any [`Strategy`] with a shared execution lock and worker command.
///
/// # Example
///
/// ```
/// use new_zealand::nz;
/// use sum_pools::{LockMode, Strategy, SumRunner, WorkerCommand, Workload, partition_range};
///
/// let runner = SumRunner::new(LockMode::FreeThread, WorkerCommand::new("sumbench").arg("worker"));
/// let partitions = partition_range(1_000, nz!(10));
///
/// let total = runner
///     .run(Strategy::ThreadPool, &partitions, nz!(4), Workload::Loop)
///     .unwrap();
///
/// assert_eq!(total, 500_500);
/// ```
#[derive(Debug)]
pub struct SumRunner {
    lock: ExecutionLock,
    worker_command: WorkerCommand,
}

impl SumRunner {
    /// Creates a runner whose threads obey `lock_mode` and whose process pool starts
    /// `worker_command`.
    #[must_use]
    pub fn new(lock_mode: LockMode, worker_command: WorkerCommand) -> Self {
        Self {
            lock: ExecutionLock::new(lock_mode),
            worker_command,
        }
    }

    /// The lock mode this runner executes in.
    #[must_use]
    pub fn lock_mode(&self) -> LockMode {
        self.lock.mode()
    }

    /// Sums all partitions with `workload` using `strategy` and returns the total.
    ///
    /// `max_workers` is ignored by [`Strategy::Sequential`].
    ///
    /// # Errors
    ///
    /// Fails if the threads or worker processes of a pooled strategy cannot be started, or if
    /// worker processes misbehave.
    pub fn run(
        &self,
        strategy: Strategy,
        partitions: &[Partition],
        max_workers: NonZero<usize>,
        workload: Workload,
    ) -> crate::Result<u64> {
        match strategy {
            Strategy::Sequential => Ok(sequential(partitions, workload, &self.lock)),
            Strategy::ThreadPool => thread_pool(partitions, max_workers, workload, &self.lock),
            Strategy::ProcessPool => {
                process_pool(partitions, max_workers, workload, &self.worker_command)
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use new_zealand::nz;

    use super::*;
    use crate::{closed_form_sum, partition_range};

    const N: u64 = 1_000_000;

    fn runner(mode: LockMode) -> SumRunner {
        SumRunner::new(mode, WorkerCommand::new("/nonexistent/worker/binary"))
    }

    #[test]
    fn fast_strategies_match_closed_form() {
        let expected = u64::try_from(closed_form_sum(N)).unwrap();

        for partition_count in [nz!(10), nz!(20)] {
            let partitions = partition_range(N, partition_count);

            for mode in LockMode::ALL {
                let runner = runner(mode);

                for workload in Workload::ALL {
                    for (strategy, max_workers) in
                        [(Strategy::Sequential, nz!(1)), (Strategy::ThreadPool, nz!(10))]
                    {
                        let total = runner
                            .run(strategy, &partitions, max_workers, workload)
                            .unwrap();

                        assert_eq!(
                            total, expected,
                            "{strategy} {workload} {mode} over {partition_count} partitions"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn ten_chunks_on_ten_threads() {
        let partitions = partition_range(N, nz!(10));
        let lock = ExecutionLock::new(LockMode::FreeThread);

        assert_eq!(
            thread_pool(&partitions, nz!(10), Workload::Loop, &lock).unwrap(),
            500_000_500_000
        );
    }

    #[test]
    fn worker_count_does_not_change_result() {
        let partitions = partition_range(12_345, nz!(7));
        let lock = ExecutionLock::new(LockMode::Gil);

        for max_workers in 1..=12 {
            let max_workers = NonZero::new(max_workers).unwrap();

            assert_eq!(
                thread_pool(&partitions, max_workers, Workload::Vectorized, &lock).unwrap(),
                76_205_685
            );
        }
    }

    #[test]
    fn process_pool_reports_spawn_failure() {
        let partitions = partition_range(100, nz!(2));

        runner(LockMode::Gil)
            .run(Strategy::ProcessPool, &partitions, nz!(2), Workload::Loop)
            .unwrap_err();
    }

    #[test]
    fn strategy_names() {
        assert_eq!(Strategy::Sequential.block_title(), "SEQUENTIAL");
        assert_eq!(Strategy::ThreadPool.function_name(), "thread_pool");
        assert!(!Strategy::Sequential.is_pooled());
        assert!(Strategy::ProcessPool.is_pooled());
    }
}
