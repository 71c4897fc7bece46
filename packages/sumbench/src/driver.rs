use std::env;
use std::io::Write;
use std::num::NonZero;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use bench_logs::{TimingKind, TimingLine, title_line};
use new_zealand::nz;
use sum_pools::{
    LockMode, Partition, Strategy, SumRunner, WorkerCommand, Workload, closed_form_sum,
    partition_range,
};
use tracing::{debug, info};

use crate::{DriverConfig, Error};

/// Runs the full benchmark sweep and writes the timing log.
///
/// For each workload (scalar loop first, vectorized second) the driver writes three blocks:
/// a single sequential run, then a thread pool and a process pool run for every worker count
/// from 1 to [`DriverConfig::max_workers`]. Every total is checked against the closed-form sum
/// of the range, so a broken strategy aborts the sweep instead of producing a fast but wrong
/// measurement.
#[derive(Debug)]
pub struct Driver {
    config: DriverConfig,
    runner: SumRunner,
}

impl Driver {
    /// Creates a driver. `worker_command` starts the process pool's worker processes.
    #[must_use]
    pub fn new(config: DriverConfig, lock_mode: LockMode, worker_command: WorkerCommand) -> Self {
        Self {
            config,
            runner: SumRunner::new(lock_mode, worker_command),
        }
    }

    /// The settings of this driver.
    #[must_use]
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Runs the sweep, writing title and timing lines to `out` as measurements complete.
    ///
    /// # Errors
    ///
    /// Fails if a configured total is too large to sum, if a strategy fails, if a total does
    /// not match the closed-form sum or if `out` cannot be written.
    pub fn run(&self, out: &mut impl Write) -> crate::Result<()> {
        self.config.validate(Path::new("<driver settings>"))?;

        info!(
            lock_mode = %self.runner.lock_mode(),
            partitions = self.config.partitions.get(),
            max_workers = self.config.max_workers.get(),
            repeats = self.config.repeats.get(),
            "starting benchmark sweep"
        );

        for workload in Workload::ALL {
            let total = self.config.total_for(workload);
            let partitions = partition_range(total, self.config.partitions);
            let expected = closed_form_sum(total);

            for strategy in Strategy::ALL {
                let title = format!("{}{}", strategy.block_title(), workload.title_suffix());
                writeln!(out, "{}", title_line(&title)).map_err(Error::Output)?;

                for max_workers in self.worker_counts(strategy) {
                    let elapsed =
                        self.measure(strategy, &partitions, max_workers, workload, expected)?;

                    let line = TimingLine {
                        strategy: strategy.function_name(),
                        workload: workload.function_name(),
                        max_workers: strategy.is_pooled().then_some(max_workers.get()),
                        kind: self.timing_kind(),
                        seconds: elapsed.as_secs_f64(),
                    };

                    writeln!(out, "{line}").map_err(Error::Output)?;
                    out.flush().map_err(Error::Output)?;
                }
            }
        }

        Ok(())
    }

    fn worker_counts(&self, strategy: Strategy) -> Vec<NonZero<usize>> {
        if strategy.is_pooled() {
            (1..=self.config.max_workers.get())
                .filter_map(NonZero::new)
                .collect()
        } else {
            vec![nz!(1)]
        }
    }

    fn timing_kind(&self) -> TimingKind {
        if self.config.repeats.get() > 1 {
            TimingKind::Average
        } else {
            TimingKind::Elapsed
        }
    }

    /// Times `repeats` runs of one configuration and returns the mean duration.
    fn measure(
        &self,
        strategy: Strategy,
        partitions: &[Partition],
        max_workers: NonZero<usize>,
        workload: Workload,
        expected: u128,
    ) -> crate::Result<Duration> {
        let mut elapsed = Duration::ZERO;

        for repeat in 0..self.config.repeats.get() {
            let start = Instant::now();
            let actual = self
                .runner
                .run(strategy, partitions, max_workers, workload)?;
            let duration = start.elapsed();

            if u128::from(actual) != expected {
                return Err(Error::TotalMismatch {
                    strategy: strategy.function_name().to_string(),
                    workload: workload.function_name().to_string(),
                    expected,
                    actual,
                });
            }

            debug!(
                %strategy,
                %workload,
                max_workers = max_workers.get(),
                repeat,
                seconds = duration.as_secs_f64(),
                "measured run"
            );

            elapsed = elapsed.saturating_add(duration);
        }

        Ok(elapsed.div_f64(f64::from(self.config.repeats.get())))
    }
}

/// The command that starts this binary as a process pool worker (`sumbench worker`).
///
/// # Errors
///
/// Fails if the path of the running executable cannot be determined.
pub fn self_worker_command() -> crate::Result<WorkerCommand> {
    Ok(WorkerCommand::new(current_exe()?).arg("worker"))
}

pub(crate) fn current_exe() -> crate::Result<PathBuf> {
    env::current_exe().map_err(|source| Error::io("<current executable>", source))
}
