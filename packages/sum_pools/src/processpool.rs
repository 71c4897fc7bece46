use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Write};
use std::num::NonZero;
use std::path::{Path, PathBuf};
use std::panic::resume_unwind;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;

use tracing::debug;

use crate::protocol::{encode_request, parse_response};
use crate::{Error, Partition, Workload};

/// How to start one worker process of a [`ProcessPool`].
///
/// The pool appends `--workload <name>` to the configured arguments. The started program must
/// speak the [worker protocol][crate::protocol] on its stdin and stdout, typically by calling
/// [`serve_worker()`][crate::protocol::serve_worker].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl WorkerCommand {
    /// Creates a worker command that starts `program` with no extra arguments.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends an argument that is passed to every worker before `--workload`.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The program that is started for each worker.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Builds the operating system command for a worker running `workload`.
    #[must_use]
    pub fn to_command(&self, workload: Workload) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--workload")
            .arg(workload.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        command
    }
}

/// Maps partitions over a set of short-lived worker processes.
///
/// Every [`map()`][Self::map] call starts `min(max_workers, partitions)` processes, hands the
/// partitions out round-robin and waits for all processes to exit. Process startup is part of
/// the cost, just as with any process pool that is created for a single batch of work.
#[derive(Debug)]
pub struct ProcessPool {
    command: WorkerCommand,
    max_workers: NonZero<usize>,
}

impl ProcessPool {
    /// Creates a pool that starts up to `max_workers` processes using `command`.
    #[must_use]
    pub fn new(command: WorkerCommand, max_workers: NonZero<usize>) -> Self {
        Self {
            command,
            max_workers,
        }
    }

    /// The maximum number of processes that run at the same time.
    #[must_use]
    pub fn max_workers(&self) -> NonZero<usize> {
        self.max_workers
    }

    /// Sums every partition in a worker process and returns the sums in partition order.
    ///
    /// # Errors
    ///
    /// Fails if a worker cannot be started, if communication with a worker fails, if a worker
    /// sends a malformed or incomplete answer, or if a worker exits with a failure status.
    pub fn map(&self, partitions: &[Partition], workload: Workload) -> crate::Result<Vec<u64>> {
        if partitions.is_empty() {
            return Ok(Vec::new());
        }

        let worker_count = self.max_workers.get().min(partitions.len());

        let mut assignments: Vec<Vec<usize>> = vec![Vec::new(); worker_count];
        for (position, assignment) in (0..partitions.len()).zip((0..worker_count).cycle()) {
            assignments
                .get_mut(assignment)
                .expect("cycle only yields valid worker indexes")
                .push(position);
        }

        let mut workers = Vec::with_capacity(worker_count);

        for (worker_index, assigned) in assignments.into_iter().enumerate() {
            let child = self
                .command
                .to_command(workload)
                .spawn()
                .map_err(|source| Error::WorkerSpawn {
                    program: self.command.program().display().to_string(),
                    source,
                })?;

            debug!(worker_index, pid = child.id(), "worker process started");

            workers.push(WorkerProcess {
                worker_index,
                child,
                assigned,
            });
        }

        // Requests are fed from one thread per worker while this thread reads the answers. A
        // worker answers as it reads, so writing everything before reading would deadlock once
        // a worker's stdout pipe fills up.
        let sums = thread::scope(|scope| {
            let feeders: Vec<_> = workers
                .iter_mut()
                .map(|worker| {
                    let stdin = worker.take_stdin();
                    let requests = worker.encode_requests(partitions);
                    let worker_index = worker.worker_index;

                    scope.spawn(move || feed_requests(stdin, &requests, worker_index))
                })
                .collect();

            let received = receive_all(&mut workers, partitions.len());

            if received.is_err() {
                // Unblocks feeders whose worker stopped reading.
                for worker in &mut workers {
                    worker.kill();
                }
            }

            let fed: Vec<_> = feeders
                .into_iter()
                .map(|feeder| feeder.join().unwrap_or_else(|panic| resume_unwind(panic)))
                .collect();

            let sums = received?;
            fed.into_iter().collect::<crate::Result<()>>()?;

            Ok::<_, Error>(sums)
        })?;

        for worker in &mut workers {
            worker.wait_success()?;
        }

        Ok(sums)
    }
}

#[derive(Debug)]
struct WorkerProcess {
    worker_index: usize,
    child: Child,

    // Positions in the partition slice handed to this worker, in request order.
    assigned: Vec<usize>,
}

impl WorkerProcess {
    fn take_stdin(&mut self) -> ChildStdin {
        self.child
            .stdin
            .take()
            .expect("worker stdin is always piped")
    }

    fn encode_requests(&self, partitions: &[Partition]) -> String {
        self.assigned
            .iter()
            .map(|position| {
                encode_request(
                    partitions
                        .get(*position)
                        .expect("assignments only contain valid partition positions"),
                )
            })
            .collect()
    }

    fn kill(&mut self) {
        if matches!(self.child.try_wait(), Ok(None)) {
            drop(self.child.kill());
        }
    }

    fn receive_sums(&mut self) -> crate::Result<Vec<(usize, u64)>> {
        let stdout: ChildStdout = self
            .child
            .stdout
            .take()
            .expect("worker stdout is always piped");

        let mut sums = Vec::with_capacity(self.assigned.len());
        let mut lines = BufReader::new(stdout).lines();

        for position in &self.assigned {
            let Some(line) = lines.next() else {
                return Err(Error::protocol(
                    "",
                    format!(
                        "worker {} answered {} of {} requests",
                        self.worker_index,
                        sums.len(),
                        self.assigned.len()
                    ),
                ));
            };

            let line = line.map_err(|source| self.io_error(source))?;
            sums.push((*position, parse_response(&line)?));
        }

        Ok(sums)
    }

    fn wait_success(&mut self) -> crate::Result<()> {
        let status = self.child.wait().map_err(|source| self.io_error(source))?;

        debug!(worker_index = self.worker_index, %status, "worker process exited");

        if status.success() {
            Ok(())
        } else {
            Err(Error::WorkerFailed {
                worker_index: self.worker_index,
                status,
            })
        }
    }

    fn io_error(&self, source: io::Error) -> Error {
        Error::WorkerIo {
            worker_index: self.worker_index,
            source,
        }
    }
}

impl Drop for WorkerProcess {
    #[cfg_attr(test, mutants::skip)] // Only reachable when a sibling worker already failed.
    fn drop(&mut self) {
        // A worker that is still running at this point belongs to a failed map() call.
        if matches!(self.child.try_wait(), Ok(None)) {
            drop(self.child.kill());
            drop(self.child.wait());
        }
    }
}

/// Writes all request lines of one worker, then closes its stdin to signal the end of work.
fn feed_requests(mut stdin: ChildStdin, requests: &str, worker_index: usize) -> crate::Result<()> {
    stdin
        .write_all(requests.as_bytes())
        .and_then(|()| stdin.flush())
        .map_err(|source| Error::WorkerIo {
            worker_index,
            source,
        })
}

fn receive_all(workers: &mut [WorkerProcess], len: usize) -> crate::Result<Vec<u64>> {
    let mut sums = vec![0_u64; len];

    for worker in workers {
        for (position, sum) in worker.receive_sums()? {
            *sums
                .get_mut(position)
                .expect("assignments only contain valid partition positions") = sum;
        }
    }

    Ok(sums)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use new_zealand::nz;

    use super::*;

    #[test]
    fn worker_command_appends_workload() {
        let command = WorkerCommand::new("/opt/sumbench")
            .arg("worker")
            .to_command(Workload::Vectorized);

        assert_eq!(command.get_program(), "/opt/sumbench");

        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, vec!["worker", "--workload", "vectorized"]);
    }

    #[test]
    fn empty_input_starts_no_processes() {
        let pool = ProcessPool::new(
            WorkerCommand::new("/nonexistent/worker/binary"),
            nz!(4),
        );

        assert!(pool.map(&[], Workload::Loop).unwrap().is_empty());
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let pool = ProcessPool::new(
            WorkerCommand::new("/nonexistent/worker/binary"),
            nz!(2),
        );

        let partitions = [Partition::new(0, 1, 11)];
        let error = pool.map(&partitions, Workload::Loop).unwrap_err();

        assert!(matches!(error, Error::WorkerSpawn { .. }));
        assert_eq!(pool.max_workers().get(), 2);
    }

    // A protocol-compatible worker written in shell, so the pool can be exercised without
    // building a dedicated worker binary. `$0` and `$1` receive `--workload <name>`.
    #[cfg(all(unix, not(miri)))]
    fn shell_worker(script: &str) -> WorkerCommand {
        WorkerCommand::new("sh").arg("-c").arg(script)
    }

    #[cfg(all(unix, not(miri)))]
    const SUMMING_SCRIPT: &str =
        r#"while read start end; do echo $(( (start + end - 1) * (end - start) / 2 )); done"#;

    #[cfg(all(unix, not(miri)))]
    #[test]
    fn shell_workers_return_sums_in_partition_order() {
        let partitions = crate::partition_range(1_000, nz!(7));

        for max_workers in [nz!(1), nz!(3), nz!(10)] {
            let pool = ProcessPool::new(shell_worker(SUMMING_SCRIPT), max_workers);

            let sums = pool.map(&partitions, Workload::Loop).unwrap();

            let expected: Vec<u64> = partitions
                .iter()
                .map(|p| Workload::Loop.sum(p.range()))
                .collect();
            assert_eq!(sums, expected);
        }
    }

    #[cfg(all(unix, not(miri)))]
    #[test]
    fn many_partitions_on_one_worker_do_not_fill_pipes() {
        // Far more answers than fit into a pipe buffer, all flowing through a single worker.
        let partitions = crate::partition_range(1_000_000_000, nz!(20_000));
        let pool = ProcessPool::new(shell_worker(SUMMING_SCRIPT), nz!(1));

        let sums = pool.map(&partitions, Workload::Loop).unwrap();

        assert_eq!(sums.len(), 20_000);
        assert_eq!(sums[0], 1_250_025_000);
        assert_eq!(
            u128::from(sums.iter().sum::<u64>()),
            crate::closed_form_sum(1_000_000_000)
        );
    }

    #[cfg(all(unix, not(miri)))]
    #[test]
    fn failing_worker_is_reported() {
        let pool = ProcessPool::new(shell_worker(r#"cat > /dev/null; exit 3"#), nz!(1));

        let partitions = [Partition::new(0, 1, 11)];
        let error = pool.map(&partitions, Workload::Loop).unwrap_err();

        // The worker answers nothing, which is noticed before its exit status.
        assert!(matches!(error, Error::WorkerProtocol { .. }));
    }

    #[cfg(all(unix, not(miri)))]
    #[test]
    fn garbage_answer_is_protocol_error() {
        let pool = ProcessPool::new(
            shell_worker(r#"while read line; do echo not-a-number; done"#),
            nz!(1),
        );

        let partitions = [Partition::new(0, 1, 11)];
        let error = pool.map(&partitions, Workload::Loop).unwrap_err();

        assert!(matches!(error, Error::WorkerProtocol { .. }));
    }

    #[cfg(all(unix, not(miri)))]
    #[test]
    fn unsuccessful_exit_after_answering_is_worker_failure() {
        let pool = ProcessPool::new(
            shell_worker(r#"while read start end; do echo 55; done; exit 2"#),
            nz!(1),
        );

        let partitions = [Partition::new(0, 1, 11)];
        let error = pool.map(&partitions, Workload::Loop).unwrap_err();

        assert!(matches!(error, Error::WorkerFailed { .. }));
    }
}
