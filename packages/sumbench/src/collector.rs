use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

use sum_pools::{LOCK_MODE_ENV_VAR, LockMode};
use tracing::{info, warn};

use crate::Error;
use crate::driver::current_exe;

/// Environment variable that toggles the interpreter lock of a free-threading capable Python.
pub const PYTHON_LOCK_ENV_VAR: &str = "PYTHON_GIL";

/// Selects which kind of [`Target`] to collect results from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum TargetKind {
    /// This binary's own benchmark driver.
    #[default]
    Native,

    /// A Python benchmark script run through the `uv` environment tool.
    Python,
}

impl FromStr for TargetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(Self::Native),
            "python" => Ok(Self::Python),
            _ => Err(Error::UnknownTarget(s.to_string())),
        }
    }
}

/// A benchmark program whose output the collector captures, once per lock mode.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Target {
    /// The native driver, started as `<program> drive`.
    Native {
        /// Path of the sumbench binary.
        program: PathBuf,

        /// Driver configuration file passed through to every run.
        config: Option<PathBuf>,
    },

    /// A Python benchmark script, started as `uv run <script>` on a pinned interpreter.
    Python {
        /// Interpreter version to pin, e.g. `3.14`.
        version: String,

        /// The benchmark script.
        script: PathBuf,
    },
}

impl Target {
    /// The native driver of the running executable.
    ///
    /// # Errors
    ///
    /// Fails if the path of the running executable cannot be determined.
    pub fn native(config: Option<PathBuf>) -> crate::Result<Self> {
        Ok(Self::Native {
            program: current_exe()?,
            config,
        })
    }

    /// Runtime tag used in log file names.
    #[must_use]
    pub fn runtime(&self) -> &'static str {
        match self {
            Self::Native { .. } => "sumbench",
            Self::Python { .. } => "python",
        }
    }

    /// Runtime version used in log file names.
    #[must_use]
    pub fn version(&self) -> &str {
        match self {
            Self::Native { .. } => env!("CARGO_PKG_VERSION"),
            Self::Python { version, .. } => version,
        }
    }

    /// The environment variable that selects the lock mode of the benchmark program.
    #[must_use]
    pub fn lock_env_var(&self) -> &'static str {
        match self {
            Self::Native { .. } => LOCK_MODE_ENV_VAR,
            Self::Python { .. } => PYTHON_LOCK_ENV_VAR,
        }
    }

    /// Commands that prepare the environment once, before any benchmark runs.
    #[must_use]
    pub fn setup_commands(&self) -> Vec<Command> {
        match self {
            Self::Native { .. } => Vec::new(),
            Self::Python { version, .. } => {
                let mut pin = Command::new("uv");
                pin.args(["python", "pin", version.as_str()]);
                vec![pin]
            }
        }
    }

    /// A command that reports whether the lock is really in effect, run before each benchmark.
    #[must_use]
    pub fn lock_check_command(&self, mode: LockMode) -> Option<Command> {
        match self {
            Self::Native { .. } => None,
            Self::Python { .. } => {
                let mut check = Command::new("uv");
                check
                    .args([
                        "run",
                        "python",
                        "-c",
                        "import sys; print('GIL:', sys._is_gil_enabled())",
                    ])
                    .env(self.lock_env_var(), mode.env_value());
                Some(check)
            }
        }
    }

    /// The command that runs the benchmark in `mode` and prints its log to stdout.
    #[must_use]
    pub fn benchmark_command(&self, mode: LockMode) -> Command {
        let mut command = match self {
            Self::Native { program, config } => {
                let mut command = Command::new(program);
                command.arg("drive");
                if let Some(config) = config {
                    command.arg("--config").arg(config);
                }
                command
            }
            Self::Python { script, .. } => {
                let mut command = Command::new("uv");
                command.arg("run").arg(script);
                command
            }
        };

        command.env(self.lock_env_var(), mode.env_value());
        command
    }
}

/// The file name of the log of one benchmark run, e.g. `Apple M2-python3.14-GIL.log`.
#[must_use]
pub fn log_file_name(machine: &str, runtime: &str, version: &str, mode: LockMode) -> String {
    format!("{machine}-{runtime}{version}-{mode}.log")
}

/// Runs the benchmark of `target` once per lock mode and writes each captured log into
/// `results_dir`, returning the written paths.
///
/// A benchmark that exits unsuccessfully is only reported as a warning; whatever it printed is
/// still written so partial results are not lost.
///
/// # Errors
///
/// Fails if the results directory or a log cannot be written, or if a command cannot be
/// started at all.
#[cfg_attr(test, mutants::skip)] // Spawns external programs.
pub fn collect(target: &Target, machine: &str, results_dir: &Path) -> crate::Result<Vec<PathBuf>> {
    fs::create_dir_all(results_dir).map_err(|source| Error::io(results_dir, source))?;

    for mut command in target.setup_commands() {
        run_status(&mut command)?;
    }

    let mut written = Vec::with_capacity(LockMode::ALL.len());

    for mode in LockMode::ALL {
        if let Some(mut check) = target.lock_check_command(mode) {
            run_status(&mut check)?;
        }

        let path = results_dir.join(log_file_name(
            machine,
            target.runtime(),
            target.version(),
            mode,
        ));

        info!(%mode, path = %path.display(), "collecting benchmark results");

        let mut command = target.benchmark_command(mode);
        let output = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| Error::io(command.get_program(), source))?;

        if !output.status.success() {
            warn!(%mode, status = %output.status, "benchmark exited unsuccessfully, keeping partial log");
        }

        fs::write(&path, &output.stdout).map_err(|source| Error::io(&path, source))?;

        info!(%mode, path = %path.display(), bytes = output.stdout.len(), "wrote benchmark log");

        written.push(path);
    }

    Ok(written)
}

/// Runs a helper command with inherited stdio, warning if it fails.
#[cfg_attr(test, mutants::skip)] // Spawns external programs.
fn run_status(command: &mut Command) -> crate::Result<()> {
    let status = command
        .status()
        .map_err(|source| Error::io(command.get_program(), source))?;

    if !status.success() {
        warn!(program = ?command.get_program(), %status, "helper command exited unsuccessfully");
    }

    Ok(())
}
