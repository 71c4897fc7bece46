use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use crate::Error;

/// Environment variable that selects the lock mode of the benchmark driver.
///
/// `0` selects [`LockMode::FreeThread`], any other value selects [`LockMode::Gil`].
pub const LOCK_MODE_ENV_VAR: &str = "SUMBENCH_GIL";

/// Whether worker threads share one global execution lock.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
pub enum LockMode {
    /// A single process-wide lock serializes the work of all threads, the way a global
    /// interpreter lock does.
    Gil,

    /// Threads execute their work fully in parallel.
    FreeThread,
}

impl LockMode {
    /// All lock modes, in the order the collector runs them.
    pub const ALL: [Self; 2] = [Self::Gil, Self::FreeThread];

    /// Name of the mode as it appears in log file names.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gil => "GIL",
            Self::FreeThread => "free_thread",
        }
    }

    /// Value of [`LOCK_MODE_ENV_VAR`] (or an equivalent toggle) that selects this mode.
    #[must_use]
    pub fn env_value(self) -> &'static str {
        match self {
            Self::Gil => "1",
            Self::FreeThread => "0",
        }
    }

    /// Interprets the value of a lock toggle environment variable.
    ///
    /// An absent variable means the lock is enabled.
    #[must_use]
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("0") => Self::FreeThread,
            _ => Self::Gil,
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GIL" | "gil" => Ok(Self::Gil),
            "free_thread" | "free-thread" => Ok(Self::FreeThread),
            _ => Err(Error::UnknownLockMode(s.to_string())),
        }
    }
}

/// Gate that every unit of partition work passes through.
///
/// In [`LockMode::Gil`] only one thread at a time may be inside [`run()`][Self::run]. Separate
/// processes each have their own lock, so the process pool is unaffected by the mode.
#[derive(Debug)]
pub struct ExecutionLock {
    mode: LockMode,
    global: Mutex<()>,
}

impl ExecutionLock {
    /// Creates a lock operating in the given mode.
    #[must_use]
    pub fn new(mode: LockMode) -> Self {
        Self {
            mode,
            global: Mutex::new(()),
        }
    }

    /// The mode this lock operates in.
    #[must_use]
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Executes `f`, holding the global lock for its duration when the lock is enabled.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        match self.mode {
            LockMode::Gil => {
                // A panic in another worker does not invalidate the unit we protect.
                let _guard = self.global.lock().unwrap_or_else(PoisonError::into_inner);
                f()
            }
            LockMode::FreeThread => f(),
        }
    }
}
