use std::fs;
use std::num::NonZero;
use std::path::Path;

use new_zealand::nz;
use serde::Deserialize;
use sum_pools::{LOCK_MODE_ENV_VAR, LockMode, MAX_TOTAL, Workload};

use crate::Error;

/// Settings of one benchmark driver run.
///
/// Every field has a default, so a configuration file only needs to name the settings it
/// changes:
///
/// ```toml
/// max_workers = 4
/// repeats = 3
/// ```
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    /// Number of partitions the summed range is split into.
    pub partitions: NonZero<usize>,

    /// Upper end of the worker count sweep of the pooled strategies.
    pub max_workers: NonZero<usize>,

    /// Length of the range summed by the scalar loop workload.
    pub loop_total: u64,

    /// Length of the range summed by the vectorized workload. Larger than `loop_total` because
    /// vectorized summation is much faster.
    pub vectorized_total: u64,

    /// How many times each configuration is timed. Above 1 the mean is reported.
    pub repeats: NonZero<u32>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            partitions: nz!(10),
            max_workers: nz!(12),
            loop_total: 100_000_000,
            vectorized_total: 1_000_000_000,
            repeats: nz!(1),
        }
    }
}

impl DriverConfig {
    /// Parses a TOML configuration, filling in defaults for absent settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the text is not valid TOML, names an unknown setting,
    /// holds a value of the wrong type or fails [`validate()`][Self::validate].
    pub fn from_toml_str(text: &str, origin: &Path) -> crate::Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config {
            path: origin.to_path_buf(),
            message: e.to_string().trim_end().to_string(),
        })?;

        config.validate(origin)?;

        Ok(config)
    }

    /// Checks that every total can be summed without overflowing, naming `origin` in the error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a total is greater than [`MAX_TOTAL`].
    pub fn validate(&self, origin: &Path) -> crate::Result<()> {
        for (name, total) in [
            ("loop_total", self.loop_total),
            ("vectorized_total", self.vectorized_total),
        ] {
            if total > MAX_TOTAL {
                return Err(Error::Config {
                    path: origin.to_path_buf(),
                    message: format!(
                        "{name} = {total} is too large, the sum of 1..={total} does not fit \
                         into 64 bits (maximum {MAX_TOTAL})"
                    ),
                });
            }
        }

        Ok(())
    }

    /// Reads a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or does not parse. See
    /// [`from_toml_str()`][Self::from_toml_str].
    pub fn load(path: &Path) -> crate::Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::io(path, source))?;

        Self::from_toml_str(&text, path)
    }

    /// Loads `path` if given, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// See [`load()`][Self::load].
    pub fn load_or_default(path: Option<&Path>) -> crate::Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// The length of the range summed by `workload`.
    #[must_use]
    pub fn total_for(&self, workload: Workload) -> u64 {
        match workload {
            Workload::Vectorized => self.vectorized_total,
            _ => self.loop_total,
        }
    }
}

/// Decides the lock mode of a driver run.
///
/// An explicit choice wins. Otherwise the value of the lock environment variable decides, where
/// `0` disables the lock and anything else (including absence) enables it.
#[must_use]
pub fn resolve_lock_mode(explicit: Option<LockMode>, env_value: Option<&str>) -> LockMode {
    explicit.unwrap_or_else(|| LockMode::from_env_value(env_value))
}

/// Reads the lock environment variable of the current process and resolves the lock mode.
#[must_use]
#[cfg_attr(test, mutants::skip)] // Depends on process environment.
pub fn lock_mode_from_env(explicit: Option<LockMode>) -> LockMode {
    let env_value = std::env::var(LOCK_MODE_ENV_VAR).ok();

    resolve_lock_mode(explicit, env_value.as_deref())
}
