use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use sum_pools::LockMode;

use crate::Error;

static FILE_STEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<machine>.+)[-_](?P<runtime>python|sumbench)(?P<version>[\db.]+)[-_](?P<mode>GIL|free_thread)$",
    )
    .expect("file stem pattern is valid")
});

/// Which machine, runtime and lock mode produced a benchmark log.
///
/// Derived from the log's file name, which has the form
/// `<machine>-<runtime><version>-<mode>.log` (underscores are accepted as separators too).
///
/// # Example
///
/// ```
/// use bench_logs::LogIdentity;
/// use sum_pools::LockMode;
///
/// let identity = LogIdentity::from_file_stem("AMD Ryzen 9 7950X-python3.14-free_thread").unwrap();
///
/// assert_eq!(identity.machine, "AMD Ryzen 9 7950X");
/// assert_eq!(identity.runtime, "python");
/// assert_eq!(identity.version, "3.14");
/// assert_eq!(identity.mode, LockMode::FreeThread);
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct LogIdentity {
    /// Machine identifier, usually the CPU brand.
    pub machine: String,

    /// Runtime tag, `python` or `sumbench`.
    pub runtime: String,

    /// Runtime version, e.g. `3.14` or `3.15b1`.
    pub version: String,

    /// Lock mode the benchmark ran in.
    pub mode: LockMode,
}

impl LogIdentity {
    /// Parses a file stem (the file name without `.log`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFileName`] if the stem does not end in
    /// `-<runtime><version>-<mode>`.
    pub fn from_file_stem(stem: &str) -> crate::Result<Self> {
        let invalid = || Error::InvalidFileName {
            file: stem.to_string(),
        };

        let captures = FILE_STEM.captures(stem).ok_or_else(invalid)?;

        // The pattern only admits the two spellings LockMode parses.
        let mode = captures["mode"].parse().map_err(|_| invalid())?;

        Ok(Self {
            machine: captures["machine"].to_string(),
            runtime: captures["runtime"].to_string(),
            version: captures["version"].to_string(),
            mode,
        })
    }

    /// Parses the stem of a log file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFileName`] if the path has no stem or the stem does not match.
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| Error::InvalidFileName {
                file: path.display().to_string(),
            })?;

        Self::from_file_stem(stem)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn parses_native_log_name() {
        let identity =
            LogIdentity::from_path(Path::new("results/Apple M2 Pro-sumbench0.1.0-GIL.log"))
                .unwrap();

        assert_eq!(identity.machine, "Apple M2 Pro");
        assert_eq!(identity.runtime, "sumbench");
        assert_eq!(identity.version, "0.1.0");
        assert_eq!(identity.mode, LockMode::Gil);
    }

    #[test]
    fn accepts_underscores_and_beta_versions() {
        let identity = LogIdentity::from_file_stem("my_box_python3.15b1_free_thread").unwrap();

        assert_eq!(identity.machine, "my_box");
        assert_eq!(identity.version, "3.15b1");
        assert_eq!(identity.mode, LockMode::FreeThread);
    }

    #[test]
    fn machine_name_may_contain_separators() {
        let identity =
            LogIdentity::from_file_stem("Intel(R) Core(TM) i7-8700K CPU-python3.13-GIL").unwrap();

        assert_eq!(identity.machine, "Intel(R) Core(TM) i7-8700K CPU");
    }

    #[test]
    fn missing_suffix_is_format_error() {
        for stem in [
            "results",
            "machine-python3.14",
            "machine-ruby3.3-GIL",
            "machine-python3.14-nogil",
            "-python3.14-GIL",
        ] {
            let error = LogIdentity::from_file_stem(stem).unwrap_err();

            assert!(
                matches!(&error, Error::InvalidFileName { file } if file == stem),
                "{stem}: {error}"
            );
        }
    }
}
