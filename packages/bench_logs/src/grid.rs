use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use sum_pools::LockMode;
use tracing::{debug, info, warn};

use crate::{Error, LogIdentity, TimingBlock, parse_log};

/// Number of timing blocks every benchmark log contains: three strategies for each of the two
/// workloads.
pub const BLOCKS_PER_LOG: usize = 6;

/// Lists the `*.log` files of a results directory in sorted order.
///
/// # Errors
///
/// Returns [`Error::NoLogFiles`] if the directory does not exist or contains no logs, and
/// [`Error::Io`] if it cannot be listed.
pub fn discover_logs(dir: &Path) -> crate::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NoLogFiles {
            dir: dir.to_path_buf(),
        });
    }

    let entries = fs::read_dir(dir).map_err(|source| Error::io(dir, source))?;

    let mut logs = Vec::new();

    for entry in entries {
        let path = entry.map_err(|source| Error::io(dir, source))?.path();

        if path.is_file() && path.extension().is_some_and(|ext| ext == "log") {
            logs.push(path);
        }
    }

    if logs.is_empty() {
        return Err(Error::NoLogFiles {
            dir: dir.to_path_buf(),
        });
    }

    logs.sort();

    Ok(logs)
}

/// Benchmark results of every machine and lock mode, ready to be charted.
///
/// Machines and modes are kept in the order they first appear in the loaded file list, which
/// determines the row and column order of the rendered charts.
#[derive(Clone, Debug, Default)]
pub struct ResultGrid {
    machines: Vec<String>,
    modes: Vec<LockMode>,
    cells: HashMap<(String, LockMode), Vec<TimingBlock>>,
}

impl ResultGrid {
    /// Creates an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.log` file in `dir`.
    ///
    /// # Errors
    ///
    /// Fails if the directory holds no logs, or if any log has an invalid name, cannot be read
    /// or does not contain exactly [`BLOCKS_PER_LOG`] consistent blocks.
    pub fn load_dir(dir: &Path) -> crate::Result<Self> {
        let logs = discover_logs(dir)?;

        info!(dir = %dir.display(), count = logs.len(), "loading benchmark logs");

        Self::load_files(&logs)
    }

    /// Loads the given log files, in order.
    ///
    /// # Errors
    ///
    /// See [`load_dir()`][Self::load_dir].
    pub fn load_files(paths: &[PathBuf]) -> crate::Result<Self> {
        let mut grid = Self::new();

        for path in paths {
            let identity = LogIdentity::from_path(path)?;
            let blocks = parse_log(path)?;

            if blocks.len() != BLOCKS_PER_LOG {
                return Err(Error::UnexpectedBlockCount {
                    file: path.clone(),
                    expected: BLOCKS_PER_LOG,
                    actual: blocks.len(),
                });
            }

            for block in &blocks {
                block.validate(path)?;
            }

            debug!(
                file = %path.display(),
                machine = %identity.machine,
                mode = %identity.mode,
                "parsed benchmark log"
            );

            grid.insert(identity, blocks);
        }

        Ok(grid)
    }

    /// Stores the blocks of one log, replacing any earlier log of the same machine and mode.
    pub fn insert(&mut self, identity: LogIdentity, blocks: Vec<TimingBlock>) {
        let LogIdentity { machine, mode, .. } = identity;

        if !self.machines.contains(&machine) {
            self.machines.push(machine.clone());
        }

        if !self.modes.contains(&mode) {
            self.modes.push(mode);
        }

        if self.cells.insert((machine.clone(), mode), blocks).is_some() {
            warn!(%machine, %mode, "multiple logs for the same machine and mode, keeping the last");
        }
    }

    /// Machines in first-appearance order.
    #[must_use]
    pub fn machines(&self) -> &[String] {
        &self.machines
    }

    /// Lock modes in first-appearance order.
    #[must_use]
    pub fn modes(&self) -> &[LockMode] {
        &self.modes
    }

    /// The blocks of one machine and mode, if a log for that combination was loaded.
    #[must_use]
    pub fn blocks(&self, machine: &str, mode: LockMode) -> Option<&[TimingBlock]> {
        self.cells
            .get(&(machine.to_string(), mode))
            .map(Vec::as_slice)
    }

    /// Whether no log has been loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::test_support::SIX_BLOCK_LOG;

    fn write(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).unwrap();
    }

    #[test]
    fn empty_dir_is_not_found() {
        let dir = TempDir::new().unwrap();
        write(&dir, "notes.txt", "not a log");

        let error = ResultGrid::load_dir(dir.path()).unwrap_err();

        assert!(matches!(error, Error::NoLogFiles { .. }));
    }

    #[test]
    fn missing_dir_is_not_found() {
        let dir = TempDir::new().unwrap();

        let error = ResultGrid::load_dir(&dir.path().join("results")).unwrap_err();

        assert!(matches!(error, Error::NoLogFiles { .. }));
    }

    #[test]
    fn logs_are_discovered_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        write(&dir, "b-python3.14-GIL.log", SIX_BLOCK_LOG);
        write(&dir, "a-python3.14-GIL.log", SIX_BLOCK_LOG);
        write(&dir, "c.txt", "");

        let names: Vec<_> = discover_logs(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a-python3.14-GIL.log", "b-python3.14-GIL.log"]);
    }

    #[test]
    fn grid_keeps_first_appearance_order() {
        let dir = TempDir::new().unwrap();
        write(&dir, "alpha-sumbench0.1.0-free_thread.log", SIX_BLOCK_LOG);
        write(&dir, "alpha-sumbench0.1.0-GIL.log", SIX_BLOCK_LOG);
        write(&dir, "beta-python3.14-GIL.log", SIX_BLOCK_LOG);

        let grid = ResultGrid::load_dir(dir.path()).unwrap();

        assert_eq!(grid.machines(), ["alpha", "beta"]);
        // "GIL" sorts before "free_thread" in byte order.
        assert_eq!(grid.modes(), [LockMode::Gil, LockMode::FreeThread]);
        assert_eq!(grid.blocks("alpha", LockMode::FreeThread).unwrap().len(), 6);
        assert!(grid.blocks("beta", LockMode::FreeThread).is_none());
    }

    #[test]
    fn short_log_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "m-python3.14-GIL.log",
            "#### SEQUENTIAL ####\nsequential.sum_loop elapsed time : 1.0\n",
        );

        let error = ResultGrid::load_dir(dir.path()).unwrap_err();

        assert!(matches!(
            error,
            Error::UnexpectedBlockCount {
                expected: 6,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn badly_named_log_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(&dir, "results.log", SIX_BLOCK_LOG);

        let error = ResultGrid::load_dir(dir.path()).unwrap_err();

        assert!(matches!(error, Error::InvalidFileName { .. }));
    }

    #[test]
    fn inconsistent_block_is_rejected() {
        let dir = TempDir::new().unwrap();
        let broken = SIX_BLOCK_LOG.replace(
            "thread_pool.sum_loop(max_wks = 2) elapsed time : 0.17",
            "thread_pool.sum_loop elapsed time : 0.17",
        );
        write(&dir, "m-python3.14-GIL.log", &broken);

        let error = ResultGrid::load_dir(dir.path()).unwrap_err();

        assert!(matches!(error, Error::InconsistentBlock { .. }));
    }
}
