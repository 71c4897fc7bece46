use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, TimingBlock};

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^####\s+(.+?)\s+####$").expect("title pattern is valid"));

static MAX_WORKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"max_wks\s*=\s*(\d+)").expect("worker pattern is valid"));

// Older logs report the mean of repeated runs as "average time".
static ELAPSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:elapsed|average)\s*(?:time)?\s*:\s*([\d.]+)").expect("time pattern is valid")
});

/// Reads a benchmark log from disk and splits it into timing blocks.
///
/// See [`parse_log_str()`] for the accepted format.
///
/// # Errors
///
/// Fails if the file cannot be read.
pub fn parse_log(path: &Path) -> crate::Result<Vec<TimingBlock>> {
    let text = fs::read_to_string(path).map_err(|source| Error::io(path, source))?;

    Ok(parse_log_str(&text))
}

/// Splits the text of a benchmark log into timing blocks.
///
/// Every `#### <title> ####` line starts a new block. Inside a block, a line containing
/// `elapsed time : <seconds>` (or `average time : <seconds>`) adds a measurement, and if the same
/// line contains `max_wks = <n>` the worker count is recorded alongside it. Blank lines, lines
/// before the first title and lines matching neither pattern are ignored.
///
/// # Example
///
/// ```
/// let blocks = bench_logs::parse_log_str(
///     "#### SEQUENTIAL ####\n\
///      sequential.sum_loop elapsed time : 1.5\n\
///      ##### ThreadPool ####\n\
///      thread_pool.sum_loop(max_wks = 1) elapsed time : 1.6\n\
///      thread_pool.sum_loop(max_wks = 2) elapsed time : 0.8\n",
/// );
///
/// assert_eq!(blocks.len(), 2);
/// assert_eq!(blocks[0].elapsed, vec![1.5]);
/// assert_eq!(blocks[1].max_wks, vec![1, 2]);
/// ```
#[must_use]
pub fn parse_log_str(text: &str) -> Vec<TimingBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<TimingBlock> = None;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(title) = TITLE.captures(line).and_then(|c| c.get(1)) {
            blocks.extend(current.replace(TimingBlock::new(title.as_str())));
            continue;
        }

        let Some(block) = current.as_mut() else {
            continue;
        };

        let Some(elapsed) = capture_number::<f64>(&ELAPSED, line) else {
            continue;
        };

        if let Some(max_wks) = capture_number::<u32>(&MAX_WORKERS, line) {
            block.max_wks.push(max_wks);
        }

        block.elapsed.push(elapsed);
    }

    blocks.extend(current);

    blocks
}

fn capture_number<T: std::str::FromStr>(pattern: &Regex, line: &str) -> Option<T> {
    pattern
        .captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::test_support::SIX_BLOCK_LOG;

    #[test]
    fn well_formed_log_yields_six_blocks() {
        let blocks = parse_log_str(SIX_BLOCK_LOG);

        assert_eq!(blocks.len(), 6);

        let titles: Vec<_> = blocks.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "SEQUENTIAL",
                "ThreadPool",
                "ProcessPool",
                "SEQUENTIAL-Vectorized",
                "ThreadPool-Vectorized",
                "ProcessPool-Vectorized"
            ]
        );

        for (index, block) in blocks.iter().enumerate() {
            if index % 3 == 0 {
                assert!(block.max_wks.is_empty());
                assert_eq!(block.elapsed.len(), 1);
            } else {
                assert_eq!(block.max_wks, vec![1, 2, 3]);
                assert_eq!(block.max_wks.len(), block.elapsed.len());
            }
        }

        assert_eq!(blocks[2].elapsed, vec![0.35, 0.2, 0.15]);
    }

    #[test]
    fn noise_is_ignored() {
        let blocks = parse_log_str(
            "GIL: True\n\
             sequential.sum_loop elapsed time : 9.9\n\
             \n\
             ####   SEQUENTIAL   ####\n\
             some unrelated chatter\n\
             \t sequential.sumup elapsed time : 2.5  \n",
        );

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].title, "SEQUENTIAL");
        assert_eq!(blocks[0].elapsed, vec![2.5]);
    }

    #[test]
    fn average_phrasing_is_accepted() {
        let blocks = parse_log_str(
            "#### ThreadPool ####\n\
             threadpool.sumup(max_wks = 4) average time : 0.25\n\
             threadpool.sumup(max_wks = 5) average: 0.2\n",
        );

        assert_eq!(blocks[0].max_wks, vec![4, 5]);
        assert_eq!(blocks[0].elapsed, vec![0.25, 0.2]);
    }

    #[test]
    fn worker_count_without_time_is_ignored() {
        let blocks = parse_log_str("#### ThreadPool ####\nmax_wks = 3 but no timing\n");

        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].max_wks.is_empty());
        assert!(blocks[0].elapsed.is_empty());
    }

    #[test]
    fn empty_blocks_are_kept() {
        let blocks = parse_log_str("#### A ####\n#### B ####\n");

        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.elapsed.is_empty()));
    }

    #[test]
    fn reads_log_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SIX_BLOCK_LOG.as_bytes()).unwrap();

        let blocks = parse_log(file.path()).unwrap();

        assert_eq!(blocks.len(), 6);
    }

    #[test]
    fn missing_file_is_io_error() {
        let error = parse_log(Path::new("/nonexistent/results/x.log")).unwrap_err();

        assert!(matches!(error, Error::Io { .. }));
    }
}
