//! Line protocol spoken between a [`ProcessPool`][crate::ProcessPool] and its worker processes.
//!
//! The parent writes one request line `<start> <end>` per assigned partition to the worker's
//! stdin and then closes it. The worker answers every request, in order, with one line holding
//! the sum of `start..end`, and exits once stdin is exhausted.

use std::io::{BufRead, Write};
use std::ops::Range;

use crate::{Error, Partition, Workload};

/// Formats the request line for a partition, including the line terminator.
#[must_use]
pub fn encode_request(partition: &Partition) -> String {
    format!("{} {}\n", partition.start(), partition.end())
}

/// Parses a request line (without terminator) into the range it asks to sum.
pub fn parse_request(line: &str) -> crate::Result<Range<u64>> {
    let Some((start, end)) = line.trim().split_once(' ') else {
        return Err(Error::protocol(line, "expected '<start> <end>'"));
    };

    let start = start
        .parse::<u64>()
        .map_err(|e| Error::protocol(line, format!("start is not an unsigned integer: {e}")))?;
    let end = end
        .trim()
        .parse::<u64>()
        .map_err(|e| Error::protocol(line, format!("end is not an unsigned integer: {e}")))?;

    if start > end {
        return Err(Error::protocol(line, "start must be <= end"));
    }

    Ok(start..end)
}

/// Parses a response line (without terminator) into the partition sum it carries.
pub fn parse_response(line: &str) -> crate::Result<u64> {
    line.trim()
        .parse::<u64>()
        .map_err(|e| Error::protocol(line, format!("sum is not an unsigned integer: {e}")))
}

/// Runs the worker side of the protocol until `input` is exhausted.
///
/// Returns the number of requests that were served.
pub fn serve_worker(
    input: impl BufRead,
    mut output: impl Write,
    workload: Workload,
) -> crate::Result<usize> {
    let mut served: usize = 0;

    for line in input.lines() {
        let line = line.map_err(Error::Io)?;

        if line.trim().is_empty() {
            continue;
        }

        let range = parse_request(&line)?;
        writeln!(output, "{}", workload.sum(range)).map_err(Error::Io)?;

        served = served.saturating_add(1);
    }

    output.flush().map_err(Error::Io)?;

    Ok(served)
}
