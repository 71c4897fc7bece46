#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Reads the text logs written by the summation benchmark and renders comparison charts.
//!
//! A log is a sequence of timing blocks. Each block starts with a title line such as
//! `#### ThreadPool ####` and contains one timing line per measured run:
//!
//! ```text
//! #### ThreadPool ####
//! thread_pool.sum_loop(max_wks = 1) elapsed time : 0.3101
//! thread_pool.sum_loop(max_wks = 2) elapsed time : 0.1623
//! ```
//!
//! The machine and lock mode a log belongs to are encoded in its file name
//! (see [`LogIdentity`]). A [`ResultGrid`] collects the logs of a results directory and
//! [`render_charts()`] draws one image per workload category, with a row per machine and a
//! column per lock mode.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use bench_logs::{ChartFormat, ResultGrid, render_charts};
//!
//! let grid = ResultGrid::load_dir(Path::new("results"))?;
//! let images = render_charts(&grid, Path::new("results"), ChartFormat::Png)?;
//!
//! for image in images {
//!     println!("{}", image.display());
//! }
//! # Ok::<(), bench_logs::Error>(())
//! ```
//!
//! Charts are PNG images by default. Text is drawn with a font bundled into the crate, so
//! rendering does not depend on the fonts installed on the machine. [`ChartFormat::Svg`] writes
//! vector images instead.

mod block;
mod chart;
mod error;
mod grid;
mod identity;
mod parse;

#[cfg(test)]
mod test_support;

pub use block::*;
pub use chart::*;
pub use error::*;
pub use grid::*;
pub use identity::*;
pub use parse::*;
