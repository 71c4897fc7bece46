use std::fmt::Display;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use itertools::Itertools;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::register_font;
use tracing::info;

use crate::{Error, ResultGrid, TimingBlock};

const CELL_WIDTH: u32 = 640;
const CELL_HEIGHT: u32 = 420;
const TITLE_HEIGHT: u32 = 60;

// Number of dashes in a reference line, regardless of the x range.
const DASHES: u32 = 40;

const FONT_FAMILY: &str = "sans-serif";
const FONT: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");

// Every chart draws text, so the bundled font is registered once before the first chart.
static FONT_REGISTERED: LazyLock<bool> =
    LazyLock::new(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT).is_ok());

/// Image format of rendered charts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum ChartFormat {
    /// Raster image with text rendered from the bundled font.
    #[default]
    Png,

    /// Scalable vector graphics, for viewers that scale or restyle the charts.
    Svg,
}

impl ChartFormat {
    /// File extension of the format, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

impl FromStr for ChartFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

/// A group of timing blocks that share one chart.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Category {
    /// Human-readable name, used in the chart title.
    pub name: &'static str,

    /// Indexes of the category's blocks within each log.
    pub blocks: Range<usize>,

    /// File name of the chart, without extension.
    pub file_stem: &'static str,
}

/// The charted categories: scalar loop blocks first, vectorized blocks second.
pub const CATEGORIES: [Category; 2] = [
    Category {
        name: "Pure Loop",
        blocks: 0..3,
        file_stem: "combined_pure_loop",
    },
    Category {
        name: "Vectorized",
        blocks: 3..6,
        file_stem: "combined_vectorized",
    },
];

/// Renders one chart per [`Category`] into `out_dir` and returns the written paths.
///
/// Each chart is a grid with one row per machine and one column per lock mode. Sequential
/// blocks are drawn as dashed horizontal reference lines, pooled blocks as marker-connected
/// lines over their worker count sweep.
///
/// # Errors
///
/// Fails if `out_dir` cannot be created or if drawing fails.
pub fn render_charts(
    grid: &ResultGrid,
    out_dir: &Path,
    format: ChartFormat,
) -> crate::Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|source| Error::io(out_dir, source))?;

    let size = figure_size(grid);

    CATEGORIES
        .iter()
        .map(|category| {
            let path = out_dir.join(format!("{}.{}", category.file_stem, format.extension()));

            render_category(grid, category, &path, format, size)?;

            info!(path = %path.display(), category = category.name, "rendered chart");

            Ok(path)
        })
        .collect()
}

fn render_category(
    grid: &ResultGrid,
    category: &Category,
    path: &Path,
    format: ChartFormat,
    size: (u32, u32),
) -> crate::Result<()> {
    let render_error = |e: &dyn Display| Error::Render {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    if !*FONT_REGISTERED {
        return Err(render_error(&"bundled font could not be loaded"));
    }

    match format {
        ChartFormat::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_category(&root, grid, category).map_err(|e| render_error(&e))
        }
        ChartFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_category(&root, grid, category).map_err(|e| render_error(&e))
        }
    }
}

fn figure_size(grid: &ResultGrid) -> (u32, u32) {
    let rows = u32::try_from(grid.machines().len().max(1)).unwrap_or(u32::MAX);
    let cols = u32::try_from(grid.modes().len().max(1)).unwrap_or(u32::MAX);

    (
        cols.saturating_mul(CELL_WIDTH),
        rows.saturating_mul(CELL_HEIGHT).saturating_add(TITLE_HEIGHT),
    )
}

fn draw_category<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    grid: &ResultGrid,
    category: &Category,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let body = root.titled(
        &format!("ThreadPool vs ProcessPool - {}", category.name),
        ("sans-serif", 28),
    )?;

    let cells = body.split_evenly((grid.machines().len().max(1), grid.modes().len().max(1)));

    let positions = grid
        .machines()
        .iter()
        .enumerate()
        .cartesian_product(grid.modes().iter().enumerate());

    for (area, ((row, machine), (col, &mode))) in cells.iter().zip(positions) {
        let blocks = grid
            .blocks(machine, mode)
            .and_then(|blocks| blocks.get(category.blocks.clone()));

        let mut caption = if row == 0 {
            mode.to_string()
        } else {
            String::new()
        };

        if blocks.is_none() {
            if !caption.is_empty() {
                caption.push_str(": ");
            }
            caption.push_str("no data");
        }

        let y_desc = if col == 0 {
            format!("{machine} - Elapsed Time (s)")
        } else {
            "Elapsed Time (s)".to_string()
        };

        draw_cell(area, &caption, &y_desc, blocks.unwrap_or_default())?;
    }

    root.present()
}

fn draw_cell<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    caption: &str,
    y_desc: &str,
    blocks: &[TimingBlock],
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let x_end = blocks
        .iter()
        .flat_map(|block| block.max_wks.iter().copied())
        .max()
        .map_or(2.0, |max_wks| f64::from(max_wks) + 1.0);

    let y_end = blocks
        .iter()
        .flat_map(|block| block.elapsed.iter().copied())
        .fold(0.0, f64::max);
    let y_end = if y_end > 0.0 { y_end * 1.1 } else { 1.0 };

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60);

    if !caption.is_empty() {
        builder.caption(caption, ("sans-serif", 20));
    }

    let mut chart = builder.build_cartesian_2d(0.0..x_end, 0.0..y_end)?;

    chart
        .configure_mesh()
        .x_desc("max_workers")
        .y_desc(y_desc)
        .draw()?;

    if blocks.is_empty() {
        return Ok(());
    }

    for (index, block) in blocks.iter().enumerate() {
        let style = Palette99::pick(index).stroke_width(2);

        if block.is_sequential() {
            let Some(&seconds) = block.elapsed.first() else {
                continue;
            };

            chart
                .draw_series(dashes(x_end).map(|(from, to)| {
                    PathElement::new(vec![(from, seconds), (to, seconds)], style)
                }))?
                .label(format!("{} ({seconds:.3}s)", block.title))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        } else {
            let points: Vec<_> = block
                .points()
                .map(|(max_wks, seconds)| (f64::from(max_wks), seconds))
                .collect();

            chart
                .draw_series(LineSeries::new(points.iter().copied(), style))?
                .label(block.title.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));

            chart.draw_series(
                points
                    .iter()
                    .map(|&point| Circle::new(point, 3, style.filled())),
            )?;
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
}

/// Start and end of each dash of a horizontal dashed line spanning `0..x_end`.
fn dashes(x_end: f64) -> impl Iterator<Item = (f64, f64)> {
    let period = x_end / f64::from(DASHES);
    let dash = period * 0.6;

    (0..DASHES)
        .map(move |i| f64::from(i) * period)
        .map(move |start| (start, (start + dash).min(x_end)))
}
