//! Table layout: the header band and the body band of the report.
//!
//! Both bands are laid out in a single pass, one row at a time. Every row gets exactly one cell
//! per column, all cells of a row share the same height, and the cursor moves to the next line
//! after each row. Rows that reach the bottom margin continue on a new page through the canvas; the
//! header band is drawn once.

use log::{debug, warn};

use crate::canvas::ReportCanvas;
use crate::error::ReportError;
use crate::fonts::REPORT_FONT_FAMILY;
use crate::model::{CellSpec, FontWeight, HorizontalAlignment, Rgb};
use crate::table::Row;

/// Height of header and body cells in millimetres.
pub const ROW_HEIGHT_MM: f64 = 7.0;

/// How the usable page width is divided between columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ColumnWidths {
    /// Every column gets the same share of the usable width.
    #[default]
    Uniform,
    /// Explicit widths in millimetres, one per column.
    Fixed(Vec<f64>),
}

/// Font and background of one table band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BandStyle {
    /// Font weight of the band.
    pub weight: FontWeight,
    /// Font size in points.
    pub size: u8,
    /// Cell background.
    pub fill: Rgb,
}

/// Width of each column when `usable_width` is split evenly between `column_count` columns.
pub fn uniform_column_width(usable_width: f64, column_count: usize) -> f64 {
    if column_count == 0 {
        0.0
    } else {
        usable_width / column_count as f64
    }
}

/// Lays out the header and body bands of a table on a [`ReportCanvas`].
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutEngine {
    header: BandStyle,
    body: BandStyle,
    row_height: f64,
    column_widths: ColumnWidths,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self {
            header: BandStyle {
                weight: FontWeight::Bold,
                size: 16,
                fill: Rgb::LIGHT_GRAY,
            },
            body: BandStyle {
                weight: FontWeight::Regular,
                size: 16,
                fill: Rgb::WHITE,
            },
            row_height: ROW_HEIGHT_MM,
            column_widths: ColumnWidths::Uniform,
        }
    }
}

impl LayoutEngine {
    /// Creates a layout engine with the standard report styling and uniform columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how column widths are computed and returns the updated engine.
    pub fn with_column_widths(mut self, column_widths: ColumnWidths) -> Self {
        self.column_widths = column_widths;
        self
    }

    /// Returns the header band style.
    pub fn header_style(&self) -> BandStyle {
        self.header
    }

    /// Returns the body band style.
    pub fn body_style(&self) -> BandStyle {
        self.body
    }

    /// Checks that a fixed width table matches `column_count` and only holds positive widths.
    pub fn validate(&self, column_count: usize) -> Result<(), ReportError> {
        match &self.column_widths {
            ColumnWidths::Uniform => Ok(()),
            ColumnWidths::Fixed(widths) if widths.len() != column_count => {
                Err(ReportError::InvalidConfig(format!(
                    "{} column widths given for {} columns",
                    widths.len(),
                    column_count
                )))
            }
            ColumnWidths::Fixed(widths) => match widths.iter().find(|width| **width <= 0.0) {
                Some(width) => Err(ReportError::InvalidConfig(format!(
                    "column width {} is not positive",
                    width
                ))),
                None => Ok(()),
            },
        }
    }

    /// Returns the width of every column for a page with `usable_width` millimetres to spare.
    ///
    /// A fixed width table that does not match `column_count` is ignored in favour of uniform
    /// widths.
    pub fn column_widths(&self, usable_width: f64, column_count: usize) -> Vec<f64> {
        match &self.column_widths {
            ColumnWidths::Fixed(widths) if widths.len() == column_count => widths.clone(),
            ColumnWidths::Fixed(widths) => {
                warn!(
                    "Ignoring {} fixed column widths for a table with {} columns",
                    widths.len(),
                    column_count
                );
                vec![uniform_column_width(usable_width, column_count); column_count]
            }
            ColumnWidths::Uniform => {
                vec![uniform_column_width(usable_width, column_count); column_count]
            }
        }
    }

    /// Draws the header row in bold on a light gray background.
    pub fn render_header<C>(&self, canvas: &mut C, header: &[String], column_count: usize)
    where
        C: ReportCanvas + ?Sized,
    {
        if column_count == 0 {
            return;
        }
        let widths = self.column_widths(canvas.usable_width(), column_count);
        self.apply_band(canvas, self.header);
        self.render_row(canvas, header, &widths);
        debug!("Rendered header band with {} columns", column_count);
    }

    /// Draws every body row in the regular weight on a white background.
    pub fn render_body<C>(&self, canvas: &mut C, rows: &[Row], column_count: usize)
    where
        C: ReportCanvas + ?Sized,
    {
        if column_count == 0 || rows.is_empty() {
            return;
        }
        let widths = self.column_widths(canvas.usable_width(), column_count);
        self.apply_band(canvas, self.body);
        for row in rows {
            self.render_row(canvas, row, &widths);
        }
        debug!("Rendered body band with {} rows", rows.len());
    }

    fn apply_band<C>(&self, canvas: &mut C, band: BandStyle)
    where
        C: ReportCanvas + ?Sized,
    {
        canvas.set_font(REPORT_FONT_FAMILY, band.weight, band.size);
        canvas.set_fill_color(band.fill);
    }

    fn render_row<C>(&self, canvas: &mut C, cells: &[String], widths: &[f64])
    where
        C: ReportCanvas + ?Sized,
    {
        // Missing trailing cells render blank; surplus cells have no column and are skipped.
        for (index, width) in widths.iter().enumerate() {
            let text = cells.get(index).map(String::as_str).unwrap_or("");
            let cell = CellSpec::new(*width, self.row_height, text)
                .with_border(true)
                .with_alignment(HorizontalAlignment::Center)
                .with_fill(true);
            canvas.place_cell(&cell);
        }
        canvas.new_line(-1.0);
    }
}
