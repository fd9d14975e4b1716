//! End-to-end report generation: table in, `reporte.pdf` out.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::canvas::{PdfCanvas, ReportCanvas};
use crate::error::ReportError;
use crate::fonts::REPORT_FONT_FAMILY;
use crate::images::{ImageSource, ImageStrategy};
use crate::layout::{ColumnWidths, LayoutEngine};
use crate::model::{FontWeight, PageSetup, Rect};
use crate::table::{RowPolicy, Table, TableOptions};

/// Table read when no source is given.
pub const DEFAULT_SOURCE: &str = "cities.csv";
/// File stem of the generated report; `.pdf` is appended.
pub const DEFAULT_OUTPUT_NAME: &str = "reporte";
/// Heading printed at the top of the page.
pub const DEFAULT_TITLE: &str = "Daily Report";
/// Decorative image placed in the top-right corner when it exists.
pub const DEFAULT_IMAGE: &str = "stats.png";
/// `chrono` format of the date stamp, e.g. `Mon Jan 2, 2006`.
pub const DATE_FORMAT: &str = "%a %b %-d, %Y";
/// Name under which the decorative image is registered on the canvas.
pub const IMAGE_NAME: &str = "Imagen";
/// Absolute position and size of the decorative image.
pub const IMAGE_RECT: Rect = Rect {
    x: 225.0,
    y: 10.0,
    width: 25.0,
    height: 25.0,
};

/// Formats the current local date for the report header.
pub fn today() -> String {
    chrono::Local::now().format(DATE_FORMAT).to_string()
}

/// Everything a single report run needs to know.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportConfig {
    source: PathBuf,
    output_name: String,
    output_dir: PathBuf,
    title: String,
    date_text: Option<String>,
    image: Option<PathBuf>,
    image_strategy: ImageStrategy,
    row_policy: RowPolicy,
    column_widths: ColumnWidths,
    page: PageSetup,
    font_directory: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE)
    }
}

impl ReportConfig {
    /// Creates a configuration for `source` with the standard report settings.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output_name: DEFAULT_OUTPUT_NAME.to_owned(),
            output_dir: PathBuf::from("."),
            title: DEFAULT_TITLE.to_owned(),
            date_text: None,
            image: Some(PathBuf::from(DEFAULT_IMAGE)),
            image_strategy: ImageStrategy::default(),
            row_policy: RowPolicy::default(),
            column_widths: ColumnWidths::default(),
            page: PageSetup::default(),
            font_directory: None,
        }
    }

    /// Sets the output file stem; `.pdf` is appended.
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self
    }

    /// Sets the directory the report is written to.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the heading printed above the date.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Replaces the current date with fixed text, for reproducible output.
    pub fn with_date_text(mut self, date: impl Into<String>) -> Self {
        self.date_text = Some(date.into());
        self
    }

    /// Sets the decorative image, or disables it with `None`.
    pub fn with_image(mut self, image: impl Into<Option<PathBuf>>) -> Self {
        self.image = image.into();
        self
    }

    /// Chooses how the image file reaches the canvas.
    pub fn with_image_strategy(mut self, strategy: ImageStrategy) -> Self {
        self.image_strategy = strategy;
        self
    }

    /// Sets how body rows of the wrong length are handled.
    pub fn with_row_policy(mut self, policy: RowPolicy) -> Self {
        self.row_policy = policy;
        self
    }

    /// Sets uniform or fixed column widths.
    pub fn with_column_widths(mut self, widths: ColumnWidths) -> Self {
        self.column_widths = widths;
        self
    }

    /// Sets the paper size, orientation and margin.
    pub fn with_page_setup(mut self, page: PageSetup) -> Self {
        self.page = page;
        self
    }

    /// Searches `directory` for the report fonts before the default locations.
    pub fn with_font_directory(mut self, directory: impl Into<Option<PathBuf>>) -> Self {
        self.font_directory = directory.into();
        self
    }

    /// Returns the table file.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Returns the report heading.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the decorative image, if one is configured.
    pub fn image(&self) -> Option<&Path> {
        self.image.as_deref()
    }

    /// Returns how the image is loaded.
    pub fn image_strategy(&self) -> ImageStrategy {
        self.image_strategy
    }

    /// Returns the row policy used when loading the table.
    pub fn row_policy(&self) -> RowPolicy {
        self.row_policy
    }

    /// Returns the page geometry.
    pub fn page_setup(&self) -> PageSetup {
        self.page
    }

    /// Returns the path the report is written to: `<output_dir>/<output_name>.pdf`.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.pdf", self.output_name))
    }
}

/// Runs the report workflow for one [`ReportConfig`].
///
/// Stages run strictly in order: load the table, open the page, title and date, optional image,
/// header band, body band, deferred error check, save. A failed table load or deferred error
/// aborts the run before anything is written; a missing image is logged and skipped.
#[derive(Clone, Debug)]
pub struct ReportAssembler {
    config: ReportConfig,
    layout: LayoutEngine,
}

impl ReportAssembler {
    /// Creates an assembler whose layout follows `config`.
    pub fn new(config: ReportConfig) -> Self {
        let layout = LayoutEngine::new().with_column_widths(config.column_widths.clone());
        Self { config, layout }
    }

    /// Returns the configuration of this run.
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Generates the report and returns the path of the written file.
    pub fn run(&self) -> Result<PathBuf, ReportError> {
        let source = &self.config.source;
        debug!("Stage: load table from {}", source.display());
        let options = TableOptions::for_path(source).with_row_policy(self.config.row_policy);
        let table = Table::load(source, &options)?;

        debug!("Stage: open document");
        let mut canvas = PdfCanvas::open(self.config.page)
            .with_title(self.config.title.clone())
            .with_font_directory(self.config.font_directory.clone());

        self.assemble(&mut canvas, &table)?;

        debug!("Stage: check deferred errors");
        canvas.check()?;

        let output = self.config.output_path();
        debug!("Stage: save to {}", output.display());
        canvas.save(&output)?;
        info!(
            "Report for {} rows written to {}",
            table.body().len(),
            output.display()
        );
        Ok(output)
    }

    /// Draws the whole report onto `canvas`.
    ///
    /// Only configuration problems are returned here. Drawing failures stay in the canvas error
    /// slot for the caller to check.
    pub fn assemble<C>(&self, canvas: &mut C, table: &Table) -> Result<(), ReportError>
    where
        C: ReportCanvas + ?Sized,
    {
        let column_count = table.column_count();
        self.layout.validate(column_count)?;

        debug!("Stage: title and date");
        self.place_title_and_date(canvas);

        debug!("Stage: image");
        self.place_image(canvas);

        debug!("Stage: header with {} columns", column_count);
        self.layout
            .render_header(canvas, table.header(), column_count);

        debug!("Stage: body with {} rows", table.body().len());
        self.layout.render_body(canvas, table.body(), column_count);
        Ok(())
    }

    fn place_title_and_date<C>(&self, canvas: &mut C)
    where
        C: ReportCanvas + ?Sized,
    {
        canvas.set_font(REPORT_FONT_FAMILY, FontWeight::Bold, 28);
        canvas.place_text(40.0, 10.0, &self.config.title);
        canvas.new_line(12.0);

        let date = self.config.date_text.clone().unwrap_or_else(today);
        canvas.set_font(REPORT_FONT_FAMILY, FontWeight::Regular, 20);
        canvas.place_text(40.0, 10.0, &date);
        canvas.new_line(20.0);
    }

    fn place_image<C>(&self, canvas: &mut C)
    where
        C: ReportCanvas + ?Sized,
    {
        let Some(path) = self.config.image.as_deref() else {
            debug!("No image configured");
            return;
        };
        match ImageSource::load(self.config.image_strategy, path) {
            Ok(source) => {
                canvas.register_image(IMAGE_NAME, &source);
                canvas.place_image(IMAGE_NAME, IMAGE_RECT);
            }
            Err(err) => warn!("Skipping image {}: {}", path.display(), err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgba};

    use crate::model::DrawOp;

    const CITIES: &str = "name,population\nTokyo,37400000\nDelhi,30290000\n";

    fn cities() -> Table {
        Table::from_reader(CITIES.as_bytes(), "cities.csv", &TableOptions::new())
            .expect("parse cities")
    }

    fn write_png(path: &Path) {
        let buffer = ImageBuffer::from_fn(6, 6, |x, y| Rgba([x as u8 * 40, y as u8 * 40, 200, 128]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(buffer)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .expect("encode png");
        fs::write(path, bytes).expect("write png");
    }

    fn assemble(config: ReportConfig, table: &Table) -> PdfCanvas {
        let mut canvas = PdfCanvas::open(config.page_setup());
        ReportAssembler::new(config)
            .assemble(&mut canvas, table)
            .expect("assemble");
        canvas
    }

    fn texts(canvas: &PdfCanvas) -> Vec<String> {
        canvas
            .operations()
            .iter()
            .filter_map(DrawOp::as_text)
            .map(|block| block.text.clone())
            .collect()
    }

    fn image_rects(canvas: &PdfCanvas) -> Vec<Rect> {
        canvas
            .operations()
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .filter_map(DrawOp::rect)
            .collect()
    }

    #[test]
    fn date_format_matches_reference_layout() {
        let date = chrono::NaiveDate::from_ymd_opt(2006, 1, 2).expect("valid date");
        assert_eq!(date.format(DATE_FORMAT).to_string(), "Mon Jan 2, 2006");
    }

    #[test]
    fn cities_report_draws_title_date_header_and_body() {
        let config = ReportConfig::default()
            .with_image(None)
            .with_date_text("Mon Jan 2, 2006");
        let canvas = assemble(config, &cities());

        assert!(!canvas.has_error());
        assert_eq!(
            texts(&canvas),
            [
                "Daily Report",
                "Mon Jan 2, 2006",
                "name",
                "population",
                "Tokyo",
                "37400000",
                "Delhi",
                "30290000",
            ]
        );
        assert!(image_rects(&canvas).is_empty());

        let title = canvas.operations()[0].as_text().expect("title");
        assert!(title.font.is_bold());
        assert_eq!(title.font.size(), 28);
        assert_eq!(title.rect, Rect::new(10.0, 10.0, 40.0, 10.0));
        assert!(!title.border);
        assert_eq!(title.fill, None);

        let date = canvas.operations()[1].as_text().expect("date");
        assert!(!date.font.is_bold());
        assert_eq!(date.font.size(), 20);
        assert_eq!(date.rect.y, 22.0);

        let header = canvas.operations()[2].as_text().expect("header");
        assert_eq!(header.rect.y, 42.0);
    }

    #[test]
    fn header_only_table_draws_no_body_cells() {
        let table = Table::from_rows(vec![vec!["a".into(), "b".into(), "c".into()]])
            .expect("non-empty table");
        let canvas = assemble(ReportConfig::default().with_image(None), &table);
        assert_eq!(texts(&canvas).len(), 2 + 3);
    }

    #[test]
    fn missing_image_leaves_table_content_unchanged() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let date = "Mon Jan 2, 2006";
        let without = assemble(
            ReportConfig::default().with_image(None).with_date_text(date),
            &cities(),
        );
        let missing = assemble(
            ReportConfig::default()
                .with_image(dir.path().join("stats.png"))
                .with_date_text(date),
            &cities(),
        );

        assert!(!missing.has_error());
        assert!(image_rects(&missing).is_empty());
        assert_eq!(without.operations(), missing.operations());
    }

    #[test]
    fn both_image_strategies_place_the_same_rect() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let image = dir.path().join("stats.png");
        write_png(&image);

        for strategy in [ImageStrategy::Path, ImageStrategy::Bytes] {
            let config = ReportConfig::default()
                .with_image(image.clone())
                .with_image_strategy(strategy);
            let canvas = assemble(config, &cities());
            assert!(!canvas.has_error(), "{:?}: {:?}", strategy, canvas.last_error());
            assert_eq!(image_rects(&canvas), [IMAGE_RECT], "{:?}", strategy);
            assert!(canvas.has_image(IMAGE_NAME));
        }
    }

    #[test]
    fn corrupt_image_is_a_deferred_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let image = dir.path().join("stats.png");
        fs::write(&image, b"not a png").expect("write garbage");

        let canvas = assemble(ReportConfig::default().with_image(image), &cities());
        assert!(matches!(canvas.check(), Err(ReportError::DeferredDraw(_))));
    }

    #[test]
    fn missing_source_fails_without_output() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = ReportConfig::new(dir.path().join("cities.csv")).with_output_dir(dir.path());
        let output = config.output_path();

        let err = ReportAssembler::new(config).run().unwrap_err();
        assert!(err.is_not_found());
        assert!(!output.exists());
    }

    #[test]
    fn mismatched_column_widths_fail_before_drawing() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let source = dir.path().join("cities.csv");
        fs::write(&source, CITIES).expect("write csv");
        let config = ReportConfig::new(&source)
            .with_output_dir(dir.path())
            .with_column_widths(ColumnWidths::Fixed(vec![50.0, 50.0, 50.0]));
        let output = config.output_path();

        let err = ReportAssembler::new(config).run().unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfig(_)));
        assert!(!output.exists());
    }

    #[test]
    fn long_tables_continue_on_following_pages() {
        let mut csv = String::from("name,population\n");
        for index in 0..60 {
            csv.push_str(&format!("city{},{}\n", index, index * 1000));
        }
        let table = Table::from_reader(csv.as_bytes(), "big.csv", &TableOptions::new())
            .expect("parse");
        let canvas = assemble(ReportConfig::default().with_image(None), &table);

        assert!(!canvas.has_error(), "{:?}", canvas.last_error());
        // 22 body rows fit below the title block, 27 on each following page.
        assert_eq!(canvas.page_count(), 3);

        let texts = texts(&canvas);
        assert_eq!(texts.len(), 2 + 2 + 60 * 2);
        assert_eq!(texts.iter().filter(|text| *text == "name").count(), 1);

        let operations = canvas.operations();
        let first_break = operations
            .iter()
            .position(|op| *op == DrawOp::NewPage)
            .expect("page break");
        let continued = operations[first_break + 1].as_text().expect("text op");
        assert_eq!(continued.text, "city22");
        assert_eq!(continued.rect.y, 10.0);
        assert!(!continued.font.is_bold());
    }

    #[test]
    fn output_path_appends_pdf_extension() {
        let config = ReportConfig::default()
            .with_output_dir("out")
            .with_output_name("weekly");
        assert_eq!(config.output_path(), Path::new("out").join("weekly.pdf"));
        assert_eq!(ReportConfig::default().output_path(), Path::new(".").join("reporte.pdf"));
    }
}
