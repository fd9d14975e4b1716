//! The report canvas: a cursor-driven drawing surface.
//!
//! Text and cells that would cross the bottom margin continue at the top margin of a new page,
//! keeping their horizontal position. Nothing is repeated on the new page.
//!
//! Drawing calls never fail on the spot. The first failure is stored in a deferred error slot,
//! every later drawing call is ignored, and [`PdfCanvas::save`] refuses to write a document while
//! the slot is occupied. This keeps layout code free of per-call error handling while still
//! guaranteeing that no broken report reaches the filesystem.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::{debug, info};

use crate::builder::DocumentBuilder;
use crate::elements::ReportPage;
use crate::error::{DrawError, ReportError};
use crate::fonts::REPORT_FONT_FAMILY;
use crate::images::ImageSource;
use crate::model::{
    CellSpec, DrawOp, FontSpec, FontWeight, PageSetup, Rect, Rgb, StyleContext, TextBlock,
};

/// The drawing contract used by the layout engine and the report assembler.
pub trait ReportCanvas {
    /// Returns the `(width, height)` of the page in millimetres.
    fn page_size(&self) -> (f64, f64);

    /// Returns the page width minus the left and right margins.
    fn usable_width(&self) -> f64;

    /// Switches the active font.
    fn set_font(&mut self, family: &str, weight: FontWeight, size: u8);

    /// Switches the active fill colour.
    fn set_fill_color(&mut self, color: Rgb);

    /// Draws an unbordered, left aligned text block and advances the cursor by `width`.
    fn place_text(&mut self, width: f64, height: f64, text: &str);

    /// Draws a text cell and advances the cursor by the cell width.
    fn place_cell(&mut self, cell: &CellSpec);

    /// Returns the number of pages started so far.
    fn page_count(&self) -> usize;

    /// Moves the cursor to the start of the next line.
    ///
    /// A `height` of zero or less advances by the tallest element drawn on the current line.
    fn new_line(&mut self, height: f64);

    /// Decodes `source` and keeps it under `name` for later placement.
    fn register_image(&mut self, name: &str, source: &ImageSource);

    /// Draws a registered image at absolute page coordinates.
    fn place_image(&mut self, name: &str, rect: Rect);

    /// Returns the stored deferred error, if any.
    fn last_error(&self) -> Option<&DrawError>;

    /// Returns `true` once any drawing call has failed.
    fn has_error(&self) -> bool {
        self.last_error().is_some()
    }

    /// Converts the deferred error into a [`ReportError`].
    fn check(&self) -> Result<(), ReportError> {
        match self.last_error() {
            Some(err) => Err(ReportError::DeferredDraw(err.clone())),
            None => Ok(()),
        }
    }
}

/// A [`ReportCanvas`] that records drawing operations and renders them to PDF with `genpdf`.
pub struct PdfCanvas {
    page: PageSetup,
    cursor_x: f64,
    cursor_y: f64,
    line_height: f64,
    page_count: usize,
    style: StyleContext,
    operations: Vec<DrawOp>,
    images: HashMap<String, DynamicImage>,
    error: Option<DrawError>,
    title: Option<String>,
    font_directory: Option<PathBuf>,
}

impl PdfCanvas {
    /// Creates a new document with one page and the cursor at the top-left margin.
    pub fn open(page: PageSetup) -> Self {
        Self {
            page,
            cursor_x: page.margin_mm(),
            cursor_y: page.margin_mm(),
            line_height: 0.0,
            page_count: 1,
            style: StyleContext::new(REPORT_FONT_FAMILY),
            operations: Vec::new(),
            images: HashMap::new(),
            error: None,
            title: None,
            font_directory: None,
        }
    }

    /// Sets the document title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Searches `directory` for the report fonts before the default locations.
    pub fn with_font_directory(mut self, directory: impl Into<Option<PathBuf>>) -> Self {
        self.font_directory = directory.into();
        self
    }

    /// Returns the page geometry.
    pub fn page_setup(&self) -> &PageSetup {
        &self.page
    }

    /// Returns the current cursor position `(x, y)`.
    pub fn cursor(&self) -> (f64, f64) {
        (self.cursor_x, self.cursor_y)
    }

    /// Returns the active style context.
    pub fn style(&self) -> &StyleContext {
        &self.style
    }

    /// Returns the drawing operations recorded so far, in drawing order.
    pub fn operations(&self) -> &[DrawOp] {
        &self.operations
    }

    /// Returns `true` when an image has been registered under `name`.
    pub fn has_image(&self, name: &str) -> bool {
        self.images.contains_key(name)
    }

    /// Decodes `source` and places it in one step, registering it under a name derived from the
    /// source.
    pub fn place_image_source(&mut self, source: &ImageSource, rect: Rect) {
        let name = match source {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes(_) => format!("bytes-{}", self.images.len()),
        };
        if !self.has_image(&name) {
            self.register_image(&name, source);
        }
        self.place_image(&name, rect);
    }

    /// Renders the document into memory.
    ///
    /// Fails with [`ReportError::DeferredDraw`] without loading any fonts when a drawing call
    /// failed earlier.
    pub fn render(self) -> Result<Vec<u8>, ReportError> {
        self.check()?;

        let mut builder = DocumentBuilder::new()
            .with_page_setup(self.page)
            .with_font_directory(self.font_directory);
        if let Some(title) = self.title {
            builder = builder.with_title(title);
        }
        let mut document = builder.build()?;

        let page = ReportPage::new(self.operations, self.images).map_err(ReportError::Render)?;
        document.push(page);

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(ReportError::Render)?;
        Ok(bytes)
    }

    /// Renders the document and writes it to `path`, consuming the canvas.
    ///
    /// Nothing is written unless rendering succeeds. A partially written file is removed.
    pub fn save(self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        let bytes = self.render()?;
        if let Err(err) = fs::write(path, &bytes) {
            let _ = fs::remove_file(path);
            return Err(ReportError::from_io(path, err));
        }
        info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    fn fail(&mut self, operation: &'static str, message: impl Into<String>) {
        if self.error.is_none() {
            let err = DrawError::new(operation, message);
            debug!("Canvas error recorded: {}", err);
            self.error = Some(err);
        }
    }

    fn bottom_limit(&self) -> f64 {
        self.page.size_mm().1 - self.page.margin_mm()
    }

    fn fits_on_page(&self, rect: &Rect) -> bool {
        // Text is allowed to run past the right edge; only the vertical extent is bounded.
        rect.x >= 0.0 && rect.y >= 0.0 && rect.bottom() <= self.bottom_limit()
    }

    fn break_page(&mut self) {
        self.operations.push(DrawOp::NewPage);
        self.page_count += 1;
        self.cursor_y = self.page.margin_mm();
        self.line_height = 0.0;
        debug!("Started page {}", self.page_count);
    }

    fn push_cell(&mut self, operation: &'static str, cell: &CellSpec) {
        if self.error.is_some() {
            return;
        }
        if cell.width() < 0.0 || cell.height() < 0.0 {
            self.fail(
                operation,
                format!("negative cell size {}x{}", cell.width(), cell.height()),
            );
            return;
        }

        let top = self.page.margin_mm();
        if self.cursor_y > top && self.cursor_y + cell.height() > self.bottom_limit() {
            self.break_page();
        }

        let rect = Rect::new(self.cursor_x, self.cursor_y, cell.width(), cell.height());
        if !self.fits_on_page(&rect) {
            self.fail(
                operation,
                format!(
                    "page overflow: '{}' is {:.1} mm tall and does not fit on an empty page",
                    cell.text(),
                    cell.height()
                ),
            );
            return;
        }

        self.operations.push(DrawOp::Text(TextBlock {
            rect,
            text: cell.text().to_owned(),
            font: self.style.font.clone(),
            alignment: cell.alignment(),
            border: cell.has_border(),
            fill: cell.is_filled().then_some(self.style.fill),
        }));
        self.cursor_x += cell.width();
        self.line_height = self.line_height.max(cell.height());
    }
}

impl ReportCanvas for PdfCanvas {
    fn page_size(&self) -> (f64, f64) {
        self.page.size_mm()
    }

    fn usable_width(&self) -> f64 {
        self.page.usable_width_mm()
    }

    fn set_font(&mut self, family: &str, weight: FontWeight, size: u8) {
        if self.error.is_some() {
            return;
        }
        if !family.eq_ignore_ascii_case(REPORT_FONT_FAMILY) {
            self.fail(
                "set_font",
                format!(
                    "unknown font family '{}'; only '{}' is available",
                    family, REPORT_FONT_FAMILY
                ),
            );
            return;
        }
        if size == 0 {
            self.fail("set_font", "font size must be positive");
            return;
        }
        self.style.font = FontSpec::new(REPORT_FONT_FAMILY, weight, size);
    }

    fn set_fill_color(&mut self, color: Rgb) {
        if self.error.is_none() {
            self.style.fill = color;
        }
    }

    fn place_text(&mut self, width: f64, height: f64, text: &str) {
        self.push_cell("place_text", &CellSpec::new(width, height, text));
    }

    fn place_cell(&mut self, cell: &CellSpec) {
        self.push_cell("place_cell", cell);
    }

    fn page_count(&self) -> usize {
        self.page_count
    }

    fn new_line(&mut self, height: f64) {
        if self.error.is_some() {
            return;
        }
        let advance = if height > 0.0 { height } else { self.line_height };
        self.cursor_x = self.page.margin_mm();
        self.cursor_y += advance;
        self.line_height = 0.0;
    }

    fn register_image(&mut self, name: &str, source: &ImageSource) {
        if self.error.is_some() {
            return;
        }
        match source.decode() {
            Ok(image) => {
                debug!("Registered image '{}'", name);
                self.images.insert(name.to_owned(), image);
            }
            Err(err) => self.fail("register_image", format!("image '{}': {}", name, err)),
        }
    }

    fn place_image(&mut self, name: &str, rect: Rect) {
        if self.error.is_some() {
            return;
        }
        if !self.images.contains_key(name) {
            self.fail("place_image", format!("image '{}' is not registered", name));
            return;
        }
        let fits = rect.width > 0.0
            && rect.height > 0.0
            && rect.right() <= self.page.size_mm().0
            && self.fits_on_page(&rect);
        if !fits {
            self.fail(
                "place_image",
                format!("image '{}' does not fit on the page at {:?}", name, rect),
            );
            return;
        }
        self.operations.push(DrawOp::Image {
            name: name.to_owned(),
            rect,
        });
    }

    fn last_error(&self) -> Option<&DrawError> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use image::{ImageBuffer, ImageOutputFormat, Rgb as Pixel};

    fn png_bytes() -> Vec<u8> {
        let buffer = ImageBuffer::from_fn(8, 8, |x, y| Pixel([x as u8 * 30, y as u8 * 30, 128]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(buffer)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .expect("encode png");
        bytes
    }

    fn canvas() -> PdfCanvas {
        PdfCanvas::open(PageSetup::default())
    }

    #[test]
    fn cursor_starts_at_margin() {
        assert_eq!(canvas().cursor(), (10.0, 10.0));
    }

    #[test]
    fn cells_advance_cursor_horizontally() {
        let mut canvas = canvas();
        canvas.place_cell(&CellSpec::new(30.0, 7.0, "a"));
        canvas.place_cell(&CellSpec::new(20.0, 7.0, "b"));
        assert_eq!(canvas.cursor(), (60.0, 10.0));
        assert_eq!(
            canvas.operations()[1].rect(),
            Some(Rect::new(40.0, 10.0, 20.0, 7.0))
        );
    }

    #[test]
    fn new_line_uses_tallest_element_when_height_is_not_positive() {
        let mut canvas = canvas();
        canvas.place_text(40.0, 10.0, "title");
        canvas.place_text(40.0, 4.0, "note");
        canvas.new_line(-1.0);
        assert_eq!(canvas.cursor(), (10.0, 20.0));

        canvas.place_text(40.0, 10.0, "date");
        canvas.new_line(12.0);
        assert_eq!(canvas.cursor(), (10.0, 32.0));

        canvas.new_line(0.0);
        assert_eq!(canvas.cursor(), (10.0, 32.0));
    }

    #[test]
    fn drawing_uses_active_style_context() {
        let mut canvas = canvas();
        canvas.set_font("Times", FontWeight::Bold, 16);
        canvas.set_fill_color(Rgb::LIGHT_GRAY);
        assert_eq!(canvas.style().font, FontSpec::new("Times", FontWeight::Bold, 16));
        assert_eq!(canvas.style().fill, Rgb::LIGHT_GRAY);
        canvas.place_cell(&CellSpec::new(10.0, 7.0, "x").with_fill(true));
        canvas.set_font("Times", FontWeight::Regular, 12);
        canvas.place_cell(&CellSpec::new(10.0, 7.0, "y"));

        let first = canvas.operations()[0].as_text().expect("text op");
        assert!(first.font.is_bold());
        assert_eq!(first.font.size(), 16);
        assert_eq!(first.fill, Some(Rgb::LIGHT_GRAY));

        let second = canvas.operations()[1].as_text().expect("text op");
        assert!(!second.font.is_bold());
        assert_eq!(second.fill, None);
    }

    #[test]
    fn unknown_font_family_sets_deferred_error() {
        let mut canvas = canvas();
        canvas.set_font("Comic Sans", FontWeight::Regular, 12);
        canvas.place_text(10.0, 5.0, "ignored");

        assert!(canvas.has_error());
        assert_eq!(canvas.last_error().map(DrawError::operation), Some("set_font"));
        assert!(canvas.operations().is_empty());
        assert!(matches!(canvas.check(), Err(ReportError::DeferredDraw(_))));
    }

    #[test]
    fn first_error_is_kept() {
        let mut canvas = canvas();
        canvas.place_image("missing", Rect::new(10.0, 10.0, 5.0, 5.0));
        canvas.set_font("Helvetica", FontWeight::Regular, 12);
        assert_eq!(
            canvas.last_error().map(DrawError::operation),
            Some("place_image")
        );
    }

    #[test]
    fn rows_past_bottom_margin_continue_on_a_new_page() {
        let mut canvas = canvas();
        // 27 rows of 7 mm fit between the 10 mm margins of a landscape Letter page.
        for index in 0..40 {
            canvas.place_cell(&CellSpec::new(20.0, 7.0, format!("row{index}")));
            canvas.place_cell(&CellSpec::new(20.0, 7.0, "value"));
            canvas.new_line(-1.0);
        }

        assert!(!canvas.has_error(), "{:?}", canvas.last_error());
        assert_eq!(canvas.page_count(), 2);

        let operations = canvas.operations();
        let break_at = operations
            .iter()
            .position(|op| *op == DrawOp::NewPage)
            .expect("page break recorded");
        assert_eq!(break_at, 27 * 2);
        assert_eq!(
            operations[break_at - 1].rect(),
            Some(Rect::new(30.0, 192.0, 20.0, 7.0))
        );
        let first_on_new_page = operations[break_at + 1].as_text().expect("text op");
        assert_eq!(first_on_new_page.text, "row27");
        assert_eq!(first_on_new_page.rect, Rect::new(10.0, 10.0, 20.0, 7.0));
        assert_eq!(
            operations[break_at + 2].rect(),
            Some(Rect::new(30.0, 10.0, 20.0, 7.0))
        );
        assert_eq!(canvas.cursor(), (10.0, 10.0 + 13.0 * 7.0));
    }

    #[test]
    fn cell_taller_than_a_page_sets_deferred_error() {
        let mut canvas = canvas();
        canvas.place_text(40.0, 10.0, "title");
        canvas.new_line(-1.0);
        canvas.place_cell(&CellSpec::new(20.0, 300.0, "tall"));

        let err = canvas.last_error().expect("overflow recorded");
        assert!(err.message().contains("page overflow"));
        assert_eq!(canvas.page_count(), 2);
    }

    #[test]
    fn render_refuses_when_error_is_stored() {
        let mut canvas = canvas();
        canvas.set_font("Courier", FontWeight::Bold, 10);
        assert!(matches!(canvas.render(), Err(ReportError::DeferredDraw(_))));
    }

    #[test]
    fn save_writes_nothing_when_error_is_stored() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let output = dir.path().join("reporte.pdf");
        let mut canvas = canvas();
        canvas.place_image("stats", Rect::new(225.0, 10.0, 25.0, 25.0));
        assert!(canvas.save(&output).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn registered_images_are_placed_at_absolute_coordinates() {
        let mut canvas = canvas();
        canvas.place_text(40.0, 10.0, "before");
        canvas.register_image("Imagen", &ImageSource::from_bytes(png_bytes(), "png"));
        canvas.place_image("Imagen", Rect::new(225.0, 10.0, 25.0, 25.0));

        assert!(!canvas.has_error());
        assert_eq!(
            canvas.operations()[1],
            DrawOp::Image {
                name: "Imagen".to_owned(),
                rect: Rect::new(225.0, 10.0, 25.0, 25.0),
            }
        );
        // Image placement leaves the text cursor alone.
        assert_eq!(canvas.cursor(), (50.0, 10.0));
    }

    #[test]
    fn image_sources_are_registered_and_placed_in_one_call() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("stats.png");
        fs::write(&path, png_bytes()).expect("write png");

        let mut canvas = canvas();
        canvas.place_image_source(
            &ImageSource::from_bytes(png_bytes(), "png"),
            Rect::new(225.0, 10.0, 25.0, 25.0),
        );
        canvas.place_image_source(
            &ImageSource::from_bytes(png_bytes(), "png"),
            Rect::new(100.0, 10.0, 25.0, 25.0),
        );
        canvas.place_image_source(
            &ImageSource::from_path(&path),
            Rect::new(150.0, 40.0, 10.0, 10.0),
        );
        canvas.place_image_source(
            &ImageSource::from_path(&path),
            Rect::new(170.0, 40.0, 10.0, 10.0),
        );

        assert!(!canvas.has_error(), "{:?}", canvas.last_error());
        let path_name = path.display().to_string();
        let placed: Vec<(String, Rect)> = canvas
            .operations()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { name, rect } => Some((name.clone(), *rect)),
                _ => None,
            })
            .collect();
        assert_eq!(
            placed,
            [
                ("bytes-0".to_owned(), Rect::new(225.0, 10.0, 25.0, 25.0)),
                ("bytes-1".to_owned(), Rect::new(100.0, 10.0, 25.0, 25.0)),
                (path_name.clone(), Rect::new(150.0, 40.0, 10.0, 10.0)),
                (path_name.clone(), Rect::new(170.0, 40.0, 10.0, 10.0)),
            ]
        );
        assert!(canvas.has_image("bytes-0"));
        assert!(canvas.has_image("bytes-1"));
        assert!(canvas.has_image(&path_name));
        assert_eq!(canvas.cursor(), (10.0, 10.0));
    }

    #[test]
    fn undecodable_image_sets_deferred_error() {
        let mut canvas = canvas();
        canvas.register_image("Imagen", &ImageSource::from_bytes(vec![0, 1, 2], "png"));
        assert_eq!(
            canvas.last_error().map(DrawError::operation),
            Some("register_image")
        );
    }

    #[test]
    fn image_outside_page_sets_deferred_error() {
        let mut canvas = canvas();
        canvas.register_image("Imagen", &ImageSource::from_bytes(png_bytes(), "png"));
        canvas.place_image("Imagen", Rect::new(270.0, 10.0, 25.0, 25.0));
        assert!(canvas.has_error());
    }
}
