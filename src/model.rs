//! Data structures describing page geometry, drawing styles and recorded drawing operations.
//!
//! The types in this module are plain values. They intentionally avoid referencing the
//! rendering crate directly so the layout code can be exercised and inspected without loading
//! fonts or producing a PDF. The conversion into [`genpdf`] primitives happens in
//! [`crate::elements`].

/// Width of a US Letter sheet in portrait orientation, in millimetres.
pub const LETTER_SHORT_EDGE_MM: f64 = 215.9;
/// Height of a US Letter sheet in portrait orientation, in millimetres.
pub const LETTER_LONG_EDGE_MM: f64 = 279.4;

/// Metadata that controls how text is aligned inside a cell.
///
/// The variants map directly to [`genpdf::Alignment`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    /// Left aligned content.
    #[default]
    Left,
    /// Center aligned content.
    Center,
    /// Right aligned content.
    Right,
}

/// Page orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    /// Short edge on top.
    Portrait,
    /// Long edge on top.
    #[default]
    Landscape,
}

/// Supported paper standards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaperSize {
    /// ISO A4, 210 x 297 mm.
    A4,
    /// US Letter, 8.5 x 11 in.
    #[default]
    Letter,
    /// US Legal, 8.5 x 14 in.
    Legal,
}

impl PaperSize {
    /// Returns the portrait `(width, height)` of the sheet in millimetres.
    pub fn portrait_mm(self) -> (f64, f64) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::Letter => (LETTER_SHORT_EDGE_MM, LETTER_LONG_EDGE_MM),
            Self::Legal => (LETTER_SHORT_EDGE_MM, 355.6),
        }
    }
}

/// Page dimensions of the single report page plus its margin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSetup {
    orientation: Orientation,
    paper_size: PaperSize,
    margin_mm: f64,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            orientation: Orientation::Landscape,
            paper_size: PaperSize::Letter,
            margin_mm: 10.0,
        }
    }
}

impl PageSetup {
    /// Creates a page setup for the given orientation and paper standard with 10 mm margins.
    pub fn new(orientation: Orientation, paper_size: PaperSize) -> Self {
        Self {
            orientation,
            paper_size,
            ..Self::default()
        }
    }

    /// Sets the margin applied to all four sides and returns the updated setup.
    pub fn with_margin_mm(mut self, margin_mm: f64) -> Self {
        self.margin_mm = margin_mm;
        self
    }

    /// Returns the page orientation.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Returns the paper standard.
    pub fn paper_size(&self) -> PaperSize {
        self.paper_size
    }

    /// Returns the margin in millimetres.
    pub fn margin_mm(&self) -> f64 {
        self.margin_mm
    }

    /// Returns the `(width, height)` of the page in millimetres, honouring the orientation.
    pub fn size_mm(&self) -> (f64, f64) {
        let (short, long) = self.paper_size.portrait_mm();
        match self.orientation {
            Orientation::Portrait => (short, long),
            Orientation::Landscape => (long, short),
        }
    }

    /// Page width minus the left and right margins.
    pub fn usable_width_mm(&self) -> f64 {
        self.size_mm().0 - 2.0 * self.margin_mm
    }
}

/// An RGB colour used for cell backgrounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Background of header cells.
    pub const LIGHT_GRAY: Rgb = Rgb(240, 240, 240);
    /// Background of body cells.
    pub const WHITE: Rgb = Rgb(255, 255, 255);
}

/// Font weights available to the report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontWeight {
    /// Regular weight.
    #[default]
    Regular,
    /// Bold weight.
    Bold,
}

/// The font selected by the last `set_font` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontSpec {
    family: String,
    weight: FontWeight,
    size: u8,
}

impl FontSpec {
    /// Creates a font specification.
    pub fn new(family: impl Into<String>, weight: FontWeight, size: u8) -> Self {
        Self {
            family: family.into(),
            weight,
            size,
        }
    }

    /// Returns the font family name.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Returns the font weight.
    pub fn weight(&self) -> FontWeight {
        self.weight
    }

    /// Returns the font size in points.
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Returns `true` for the bold weight.
    pub fn is_bold(&self) -> bool {
        self.weight == FontWeight::Bold
    }
}

/// The style that applies to every subsequent drawing call until it is changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleContext {
    /// Active font.
    pub font: FontSpec,
    /// Active fill colour.
    pub fill: Rgb,
}

impl StyleContext {
    /// Creates a style context with the given family at 12 pt regular on white.
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            font: FontSpec::new(family, FontWeight::Regular, 12),
            fill: Rgb::WHITE,
        }
    }
}

/// An axis aligned rectangle in page coordinates (millimetres, origin at the top-left corner).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Distance from the left page edge.
    pub x: f64,
    /// Distance from the top page edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge of the rectangle.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge of the rectangle.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Parameters of a single bordered, filled or aligned text cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellSpec {
    width: f64,
    height: f64,
    text: String,
    border: bool,
    alignment: HorizontalAlignment,
    filled: bool,
}

impl CellSpec {
    /// Creates an unbordered, unfilled, left aligned cell.
    pub fn new(width: f64, height: f64, text: impl Into<String>) -> Self {
        Self {
            width,
            height,
            text: text.into(),
            border: false,
            alignment: HorizontalAlignment::Left,
            filled: false,
        }
    }

    /// Returns the cell width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Returns the cell height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Returns the cell text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns whether a border is drawn around the cell.
    pub fn has_border(&self) -> bool {
        self.border
    }

    /// Returns the text alignment.
    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Returns whether the cell background is painted with the active fill colour.
    pub fn is_filled(&self) -> bool {
        self.filled
    }

    /// Sets the border flag and returns the updated cell.
    pub fn with_border(mut self, border: bool) -> Self {
        self.border = border;
        self
    }

    /// Sets the alignment and returns the updated cell.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Sets the fill flag and returns the updated cell.
    pub fn with_fill(mut self, filled: bool) -> Self {
        self.filled = filled;
        self
    }
}

/// A text block recorded on the canvas, with the style that was active when it was drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBlock {
    /// Position and size on the page.
    pub rect: Rect,
    /// Text content.
    pub text: String,
    /// Font used for the text.
    pub font: FontSpec,
    /// Alignment inside `rect`.
    pub alignment: HorizontalAlignment,
    /// Whether the outline of `rect` is stroked.
    pub border: bool,
    /// Background colour, if the block is filled.
    pub fill: Option<Rgb>,
}

/// Drawing operations recorded by [`crate::canvas::PdfCanvas`] in the order they were issued.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Text with optional border and background.
    Text(TextBlock),
    /// A registered image placed at an absolute position.
    Image {
        /// Name under which the image was registered.
        name: String,
        /// Position and size on the page.
        rect: Rect,
    },
    /// Later operations are drawn on a fresh page.
    NewPage,
}

impl DrawOp {
    /// Returns the page area covered by the operation, or `None` for page breaks.
    pub fn rect(&self) -> Option<Rect> {
        match self {
            Self::Text(block) => Some(block.rect),
            Self::Image { rect, .. } => Some(*rect),
            Self::NewPage => None,
        }
    }

    /// Returns the text block for text operations.
    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            Self::Text(block) => Some(block),
            Self::Image { .. } | Self::NewPage => None,
        }
    }
}
