//! Render delimited tables as PDF reports.
//!
//! A report is a title, a date stamp, an optional decorative image and a table whose first row
//! is the header. [`ReportAssembler`] runs the whole workflow; the lower level pieces
//! ([`Table`], [`PdfCanvas`], [`LayoutEngine`]) can be used on their own.

pub mod builder;
pub mod canvas;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod images;
pub mod layout;
pub mod model;
pub mod report;
pub mod table;

pub use canvas::{PdfCanvas, ReportCanvas};
pub use error::{DrawError, ReportError};
pub use images::{ImagePayload, ImageSource, ImageStrategy};
pub use layout::{ColumnWidths, LayoutEngine};
pub use model::{PageSetup, Rect};
pub use report::{ReportAssembler, ReportConfig};
pub use table::{Row, RowPolicy, Table, TableOptions};
