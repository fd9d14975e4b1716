//! Document construction helpers for report rendering.

use std::path::PathBuf;

use genpdf::{self, Size};

use crate::elements::mm_from_f64;
use crate::error::ReportError;
use crate::fonts;
use crate::model::PageSetup;

/// Builder for `genpdf::Document` instances sized for the report pages.
#[derive(Clone, Debug, Default)]
pub struct DocumentBuilder {
    page: PageSetup,
    title: Option<String>,
    font_directory: Option<PathBuf>,
}

impl DocumentBuilder {
    /// Creates a new builder for a Letter landscape page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page geometry used for the document.
    pub fn with_page_setup(mut self, page: PageSetup) -> Self {
        self.page = page;
        self
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

    /// Builds a fully configured `genpdf::Document` instance.
    pub fn build(self) -> Result<genpdf::Document, ReportError> {
        let font_family =
            fonts::report_font_family(self.font_directory.as_deref()).map_err(ReportError::Font)?;
        let mut document = genpdf::Document::new(font_family);

        let (width, height) = self.page.size_mm();
        document.set_paper_size(Size::new(mm_from_f64(width), mm_from_f64(height)));

        if let Some(title) = self.title {
            document.set_title(title);
        }

        // No page decorator: recorded coordinates already include the margins.
        Ok(document)
    }
}
