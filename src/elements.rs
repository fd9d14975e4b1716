//! The `genpdf` element that paints a recorded display list onto the report page.
//!
//! `genpdf` lays elements out in a flow. Reports need absolute placement instead, so the canvas
//! records every drawing call as a [`DrawOp`] and this element replays them against the page
//! area. A [`DrawOp::NewPage`] ends the current page; `genpdf` then opens the next page and
//! rendering resumes after the marker.

use std::collections::HashMap;

use genpdf::elements::Image;
use genpdf::error::{Error, ErrorKind};
use genpdf::style::{Color, Style, StyledString};
use genpdf::{render, Element, Mm, Position, RenderResult, Scale, Size};
use image::GenericImageView;

use crate::model::{DrawOp, FontSpec, HorizontalAlignment, Rect, Rgb, TextBlock};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const CELL_PADDING_MM: f64 = 1.0;
const FILL_STROKE_SPACING_MM: f64 = 0.25;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Converts a decoded image into a `genpdf` image together with its natural size.
///
/// Alpha channels are dropped because `genpdf` cannot embed them.
fn image_from_dynamic(image: image::DynamicImage) -> Result<(Image, Size), Error> {
    let size = estimated_image_size(&image, DEFAULT_IMAGE_DPI);
    let flattened = image::DynamicImage::ImageRgb8(image.to_rgb8());
    let image = Image::from_dynamic_image(flattened)?;
    Ok((image, size))
}

fn font_style(font: &FontSpec) -> Style {
    let mut style = Style::new().with_font_size(font.size());
    if font.is_bold() {
        style.set_bold();
    }
    style
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

fn offset_area<'a>(area: &render::Area<'a>, rect: Rect) -> render::Area<'a> {
    let mut area = area.clone();
    area.add_offset(Position::new(mm_from_f64(rect.x), mm_from_f64(rect.y)));
    area
}

/// The pages of a report, rendered from the canvas display list.
pub struct ReportPage {
    operations: Vec<DrawOp>,
    next: usize,
    images: HashMap<String, (Image, Size)>,
}

impl ReportPage {
    /// Creates the page element from recorded operations and the images they reference.
    pub fn new(
        operations: Vec<DrawOp>,
        images: HashMap<String, image::DynamicImage>,
    ) -> Result<Self, Error> {
        let images = images
            .into_iter()
            .map(|(name, image)| image_from_dynamic(image).map(|converted| (name, converted)))
            .collect::<Result<HashMap<_, _>, Error>>()?;
        Ok(Self {
            operations,
            next: 0,
            images,
        })
    }

    fn render_text(
        context: &genpdf::Context,
        area: &render::Area<'_>,
        block: &TextBlock,
    ) -> Result<(), Error> {
        let cell_area = offset_area(area, block.rect);
        let width = mm_from_f64(block.rect.width);
        let height = mm_from_f64(block.rect.height);

        if let Some(fill) = block.fill {
            let line_style = Style::new().with_color(color(fill));
            let mut y = FILL_STROKE_SPACING_MM / 2.0;
            while y < block.rect.height {
                cell_area.draw_line(
                    vec![
                        Position::new(0, mm_from_f64(y)),
                        Position::new(width, mm_from_f64(y)),
                    ],
                    line_style,
                );
                y += FILL_STROKE_SPACING_MM;
            }
        }

        if block.border {
            cell_area.draw_line(
                vec![
                    Position::new(0, 0),
                    Position::new(width, 0),
                    Position::new(width, height),
                    Position::new(0, height),
                    Position::new(0, 0),
                ],
                Style::new(),
            );
        }

        if block.text.is_empty() {
            return Ok(());
        }

        let style = font_style(&block.font);
        let string = StyledString::new(block.text.clone(), style);
        let text_width = string.width(&context.font_cache);
        let line_height = style.line_height(&context.font_cache);
        let padding = mm_from_f64(CELL_PADDING_MM);

        // Text wider than its cell overflows to the right instead of shifting left of the cell.
        let x_offset = match block.alignment {
            HorizontalAlignment::Left => padding,
            HorizontalAlignment::Center => (width - text_width) / 2.0,
            HorizontalAlignment::Right => width - text_width - padding,
        }
        .max(Mm::default());
        let y_offset = ((height - line_height) / 2.0).max(Mm::default());

        let mut section = cell_area
            .text_section(
                &context.font_cache,
                Position::new(x_offset, y_offset),
                style,
            )
            .ok_or_else(|| {
                Error::new(
                    format!("No room on the page to print '{}'", block.text),
                    ErrorKind::PageSizeExceeded,
                )
            })?;
        section.print_str(&string.s, string.style)
    }

    fn render_image(
        images: &mut HashMap<String, (Image, Size)>,
        context: &genpdf::Context,
        area: &render::Area<'_>,
        name: &str,
        rect: Rect,
        style: Style,
    ) -> Result<(), Error> {
        let (image, natural_size) = images.get_mut(name).ok_or_else(|| {
            Error::new(
                format!("Image '{}' was placed but never registered", name),
                ErrorKind::InvalidData,
            )
        })?;

        let natural_width = mm_to_f64(natural_size.width);
        let natural_height = mm_to_f64(natural_size.height);
        if natural_width <= f64::EPSILON || natural_height <= f64::EPSILON {
            return Err(Error::new(
                format!("Image '{}' has no pixels", name),
                ErrorKind::InvalidData,
            ));
        }
        image.set_scale(Scale::new(
            rect.width / natural_width,
            rect.height / natural_height,
        ));

        let result = image.render(context, offset_area(area, rect), style)?;
        if result.has_more {
            return Err(Error::new(
                format!("Image '{}' does not fit on the page", name),
                ErrorKind::PageSizeExceeded,
            ));
        }
        Ok(())
    }
}

impl Element for ReportPage {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        result.size = area.size();

        let Self {
            operations,
            next,
            images,
        } = self;
        while let Some(operation) = operations.get(*next) {
            *next += 1;
            match operation {
                DrawOp::Text(block) => Self::render_text(context, &area, block)?,
                DrawOp::Image { name, rect } => {
                    Self::render_image(images, context, &area, name, *rect, style)?
                }
                DrawOp::NewPage => {
                    result.has_more = true;
                    return Ok(result);
                }
            }
        }
        Ok(result)
    }
}
