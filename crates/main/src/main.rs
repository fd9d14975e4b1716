use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use csv_report::report::{DEFAULT_IMAGE, DEFAULT_OUTPUT_NAME, DEFAULT_SOURCE, DEFAULT_TITLE};
use csv_report::{ColumnWidths, ImageStrategy, ReportAssembler, ReportConfig, RowPolicy};
use log::{error, LevelFilter};

/// Renders a delimited table as a PDF report.
///
/// The first row of SOURCE becomes the table header. Fonts are looked up in `--fonts-dir`,
/// then `CSV_REPORT_FONTS_DIR`, then `assets/fonts` and the system Liberation fonts.
#[derive(Parser, Debug)]
#[command(author, version, about = "Render a CSV table as a PDF report")]
struct Cli {
    /// Delimited table to render; `.tsv` files are read tab separated.
    #[arg(default_value = DEFAULT_SOURCE)]
    source: PathBuf,

    /// Output file name without the `.pdf` extension.
    #[arg(long, default_value = DEFAULT_OUTPUT_NAME)]
    output: String,

    /// Decorative image placed in the top-right corner; skipped when missing.
    #[arg(long, default_value = DEFAULT_IMAGE, conflicts_with = "no_image")]
    image: PathBuf,

    /// Render the report without the decorative image.
    #[arg(long)]
    no_image: bool,

    /// How the image file is handed to the PDF renderer.
    #[arg(long, value_enum, default_value_t = ImageMode::Bytes)]
    image_mode: ImageMode,

    /// What to do with body rows whose length differs from the header.
    #[arg(long, value_enum, default_value_t = RowPolicyArg::Pad)]
    row_policy: RowPolicyArg,

    /// Heading printed above the date.
    #[arg(long, default_value = DEFAULT_TITLE)]
    title: String,

    /// Fixed column widths in millimetres, one per column.
    #[arg(long, value_delimiter = ',')]
    column_widths: Option<Vec<f64>>,

    /// Directory holding the LiberationSerif font files.
    #[arg(long)]
    fonts_dir: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum ImageMode {
    /// Decode the image straight from its file.
    Path,
    /// Read the image into memory and decode the bytes.
    Bytes,
}

impl From<ImageMode> for ImageStrategy {
    fn from(mode: ImageMode) -> Self {
        match mode {
            ImageMode::Path => ImageStrategy::Path,
            ImageMode::Bytes => ImageStrategy::Bytes,
        }
    }
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum RowPolicyArg {
    /// Pad short rows with blank cells and ignore extra cells.
    Pad,
    /// Reject rows whose length differs from the header.
    Strict,
}

impl From<RowPolicyArg> for RowPolicy {
    fn from(policy: RowPolicyArg) -> Self {
        match policy {
            RowPolicyArg::Pad => RowPolicy::Pad,
            RowPolicyArg::Strict => RowPolicy::Strict,
        }
    }
}

impl Cli {
    fn into_config(self) -> ReportConfig {
        let image = if self.no_image {
            None
        } else {
            Some(self.image)
        };
        let column_widths = match self.column_widths {
            Some(widths) => ColumnWidths::Fixed(widths),
            None => ColumnWidths::Uniform,
        };
        ReportConfig::new(self.source)
            .with_output_name(self.output)
            .with_title(self.title)
            .with_image(image)
            .with_image_strategy(self.image_mode.into())
            .with_row_policy(self.row_policy.into())
            .with_column_widths(column_widths)
            .with_font_directory(self.fonts_dir)
    }
}

fn main() {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Warn)
        .parse_env(env_logger::Env::default().filter_or("CSV_REPORT_LOG", "warn,csv_report=info"))
        .init();

    let cli = Cli::parse();
    let assembler = ReportAssembler::new(cli.into_config());

    if let Err(err) = assembler.run() {
        error!("{}", err);
        print_error_sources(&err);
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
