//! Font loading utilities for report rendering.
//!
//! Reports are typeset in Times. The PDF references the built-in Times fonts, while the glyph
//! metrics needed for measuring and centering text come from a Times-compatible TrueType family
//! found on disk: Liberation Serif, or Times New Roman as shipped with Windows.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{FontData, FontFamily};
use log::{debug, warn};
use printpdf::BuiltinFont;

/// Family name accepted by [`crate::canvas::ReportCanvas::set_font`].
pub const REPORT_FONT_FAMILY: &str = "Times";

/// Environment variable pointing at a directory with the metrics fonts.
pub const FONTS_DIR_ENV: &str = "CSV_REPORT_FONTS_DIR";

/// Environment variable pointing at a directory holding `times.ttf` and its siblings.
pub const WINDOWS_FONTS_DIR_ENV: &str = "CSV_REPORT_WINDOWS_FONTS_DIR";

const SYSTEM_FONT_DIRECTORIES: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/liberation2",
    "/usr/share/fonts/liberation-serif",
    "/usr/share/fonts/liberation",
];

/// The four TrueType files of one Times-compatible family, regular, bold, italic, bold italic.
#[derive(Debug, PartialEq, Eq)]
pub struct FamilyFiles {
    /// Human readable family name.
    pub name: &'static str,
    files: [&'static str; 4],
}

/// Metric-compatible open replacement for Times, preferred when present.
pub const LIBERATION_SERIF: FamilyFiles = FamilyFiles {
    name: "Liberation Serif",
    files: [
        "LiberationSerif-Regular.ttf",
        "LiberationSerif-Bold.ttf",
        "LiberationSerif-Italic.ttf",
        "LiberationSerif-BoldItalic.ttf",
    ],
};

/// Times New Roman file names used by Windows.
pub const TIMES_NEW_ROMAN: FamilyFiles = FamilyFiles {
    name: "Times New Roman",
    files: ["times.ttf", "timesbd.ttf", "timesi.ttf", "timesbi.ttf"],
};

const FAMILIES: [&FamilyFiles; 2] = [&LIBERATION_SERIF, &TIMES_NEW_ROMAN];

const BUILTIN_STYLES: [BuiltinFont; 4] = [
    BuiltinFont::TimesRoman,
    BuiltinFont::TimesBold,
    BuiltinFont::TimesItalic,
    BuiltinFont::TimesBoldItalic,
];

impl FamilyFiles {
    /// Returns the files of this family that are absent from `directory`.
    pub fn missing_in(&self, directory: &Path) -> Vec<&'static str> {
        self.files
            .iter()
            .copied()
            .filter(|file| !directory.join(file).is_file())
            .collect()
    }

    /// Loads all four styles from `directory`.
    pub fn load(&self, directory: &Path) -> Result<FontFamily<FontData>, Error> {
        let [regular, bold, italic, bold_italic] = self.files;
        let [regular_builtin, bold_builtin, italic_builtin, bold_italic_builtin] = BUILTIN_STYLES;
        Ok(FontFamily {
            regular: load_font(&directory.join(regular), regular_builtin)?,
            bold: load_font(&directory.join(bold), bold_builtin)?,
            italic: load_font(&directory.join(italic), italic_builtin)?,
            bold_italic: load_font(&directory.join(bold_italic), bold_italic_builtin)?,
        })
    }
}

fn load_font(path: &Path, builtin: BuiltinFont) -> Result<FontData, Error> {
    FontData::load(path, Some(builtin)).map_err(|err| {
        Error::new(
            format!("Failed to load font {}: {}", path.display(), err),
            io::Error::new(io::ErrorKind::InvalidData, err.to_string()),
        )
    })
}

/// A directory holding a complete Times-compatible family.
#[derive(Debug, PartialEq, Eq)]
pub struct FontLocation {
    /// Directory containing the font files.
    pub directory: PathBuf,
    /// The family found there.
    pub family: &'static FamilyFiles,
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
}

fn font_directory_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = explicit.map(Path::to_path_buf).into_iter().collect();
    candidates.extend(env_path(FONTS_DIR_ENV));

    if let Some(bin_dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(bin_dir.join("assets/fonts"));
    }
    candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"));
    candidates.extend(SYSTEM_FONT_DIRECTORIES.iter().map(PathBuf::from));

    candidates.extend(env_path(WINDOWS_FONTS_DIR_ENV));
    if cfg!(windows) {
        candidates.extend(
            ["WINDIR", "SystemRoot"]
                .into_iter()
                .filter_map(env_path)
                .map(|root| root.join("Fonts")),
        );
    }

    let mut unique = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !unique.contains(&candidate) {
            unique.push(candidate);
        }
    }
    unique
}

/// Finds the first candidate directory that holds a complete family.
///
/// Directories are searched in order: `explicit`, `CSV_REPORT_FONTS_DIR`, `assets/fonts` beside
/// the executable and in the crate, the system Liberation directories, then the Windows font
/// directory. Within a directory Liberation Serif wins over Times New Roman.
pub fn locate_fonts(explicit: Option<&Path>) -> Result<FontLocation, Error> {
    let mut attempts = Vec::new();

    for directory in font_directory_candidates(explicit) {
        if !directory.is_dir() {
            attempts.push(format!("{} (directory missing)", directory.display()));
            continue;
        }
        for family in FAMILIES {
            let missing = family.missing_in(&directory);
            if missing.is_empty() {
                return Ok(FontLocation { directory, family });
            }
            attempts.push(format!(
                "{} ({} missing [{}])",
                directory.display(),
                family.name,
                missing.join(", ")
            ));
        }
    }

    Err(Error::new(
        format!(
            "Unable to locate a Times-compatible font family. Checked: {}. \
             See assets/fonts/README.md or set {}.",
            attempts.join(", "),
            FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "report fonts directory not found"),
    ))
}

/// Returns the Times-compatible font family, searching `explicit` first when given.
pub fn report_font_family(explicit: Option<&Path>) -> Result<FontFamily<FontData>, Error> {
    let location = locate_fonts(explicit)?;
    if location.family == &TIMES_NEW_ROMAN {
        warn!(
            "Liberation Serif not found; using {} from {}",
            TIMES_NEW_ROMAN.name,
            location.directory.display()
        );
    } else {
        debug!(
            "Loading {} from {}",
            location.family.name,
            location.directory.display()
        );
    }
    location.family.load(&location.directory)
}

/// Indicates whether a font family for rendering can be located without an explicit directory.
pub fn default_fonts_available() -> bool {
    locate_fonts(None).is_ok()
}
