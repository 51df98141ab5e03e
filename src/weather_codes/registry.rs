//! Table registry: where weather code tables come from.
//!
//! Tables are resources, one per language. English and German are embedded
//! in the binary; additional languages (or replacements) can be read from a
//! directory of `<lang>.json` files.

use crate::weather_codes::{Language, WeatherCodeError};
use std::path::PathBuf;

/// Metadata and content of a table compiled into the binary.
#[derive(Debug, Clone)]
pub struct EmbeddedTable {
    /// Two-letter language code (e.g., "en", "de")
    pub code: &'static str,

    /// English name of the language
    pub name: &'static str,

    /// Native name of the language
    pub native_name: &'static str,

    /// Raw JSON resource
    pub(crate) source: &'static str,
}

static EMBEDDED_TABLES: &[EmbeddedTable] = &[
    EmbeddedTable {
        code: "en",
        name: "English",
        native_name: "English",
        source: include_str!("../../resources/weather_codes/en.json"),
    },
    EmbeddedTable {
        code: "de",
        name: "German",
        native_name: "Deutsch",
        source: include_str!("../../resources/weather_codes/de.json"),
    },
];

/// All tables compiled into the binary.
pub fn embedded_tables() -> &'static [EmbeddedTable] {
    EMBEDDED_TABLES
}

/// Where a translator reads its table resources from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TableSource {
    /// Tables compiled into the binary
    #[default]
    Embedded,

    /// `<lang>.json` files in a directory, read at construction time
    Directory(PathBuf),
}

impl TableSource {
    /// Read the raw resource for a language.
    ///
    /// # Returns
    /// * `Ok(String)` with the UTF-8 resource text
    /// * `Err(WeatherCodeError::ResourceMissing)` if no resource exists
    /// * `Err(WeatherCodeError::Io)` if the resource exists but cannot be read
    pub fn read(&self, language: &Language) -> Result<String, WeatherCodeError> {
        let missing = || WeatherCodeError::ResourceMissing {
            language: language.code().to_string(),
        };

        if !language.is_well_formed() {
            return Err(missing());
        }

        match self {
            TableSource::Embedded => EMBEDDED_TABLES
                .iter()
                .find(|table| table.code == language.code())
                .map(|table| table.source.to_string())
                .ok_or_else(missing),
            TableSource::Directory(dir) => {
                let path = dir.join(language.file_name());
                match std::fs::read_to_string(&path) {
                    Ok(text) => Ok(text),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(missing()),
                    Err(source) => Err(WeatherCodeError::Io { path, source }),
                }
            }
        }
    }
}

impl std::fmt::Display for TableSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableSource::Embedded => f.write_str("embedded tables"),
            TableSource::Directory(dir) => write!(f, "directory {}", dir.display()),
        }
    }
}
