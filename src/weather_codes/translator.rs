use crate::weather_codes::{AsWeatherCode, Language, TableSource, WeatherCodeError, WeatherCodeTable};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Description returned for any code that cannot be resolved.
pub const UNKNOWN_WEATHER_CODE: &str = "Unknown weather code";

/// Translates weather codes into descriptions for one resolved language.
///
/// Construction picks exactly one table: the requested language's, or the
/// default language's if the requested table is missing or incomplete.
/// After construction the translator is immutable and lookups never fail.
#[derive(Debug, Clone)]
pub struct WeatherCodes {
    table: WeatherCodeTable,
    requested: Language,
    fell_back: bool,
}

impl WeatherCodes {
    /// Create a translator backed by the embedded tables.
    ///
    /// # Errors
    /// Fails only if the default language's table cannot be loaded.
    pub fn new(language: &str) -> Result<Self, WeatherCodeError> {
        Self::load(&TableSource::Embedded, language)
    }

    /// Create a translator for the default language.
    pub fn with_default_language() -> Result<Self, WeatherCodeError> {
        Self::new(crate::weather_codes::DEFAULT_LANGUAGE)
    }

    /// Create a translator that reads `<lang>.json` tables from `dir`.
    ///
    /// The directory must contain the default language's table.
    pub fn from_dir(dir: impl Into<PathBuf>, language: &str) -> Result<Self, WeatherCodeError> {
        Self::load(&TableSource::Directory(dir.into()), language)
    }

    /// Create a translator from an explicit table source.
    pub fn load(source: &TableSource, language: &str) -> Result<Self, WeatherCodeError> {
        let requested = Language::normalize(language);
        let default = Language::default_language();

        let default_text = source.read(&default)?;
        let default_table = WeatherCodeTable::parse(&default, &default_text, None)?;

        if requested == default {
            debug!("Loaded weather code table '{}' from {}", default, source);
            return Ok(Self {
                table: default_table,
                requested,
                fell_back: false,
            });
        }

        let required = default_table.codes();
        let resolved = source
            .read(&requested)
            .and_then(|text| WeatherCodeTable::parse(&requested, &text, Some(&required)));

        match resolved {
            Ok(table) => {
                debug!("Loaded weather code table '{}' from {}", requested, source);
                Ok(Self {
                    table,
                    requested,
                    fell_back: false,
                })
            }
            Err(e) => {
                warn!(
                    "Weather code language '{}' unavailable ({}), falling back to '{}'",
                    requested, e, default
                );
                Ok(Self {
                    table: default_table,
                    requested,
                    fell_back: true,
                })
            }
        }
    }

    /// Translate a weather code into its description.
    ///
    /// Accepts anything implementing [`AsWeatherCode`]: integers, floats,
    /// text, JSON values and options of those. Input that does not coerce to
    /// a whole number, or a code missing from the table, yields
    /// [`UNKNOWN_WEATHER_CODE`].
    pub fn translate<C: AsWeatherCode>(&self, code: C) -> &str {
        let coerced = code.as_weather_code();
        let description = coerced
            .and_then(|code| self.table.get(code))
            .unwrap_or(UNKNOWN_WEATHER_CODE);
        debug!("Weather code {:?} -> {}", coerced, description);
        description
    }

    /// Look up an already coerced code.
    pub fn lookup(&self, code: i64) -> Option<&str> {
        self.table.get(code)
    }

    /// Language of the table in use.
    pub fn language(&self) -> &Language {
        self.table.language()
    }

    /// Language that was asked for at construction (after normalization).
    pub fn requested_language(&self) -> &Language {
        &self.requested
    }

    /// Whether the requested language was unavailable.
    pub fn fell_back(&self) -> bool {
        self.fell_back
    }

    /// The resolved table.
    pub fn table(&self) -> &WeatherCodeTable {
        &self.table
    }
}
