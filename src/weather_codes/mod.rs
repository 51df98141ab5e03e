//! Weather code translation.
//!
//! Maps numeric weather condition codes (as delivered by the forecast
//! provider) to human-readable, optionally localized descriptions.
//!
//! # Architecture
//!
//! - `language`: Normalized language identifier and the default language
//! - `code`: Coercion of loosely typed input into a weather code
//! - `registry`: Table resources (embedded or from a directory)
//! - `validator`: Completeness checks for table resources
//! - `table`: Immutable per-language lookup table
//! - `translator`: `WeatherCodes`, the translator with language fallback
//!
//! # Example
//!
//! ```rust,ignore
//! use weather2mqtt::weather_codes::WeatherCodes;
//!
//! let codes = WeatherCodes::new("de")?;
//! assert_eq!(codes.translate(45), "Nebel");
//! assert_eq!(codes.translate(3.5), "Unknown weather code");
//! ```

mod code;
mod error;
mod language;
mod registry;
mod table;
mod translator;
mod validator;

pub use code::{whole_number, AsWeatherCode};
pub use error::WeatherCodeError;
pub use language::{Language, DEFAULT_LANGUAGE};
pub use registry::{embedded_tables, EmbeddedTable, TableSource};
pub use table::WeatherCodeTable;
pub use translator::{WeatherCodes, UNKNOWN_WEATHER_CODE};
pub use validator::{TableValidator, ValidationReport};
