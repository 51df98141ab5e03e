use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading weather code translation tables.
///
/// Only table loading can fail. Lookups on a constructed translator never
/// return an error.
#[derive(Debug, Error)]
pub enum WeatherCodeError {
    /// No resource exists for the language
    #[error("no weather code table for language '{language}'")]
    ResourceMissing { language: String },

    /// The resource exists but could not be read
    #[error("failed to read weather code table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The resource is not a JSON object of strings
    #[error("failed to parse weather code table for language '{language}': {source}")]
    Parse {
        language: String,
        #[source]
        source: serde_json::Error,
    },

    /// The resource parsed but failed validation (partial or malformed table)
    #[error("invalid weather code table for language '{language}': {}", errors.join("; "))]
    Invalid {
        language: String,
        errors: Vec<String>,
    },
}

impl WeatherCodeError {
    /// Whether the error means the resource does not exist at all.
    pub fn is_missing(&self) -> bool {
        matches!(self, WeatherCodeError::ResourceMissing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_display() {
        let err = WeatherCodeError::ResourceMissing {
            language: "fr".to_string(),
        };
        assert_eq!(err.to_string(), "no weather code table for language 'fr'");
        assert!(err.is_missing());
    }

    #[test]
    fn test_invalid_display_joins_errors() {
        let err = WeatherCodeError::Invalid {
            language: "de".to_string(),
            errors: vec!["first".to_string(), "second".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("'de'"));
        assert!(message.contains("first; second"));
        assert!(!err.is_missing());
    }
}
