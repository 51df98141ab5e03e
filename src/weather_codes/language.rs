//! Language identifier: normalized language code used to select a table.
//!
//! Callers pass loosely formatted identifiers ("DE", "de_DE", "en-US").
//! Only the first two characters are significant, compared in lowercase.

use std::fmt;

/// Code of the language used when none is requested or the requested one is
/// unavailable.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A normalized language identifier.
///
/// Holds the lowercase first two characters of the raw identifier. The value
/// is not checked against available tables; that happens when a translator
/// is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language {
    /// Lowercase two-character code (e.g., "en", "de")
    code: String,
}

impl Language {
    /// Normalize a raw language identifier.
    ///
    /// # Example
    /// ```ignore
    /// assert_eq!(Language::normalize("de_DE").code(), "de");
    /// ```
    pub fn normalize(raw: &str) -> Language {
        let code = raw.trim().chars().take(2).collect::<String>().to_lowercase();
        Language { code }
    }

    /// The default language ("en").
    pub fn default_language() -> Language {
        Language {
            code: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Get the normalized language code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Check if this is the default language.
    pub fn is_default(&self) -> bool {
        self.code == DEFAULT_LANGUAGE
    }

    /// Whether the code can name a table resource.
    ///
    /// Only two ASCII letters qualify. Anything else can never resolve to a
    /// table and is never used to build a resource path.
    pub fn is_well_formed(&self) -> bool {
        self.code.len() == 2 && self.code.chars().all(|c| c.is_ascii_lowercase())
    }

    /// File name of this language's table inside a resource directory.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.code)
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::default_language()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}
