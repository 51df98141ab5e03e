//! Translation table validation.
//!
//! A table is only usable when it is complete. This module checks the raw
//! key/description pairs of a table resource before it is turned into a
//! lookup table.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Validation report containing errors and warnings about a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Problems that make the table unusable
    pub errors: Vec<String>,

    /// Non-critical findings (e.g., codes unknown to the default table)
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Create a new empty validation report
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if the report has any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the report is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for weather code translation tables.
pub struct TableValidator;

// Canonical code: no sign, no leading zeros
static CODE_KEY_REGEX: OnceLock<Regex> = OnceLock::new();

impl TableValidator {
    /// Validate the raw entries of a table.
    ///
    /// This function checks that:
    /// - the table is not empty
    /// - every key is a canonical non-negative integer that fits a weather code
    /// - every description is non-blank
    /// - every code in `required` (the default table's codes) is present
    ///
    /// Codes present in the table but absent from `required` are reported as
    /// warnings only.
    pub fn validate(
        entries: &BTreeMap<String, String>,
        required: Option<&BTreeSet<u32>>,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();

        if entries.is_empty() {
            report.errors.push("Table has no entries".to_string());
            return report;
        }

        let mut codes = BTreeSet::new();
        for (key, description) in entries {
            match Self::parse_key(key) {
                Some(code) => {
                    codes.insert(code);
                }
                None => report
                    .errors
                    .push(format!("Key '{}' is not a canonical weather code", key)),
            }

            if description.trim().is_empty() {
                report
                    .errors
                    .push(format!("Description for code '{}' is empty", key));
            }
        }

        if let Some(required) = required {
            let missing: Vec<u32> = required.difference(&codes).copied().collect();
            if !missing.is_empty() {
                report
                    .errors
                    .push(format!("Table is missing codes {:?}", missing));
            }

            let extra: Vec<u32> = codes.difference(required).copied().collect();
            if !extra.is_empty() {
                report
                    .warnings
                    .push(format!("Table has codes not in the default table {:?}", extra));
            }
        }

        report
    }

    /// Parse a table key into a weather code.
    ///
    /// Returns `None` for signed, zero-padded, non-numeric or oversized keys.
    pub fn parse_key(key: &str) -> Option<u32> {
        let regex = CODE_KEY_REGEX
            .get_or_init(|| Regex::new(r"^(0|[1-9][0-9]*)$").expect("code key regex is valid"));

        if !regex.is_match(key) {
            return None;
        }
        key.parse().ok()
    }
}
