use crate::weather_codes::{Language, TableValidator, WeatherCodeError};
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::warn;

/// Raw `code -> description` object. Repeated keys are an error.
struct UniqueEntries(BTreeMap<String, String>);

impl<'de> Deserialize<'de> for UniqueEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = UniqueEntries;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object mapping weather codes to descriptions")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = BTreeMap::new();
                while let Some((key, description)) = map.next_entry::<String, String>()? {
                    match entries.entry(key) {
                        Entry::Occupied(entry) => {
                            return Err(de::Error::custom(format!(
                                "duplicate weather code key '{}'",
                                entry.key()
                            )));
                        }
                        Entry::Vacant(entry) => {
                            entry.insert(description);
                        }
                    }
                }
                Ok(UniqueEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// A complete, immutable weather code table for one language.
#[derive(Debug, Clone)]
pub struct WeatherCodeTable {
    language: Language,
    entries: HashMap<u32, String>,
}

impl WeatherCodeTable {
    /// Parse and validate a table resource.
    ///
    /// `required` holds the codes every non-default table must cover. A table
    /// that fails validation is rejected as a whole.
    pub fn parse(
        language: &Language,
        text: &str,
        required: Option<&BTreeSet<u32>>,
    ) -> Result<Self, WeatherCodeError> {
        let UniqueEntries(raw) =
            serde_json::from_str(text).map_err(|source| WeatherCodeError::Parse {
                language: language.code().to_string(),
                source,
            })?;

        let report = TableValidator::validate(&raw, required);
        if report.has_errors() {
            return Err(WeatherCodeError::Invalid {
                language: language.code().to_string(),
                errors: report.errors,
            });
        }
        for warning in &report.warnings {
            warn!("Weather code table '{}': {}", language, warning);
        }

        let entries = raw
            .into_iter()
            .filter_map(|(key, description)| {
                TableValidator::parse_key(&key).map(|code| (code, description))
            })
            .collect();

        Ok(Self {
            language: language.clone(),
            entries,
        })
    }

    /// Language this table belongs to.
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Look up a description. Negative and oversized codes simply miss.
    pub fn get(&self, code: i64) -> Option<&str> {
        let code = u32::try_from(code).ok()?;
        self.entries.get(&code).map(String::as_str)
    }

    /// All codes in the table.
    pub fn codes(&self) -> BTreeSet<u32> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(code, description)` pairs in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        let mut pairs: Vec<(u32, &str)> = self
            .entries
            .iter()
            .map(|(code, description)| (*code, description.as_str()))
            .collect();
        pairs.sort_by_key(|(code, _)| *code);
        pairs.into_iter()
    }
}
