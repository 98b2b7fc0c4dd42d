use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, CoreError};

/// A user-facing category label and the provider query string it searches for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    pub query: String,
}

const BUILTIN: &[(&str, &str)] = &[
    ("Bowling", "bowling alley"),
    ("Combat Sports", "martial arts|boxing gym|mma gym"),
    ("Football", "football field|soccer field"),
    ("Golf", "golf course|driving range"),
    (
        "Gym",
        "fitness center|health club|gymnasium -yoga -pilates -boxing -mma -martial -combat",
    ),
    ("Horse Riding", "horse riding|equestrian center|stables"),
    ("Massage Studio", "massage studio|massage therapist"),
    ("Padel", "padel court"),
    ("Paintball", "paintball field"),
    ("Pilates", "pilates studio"),
    ("Spa & Wellness Centers", "spa|wellness center"),
    ("Squash", "squash court"),
    ("Tennis", "tennis court"),
    ("Yoga", "yoga studio"),
];

/// Ordered category → query table. Labels are unique (case-insensitively).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct CategoriesFile {
    categories: Vec<Category>,
}

impl CategoryTable {
    /// Validates and wraps a list of categories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an empty table, a blank label
    /// or query, or a duplicate label.
    pub fn new(categories: Vec<Category>) -> Result<Self, ConfigError> {
        if categories.is_empty() {
            return Err(ConfigError::Validation(
                "category table must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for category in &categories {
            if category.label.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "category label must be non-empty".to_string(),
                ));
            }
            if category.query.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "category '{}' has an empty query",
                    category.label
                )));
            }
            if !seen.insert(category.label.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate category label: '{}'",
                    category.label
                )));
            }
        }

        Ok(Self { categories })
    }

    /// The table the application ships with.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            categories: BUILTIN
                .iter()
                .map(|(label, query)| Category {
                    label: (*label).to_owned(),
                    query: (*query).to_owned(),
                })
                .collect(),
        }
    }

    /// Looks a label up, ignoring ASCII case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownCategory`] if no entry matches.
    pub fn resolve(&self, label: &str) -> Result<&Category, CoreError> {
        let needle = label.trim();
        self.categories
            .iter()
            .find(|c| c.label.eq_ignore_ascii_case(needle))
            .ok_or_else(|| CoreError::UnknownCategory(needle.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Load and validate a category table from a YAML file of the form
/// `categories: [{ label, query }, ...]`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(path: &Path) -> Result<CategoryTable, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CategoriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: CategoriesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::CategoriesFileParse)?;

    CategoryTable::new(file.categories)
}
