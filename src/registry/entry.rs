//! Registry entry types and listing filters.

use std::fmt;

use serde::Serialize;
use sqlx::FromRow;

use crate::identifier::{Identity, PaperKey};

/// A persisted registry row: the best-known record for one paper key.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct RegistryEntry {
    /// Row id; also the insertion order.
    pub id: i64,
    /// Category column (empty when the identifier has none). Use [`Self::category`].
    #[sqlx(rename = "category")]
    #[serde(rename = "category")]
    pub category_column: String,
    /// Numeric id without version.
    pub id_number: String,
    /// Highest version recorded for this key.
    pub version: u32,
    /// Paper title.
    pub title: String,
    /// Comma-separated authors.
    pub authors: String,
    /// Where the artifacts for this paper live.
    pub stored_path: String,
    /// When the stored version was downloaded (`SQLite` datetime text).
    pub downloaded_at: String,
    /// Whether metadata files are present.
    pub has_metadata: bool,
    /// Whether the PDF is present.
    pub has_pdf: bool,
}

impl RegistryEntry {
    /// Returns the category, if any.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        (!self.category_column.is_empty()).then_some(self.category_column.as_str())
    }

    /// Returns the registry key.
    #[must_use]
    pub fn key(&self) -> PaperKey {
        PaperKey::new(self.category(), &self.id_number)
    }

    /// Returns the stored identity (key plus stored version).
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(self.category(), &self.id_number, self.version)
    }
}

impl fmt::Display for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RegistryEntry {{ id: {}, paper: {}, metadata: {}, pdf: {} }}",
            self.id,
            self.identity(),
            self.has_metadata,
            self.has_pdf
        )
    }
}

/// Writable fields for an upsert. `downloaded_at` is stamped by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperRecord {
    /// Identity being recorded (version included).
    pub identity: Identity,
    /// Paper title.
    pub title: String,
    /// Comma-separated authors.
    pub authors: String,
    /// Artifact location.
    pub stored_path: String,
    /// Whether metadata files are present.
    pub has_metadata: bool,
    /// Whether the PDF is present.
    pub has_pdf: bool,
}

impl PaperRecord {
    /// Creates a record with empty descriptive fields and no artifacts.
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            title: String::new(),
            authors: String::new(),
            stored_path: String::new(),
            has_metadata: false,
            has_pdf: false,
        }
    }

    /// Sets title and authors.
    #[must_use]
    pub fn with_description(mut self, title: impl Into<String>, authors: impl Into<String>) -> Self {
        self.title = title.into();
        self.authors = authors.into();
        self
    }

    /// Sets the storage path and artifact flags.
    #[must_use]
    pub fn with_artifacts(
        mut self,
        stored_path: impl Into<String>,
        has_metadata: bool,
        has_pdf: bool,
    ) -> Self {
        self.stored_path = stored_path.into();
        self.has_metadata = has_metadata;
        self.has_pdf = has_pdf;
        self
    }
}

/// Result of [`crate::PaperRegistry::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// No entry existed; one was created.
    Inserted,
    /// An entry at a lower or equal version was overwritten.
    Updated,
    /// The stored entry has a higher version; nothing was written.
    Unchanged,
}

impl UpsertOutcome {
    /// Returns the display label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field a listing filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    /// Paper title.
    Title,
    /// Author list.
    Authors,
    /// Category column.
    Category,
    /// Canonical id (`category/idNumber` or bare id number).
    Id,
}

impl FilterField {
    /// SQL expression the substring match runs against.
    pub(crate) fn column_expr(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Authors => "authors",
            Self::Category => "category",
            Self::Id => "CASE WHEN category = '' THEN id_number ELSE category || '/' || id_number END",
        }
    }

    /// Returns the display label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Authors => "authors",
            Self::Category => "category",
            Self::Id => "id",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FilterField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "authors" => Ok(Self::Authors),
            "category" => Ok(Self::Category),
            "id" => Ok(Self::Id),
            _ => Err(format!(
                "invalid filter field: {s} (expected title, authors, category or id)"
            )),
        }
    }
}

/// Case-insensitive substring filter for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    /// Field to match.
    pub field: FilterField,
    /// Substring to look for.
    pub substring: String,
}

impl ListFilter {
    /// Creates a filter.
    #[must_use]
    pub fn new(field: FilterField, substring: impl Into<String>) -> Self {
        Self {
            field,
            substring: substring.into(),
        }
    }
}
