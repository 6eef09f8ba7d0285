//! Publication metadata catalog loaded from a CSV table.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Sentinel for fields absent from the metadata table.
pub const MISSING_FIELD: &str = "N/A";

/// Publication metadata for one paper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Publication {
    /// Paper title.
    pub title: String,
    /// Link to the paper.
    pub link: String,
    /// Journal title.
    pub journal: String,
    /// Publication year (kept as text; the table mixes formats).
    pub year: String,
    /// Author list as given in the table.
    pub authors: String,
    /// Keyword list as given in the table.
    pub keywords: String,
    /// One-line summary.
    pub tldr: String,
    /// DOI.
    pub doi: String,
}

/// Raw CSV row shape. Every column defaults so a sparse table still loads.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Link", default)]
    link: String,
    #[serde(rename = "Journal Title", default)]
    journal: String,
    #[serde(rename = "Publication Year", default)]
    year: String,
    #[serde(rename = "Authors", default)]
    authors: String,
    #[serde(rename = "Keywords", default)]
    keywords: String,
    #[serde(rename = "TLDR Summary", default)]
    tldr: String,
    #[serde(rename = "DOI", default)]
    doi: String,
}

fn field_or_missing(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() { MISSING_FIELD.to_string() } else { trimmed.to_string() }
}

impl From<CatalogRow> for Publication {
    fn from(row: CatalogRow) -> Self {
        Self {
            title: field_or_missing(row.title),
            link: field_or_missing(row.link),
            journal: field_or_missing(row.journal),
            year: field_or_missing(row.year),
            authors: field_or_missing(row.authors),
            keywords: field_or_missing(row.keywords),
            tldr: field_or_missing(row.tldr),
            doi: field_or_missing(row.doi),
        }
    }
}

/// A title-keyed lookup table of publication metadata.
///
/// A missing or unreadable table degrades to an empty catalog — every lookup
/// misses — rather than failing startup.
#[derive(Debug, Default)]
pub struct PublicationCatalog {
    rows: Vec<Publication>,
}

impl PublicationCatalog {
    /// An empty catalog (every lookup returns `None`).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the catalog from a CSV file with columns `Title, Link, Journal
    /// Title, Publication Year, Authors, Keywords, TLDR Summary, DOI`.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!(path = %path.display(), "publication metadata table not found; lookups will be empty");
            return Self::empty();
        }

        let mut reader = match csv::Reader::from_path(path) {
            Ok(reader) => reader,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot open metadata table; lookups will be empty");
                return Self::empty();
            }
        };

        let mut rows = Vec::new();
        for record in reader.deserialize::<CatalogRow>() {
            match record {
                Ok(row) => rows.push(Publication::from(row)),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping malformed metadata row"),
            }
        }

        info!(path = %path.display(), row_count = rows.len(), "loaded publication metadata");
        Self { rows }
    }

    /// Build a catalog from rows directly (tests and fixtures).
    pub fn from_rows(rows: Vec<Publication>) -> Self {
        Self { rows }
    }

    /// Look up metadata by title: exact match, then case-insensitive, then
    /// substring (needle contained in a stored title, case-insensitive).
    /// First match wins on ambiguity.
    pub fn lookup(&self, title: &str) -> Option<Publication> {
        let needle = title.trim();
        if needle.is_empty() {
            return None;
        }

        if let Some(row) = self.rows.iter().find(|row| row.title == needle) {
            return Some(row.clone());
        }

        let lowered = needle.to_lowercase();
        if let Some(row) = self.rows.iter().find(|row| row.title.to_lowercase() == lowered) {
            return Some(row.clone());
        }

        self.rows.iter().find(|row| row.title.to_lowercase().contains(&lowered)).cloned()
    }

    /// Number of catalog rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the catalog holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publication(title: &str) -> Publication {
        Publication {
            title: title.to_string(),
            link: MISSING_FIELD.to_string(),
            journal: "Nature".to_string(),
            year: "2021".to_string(),
            authors: MISSING_FIELD.to_string(),
            keywords: MISSING_FIELD.to_string(),
            tldr: MISSING_FIELD.to_string(),
            doi: MISSING_FIELD.to_string(),
        }
    }

    #[test]
    fn exact_match_wins_over_substring() {
        let catalog = PublicationCatalog::from_rows(vec![
            publication("Deep Learning Advances Extended Edition"),
            publication("Deep Learning"),
        ]);
        let hit = catalog.lookup("Deep Learning").unwrap();
        assert_eq!(hit.title, "Deep Learning");
    }

    #[test]
    fn falls_back_to_case_insensitive_then_substring() {
        let catalog = PublicationCatalog::from_rows(vec![publication("Quantum Error Correction")]);
        assert!(catalog.lookup("quantum error correction").is_some());
        assert!(catalog.lookup("Error Correction").is_some());
        assert!(catalog.lookup("bird migration").is_none());
    }

    #[test]
    fn missing_file_degrades_to_empty_catalog() {
        let catalog = PublicationCatalog::load(Path::new("/nonexistent/papers.csv"));
        assert!(catalog.is_empty());
        assert!(catalog.lookup("anything").is_none());
    }

    #[test]
    fn blank_title_never_matches() {
        let catalog = PublicationCatalog::from_rows(vec![publication("Some Paper")]);
        assert!(catalog.lookup("  ").is_none());
    }
}
