//! Article data types.

use serde::{Deserialize, Serialize};

/// An article in the similarity corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    /// Unique key; upserts replace by id.
    pub id: String,
    /// Article title.
    pub title: String,
    /// Abstract text; the only field that is embedded.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Publication year, when known.
    #[serde(default)]
    pub year: Option<i32>,
    /// Author names.
    #[serde(default)]
    pub authors: Vec<String>,
    /// Keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Upsert payload: like [`Article`] but with an optional title, defaulted to
/// `"Article {id}"` when absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArticleUpsert {
    /// Unique key.
    pub id: String,
    /// Optional title.
    #[serde(default)]
    pub title: Option<String>,
    /// Abstract text.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Publication year.
    #[serde(default)]
    pub year: Option<i32>,
    /// Author names.
    #[serde(default)]
    pub authors: Vec<String>,
    /// Keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl From<ArticleUpsert> for Article {
    fn from(upsert: ArticleUpsert) -> Self {
        let title = upsert.title.unwrap_or_else(|| format!("Article {}", upsert.id));
        Self {
            id: upsert.id,
            title,
            abstract_text: upsert.abstract_text,
            year: upsert.year,
            authors: upsert.authors,
            keywords: upsert.keywords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_title_defaults_to_article_id() {
        let upsert = ArticleUpsert {
            id: "42".to_string(),
            title: None,
            abstract_text: "some abstract".to_string(),
            year: None,
            authors: vec![],
            keywords: vec![],
        };
        let article = Article::from(upsert);
        assert_eq!(article.title, "Article 42");
    }

    #[test]
    fn abstract_field_uses_wire_name() {
        let json = r#"{"id": "1", "title": "T", "abstract": "A"}"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.abstract_text, "A");
    }
}
