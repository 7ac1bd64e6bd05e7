//! Book data structure.

use serde::{Deserialize, Serialize};

/// Placeholder used when upstream omits an author or lists a null one.
pub const UNKNOWN_AUTHOR: &str = "Author Unknown";

/// A normalized book record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    /// Volume ID, or ISBN-13 for ISBN searches
    pub id: String,

    /// Book title
    pub title: String,

    /// Author names in upstream order
    pub authors: Vec<String>,

    /// Free-form publication date as supplied upstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,

    /// Resolved cover image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,

    /// Raw upstream description markup, only for detailed lookups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book() -> Book {
        Book {
            id: "hUZWAAAAcAAJ".to_string(),
            title: "Dune".to_string(),
            authors: vec!["Frank Herbert".to_string()],
            published_date: Some("1965".to_string()),
            cover: None,
            description: Some("<p>Arrakis</p>".to_string()),
        }
    }

    #[test]
    fn test_serialization_omits_absent_fields() {
        let json = serde_json::to_value(sample_book()).unwrap();
        assert_eq!(json["id"], "hUZWAAAAcAAJ");
        assert!(json.get("cover").is_none());
        assert_eq!(json["published_date"], "1965");
    }

    #[test]
    fn test_description_markup_is_kept_verbatim() {
        let json = serde_json::to_string(&sample_book()).unwrap();
        let back: Book = serde_json::from_str(&json).unwrap();
        assert_eq!(back.description.as_deref(), Some("<p>Arrakis</p>"));
    }
}
