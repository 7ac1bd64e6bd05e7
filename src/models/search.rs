//! Search request types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Supported upstream query kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Single volume lookup by upstream ID
    ById,
    /// Genre search (`subject:` qualifier)
    BySubject,
    /// Title search (`intitle:` qualifier)
    ByTitle,
    /// Unqualified text search
    FreeText,
    /// ISBN search (`isbn:` qualifier)
    ByIsbn,
}

impl SearchMode {
    /// All modes, in declaration order.
    pub const ALL: [SearchMode; 5] = [
        SearchMode::ById,
        SearchMode::BySubject,
        SearchMode::ByTitle,
        SearchMode::FreeText,
        SearchMode::ByIsbn,
    ];

    /// Short label used in cache namespaces and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::ById => "id",
            SearchMode::BySubject => "subject",
            SearchMode::ByTitle => "title",
            SearchMode::FreeText => "text",
            SearchMode::ByIsbn => "isbn",
        }
    }

    /// Canonical form of a term, as sent upstream and as cached.
    ///
    /// Whitespace runs collapse to one space. ISBNs drop separators and
    /// upper-case the `X` check digit.
    pub fn canonical_term(&self, term: &str) -> String {
        match self {
            SearchMode::ByIsbn => term
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '-')
                .collect::<String>()
                .to_uppercase(),
            _ => term.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }

    /// Whether upstream answers this mode with a paged collection.
    pub fn is_collection(&self) -> bool {
        !matches!(self, SearchMode::ById)
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "id" | "by_id" => Ok(SearchMode::ById),
            "subject" | "genre" | "by_subject" => Ok(SearchMode::BySubject),
            "title" | "intitle" | "by_title" => Ok(SearchMode::ByTitle),
            "text" | "free-text" | "free_text" | "query" => Ok(SearchMode::FreeText),
            "isbn" | "by_isbn" => Ok(SearchMode::ByIsbn),
            other => Err(AppError::validation(format!("Unknown search mode '{other}'"))),
        }
    }
}

/// One inbound search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub term: String,
    pub mode: SearchMode,
    /// Pagination offset; ignored for ID lookups
    pub offset: u32,
    /// Attach descriptions to the resulting books
    pub detailed: bool,
}

impl SearchRequest {
    /// Build a list-view request (no descriptions).
    pub fn new(mode: SearchMode, term: impl Into<String>, offset: u32) -> Self {
        Self {
            term: term.into(),
            mode,
            offset,
            detailed: false,
        }
    }

    /// Build a single-volume lookup. ID lookups are always detailed.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            term: id.into(),
            mode: SearchMode::ById,
            offset: 0,
            detailed: true,
        }
    }

    /// Set the detailed flag.
    pub fn detailed(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }

    /// The term in canonical form for this request's mode.
    pub fn canonical_term(&self) -> String {
        self.mode.canonical_term(&self.term)
    }

    /// Offset actually sent upstream.
    pub fn effective_offset(&self) -> u32 {
        if self.mode.is_collection() {
            self.offset
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str_aliases() {
        assert_eq!("genre".parse::<SearchMode>().unwrap(), SearchMode::BySubject);
        assert_eq!("Title".parse::<SearchMode>().unwrap(), SearchMode::ByTitle);
        assert_eq!("free-text".parse::<SearchMode>().unwrap(), SearchMode::FreeText);
        assert!("volume".parse::<SearchMode>().is_err());
    }

    #[test]
    fn test_mode_labels_are_distinct() {
        let labels: std::collections::HashSet<_> =
            SearchMode::ALL.iter().map(|m| m.as_str()).collect();
        assert_eq!(labels.len(), SearchMode::ALL.len());
    }

    #[test]
    fn test_canonical_term() {
        assert_eq!(SearchMode::ByIsbn.canonical_term(" 978-0-441 17271-9 "), "9780441172719");
        assert_eq!(SearchMode::ByIsbn.canonical_term("0-441-17271-x"), "044117271X");
        assert_eq!(SearchMode::FreeText.canonical_term("  war \t and  peace "), "war and peace");
        assert_eq!(SearchMode::ById.canonical_term(" AbC123 "), "AbC123");
        assert_eq!(SearchMode::ByIsbn.canonical_term(" - - "), "");
    }

    #[test]
    fn test_id_lookup_ignores_offset() {
        let mut request = SearchRequest::by_id("abc123");
        request.offset = 40;
        assert_eq!(request.effective_offset(), 0);
        assert!(request.detailed);

        let request = SearchRequest::new(SearchMode::ByTitle, "dune", 20);
        assert_eq!(request.effective_offset(), 20);
        assert!(!request.detailed);
    }
}
