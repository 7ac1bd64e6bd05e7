// src/services/query.rs

//! Upstream request target construction.
//!
//! Pure and deterministic: the same `(term, mode, offset)` always yields the
//! same URL.

use url::form_urlencoded;

use crate::models::{SearchMode, UpstreamConfig};

/// Builds fully-encoded request targets for the volumes API.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base_url: String,
    page_size: u32,
    order_by: Option<String>,
    free_text_suffix: String,
}

impl QueryBuilder {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            order_by: config
                .order_by
                .as_ref()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty()),
            free_text_suffix: config.free_text_suffix.trim().to_string(),
        }
    }

    /// Build the request target for a search.
    pub fn build(&self, term: &str, mode: SearchMode, offset: u32) -> String {
        let term = mode.canonical_term(term);
        match mode {
            SearchMode::ById => format!("{}/{}", self.base_url, encode_path_segment(&term)),
            _ => {
                let q = self.query_expression(&term, mode);
                let mut target = format!(
                    "{}?q={}&maxResults={}&startIndex={}",
                    self.base_url,
                    encode_query_value(&q),
                    self.page_size,
                    offset
                );
                if let Some(order_by) = &self.order_by {
                    target.push_str("&orderBy=");
                    target.push_str(&encode_query_value(order_by));
                }
                target
            }
        }
    }

    /// The unencoded `q` expression for a collection mode.
    fn query_expression(&self, term: &str, mode: SearchMode) -> String {
        match mode {
            SearchMode::FreeText if self.free_text_suffix.is_empty() => term.to_string(),
            SearchMode::FreeText => format!("{} {}", term, self.free_text_suffix),
            SearchMode::BySubject => format!("subject:{term}"),
            SearchMode::ByTitle => format!("intitle:{term}"),
            SearchMode::ByIsbn => format!("isbn:{term}"),
            SearchMode::ById => term.to_string(),
        }
    }
}

/// Form-encode a query value (spaces become `+`).
fn encode_query_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Percent-encode a value used as a single path segment.
fn encode_path_segment(value: &str) -> String {
    encode_query_value(value).replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> QueryBuilder {
        QueryBuilder::new(&UpstreamConfig {
            base_url: "https://books.example.com/v1/volumes/".to_string(),
            ..UpstreamConfig::default()
        })
    }

    #[test]
    fn test_free_text_has_suffix_and_pagination() {
        let url = builder().build("dune", SearchMode::FreeText, 0);
        assert_eq!(
            url,
            "https://books.example.com/v1/volumes?q=dune+books&maxResults=20&startIndex=0&orderBy=relevance"
        );
    }

    #[test]
    fn test_free_text_encodes_reserved_characters() {
        let url = builder().build("war & peace", SearchMode::FreeText, 40);
        assert!(url.contains("q=war+%26+peace+books"));
        assert!(url.contains("startIndex=40"));
    }

    #[test]
    fn test_qualified_modes() {
        let b = builder();
        assert!(
            b.build("science fiction", SearchMode::BySubject, 0)
                .contains("q=subject%3Ascience+fiction&")
        );
        assert!(b.build("Dune", SearchMode::ByTitle, 20).contains("q=intitle%3ADune&"));
        assert!(
            b.build("978-0-441-17271-9", SearchMode::ByIsbn, 0)
                .contains("q=isbn%3A9780441172719&")
        );
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        let b = builder();
        assert_eq!(
            b.build("  war   and peace ", SearchMode::FreeText, 0),
            b.build("war and peace", SearchMode::FreeText, 0)
        );
        assert_eq!(
            b.build("978 0441-172719", SearchMode::ByIsbn, 0),
            b.build("9780441172719", SearchMode::ByIsbn, 0)
        );
    }

    #[test]
    fn test_id_is_a_bare_path_segment() {
        let url = builder().build("abc123", SearchMode::ById, 60);
        assert_eq!(url, "https://books.example.com/v1/volumes/abc123");
    }

    #[test]
    fn test_id_cannot_escape_its_segment() {
        let url = builder().build("../x?y", SearchMode::ById, 0);
        assert_eq!(url, "https://books.example.com/v1/volumes/..%2Fx%3Fy");
    }

    #[test]
    fn test_order_hint_can_be_disabled() {
        let b = QueryBuilder::new(&UpstreamConfig {
            order_by: Some(String::new()),
            ..UpstreamConfig::default()
        });
        assert!(!b.build("dune", SearchMode::FreeText, 0).contains("orderBy"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let b = builder();
        for mode in SearchMode::ALL {
            assert_eq!(b.build("dune", mode, 20), b.build("dune", mode, 20));
        }
    }
}
