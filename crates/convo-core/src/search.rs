//! In-memory search over cached threads and comments.
//!
//! Pure, synchronous, ASCII case-insensitive substring matching across an
//! item's searchable fields; there is no server-side search. An empty query
//! matches everything, and filtering preserves the input order.

use crate::models::{Comment, Thread};

/// Anything the search box can filter.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

impl Searchable for Thread {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.creator, &self.url]
    }
}

impl Searchable for Comment {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.text.as_str(), self.author.as_str()];
        if let Some(alias) = &self.author_alias {
            fields.push(alias);
        }
        if let Some(url) = &self.url {
            fields.push(url);
        }
        fields
    }
}

/// Check if text contains `term` (ASCII case-insensitive).
fn text_contains_term(text: &str, term: &str) -> bool {
    let text_chars: Vec<char> = text.chars().collect();
    let term_chars: Vec<char> = term.chars().collect();

    if term_chars.is_empty() {
        return true;
    }
    if text_chars.len() < term_chars.len() {
        return false;
    }

    for start_idx in 0..=(text_chars.len() - term_chars.len()) {
        let matches = term_chars.iter().enumerate().all(|(i, tc)| {
            text_chars
                .get(start_idx + i)
                .is_some_and(|c| c.eq_ignore_ascii_case(tc))
        });
        if matches {
            return true;
        }
    }
    false
}

/// True when ANY searchable field contains the query.
pub fn matches<T: Searchable>(item: &T, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }
    item.search_fields()
        .iter()
        .any(|field| text_contains_term(field, query))
}

/// Filter `items` down to those matching `query`, order-preserving.
pub fn filter<T: Searchable + Clone>(items: &[T], query: &str) -> Vec<T> {
    items
        .iter()
        .filter(|item| matches(*item, query))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threads() -> Vec<Thread> {
        vec![
            Thread {
                id: "t1".into(),
                title: "Rust discussion".into(),
                url: "https://example.com/rust/".into(),
                creator: "0xalice00000000000000000000000000000000ce".into(),
                created_on: "1".into(),
            },
            Thread {
                id: "t2".into(),
                title: "Cooking tips".into(),
                url: "https://food.example.org/".into(),
                creator: "0xb0b0000000000000000000000000000000000000".into(),
                created_on: "2".into(),
            },
        ]
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let items = threads();
        let filtered = filter(&items, "");
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].id, "t1");
        assert_eq!(filtered[1].id, "t2");
    }

    #[test]
    fn test_case_insensitive_author_match() {
        let items = threads();
        let filtered = filter(&items, "ALICE");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "t1");
    }

    #[test]
    fn test_matches_any_field() {
        let items = threads();
        assert_eq!(filter(&items, "cooking").len(), 1);
        assert_eq!(filter(&items, "food.example").len(), 1);
        assert_eq!(filter(&items, "example").len(), 2);
        assert!(filter(&items, "no such thing").is_empty());
    }

    #[test]
    fn test_comment_alias_is_searchable() {
        let comment = Comment {
            id: "c1".into(),
            thread_id: "t1".into(),
            author: "0x9fa1c391e1a7fbb1cde3b9ad05afc6c796e5e3b1".into(),
            author_alias: Some("alice.eth".into()),
            text: "gm".into(),
            url: None,
            created_on: "1".into(),
        };
        assert!(matches(&comment, "alice"));
        assert!(!matches(&comment, "bob"));
    }
}
