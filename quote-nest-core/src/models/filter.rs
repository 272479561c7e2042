use super::quote::Quote;

/// Criteria for narrowing a saved-quote list.
///
/// Unset criteria match everything; set criteria are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteFilter {
    /// Exact tag, case-insensitive
    pub tag: Option<String>,
    /// Substring of the author, case-insensitive
    pub author: Option<String>,
    /// Substring of text, author or notes, case-insensitive
    pub search: Option<String>,
}

impl QuoteFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.author.is_none() && self.search.is_none()
    }

    pub fn matches(&self, quote: &Quote) -> bool {
        if let Some(tag) = &self.tag {
            if !quote.has_tag(tag) {
                return false;
            }
        }

        if let Some(author) = &self.author {
            if !contains_ignore_case(&quote.author, author) {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let hit = contains_ignore_case(&quote.text, search)
                || contains_ignore_case(&quote.author, search)
                || contains_ignore_case(quote.notes_or_empty(), search);
            if !hit {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, quotes: Vec<Quote>) -> Vec<Quote> {
        quotes.into_iter().filter(|q| self.matches(q)).collect()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> Vec<Quote> {
        vec![
            Quote::new("1", "Simplicity is the ultimate sophistication.", "Leonardo da Vinci")
                .with_tags(vec!["wisdom".into()]),
            Quote::new("2", "Stay hungry, stay foolish.", "Steve Jobs")
                .with_tags(vec!["motivation".into()])
                .with_notes("commencement speech"),
            Quote::new("3", "Knowledge is power.", "Francis Bacon")
                .with_tags(vec!["wisdom".into(), "knowledge".into()]),
        ]
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let filter = QuoteFilter::new();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(library()).len(), 3);
    }

    #[test]
    fn test_filter_by_tag() {
        let results = QuoteFilter::new().with_tag("WISDOM").apply(library());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|q| q.has_tag("wisdom")));
    }

    #[test]
    fn test_filter_by_author_substring() {
        let results = QuoteFilter::new().with_author("jobs").apply(library());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id.as_str(), "2");
    }

    #[test]
    fn test_search_covers_notes() {
        let results = QuoteFilter::new().with_search("speech").apply(library());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].author, "Steve Jobs");
    }

    #[test]
    fn test_criteria_combine() {
        let results = QuoteFilter::new()
            .with_tag("wisdom")
            .with_search("power")
            .apply(library());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id.as_str(), "3");
    }
}
