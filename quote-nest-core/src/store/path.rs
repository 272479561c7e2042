use std::fmt;

use super::StoreError;
use crate::models::QuoteId;

/// Collection holding one document per user.
pub const USERS_COLLECTION: &str = "users";
/// Sub-collection holding one document per saved quote.
pub const QUOTES_COLLECTION: &str = "quotes";

/// Slash-separated location of a document or collection.
///
/// Segments are validated on construction so a path can be mapped onto a
/// directory tree or a URL without escaping its root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// Parses `a/b/c`. Leading and trailing slashes are ignored.
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }

        let segments = trimmed
            .split('/')
            .map(|s| validate_segment(s).map(|_| s.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    /// The user's document, `users/{uid}`.
    pub fn user(uid: &str) -> Result<Self, StoreError> {
        Self::from_segments([USERS_COLLECTION, uid])
    }

    /// The user's quote collection, `users/{uid}/quotes`.
    pub fn user_quotes(uid: &str) -> Result<Self, StoreError> {
        Self::from_segments([USERS_COLLECTION, uid, QUOTES_COLLECTION])
    }

    /// One saved quote, `users/{uid}/quotes/{id}`.
    pub fn user_quote(uid: &str, id: &QuoteId) -> Result<Self, StoreError> {
        Self::from_segments([USERS_COLLECTION, uid, QUOTES_COLLECTION, id.as_str()])
    }

    fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Result<Self, StoreError> {
        let segments = segments
            .into_iter()
            .map(|s| validate_segment(s).map(|_| s.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Appends a segment.
    pub fn child(&self, segment: &str) -> Result<Self, StoreError> {
        validate_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment: the document id within its collection.
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// The containing path, or `None` for a single-segment path.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns true if `self` equals `prefix` or lies beneath it.
    pub fn starts_with(&self, prefix: &DocumentPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Rejects segments that could escape the store root when used as a file name.
fn validate_segment(segment: &str) -> Result<(), StoreError> {
    if segment.is_empty()
        || segment.contains('/')
        || segment.contains('\\')
        || segment.contains("..")
        || segment.starts_with('.')
    {
        return Err(StoreError::InvalidPath(segment.to_string()));
    }
    Ok(())
}
