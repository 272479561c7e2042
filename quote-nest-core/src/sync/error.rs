//! Sync error types.

use crate::models::QuoteError;
use crate::store::StoreError;

/// Errors that can occur during quote sync operations.
#[derive(Debug)]
pub enum SyncError {
    /// No principal is signed in; no store call was made
    Unauthenticated,
    /// Quote cannot be saved as given; no store call was made
    InvalidQuote(QuoteError),
    /// A store call failed
    StoreUnavailable(StoreError),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Unauthenticated => write!(f, "User not authenticated"),
            SyncError::InvalidQuote(e) => write!(f, "Invalid quote: {}", e),
            SyncError::StoreUnavailable(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Unauthenticated => None,
            SyncError::InvalidQuote(e) => Some(e),
            SyncError::StoreUnavailable(e) => Some(e),
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        SyncError::StoreUnavailable(e)
    }
}

impl From<QuoteError> for SyncError {
    fn from(e: QuoteError) -> Self {
        SyncError::InvalidQuote(e)
    }
}
