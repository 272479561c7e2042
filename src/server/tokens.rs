//! Session token storage.
//!
//! Tokens are issued on sign-up and sign-in, stored in memory and expire
//! after a configurable time. Restarting the server signs everyone out.

use rand::Rng;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// The account a token was issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    /// The bearer token the request was made with
    pub token: String,
}

#[derive(Debug, Clone)]
struct TokenData {
    uid: String,
    email: String,
    expires_at: Instant,
}

/// In-memory token store with expiry.
#[derive(Debug)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, TokenData>>,
    default_expiry: Duration,
}

impl TokenStore {
    pub fn new(expiry: Duration) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            default_expiry: expiry,
        }
    }

    /// Issues a token for the account.
    ///
    /// Returns the token string (32 bytes, base64url encoded).
    pub fn issue(&self, uid: &str, email: &str) -> String {
        self.issue_with_expiry(uid, email, self.default_expiry)
    }

    pub fn issue_with_expiry(&self, uid: &str, email: &str, expiry: Duration) -> String {
        let token = generate_token();
        let data = TokenData {
            uid: uid.to_string(),
            email: email.to_string(),
            expires_at: Instant::now() + expiry,
        };

        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), data);
        token
    }

    /// Looks up a token. Expired tokens are dropped and yield `None`.
    pub fn validate(&self, token: &str) -> Option<AuthUser> {
        let data = self
            .tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()?;

        if Instant::now() > data.expires_at {
            self.revoke(token);
            return None;
        }

        Some(AuthUser {
            uid: data.uid,
            email: data.email,
            token: token.to_string(),
        })
    }

    /// Removes a token. Returns false if it was unknown.
    pub fn revoke(&self, token: &str) -> bool {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }

    /// Removes all expired tokens.
    ///
    /// Returns the number of tokens removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        let before = tokens.len();
        tokens.retain(|_, data| data.expires_at > now);
        before - tokens.len()
    }

    pub fn len(&self) -> usize {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Generates a secure random token.
///
/// Returns 32 random bytes encoded as base64url (no padding).
fn generate_token() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn store() -> TokenStore {
        TokenStore::new(Duration::from_secs(600))
    }

    #[test]
    fn test_issue_returns_unique() {
        let store = store();

        let token1 = store.issue("u1", "a@example.com");
        let token2 = store.issue("u1", "a@example.com");

        assert_ne!(token1, token2);
        assert_eq!(token1.len(), 43); // 32 bytes base64url = 43 chars
    }

    #[test]
    fn test_validate_is_reusable() {
        let store = store();
        let token = store.issue("u1", "a@example.com");

        let user = store.validate(&token).unwrap();
        assert_eq!(user.uid, "u1");
        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.token, token);

        // Unlike one-shot tokens, session tokens survive validation
        assert!(store.validate(&token).is_some());
    }

    #[test]
    fn test_validate_unknown_token() {
        assert!(store().validate("nonexistent-token").is_none());
    }

    #[test]
    fn test_validate_expired_token() {
        let store = store();
        let token = store.issue_with_expiry("u1", "a@example.com", Duration::from_secs(0));

        thread::sleep(Duration::from_millis(10));

        assert!(store.validate(&token).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_revoke() {
        let store = store();
        let token = store.issue("u1", "a@example.com");

        assert!(store.revoke(&token));
        assert!(!store.revoke(&token));
        assert!(store.validate(&token).is_none());
    }

    #[test]
    fn test_cleanup_expired() {
        let store = store();

        store.issue_with_expiry("u1", "a@example.com", Duration::from_secs(0));
        store.issue_with_expiry("u2", "b@example.com", Duration::from_secs(0));
        store.issue("u3", "c@example.com");

        thread::sleep(Duration::from_millis(10));
        assert_eq!(store.len(), 3);

        assert_eq!(store.cleanup_expired(), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_generate_token_format() {
        let token = generate_token();

        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
