//! Authentication boundary and session gate.
//!
//! Every sync operation is scoped to a [`Principal`]. The [`SessionGate`]
//! trait is the engine's only view of authentication: it either yields the
//! current principal or nothing, in which case the operation fails before
//! touching the store. [`Session`] is the standard gate, kept up to date by
//! signing in and out through an [`AuthService`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

/// The authenticated identity under which store operations are scoped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable user id, used to locate the user's documents
    pub uid: String,
    pub email: String,
    /// Bearer token for remote stores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Principal {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Supplies the current principal, if any.
pub trait SessionGate: Send + Sync {
    fn current_principal(&self) -> Option<Principal>;
}

/// Sign-in, sign-up and sign-out against an identity provider.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, AuthError>;

    /// Ends the principal's session. Returns false if the provider refused.
    async fn sign_out(&self, principal: &Principal) -> bool;
}

/// Errors returned by an [`AuthService`].
#[derive(Debug)]
pub enum AuthError {
    /// Email or password rejected
    InvalidCredentials,
    /// Sign-up with an email that already has an account
    EmailInUse(String),
    /// Malformed email or too-short password
    InvalidInput(String),
    /// Transport failure talking to the provider
    HttpError(String),
    /// Provider returned an unexpected error
    ServerError { error: String, message: String },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::EmailInUse(email) => write!(f, "An account already exists for {}", email),
            AuthError::InvalidInput(e) => write!(f, "Invalid input: {}", e),
            AuthError::HttpError(e) => write!(f, "HTTP error: {}", e),
            AuthError::ServerError { error, message } => write!(f, "{}: {}", error, message),
        }
    }
}

impl std::error::Error for AuthError {}

/// In-process session holding the signed-in principal.
#[derive(Debug, Default)]
pub struct Session {
    principal: RwLock<Option<Principal>>,
}

impl Session {
    /// Creates a signed-out session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session that is already signed in, e.g. restored from disk.
    pub fn signed_in(principal: Principal) -> Self {
        Self {
            principal: RwLock::new(Some(principal)),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_principal().is_some()
    }

    pub async fn sign_in(
        &self,
        auth: &dyn AuthService,
        email: &str,
        password: &str,
    ) -> Result<Principal, AuthError> {
        let principal = auth.sign_in(email, password).await.inspect_err(|e| {
            tracing::warn!(email = %email, err = %e, "sign in failed");
        })?;
        self.replace(Some(principal.clone()));
        tracing::info!(uid = %principal.uid, "signed in");
        Ok(principal)
    }

    pub async fn sign_up(
        &self,
        auth: &dyn AuthService,
        email: &str,
        password: &str,
    ) -> Result<Principal, AuthError> {
        let principal = auth.sign_up(email, password).await.inspect_err(|e| {
            tracing::warn!(email = %email, err = %e, "sign up failed");
        })?;
        self.replace(Some(principal.clone()));
        tracing::info!(uid = %principal.uid, "signed up");
        Ok(principal)
    }

    /// Signs out. The session is cleared only if the provider agreed.
    ///
    /// Signing out of a signed-out session succeeds.
    pub async fn sign_out(&self, auth: &dyn AuthService) -> bool {
        let Some(principal) = self.current_principal() else {
            return true;
        };

        if auth.sign_out(&principal).await {
            self.replace(None);
            tracing::info!(uid = %principal.uid, "signed out");
            true
        } else {
            tracing::warn!(uid = %principal.uid, "sign out refused");
            false
        }
    }

    fn replace(&self, principal: Option<Principal>) {
        *self
            .principal
            .write()
            .unwrap_or_else(PoisonError::into_inner) = principal;
    }
}

impl SessionGate for Session {
    fn current_principal(&self) -> Option<Principal> {
        self.principal
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FakeAuth {
        allow_sign_out: AtomicBool,
    }

    impl FakeAuth {
        fn new() -> Self {
            Self {
                allow_sign_out: AtomicBool::new(true),
            }
        }
    }

    #[async_trait]
    impl AuthService for FakeAuth {
        async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
            if password == "correct horse" {
                Ok(Principal::new("uid-1", email).with_token("tok"))
            } else {
                Err(AuthError::InvalidCredentials)
            }
        }

        async fn sign_up(&self, email: &str, _password: &str) -> Result<Principal, AuthError> {
            if email == "taken@example.com" {
                Err(AuthError::EmailInUse(email.to_string()))
            } else {
                Ok(Principal::new("uid-new", email))
            }
        }

        async fn sign_out(&self, _principal: &Principal) -> bool {
            self.allow_sign_out.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_new_session_is_signed_out() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert!(session.current_principal().is_none());
    }

    #[test]
    fn test_signed_in_session() {
        let session = Session::signed_in(Principal::new("u", "u@example.com"));
        assert_eq!(session.current_principal().unwrap().uid, "u");
    }

    #[tokio::test]
    async fn test_sign_in_sets_principal() {
        let auth = FakeAuth::new();
        let session = Session::new();

        let principal = session
            .sign_in(&auth, "a@example.com", "correct horse")
            .await
            .unwrap();

        assert_eq!(principal.uid, "uid-1");
        assert_eq!(session.current_principal(), Some(principal));
    }

    #[tokio::test]
    async fn test_failed_sign_in_leaves_session_unchanged() {
        let auth = FakeAuth::new();
        let session = Session::new();

        let result = session.sign_in(&auth, "a@example.com", "wrong").await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_up_email_in_use() {
        let auth = FakeAuth::new();
        let session = Session::new();

        let err = session
            .sign_up(&auth, "taken@example.com", "secret1")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("taken@example.com"));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_out_clears_principal() {
        let auth = FakeAuth::new();
        let session = Session::signed_in(Principal::new("u", "u@example.com"));

        assert!(session.sign_out(&auth).await);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_refused_sign_out_keeps_principal() {
        let auth = FakeAuth::new();
        auth.allow_sign_out.store(false, Ordering::SeqCst);
        let session = Session::signed_in(Principal::new("u", "u@example.com"));

        assert!(!session.sign_out(&auth).await);
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_principal_token_not_serialized_when_absent() {
        let json = serde_json::to_string(&Principal::new("u", "e")).unwrap();
        assert!(!json.contains("token"));
    }
}
