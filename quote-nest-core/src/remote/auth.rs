//! Email/password authentication against `quotenest-server`.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use super::wire::{AuthResponse, Credentials, MeResponse};
use super::{build_client, read_error, trim_base_url};
use crate::session::{AuthError, AuthService, Principal};

/// [`AuthService`] backed by the server's `/auth` routes.
pub struct HttpAuth {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAuth {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: trim_base_url(base_url),
            client: build_client(timeout),
        }
    }

    /// Checks a token with `GET /me`.
    ///
    /// Returns `Ok(None)` if the server no longer accepts the token.
    pub async fn whoami(&self, token: &str) -> Result<Option<MeResponse>, AuthError> {
        let response = self
            .client
            .get(format!("{}/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::HttpError(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if !response.status().is_success() {
            let body = read_error(response).await;
            return Err(AuthError::ServerError {
                error: body.error,
                message: body.message,
            });
        }

        let me = response
            .json()
            .await
            .map_err(|e| AuthError::HttpError(e.to_string()))?;
        Ok(Some(me))
    }

    async fn authenticate(
        &self,
        route: &str,
        email: &str,
        password: &str,
    ) -> Result<Principal, AuthError> {
        let response = self
            .client
            .post(format!("{}/auth/{}", self.base_url, route))
            .json(&Credentials {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(|e| AuthError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error(response).await;
            return Err(match status {
                StatusCode::UNAUTHORIZED => AuthError::InvalidCredentials,
                StatusCode::CONFLICT => AuthError::EmailInUse(email.to_string()),
                StatusCode::BAD_REQUEST => AuthError::InvalidInput(body.message),
                _ => AuthError::ServerError {
                    error: body.error,
                    message: body.message,
                },
            });
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| AuthError::HttpError(e.to_string()))?;
        Ok(auth.into())
    }
}

#[async_trait]
impl AuthService for HttpAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        self.authenticate("signin", email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        self.authenticate("signup", email, password).await
    }

    async fn sign_out(&self, principal: &Principal) -> bool {
        let Some(token) = principal.token.as_deref() else {
            return true;
        };

        let result = self
            .client
            .post(format!("{}/auth/signout", self.base_url))
            .bearer_auth(token)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            // An expired token is as good as signed out
            Ok(response) if response.status() == StatusCode::UNAUTHORIZED => true,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "server refused sign-out");
                false
            }
            Err(e) => {
                tracing::warn!(err = %e, "sign-out request failed");
                false
            }
        }
    }
}
