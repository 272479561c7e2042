//! JSON bodies of the `quotenest-server` HTTP API.

use serde::{Deserialize, Serialize};

use crate::session::Principal;
use crate::store::{FieldMutation, Fields, StoredDocument};

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Body of `POST /auth/signup` and `POST /auth/signin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Successful sign-up or sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub uid: String,
    pub email: String,
    pub token: String,
}

impl From<AuthResponse> for Principal {
    fn from(response: AuthResponse) -> Self {
        Principal::new(response.uid, response.email).with_token(response.token)
    }
}

/// Body of `GET /me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeResponse {
    pub uid: String,
    pub email: String,
}

/// Body of `PUT /documents/{path}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetDocumentRequest {
    pub fields: Fields,
}

/// Body of `PATCH /documents/{path}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFieldRequest {
    pub field: String,
    pub mutation: FieldMutation,
}

/// Body of `GET /collections/{path}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResponse {
    pub documents: Vec<StoredDocument>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_field_request_format() {
        let request = UpdateFieldRequest {
            field: "quotes".to_string(),
            mutation: FieldMutation::RemoveExact(json!({"id": "1"})),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"field": "quotes", "mutation": {"op": "remove_exact", "value": {"id": "1"}}})
        );
    }

    #[test]
    fn test_auth_response_into_principal() {
        let principal: Principal = AuthResponse {
            uid: "u1".to_string(),
            email: "a@example.com".to_string(),
            token: "tok".to_string(),
        }
        .into();
        assert_eq!(principal.uid, "u1");
        assert_eq!(principal.token.as_deref(), Some("tok"));
    }
}
