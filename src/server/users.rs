//! Account storage for email/password authentication.
//!
//! Accounts live in the `users` table. Passwords are never stored: each
//! row keeps an Argon2id hash in PHC string form, salt included.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::SqlitePool;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;
const SALT_LEN: usize = 16;

/// A registered account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    created_at: String,
}

impl UserRow {
    fn into_user(self) -> Result<User, UserError> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                tracing::warn!(uid = %self.id, "unreadable created_at {:?}", self.created_at);
                UserError::CorruptRecord(self.id.clone(), format!("created_at: {}", e))
            })?;
        Ok(User {
            id: self.id,
            email: self.email,
            created_at,
        })
    }
}

/// Errors that can occur when creating or checking accounts.
#[derive(Debug)]
pub enum UserError {
    InvalidEmail(String),
    PasswordTooShort,
    EmailTaken(String),
    PasswordHash(String),
    CorruptRecord(String, String),
    Database(sqlx::Error),
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserError::InvalidEmail(email) => write!(f, "Invalid email address: {}", email),
            UserError::PasswordTooShort => write!(
                f,
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            ),
            UserError::EmailTaken(email) => {
                write!(f, "An account already exists for {}", email)
            }
            UserError::PasswordHash(e) => write!(f, "Password hashing failed: {}", e),
            UserError::CorruptRecord(uid, detail) => {
                write!(f, "Corrupt account record {}: {}", uid, detail)
            }
            UserError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for UserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UserError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for UserError {
    fn from(e: sqlx::Error) -> Self {
        UserError::Database(e)
    }
}

pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates an account. The email is trimmed and lowercased.
    pub async fn create(&self, email: &str, password: &str) -> Result<User, UserError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(UserError::PasswordTooShort);
        }

        let password_hash = hash_password(password)?;
        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(password_hash)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::info!(uid = %user.id, "created account");
                Ok(user)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(UserError::EmailTaken(user.email))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Checks credentials. Returns `None` for an unknown email or a wrong
    /// password.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, UserError> {
        let email = email.trim().to_lowercase();
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        if verify_password(password, &row.password_hash, &row.id) {
            row.into_user().map(Some)
        } else {
            Ok(None)
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>, UserError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    pub async fn count(&self) -> Result<i64, UserError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Trims and lowercases an email, rejecting anything that is not
/// `local@domain.tld`.
pub fn normalize_email(email: &str) -> Result<String, UserError> {
    let email = email.trim().to_lowercase();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(email)
    } else {
        Err(UserError::InvalidEmail(email))
    }
}

/// Hashes with Argon2id under a fresh random salt, returning the PHC string.
fn hash_password(password: &str) -> Result<String, UserError> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|e| UserError::PasswordHash(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, stored: &str, uid: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(uid = %uid, "stored password hash is unreadable: {}", e);
            false
        }
    }
}
