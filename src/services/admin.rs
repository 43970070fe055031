//! Admin service: credential check, session tokens, bootstrap account.
//!
//! ARCHITECTURE
//! ============
//! Admins authenticate once with email + password and receive an opaque
//! session token (HttpOnly cookie). Every admin route resolves the token
//! back to an `Admin` through `AdminRepository::get_by_session`.
//!
//! Passwords are stored as `salt$digest`: a random 16-byte salt and the
//! SHA-256 of salt followed by password, both hex. Expired sessions are
//! pruned whenever an admin logs in.

use std::fmt::Write;

use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use crate::config::AdminConfig;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Admin {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl crate::error::ErrorCode for AdminError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "E_INVALID_CREDENTIALS",
            Self::Database(_) => "E_DATABASE",
        }
    }
}

// =============================================================================
// TOKENS + HASHING
// =============================================================================

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a random 32-byte hex session token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Session lifetime; matches the `admin_sessions.expires_at` default.
pub const SESSION_TTL_DAYS: i64 = 30;

const SALT_LEN: usize = 16;

fn salted_digest(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

/// Hash with a fresh random salt.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::rng().random();
    let salt_hex = bytes_to_hex(&salt);
    let digest = salted_digest(&salt_hex, password);
    format!("{salt_hex}${digest}")
}

/// Check `password` against a stored `salt$digest`. Malformed hashes never match.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest)) = stored.split_once('$') else {
        return false;
    };
    if salt_hex.len() != SALT_LEN * 2 {
        return false;
    }
    let expected = salted_digest(salt_hex, password);
    // Constant-time compare.
    expected.len() == digest.len()
        && expected
            .bytes()
            .zip(digest.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

// =============================================================================
// REPOSITORY
// =============================================================================

#[async_trait::async_trait]
pub trait AdminRepository: Send + Sync {
    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>, AdminError>;
    async fn create_admin(&self, email: &str, password_hash: &str) -> Result<Admin, AdminError>;
    async fn create_session(&self, admin_id: i64, token: &str) -> Result<(), AdminError>;
    async fn get_by_session(&self, token: &str) -> Result<Option<Admin>, AdminError>;
    async fn delete_session(&self, token: &str) -> Result<(), AdminError>;
    /// Drop sessions past their expiry; returns how many were removed.
    async fn delete_expired_sessions(&self) -> Result<u64, AdminError>;
}

pub struct PgAdminRepository {
    pool: PgPool,
}

impl PgAdminRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn admin_from_row(row: &sqlx::postgres::PgRow) -> Admin {
    Admin { id: row.get("id"), email: row.get("email"), password_hash: row.get("password_hash") }
}

#[async_trait::async_trait]
impl AdminRepository for PgAdminRepository {
    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>, AdminError> {
        let row = sqlx::query("SELECT id, email, password_hash FROM admins WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(admin_from_row))
    }

    async fn create_admin(&self, email: &str, password_hash: &str) -> Result<Admin, AdminError> {
        let row = sqlx::query(
            r"INSERT INTO admins (email, password_hash)
              VALUES ($1, $2)
              ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
              RETURNING id, email, password_hash",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(admin_from_row(&row))
    }

    async fn create_session(&self, admin_id: i64, token: &str) -> Result<(), AdminError> {
        sqlx::query("INSERT INTO admin_sessions (token, admin_id) VALUES ($1, $2)")
            .bind(token)
            .bind(admin_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_by_session(&self, token: &str) -> Result<Option<Admin>, AdminError> {
        let row = sqlx::query(
            r"SELECT a.id, a.email, a.password_hash
              FROM admin_sessions s
              JOIN admins a ON a.id = s.admin_id
              WHERE s.token = $1 AND s.expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(admin_from_row))
    }

    async fn delete_session(&self, token: &str) -> Result<(), AdminError> {
        sqlx::query("DELETE FROM admin_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<u64, AdminError> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Verify credentials and open a session. Returns the admin and its token.
///
/// # Errors
///
/// [`AdminError::InvalidCredentials`] for an unknown email or wrong password.
pub async fn login(repo: &dyn AdminRepository, email: &str, password: &str) -> Result<(Admin, String), AdminError> {
    let admin = repo
        .get_by_email(email)
        .await?
        .ok_or(AdminError::InvalidCredentials)?;
    if !verify_password(password, &admin.password_hash) {
        return Err(AdminError::InvalidCredentials);
    }

    let pruned = repo.delete_expired_sessions().await?;
    if pruned > 0 {
        debug!(pruned, "expired admin sessions removed");
    }

    let token = generate_token();
    repo.create_session(admin.id, &token).await?;
    Ok((admin, token))
}

/// Create the configured bootstrap admin unless it already exists.
///
/// # Errors
///
/// Returns a database error if the lookup or insert fails.
pub async fn ensure_admin(repo: &dyn AdminRepository, config: &AdminConfig) -> Result<Admin, AdminError> {
    if let Some(existing) = repo.get_by_email(&config.email).await? {
        return Ok(existing);
    }
    let admin = repo
        .create_admin(&config.email, &hash_password(&config.password))
        .await?;
    info!(admin_id = admin.id, email = %admin.email, "bootstrap admin created");
    Ok(admin)
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;
