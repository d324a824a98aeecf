//! Domain service for authentication and account management.
//!
//! Handles registration, credential resolution, token issuance, account
//! field updates, and password changes.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Deliberately generic: callers must not be able to distinguish
    /// "no such account" from "bad password".
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not found")]
    AccountNotFound,

    /// Per-field validation failures, reported together.
    #[error("Validation failed")]
    Fields(BTreeMap<String, String>),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Account info DTO for responses (never carries the password hash).
#[derive(Debug, Clone, Serialize)]
pub struct AccountInfo {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: String,
    pub last_login: Option<String>,
}

impl From<crate::db::Account> for AccountInfo {
    fn from(account: crate::db::Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            is_active: account.is_active,
            is_staff: account.is_staff,
            is_superuser: account.is_superuser,
            date_joined: account.date_joined,
            last_login: account.last_login,
        }
    }
}

/// Login result containing the account and its bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub account: AccountInfo,
}

/// Registration request payload.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
}

/// Allow-listed account field updates; duplicate checks run against other
/// accounts before anything is applied.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdateInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a new account and issues its token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Fields`] with a per-field message map when any
    /// input is missing, malformed, or conflicts with an existing account.
    async fn register(&self, input: RegisterInput) -> Result<LoginResult, AuthError>;

    /// Resolves a login identifier (username or email, case-insensitive) and
    /// password to an account, then issues the session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on any resolution failure.
    async fn login(&self, identifier: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Resolves a bearer token key to its owning account.
    async fn resolve_token(&self, key: &str) -> Result<Option<AccountInfo>, AuthError>;

    /// Revokes the account's bearer token (token-authenticated logout).
    async fn revoke_token(&self, account_id: i32) -> Result<bool, AuthError>;

    /// Gets information for a specific account.
    async fn get_account(&self, account_id: i32) -> Result<AccountInfo, AuthError>;

    /// Applies allow-listed field updates after duplicate checks.
    async fn update_account(
        &self,
        account_id: i32,
        update: AccountUpdateInput,
    ) -> Result<AccountInfo, AuthError>;

    /// Changes an account's password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Fields`] if the current password is wrong or the
    /// new password pair is invalid.
    async fn change_password(
        &self,
        account_id: i32,
        current_password: &str,
        new_password: &str,
        new_password2: &str,
    ) -> Result<(), AuthError>;
}
