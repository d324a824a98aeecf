//! Domain service for the self-service alumni profile.
//!
//! An account owns at most one profile; creation is guarded by an existence
//! check and the unique index on the owning account.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::entities::alumni;
use crate::services::auth_service::AccountInfo;

/// Errors specific to profile operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed")]
    Fields(BTreeMap<String, String>),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ProfileError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ProfileError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Write payload shared by profile create and partial update. For creation,
/// missing name/email fields default from the owning account.
#[derive(Debug, Clone, Default)]
pub struct ProfileWriteInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub graduation_year: Option<i32>,
    pub current_company: Option<String>,
    pub job_title: Option<String>,
    pub industry: Option<String>,
    pub status: Option<String>,
    pub linkedin_url: Option<Option<String>>,
    pub bio: Option<String>,
}

/// Domain service trait for the profile linker.
#[async_trait::async_trait]
pub trait ProfileService: Send + Sync {
    /// Returns the profile linked to the account.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotFound`] if no profile is linked.
    async fn get_own(&self, account_id: i32) -> Result<alumni::Model, ProfileError>;

    /// Creates the account's profile.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Conflict`] if a profile is already linked.
    async fn create_own(
        &self,
        account: &AccountInfo,
        input: ProfileWriteInput,
    ) -> Result<alumni::Model, ProfileError>;

    /// Merges the supplied fields into the linked profile.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotFound`] if no profile is linked.
    async fn update_own(
        &self,
        account_id: i32,
        input: ProfileWriteInput,
    ) -> Result<alumni::Model, ProfileError>;
}
