//! `SeaORM` implementation of the `ProfileService` trait.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::info;

use crate::db::{AlumniInput, AlumniUpdate, ProfileCreateOutcome, Store};
use crate::entities::alumni;
use crate::services::auth_service::AccountInfo;
use crate::services::profile_service::{ProfileError, ProfileService, ProfileWriteInput};

/// Curated fields of study; anything else non-blank is also accepted,
/// so membership only short-circuits the blank check.
const KNOWN_FIELDS_OF_STUDY: &[&str] = &[
    "Civil Engineering",
    "Computer Engineering",
    "Environmental and Sanitary Engineering",
    "Electronics Engineering",
    "Electrical Engineering",
    "Mechanical Engineering",
];

pub const PROFILE_STATUSES: &[&str] = &["active", "inactive", "lost_contact"];

pub struct SeaOrmProfileService {
    store: Store,
}

impl SeaOrmProfileService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn validate_field_of_study(value: &str, errors: &mut BTreeMap<String, String>) {
        if KNOWN_FIELDS_OF_STUDY.contains(&value) {
            return;
        }
        if value.trim().is_empty() {
            errors.insert(
                "field_of_study".into(),
                "Please specify your field of study.".into(),
            );
        }
    }

    fn validate_status(value: &str, errors: &mut BTreeMap<String, String>) {
        if !PROFILE_STATUSES.contains(&value) {
            errors.insert(
                "status".into(),
                format!("Status must be one of: {}.", PROFILE_STATUSES.join(", ")),
            );
        }
    }
}

#[async_trait]
impl ProfileService for SeaOrmProfileService {
    async fn get_own(&self, account_id: i32) -> Result<alumni::Model, ProfileError> {
        self.store
            .get_alumni_by_account(account_id)
            .await?
            .ok_or(ProfileError::NotFound)
    }

    async fn create_own(
        &self,
        account: &AccountInfo,
        input: ProfileWriteInput,
    ) -> Result<alumni::Model, ProfileError> {
        let mut errors: BTreeMap<String, String> = BTreeMap::new();

        // Fields omitted from the request default to the account's own values
        let first_name = input
            .first_name
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| account.first_name.clone());
        let last_name = input
            .last_name
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| account.last_name.clone());
        let email = input
            .email
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| account.email.clone());

        let degree = input.degree.unwrap_or_default();
        if degree.trim().is_empty() {
            errors.insert("degree".into(), "Degree is required.".into());
        }

        let field_of_study = input.field_of_study.unwrap_or_default();
        Self::validate_field_of_study(&field_of_study, &mut errors);

        let Some(graduation_year) = input.graduation_year else {
            errors.insert(
                "graduation_year".into(),
                "Graduation year is required.".into(),
            );
            return Err(ProfileError::Fields(errors));
        };

        let status = input.status.unwrap_or_else(|| "active".to_string());
        Self::validate_status(&status, &mut errors);

        if self.store.alumni_email_taken(&email, None).await? {
            errors.insert("email".into(), "Email already has an alumni profile.".into());
        }

        if !errors.is_empty() {
            return Err(ProfileError::Fields(errors));
        }

        let outcome = self
            .store
            .create_alumni_for_account(
                account.id,
                AlumniInput {
                    first_name,
                    last_name,
                    email,
                    phone: input.phone.flatten(),
                    degree,
                    field_of_study,
                    graduation_year,
                    current_company: input.current_company.unwrap_or_default(),
                    job_title: input.job_title.unwrap_or_default(),
                    industry: input.industry.unwrap_or_default(),
                    status,
                    linkedin_url: input.linkedin_url.flatten(),
                    bio: input.bio.unwrap_or_default(),
                },
            )
            .await?;

        match outcome {
            ProfileCreateOutcome::Created(model) => {
                info!("Created alumni profile for account {}", account.id);
                Ok(model)
            }
            ProfileCreateOutcome::AccountAlreadyLinked => Err(ProfileError::Conflict(
                "Alumni profile already exists".to_string(),
            )),
            ProfileCreateOutcome::EmailTaken => {
                let mut errors = BTreeMap::new();
                errors.insert("email".into(), "Email already has an alumni profile.".into());
                Err(ProfileError::Fields(errors))
            }
        }
    }

    async fn update_own(
        &self,
        account_id: i32,
        input: ProfileWriteInput,
    ) -> Result<alumni::Model, ProfileError> {
        let existing = self
            .store
            .get_alumni_by_account(account_id)
            .await?
            .ok_or(ProfileError::NotFound)?;

        let mut errors: BTreeMap<String, String> = BTreeMap::new();

        if let Some(field_of_study) = &input.field_of_study {
            Self::validate_field_of_study(field_of_study, &mut errors);
        }
        if let Some(status) = &input.status {
            Self::validate_status(status, &mut errors);
        }
        if let Some(email) = &input.email
            && self.store.alumni_email_taken(email, Some(existing.id)).await?
        {
            errors.insert("email".into(), "Email already has an alumni profile.".into());
        }

        if !errors.is_empty() {
            return Err(ProfileError::Fields(errors));
        }

        let updated = self
            .store
            .update_alumni(
                existing.id,
                AlumniUpdate {
                    first_name: input.first_name,
                    last_name: input.last_name,
                    email: input.email,
                    phone: input.phone,
                    degree: input.degree,
                    field_of_study: input.field_of_study,
                    graduation_year: input.graduation_year,
                    current_company: input.current_company,
                    job_title: input.job_title,
                    industry: input.industry,
                    status: input.status,
                    linkedin_url: input.linkedin_url,
                    bio: input.bio,
                },
            )
            .await?
            .ok_or(ProfileError::NotFound)?;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_field_of_study_is_rejected() {
        let mut errors = BTreeMap::new();
        SeaOrmProfileService::validate_field_of_study("   ", &mut errors);
        assert!(errors.contains_key("field_of_study"));
    }

    #[test]
    fn curated_field_of_study_is_accepted() {
        let mut errors = BTreeMap::new();
        SeaOrmProfileService::validate_field_of_study("Computer Engineering", &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn uncurated_non_blank_field_of_study_is_accepted() {
        let mut errors = BTreeMap::new();
        SeaOrmProfileService::validate_field_of_study("Basket Weaving", &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut errors = BTreeMap::new();
        SeaOrmProfileService::validate_status("retired", &mut errors);
        assert!(errors.contains_key("status"));
    }
}
