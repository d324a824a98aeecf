use serde::Serialize;
use std::collections::BTreeMap;

use crate::entities::{alumni, engagements, partners, reports};
use crate::services::AccountInfo;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            errors: None,
        }
    }

    #[must_use]
    pub const fn field_errors(errors: BTreeMap<String, String>) -> Self {
        Self {
            success: false,
            data: None,
            error: None,
            errors: Some(errors),
        }
    }
}

/// Paginated list envelope.
#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

/// Login/registration payload: token plus account, with the linked profile
/// when one exists.
#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: AccountInfo,
    pub alumni: Option<alumni::Model>,
}

/// Current-identity payload for `GET /auth/user`.
#[derive(Debug, Serialize)]
pub struct CurrentUserPayload {
    pub user: AccountInfo,
    pub alumni: Option<alumni::Model>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AlumniDetailDto {
    #[serde(flatten)]
    pub alumni: alumni::Model,
    pub engagements: Vec<EngagementDto>,
}

#[derive(Debug, Serialize)]
pub struct PartnerDetailDto {
    #[serde(flatten)]
    pub partner: partners::Model,
    pub engagements: Vec<EngagementDto>,
    pub engagement_count: u64,
}

#[derive(Debug, Serialize)]
pub struct EngagementDto {
    #[serde(flatten)]
    pub engagement: engagements::Model,
    pub alumni_name: Option<String>,
    pub partner_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TopPartnerDto {
    #[serde(flatten)]
    pub partner: partners::Model,
    pub engagement_count: i64,
}

#[derive(Debug, Serialize)]
pub struct AlumniStats {
    pub total_alumni: u64,
    pub active_alumni: u64,
    pub by_degree: BTreeMap<String, i64>,
    pub by_graduation_year: BTreeMap<String, i64>,
    pub by_industry: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize)]
pub struct PartnerStats {
    pub total_partners: u64,
    pub by_type: BTreeMap<String, i64>,
    pub by_engagement_level: BTreeMap<String, i64>,
    pub by_industry: BTreeMap<String, i64>,
}

/// Landing-page counts, public.
#[derive(Debug, Serialize)]
pub struct SiteStats {
    pub alumni_count: u64,
    pub partner_count: u64,
    pub engagement_count: u64,
}

#[derive(Debug, Serialize)]
pub struct BulkActionResult {
    pub updated: u64,
}

#[derive(Debug, Serialize)]
pub struct ReportDto {
    #[serde(flatten)]
    pub report: reports::Model,
    pub generated_by_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportPreview {
    pub title: String,
    pub lines: Vec<String>,
}

pub fn counts_to_map(counts: Vec<(String, i64)>) -> BTreeMap<String, i64> {
    counts.into_iter().collect()
}

pub fn year_counts_to_map(counts: Vec<(i32, i64)>) -> BTreeMap<String, i64> {
    counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
