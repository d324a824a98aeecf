//! Report generation and rendering.
//!
//! Each report kind aggregates low-cardinality counts into a JSON payload
//! stored on the report row; rendering turns a stored payload back into text
//! lines for previews and PDF output.

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::db::Store;
use crate::entities::reports;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report not found: {0}")]
    NotFound(i32),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ReportError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ReportError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Closed set of report kinds; generation dispatches on an exhaustive match,
/// so adding a kind forces a compiler-checked case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    AlumniSummary,
    PartnerSummary,
    EngagementAnalytics,
}

impl ReportKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlumniSummary => "alumni_summary",
            Self::PartnerSummary => "partner_summary",
            Self::EngagementAnalytics => "engagement_analytics",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::AlumniSummary => "Alumni Summary Report",
            Self::PartnerSummary => "Partner Summary Report",
            Self::EngagementAnalytics => "Engagement Analytics Report",
        }
    }
}

#[derive(Clone)]
pub struct ReportService {
    store: Store,
}

impl ReportService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn generate(
        &self,
        kind: ReportKind,
        generated_by: Option<i32>,
    ) -> Result<reports::Model, ReportError> {
        let data = match kind {
            ReportKind::AlumniSummary => {
                let total = self.store.count_alumni().await?;
                let active = self.store.count_alumni_by_status("active").await?;
                let by_degree = self.store.alumni_counts_by_degree().await?;

                json!({
                    "total_alumni": total,
                    "active_alumni": active,
                    "inactive_alumni": total - active,
                    "by_degree": counts_to_object(by_degree),
                })
            }
            ReportKind::PartnerSummary => {
                let total = self.store.count_partners().await?;
                let by_type = self.store.partner_counts_by_type().await?;
                let by_level = self.store.partner_counts_by_engagement_level().await?;

                json!({
                    "total_partners": total,
                    "by_type": counts_to_object(by_type),
                    "by_engagement_level": counts_to_object(by_level),
                })
            }
            ReportKind::EngagementAnalytics => {
                let total = self.store.count_engagements().await?;
                let by_type = self.store.engagement_counts_by_type().await?;
                let top = self.store.top_engaged_partners(10).await?;
                let top_partners: Vec<serde_json::Value> = top
                    .into_iter()
                    .map(|(partner, count)| json!({ "name": partner.name, "count": count }))
                    .collect();

                json!({
                    "total_engagements": total,
                    "by_type": counts_to_object(by_type),
                    "top_partners": top_partners,
                })
            }
        };

        let report = self
            .store
            .create_report(kind.title(), kind.as_str(), "", data, generated_by)
            .await?;

        Ok(report)
    }

    /// Converts a stored report into text lines for preview and PDF output.
    #[must_use]
    pub fn render_lines(report: &reports::Model) -> Vec<String> {
        let data = &report.data;

        match report.report_type.as_str() {
            "alumni_summary" => {
                let mut lines = vec![
                    format!("Total alumni: {}", int_field(data, "total_alumni")),
                    format!("Active alumni: {}", int_field(data, "active_alumni")),
                    format!("Inactive alumni: {}", int_field(data, "inactive_alumni")),
                    String::new(),
                    "By degree:".to_string(),
                ];
                lines.extend(object_lines(data, "by_degree"));
                lines
            }
            "partner_summary" => {
                let mut lines = vec![
                    format!("Total partners: {}", int_field(data, "total_partners")),
                    String::new(),
                    "By type:".to_string(),
                ];
                lines.extend(object_lines(data, "by_type"));
                lines.push(String::new());
                lines.push("By engagement level:".to_string());
                lines.extend(object_lines(data, "by_engagement_level"));
                lines
            }
            "engagement_analytics" => {
                let mut lines = vec![
                    format!("Total engagements: {}", int_field(data, "total_engagements")),
                    String::new(),
                    "By type:".to_string(),
                ];
                lines.extend(object_lines(data, "by_type"));
                lines.push(String::new());
                lines.push("Top partners:".to_string());
                if let Some(top) = data.get("top_partners").and_then(|v| v.as_array()) {
                    for partner in top {
                        let name = partner.get("name").and_then(|v| v.as_str()).unwrap_or("?");
                        let count = partner.get("count").and_then(serde_json::Value::as_i64);
                        lines.push(format!("- {}: {}", name, count.unwrap_or(0)));
                    }
                }
                lines
            }
            _ => vec!["Report data:".to_string(), data.to_string()],
        }
    }
}

fn counts_to_object(counts: Vec<(String, i64)>) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = counts
        .into_iter()
        .map(|(key, count)| (key, json!(count)))
        .collect();
    serde_json::Value::Object(map)
}

fn int_field(data: &serde_json::Value, key: &str) -> i64 {
    data.get(key).and_then(serde_json::Value::as_i64).unwrap_or(0)
}

fn object_lines(data: &serde_json::Value, key: &str) -> Vec<String> {
    data.get(key)
        .and_then(|v| v.as_object())
        .map(|map| {
            map.iter()
                .map(|(k, v)| format!("- {}: {}", k, v.as_i64().unwrap_or(0)))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(report_type: &str, data: serde_json::Value) -> reports::Model {
        reports::Model {
            id: 1,
            title: "test".to_string(),
            report_type: report_type.to_string(),
            description: String::new(),
            data,
            generated_by: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn report_kind_round_trips_through_serde() {
        let kind: ReportKind = serde_json::from_str("\"alumni_summary\"").unwrap();
        assert_eq!(kind, ReportKind::AlumniSummary);
        assert_eq!(kind.as_str(), "alumni_summary");
    }

    #[test]
    fn unknown_report_kind_fails_to_deserialize() {
        assert!(serde_json::from_str::<ReportKind>("\"retention_analysis\"").is_err());
    }

    #[test]
    fn alumni_summary_lines_include_degree_breakdown() {
        let report = report_with(
            "alumni_summary",
            serde_json::json!({
                "total_alumni": 3,
                "active_alumni": 2,
                "inactive_alumni": 1,
                "by_degree": { "BS": 2, "MS": 1 },
            }),
        );

        let lines = ReportService::render_lines(&report);
        assert_eq!(lines[0], "Total alumni: 3");
        assert!(lines.contains(&"- BS: 2".to_string()));
        assert!(lines.contains(&"- MS: 1".to_string()));
    }

    #[test]
    fn unknown_report_type_falls_back_to_raw_data() {
        let report = report_with("mystery", serde_json::json!({"x": 1}));
        let lines = ReportService::render_lines(&report);
        assert_eq!(lines[0], "Report data:");
    }
}
