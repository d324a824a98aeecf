//! CSV export of admin-managed data sets.
//!
//! Column order comes from the admin registry descriptors so the export
//! surface stays in one place.

use anyhow::Result;
use std::fmt::Write;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::Store;
use crate::services::audit::EntityKind;
use crate::services::registry::AdminRegistry;

/// Exportable data sets, closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Alumni,
    Partners,
    Engagements,
}

impl ExportKind {
    #[must_use]
    pub const fn filename(self) -> &'static str {
        match self {
            Self::Alumni => "alumni_export.csv",
            Self::Partners => "partners_export.csv",
            Self::Engagements => "engagements_export.csv",
        }
    }

    #[must_use]
    const fn entity_kind(self) -> EntityKind {
        match self {
            Self::Alumni => EntityKind::Alumni,
            Self::Partners => EntityKind::Partner,
            Self::Engagements => EntityKind::Engagement,
        }
    }
}

impl FromStr for ExportKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alumni" => Ok(Self::Alumni),
            "partners" => Ok(Self::Partners),
            "engagements" => Ok(Self::Engagements),
            _ => Err(()),
        }
    }
}

#[derive(Clone)]
pub struct ExportService {
    store: Store,
    registry: Arc<AdminRegistry>,
}

impl ExportService {
    #[must_use]
    pub const fn new(store: Store, registry: Arc<AdminRegistry>) -> Self {
        Self { store, registry }
    }

    pub async fn export_csv(&self, kind: ExportKind) -> Result<String> {
        let columns = self
            .registry
            .get(kind.entity_kind())
            .map(|d| d.export_columns)
            .unwrap_or_default();

        let mut csv = String::new();
        let _ = writeln!(csv, "{}", columns.join(","));

        match kind {
            ExportKind::Alumni => {
                for alumni in self.store.list_all_alumni().await? {
                    let row = [
                        alumni.id.to_string(),
                        csv_field(&alumni.first_name),
                        csv_field(&alumni.last_name),
                        csv_field(&alumni.email),
                        csv_field(alumni.phone.as_deref().unwrap_or("")),
                        csv_field(&alumni.degree),
                        csv_field(&alumni.field_of_study),
                        alumni.graduation_year.to_string(),
                        csv_field(&alumni.current_company),
                        csv_field(&alumni.job_title),
                        csv_field(&alumni.industry),
                        csv_field(&alumni.status),
                        csv_field(&alumni.created_at),
                    ];
                    let _ = writeln!(csv, "{}", row.join(","));
                }
            }
            ExportKind::Partners => {
                for partner in self.store.list_all_partners().await? {
                    let row = [
                        partner.id.to_string(),
                        csv_field(&partner.name),
                        csv_field(&partner.partner_type),
                        csv_field(&partner.email),
                        csv_field(&partner.city),
                        csv_field(&partner.country),
                        csv_field(&partner.primary_contact_name),
                        csv_field(&partner.engagement_level),
                        csv_field(&partner.industry),
                        csv_field(&partner.created_at),
                    ];
                    let _ = writeln!(csv, "{}", row.join(","));
                }
            }
            ExportKind::Engagements => {
                for engagement in self.store.list_all_engagements().await? {
                    let row = [
                        engagement.id.to_string(),
                        engagement.alumni_id.to_string(),
                        engagement.partner_id.to_string(),
                        csv_field(&engagement.engagement_type),
                        csv_field(&engagement.engagement_date),
                        csv_field(&engagement.description),
                        csv_field(&engagement.created_at),
                    ];
                    let _ = writeln!(csv, "{}", row.join(","));
                }
            }
        }

        Ok(csv)
    }
}

/// Quote a text field, doubling embedded quotes.
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_field_escapes_quotes() {
        assert_eq!(csv_field("plain"), "\"plain\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn export_kind_parses_known_values_only() {
        assert_eq!("alumni".parse::<ExportKind>(), Ok(ExportKind::Alumni));
        assert_eq!("partners".parse::<ExportKind>(), Ok(ExportKind::Partners));
        assert!("reports".parse::<ExportKind>().is_err());
    }
}
