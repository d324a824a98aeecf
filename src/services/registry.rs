//! Startup-time admin registry.
//!
//! A fixed mapping from entity kind to its admin behavior descriptor, built
//! once during process initialization and shared read-only afterwards.

use crate::services::audit::EntityKind;

#[derive(Debug, Clone)]
pub struct AdminDescriptor {
    pub kind: EntityKind,
    pub display_name: &'static str,
    pub search_fields: &'static [&'static str],
    pub export_columns: &'static [&'static str],
}

#[derive(Debug, Clone)]
pub struct AdminRegistry {
    entries: Vec<AdminDescriptor>,
}

impl AdminRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: vec![
                AdminDescriptor {
                    kind: EntityKind::Alumni,
                    display_name: "Alumni",
                    search_fields: &["first_name", "last_name", "email", "current_company"],
                    export_columns: &[
                        "id",
                        "first_name",
                        "last_name",
                        "email",
                        "phone",
                        "degree",
                        "field_of_study",
                        "graduation_year",
                        "current_company",
                        "job_title",
                        "industry",
                        "status",
                        "created_at",
                    ],
                },
                AdminDescriptor {
                    kind: EntityKind::Partner,
                    display_name: "Partner",
                    search_fields: &["name", "email", "primary_contact_name", "industry"],
                    export_columns: &[
                        "id",
                        "name",
                        "partner_type",
                        "email",
                        "city",
                        "country",
                        "primary_contact_name",
                        "engagement_level",
                        "industry",
                        "created_at",
                    ],
                },
                AdminDescriptor {
                    kind: EntityKind::Engagement,
                    display_name: "Engagement",
                    search_fields: &[],
                    export_columns: &[
                        "id",
                        "alumni_id",
                        "partner_id",
                        "engagement_type",
                        "engagement_date",
                        "description",
                        "created_at",
                    ],
                },
            ],
        }
    }

    #[must_use]
    pub fn get(&self, kind: EntityKind) -> Option<&AdminDescriptor> {
        self.entries.iter().find(|d| d.kind == kind)
    }

    #[must_use]
    pub fn entries(&self) -> &[AdminDescriptor] {
        &self.entries
    }
}

impl Default for AdminRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_exportable_kinds() {
        let registry = AdminRegistry::new();
        for kind in [EntityKind::Alumni, EntityKind::Partner, EntityKind::Engagement] {
            let descriptor = registry.get(kind).unwrap();
            assert!(!descriptor.export_columns.is_empty());
        }
    }
}
