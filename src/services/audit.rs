//! Append-only audit trail for administrator-mediated mutations.
//!
//! The recorder is an explicit function composed around mutating handlers,
//! taking the entity kind, the acting account, and the changed fields. Audit
//! writes are best-effort: a failed insert logs a warning and never rolls
//! back the primary mutation.

use tracing::warn;

use crate::db::Store;

/// Tracked entity kinds, closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Account,
    Alumni,
    Partner,
    Engagement,
    Report,
}

impl EntityKind {
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Alumni => "Alumni",
            Self::Partner => "Partner",
            Self::Engagement => "Engagement",
            Self::Report => "Report",
        }
    }

    #[must_use]
    pub const fn category(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Alumni => "alumni",
            Self::Partner => "partner",
            Self::Engagement => "engagement",
            Self::Report => "report",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    StatusToggled,
    BulkAction,
}

impl AuditAction {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Updated => "Updated",
            Self::Deleted => "Deleted",
            Self::StatusToggled => "Status Toggled",
            Self::BulkAction => "Bulk Action",
        }
    }
}

/// One changed field for an update diff.
#[derive(Debug, Clone)]
pub struct FieldChange {
    pub field: &'static str,
    pub old: String,
    pub new: String,
}

impl FieldChange {
    /// Returns a change only when old and new actually differ.
    #[must_use]
    pub fn of(field: &'static str, old: &str, new: &str) -> Option<Self> {
        if old == new {
            None
        } else {
            Some(Self {
                field,
                old: old.to_string(),
                new: new.to_string(),
            })
        }
    }
}

/// Renders changes as `field 'old' -> 'new'`, semicolon-separated.
#[must_use]
pub fn format_changes(changes: &[FieldChange]) -> String {
    changes
        .iter()
        .map(|c| format!("{} '{}' -> '{}'", c.field, c.old, c.new))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Clone)]
pub struct AuditRecorder {
    store: Store,
}

impl AuditRecorder {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        kind: EntityKind,
        action: AuditAction,
        actor: Option<(i32, &str)>,
        label: &str,
        changes: &[FieldChange],
    ) {
        let title = format!("{} {}: {}", kind.display_name(), action.label(), label);

        let actor_name = actor.map_or("system", |(_, username)| username);
        let description = if changes.is_empty() {
            format!("by {actor_name}")
        } else {
            format!("by {actor_name}: {}", format_changes(changes))
        };

        let actor_id = actor.map(|(id, _)| id);

        if let Err(e) = self
            .store
            .add_audit_entry(&title, kind.category(), &description, actor_id)
            .await
        {
            warn!("Failed to write audit entry '{title}': {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_fields_produce_no_change() {
        assert!(FieldChange::of("status", "active", "active").is_none());
    }

    #[test]
    fn diff_formats_old_and_new() {
        let changes = vec![
            FieldChange::of("status", "inactive", "active").unwrap(),
            FieldChange::of("job_title", "Engineer", "Manager").unwrap(),
        ];
        assert_eq!(
            format_changes(&changes),
            "status 'inactive' -> 'active'; job_title 'Engineer' -> 'Manager'"
        );
    }
}
