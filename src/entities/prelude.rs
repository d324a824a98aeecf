pub use super::accounts::Entity as Accounts;
pub use super::alumni::Entity as Alumni;
pub use super::audit_entries::Entity as AuditEntries;
pub use super::auth_tokens::Entity as AuthTokens;
pub use super::engagements::Entity as Engagements;
pub use super::partners::Entity as Partners;
pub use super::reports::Entity as Reports;
