pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{
    AccountInfo, AccountUpdateInput, AuthError, AuthService, LoginResult, RegisterInput,
};
pub use auth_service_impl::SeaOrmAuthService;

pub mod profile_service;
pub mod profile_service_impl;
pub use profile_service::{ProfileError, ProfileService, ProfileWriteInput};
pub use profile_service_impl::SeaOrmProfileService;

pub mod audit;
pub use audit::{AuditAction, AuditRecorder, EntityKind, FieldChange};

pub mod registry;
pub use registry::{AdminDescriptor, AdminRegistry};

pub mod report_service;
pub use report_service::{ReportError, ReportKind, ReportService};

pub mod export;
pub use export::{ExportKind, ExportService};

pub mod pdf;
