//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod client_repo;
pub mod document_repo;
pub mod fee_schedule_repo;
pub mod message_repo;
pub mod onboarding_response_repo;
pub mod onboarding_session_repo;
pub mod role_repo;
pub mod session_repo;
pub mod settings_repo;
pub mod setup_checklist_repo;
pub mod task_repo;
pub mod user_repo;

pub use client_repo::ClientRepo;
pub use document_repo::DocumentRepo;
pub use fee_schedule_repo::FeeScheduleRepo;
pub use message_repo::MessageRepo;
pub use onboarding_response_repo::OnboardingResponseRepo;
pub use onboarding_session_repo::OnboardingSessionRepo;
pub use role_repo::RoleRepo;
pub use session_repo::SessionRepo;
pub use settings_repo::SettingsRepo;
pub use setup_checklist_repo::SetupChecklistRepo;
pub use task_repo::TaskRepo;
pub use user_repo::UserRepo;
