//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - Create/update DTOs consumed by the matching repository

pub mod client;
pub mod document;
pub mod fee_schedule;
pub mod message;
pub mod onboarding;
pub mod role;
pub mod session;
pub mod setting;
pub mod setup_checklist;
pub mod task;
pub mod user;
