//! Pure domain logic for the client onboarding and practice portal.
//!
//! Nothing in this crate performs I/O. The `db` crate persists the types
//! defined here and the `api` crate exposes them over HTTP.

pub mod billing;
pub mod client;
pub mod documents;
pub mod engagement;
pub mod error;
pub mod onboarding;
pub mod portal;
pub mod roles;
pub mod search;
pub mod settings;
pub mod setup_checklist;
pub mod types;
pub mod validation;
