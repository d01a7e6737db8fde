//! Well-known role name constants.
//!
//! These must match the seed data in `20260301000001_create_users.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STAFF: &str = "staff";

/// Returns `true` for role names that may be requested at signup.
pub fn is_known_role(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_STAFF
}
