//! Query parameter types shared by list handlers.

use serde::Deserialize;

/// `?search=&status=&limit=&offset=` on the client dashboard.
///
/// `status` accepts `all` or one of the client status strings; limits are
/// clamped by the handler.
#[derive(Debug, Default, Deserialize)]
pub struct ClientListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
