//! Shared response envelope.
//!
//! Every API response is `{ "data": ... }`. Use [`DataResponse`] instead of
//! ad-hoc `json!({ "data": ... })`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: client }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
