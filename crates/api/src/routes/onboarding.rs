use axum::routing::{get, post};
use axum::Router;

use crate::handlers::onboarding;
use crate::state::AppState;

/// Public wizard routes mounted at `/onboarding`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(onboarding::start))
        .route("/catalog/{client_type}", get(onboarding::catalog))
        .route(
            "/{token}",
            get(onboarding::get_session).patch(onboarding::save_answers),
        )
        .route("/{token}/client-type", post(onboarding::select_client_type))
        .route("/{token}/advance", post(onboarding::advance))
        .route("/{token}/back", post(onboarding::back))
        .route("/{token}/intake/next", post(onboarding::intake_next))
        .route("/{token}/intake/back", post(onboarding::intake_back))
        .route("/{token}/documents/{doc_id}", post(onboarding::upload_document))
        .route("/{token}/poa", post(onboarding::submit_poa))
        .route("/{token}/services", get(onboarding::services))
        .route("/{token}/engagement/sign", post(onboarding::sign_engagement))
        .route("/{token}/payment", post(onboarding::record_payment))
        .route("/{token}/complete", post(onboarding::complete))
        .route("/{token}/abandon", post(onboarding::abandon))
}
