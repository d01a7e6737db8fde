//! Route definitions for the `/clients` resource and its sub-resources.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{billing, clients, messages, setup, tasks};
use crate::state::AppState;

/// Routes mounted at `/clients`. All require auth.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(clients::list).post(clients::create))
        .route(
            "/{id}",
            get(clients::get_by_id)
                .put(clients::update)
                .delete(clients::delete),
        )
        .route("/{id}/onboarding", get(clients::onboarding_answers))
        .route("/{id}/documents", get(clients::documents))
        .route(
            "/{id}/documents/{document_id}/file",
            get(clients::download_document),
        )
        // Setup checklist.
        .route("/{id}/setup", get(setup::get_checklist))
        .route("/{id}/setup/{step_id}/toggle", post(setup::toggle_step))
        .route(
            "/{id}/setup/{step_id}/fields/{field_id}",
            put(setup::update_field),
        )
        // Fee builder.
        .route(
            "/{id}/billing",
            get(billing::get_billing).put(billing::save_billing),
        )
        .route("/{id}/billing/approval", post(billing::set_approval))
        .route("/{id}/billing/proposal", post(billing::send_proposal))
        .route("/{id}/billing/invoice", post(billing::generate_invoice))
        // Portal requests and messages, staff side.
        .route("/{id}/tasks", get(tasks::list).post(tasks::create))
        .route("/{id}/tasks/{task_id}", put(tasks::update))
        .route("/{id}/messages", get(messages::list).post(messages::create))
}
