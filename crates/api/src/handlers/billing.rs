//! Handlers for `/clients/{id}/billing`: the fee builder.
//!
//! Figures are always recomputed from the stored worksheet. Discounts above
//! the approval threshold block the proposal and invoice until an admin
//! records partner approval. Approval covers the worksheet as it stood when
//! it was given; changing line items or adjustments withdraws it. Admins may
//! review and approve any client's schedule.

use axum::extract::{Path, State};
use axum::Json;
use portal_core::billing::{can_send, line_items_from_services, FeeSummary, FeeWorksheet};
use portal_core::client::ClientStatus;
use portal_core::error::CoreError;
use portal_core::portal::MessageSender;
use portal_core::types::{Cents, DbId, Timestamp};
use portal_db::models::client::Client;
use portal_db::models::fee_schedule::{FeeSchedule, SaveFeeSchedule};
use portal_db::models::message::CreateMessage;
use portal_db::repositories::{
    ClientRepo, FeeScheduleRepo, MessageRepo, OnboardingResponseRepo,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::tasks::staff_name;
use crate::handlers::{reviewable_client, visible_client};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BillingView {
    pub client_id: DbId,
    pub worksheet: FeeWorksheet,
    pub summary: FeeSummary,
    /// `false` until a fee schedule has been saved.
    pub saved: bool,
    pub partner_approved: bool,
    pub approved_by: Option<DbId>,
    pub proposal_sent_at: Option<Timestamp>,
    pub invoice_generated_at: Option<Timestamp>,
}

impl BillingView {
    fn from_schedule(schedule: &FeeSchedule) -> AppResult<Self> {
        let worksheet = schedule.worksheet()?;
        Ok(Self {
            client_id: schedule.client_id,
            summary: FeeSummary::compute(&worksheet),
            worksheet,
            saved: true,
            partner_approved: schedule.partner_approved,
            approved_by: schedule.approved_by,
            proposal_sent_at: schedule.proposal_sent_at,
            invoice_generated_at: schedule.invoice_generated_at,
        })
    }

    fn draft(client_id: DbId, worksheet: FeeWorksheet) -> Self {
        Self {
            client_id,
            summary: FeeSummary::compute(&worksheet),
            worksheet,
            saved: false,
            partner_approved: false,
            approved_by: None,
            proposal_sent_at: None,
            invoice_generated_at: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveBillingRequest {
    #[serde(flatten)]
    pub worksheet: FeeWorksheet,
    /// Admin only. Omit to leave the approval unchanged.
    pub partner_approved: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub approved: bool,
}

/// `$1,234.56`
fn format_dollars(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let dollars = (cents / 100).to_string();
    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{:02}", cents % 100)
}

async fn saved_schedule(state: &AppState, client: &Client) -> AppResult<FeeSchedule> {
    FeeScheduleRepo::find_by_client(&state.pool, client.id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(format!(
                "No fee schedule has been saved for {}",
                client.name
            )))
        })
}

/// Refuse to send while partner approval is outstanding.
fn ensure_sendable(schedule: &FeeSchedule) -> AppResult<FeeSummary> {
    let summary = FeeSummary::compute(&schedule.worksheet()?);
    can_send(&summary, schedule.partner_approved)?;
    Ok(summary)
}

/// GET /api/v1/clients/{id}/billing
///
/// The saved schedule, or an unsaved draft seeded from the engagement
/// letter's services.
pub async fn get_billing(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<DbId>,
) -> AppResult<Json<DataResponse<BillingView>>> {
    let client = reviewable_client(&state, &auth, client_id).await?;
    if let Some(schedule) = FeeScheduleRepo::find_by_client(&state.pool, client.id).await? {
        return Ok(Json(DataResponse {
            data: BillingView::from_schedule(&schedule)?,
        }));
    }

    let services = OnboardingResponseRepo::find_by_client(&state.pool, client.id)
        .await?
        .map(|a| a.selected_services)
        .unwrap_or_default();
    let worksheet = FeeWorksheet {
        line_items: line_items_from_services(client.client_type()?, &services),
        ..Default::default()
    };
    Ok(Json(DataResponse {
        data: BillingView::draft(client.id, worksheet),
    }))
}

/// PUT /api/v1/clients/{id}/billing
pub async fn save_billing(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<DbId>,
    Json(input): Json<SaveBillingRequest>,
) -> AppResult<Json<DataResponse<BillingView>>> {
    let client = visible_client(&state, &auth, client_id).await?;
    if input.partner_approved.is_some() && !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only an admin can record partner approval".into(),
        )));
    }
    input.worksheet.validate()?;

    let mut schedule = FeeScheduleRepo::upsert(
        &state.pool,
        client.id,
        &SaveFeeSchedule::from_worksheet(&input.worksheet)?,
    )
    .await?;

    if let Some(approved) = input.partner_approved {
        let approver = approved.then_some(auth.user_id);
        if let Some(updated) =
            FeeScheduleRepo::set_approval(&state.pool, client.id, approved, approver).await?
        {
            schedule = updated;
        }
    }

    let view = BillingView::from_schedule(&schedule)?;
    tracing::info!(
        client_id,
        user_id = auth.user_id,
        total_cents = view.summary.total_cents,
        needs_approval = view.summary.needs_partner_approval,
        partner_approved = view.partner_approved,
        "Fee schedule saved"
    );
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/clients/{id}/billing/approval
///
/// Record or withdraw partner approval of the saved schedule. Admin only.
pub async fn set_approval(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(client_id): Path<DbId>,
    Json(input): Json<ApprovalRequest>,
) -> AppResult<Json<DataResponse<BillingView>>> {
    let client = reviewable_client(&state, &admin, client_id).await?;
    saved_schedule(&state, &client).await?;

    let approver = input.approved.then_some(admin.user_id);
    let schedule = FeeScheduleRepo::set_approval(&state.pool, client.id, input.approved, approver)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(format!(
                "No fee schedule has been saved for {}",
                client.name
            )))
        })?;

    let view = BillingView::from_schedule(&schedule)?;
    tracing::info!(
        client_id,
        user_id = admin.user_id,
        approved = input.approved,
        discount_percent = view.summary.discount_percent,
        "Partner approval updated"
    );
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/clients/{id}/billing/proposal
///
/// Send the fee proposal to the client as a portal message.
pub async fn send_proposal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<DbId>,
) -> AppResult<Json<DataResponse<BillingView>>> {
    let client = visible_client(&state, &auth, client_id).await?;
    let schedule = saved_schedule(&state, &client).await?;
    let summary = ensure_sendable(&schedule)?;

    let body = format!(
        "Your fee proposal is ready. Total for this engagement: {}.",
        format_dollars(summary.total_cents)
    );
    MessageRepo::create(
        &state.pool,
        &CreateMessage {
            client_id: client.id,
            sender: MessageSender::Staff.as_str().to_string(),
            sender_name: staff_name(&state, &auth).await?,
            body,
        },
    )
    .await?;

    let schedule = FeeScheduleRepo::mark_proposal_sent(&state.pool, client.id)
        .await?
        .unwrap_or(schedule);
    tracing::info!(client_id, user_id = auth.user_id, total_cents = summary.total_cents, "Fee proposal sent");
    Ok(Json(DataResponse {
        data: BillingView::from_schedule(&schedule)?,
    }))
}

/// POST /api/v1/clients/{id}/billing/invoice
///
/// Generate the invoice and mark the client complete.
pub async fn generate_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<DbId>,
) -> AppResult<Json<DataResponse<BillingView>>> {
    let client = visible_client(&state, &auth, client_id).await?;
    let schedule = saved_schedule(&state, &client).await?;
    let summary = ensure_sendable(&schedule)?;

    let schedule = FeeScheduleRepo::mark_invoice_generated(&state.pool, client.id)
        .await?
        .unwrap_or(schedule);
    ClientRepo::set_status(&state.pool, client.id, ClientStatus::Complete.as_str()).await?;

    tracing::info!(client_id, user_id = auth.user_id, total_cents = summary.total_cents, "Invoice generated");
    Ok(Json(DataResponse {
        data: BillingView::from_schedule(&schedule)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dollars_are_grouped() {
        assert_eq!(format_dollars(0), "$0.00");
        assert_eq!(format_dollars(95_000), "$950.00");
        assert_eq!(format_dollars(123_456_789), "$1,234,567.89");
        assert_eq!(format_dollars(-2_505), "-$25.05");
    }
}
