//! Handlers for the public `/onboarding` wizard.
//!
//! A session is addressed by its UUID token; no login is involved. Every
//! mutation loads the session, applies one [`WizardState`] transition and
//! persists the result, creating or syncing the linked client on the way.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use portal_core::billing::{line_items_from_services, FeeWorksheet};
use portal_core::client::{validate_client_name, ClientType};
use portal_core::documents::{self, DocumentProgress, DocumentRequest};
use portal_core::engagement::{self, PaymentMethod, Service};
use portal_core::error::CoreError;
use portal_core::onboarding::{
    can_advance_step, IntakeSection, OnboardingData, OnboardingPatch, OnboardingStatus,
    WizardState,
};
use portal_core::types::{Cents, DbId};
use portal_db::models::client::CreateClient;
use portal_db::models::document::CreateDocument;
use portal_db::models::fee_schedule::SaveFeeSchedule;
use portal_db::models::onboarding::{
    OnboardingSession, SaveOnboardingSession, UpsertOnboardingResponse,
};
use portal_db::repositories::{
    ClientRepo, DocumentRepo, FeeScheduleRepo, OnboardingResponseRepo, OnboardingSessionRepo,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::settings::load_settings;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// What the wizard screen needs to render the current step.
#[derive(Debug, Serialize)]
pub struct OnboardingView {
    pub token: Uuid,
    pub client_id: Option<DbId>,
    pub current_step: u8,
    pub step_label: &'static str,
    pub intake_section: IntakeSection,
    pub status: OnboardingStatus,
    pub progress_percent: u8,
    /// Whether the Continue button is enabled.
    pub can_advance: bool,
    pub document_progress: Option<DocumentProgress>,
    pub data: OnboardingData,
}

impl OnboardingView {
    fn new(session: &OnboardingSession, wizard: WizardState) -> AppResult<Self> {
        let step = wizard.step()?;
        Ok(Self {
            token: session.token,
            client_id: session.client_id,
            current_step: wizard.current_step,
            step_label: step.label(),
            intake_section: wizard.intake_section,
            status: wizard.status,
            progress_percent: wizard.progress_percent(),
            can_advance: can_advance_step(wizard.current_step, &wizard.data),
            document_progress: wizard.document_progress(),
            data: wizard.data,
        })
    }
}

type ViewResponse = Json<DataResponse<OnboardingView>>;

#[derive(Debug, Deserialize)]
pub struct SelectClientTypeRequest {
    pub client_type: ClientType,
}

#[derive(Debug, Deserialize)]
pub struct PoaRequest {
    pub grant: bool,
    pub signature: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignEngagementRequest {
    pub agreed: bool,
    pub signature: String,
    pub selected_services: Vec<String>,
}

/// Raw account number from the payment form. Only the last four digits are
/// kept.
#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub method: String,
    pub number: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceSelection {
    pub services: &'static [Service],
    pub selected: Vec<String>,
    pub estimated_fee_cents: Cents,
}

#[derive(Debug, Serialize)]
pub struct TypeCatalog {
    pub client_type: ClientType,
    pub documents: &'static [DocumentRequest],
    pub services: &'static [Service],
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load(state: &AppState, token: Uuid) -> AppResult<(OnboardingSession, WizardState)> {
    let session = OnboardingSessionRepo::find_by_token(&state.pool, token)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Onboarding session {token} not found")))?;
    let wizard = session.wizard_state()?;
    Ok((session, wizard))
}

/// Write the wizard back, creating the client once a contact name and type
/// are known and keeping the client and its answers in sync afterwards.
async fn persist(
    state: &AppState,
    session: &OnboardingSession,
    wizard: &WizardState,
) -> AppResult<OnboardingSession> {
    let mut client_id = session.client_id;
    let data = &wizard.data;

    if let (Some(client_type), true) = (data.client_type, data.has_contact_name()) {
        let name = data.contact_info.name.trim();
        validate_client_name(name)?;
        let id = match client_id {
            Some(id) => {
                ClientRepo::sync_from_onboarding(&state.pool, id, name, client_type.as_str())
                    .await?;
                id
            }
            None => {
                let create = CreateClient {
                    name: name.to_string(),
                    client_type: client_type.as_str().to_string(),
                    assigned_to: None,
                    created_by: None,
                };
                let (id, created) =
                    OnboardingSessionRepo::link_new_client(&state.pool, session.id, &create)
                        .await?
                        .ok_or(AppError::Core(CoreError::NotFound {
                            entity: "OnboardingSession",
                            id: session.id,
                        }))?;
                if created {
                    tracing::info!(
                        session_id = session.id,
                        client_id = id,
                        "Client created from onboarding"
                    );
                } else {
                    // Linked by a concurrent save of the same session.
                    ClientRepo::sync_from_onboarding(&state.pool, id, name, client_type.as_str())
                        .await?;
                }
                id
            }
        };
        client_id = Some(id);
    }

    let saved = OnboardingSessionRepo::save(
        &state.pool,
        session.id,
        &SaveOnboardingSession::from_state(client_id, wizard)?,
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "OnboardingSession",
        id: session.id,
    }))?;

    if let Some(id) = client_id {
        let answers = UpsertOnboardingResponse::from_state(id, wizard)?;
        if let Err(e) = OnboardingResponseRepo::upsert(&state.pool, &answers).await {
            tracing::error!(client_id = id, error = %e, "Failed to save onboarding answers");
        }
    }

    Ok(saved)
}

/// Load, mutate, persist and render in one go.
async fn transition<F>(
    state: &AppState,
    token: Uuid,
    action: &'static str,
    f: F,
) -> AppResult<ViewResponse>
where
    F: FnOnce(&mut WizardState) -> Result<(), CoreError>,
{
    let (session, mut wizard) = load(state, token).await?;
    f(&mut wizard)?;
    let saved = persist(state, &session, &wizard).await?;
    tracing::info!(
        session_id = saved.id,
        client_id = ?saved.client_id,
        step = wizard.current_step,
        action,
        "Onboarding updated"
    );
    Ok(Json(DataResponse {
        data: OnboardingView::new(&saved, wizard)?,
    }))
}

fn parse_client_type(raw: &str) -> AppResult<ClientType> {
    ClientType::from_str_db(raw)
        .map_err(|_| AppError::NotFound(format!("Client type '{raw}' not found")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/onboarding
///
/// Start a new wizard. The returned token addresses it from now on.
pub async fn start(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, ViewResponse)> {
    let session = OnboardingSessionRepo::create(&state.pool, Uuid::new_v4()).await?;
    let wizard = session.wizard_state()?;
    tracing::info!(session_id = session.id, "Onboarding started");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: OnboardingView::new(&session, wizard)?,
        }),
    ))
}

/// GET /api/v1/onboarding/{token}
pub async fn get_session(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> AppResult<ViewResponse> {
    let (session, wizard) = load(&state, token).await?;
    Ok(Json(DataResponse {
        data: OnboardingView::new(&session, wizard)?,
    }))
}

/// PATCH /api/v1/onboarding/{token}
///
/// Save answers as they are typed. Does not move between steps.
pub async fn save_answers(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
    Json(patch): Json<OnboardingPatch>,
) -> AppResult<ViewResponse> {
    transition(&state, token, "save", |w| w.apply_patch(patch)).await
}

/// POST /api/v1/onboarding/{token}/client-type
pub async fn select_client_type(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
    Json(input): Json<SelectClientTypeRequest>,
) -> AppResult<ViewResponse> {
    transition(&state, token, "client_type", |w| {
        w.select_client_type(input.client_type)
    })
    .await
}

/// POST /api/v1/onboarding/{token}/advance
pub async fn advance(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> AppResult<ViewResponse> {
    transition(&state, token, "advance", |w| w.advance().map(|_| ())).await
}

/// POST /api/v1/onboarding/{token}/back
pub async fn back(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> AppResult<ViewResponse> {
    transition(&state, token, "back", |w| w.go_back().map(|_| ())).await
}

/// POST /api/v1/onboarding/{token}/intake/next
pub async fn intake_next(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> AppResult<ViewResponse> {
    transition(&state, token, "intake_next", WizardState::intake_next).await
}

/// POST /api/v1/onboarding/{token}/intake/back
pub async fn intake_back(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> AppResult<ViewResponse> {
    transition(&state, token, "intake_back", WizardState::intake_back).await
}

/// POST /api/v1/onboarding/{token}/documents/{doc_id}
///
/// Multipart upload with a single `file` field. The wizard must be on the
/// documents step and linked to a client.
pub async fn upload_document(
    State(state): State<AppState>,
    Path((token, doc_id)): Path<(Uuid, String)>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, ViewResponse)> {
    let (session, mut wizard) = load(&state, token).await?;
    let client_id = session.client_id.ok_or_else(|| {
        AppError::Core(CoreError::Conflict(
            "Enter your contact information before uploading documents".into(),
        ))
    })?;

    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        file = Some((file_name, bytes.to_vec()));
    }
    let (file_name, bytes) =
        file.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;

    wizard.record_upload(&doc_id, &file_name)?;
    let ext = documents::extension_of(&file_name)?;
    if bytes.is_empty() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "File '{file_name}' is empty"
        ))));
    }

    let client_type = wizard.data.client_type.ok_or_else(|| {
        AppError::Core(CoreError::Validation("Select a client type first".into()))
    })?;
    let request = documents::find_request(client_type, &doc_id)?;

    let key = documents::storage_key(client_id, &doc_id, Utc::now().timestamp_millis(), &ext);
    let path = state
        .documents
        .put(&key, &bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store document: {e}")))?;

    let document = DocumentRepo::create(
        &state.pool,
        &CreateDocument {
            client_id,
            document_type: request.id.to_string(),
            document_category: if request.required { "required" } else { "optional" }.to_string(),
            file_name: file_name.clone(),
            file_path: path.to_string_lossy().to_string(),
            file_size: bytes.len() as i64,
            file_type: ext,
            is_required: request.required,
        },
    )
    .await?;

    let saved = persist(&state, &session, &wizard).await?;
    tracing::info!(
        session_id = saved.id,
        client_id,
        document_id = document.id,
        doc_id = %doc_id,
        size = bytes.len(),
        "Document uploaded"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: OnboardingView::new(&saved, wizard)?,
        }),
    ))
}

/// POST /api/v1/onboarding/{token}/poa
pub async fn submit_poa(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
    Json(input): Json<PoaRequest>,
) -> AppResult<ViewResponse> {
    transition(&state, token, "poa", |w| {
        w.submit_poa(input.grant, input.signature.as_deref())
    })
    .await
}

/// GET /api/v1/onboarding/{token}/services
///
/// Services offered for the chosen type, with the current or default
/// selection and its fee estimate.
pub async fn services(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> AppResult<Json<DataResponse<ServiceSelection>>> {
    let (_, wizard) = load(&state, token).await?;
    let client_type = wizard.data.client_type.ok_or_else(|| {
        AppError::Core(CoreError::Validation("Select a client type first".into()))
    })?;
    let selected = wizard.engagement_selection()?;
    Ok(Json(DataResponse {
        data: ServiceSelection {
            services: engagement::services_for(client_type),
            estimated_fee_cents: engagement::total_fee_cents(client_type, &selected),
            selected,
        },
    }))
}

/// POST /api/v1/onboarding/{token}/engagement/sign
pub async fn sign_engagement(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
    Json(input): Json<SignEngagementRequest>,
) -> AppResult<ViewResponse> {
    transition(&state, token, "sign_engagement", |w| {
        w.sign_engagement(input.agreed, &input.signature, &input.selected_services)
            .map(|_| ())
    })
    .await
}

/// POST /api/v1/onboarding/{token}/payment
pub async fn record_payment(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
    Json(input): Json<PaymentRequest>,
) -> AppResult<ViewResponse> {
    let method = PaymentMethod::from_number(&input.method, &input.number)?;
    transition(&state, token, "payment", |w| w.record_payment(method)).await
}

/// POST /api/v1/onboarding/{token}/complete
///
/// Finish the wizard from the welcome step. The client moves to
/// `in_progress`; with `auto_create_billing_entry` on, a fee schedule is
/// seeded from the signed services.
pub async fn complete(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> AppResult<ViewResponse> {
    let (session, mut wizard) = load(&state, token).await?;
    wizard.complete()?;
    let saved = persist(&state, &session, &wizard).await?;

    if let Some(client_id) = saved.client_id {
        ClientRepo::mark_onboarded(&state.pool, client_id).await?;

        let settings = load_settings(&state).await?;
        if let (true, Some(client_type)) = (
            settings.workflow_steps.auto_create_billing_entry,
            wizard.data.client_type,
        ) {
            let worksheet = FeeWorksheet {
                line_items: line_items_from_services(
                    client_type,
                    &wizard.data.selected_services,
                ),
                ..Default::default()
            };
            let created = FeeScheduleRepo::create_if_absent(
                &state.pool,
                client_id,
                &SaveFeeSchedule::from_worksheet(&worksheet)?,
            )
            .await?;
            if created.is_some() {
                tracing::info!(client_id, "Fee schedule seeded from engagement");
            }
        }
    }

    tracing::info!(session_id = saved.id, client_id = ?saved.client_id, "Onboarding completed");
    Ok(Json(DataResponse {
        data: OnboardingView::new(&saved, wizard)?,
    }))
}

/// POST /api/v1/onboarding/{token}/abandon
pub async fn abandon(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> AppResult<ViewResponse> {
    transition(&state, token, "abandon", WizardState::abandon).await
}

/// GET /api/v1/onboarding/catalog/{client_type}
///
/// Documents requested from and services offered to a client type.
pub async fn catalog(
    Path(client_type): Path<String>,
) -> AppResult<Json<DataResponse<TypeCatalog>>> {
    let client_type = parse_client_type(&client_type)?;
    Ok(Json(DataResponse {
        data: TypeCatalog {
            client_type,
            documents: documents::catalogue(client_type),
            services: engagement::services_for(client_type),
        },
    }))
}
