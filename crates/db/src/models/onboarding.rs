//! Onboarding session and aggregated response models.

use portal_core::client::ClientType;
use portal_core::error::CoreError;
use portal_core::onboarding::{
    IntakeSection, OnboardingData, OnboardingStatus, WizardState,
};
use portal_core::types::{Cents, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `onboarding_sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OnboardingSession {
    pub id: DbId,
    pub token: Uuid,
    pub client_id: Option<DbId>,
    pub current_step: i32,
    pub intake_section: String,
    pub data: serde_json::Value,
    pub status: String,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OnboardingSession {
    /// Decode the stored columns into the wizard state machine.
    pub fn wizard_state(&self) -> Result<WizardState, CoreError> {
        let data: OnboardingData = serde_json::from_value(self.data.clone()).map_err(|e| {
            CoreError::Internal(format!(
                "Corrupt onboarding data for session {}: {e}",
                self.id
            ))
        })?;
        let current_step = u8::try_from(self.current_step).map_err(|_| {
            CoreError::Internal(format!("Invalid step {} on session {}", self.current_step, self.id))
        })?;
        Ok(WizardState {
            current_step,
            intake_section: IntakeSection::from_str_db(&self.intake_section)?,
            status: OnboardingStatus::from_str_db(&self.status)?,
            data,
        })
    }
}

/// Full replacement of a session's mutable columns.
#[derive(Debug, Clone)]
pub struct SaveOnboardingSession {
    pub client_id: Option<DbId>,
    pub current_step: i32,
    pub intake_section: String,
    pub data: serde_json::Value,
    pub status: String,
}

impl SaveOnboardingSession {
    pub fn from_state(client_id: Option<DbId>, state: &WizardState) -> Result<Self, CoreError> {
        let data = serde_json::to_value(&state.data)
            .map_err(|e| CoreError::Internal(format!("Failed to encode onboarding data: {e}")))?;
        Ok(Self {
            client_id,
            current_step: i32::from(state.current_step),
            intake_section: state.intake_section.as_str().to_string(),
            data,
            status: state.status.as_str().to_string(),
        })
    }
}

/// A row from the `onboarding_responses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OnboardingResponse {
    pub id: DbId,
    pub client_id: DbId,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub filing_status: Option<String>,
    pub preferred_contact: String,
    pub referral_source: String,
    pub delinquent_returns: bool,
    pub irs_notices: bool,
    pub bankruptcies: bool,
    pub prior_accountant_issues: String,
    pub business_info: Option<serde_json::Value>,
    pub trust_info: Option<serde_json::Value>,
    pub nonprofit_info: Option<serde_json::Value>,
    pub documents: serde_json::Value,
    pub poa_granted: bool,
    pub engagement_signed: bool,
    pub payment_method_type: Option<String>,
    pub payment_last4: Option<String>,
    pub selected_services: Vec<String>,
    pub estimated_fee_cents: Cents,
    pub completed_step: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Flattened wizard answers written on every change once a client exists.
#[derive(Debug, Clone)]
pub struct UpsertOnboardingResponse {
    pub client_id: DbId,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub filing_status: Option<String>,
    pub preferred_contact: String,
    pub referral_source: String,
    pub delinquent_returns: bool,
    pub irs_notices: bool,
    pub bankruptcies: bool,
    pub prior_accountant_issues: String,
    pub business_info: Option<serde_json::Value>,
    pub trust_info: Option<serde_json::Value>,
    pub nonprofit_info: Option<serde_json::Value>,
    pub documents: serde_json::Value,
    pub poa_granted: bool,
    pub engagement_signed: bool,
    pub payment_method_type: Option<String>,
    pub payment_last4: Option<String>,
    pub selected_services: Vec<String>,
    pub estimated_fee_cents: Cents,
    pub completed_step: i32,
}

fn encode<T: Serialize>(value: &T) -> Result<serde_json::Value, CoreError> {
    serde_json::to_value(value)
        .map_err(|e| CoreError::Internal(format!("Failed to encode onboarding answers: {e}")))
}

impl UpsertOnboardingResponse {
    /// Flatten the wizard state for `client_id`. Only the sub-object that
    /// matches the client type is kept.
    pub fn from_state(client_id: DbId, state: &WizardState) -> Result<Self, CoreError> {
        let data = &state.data;
        let client_type = data.client_type;
        let keep = |t: ClientType| client_type == Some(t);

        let business_info = match &data.business_info {
            Some(info) if keep(ClientType::Business) => Some(encode(info)?),
            _ => None,
        };
        let trust_info = match &data.trust_info {
            Some(info) if keep(ClientType::Trust) => Some(encode(info)?),
            _ => None,
        };
        let nonprofit_info = match &data.nonprofit_info {
            Some(info) if keep(ClientType::Nonprofit) => Some(encode(info)?),
            _ => None,
        };

        let contact = &data.contact_info;
        let screening = &data.screening;
        Ok(Self {
            client_id,
            contact_name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            address: contact.address.clone(),
            filing_status: contact.filing_status.clone(),
            preferred_contact: contact.preferred_contact.clone(),
            referral_source: contact.referral_source.clone(),
            delinquent_returns: screening.delinquent_returns,
            irs_notices: screening.irs_notices,
            bankruptcies: screening.bankruptcies,
            prior_accountant_issues: screening.prior_accountant_issues.clone(),
            business_info,
            trust_info,
            nonprofit_info,
            documents: encode(&data.documents)?,
            poa_granted: data.poa_granted,
            engagement_signed: data.engagement_signed,
            payment_method_type: data.payment_method.as_ref().map(|p| p.kind().to_string()),
            payment_last4: data.payment_method.as_ref().map(|p| p.last4().to_string()),
            selected_services: data.selected_services.clone(),
            estimated_fee_cents: data.estimated_fee_cents,
            completed_step: i32::from(state.current_step),
        })
    }
}
