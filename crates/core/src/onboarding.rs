//! Client onboarding wizard: steps, answers and transition rules.
//!
//! The wizard is a linear six-step flow holding one mutable
//! [`OnboardingData`] record. Step 2 has its own sub-sections
//! ([`IntakeSection`]). Forward movement validates the current step; backward
//! movement never does. All rules live on [`WizardState`] so the API and
//! repository layers only load, mutate and persist it.

use serde::{Deserialize, Serialize};

use crate::client::ClientType;
use crate::documents::{self, DocumentMap, DocumentProgress};
use crate::engagement::{self, PaymentMethod, SignedEngagement};
use crate::error::CoreError;
use crate::types::Cents;
use crate::validation::{require_non_blank, validate_email};

// ---------------------------------------------------------------------------
// Onboarding status
// ---------------------------------------------------------------------------

/// Status values for an onboarding session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl OnboardingStatus {
    /// Parse a status string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "abandoned" => Ok(Self::Abandoned),
            _ => Err(CoreError::Validation(format!(
                "Invalid onboarding status '{s}'. Must be one of: in_progress, completed, abandoned"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

// ---------------------------------------------------------------------------
// Onboarding steps
// ---------------------------------------------------------------------------

/// The six steps in the onboarding wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    ClientType,
    Information,
    Documents,
    Authorization,
    Engagement,
    Welcome,
}

/// Total number of steps in the wizard.
pub const TOTAL_STEPS: u8 = 6;

/// Minimum step number (1-based).
pub const MIN_STEP: u8 = 1;

/// Maximum step number (1-based).
pub const MAX_STEP: u8 = 6;

impl OnboardingStep {
    /// Convert a 1-based step number to an `OnboardingStep`.
    pub fn from_number(n: u8) -> Result<Self, CoreError> {
        match n {
            1 => Ok(Self::ClientType),
            2 => Ok(Self::Information),
            3 => Ok(Self::Documents),
            4 => Ok(Self::Authorization),
            5 => Ok(Self::Engagement),
            6 => Ok(Self::Welcome),
            _ => Err(CoreError::Validation(format!(
                "Invalid step number {n}. Must be between {MIN_STEP} and {MAX_STEP}"
            ))),
        }
    }

    /// Convert to a 1-based step number.
    pub fn to_number(self) -> u8 {
        match self {
            Self::ClientType => 1,
            Self::Information => 2,
            Self::Documents => 3,
            Self::Authorization => 4,
            Self::Engagement => 5,
            Self::Welcome => 6,
        }
    }

    /// Human-readable label for the step.
    pub fn label(self) -> &'static str {
        match self {
            Self::ClientType => "Client Type",
            Self::Information => "Your Information",
            Self::Documents => "Documents",
            Self::Authorization => "Authorization",
            Self::Engagement => "Engagement & Billing",
            Self::Welcome => "Welcome",
        }
    }
}

// ---------------------------------------------------------------------------
// Intake sections (step 2)
// ---------------------------------------------------------------------------

/// Sub-sections of the intake questionnaire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeSection {
    #[default]
    Contact,
    Screening,
    Specific,
}

impl IntakeSection {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "contact" => Ok(Self::Contact),
            "screening" => Ok(Self::Screening),
            "specific" => Ok(Self::Specific),
            _ => Err(CoreError::Validation(format!(
                "Invalid intake section '{s}'. Must be one of: contact, screening, specific"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Screening => "screening",
            Self::Specific => "specific",
        }
    }

    /// The section after this one, or `None` when the questionnaire is done.
    /// Individuals have no type-specific section.
    pub fn next(self, client_type: ClientType) -> Option<Self> {
        match self {
            Self::Contact => Some(Self::Screening),
            Self::Screening if client_type.has_specific_questions() => Some(Self::Specific),
            Self::Screening | Self::Specific => None,
        }
    }

    /// The section before this one, or `None` on the first section.
    pub fn prev(self) -> Option<Self> {
        match self {
            Self::Contact => None,
            Self::Screening => Some(Self::Contact),
            Self::Specific => Some(Self::Screening),
        }
    }
}

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filing_status: Option<String>,
    pub preferred_contact: String,
    pub referral_source: String,
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            filing_status: None,
            preferred_contact: "email".to_string(),
            referral_source: String::new(),
        }
    }
}

impl ContactInfo {
    /// Name, email, phone and address are required; email must be valid.
    pub fn validate(&self) -> Result<(), CoreError> {
        require_non_blank("name", &self.name)?;
        validate_email(&self.email)?;
        require_non_blank("phone", &self.phone)?;
        require_non_blank("address", &self.address)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Screening {
    pub delinquent_returns: bool,
    pub irs_notices: bool,
    pub bankruptcies: bool,
    pub prior_accountant_issues: String,
}

impl Screening {
    /// Any answer that warrants a closer look by staff.
    pub fn has_flags(&self) -> bool {
        self.delinquent_returns
            || self.irs_notices
            || self.bankruptcies
            || !self.prior_accountant_issues.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessInfo {
    pub entity_type: String,
    pub year_formed: String,
    pub bookkeeping_needs: bool,
    pub payroll_needs: bool,
    pub sales_tax_needs: bool,
    pub needs_1099_prep: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Beneficiary {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustInfo {
    pub trust_type: String,
    pub year_established: String,
    pub beneficiaries: Vec<Beneficiary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardMember {
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonprofitInfo {
    pub has_501c3: bool,
    pub board_members: Vec<BoardMember>,
    pub typical_revenue: String,
}

/// Everything the client has entered so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingData {
    pub client_type: Option<ClientType>,
    pub contact_info: ContactInfo,
    pub screening: Screening,
    pub business_info: Option<BusinessInfo>,
    pub trust_info: Option<TrustInfo>,
    pub nonprofit_info: Option<NonprofitInfo>,
    pub documents: DocumentMap,
    pub poa_granted: bool,
    pub engagement_signed: bool,
    pub selected_services: Vec<String>,
    pub estimated_fee_cents: Cents,
    pub payment_method: Option<PaymentMethod>,
}

impl OnboardingData {
    /// Contact info carries a name, which is when a client record is created.
    pub fn has_contact_name(&self) -> bool {
        !self.contact_info.name.trim().is_empty()
    }

    /// Switch to another client type, dropping everything that depended on
    /// the old one: uploads, the type-specific questionnaire blocks and the
    /// signed engagement. Contact, screening and POA answers are kept.
    pub fn change_client_type(&mut self, client_type: ClientType) {
        if self.client_type == Some(client_type) {
            return;
        }
        if self.client_type.is_some() {
            self.documents.clear();
            self.engagement_signed = false;
            self.selected_services.clear();
            self.estimated_fee_cents = 0;
            self.payment_method = None;
        }
        if client_type != ClientType::Business {
            self.business_info = None;
        }
        if client_type != ClientType::Trust {
            self.trust_info = None;
        }
        if client_type != ClientType::Nonprofit {
            self.nonprofit_info = None;
        }
        self.client_type = Some(client_type);
    }

    fn require_client_type(&self) -> Result<ClientType, CoreError> {
        self.client_type
            .ok_or_else(|| CoreError::Validation("Select a client type first".to_string()))
    }
}

/// Partial update of the answer fields. Present fields replace stored values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnboardingPatch {
    pub client_type: Option<ClientType>,
    pub contact_info: Option<ContactInfo>,
    pub screening: Option<Screening>,
    pub business_info: Option<BusinessInfo>,
    pub trust_info: Option<TrustInfo>,
    pub nonprofit_info: Option<NonprofitInfo>,
    pub selected_services: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a step transition.
///
/// A transition is valid if the next step is exactly one step forward or
/// one step backward from the current step.
pub fn validate_step_transition(current: u8, next: u8) -> Result<(), CoreError> {
    validate_step_number(current)?;
    if !(MIN_STEP..=MAX_STEP).contains(&next) {
        return Err(CoreError::Validation(format!(
            "Next step {next} is out of range ({MIN_STEP}..{MAX_STEP})"
        )));
    }

    let diff = (next as i16) - (current as i16);
    if diff != 1 && diff != -1 {
        return Err(CoreError::Validation(format!(
            "Cannot transition from step {current} to step {next}. \
             Must advance or go back exactly one step."
        )));
    }

    Ok(())
}

/// Validate that a step number is within the valid range.
pub fn validate_step_number(step: u8) -> Result<(), CoreError> {
    if !(MIN_STEP..=MAX_STEP).contains(&step) {
        return Err(CoreError::Validation(format!(
            "Step {step} is out of range ({MIN_STEP}..{MAX_STEP})"
        )));
    }
    Ok(())
}

/// Check that the data required to leave `step` is present.
pub fn validate_step_data(step: u8, data: &OnboardingData) -> Result<(), CoreError> {
    match OnboardingStep::from_number(step)? {
        OnboardingStep::ClientType => {
            data.require_client_type()?;
        }
        OnboardingStep::Information => {
            data.contact_info.validate()?;
        }
        OnboardingStep::Documents => {
            let client_type = data.require_client_type()?;
            let missing = documents::missing_required(client_type, &data.documents);
            if !missing.is_empty() {
                return Err(CoreError::Validation(format!(
                    "Required documents missing: {}",
                    missing.join(", ")
                )));
            }
        }
        OnboardingStep::Authorization => {}
        OnboardingStep::Engagement => {
            if !data.engagement_signed || data.selected_services.is_empty() {
                return Err(CoreError::Validation(
                    "Step 5 (Engagement & Billing) requires a signed engagement letter".to_string(),
                ));
            }
            if data.payment_method.is_none() {
                return Err(CoreError::Validation(
                    "Step 5 (Engagement & Billing) requires a payment method".to_string(),
                ));
            }
        }
        OnboardingStep::Welcome => {}
    }
    Ok(())
}

/// Returns `true` if the data required to leave `step` is present.
pub fn can_advance_step(step: u8, data: &OnboardingData) -> bool {
    validate_step_data(step, data).is_ok()
}

/// Check if a session can be completed (must be on step 6).
pub fn can_complete_session(current_step: u8) -> Result<(), CoreError> {
    if current_step != MAX_STEP {
        return Err(CoreError::Validation(format!(
            "Cannot complete session: must be on step {MAX_STEP} (Welcome), \
             currently on step {current_step}"
        )));
    }
    Ok(())
}

/// Check if a session can be abandoned (must be in progress).
pub fn can_abandon_session(status: OnboardingStatus) -> Result<(), CoreError> {
    if status != OnboardingStatus::InProgress {
        return Err(CoreError::Conflict(format!(
            "Cannot abandon session with status '{}'. Only 'in_progress' sessions can be abandoned.",
            status.as_str()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Wizard state
// ---------------------------------------------------------------------------

/// In-memory view of one onboarding session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardState {
    pub current_step: u8,
    pub intake_section: IntakeSection,
    pub status: OnboardingStatus,
    pub data: OnboardingData,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step: MIN_STEP,
            intake_section: IntakeSection::Contact,
            status: OnboardingStatus::InProgress,
            data: OnboardingData::default(),
        }
    }
}

impl WizardState {
    pub fn step(&self) -> Result<OnboardingStep, CoreError> {
        OnboardingStep::from_number(self.current_step)
    }

    /// Whole-percent position in the wizard, as shown on the stepper.
    pub fn progress_percent(&self) -> u8 {
        (u16::from(self.current_step.min(MAX_STEP)) * 100 / u16::from(TOTAL_STEPS)) as u8
    }

    fn ensure_in_progress(&self) -> Result<(), CoreError> {
        if self.status != OnboardingStatus::InProgress {
            return Err(CoreError::Conflict(format!(
                "Onboarding session is {}",
                self.status.as_str()
            )));
        }
        Ok(())
    }

    fn ensure_on(&self, step: OnboardingStep) -> Result<(), CoreError> {
        if self.current_step != step.to_number() {
            return Err(CoreError::Validation(format!(
                "This action belongs to step {} ({}), currently on step {}",
                step.to_number(),
                step.label(),
                self.current_step
            )));
        }
        Ok(())
    }

    fn client_type(&self) -> Result<ClientType, CoreError> {
        self.data.require_client_type()
    }

    /// Merge a partial update into the answers.
    pub fn apply_patch(&mut self, patch: OnboardingPatch) -> Result<(), CoreError> {
        self.ensure_in_progress()?;

        if let Some(client_type) = patch.client_type {
            if self.data.client_type != Some(client_type) && self.current_step != MIN_STEP {
                return Err(CoreError::Validation(
                    "The client type can only be changed on step 1".to_string(),
                ));
            }
        }
        let client_type = patch.client_type.or(self.data.client_type);
        if let (Some(services), Some(t)) = (&patch.selected_services, client_type) {
            engagement::validate_selection(t, services)?;
        }
        if let Some(services) = &patch.selected_services {
            let type_kept = patch.client_type.is_none() || patch.client_type == self.data.client_type;
            if self.data.engagement_signed && type_kept && *services != self.data.selected_services {
                return Err(CoreError::Validation(
                    "Services are fixed by the signed engagement letter. Sign it again to change them"
                        .to_string(),
                ));
            }
        }

        let data = &mut self.data;
        if let Some(t) = patch.client_type {
            data.change_client_type(t);
        }
        if let Some(v) = patch.contact_info {
            data.contact_info = v;
        }
        if let Some(v) = patch.screening {
            data.screening = v;
        }
        if patch.business_info.is_some() {
            data.business_info = patch.business_info;
        }
        if patch.trust_info.is_some() {
            data.trust_info = patch.trust_info;
        }
        if patch.nonprofit_info.is_some() {
            data.nonprofit_info = patch.nonprofit_info;
        }
        if let Some(v) = patch.selected_services {
            data.selected_services = v;
        }
        Ok(())
    }

    /// Step 1: choose the client type and move straight to step 2.
    pub fn select_client_type(&mut self, client_type: ClientType) -> Result<(), CoreError> {
        self.ensure_in_progress()?;
        self.ensure_on(OnboardingStep::ClientType)?;
        self.data.change_client_type(client_type);
        self.advance().map(|_| ())
    }

    /// Validate the current step and move exactly one step forward.
    pub fn advance(&mut self) -> Result<OnboardingStep, CoreError> {
        self.ensure_in_progress()?;
        let next = self.current_step + 1;
        validate_step_transition(self.current_step, next)?;
        validate_step_data(self.current_step, &self.data)?;
        self.current_step = next;
        if next == OnboardingStep::Information.to_number() {
            self.intake_section = IntakeSection::Contact;
        }
        OnboardingStep::from_number(next)
    }

    /// Move exactly one step back. Never validates.
    pub fn go_back(&mut self) -> Result<OnboardingStep, CoreError> {
        self.ensure_in_progress()?;
        let prev = self.current_step.saturating_sub(1);
        validate_step_transition(self.current_step, prev)?;
        self.current_step = prev;
        if prev == OnboardingStep::Information.to_number() {
            self.intake_section = IntakeSection::Contact;
        }
        OnboardingStep::from_number(prev)
    }

    /// Next button inside the questionnaire. Leaving the contact section
    /// validates it; leaving the last section advances the wizard.
    pub fn intake_next(&mut self) -> Result<(), CoreError> {
        self.ensure_in_progress()?;
        self.ensure_on(OnboardingStep::Information)?;
        if self.intake_section == IntakeSection::Contact {
            self.data.contact_info.validate()?;
        }
        match self.intake_section.next(self.client_type()?) {
            Some(section) => {
                self.intake_section = section;
                Ok(())
            }
            None => self.advance().map(|_| ()),
        }
    }

    /// Back button inside the questionnaire. On the first section it leaves
    /// the step.
    pub fn intake_back(&mut self) -> Result<(), CoreError> {
        self.ensure_in_progress()?;
        self.ensure_on(OnboardingStep::Information)?;
        match self.intake_section.prev() {
            Some(section) => {
                self.intake_section = section;
                Ok(())
            }
            None => self.go_back().map(|_| ()),
        }
    }

    /// Step 3: record an uploaded document in the answers.
    pub fn record_upload(&mut self, doc_id: &str, file_name: &str) -> Result<(), CoreError> {
        self.ensure_in_progress()?;
        self.ensure_on(OnboardingStep::Documents)?;
        documents::find_request(self.client_type()?, doc_id)?;
        documents::mark_uploaded(&mut self.data.documents, doc_id, file_name);
        Ok(())
    }

    pub fn document_progress(&self) -> Option<DocumentProgress> {
        self.data
            .client_type
            .map(|t| DocumentProgress::compute(t, &self.data.documents))
    }

    /// Step 4: grant or skip power of attorney, then advance.
    pub fn submit_poa(&mut self, wants_to_grant: bool, signature: Option<&str>) -> Result<(), CoreError> {
        self.ensure_in_progress()?;
        self.ensure_on(OnboardingStep::Authorization)?;
        let granted = engagement::grant_poa(wants_to_grant, signature)?;
        if granted {
            self.data.poa_granted = true;
        }
        self.advance().map(|_| ())
    }

    /// Step 5: the services pre-selected on the engagement screen.
    pub fn engagement_selection(&self) -> Result<Vec<String>, CoreError> {
        Ok(engagement::default_selection(
            self.client_type()?,
            &self.data.selected_services,
        ))
    }

    /// Step 5: sign the engagement letter.
    pub fn sign_engagement(
        &mut self,
        agreed: bool,
        signature: &str,
        selected: &[String],
    ) -> Result<SignedEngagement, CoreError> {
        self.ensure_in_progress()?;
        self.ensure_on(OnboardingStep::Engagement)?;
        let signed = engagement::sign_engagement(self.client_type()?, agreed, signature, selected)?;
        self.data.selected_services = signed.selected_services.clone();
        self.data.estimated_fee_cents = signed.estimated_fee_cents;
        self.data.engagement_signed = true;
        Ok(signed)
    }

    /// Step 5: put a payment method on file and advance to the welcome step.
    pub fn record_payment(&mut self, method: PaymentMethod) -> Result<(), CoreError> {
        self.ensure_in_progress()?;
        self.ensure_on(OnboardingStep::Engagement)?;
        if !self.data.engagement_signed {
            return Err(CoreError::Validation(
                "Sign the engagement letter before adding a payment method".to_string(),
            ));
        }
        self.data.payment_method = Some(method);
        self.advance().map(|_| ())
    }

    /// Finish the wizard. Only allowed on the welcome step.
    pub fn complete(&mut self) -> Result<(), CoreError> {
        self.ensure_in_progress()?;
        can_complete_session(self.current_step)?;
        self.status = OnboardingStatus::Completed;
        Ok(())
    }

    pub fn abandon(&mut self) -> Result<(), CoreError> {
        can_abandon_session(self.status)?;
        self.status = OnboardingStatus::Abandoned;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
