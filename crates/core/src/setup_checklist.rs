//! Per-client admin setup checklist.
//!
//! Four manual setup steps staff work through after onboarding. Each step
//! carries a handful of typed fields; toggling steps drives the client's
//! setup progress.

use serde::{Deserialize, Serialize};

use crate::client::ClientType;
use crate::error::CoreError;

pub const STEP_PRACTICE_CS: &str = "practice-cs";
pub const STEP_ULTRATAX_CS: &str = "ultratax-cs";
pub const STEP_LISCIO: &str = "liscio";
pub const STEP_WORKPAPERS: &str = "workpapers";

/// Maximum length of a text or textarea field value.
pub const MAX_FIELD_LEN: usize = 4_000;

const DEFAULT_WELCOME_MESSAGE: &str = "Welcome to our client portal! You can now securely message \
     our team, upload documents, and review your tax returns.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Select,
    Checkbox,
    Textarea,
}

/// A field value: checkboxes hold booleans, everything else text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub value: FieldValue,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl SetupField {
    fn new(id: &str, label: &str, kind: FieldKind, value: impl Into<FieldValue>) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind,
            value: value.into(),
            options: Vec::new(),
            help_text: None,
        }
    }

    fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    fn help(mut self, text: &str) -> Self {
        self.help_text = Some(text.to_string());
        self
    }

    /// Check that `value` fits this field's kind.
    pub fn check_value(&self, value: &FieldValue) -> Result<(), CoreError> {
        match (self.kind, value) {
            (FieldKind::Checkbox, FieldValue::Bool(_)) => Ok(()),
            (FieldKind::Checkbox, FieldValue::Text(_)) => Err(CoreError::Validation(format!(
                "Field '{}' is a checkbox and takes true or false",
                self.id
            ))),
            (_, FieldValue::Bool(_)) => Err(CoreError::Validation(format!(
                "Field '{}' takes a text value",
                self.id
            ))),
            (FieldKind::Select, FieldValue::Text(v)) => {
                if self.options.iter().any(|o| o == v) {
                    Ok(())
                } else {
                    Err(CoreError::Validation(format!(
                        "'{v}' is not an option for '{}'. Must be one of: {}",
                        self.id,
                        self.options.join(", ")
                    )))
                }
            }
            (FieldKind::Text | FieldKind::Textarea, FieldValue::Text(v)) => {
                if v.chars().count() > MAX_FIELD_LEN {
                    return Err(CoreError::Validation(format!(
                        "Field '{}' must be at most {MAX_FIELD_LEN} characters",
                        self.id
                    )));
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupStep {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub fields: Vec<SetupField>,
}

/// Client facts used to pre-fill a new checklist.
#[derive(Debug, Clone)]
pub struct ChecklistSeed<'a> {
    pub client_name: &'a str,
    pub client_type: ClientType,
    pub address: Option<&'a str>,
    pub selected_services: &'a [String],
    /// Display names of documents received during intake.
    pub document_names: &'a [String],
    /// First tax year offered; the previous two are offered as well.
    pub tax_year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupChecklist {
    pub steps: Vec<SetupStep>,
}

impl SetupChecklist {
    /// A fresh checklist with fields pre-filled from the client record.
    pub fn for_client(seed: &ChecklistSeed<'_>) -> Self {
        let has = |service: &str| seed.selected_services.iter().any(|s| s == service);
        let years: Vec<String> = (0..3).map(|i| (seed.tax_year - i).to_string()).collect();
        let imported = seed
            .document_names
            .iter()
            .map(|n| format!("- {n}"))
            .collect::<Vec<_>>()
            .join("\n");

        let practice_cs = SetupStep {
            id: STEP_PRACTICE_CS.to_string(),
            title: "Practice CS Setup".to_string(),
            description: "Create client record and attach standard projects".to_string(),
            completed: false,
            fields: vec![
                SetupField::new("client-name", "Client Name", FieldKind::Text, seed.client_name),
                SetupField::new("ssn-ein", "SSN/EIN", FieldKind::Text, "")
                    .help("Social Security Number or Employer ID Number"),
                SetupField::new(
                    "address",
                    "Address",
                    FieldKind::Textarea,
                    seed.address.unwrap_or_default(),
                ),
                SetupField::new(
                    "client-type",
                    "Client Type",
                    FieldKind::Select,
                    seed.client_type.label(),
                )
                .options(ClientType::ALL.iter().map(|t| t.label())),
                SetupField::new("attach-tax-return", "Attach Tax Return Project", FieldKind::Checkbox, true),
                SetupField::new("attach-payroll", "Attach Payroll Project", FieldKind::Checkbox, has("payroll")),
                SetupField::new("attach-1099", "Attach 1099 Prep Project", FieldKind::Checkbox, has("1099-prep")),
                SetupField::new(
                    "attach-sales-tax",
                    "Attach Sales Tax Project",
                    FieldKind::Checkbox,
                    has("sales-tax"),
                ),
            ],
        };

        let ultratax_cs = SetupStep {
            id: STEP_ULTRATAX_CS.to_string(),
            title: "UltraTax CS Setup".to_string(),
            description: "Configure tax software and data sharing".to_string(),
            completed: false,
            fields: vec![
                SetupField::new("data-sharing", "Data Sharing from Practice CS", FieldKind::Checkbox, true)
                    .help("Pull core fields automatically"),
                SetupField::new(
                    "tax-year",
                    "Tax Year for First Engagement",
                    FieldKind::Select,
                    years[0].clone(),
                )
                .options(years.clone()),
                SetupField::new(
                    "price-per-form",
                    "Configure Price Per Form Defaults",
                    FieldKind::Checkbox,
                    false,
                )
                .help("Optional: Pre-configure pricing structure"),
            ],
        };

        let liscio = SetupStep {
            id: STEP_LISCIO.to_string(),
            title: "Liscio Setup".to_string(),
            description: "Create portal contact and configure delivery".to_string(),
            completed: false,
            fields: vec![
                SetupField::new("create-contact", "Create Liscio Contact", FieldKind::Checkbox, false),
                SetupField::new("attach-entities", "Attach Related Entities", FieldKind::Textarea, "")
                    .help("Link multiple businesses/trusts to one login if applicable"),
                SetupField::new("delivery-method", "Default Delivery Method", FieldKind::Select, "Portal")
                    .options(["Portal", "Paper Exception"]),
                SetupField::new(
                    "welcome-message",
                    "Send Welcome Message",
                    FieldKind::Textarea,
                    DEFAULT_WELCOME_MESSAGE,
                ),
            ],
        };

        let workpapers = SetupStep {
            id: STEP_WORKPAPERS.to_string(),
            title: "Workpapers Setup".to_string(),
            description: "Create folders and organize uploaded documents".to_string(),
            completed: false,
            fields: vec![
                SetupField::new(
                    "create-folder",
                    &format!("Create {} Workpapers Folder", seed.tax_year),
                    FieldKind::Checkbox,
                    false,
                ),
                SetupField::new("auto-subfolders", "Auto-create Standard Sub-folders", FieldKind::Checkbox, true)
                    .help("W-2, 1099, K-1, Depreciation, etc."),
                SetupField::new(
                    "imported-docs",
                    "Documents Imported from Client Intake",
                    FieldKind::Textarea,
                    imported,
                ),
            ],
        };

        Self {
            steps: vec![practice_cs, ultratax_cs, liscio, workpapers],
        }
    }

    fn step_mut(&mut self, step_id: &str) -> Result<&mut SetupStep, CoreError> {
        self.steps
            .iter_mut()
            .find(|s| s.id == step_id)
            .ok_or_else(|| CoreError::Validation(format!("Unknown setup step '{step_id}'")))
    }

    /// Flip a step's completed flag and return the new value.
    pub fn toggle_step(&mut self, step_id: &str) -> Result<bool, CoreError> {
        let step = self.step_mut(step_id)?;
        step.completed = !step.completed;
        Ok(step.completed)
    }

    pub fn update_field(
        &mut self,
        step_id: &str,
        field_id: &str,
        value: FieldValue,
    ) -> Result<(), CoreError> {
        let step = self.step_mut(step_id)?;
        let field = step
            .fields
            .iter_mut()
            .find(|f| f.id == field_id)
            .ok_or_else(|| {
                CoreError::Validation(format!("Unknown field '{field_id}' in step '{step_id}'"))
            })?;
        field.check_value(&value)?;
        field.value = value;
        Ok(())
    }

    pub fn completed_count(&self) -> usize {
        self.steps.iter().filter(|s| s.completed).count()
    }

    /// Completed steps as a rounded whole percentage.
    pub fn progress_percent(&self) -> i32 {
        let total = self.steps.len();
        if total == 0 {
            return 0;
        }
        ((self.completed_count() * 100 + total / 2) / total) as i32
    }

    pub fn is_complete(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.completed)
    }
}
