//! Firm-wide settings: third-party integration configuration and workflow
//! automation flags.
//!
//! Settings are stored as one JSON document shared by every staff member.
//! The integration catalogue is fixed; stored documents are normalized
//! against it on read and validated against it on write.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::validation::{require_max_len, validate_http_url};

/// Storage key of the shared settings document.
pub const SETTINGS_KEY: &str = "app:settings";

/// Placeholder shown instead of a stored secret.
pub const REDACTED: &str = "********";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationCategory {
    PracticeManagement,
    TaxSoftware,
    DocumentManagement,
    Accounting,
    ESignature,
    PaymentProcessing,
    TimeAndBilling,
}

impl IntegrationCategory {
    pub const ALL: [IntegrationCategory; 7] = [
        Self::PracticeManagement,
        Self::TaxSoftware,
        Self::DocumentManagement,
        Self::Accounting,
        Self::ESignature,
        Self::PaymentProcessing,
        Self::TimeAndBilling,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::PracticeManagement => "Practice Management",
            Self::TaxSoftware => "Tax Software",
            Self::DocumentManagement => "Document Management",
            Self::Accounting => "Accounting",
            Self::ESignature => "E-Signature",
            Self::PaymentProcessing => "Payment Processing",
            Self::TimeAndBilling => "Time & Billing",
        }
    }
}

/// A supported third-party integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Integration {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub domain: &'static str,
    pub category: IntegrationCategory,
}

const fn integration(
    category: IntegrationCategory,
    key: &'static str,
    label: &'static str,
    description: &'static str,
    domain: &'static str,
) -> Integration {
    Integration {
        key,
        label,
        description,
        domain,
        category,
    }
}

use IntegrationCategory as C;

pub const INTEGRATIONS: &[Integration] = &[
    integration(C::PracticeManagement, "practice_cs", "Practice CS", "Thomson Reuters practice management", "thomsonreuters.com"),
    integration(C::PracticeManagement, "cch_axcess_practice", "CCH Axcess Practice", "Wolters Kluwer practice management", "wolterskluwer.com"),
    integration(C::PracticeManagement, "karbon", "Karbon", "Modern practice management platform", "karbonhq.com"),
    integration(C::PracticeManagement, "tax_dome", "TaxDome", "All-in-one practice management", "taxdome.com"),
    integration(C::PracticeManagement, "canopy", "Canopy", "Practice management for tax & accounting", "getcanopy.com"),
    integration(C::PracticeManagement, "financial_cents", "Financial Cents", "Client accounting services platform", "financialcents.com"),
    integration(C::TaxSoftware, "ultra_tax_cs", "UltraTax CS", "Thomson Reuters tax preparation", "thomsonreuters.com"),
    integration(C::TaxSoftware, "pro_series", "ProSeries", "Intuit professional tax software", "intuit.com"),
    integration(C::TaxSoftware, "lacerte", "Lacerte", "Intuit premium tax software", "intuit.com"),
    integration(C::TaxSoftware, "drake_tax", "Drake Tax", "Drake Software tax preparation", "drakesoftware.com"),
    integration(C::TaxSoftware, "atx", "ATX", "Wolters Kluwer tax software", "wolterskluwer.com"),
    integration(C::DocumentManagement, "workpapers_cs", "Workpapers CS", "Thomson Reuters workpaper management", "thomsonreuters.com"),
    integration(C::DocumentManagement, "share_file", "ShareFile", "Citrix secure file sharing", "sharefile.com"),
    integration(C::DocumentManagement, "smart_vault", "SmartVault", "Cloud document management", "smartvault.com"),
    integration(C::DocumentManagement, "safe_send_returns", "SafeSend Returns", "Tax return delivery & e-signature", "safesend.com"),
    integration(C::Accounting, "quick_books_online", "QuickBooks Online", "Intuit cloud accounting", "quickbooks.intuit.com"),
    integration(C::Accounting, "xero", "Xero", "Cloud accounting platform", "xero.com"),
    integration(C::Accounting, "sage", "Sage", "Sage accounting solutions", "sage.com"),
    integration(C::Accounting, "fresh_books", "FreshBooks", "Cloud accounting for small business", "freshbooks.com"),
    integration(C::ESignature, "docu_sign", "DocuSign", "Electronic signature platform", "docusign.com"),
    integration(C::ESignature, "adobe_sign", "Adobe Sign", "Adobe e-signature solution", "adobe.com"),
    integration(C::ESignature, "right_signature", "RightSignature", "Citrix e-signature service", "rightsignature.com"),
    integration(C::PaymentProcessing, "law_pay", "LawPay", "Professional payment processing", "lawpay.com"),
    integration(C::PaymentProcessing, "bill_com", "Bill.com", "Business payments platform", "bill.com"),
    integration(C::PaymentProcessing, "stripe", "Stripe", "Online payment processing", "stripe.com"),
    integration(C::PaymentProcessing, "paypal", "PayPal", "PayPal business payments", "paypal.com"),
    integration(C::TimeAndBilling, "quick_books_time", "QuickBooks Time", "Time tracking for accounting", "quickbooks.intuit.com"),
    integration(C::TimeAndBilling, "t_sheets", "TSheets", "Employee time tracking", "quickbooks.intuit.com"),
    integration(C::TimeAndBilling, "bqe_core", "BQE Core", "Professional services automation", "bqe.com"),
];

pub fn find_integration(key: &str) -> Option<&'static Integration> {
    INTEGRATIONS.iter().find(|i| i.key == key)
}

/// Catalogue entries grouped by category, in display order.
pub fn integrations_by_category() -> Vec<(IntegrationCategory, Vec<&'static Integration>)> {
    IntegrationCategory::ALL
        .iter()
        .map(|&c| (c, INTEGRATIONS.iter().filter(|i| i.category == c).collect()))
        .collect()
}

// ---------------------------------------------------------------------------
// Stored settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_settings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSteps {
    pub auto_create_in_practice_cs: bool,
    pub auto_send_to_liscio: bool,
    pub auto_setup_quick_books: bool,
    pub auto_generate_engagement_letter: bool,
    pub require_docu_sign_before_proceeding: bool,
    pub auto_create_billing_entry: bool,
}

impl Default for WorkflowSteps {
    fn default() -> Self {
        Self {
            auto_create_in_practice_cs: false,
            auto_send_to_liscio: false,
            auto_setup_quick_books: false,
            auto_generate_engagement_letter: true,
            require_docu_sign_before_proceeding: false,
            auto_create_billing_entry: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub integrations: BTreeMap<String, IntegrationConfig>,
    pub workflow_steps: WorkflowSteps,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            company_name: None,
            integrations: INTEGRATIONS
                .iter()
                .map(|i| (i.key.to_string(), IntegrationConfig::default()))
                .collect(),
            workflow_steps: WorkflowSteps::default(),
        }
    }
}

fn blank_to_none(value: &mut Option<String>) {
    if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
        *value = None;
    }
}

impl WorkflowSettings {
    /// Reject unknown integrations and malformed URLs.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = &self.company_name {
            require_max_len("company_name", name, 200)?;
        }
        for (key, config) in &self.integrations {
            if find_integration(key).is_none() {
                return Err(CoreError::Validation(format!("Unknown integration '{key}'")));
            }
            if let Some(url) = config.api_url.as_deref().filter(|u| !u.trim().is_empty()) {
                validate_http_url(&format!("{key}.api_url"), url)?;
            }
            if let Some(url) = config.webhook_url.as_deref().filter(|u| !u.trim().is_empty()) {
                validate_http_url(&format!("{key}.webhook_url"), url)?;
            }
        }
        Ok(())
    }

    /// Fill in missing integrations, drop unknown ones and clear blank
    /// strings, so every catalogue entry has exactly one config.
    pub fn normalize(mut self) -> Self {
        self.integrations.retain(|key, _| find_integration(key).is_some());
        for i in INTEGRATIONS {
            self.integrations.entry(i.key.to_string()).or_default();
        }
        for config in self.integrations.values_mut() {
            blank_to_none(&mut config.api_key);
            blank_to_none(&mut config.api_url);
            blank_to_none(&mut config.webhook_url);
        }
        blank_to_none(&mut self.company_name);
        self
    }

    /// Copy with API keys masked, for callers who may not see secrets.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for config in copy.integrations.values_mut() {
            if config.api_key.is_some() {
                config.api_key = Some(REDACTED.to_string());
            }
        }
        copy
    }

    /// Keep stored secrets where the incoming document carries the mask.
    pub fn merge_redacted_secrets(&mut self, stored: &WorkflowSettings) {
        for (key, config) in self.integrations.iter_mut() {
            if config.api_key.as_deref() == Some(REDACTED) {
                config.api_key = stored
                    .integrations
                    .get(key)
                    .and_then(|c| c.api_key.clone());
            }
        }
    }

    /// The URL to probe for a connection test.
    ///
    /// The integration must exist, be enabled and have an API URL.
    pub fn connection_target(&self, key: &str) -> Result<&str, CoreError> {
        let integration = find_integration(key)
            .ok_or_else(|| CoreError::Validation(format!("Unknown integration '{key}'")))?;
        let config = self
            .integrations
            .get(key)
            .filter(|c| c.enabled)
            .ok_or_else(|| {
                CoreError::Validation(format!("{} is not enabled", integration.label))
            })?;
        config
            .api_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                CoreError::Validation(format!("{} has no API URL configured", integration.label))
            })
    }
}
