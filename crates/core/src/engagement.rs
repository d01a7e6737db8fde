//! Engagement letter: service catalogue, fee estimate, signing, payment
//! method capture and the power-of-attorney grant.

use serde::{Deserialize, Serialize};

use crate::client::ClientType;
use crate::error::CoreError;
use crate::types::Cents;
use crate::validation::{require_non_blank, validate_last4};

/// A service the firm offers to a given client type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Service {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub base_fee_cents: Cents,
    pub recommended: bool,
}

const fn service(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    dollars: Cents,
    recommended: bool,
) -> Service {
    Service {
        id,
        name,
        description,
        base_fee_cents: dollars * 100,
        recommended,
    }
}

const INDIVIDUAL_SERVICES: &[Service] = &[
    service(
        "tax-prep",
        "Individual Tax Return Preparation",
        "Form 1040 with standard schedules",
        750,
        true,
    ),
    service(
        "year-end-planning",
        "Year-End Tax Planning",
        "Strategic consultation for tax optimization",
        300,
        false,
    ),
    service(
        "amended-return",
        "Amended Return Prep",
        "If corrections are needed",
        450,
        false,
    ),
];

const BUSINESS_SERVICES: &[Service] = &[
    service(
        "business-return",
        "Business Tax Return",
        "Form 1120, 1120-S, or 1065",
        950,
        true,
    ),
    service(
        "payroll",
        "Payroll Processing",
        "Monthly payroll service (per month)",
        150,
        false,
    ),
    service(
        "sales-tax",
        "Sales Tax Filings",
        "Quarterly sales tax returns (per quarter)",
        100,
        false,
    ),
    service(
        "1099-prep",
        "1099 Preparation",
        "Annual contractor reporting",
        200,
        false,
    ),
    service(
        "bookkeeping",
        "Monthly Bookkeeping",
        "Full-service accounting (per month)",
        400,
        false,
    ),
];

const TRUST_SERVICES: &[Service] = &[
    service(
        "trust-return",
        "Trust Tax Return (Form 1041)",
        "Including K-1 preparation for beneficiaries",
        1200,
        true,
    ),
    service(
        "estate-coordination",
        "Estate Planning Coordination",
        "Work with your estate attorney",
        500,
        false,
    ),
];

const NONPROFIT_SERVICES: &[Service] = &[
    service(
        "form-990",
        "Form 990 Preparation",
        "Standard nonprofit tax return",
        2500,
        true,
    ),
    service(
        "form-990n",
        "Form 990-N (E-Postcard)",
        "For small nonprofits under $50k revenue",
        250,
        false,
    ),
    service(
        "board-support",
        "Board Meeting Support",
        "Financial reporting and guidance",
        400,
        false,
    ),
];

/// Services offered to a client of the given type.
pub fn services_for(client_type: ClientType) -> &'static [Service] {
    match client_type {
        ClientType::Individual => INDIVIDUAL_SERVICES,
        ClientType::Business => BUSINESS_SERVICES,
        ClientType::Trust => TRUST_SERVICES,
        ClientType::Nonprofit => NONPROFIT_SERVICES,
    }
}

pub fn find_service(client_type: ClientType, service_id: &str) -> Result<&'static Service, CoreError> {
    services_for(client_type)
        .iter()
        .find(|s| s.id == service_id)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Unknown service '{service_id}' for {} clients",
                client_type.as_str()
            ))
        })
}

/// The selection shown when the client first reaches the engagement step:
/// the existing selection if any, otherwise the recommended services.
pub fn default_selection(client_type: ClientType, current: &[String]) -> Vec<String> {
    if !current.is_empty() {
        return current.to_vec();
    }
    services_for(client_type)
        .iter()
        .filter(|s| s.recommended)
        .map(|s| s.id.to_string())
        .collect()
}

/// Add the service if absent, remove it if present.
pub fn toggle_service(
    client_type: ClientType,
    selected: &mut Vec<String>,
    service_id: &str,
) -> Result<(), CoreError> {
    find_service(client_type, service_id)?;
    if let Some(pos) = selected.iter().position(|s| s == service_id) {
        selected.remove(pos);
    } else {
        selected.push(service_id.to_string());
    }
    Ok(())
}

/// Reject selections containing ids not offered to the client type.
pub fn validate_selection(client_type: ClientType, selected: &[String]) -> Result<(), CoreError> {
    for id in selected {
        find_service(client_type, id)?;
    }
    Ok(())
}

/// Sum of base fees of the selected services. Unknown ids contribute nothing.
pub fn total_fee_cents(client_type: ClientType, selected: &[String]) -> Cents {
    services_for(client_type)
        .iter()
        .filter(|s| selected.iter().any(|id| id == s.id))
        .map(|s| s.base_fee_cents)
        .sum()
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// Result of signing the engagement letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEngagement {
    pub selected_services: Vec<String>,
    pub estimated_fee_cents: Cents,
}

/// Sign the engagement letter for the selected services.
pub fn sign_engagement(
    client_type: ClientType,
    agreed: bool,
    signature: &str,
    selected: &[String],
) -> Result<SignedEngagement, CoreError> {
    if !agreed {
        return Err(CoreError::Validation(
            "You must agree to the engagement terms".to_string(),
        ));
    }
    require_non_blank("signature", signature)?;
    if selected.is_empty() {
        return Err(CoreError::Validation(
            "Select at least one service".to_string(),
        ));
    }
    validate_selection(client_type, selected)?;

    let mut services = Vec::with_capacity(selected.len());
    for id in selected {
        if !services.contains(id) {
            services.push(id.clone());
        }
    }

    Ok(SignedEngagement {
        estimated_fee_cents: total_fee_cents(client_type, &services),
        selected_services: services,
    })
}

// ---------------------------------------------------------------------------
// Payment method
// ---------------------------------------------------------------------------

/// Payment method on file. Only the kind and last four digits are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentMethod {
    Card { last4: String },
    Ach { last4: String },
}

impl PaymentMethod {
    /// Build from a raw card or bank account number, discarding all but the
    /// last four digits. Spaces and dashes are ignored.
    pub fn from_number(kind: &str, number: &str) -> Result<Self, CoreError> {
        let digits: String = number.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::Validation(
                "Account number must contain only digits".to_string(),
            ));
        }
        let (min, max) = match kind {
            "card" => (12, 19),
            "ach" => (4, 17),
            _ => {
                return Err(CoreError::Validation(format!(
                    "Invalid payment method '{kind}'. Must be one of: card, ach"
                )))
            }
        };
        if digits.len() < min || digits.len() > max {
            return Err(CoreError::Validation(format!(
                "A {kind} number must have between {min} and {max} digits"
            )));
        }

        let last4 = digits[digits.len() - 4..].to_string();
        validate_last4(&last4)?;
        Ok(match kind {
            "card" => Self::Card { last4 },
            _ => Self::Ach { last4 },
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Card { .. } => "card",
            Self::Ach { .. } => "ach",
        }
    }

    pub fn last4(&self) -> &str {
        match self {
            Self::Card { last4 } | Self::Ach { last4 } => last4,
        }
    }
}

// ---------------------------------------------------------------------------
// Power of attorney
// ---------------------------------------------------------------------------

/// Outcome of the authorization step: `true` when POA was granted.
///
/// Declining is always allowed and skips the grant. Granting needs a typed
/// signature.
pub fn grant_poa(wants_to_grant: bool, signature: Option<&str>) -> Result<bool, CoreError> {
    if !wants_to_grant {
        return Ok(false);
    }
    match signature {
        Some(sig) if !sig.trim().is_empty() => Ok(true),
        _ => Err(CoreError::Validation(
            "A signature is required to grant power of attorney".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn fees_are_stored_in_cents() {
        let s = find_service(ClientType::Nonprofit, "form-990").unwrap();
        assert_eq!(s.base_fee_cents, 250_000);
    }

    #[test]
    fn each_type_has_one_recommended_service() {
        for t in ClientType::ALL {
            assert_eq!(services_for(t).iter().filter(|s| s.recommended).count(), 1);
        }
    }

    #[test]
    fn default_selection_prefers_existing() {
        assert_eq!(default_selection(ClientType::Business, &[]), ids(&["business-return"]));
        let current = ids(&["payroll"]);
        assert_eq!(default_selection(ClientType::Business, &current), current);
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut selected = ids(&["tax-prep"]);
        toggle_service(ClientType::Individual, &mut selected, "amended-return").unwrap();
        assert_eq!(selected, ids(&["tax-prep", "amended-return"]));
        toggle_service(ClientType::Individual, &mut selected, "tax-prep").unwrap();
        assert_eq!(selected, ids(&["amended-return"]));
    }

    #[test]
    fn toggle_rejects_unknown_service() {
        let mut selected = Vec::new();
        assert!(toggle_service(ClientType::Individual, &mut selected, "payroll").is_err());
        assert!(selected.is_empty());
    }

    #[test]
    fn total_fee_sums_selected() {
        let selected = ids(&["business-return", "payroll", "bookkeeping"]);
        assert_eq!(total_fee_cents(ClientType::Business, &selected), 150_000);
        assert_eq!(total_fee_cents(ClientType::Business, &[]), 0);
    }

    #[test]
    fn sign_requires_agreement_signature_and_services() {
        let selected = ids(&["trust-return"]);
        assert!(sign_engagement(ClientType::Trust, false, "Jane Doe", &selected).is_err());
        assert!(sign_engagement(ClientType::Trust, true, "  ", &selected).is_err());
        assert!(sign_engagement(ClientType::Trust, true, "Jane Doe", &[]).is_err());

        let signed = sign_engagement(ClientType::Trust, true, "Jane Doe", &selected).unwrap();
        assert_eq!(signed.estimated_fee_cents, 120_000);
    }

    #[test]
    fn sign_deduplicates_selection() {
        let selected = ids(&["tax-prep", "tax-prep"]);
        let signed = sign_engagement(ClientType::Individual, true, "J", &selected).unwrap();
        assert_eq!(signed.selected_services, ids(&["tax-prep"]));
        assert_eq!(signed.estimated_fee_cents, 75_000);
    }

    #[test]
    fn payment_method_keeps_last_four() {
        let pm = PaymentMethod::from_number("card", "4242 4242 4242 4242").unwrap();
        assert_matches!(pm, PaymentMethod::Card { ref last4 } if last4 == "4242");
        assert_eq!(pm.kind(), "card");

        let pm = PaymentMethod::from_number("ach", "000123456789").unwrap();
        assert_eq!(pm.last4(), "6789");
        assert_eq!(pm.kind(), "ach");
    }

    #[test]
    fn payment_method_rejects_bad_input() {
        assert!(PaymentMethod::from_number("card", "1234").is_err());
        assert!(PaymentMethod::from_number("card", "4242-4242-abcd-4242").is_err());
        assert!(PaymentMethod::from_number("cash", "4242424242424242").is_err());
        assert!(PaymentMethod::from_number("ach", "").is_err());
    }

    #[test]
    fn payment_method_serializes_without_full_number() {
        let pm = PaymentMethod::from_number("card", "4111111111111111").unwrap();
        let json = serde_json::to_value(&pm).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "card", "last4": "1111"}));
    }

    #[test]
    fn poa_grant_rules() {
        assert!(!grant_poa(false, None).unwrap());
        assert!(!grant_poa(false, Some("")).unwrap());
        assert!(grant_poa(true, Some("Jane Doe")).unwrap());
        assert!(grant_poa(true, Some(" ")).is_err());
        assert!(grant_poa(true, None).is_err());
    }
}
