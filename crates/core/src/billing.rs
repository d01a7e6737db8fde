//! Fee builder: per-client billing worksheet and its computed summary.
//!
//! All amounts are integer cents. Line subtotals are always recomputed from
//! price and count, never taken from input.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::client::ClientType;
use crate::engagement;
use crate::error::CoreError;
use crate::types::Cents;
use crate::validation::{require_max_len, require_non_blank};

/// Discounts above this share of the subtotal need partner sign-off.
pub const APPROVAL_DISCOUNT_PERCENT: i64 = 10;

/// Upper bound on the number of forms on one line.
pub const MAX_FORM_COUNT: i32 = 1_000;

/// Upper bound on any single amount: prices, adjustments, last year's fee.
pub const MAX_AMOUNT_CENTS: Cents = 100_000_000_000;

/// Upper bound on the number of lines on one worksheet.
pub const MAX_LINE_ITEMS: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    #[default]
    Standard,
    Moderate,
    Complex,
}

/// One priced service on the worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub name: String,
    pub price_per_form_cents: Cents,
    pub form_count: i32,
    #[serde(default)]
    pub complexity: Complexity,
}

impl LineItem {
    pub fn subtotal_cents(&self) -> Cents {
        self.price_per_form_cents
            .saturating_mul(i64::from(self.form_count))
    }

    fn validate(&self) -> Result<(), CoreError> {
        require_non_blank("line_items.id", &self.id)?;
        require_non_blank("line_items.name", &self.name)?;
        require_max_len("line_items.name", &self.name, 200)?;
        if !(0..=MAX_AMOUNT_CENTS).contains(&self.price_per_form_cents) {
            return Err(CoreError::Validation(format!(
                "Price for '{}' must be between 0 and {MAX_AMOUNT_CENTS} cents",
                self.name
            )));
        }
        if !(0..=MAX_FORM_COUNT).contains(&self.form_count) {
            return Err(CoreError::Validation(format!(
                "Form count for '{}' must be between 0 and {MAX_FORM_COUNT}",
                self.name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    pub discount_cents: Cents,
    pub discount_reason: String,
    pub additional_fees_cents: Cents,
    pub additional_fees_reason: String,
}

/// Editable part of a client's fee schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeWorksheet {
    pub line_items: Vec<LineItem>,
    pub adjustments: Adjustments,
    pub prior_year_fee_cents: Option<Cents>,
}

impl FeeWorksheet {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.line_items.len() > MAX_LINE_ITEMS {
            return Err(CoreError::Validation(format!(
                "A worksheet holds at most {MAX_LINE_ITEMS} line items"
            )));
        }
        let mut seen = HashSet::new();
        for item in &self.line_items {
            item.validate()?;
            if !seen.insert(item.id.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate line item id '{}'",
                    item.id
                )));
            }
        }

        let adj = &self.adjustments;
        let amounts = 0..=MAX_AMOUNT_CENTS;
        if !amounts.contains(&adj.discount_cents) || !amounts.contains(&adj.additional_fees_cents) {
            return Err(CoreError::Validation(format!(
                "Adjustments must be between 0 and {MAX_AMOUNT_CENTS} cents"
            )));
        }
        if self.prior_year_fee_cents.is_some_and(|fee| !amounts.contains(&fee)) {
            return Err(CoreError::Validation(format!(
                "Prior year fee must be between 0 and {MAX_AMOUNT_CENTS} cents"
            )));
        }

        let total = self.checked_total().ok_or_else(|| {
            CoreError::Validation("Fee schedule amounts are too large".to_string())
        })?;
        if total < 0 {
            return Err(CoreError::Validation(
                "Discount cannot exceed the subtotal plus additional fees".to_string(),
            ));
        }
        Ok(())
    }

    /// Subtotal less discount plus fees, or `None` on overflow.
    fn checked_total(&self) -> Option<Cents> {
        let subtotal = self.line_items.iter().try_fold(0 as Cents, |acc, item| {
            item.price_per_form_cents
                .checked_mul(i64::from(item.form_count))
                .and_then(|line| acc.checked_add(line))
        })?;
        subtotal
            .checked_sub(self.adjustments.discount_cents)?
            .checked_add(self.adjustments.additional_fees_cents)
    }
}

/// Figures derived from a worksheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeSummary {
    pub subtotal_cents: Cents,
    pub suggested_fee_cents: Cents,
    pub total_cents: Cents,
    /// Discount as a percentage of the subtotal; 0 when the subtotal is 0.
    pub discount_percent: f64,
    pub needs_partner_approval: bool,
    /// Total minus last year's fee, when last year's fee is known.
    pub prior_year_delta_cents: Option<Cents>,
}

impl FeeSummary {
    /// Saturates instead of overflowing; [`FeeWorksheet::validate`] rejects
    /// worksheets whose figures would not fit.
    pub fn compute(worksheet: &FeeWorksheet) -> Self {
        let subtotal: Cents = worksheet
            .line_items
            .iter()
            .map(LineItem::subtotal_cents)
            .fold(0, Cents::saturating_add);
        let adj = &worksheet.adjustments;
        let total = subtotal
            .saturating_sub(adj.discount_cents)
            .saturating_add(adj.additional_fees_cents);

        let (discount_percent, needs_partner_approval) = if subtotal > 0 {
            (
                adj.discount_cents as f64 / subtotal as f64 * 100.0,
                i128::from(adj.discount_cents) * 100
                    > i128::from(subtotal) * i128::from(APPROVAL_DISCOUNT_PERCENT),
            )
        } else {
            (0.0, false)
        };

        Self {
            subtotal_cents: subtotal,
            suggested_fee_cents: subtotal,
            total_cents: total,
            discount_percent,
            needs_partner_approval,
            prior_year_delta_cents: worksheet
                .prior_year_fee_cents
                .map(|prior| total.saturating_sub(prior)),
        }
    }
}

/// Sending a proposal or invoice is blocked while approval is outstanding.
pub fn can_send(summary: &FeeSummary, partner_approved: bool) -> Result<(), CoreError> {
    if summary.needs_partner_approval && !partner_approved {
        return Err(CoreError::Conflict(format!(
            "A {:.1}% discount requires partner approval",
            summary.discount_percent
        )));
    }
    Ok(())
}

/// Seed a worksheet from the services chosen in the engagement letter.
/// Unknown ids are skipped.
pub fn line_items_from_services(client_type: ClientType, selected: &[String]) -> Vec<LineItem> {
    engagement::services_for(client_type)
        .iter()
        .filter(|s| selected.iter().any(|id| id == s.id))
        .map(|s| LineItem {
            id: s.id.to_string(),
            name: s.name.to_string(),
            price_per_form_cents: s.base_fee_cents,
            form_count: 1,
            complexity: Complexity::Standard,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use assert_matches::assert_matches;

    fn item(id: &str, price: Cents, count: i32) -> LineItem {
        LineItem {
            id: id.into(),
            name: format!("Service {id}"),
            price_per_form_cents: price,
            form_count: count,
            complexity: Complexity::Standard,
        }
    }

    fn worksheet(discount: Cents) -> FeeWorksheet {
        FeeWorksheet {
            line_items: vec![item("1", 50_000, 1), item("2", 25_000, 1)],
            adjustments: Adjustments {
                discount_cents: discount,
                ..Default::default()
            },
            prior_year_fee_cents: Some(75_000),
        }
    }

    #[test]
    fn subtotal_is_price_times_count() {
        assert_eq!(item("1", 12_500, 4).subtotal_cents(), 50_000);
    }

    #[test]
    fn summary_totals() {
        let mut ws = worksheet(5_000);
        ws.adjustments.additional_fees_cents = 2_500;
        let s = FeeSummary::compute(&ws);
        assert_eq!(s.subtotal_cents, 75_000);
        assert_eq!(s.suggested_fee_cents, 75_000);
        assert_eq!(s.total_cents, 72_500);
        assert_eq!(s.prior_year_delta_cents, Some(-2_500));
        assert!(!s.needs_partner_approval);
    }

    #[test]
    fn exactly_ten_percent_needs_no_approval() {
        let s = FeeSummary::compute(&worksheet(7_500));
        assert!((s.discount_percent - 10.0).abs() < 1e-9);
        assert!(!s.needs_partner_approval);
        assert!(can_send(&s, false).is_ok());
    }

    #[test]
    fn over_ten_percent_needs_approval() {
        let s = FeeSummary::compute(&worksheet(7_501));
        assert!(s.needs_partner_approval);
        assert_matches!(can_send(&s, false), Err(CoreError::Conflict(_)));
        assert!(can_send(&s, true).is_ok());
    }

    #[test]
    fn zero_subtotal_has_zero_percent() {
        let ws = FeeWorksheet::default();
        let s = FeeSummary::compute(&ws);
        assert_eq!(s.discount_percent, 0.0);
        assert!(!s.needs_partner_approval);
        assert_eq!(s.prior_year_delta_cents, None);
    }

    #[test]
    fn validation_rejects_bad_worksheets() {
        assert!(worksheet(0).validate().is_ok());
        assert!(worksheet(-1).validate().is_err());
        assert!(worksheet(100_000).validate().is_err());

        let mut ws = worksheet(0);
        ws.line_items.push(item("1", 100, 1));
        assert!(ws.validate().is_err());

        let mut ws = worksheet(0);
        ws.line_items[0].form_count = -1;
        assert!(ws.validate().is_err());

        let mut ws = worksheet(0);
        ws.line_items[0].price_per_form_cents = -100;
        assert!(ws.validate().is_err());
    }

    #[test]
    fn oversized_amounts_are_rejected_not_overflowed() {
        let mut ws = worksheet(0);
        ws.line_items[0].price_per_form_cents = 9_000_000_000_000_000_000;
        ws.line_items[0].form_count = 2;
        assert_matches!(ws.validate(), Err(CoreError::Validation(_)));
        assert_eq!(FeeSummary::compute(&ws).subtotal_cents, Cents::MAX);

        let mut ws = worksheet(0);
        ws.adjustments.additional_fees_cents = MAX_AMOUNT_CENTS + 1;
        assert!(ws.validate().is_err());

        let mut ws = worksheet(0);
        ws.prior_year_fee_cents = Some(i64::MAX);
        assert!(ws.validate().is_err());

        let mut ws = worksheet(i64::MAX);
        assert!(ws.validate().is_err());
        ws.adjustments.discount_cents = 0;
        ws.line_items = (0..=MAX_LINE_ITEMS).map(|i| item(&i.to_string(), 100, 1)).collect();
        assert!(ws.validate().is_err());
    }

    #[test]
    fn largest_valid_worksheet_fits() {
        let ws = FeeWorksheet {
            line_items: (0..MAX_LINE_ITEMS)
                .map(|i| item(&i.to_string(), MAX_AMOUNT_CENTS, MAX_FORM_COUNT))
                .collect(),
            adjustments: Adjustments {
                additional_fees_cents: MAX_AMOUNT_CENTS,
                ..Default::default()
            },
            prior_year_fee_cents: Some(MAX_AMOUNT_CENTS),
        };
        assert!(ws.validate().is_ok());
        assert!(FeeSummary::compute(&ws).total_cents > 0);
    }

    #[test]
    fn seeds_from_engagement_selection() {
        let selected = vec!["payroll".to_string(), "business-return".to_string()];
        let items = line_items_from_services(ClientType::Business, &selected);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "business-return");
        assert_eq!(items[0].price_per_form_cents, 95_000);
        assert_eq!(items[1].id, "payroll");
        let ws = FeeWorksheet {
            line_items: items,
            ..Default::default()
        };
        assert_eq!(FeeSummary::compute(&ws).subtotal_cents, 110_000);
    }
}
