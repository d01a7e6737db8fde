//! Per-client fee schedule row and DTO.

use portal_core::billing::{Adjustments, FeeWorksheet, LineItem};
use portal_core::error::CoreError;
use portal_core::types::{Cents, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `client_fee_schedules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FeeSchedule {
    pub id: DbId,
    pub client_id: DbId,
    pub line_items: serde_json::Value,
    pub adjustments: serde_json::Value,
    pub prior_year_fee_cents: Option<Cents>,
    pub partner_approved: bool,
    pub approved_by: Option<DbId>,
    pub proposal_sent_at: Option<Timestamp>,
    pub invoice_generated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl FeeSchedule {
    pub fn worksheet(&self) -> Result<FeeWorksheet, CoreError> {
        let corrupt = |e: serde_json::Error| {
            CoreError::Internal(format!(
                "Corrupt fee schedule for client {}: {e}",
                self.client_id
            ))
        };
        let line_items: Vec<LineItem> =
            serde_json::from_value(self.line_items.clone()).map_err(corrupt)?;
        let adjustments: Adjustments =
            serde_json::from_value(self.adjustments.clone()).map_err(corrupt)?;
        Ok(FeeWorksheet {
            line_items,
            adjustments,
            prior_year_fee_cents: self.prior_year_fee_cents,
        })
    }
}

/// Worksheet columns written by the fee builder.
#[derive(Debug, Clone)]
pub struct SaveFeeSchedule {
    pub line_items: serde_json::Value,
    pub adjustments: serde_json::Value,
    pub prior_year_fee_cents: Option<Cents>,
}

impl SaveFeeSchedule {
    pub fn from_worksheet(worksheet: &FeeWorksheet) -> Result<Self, CoreError> {
        let encode = |e: serde_json::Error| {
            CoreError::Internal(format!("Failed to encode fee schedule: {e}"))
        };
        Ok(Self {
            line_items: serde_json::to_value(&worksheet.line_items).map_err(encode)?,
            adjustments: serde_json::to_value(&worksheet.adjustments).map_err(encode)?,
            prior_year_fee_cents: worksheet.prior_year_fee_cents,
        })
    }
}
