//! Repository for the `onboarding_responses` table.

use portal_core::types::DbId;
use sqlx::PgPool;

use crate::models::onboarding::{OnboardingResponse, UpsertOnboardingResponse};

const COLUMNS: &str = "id, client_id, contact_name, email, phone, address, filing_status, \
                        preferred_contact, referral_source, delinquent_returns, irs_notices, \
                        bankruptcies, prior_accountant_issues, business_info, trust_info, \
                        nonprofit_info, documents, poa_granted, engagement_signed, \
                        payment_method_type, payment_last4, selected_services, \
                        estimated_fee_cents, completed_step, created_at, updated_at";

/// Aggregated wizard answers, one row per client.
pub struct OnboardingResponseRepo;

impl OnboardingResponseRepo {
    /// Insert or fully replace the answers for `input.client_id`.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertOnboardingResponse,
    ) -> Result<OnboardingResponse, sqlx::Error> {
        let query = format!(
            "INSERT INTO onboarding_responses (
                client_id, contact_name, email, phone, address, filing_status,
                preferred_contact, referral_source, delinquent_returns, irs_notices,
                bankruptcies, prior_accountant_issues, business_info, trust_info,
                nonprofit_info, documents, poa_granted, engagement_signed,
                payment_method_type, payment_last4, selected_services,
                estimated_fee_cents, completed_step
             ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23
             )
             ON CONFLICT (client_id) DO UPDATE SET
                contact_name = EXCLUDED.contact_name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                address = EXCLUDED.address,
                filing_status = EXCLUDED.filing_status,
                preferred_contact = EXCLUDED.preferred_contact,
                referral_source = EXCLUDED.referral_source,
                delinquent_returns = EXCLUDED.delinquent_returns,
                irs_notices = EXCLUDED.irs_notices,
                bankruptcies = EXCLUDED.bankruptcies,
                prior_accountant_issues = EXCLUDED.prior_accountant_issues,
                business_info = EXCLUDED.business_info,
                trust_info = EXCLUDED.trust_info,
                nonprofit_info = EXCLUDED.nonprofit_info,
                documents = EXCLUDED.documents,
                poa_granted = EXCLUDED.poa_granted,
                engagement_signed = EXCLUDED.engagement_signed,
                payment_method_type = EXCLUDED.payment_method_type,
                payment_last4 = EXCLUDED.payment_last4,
                selected_services = EXCLUDED.selected_services,
                estimated_fee_cents = EXCLUDED.estimated_fee_cents,
                completed_step = EXCLUDED.completed_step
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OnboardingResponse>(&query)
            .bind(input.client_id)
            .bind(&input.contact_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.filing_status)
            .bind(&input.preferred_contact)
            .bind(&input.referral_source)
            .bind(input.delinquent_returns)
            .bind(input.irs_notices)
            .bind(input.bankruptcies)
            .bind(&input.prior_accountant_issues)
            .bind(&input.business_info)
            .bind(&input.trust_info)
            .bind(&input.nonprofit_info)
            .bind(&input.documents)
            .bind(input.poa_granted)
            .bind(input.engagement_signed)
            .bind(&input.payment_method_type)
            .bind(&input.payment_last4)
            .bind(&input.selected_services)
            .bind(input.estimated_fee_cents)
            .bind(input.completed_step)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_client(
        pool: &PgPool,
        client_id: DbId,
    ) -> Result<Option<OnboardingResponse>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM onboarding_responses WHERE client_id = $1");
        sqlx::query_as::<_, OnboardingResponse>(&query)
            .bind(client_id)
            .fetch_optional(pool)
            .await
    }
}
