//! Integration tests for the repository layer against a real database:
//! - Owner-scoped client visibility
//! - Onboarding session persistence and response upserts
//! - Cascade delete behaviour
//! - Unique constraint violations

use portal_core::billing::{FeeWorksheet, LineItem};
use portal_core::client::ClientType;
use portal_core::engagement::PaymentMethod;
use portal_core::onboarding::{BusinessInfo, OnboardingStatus, TrustInfo, WizardState};
use portal_db::models::client::{CreateClient, UpdateClient};
use portal_db::models::document::CreateDocument;
use portal_db::models::fee_schedule::SaveFeeSchedule;
use portal_db::models::message::CreateMessage;
use portal_db::models::onboarding::{SaveOnboardingSession, UpsertOnboardingResponse};
use portal_db::models::session::CreateSession;
use portal_db::models::task::{CreateTask, UpdateTask};
use portal_db::models::user::CreateUser;
use portal_db::repositories::client_repo::ClientListFilter;
use portal_db::repositories::{
    ClientRepo, DocumentRepo, FeeScheduleRepo, MessageRepo, OnboardingResponseRepo,
    OnboardingSessionRepo, RoleRepo, SessionRepo, SettingsRepo, SetupChecklistRepo, TaskRepo,
    UserRepo,
};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, email: &str) -> i64 {
    let role = RoleRepo::find_by_name(pool, "staff").await.unwrap().unwrap();
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            display_name: "Staff Member".to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role_id: role.id,
        },
    )
    .await
    .unwrap()
    .id
}

fn new_client(name: &str, created_by: Option<i64>) -> CreateClient {
    CreateClient {
        name: name.to_string(),
        client_type: "business".to_string(),
        assigned_to: None,
        created_by,
    }
}

fn all_clients() -> ClientListFilter {
    ClientListFilter {
        status: None,
        search: None,
        limit: 100,
        offset: 0,
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn user_email_is_case_insensitive_and_unique(pool: PgPool) {
    let id = new_user(&pool, "Alex@Example.com").await;

    let found = UserRepo::find_by_email(&pool, "ALEX@example.COM")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.email, "alex@example.com");

    let role = RoleRepo::find_by_name(&pool, "admin").await.unwrap().unwrap();
    let dup = UserRepo::create(
        &pool,
        &CreateUser {
            email: "alex@example.com".to_string(),
            display_name: "Other".to_string(),
            password_hash: "x".to_string(),
            role_id: role.id,
        },
    )
    .await;
    assert!(dup.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_logins_count_up_and_reset(pool: PgPool) {
    let id = new_user(&pool, "lock@example.com").await;
    assert_eq!(UserRepo::increment_failed_login(&pool, id).await.unwrap(), 1);
    assert_eq!(UserRepo::increment_failed_login(&pool, id).await.unwrap(), 2);

    UserRepo::lock_account(&pool, id, chrono::Utc::now()).await.unwrap();
    UserRepo::record_successful_login(&pool, id).await.unwrap();

    let user = UserRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(user.failed_login_count, 0);
    assert!(user.locked_until.is_none());
    assert!(user.last_login_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_tokens_are_single_use(pool: PgPool) {
    let id = new_user(&pool, "rotate@example.com").await;
    let session = |hash: &str, expires_in: i64| CreateSession {
        user_id: id,
        refresh_token_hash: hash.to_string(),
        expires_at: chrono::Utc::now() + chrono::Duration::minutes(expires_in),
        user_agent: None,
        ip_address: None,
    };
    SessionRepo::create(&pool, &session("live", 60)).await.unwrap();
    SessionRepo::create(&pool, &session("stale", -1)).await.unwrap();

    let consumed = SessionRepo::consume_refresh_token(&pool, "live").await.unwrap().unwrap();
    assert_eq!(consumed.user_id, id);
    assert!(consumed.is_revoked);
    assert!(SessionRepo::consume_refresh_token(&pool, "live").await.unwrap().is_none());
    assert!(SessionRepo::consume_refresh_token(&pool, "stale").await.unwrap().is_none());

    SessionRepo::create(&pool, &session("a", 60)).await.unwrap();
    SessionRepo::create(&pool, &session("b", 60)).await.unwrap();
    assert_eq!(SessionRepo::revoke_all_for_user(&pool, id).await.unwrap(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn role_names_resolve(pool: PgPool) {
    let staff = RoleRepo::find_by_name(&pool, "staff").await.unwrap().unwrap();
    assert_eq!(RoleRepo::resolve_name(&pool, staff.id).await.unwrap(), "staff");
    assert_eq!(RoleRepo::resolve_name(&pool, -1).await.unwrap(), "unknown");
    assert!(RoleRepo::find_by_name(&pool, "Admin").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn clients_are_scoped_to_owner_and_intake(pool: PgPool) {
    let alice = new_user(&pool, "alice@example.com").await;
    let bob = new_user(&pool, "bob@example.com").await;

    let mine = ClientRepo::create(&pool, &new_client("Acme LLC", Some(alice)))
        .await
        .unwrap();
    let intake = ClientRepo::create(&pool, &new_client("Walk-in Co", None))
        .await
        .unwrap();
    let theirs = ClientRepo::create(&pool, &new_client("Bob's Bakery", Some(bob)))
        .await
        .unwrap();

    assert_eq!(mine.status, "new");
    assert_eq!(mine.setup_progress, 0);

    let visible = ClientRepo::list_visible(&pool, alice, &all_clients())
        .await
        .unwrap();
    let ids: Vec<i64> = visible.iter().map(|c| c.id).collect();
    assert!(ids.contains(&mine.id));
    assert!(ids.contains(&intake.id));
    assert!(!ids.contains(&theirs.id));

    assert!(ClientRepo::find_visible(&pool, alice, theirs.id)
        .await
        .unwrap()
        .is_none());
    let update = UpdateClient {
        name: Some("Hijacked".to_string()),
        ..Default::default()
    };
    assert!(ClientRepo::update_visible(&pool, alice, theirs.id, &update)
        .await
        .unwrap()
        .is_none());
    assert!(!ClientRepo::delete_visible(&pool, alice, theirs.id)
        .await
        .unwrap());
    assert!(ClientRepo::find_by_id(&pool, theirs.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn client_list_filters_by_status_and_search(pool: PgPool) {
    let owner = new_user(&pool, "owner@example.com").await;
    let acme = ClientRepo::create(&pool, &new_client("Acme Holdings", Some(owner)))
        .await
        .unwrap();
    ClientRepo::create(&pool, &new_client("Zenith Partners", Some(owner)))
        .await
        .unwrap();
    ClientRepo::set_status(&pool, acme.id, "ready").await.unwrap();

    let by_search = ClientRepo::list_visible(
        &pool,
        owner,
        &ClientListFilter {
            search: Some("hold".to_string()),
            ..all_clients()
        },
    )
    .await
    .unwrap();
    assert_eq!(by_search.len(), 1);
    assert_eq!(by_search[0].id, acme.id);

    let by_status = ClientRepo::list_visible(
        &pool,
        owner,
        &ClientListFilter {
            status: Some("new".to_string()),
            ..all_clients()
        },
    )
    .await
    .unwrap();
    assert_eq!(by_status.len(), 1);
    assert_eq!(by_status[0].name, "Zenith Partners");

    let counts = ClientRepo::status_counts_visible(&pool, owner).await.unwrap();
    let total: i64 = counts.iter().map(|c| c.count).sum();
    assert_eq!(total, 2);
    assert!(counts.iter().any(|c| c.status == "ready" && c.count == 1));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn client_update_applies_only_present_fields(pool: PgPool) {
    let owner = new_user(&pool, "owner@example.com").await;
    let client = ClientRepo::create(&pool, &new_client("Acme", Some(owner)))
        .await
        .unwrap();

    let updated = ClientRepo::update_visible(
        &pool,
        owner,
        client.id,
        &UpdateClient {
            assigned_to: Some("Jordan".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.name, "Acme");
    assert_eq!(updated.assigned_to.as_deref(), Some("Jordan"));

    let onboarded = ClientRepo::mark_onboarded(&pool, client.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(onboarded.status, "in_progress");
    assert!(onboarded.onboarded_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_client_cascades(pool: PgPool) {
    let owner = new_user(&pool, "owner@example.com").await;
    let client = ClientRepo::create(&pool, &new_client("Acme", Some(owner)))
        .await
        .unwrap();

    DocumentRepo::create(
        &pool,
        &CreateDocument {
            client_id: client.id,
            document_type: "business-returns".to_string(),
            document_category: "business".to_string(),
            file_name: "2023.pdf".to_string(),
            file_path: format!("{}/business-returns-1.pdf", client.id),
            file_size: 1024,
            file_type: "pdf".to_string(),
            is_required: true,
        },
    )
    .await
    .unwrap();
    TaskRepo::create(
        &pool,
        client.id,
        &CreateTask {
            title: "Upload W-2".to_string(),
            description: String::new(),
            due_date: None,
            priority: None,
            requested_by: "Staff".to_string(),
        },
    )
    .await
    .unwrap();

    assert!(ClientRepo::delete_visible(&pool, owner, client.id).await.unwrap());
    assert!(DocumentRepo::list_by_client(&pool, client.id)
        .await
        .unwrap()
        .is_empty());
    assert!(TaskRepo::list_by_client(&pool, client.id)
        .await
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// Onboarding
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn onboarding_session_round_trips_wizard_state(pool: PgPool) {
    let token = Uuid::new_v4();
    let session = OnboardingSessionRepo::create(&pool, token).await.unwrap();
    assert_eq!(session.current_step, 1);
    let state = session.wizard_state().unwrap();
    assert_eq!(state, WizardState::default());

    let mut state = state;
    state.select_client_type(ClientType::Trust).unwrap();
    state.data.contact_info.name = "Pat Smith".to_string();

    let saved = OnboardingSessionRepo::save(
        &pool,
        session.id,
        &SaveOnboardingSession::from_state(None, &state).unwrap(),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(saved.current_step, 2);
    assert!(saved.completed_at.is_none());

    let reloaded = OnboardingSessionRepo::find_by_token(&pool, token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.wizard_state().unwrap(), state);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn session_links_a_single_client(pool: PgPool) {
    let session = OnboardingSessionRepo::create(&pool, Uuid::new_v4())
        .await
        .unwrap();

    let acme = new_client("Acme", None);

    let (first, created) = OnboardingSessionRepo::link_new_client(&pool, session.id, &acme)
        .await
        .unwrap()
        .unwrap();
    assert!(created);
    let (second, created) = OnboardingSessionRepo::link_new_client(&pool, session.id, &acme)
        .await
        .unwrap()
        .unwrap();
    assert!(!created);
    assert_eq!(first, second);

    // A stale save without the link keeps it.
    let state = session.wizard_state().unwrap();
    let saved = OnboardingSessionRepo::save(
        &pool,
        session.id,
        &SaveOnboardingSession::from_state(None, &state).unwrap(),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(saved.client_id, Some(first));

    let clients = ClientRepo::list_visible(&pool, 0, &all_clients()).await.unwrap();
    assert_eq!(clients.len(), 1);

    let missing = OnboardingSessionRepo::link_new_client(&pool, session.id + 1_000, &acme)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completed_session_is_stamped(pool: PgPool) {
    let session = OnboardingSessionRepo::create(&pool, Uuid::new_v4())
        .await
        .unwrap();
    let mut state = session.wizard_state().unwrap();
    state.current_step = 6;
    state.complete().unwrap();
    assert_eq!(state.status, OnboardingStatus::Completed);

    let saved = OnboardingSessionRepo::save(
        &pool,
        session.id,
        &SaveOnboardingSession::from_state(None, &state).unwrap(),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(saved.status, "completed");
    assert!(saved.completed_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn onboarding_response_upsert_is_idempotent(pool: PgPool) {
    let client = ClientRepo::create(&pool, &new_client("Acme", None))
        .await
        .unwrap();

    let mut state = WizardState::default();
    state.data.client_type = Some(ClientType::Business);
    state.data.contact_info.name = "Pat".to_string();
    state.data.business_info = Some(BusinessInfo {
        entity_type: "llc".to_string(),
        ..Default::default()
    });
    // Answers for another client type are not carried into the row.
    state.data.trust_info = Some(TrustInfo::default());
    state.data.payment_method = Some(PaymentMethod::from_number("card", "4242 4242 4242 4242").unwrap());

    let input = UpsertOnboardingResponse::from_state(client.id, &state).unwrap();
    let first = OnboardingResponseRepo::upsert(&pool, &input).await.unwrap();
    let second = OnboardingResponseRepo::upsert(&pool, &input).await.unwrap();
    assert_eq!(first.id, second.id);
    assert!(second.business_info.is_some());
    assert!(second.trust_info.is_none());
    assert_eq!(second.payment_method_type.as_deref(), Some("card"));
    assert_eq!(second.payment_last4.as_deref(), Some("4242"));

    state.data.contact_info.name = "Pat Jones".to_string();
    let input = UpsertOnboardingResponse::from_state(client.id, &state).unwrap();
    OnboardingResponseRepo::upsert(&pool, &input).await.unwrap();

    let stored = OnboardingResponseRepo::find_by_client(&pool, client.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.contact_name, "Pat Jones");
    let rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM onboarding_responses")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows.0, 1);
}

// ---------------------------------------------------------------------------
// Settings, setup, billing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn settings_upsert_replaces_value(pool: PgPool) {
    let user = new_user(&pool, "admin@example.com").await;
    assert!(SettingsRepo::get(&pool, "app:settings").await.unwrap().is_none());

    SettingsRepo::upsert(&pool, "app:settings", &serde_json::json!({"company_name": "A"}), user)
        .await
        .unwrap();
    let row = SettingsRepo::upsert(
        &pool,
        "app:settings",
        &serde_json::json!({"company_name": "B"}),
        user,
    )
    .await
    .unwrap();
    assert_eq!(row.value["company_name"], "B");
    assert_eq!(row.updated_by, Some(user));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn setup_checklist_upsert(pool: PgPool) {
    let client = ClientRepo::create(&pool, &new_client("Acme", None))
        .await
        .unwrap();
    assert!(SetupChecklistRepo::find_by_client(&pool, client.id)
        .await
        .unwrap()
        .is_none());

    SetupChecklistRepo::upsert(&pool, client.id, &serde_json::json!({"steps": []}), None)
        .await
        .unwrap();
    let row = SetupChecklistRepo::upsert(&pool, client.id, &serde_json::json!({"steps": [1]}), None)
        .await
        .unwrap();
    assert_eq!(row.steps["steps"][0], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn fee_schedule_lifecycle(pool: PgPool) {
    let approver = new_user(&pool, "partner@example.com").await;
    let client = ClientRepo::create(&pool, &new_client("Acme", None))
        .await
        .unwrap();

    let worksheet = FeeWorksheet {
        line_items: vec![LineItem {
            id: "business-return".to_string(),
            name: "Business Tax Return".to_string(),
            price_per_form_cents: 95_000,
            form_count: 1,
            complexity: Default::default(),
        }],
        ..Default::default()
    };
    let save = SaveFeeSchedule::from_worksheet(&worksheet).unwrap();

    let created = FeeScheduleRepo::create_if_absent(&pool, client.id, &save)
        .await
        .unwrap();
    assert!(created.is_some());
    assert!(FeeScheduleRepo::create_if_absent(&pool, client.id, &save)
        .await
        .unwrap()
        .is_none());

    let approved = FeeScheduleRepo::set_approval(&pool, client.id, true, Some(approver))
        .await
        .unwrap()
        .unwrap();
    assert!(approved.partner_approved);

    // Saving the same worksheet keeps the approval.
    let saved = FeeScheduleRepo::upsert(&pool, client.id, &save).await.unwrap();
    assert!(saved.partner_approved);
    assert_eq!(saved.approved_by, Some(approver));
    assert_eq!(saved.worksheet().unwrap(), worksheet);

    // Changed figures withdraw it.
    let mut discounted = worksheet.clone();
    discounted.adjustments.discount_cents = 50_000;
    let changed = FeeScheduleRepo::upsert(
        &pool,
        client.id,
        &SaveFeeSchedule::from_worksheet(&discounted).unwrap(),
    )
    .await
    .unwrap();
    assert!(!changed.partner_approved);
    assert_eq!(changed.approved_by, None);

    let sent = FeeScheduleRepo::mark_proposal_sent(&pool, client.id)
        .await
        .unwrap()
        .unwrap();
    assert!(sent.proposal_sent_at.is_some());
    let invoiced = FeeScheduleRepo::mark_invoice_generated(&pool, client.id)
        .await
        .unwrap()
        .unwrap();
    assert!(invoiced.invoice_generated_at.is_some());
}

// ---------------------------------------------------------------------------
// Portal
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn tasks_are_keyed_by_client(pool: PgPool) {
    let a = ClientRepo::create(&pool, &new_client("A", None)).await.unwrap();
    let b = ClientRepo::create(&pool, &new_client("B", None)).await.unwrap();

    let task = TaskRepo::create(
        &pool,
        a.id,
        &CreateTask {
            title: "Sign organizer".to_string(),
            description: String::new(),
            due_date: chrono::NaiveDate::from_ymd_opt(2026, 4, 15),
            priority: Some("high".to_string()),
            requested_by: "Staff".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(task.status, "pending");
    assert_eq!(task.priority, "high");

    assert!(TaskRepo::complete(&pool, b.id, task.id).await.unwrap().is_none());

    let done = TaskRepo::complete(&pool, a.id, task.id).await.unwrap().unwrap();
    assert_eq!(done.status, "complete");
    assert!(done.completed_at.is_some());

    let reopened = TaskRepo::update(
        &pool,
        a.id,
        task.id,
        &UpdateTask {
            status: Some("pending".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert!(reopened.completed_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn messages_mark_read_once(pool: PgPool) {
    let client = ClientRepo::create(&pool, &new_client("A", None)).await.unwrap();
    let msg = MessageRepo::create(
        &pool,
        &CreateMessage {
            client_id: client.id,
            sender: "staff".to_string(),
            sender_name: "Jordan".to_string(),
            body: "Welcome aboard".to_string(),
        },
    )
    .await
    .unwrap();
    assert!(msg.read_at.is_none());

    let first = MessageRepo::mark_read(&pool, client.id, msg.id)
        .await
        .unwrap()
        .unwrap();
    let second = MessageRepo::mark_read(&pool, client.id, msg.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.read_at, second.read_at);
    assert_eq!(MessageRepo::list_by_client(&pool, client.id).await.unwrap().len(), 1);
}
