//! End-to-end hub scenarios driven through the update handlers against a
//! scripted transport.

mod support;

use matinee::hub::flow::Flow;
use matinee::hub::handlers::handle_update;
use matinee::hub::ledger::{Account, AccountStatus};

use support::{callback, first_callback_data, hub_ctx, photo_message, text_message};

const ADMIN: i64 = 800;

/// Runs the deposit wizard up to the forwarded proof and returns the
/// approval payload the admin would press.
async fn submit_deposit(
    ctx: &mut matinee::hub::HubContext<support::MockTransport, support::RecordingLauncher>,
    user_id: i64,
    amount: u64,
) -> String {
    handle_update(ctx, text_message(user_id, "➕ Hisobni to‘ldirish")).await;
    handle_update(ctx, text_message(user_id, &amount.to_string())).await;
    handle_update(ctx, photo_message(user_id)).await;

    let photos = ctx.transport.photos.borrow();
    let photo = photos.last().expect("proof was forwarded to the admin");
    assert_eq!(photo.chat_id, ADMIN);
    first_callback_data(photo.markup.as_ref().expect("approval keyboard"))
        .expect("approval payload")
}

#[tokio::test]
async fn approved_deposit_credits_balance_and_donations() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);

    let payload = submit_deposit(&mut ctx, 555, 25000).await;
    assert_eq!(payload, "admin_approve_deposit:555:25000");

    handle_update(&mut ctx, callback(ADMIN, &payload)).await;

    let account = ctx.account(555);
    assert_eq!(account.balance, 25000);
    assert_eq!(account.donations, 25000);
    assert_eq!(account.status, AccountStatus::Ordinary);
}

#[tokio::test]
async fn reapproving_the_same_payload_does_not_double_credit() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);

    let payload = submit_deposit(&mut ctx, 555, 25000).await;
    handle_update(&mut ctx, callback(ADMIN, &payload)).await;
    handle_update(&mut ctx, callback(ADMIN, &payload)).await;

    let account = ctx.account(555);
    assert_eq!(account.balance, 25000);
    assert_eq!(account.donations, 25000);
    let answer = ctx.transport.last_answer().unwrap_or_default();
    assert!(answer.contains("allaqachon"), "got: {answer}");
}

#[tokio::test]
async fn resubmitted_proof_can_be_approved_again() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);

    let payload = submit_deposit(&mut ctx, 555, 25000).await;
    handle_update(&mut ctx, callback(ADMIN, &payload)).await;

    // A second submission issues a fresh pending approval for the same key.
    let payload = submit_deposit(&mut ctx, 555, 25000).await;
    handle_update(&mut ctx, callback(ADMIN, &payload)).await;

    let account = ctx.account(555);
    assert_eq!(account.balance, 50000);
    assert_eq!(account.donations, 50000);
}

#[tokio::test]
async fn non_admin_cannot_approve() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);

    let payload = submit_deposit(&mut ctx, 555, 25000).await;
    handle_update(&mut ctx, callback(556, &payload)).await;

    let account = ctx.account(555);
    assert_eq!(account.balance, 0);
    assert_eq!(account.donations, 0);
    let answer = ctx.transport.last_answer().unwrap_or_default();
    assert!(answer.contains("huquq"), "got: {answer}");
}

#[tokio::test]
async fn malformed_approval_payload_aborts_without_effect() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);

    handle_update(&mut ctx, callback(ADMIN, "admin_approve_deposit:555:lots")).await;

    assert!(ctx.accounts.data.is_empty());
    let answer = ctx.transport.last_answer().unwrap_or_default();
    assert!(answer.contains("to'liq emas"), "got: {answer}");
}

#[tokio::test]
async fn cancel_returns_to_idle_without_touching_documents() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);

    handle_update(&mut ctx, text_message(555, "➕ Hisobni to‘ldirish")).await;
    handle_update(&mut ctx, text_message(555, "100000")).await;
    handle_update(&mut ctx, text_message(555, "/cancel")).await;

    assert!(ctx.sessions.get(&555).is_none());
    assert!(!dir.path().join("accounts.json").exists());
    assert!(!dir.path().join("approvals.json").exists());
    assert!(ctx.transport.last_text().contains("bekor qilindi"));
}

#[tokio::test]
async fn invalid_deposit_amount_reprompts_without_state_change() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);

    handle_update(&mut ctx, text_message(555, "➕ Hisobni to‘ldirish")).await;
    handle_update(&mut ctx, text_message(555, "ko'p pul")).await;
    assert_eq!(ctx.sessions.get(&555), Some(&Flow::AwaitingDepositAmount));

    handle_update(&mut ctx, text_message(555, "-5")).await;
    assert_eq!(ctx.sessions.get(&555), Some(&Flow::AwaitingDepositAmount));
}

#[tokio::test]
async fn premium_from_balance_requires_sufficient_funds() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);

    ctx.set_account(
        7,
        Account {
            balance: 6000,
            status: AccountStatus::Ordinary,
            donations: 0,
        },
    );
    handle_update(&mut ctx, callback(7, "pay_with_balance")).await;
    let account = ctx.account(7);
    assert_eq!(account.balance, 1000);
    assert_eq!(account.status, AccountStatus::Premium);

    ctx.set_account(
        8,
        Account {
            balance: 4999,
            status: AccountStatus::Ordinary,
            donations: 0,
        },
    );
    handle_update(&mut ctx, callback(8, "pay_with_balance")).await;
    let account = ctx.account(8);
    assert_eq!(account.balance, 4999);
    assert_eq!(account.status, AccountStatus::Ordinary);
    let answer = ctx.transport.last_answer().unwrap_or_default();
    assert!(answer.contains("yetarli emas"), "got: {answer}");
}

#[tokio::test]
async fn bot_creation_approval_opens_the_users_token_step() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);

    handle_update(&mut ctx, text_message(777, "🆕 Bot yaratish")).await;
    handle_update(&mut ctx, callback(777, "i_agree_to_pay")).await;
    handle_update(&mut ctx, photo_message(777)).await;

    let payload = {
        let photos = ctx.transport.photos.borrow();
        first_callback_data(photos.last().unwrap().markup.as_ref().unwrap()).unwrap()
    };
    assert_eq!(payload, "admin_approve:777:bot_creation");

    // The admin's button press transitions the *user's* session.
    handle_update(&mut ctx, callback(ADMIN, &payload)).await;
    assert_eq!(
        ctx.sessions.get(&777),
        Some(&Flow::AwaitingToken { rename: None })
    );
}

#[tokio::test]
async fn provisioning_persists_record_and_launches_runner() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);
    let token = "123456:ABCDEFGHIJKLMNOPQRS";
    ctx.transport.set_identity(token, "myBot");

    ctx.sessions.insert(777, Flow::AwaitingToken { rename: None });
    handle_update(&mut ctx, text_message(777, &format!("/token {token}"))).await;
    assert_eq!(
        ctx.sessions.get(&777),
        Some(&Flow::AwaitingUsername {
            token: Some(token.to_owned()),
            rename: None
        })
    );

    // Claimed username matches the live identity case-insensitively.
    handle_update(&mut ctx, text_message(777, "@MYBOT")).await;

    assert_eq!(ctx.bots.data.len(), 1);
    let record = &ctx.bots.data[0];
    assert_eq!(record.username, "MYBOT");
    assert_eq!(record.owner_id, 777);
    assert!(record.active);
    assert!(dir.path().join("bots.json").exists());
    assert_eq!(
        ctx.registry.launcher().launched,
        vec![(token.to_owned(), "MYBOT".to_owned())]
    );
    assert!(ctx.sessions.get(&777).is_none());
}

#[tokio::test]
async fn provisioning_mismatch_persists_nothing_and_launches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);
    let token = "123456:ABCDEFGHIJKLMNOPQRS";
    ctx.transport.set_identity(token, "myBot");

    ctx.sessions.insert(
        777,
        Flow::AwaitingUsername {
            token: Some(token.to_owned()),
            rename: None,
        },
    );
    handle_update(&mut ctx, text_message(777, "other_bot")).await;

    assert!(ctx.bots.data.is_empty());
    assert!(!dir.path().join("bots.json").exists());
    assert!(ctx.registry.launcher().launched.is_empty());
    // The step stays open for another attempt.
    assert!(matches!(
        ctx.sessions.get(&777),
        Some(Flow::AwaitingUsername { .. })
    ));
    assert!(ctx.transport.last_text().contains("mos kelmadi"));
}

#[tokio::test]
async fn invalid_credential_keeps_the_username_step_open() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);
    // No identity registered: the live check fails.
    ctx.sessions.insert(
        777,
        Flow::AwaitingUsername {
            token: Some("123456:ABCDEFGHIJKLMNOPQRS".to_owned()),
            rename: None,
        },
    );
    handle_update(&mut ctx, text_message(777, "whatever_bot")).await;

    assert!(ctx.bots.data.is_empty());
    assert!(matches!(
        ctx.sessions.get(&777),
        Some(Flow::AwaitingUsername { .. })
    ));
}

#[tokio::test]
async fn syntactically_bad_token_is_rejected_inline() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);

    ctx.sessions.insert(777, Flow::AwaitingToken { rename: None });
    handle_update(&mut ctx, text_message(777, "/token short")).await;
    assert_eq!(
        ctx.sessions.get(&777),
        Some(&Flow::AwaitingToken { rename: None })
    );
    assert!(ctx.transport.last_text().contains("Noto'g'ri token"));
}

#[tokio::test]
async fn subscription_gate_blocks_start_until_membership_confirmed() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);
    ctx.channels.data.push("-100111".to_owned());
    ctx.channels.data.push("-100222".to_owned());

    ctx.transport.set_member("-100111", 5, "member");
    // -100222 defaults to "left".
    handle_update(&mut ctx, text_message(5, "/start")).await;
    assert!(ctx.transport.last_text().contains("obuna bo'ling"));

    ctx.transport.set_member("-100222", 5, "member");
    handle_update(&mut ctx, text_message(5, "/start")).await;
    assert!(ctx.transport.last_text().contains("xush kelibsiz"));
}

#[tokio::test]
async fn gate_fails_closed_on_transport_errors() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);
    ctx.channels.data.push("-100111".to_owned());
    ctx.transport.set_member("-100111", 5, "member");
    ctx.transport.fail_member_checks("-100111");

    handle_update(&mut ctx, text_message(5, "/start")).await;
    assert!(ctx.transport.last_text().contains("obuna bo'ling"));
}

#[tokio::test]
async fn toggling_a_bot_flips_the_active_flag() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = hub_ctx(&dir, ADMIN);
    let token = "123456:ABCDEFGHIJKLMNOPQRS";
    ctx.transport.set_identity(token, "myBot");
    ctx.sessions.insert(
        777,
        Flow::AwaitingUsername {
            token: Some(token.to_owned()),
            rename: None,
        },
    );
    handle_update(&mut ctx, text_message(777, "myBot")).await;
    assert!(ctx.bots.data[0].active);

    handle_update(&mut ctx, callback(ADMIN, "toggle_bot_myBot")).await;
    assert!(!ctx.bots.data[0].active);

    // Non-admins are rejected.
    handle_update(&mut ctx, callback(777, "toggle_bot_myBot")).await;
    assert!(!ctx.bots.data[0].active);
}
