//! Admin approval gate.
//!
//! Payment proofs are forwarded to the single privileged identity together
//! with a positional approval payload. Every submission registers a pending
//! key; approving consumes it, so re-clicking an approval button after the
//! effect was applied is rejected instead of double-crediting.

use chrono::Local;
use tracing::info;

use matinee_common::error::Result;
use matinee_common::telegram::{CallbackQuery, Transport};

use super::action::ApprovalKind;
use super::flow::{Flow, PaymentKind, MONTHLY_PRICE, PREMIUM_PRICE};
use super::ledger::{AccountStatus, CREATED_FORMAT};
use super::provision::Launcher;
use super::HubContext;

const NOT_ADMIN: &str = "❌ Sizda bu huquq yo'q.";
const ALREADY_APPLIED: &str = "❌ Bu to'lov allaqachon tasdiqlangan yoki topilmadi.";

pub fn pending_key(user_id: i64, payment: &PaymentKind) -> String {
    match payment {
        PaymentKind::BotCreation => format!("bot_creation:{user_id}"),
        PaymentKind::Monthly => format!("monthly_card:{user_id}"),
        PaymentKind::PremiumCard => format!("premium_card:{user_id}"),
        PaymentKind::Deposit { amount } => format!("deposit:{user_id}:{amount}"),
    }
}

/// Called when a proof is submitted. Resubmission while an approval is
/// still pending just refreshes the entry.
pub fn register<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    user_id: i64,
    payment: &PaymentKind,
) {
    let key = pending_key(user_id, payment);
    let issued_at = Local::now().format(CREATED_FORMAT).to_string();
    ctx.approvals.data.insert(key, issued_at);
    ctx.store.save(&mut ctx.approvals);
}

pub async fn approve<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    callback: &CallbackQuery,
    user_id: i64,
    kind: ApprovalKind,
) -> Result<()> {
    if callback.from.id != ctx.settings.admin_id {
        return ctx
            .transport
            .answer_callback_query(&callback.id, Some(NOT_ADMIN), true)
            .await;
    }

    let payment = match kind {
        ApprovalKind::BotCreation => PaymentKind::BotCreation,
        ApprovalKind::PremiumCard => PaymentKind::PremiumCard,
        ApprovalKind::MonthlyCard => PaymentKind::Monthly,
    };
    if !consume(ctx, user_id, &payment) {
        return ctx
            .transport
            .answer_callback_query(&callback.id, Some(ALREADY_APPLIED), true)
            .await;
    }

    ctx.transport
        .answer_callback_query(&callback.id, Some("Tasdiqlash ishlanyapti..."), false)
        .await?;

    match kind {
        ApprovalKind::BotCreation => {
            ctx.transport
                .send_message(
                    user_id,
                    "✅ To'lovingiz tasdiqlandi!\nBot tokenini yuboring. Token `123456:ABCEFGH...` ko'rinishida bo'ladi.\n\n/token buyrug'i bilan yuboring: `/token 123456:ABCEFGH...`",
                    None,
                )
                .await?;
            // The transition happens in the paying user's session, driven
            // by the admin's button press.
            ctx.sessions
                .insert(user_id, Flow::AwaitingToken { rename: None });
            info!(user =% user_id, "bot creation payment approved");
        }
        ApprovalKind::PremiumCard => {
            let mut account = ctx.account(user_id);
            account.status = AccountStatus::Premium;
            account.donations += PREMIUM_PRICE;
            ctx.set_account(user_id, account);
            ctx.transport
                .send_message(
                    user_id,
                    "✅ To'lovingiz tasdiqlandi! Siz endi **Premium** foydalanuvchisiz.",
                    None,
                )
                .await?;
        }
        ApprovalKind::MonthlyCard => {
            let mut account = ctx.account(user_id);
            account.donations += MONTHLY_PRICE;
            ctx.set_account(user_id, account);
            ctx.transport
                .send_message(user_id, "✅ Oylik to'lovingiz muvaffaqiyatli bo'ldi!", None)
                .await?;
        }
    }

    if let Some(message) = &callback.message {
        ctx.transport
            .edit_message_caption(
                message.chat.id,
                message.message_id,
                &format!("✅ To'lov tasdiqlandi. Foydalanuvchi: {user_id}"),
            )
            .await?;
    }
    Ok(())
}

pub async fn approve_deposit<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    callback: &CallbackQuery,
    user_id: i64,
    amount: u64,
) -> Result<()> {
    if callback.from.id != ctx.settings.admin_id {
        return ctx
            .transport
            .answer_callback_query(&callback.id, Some(NOT_ADMIN), true)
            .await;
    }

    let payment = PaymentKind::Deposit { amount };
    if !consume(ctx, user_id, &payment) {
        return ctx
            .transport
            .answer_callback_query(&callback.id, Some(ALREADY_APPLIED), true)
            .await;
    }

    ctx.transport
        .answer_callback_query(&callback.id, Some("Tasdiqlash ishlanyapti..."), false)
        .await?;

    let mut account = ctx.account(user_id);
    account.balance += amount;
    account.donations += amount;
    let balance = account.balance;
    ctx.set_account(user_id, account);
    info!(user =% user_id, amount, "deposit approved");

    ctx.transport
        .send_message(
            user_id,
            &format!(
                "✅ Hisobingiz **{amount} so'm**ga to'ldirildi. Yangi balansingiz: **{balance} so'm**"
            ),
            None,
        )
        .await?;

    if let Some(message) = &callback.message {
        ctx.transport
            .edit_message_caption(
                message.chat.id,
                message.message_id,
                &format!("✅ Hisob to'ldirish tasdiqlandi. Foydalanuvchi: {user_id}"),
            )
            .await?;
    }
    Ok(())
}

/// Removes the pending key. `false` means there was nothing to consume:
/// either the payload was never issued or its effect is already applied.
fn consume<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    user_id: i64,
    payment: &PaymentKind,
) -> bool {
    let key = pending_key(user_id, payment);
    if ctx.approvals.data.remove(&key).is_none() {
        return false;
    }
    ctx.store.save(&mut ctx.approvals);
    true
}
