// Matinee
// Copyright (C) 2025 Throneless Tech

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Hub update handlers.
//!
//! Each inbound update is classified by the sender's current wizard state
//! first, then by exact command/label match. Every handler is an isolated
//! failure boundary: an error is logged and turned into an apology, never a
//! crash of the event loop, and never a rollback of mutations already made.

use tracing::{error, info, warn};

use matinee_common::error::Result;
use matinee_common::telegram::{CallbackQuery, Message, Transport, Update};

use crate::gate;

use super::action::CallbackAction;
use super::approval;
use super::flow::{Flow, PaymentKind, MONTHLY_PRICE, PREMIUM_PRICE};
use super::keyboards;
use super::ledger::{AccountStatus, BotRecord};
use super::provision::{self, Launcher, ProvisionError};
use super::HubContext;

const APOLOGY: &str = "❌ Xatolik yuz berdi. Iltimos, qayta urining.";
const NOT_ADMIN: &str = "Siz admin emassiz.";
const NOT_ADMIN_ALERT: &str = "❌ Sizda bu huquq yo'q.";
const UNKNOWN_COMMAND: &str = "Tushunarsiz buyruq. Iltimos, menyudan foydalaning.";
const CHECK_LABEL: &str = "✅ Obunani tasdiqlash";
const TERMS: &str =
    "Bot ochish 30 000 soʻm, oylik toʻlov 20 000 soʻm. Siz rozi bo'lsangiz, davom etamiz.";
const SEND_SCREENSHOT: &str =
    "Iltimos, toʻlov chekining skrinshotini yuboring. Adminlar tez orada tekshirib chiqadi.";
const NO_BOTS: &str = "Sizda hozircha hech qanday bot yo'q.";

const MANUAL: &str = "**Bot qoʻllanmasi**\n\
Bu bot sizga shaxsiy botingizni yaratish va boshqarish imkonini beradi.\n\n\
**▶️ Bot yaratish:** toʻlovdan boshlanadi. Toʻlov tasdiqlangach, BotFather tokenini \
(`/token 123456:ABC...`) va botingizning username'ini yuborasiz. Maʼlumotlar qabul \
qilingandan soʻng botingiz tizimda ishga tushiriladi.\n\n\
**▶️ Hisobni toʻldirish:** toʻlovni amalga oshirib, skrinshotni yuborasiz. Admin \
tasdiqlagach, mablagʻ balansingizga qoʻshiladi.\n\n\
**▶️ Kabinet:** balansingiz, toʻlovlaringiz va Premium maqomingiz shu yerda.\n\n\
**▶️ Yangi botni boshqarish:** yangi bot yaralgach unga `/start` yuboring. Admin \
panelga `/admin` orqali kirasiz. Kinolar \"🎬 Kino qo'shish\" tugmasi bilan, obuna \
kanallari \"📢 Kanal qo'shish\" tugmasi bilan qoʻshiladi.";

pub async fn handle_update<T: Transport, L: Launcher>(ctx: &mut HubContext<T, L>, update: Update) {
    let chat = update.chat_id();
    if let Err(err) = dispatch(ctx, update).await {
        error!(error =% err, "hub handler failed");
        if let Some(chat) = chat
            && let Err(err) = ctx.transport.send_message(chat, APOLOGY, None).await
        {
            warn!(error =% err, "failed to deliver failure notice");
        }
    }
}

async fn dispatch<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    update: Update,
) -> Result<()> {
    if let Some(message) = update.message {
        return handle_message(ctx, message).await;
    }
    if let Some(callback) = update.callback_query {
        return handle_callback(ctx, callback).await;
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// MESSAGES
////////////////////////////////////////////////////////////////////////////////

async fn handle_message<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    message: Message,
) -> Result<()> {
    let Some(from) = message.from.clone() else {
        return Ok(());
    };
    let chat = message.chat.id;
    let text = message.text.clone().unwrap_or_default();

    // Unconditional escape hatch, from any workflow state.
    if text.trim() == "/cancel" {
        ctx.sessions.remove(&from.id);
        return ctx
            .transport
            .send_message(
                chat,
                "✅ Amal bekor qilindi. Bosh menyuga qaytdingiz.",
                Some(keyboards::main_menu().into()),
            )
            .await;
    }

    if let Some(step) = ctx.sessions.get(&from.id).cloned() {
        return match step {
            Flow::AwaitingDepositAmount => process_deposit_amount(ctx, chat, from.id, &text).await,
            Flow::AwaitingProof { payment } => process_proof(ctx, &message, payment).await,
            Flow::AwaitingToken { rename } => process_token(ctx, chat, from.id, &text, rename).await,
            Flow::AwaitingUsername { token, rename } => {
                process_username(ctx, chat, from.id, &text, token, rename).await
            }
            Flow::AwaitingChannelId => process_new_channel(ctx, chat, from.id, &text).await,
        };
    }

    match text.as_str() {
        "/start" => start(ctx, chat, from.id).await,
        "/admin" => {
            if !ctx.is_admin(from.id) {
                return ctx.transport.send_message(chat, NOT_ADMIN, None).await;
            }
            ctx.transport
                .send_message(chat, "Admin paneli:", Some(keyboards::admin_main().into()))
                .await
        }
        "🆕 Bot yaratish" => {
            ctx.transport
                .send_message(chat, TERMS, Some(keyboards::i_agree().into()))
                .await
        }
        "⚙️ Bot sozlash" => list_user_bots(ctx, chat, from.id).await,
        "🤖 Botlarni boshqarish" => {
            ctx.transport
                .send_message(
                    chat,
                    "Botlarni boshqarish bo'limiga xush kelibsiz.",
                    Some(keyboards::manage_bot_menu().into()),
                )
                .await
        }
        "👤 Kabinet" => cabinet(ctx, chat, from.id).await,
        "➕ Hisobni to‘ldirish" => {
            ctx.sessions.insert(from.id, Flow::AwaitingDepositAmount);
            ctx.transport
                .send_message(
                    chat,
                    "Qancha miqdorda hisobni to'ldirmoqchisiz? (Yoki `/cancel` bilan bekor qiling)",
                    None,
                )
                .await
        }
        "📖 Qo‘llanma" => ctx.transport.send_message(chat, MANUAL, None).await,
        "🆘 Yordam" => {
            let keyboard = keyboards::admin_contact(ctx.settings.admin_id);
            ctx.transport
                .send_message(
                    chat,
                    "Yordam bo'limiga xush kelibsiz!\n\n\
                     Agar bot funksiyalari bo'yicha savollaringiz bo'lsa, **Qo‘llanma** \
                     bo'limini o'qing.\n\n\
                     Agar botda xato yuz bergan bo'lsa, quyidagi tugma orqali adminga \
                     murojaat qiling:",
                    Some(keyboard.into()),
                )
                .await
        }
        "🔙 Ortga qaytish" => {
            ctx.transport
                .send_message(chat, "Bosh menyuga qaytish.", Some(keyboards::main_menu().into()))
                .await
        }
        "📢 Kanal qo'shish" => {
            if !ctx.is_admin(from.id) {
                return ctx.transport.send_message(chat, NOT_ADMIN, None).await;
            }
            ctx.sessions.insert(from.id, Flow::AwaitingChannelId);
            ctx.transport
                .send_message(
                    chat,
                    "Iltimos, qo'shmoqchi bo'lgan kanal ID'sini yuboring. \nMasalan: `-100123456789`",
                    None,
                )
                .await
        }
        "🤖 Botlar ro'yxati" => {
            if !ctx.is_admin(from.id) {
                return ctx.transport.send_message(chat, NOT_ADMIN, None).await;
            }
            let keyboard =
                keyboards::admin_bot_list(&ctx.bots.data, |username| ctx.creation_time(username));
            ctx.transport
                .send_message(chat, "Botlar ro'yxati:", Some(keyboard.into()))
                .await
        }
        "❌ Tugmalarni yopish" => {
            if !ctx.is_admin(from.id) {
                return ctx.transport.send_message(chat, NOT_ADMIN, None).await;
            }
            ctx.transport
                .send_message(chat, "Admin paneli yopildi.", Some(keyboards::main_menu().into()))
                .await
        }
        _ => ctx.transport.send_message(chat, UNKNOWN_COMMAND, None).await,
    }
}

async fn start<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    chat: i64,
    user_id: i64,
) -> Result<()> {
    ctx.sessions.remove(&user_id);

    let channels = ctx.channels.data.clone();
    if !channels.is_empty() {
        let missing = gate::unsubscribed(&ctx.transport, &channels, user_id).await;
        if !missing.is_empty() {
            let keyboard = gate::join_keyboard(&ctx.transport, &missing, CHECK_LABEL).await;
            return ctx
                .transport
                .send_message(
                    chat,
                    "Botdan foydalanish uchun quyidagi kanallarga obuna bo'ling:",
                    Some(keyboard.into()),
                )
                .await;
        }
    }

    ctx.transport
        .send_message(
            chat,
            "Assalomu alaykum! Bosh menyuga xush kelibsiz.",
            Some(keyboards::main_menu().into()),
        )
        .await
}

async fn cabinet<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    chat: i64,
    user_id: i64,
) -> Result<()> {
    ctx.sessions.remove(&user_id);
    let account = ctx.account(user_id);
    let text = format!(
        "🔎 UID: `{user_id}`\n\
         ├─💵 Balansingiz: `{}` so'm\n\
         ├─👑 Statusingiz: `{}`\n\
         └─➕ Kiritgan pullaringiz: `{}` so'm",
        account.balance, account.status, account.donations
    );
    ctx.transport
        .send_message(chat, &text, Some(keyboards::cabinet().into()))
        .await
}

async fn list_user_bots<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    chat: i64,
    user_id: i64,
) -> Result<()> {
    let user_bots: Vec<&BotRecord> = ctx
        .bots
        .data
        .iter()
        .filter(|record| record.owner_id == user_id)
        .collect();
    if user_bots.is_empty() {
        return ctx.transport.send_message(chat, NO_BOTS, None).await;
    }
    let keyboard = keyboards::user_bots(&user_bots, |username| ctx.creation_time(username));
    ctx.transport
        .send_message(chat, "Sizning botlaringiz:", Some(keyboard.into()))
        .await
}

async fn process_deposit_amount<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    chat: i64,
    user_id: i64,
    text: &str,
) -> Result<()> {
    match text.trim().parse::<i64>() {
        Ok(amount) if amount > 0 => {
            let amount = amount as u64;
            ctx.sessions.insert(
                user_id,
                Flow::AwaitingProof {
                    payment: PaymentKind::Deposit { amount },
                },
            );
            let text = format!(
                "Siz {amount} so'm miqdorida hisobni to'ldirmoqchisiz.\n\n{}",
                card_details(ctx)
            );
            ctx.transport
                .send_message(chat, &text, Some(keyboards::deposit_card().into()))
                .await
        }
        Ok(_) => {
            ctx.transport
                .send_message(chat, "Noto'g'ri miqdor. Iltimos, musbat son kiriting.", None)
                .await
        }
        Err(_) => {
            ctx.transport
                .send_message(
                    chat,
                    "Noto'g'ri format. Iltimos, faqat raqam kiriting yoki `/cancel` bilan bekor qiling.",
                    None,
                )
                .await
        }
    }
}

async fn process_proof<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    message: &Message,
    payment: PaymentKind,
) -> Result<()> {
    let Some(from) = message.from.clone() else {
        return Ok(());
    };
    let chat = message.chat.id;
    let Some(photo) = message
        .photo
        .as_ref()
        .and_then(|sizes| sizes.last().cloned())
    else {
        return ctx
            .transport
            .send_message(chat, "❌ Iltimos, faqat rasm yuboring.", None)
            .await;
    };

    let amount = payment.amount();
    let (caption, callback_data) = match payment {
        PaymentKind::BotCreation => (
            format!(
                "👨‍💻 Yangi bot yaratish to'lovi: {} ({})\nMiqdor: {amount} so'm",
                from.full_name(),
                from.id
            ),
            format!("admin_approve:{}:bot_creation", from.id),
        ),
        PaymentKind::Monthly => (
            format!(
                "👨‍💻 Oylik to'lov: {} ({})\nMiqdor: {amount} so'm",
                from.full_name(),
                from.id
            ),
            format!("admin_approve:{}:monthly_card", from.id),
        ),
        PaymentKind::PremiumCard => (
            format!(
                "👨‍💻 Premium obuna to'lovi: {} ({})\nMiqdor: {amount} so'm",
                from.full_name(),
                from.id
            ),
            format!("admin_approve:{}:premium_card", from.id),
        ),
        PaymentKind::Deposit { amount } => (
            format!(
                "👨‍💻 Yangi hisobni to'ldirish: {} ({})\nMiqdor: {amount} so'm",
                from.full_name(),
                from.id
            ),
            format!("admin_approve_deposit:{}:{amount}", from.id),
        ),
    };

    let admin = ctx.settings.admin_id;
    let forwarded = ctx
        .transport
        .send_photo(
            admin,
            &photo.file_id,
            &caption,
            Some(keyboards::approve(callback_data).into()),
        )
        .await;
    // The wizard state is cleared whether or not the forward succeeded.
    ctx.sessions.remove(&from.id);

    match forwarded {
        Ok(()) => {
            approval::register(ctx, from.id, &payment);
            info!(user =% from.id, amount, "payment proof forwarded for approval");
            ctx.transport
                .send_message(
                    chat,
                    "✅ Skrinshotingiz muvaffaqiyatli qabul qilindi. Admin tasdig'ini kuting.",
                    None,
                )
                .await
        }
        Err(err) => {
            warn!(error =% err, "failed to forward payment proof");
            ctx.transport
                .send_message(
                    chat,
                    "❌ Skrinshotni qabul qilishda xatolik yuz berdi. Iltimos, qayta urinib ko'ring.",
                    None,
                )
                .await
        }
    }
}

async fn process_token<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    chat: i64,
    user_id: i64,
    text: &str,
    rename: Option<String>,
) -> Result<()> {
    let Some(rest) = text.strip_prefix("/token") else {
        return ctx
            .transport
            .send_message(
                chat,
                "⏳ Bot tokenini kuting yoki `/cancel` bilan bekor qiling.",
                None,
            )
            .await;
    };
    let token = rest.trim();
    if token.is_empty() {
        return ctx
            .transport
            .send_message(
                chat,
                "❌ Iltimos, /token buyrug'idan keyin bot tokenini kiriting.",
                None,
            )
            .await;
    }
    // Syntactic check only; the live verification happens at the username
    // step.
    if token.len() <= 20 || !token.contains(':') {
        return ctx
            .transport
            .send_message(
                chat,
                "❌ Noto'g'ri token formati. Iltimos, to'g'ri token yuboring.",
                None,
            )
            .await;
    }

    match rename {
        Some(username) => {
            let mut changed = None;
            if let Some(record) = ctx
                .bots
                .data
                .iter_mut()
                .find(|record| record.owner_id == user_id && record.username == username)
            {
                record.bot_token = token.to_owned();
                changed = Some(record.active);
            }
            ctx.sessions.remove(&user_id);
            if let Some(active) = changed {
                ctx.store.save(&mut ctx.bots);
                ctx.registry.ensure(&username, token, active);
                ctx.transport
                    .send_message(
                        chat,
                        &format!("✅ @{username} uchun bot tokeni muvaffaqiyatli o'zgartirildi."),
                        None,
                    )
                    .await
            } else {
                ctx.transport
                    .send_message(
                        chat,
                        "❌ O'zgartirish uchun bot topilmadi. Qaytadan urinib ko'ring.",
                        None,
                    )
                    .await
            }
        }
        None => {
            ctx.sessions.insert(
                user_id,
                Flow::AwaitingUsername {
                    token: Some(token.to_owned()),
                    rename: None,
                },
            );
            ctx.transport
                .send_message(
                    chat,
                    "✅ Bot token qabul qilindi. Endi botingizning **username**'ini (masalan, `my_super_bot`) yuboring.",
                    None,
                )
                .await
        }
    }
}

async fn process_username<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    chat: i64,
    user_id: i64,
    text: &str,
    token: Option<String>,
    rename: Option<String>,
) -> Result<()> {
    let claimed = text.trim();
    if claimed.is_empty() {
        return ctx
            .transport
            .send_message(chat, "Iltimos, botingizning username'ini yuboring.", None)
            .await;
    }

    // The rename path verifies against the credential already on record.
    let token = match token {
        Some(token) => token,
        None => {
            let stored = rename.as_deref().and_then(|username| {
                ctx.bots
                    .data
                    .iter()
                    .find(|record| record.owner_id == user_id && record.username == username)
                    .map(|record| record.bot_token.clone())
            });
            match stored {
                Some(token) => token,
                None => {
                    ctx.sessions.remove(&user_id);
                    return ctx
                        .transport
                        .send_message(chat, "Bot token topilmadi. Iltimos, qaytadan boshlang.", None)
                        .await;
                }
            }
        }
    };

    match provision::provision(ctx, &token, claimed, user_id, rename.as_deref()).await {
        Ok(record) => {
            ctx.sessions.remove(&user_id);
            if rename.is_some() {
                ctx.transport
                    .send_message(
                        chat,
                        &format!("✅ Username muvaffaqiyatli o'zgartirildi: @{}", record.username),
                        None,
                    )
                    .await?;
            } else {
                ctx.transport
                    .send_message(
                        chat,
                        "Username qabul qilindi. Botingiz ma'lumotlari saqlandi va u ishga tushirilyapti.",
                        None,
                    )
                    .await?;
            }
            let admin = ctx.settings.admin_id;
            ctx.transport
                .send_message(
                    admin,
                    &format!(
                        "Yangi bot yaratildi:\nToken: `{}`\nUsername: `@{}`\nFoydalanuvchi ID: `{user_id}`",
                        record.bot_token, record.username
                    ),
                    None,
                )
                .await
        }
        // Verification failures keep the step open; the user is re-prompted.
        Err(ProvisionError::UsernameMismatch { claimed, actual }) => {
            ctx.transport
                .send_message(
                    chat,
                    &format!(
                        "❌ Xatolik: Yuborgan username (`@{claimed}`) botning haqiqiy username'i (`@{actual}`) bilan mos kelmadi.\nIltimos, to'g'ri username yuboring."
                    ),
                    None,
                )
                .await
        }
        Err(ProvisionError::InvalidCredential) => {
            ctx.transport
                .send_message(
                    chat,
                    "❌ Bot tokeni bilan aloqa o'rnatishda xatolik yuz berdi. Iltimos, qayta urinib ko'ring.",
                    None,
                )
                .await
        }
    }
}

async fn process_new_channel<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    chat: i64,
    user_id: i64,
    text: &str,
) -> Result<()> {
    let channel = text.trim();
    let valid = channel.starts_with("-100") && channel[1..].chars().all(|c| c.is_ascii_digit());
    if !valid {
        return ctx
            .transport
            .send_message(
                chat,
                "Noto'g'ri kanal ID'si formati. Iltimos, qayta urinib ko'ring.",
                None,
            )
            .await;
    }

    ctx.sessions.remove(&user_id);
    if ctx.channels.data.iter().any(|existing| existing == channel) {
        return ctx
            .transport
            .send_message(chat, "Bu kanal allaqachon ro'yxatga olingan.", None)
            .await;
    }
    ctx.channels.data.push(channel.to_owned());
    ctx.store.save(&mut ctx.channels);
    info!(channel =% channel, "gating channel added");
    ctx.transport
        .send_message(chat, "✅ Kanal muvaffaqiyatli qo'shildi!", None)
        .await
}

////////////////////////////////////////////////////////////////////////////////
// CALLBACKS
////////////////////////////////////////////////////////////////////////////////

async fn handle_callback<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    callback: CallbackQuery,
) -> Result<()> {
    let Some(data) = callback.data.clone() else {
        return ctx
            .transport
            .answer_callback_query(&callback.id, None, false)
            .await;
    };
    let Some(action) = CallbackAction::decode(&data) else {
        // Malformed approval payloads report and abort without touching
        // any state; everything else is quietly ignored.
        let notice = data
            .starts_with("admin_approve")
            .then_some("❌ Ma'lumotlar to'liq emas. Amaliyot bekor qilindi.");
        return ctx
            .transport
            .answer_callback_query(&callback.id, notice, notice.is_some())
            .await;
    };

    let user_id = callback.from.id;
    let chat = callback
        .message
        .as_ref()
        .map(|message| message.chat.id)
        .unwrap_or(user_id);

    match action {
        CallbackAction::Approve { user_id: target, kind } => {
            approval::approve(ctx, &callback, target, kind).await
        }
        CallbackAction::ApproveDeposit { user_id: target, amount } => {
            approval::approve_deposit(ctx, &callback, target, amount).await
        }
        CallbackAction::CreateNewBot => {
            ctx.transport
                .answer_callback_query(&callback.id, None, false)
                .await?;
            ctx.transport
                .send_message(chat, TERMS, Some(keyboards::i_agree().into()))
                .await
        }
        CallbackAction::AgreeToPay => {
            ctx.transport
                .answer_callback_query(&callback.id, None, false)
                .await?;
            ctx.sessions.insert(
                user_id,
                Flow::AwaitingProof {
                    payment: PaymentKind::BotCreation,
                },
            );
            ctx.transport
                .send_message(chat, &card_details(ctx), Some(keyboards::paid().into()))
                .await
        }
        CallbackAction::Paid | CallbackAction::PaidPremiumCard | CallbackAction::PaidDeposit => {
            ctx.transport
                .answer_callback_query(&callback.id, None, false)
                .await?;
            if matches!(ctx.sessions.get(&user_id), Some(Flow::AwaitingProof { .. })) {
                ctx.transport.send_message(chat, SEND_SCREENSHOT, None).await
            } else {
                ctx.transport
                    .send_message(chat, "Iltimos, jarayonni menyudan qaytadan boshlang.", None)
                    .await
            }
        }
        CallbackAction::SettingsBot => {
            ctx.transport
                .answer_callback_query(&callback.id, None, false)
                .await?;
            list_user_bots(ctx, chat, user_id).await
        }
        CallbackAction::SelectBot(index) => select_bot(ctx, &callback, index).await,
        CallbackAction::ChangeToken(username) => {
            ctx.transport
                .answer_callback_query(&callback.id, None, false)
                .await?;
            ctx.sessions.insert(
                user_id,
                Flow::AwaitingToken {
                    rename: Some(username.clone()),
                },
            );
            ctx.transport
                .send_message(
                    chat,
                    &format!(
                        "@{username} uchun yangi bot tokenini `/token` buyrug'i bilan kiriting. (Yoki `/cancel` bilan bekor qiling)"
                    ),
                    None,
                )
                .await
        }
        CallbackAction::ChangeUsername(username) => {
            ctx.transport
                .answer_callback_query(&callback.id, None, false)
                .await?;
            ctx.sessions.insert(
                user_id,
                Flow::AwaitingUsername {
                    token: None,
                    rename: Some(username.clone()),
                },
            );
            ctx.transport
                .send_message(
                    chat,
                    &format!(
                        "@{username} uchun yangi bot username'ini kiriting. (Yoki `/cancel` bilan bekor qiling)"
                    ),
                    None,
                )
                .await
        }
        CallbackAction::PayMonthly(username) => {
            let text = format!("@{username} uchun oylik to'lov ({MONTHLY_PRICE} so'm):");
            match &callback.message {
                Some(message) => {
                    ctx.transport
                        .edit_message_text(
                            message.chat.id,
                            message.message_id,
                            &text,
                            Some(keyboards::bot_payment_options()),
                        )
                        .await
                }
                None => {
                    ctx.transport
                        .send_message(chat, &text, Some(keyboards::bot_payment_options().into()))
                        .await
                }
            }
        }
        CallbackAction::PayWithCardMonthly => {
            ctx.transport
                .answer_callback_query(&callback.id, None, false)
                .await?;
            ctx.sessions.insert(
                user_id,
                Flow::AwaitingProof {
                    payment: PaymentKind::Monthly,
                },
            );
            let text = format!("💳 **Karta orqali to'lov**\n\n{}", card_details(ctx));
            ctx.transport
                .send_message(chat, &text, Some(keyboards::card_payment().into()))
                .await
        }
        CallbackAction::PayWithBalanceMonthly => {
            pay_monthly_with_balance(ctx, &callback, chat).await
        }
        CallbackAction::BuyPremium => {
            let account = ctx.account(user_id);
            if account.status == AccountStatus::Premium {
                return ctx
                    .transport
                    .answer_callback_query(
                        &callback.id,
                        Some("Siz allaqachon Premium obunachisiz."),
                        true,
                    )
                    .await;
            }
            ctx.transport
                .answer_callback_query(&callback.id, None, false)
                .await?;
            ctx.transport
                .send_message(
                    chat,
                    &format!(
                        "💎 **Premium xizmati**\n\nXizmat narxi: **{PREMIUM_PRICE} so'm**\n\nTo'lov turini tanlang:"
                    ),
                    Some(keyboards::payment_options().into()),
                )
                .await
        }
        CallbackAction::PayWithCard => {
            ctx.transport
                .answer_callback_query(&callback.id, None, false)
                .await?;
            ctx.sessions.insert(
                user_id,
                Flow::AwaitingProof {
                    payment: PaymentKind::PremiumCard,
                },
            );
            let text = format!("💳 **Karta orqali to'lov**\n\n{}", card_details(ctx));
            ctx.transport
                .send_message(chat, &text, Some(keyboards::card_payment().into()))
                .await
        }
        CallbackAction::PayWithBalance => pay_premium_with_balance(ctx, &callback, chat).await,
        CallbackAction::AdminBotList => {
            if !ctx.is_admin(user_id) {
                return ctx
                    .transport
                    .answer_callback_query(&callback.id, Some(NOT_ADMIN_ALERT), true)
                    .await;
            }
            let keyboard =
                keyboards::admin_bot_list(&ctx.bots.data, |username| ctx.creation_time(username));
            match &callback.message {
                Some(message) => {
                    ctx.transport
                        .edit_message_text(
                            message.chat.id,
                            message.message_id,
                            "Botlar ro'yxati:",
                            Some(keyboard),
                        )
                        .await
                }
                None => {
                    ctx.transport
                        .send_message(chat, "Botlar ro'yxati:", Some(keyboard.into()))
                        .await
                }
            }
        }
        CallbackAction::ToggleBot(username) => toggle_bot(ctx, &callback, &username).await,
        CallbackAction::CheckSubscription => check_subscription(ctx, &callback).await,
    }
}

async fn select_bot<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    callback: &CallbackQuery,
    index: usize,
) -> Result<()> {
    let user_id = callback.from.id;
    let selected = ctx
        .bots
        .data
        .iter()
        .filter(|record| record.owner_id == user_id)
        .nth(index)
        .cloned();
    let Some(record) = selected else {
        return ctx
            .transport
            .answer_callback_query(&callback.id, Some("❌ Bot topilmadi."), true)
            .await;
    };
    let text = format!("@{} sozlamalari:", record.username);
    let keyboard = keyboards::bot_settings(&record.username);
    match &callback.message {
        Some(message) => {
            ctx.transport
                .edit_message_text(message.chat.id, message.message_id, &text, Some(keyboard))
                .await
        }
        None => {
            ctx.transport
                .send_message(user_id, &text, Some(keyboard.into()))
                .await
        }
    }
}

async fn pay_premium_with_balance<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    callback: &CallbackQuery,
    chat: i64,
) -> Result<()> {
    let user_id = callback.from.id;
    let mut account = ctx.account(user_id);
    if account.balance < PREMIUM_PRICE {
        ctx.transport
            .answer_callback_query(
                &callback.id,
                Some("❌ Hisobingizda mablag' yetarli emas. Iltimos, hisobingizni to'ldiring."),
                true,
            )
            .await?;
        return ctx
            .transport
            .send_message(
                chat,
                "Hisobingizni to'ldirish uchun menyudan 'Hisobni to‘ldirish' tugmasini bosing.",
                None,
            )
            .await;
    }

    account.balance -= PREMIUM_PRICE;
    account.status = AccountStatus::Premium;
    ctx.set_account(user_id, account);
    info!(user =% user_id, "premium purchased from balance");
    ctx.transport
        .answer_callback_query(
            &callback.id,
            Some("✅ Muvaffaqiyatli! Sizning hisobingizdan 5000 so'm yechildi. Siz endi Premium foydalanuvchisiz."),
            true,
        )
        .await?;
    ctx.transport
        .send_message(
            chat,
            "🎉 Tabriklaymiz! Siz **Premium** statusini oldingiz.\n\nEndi reklamalarsiz foydalana olasiz.",
            None,
        )
        .await
}

async fn pay_monthly_with_balance<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    callback: &CallbackQuery,
    chat: i64,
) -> Result<()> {
    let user_id = callback.from.id;
    let mut account = ctx.account(user_id);
    if account.balance < MONTHLY_PRICE {
        ctx.transport
            .answer_callback_query(
                &callback.id,
                Some("❌ Hisobingizda mablag' yetarli emas. Iltimos, hisobingizni to'ldiring."),
                true,
            )
            .await?;
        return ctx
            .transport
            .send_message(
                chat,
                "Hisobingizni to'ldirish uchun menyudan 'Hisobni to‘ldirish' tugmasini bosing.",
                None,
            )
            .await;
    }

    account.balance -= MONTHLY_PRICE;
    ctx.set_account(user_id, account);
    info!(user =% user_id, "monthly fee paid from balance");
    ctx.transport
        .answer_callback_query(
            &callback.id,
            Some("✅ Muvaffaqiyatli! Sizning hisobingizdan 20000 so'm yechildi."),
            true,
        )
        .await?;
    ctx.transport
        .send_message(chat, "🎉 Tabriklaymiz! Oylik to'lov amalga oshirildi.", None)
        .await
}

async fn toggle_bot<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    callback: &CallbackQuery,
    username: &str,
) -> Result<()> {
    if !ctx.is_admin(callback.from.id) {
        return ctx
            .transport
            .answer_callback_query(&callback.id, Some(NOT_ADMIN_ALERT), true)
            .await;
    }

    let mut toggled = None;
    if let Some(record) = ctx
        .bots
        .data
        .iter_mut()
        .find(|record| record.username == username)
    {
        record.active = !record.active;
        toggled = Some(record.active);
    }

    match toggled {
        Some(active) => {
            ctx.store.save(&mut ctx.bots);
            ctx.registry.set_should_run(username, active);
            let status = if active { "✅" } else { "❌" };
            let text = format!("@{username} holati: {status}");
            match &callback.message {
                Some(message) => {
                    ctx.transport
                        .edit_message_text(message.chat.id, message.message_id, &text, None)
                        .await
                }
                None => {
                    ctx.transport
                        .send_message(callback.from.id, &text, None)
                        .await
                }
            }
        }
        None => {
            ctx.transport
                .answer_callback_query(&callback.id, Some("❌ Bot topilmadi!"), true)
                .await
        }
    }
}

async fn check_subscription<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    callback: &CallbackQuery,
) -> Result<()> {
    let user_id = callback.from.id;
    let channels = ctx.channels.data.clone();
    let missing = gate::unsubscribed(&ctx.transport, &channels, user_id).await;

    if missing.is_empty() {
        if let Some(message) = &callback.message {
            ctx.transport
                .edit_message_text(
                    message.chat.id,
                    message.message_id,
                    "🎉 A'zoligingiz tekshirildi! Botdan foydalanishingiz mumkin.",
                    None,
                )
                .await?;
        }
        ctx.transport
            .answer_callback_query(&callback.id, Some("✅ Obuna muvaffaqiyatli tasdiqlandi."), true)
            .await
    } else {
        let keyboard = gate::join_keyboard(&ctx.transport, &missing, CHECK_LABEL).await;
        if let Some(message) = &callback.message {
            ctx.transport
                .edit_message_text(
                    message.chat.id,
                    message.message_id,
                    "Siz quyidagi kanallarga obuna bo'lmagansiz:",
                    Some(keyboard),
                )
                .await?;
        }
        ctx.transport
            .answer_callback_query(&callback.id, Some("Obuna bo'lmagan kanallar mavjud."), true)
            .await
    }
}

fn card_details<T, L>(ctx: &HubContext<T, L>) -> String {
    format!(
        "Toʻlovni quyidagi karta raqamiga amalga oshiring:\n\
         Karta raqami: **{}**\n\
         Qabul qiluvchi: **{}**\n\n\
         Toʻlovni amalga oshirgach, pastdagi tugmani bosing:",
        ctx.settings.card_number, ctx.settings.card_holder
    )
}
