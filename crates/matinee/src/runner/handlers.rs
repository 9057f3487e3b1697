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

//! Runner update handlers: the admin command surface and code delivery.

use tracing::{error, info, warn};

use matinee_common::error::{MatineeError, Result};
use matinee_common::telegram::{
    CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, Message,
    ReplyKeyboardMarkup, ReplyMarkup, Transport, Update,
};

use crate::gate;

use super::catalog::{self, CatalogEntry, MovieInfo};
use super::flow::Pending;
use super::RunnerContext;

const APOLOGY: &str = "❌ Xatolik yuz berdi. Iltimos, qayta urining.";
const NOT_ADMIN: &str = "❌ Sizda admin huquqlari yo'q.";
const CHECK_LABEL: &str = "✅ Obuna tekshirish";

const ADMIN_LABELS: [&str; 9] = [
    "🎬 Kino qo'shish",
    "📝 Video tasnifi",
    "📢 Kanal qo'shish",
    "📢 Asosiy kanal ID'si",
    "📊 Statistika",
    "🗑 Kanal o'chirish",
    "🗑 Video o'chirish",
    "🗑 Ma'lumot o'chirish",
    "❌ Tugmalarni yopish",
];

#[derive(Debug, PartialEq, Eq)]
enum RunnerAction {
    CheckSubscription,
    DeleteChannel(String),
    DeleteVideo(String),
    DeleteInfo(String),
}

impl RunnerAction {
    fn decode(data: &str) -> Option<Self> {
        if data == "check_subscription" {
            return Some(RunnerAction::CheckSubscription);
        }
        if let Some(id) = data.strip_prefix("delete_channel_") {
            return Some(RunnerAction::DeleteChannel(id.to_owned()));
        }
        if let Some(code) = data.strip_prefix("delete_video_") {
            return Some(RunnerAction::DeleteVideo(code.to_owned()));
        }
        if let Some(code) = data.strip_prefix("delete_info_") {
            return Some(RunnerAction::DeleteInfo(code.to_owned()));
        }
        None
    }
}

fn admin_keyboard() -> ReplyKeyboardMarkup {
    ReplyKeyboardMarkup {
        keyboard: vec![
            vec![
                KeyboardButton::new("🎬 Kino qo'shish"),
                KeyboardButton::new("📝 Video tasnifi"),
            ],
            vec![
                KeyboardButton::new("📢 Kanal qo'shish"),
                KeyboardButton::new("📢 Asosiy kanal ID'si"),
            ],
            vec![KeyboardButton::new("📊 Statistika")],
            vec![
                KeyboardButton::new("🗑 Kanal o'chirish"),
                KeyboardButton::new("🗑 Video o'chirish"),
            ],
            vec![
                KeyboardButton::new("🗑 Ma'lumot o'chirish"),
                KeyboardButton::new("❌ Tugmalarni yopish"),
            ],
        ],
        resize_keyboard: true,
    }
}

pub async fn handle_update<T: Transport>(ctx: &mut RunnerContext<T>, update: Update) {
    let chat = update.chat_id();
    if let Err(err) = dispatch(ctx, update).await {
        error!(error =% err, "runner handler failed");
        if let Some(chat) = chat
            && let Err(err) = ctx.transport.send_message(chat, APOLOGY, None).await
        {
            warn!(error =% err, "failed to deliver failure notice");
        }
    }
}

async fn dispatch<T: Transport>(ctx: &mut RunnerContext<T>, update: Update) -> Result<()> {
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

async fn handle_message<T: Transport>(ctx: &mut RunnerContext<T>, message: Message) -> Result<()> {
    let Some(from) = message.from.clone() else {
        return Ok(());
    };
    let chat = message.chat.id;
    let text = message.text.clone().unwrap_or_default();
    let text = text.trim().to_owned();

    ctx.record_user(from.id);

    if text == "/cancel" {
        if ctx.sessions.remove(&from.id).is_some() {
            return ctx
                .transport
                .send_message(chat, "✅ Amal bekor qilindi.", None)
                .await;
        }
        return ctx
            .transport
            .send_message(chat, "Bekor qilinadigan amal yo'q.", None)
            .await;
    }
    if text == "/start" {
        return start(ctx, chat, from.id).await;
    }
    if text == "/register_admin" {
        if ctx.is_admin(from.id) {
            return ctx
                .transport
                .send_message(chat, "Siz allaqachon adminsiz.", None)
                .await;
        }
        ctx.sessions.insert(from.id, Pending::AwaitingAdminPassword);
        return ctx
            .transport
            .send_message(chat, "Admin parolini kiriting:", None)
            .await;
    }

    // Password and primary-channel input win over everything else,
    // including the admin button labels.
    match ctx.sessions.get(&from.id).copied() {
        Some(Pending::AwaitingAdminPassword) => {
            return process_admin_password(ctx, chat, from.id, &text).await;
        }
        Some(Pending::AwaitingPrimaryChannel) => {
            return process_primary_channel(ctx, chat, from.id, &text).await;
        }
        _ => {}
    }

    if ADMIN_LABELS.contains(&text.as_str()) {
        return admin_button(ctx, chat, from.id, &text).await;
    }

    match ctx.sessions.get(&from.id).copied() {
        Some(Pending::AwaitingCatalogEntry) => {
            return process_catalog_entry(ctx, chat, from.id, &text).await;
        }
        Some(Pending::AwaitingMovieInfo) => {
            return process_movie_info(ctx, chat, from.id, &text).await;
        }
        Some(Pending::AwaitingGateChannel) => {
            return process_gate_channel(ctx, chat, from.id, &text).await;
        }
        _ => {}
    }

    if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
        return deliver(ctx, chat, from.id, &text).await;
    }

    ctx.transport
        .send_message(
            chat,
            "❓ Noma'lum buyruq. Kino kodini yuboring yoki /start bosing.",
            None,
        )
        .await
}

async fn start<T: Transport>(ctx: &mut RunnerContext<T>, chat: i64, user_id: i64) -> Result<()> {
    ctx.sessions.remove(&user_id);

    if ctx.is_admin(user_id) {
        return ctx
            .transport
            .send_message(
                chat,
                "👨‍💼 Admin paneliga xush kelibsiz!",
                Some(admin_keyboard().into()),
            )
            .await;
    }

    let channels = ctx.channels.data.clone();
    if !channels.is_empty() {
        let missing = gate::unsubscribed(&ctx.transport, &channels, user_id).await;
        if !missing.is_empty() {
            let keyboard = gate::join_keyboard(&ctx.transport, &channels, CHECK_LABEL).await;
            return ctx
                .transport
                .send_message(
                    chat,
                    "👋 Botdan foydalanish uchun quyidagi kanallarga obuna bo'ling:",
                    Some(keyboard.into()),
                )
                .await;
        }
    }

    ctx.transport
        .send_message(chat, "👋 Salom! Kino kodini yuboring.", Some(ReplyMarkup::remove()))
        .await
}

async fn process_admin_password<T: Transport>(
    ctx: &mut RunnerContext<T>,
    chat: i64,
    user_id: i64,
    text: &str,
) -> Result<()> {
    if text != ctx.settings.admin_password {
        return ctx
            .transport
            .send_message(
                chat,
                "❌ Noto'g'ri parol. Qayta urinib ko'ring yoki /cancel buyrug'i bilan bekor qiling.",
                None,
            )
            .await;
    }

    ctx.sessions.remove(&user_id);
    if !ctx.admins.data.contains(&user_id) {
        ctx.admins.data.push(user_id);
        ctx.store.save(&mut ctx.admins);
        info!(user =% user_id, "new admin registered");
        return ctx
            .transport
            .send_message(
                chat,
                "✅ Siz admin bo'ldingiz! Endi admin paneldan foydalaning.",
                Some(admin_keyboard().into()),
            )
            .await;
    }
    ctx.transport
        .send_message(chat, "Siz allaqachon adminsiz.", Some(admin_keyboard().into()))
        .await
}

async fn admin_button<T: Transport>(
    ctx: &mut RunnerContext<T>,
    chat: i64,
    user_id: i64,
    label: &str,
) -> Result<()> {
    if !ctx.is_admin(user_id) {
        return ctx.transport.send_message(chat, NOT_ADMIN, None).await;
    }

    match label {
        "🎬 Kino qo'shish" => {
            ctx.sessions.insert(user_id, Pending::AwaitingCatalogEntry);
            ctx.transport
                .send_message(
                    chat,
                    "Kino qo'shish uchun kod va video ma'lumotlarini yuboring:\nFormat: `kod message_id` yoki `kod https://t.me/kanal/123`",
                    None,
                )
                .await
        }
        "📝 Video tasnifi" => {
            ctx.sessions.insert(user_id, Pending::AwaitingMovieInfo);
            ctx.transport
                .send_message(
                    chat,
                    "Video tasnifi qo'shish uchun ma'lumotlarni yuboring:\nFormat: `kod Nomi|Janri|Tili|Davomiyligi`",
                    None,
                )
                .await
        }
        "📢 Kanal qo'shish" => {
            ctx.sessions.insert(user_id, Pending::AwaitingGateChannel);
            ctx.transport
                .send_message(chat, "Kanal ID yoki linkini yuboring.", None)
                .await
        }
        "📢 Asosiy kanal ID'si" => {
            ctx.sessions.insert(user_id, Pending::AwaitingPrimaryChannel);
            ctx.transport
                .send_message(
                    chat,
                    "Asosiy kanal ID'sini kiriting (masalan, -1001234567890 yoki @kanal_username):",
                    None,
                )
                .await
        }
        "📊 Statistika" => {
            let text = statistics_summary(ctx);
            ctx.transport.send_message(chat, &text, None).await
        }
        "🗑 Kanal o'chirish" => {
            if ctx.channels.data.is_empty() {
                return ctx
                    .transport
                    .send_message(chat, "❌ Hech qanday kanal mavjud emas.", None)
                    .await;
            }
            let keyboard = InlineKeyboardMarkup {
                inline_keyboard: ctx
                    .channels
                    .data
                    .iter()
                    .map(|id| {
                        vec![InlineKeyboardButton::callback(
                            format!("🗑 {id}"),
                            format!("delete_channel_{id}"),
                        )]
                    })
                    .collect(),
            };
            ctx.transport
                .send_message(chat, "O'chirish uchun kanalni tanlang:", Some(keyboard.into()))
                .await
        }
        "🗑 Video o'chirish" => {
            if ctx.catalog.data.is_empty() {
                return ctx
                    .transport
                    .send_message(chat, "❌ Hech qanday video mavjud emas.", None)
                    .await;
            }
            let keyboard = InlineKeyboardMarkup {
                inline_keyboard: ctx
                    .catalog
                    .data
                    .keys()
                    .map(|code| {
                        vec![InlineKeyboardButton::callback(
                            format!("🗑 {}", display_name(ctx, code)),
                            format!("delete_video_{code}"),
                        )]
                    })
                    .collect(),
            };
            ctx.transport
                .send_message(chat, "O'chirish uchun videoni tanlang:", Some(keyboard.into()))
                .await
        }
        "🗑 Ma'lumot o'chirish" => {
            if ctx.metadata.data.is_empty() {
                return ctx
                    .transport
                    .send_message(chat, "❌ Hech qanday ma'lumot mavjud emas.", None)
                    .await;
            }
            let keyboard = InlineKeyboardMarkup {
                inline_keyboard: ctx
                    .metadata
                    .data
                    .iter()
                    .map(|(code, info)| {
                        vec![InlineKeyboardButton::callback(
                            format!("🗑 {}", info.name),
                            format!("delete_info_{code}"),
                        )]
                    })
                    .collect(),
            };
            ctx.transport
                .send_message(
                    chat,
                    "O'chirish uchun ma'lumotni tanlang:",
                    Some(keyboard.into()),
                )
                .await
        }
        "❌ Tugmalarni yopish" => {
            ctx.transport
                .send_message(chat, "Admin tugmalari yopildi.", Some(ReplyMarkup::remove()))
                .await
        }
        _ => Ok(()),
    }
}

fn statistics_summary<T>(ctx: &RunnerContext<T>) -> String {
    let total_downloads: u64 = ctx.statistics.data.values().map(|s| s.downloads).sum();
    let mut text = format!(
        "📊 **Bot Statistikasi**\n\n\
         👥 Jami foydalanuvchilar: {}\n\
         🎬 Jami kinolar: {}\n\
         ⬇️ Jami yuklab olishlar: {total_downloads}\n\
         📢 Kanallar soni: {}\n\
         👨‍💼 Adminlar soni: {}",
        ctx.users.data.len(),
        ctx.catalog.data.len(),
        ctx.channels.data.len(),
        ctx.admins.data.len()
    );

    if !ctx.statistics.data.is_empty() {
        text.push_str("\n\n📈 **Eng ommabop kinolar:**\n");
        let mut sorted: Vec<_> = ctx.statistics.data.iter().collect();
        sorted.sort_by(|a, b| b.1.downloads.cmp(&a.1.downloads));
        for (position, (code, stats)) in sorted.into_iter().take(5).enumerate() {
            text.push_str(&format!(
                "{}. {} - {} marta\n",
                position + 1,
                display_name(ctx, code),
                stats.downloads
            ));
        }
    }
    text
}

fn display_name<T>(ctx: &RunnerContext<T>, code: &str) -> String {
    ctx.metadata
        .data
        .get(code)
        .map(|info| info.name.clone())
        .unwrap_or_else(|| format!("Kod: {code}"))
}

async fn process_catalog_entry<T: Transport>(
    ctx: &mut RunnerContext<T>,
    chat: i64,
    user_id: i64,
    text: &str,
) -> Result<()> {
    let Some((code, value)) = text.split_once(' ') else {
        return ctx
            .transport
            .send_message(
                chat,
                "❌ Format noto'g'ri. Misol: 123 456 yoki 123 https://t.me/kanal/456",
                None,
            )
            .await;
    };
    let code = code.trim();
    let value = value.trim();

    let entry = if value.starts_with("http") {
        CatalogEntry::Link(value.to_owned())
    } else {
        match value.parse::<i64>() {
            Ok(message_id) => CatalogEntry::MessageId(message_id),
            Err(_) => {
                return ctx
                    .transport
                    .send_message(
                        chat,
                        "❌ Message ID raqam bo'lishi kerak yoki to'g'ri URL kiriting.",
                        None,
                    )
                    .await;
            }
        }
    };

    ctx.catalog.data.insert(code.to_owned(), entry);
    ctx.store.save(&mut ctx.catalog);
    if !ctx.statistics.data.contains_key(code) {
        ctx.statistics.data.insert(code.to_owned(), Default::default());
        ctx.store.save(&mut ctx.statistics);
    }
    ctx.sessions.remove(&user_id);
    info!(code =% code, "catalog entry saved");
    ctx.transport
        .send_message(chat, &format!("✅ Kino kodi '{code}' saqlandi."), None)
        .await
}

async fn process_movie_info<T: Transport>(
    ctx: &mut RunnerContext<T>,
    chat: i64,
    user_id: i64,
    text: &str,
) -> Result<()> {
    let bad_format = "❌ Format noto'g'ri. Misol: `123 Spiderman|Fantastika|Ingliz tili|2 soat`";
    let Some((code, info)) = text.split_once(' ') else {
        return ctx.transport.send_message(chat, bad_format, None).await;
    };
    let code = code.trim();
    let fields: Vec<&str> = info.split('|').collect();
    if fields.len() < 4 {
        return ctx.transport.send_message(chat, bad_format, None).await;
    }
    if !ctx.catalog.data.contains_key(code) {
        return ctx
            .transport
            .send_message(chat, "❌ Bu kod mavjud emas. Avval kino qo'shing.", None)
            .await;
    }

    let info = MovieInfo {
        name: fields[0].trim().to_owned(),
        genre: fields[1].trim().to_owned(),
        language: fields[2].trim().to_owned(),
        duration: fields[3].trim().to_owned(),
    };
    let name = info.name.clone();
    ctx.metadata.data.insert(code.to_owned(), info);
    ctx.store.save(&mut ctx.metadata);
    ctx.sessions.remove(&user_id);
    ctx.transport
        .send_message(
            chat,
            &format!("✅ Kino ma'lumotlari saqlandi:\n\n🎬 **{name}**"),
            None,
        )
        .await
}

async fn process_gate_channel<T: Transport>(
    ctx: &mut RunnerContext<T>,
    chat: i64,
    user_id: i64,
    text: &str,
) -> Result<()> {
    ctx.sessions.remove(&user_id);
    if ctx.channels.data.iter().any(|existing| existing == text) {
        return ctx
            .transport
            .send_message(chat, "❗ Bu link allaqachon mavjud.", None)
            .await;
    }
    ctx.channels.data.push(text.to_owned());
    ctx.store.save(&mut ctx.channels);
    ctx.transport
        .send_message(chat, &format!("✅ Kanal qo'shildi: {text}"), None)
        .await
}

async fn process_primary_channel<T: Transport>(
    ctx: &mut RunnerContext<T>,
    chat: i64,
    user_id: i64,
    text: &str,
) -> Result<()> {
    if !(text.starts_with("-100") || text.starts_with('@')) {
        return ctx
            .transport
            .send_message(
                chat,
                "❌ Noto'g'ri kanal formati. Masalan: -1001234567890 yoki @kanal_username. Qayta yuboring.",
                None,
            )
            .await;
    }

    // The primary channel is replaced wholesale, not appended.
    ctx.channels.data.clear();
    ctx.channels.data.push(text.to_owned());
    ctx.store.save(&mut ctx.channels);
    ctx.sessions.remove(&user_id);
    info!(channel =% text, "primary channel replaced");
    ctx.transport
        .send_message(
            chat,
            &format!("✅ Asosiy kanal ID'si yangilandi: {text}."),
            Some(admin_keyboard().into()),
        )
        .await
}

////////////////////////////////////////////////////////////////////////////////
// DELIVERY
////////////////////////////////////////////////////////////////////////////////

pub async fn deliver<T: Transport>(
    ctx: &mut RunnerContext<T>,
    chat: i64,
    user_id: i64,
    code: &str,
) -> Result<()> {
    let Some(entry) = ctx.catalog.data.get(code).cloned() else {
        return ctx
            .transport
            .send_message(chat, "❌ Bu kod bo'yicha kino topilmadi.", None)
            .await;
    };

    // The counter moves before the delivery attempt, so a failed delivery
    // still counts. Long-standing behavior, kept as is.
    let downloads = {
        let stats = ctx.statistics.data.entry(code.to_owned()).or_default();
        stats.downloads += 1;
        stats.downloads
    };
    ctx.store.save(&mut ctx.statistics);

    let caption = ctx.metadata.data.get(code).map(|info| {
        format!(
            "🎬 **{}**\n\n🎭 Janri: {}\n🌐 Tili: {}\n⏱ Davomiyligi: {}\n📊 Yuklab olishlar: {downloads}",
            info.name, info.genre, info.language, info.duration
        )
    });

    let delivered = match entry {
        CatalogEntry::Link(url) => match catalog::parse_stream_link(&url) {
            Some((source, message_id)) => {
                ctx.transport
                    .copy_message(user_id, &source, message_id, caption.as_deref())
                    .await
            }
            None => Err(MatineeError::Validation(format!(
                "unparseable stream link `{url}`"
            ))),
        },
        CatalogEntry::MessageId(message_id) => match ctx.channels.data.first().cloned() {
            Some(source) => {
                ctx.transport
                    .copy_message(user_id, &source, message_id, caption.as_deref())
                    .await
            }
            None => {
                error!("no source channel configured for message-id catalog entries");
                return ctx
                    .transport
                    .send_message(chat, "❌ Kino kanali sozlanmagan. Admin bilan bog'laning.", None)
                    .await;
            }
        },
    };

    match delivered {
        Ok(()) => {
            info!(code =% code, user =% user_id, downloads, "movie delivered");
            Ok(())
        }
        Err(err) => {
            warn!(code =% code, error =% err, "delivery failed");
            ctx.transport
                .send_message(chat, "❌ Kino yuborishda xatolik yuz berdi.", None)
                .await
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// CALLBACKS
////////////////////////////////////////////////////////////////////////////////

async fn handle_callback<T: Transport>(
    ctx: &mut RunnerContext<T>,
    callback: CallbackQuery,
) -> Result<()> {
    let action = callback
        .data
        .as_deref()
        .and_then(RunnerAction::decode);
    let Some(action) = action else {
        return ctx
            .transport
            .answer_callback_query(&callback.id, None, false)
            .await;
    };

    match action {
        RunnerAction::CheckSubscription => check_subscription(ctx, &callback).await,
        RunnerAction::DeleteChannel(id) => delete_channel(ctx, &callback, &id).await,
        RunnerAction::DeleteVideo(code) => delete_video(ctx, &callback, &code).await,
        RunnerAction::DeleteInfo(code) => delete_info(ctx, &callback, &code).await,
    }
}

async fn check_subscription<T: Transport>(
    ctx: &mut RunnerContext<T>,
    callback: &CallbackQuery,
) -> Result<()> {
    let channels = ctx.channels.data.clone();
    let missing = gate::unsubscribed(&ctx.transport, &channels, callback.from.id).await;

    if missing.is_empty() {
        if let Some(message) = &callback.message {
            ctx.transport
                .edit_message_text(
                    message.chat.id,
                    message.message_id,
                    "✅ A'zoligingiz tasdiqlandi. Kino kodini yuborishingiz mumkin.",
                    None,
                )
                .await?;
        }
        ctx.transport
            .answer_callback_query(&callback.id, None, false)
            .await
    } else {
        ctx.transport
            .answer_callback_query(
                &callback.id,
                Some("❌ Siz barcha kanallarga obuna bo'lmagansiz!"),
                true,
            )
            .await
    }
}

async fn delete_channel<T: Transport>(
    ctx: &mut RunnerContext<T>,
    callback: &CallbackQuery,
    id: &str,
) -> Result<()> {
    if !ctx.is_admin(callback.from.id) {
        return ctx
            .transport
            .answer_callback_query(&callback.id, Some(NOT_ADMIN), true)
            .await;
    }

    let before = ctx.channels.data.len();
    ctx.channels.data.retain(|channel| channel != id);
    if ctx.channels.data.len() == before {
        return ctx
            .transport
            .answer_callback_query(&callback.id, Some("❌ Kanal topilmadi!"), true)
            .await;
    }
    ctx.store.save(&mut ctx.channels);

    if let Some(message) = &callback.message {
        ctx.transport
            .edit_message_text(
                message.chat.id,
                message.message_id,
                &format!("✅ Kanal '{id}' o'chirildi."),
                None,
            )
            .await?;
    }
    ctx.transport
        .answer_callback_query(&callback.id, None, false)
        .await
}

async fn delete_video<T: Transport>(
    ctx: &mut RunnerContext<T>,
    callback: &CallbackQuery,
    code: &str,
) -> Result<()> {
    if !ctx.is_admin(callback.from.id) {
        return ctx
            .transport
            .answer_callback_query(&callback.id, Some(NOT_ADMIN), true)
            .await;
    }

    if ctx.catalog.data.remove(code).is_none() {
        return ctx
            .transport
            .answer_callback_query(&callback.id, Some("❌ Kino topilmadi!"), true)
            .await;
    }
    ctx.store.save(&mut ctx.catalog);
    if ctx.statistics.data.remove(code).is_some() {
        ctx.store.save(&mut ctx.statistics);
    }
    if ctx.metadata.data.remove(code).is_some() {
        ctx.store.save(&mut ctx.metadata);
    }

    if let Some(message) = &callback.message {
        ctx.transport
            .edit_message_text(
                message.chat.id,
                message.message_id,
                &format!("✅ Kino '{code}' o'chirildi."),
                None,
            )
            .await?;
    }
    ctx.transport
        .answer_callback_query(&callback.id, None, false)
        .await
}

async fn delete_info<T: Transport>(
    ctx: &mut RunnerContext<T>,
    callback: &CallbackQuery,
    code: &str,
) -> Result<()> {
    if !ctx.is_admin(callback.from.id) {
        return ctx
            .transport
            .answer_callback_query(&callback.id, Some(NOT_ADMIN), true)
            .await;
    }

    if ctx.metadata.data.remove(code).is_none() {
        return ctx
            .transport
            .answer_callback_query(&callback.id, Some("❌ Ma'lumot topilmadi!"), true)
            .await;
    }
    ctx.store.save(&mut ctx.metadata);

    if let Some(message) = &callback.message {
        ctx.transport
            .edit_message_text(
                message.chat.id,
                message.message_id,
                &format!("✅ Ma'lumot '{code}' o'chirildi."),
                None,
            )
            .await?;
    }
    ctx.transport
        .answer_callback_query(&callback.id, None, false)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_delete_payloads() {
        assert_eq!(
            RunnerAction::decode("delete_channel_-1001234"),
            Some(RunnerAction::DeleteChannel("-1001234".to_owned()))
        );
        assert_eq!(
            RunnerAction::decode("delete_video_123"),
            Some(RunnerAction::DeleteVideo("123".to_owned()))
        );
        assert_eq!(
            RunnerAction::decode("delete_info_123"),
            Some(RunnerAction::DeleteInfo("123".to_owned()))
        );
        assert_eq!(
            RunnerAction::decode("check_subscription"),
            Some(RunnerAction::CheckSubscription)
        );
        assert_eq!(RunnerAction::decode("something_else"), None);
    }
}
