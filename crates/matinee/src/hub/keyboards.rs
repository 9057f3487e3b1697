//! Hub keyboards. The reply-keyboard labels double as the bot's command
//! surface, so the strings here are matched byte-for-byte by the handlers.

use matinee_common::telegram::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, ReplyKeyboardMarkup,
};

use super::ledger::BotRecord;

pub fn main_menu() -> ReplyKeyboardMarkup {
    ReplyKeyboardMarkup {
        keyboard: vec![
            vec![KeyboardButton::new("🤖 Botlarni boshqarish")],
            vec![
                KeyboardButton::new("➕ Hisobni to‘ldirish"),
                KeyboardButton::new("👤 Kabinet"),
            ],
            vec![
                KeyboardButton::new("📖 Qo‘llanma"),
                KeyboardButton::new("🆘 Yordam"),
            ],
        ],
        resize_keyboard: true,
    }
}

pub fn manage_bot_menu() -> ReplyKeyboardMarkup {
    ReplyKeyboardMarkup {
        keyboard: vec![
            vec![
                KeyboardButton::new("🆕 Bot yaratish"),
                KeyboardButton::new("⚙️ Bot sozlash"),
            ],
            vec![KeyboardButton::new("🔙 Ortga qaytish")],
        ],
        resize_keyboard: true,
    }
}

pub fn admin_main() -> ReplyKeyboardMarkup {
    ReplyKeyboardMarkup {
        keyboard: vec![
            vec![
                KeyboardButton::new("📢 Kanal qo'shish"),
                KeyboardButton::new("🤖 Botlar ro'yxati"),
            ],
            vec![KeyboardButton::new("❌ Tugmalarni yopish")],
        ],
        resize_keyboard: true,
    }
}

pub fn i_agree() -> InlineKeyboardMarkup {
    single_callback("✅ Rozi bo'ldim", "i_agree_to_pay")
}

pub fn paid() -> InlineKeyboardMarkup {
    single_callback("✅ To'ladim", "i_paid")
}

pub fn card_payment() -> InlineKeyboardMarkup {
    single_callback("✅ To'ladim", "i_paid_premium_card")
}

pub fn deposit_card() -> InlineKeyboardMarkup {
    single_callback("✅ To'ladim", "i_paid_deposit")
}

pub fn cabinet() -> InlineKeyboardMarkup {
    single_callback("💎 Premium sotib olish", "buy_premium")
}

pub fn payment_options() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![InlineKeyboardButton::callback("💳 Karta orqali", "pay_with_card")],
            vec![InlineKeyboardButton::callback("💰 Balansdan", "pay_with_balance")],
        ],
    }
}

pub fn bot_settings(username: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![InlineKeyboardButton::callback(
                "✏️ Tokenni o'zgartirish",
                format!("change_token_{username}"),
            )],
            vec![InlineKeyboardButton::callback(
                "✏️ Username'ni o'zgartirish",
                format!("change_username_{username}"),
            )],
            vec![InlineKeyboardButton::callback(
                "💳 Oylik to'lov",
                format!("pay_monthly_{username}"),
            )],
        ],
    }
}

pub fn bot_payment_options() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![InlineKeyboardButton::callback(
                "💳 Karta orqali",
                "pay_with_card_monthly",
            )],
            vec![InlineKeyboardButton::callback(
                "💰 Balansdan",
                "pay_with_balance_monthly",
            )],
            vec![InlineKeyboardButton::callback("Ortga", "select_bot_0")],
        ],
    }
}

/// One row per provisioned bot, for the owner's settings flow. `times`
/// supplies the display-only creation timestamps.
pub fn user_bots(bots: &[&BotRecord], times: impl Fn(&str) -> String) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: bots
            .iter()
            .enumerate()
            .map(|(index, record)| {
                vec![InlineKeyboardButton::callback(
                    format!("@{} (Yaratilgan: {})", record.username, times(&record.username)),
                    format!("select_bot_{index}"),
                )]
            })
            .collect(),
    }
}

/// Admin view: every bot with its active flag, toggled on press.
pub fn admin_bot_list(bots: &[BotRecord], times: impl Fn(&str) -> String) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: bots
            .iter()
            .map(|record| {
                let status = if record.active { "✅" } else { "❌" };
                vec![InlineKeyboardButton::callback(
                    format!(
                        "{status} @{} (Yaratilgan: {})",
                        record.username,
                        times(&record.username)
                    ),
                    format!("toggle_bot_{}", record.username),
                )]
            })
            .collect(),
    }
}

pub fn approve(callback_data: String) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton::callback(
            "✅ Tasdiqlash",
            callback_data,
        )]],
    }
}

pub fn admin_contact(admin_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton::url(
            "Admin bilan bog'lanish 👨🏻‍💻",
            format!("tg://user?id={admin_id}"),
        )]],
    }
}

fn single_callback(text: &str, data: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton::callback(text, data)]],
    }
}
