//! Channel-subscription gate shared by the hub and the runners.
//!
//! A user passes the gate only when every configured channel reports their
//! membership as something other than "left" or "kicked". Any transport
//! error during a check counts as not subscribed.

use tracing::warn;

use matinee_common::telegram::{InlineKeyboardButton, InlineKeyboardMarkup, Transport};

const CHECK_SUBSCRIPTION: &str = "check_subscription";

/// Returns the channels the user is not a member of. Fail-closed: a failed
/// membership lookup puts the channel on the list.
pub async fn unsubscribed<T: Transport>(
    transport: &T,
    channels: &[String],
    user_id: i64,
) -> Vec<String> {
    let mut missing = Vec::new();
    for channel in channels {
        match transport.get_chat_member(channel, user_id).await {
            Ok(member) if !matches!(member.status.as_str(), "left" | "kicked") => {}
            Ok(_) => missing.push(channel.clone()),
            Err(err) => {
                warn!(channel =% channel, error =% err, "membership check failed");
                missing.push(channel.clone());
            }
        }
    }
    missing
}

/// One join button per channel plus a re-check button. Invite links are
/// fetched live and created on demand when the channel has none.
pub async fn join_keyboard<T: Transport>(
    transport: &T,
    channels: &[String],
    check_label: &str,
) -> InlineKeyboardMarkup {
    let mut keyboard = InlineKeyboardMarkup::default();
    for channel in channels {
        let button = match transport.get_chat(channel).await {
            Ok(chat) => {
                let label = chat
                    .username
                    .as_ref()
                    .map(|username| format!("@{username}"))
                    .or_else(|| chat.title.clone())
                    .unwrap_or_else(|| format!("Kanal {channel}"));
                let link = match chat.invite_link {
                    Some(link) => Some(link),
                    None => match transport.create_invite_link(channel).await {
                        Ok(link) => Some(link),
                        Err(err) => {
                            warn!(channel =% channel, error =% err, "failed to create invite link");
                            None
                        }
                    },
                };
                match link {
                    Some(link) => InlineKeyboardButton::url(label, link),
                    None => InlineKeyboardButton::url(label, fallback_link(channel)),
                }
            }
            Err(err) => {
                warn!(channel =% channel, error =% err, "failed to fetch channel");
                InlineKeyboardButton::url(format!("Kanal {channel}"), fallback_link(channel))
            }
        };
        keyboard.inline_keyboard.push(vec![button]);
    }
    keyboard
        .inline_keyboard
        .push(vec![InlineKeyboardButton::callback(
            check_label,
            CHECK_SUBSCRIPTION,
        )]);
    keyboard
}

fn fallback_link(channel: &str) -> String {
    match channel.strip_prefix("-100") {
        Some(internal) => format!("https://t.me/c/{internal}"),
        None => format!("https://t.me/{}", channel.trim_start_matches('@')),
    }
}
