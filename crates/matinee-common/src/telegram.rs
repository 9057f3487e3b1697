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

//! Telegram Bot API transport.
//!
//! The [`Transport`] trait carries exactly the primitives the platform
//! depends on; [`BotApi`] is the HTTP implementation. Handlers are generic
//! over the trait so tests can script the collaborator.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::error::{MatineeError, Result};

const API_ROOT: &str = "https://api.telegram.org";

// Polling blocks server-side for up to `POLL_TIMEOUT`; the HTTP timeout
// has to outlast it.
const POLL_TIMEOUT: u64 = 30;
const HTTP_TIMEOUT: u64 = 90;

////////////////////////////////////////////////////////////////////////////////
// WIRE TYPES
////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub invite_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// Chat to address fail-soft apologies to, when there is one.
    pub fn chat_id(&self) -> Option<i64> {
        if let Some(message) = &self.message {
            return Some(message.chat.id);
        }
        if let Some(callback) = &self.callback_query
            && let Some(message) = &callback.message
        {
            return Some(message.chat.id);
        }
        None
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMember {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatInviteLink {
    pub invite_link: String,
}

/// What a credential claims to be, fetched live from the transport.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub id: i64,
    pub username: String,
}

////////////////////////////////////////////////////////////////////////////////
// KEYBOARDS
////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

impl InlineKeyboardButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: None,
            callback_data: Some(data.into()),
        }
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: Some(url.into()),
            callback_data: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

impl KeyboardButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboardRemove {
    pub remove_keyboard: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Inline(InlineKeyboardMarkup),
    Reply(ReplyKeyboardMarkup),
    Remove(ReplyKeyboardRemove),
}

impl ReplyMarkup {
    pub fn remove() -> Self {
        ReplyMarkup::Remove(ReplyKeyboardRemove {
            remove_keyboard: true,
        })
    }
}

impl From<InlineKeyboardMarkup> for ReplyMarkup {
    fn from(markup: InlineKeyboardMarkup) -> Self {
        ReplyMarkup::Inline(markup)
    }
}

impl From<ReplyKeyboardMarkup> for ReplyMarkup {
    fn from(markup: ReplyKeyboardMarkup) -> Self {
        ReplyMarkup::Reply(markup)
    }
}

////////////////////////////////////////////////////////////////////////////////
// TRANSPORT
////////////////////////////////////////////////////////////////////////////////

#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<()>;

    async fn send_photo(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<()>;

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<()>;

    async fn edit_message_caption(
        &self,
        chat_id: i64,
        message_id: i64,
        caption: &str,
    ) -> Result<()>;

    async fn answer_callback_query(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<()>;

    async fn get_chat(&self, chat_id: &str) -> Result<Chat>;

    async fn get_chat_member(&self, chat_id: &str, user_id: i64) -> Result<ChatMember>;

    async fn create_invite_link(&self, chat_id: &str) -> Result<String>;

    /// Re-deliver a message from its original location into `chat_id`.
    async fn copy_message(
        &self,
        chat_id: i64,
        from_chat_id: &str,
        message_id: i64,
        caption: Option<&str>,
    ) -> Result<()>;

    /// Opens a session on a foreign credential and asks it who it is. This
    /// is the live validation step of provisioning.
    async fn fetch_identity(&self, token: &str) -> Result<BotIdentity>;
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BotApi {
    client: reqwest::Client,
    base: String,
}

impl BotApi {
    pub fn new(token: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base: format!("{API_ROOT}/bot{token}"),
        }
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, payload: serde_json::Value) -> Result<R> {
        let url = format!("{}/{method}", self.base);
        let response = self.client.post(&url).json(&payload).send().await?;
        let body: ApiResponse<R> = response.json().await?;
        if body.ok {
            body.result
                .ok_or_else(|| MatineeError::Transport(format!("{method}: empty result")))
        } else {
            Err(MatineeError::Transport(format!(
                "{method}: {}",
                body.description.unwrap_or_else(|| "unknown error".to_owned())
            )))
        }
    }

    /// Long-poll for the next batch of updates.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({ "offset": offset, "timeout": POLL_TIMEOUT }),
        )
        .await
    }
}

impl Transport for BotApi {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<()> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        if let Some(markup) = markup {
            payload["reply_markup"] = serde_json::to_value(&markup)?;
        }
        self.call::<serde_json::Value>("sendMessage", payload).await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<()> {
        let mut payload = json!({
            "chat_id": chat_id,
            "photo": file_id,
            "caption": caption,
        });
        if let Some(markup) = markup {
            payload["reply_markup"] = serde_json::to_value(&markup)?;
        }
        self.call::<serde_json::Value>("sendPhoto", payload).await?;
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        let mut payload = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        if let Some(markup) = markup {
            payload["reply_markup"] = serde_json::to_value(&markup)?;
        }
        self.call::<serde_json::Value>("editMessageText", payload)
            .await?;
        Ok(())
    }

    async fn edit_message_caption(
        &self,
        chat_id: i64,
        message_id: i64,
        caption: &str,
    ) -> Result<()> {
        self.call::<serde_json::Value>(
            "editMessageCaption",
            json!({
                "chat_id": chat_id,
                "message_id": message_id,
                "caption": caption,
            }),
        )
        .await?;
        Ok(())
    }

    async fn answer_callback_query(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<()> {
        let mut payload = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            payload["text"] = json!(text);
            payload["show_alert"] = json!(show_alert);
        }
        // answerCallbackQuery returns a bare boolean
        self.call::<bool>("answerCallbackQuery", payload).await?;
        Ok(())
    }

    async fn get_chat(&self, chat_id: &str) -> Result<Chat> {
        self.call("getChat", json!({ "chat_id": chat_id })).await
    }

    async fn get_chat_member(&self, chat_id: &str, user_id: i64) -> Result<ChatMember> {
        self.call(
            "getChatMember",
            json!({ "chat_id": chat_id, "user_id": user_id }),
        )
        .await
    }

    async fn create_invite_link(&self, chat_id: &str) -> Result<String> {
        let link: ChatInviteLink = self
            .call("createChatInviteLink", json!({ "chat_id": chat_id }))
            .await?;
        Ok(link.invite_link)
    }

    async fn copy_message(
        &self,
        chat_id: i64,
        from_chat_id: &str,
        message_id: i64,
        caption: Option<&str>,
    ) -> Result<()> {
        let mut payload = json!({
            "chat_id": chat_id,
            "from_chat_id": from_chat_id,
            "message_id": message_id,
        });
        if let Some(caption) = caption {
            payload["caption"] = json!(caption);
            payload["parse_mode"] = json!("Markdown");
        }
        self.call::<serde_json::Value>("copyMessage", payload).await?;
        Ok(())
    }

    async fn fetch_identity(&self, token: &str) -> Result<BotIdentity> {
        let url = format!("{API_ROOT}/bot{token}/getMe");
        let response = self.client.post(&url).send().await?;
        let body: ApiResponse<User> = response.json().await?;
        match body {
            ApiResponse {
                ok: true,
                result: Some(me),
                ..
            } => Ok(BotIdentity {
                id: me.id,
                username: me.username.unwrap_or_default(),
            }),
            ApiResponse { description, .. } => Err(MatineeError::Transport(format!(
                "getMe: {}",
                description.unwrap_or_else(|| "credential rejected".to_owned())
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_markup_serializes_untagged() {
        let markup = ReplyMarkup::Inline(InlineKeyboardMarkup {
            inline_keyboard: vec![vec![InlineKeyboardButton::callback("Ok", "ok")]],
        });
        let value = serde_json::to_value(&markup).unwrap();
        assert_eq!(value["inline_keyboard"][0][0]["text"], "Ok");
        assert_eq!(value["inline_keyboard"][0][0]["callback_data"], "ok");
        assert!(value["inline_keyboard"][0][0].get("url").is_none());
    }

    #[test]
    fn update_chat_id_prefers_message() {
        let update = Update {
            update_id: 1,
            message: Some(Message {
                chat: Chat {
                    id: 42,
                    ..Chat::default()
                },
                ..Message::default()
            }),
            callback_query: None,
        };
        assert_eq!(update.chat_id(), Some(42));
    }
}
