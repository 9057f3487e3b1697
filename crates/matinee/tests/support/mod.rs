//! Shared fixtures: a scripted transport, a recording launcher and update
//! builders.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use tempfile::TempDir;

use matinee::hub::provision::Launcher;
use matinee::hub::HubContext;
use matinee::runner::RunnerContext;
use matinee::settings::{HubSettings, RunnerSettings};
use matinee_common::error::{MatineeError, Result};
use matinee_common::store::DocumentStore;
use matinee_common::telegram::{
    BotIdentity, CallbackQuery, Chat, ChatMember, InlineKeyboardMarkup, Message, PhotoSize,
    ReplyMarkup, Transport, Update, User,
};

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    pub markup: Option<ReplyMarkup>,
}

#[derive(Debug, Clone)]
pub struct SentPhoto {
    pub chat_id: i64,
    pub file_id: String,
    pub caption: String,
    pub markup: Option<ReplyMarkup>,
}

#[derive(Debug, Clone)]
pub struct CopiedMessage {
    pub chat_id: i64,
    pub from_chat_id: String,
    pub message_id: i64,
    pub caption: Option<String>,
}

/// Scripted stand-in for the chat transport. Calls are recorded; member
/// statuses and credential identities are configured per test.
#[derive(Default)]
pub struct MockTransport {
    pub sent: RefCell<Vec<SentMessage>>,
    pub photos: RefCell<Vec<SentPhoto>>,
    pub edits: RefCell<Vec<(i64, i64, String)>>,
    pub caption_edits: RefCell<Vec<(i64, i64, String)>>,
    pub answers: RefCell<Vec<Option<String>>>,
    pub copied: RefCell<Vec<CopiedMessage>>,
    members: RefCell<HashMap<(String, i64), String>>,
    failing_chats: RefCell<HashSet<String>>,
    identities: RefCell<HashMap<String, String>>,
    fail_copy: Cell<bool>,
}

impl MockTransport {
    pub fn set_member(&self, chat: &str, user_id: i64, status: &str) {
        self.members
            .borrow_mut()
            .insert((chat.to_owned(), user_id), status.to_owned());
    }

    pub fn fail_member_checks(&self, chat: &str) {
        self.failing_chats.borrow_mut().insert(chat.to_owned());
    }

    pub fn set_identity(&self, token: &str, username: &str) {
        self.identities
            .borrow_mut()
            .insert(token.to_owned(), username.to_owned());
    }

    pub fn set_copy_failure(&self, fail: bool) {
        self.fail_copy.set(fail);
    }

    pub fn last_text(&self) -> String {
        self.sent
            .borrow()
            .last()
            .map(|message| message.text.clone())
            .unwrap_or_default()
    }

    pub fn last_answer(&self) -> Option<String> {
        self.answers.borrow().last().cloned().flatten()
    }
}

impl Transport for MockTransport {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<()> {
        self.sent.borrow_mut().push(SentMessage {
            chat_id,
            text: text.to_owned(),
            markup,
        });
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<()> {
        self.photos.borrow_mut().push(SentPhoto {
            chat_id,
            file_id: file_id.to_owned(),
            caption: caption.to_owned(),
            markup,
        });
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        _markup: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        self.edits
            .borrow_mut()
            .push((chat_id, message_id, text.to_owned()));
        Ok(())
    }

    async fn edit_message_caption(
        &self,
        chat_id: i64,
        message_id: i64,
        caption: &str,
    ) -> Result<()> {
        self.caption_edits
            .borrow_mut()
            .push((chat_id, message_id, caption.to_owned()));
        Ok(())
    }

    async fn answer_callback_query(
        &self,
        _callback_id: &str,
        text: Option<&str>,
        _show_alert: bool,
    ) -> Result<()> {
        self.answers.borrow_mut().push(text.map(str::to_owned));
        Ok(())
    }

    async fn get_chat(&self, chat_id: &str) -> Result<Chat> {
        Ok(Chat {
            id: 0,
            title: Some(format!("Kanal {chat_id}")),
            username: None,
            invite_link: Some(format!("https://t.me/+{}", chat_id.trim_start_matches('-'))),
        })
    }

    async fn get_chat_member(&self, chat_id: &str, user_id: i64) -> Result<ChatMember> {
        if self.failing_chats.borrow().contains(chat_id) {
            return Err(MatineeError::Transport("member lookup failed".to_owned()));
        }
        let status = self
            .members
            .borrow()
            .get(&(chat_id.to_owned(), user_id))
            .cloned()
            .unwrap_or_else(|| "left".to_owned());
        Ok(ChatMember { status })
    }

    async fn create_invite_link(&self, chat_id: &str) -> Result<String> {
        Ok(format!("https://t.me/+fresh{}", chat_id.trim_start_matches('-')))
    }

    async fn copy_message(
        &self,
        chat_id: i64,
        from_chat_id: &str,
        message_id: i64,
        caption: Option<&str>,
    ) -> Result<()> {
        if self.fail_copy.get() {
            return Err(MatineeError::Transport("copy failed".to_owned()));
        }
        self.copied.borrow_mut().push(CopiedMessage {
            chat_id,
            from_chat_id: from_chat_id.to_owned(),
            message_id,
            caption: caption.map(str::to_owned),
        });
        Ok(())
    }

    async fn fetch_identity(&self, token: &str) -> Result<BotIdentity> {
        match self.identities.borrow().get(token) {
            Some(username) => Ok(BotIdentity {
                id: 1000,
                username: username.clone(),
            }),
            None => Err(MatineeError::Transport("credential rejected".to_owned())),
        }
    }
}

/// Records launch requests instead of spawning processes.
#[derive(Default)]
pub struct RecordingLauncher {
    pub launched: Vec<(String, String)>,
    pub fail: bool,
}

impl Launcher for RecordingLauncher {
    fn launch(&mut self, token: &str, username: &str) -> Result<u32> {
        if self.fail {
            return Err(MatineeError::Launch("refused".to_owned()));
        }
        self.launched.push((token.to_owned(), username.to_owned()));
        Ok(1000 + self.launched.len() as u32)
    }
}

pub fn hub_ctx(dir: &TempDir, admin_id: i64) -> HubContext<MockTransport, RecordingLauncher> {
    let store = DocumentStore::open(dir.path()).unwrap();
    let settings = HubSettings {
        admin_id,
        ..HubSettings::default()
    };
    HubContext::new(
        MockTransport::default(),
        RecordingLauncher::default(),
        store,
        settings,
    )
}

pub fn runner_ctx(dir: &TempDir) -> RunnerContext<MockTransport> {
    let store = DocumentStore::open(dir.path()).unwrap();
    RunnerContext::new(
        MockTransport::default(),
        store,
        RunnerSettings::default(),
        "test_bot",
    )
}

pub fn text_message(user_id: i64, text: &str) -> Update {
    Update {
        update_id: 0,
        message: Some(Message {
            message_id: 1,
            from: Some(User {
                id: user_id,
                first_name: "Test".to_owned(),
                ..User::default()
            }),
            chat: Chat {
                id: user_id,
                ..Chat::default()
            },
            text: Some(text.to_owned()),
            photo: None,
        }),
        callback_query: None,
    }
}

pub fn photo_message(user_id: i64) -> Update {
    Update {
        update_id: 0,
        message: Some(Message {
            message_id: 2,
            from: Some(User {
                id: user_id,
                first_name: "Test".to_owned(),
                ..User::default()
            }),
            chat: Chat {
                id: user_id,
                ..Chat::default()
            },
            text: None,
            photo: Some(vec![PhotoSize {
                file_id: "proof-photo".to_owned(),
                width: 0,
                height: 0,
            }]),
        }),
        callback_query: None,
    }
}

pub fn callback(user_id: i64, data: &str) -> Update {
    Update {
        update_id: 0,
        message: None,
        callback_query: Some(CallbackQuery {
            id: "cb".to_owned(),
            from: User {
                id: user_id,
                first_name: "Test".to_owned(),
                ..User::default()
            },
            message: Some(Message {
                message_id: 99,
                chat: Chat {
                    id: user_id,
                    ..Chat::default()
                },
                ..Message::default()
            }),
            data: Some(data.to_owned()),
        }),
    }
}

/// First callback payload attached to a markup, if any.
pub fn first_callback_data(markup: &ReplyMarkup) -> Option<String> {
    match markup {
        ReplyMarkup::Inline(keyboard) => keyboard
            .inline_keyboard
            .first()?
            .first()?
            .callback_data
            .clone(),
        _ => None,
    }
}
