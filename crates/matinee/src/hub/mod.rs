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

//! The top-level bot: payment workflows, the admin approval gate and
//! provisioning of child-bot runner processes.

pub mod action;
pub mod approval;
pub mod flow;
pub mod handlers;
pub mod keyboards;
pub mod ledger;
pub mod provision;

use clap::Args;
use clap_verbosity_flag::Verbosity;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_log::AsTrace;

use matinee_common::error::Result;
use matinee_common::store::{Document, DocumentStore};
use matinee_common::telegram::{BotApi, Transport};

use crate::settings::HubSettings;
use flow::Flow;
use ledger::{Account, BotRecord};
use provision::{Launcher, ProcessRegistry, RunnerLauncher};

#[derive(Debug, Args)]
pub struct HubArgs {
    /// Verbosity
    #[command(flatten)]
    verbose: Verbosity,

    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Everything a hub handler touches, passed explicitly. Documents hold the
/// process's in-memory copy; the store persists them wholesale on every
/// mutation.
pub struct HubContext<T, L> {
    pub transport: T,
    pub settings: HubSettings,
    pub store: DocumentStore,
    pub accounts: Document<BTreeMap<String, Account>>,
    pub bots: Document<Vec<BotRecord>>,
    pub created: Document<BTreeMap<String, String>>,
    pub channels: Document<Vec<String>>,
    pub approvals: Document<BTreeMap<String, String>>,
    pub sessions: HashMap<i64, Flow>,
    pub registry: ProcessRegistry<L>,
}

impl<T: Transport, L: Launcher> HubContext<T, L> {
    pub fn new(transport: T, launcher: L, store: DocumentStore, settings: HubSettings) -> Self {
        let accounts = store.load("accounts");
        let bots = store.load("bots");
        let created = store.load("created");
        let channels = store.load("channels");
        let approvals = store.load("approvals");
        Self {
            transport,
            settings,
            store,
            accounts,
            bots,
            created,
            channels,
            approvals,
            sessions: HashMap::new(),
            registry: ProcessRegistry::new(launcher),
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.settings.admin_id
    }

    /// Reads an account, creating it lazily (and persisting the creation)
    /// on first access.
    pub fn account(&mut self, user_id: i64) -> Account {
        let key = user_id.to_string();
        if let Some(account) = self.accounts.data.get(&key) {
            return account.clone();
        }
        let account = Account::default();
        self.accounts.data.insert(key, account.clone());
        self.store.save(&mut self.accounts);
        account
    }

    pub fn set_account(&mut self, user_id: i64, account: Account) {
        self.accounts.data.insert(user_id.to_string(), account);
        self.store.save(&mut self.accounts);
    }

    /// Display-only creation time from the redundant index.
    pub fn creation_time(&self, username: &str) -> String {
        self.created
            .data
            .get(username.trim_start_matches('@'))
            .cloned()
            .unwrap_or_else(|| "Noma'lum vaqt".to_owned())
    }

    /// Brings the registry in line with the ledger and launches every
    /// record whose desired state is "running".
    pub fn launch_active(&mut self) {
        let records: Vec<(String, String, bool)> = self
            .bots
            .data
            .iter()
            .map(|record| {
                (
                    record.username.clone(),
                    record.bot_token.clone(),
                    record.active,
                )
            })
            .collect();
        for (username, token, active) in records {
            self.registry.ensure(&username, &token, active);
            if active {
                self.registry.launch(&username);
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// PUBLIC FUNCTION
////////////////////////////////////////////////////////////////////////////////

pub async fn init_hub(args: HubArgs) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(args.verbose.log_level_filter().as_trace())
        .init();

    let settings = HubSettings::load(args.config.as_deref())?;
    let store = DocumentStore::open(&settings.data_dir)?;
    let transport = BotApi::new(&settings.api_token);
    let mut ctx = HubContext::new(transport, RunnerLauncher, store, settings);
    ctx.launch_active();
    info!("hub is running");

    let mut offset = 0;
    loop {
        match ctx.transport.get_updates(offset).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    handlers::handle_update(&mut ctx, update).await;
                }
            }
            Err(err) => {
                warn!(error =% err, "polling failed, retrying");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}
