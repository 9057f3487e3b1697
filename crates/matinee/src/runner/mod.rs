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

//! A single child-bot instance: movie-code lookup and gated delivery.
//!
//! Each runner is its own operating-system process with its own transport
//! session and its own document set, scoped by bot username. The hub
//! launches runners but never talks to them again.

pub mod catalog;
pub mod flow;
pub mod handlers;

use clap::Args;
use clap_verbosity_flag::Verbosity;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_log::AsTrace;

use matinee_common::error::Result;
use matinee_common::store::{runner_dir, Document, DocumentStore};
use matinee_common::telegram::{BotApi, Transport};

use crate::settings::RunnerSettings;
use catalog::{CatalogEntry, DownloadStats, MovieInfo};
use flow::Pending;

#[derive(Debug, Args)]
pub struct RunnerArgs {
    /// Verbosity
    #[command(flatten)]
    verbose: Verbosity,

    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bot credential, as issued by BotFather
    token: String,

    /// Username the credential belongs to
    username: String,
}

/// Everything a runner handler touches. All documents are loaded once at
/// startup and mutated in memory from then on.
pub struct RunnerContext<T> {
    pub transport: T,
    pub settings: RunnerSettings,
    pub store: DocumentStore,
    pub username: String,
    pub catalog: Document<BTreeMap<String, CatalogEntry>>,
    pub metadata: Document<BTreeMap<String, MovieInfo>>,
    pub statistics: Document<BTreeMap<String, DownloadStats>>,
    pub channels: Document<Vec<String>>,
    pub admins: Document<Vec<i64>>,
    pub users: Document<BTreeSet<i64>>,
    pub sessions: HashMap<i64, Pending>,
}

impl<T: Transport> RunnerContext<T> {
    pub fn new(transport: T, store: DocumentStore, settings: RunnerSettings, username: &str) -> Self {
        let catalog = store.load("catalog");
        let metadata = store.load("metadata");
        let statistics = store.load("statistics");
        let channels = store.load("channels");
        let admins = store.load("admins");
        let users = store.load("users");
        Self {
            transport,
            settings,
            store,
            username: username.trim_start_matches('@').to_owned(),
            catalog,
            metadata,
            statistics,
            channels,
            admins,
            users,
            sessions: HashMap::new(),
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admins.data.contains(&user_id)
    }

    pub fn record_user(&mut self, user_id: i64) {
        if self.users.data.insert(user_id) {
            self.store.save(&mut self.users);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// PUBLIC FUNCTION
////////////////////////////////////////////////////////////////////////////////

pub async fn init_runner(args: RunnerArgs) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(args.verbose.log_level_filter().as_trace())
        .init();

    let settings = RunnerSettings::load(args.config.as_deref())?;
    let dir = runner_dir(&settings.data_dir, &args.username);
    let store = DocumentStore::open(&dir)?;
    let transport = BotApi::new(&args.token);
    let mut ctx = RunnerContext::new(transport, store, settings, &args.username);
    info!(username =% ctx.username, "runner is running");

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
