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

//! Child-instance provisioning and the runner process registry.
//!
//! The registry records desired state (should the runner be up, and with
//! which credential) separately from observed state (the pid of the last
//! launch). There is no supervision: a crashed runner stays crashed until
//! someone restarts the hub.

use chrono::Local;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, warn};

use matinee_common::error::{MatineeError, Result};
use matinee_common::telegram::Transport;

use super::ledger::{BotRecord, CREATED_FORMAT};
use super::HubContext;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("credential rejected by the transport")]
    InvalidCredential,
    #[error("claimed username `{claimed}` does not match `{actual}`")]
    UsernameMismatch { claimed: String, actual: String },
}

pub trait Launcher {
    fn launch(&mut self, token: &str, username: &str) -> Result<u32>;
}

/// Spawns `matinee runner <token> <username>` detached. No IPC channel
/// back, no readiness signal.
pub struct RunnerLauncher;

impl Launcher for RunnerLauncher {
    fn launch(&mut self, token: &str, username: &str) -> Result<u32> {
        let exe = std::env::current_exe()?;
        let child = std::process::Command::new(exe)
            .arg("runner")
            .arg(token)
            .arg(username)
            .spawn()
            .map_err(|err| MatineeError::Launch(err.to_string()))?;
        Ok(child.id())
    }
}

#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub token: String,
    pub should_run: bool,
    pub pid: Option<u32>,
    pub launched_at: Option<String>,
}

pub struct ProcessRegistry<L> {
    launcher: L,
    entries: HashMap<String, RegistryEntry>,
}

impl<L: Launcher> ProcessRegistry<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            entries: HashMap::new(),
        }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn entry(&self, username: &str) -> Option<&RegistryEntry> {
        self.entries.get(username)
    }

    pub fn ensure(&mut self, username: &str, token: &str, should_run: bool) {
        let entry = self
            .entries
            .entry(username.to_owned())
            .or_insert_with(|| RegistryEntry {
                token: token.to_owned(),
                should_run,
                pid: None,
                launched_at: None,
            });
        entry.token = token.to_owned();
        entry.should_run = should_run;
    }

    pub fn set_should_run(&mut self, username: &str, should_run: bool) {
        if let Some(entry) = self.entries.get_mut(username) {
            entry.should_run = should_run;
        }
    }

    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(entry) = self.entries.remove(from) {
            self.entries.insert(to.to_owned(), entry);
        }
    }

    /// Fire-and-forget launch of a registered runner. Failure is logged;
    /// the observed state just stays empty.
    pub fn launch(&mut self, username: &str) {
        let Some(entry) = self.entries.get_mut(username) else {
            warn!(username =% username, "launch requested for unregistered runner");
            return;
        };
        match self.launcher.launch(&entry.token, username) {
            Ok(pid) => {
                entry.pid = Some(pid);
                entry.launched_at = Some(Local::now().format(CREATED_FORMAT).to_string());
                info!(username =% username, pid, "runner process launched");
            }
            Err(err) => {
                warn!(username =% username, error =% err, "failed to launch runner process");
            }
        }
    }
}

/// Validates a credential/username pair against the transport, persists the
/// ledger and starts a runner. On the rename path (`rename` holds the old
/// username) the existing record is updated in place.
///
/// A launch failure after the ledger was persisted is logged but not rolled
/// back (an orphaned record with no running process is possible).
pub async fn provision<T: Transport, L: Launcher>(
    ctx: &mut HubContext<T, L>,
    token: &str,
    claimed_username: &str,
    owner_id: i64,
    rename: Option<&str>,
) -> Result<BotRecord, ProvisionError> {
    let identity = match ctx.transport.fetch_identity(token).await {
        Ok(identity) => identity,
        Err(err) => {
            warn!(error =% err, "credential verification failed");
            return Err(ProvisionError::InvalidCredential);
        }
    };

    let claimed = claimed_username.trim().trim_start_matches('@').to_owned();
    if !claimed.eq_ignore_ascii_case(&identity.username) {
        return Err(ProvisionError::UsernameMismatch {
            claimed,
            actual: identity.username,
        });
    }

    let record = if let Some(previous) = rename
        && let Some(existing) = ctx
            .bots
            .data
            .iter_mut()
            .find(|record| record.owner_id == owner_id && record.username == previous)
    {
        existing.username = claimed.clone();
        existing.bot_token = token.to_owned();
        let record = existing.clone();
        if let Some(time) = ctx.created.data.remove(previous) {
            ctx.created.data.insert(claimed.clone(), time);
        }
        ctx.registry.rename(previous, &claimed);
        record
    } else {
        let now = Local::now().format(CREATED_FORMAT).to_string();
        let record = BotRecord {
            bot_token: token.to_owned(),
            username: claimed.clone(),
            owner_id,
            created_date: now.clone(),
            active: true,
        };
        ctx.bots.data.push(record.clone());
        ctx.created.data.insert(claimed.clone(), now);
        record
    };

    ctx.store.save(&mut ctx.bots);
    ctx.store.save(&mut ctx.created);

    ctx.registry.ensure(&claimed, token, true);
    ctx.registry.launch(&claimed);

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingLauncher;

    impl Launcher for FailingLauncher {
        fn launch(&mut self, _token: &str, _username: &str) -> Result<u32> {
            Err(MatineeError::Launch("spawn failed".to_owned()))
        }
    }

    struct CountingLauncher {
        launches: Vec<(String, String)>,
    }

    impl Launcher for CountingLauncher {
        fn launch(&mut self, token: &str, username: &str) -> Result<u32> {
            self.launches.push((token.to_owned(), username.to_owned()));
            Ok(4242)
        }
    }

    #[test]
    fn launch_records_observed_state() {
        let mut registry = ProcessRegistry::new(CountingLauncher { launches: vec![] });
        registry.ensure("my_bot", "123456:ABCDEF", true);
        registry.launch("my_bot");

        let entry = registry.entry("my_bot").unwrap();
        assert_eq!(entry.pid, Some(4242));
        assert!(entry.should_run);
        assert_eq!(
            registry.launcher().launches,
            vec![("123456:ABCDEF".to_owned(), "my_bot".to_owned())]
        );
    }

    #[test]
    fn failed_launch_keeps_desired_state() {
        let mut registry = ProcessRegistry::new(FailingLauncher);
        registry.ensure("my_bot", "123456:ABCDEF", true);
        registry.launch("my_bot");

        let entry = registry.entry("my_bot").unwrap();
        assert!(entry.should_run);
        assert_eq!(entry.pid, None);
    }

    #[test]
    fn rename_moves_the_entry() {
        let mut registry = ProcessRegistry::new(CountingLauncher { launches: vec![] });
        registry.ensure("old_bot", "123456:ABCDEF", true);
        registry.rename("old_bot", "new_bot");
        assert!(registry.entry("old_bot").is_none());
        assert!(registry.entry("new_bot").is_some());
    }
}
