//! Scriptable mock implementation of the replication command port.
//!
//! Records every issued command in order and supports per-command failure
//! scripting, so orchestration tests can assert both what was run and how
//! partial failures are handled.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bloomnet_replication::{AliasEntry, CommandErrorKind, ReplicationAdmin};

type Scripted = Option<(String, CommandErrorKind)>;

#[derive(Debug, Default)]
struct State {
    aliases: BTreeMap<String, String>,
    commands: Vec<String>,
    fail_list: Scripted,
    fail_join: Scripted,
    fail_reset: Scripted,
    fail_wipe: Scripted,
}

/// Mock replication command port recording every issued command.
#[derive(Clone, Default)]
pub struct MockReplicationAdmin {
    inner: Arc<Mutex<State>>,
}

impl MockReplicationAdmin {
    /// Creates an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates an alias as if it had been configured out-of-band.
    #[must_use]
    pub fn with_alias(self, alias: &str, url: &str) -> Self {
        self.lock().aliases.insert(alias.to_owned(), url.to_owned());
        self
    }

    /// Scripts every `list_aliases` call to fail.
    pub fn fail_listing(&self, message: &str, kind: CommandErrorKind) {
        self.lock().fail_list = Some((message.to_owned(), kind));
    }

    /// Scripts every `join_replication` call to fail.
    pub fn fail_join(&self, message: &str, kind: CommandErrorKind) {
        self.lock().fail_join = Some((message.to_owned(), kind));
    }

    /// Scripts every `reset_replication` call to fail.
    pub fn fail_reset(&self, message: &str, kind: CommandErrorKind) {
        self.lock().fail_reset = Some((message.to_owned(), kind));
    }

    /// Scripts every `wipe_buckets` call to fail.
    pub fn fail_wipe(&self, message: &str, kind: CommandErrorKind) {
        self.lock().fail_wipe = Some((message.to_owned(), kind));
    }

    /// Returns every command issued so far, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.lock().commands.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.inner.lock().expect("mock state lock poisoned")
    }

    fn record(&self, command: String) {
        self.lock().commands.push(command);
    }
}

fn scripted_failure(scripted: &Scripted) -> Result<(), Error> {
    match scripted {
        Some((message, kind)) => Err(Error::new(message.clone(), *kind)),
        None => Ok(()),
    }
}

#[async_trait]
impl ReplicationAdmin for MockReplicationAdmin {
    type Error = Error;

    async fn set_alias(
        &self,
        alias: &str,
        url: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<(), Error> {
        self.record(format!("alias set {alias} {url} {access_key} {secret_key}"));
        self.lock().aliases.insert(alias.to_owned(), url.to_owned());

        Ok(())
    }

    async fn remove_alias(&self, alias: &str) -> Result<(), Error> {
        self.record(format!("alias remove {alias}"));

        if self.lock().aliases.remove(alias).is_none() {
            return Err(Error::new(
                format!("alias '{alias}' does not exist"),
                CommandErrorKind::NotFound,
            ));
        }

        Ok(())
    }

    async fn list_aliases(&self) -> Result<Vec<AliasEntry>, Error> {
        self.record("alias list".to_owned());

        let state = self.lock();
        scripted_failure(&state.fail_list)?;

        Ok(state
            .aliases
            .iter()
            .map(|(alias, url)| AliasEntry {
                alias: alias.clone(),
                url: url.clone(),
            })
            .collect())
    }

    async fn reset_replication(&self, alias: &str) -> Result<(), Error> {
        self.record(format!("replicate rm {alias}"));

        scripted_failure(&self.lock().fail_reset)
    }

    async fn join_replication(&self, aliases: &[String]) -> Result<(), Error> {
        self.record(format!("replicate add {}", aliases.join(" ")));

        scripted_failure(&self.lock().fail_join)
    }

    async fn wipe_buckets(&self, alias: &str) -> Result<(), Error> {
        self.record(format!("rb {alias}"));

        scripted_failure(&self.lock().fail_wipe)
    }
}
