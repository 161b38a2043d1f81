//! `mc` CLI-backed implementation of the replication command port.
//!
//! Commands are spawned directly (argv form, no shell) and every
//! invocation carries an explicit timeout so one unreachable node cannot
//! stall an unrelated operation.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::time::Duration;

use async_trait::async_trait;
use bloomnet_replication::{AliasEntry, ReplicationAdmin};
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

/// Options for configuring `McAdmin`.
pub struct McAdminOptions {
    /// Path to the `mc` binary.
    pub binary: String,

    /// Per-command execution timeout.
    pub timeout: Duration,
}

/// Replication command port backed by the MinIO client CLI.
#[derive(Clone)]
pub struct McAdmin {
    binary: String,
    timeout: Duration,
}

/// One line of `mc alias list --json` output. Older releases emit the URL
/// field in lowercase, so both spellings are accepted.
#[derive(Deserialize)]
struct RawAliasLine {
    alias: Option<String>,
    #[serde(default, alias = "URL")]
    url: Option<String>,
}

impl McAdmin {
    /// Creates a new instance of `McAdmin`.
    #[must_use]
    pub fn new(McAdminOptions { binary, timeout }: McAdminOptions) -> Self {
        Self { binary, timeout }
    }

    async fn run(&self, args: &[&str]) -> Result<String, Error> {
        let rendered = format!("{} {}", self.binary, args.join(" "));
        debug!("running {rendered}");

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.binary)
                .args(args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| Error::Timeout(self.timeout, rendered.clone()))?
        .map_err(|e| Error::Spawn(self.binary.clone(), e))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(Error::Command {
                command: rendered,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }
}

/// Parses `mc alias list --json` output: one JSON object per line, with
/// unparseable lines skipped.
fn parse_alias_lines(stdout: &str) -> Vec<AliasEntry> {
    let mut entries = Vec::new();

    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<RawAliasLine>(line) {
            Ok(RawAliasLine {
                alias: Some(alias),
                url,
            }) => entries.push(AliasEntry {
                alias,
                url: url.unwrap_or_default(),
            }),
            Ok(_) => debug!("skipping alias line without an alias field"),
            Err(e) => debug!("skipping unparseable alias line: {e}"),
        }
    }

    entries
}

#[async_trait]
impl ReplicationAdmin for McAdmin {
    type Error = Error;

    async fn set_alias(
        &self,
        alias: &str,
        url: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<(), Error> {
        self.run(&["alias", "set", alias, url, access_key, secret_key])
            .await
            .map(drop)
    }

    async fn remove_alias(&self, alias: &str) -> Result<(), Error> {
        self.run(&["alias", "remove", alias]).await.map(drop)
    }

    async fn list_aliases(&self) -> Result<Vec<AliasEntry>, Error> {
        let stdout = self.run(&["alias", "list", "--json"]).await?;

        Ok(parse_alias_lines(&stdout))
    }

    async fn reset_replication(&self, alias: &str) -> Result<(), Error> {
        self.run(&["admin", "replicate", "rm", "--all", "--force", alias])
            .await
            .map(drop)
    }

    async fn join_replication(&self, aliases: &[String]) -> Result<(), Error> {
        let mut args = vec!["admin", "replicate", "add"];
        args.extend(aliases.iter().map(String::as_str));

        self.run(&args).await.map(drop)
    }

    async fn wipe_buckets(&self, alias: &str) -> Result<(), Error> {
        self.run(&["rb", "--force", "--dangerous", alias])
            .await
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloomnet_replication::{CommandError, CommandErrorKind};

    #[test]
    fn parses_one_entry_per_line() {
        let stdout = concat!(
            r#"{"status":"success","alias":"alpha","URL":"http://10.0.0.1:9000"}"#,
            "\n",
            r#"{"status":"success","alias":"beta","url":"http://10.0.0.2:9000"}"#,
            "\n",
            "not json at all\n",
            r#"{"status":"success"}"#,
            "\n",
        );

        let entries = parse_alias_lines(stdout);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].alias, "alpha");
        assert_eq!(entries[0].url, "http://10.0.0.1:9000");
        assert_eq!(entries[1].alias, "beta");
        assert_eq!(entries[1].url, "http://10.0.0.2:9000");
    }

    #[test]
    fn classifies_benign_failures() {
        let already = Error::Command {
            command: "mc admin replicate add a b".to_owned(),
            stderr: "site replication is Already configured".to_owned(),
        };
        assert_eq!(already.kind(), CommandErrorKind::AlreadyConfigured);

        let missing = Error::Command {
            command: "mc rb --force --dangerous a".to_owned(),
            stderr: "bucket does not exist".to_owned(),
        };
        assert_eq!(missing.kind(), CommandErrorKind::NotFound);

        let other = Error::Command {
            command: "mc admin replicate add a b".to_owned(),
            stderr: "connection refused".to_owned(),
        };
        assert_eq!(other.kind(), CommandErrorKind::Other);
    }

    #[tokio::test]
    async fn spawn_failure_reads_as_unavailable() {
        let admin = McAdmin::new(McAdminOptions {
            binary: "/nonexistent/mc-binary".to_owned(),
            timeout: Duration::from_secs(1),
        });

        let err = admin.list_aliases().await.unwrap_err();
        assert_eq!(err.kind(), CommandErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn unparseable_stdout_yields_empty_listing() {
        // `echo alias list --json` exits zero and prints nothing parseable.
        let admin = McAdmin::new(McAdminOptions {
            binary: "echo".to_owned(),
            timeout: Duration::from_secs(5),
        });

        assert!(admin.list_aliases().await.unwrap().is_empty());
    }
}
