//! Bidirectional alias/host resolution built from registry listings.

use std::collections::HashMap;

use tracing::debug;
use url::Url;

use crate::AliasEntry;

/// Bidirectional mapping between aliases and node host addresses.
///
/// Built fresh from a registry listing each time it is needed; entries
/// whose URL lacks a parseable scheme or host are dropped from the maps.
#[derive(Clone, Debug, Default)]
pub struct AliasDirectory {
    host_by_alias: HashMap<String, String>,
    alias_by_host: HashMap<String, String>,
}

impl AliasDirectory {
    /// Builds a directory from raw registry entries.
    #[must_use]
    pub fn from_entries(entries: &[AliasEntry]) -> Self {
        let mut directory = Self::default();

        for entry in entries {
            let host = Url::parse(&entry.url)
                .ok()
                .and_then(|url| url.host_str().map(str::to_owned));

            match host {
                Some(host) => {
                    directory
                        .host_by_alias
                        .insert(entry.alias.clone(), host.clone());
                    directory.alias_by_host.insert(host, entry.alias.clone());
                }
                None => debug!(
                    "dropping alias '{}' with malformed url '{}'",
                    entry.alias, entry.url
                ),
            }
        }

        directory
    }

    /// Resolves an alias to its node host address.
    #[must_use]
    pub fn host(&self, alias: &str) -> Option<&str> {
        self.host_by_alias.get(alias).map(String::as_str)
    }

    /// Resolves a node host address back to its alias.
    #[must_use]
    pub fn alias_for(&self, host: &str) -> Option<&str> {
        self.alias_by_host.get(host).map(String::as_str)
    }

    /// Number of resolvable aliases in the directory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.host_by_alias.len()
    }

    /// Whether no alias resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.host_by_alias.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(alias: &str, url: &str) -> AliasEntry {
        AliasEntry {
            alias: alias.to_owned(),
            url: url.to_owned(),
        }
    }

    #[test]
    fn resolves_both_directions() {
        let directory = AliasDirectory::from_entries(&[
            entry("alpha", "http://10.0.0.1:9000"),
            entry("beta", "https://storage.example.com:9000"),
        ]);

        assert_eq!(directory.host("alpha"), Some("10.0.0.1"));
        assert_eq!(directory.alias_for("10.0.0.1"), Some("alpha"));
        assert_eq!(directory.host("beta"), Some("storage.example.com"));
        assert_eq!(directory.alias_for("storage.example.com"), Some("beta"));
    }

    #[test]
    fn drops_malformed_urls() {
        let directory = AliasDirectory::from_entries(&[
            entry("alpha", "http://10.0.0.1:9000"),
            entry("no-scheme", "10.0.0.2:9000"),
            entry("empty", ""),
        ]);

        assert_eq!(directory.len(), 1);
        assert_eq!(directory.host("no-scheme"), None);
        assert_eq!(directory.host("empty"), None);
    }

    #[test]
    fn unknown_lookups_miss() {
        let directory = AliasDirectory::from_entries(&[entry("alpha", "http://10.0.0.1:9000")]);

        assert_eq!(directory.host("ghost"), None);
        assert_eq!(directory.alias_for("10.9.9.9"), None);
    }
}
