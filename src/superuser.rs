use crate::error::{Error, Result};
use crate::types::Principal;
use std::collections::HashSet;

/// Separates entries of the `super.users` property.
pub const SUPERUSER_DELIMITER: char = ';';

/// Immutable set of principal identities exempt from project checks.
///
/// Built once from configuration. Reconfiguring means building a new
/// [`crate::Authorizer`], never mutating a shared registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuperuserRegistry {
    identities: HashSet<String>,
}

impl SuperuserRegistry {
    /// Creates a registry from bare identity names.
    pub fn new<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identities: identities.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a `;`-separated list of `Type:name` principals, e.g.
    /// `User:admin;User:broker-1.example.com`.
    ///
    /// Empty entries are skipped. An entry lacking the `Type:` prefix or
    /// with an empty part is a configuration error.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut identities = HashSet::new();
        for entry in raw.split(SUPERUSER_DELIMITER).map(str::trim) {
            if entry.is_empty() {
                continue;
            }
            let (kind, name) = entry.split_once(':').ok_or_else(|| {
                Error::Config(format!(
                    "superuser entry {entry} must be of the form <type>:<name>"
                ))
            })?;
            let (kind, name) = (kind.trim(), name.trim());
            if kind.is_empty() || name.is_empty() {
                return Err(Error::Config(format!(
                    "superuser entry {entry} has an empty type or name"
                )));
            }
            identities.insert(name.to_string());
        }
        Ok(Self { identities })
    }

    /// Returns true if `identity` is a superuser.
    pub fn contains(&self, identity: &str) -> bool {
        self.identities.contains(identity)
    }

    /// Returns the first identity of `principal` found in the registry.
    pub fn matching<'a>(&self, principal: &'a Principal) -> Option<&'a str> {
        principal
            .identities()
            .iter()
            .map(String::as_str)
            .find(|identity| self.contains(identity))
    }

    /// Number of registered superusers.
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Returns true when no superusers are configured.
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
