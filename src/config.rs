use crate::error::{Error, Result};
use crate::superuser::SuperuserRegistry;
use std::collections::HashMap;
use std::time::Duration;

/// Property holding the `;`-separated superuser list.
pub const SUPER_USERS_PROP: &str = "super.users";
/// Property gating access to the consumer offsets topic.
pub const CONSUMER_OFFSETS_ACCESS_ALLOWED_PROP: &str = "consumer.offsets.access.allowed";
/// Property holding the role/share cache time-to-live in milliseconds.
pub const CACHE_TTL_MS_PROP: &str = "cache.ttl.ms";
/// Property holding the maximum number of cached topic owners.
pub const TOPIC_CACHE_MAX_SIZE_PROP: &str = "cache.topic.max.size";

/// Default time-to-live of role and share cache entries.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
/// Default bound of the topic owner cache.
pub const DEFAULT_TOPIC_CACHE_MAX_SIZE: usize = 10_000;

/// Authorizer settings as handed over by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AuthorizerConfig {
    /// Raw `super.users` value, e.g. `User:admin;User:broker-1`.
    pub super_users: String,
    /// Whether the consumer offsets topic is accessible to everyone.
    pub consumer_offsets_access_allowed: bool,
    /// Time-to-live of role and share entries.
    #[cfg_attr(feature = "serde", serde(rename = "cache_ttl_ms", with = "duration_ms"))]
    pub cache_ttl: Duration,
    /// Maximum number of cached topic owners.
    pub topic_cache_max_size: usize,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            super_users: String::new(),
            consumer_offsets_access_allowed: false,
            cache_ttl: DEFAULT_CACHE_TTL,
            topic_cache_max_size: DEFAULT_TOPIC_CACHE_MAX_SIZE,
        }
    }
}

impl AuthorizerConfig {
    /// Parses broker-style string properties.
    ///
    /// Unknown keys are ignored; absent keys keep their defaults.
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = props.get(SUPER_USERS_PROP) {
            config.super_users = value.clone();
        }
        if let Some(value) = props.get(CONSUMER_OFFSETS_ACCESS_ALLOWED_PROP) {
            config.consumer_offsets_access_allowed =
                parse_prop(CONSUMER_OFFSETS_ACCESS_ALLOWED_PROP, value)?;
        }
        if let Some(value) = props.get(CACHE_TTL_MS_PROP) {
            config.cache_ttl = Duration::from_millis(parse_prop(CACHE_TTL_MS_PROP, value)?);
        }
        if let Some(value) = props.get(TOPIC_CACHE_MAX_SIZE_PROP) {
            config.topic_cache_max_size = parse_prop(TOPIC_CACHE_MAX_SIZE_PROP, value)?;
        }

        // Surface malformed superuser entries at configuration time.
        config.superuser_registry()?;
        Ok(config)
    }

    /// Adds a superuser entry of the form `Type:name`.
    pub fn with_super_user(mut self, principal: &str) -> Self {
        if !self.super_users.is_empty() {
            self.super_users.push(crate::superuser::SUPERUSER_DELIMITER);
        }
        self.super_users.push_str(principal);
        self
    }

    /// Sets the consumer offsets access flag.
    pub fn with_consumer_offsets_access(mut self, allowed: bool) -> Self {
        self.consumer_offsets_access_allowed = allowed;
        self
    }

    /// Sets the role/share cache time-to-live.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the topic owner cache bound.
    pub fn with_topic_cache_max_size(mut self, max_size: usize) -> Self {
        self.topic_cache_max_size = max_size;
        self
    }

    /// Builds the superuser registry from `super_users`.
    pub fn superuser_registry(&self) -> Result<SuperuserRegistry> {
        SuperuserRegistry::parse(&self.super_users)
    }
}

fn parse_prop<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|err| Error::Config(format!("{key}={value}: {err}")))
}

#[cfg(feature = "serde")]
mod duration_ms {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
