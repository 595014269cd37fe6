//! Project-ownership authorization core for multi-tenant message brokers.
//!
//! Topics belong to projects, users hold a role within one project, and
//! projects may share their topics with other projects. [`Authorizer`]
//! resolves those relations through three read-through caches over a
//! pluggable [`ProjectDirectory`] and turns them into an Allow/Deny
//! [`Decision`]. Every failure path denies.
//!
//! # Examples
//!
//! Authorizing against the in-memory directory (enable `memory-directory`):
//! ```no_run
//! use broker_authz::{AuthorizerBuilder, Operation, Principal, ResourceType};
//! # #[cfg(feature = "memory-directory")]
//! # {
//! use broker_authz::{MemoryDirectory, ProjectId, ProjectName, ProjectRole, UserName};
//! let directory = MemoryDirectory::new();
//! directory.add_project(ProjectName::try_from("demo").unwrap(), ProjectId::new(1));
//! directory.add_member(
//!     ProjectId::new(1),
//!     UserName::try_from("alice").unwrap(),
//!     ProjectRole::DataOwner,
//! );
//! directory.add_topic("events", ProjectId::new(1));
//!
//! let authorizer = AuthorizerBuilder::new(directory).build();
//! let principal = Principal::new("demo__alice");
//! let decision = futures::executor::block_on(authorizer.authorize(
//!     &principal,
//!     Operation::Write,
//!     ResourceType::Topic,
//!     "events",
//!     "10.0.0.1",
//! ));
//! assert!(decision.is_allowed());
//! # }
//! ```
//!
//! Building from broker properties:
//! ```no_run
//! use broker_authz::AuthorizerConfig;
//! use std::collections::HashMap;
//! let mut props = HashMap::new();
//! props.insert("super.users".to_string(), "User:admin".to_string());
//! props.insert("cache.ttl.ms".to_string(), "30000".to_string());
//! let config = AuthorizerConfig::from_properties(&props).unwrap();
//! # let _ = config;
//! ```
#![forbid(unsafe_code)]

mod cache;
mod config;
mod directory;
mod engine;
mod error;
mod operation;
mod permission;
mod role;
mod superuser;
mod types;

#[cfg(feature = "memory-directory")]
mod memory_directory;

pub use crate::cache::{LoadingCache, ProjectCaches, ShareCache, TopicOwnerCache, UserRoleCache};
pub use crate::config::{
    AuthorizerConfig, CACHE_TTL_MS_PROP, CONSUMER_OFFSETS_ACCESS_ALLOWED_PROP, DEFAULT_CACHE_TTL,
    DEFAULT_TOPIC_CACHE_MAX_SIZE, SUPER_USERS_PROP, TOPIC_CACHE_MAX_SIZE_PROP,
};
pub use crate::directory::{ProjectDirectory, RoleRecord, ShareRecord, TopicOwnerRecord};
pub use crate::engine::{
    AUDIT_TARGET, Authorizer, AuthorizerBuilder, CONSUMER_OFFSETS_TOPIC, Decision,
};
pub use crate::error::{Error, LookupError, LookupResult, Result, SourceError};
pub use crate::operation::{Operation, ResourceType};
pub use crate::permission::evaluate as evaluate_permission;
pub use crate::role::{ProjectRole, SharePermission};
pub use crate::superuser::{SUPERUSER_DELIMITER, SuperuserRegistry};
pub use crate::types::{
    ANONYMOUS, IDENTITY_DELIMITER, PROJECT_USER_DELIMITER, Principal, ProjectId, ProjectName,
    UserName,
};

#[cfg(feature = "memory-directory")]
pub use crate::memory_directory::MemoryDirectory;
