use crate::cache::ProjectCaches;
use crate::config::{AuthorizerConfig, DEFAULT_CACHE_TTL, DEFAULT_TOPIC_CACHE_MAX_SIZE};
use crate::directory::ProjectDirectory;
use crate::error::{LookupError, LookupResult, Result};
use crate::operation::{Operation, ResourceType};
use crate::permission;
use crate::superuser::SuperuserRegistry;
use crate::types::{PROJECT_USER_DELIMITER, Principal};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Broker-internal topic holding consumer group offsets.
pub const CONSUMER_OFFSETS_TOPIC: &str = "__consumer_offsets";

/// Log target of the per-decision audit record.
pub const AUDIT_TARGET: &str = "broker_authz::audit";

const DEFAULT_MAX_ATTEMPTS: usize = 2;

/// Authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Access is granted.
    Allow,
    /// Access is denied.
    Deny,
}

impl Decision {
    /// Returns true for [`Decision::Allow`].
    pub fn is_allowed(self) -> bool {
        self == Self::Allow
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::Deny }
    }
}

/// Project-ownership authorizer.
///
/// Shared by every request thread; all methods take `&self`. The caches are
/// created by [`AuthorizerBuilder::build`] and live as long as the
/// authorizer.
#[derive(Debug)]
pub struct Authorizer<D> {
    caches: ProjectCaches<D>,
    superusers: SuperuserRegistry,
    consumer_offsets_access_allowed: bool,
    max_attempts: usize,
}

/// Builder for [`Authorizer`].
pub struct AuthorizerBuilder<D> {
    directory: Arc<D>,
    superusers: SuperuserRegistry,
    consumer_offsets_access_allowed: bool,
    cache_ttl: Duration,
    topic_cache_max_size: usize,
    max_attempts: usize,
}

impl<D> AuthorizerBuilder<D>
where
    D: ProjectDirectory + 'static,
{
    /// Creates a builder with default configuration.
    pub fn new(directory: D) -> Self {
        Self::with_shared_directory(Arc::new(directory))
    }

    /// Creates a builder over a directory that is also used elsewhere.
    pub fn with_shared_directory(directory: Arc<D>) -> Self {
        Self {
            directory,
            superusers: SuperuserRegistry::default(),
            consumer_offsets_access_allowed: false,
            cache_ttl: DEFAULT_CACHE_TTL,
            topic_cache_max_size: DEFAULT_TOPIC_CACHE_MAX_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Creates a builder from parsed configuration.
    ///
    /// Fails if the superuser list is malformed.
    pub fn from_config(directory: D, config: &AuthorizerConfig) -> Result<Self> {
        Ok(Self::new(directory)
            .superusers(config.superuser_registry()?)
            .consumer_offsets_access_allowed(config.consumer_offsets_access_allowed)
            .cache_ttl(config.cache_ttl)
            .topic_cache_max_size(config.topic_cache_max_size))
    }

    /// Sets the superuser registry.
    pub fn superusers(mut self, superusers: SuperuserRegistry) -> Self {
        self.superusers = superusers;
        self
    }

    /// Allows or denies every access to the consumer offsets topic.
    pub fn consumer_offsets_access_allowed(mut self, on: bool) -> Self {
        self.consumer_offsets_access_allowed = on;
        self
    }

    /// Sets the time-to-live of role and share entries.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the maximum number of cached topic owners.
    pub fn topic_cache_max_size(mut self, max_size: usize) -> Self {
        self.topic_cache_max_size = max_size;
        self
    }

    /// Sets how many times a directory lookup is attempted on transient
    /// failures. Values below one are treated as one.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Builds the authorizer.
    pub fn build(self) -> Authorizer<D> {
        Authorizer {
            caches: ProjectCaches::new(self.directory, self.topic_cache_max_size, self.cache_ttl),
            superusers: self.superusers,
            consumer_offsets_access_allowed: self.consumer_offsets_access_allowed,
            max_attempts: self.max_attempts,
        }
    }
}

impl<D> Authorizer<D>
where
    D: ProjectDirectory + 'static,
{
    /// Decides whether `principal` may perform `operation` on a resource.
    ///
    /// Never fails: missing directory data, malformed identities and
    /// exhausted retries all resolve to [`Decision::Deny`]. `host` is only
    /// recorded in the audit log.
    pub async fn authorize(
        &self,
        principal: &Principal,
        operation: Operation,
        resource_type: ResourceType,
        resource_name: &str,
        host: &str,
    ) -> Decision {
        let decision = self
            .evaluate(principal, operation, resource_type, resource_name)
            .await;
        info!(
            target: AUDIT_TARGET,
            %principal,
            %operation,
            %resource_type,
            resource = resource_name,
            host,
            ?decision,
            "authorization decision"
        );
        decision
    }

    /// Returns the caches backing this authorizer.
    pub fn caches(&self) -> &ProjectCaches<D> {
        &self.caches
    }

    /// Returns the superuser registry.
    pub fn superusers(&self) -> &SuperuserRegistry {
        &self.superusers
    }

    async fn evaluate(
        &self,
        principal: &Principal,
        operation: Operation,
        resource_type: ResourceType,
        resource_name: &str,
    ) -> Decision {
        if principal.is_anonymous() {
            debug!("anonymous principal is never authorized");
            return Decision::Deny;
        }

        if let Some(identity) = self.superusers.matching(principal) {
            info!(%principal, identity, "superuser, skipping project checks");
            return Decision::Allow;
        }

        if resource_name == CONSUMER_OFFSETS_TOPIC {
            return Decision::from(self.consumer_offsets_access_allowed);
        }

        match resource_type {
            ResourceType::Cluster => Decision::from(operation == Operation::IdempotentWrite),
            ResourceType::Group => self.authorize_group(principal, resource_name),
            ResourceType::Topic => self.authorize_topic(principal, operation, resource_name).await,
            ResourceType::TransactionalId | ResourceType::DelegationToken => {
                debug!(%resource_type, "unsupported resource type");
                Decision::Deny
            }
        }
    }

    fn authorize_group(&self, principal: &Principal, group: &str) -> Decision {
        match group.split_once(PROJECT_USER_DELIMITER) {
            Some((group_project, _)) => {
                Decision::from(principal.project_prefix() == Some(group_project))
            }
            // TODO: unscoped groups are shared by every project; deny them
            // once clients are migrated to project-prefixed group ids.
            None => Decision::Allow,
        }
    }

    async fn authorize_topic(
        &self,
        principal: &Principal,
        operation: Operation,
        topic: &str,
    ) -> Decision {
        let Some(owner) = self
            .lookup("topic owner", move || self.caches.topic_owner(topic))
            .await
        else {
            return Decision::Deny;
        };

        let (project, user) = match principal.project_user() {
            Ok(parts) => parts,
            Err(err) => {
                warn!(%principal, error = %err, "cannot resolve project of principal");
                return Decision::Deny;
            }
        };

        let identity = principal.canonical();
        let (project, user) = (&project, &user);
        let Some((caller_project, role)) = self
            .lookup("project role", move || {
                self.caches.user_role(identity, project, user)
            })
            .await
        else {
            return Decision::Deny;
        };

        if caller_project == owner {
            return permission::evaluate(operation, Some(&role));
        }

        let Some(share) = self
            .lookup("project share", move || {
                self.caches.share(owner, caller_project)
            })
            .await
        else {
            return Decision::Deny;
        };

        debug!(%owner, %caller_project, %share, "cross-project access");
        permission::evaluate(operation, share.effective_role().as_ref())
    }

    /// Runs `attempt` until it succeeds, reports `NotFound`, or has failed
    /// transiently `max_attempts` times.
    async fn lookup<T, F, Fut>(&self, what: &'static str, mut attempt: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = LookupResult<T>>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match attempt().await {
                Ok(value) => return Some(value),
                Err(LookupError::NotFound) => {
                    debug!(what, "no directory entry");
                    return None;
                }
                Err(err) if attempts >= self.max_attempts => {
                    warn!(what, attempts, error = %err, "directory lookup failed, denying");
                    return None;
                }
                Err(err) => {
                    warn!(
                        what,
                        attempt = attempts,
                        error = %err,
                        "directory lookup failed, retrying"
                    );
                }
            }
        }
    }
}
