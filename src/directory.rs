use crate::error::LookupResult;
use crate::role::{ProjectRole, SharePermission};
use crate::types::{ProjectId, ProjectName, UserName};
use async_trait::async_trait;

/// Owning project of a topic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TopicOwnerRecord {
    pub project_id: ProjectId,
}

/// A user's project and role within it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleRecord {
    pub project_id: ProjectId,
    pub role: ProjectRole,
}

/// Grant letting a requesting project access an owner project's topics.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ShareRecord {
    pub permission: SharePermission,
}

/// Typed lookups against the external project directory.
///
/// Implementations return [`crate::LookupError::NotFound`] when no row
/// matches and [`crate::LookupError::Transient`] for connectivity or I/O
/// failures. Connection pooling is the implementation's concern.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Returns the project owning `topic`.
    async fn topic_project(&self, topic: &str) -> LookupResult<TopicOwnerRecord>;

    /// Returns the project id and role of `user` within `project`.
    async fn project_role(
        &self,
        project: &ProjectName,
        user: &UserName,
    ) -> LookupResult<RoleRecord>;

    /// Returns the share grant from `owner` to `requester`.
    async fn shared_project(
        &self,
        requester: ProjectId,
        owner: ProjectId,
    ) -> LookupResult<ShareRecord>;
}
