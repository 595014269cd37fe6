use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::directory::{ProjectDirectory, RoleRecord, ShareRecord, TopicOwnerRecord};
use crate::error::{LookupError, LookupResult};
use crate::role::{ProjectRole, SharePermission};
use crate::types::{ProjectId, ProjectName, UserName};

/// In-memory project directory for tests and demos.
///
/// Clones share state, so a test can keep a handle and mutate the directory
/// after handing it to an authorizer.
#[derive(Debug, Default, Clone)]
pub struct MemoryDirectory {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    projects: RwLock<HashMap<ProjectName, ProjectId>>,
    members: RwLock<HashMap<(ProjectId, UserName), ProjectRole>>,
    topics: RwLock<HashMap<String, ProjectId>>,
    shares: RwLock<HashMap<(ProjectId, ProjectId), SharePermission>>,
    pending_failures: AtomicUsize,
    calls: AtomicUsize,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a project.
    pub fn add_project(&self, name: ProjectName, id: ProjectId) {
        let mut guard = self
            .inner
            .projects
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.insert(name, id);
    }

    /// Adds a user to a project with `role`.
    pub fn add_member(&self, project: ProjectId, user: UserName, role: ProjectRole) {
        let mut guard = self
            .inner
            .members
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.insert((project, user), role);
    }

    /// Assigns `topic` to its owning project.
    pub fn add_topic(&self, topic: impl Into<String>, owner: ProjectId) {
        let mut guard = self
            .inner
            .topics
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.insert(topic.into(), owner);
    }

    /// Shares `owner`'s topics with `requester`.
    pub fn share(&self, owner: ProjectId, requester: ProjectId, permission: SharePermission) {
        let mut guard = self
            .inner
            .shares
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.insert((owner, requester), permission);
    }

    /// Makes the next `count` lookups fail with a transient error.
    pub fn fail_next(&self, count: usize) {
        self.inner.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Number of lookups served so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    fn begin_call(&self) -> LookupResult<()> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .inner
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(LookupError::transient("injected directory failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectDirectory for MemoryDirectory {
    async fn topic_project(&self, topic: &str) -> LookupResult<TopicOwnerRecord> {
        self.begin_call()?;
        let guard = self
            .inner
            .topics
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard
            .get(topic)
            .map(|project_id| TopicOwnerRecord {
                project_id: *project_id,
            })
            .ok_or(LookupError::NotFound)
    }

    async fn project_role(
        &self,
        project: &ProjectName,
        user: &UserName,
    ) -> LookupResult<RoleRecord> {
        self.begin_call()?;
        let project_id = {
            let guard = self
                .inner
                .projects
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            *guard.get(project).ok_or(LookupError::NotFound)?
        };
        let guard = self
            .inner
            .members
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard
            .get(&(project_id, user.clone()))
            .map(|role| RoleRecord {
                project_id,
                role: role.clone(),
            })
            .ok_or(LookupError::NotFound)
    }

    async fn shared_project(
        &self,
        requester: ProjectId,
        owner: ProjectId,
    ) -> LookupResult<ShareRecord> {
        self.begin_call()?;
        let guard = self
            .inner
            .shares
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard
            .get(&(owner, requester))
            .map(|permission| ShareRecord {
                permission: *permission,
            })
            .ok_or(LookupError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn memory_directory_should_support_basic_flow() {
        let directory = MemoryDirectory::new();
        let project = ProjectName::try_from("demo").unwrap();
        let user = UserName::try_from("alice").unwrap();
        directory.add_project(project.clone(), ProjectId::new(7));
        directory.add_member(ProjectId::new(7), user.clone(), ProjectRole::DataOwner);
        directory.add_topic("events", ProjectId::new(7));

        let owner = block_on(directory.topic_project("events")).unwrap();
        assert_eq!(owner.project_id, ProjectId::new(7));
        let role = block_on(directory.project_role(&project, &user)).unwrap();
        assert_eq!(role.role, ProjectRole::DataOwner);
        assert!(matches!(
            block_on(directory.shared_project(ProjectId::new(8), ProjectId::new(7))),
            Err(LookupError::NotFound)
        ));
        assert_eq!(directory.calls(), 3);
    }

    #[test]
    fn fail_next_should_inject_transient_errors() {
        let directory = MemoryDirectory::new();
        directory.add_topic("events", ProjectId::new(7));
        directory.fail_next(1);

        assert!(block_on(directory.topic_project("events")).unwrap_err().is_transient());
        assert!(block_on(directory.topic_project("events")).is_ok());
    }
}
