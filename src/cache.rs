use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use tracing::debug;

use crate::directory::ProjectDirectory;
use crate::error::LookupResult;
use crate::role::{ProjectRole, SharePermission};
use crate::types::{ProjectId, ProjectName, UserName};

type SharedLoad<V> = Shared<BoxFuture<'static, LookupResult<V>>>;

/// Read-through cache with per-key load coalescing.
///
/// Entries are evicted least-recently-used once `capacity` is exceeded and
/// expire `ttl` after they were written; either bound is optional. Hits,
/// inserts and evictions are constant time. Only successful loads are
/// stored, so `NotFound` and transient failures are looked up again on the
/// next request. Concurrent misses on one key share a single load; misses on
/// different keys load independently.
pub struct LoadingCache<K, V> {
    inner: Arc<Mutex<CacheState<K, V>>>,
    capacity: Option<usize>,
    ttl: Option<Duration>,
}

struct CacheState<K, V> {
    entries: LruCache<K, CacheEntry<V>>,
    // Keys in write order, for expiring entries without a full scan.
    written: VecDeque<(K, Instant)>,
    in_flight: HashMap<K, InFlight<V>>,
    next_load_id: u64,
}

struct CacheEntry<V> {
    value: V,
    updated_at: Instant,
}

struct InFlight<V> {
    id: u64,
    load: SharedLoad<V>,
}

impl<K, V> Clone for LoadingCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            capacity: self.capacity,
            ttl: self.ttl,
        }
    }
}

impl<K, V> fmt::Debug for LoadingCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<K, V> LoadingCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache with neither a size bound nor expiry.
    pub fn unbounded() -> Self {
        Self::with_entries(LruCache::unbounded(), None)
    }

    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero disables storage; loads are still coalesced.
    pub fn bounded(capacity: usize) -> Self {
        let entries = match NonZeroUsize::new(capacity) {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self::with_entries(entries, Some(capacity))
    }

    fn with_entries(entries: LruCache<K, CacheEntry<V>>, capacity: Option<usize>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheState {
                entries,
                written: VecDeque::new(),
                in_flight: HashMap::new(),
                next_load_id: 0,
            })),
            capacity,
            ttl: None,
        }
    }

    /// Configures a time-to-live for cache entries.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Returns the cached value for `key`, loading it on a miss.
    ///
    /// `load` is only invoked when no entry exists and no other caller is
    /// already loading `key`; otherwise this call awaits that load's result.
    pub async fn get_with<F, Fut>(&self, key: &K, load: F) -> LookupResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LookupResult<V>> + Send + 'static,
    {
        let (load_id, pending) = {
            let mut state = self.lock();
            if let Some(value) = self.lookup(&mut state, key, Instant::now()) {
                return Ok(value);
            }
            match state.in_flight.get(key) {
                Some(in_flight) => (in_flight.id, in_flight.load.clone()),
                None => {
                    let id = state.next_load_id;
                    state.next_load_id = state.next_load_id.wrapping_add(1);
                    let pending = load().boxed().shared();
                    state.in_flight.insert(
                        key.clone(),
                        InFlight {
                            id,
                            load: pending.clone(),
                        },
                    );
                    (id, pending)
                }
            }
        };

        let result = pending.await;
        self.complete(key, load_id, &result);
        result
    }

    /// Returns true if a live entry exists for `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        let state = self.lock();
        match (state.entries.peek(key), self.ttl) {
            (Some(entry), Some(ttl)) => !Self::is_expired(entry.updated_at, ttl, Instant::now()),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Number of stored entries, including ones that expired but were not
    /// yet pruned.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns true when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, state: &mut CacheState<K, V>, key: &K, now: Instant) -> Option<V> {
        if let Some(ttl) = self.ttl
            && let Some(entry) = state.entries.peek(key)
            && Self::is_expired(entry.updated_at, ttl, now)
        {
            state.entries.pop(key);
            return None;
        }

        state.entries.get(key).map(|entry| entry.value.clone())
    }

    fn complete(&self, key: &K, load_id: u64, result: &LookupResult<V>) {
        let mut state = self.lock();
        // Only the first waiter to finish retires the load and stores its value.
        if !state
            .in_flight
            .get(key)
            .is_some_and(|in_flight| in_flight.id == load_id)
        {
            return;
        }
        state.in_flight.remove(key);

        if let Ok(value) = result {
            self.insert(&mut state, key.clone(), value.clone(), Instant::now());
        }
    }

    fn insert(&self, state: &mut CacheState<K, V>, key: K, value: V, now: Instant) {
        if let Some(ttl) = self.ttl {
            Self::prune_expired(state, ttl, now);
        }
        if self.capacity == Some(0) {
            return;
        }

        if self.ttl.is_some() {
            state.written.push_back((key.clone(), now));
        }
        state.entries.push(
            key,
            CacheEntry {
                value,
                updated_at: now,
            },
        );
    }

    fn is_expired(updated_at: Instant, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(updated_at) > ttl
    }

    /// Drops expired entries, oldest write first. Stops at the first live
    /// write, so the cost is proportional to what expired.
    fn prune_expired(state: &mut CacheState<K, V>, ttl: Duration, now: Instant) {
        while let Some((_, written_at)) = state.written.front() {
            if !Self::is_expired(*written_at, ttl, now) {
                break;
            }
            let Some((key, written_at)) = state.written.pop_front() else {
                break;
            };
            // A newer write of the same key keeps its own queue slot.
            if state
                .entries
                .peek(&key)
                .is_some_and(|entry| entry.updated_at == written_at)
            {
                state.entries.pop(&key);
            }
        }
    }
}

/// Topic name to owning project.
pub type TopicOwnerCache = LoadingCache<String, ProjectId>;

/// Canonical identity to the caller's project and role.
pub type UserRoleCache = LoadingCache<String, (ProjectId, ProjectRole)>;

/// `(owner, requester)` project pair to share grant.
pub type ShareCache = LoadingCache<(ProjectId, ProjectId), SharePermission>;

/// The three read-through caches over a [`ProjectDirectory`].
///
/// Created once when the authorizer is built and shared by every request.
/// There is no explicit invalidation; staleness is bounded by the TTL and
/// eviction policies.
pub struct ProjectCaches<D> {
    directory: Arc<D>,
    topic_owner: TopicOwnerCache,
    user_role: UserRoleCache,
    share: ShareCache,
}

impl<D> fmt::Debug for ProjectCaches<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectCaches")
            .field("topic_owner", &self.topic_owner)
            .field("user_role", &self.user_role)
            .field("share", &self.share)
            .finish_non_exhaustive()
    }
}

impl<D> ProjectCaches<D>
where
    D: ProjectDirectory + 'static,
{
    /// Creates the caches: topic ownership bounded by `topic_max_size`,
    /// roles and shares expiring after `ttl`.
    pub fn new(directory: Arc<D>, topic_max_size: usize, ttl: Duration) -> Self {
        Self {
            directory,
            topic_owner: LoadingCache::bounded(topic_max_size),
            user_role: LoadingCache::unbounded().with_ttl(ttl),
            share: LoadingCache::unbounded().with_ttl(ttl),
        }
    }

    /// Owning project of `topic`.
    pub async fn topic_owner(&self, topic: &str) -> LookupResult<ProjectId> {
        let key = topic.to_string();
        let topic = key.clone();
        let directory = Arc::clone(&self.directory);
        self.topic_owner
            .get_with(&key, move || async move {
                debug!(%topic, "loading topic owner");
                directory
                    .topic_project(&topic)
                    .await
                    .map(|record| record.project_id)
            })
            .await
    }

    /// Project and role of the caller identified by `identity`.
    pub async fn user_role(
        &self,
        identity: &str,
        project: &ProjectName,
        user: &UserName,
    ) -> LookupResult<(ProjectId, ProjectRole)> {
        let directory = Arc::clone(&self.directory);
        let (project, user) = (project.clone(), user.clone());
        self.user_role
            .get_with(&identity.to_string(), move || async move {
                debug!(%project, %user, "loading project role");
                directory
                    .project_role(&project, &user)
                    .await
                    .map(|record| (record.project_id, record.role))
            })
            .await
    }

    /// Share grant from `owner` to `requester`.
    pub async fn share(
        &self,
        owner: ProjectId,
        requester: ProjectId,
    ) -> LookupResult<SharePermission> {
        let directory = Arc::clone(&self.directory);
        self.share
            .get_with(&(owner, requester), move || async move {
                debug!(%owner, %requester, "loading project share");
                directory
                    .shared_project(requester, owner)
                    .await
                    .map(|record| record.permission)
            })
            .await
    }

    /// Topic ownership cache.
    pub fn topic_owner_cache(&self) -> &TopicOwnerCache {
        &self.topic_owner
    }

    /// Role cache.
    pub fn user_role_cache(&self) -> &UserRoleCache {
        &self.user_role
    }

    /// Share cache.
    pub fn share_cache(&self) -> &ShareCache {
        &self.share
    }
}
