//! Session store — one conversation handle per bearer token.
//!
//! Handles are created lazily on first use and reused for every later
//! message with the same token, so the provider sees the whole thread.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info};

use crate::llm::{ChatProvider, ConversationHandle, LlmError};

/// Interval between idle-eviction sweeps.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Token → conversation mapping.
pub trait SessionStore: Send + Sync {
    /// Return the handle for `token`, creating it if absent.
    ///
    /// Concurrent first calls for the same token create exactly one handle.
    fn get_or_create(&self, token: &str) -> ConversationHandle;

    /// Return the handle for `token` without creating one.
    fn get(&self, token: &str) -> Option<ConversationHandle>;

    /// Number of live sessions.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every session.
    fn clear(&self);
}

/// Forward `text` through a conversation handle.
///
/// No store lock is held here; callers obtain the handle first.
pub async fn send_message(handle: &ConversationHandle, text: &str) -> Result<String, LlmError> {
    handle.send(text).await
}

struct SessionEntry {
    handle: ConversationHandle,
    last_accessed: Instant,
}

/// In-memory [`SessionStore`] backed by a `DashMap`.
///
/// Unbounded by default. With an idle TTL set, a background sweep drops
/// sessions that have not been touched for that long.
pub struct InMemorySessionStore {
    provider: Arc<dyn ChatProvider>,
    system_instruction: Arc<str>,
    model: String,
    idle_ttl: Option<Duration>,
    sessions: DashMap<String, SessionEntry>,
}

impl InMemorySessionStore {
    pub fn new(provider: Arc<dyn ChatProvider>, system_instruction: &str, model: &str) -> Self {
        Self {
            provider,
            system_instruction: Arc::from(system_instruction),
            model: model.to_string(),
            idle_ttl: None,
            sessions: DashMap::new(),
        }
    }

    /// Enable idle expiry for sessions.
    pub fn with_idle_ttl(mut self, ttl: Duration) -> Self {
        self.idle_ttl = Some(ttl);
        self
    }

    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_ttl
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Evict sessions idle for longer than `ttl`. Returns how many were dropped.
    ///
    /// A session whose handle is still held outside the store (a message in
    /// flight) is kept regardless of age, so a token never has two live
    /// handles.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| {
            entry.last_accessed.elapsed() <= ttl || Arc::strong_count(&entry.handle) > 1
        });
        before.saturating_sub(self.sessions.len())
    }

    /// Spawn a periodic sweep. Returns `None` when no idle TTL is set.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        let ttl = self.idle_ttl?;
        let store = Arc::clone(self);
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                let evicted = store.evict_idle(ttl);
                if evicted > 0 {
                    info!(evicted, remaining = store.len(), "evicted idle sessions");
                }
            }
        }))
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&self, token: &str) -> ConversationHandle {
        // The entry guard holds the shard lock, so check-then-create is
        // atomic per token. Conversation creation does no I/O.
        let mut entry = self
            .sessions
            .entry(token.to_string())
            .or_insert_with(|| {
                debug!(provider = self.provider.name(), model = %self.model, "creating conversation");
                SessionEntry {
                    handle: self
                        .provider
                        .create_conversation(&self.system_instruction, &self.model),
                    last_accessed: Instant::now(),
                }
            });
        entry.last_accessed = Instant::now();
        Arc::clone(&entry.handle)
    }

    fn get(&self, token: &str) -> Option<ConversationHandle> {
        self.sessions.get(token).map(|e| Arc::clone(&e.handle))
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }

    fn clear(&self) {
        self.sessions.clear();
    }
}
