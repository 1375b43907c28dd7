#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use shortener::infrastructure::persistence::ConnectionGate;
use shortener::prelude::*;

/// In-memory link store that counts reads.
#[derive(Default)]
pub struct MemoryLinkRepository {
    links: Mutex<HashMap<String, ShortLink>>,
    finds: AtomicUsize,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_links<'a>(links: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.links.lock().unwrap();
            for (alias, original) in links {
                map.insert(alias.to_string(), ShortLink::new(alias, original));
            }
        }
        repo
    }

    pub fn find_count(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.links.lock().unwrap().len()
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn create(&self, link: ShortLink) -> Result<ShortLink, StoreError> {
        match self.links.lock().unwrap().entry(link.alias.clone()) {
            Entry::Occupied(_) => Err(StoreError::UniqueViolation {
                constraint: Some("short_links_pkey".to_string()),
            }),
            Entry::Vacant(slot) => Ok(slot.insert(link).clone()),
        }
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Option<ShortLink>, StoreError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        Ok(self.links.lock().unwrap().get(alias).cloned())
    }
}

/// Redirect store that forwards every written batch to a channel.
pub struct RecordingRedirectRepository {
    batches: mpsc::UnboundedSender<Vec<RedirectEvent>>,
    stored: Mutex<Vec<RedirectEvent>>,
    inserts: AtomicUsize,
    fail: bool,
    gate: Option<ConnectionGate>,
}

impl RecordingRedirectRepository {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vec<RedirectEvent>>) {
        Self::build(false, None)
    }

    /// A store whose every batch insert fails.
    pub fn failing() -> (Self, mpsc::UnboundedReceiver<Vec<RedirectEvent>>) {
        Self::build(true, None)
    }

    /// A store whose inserts pass through `gate`, like the PostgreSQL adapter.
    pub fn gated(gate: ConnectionGate) -> (Self, mpsc::UnboundedReceiver<Vec<RedirectEvent>>) {
        Self::build(false, Some(gate))
    }

    fn build(
        fail: bool,
        gate: Option<ConnectionGate>,
    ) -> (Self, mpsc::UnboundedReceiver<Vec<RedirectEvent>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let repo = Self {
            batches: tx,
            stored: Mutex::new(Vec::new()),
            inserts: AtomicUsize::new(0),
            fail,
            gate,
        };
        (repo, rx)
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Vec<RedirectEvent> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl RedirectRepository for RecordingRedirectRepository {
    async fn insert_batch(&self, events: Vec<RedirectEvent>) -> Result<u64, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let _permit = match &self.gate {
            Some(gate) => Some(gate.enter().await?),
            None => None,
        };
        // Give a concurrent close the chance to overtake this write.
        tokio::task::yield_now().await;
        if self.fail {
            return Err(StoreError::Unavailable("connection reset".into()));
        }

        let rows = events.len() as u64;
        self.stored.lock().unwrap().extend(events.iter().cloned());
        let _ = self.batches.send(events);
        Ok(rows)
    }

    async fn list_by_alias(&self, alias: &str) -> Result<Vec<RedirectEvent>, StoreError> {
        let mut events: Vec<_> = self
            .stored
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.alias == alias)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.occurred_at);
        Ok(events)
    }

    async fn aggregate(&self, filter: RedirectFilter) -> Result<AggregatedView, StoreError> {
        let matching: Vec<_> = self
            .list_by_alias(&filter.alias)
            .await?
            .into_iter()
            .filter(|e| filter.from_date.is_none_or(|from| e.occurred_at >= from))
            .filter(|e| filter.to_date.is_none_or(|to| e.occurred_at <= to))
            .filter(|e| {
                filter
                    .user_agent
                    .as_deref()
                    .is_none_or(|needle| e.user_agent.contains(needle))
            })
            .collect();

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(shortener::domain::repositories::PAGE_SIZE as usize)
            .collect();

        Ok(AggregatedView {
            alias: filter.alias,
            total,
            items,
        })
    }
}

/// In-memory cache that counts writes.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
    sets: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, alias: &str) -> Option<String> {
        self.entries.lock().unwrap().get(alias).cloned()
    }

    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_url(&self, alias: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(alias).cloned())
    }

    async fn set_url(
        &self,
        alias: &str,
        original: &str,
        _ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .unwrap()
            .insert(alias.to_string(), original.to_string());
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

pub type TestShortener =
    Shortener<MemoryLinkRepository, RecordingRedirectRepository, RandomAliasGenerator>;

/// Wires a core over in-memory collaborators.
pub fn shortener(
    links: Arc<MemoryLinkRepository>,
    redirects: Arc<RecordingRedirectRepository>,
    cache: Arc<MemoryCache>,
    batch_size: usize,
) -> TestShortener {
    let allocator = AliasAllocator::new(
        Arc::clone(&links),
        Arc::new(RandomAliasGenerator::from_seed(42)),
    );
    let resolver = CacheAsideResolver::new(links, cache);
    let batcher = RedirectBatcher::new(redirects, batch_size, 4);

    Shortener::new(allocator, resolver, batcher)
}
