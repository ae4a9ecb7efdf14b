//! In-memory object store with scripted failures.

use crate::{ObjectStore, StoreResult};
use relink_error::{StoreError, StoreErrorKind};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A failure injected into a [`MemoryStore`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedFailure {
    /// Next `put_object` for the key fails with this kind
    Put(StoreErrorKind),
    /// Next `head_object` for the key fails with this kind
    Head(StoreErrorKind),
    /// Every `put_object` for the key reports success but stores nothing
    Discard,
}

#[derive(Default)]
struct Inner {
    objects: BTreeMap<String, (Vec<u8>, String)>,
    put_failures: HashMap<String, VecDeque<StoreErrorKind>>,
    head_failures: HashMap<String, VecDeque<StoreErrorKind>>,
    discarded: HashSet<String>,
    access_failure: Option<StoreErrorKind>,
}

/// Object store held in memory.
///
/// Failures are scripted per key and consumed in order, so a test can say
/// "fail twice with 503, then succeed".
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    puts: AtomicUsize,
    heads: AtomicUsize,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a failure for `key`.
    pub fn script(&self, key: impl Into<String>, failure: ScriptedFailure) {
        let key = key.into();
        let mut inner = self.lock();
        match failure {
            ScriptedFailure::Put(kind) => inner.put_failures.entry(key).or_default().push_back(kind),
            ScriptedFailure::Head(kind) => {
                inner.head_failures.entry(key).or_default().push_back(kind)
            }
            ScriptedFailure::Discard => {
                inner.discarded.insert(key);
            }
        }
    }

    /// Make `verify_access` fail.
    pub fn deny_access(&self, kind: StoreErrorKind) {
        self.lock().access_failure = Some(kind);
    }

    /// Preload an object.
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Vec<u8>>, content_type: &str) {
        self.lock()
            .objects
            .insert(key.into(), (data.into(), content_type.to_string()));
    }

    /// Stored bytes and content type for `key`.
    pub fn object(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.lock().objects.get(key).cloned()
    }

    /// Stored keys in order.
    pub fn keys(&self) -> Vec<String> {
        self.lock().objects.keys().cloned().collect()
    }

    /// Number of `put_object` calls, failed ones included.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of `head_object` calls, failed ones included.
    pub fn head_count(&self) -> usize {
        self.heads.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, key: &str, data: &[u8], content_type: &str) -> StoreResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.lock();
        if let Some(kind) = inner.put_failures.get_mut(key).and_then(VecDeque::pop_front) {
            return Err(StoreError::new(kind));
        }
        if !inner.discarded.contains(key) {
            inner
                .objects
                .insert(key.to_string(), (data.to_vec(), content_type.to_string()));
        }
        Ok(())
    }

    async fn head_object(&self, key: &str) -> StoreResult<bool> {
        self.heads.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.lock();
        if let Some(kind) = inner.head_failures.get_mut(key).and_then(VecDeque::pop_front) {
            return Err(StoreError::new(kind));
        }
        Ok(inner.objects.contains_key(key))
    }

    async fn verify_access(&self) -> StoreResult<()> {
        match self.lock().access_failure.clone() {
            Some(kind) => Err(StoreError::new(kind)),
            None => Ok(()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
