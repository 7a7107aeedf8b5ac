//! Model Handle Cache
//!
//! Bounded LRU of loaded handles keyed by URI. Failed loads are never
//! memoized. Concurrent first loads of one URI are serialized on a per-key
//! lock, so the loader runs once; after a *failed* load, callers that were
//! already waiting each retry in turn.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use thiserror::Error;

use super::inference::{InferenceError, ModelHandle};
use super::loader::ModelLoader;
use crate::logic::config::ConfigError;

#[derive(Debug, Error)]
#[error("unable to load model at {uri}")]
pub struct ModelLoadError {
    pub uri: String,
    #[source]
    pub source: InferenceError,
}

/// Memoizing access to model handles
pub trait ModelCache: Send + Sync {
    /// May block on artifact I/O; async callers go through the blocking pool
    fn load(&self, uri: &str) -> Result<Arc<ModelHandle>, ModelLoadError>;

    /// Already-loaded handle, never touching the loader
    fn peek(&self, _uri: &str) -> Option<Arc<ModelHandle>> {
        None
    }

    /// Entry bound, when the cache has one
    fn max_entries(&self) -> Option<usize> {
        None
    }
}

pub struct LruModelCache {
    loader: Arc<dyn ModelLoader>,
    entries: Mutex<LruCache<String, Arc<ModelHandle>>>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LruModelCache {
    pub fn new(loader: Arc<dyn ModelLoader>, capacity: usize) -> Result<Self, ConfigError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(ConfigError::ZeroCacheCapacity)?;

        Ok(Self {
            loader,
            entries: Mutex::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    fn cached(&self, uri: &str) -> Option<Arc<ModelHandle>> {
        self.entries.lock().get(uri).cloned()
    }

    fn key_lock(&self, uri: &str) -> Arc<Mutex<()>> {
        self.in_flight.lock()
            .entry(uri.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop every cached handle
    pub fn clear(&self) {
        self.entries.lock().clear();
        log::info!("Model cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Most recently used first
    pub fn cached_uris(&self) -> Vec<String> {
        self.entries.lock().iter().map(|(uri, _)| uri.clone()).collect()
    }
}

impl ModelCache for LruModelCache {
    fn peek(&self, uri: &str) -> Option<Arc<ModelHandle>> {
        self.cached(uri)
    }

    fn max_entries(&self) -> Option<usize> {
        Some(self.capacity())
    }

    fn load(&self, uri: &str) -> Result<Arc<ModelHandle>, ModelLoadError> {
        if let Some(handle) = self.cached(uri) {
            return Ok(handle);
        }

        let key_lock = self.key_lock(uri);
        let _guard = key_lock.lock();

        // Another caller may have finished the load while we waited
        if let Some(handle) = self.cached(uri) {
            return Ok(handle);
        }

        log::info!("Loading model from {}", uri);
        let result = match self.loader.load(uri) {
            Ok(handle) => {
                let handle = Arc::new(handle);
                if let Some((evicted, _)) = self.entries.lock().push(uri.to_string(), handle.clone()) {
                    if evicted != uri {
                        log::info!("Evicted model {} from cache", evicted);
                    }
                }
                Ok(handle)
            }
            Err(source) => {
                log::error!("Failed to load model from {}: {}", uri, source);
                Err(ModelLoadError {
                    uri: uri.to_string(),
                    source,
                })
            }
        };

        // Only after the handle is visible in `entries`
        self.in_flight.lock().remove(uri);
        result
    }
}
