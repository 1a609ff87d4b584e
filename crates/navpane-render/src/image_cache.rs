//! Grow-only image cache shared by every render.
//!
//! Keys are minted as `http://127.0.0.1/<N>.img` where `N` is the number
//! of entries at minting time. Entries are never evicted, so keys are never
//! reused.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use navpane_types::Image;

use crate::proxy::PROXY_ORIGIN;

/// Key under which the placeholder is stored for images that failed.
pub const MISSING_IMAGE_KEY: &str = "http://127.0.0.1/404_error_unknown_123_xyz.png";

pub struct ImageCache {
    entries: Mutex<HashMap<String, Arc<Image>>>,
    placeholder: Arc<Image>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            placeholder: Arc::new(Image::placeholder()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Image>>> {
        // Entries are only ever inserted whole; a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mint a fresh key and store the placeholder under it.
    ///
    /// Minting and reserving happen under one lock, so concurrent callers
    /// always receive distinct, increasing keys.
    pub fn reserve(&self) -> String {
        let mut entries = self.lock();
        let key = format!("{PROXY_ORIGIN}{}.img", entries.len());
        entries.insert(key.clone(), Arc::clone(&self.placeholder));
        key
    }

    /// Replace the image stored under `key`.
    pub fn store(&self, key: &str, image: Image) {
        self.lock().insert(key.to_string(), Arc::new(image));
    }

    /// Store the placeholder under [`MISSING_IMAGE_KEY`] and return that key.
    pub fn store_missing(&self) -> &'static str {
        self.lock()
            .insert(MISSING_IMAGE_KEY.to_string(), Arc::clone(&self.placeholder));
        MISSING_IMAGE_KEY
    }

    pub fn get(&self, key: &str) -> Option<Arc<Image>> {
        self.lock().get(key).map(Arc::clone)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn placeholder(&self) -> Arc<Image> {
        Arc::clone(&self.placeholder)
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("entries", &self.len())
            .finish()
    }
}
