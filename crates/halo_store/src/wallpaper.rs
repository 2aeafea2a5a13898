//! Desktop wallpaper cache
//!
//! The wallpaper effect paints the desktop image behind the UI. Fetching it
//! from the host is slow, so the last image is kept in local storage under a
//! single key and served from there on the next start.

use std::sync::Arc;

use halo_core::{Backend, EffectMode};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::storage::LocalStorage;

/// Local storage key of the cached image.
pub const WALLPAPER_CACHE_KEY: &str = "wallpaper_cache";

struct Inner {
    storage: Arc<dyn LocalStorage>,
    backend: Arc<dyn Backend>,
    current: watch::Sender<Option<String>>,
}

/// Single-slot wallpaper cache. Clones share the same slot.
#[derive(Clone)]
pub struct WallpaperCache {
    inner: Arc<Inner>,
}

impl WallpaperCache {
    /// Starts out with whatever the storage already holds.
    pub fn new(storage: Arc<dyn LocalStorage>, backend: Arc<dyn Backend>) -> Self {
        let cached = read_cached(storage.as_ref());
        let (current, _) = watch::channel(cached);
        Self {
            inner: Arc::new(Inner {
                storage,
                backend,
                current,
            }),
        }
    }

    /// The cached base64 image. An empty entry counts as missing.
    pub fn read(&self) -> Option<String> {
        read_cached(self.inner.storage.as_ref())
    }

    /// Store `base64` and show it. Writing an empty string clears the image.
    pub fn write(&self, base64: &str) -> Result<(), StoreError> {
        self.inner.storage.set_item(WALLPAPER_CACHE_KEY, base64)?;
        let shown = Some(base64.to_string()).filter(|image| !image.is_empty());
        self.inner.current.send_replace(shown);
        Ok(())
    }

    /// The image currently shown, if any.
    pub fn current(&self) -> Option<String> {
        self.inner.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.inner.current.subscribe()
    }

    /// Make sure an image is available.
    ///
    /// Returns the cached image right away when there is one. Otherwise the
    /// image is fetched from the host: awaited when `effect` needs it for the
    /// first frame, in the background (returning `None`) when it doesn't.
    /// Subscribers see the fetched image either way.
    pub async fn load(&self, effect: EffectMode) -> Result<Option<String>, StoreError> {
        // A fetched image may still be on its way to storage.
        if let Some(cached) = self.read().or_else(|| self.current()) {
            self.inner.current.send_if_modified(|current| {
                let stale = current.as_ref() != Some(&cached);
                if stale {
                    *current = Some(cached.clone());
                }
                stale
            });
            return Ok(Some(cached));
        }

        if effect.requires_wallpaper() {
            return self.fetch().await;
        }

        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.fetch().await {
                warn!("Background wallpaper fetch failed: {e}");
            }
        });
        Ok(None)
    }

    async fn fetch(&self) -> Result<Option<String>, StoreError> {
        let base64 = self.inner.backend.get_wallpaper().await?;
        if base64.is_empty() {
            debug!("Host has no wallpaper to offer");
            return Ok(None);
        }

        // The cache write doesn't hold up the caller.
        let storage = self.inner.storage.clone();
        let cached = base64.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = storage.set_item(WALLPAPER_CACHE_KEY, &cached) {
                warn!("Failed to cache wallpaper: {e}");
            }
        });

        debug!(bytes = base64.len(), "Wallpaper fetched");
        self.inner.current.send_replace(Some(base64.clone()));
        Ok(Some(base64))
    }
}

fn read_cached(storage: &dyn LocalStorage) -> Option<String> {
    storage
        .get_item(WALLPAPER_CACHE_KEY)
        .filter(|cached| !cached.is_empty())
}
