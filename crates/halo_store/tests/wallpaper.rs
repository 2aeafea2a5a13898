use std::sync::Arc;
use std::time::Duration;

use halo_core::{commands, EffectMode, MemoryBackend};
use halo_store::{FileStorage, LocalStorage, MemoryStorage, WallpaperCache, WALLPAPER_CACHE_KEY};
use pretty_assertions::assert_eq;

/// The cache write runs detached; give it a moment.
async fn wait_for_item(storage: &dyn LocalStorage, key: &str) -> Option<String> {
    for _ in 0..100 {
        if let Some(item) = storage.get_item(key) {
            return Some(item);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

#[tokio::test]
async fn wallpaper_effect_waits_for_the_image() {
    let storage = Arc::new(MemoryStorage::new());
    let backend = Arc::new(MemoryBackend::new().with_wallpaper("aW1hZ2U="));
    let cache = WallpaperCache::new(storage.clone(), backend.clone());

    let loaded = cache.load(EffectMode::Wallpaper).await.unwrap();
    assert_eq!(loaded.as_deref(), Some("aW1hZ2U="));
    assert_eq!(cache.current().as_deref(), Some("aW1hZ2U="));
    assert_eq!(
        wait_for_item(storage.as_ref(), WALLPAPER_CACHE_KEY).await.as_deref(),
        Some("aW1hZ2U=")
    );

    // Served from memory from now on.
    cache.load(EffectMode::Wallpaper).await.unwrap();
    assert_eq!(backend.call_count(commands::GET_WALLPAPER), 1);
}

#[tokio::test]
async fn other_effects_fetch_in_the_background() {
    let storage = Arc::new(MemoryStorage::new());
    let backend = Arc::new(MemoryBackend::new().with_wallpaper("aW1hZ2U="));
    let cache = WallpaperCache::new(storage.clone(), backend);
    let mut current = cache.subscribe();

    assert_eq!(cache.load(EffectMode::Mica).await.unwrap(), None);

    tokio::time::timeout(Duration::from_secs(1), current.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.borrow().as_deref(), Some("aW1hZ2U="));
    assert_eq!(
        wait_for_item(storage.as_ref(), WALLPAPER_CACHE_KEY).await.as_deref(),
        Some("aW1hZ2U=")
    );
}

#[tokio::test]
async fn empty_wallpaper_is_not_cached() {
    let storage = Arc::new(MemoryStorage::new());
    let backend = Arc::new(MemoryBackend::new());
    let cache = WallpaperCache::new(storage.clone(), backend);

    assert_eq!(cache.load(EffectMode::Wallpaper).await.unwrap(), None);
    assert_eq!(cache.current(), None);
    assert_eq!(storage.get_item(WALLPAPER_CACHE_KEY), None);
}

#[tokio::test]
async fn empty_cache_entry_triggers_a_fetch() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item(WALLPAPER_CACHE_KEY, "").unwrap();
    let backend = Arc::new(MemoryBackend::new().with_wallpaper("YWJj"));
    let cache = WallpaperCache::new(storage.clone(), backend.clone());

    let loaded = cache.load(EffectMode::Wallpaper).await.unwrap();
    assert_eq!(loaded.as_deref(), Some("YWJj"));
    assert_eq!(backend.call_count(commands::GET_WALLPAPER), 1);

    for _ in 0..100 {
        if cache.read().is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(storage.get_item(WALLPAPER_CACHE_KEY).as_deref(), Some("YWJj"));
}

#[tokio::test]
async fn host_failure_is_reported_when_awaited() {
    let backend = Arc::new(MemoryBackend::new());
    backend.fail(commands::GET_WALLPAPER);
    let cache = WallpaperCache::new(Arc::new(MemoryStorage::new()), backend);

    assert!(cache.load(EffectMode::Wallpaper).await.is_err());
    // In the background it's only logged.
    assert_eq!(cache.load(EffectMode::Auto).await.unwrap(), None);
}

#[tokio::test]
async fn file_cache_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let backend = Arc::new(MemoryBackend::new().with_wallpaper("d2FsbA=="));

    let storage = Arc::new(FileStorage::open(&path).unwrap());
    let cache = WallpaperCache::new(storage.clone(), backend.clone());
    cache.load(EffectMode::Wallpaper).await.unwrap();
    wait_for_item(storage.as_ref(), WALLPAPER_CACHE_KEY).await;

    let reopened = WallpaperCache::new(Arc::new(FileStorage::open(&path).unwrap()), backend.clone());
    assert_eq!(reopened.read().as_deref(), Some("d2FsbA=="));
    assert_eq!(
        reopened.load(EffectMode::Wallpaper).await.unwrap().as_deref(),
        Some("d2FsbA==")
    );
    assert_eq!(backend.call_count(commands::GET_WALLPAPER), 1);
}
