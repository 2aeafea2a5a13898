//! Style sinks
//!
//! The shell never touches a document directly. Whatever hosts the UI
//! implements [`StyleSink`] and receives the full stylesheet text every time
//! the palette is regenerated.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use tracing::debug;

/// Id of the style element a web host should write the stylesheet into.
pub const STYLE_ELEMENT_ID: &str = "dynamic-theme-styles";

/// Receives generated stylesheets.
///
/// `replace` swaps the whole content; calling it twice with the same text
/// leaves the sink in the same state as calling it once.
pub trait StyleSink: Send + Sync {
    fn replace(&self, css: &str) -> std::io::Result<()>;
}

impl<S: StyleSink + ?Sized> StyleSink for Arc<S> {
    fn replace(&self, css: &str) -> std::io::Result<()> {
        (**self).replace(css)
    }
}

/// Keeps the last stylesheet in memory.
#[derive(Default)]
pub struct MemoryStyleSink {
    content: RwLock<Option<String>>,
    writes: AtomicUsize,
}

impl MemoryStyleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> Option<String> {
        self.content.read().unwrap().clone()
    }

    /// How many times the content was replaced.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl StyleSink for MemoryStyleSink {
    fn replace(&self, css: &str) -> std::io::Result<()> {
        *self.content.write().unwrap() = Some(css.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Writes the stylesheet to a file, for hosts that watch a `.css` path.
pub struct FileStyleSink {
    path: PathBuf,
}

impl FileStyleSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StyleSink for FileStyleSink {
    fn replace(&self, css: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, css)?;
        debug!(path = %self.path.display(), bytes = css.len(), "FileStyleSink: stylesheet written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn memory_sink_replaces_content() {
        let sink = MemoryStyleSink::new();
        sink.replace(":root { }").unwrap();
        sink.replace(":root { --a: b; }").unwrap();
        assert_eq!(sink.content().as_deref(), Some(":root { --a: b; }"));
        assert_eq!(sink.writes(), 2);
    }

    #[test]
    fn file_sink_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileStyleSink::new(dir.path().join("theme").join("halo.css"));
        sink.replace("first").unwrap();
        sink.replace("second").unwrap();
        assert_eq!(std::fs::read_to_string(sink.path()).unwrap(), "second");
    }
}
