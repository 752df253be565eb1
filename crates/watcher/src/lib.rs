//! Filesystem watcher for capi.
//!
//! Watches the project root recursively and reports debounced batches of
//! changed paths so the file tree can refresh itself.

use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

/// Debounce duration for filesystem events.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Directories whose churn never affects what the tree shows.
const NOISY_DIRS: &[&str] = &[".git", "__pycache__", "node_modules"];

/// True if `path` lies inside one of the noisy directories.
fn is_noise(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(|n| NOISY_DIRS.contains(&n)),
        _ => false,
    })
}

pub struct ProjectWatcher {
    debouncer: Debouncer<RecommendedWatcher>,
    receiver: Receiver<Vec<PathBuf>>,
    root: Option<PathBuf>,
}

impl ProjectWatcher {
    pub fn new(debounce_ms: u64) -> Result<Self> {
        let (tx, receiver) = mpsc::channel();
        let debouncer = new_debouncer(
            Duration::from_millis(debounce_ms),
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    let paths: Vec<PathBuf> = events
                        .into_iter()
                        .map(|e| e.path)
                        .filter(|p| !is_noise(p))
                        .collect();
                    if !paths.is_empty() {
                        let _ = tx.send(paths);
                    }
                }
                Err(e) => log::warn!("Filesystem watch error: {}", e),
            },
        )
        .context("Failed to create filesystem watcher")?;

        Ok(Self {
            debouncer,
            receiver,
            root: None,
        })
    }

    /// Watch `root` recursively, replacing the previous root.
    pub fn watch(&mut self, root: &Path) -> Result<()> {
        if self.root.as_deref() == Some(root) {
            return Ok(());
        }
        self.unwatch();
        self.debouncer
            .watcher()
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch path: {}", root.display()))?;
        log::info!("Watching {}", root.display());
        self.root = Some(root.to_path_buf());
        Ok(())
    }

    pub fn unwatch(&mut self) {
        if let Some(old) = self.root.take() {
            if let Err(e) = self.debouncer.watcher().unwatch(&old) {
                log::debug!("Failed to unwatch {}: {}", old.display(), e);
            }
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Next pending batch of changed paths (non-blocking).
    pub fn try_recv(&self) -> Option<Vec<PathBuf>> {
        self.receiver.try_recv().ok()
    }

    /// Drain all pending batches; true if anything changed.
    pub fn has_changes(&self) -> bool {
        let mut changed = false;
        while self.try_recv().is_some() {
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_filter() {
        assert!(is_noise(Path::new("/p/.git/index")));
        assert!(is_noise(Path::new("/p/src/__pycache__/m.pyc")));
        assert!(is_noise(Path::new("/p/node_modules/x/y.js")));
        assert!(!is_noise(Path::new("/p/src/main.py")));
        assert!(!is_noise(Path::new("/p/.gitignore")));
    }
}
