//! Configuration file watcher for hot reload.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use tokio::sync::mpsc;

use crate::config::loader::ConfigSource;
use crate::config::schema::Config;

/// A watcher that monitors the configuration file for changes.
///
/// Every successful reload is pushed as a fresh [`Config`] into the channel
/// returned by [`ConfigWatcher::new`]. Calling `new` again starts a new,
/// independent subscription.
#[derive(Debug, Clone)]
pub struct ConfigWatcher {
    source: ConfigSource,
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<Config>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher for the file at `path`.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(source: ConfigSource, path: &Path) -> (Self, mpsc::UnboundedReceiver<Config>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                source,
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reload the file now and publish the result.
    ///
    /// Returns `false` if the file could not be loaded or nobody is listening;
    /// the running configuration is kept in both cases.
    pub fn reload(&self) -> bool {
        reload_into(&self.source, &self.path, &self.update_tx)
    }

    /// Start watching in notify's background thread.
    ///
    /// The parent directory is watched rather than the file itself, so editors
    /// that replace the file by renaming a temporary one are still seen. A
    /// reload happens when the file's content is written or it is created or
    /// renamed into place, and also when the file resolves to a different
    /// target, as with a Kubernetes ConfigMap swapping its `..data` link.
    /// Metadata-only changes are ignored. The returned watcher must be kept
    /// alive for as long as updates are wanted.
    pub fn run(&self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();
        let source = self.source.clone();
        let file_name = self.path.file_name().map(|name| name.to_os_string());
        let mut target = fs::canonicalize(&self.path).ok();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let resolved = fs::canonicalize(&path).ok();
                    let retargeted = resolved.is_some() && resolved != target;
                    if resolved != target {
                        target = resolved;
                    }

                    let touches_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == file_name.as_deref());
                    if (touches_file && changes_content(&event.kind)) || retargeted {
                        tracing::info!(file = %path.display(), retargeted, "Config changed, reloading");
                        reload_into(&source, &path, &tx);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Watch error"),
            },
            NotifyConfig::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        watcher.watch(directory, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Config watcher started");
        Ok(watcher)
    }
}

/// Writes, creations and renames; never attribute or access events.
fn changes_content(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Name(_) | ModifyKind::Any)
    )
}

fn reload_into(source: &ConfigSource, path: &Path, tx: &mpsc::UnboundedSender<Config>) -> bool {
    match source.load_from(path) {
        Ok(config) => tx.send(config).is_ok(),
        Err(e) => {
            tracing::error!(
                error = %e,
                "Failed to reload config. Keeping current configuration."
            );
            false
        }
    }
}
