// crates/server/src/watch/adapter.rs
//! Turns raw `notify` callbacks into normalized [`ChangeEvent`]s.
//!
//! The callback runs on the notify backend thread. It never blocks: every
//! accepted event goes straight into an unbounded channel, so one raw
//! signal yields exactly one message and OS order is kept.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use watchtower_core::{ChangeEvent, ChangeKind, PathFilter};

/// A live OS subscription on one root. Dropping it releases the watch.
pub struct EventSource {
    _watcher: RecommendedWatcher,
    enabled: Arc<AtomicBool>,
}

impl EventSource {
    /// Stop forwarding immediately, even if the backend thread still has
    /// raw events in flight.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }
}

impl Drop for EventSource {
    fn drop(&mut self) {
        self.disable();
    }
}

/// Map one raw notify event to zero or more `(path, kind)` pairs.
///
/// `exists` is consulted only for renames whose direction the backend did
/// not report.
pub fn normalize(
    kind: &EventKind,
    paths: &[PathBuf],
    exists: impl Fn(&Path) -> bool,
) -> Vec<(PathBuf, ChangeKind)> {
    let all = |change: ChangeKind| -> Vec<(PathBuf, ChangeKind)> {
        paths.iter().map(|p| (p.clone(), change)).collect()
    };

    match kind {
        EventKind::Create(_) => all(ChangeKind::Created),
        EventKind::Remove(_) => all(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other) => {
            all(ChangeKind::Modified)
        }
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => all(ChangeKind::Deleted),
            RenameMode::To => all(ChangeKind::Created),
            RenameMode::Both => {
                let mut out = Vec::with_capacity(2);
                if let Some(old) = paths.first() {
                    out.push((old.clone(), ChangeKind::Deleted));
                }
                if let Some(new) = paths.get(1) {
                    out.push((new.clone(), ChangeKind::Created));
                }
                out
            }
            RenameMode::Any | RenameMode::Other => paths
                .iter()
                .map(|p| {
                    let change = if exists(p) {
                        ChangeKind::Created
                    } else {
                        ChangeKind::Deleted
                    };
                    (p.clone(), change)
                })
                .collect(),
        },
        EventKind::Modify(ModifyKind::Metadata(_)) | EventKind::Access(_) => Vec::new(),
        EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Start a recursive watch on `filter.root()`.
///
/// Emitted paths are absolute as long as the root is. The poll interval only
/// matters for polling backends; native backends ignore it.
pub fn start(
    filter: PathFilter,
    poll_interval: Duration,
    tx: mpsc::UnboundedSender<ChangeEvent>,
) -> notify::Result<EventSource> {
    let root = filter.root().to_path_buf();
    let enabled = Arc::new(AtomicBool::new(true));
    let gate = enabled.clone();

    let handler = move |res: notify::Result<notify::Event>| {
        if !gate.load(Ordering::SeqCst) {
            return;
        }
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "File watcher error");
                return;
            }
        };

        for (path, change_kind) in normalize(&event.kind, &event.paths, |p| p.exists()) {
            if !filter.accepts(&path) {
                continue;
            }
            debug!(path = %path.display(), kind = %change_kind, "change observed");
            let change = ChangeEvent::now(path.to_string_lossy(), change_kind);
            if tx.send(change).is_err() {
                // Consumer gone; the session is shutting down.
                return;
            }
        }
    };

    let mut watcher =
        RecommendedWatcher::new(handler, Config::default().with_poll_interval(poll_interval))?;
    watcher.watch(&root, RecursiveMode::Recursive)?;

    Ok(EventSource {
        _watcher: watcher,
        enabled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};
    use pretty_assertions::assert_eq;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    fn never(_: &Path) -> bool {
        false
    }

    #[test]
    fn test_create_modify_remove() {
        let paths = vec![p("/w/a.txt")];
        assert_eq!(
            normalize(&EventKind::Create(CreateKind::File), &paths, never),
            vec![(p("/w/a.txt"), ChangeKind::Created)]
        );
        assert_eq!(
            normalize(
                &EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &paths,
                never
            ),
            vec![(p("/w/a.txt"), ChangeKind::Modified)]
        );
        assert_eq!(
            normalize(&EventKind::Modify(ModifyKind::Any), &paths, never),
            vec![(p("/w/a.txt"), ChangeKind::Modified)]
        );
        assert_eq!(
            normalize(&EventKind::Remove(RemoveKind::Any), &paths, never),
            vec![(p("/w/a.txt"), ChangeKind::Deleted)]
        );
    }

    #[test]
    fn test_rename_both_splits_into_delete_and_create() {
        let paths = vec![p("/w/old.txt"), p("/w/new.txt")];
        assert_eq!(
            normalize(
                &EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
                &paths,
                never
            ),
            vec![
                (p("/w/old.txt"), ChangeKind::Deleted),
                (p("/w/new.txt"), ChangeKind::Created),
            ]
        );
    }

    #[test]
    fn test_rename_halves() {
        let paths = vec![p("/w/x")];
        assert_eq!(
            normalize(
                &EventKind::Modify(ModifyKind::Name(RenameMode::From)),
                &paths,
                never
            ),
            vec![(p("/w/x"), ChangeKind::Deleted)]
        );
        assert_eq!(
            normalize(
                &EventKind::Modify(ModifyKind::Name(RenameMode::To)),
                &paths,
                never
            ),
            vec![(p("/w/x"), ChangeKind::Created)]
        );
    }

    #[test]
    fn test_undirected_rename_uses_existence() {
        let paths = vec![p("/w/here"), p("/w/gone")];
        let exists = |path: &Path| path.ends_with("here");
        assert_eq!(
            normalize(
                &EventKind::Modify(ModifyKind::Name(RenameMode::Any)),
                &paths,
                exists
            ),
            vec![
                (p("/w/here"), ChangeKind::Created),
                (p("/w/gone"), ChangeKind::Deleted),
            ]
        );
    }

    #[test]
    fn test_ignored_kinds() {
        let paths = vec![p("/w/a")];
        assert!(normalize(&EventKind::Access(AccessKind::Any), &paths, never).is_empty());
        assert!(normalize(
            &EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            &paths,
            never
        )
        .is_empty());
        assert!(normalize(&EventKind::Any, &paths, never).is_empty());
        assert!(normalize(&EventKind::Other, &paths, never).is_empty());
    }

    #[tokio::test]
    async fn test_watch_emits_created_for_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let filter = PathFilter::new(&root, &[]).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _source = start(filter, Duration::from_millis(100), tx).unwrap();
        std::fs::File::create(root.join("a.txt")).unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event within timeout")
            .expect("channel open");
        assert_eq!(event.path, root.join("a.txt").to_string_lossy());
        assert_eq!(event.change_kind, ChangeKind::Created);
    }

    #[tokio::test]
    async fn test_hidden_and_untracked_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let filter = PathFilter::new(&root, &["*.txt".to_string()]).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _source = start(filter, Duration::from_millis(100), tx).unwrap();
        std::fs::File::create(root.join(".hidden.txt")).unwrap();
        std::fs::File::create(root.join("notes.md")).unwrap();
        std::fs::File::create(root.join("kept.txt")).unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event within timeout")
            .expect("channel open");
        assert_eq!(event.path, root.join("kept.txt").to_string_lossy());
    }

    #[tokio::test]
    async fn test_disabled_source_forwards_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let filter = PathFilter::new(&root, &[]).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let source = start(filter, Duration::from_millis(100), tx).unwrap();
        source.disable();
        std::fs::File::create(root.join("a.txt")).unwrap();

        let got = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
        assert!(got.is_err() || got.unwrap().is_none());
    }
}
