//! Persisted set of conversations the bot may answer automatically.
//!
//! Stored as a JSON array of chat ids. Every mutation is written through
//! immediately with an atomic temp-file + rename so a crash mid-write never
//! leaves a truncated file behind.

use std::{
    collections::BTreeSet,
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use tokio::task::JoinHandle;

use crate::{domain::ConversationId, errors::Error, Result};

pub type AllowSet = BTreeSet<ConversationId>;

#[derive(Debug)]
pub struct AllowList {
    path: PathBuf,
    write_timeout: Duration,
    chats: AllowSet,
    pending: Option<PendingWrite>,
}

/// A write that was started but has not been observed to finish.
///
/// A blocking write cannot be cancelled, so a timed-out write is kept here and
/// may still rename `set` over the file later.
#[derive(Debug)]
struct PendingWrite {
    set: AllowSet,
    handle: JoinHandle<Result<()>>,
}

impl AllowList {
    /// Load the allow-list from `path`.
    ///
    /// Never fails: a missing file yields an empty set, a corrupt or unreadable
    /// one yields an empty set and a logged `StoreCorrupt`.
    pub fn load(path: impl Into<PathBuf>, write_timeout: Duration) -> Self {
        let path = path.into();
        let chats = match read_allow_set(&path) {
            Ok(Some(set)) => {
                tracing::info!(path = %path.display(), count = set.len(), "loaded allowed chats");
                set
            }
            Ok(None) => {
                tracing::info!(path = %path.display(), "allowed chats file not found, starting empty");
                AllowSet::new()
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to read allowed chats, starting empty");
                AllowSet::new()
            }
        };

        Self {
            path,
            write_timeout,
            chats,
            pending: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: ConversationId) -> bool {
        self.chats.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    pub fn chats(&self) -> &AllowSet {
        &self.chats
    }

    /// Add `id` and persist. Returns `Ok(false)` when it was already present.
    pub async fn add(&mut self, id: ConversationId) -> Result<bool> {
        self.settle_pending().await?;
        if self.chats.contains(&id) {
            return Ok(false);
        }
        let mut next = self.chats.clone();
        next.insert(id);
        self.commit(next).await?;
        Ok(true)
    }

    /// Remove `id` and persist. Returns `Ok(false)` when it was not present.
    pub async fn remove(&mut self, id: ConversationId) -> Result<bool> {
        self.settle_pending().await?;
        if !self.chats.contains(&id) {
            return Ok(false);
        }
        let mut next = self.chats.clone();
        next.remove(&id);
        self.commit(next).await?;
        Ok(true)
    }

    /// Pick up a timed-out write that has since finished. Never waits.
    pub async fn reconcile(&mut self) {
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.handle.is_finished())
        {
            // Timeout is impossible here, the write already finished.
            let _ = self.settle_pending().await;
        }
    }

    /// True while a timed-out write may still land on disk.
    pub fn has_pending_write(&self) -> bool {
        self.pending.is_some()
    }

    // Callers settle first, so no older write is in flight. In-memory state
    // only changes once the new set is on disk.
    async fn commit(&mut self, next: AllowSet) -> Result<()> {
        let path = self.path.clone();
        let set = next.clone();
        let handle = tokio::task::spawn_blocking(move || write_allow_set(&path, &set));
        self.pending = Some(PendingWrite { set: next, handle });
        self.await_pending().await
    }

    /// Wait out an earlier write. Fails only if it is still running.
    async fn settle_pending(&mut self) -> Result<()> {
        if self.pending.is_none() {
            return Ok(());
        }
        match self.await_pending().await {
            Ok(()) => Ok(()),
            Err(e @ Error::Timeout(_)) => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "earlier allow-list write failed");
                Ok(())
            }
        }
    }

    async fn await_pending(&mut self) -> Result<()> {
        let timeout = self.write_timeout;
        let Some(pending) = self.pending.as_mut() else {
            return Ok(());
        };
        let joined = match tokio::time::timeout(timeout, &mut pending.handle).await {
            Ok(joined) => joined,
            Err(_) => {
                return Err(Error::Timeout(format!(
                    "writing {} took longer than {timeout:?}",
                    self.path.display()
                )))
            }
        };

        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        match joined {
            Ok(Ok(())) => {
                self.chats = pending.set;
                tracing::info!(path = %self.path.display(), count = self.chats.len(), "saved allowed chats");
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(join) => Err(Error::External(format!(
                "allow-list writer panicked: {join}"
            ))),
        }
    }
}

/// Read the persisted set. `Ok(None)` when the file does not exist.
pub fn read_allow_set(path: &Path) -> Result<Option<AllowSet>> {
    let txt = match fs::read_to_string(path) {
        Ok(txt) => txt,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::StoreCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };
    if txt.trim().is_empty() {
        return Ok(Some(AllowSet::new()));
    }
    let ids: Vec<ConversationId> =
        serde_json::from_str(&txt).map_err(|e| Error::StoreCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(Some(ids.into_iter().collect()))
}

/// Atomically replace `path` with the JSON encoding of `set`.
pub fn write_allow_set(path: &Path, set: &AllowSet) -> Result<()> {
    let txt = serde_json::to_string(&set.iter().collect::<Vec<_>>())?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path(path);
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(txt.as_bytes())?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;

    // Make the rename itself durable.
    #[cfg(unix)]
    {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::File::open(dir)?.sync_all()?;
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "allowed_chats.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}
