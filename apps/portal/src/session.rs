//! Per-user state sessions.
//!
//! A session is opened the first time a user with stored state (or a first
//! mutation) is seen, seeded from the store. Every successful mutation
//! reschedules a debounced write of both slices; the auto-save loop
//! periodically saves resumes with unsaved edits and then drops sessions
//! that are idle and fully persisted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::deferred::DeferredTask;
use crate::errors::AppError;
use crate::jobs::preferences::JobPreferences;
use crate::resume::ResumeManager;
use crate::storage::{job_key, load_json, resume_key, save_json, KeyValueStore};

#[derive(Debug, Default)]
pub struct UserSession {
    pub resume: ResumeManager,
    pub jobs: JobPreferences,
}

struct SessionEntry {
    state: Mutex<UserSession>,
    sync: DeferredTask,
    /// Set under the state lock by a mutation, cleared by a successful persist.
    dirty: AtomicBool,
    /// Set under the state lock on logout; later persists are skipped.
    closed: AtomicBool,
}

impl SessionEntry {
    fn new(session: UserSession) -> Self {
        SessionEntry {
            state: Mutex::new(session),
            sync: DeferredTask::new(),
            dirty: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }
}

pub struct SessionRegistry {
    store: Arc<dyn KeyValueStore>,
    sessions: Mutex<HashMap<Uuid, Arc<SessionEntry>>>,
    debounce: Duration,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>, debounce: Duration) -> Self {
        SessionRegistry {
            store,
            sessions: Mutex::new(HashMap::new()),
            debounce,
        }
    }

    /// Returns the open session, loading it from the store when needed.
    /// With `create` unset, a user with nothing stored gets `None` and no
    /// session is opened.
    async fn open_entry(
        &self,
        user_id: Uuid,
        create: bool,
    ) -> Result<Option<Arc<SessionEntry>>, AppError> {
        if let Some(entry) = self.sessions.lock().await.get(&user_id) {
            return Ok(Some(Arc::clone(entry)));
        }

        let resume: Option<ResumeManager> =
            load_json(self.store.as_ref(), &resume_key(user_id)).await?;
        let jobs: Option<JobPreferences> =
            load_json(self.store.as_ref(), &job_key(user_id)).await?;
        if !create && resume.is_none() && jobs.is_none() {
            return Ok(None);
        }

        let loaded = SessionEntry::new(UserSession {
            resume: resume.unwrap_or_default(),
            jobs: jobs.unwrap_or_default(),
        });
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.entry(user_id).or_insert_with(|| {
            info!("Opened session for user {user_id}");
            Arc::new(loaded)
        });
        Ok(Some(Arc::clone(entry)))
    }

    /// Runs a read-only view over the user's session. Users without any
    /// stored state are viewed as an empty session.
    pub async fn read<T>(
        &self,
        user_id: Uuid,
        f: impl FnOnce(&UserSession) -> T,
    ) -> Result<T, AppError> {
        match self.open_entry(user_id, false).await? {
            Some(entry) => {
                let session = entry.state.lock().await;
                Ok(f(&session))
            }
            None => Ok(f(&UserSession::default())),
        }
    }

    /// Applies a mutation and, when it succeeds, reschedules persistence.
    pub async fn update<T>(
        self: &Arc<Self>,
        user_id: Uuid,
        f: impl FnOnce(&mut UserSession) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let entry = self.open_entry(user_id, true).await?.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("session for {user_id} was not opened"))
        })?;
        let out = {
            let mut session = entry.state.lock().await;
            let out = f(&mut session)?;
            entry.dirty.store(true, Ordering::SeqCst);
            out
        };
        self.schedule_sync(user_id, &entry);
        Ok(out)
    }

    fn schedule_sync(self: &Arc<Self>, user_id: Uuid, entry: &Arc<SessionEntry>) {
        let registry = Arc::clone(self);
        let target = Arc::clone(entry);
        entry.sync.schedule(self.debounce, async move {
            if let Err(e) = registry.persist_entry(user_id, &target).await {
                warn!("Deferred persist for user {user_id} failed: {e}");
            }
        });
    }

    /// Writes both slices of a session to the store, unless it was closed.
    async fn persist_entry(&self, user_id: Uuid, entry: &SessionEntry) -> Result<(), AppError> {
        let session = entry.state.lock().await;
        if entry.closed.load(Ordering::SeqCst) {
            return Ok(());
        }
        save_json(self.store.as_ref(), &resume_key(user_id), &session.resume).await?;
        save_json(self.store.as_ref(), &job_key(user_id), &session.jobs).await?;
        entry.dirty.store(false, Ordering::SeqCst);
        debug!("Persisted session for user {user_id}");
        Ok(())
    }

    fn snapshot(sessions: &HashMap<Uuid, Arc<SessionEntry>>) -> Vec<(Uuid, Arc<SessionEntry>)> {
        sessions
            .iter()
            .map(|(id, entry)| (*id, Arc::clone(entry)))
            .collect()
    }

    /// Saves every current resume with unsaved edits and persists it, then
    /// evicts idle sessions. Returns how many sessions were written.
    pub async fn autosave_all(&self) -> usize {
        let entries = Self::snapshot(&*self.sessions.lock().await);

        let mut written = 0;
        for (user_id, entry) in entries {
            {
                let mut session = entry.state.lock().await;
                if !session.resume.has_unsaved_changes() {
                    continue;
                }
                if let Err(e) = session.resume.save() {
                    warn!("Auto-save for user {user_id} failed: {e}");
                    continue;
                }
            }
            entry.sync.cancel();
            match self.persist_entry(user_id, &entry).await {
                Ok(()) => written += 1,
                Err(e) => warn!("Auto-save persist for user {user_id} failed: {e}"),
            }
        }
        if written > 0 {
            info!("Auto-saved {written} resume(s)");
        }

        let evicted = self.evict_idle().await;
        if evicted > 0 {
            debug!("Evicted {evicted} idle session(s)");
        }
        written
    }

    /// Drops sessions that no request or pending write holds and whose
    /// state is already in the store.
    async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            let idle = Arc::strong_count(entry) == 1
                && !entry.sync.is_pending()
                && !entry.dirty.load(Ordering::SeqCst)
                && entry
                    .state
                    .try_lock()
                    .is_ok_and(|session| !session.resume.has_unsaved_changes());
            !idle
        });
        before - sessions.len()
    }

    /// Persists every open session immediately; used on shutdown.
    pub async fn flush_all(&self) -> Result<(), AppError> {
        let entries = Self::snapshot(&*self.sessions.lock().await);
        for (user_id, entry) in entries {
            entry.sync.cancel();
            self.persist_entry(user_id, &entry).await?;
        }
        Ok(())
    }

    /// Logout: forgets the session and removes both stored slices. A write
    /// already in flight finishes before the keys are removed.
    pub async fn clear(&self, user_id: Uuid) -> Result<(), AppError> {
        let entry = self.sessions.lock().await.remove(&user_id);
        let _guard = match &entry {
            Some(entry) => {
                entry.sync.cancel();
                let guard = entry.state.lock().await;
                entry.closed.store(true, Ordering::SeqCst);
                Some(guard)
            }
            None => None,
        };
        self.store.remove(&resume_key(user_id)).await?;
        self.store.remove(&job_key(user_id)).await?;
        info!("Cleared stored state for user {user_id}");
        Ok(())
    }
}
