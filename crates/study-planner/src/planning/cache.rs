use chrono::Weekday;
use std::collections::HashMap;
use std::sync::Mutex;

use super::domain::ScheduleBlock;
use super::repository::{RepositoryError, ScheduleStore};

/// Memoizes template lookups per (student, weekday) for the wrapper's lifetime.
///
/// Entries are never invalidated implicitly; callers that edit templates must
/// call [`clear`](Self::clear) or accept stale display until restart. Failed
/// lookups are not cached.
#[derive(Debug)]
pub struct CachedScheduleStore<S> {
    inner: S,
    entries: Mutex<HashMap<(String, Weekday), Vec<ScheduleBlock>>>,
}

impl<S: ScheduleStore> CachedScheduleStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, Weekday), Vec<ScheduleBlock>>> {
        // A poisoned cache only holds clones; keep serving it.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S: ScheduleStore> ScheduleStore for CachedScheduleStore<S> {
    fn blocks_for(
        &self,
        student: &str,
        weekday: Weekday,
    ) -> Result<Vec<ScheduleBlock>, RepositoryError> {
        let key = (student.trim().to_ascii_lowercase(), weekday);
        if let Some(blocks) = self.lock().get(&key) {
            return Ok(blocks.clone());
        }

        let blocks = self.inner.blocks_for(student, weekday)?;
        self.lock().insert(key, blocks.clone());
        Ok(blocks)
    }
}
