use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use super::{RunState, Step};

/// Snapshot of the run state taken right after `step` finished.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub step: Step,
    pub state: RunState,
}

/// Threads kept before the oldest trail is evicted.
pub const DEFAULT_MAX_THREADS: usize = 64;

/// In-memory checkpoint trail keyed by an opaque thread id.
///
/// Nothing is persisted. At most `max_threads` trails are kept; starting a new
/// thread beyond that evicts the least recently started one. Safe to share
/// across concurrent runs as long as they use distinct thread ids.
#[derive(Debug)]
pub struct MemoryCheckpointer {
    inner: Mutex<Trails>,
    max_threads: usize,
}

#[derive(Debug, Default)]
struct Trails {
    by_thread: HashMap<String, Vec<Checkpoint>>,
    /// Thread ids in the order their trails were started.
    order: VecDeque<String>,
}

impl Trails {
    fn remove(&mut self, thread_id: &str) {
        if self.by_thread.remove(thread_id).is_some() {
            self.order.retain(|id| id != thread_id);
        }
    }
}

impl Default for MemoryCheckpointer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_THREADS)
    }
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that keeps at most `max_threads` trails (at least one).
    pub fn with_capacity(max_threads: usize) -> Self {
        Self {
            inner: Mutex::new(Trails::default()),
            max_threads: max_threads.max(1),
        }
    }

    pub fn save(&self, thread_id: &str, step: Step, state: &RunState) {
        let mut trails = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !trails.by_thread.contains_key(thread_id) {
            while trails.order.len() >= self.max_threads {
                let Some(oldest) = trails.order.pop_front() else {
                    break;
                };
                trails.by_thread.remove(&oldest);
            }
            trails.order.push_back(thread_id.to_string());
        }
        trails
            .by_thread
            .entry(thread_id.to_string())
            .or_default()
            .push(Checkpoint {
                step,
                state: state.clone(),
            });
    }

    pub fn history(&self, thread_id: &str) -> Vec<Checkpoint> {
        let trails = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        trails.by_thread.get(thread_id).cloned().unwrap_or_default()
    }

    pub fn latest(&self, thread_id: &str) -> Option<Checkpoint> {
        let trails = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        trails
            .by_thread
            .get(thread_id)
            .and_then(|trail| trail.last().cloned())
    }

    /// Drops the trail of one thread.
    pub fn clear(&self, thread_id: &str) {
        let mut trails = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        trails.remove(thread_id);
    }

    /// Number of threads currently holding a trail.
    pub fn thread_count(&self) -> usize {
        let trails = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        trails.by_thread.len()
    }
}
