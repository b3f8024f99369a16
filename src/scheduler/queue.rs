use super::hint::ResourceKind;
use std::collections::{HashMap, VecDeque};

/// What caused a URL to be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOrigin {
    /// Critical resources issued directly at init, outside the bounded queue
    Critical,
    Viewport,
    Hover,
    Explicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Active,
    Done,
    Failed,
}

/// One URL's preload lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadTask {
    pub url: String,
    pub kind: ResourceKind,
    pub origin: TriggerOrigin,
    pub state: TaskState,
}

/// Counters exposed for diagnostics and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub queued: usize,
    pub active: usize,
    pub peak_active: usize,
    pub dispatched: usize,
    pub done: usize,
    pub failed: usize,
}

/// FIFO of pending preloads plus the page-lifetime dedup set.
///
/// Every URL ever seen keeps its task entry, so a URL is requested at most
/// once no matter which trigger asks for it again.
#[derive(Debug)]
pub struct PreloadQueue {
    ceiling: usize,
    pending: VecDeque<String>,
    tasks: HashMap<String, PreloadTask>,
    active: usize,
    stats: QueueStats,
}

impl PreloadQueue {
    pub fn new(ceiling: usize) -> Self {
        Self {
            // A zero ceiling would stall the queue forever
            ceiling: ceiling.max(1),
            pending: VecDeque::new(),
            tasks: HashMap::new(),
            active: 0,
            stats: QueueStats::default(),
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn is_known(&self, url: &str) -> bool {
        self.tasks.contains_key(url)
    }

    pub fn task(&self, url: &str) -> Option<&PreloadTask> {
        self.tasks.get(url)
    }

    /// Append to the FIFO; returns false when the URL was already seen
    pub fn push(&mut self, url: &str, kind: ResourceKind, origin: TriggerOrigin) -> bool {
        if self.is_known(url) {
            return false;
        }
        self.tasks.insert(
            url.to_string(),
            PreloadTask {
                url: url.to_string(),
                kind,
                origin,
                state: TaskState::Queued,
            },
        );
        self.pending.push_back(url.to_string());
        self.stats.queued += 1;
        true
    }

    /// Record a URL dispatched directly (not through the bounded FIFO)
    pub fn register_direct(&mut self, url: &str, kind: ResourceKind) -> bool {
        if self.is_known(url) {
            return false;
        }
        self.tasks.insert(
            url.to_string(),
            PreloadTask {
                url: url.to_string(),
                kind,
                origin: TriggerOrigin::Critical,
                state: TaskState::Active,
            },
        );
        self.stats.dispatched += 1;
        true
    }

    /// Pop the oldest pending task if a concurrency slot is free
    pub fn start_next(&mut self) -> Option<PreloadTask> {
        if self.active >= self.ceiling {
            return None;
        }
        let url = self.pending.pop_front()?;
        let task = self.tasks.get_mut(&url)?;
        task.state = TaskState::Active;

        self.active += 1;
        self.stats.queued -= 1;
        self.stats.dispatched += 1;
        self.stats.peak_active = self.stats.peak_active.max(self.active);
        Some(task.clone())
    }

    /// Mark a dispatched task settled, freeing its slot if it held one
    pub fn finish(&mut self, url: &str, ok: bool) {
        let Some(task) = self.tasks.get_mut(url) else {
            return;
        };
        if task.state != TaskState::Active {
            return;
        }
        task.state = if ok { TaskState::Done } else { TaskState::Failed };
        if ok {
            self.stats.done += 1;
        } else {
            self.stats.failed += 1;
        }
        if task.origin != TriggerOrigin::Critical {
            self.active -= 1;
        }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            active: self.active,
            ..self.stats
        }
    }
}
