// Folio - Offline Document Reader
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Two-priority task queue for background work
//!
//! Features:
//! - Interactive tasks dispatch immediately, ahead of any deferred backlog
//! - Deferred tasks run on a bounded worker pool
//! - Tasks sharing a key run one at a time, in submission order
//! - Fire-and-forget submission: the caller never awaits completion
//! - drain() flushes outstanding work before teardown

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, Notify, Semaphore};
use uuid::Uuid;

type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// How urgently a task should run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPriority {
    /// Latency-sensitive work. Dispatched immediately, without waiting for a
    /// worker-pool slot, so a deferred backlog can never delay it.
    Interactive,
    /// Best-effort background work, bounded by the worker pool.
    Deferred,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Interactive => "interactive",
            TaskPriority::Deferred => "deferred",
        }
    }
}

/// A submitted task waiting to run or running
struct QueuedTask {
    task_id: String,
    priority: TaskPriority,
    future: TaskFuture,
}

/// Per-key bookkeeping: which keys have a running task, and what is parked
/// behind them
#[derive(Default)]
struct KeyTable {
    running: HashSet<String>,
    waiting: HashMap<String, VecDeque<QueuedTask>>,
}

/// Snapshot of queue occupancy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Tasks submitted but not yet finished
    pub outstanding: usize,
    /// Keys with a task currently running
    pub active_keys: usize,
    /// Tasks parked behind a running task with the same key
    pub parked: usize,
}

/// Fire-and-forget task queue with two priority tiers and per-key ordering
///
/// Cloning is cheap and produces a handle to the same queue.
#[derive(Clone)]
pub struct TaskQueue {
    semaphore: Arc<Semaphore>,
    keys: Arc<Mutex<KeyTable>>,
    outstanding: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl TaskQueue {
    /// Create a queue whose deferred tier runs at most `max_concurrent`
    /// tasks at a time
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            keys: Arc::new(Mutex::new(KeyTable::default())),
            outstanding: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        }
    }

    /// Submit a task
    ///
    /// Tasks sharing a `key` run one at a time in submission order; priority
    /// never reorders work within a key. The task's outcome is its own
    /// responsibility: failures must be handled (or logged) inside `future`.
    pub async fn spawn<F>(&self, priority: TaskPriority, key: Option<&str>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = QueuedTask {
            task_id: Uuid::new_v4().to_string(),
            priority,
            future: Box::pin(future),
        };
        self.outstanding.fetch_add(1, Ordering::AcqRel);

        match key {
            Some(key) => {
                let mut table = self.keys.lock().await;
                if table.running.contains(key) {
                    log::debug!(
                        "Parking {} task {} behind running key {}",
                        task.priority.as_str(),
                        task.task_id,
                        key
                    );
                    table
                        .waiting
                        .entry(key.to_string())
                        .or_default()
                        .push_back(task);
                    return;
                }
                table.running.insert(key.to_string());
                drop(table);
                self.spawn_worker(Some(key.to_string()), task);
            }
            None => self.spawn_worker(None, task),
        }
    }

    /// Wait until every submitted task has finished
    ///
    /// Intended for teardown and tests; new submissions while draining extend
    /// the wait.
    pub async fn drain(&self) {
        loop {
            let notified = self.idle.notified();
            if self.outstanding.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Current queue occupancy
    pub async fn stats(&self) -> QueueStats {
        let table = self.keys.lock().await;
        QueueStats {
            outstanding: self.outstanding.load(Ordering::Acquire),
            active_keys: table.running.len(),
            parked: table.waiting.values().map(|queue| queue.len()).sum(),
        }
    }

    // ===== Internal Methods =====

    /// Spawn a worker that runs `first` and then, for keyed tasks, keeps
    /// draining whatever parked behind the same key
    fn spawn_worker(&self, key: Option<String>, first: QueuedTask) {
        let semaphore = Arc::clone(&self.semaphore);
        let keys = Arc::clone(&self.keys);
        let outstanding = Arc::clone(&self.outstanding);
        let idle = Arc::clone(&self.idle);

        tokio::spawn(async move {
            let mut task = first;
            loop {
                let permit = match task.priority {
                    TaskPriority::Deferred => Some(semaphore.acquire().await.unwrap()),
                    TaskPriority::Interactive => None,
                };
                (task.future).await;
                drop(permit);

                if outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
                    idle.notify_waiters();
                }

                let Some(ref running_key) = key else {
                    break;
                };
                let next = {
                    let mut table = keys.lock().await;
                    match table
                        .waiting
                        .get_mut(running_key)
                        .and_then(|queue| queue.pop_front())
                    {
                        Some(next) => Some(next),
                        None => {
                            table.waiting.remove(running_key);
                            table.running.remove(running_key);
                            None
                        }
                    }
                };
                match next {
                    Some(next) => task = next,
                    None => break,
                }
            }
        });
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new(4)
    }
}
