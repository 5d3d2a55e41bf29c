//! Bounded task pool.
//!
//! [`TaskPool`] starts tasks in registration order, never keeps more than
//! `limit` of them in flight, and refills a slot as soon as any running task
//! settles. All bookkeeping happens inside the single [`TaskPool::run_with`]
//! future; task operations run on a [`JoinSet`] and only report back their
//! [`TerminationSignal`]. A failing or panicking task is recorded like any
//! other outcome and never stops its siblings.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::future::Future;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::task::{Id, JoinSet};
use tracing::{debug, warn};

use super::signal::{FailureReason, TerminationSignal};
use crate::error::{CapgenError, Result};

type BoxedRun = Pin<Box<dyn Future<Output = TerminationSignal> + Send + 'static>>;
type Operation = Box<dyn FnOnce() -> BoxedRun + Send + 'static>;

/// Concurrency limit used when none is configured: one task per available core.
pub fn default_limit() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Hooks called by the pool as tasks move through their lifecycle.
///
/// Every method defaults to doing nothing.
pub trait PoolEvents {
    fn pool_started(&self, _total: usize, _limit: usize) {}
    fn task_started(&self, _name: &str) {}
    fn task_finished(&self, _name: &str, _signal: &TerminationSignal) {}
}

#[cfg(test)]
struct Silent;

#[cfg(test)]
impl PoolEvents for Silent {}

struct Task {
    name: String,
    operation: Operation,
}

struct Running {
    name: String,
    started_at: DateTime<Utc>,
    clock: Instant,
}

/// Outcome of one task, with when it started and how long it ran.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub signal: TerminationSignal,
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
}

/// Every task's outcome, keyed by task name.
#[derive(Debug, Clone, Default)]
pub struct PoolReport {
    outcomes: BTreeMap<String, TaskRecord>,
}

impl PoolReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    #[cfg(test)]
    pub fn signal(&self, name: &str) -> Option<&TerminationSignal> {
        self.outcomes.get(name).map(|r| &r.signal)
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &TaskRecord)> {
        self.outcomes.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn completed(&self) -> usize {
        self.outcomes
            .values()
            .filter(|r| r.signal.is_completed())
            .count()
    }

    /// Failed task names with their reasons, sorted by name.
    pub fn failures(&self) -> Vec<(&str, &FailureReason)> {
        self.outcomes
            .iter()
            .filter_map(|(name, r)| r.signal.failure().map(|reason| (name.as_str(), reason)))
            .collect()
    }

    pub fn all_completed(&self) -> bool {
        self.outcomes.values().all(|r| r.signal.is_completed())
    }

    /// Process exit code for the driver: 0 only if every task completed.
    pub fn exit_status(&self) -> u8 {
        if self.all_completed() { 0 } else { 1 }
    }
}

/// FIFO pool running at most `limit` tasks at once.
pub struct TaskPool {
    limit: NonZeroUsize,
    pending: VecDeque<Task>,
    names: HashSet<String>,
    closed: bool,
}

impl TaskPool {
    /// Creates an empty pool. A limit of zero is rejected.
    pub fn new(limit: usize) -> Result<Self> {
        let limit = NonZeroUsize::new(limit).ok_or(CapgenError::InvalidLimit(limit))?;
        Ok(Self {
            limit,
            pending: VecDeque::new(),
            names: HashSet::new(),
            closed: false,
        })
    }

    pub fn limit(&self) -> usize {
        self.limit.get()
    }

    /// Registers a task. `operation` is not called until the task starts.
    ///
    /// Fails if a task with the same name is already registered or if the
    /// pool has already run.
    pub fn add<F, Fut>(&mut self, name: impl Into<String>, operation: F) -> Result<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = TerminationSignal> + Send + 'static,
    {
        if self.closed {
            return Err(CapgenError::PoolClosed);
        }
        let name = name.into();
        if !self.names.insert(name.clone()) {
            return Err(CapgenError::DuplicateTask(name));
        }
        self.pending.push_back(Task {
            name,
            operation: Box::new(move || Box::pin(operation()) as BoxedRun),
        });
        Ok(())
    }

    /// Runs every registered task without reporting progress.
    #[cfg(test)]
    pub async fn run(&mut self) -> PoolReport {
        self.run_with(&Silent).await
    }

    /// Runs every registered task, resolving once each one has an outcome.
    pub async fn run_with(&mut self, events: &dyn PoolEvents) -> PoolReport {
        let limit = self.limit.get();
        events.pool_started(self.pending.len(), limit);

        let mut in_flight = JoinSet::new();
        let mut running: HashMap<Id, Running> = HashMap::with_capacity(limit);
        let mut outcomes = BTreeMap::new();

        loop {
            while running.len() < limit {
                let Some(task) = self.pending.pop_front() else {
                    break;
                };
                debug!(task = %task.name, running = running.len() + 1, limit, "starting task");
                events.task_started(&task.name);
                let handle = in_flight.spawn((task.operation)());
                running.insert(
                    handle.id(),
                    Running {
                        name: task.name,
                        started_at: Utc::now(),
                        clock: Instant::now(),
                    },
                );
            }

            let Some(joined) = in_flight.join_next_with_id().await else {
                break;
            };
            let (id, signal) = match joined {
                Ok((id, signal)) => (id, signal),
                Err(err) => {
                    let reason = FailureReason::Panicked(err.to_string());
                    (err.id(), TerminationSignal::Failed(reason))
                }
            };
            let Some(task) = running.remove(&id) else {
                warn!(?id, "settled task was not tracked as running");
                continue;
            };

            match &signal {
                TerminationSignal::Completed => debug!(task = %task.name, "task completed"),
                TerminationSignal::Failed(reason) => {
                    warn!(task = %task.name, %reason, "task failed")
                }
            }
            events.task_finished(&task.name, &signal);
            outcomes.insert(
                task.name,
                TaskRecord {
                    signal,
                    started_at: task.started_at,
                    duration_ms: task.clock.elapsed().as_millis() as i64,
                },
            );
        }

        self.closed = true;
        PoolReport { outcomes }
    }
}
