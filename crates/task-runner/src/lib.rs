//! Concurrent local execution of a resolved, sorted task set.
//!
//! Grounded in `ExecutionEngine::execute_group`
//! (`crates/ci/src/executor/engine.rs`): one worker per unit of work spawned
//! into a `JoinSet`, a shared cancellation token, and first-error-wins
//! semantics. The dependency-wait mechanism (one `RwLock<()>` per task,
//! write-locked until the task completes) is specific to this engine and
//! replaces the `execute_group` `Semaphore`-based concurrency cap, which
//! this engine does not need since every task waits only on its own
//! declared dependencies.

mod error;
mod observer;
mod result_map;
mod status;

pub use error::{Error, Result};
pub use observer::{NoOpObserver, RunnerObserver};
pub use result_map::ResultMap;
pub use status::{RunnerPhase, TaskStatus};

use chrono::Utc;
use inspect_task_graph::TaskSet;
use inspect_task_model::{Task, TaskContext, TaskError};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::{Notify, OwnedRwLockWriteGuard, RwLock};
use tokio::task::JoinSet;

/// The final disposition of a run, readable via [`LocalRunner::result`]
/// once [`LocalRunner::wait`] returns.
#[derive(Clone)]
pub enum RunOutcome {
    /// Every task completed successfully; results are in the map.
    Completed(ResultMap),
    /// At least one task failed. Carries the first failure's message,
    /// prefixed with its originating task's implementation ID. Takes
    /// precedence over [`RunOutcome::Cancelled`] when both occurred.
    Failed(String),
    /// The caller's context was cancelled and no task failed.
    Cancelled,
}

struct TaskSlot {
    task: Arc<dyn Task>,
    waiter: Arc<RwLock<()>>,
    guard: Arc<Mutex<Option<OwnedRwLockWriteGuard<()>>>>,
    status: Arc<RwLock<TaskStatus>>,
}

/// Executes a [`TaskSet`] that has already been topologically sorted.
///
/// One worker task runs per entry in the set; a worker blocks on its
/// dependencies' waiters before invoking [`Task::run`], and releases its own
/// waiter on success so dependents can proceed.
pub struct LocalRunner {
    slots: HashMap<String, TaskSlot>,
    order: Vec<String>,
    result_map: ResultMap,
    observer: Arc<dyn RunnerObserver>,
    started: AtomicBool,
    done: Arc<Notify>,
    terminal: Arc<AtomicBool>,
    outcome: Arc<OnceLock<RunOutcome>>,
}

impl LocalRunner {
    /// Build a runner for an already-sorted task set.
    ///
    /// Slots are keyed by implementation ID, not reference: spec §3's only
    /// uniqueness invariant is on implementation ID, so two tasks may share a
    /// reference (e.g. two `required=true` tasks injected by resolver rule
    /// R1) and must both still get their own worker.
    ///
    /// # Errors
    /// Returns [`Error::NotRunnable`] if `tasks` was never successfully
    /// topologically sorted.
    pub fn new(tasks: TaskSet, observer: Arc<dyn RunnerObserver>) -> Result<Self> {
        if !tasks.is_runnable() {
            return Err(Error::NotRunnable);
        }

        let mut slots = HashMap::new();
        let mut order = Vec::new();
        for task in tasks.into_tasks() {
            let implementation_id = task.id().to_string();
            let waiter = Arc::new(RwLock::new(()));
            let owned_guard = Arc::clone(&waiter)
                .try_write_owned()
                .expect("freshly constructed lock is always uncontested");
            order.push(implementation_id.clone());
            slots.insert(
                implementation_id,
                TaskSlot {
                    task,
                    waiter,
                    guard: Arc::new(Mutex::new(Some(owned_guard))),
                    status: Arc::new(RwLock::new(TaskStatus::default())),
                },
            );
        }

        Ok(Self {
            slots,
            order,
            result_map: ResultMap::new(),
            observer,
            started: AtomicBool::new(false),
            done: Arc::new(Notify::new()),
            terminal: Arc::new(AtomicBool::new(false)),
            outcome: Arc::new(OnceLock::new()),
        })
    }

    /// Start the run in the background, linking its cancellation to
    /// `parent_ctx`. Returns once the run has been scheduled, not once it
    /// has finished; await [`LocalRunner::wait`] for completion.
    ///
    /// # Errors
    /// Returns [`Error::AlreadyStarted`] if called more than once.
    pub fn run(&self, parent_ctx: TaskContext) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyStarted);
        }

        let ctx = parent_ctx.child_token();
        let result_map = self.result_map.clone();
        let observer = Arc::clone(&self.observer);
        let done = Arc::clone(&self.done);
        let terminal = Arc::clone(&self.terminal);
        let outcome_cell = Arc::clone(&self.outcome);
        let first_error: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        let mut workers: Vec<(Arc<dyn Task>, Arc<Mutex<Option<OwnedRwLockWriteGuard<()>>>>, Arc<RwLock<TaskStatus>>)> =
            Vec::with_capacity(self.slots.len());
        // Keyed by reference rather than implementation ID: a dependency is
        // declared on a reference, and several implementations may share one
        // (e.g. two `required=true` tasks injected by resolver rule R1), so
        // a dependent must wait for every provider of that reference, not
        // just one.
        let mut waiters_by_ref: HashMap<String, Vec<Arc<RwLock<()>>>> = HashMap::new();
        for slot in self.slots.values() {
            waiters_by_ref
                .entry(slot.task.id().reference().to_string())
                .or_default()
                .push(Arc::clone(&slot.waiter));
        }
        for slot in self.slots.values() {
            workers.push((
                Arc::clone(&slot.task),
                Arc::clone(&slot.guard),
                Arc::clone(&slot.status),
            ));
        }

        tokio::spawn(async move {
            ctx.insert(result_map.clone()).await;
            let mut join_set: JoinSet<()> = JoinSet::new();

            for (task, own_guard, status) in workers {
                let ctx = ctx.clone();
                let waiters_by_ref = waiters_by_ref.clone();
                let result_map = result_map.clone();
                let observer = Arc::clone(&observer);
                let first_error = Arc::clone(&first_error);
                join_set.spawn(async move {
                    run_task_worker(
                        task,
                        ctx,
                        &waiters_by_ref,
                        own_guard,
                        status,
                        result_map,
                        observer,
                        first_error,
                    )
                    .await;
                });
            }

            while join_set.join_next().await.is_some() {}

            // Release any guards a worker never got to (e.g. it never ran
            // because the run was cancelled before its turn), so a probe
            // after the run never deadlocks.
            for waiter in waiters_by_ref.values().flatten() {
                let _ = Arc::clone(waiter).try_write_owned();
            }

            let outcome = match first_error.lock().unwrap_or_else(|e| e.into_inner()).take() {
                Some(message) => RunOutcome::Failed(message),
                None if ctx.is_cancelled() => RunOutcome::Cancelled,
                None => RunOutcome::Completed(result_map),
            };
            tracing::info!(?outcome, "run finished");
            let _ = outcome_cell.set(outcome);
            terminal.store(true, Ordering::SeqCst);
            done.notify_waiters();
        });

        Ok(())
    }

    /// Suspend until the run reaches a terminal state.
    pub async fn wait(&self) {
        let notified = self.done.notified();
        if self.terminal.load(Ordering::SeqCst) {
            return;
        }
        notified.await;
    }

    /// The run's final outcome, if it has finished.
    #[must_use]
    pub fn result(&self) -> Option<RunOutcome> {
        self.outcome.get().cloned()
    }

    /// Current status of one task, by its implementation ID string.
    pub async fn status(&self, implementation_id: &str) -> Option<TaskStatus> {
        let slot = self.slots.get(implementation_id)?;
        Some(slot.status.read().await.clone())
    }

    /// Implementation IDs in this runner's topological order.
    #[must_use]
    pub fn order(&self) -> &[String] {
        &self.order
    }
}

impl fmt::Debug for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(_) => write!(f, "Completed"),
            Self::Failed(message) => write!(f, "Failed({message})"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_task_worker(
    task: Arc<dyn Task>,
    ctx: TaskContext,
    waiters_by_ref: &HashMap<String, Vec<Arc<RwLock<()>>>>,
    own_guard: Arc<Mutex<Option<OwnedRwLockWriteGuard<()>>>>,
    status: Arc<RwLock<TaskStatus>>,
    result_map: ResultMap,
    observer: Arc<dyn RunnerObserver>,
    first_error: Arc<Mutex<Option<String>>>,
) {
    let id = task.id().clone();

    for dependency in task.dependencies() {
        let Some(waiters) = waiters_by_ref.get(dependency) else {
            continue;
        };
        for waiter in waiters {
            let wait = Arc::clone(waiter).read_owned();
            tokio::select! {
                guard = wait => drop(guard),
                () = ctx.cancelled() => {
                    mark_stopped(&status, Some("cancelled".to_string())).await;
                    observer.task_completed(&id, Some("cancelled")).await;
                    return;
                }
            }
        }
    }

    if ctx.is_cancelled() {
        mark_stopped(&status, Some("cancelled".to_string())).await;
        observer.task_completed(&id, Some("cancelled")).await;
        return;
    }

    {
        let mut s = status.write().await;
        s.phase = RunnerPhase::Running;
        s.start = Some(Utc::now());
    }
    observer.task_started(&id).await;

    match task.run(&ctx).await {
        Ok(value) => {
            result_map.insert_value(id.reference().to_string(), value).await;
            release(&own_guard);
            mark_stopped(&status, None).await;
            observer.task_completed(&id, None).await;
        }
        Err(TaskError::Cancelled) => {
            mark_stopped(&status, Some("cancelled".to_string())).await;
            observer.task_completed(&id, Some("cancelled")).await;
        }
        Err(TaskError::Failed(message)) => {
            let full = format!("task {id} failed: {message}");
            {
                let mut guard = first_error.lock().unwrap_or_else(|e| e.into_inner());
                if guard.is_none() {
                    *guard = Some(full.clone());
                }
            }
            ctx.cancel();
            mark_stopped(&status, Some(full.clone())).await;
            observer.task_completed(&id, Some(&full)).await;
        }
    }
}

fn release(guard: &Arc<Mutex<Option<OwnedRwLockWriteGuard<()>>>>) {
    guard.lock().unwrap_or_else(|e| e.into_inner()).take();
}

async fn mark_stopped(status: &Arc<RwLock<TaskStatus>>, error: Option<String>) {
    let mut s = status.write().await;
    s.phase = RunnerPhase::Stopped;
    s.end = Some(Utc::now());
    s.error = error;
}
