//! Action Queue Executor
//!
//! One executor per navigation root. Batches of actions are appended to a single FIFO queue
//! and drained by one spawned task, one action at a time. After each action the executor
//! looks at its [`Resolution`]:
//!
//! - `Immediately` moves straight on
//! - `After(d)` sets a settle deadline the next action waits for
//! - `Pause` moves the rest of the current batch into the resumable slot and stops draining
//!   until [`ActionExecutor::resume`] or [`ActionExecutor::cancel_resume`]
//! - `Auto` becomes `After(configured delay)` when the action changed the tree
//!
//! A failing action aborts the rest of its own batch; later batches still run. Actions whose
//! target scope was dropped or unmounted are skipped.

mod apply;

use crate::action::{Action, Resolution};
use crate::config::NavigationConfiguration;
use crate::error::NavigationError;
use crate::events::{ExecutorEvent, NavigationEvent};
use crate::state::StateNode;
use crate::types::BatchId;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};
use tokio::sync::{oneshot, Notify};
use tokio::time::Instant;
use tracing::{debug, error, warn};

type Completion = oneshot::Sender<Result<bool, NavigationError>>;

/// What the drain task is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorPhase {
    Idle,
    Running,
    /// Waiting for a settle deadline before the next action
    WaitingTimer(Instant),
    /// Paused until resumed or cancelled
    WaitingExternal,
}

/// Executor statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Actions applied (including skipped ones)
    pub executed: usize,
    /// Batches that finished successfully
    pub completed: usize,
    /// Batches aborted by a failing action
    pub aborted: usize,
    pub paused: usize,
    pub resumed: usize,
    pub cancelled: usize,
}

struct QueuedAction {
    action: Action,
    target: Weak<StateNode>,
    batch: BatchId,
}

/// Remainder of a paused batch.
struct ResumableBatch {
    batch: BatchId,
    actions: VecDeque<QueuedAction>,
}

struct ExecutorState {
    queue: VecDeque<QueuedAction>,
    resumable: Option<ResumableBatch>,
    waiters: HashMap<BatchId, Completion>,
    phase: ExecutorPhase,
    draining: bool,
    settle_until: Option<Instant>,
    stats: ExecutorStats,
}

/// Result of applying one action.
pub(crate) struct Applied {
    /// Reported to the batch's caller if this is the batch's last action
    pub result: bool,
    pub resolution: Resolution,
    /// Actions spliced in front of the rest of the batch
    pub expansion: Vec<Action>,
}

impl Applied {
    fn auto(result: bool) -> Self {
        Self {
            result,
            resolution: Resolution::Auto,
            expansion: Vec::new(),
        }
    }

    fn resolved(resolution: Resolution) -> Self {
        Self {
            result: false,
            resolution,
            expansion: Vec::new(),
        }
    }

    fn expanded(expansion: Vec<Action>) -> Self {
        Self {
            result: false,
            resolution: Resolution::Immediately,
            expansion,
        }
    }
}

/// Handle on a submitted batch.
#[derive(Debug)]
pub struct BatchTicket {
    id: BatchId,
    receiver: oneshot::Receiver<Result<bool, NavigationError>>,
}

impl BatchTicket {
    pub fn id(&self) -> BatchId {
        self.id
    }

    /// Wait until the batch's last action has been applied.
    ///
    /// Resolves to whether that action changed anything, the first error that aborted the
    /// batch, or [`NavigationError::Cancelled`] if the batch was paused and then cancelled.
    pub async fn outcome(self) -> Result<bool, NavigationError> {
        self.receiver
            .await
            .map_err(|_| NavigationError::ExecutorStopped)?
    }

    /// Non-blocking check; `None` while the batch is still pending.
    pub fn try_outcome(&mut self) -> Option<Result<bool, NavigationError>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(NavigationError::ExecutorStopped)),
        }
    }
}

enum Step {
    Wait(Instant),
    Run(QueuedAction),
    Stop,
}

pub struct ActionExecutor {
    root: Weak<StateNode>,
    state: Mutex<ExecutorState>,
    settled: Notify,
}

impl ActionExecutor {
    pub(crate) fn new(root: Weak<StateNode>) -> Arc<Self> {
        Arc::new(Self {
            root,
            state: Mutex::new(ExecutorState {
                queue: VecDeque::new(),
                resumable: None,
                waiters: HashMap::new(),
                phase: ExecutorPhase::Idle,
                draining: false,
                settle_until: None,
                stats: ExecutorStats::default(),
            }),
            settled: Notify::new(),
        })
    }

    /// Append a batch of actions targeting `target`.
    pub fn submit(self: &Arc<Self>, target: &Arc<StateNode>, actions: Vec<Action>) -> BatchTicket {
        let batch = BatchId::next();
        let (tx, receiver) = oneshot::channel();
        let ticket = BatchTicket {
            id: batch,
            receiver,
        };
        if actions.is_empty() {
            let _ = tx.send(Ok(false));
            return ticket;
        }

        let weak = Arc::downgrade(target);
        let mut state = self.state.lock();
        state
            .queue
            .extend(actions.into_iter().map(|action| QueuedAction {
                action,
                target: weak.clone(),
                batch,
            }));
        state.waiters.insert(batch, tx);
        debug!(
            batch_id = batch.as_u64(),
            queued = state.queue.len(),
            "Navigation batch submitted"
        );
        self.ensure_draining(&mut state);
        ticket
    }

    /// Continue a paused batch ahead of everything queued after it.
    ///
    /// Returns false if nothing is paused.
    pub fn resume(self: &Arc<Self>) -> bool {
        let retained = {
            let mut state = self.state.lock();
            let Some(slot) = state.resumable.take() else {
                return false;
            };
            let retained = slot.actions.len();
            for action in slot.actions.into_iter().rev() {
                state.queue.push_front(action);
            }
            state.stats.resumed += 1;
            state.phase = ExecutorPhase::Idle;
            self.ensure_draining(&mut state);
            retained
        };
        self.log(NavigationEvent::Executor(ExecutorEvent::Resumed { retained }));
        true
    }

    /// Discard the paused batch; its caller receives [`NavigationError::Cancelled`].
    /// Batches queued behind it then run.
    ///
    /// Returns false if nothing is paused.
    pub fn cancel_resume(self: &Arc<Self>) -> bool {
        let discarded = {
            let mut state = self.state.lock();
            let Some(slot) = state.resumable.take() else {
                return false;
            };
            if let Some(waiter) = state.waiters.remove(&slot.batch) {
                let _ = waiter.send(Err(NavigationError::Cancelled));
            }
            state.stats.cancelled += 1;
            state.phase = ExecutorPhase::Idle;
            self.ensure_draining(&mut state);
            slot.actions.len()
        };
        self.log(NavigationEvent::Executor(ExecutorEvent::Cancelled { discarded }));
        true
    }

    pub fn phase(&self) -> ExecutorPhase {
        self.state.lock().phase
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().resumable.is_some()
    }

    /// Actions waiting to run, excluding a paused remainder.
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn stats(&self) -> ExecutorStats {
        self.state.lock().stats.clone()
    }

    /// Wait until the drain task has stopped: the queue is empty or paused.
    pub async fn wait_until_settled(&self) {
        loop {
            let mut notified = std::pin::pin!(self.settled.notified());
            notified.as_mut().enable();
            if !self.state.lock().draining {
                return;
            }
            notified.await;
        }
    }

    fn ensure_draining(self: &Arc<Self>, state: &mut ExecutorState) {
        if state.draining || state.resumable.is_some() || state.queue.is_empty() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                state.draining = true;
                handle.spawn(Arc::clone(self).drain());
            }
            Err(_) => {
                error!("No tokio runtime available to execute navigation actions");
                state.queue.clear();
                for (_, waiter) in state.waiters.drain() {
                    let _ = waiter.send(Err(NavigationError::ExecutorStopped));
                }
            }
        }
    }

    async fn drain(self: Arc<Self>) {
        loop {
            let step = {
                let mut state = self.state.lock();
                if state.resumable.is_some() {
                    state.phase = ExecutorPhase::WaitingExternal;
                    state.draining = false;
                    Step::Stop
                } else if state.queue.is_empty() {
                    state.phase = ExecutorPhase::Idle;
                    state.draining = false;
                    Step::Stop
                } else {
                    match state.settle_until {
                        Some(deadline) if deadline > Instant::now() => {
                            state.phase = ExecutorPhase::WaitingTimer(deadline);
                            Step::Wait(deadline)
                        }
                        _ => {
                            state.settle_until = None;
                            state.phase = ExecutorPhase::Running;
                            match state.queue.pop_front() {
                                Some(job) => Step::Run(job),
                                None => Step::Stop,
                            }
                        }
                    }
                }
            };

            match step {
                Step::Wait(deadline) => tokio::time::sleep_until(deadline).await,
                Step::Run(job) => self.run(job),
                Step::Stop => {
                    self.settled.notify_waiters();
                    return;
                }
            }
        }
    }

    fn run(&self, job: QueuedAction) {
        let QueuedAction {
            action,
            target,
            batch,
        } = job;

        let Some(node) = target.upgrade().filter(|node| self.is_mounted(node)) else {
            warn!(
                batch_id = batch.as_u64(),
                action = action.name(),
                "Target scope dropped or unmounted, skipping action"
            );
            let mut state = self.state.lock();
            state.stats.executed += 1;
            Self::finish_action(&mut state, batch, false);
            return;
        };

        node.log(NavigationEvent::Executor(ExecutorEvent::Executing {
            batch,
            action: format!("{:?}", action),
        }));

        let root = node.root_node();
        let revision = root.subtree_revision();
        let outcome = apply::apply(&node, action);
        let changed_tree = root.subtree_revision() != revision;
        let delay = node.configuration().execution_delay();

        let mut events = Vec::new();
        {
            let mut state = self.state.lock();
            state.stats.executed += 1;
            match outcome {
                Ok(applied) => {
                    for action in applied.expansion.into_iter().rev() {
                        state.queue.push_front(QueuedAction {
                            action,
                            target: target.clone(),
                            batch,
                        });
                    }

                    let resolution = match applied.resolution {
                        Resolution::Auto if changed_tree => Resolution::After(delay),
                        Resolution::Auto => Resolution::Immediately,
                        other => other,
                    };
                    match resolution {
                        Resolution::After(duration) => {
                            state.settle_until = Some(
                                Instant::now() + NavigationConfiguration::clamp_delay(duration),
                            );
                        }
                        Resolution::Pause => {
                            let mut actions = VecDeque::new();
                            while state.queue.front().is_some_and(|next| next.batch == batch) {
                                if let Some(next) = state.queue.pop_front() {
                                    actions.push_back(next);
                                }
                            }
                            events.push(ExecutorEvent::Paused {
                                batch,
                                retained: actions.len(),
                            });
                            state.stats.paused += 1;
                            state.resumable = Some(ResumableBatch { batch, actions });
                        }
                        Resolution::Immediately | Resolution::Auto => {}
                    }
                    Self::finish_action(&mut state, batch, applied.result);
                }
                Err(error) => {
                    while state.queue.front().is_some_and(|next| next.batch == batch) {
                        state.queue.pop_front();
                    }
                    events.push(ExecutorEvent::Aborted {
                        batch,
                        reason: error.to_string(),
                    });
                    state.stats.aborted += 1;
                    if let Some(waiter) = state.waiters.remove(&batch) {
                        let _ = waiter.send(Err(error));
                    }
                }
            }
        }
        for event in events {
            node.log(NavigationEvent::Executor(event));
        }
    }

    /// Whether `node` is still part of this executor's tree.
    fn is_mounted(&self, node: &Arc<StateNode>) -> bool {
        self.root
            .upgrade()
            .is_some_and(|root| node.root_node().id() == root.id())
    }

    /// Complete `batch` if no action of it remains queued or paused.
    fn finish_action(state: &mut ExecutorState, batch: BatchId, result: bool) {
        let continues = state.queue.front().is_some_and(|next| next.batch == batch)
            || state
                .resumable
                .as_ref()
                .is_some_and(|slot| slot.batch == batch && !slot.actions.is_empty());
        if continues {
            return;
        }
        if let Some(waiter) = state.waiters.remove(&batch) {
            state.stats.completed += 1;
            let _ = waiter.send(Ok(result));
        }
    }

    fn log(&self, event: NavigationEvent) {
        match self.root.upgrade() {
            Some(root) => root.log(event),
            None => debug!("{}", event),
        }
    }
}

impl std::fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ActionExecutor")
            .field("phase", &state.phase)
            .field("queued", &state.queue.len())
            .field("paused", &state.resumable.is_some())
            .finish()
    }
}
