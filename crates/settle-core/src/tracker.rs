//! # Async operation tracking
//!
//! [`AsyncTracker`] follows one outstanding asynchronous operation through
//! `Idle → Pending → Resolved | Rejected` and publishes every transition to
//! its subscribers (the render callback of whatever presents it).
//!
//! ```rust
//! use futures::executor::LocalPool;
//! use settle_core::*;
//! use std::rc::Rc;
//!
//! let mut pool = LocalPool::new();
//! let tracker = AsyncTracker::<u32, String>::new(Rc::new(pool.spawner()));
//!
//! tracker.run(async { Ok(42) });
//! assert_eq!(tracker.status(), Status::Pending);
//!
//! pool.run_until_stalled();
//! assert_eq!(tracker.state(), AsyncState::Resolved(42));
//! ```
//!
//! Operation failures are stored, never raised: a presentation layer that
//! wants an enclosing error boundary to handle them calls
//! [`AsyncState::into_result`] and propagates the `Err`.
//!
//! Once the owner is torn down ([`AsyncTracker::teardown`], or disposal of
//! the [`Scope`](crate::Scope) the tracker was created in) late continuations
//! are dropped silently. The underlying operation still runs to completion;
//! teardown is not cancellation.

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::reducer::Reducer;
use crate::scope::{ActiveScope, current_scope};
use crate::signal::{Signal, SubId, signal};
use crate::spawn::Spawner;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Status {
    #[default]
    Idle,
    Pending,
    Resolved,
    Rejected,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Pending => "pending",
            Status::Resolved => "resolved",
            Status::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "idle" => Ok(Status::Idle),
            "pending" => Ok(Status::Pending),
            "resolved" => Ok(Status::Resolved),
            "rejected" => Ok(Status::Rejected),
            other => Err(Error::UnknownStatus(other.to_string())),
        }
    }
}

/// Status plus payload. Data exists only when resolved, the error only when
/// rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AsyncState<T, E> {
    Idle,
    Pending,
    Resolved(T),
    Rejected(E),
}

impl<T, E> Default for AsyncState<T, E> {
    fn default() -> Self {
        AsyncState::Idle
    }
}

impl<T, E> AsyncState<T, E> {
    /// Builds a state from a loose status/data/error triple, rejecting any
    /// combination where a payload is missing or belongs to another status.
    pub fn from_parts(status: Status, data: Option<T>, error: Option<E>) -> Result<Self> {
        let stray = |field| Error::UnexpectedPayload {
            status: status.as_str(),
            field,
        };
        let missing = |field| Error::MissingPayload {
            status: status.as_str(),
            field,
        };
        match (status, data, error) {
            (Status::Idle, None, None) => Ok(AsyncState::Idle),
            (Status::Pending, None, None) => Ok(AsyncState::Pending),
            (Status::Resolved, Some(d), None) => Ok(AsyncState::Resolved(d)),
            (Status::Rejected, None, Some(e)) => Ok(AsyncState::Rejected(e)),
            (Status::Resolved, None, _) => Err(missing("data")),
            (Status::Rejected, _, None) => Err(missing("error")),
            (Status::Resolved, Some(_), Some(_)) => Err(stray("error")),
            (_, Some(_), _) => Err(stray("data")),
            (_, _, Some(_)) => Err(stray("error")),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            AsyncState::Idle => Status::Idle,
            AsyncState::Pending => Status::Pending,
            AsyncState::Resolved(_) => Status::Resolved,
            AsyncState::Rejected(_) => Status::Rejected,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            AsyncState::Resolved(d) => Some(d),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            AsyncState::Rejected(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, AsyncState::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, AsyncState::Pending)
    }

    /// `Ok(None)` while idle or pending, `Ok(Some(data))` once resolved, and
    /// the stored error once rejected.
    pub fn into_result(self) -> std::result::Result<Option<T>, E> {
        match self {
            AsyncState::Idle | AsyncState::Pending => Ok(None),
            AsyncState::Resolved(d) => Ok(Some(d)),
            AsyncState::Rejected(e) => Err(e),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AsyncAction<T, E> {
    Pending,
    Resolved(T),
    Rejected(E),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Pending,
    Resolved,
    Rejected,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Pending => "pending",
            ActionKind::Resolved => "resolved",
            ActionKind::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "pending" => Ok(ActionKind::Pending),
            "resolved" => Ok(ActionKind::Resolved),
            "rejected" => Ok(ActionKind::Rejected),
            other => Err(Error::UnhandledAction(other.to_string())),
        }
    }
}

impl<T, E> AsyncAction<T, E> {
    pub fn kind(&self) -> ActionKind {
        match self {
            AsyncAction::Pending => ActionKind::Pending,
            AsyncAction::Resolved(_) => ActionKind::Resolved,
            AsyncAction::Rejected(_) => ActionKind::Rejected,
        }
    }

    /// Builds an action from a textual tag and loose payload fields, as they
    /// arrive from devtools or a replay log.
    pub fn from_tag(tag: &str, data: Option<T>, error: Option<E>) -> Result<Self> {
        match tag.parse::<ActionKind>()? {
            ActionKind::Pending => Ok(AsyncAction::Pending),
            ActionKind::Resolved => data.map(AsyncAction::Resolved).ok_or(Error::MissingPayload {
                status: "resolved",
                field: "data",
            }),
            ActionKind::Rejected => error
                .map(AsyncAction::Rejected)
                .ok_or(Error::MissingPayload {
                    status: "rejected",
                    field: "error",
                }),
        }
    }
}

/// The transition function. Every action fully determines the next state.
pub fn reduce_async<T, E>(_state: &AsyncState<T, E>, action: AsyncAction<T, E>) -> AsyncState<T, E> {
    match action {
        AsyncAction::Pending => AsyncState::Pending,
        AsyncAction::Resolved(data) => AsyncState::Resolved(data),
        AsyncAction::Rejected(error) => AsyncState::Rejected(error),
    }
}

/// Tag-driven variant of [`reduce_async`]. Unknown tags fail and produce no state.
pub fn reduce_tagged<T, E>(
    state: &AsyncState<T, E>,
    tag: &str,
    data: Option<T>,
    error: Option<E>,
) -> Result<AsyncState<T, E>> {
    let action = AsyncAction::from_tag(tag, data, error)?;
    Ok(reduce_async(state, action))
}

pub struct AsyncReducer<T, E>(PhantomData<(T, E)>);

impl<T: Clone + 'static, E: Clone + 'static> Reducer for AsyncReducer<T, E> {
    type State = AsyncState<T, E>;
    type Action = AsyncAction<T, E>;

    fn reduce(state: &Self::State, action: Self::Action) -> Self::State {
        reduce_async(state, action)
    }
}

/// What happens when a second `run` starts before the first settles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Every continuation is applied; whichever operation settles last wins.
    #[default]
    Race,
    /// Only the most recent `run` may settle the state.
    LatestOnly,
}

#[derive(Clone, Debug)]
pub struct TrackerConfig<T, E> {
    pub initial: AsyncState<T, E>,
    pub overlap: OverlapPolicy,
}

impl<T, E> Default for TrackerConfig<T, E> {
    fn default() -> Self {
        Self {
            initial: AsyncState::Idle,
            overlap: OverlapPolicy::default(),
        }
    }
}

impl<T, E> TrackerConfig<T, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial(mut self, initial: AsyncState<T, E>) -> Self {
        self.initial = initial;
        self
    }

    /// Start as `Pending` when the caller already knows a `run` is coming
    /// (e.g. the input for the first request is available at mount).
    pub fn pending_if(mut self, cond: bool) -> Self {
        if cond {
            self.initial = AsyncState::Pending;
        }
        self
    }

    pub fn overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }
}

pub struct AsyncTracker<T: 'static, E: 'static> {
    inner: Rc<TrackerInner<T, E>>,
}

struct TrackerInner<T: 'static, E: 'static> {
    state: Signal<AsyncState<T, E>>,
    active: ActiveScope,
    spawner: Rc<dyn Spawner>,
    overlap: OverlapPolicy,
    generation: Cell<u64>,
}

impl<T: 'static, E: 'static> Clone for AsyncTracker<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static, E: 'static> AsyncTracker<T, E> {
    pub fn new(spawner: Rc<dyn Spawner>) -> Self {
        Self::with_config(spawner, TrackerConfig::default())
    }

    /// If a [`Scope`](crate::Scope) is current, its disposal tears the tracker down.
    pub fn with_config(spawner: Rc<dyn Spawner>, config: TrackerConfig<T, E>) -> Self {
        let active = ActiveScope::open();
        if let Some(scope) = current_scope() {
            let active = active.clone();
            scope.add_disposer(move || {
                if active.close() {
                    log::debug!("async tracker closed by scope disposal");
                }
            });
        }

        Self {
            inner: Rc::new(TrackerInner {
                state: signal(config.initial),
                active,
                spawner,
                overlap: config.overlap,
                generation: Cell::new(0),
            }),
        }
    }

    /// Moves to `Pending` right away and settles once `operation` completes.
    ///
    /// Returns without waiting. The operation is always driven to completion
    /// on the spawner, even after teardown; only its effect on the state is
    /// suppressed.
    pub fn run<F>(&self, operation: F)
    where
        F: Future<Output = std::result::Result<T, E>> + 'static,
    {
        let generation = self.inner.generation.get() + 1;
        self.inner.generation.set(generation);
        log::debug!("async run #{generation} started");

        self.dispatch_safely(AsyncAction::Pending);

        let weak: Weak<TrackerInner<T, E>> = Rc::downgrade(&self.inner);
        self.inner.spawner.spawn_local(Box::pin(async move {
            let action = match operation.await {
                Ok(data) => AsyncAction::Resolved(data),
                Err(error) => AsyncAction::Rejected(error),
            };
            match weak.upgrade() {
                Some(inner) => AsyncTracker { inner }.settle(generation, action),
                None => log::trace!("async run #{generation} settled after tracker was dropped"),
            }
        }));
    }

    fn settle(&self, generation: u64, action: AsyncAction<T, E>) {
        let latest = self.inner.generation.get();
        if self.inner.overlap == OverlapPolicy::LatestOnly && generation != latest {
            log::debug!(
                "async run #{generation} {} superseded by #{latest}; dropped",
                action.kind()
            );
            return;
        }
        self.dispatch_safely(action);
    }

    /// Applies `action` unless the tracker has been torn down, in which case
    /// it is a silent no-op.
    ///
    /// Safe to call from a subscriber: the transition is applied once the
    /// current notification round finishes.
    pub fn dispatch_safely(&self, action: AsyncAction<T, E>) {
        if !self.inner.active.is_open() {
            log::trace!("{} dispatched after teardown; ignored", action.kind());
            return;
        }
        self.inner.state.update(move |state| {
            *state = reduce_async(state, action);
            log::trace!("async state -> {}", state.status());
        });
    }

    /// Freezes the state. Safe to call more than once.
    pub fn teardown(&self) {
        if self.inner.active.close() {
            log::debug!("async tracker torn down in {} state", self.status());
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.is_open()
    }

    pub fn status(&self) -> Status {
        self.inner.state.with(AsyncState::status)
    }

    pub fn state(&self) -> AsyncState<T, E>
    where
        T: Clone,
        E: Clone,
    {
        self.inner.state.get()
    }

    /// Render callback: `f` sees every applied transition, and may call back
    /// into the tracker (for example to retry after a rejection).
    pub fn subscribe(&self, f: impl Fn(&AsyncState<T, E>) + 'static) -> SubId {
        self.inner.state.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubId) -> bool {
        self.inner.state.unsubscribe(id)
    }

    pub fn overlap_policy(&self) -> OverlapPolicy {
        self.inner.overlap
    }
}
