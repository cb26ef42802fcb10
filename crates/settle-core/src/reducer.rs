use std::rc::Rc;

use crate::{Signal, SubId, signal};

/// Pure state transition: same state and action always give the same result.
pub trait Reducer: 'static {
    type State: Clone + 'static;
    type Action: 'static;

    fn reduce(state: &Self::State, action: Self::Action) -> Self::State;
}

/// Reducer-backed state holder.
///
/// Cloning yields another handle to the same state.
pub struct Store<R: Reducer> {
    state: Signal<R::State>,
}

impl<R: Reducer> Clone for Store<R> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<R: Reducer> Store<R> {
    pub fn new(initial: R::State) -> Self {
        Self {
            state: signal(initial),
        }
    }

    pub fn state(&self) -> R::State {
        self.state.get()
    }

    pub fn with<T>(&self, f: impl FnOnce(&R::State) -> T) -> T {
        self.state.with(f)
    }

    /// Callable from a subscriber; the action is then reduced against the
    /// state left by the write being notified.
    pub fn dispatch(&self, action: R::Action) {
        self.state.update(move |state| *state = R::reduce(state, action));
    }

    /// A `'static` dispatch function, for handing to event callbacks.
    pub fn dispatcher(&self) -> Rc<dyn Fn(R::Action)> {
        let this = self.clone();
        Rc::new(move |action| this.dispatch(action))
    }

    pub fn subscribe(&self, f: impl Fn(&R::State) + 'static) -> SubId {
        self.state.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubId) -> bool {
        self.state.unsubscribe(id)
    }

    pub fn signal(&self) -> &Signal<R::State> {
        &self.state
    }
}
