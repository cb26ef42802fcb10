//! Hook-style constructors that keep their value across recompositions of a
//! [`Composition`](crate::Composition).

use std::rc::Rc;

use crate::reducer::{Reducer, Store};
use crate::runtime::remember;
use crate::spawn::Spawner;
use crate::tracker::{AsyncTracker, TrackerConfig};

/// Remembered [`AsyncTracker`], torn down when the composition is disposed.
///
/// `config` is only read on the first composition.
pub fn use_async<T: 'static, E: 'static>(
    spawner: Rc<dyn Spawner>,
    config: impl FnOnce() -> TrackerConfig<T, E>,
) -> AsyncTracker<T, E> {
    let tracker = remember(|| AsyncTracker::with_config(spawner, config()));
    (*tracker).clone()
}

/// Remembered reducer store. `init` is only read on the first composition.
pub fn use_reducer<R: Reducer>(init: impl FnOnce() -> R::State) -> Store<R> {
    let store = remember(|| Store::<R>::new(init()));
    (*store).clone()
}
