//! # Component state for a single-threaded UI runtime
//!
//! `settle-core` holds the pieces a component needs to keep state between
//! renders and to react to asynchronous work without outliving its owner:
//!
//! - `Signal<T>`: observable value; subscribers act as the render callback.
//! - `Reducer` / `Store`: state that only changes through a pure transition.
//! - `Scope` / `ActiveScope`: lifecycle handles: cleanup on teardown, and a
//!   flag that is open until the owner goes away.
//! - `effect` / `disposable_effect`: side effects with cleanup.
//! - `AsyncTracker`: status of one asynchronous operation
//!   (`idle → pending → resolved | rejected`).
//!
//! ## Signals
//!
//! ```rust
//! use settle_core::*;
//!
//! let count = signal(0);
//! count.set(1);
//! count.update(|v| *v += 1);
//! assert_eq!(count.get(), 2);
//! ```
//!
//! ## Tracking an async operation inside a component
//!
//! ```rust
//! use futures::executor::LocalPool;
//! use settle_core::*;
//! use std::rc::Rc;
//!
//! let mut pool = LocalPool::new();
//! let spawner: Rc<dyn Spawner> = Rc::new(pool.spawner());
//! let component = Composition::new();
//!
//! let tracker = component.compose(|| {
//!     let tracker = use_async::<String, String>(spawner.clone(), TrackerConfig::new);
//!     let run = tracker.clone();
//!     disposable_effect("pikachu".to_string(), move || {
//!         run.run(async { Ok("electric".to_string()) });
//!         Dispose::noop()
//!     });
//!     tracker
//! });
//!
//! pool.run_until_stalled();
//! assert_eq!(tracker.state().data().map(String::as_str), Some("electric"));
//!
//! component.dispose();
//! assert!(!tracker.is_active());
//! ```
//!
//! Everything is `!Send`: continuations are polled by a [`Spawner`] on the
//! thread that owns the component.

pub mod effects;
pub mod error;
pub mod hooks;
pub mod prelude;
pub mod reducer;
pub mod runtime;
pub mod scope;
pub mod signal;
pub mod spawn;
pub mod tests;
pub mod tracker;

pub use effects::*;
pub use error::{Error, Result};
pub use hooks::*;
pub use reducer::*;
pub use runtime::*;
pub use scope::*;
pub use signal::*;
pub use spawn::*;
pub use tracker::*;
