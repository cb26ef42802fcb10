pub use crate::effects::{Dispose, disposable_effect, effect, on_unmount};
pub use crate::error::{Error, Result};
pub use crate::hooks::{use_async, use_reducer};
pub use crate::reducer::{Reducer, Store};
pub use crate::runtime::{Composition, remember, remember_state, remember_with_key};
pub use crate::scope::{ActiveScope, Scope, current_scope, scoped_effect};
pub use crate::signal::{Signal, SubId, signal};
pub use crate::spawn::{LocalTask, Spawner};
pub use crate::tracker::{
    ActionKind, AsyncAction, AsyncReducer, AsyncState, AsyncTracker, OverlapPolicy, Status,
    TrackerConfig, reduce_async, reduce_tagged,
};
