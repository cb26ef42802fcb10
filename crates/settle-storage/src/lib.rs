//! State mirrored into a key-value store.
//!
//! The store is a capability handed in by the host (`MemoryStore` in tests,
//! `FileStore` on desktop, a browser-storage adapter on the web) rather than a
//! global. [`PersistedState`] reads its key once on creation and writes
//! through on every change:
//!
//! ```rust
//! use settle_storage::*;
//! use std::rc::Rc;
//!
//! let store = MemoryStore::new();
//! let name = PersistedState::new(Rc::new(store.clone()), "kcd_name", String::new);
//! name.set("Ash".to_string());
//!
//! let again = PersistedState::new(Rc::new(store), "kcd_name", String::new);
//! assert_eq!(again.get(), "Ash");
//! ```

pub mod codec;
pub mod error;
pub mod persisted;
pub mod store;

pub use codec::{Codec, JsonCodec, TextCodec};
pub use error::{Result, StorageError};
pub use persisted::{PersistedState, use_persisted_state};
pub use store::{FileStore, KeyValueStore, MemoryStore};
