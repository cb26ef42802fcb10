use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use settle_core::{Signal, SubId, remember, signal};

use crate::codec::{Codec, JsonCodec};
use crate::error::{Result, StorageError};
use crate::store::KeyValueStore;

/// A value mirrored to a [`KeyValueStore`] under one key.
///
/// Every applied write goes through to the store, including writes made from
/// a subscriber. Cloning yields another handle to the same value.
pub struct PersistedState<T: 'static> {
    value: Signal<T>,
    sink: Rc<Sink<T>>,
}

/// Where and how the value is written.
struct Sink<T: 'static> {
    key: RefCell<String>,
    store: Rc<dyn KeyValueStore>,
    codec: Rc<dyn Codec<T>>,
    failed: RefCell<Option<StorageError>>,
}

impl<T: 'static> Sink<T> {
    fn write_to(&self, key: &str, value: &T) -> Result<()> {
        let raw = self.codec.encode(key, value)?;
        self.store.set(key, &raw)
    }

    fn write_or_record(&self, value: &T) {
        let key = self.key.borrow();
        if let Err(e) = self.write_to(&key, value) {
            log::warn!("failed to persist state: {e}");
            *self.failed.borrow_mut() = Some(e);
        }
    }
}

impl<T: 'static> Clone for PersistedState<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            sink: self.sink.clone(),
        }
    }
}

impl<T: Serialize + DeserializeOwned + 'static> PersistedState<T> {
    /// JSON-encoded state. See [`PersistedState::with_codec`].
    pub fn new(
        store: Rc<dyn KeyValueStore>,
        key: impl Into<String>,
        default: impl FnOnce() -> T,
    ) -> Self {
        Self::with_codec(store, key, default, Rc::new(JsonCodec))
    }
}

impl<T: 'static> PersistedState<T> {
    /// Loads `key` from `store`, falling back to `default()` when it is
    /// missing or empty. A stored value that no longer decodes is removed
    /// before falling back. The resulting value is written back right away.
    pub fn with_codec(
        store: Rc<dyn KeyValueStore>,
        key: impl Into<String>,
        default: impl FnOnce() -> T,
        codec: Rc<dyn Codec<T>>,
    ) -> Self {
        let key = key.into();
        let initial = load(&*store, &*codec, &key).unwrap_or_else(default);

        let sink = Rc::new(Sink {
            key: RefCell::new(key),
            store,
            codec,
            failed: RefCell::new(None),
        });
        let value = signal(initial);
        value.with(|v| sink.write_or_record(v));
        let writer = sink.clone();
        value.subscribe(move |v| writer.write_or_record(v));

        Self { value, sink }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.value.with(f)
    }

    pub fn key(&self) -> String {
        self.sink.key.borrow().clone()
    }

    /// Updates the value; a failed write is logged, not returned.
    pub fn set(&self, value: T) {
        self.value.set(value);
    }

    pub fn update(&self, f: impl FnOnce(&mut T) + 'static) {
        self.value.update(f);
    }

    /// Like [`set`](Self::set), but reports a failed write. The in-memory
    /// value is updated either way. Called from a subscriber, the write is
    /// deferred and only logged.
    pub fn try_set(&self, value: T) -> Result<()> {
        self.sink.failed.take();
        self.value.set(value);
        match self.sink.failed.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Moves the stored value to `key`, removing the old entry. On failure
    /// the handle keeps its old key and the old entry stays in place.
    pub fn set_key(&self, key: impl Into<String>) -> Result<()> {
        let key = key.into();
        let prev = self.key();
        if prev == key {
            return Ok(());
        }
        log::debug!("persisted state moving from `{prev}` to `{key}`");

        self.value.with(|v| self.sink.write_to(&key, v))?;
        if let Err(e) = self.sink.store.remove(&prev) {
            if let Err(undo) = self.sink.store.remove(&key) {
                log::warn!("failed to roll back `{key}` after a failed move: {undo}");
            }
            return Err(e);
        }
        *self.sink.key.borrow_mut() = key;
        Ok(())
    }

    /// Removes the stored entry. The in-memory value is kept.
    pub fn clear(&self) -> Result<()> {
        self.sink.store.remove(&self.sink.key.borrow())
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        self.value.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubId) -> bool {
        self.value.unsubscribe(id)
    }

    pub fn signal(&self) -> &Signal<T> {
        &self.value
    }
}

fn load<T: 'static>(store: &dyn KeyValueStore, codec: &dyn Codec<T>, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) if !raw.is_empty() => raw,
        Ok(_) => return None,
        Err(e) => {
            log::warn!("failed to read persisted state: {e}");
            return None;
        }
    };
    match codec.decode(key, &raw) {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("discarding persisted state: {e}");
            if let Err(e) = store.remove(key) {
                log::warn!("failed to remove stale state: {e}");
            }
            None
        }
    }
}

/// Remembered [`PersistedState`]. Recomposing with a different `key` moves
/// the stored value to the new key.
pub fn use_persisted_state<T: Serialize + DeserializeOwned + 'static>(
    store: Rc<dyn KeyValueStore>,
    key: impl Into<String>,
    default: impl FnOnce() -> T,
) -> PersistedState<T> {
    let key = key.into();
    let state = remember(|| PersistedState::new(store, key.clone(), default));
    if state.key() != key {
        if let Err(e) = state.set_key(key) {
            log::warn!("failed to move persisted state: {e}");
        }
    }
    (*state).clone()
}
