//! Slot storage for hook-style state.
//!
//! A [`Composition`] stands for one mounted component: it owns the remembered
//! slots and the [`Scope`] that tears them down. Every call to
//! [`Composition::compose`] replays the component body; the Nth `remember` in
//! the body always yields the Nth stored value.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::scope::Scope;

thread_local! {
    static COMPOSER: RefCell<Option<Rc<RefCell<Composer>>>> = const { RefCell::new(None) };
}

#[derive(Default)]
struct Composer {
    slots: Vec<Box<dyn Any>>,
    cursor: usize,
    keyed_slots: HashMap<String, Box<dyn Any>>,
}

pub struct Composition {
    composer: Rc<RefCell<Composer>>,
    scope: Scope,
}

impl Composition {
    pub fn new() -> Self {
        Self {
            composer: Rc::new(RefCell::new(Composer::default())),
            scope: Scope::new(),
        }
    }

    /// Replays `body` with this composition's slots and scope installed.
    pub fn compose<R>(&self, body: impl FnOnce() -> R) -> R {
        self.composer.borrow_mut().cursor = 0;
        let prev = COMPOSER.with(|c| c.borrow_mut().replace(self.composer.clone()));
        let result = self.scope.run(body);
        COMPOSER.with(|c| *c.borrow_mut() = prev);
        result
    }

    pub fn slot_count(&self) -> usize {
        let c = self.composer.borrow();
        c.slots.len() + c.keyed_slots.len()
    }

    /// Unmount: runs every registered cleanup, then forgets the slots.
    pub fn dispose(&self) {
        self.scope.dispose();
        let mut c = self.composer.borrow_mut();
        c.slots.clear();
        c.keyed_slots.clear();
        c.cursor = 0;
    }
}

impl Default for Composition {
    fn default() -> Self {
        Self::new()
    }
}

fn with_composer<R>(f: impl FnOnce(Option<&mut Composer>) -> R) -> R {
    COMPOSER.with(|c| match c.borrow().as_ref() {
        Some(composer) => {
            let mut guard = composer.borrow_mut();
            f(Some(&mut *guard))
        }
        None => f(None),
    })
}

/// Slot-based remember (sequential composition only).
///
/// `init` runs with the slot table borrowed and must not call `remember` itself.
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    with_composer(|c| {
        let Some(c) = c else {
            log::warn!("remember called outside of a composition; value is not retained");
            return Rc::new(init());
        };
        let cursor = c.cursor;
        c.cursor += 1;

        if cursor >= c.slots.len() {
            let rc: Rc<T> = Rc::new(init());
            c.slots.push(Box::new(rc.clone()));
            return rc;
        }

        if let Some(rc) = c.slots[cursor].downcast_ref::<Rc<T>>() {
            rc.clone()
        } else {
            log::warn!(
                "remember: slot {} type changed; replacing. \
                 If this is due to conditional composition, prefer remember_with_key.",
                cursor
            );
            let rc: Rc<T> = Rc::new(init());
            c.slots[cursor] = Box::new(rc.clone());
            rc
        }
    })
}

/// Key-based remember
pub fn remember_with_key<T: 'static>(key: impl Into<String>, init: impl FnOnce() -> T) -> Rc<T> {
    with_composer(|c| {
        let Some(c) = c else {
            log::warn!("remember_with_key called outside of a composition; value is not retained");
            return Rc::new(init());
        };
        let key = key.into();

        if let Some(existing) = c.keyed_slots.get(&key) {
            if let Some(rc) = existing.downcast_ref::<Rc<T>>() {
                return rc.clone();
            }
            log::warn!(
                "remember_with_key: key '{}' reused with a different type; replacing.",
                key
            );
        }

        let rc: Rc<T> = Rc::new(init());
        c.keyed_slots.insert(key, Box::new(rc.clone()));
        rc
    })
}

pub fn remember_state<T: 'static>(init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
    remember(|| RefCell::new(init()))
}
