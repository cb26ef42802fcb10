use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::runtime::remember;
use crate::scope::scoped_effect;

#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// A guard with nothing to clean up.
    pub fn noop() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn is_spent(&self) -> bool {
        self.0.borrow().is_none()
    }
}

/// Runs `f()` immediately and returns its `Dispose`.
pub fn effect<F>(f: F) -> Dispose
where
    F: FnOnce() -> Dispose + 'static,
{
    let d = f();

    // auto-register cleanup in the current scope if one exists
    if let Some(scope) = crate::scope::current_scope() {
        let d2 = d.clone();
        scope.add_disposer(move || d2.run());
    }

    d
}

/// Helper to register cleanup inside effect.
pub fn on_unmount(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}

/// Cleanup and dependency key for one `disposable_effect` call site.
struct KeyedEffect<K> {
    installed: Cell<bool>,
    key: RefCell<Option<K>>,
    cleanup: RefCell<Option<Dispose>>,
}

impl<K> KeyedEffect<K> {
    fn stop(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(d) = cleanup {
            d.run();
        }
    }
}

/// Runs `effect` on first composition and again whenever `key` changes,
/// running the previous cleanup first. The last cleanup runs on unmount.
pub fn disposable_effect<K: PartialEq + 'static>(
    key: K,
    effect: impl FnOnce() -> Dispose + 'static,
) {
    let slot = remember(|| KeyedEffect {
        installed: Cell::new(false),
        key: RefCell::new(None::<K>),
        cleanup: RefCell::new(None),
    });
    if !slot.installed.replace(true) {
        let unmounted = slot.clone();
        scoped_effect(move || Box::new(move || unmounted.stop()));
    }

    if slot.key.borrow().as_ref() == Some(&key) {
        return;
    }
    slot.stop();
    *slot.key.borrow_mut() = Some(key);
    let d = effect();
    *slot.cleanup.borrow_mut() = Some(d);
}
