use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

thread_local! {
    static CURRENT_SCOPE: RefCell<Option<Weak<ScopeInner>>> = const { RefCell::new(None) };
}

/// Owner of cleanup work for one component lifetime.
///
/// Disposers run when the scope is disposed explicitly or when its last handle
/// is dropped, whichever comes first, and never twice.
pub struct Scope {
    inner: Rc<ScopeInner>,
}

struct ScopeInner {
    disposed: Cell<bool>,
    disposers: RefCell<Vec<Box<dyn FnOnce()>>>,
    children: RefCell<Vec<Scope>>,
}

impl ScopeInner {
    fn teardown(&self) {
        if self.disposed.replace(true) {
            return;
        }

        let children = std::mem::take(&mut *self.children.borrow_mut());
        for child in children {
            child.dispose();
        }

        let disposers = std::mem::take(&mut *self.disposers.borrow_mut());
        log::trace!("scope teardown: {} disposer(s)", disposers.len());
        for disposer in disposers {
            disposer();
        }
    }
}

impl Scope {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                disposed: Cell::new(false),
                disposers: RefCell::new(Vec::new()),
                children: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Runs `f` with this scope installed as the current scope.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let prev = CURRENT_SCOPE.with(|current| {
            current
                .borrow_mut()
                .replace(Rc::downgrade(&self.inner))
        });
        let result = f();
        CURRENT_SCOPE.with(|current| *current.borrow_mut() = prev);
        result
    }

    /// Registers cleanup work. On an already disposed scope it runs right away.
    pub fn add_disposer(&self, disposer: impl FnOnce() + 'static) {
        if self.is_disposed() {
            log::debug!("add_disposer on a disposed scope; running immediately");
            disposer();
            return;
        }
        self.inner.disposers.borrow_mut().push(Box::new(disposer));
    }

    pub fn child(&self) -> Scope {
        let child = Scope::new();
        if self.is_disposed() {
            child.dispose();
            return child;
        }
        self.inner.children.borrow_mut().push(child.clone());
        child
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Children first, then this scope's own disposers in registration order.
    pub fn dispose(&self) {
        self.inner.teardown();
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Scope {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.teardown();
    }
}

pub fn current_scope() -> Option<Scope> {
    CURRENT_SCOPE.with(|current| {
        current
            .borrow()
            .as_ref()
            .and_then(|weak| weak.upgrade().map(|inner| Scope { inner }))
    })
}

/// Scoped effect that auto-cleans up
pub fn scoped_effect<F>(f: F)
where
    F: FnOnce() -> Box<dyn FnOnce()> + 'static,
{
    let cleanup = f();
    match current_scope() {
        Some(scope) => scope.add_disposer(cleanup),
        None => log::trace!("scoped_effect outside of a scope; cleanup dropped"),
    }
}

/// Lifecycle handle that is open from creation until closed, exactly once.
///
/// Clones observe the same flag. Nothing reopens a closed handle.
#[derive(Clone, Debug)]
pub struct ActiveScope(Rc<Cell<bool>>);

impl ActiveScope {
    pub fn open() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn is_open(&self) -> bool {
        self.0.get()
    }

    /// Returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        self.0.replace(false)
    }
}

impl Default for ActiveScope {
    fn default() -> Self {
        Self::open()
    }
}
