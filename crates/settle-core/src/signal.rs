use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

pub type SubId = usize;

type Subscriber<T> = Rc<dyn Fn(&T)>;
type Write<T> = Box<dyn FnOnce(&mut T)>;

/// Cloneable handle to an observable value.
///
/// Subscribers run after every write. They may read the signal, write to it
/// and change its subscriptions. A write made while subscribers are running
/// is queued: it lands after the current round of notifications and then
/// notifies again, so every subscriber sees every value in order.
pub struct Signal<T: 'static>(Rc<Inner<T>>);

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

struct Inner<T: 'static> {
    value: RefCell<T>,
    next_sub: Cell<SubId>,
    subs: RefCell<Vec<(SubId, Subscriber<T>)>>,
    notifying: Cell<bool>,
    queued: RefCell<VecDeque<Write<T>>>,
}

impl<T: 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(Inner {
            value: RefCell::new(value),
            next_sub: Cell::new(0),
            subs: RefCell::new(Vec::new()),
            notifying: Cell::new(false),
            queued: RefCell::new(VecDeque::new()),
        }))
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.value.borrow().clone()
    }

    /// Borrow the current value without cloning it. `f` must not write to
    /// this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.value.borrow())
    }

    pub fn set(&self, v: T) {
        self.update(move |slot| *slot = v);
    }

    pub fn update(&self, f: impl FnOnce(&mut T) + 'static) {
        if self.0.notifying.get() {
            self.0.queued.borrow_mut().push_back(Box::new(f));
            return;
        }
        f(&mut self.0.value.borrow_mut());
        self.notify();
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        let id = self.0.next_sub.get();
        self.0.next_sub.set(id + 1);
        self.0.subs.borrow_mut().push((id, Rc::new(f)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubId) -> bool {
        let mut subs = self.0.subs.borrow_mut();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() != before
    }

    fn notify(&self) {
        let _round = Notifying::enter(&self.0.notifying);
        loop {
            let subs: Vec<Subscriber<T>> =
                self.0.subs.borrow().iter().map(|(_, s)| s.clone()).collect();
            {
                let value = self.0.value.borrow();
                for s in subs {
                    s(&value);
                }
            }
            let next = self.0.queued.borrow_mut().pop_front();
            match next {
                Some(write) => write(&mut self.0.value.borrow_mut()),
                None => break,
            }
        }
    }
}

/// Clears the notifying flag even if a subscriber panics.
struct Notifying<'a>(&'a Cell<bool>);

impl<'a> Notifying<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for Notifying<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub fn signal<T: 'static>(t: T) -> Signal<T> {
    Signal::new(t)
}
