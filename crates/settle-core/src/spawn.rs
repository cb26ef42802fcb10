//! Where continuations run.
//!
//! Everything here is single-threaded: futures are `!Send` and are polled on
//! the thread that owns the component. Native hosts usually hand in a
//! [`LocalSpawner`] from a `LocalPool` they pump from their event loop; the
//! browser host uses the microtask queue through `wasm-bindgen-futures`.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use futures::executor::LocalSpawner;
use futures::task::LocalSpawnExt;

pub type LocalTask = Pin<Box<dyn Future<Output = ()>>>;

pub trait Spawner {
    fn spawn_local(&self, task: LocalTask);
}

impl Spawner for LocalSpawner {
    fn spawn_local(&self, task: LocalTask) {
        if let Err(e) = LocalSpawnExt::spawn_local(self, task) {
            // Only happens once the pool itself is gone.
            log::warn!("local task dropped: {e}");
        }
    }
}

impl<S: Spawner + ?Sized> Spawner for Rc<S> {
    fn spawn_local(&self, task: LocalTask) {
        (**self).spawn_local(task)
    }
}

/// Browser microtask spawner.
#[cfg(all(feature = "web", target_arch = "wasm32"))]
#[derive(Clone, Copy, Debug, Default)]
pub struct WasmSpawner;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
impl Spawner for WasmSpawner {
    fn spawn_local(&self, task: LocalTask) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
