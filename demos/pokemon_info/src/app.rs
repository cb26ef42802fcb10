use std::rc::Rc;
use std::time::Duration;

use futures::StreamExt;
use futures::channel::mpsc;
use futures::executor::LocalPool;
use settle_core::prelude::*;

use crate::pokemon::{FetchError, Pokemon, fetch_pokemon};

/// One rendered pass of the info panel.
pub struct Frame {
    pub status: Status,
    pub text: String,
}

/// The "pokemon info" component: looks up whatever name it is rendered with
/// and shows the lookup's progress.
pub struct PokemonInfo {
    pool: LocalPool,
    spawner: Rc<dyn Spawner>,
    composition: Composition,
    delay: Duration,
    changed_tx: mpsc::UnboundedSender<()>,
    changed_rx: mpsc::UnboundedReceiver<()>,
}

impl PokemonInfo {
    pub fn new(delay: Duration) -> Self {
        let pool = LocalPool::new();
        let spawner: Rc<dyn Spawner> = Rc::new(pool.spawner());
        let (changed_tx, changed_rx) = mpsc::unbounded();
        Self {
            pool,
            spawner,
            composition: Composition::new(),
            delay,
            changed_tx,
            changed_rx,
        }
    }

    pub fn render(&self, name: &str) -> Frame {
        let spawner = self.spawner.clone();
        let delay = self.delay;
        let changed = self.changed_tx.clone();

        self.composition.compose(|| {
            let tracker = use_async::<Pokemon, FetchError>(spawner, || {
                TrackerConfig::new()
                    .pending_if(!name.is_empty())
                    .overlap(OverlapPolicy::LatestOnly)
            });

            // Subscribe once per mount; every transition asks for a re-render.
            remember(|| {
                tracker.subscribe(move |_| {
                    let _ = changed.unbounded_send(());
                })
            });

            let run = tracker.clone();
            let requested = name.to_string();
            disposable_effect(requested.clone(), move || {
                if !requested.is_empty() {
                    run.run(fetch_pokemon(&requested, delay));
                }
                Dispose::noop()
            });

            let state = tracker.state();
            let status = state.status();
            let text = error_boundary(|| present(name, state));
            Frame { status, text }
        })
    }

    /// Blocks until the tracker publishes another transition.
    pub fn wait_for_change(&mut self) -> bool {
        self.pool.run_until(self.changed_rx.next()).is_some()
    }

    pub fn unmount(&self) {
        self.composition.dispose();
    }
}

/// Presentation for each status. A stored error is handed back so the
/// enclosing boundary decides how to show it.
fn present(name: &str, state: AsyncState<Pokemon, FetchError>) -> Result<String, FetchError> {
    if name.is_empty() {
        return Ok("Submit a pokemon".to_string());
    }
    Ok(match state.into_result()? {
        Some(pokemon) => pokemon.describe(),
        None => format!("Loading {name}..."),
    })
}

fn error_boundary(content: impl FnOnce() -> Result<String, FetchError>) -> String {
    match content() {
        Ok(text) => text,
        Err(e) => {
            log::warn!("render failed: {e}");
            format!("There was an error: {e}")
        }
    }
}
