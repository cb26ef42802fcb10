mod app;
mod pokemon;

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use settle_core::Status;
use settle_storage::{FileStore, KeyValueStore, MemoryStore, PersistedState};

use crate::app::PokemonInfo;

const LAST_NAME_KEY: &str = "pokemon_name";

struct DemoConfig {
    delay: Duration,
    store_dir: Option<PathBuf>,
    names: Vec<String>,
}

impl DemoConfig {
    /// `POKEMON_DELAY_MS` sets the simulated latency, `POKEMON_STORE_DIR`
    /// keeps the last searched name across runs. Arguments are names to look up.
    fn from_env() -> anyhow::Result<Self> {
        let delay = match std::env::var("POKEMON_DELAY_MS") {
            Ok(ms) => Duration::from_millis(
                ms.parse()
                    .with_context(|| format!("POKEMON_DELAY_MS is not a number: {ms:?}"))?,
            ),
            Err(_) => Duration::from_millis(300),
        };
        Ok(Self {
            delay,
            store_dir: std::env::var_os("POKEMON_STORE_DIR").map(PathBuf::from),
            names: std::env::args().skip(1).collect(),
        })
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = DemoConfig::from_env()?;

    let store: Rc<dyn KeyValueStore> = match &config.store_dir {
        Some(dir) => Rc::new(
            FileStore::open(dir).with_context(|| format!("opening store at {}", dir.display()))?,
        ),
        None => Rc::new(MemoryStore::new()),
    };
    let last_name = PersistedState::new(store, LAST_NAME_KEY, || "pikachu".to_string());

    let names = if config.names.is_empty() {
        vec![last_name.get()]
    } else {
        config.names.clone()
    };

    let mut info = PokemonInfo::new(config.delay);
    println!("{}", info.render("").text);

    for name in names {
        last_name.set(name.clone());
        let mut frame = info.render(&name);
        println!("{}", frame.text);
        while frame.status == Status::Pending {
            if !info.wait_for_change() {
                anyhow::bail!("tracker stopped publishing while {name} was pending");
            }
            frame = info.render(&name);
            if frame.status != Status::Pending {
                println!("{}", frame.text);
            }
        }
    }

    info.unmount();
    log::info!("unmounted; last search was {:?}", last_name.get());
    Ok(())
}
