use std::future::Future;
use std::thread;
use std::time::Duration;

use futures::channel::oneshot;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attack {
    pub name: String,
    pub kind: String,
    pub damage: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pokemon {
    pub name: String,
    pub number: u32,
    pub attacks: Vec<Attack>,
}

impl Pokemon {
    pub fn describe(&self) -> String {
        let mut out = format!("{} (#{:03})", self.name, self.number);
        for a in &self.attacks {
            out.push_str(&format!("\n  - {} [{}]: {}", a.name, a.kind, a.damage));
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum FetchError {
    #[error("Unsupported pokemon: \"{0}\". Try \"pikachu\", \"charizard\", or \"bulbasaur\".")]
    Unsupported(String),
    #[error("the lookup worker went away before answering")]
    Disconnected,
}

fn attack(name: &str, kind: &str, damage: u32) -> Attack {
    Attack {
        name: name.to_string(),
        kind: kind.to_string(),
        damage,
    }
}

fn lookup(name: &str) -> Result<Pokemon, FetchError> {
    let (display, number, attacks) = match name {
        "pikachu" => (
            "Pikachu",
            25,
            vec![
                attack("Thunder Shock", "Electric", 10),
                attack("Thunderbolt", "Electric", 90),
            ],
        ),
        "charizard" => (
            "Charizard",
            6,
            vec![attack("Ember", "Fire", 40), attack("Flamethrower", "Fire", 90)],
        ),
        "bulbasaur" => (
            "Bulbasaur",
            1,
            vec![attack("Vine Whip", "Grass", 45), attack("Razor Leaf", "Grass", 55)],
        ),
        other => return Err(FetchError::Unsupported(other.to_string())),
    };
    Ok(Pokemon {
        name: display.to_string(),
        number,
        attacks,
    })
}

/// Starts the lookup right away on a worker thread; the returned future
/// only waits for its answer.
pub fn fetch_pokemon(
    name: &str,
    delay: Duration,
) -> impl Future<Output = Result<Pokemon, FetchError>> + use<> {
    let (tx, rx) = oneshot::channel();
    let name = name.trim().to_lowercase();
    log::debug!("fetching {name:?} with {delay:?} simulated latency");
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = tx.send(lookup(&name));
    });
    async move { rx.await.unwrap_or(Err(FetchError::Disconnected)) }
}
