pub mod config;
pub mod game_engine;
pub mod playfield;
pub mod playtest;
pub mod rng;
pub mod scoring;
pub mod shapes;
pub mod snapshot;
pub mod tetrad;

pub use config::{ConfigError, ConfigStore, EngineConfig};
pub use game_engine::{Command, GameEngine, GameStatus, Update};
pub use snapshot::EngineSnapshot;
