pub mod blocks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod events;
pub mod goal;
pub mod harness;
pub mod lessons;
pub mod progress;
pub mod script;
pub mod session;
pub mod sprite;
pub mod time;
pub mod wardrobe;

pub use engine::{ExecutionEngine, RunReport};
pub use session::Session;
