//! Core data model for vigil: reference models with declared feature maps,
//! per-sequence alignment evidence, the closed alert taxonomy and the
//! run-level engine configuration.
//!
//! The model is loaded once per run and shared read-only; alignment, protein
//! and hit structures are built per sequence by external alignment/search
//! stages and consumed read-only by the engine in `vigil-engine`.

pub mod config;
pub mod errors;
pub mod models;
pub mod utils;

pub use config::EngineConfig;
pub use errors::ModelError;
