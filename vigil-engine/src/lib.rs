//! The annotation alert engine: maps between sequence and model coordinate
//! spaces, resolves per-feature boundaries from the alignment evidence, runs
//! the alert detectors, settles alternative-feature competitions, applies
//! model-declared exceptions and non-essential demotions, and aggregates
//! everything into one pass/fail verdict per sequence.
//!
//! The engine consumes already-computed alignments and hit lists (see
//! `vigil_core::models::SequenceBundle`) and never performs I/O itself.

pub mod boundary;
pub mod coords;
pub mod detectors;
pub mod engine;
pub mod exceptions;
pub mod nonessential;
pub mod report;
pub mod selector;
pub mod verdict;

pub use engine::Engine;
pub use verdict::{AnnotatedFeature, Verdict};
