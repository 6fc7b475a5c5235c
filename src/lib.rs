//! Flapjack – converts automaton description documents into typed graph
//! models and interprets them
//!
//! This crate implements:
//! - A small type algebra (primitive, literal, record, union) tagging every
//!   node and edge attribute of a canonical graph model
//! - A two-phase builder that resolves cross-references between states and
//!   transitions, with dialect strategies for Turing machines, DFAs, and NFAs
//! - A persisted document format carrying the graph plus a kind tag
//! - A validate-then-run pipeline evaluating a plugin-compiled program
//!   against a sequence of string inputs, one independent outcome per input

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Typed graph construction: types, values, models, serialization.
pub mod graph;

/// Document-to-model conversion and dialect strategies.
pub mod convert;

/// Plugin contract and built-in reference interpreters.
pub mod plugin;

/// The validate-then-run interpretation pipeline.
pub mod pipeline;

// Re-export key types for convenience
pub use convert::{ConvertError, Dialect};
pub use graph::{Model, Type};
pub use pipeline::{InterpretReport, PipelineError, interpret};
pub use plugin::{Plugin, Program};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
