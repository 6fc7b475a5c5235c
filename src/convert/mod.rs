//! Document-to-model conversion.
//!
//! Conversion is a two-phase build over the parsed document: every state
//! becomes a node first (so the id index is complete), then every transition
//! becomes an edge whose endpoints must resolve through that index. Generic
//! attributes (label, position, colors, line width, arrow flag) are set for
//! every dialect; the selected [`Dialect`] strategy contributes the rest.

/// Intermediate structures for parsed automaton documents.
pub mod document;

/// Dialect resolution and per-dialect attribute strategies.
pub mod dialect;

use std::path::Path;

use thiserror::Error;

pub use dialect::{AttrTypes, Dialect};
pub use document::{AutomatonDoc, StateRecord, TransitionRecord};

use crate::graph::env::ValueError;
use crate::graph::model::{Model, ModelBuilder, ModelError};
use crate::graph::serial::to_document;
use crate::plugin::Plugin;

/// Default stroke color for nodes and edges.
const DEFAULT_COLOR: &str = "#000000";

/// Default numeric line width for edges.
const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// Errors that abort a conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The source document could not be parsed.
    #[error("failed to parse automaton document: {0}")]
    Document(#[from] serde_json::Error),

    /// No dialect is registered under the plugin-reported name.
    #[error("unknown dialect '{0}' (supported: turing-machine, dfa, nfa)")]
    UnknownDialect(String),

    /// A transition lacks a field its dialect requires.
    #[error("{dialect} transition {from} -> {to} is missing required field '{field}'")]
    MissingTransitionField {
        /// Dialect that required the field.
        dialect: &'static str,
        /// Transition source id.
        from: String,
        /// Transition destination id.
        to: String,
        /// The missing field.
        field: &'static str,
    },

    /// Duplicate state id or unresolved transition endpoint.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// An attribute value failed its type check.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Reading or writing a document file failed.
    #[error("document I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for conversion.
pub type ConvertResult<T> = std::result::Result<T, ConvertError>;

/// Build a canonical model from a parsed document using the given dialect.
///
/// Nodes are all created before the first edge; a transition naming an
/// unknown state id aborts the build and no model is produced.
pub fn build_model(dialect: Dialect, doc: &AutomatonDoc) -> ConvertResult<Model> {
    let shapes = AttrTypes::new();
    let mut builder = ModelBuilder::new();

    for state in &doc.states {
        let node = builder.add_node(&state.id)?;
        let label = builder.env_mut().string(&shapes.string, &state.name)?;
        let position = shapes.position(&mut builder, state.x, state.y)?;
        let border = builder.env_mut().string(&shapes.color, DEFAULT_COLOR)?;
        builder.set_node_attr(node, "label", label);
        builder.set_node_attr(node, "position", position);
        builder.set_node_attr(node, "borderColor", border);
        dialect.apply_node(&shapes, state, &mut builder, node)?;
    }
    tracing::debug!(dialect = %dialect, states = doc.states.len(), "state pass complete");

    for transition in &doc.transitions {
        let edge = builder.add_edge(&transition.from, &transition.to)?;
        let color = builder.env_mut().string(&shapes.color, DEFAULT_COLOR)?;
        let width_value = builder.env_mut().number(&shapes.number, DEFAULT_LINE_WIDTH)?;
        let width = builder.env_mut().union(&shapes.line_width, width_value)?;
        let arrow = builder.env_mut().boolean(&shapes.boolean, true)?;
        builder.set_edge_attr(edge, "color", color);
        builder.set_edge_attr(edge, "lineWidth", width);
        builder.set_edge_attr(edge, "showDestinationArrow", arrow);
        dialect.apply_edge(&shapes, transition, &mut builder, edge)?;
    }
    tracing::debug!(
        dialect = %dialect,
        transitions = doc.transitions.len(),
        "transition pass complete"
    );

    Ok(builder.finish())
}

/// Convert a source document file into a persisted graph document.
///
/// The dialect is resolved from the plugin's reported name before the source
/// is read; an unknown name fails without touching the filesystem.
pub async fn convert_file(
    plugin: &dyn Plugin,
    source: &Path,
    destination: &Path,
) -> ConvertResult<()> {
    let dialect = Dialect::from_plugin_name(plugin.name())?;

    let raw = tokio::fs::read(source).await?;
    let doc: AutomatonDoc = serde_json::from_slice(&raw)?;
    let model = build_model(dialect, &doc)?;

    let serial = to_document(&model, dialect.name());
    let json = serde_json::to_vec_pretty(&serial)?;
    tokio::fs::write(destination, json).await?;
    tracing::debug!(
        dialect = %dialect,
        destination = %destination.display(),
        "wrote graph document"
    );
    Ok(())
}
