//! Typed graph construction: the type algebra, the value arena, the
//! node/edge model with its reference-validating builder, and the persisted
//! document format.
//!
//! Everything a dialect strategy or plugin touches goes through these types,
//! so an attribute value that exists is by construction well typed and owned
//! by the model it decorates.

/// The closed set of value-type descriptors.
pub mod types;

/// Value arena and typed value instances.
pub mod env;

/// Nodes, edges, models, and the model builder.
pub mod model;

/// Persisted document serialization and reconstruction.
pub mod serial;

pub use env::{Environment, Scalar, Value, ValueError, ValueId};
pub use model::{Edge, EdgeId, Model, ModelBuilder, ModelError, Node, NodeId};
pub use serial::{SerialDocument, SerialError, SerialModel, to_document};
pub use types::Type;
