//! Persisted document format for built models.
//!
//! A serialized document carries the plugin-reported kind tag plus the full
//! graph: the value arena in allocation order (each value with its type tag),
//! then nodes and edges referencing values by id. Reconstruction replays the
//! arena through the checked [`Environment`] constructors, so a tampered or
//! truncated document is rejected instead of producing a model that violates
//! the graph invariants.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::env::{Environment, Value, ValueError, ValueId};
use super::model::{Edge, EdgeId, Model, Node, NodeId};

/// Serialized form of a [`Model`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialModel {
    /// The value arena in allocation order.
    pub values: Vec<Value>,
    /// Nodes with attribute references into `values`.
    pub nodes: Vec<Node>,
    /// Edges with endpoint references into `nodes`.
    pub edges: Vec<Edge>,
}

/// The persisted document: a kind discriminator plus the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialDocument {
    /// Plugin-reported kind string.
    pub kind: String,
    /// The serialized graph.
    pub graph: SerialModel,
}

/// Errors raised while reconstructing a model from its serialized form.
#[derive(Debug, Error)]
pub enum SerialError {
    /// A replayed value failed the environment's construction checks.
    #[error("value {id} is not well formed: {source}")]
    BadValue {
        /// Arena position of the offending value.
        id: ValueId,
        /// The underlying construction failure.
        source: ValueError,
    },

    /// A node or edge attribute referenced a value outside the arena.
    #[error("attribute '{attr}' references value {id} outside the arena")]
    DanglingAttribute {
        /// Attribute name.
        attr: String,
        /// The out-of-range value id.
        id: ValueId,
    },

    /// An edge referenced a node outside the node list.
    #[error("edge {edge} references node {node} outside the model")]
    DanglingEndpoint {
        /// The offending edge.
        edge: EdgeId,
        /// The out-of-range node id.
        node: NodeId,
    },
}

/// Convenience result alias for serialization.
pub type SerialResult<T> = std::result::Result<T, SerialError>;

/// Serialize a model under the given kind tag.
pub fn to_document(model: &Model, kind: impl Into<String>) -> SerialDocument {
    SerialDocument {
        kind: kind.into(),
        graph: SerialModel {
            values: model.env().values().map(|(_, value)| value.clone()).collect(),
            nodes: model.nodes().map(|(_, node)| node.clone()).collect(),
            edges: model.edges().map(|(_, edge)| edge.clone()).collect(),
        },
    }
}

impl SerialDocument {
    /// Reconstruct the model, re-validating every value and reference.
    /// Returns the kind tag alongside the rebuilt model.
    pub fn into_model(self) -> SerialResult<(String, Model)> {
        let model = self.graph.into_model()?;
        Ok((self.kind, model))
    }
}

impl SerialModel {
    /// Rebuild a [`Model`] by replaying the arena through checked
    /// constructors and validating node/edge references.
    pub fn into_model(self) -> SerialResult<Model> {
        let mut env = Environment::new();
        for (idx, value) in self.values.into_iter().enumerate() {
            let id = ValueId(idx as u32);
            let replayed = match value {
                Value::Primitive { ty, raw } => env.primitive(&ty, raw),
                Value::Record { ty, fields } => env.record(&ty, fields),
                Value::Union { ty, selected } => env.union(&ty, selected),
                Value::Literal { ty } => env.literal(&ty),
            }
            .map_err(|source| SerialError::BadValue { id, source })?;
            debug_assert_eq!(replayed, id);
        }

        let value_count = env.len() as u32;
        let check_attrs = |attrs: &std::collections::BTreeMap<String, ValueId>| {
            for (attr, id) in attrs {
                if id.0 >= value_count {
                    return Err(SerialError::DanglingAttribute {
                        attr: attr.clone(),
                        id: *id,
                    });
                }
            }
            Ok(())
        };

        for node in &self.nodes {
            check_attrs(&node.attrs)?;
        }
        let node_count = self.nodes.len() as u32;
        for (idx, edge) in self.edges.iter().enumerate() {
            check_attrs(&edge.attrs)?;
            for endpoint in [edge.from, edge.to] {
                if endpoint.0 >= node_count {
                    return Err(SerialError::DanglingEndpoint {
                        edge: EdgeId(idx as u32),
                        node: endpoint,
                    });
                }
            }
        }

        Ok(Model::from_parts(env, self.nodes, self.edges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::ModelBuilder;
    use crate::graph::types::Type;

    fn sample_model() -> Model {
        let mut builder = ModelBuilder::new();
        let string = Type::primitive("string");
        let boolean = Type::primitive("boolean");

        let a = builder.add_node("a").unwrap();
        let b = builder.add_node("b").unwrap();
        let label = builder.env_mut().string(&string, "q0").unwrap();
        builder.set_node_attr(a, "label", label);
        let start = builder.env_mut().boolean(&boolean, true).unwrap();
        builder.set_node_attr(a, "isStartState", start);

        let edge = builder.add_edge("a", "b").unwrap();
        let symbol = builder.env_mut().string(&string, "1").unwrap();
        builder.set_edge_attr(edge, "symbol", symbol);
        builder.finish()
    }

    #[test]
    fn test_round_trip_preserves_graph() {
        let model = sample_model();
        let doc = to_document(&model, "dfa");

        let json = serde_json::to_string_pretty(&doc).unwrap();
        let parsed: SerialDocument = serde_json::from_str(&json).unwrap();
        let (kind, rebuilt) = parsed.into_model().unwrap();

        assert_eq!(kind, "dfa");
        assert_eq!(rebuilt.node_count(), model.node_count());
        assert_eq!(rebuilt.edge_count(), model.edge_count());
        assert_eq!(rebuilt.node_str(NodeId(0), "label"), Some("q0"));
        assert_eq!(rebuilt.node_bool(NodeId(0), "isStartState"), Some(true));
        assert_eq!(rebuilt.edge_str(EdgeId(0), "symbol"), Some("1"));
        assert_eq!(rebuilt, model);
    }

    #[test]
    fn test_dangling_endpoint_rejected() {
        let model = sample_model();
        let mut doc = to_document(&model, "dfa");
        doc.graph.edges[0].to = NodeId(99);

        assert!(matches!(
            doc.into_model(),
            Err(SerialError::DanglingEndpoint { .. })
        ));
    }

    #[test]
    fn test_dangling_attribute_rejected() {
        let model = sample_model();
        let mut doc = to_document(&model, "dfa");
        doc.graph.nodes[0]
            .attrs
            .insert("label".into(), ValueId(99));

        assert!(matches!(
            doc.into_model(),
            Err(SerialError::DanglingAttribute { .. })
        ));
    }

    #[test]
    fn test_forward_value_reference_rejected() {
        let model = sample_model();
        let mut doc = to_document(&model, "dfa");
        // Point a union-free arena value forward: fabricate a record whose
        // field references an id past the arena end.
        if let Value::Record { fields, .. } = &mut doc.graph.values[0] {
            fields.insert("x".into(), ValueId(1000));
        } else {
            // Arena starts with a primitive here; corrupt an attribute
            // instead by referencing a not-yet-allocated value.
            doc.graph.values.truncate(1);
        }
        assert!(doc.into_model().is_err());
    }
}
