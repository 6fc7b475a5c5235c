//! Canonical graph: nodes, edges, and the builder that assembles them.
//!
//! A [`Model`] owns one [`Environment`] plus every node and edge built into
//! it. Construction goes through [`ModelBuilder`], which keeps the
//! source-document id → node index as internal state: nodes are registered
//! first, and edges resolve their endpoints through that index so a dangling
//! endpoint is caught at `add_edge` time instead of surfacing later as a
//! half-connected graph.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

use super::env::{Environment, ValueId};

/// Index of a node inside its [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Index of an edge inside its [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub u32);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A graph node: an identity plus named attribute values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Attribute values, owned by the model's environment.
    pub attrs: BTreeMap<String, ValueId>,
}

/// A graph edge between two nodes of the same model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node.
    pub from: NodeId,
    /// Destination node.
    pub to: NodeId,
    /// Attribute values, owned by the model's environment.
    pub attrs: BTreeMap<String, ValueId>,
}

/// Errors raised while assembling a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Two source states carried the same identifier.
    #[error("duplicate node id '{0}' in source document")]
    DuplicateNode(String),

    /// An edge endpoint named an id no node was registered under.
    #[error("transition references unknown {endpoint} node '{id}'")]
    UnresolvedNode {
        /// Which endpoint failed to resolve (`from` or `to`).
        endpoint: &'static str,
        /// The identifier that failed to resolve.
        id: String,
    },
}

/// Convenience result alias for model assembly.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// The canonical graph built from one source document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    env: Environment,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Model {
    /// The environment owning every attribute value of this model.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeId(idx as u32), node))
    }

    /// All edges in creation order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(idx, edge)| (EdgeId(idx as u32), edge))
    }

    /// Fetch a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Fetch an edge by id.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0 as usize)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Read a node's boolean attribute, if present and boolean-typed.
    pub fn node_bool(&self, id: NodeId, attr: &str) -> Option<bool> {
        let value = *self.node(id)?.attrs.get(attr)?;
        self.env.as_bool(value)
    }

    /// Read a node's string attribute, if present and string-typed.
    pub fn node_str(&self, id: NodeId, attr: &str) -> Option<&str> {
        let value = *self.node(id)?.attrs.get(attr)?;
        self.env.as_str(value)
    }

    /// Read an edge's string attribute, if present and string-typed.
    pub fn edge_str(&self, id: EdgeId, attr: &str) -> Option<&str> {
        let value = *self.edge(id)?.attrs.get(attr)?;
        self.env.as_str(value)
    }

    /// Read the literal tag selected by an edge's union attribute.
    pub fn edge_tag(&self, id: EdgeId, attr: &str) -> Option<&str> {
        let value = *self.edge(id)?.attrs.get(attr)?;
        self.env.selected_tag(value)
    }

    pub(crate) fn from_parts(env: Environment, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { env, nodes, edges }
    }
}

/// Assembles one [`Model`], resolving edge endpoints through the node index.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    env: Environment,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<String, NodeId>,
}

impl ModelBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The environment attribute values must be allocated in.
    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Register a new node under its source-document identifier.
    pub fn add_node(&mut self, source_id: impl Into<String>) -> ModelResult<NodeId> {
        let source_id = source_id.into();
        if self.index.contains_key(&source_id) {
            return Err(ModelError::DuplicateNode(source_id));
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::default());
        self.index.insert(source_id, id);
        Ok(id)
    }

    /// Register a new edge, resolving both endpoints through the node index.
    pub fn add_edge(&mut self, from: &str, to: &str) -> ModelResult<EdgeId> {
        let from = self.resolve(from, "from")?;
        let to = self.resolve(to, "to")?;
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            from,
            to,
            attrs: BTreeMap::new(),
        });
        Ok(id)
    }

    fn resolve(&self, source_id: &str, endpoint: &'static str) -> ModelResult<NodeId> {
        self.index
            .get(source_id)
            .copied()
            .ok_or_else(|| ModelError::UnresolvedNode {
                endpoint,
                id: source_id.to_string(),
            })
    }

    /// Set (or replace) a node attribute.
    pub fn set_node_attr(&mut self, node: NodeId, name: impl Into<String>, value: ValueId) {
        if let Some(node) = self.nodes.get_mut(node.0 as usize) {
            node.attrs.insert(name.into(), value);
        }
    }

    /// Set (or replace) an edge attribute.
    pub fn set_edge_attr(&mut self, edge: EdgeId, name: impl Into<String>, value: ValueId) {
        if let Some(edge) = self.edges.get_mut(edge.0 as usize) {
            edge.attrs.insert(name.into(), value);
        }
    }

    /// Finish the build, yielding the populated model.
    pub fn finish(self) -> Model {
        Model::from_parts(self.env, self.nodes, self.edges)
    }
}
