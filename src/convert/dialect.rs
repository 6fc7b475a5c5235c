//! Dialect strategies: per-automaton-kind attribute conversion.
//!
//! The supported dialects form a closed enum resolved from the
//! plugin-reported name; an unrecognized name fails before any node or edge
//! is built. Each dialect contributes a node callback (start/accept flags,
//! identical across dialects) and an edge callback (the dialect-specific
//! transition payload).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::document::{StateRecord, TransitionRecord};
use super::ConvertError;
use crate::graph::model::{EdgeId, ModelBuilder, NodeId};
use crate::graph::types::Type;

/// The automaton dialects this converter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Single-tape Turing machine.
    TuringMachine,
    /// Deterministic finite automaton.
    Dfa,
    /// Nondeterministic finite automaton.
    Nfa,
}

impl Dialect {
    /// Every supported dialect.
    pub const ALL: [Dialect; 3] = [Dialect::TuringMachine, Dialect::Dfa, Dialect::Nfa];

    /// Resolve a plugin-reported name to a dialect. Unrecognized names are
    /// an error; no build is attempted for them.
    pub fn from_plugin_name(name: &str) -> Result<Dialect, ConvertError> {
        match name {
            "turing-machine" => Ok(Dialect::TuringMachine),
            "dfa" => Ok(Dialect::Dfa),
            "nfa" => Ok(Dialect::Nfa),
            other => Err(ConvertError::UnknownDialect(other.to_string())),
        }
    }

    /// The canonical name of this dialect.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::TuringMachine => "turing-machine",
            Dialect::Dfa => "dfa",
            Dialect::Nfa => "nfa",
        }
    }

    /// Attach dialect-specific node attributes: the start/accept flags, the
    /// same for every dialect.
    pub(crate) fn apply_node(
        &self,
        shapes: &AttrTypes,
        state: &StateRecord,
        builder: &mut ModelBuilder,
        node: NodeId,
    ) -> Result<(), ConvertError> {
        let start = builder
            .env_mut()
            .boolean(&shapes.boolean, state.is_initial())?;
        let accept = builder
            .env_mut()
            .boolean(&shapes.boolean, state.is_final())?;
        builder.set_node_attr(node, "isStartState", start);
        builder.set_node_attr(node, "isAcceptState", accept);
        Ok(())
    }

    /// Attach dialect-specific edge attributes.
    pub(crate) fn apply_edge(
        &self,
        shapes: &AttrTypes,
        transition: &TransitionRecord,
        builder: &mut ModelBuilder,
        edge: EdgeId,
    ) -> Result<(), ConvertError> {
        match self {
            Dialect::TuringMachine => {
                let write = required(self, transition, "write", transition.write.as_deref())?;
                let move_code = required(self, transition, "move", transition.r#move.as_deref())?;

                let read = builder
                    .env_mut()
                    .string(&shapes.string, &transition.read)?;
                let write = builder.env_mut().string(&shapes.string, write)?;
                let move_ty = if move_code.starts_with('L') {
                    &shapes.move_left
                } else {
                    &shapes.move_right
                };
                let selection = builder.env_mut().literal(move_ty)?;
                let movement = builder.env_mut().union(&shapes.move_union, selection)?;

                builder.set_edge_attr(edge, "read", read);
                builder.set_edge_attr(edge, "write", write);
                builder.set_edge_attr(edge, "move", movement);
            }
            Dialect::Dfa | Dialect::Nfa => {
                let symbol = builder
                    .env_mut()
                    .string(&shapes.string, &transition.read)?;
                builder.set_edge_attr(edge, "symbol", symbol);
            }
        }
        Ok(())
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn required<'a>(
    dialect: &Dialect,
    transition: &TransitionRecord,
    field: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, ConvertError> {
    value.ok_or_else(|| ConvertError::MissingTransitionField {
        dialect: dialect.name(),
        from: transition.from.clone(),
        to: transition.to.clone(),
        field,
    })
}

/// The attribute types shared by one conversion: generic node/edge shapes
/// plus the Turing move union. Built once per build so every attribute of
/// the same shape shares one type instance.
#[derive(Debug, Clone)]
pub struct AttrTypes {
    /// `string` primitive.
    pub string: Arc<Type>,
    /// `number` primitive.
    pub number: Arc<Type>,
    /// `boolean` primitive.
    pub boolean: Arc<Type>,
    /// `color` primitive.
    pub color: Arc<Type>,
    /// `{x, y}` position record.
    pub point: Arc<Type>,
    /// Line width: named widths or a raw number.
    pub line_width: Arc<Type>,
    /// `Left` literal of the move union.
    pub move_left: Arc<Type>,
    /// `Right` literal of the move union.
    pub move_right: Arc<Type>,
    /// `Left | Right` head movement union.
    pub move_union: Arc<Type>,
}

impl AttrTypes {
    /// Construct the shared attribute types.
    pub fn new() -> Self {
        let string = Type::primitive("string");
        let number = Type::primitive("number");
        let boolean = Type::primitive("boolean");
        let color = Type::primitive("color");
        let point = Type::record(vec![
            ("x".to_string(), number.clone()),
            ("y".to_string(), number.clone()),
        ]);
        let line_width = Type::union(vec![
            Type::literal("thin"),
            Type::literal("medium"),
            Type::literal("thick"),
            number.clone(),
        ]);
        let move_left = Type::literal("Left");
        let move_right = Type::literal("Right");
        let move_union = Type::union(vec![move_left.clone(), move_right.clone()]);

        Self {
            string,
            number,
            boolean,
            color,
            point,
            line_width,
            move_left,
            move_right,
            move_union,
        }
    }

    /// Build the `{x, y}` position record for a state.
    pub(crate) fn position(
        &self,
        builder: &mut ModelBuilder,
        x: f64,
        y: f64,
    ) -> Result<crate::graph::env::ValueId, ConvertError> {
        let env = builder.env_mut();
        let x = env.number(&self.number, x)?;
        let y = env.number(&self.number, y)?;
        let fields = BTreeMap::from([("x".to_string(), x), ("y".to_string(), y)]);
        Ok(env.record(&self.point, fields)?)
    }
}

impl Default for AttrTypes {
    fn default() -> Self {
        Self::new()
    }
}
