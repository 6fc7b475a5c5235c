//! The type algebra used to tag node and edge attribute values.
//!
//! Four kinds of type descriptor exist: primitives (named scalar carriers),
//! literals (zero-payload tags), records (ordered named fields), and unions
//! (ordered member sets). Types are immutable once constructed and shared by
//! `Arc` between every value of the same shape. Construction is total;
//! equality is structural.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A value-type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Type {
    /// Named scalar type, e.g. `string`, `number`, `boolean`, `color`.
    Primitive {
        /// Primitive name.
        name: String,
    },

    /// Zero-payload marker type identified by its tag.
    Literal {
        /// Literal tag.
        tag: String,
    },

    /// Ordered mapping of field name to field type. All fields are required
    /// on every value of this type.
    Record {
        /// Declared fields in declaration order.
        fields: Vec<(String, Arc<Type>)>,
    },

    /// Ordered set of member types. A value of this type holds exactly one
    /// member value.
    Union {
        /// Member types in declaration order, duplicates removed.
        members: Vec<Arc<Type>>,
    },
}

impl Type {
    /// Construct a primitive type from its name.
    pub fn primitive(name: impl Into<String>) -> Arc<Type> {
        Arc::new(Type::Primitive { name: name.into() })
    }

    /// Construct a literal type from its tag.
    pub fn literal(tag: impl Into<String>) -> Arc<Type> {
        Arc::new(Type::Literal { tag: tag.into() })
    }

    /// Construct a record type from an ordered field list.
    pub fn record(fields: Vec<(String, Arc<Type>)>) -> Arc<Type> {
        Arc::new(Type::Record { fields })
    }

    /// Construct a union type from an ordered member list. Structural
    /// duplicates are dropped, keeping the first occurrence.
    pub fn union(members: Vec<Arc<Type>>) -> Arc<Type> {
        let mut unique: Vec<Arc<Type>> = Vec::with_capacity(members.len());
        for member in members {
            if !unique.iter().any(|existing| **existing == *member) {
                unique.push(member);
            }
        }
        Arc::new(Type::Union { members: unique })
    }

    /// Look up a record field type by name. Returns `None` for non-record
    /// types and undeclared fields.
    pub fn field(&self, name: &str) -> Option<&Arc<Type>> {
        match self {
            Type::Record { fields } => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, ty)| ty),
            _ => None,
        }
    }

    /// Whether `candidate` appears (structurally) in this union's member set.
    /// Always `false` for non-union types.
    pub fn has_member(&self, candidate: &Type) -> bool {
        match self {
            Type::Union { members } => members.iter().any(|member| **member == *candidate),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive { name } => write!(f, "{}", name),
            Type::Literal { tag } => write!(f, "\"{}\"", tag),
            Type::Record { fields } => {
                write!(f, "{{")?;
                for (idx, (name, ty)) in fields.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                write!(f, "}}")
            }
            Type::Union { members } => {
                for (idx, member) in members.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
        }
    }
}
