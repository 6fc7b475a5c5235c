//! Value arena and typed value instances.
//!
//! An [`Environment`] owns every value created while building one graph.
//! Values are addressed by [`ValueId`] indices into the arena, so references
//! between values (record fields, union selections) can never escape their
//! owning environment. Constructors are checked: a value that would violate
//! its type is rejected at creation time, which is what lets the rest of the
//! crate treat a stored value as well formed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::types::Type;

/// Index of a value inside its owning [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueId(pub u32);

impl ValueId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Raw payload of a primitive value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean payload.
    Boolean(bool),
    /// Numeric payload.
    Number(f64),
    /// Textual payload (also used by named primitives such as `color`).
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Boolean(flag) => write!(f, "{}", flag),
            Scalar::Number(num) => write!(f, "{}", num),
            Scalar::String(text) => write!(f, "{}", text),
        }
    }
}

/// A typed value instance bound to one environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Value {
    /// Scalar carrier matching its primitive type's name.
    Primitive {
        /// The primitive type.
        ty: Arc<Type>,
        /// The raw payload.
        raw: Scalar,
    },

    /// One value per declared field, all fields required.
    Record {
        /// The record type.
        ty: Arc<Type>,
        /// Field values, keyed by field name.
        fields: BTreeMap<String, ValueId>,
    },

    /// Exactly one currently-selected member value.
    Union {
        /// The union type.
        ty: Arc<Type>,
        /// The selected member value.
        selected: ValueId,
    },

    /// Zero-payload marker of a specific literal tag.
    Literal {
        /// The literal type.
        ty: Arc<Type>,
    },
}

impl Value {
    /// The type this value was constructed with.
    pub fn ty(&self) -> &Arc<Type> {
        match self {
            Value::Primitive { ty, .. }
            | Value::Record { ty, .. }
            | Value::Union { ty, .. }
            | Value::Literal { ty } => ty,
        }
    }
}

/// Errors raised by checked value construction.
#[derive(Debug, Error)]
pub enum ValueError {
    /// The supplied type has the wrong kind for the requested constructor.
    #[error("expected a {expected} type, got {found}")]
    WrongKind {
        /// Constructor's required type kind.
        expected: &'static str,
        /// The type actually supplied.
        found: String,
    },

    /// A primitive payload does not match the primitive's name.
    #[error("primitive '{name}' cannot hold {payload}")]
    ScalarMismatch {
        /// Primitive type name.
        name: String,
        /// Description of the rejected payload.
        payload: String,
    },

    /// A record value is missing a declared field.
    #[error("record value missing required field '{0}'")]
    MissingField(String),

    /// A record value carries a field its type does not declare.
    #[error("record value has undeclared field '{0}'")]
    UndeclaredField(String),

    /// A record field's value has the wrong type.
    #[error("field '{field}' expects type {expected}, got {found}")]
    FieldTypeMismatch {
        /// Field name.
        field: String,
        /// Declared field type.
        expected: String,
        /// Type of the supplied value.
        found: String,
    },

    /// A union selection's type is not in the union's member set.
    #[error("type {member} is not a member of union {union}")]
    NotAMember {
        /// Type of the attempted selection.
        member: String,
        /// The union type.
        union: String,
    },

    /// A value referenced an id not yet present in the environment.
    #[error("value id {0} is not allocated in this environment")]
    UnknownValue(ValueId),
}

/// Convenience result alias for value construction.
pub type ValueResult<T> = std::result::Result<T, ValueError>;

/// Arena owning every value of one graph.
///
/// Values are append-only: once allocated they are never removed or mutated,
/// and any id handed out stays valid for the environment's lifetime.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Environment {
    values: Vec<Value>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of values allocated so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values have been allocated.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fetch a value by id.
    pub fn get(&self, id: ValueId) -> ValueResult<&Value> {
        self.values
            .get(id.index())
            .ok_or(ValueError::UnknownValue(id))
    }

    /// Iterate over every value in allocation order.
    pub fn values(&self) -> impl Iterator<Item = (ValueId, &Value)> {
        self.values
            .iter()
            .enumerate()
            .map(|(idx, value)| (ValueId(idx as u32), value))
    }

    fn push(&mut self, value: Value) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(value);
        id
    }

    /// Allocate a primitive value. The payload must match the primitive's
    /// name: `number` holds numbers, `boolean` holds booleans, every other
    /// primitive (`string`, `color`, ...) holds text.
    pub fn primitive(&mut self, ty: &Arc<Type>, raw: Scalar) -> ValueResult<ValueId> {
        let Type::Primitive { name } = &**ty else {
            return Err(ValueError::WrongKind {
                expected: "primitive",
                found: ty.to_string(),
            });
        };
        let matches = match (name.as_str(), &raw) {
            ("number", Scalar::Number(_)) => true,
            ("boolean", Scalar::Boolean(_)) => true,
            ("number" | "boolean", _) => false,
            (_, Scalar::String(_)) => true,
            _ => false,
        };
        if !matches {
            return Err(ValueError::ScalarMismatch {
                name: name.clone(),
                payload: raw.to_string(),
            });
        }
        Ok(self.push(Value::Primitive { ty: ty.clone(), raw }))
    }

    /// Allocate a string primitive.
    pub fn string(&mut self, ty: &Arc<Type>, text: impl Into<String>) -> ValueResult<ValueId> {
        self.primitive(ty, Scalar::String(text.into()))
    }

    /// Allocate a number primitive.
    pub fn number(&mut self, ty: &Arc<Type>, num: f64) -> ValueResult<ValueId> {
        self.primitive(ty, Scalar::Number(num))
    }

    /// Allocate a boolean primitive.
    pub fn boolean(&mut self, ty: &Arc<Type>, flag: bool) -> ValueResult<ValueId> {
        self.primitive(ty, Scalar::Boolean(flag))
    }

    /// Allocate a record value. Every declared field must be supplied with a
    /// value of the declared type; undeclared fields are rejected.
    pub fn record(
        &mut self,
        ty: &Arc<Type>,
        fields: BTreeMap<String, ValueId>,
    ) -> ValueResult<ValueId> {
        let Type::Record { fields: declared } = &**ty else {
            return Err(ValueError::WrongKind {
                expected: "record",
                found: ty.to_string(),
            });
        };
        for (name, field_ty) in declared {
            let id = fields
                .get(name)
                .copied()
                .ok_or_else(|| ValueError::MissingField(name.clone()))?;
            let actual = self.get(id)?.ty();
            if **actual != **field_ty {
                return Err(ValueError::FieldTypeMismatch {
                    field: name.clone(),
                    expected: field_ty.to_string(),
                    found: actual.to_string(),
                });
            }
        }
        for name in fields.keys() {
            if !declared.iter().any(|(declared_name, _)| declared_name == name) {
                return Err(ValueError::UndeclaredField(name.clone()));
            }
        }
        Ok(self.push(Value::Record {
            ty: ty.clone(),
            fields,
        }))
    }

    /// Allocate a union value together with its selected member. The member
    /// value's type must appear in the union's member set; there is no
    /// unselected intermediate state.
    pub fn union(&mut self, ty: &Arc<Type>, selected: ValueId) -> ValueResult<ValueId> {
        if !matches!(&**ty, Type::Union { .. }) {
            return Err(ValueError::WrongKind {
                expected: "union",
                found: ty.to_string(),
            });
        }
        let member_ty = self.get(selected)?.ty().clone();
        if !ty.has_member(&member_ty) {
            return Err(ValueError::NotAMember {
                member: member_ty.to_string(),
                union: ty.to_string(),
            });
        }
        Ok(self.push(Value::Union {
            ty: ty.clone(),
            selected,
        }))
    }

    /// Allocate a literal marker value.
    pub fn literal(&mut self, ty: &Arc<Type>) -> ValueResult<ValueId> {
        if !matches!(&**ty, Type::Literal { .. }) {
            return Err(ValueError::WrongKind {
                expected: "literal",
                found: ty.to_string(),
            });
        }
        Ok(self.push(Value::Literal { ty: ty.clone() }))
    }

    /// Render a value tree as a JSON document. Unions render as their
    /// selected member, literals as their tag string.
    pub fn render(&self, id: ValueId) -> ValueResult<serde_json::Value> {
        let rendered = match self.get(id)? {
            Value::Primitive { raw, .. } => match raw {
                Scalar::Boolean(flag) => serde_json::Value::from(*flag),
                Scalar::Number(num) => serde_json::Value::from(*num),
                Scalar::String(text) => serde_json::Value::from(text.clone()),
            },
            Value::Record { fields, .. } => {
                let mut object = serde_json::Map::new();
                for (name, field) in fields {
                    object.insert(name.clone(), self.render(*field)?);
                }
                serde_json::Value::Object(object)
            }
            Value::Union { selected, .. } => self.render(*selected)?,
            Value::Literal { ty } => match &**ty {
                Type::Literal { tag } => serde_json::Value::from(tag.clone()),
                _ => unreachable!("literal values always carry literal types"),
            },
        };
        Ok(rendered)
    }

    /// Convenience accessor for string-ish primitive payloads.
    pub fn as_str(&self, id: ValueId) -> Option<&str> {
        match self.get(id).ok()? {
            Value::Primitive {
                raw: Scalar::String(text),
                ..
            } => Some(text),
            _ => None,
        }
    }

    /// Convenience accessor for boolean primitive payloads.
    pub fn as_bool(&self, id: ValueId) -> Option<bool> {
        match self.get(id).ok()? {
            Value::Primitive {
                raw: Scalar::Boolean(flag),
                ..
            } => Some(*flag),
            _ => None,
        }
    }

    /// Convenience accessor for the literal tag a union currently selects,
    /// following nested unions.
    pub fn selected_tag(&self, id: ValueId) -> Option<&str> {
        match self.get(id).ok()? {
            Value::Union { selected, .. } => self.selected_tag(*selected),
            Value::Literal { ty } => match &**ty {
                Type::Literal { tag } => Some(tag),
                _ => None,
            },
            _ => None,
        }
    }
}
