//! The query plan handed to the graph-backend executor.
//!
//! A [`QueryPlan`] is four independent ordered lists. Every fragment produced
//! while reducing a parse is itself a `QueryPlan`, and fragments are combined
//! with [`QueryPlan::merge`], which concatenates field by field.
//!
//! The JSON form is what the executor consumes:
//! ```json
//! {
//!   "conditions": [["istartswith", ["property", "n1_0", "name"], "A"]],
//!   "origins": [{"type_id": 1, "type": "node", "alias": "n1_0"}],
//!   "patterns": [],
//!   "results": [{"alias": "n1_0", "properties": null}]
//! }
//! ```

use std::fmt;

use serde::ser::{SerializeTuple, Serializer};
use serde::Serialize;

use crate::schema::{TypeId, TypeKind};

/// Comparison applied by a condition, named after the backend lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lookup {
    IExact,
    IStartsWith,
    IEndsWith,
    Gt,
    Lt,
}

impl Lookup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lookup::IExact => "iexact",
            Lookup::IStartsWith => "istartswith",
            Lookup::IEndsWith => "iendswith",
            Lookup::Gt => "gt",
            Lookup::Lt => "lt",
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One type occurrence introduced by the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Origin {
    pub type_id: TypeId,
    #[serde(rename = "type")]
    pub kind: TypeKind,
    pub alias: String,
}

/// A property of an aliased origin, serialized as `("property", alias, key)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRef {
    pub alias: String,
    pub key: String,
}

impl Serialize for PropertyRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element("property")?;
        tuple.serialize_element(&self.alias)?;
        tuple.serialize_element(&self.key)?;
        tuple.end()
    }
}

/// Serialized as `(lookup, property, value)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub lookup: Lookup,
    pub property: PropertyRef,
    pub value: String,
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.lookup)?;
        tuple.serialize_element(&self.property)?;
        tuple.serialize_element(&self.value)?;
        tuple.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pattern {
    pub source: Origin,
    pub target: Origin,
    pub relation: Origin,
}

/// What to return for an alias; `None` means the whole element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultEntry {
    pub alias: String,
    pub properties: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryPlan {
    pub conditions: Vec<Condition>,
    pub origins: Vec<Origin>,
    pub patterns: Vec<Pattern>,
    pub results: Vec<ResultEntry>,
}

impl QueryPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenates every field of `fragments`, in order, without deduplication.
    pub fn merge<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = QueryPlan>,
    {
        let mut merged = Self::new();
        for fragment in fragments {
            merged.absorb(fragment);
        }
        merged
    }

    /// Appends the lists of `other` to the lists of `self`.
    pub fn absorb(&mut self, other: QueryPlan) {
        self.conditions.extend(other.conditions);
        self.origins.extend(other.origins);
        self.patterns.extend(other.patterns);
        self.results.extend(other.results);
    }

    /// A plan without origins asks nothing of the executor.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
            && self.origins.is_empty()
            && self.patterns.is_empty()
            && self.results.is_empty()
    }

    pub fn last_origin(&self) -> Option<&Origin> {
        self.origins.last()
    }

    pub fn to_json(&self) -> serde_json::Value {
        // all fields are plain strings, numbers and lists, so this cannot fail
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
