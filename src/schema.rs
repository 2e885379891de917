//! Graph schemas as seen by the query compiler.
//!
//! A [`Schema`] is an ordered collection of [`NodeType`]s and
//! [`RelationshipType`]s. Declaration order matters: it is the tie-break used
//! by the grammar when two types accept the same surface text. Both kinds of
//! type implement [`TypeDescriptor`], which is all the rule generator needs.
//!
//! Schemas usually arrive as JSON from the schema store:
//! ```
//! use sylva_query::schema::Schema;
//! let schema = Schema::from_json(r#"{
//!     "node_types": [{"id": 1, "name": "Person", "plural_name": "People",
//!                     "properties": [{"key": "name"}]}],
//!     "relationship_types": [{"id": 1, "name": "likes", "source": 1, "target": 1}]
//! }"#).unwrap();
//! assert_eq!(schema.node_types().len(), 1);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::parser::normalize_whitespace;

pub type TypeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Node,
    Relationship,
}

impl TypeKind {
    /// Leading letter of rule names and aliases, `n` or `r`.
    pub fn prefix(&self) -> char {
        match self {
            TypeKind::Node => 'n',
            TypeKind::Relationship => 'r',
        }
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Node => "node",
            TypeKind::Relationship => "relationship",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
}

impl Property {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Common view over node and relationship types.
pub trait TypeDescriptor {
    fn id(&self) -> TypeId;
    fn kind(&self) -> TypeKind;
    fn name(&self) -> &str;
    fn plural_name(&self) -> Option<&str>;
    fn properties(&self) -> &[Property];

    /// The explicit plural, or the name with an `s` appended.
    fn plural(&self) -> String {
        match self.plural_name() {
            Some(plural) => plural.to_owned(),
            None => format!("{}s", self.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeType {
    pub id: TypeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural_name: Option<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl NodeType {
    pub fn new(id: TypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            plural_name: None,
            properties: Vec::new(),
        }
    }
    pub fn plural(mut self, plural_name: impl Into<String>) -> Self {
        self.plural_name = Some(plural_name.into());
        self
    }
    pub fn property(mut self, key: impl Into<String>) -> Self {
        self.properties.push(Property::new(key));
        self
    }
}

impl TypeDescriptor for NodeType {
    fn id(&self) -> TypeId {
        self.id
    }
    fn kind(&self) -> TypeKind {
        TypeKind::Node
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn plural_name(&self) -> Option<&str> {
        self.plural_name.as_deref()
    }
    fn properties(&self) -> &[Property] {
        &self.properties
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipType {
    pub id: TypeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural_name: Option<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Node type id at the start of the relationship.
    pub source: TypeId,
    /// Node type id at the end of the relationship.
    pub target: TypeId,
}

impl RelationshipType {
    pub fn new(id: TypeId, name: impl Into<String>, source: TypeId, target: TypeId) -> Self {
        Self {
            id,
            name: name.into(),
            plural_name: None,
            properties: Vec::new(),
            source,
            target,
        }
    }
    pub fn plural(mut self, plural_name: impl Into<String>) -> Self {
        self.plural_name = Some(plural_name.into());
        self
    }
    pub fn property(mut self, key: impl Into<String>) -> Self {
        self.properties.push(Property::new(key));
        self
    }
}

impl TypeDescriptor for RelationshipType {
    fn id(&self) -> TypeId {
        self.id
    }
    fn kind(&self) -> TypeKind {
        TypeKind::Relationship
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn plural_name(&self) -> Option<&str> {
        self.plural_name.as_deref()
    }
    fn properties(&self) -> &[Property] {
        &self.properties
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    node_types: Vec<NodeType>,
    #[serde(default)]
    relationship_types: Vec<RelationshipType>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
    pub fn with_node_type(mut self, node_type: NodeType) -> Self {
        self.node_types.push(node_type);
        self
    }
    pub fn with_relationship_type(mut self, relationship_type: RelationshipType) -> Self {
        self.relationship_types.push(relationship_type);
        self
    }
    pub fn node_types(&self) -> &[NodeType] {
        &self.node_types
    }
    pub fn relationship_types(&self) -> &[RelationshipType] {
        &self.relationship_types
    }
    pub fn node_type(&self, id: TypeId) -> Option<&NodeType> {
        self.node_types.iter().find(|t| t.id == id)
    }
    pub fn relationship_type(&self, id: TypeId) -> Option<&RelationshipType> {
        self.relationship_types.iter().find(|t| t.id == id)
    }

    /// Rejects schemas the rule generator cannot turn into a usable grammar.
    ///
    /// Names, plurals and property keys must be non-empty and whitespace
    /// normalized (single spaces between words), since queries are normalized
    /// the same way before matching. Type ids are unique per kind and
    /// relationship endpoints must name declared node types.
    pub fn validate(&self) -> Result<()> {
        let mut node_ids = HashSet::new();
        for node_type in &self.node_types {
            if !node_ids.insert(node_type.id) {
                return Err(QueryError::SchemaInconsistency(format!(
                    "node type id {} is declared more than once",
                    node_type.id
                )));
            }
            validate_descriptor(node_type)?;
        }
        let mut relationship_ids = HashSet::new();
        for relationship_type in &self.relationship_types {
            if !relationship_ids.insert(relationship_type.id) {
                return Err(QueryError::SchemaInconsistency(format!(
                    "relationship type id {} is declared more than once",
                    relationship_type.id
                )));
            }
            validate_descriptor(relationship_type)?;
            for endpoint in [relationship_type.source, relationship_type.target] {
                if !node_ids.contains(&endpoint) {
                    return Err(QueryError::SchemaInconsistency(format!(
                        "relationship type '{}' refers to unknown node type id {}",
                        relationship_type.name, endpoint
                    )));
                }
            }
        }
        Ok(())
    }
}

fn validate_descriptor(descriptor: &dyn TypeDescriptor) -> Result<()> {
    let what = format!("{} type {}", descriptor.kind(), descriptor.id());
    validate_word(descriptor.name(), &format!("name of {what}"))?;
    if let Some(plural) = descriptor.plural_name() {
        validate_word(plural, &format!("plural name of {what}"))?;
    }
    let mut keys = HashSet::new();
    for property in descriptor.properties() {
        validate_word(&property.key, &format!("property key of {what}"))?;
        if !keys.insert(property.key.as_str()) {
            return Err(QueryError::SchemaInconsistency(format!(
                "property '{}' of {what} is declared more than once",
                property.key
            )));
        }
    }
    Ok(())
}

fn validate_word(word: &str, what: &str) -> Result<()> {
    if word.trim().is_empty() {
        return Err(QueryError::SchemaInconsistency(format!("{what} is empty")));
    }
    if normalize_whitespace(word) != word {
        return Err(QueryError::SchemaInconsistency(format!(
            "{what} '{word}' has leading, trailing or repeated whitespace"
        )));
    }
    Ok(())
}
