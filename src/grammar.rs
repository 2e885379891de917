//! Grammar assembly.
//!
//! The [`Grammar`] joins the per-type rules generated from a schema with the
//! fixed structural vocabulary of the query language: connectives, lookup
//! phrases and filler words. It also owns the `n_types` / `r_types` lookup
//! tables that map a type id back to its rule, built once per schema.
//!
//! Precedence between types that accept the same text: the alternative that
//! consumes more input wins, and ties go to the type declared first. Such
//! collisions are reported by [`Grammar::ambiguities`] and logged when the
//! grammar is assembled.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::Write;
use std::hash::BuildHasherDefault;

use seahash::SeaHasher;
use tracing::{debug, warn};

use crate::error::{QueryError, Result};
use crate::plan::Lookup;
use crate::rules::TypeRule;
use crate::schema::{Schema, TypeDescriptor, TypeId, TypeKind};

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

/// Words joining two conditions, or two facets of the same type.
pub const CONNECTIVES: &[&str] = &["and", "or"];

/// Phrases introducing a comparison, tried in order. No phrase means `iexact`.
pub const LOOKUP_PHRASES: &[(&[&str], Lookup)] = &[
    (&["that", "starts", "with"], Lookup::IStartsWith),
    (&["that", "start", "with"], Lookup::IStartsWith),
    (&["that", "ends", "with"], Lookup::IEndsWith),
    (&["that", "end", "with"], Lookup::IEndsWith),
    (&["greater", "than"], Lookup::Gt),
    (&["lower", "than"], Lookup::Lt),
    (&["less", "than"], Lookup::Lt),
    (&["equal", "to"], Lookup::IExact),
];

/// Introduces a condition: `with [a|the]`.
pub const CONDITION_FILLER: &str = "with";
/// Introduces a relationship: `that` or `who`.
pub const RELATIONSHIP_FILLERS: &[&str] = &["that", "who"];
pub const ARTICLES: &[&str] = &["an", "a", "the"];
/// Joins a projection list to its type: `name of the Person`.
pub const PROJECTION_JOINERS: &[&str] = &["of", "from"];

/// Several types of one kind accepting the same surface text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    pub kind: TypeKind,
    pub variant: String,
    pub type_ids: Vec<TypeId>,
}

#[derive(Debug, Clone)]
pub struct Grammar {
    node_rules: Vec<TypeRule>,
    relationship_rules: Vec<TypeRule>,
    n_types: HashMap<TypeId, usize, OtherHasher>,
    r_types: HashMap<TypeId, usize, OtherHasher>,
}

impl Grammar {
    /// Validates `schema` and builds one rule per type, in declaration order.
    pub fn assemble(schema: &Schema) -> Result<Self> {
        schema.validate()?;
        let node_rules: Vec<TypeRule> = schema
            .node_types()
            .iter()
            .map(|t| TypeRule::generate(t as &dyn TypeDescriptor))
            .collect();
        let relationship_rules: Vec<TypeRule> = schema
            .relationship_types()
            .iter()
            .map(|t| TypeRule::generate(t as &dyn TypeDescriptor))
            .collect();
        let grammar = Self {
            n_types: lookup_table(&node_rules)?,
            r_types: lookup_table(&relationship_rules)?,
            node_rules,
            relationship_rules,
        };
        for ambiguity in grammar.ambiguities() {
            warn!(
                kind = %ambiguity.kind,
                variant = %ambiguity.variant,
                type_ids = ?ambiguity.type_ids,
                "ambiguous type name, the first declared type wins"
            );
        }
        debug!(
            node_types = grammar.node_rules.len(),
            relationship_types = grammar.relationship_rules.len(),
            "grammar assembled"
        );
        Ok(grammar)
    }

    pub fn node_rules(&self) -> &[TypeRule] {
        &self.node_rules
    }
    pub fn relationship_rules(&self) -> &[TypeRule] {
        &self.relationship_rules
    }
    pub fn rules(&self, kind: TypeKind) -> &[TypeRule] {
        match kind {
            TypeKind::Node => &self.node_rules,
            TypeKind::Relationship => &self.relationship_rules,
        }
    }

    /// The rule generated for a type, through the `n_types` / `r_types` tables.
    pub fn rule(&self, kind: TypeKind, type_id: TypeId) -> Option<&TypeRule> {
        let table = match kind {
            TypeKind::Node => &self.n_types,
            TypeKind::Relationship => &self.r_types,
        };
        table.get(&type_id).map(|&index| &self.rules(kind)[index])
    }

    pub fn ambiguities(&self) -> Vec<Ambiguity> {
        let mut found = Vec::new();
        for kind in [TypeKind::Node, TypeKind::Relationship] {
            let mut seen: Vec<Ambiguity> = Vec::new();
            for rule in self.rules(kind) {
                for variant in rule.variants() {
                    match seen.iter_mut().find(|a| &a.variant == variant) {
                        Some(ambiguity) => {
                            if !ambiguity.type_ids.contains(&rule.type_id()) {
                                ambiguity.type_ids.push(rule.type_id());
                            }
                        }
                        None => seen.push(Ambiguity {
                            kind,
                            variant: variant.clone(),
                            type_ids: vec![rule.type_id()],
                        }),
                    }
                }
            }
            found.extend(seen.into_iter().filter(|a| a.type_ids.len() > 1));
        }
        found
    }

    /// The whole grammar in PEG-like notation, one rule per line.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "conditions = {} | -> \"and\"",
            CONNECTIVES
                .iter()
                .map(|c| format!("{c:?} -> {c:?}"))
                .collect::<Vec<_>>()
                .join(" | ")
        );
        let mut op = Vec::new();
        for (words, lookup) in LOOKUP_PHRASES {
            let phrase: Vec<String> = words.iter().map(|w| format!("{w:?}")).collect();
            op.push(format!("({}) -> {:?}", phrase.join(" "), lookup.as_str()));
        }
        op.push(format!("-> {:?}", Lookup::IExact.as_str()));
        let _ = writeln!(out, "op = {}", op.join("\n   | "));
        let _ = writeln!(
            out,
            "n_facet = {CONDITION_FILLER:?} ({})?",
            quoted(ARTICLES)
        );
        let _ = writeln!(out, "r_facet = {}", quoted(RELATIONSHIP_FILLERS));
        let _ = writeln!(out, "value = '\"' <any>* '\"' | \"'\" <any>* \"'\" | <any until a continuation>+");
        for rule in self.node_rules.iter().chain(&self.relationship_rules) {
            rule.render(&mut out);
        }
        let _ = writeln!(out, "n_types = {}", facet_alternatives(&self.node_rules));
        let _ = writeln!(out, "r_types = {}", facet_alternatives(&self.relationship_rules));
        let _ = writeln!(out, "rel = r_types n_types");
        let _ = writeln!(out, "dict = n_types rel* | -> {{}}");
        out
    }
}

fn lookup_table(rules: &[TypeRule]) -> Result<HashMap<TypeId, usize, OtherHasher>> {
    let mut table = HashMap::default();
    for (index, rule) in rules.iter().enumerate() {
        if rule.variants().is_empty() {
            return Err(QueryError::GrammarCompilation(format!(
                "rule {} accepts no surface text",
                rule.rule_name()
            )));
        }
        match table.entry(rule.type_id()) {
            Entry::Vacant(e) => {
                e.insert(index);
            }
            Entry::Occupied(_) => {
                return Err(QueryError::GrammarCompilation(format!(
                    "rule {} is generated twice",
                    rule.rule_name()
                )));
            }
        }
    }
    Ok(table)
}

fn quoted(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| format!("{w:?}"))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn facet_alternatives(rules: &[TypeRule]) -> String {
    if rules.is_empty() {
        return "~anything".to_owned();
    }
    rules
        .iter()
        .map(|r| format!("{}_facet", r.rule_name()))
        .collect::<Vec<_>>()
        .join(" | ")
}
