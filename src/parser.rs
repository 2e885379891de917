//! Query parsing and reduction into a [`QueryPlan`].
//!
//! Parsing happens in two passes. The matcher walks the normalized query with
//! `nom` combinators built from the [`Grammar`] and produces a small syntax
//! tree without side effects, so backtracking can never burn an alias. The
//! reducer then walks that tree left to right with a [`ParseContext`],
//! minting aliases and merging one fragment per facet.
//!
//! ```
//! use sylva_query::schema::{NodeType, RelationshipType, Schema};
//! use sylva_query::parser::QueryParser;
//!
//! let schema = Schema::new()
//!     .with_node_type(NodeType::new(1, "Person").plural("People").property("name"))
//!     .with_relationship_type(RelationshipType::new(1, "likes", 1, 1));
//! let parser = QueryParser::new(&schema).unwrap();
//! let plan = parser.parse("People that likes the Person with the name Alice").unwrap();
//! assert_eq!(plan.origins.len(), 3);
//! assert_eq!(plan.patterns.len(), 1);
//! assert_eq!(plan.conditions[0].property.alias, "n1_1");
//! ```

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use lazy_static::lazy_static;
use nom::branch::alt;
use nom::bytes::complete::{tag_no_case, take_until};
use nom::character::complete::{char as pchar, space0, space1};
use nom::combinator::{eof, opt};
use nom::error::{Error as NomError, ErrorKind};
use nom::sequence::delimited;
use nom::IResult;
use regex::Regex;
use tracing::debug;

use crate::error::{QueryError, Result};
use crate::grammar::{
    ARTICLES, CONDITION_FILLER, CONNECTIVES, Grammar, LOOKUP_PHRASES, OtherHasher,
    PROJECTION_JOINERS, RELATIONSHIP_FILLERS,
};
use crate::plan::{Condition, Lookup, Origin, Pattern, PropertyRef, QueryPlan, ResultEntry};
use crate::rules::{TypeRule, at_boundary, match_variant};
use crate::schema::{Schema, TypeId, TypeKind};

pub const DEFAULT_MAX_QUERY_LENGTH: usize = 1024;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Trims `text` and collapses every whitespace run into a single space.
pub fn normalize_whitespace(text: &str) -> Cow<'_, str> {
    WHITESPACE.replace_all(text.trim(), " ")
}

/// A query with whitespace runs collapsed outside quoted literals.
///
/// A quote opens a literal only at the start of a word and only when it is
/// closed later on, the same way the matcher reads quoted values, so the
/// apostrophe in `O'Brien` is plain text. `columns` holds, per character of
/// `text`, its 0-based character position in the query as typed.
#[derive(Debug, Clone, Default)]
pub struct NormalizedQuery {
    text: String,
    columns: Vec<usize>,
    end_column: usize,
}

impl NormalizedQuery {
    pub fn new(query: &str) -> Self {
        let chars: Vec<char> = query.chars().collect();
        let mut normalized = Self::default();
        let mut gap: Option<usize> = None;
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                gap.get_or_insert(i);
                i += 1;
                continue;
            }
            if let Some(start) = gap.take() {
                if !normalized.text.is_empty() {
                    normalized.push(' ', start);
                }
            }
            let word_start = i == 0 || chars[i - 1].is_whitespace();
            let closing = match c {
                '"' | '\'' if word_start => chars[i + 1..].iter().position(|&q| q == c),
                _ => None,
            };
            match closing {
                Some(length) => {
                    for j in i..=i + length + 1 {
                        normalized.push(chars[j], j);
                    }
                    i += length + 2;
                }
                None => {
                    normalized.push(c, i);
                    i += 1;
                }
            }
        }
        normalized.end_column = normalized.columns.last().map_or(0, |&last| last + 1);
        normalized
    }

    fn push(&mut self, c: char, column: usize) {
        self.text.push(c);
        self.columns.push(column);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 1-based column in the query as typed for a byte offset into `text`.
    pub fn column(&self, offset: usize) -> usize {
        let index = self.text[..offset].chars().count();
        self.columns.get(index).copied().unwrap_or(self.end_column) + 1
    }
}

/// Alias counters for one parse, keyed by type kind and id.
#[derive(Debug, Default)]
pub struct ParseContext {
    counters: HashMap<(TypeKind, TypeId), usize, OtherHasher>,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn reset(&mut self) {
        self.counters.clear();
    }
    /// Next alias for `rule`, starting from ordinal zero.
    pub fn mint(&mut self, rule: &TypeRule) -> String {
        let ordinal = self
            .counters
            .entry((rule.kind(), rule.type_id()))
            .or_insert(0);
        let alias = rule.alias(*ordinal);
        *ordinal += 1;
        alias
    }
}

/// A compiled query grammar for one graph schema.
#[derive(Debug, Clone)]
pub struct QueryParser {
    grammar: Grammar,
    max_query_length: usize,
}

impl QueryParser {
    pub fn new(schema: &Schema) -> Result<Self> {
        Ok(Self {
            grammar: Grammar::assemble(schema)?,
            max_query_length: DEFAULT_MAX_QUERY_LENGTH,
        })
    }
    pub fn with_max_query_length(mut self, max_query_length: usize) -> Self {
        self.max_query_length = max_query_length;
        self
    }
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }
    pub fn max_query_length(&self) -> usize {
        self.max_query_length
    }

    /// Parses `query` with fresh alias counters.
    pub fn parse(&self, query: &str) -> Result<QueryPlan> {
        let mut context = ParseContext::new();
        self.parse_with(query, &mut context)
    }

    /// Parses `query`, resetting `context` first. An empty query yields an
    /// empty plan; anything else must match in full.
    pub fn parse_with(&self, query: &str, context: &mut ParseContext) -> Result<QueryPlan> {
        context.reset();
        let length = query.chars().count();
        if length > self.max_query_length {
            return Err(QueryError::QueryTooLong {
                length,
                limit: self.max_query_length,
            });
        }
        let normalized = NormalizedQuery::new(query);
        let text = normalized.text();
        let matcher = Matcher::new(&self.grammar, text);
        let syntax = match matcher.query(text) {
            Ok((_, syntax)) => syntax,
            Err(_) => return Err(matcher.error(&normalized)),
        };
        let plan = match syntax {
            Some(syntax) => reduce(&self.grammar, &syntax, context)?,
            None => QueryPlan::new(),
        };
        debug!(
            query = %text,
            origins = plan.origins.len(),
            conditions = plan.conditions.len(),
            patterns = plan.patterns.len(),
            "query parsed"
        );
        Ok(plan)
    }
}

// ------------- Syntax -------------

#[derive(Debug, Clone)]
struct ConditionSyntax {
    key: String,
    lookup: Lookup,
    value: String,
}

#[derive(Debug, Clone)]
struct NodeFacetSyntax {
    type_id: TypeId,
    projection: Option<Vec<String>>,
    conditions: Vec<ConditionSyntax>,
}

#[derive(Debug, Clone)]
struct HopSyntax {
    relation: TypeId,
    targets: Vec<NodeFacetSyntax>,
}

#[derive(Debug, Clone)]
struct QuerySyntax {
    sources: Vec<NodeFacetSyntax>,
    hops: Vec<HopSyntax>,
}

// ------------- Matching -------------

type Parsed<'i, T> = IResult<&'i str, T>;

#[derive(Debug, Default)]
struct Furthest {
    offset: usize,
    expected: Vec<String>,
}

struct Matcher<'g> {
    grammar: &'g Grammar,
    length: usize,
    furthest: RefCell<Furthest>,
    // lookaheads do not report what they expected
    quiet: Cell<usize>,
}

fn reject<T>(input: &str) -> Parsed<'_, T> {
    Err(nom::Err::Error(NomError::new(input, ErrorKind::Verify)))
}

impl<'g> Matcher<'g> {
    fn new(grammar: &'g Grammar, text: &str) -> Self {
        Self {
            grammar,
            length: text.len(),
            furthest: RefCell::new(Furthest::default()),
            quiet: Cell::new(0),
        }
    }

    fn expect(&self, input: &str, what: impl FnOnce() -> String) {
        if self.quiet.get() > 0 {
            return;
        }
        let offset = self.length - input.len();
        let mut furthest = self.furthest.borrow_mut();
        if offset > furthest.offset {
            furthest.offset = offset;
            furthest.expected.clear();
        }
        if offset == furthest.offset {
            let what = what();
            if !furthest.expected.contains(&what) {
                furthest.expected.push(what);
            }
        }
    }

    fn fail<'i, T>(&self, input: &'i str, what: impl FnOnce() -> String) -> Parsed<'i, T> {
        self.expect(input, what);
        reject(input)
    }

    fn quietly<T>(&self, f: impl FnOnce() -> T) -> T {
        self.quiet.set(self.quiet.get() + 1);
        let result = f();
        self.quiet.set(self.quiet.get() - 1);
        result
    }

    fn error(&self, normalized: &NormalizedQuery) -> QueryError {
        let furthest = self.furthest.borrow();
        let column = normalized.column(furthest.offset);
        let rest = &normalized.text()[furthest.offset..];
        let found = if rest.is_empty() {
            "end of query".to_owned()
        } else {
            let snippet: String = rest.chars().take(24).collect();
            format!("'{snippet}'")
        };
        let message = if furthest.expected.is_empty() {
            format!("unexpected {found}")
        } else {
            format!(
                "unexpected {found}, expected one of: {}",
                furthest.expected.join(", ")
            )
        };
        QueryError::Parse {
            message,
            column,
            expected: furthest.expected.clone(),
        }
    }

    // ------------- Terminals -------------

    fn word<'i>(&self, input: &'i str, word: &str) -> Parsed<'i, &'i str> {
        match tag_no_case::<_, _, NomError<&str>>(word)(input) {
            Ok((rest, matched)) if at_boundary(matched, rest) => Ok((rest, matched)),
            _ => self.fail(input, || format!("'{word}'")),
        }
    }

    fn any_word<'i>(&self, input: &'i str, words: &[&str]) -> Parsed<'i, &'i str> {
        for word in words {
            if let Ok(ok) = self.word(input, word) {
                return Ok(ok);
            }
        }
        reject(input)
    }

    /// Words separated by single spaces.
    fn phrase<'i>(&self, input: &'i str, words: &[&str]) -> Parsed<'i, ()> {
        let mut rest = input;
        for (i, word) in words.iter().enumerate() {
            if i > 0 {
                rest = self.space(rest)?.0;
            }
            rest = self.word(rest, word)?.0;
        }
        Ok((rest, ()))
    }

    fn space<'i>(&self, input: &'i str) -> Parsed<'i, ()> {
        match space1::<_, NomError<&str>>(input) {
            Ok((rest, _)) => Ok((rest, ())),
            Err(_) => self.fail(input, || "whitespace".to_owned()),
        }
    }

    fn end<'i>(&self, input: &'i str) -> Parsed<'i, ()> {
        match eof::<_, NomError<&str>>(input) {
            Ok((rest, _)) => Ok((rest, ())),
            Err(_) => self.fail(input, || "end of query".to_owned()),
        }
    }

    fn connective<'i>(&self, input: &'i str) -> Parsed<'i, &'i str> {
        self.any_word(input, CONNECTIVES)
    }

    fn lookup<'i>(&self, input: &'i str) -> Parsed<'i, Lookup> {
        for (words, lookup) in LOOKUP_PHRASES {
            if let Ok((rest, _)) = self.phrase(input, words) {
                return Ok((rest, *lookup));
            }
        }
        reject(input)
    }

    fn type_name<'i>(&self, input: &'i str, rule: &TypeRule) -> Parsed<'i, ()> {
        match match_variant(rule.variants(), input) {
            Ok((rest, _)) => Ok((rest, ())),
            Err(_) => self.fail(input, || format!("{:?}", rule.name())),
        }
    }

    fn property<'i>(&self, input: &'i str, rule: &TypeRule) -> Parsed<'i, String> {
        match rule.match_property(input) {
            Ok((rest, key)) => Ok((rest, key.to_owned())),
            Err(_) => {
                for property in rule.properties() {
                    self.expect(input, || format!("{:?}", property.key()));
                }
                reject(input)
            }
        }
    }

    /// `,` or `and` between two property references.
    fn list_separator<'i>(&self, input: &'i str) -> Parsed<'i, ()> {
        let comma: Parsed<'i, char> = delimited(space0, pchar(','), space0)(input);
        if let Ok((rest, _)) = comma {
            return Ok((rest, ()));
        }
        let (rest, _) = self.space(input)?;
        let (rest, _) = self.word(rest, "and")?;
        self.space(rest)
    }

    /// One or more property references; never fails, yielding an empty list
    /// when nothing (or no property at all) matches.
    fn property_list<'i>(&self, input: &'i str, rule: &TypeRule) -> Parsed<'i, Vec<String>> {
        let (mut rest, first) = match self.property(input, rule) {
            Ok(ok) => ok,
            Err(_) => return Ok((input, Vec::new())),
        };
        let mut keys = vec![first];
        loop {
            let next = self
                .list_separator(rest)
                .and_then(|(after, _)| self.property(after, rule));
            match next {
                Ok((after, key)) => {
                    keys.push(key);
                    rest = after;
                }
                Err(_) => break,
            }
        }
        Ok((rest, keys))
    }

    /// `<properties> of|from [the]` in front of a type name.
    fn projection<'i>(&self, input: &'i str, rule: &TypeRule) -> Parsed<'i, Vec<String>> {
        let (rest, keys) = self.property_list(input, rule)?;
        if keys.is_empty() {
            return reject(input);
        }
        let (rest, _) = self.space(rest)?;
        let (rest, _) = self.any_word(rest, PROJECTION_JOINERS)?;
        let (rest, _) = self.space(rest)?;
        let (rest, _) = opt(|i| {
            let (i, _) = self.word(i, "the")?;
            self.space(i)
        })(rest)?;
        Ok((rest, keys))
    }

    fn value<'i>(&self, input: &'i str, rule: &TypeRule) -> Parsed<'i, String> {
        let quoted: Parsed<'i, &'i str> = alt((
            delimited(pchar('"'), take_until("\""), pchar('"')),
            delimited(pchar('\''), take_until("'"), pchar('\'')),
        ))(input);
        if let Ok((rest, value)) = quoted {
            return Ok((rest, value.to_owned()));
        }
        let mut end = 0;
        for (i, c) in input.char_indices() {
            if c == ' ' && self.ends_value(&input[i..], rule) {
                break;
            }
            end = i + c.len_utf8();
        }
        if end == 0 {
            return self.fail(input, || "a value".to_owned());
        }
        Ok((&input[end..], input[..end].to_owned()))
    }

    /// Whether a bare value stops before `at`, which starts with a space:
    /// true when a relationship, or a connective followed by another condition,
    /// facet or relationship, comes next.
    fn ends_value(&self, at: &str, rule: &TypeRule) -> bool {
        self.quietly(|| {
            let Ok((after, _)) = self.space(at) else {
                return false;
            };
            if self.relationship_start(after).is_ok() {
                return true;
            }
            let continuation = self
                .connective(after)
                .and_then(|(rest, _)| self.space(rest));
            let Ok((after, _)) = continuation else {
                return false;
            };
            self.word(after, CONDITION_FILLER).is_ok()
                || self.property(after, rule).is_ok()
                || self.lookup(after).is_ok()
                || self.type_name(after, rule).is_ok()
                || self.projection(after, rule).is_ok()
                || self.relationship_start(after).is_ok()
        })
    }

    fn relationship_start<'i>(&self, input: &'i str) -> Parsed<'i, ()> {
        let (rest, _) = self.any_word(input, RELATIONSHIP_FILLERS)?;
        let (rest, _) = self.space(rest)?;
        for rule in self.grammar.relationship_rules() {
            if let Ok(ok) = self.type_name(rest, rule) {
                return Ok(ok);
            }
        }
        reject(input)
    }

    // ------------- Conditions -------------

    /// `with [a|the]` before a condition.
    fn condition_filler<'i>(&self, input: &'i str) -> Parsed<'i, ()> {
        let (rest, _) = self.word(input, CONDITION_FILLER)?;
        let (rest, _) = opt(|i| {
            let (i, _) = self.space(i)?;
            self.any_word(i, ARTICLES)
        })(rest)?;
        self.space(rest)
    }

    fn condition<'i>(&self, input: &'i str, rule: &TypeRule) -> Parsed<'i, ConditionSyntax> {
        let (input, _) = opt(|i| self.condition_filler(i))(input)?;
        if let Ok(ok) = self.named_condition(input, rule) {
            return Ok(ok);
        }
        match rule.single_property() {
            Some(property) => {
                let (rest, lookup) = self.lookup(input)?;
                let (rest, _) = self.space(rest)?;
                let (rest, value) = self.value(rest, rule)?;
                Ok((
                    rest,
                    ConditionSyntax {
                        key: property.key().to_owned(),
                        lookup,
                        value,
                    },
                ))
            }
            None => reject(input),
        }
    }

    /// `<property> [of] [<lookup>] <value>`; when nothing follows `of`, the
    /// `of` itself is the value.
    fn named_condition<'i>(&self, input: &'i str, rule: &TypeRule) -> Parsed<'i, ConditionSyntax> {
        let (rest, key) = self.property(input, rule)?;
        let (after_of, _) = opt(|i| {
            let (i, _) = self.space(i)?;
            self.word(i, "of")
        })(rest)?;
        let (rest, (lookup, value)) = match self.comparison(after_of, rule) {
            Err(_) if after_of.len() < rest.len() => self.comparison(rest, rule)?,
            result => result?,
        };
        Ok((rest, ConditionSyntax { key, lookup, value }))
    }

    /// ` [<lookup>] <value>` after a property.
    fn comparison<'i>(&self, input: &'i str, rule: &TypeRule) -> Parsed<'i, (Lookup, String)> {
        let (rest, _) = self.space(input)?;
        let (rest, lookup) = match self.lookup(rest) {
            Ok((after, lookup)) => (self.space(after)?.0, lookup),
            Err(_) => (rest, Lookup::IExact),
        };
        let (rest, value) = self.value(rest, rule)?;
        Ok((rest, (lookup, value)))
    }

    /// Conditions on one facet, joined by connectives.
    fn condition_chain<'i>(&self, input: &'i str, rule: &TypeRule) -> Parsed<'i, Vec<ConditionSyntax>> {
        let mut conditions = Vec::new();
        let first = self
            .space(input)
            .and_then(|(rest, _)| self.condition(rest, rule));
        let mut rest = match first {
            Ok((rest, condition)) => {
                conditions.push(condition);
                rest
            }
            Err(_) => return Ok((input, conditions)),
        };
        loop {
            let next = self
                .space(rest)
                .and_then(|(after, _)| self.connective(after))
                .and_then(|(after, _)| self.space(after))
                .and_then(|(after, _)| self.condition(after, rule));
            match next {
                Ok((after, condition)) => {
                    conditions.push(condition);
                    rest = after;
                }
                Err(_) => break,
            }
        }
        Ok((rest, conditions))
    }

    // ------------- Facets -------------

    fn node_facet<'i>(&self, input: &'i str, index: usize) -> Parsed<'i, NodeFacetSyntax> {
        let rule = &self.grammar.node_rules()[index];
        let (input, projection) = match self.projection(input, rule) {
            Ok((rest, keys)) => (rest, Some(keys)),
            Err(_) => (input, None),
        };
        let (input, _) = self.type_name(input, rule)?;
        let (input, conditions) = self.condition_chain(input, rule)?;
        Ok((
            input,
            NodeFacetSyntax {
                type_id: rule.type_id(),
                projection,
                conditions,
            },
        ))
    }

    /// `n_types`: the node facet consuming the most input, earliest type on
    /// ties. Also yields the index of the winning rule.
    fn node_types<'i>(&self, input: &'i str) -> Parsed<'i, (usize, NodeFacetSyntax)> {
        let mut best: Option<(&'i str, (usize, NodeFacetSyntax))> = None;
        for index in 0..self.grammar.node_rules().len() {
            if let Ok((rest, facet)) = self.node_facet(input, index) {
                if best.as_ref().is_none_or(|(best_rest, _)| rest.len() < best_rest.len()) {
                    best = Some((rest, (index, facet)));
                }
            }
        }
        match best {
            Some(ok) => Ok(ok),
            None => reject(input),
        }
    }

    /// Facets of one type joined by connectives, each with its own alias.
    fn node_group<'i>(&self, input: &'i str) -> Parsed<'i, Vec<NodeFacetSyntax>> {
        let (mut rest, (index, first)) = self.node_types(input)?;
        let mut facets = vec![first];
        loop {
            let next = self
                .space(rest)
                .and_then(|(after, _)| self.connective(after))
                .and_then(|(after, _)| self.space(after))
                .and_then(|(after, _)| self.node_facet(after, index));
            match next {
                Ok((after, facet)) => {
                    facets.push(facet);
                    rest = after;
                }
                Err(_) => break,
            }
        }
        Ok((rest, facets))
    }

    /// `[connective] that|who <relationship> [a|an|the]`, yielding the type id.
    fn relationship_facet<'i>(&self, input: &'i str, index: usize) -> Parsed<'i, TypeId> {
        let rule = &self.grammar.relationship_rules()[index];
        let (input, _) = opt(|i| {
            let (i, _) = self.connective(i)?;
            self.space(i)
        })(input)?;
        let (input, _) = self.any_word(input, RELATIONSHIP_FILLERS)?;
        let (input, _) = self.space(input)?;
        let (input, _) = self.type_name(input, rule)?;
        let (input, _) = opt(|i| {
            let (i, _) = self.space(i)?;
            self.any_word(i, ARTICLES)
        })(input)?;
        Ok((input, rule.type_id()))
    }

    /// `r_types`, with the same precedence as `n_types`.
    fn relationship_types<'i>(&self, input: &'i str) -> Parsed<'i, TypeId> {
        let mut best: Option<(&'i str, TypeId)> = None;
        for index in 0..self.grammar.relationship_rules().len() {
            if let Ok((rest, facet)) = self.relationship_facet(input, index) {
                if best.is_none_or(|(best_rest, _)| rest.len() < best_rest.len()) {
                    best = Some((rest, facet));
                }
            }
        }
        match best {
            Some(ok) => Ok(ok),
            None => reject(input),
        }
    }

    /// `rel`: a relationship facet followed by a node facet group.
    fn hop<'i>(&self, input: &'i str) -> Parsed<'i, HopSyntax> {
        let (input, _) = self.space(input)?;
        let (input, relation) = self.relationship_types(input)?;
        let (input, _) = self.space(input)?;
        let (input, targets) = self.node_group(input)?;
        Ok((input, HopSyntax { relation, targets }))
    }

    /// `dict`: the whole query, or nothing for an empty one.
    fn query<'i>(&self, input: &'i str) -> Parsed<'i, Option<QuerySyntax>> {
        if input.is_empty() {
            return Ok((input, None));
        }
        let (mut rest, sources) = self.node_group(input)?;
        let mut hops = Vec::new();
        while let Ok((after, hop)) = self.hop(rest) {
            hops.push(hop);
            rest = after;
        }
        let (rest, _) = self.end(rest)?;
        Ok((rest, Some(QuerySyntax { sources, hops })))
    }
}

// ------------- Reduction -------------

/// The rule behind a parsed type id, through the grammar's type tables.
fn rule_for(grammar: &Grammar, kind: TypeKind, type_id: TypeId) -> Result<&TypeRule> {
    grammar.rule(kind, type_id).ok_or_else(|| {
        QueryError::GrammarCompilation(format!("no rule for {} type {type_id}", kind))
    })
}

fn reduce(grammar: &Grammar, syntax: &QuerySyntax, context: &mut ParseContext) -> Result<QueryPlan> {
    let mut plan = QueryPlan::new();
    let mut source = reduce_group(grammar, &syntax.sources, context, &mut plan)?;
    for hop in &syntax.hops {
        let relation_rule = rule_for(grammar, TypeKind::Relationship, hop.relation)?;
        let relation_fragment = relationship_facet(relation_rule, context);
        let relation = relation_fragment.last_origin().cloned();
        plan.absorb(relation_fragment);
        let target = reduce_group(grammar, &hop.targets, context, &mut plan)?;
        // every facet yields exactly one origin, so these are always present
        if let (Some(source), Some(target), Some(relation)) = (source, target.clone(), relation) {
            plan.patterns.push(Pattern {
                source,
                target,
                relation,
            });
        }
        source = target;
    }
    Ok(plan)
}

/// Merges the facets of a group into `plan`, returning the group's last origin.
fn reduce_group(
    grammar: &Grammar,
    facets: &[NodeFacetSyntax],
    context: &mut ParseContext,
    plan: &mut QueryPlan,
) -> Result<Option<Origin>> {
    let mut fragments = Vec::with_capacity(facets.len());
    for facet in facets {
        let rule = rule_for(grammar, TypeKind::Node, facet.type_id)?;
        fragments.push(node_facet(rule, facet, context));
    }
    let fragment = QueryPlan::merge(fragments);
    let last = fragment.last_origin().cloned();
    plan.absorb(fragment);
    Ok(last)
}

fn node_facet(rule: &TypeRule, facet: &NodeFacetSyntax, context: &mut ParseContext) -> QueryPlan {
    let alias = context.mint(rule);
    QueryPlan {
        conditions: facet
            .conditions
            .iter()
            .map(|c| Condition {
                lookup: c.lookup,
                property: PropertyRef {
                    alias: alias.clone(),
                    key: c.key.clone(),
                },
                value: c.value.clone(),
            })
            .collect(),
        origins: vec![Origin {
            type_id: rule.type_id(),
            kind: TypeKind::Node,
            alias: alias.clone(),
        }],
        patterns: Vec::new(),
        results: vec![ResultEntry {
            alias,
            properties: facet.projection.clone(),
        }],
    }
}

fn relationship_facet(rule: &TypeRule, context: &mut ParseContext) -> QueryPlan {
    let alias = context.mint(rule);
    QueryPlan {
        origins: vec![Origin {
            type_id: rule.type_id(),
            kind: TypeKind::Relationship,
            alias: alias.clone(),
        }],
        results: vec![ResultEntry {
            alias,
            properties: Some(Vec::new()),
        }],
        ..QueryPlan::default()
    }
}
