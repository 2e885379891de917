//! Rule generation: turns every schema type into a [`TypeRule`].
//!
//! A type rule carries everything the matcher needs to recognize one type in
//! a query: the surface variants of the type name, one [`PropertyRule`] per
//! property, and the naming used for rule dumps and aliases. Rules are plain
//! data, so names with quotes or spaces need no escaping.

use std::fmt::Write;

use nom::IResult;
use nom::bytes::complete::tag;
use nom::error::{Error as NomError, ErrorKind};

use crate::schema::{TypeDescriptor, TypeId, TypeKind};

/// The four spellings accepted for a word: exact, lowercase, uppercase and capitalized.
pub fn case_variants(word: &str) -> [String; 4] {
    [
        word.to_owned(),
        word.to_lowercase(),
        word.to_uppercase(),
        capitalize(word),
    ]
}

/// First character uppercased, the rest lowercased.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Case variants of the singular and the plural, without duplicates,
/// longest first so that a shorter variant never shadows a longer one.
pub fn surface_variants(singular: &str, plural: &str) -> Vec<String> {
    let mut variants: Vec<String> = Vec::with_capacity(8);
    for variant in case_variants(singular).into_iter().chain(case_variants(plural)) {
        if !variants.contains(&variant) {
            variants.push(variant);
        }
    }
    // stable, so equally long variants keep their declaration order
    variants.sort_by_key(|v| std::cmp::Reverse(v.chars().count()));
    variants
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// True when `matched` does not end in the middle of a word of `rest`.
pub fn at_boundary(matched: &str, rest: &str) -> bool {
    match (matched.chars().last(), rest.chars().next()) {
        (Some(last), Some(next)) => !(is_word_char(last) && is_word_char(next)),
        _ => true,
    }
}

/// Matches the first variant that is followed by a word boundary.
pub fn match_variant<'i>(variants: &[String], input: &'i str) -> IResult<&'i str, &'i str> {
    for variant in variants {
        if let Ok((rest, matched)) = tag::<_, _, NomError<&str>>(variant.as_str())(input) {
            if at_boundary(matched, rest) {
                return Ok((rest, matched));
            }
        }
    }
    Err(nom::Err::Error(NomError::new(input, ErrorKind::Tag)))
}

#[derive(Debug, Clone)]
pub struct PropertyRule {
    key: String,
    variants: Vec<String>,
}

impl PropertyRule {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_owned(),
            variants: surface_variants(key, &format!("{key}s")),
        }
    }
    /// The canonical key every variant produces.
    pub fn key(&self) -> &str {
        &self.key
    }
    pub fn variants(&self) -> &[String] {
        &self.variants
    }
}

#[derive(Debug, Clone)]
pub struct TypeRule {
    kind: TypeKind,
    type_id: TypeId,
    name: String,
    variants: Vec<String>,
    properties: Vec<PropertyRule>,
}

impl TypeRule {
    pub fn generate(descriptor: &dyn TypeDescriptor) -> Self {
        Self {
            kind: descriptor.kind(),
            type_id: descriptor.id(),
            name: descriptor.name().to_owned(),
            variants: surface_variants(descriptor.name(), &descriptor.plural()),
            properties: descriptor
                .properties()
                .iter()
                .map(|p| PropertyRule::new(&p.key))
                .collect(),
        }
    }
    pub fn kind(&self) -> TypeKind {
        self.kind
    }
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn variants(&self) -> &[String] {
        &self.variants
    }
    pub fn properties(&self) -> &[PropertyRule] {
        &self.properties
    }
    /// The property a condition refers to when it names none.
    pub fn single_property(&self) -> Option<&PropertyRule> {
        match self.properties.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
    /// `n<id>` or `r<id>`.
    pub fn rule_name(&self) -> String {
        format!("{}{}", self.kind.prefix(), self.type_id)
    }
    /// `n<id>_<ordinal>` or `r<id>_<ordinal>`.
    pub fn alias(&self, ordinal: usize) -> String {
        format!("{}_{}", self.rule_name(), ordinal)
    }

    /// Longest property variant at the start of `input`, ties going to the
    /// property declared first.
    pub fn match_property<'i>(&self, input: &'i str) -> IResult<&'i str, &str> {
        let mut best: Option<(&'i str, &str)> = None;
        for property in &self.properties {
            if let Ok((rest, _)) = match_variant(&property.variants, input) {
                if best.is_none_or(|(best_rest, _)| rest.len() < best_rest.len()) {
                    best = Some((rest, property.key()));
                }
            }
        }
        best.ok_or(nom::Err::Error(NomError::new(input, ErrorKind::Alt)))
    }

    /// Writes this type's rules in PEG-like notation.
    pub fn render(&self, out: &mut String) {
        let name = self.rule_name();
        let _ = writeln!(
            out,
            "{name} = {} -> {{type_id: {}, type: {}}}",
            alternatives(&self.variants),
            self.type_id,
            self.kind
        );
        let mut property_names = Vec::new();
        for (i, property) in self.properties.iter().enumerate() {
            let property_name = format!("{name}_property{i}");
            let _ = writeln!(
                out,
                "{property_name} = {} -> {:?}",
                alternatives(&property.variants),
                property.key
            );
            property_names.push(property_name);
        }
        if property_names.is_empty() {
            let _ = writeln!(out, "{name}_property = ~anything");
        } else {
            let _ = writeln!(out, "{name}_property = {}", property_names.join(" | "));
        }
        let _ = writeln!(
            out,
            "{name}_properties = {name}_property ((',' | 'and') {name}_property)* | -> []"
        );
        match self.kind {
            TypeKind::Node => {
                let implicit = match self.single_property() {
                    Some(property) => format!(" | op value -> {:?}", property.key),
                    None => String::new(),
                };
                let _ = writeln!(
                    out,
                    "{name}_condition = n_facet? ({name}_property 'of'? op? value{implicit})"
                );
                let _ = writeln!(
                    out,
                    "{name}_facet = ({name}_properties ('of' | 'from') 'the'?)? {name} ({name}_condition (conditions {name}_condition)*)?\n    | {name}_facet conditions {name}_facet"
                );
            }
            TypeKind::Relationship => {
                let _ = writeln!(
                    out,
                    "{name}_facet = conditions? r_facet {name} ('a' | 'an' | 'the')?"
                );
            }
        }
    }
}

fn alternatives(variants: &[String]) -> String {
    variants
        .iter()
        .map(|v| format!("{v:?}"))
        .collect::<Vec<_>>()
        .join(" | ")
}
