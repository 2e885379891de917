//! Sylva query – a schema-driven query language for property graphs.
//!
//! Users describe what they want from a graph in constrained, natural-looking
//! text such as `name of the People that likes the Person with the name Alice`.
//! The words such a query may use come from the graph's schema: its node
//! types, relationship types and their properties. The crate compiles that
//! vocabulary into a grammar and turns queries into a [`plan::QueryPlan`]
//! that a graph backend can execute.
//!
//! ## Pipeline
//! * [`rules`] – generates one [`rules::TypeRule`] per schema type, covering
//!   case variants (`person`, `PERSON`, `Person`) and plurals of names and properties.
//! * [`grammar`] – assembles the type rules with the fixed vocabulary
//!   (connectives, lookup phrases, filler words) into a [`grammar::Grammar`].
//! * [`parser`] – matches a query against the grammar and reduces the match
//!   into a query plan, assigning aliases such as `n1_0`, `r2_0`.
//! * [`plan`] – the plan itself: conditions, origins, patterns and results.
//!
//! ## Around the pipeline
//! * [`schema`] – node and relationship types as delivered by the schema store.
//! * [`interface`] – a registry holding one compiled parser per graph.
//! * [`server`] – an HTTP front end to the registry.
//! * [`config`] – layered settings for the `sylva-query` binary.
//!
//! ## Quick Start
//! ```
//! use sylva_query::schema::{NodeType, Schema};
//! use sylva_query::parser::QueryParser;
//! let schema = Schema::new()
//!     .with_node_type(NodeType::new(1, "Person").plural("People").property("name"));
//! let parser = QueryParser::new(&schema).unwrap();
//! let plan = parser.parse("people with the name that starts with Al").unwrap();
//! assert_eq!(plan.conditions[0].lookup.as_str(), "istartswith");
//! assert_eq!(plan.conditions[0].value, "Al");
//! ```

pub mod config;
pub mod error;
pub mod grammar;
pub mod interface;
pub mod parser;
pub mod plan;
pub mod rules;
pub mod schema;
pub mod server;

pub use error::{QueryError, Result};
pub use parser::QueryParser;
pub use plan::QueryPlan;
