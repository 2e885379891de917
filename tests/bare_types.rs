use sylva_query::parser::{ParseContext, QueryParser};
use sylva_query::schema::{NodeType, RelationshipType, Schema, TypeKind};

fn setup() -> QueryParser {
    let schema = Schema::new()
        .with_node_type(NodeType::new(1, "Person").plural("People").property("name"))
        .with_node_type(NodeType::new(2, "Company").property("name"))
        .with_node_type(NodeType::new(3, "Thing"))
        .with_relationship_type(RelationshipType::new(1, "works at", 1, 2));
    QueryParser::new(&schema).unwrap()
}

#[test]
fn bare_type_yields_one_origin() {
    let parser = setup();
    let plan = parser.parse("Person").unwrap();
    assert_eq!(plan.origins.len(), 1);
    assert_eq!(plan.origins[0].type_id, 1);
    assert_eq!(plan.origins[0].kind, TypeKind::Node);
    assert_eq!(plan.origins[0].alias, "n1_0");
    assert!(plan.conditions.is_empty());
    assert!(plan.patterns.is_empty());
    assert_eq!(plan.results.len(), 1);
    assert_eq!(plan.results[0].alias, "n1_0");
    assert_eq!(plan.results[0].properties, None, "no projection returns the whole element");
}

#[test]
fn case_and_plural_variants() {
    let parser = setup();
    for query in ["Person", "person", "PERSON", "People", "people", "PEOPLE"] {
        let plan = parser.parse(query).unwrap_or_else(|e| panic!("{query}: {e}"));
        assert_eq!(plan.origins[0].type_id, 1, "{query}");
    }
    // default plural appends an s
    assert!(parser.parse("companies").is_err(), "irregular plurals must be declared");
    let plan = parser.parse("COMPANYS").unwrap();
    assert_eq!(plan.origins[0].type_id, 2);
}

#[test]
fn mixed_case_is_not_a_variant() {
    let parser = setup();
    assert!(parser.parse("pErSoN").is_err());
}

#[test]
fn type_without_properties() {
    let parser = setup();
    let plan = parser.parse("Things").unwrap();
    assert_eq!(plan.origins[0].alias, "n3_0");
    assert!(parser.parse("Thing with the name Bob").is_err());
}

#[test]
fn whitespace_is_normalized() {
    let parser = setup();
    let plan = parser.parse("  \tPeople \n").unwrap();
    assert_eq!(plan.origins[0].type_id, 1);
    let spaced = parser.parse("People   with the\tname  Alice").unwrap();
    let plain = parser.parse("People with the name Alice").unwrap();
    assert_eq!(spaced, plain);
}

#[test]
fn empty_query_gives_empty_plan() {
    let parser = setup();
    assert!(parser.parse("").unwrap().is_empty());
    assert!(parser.parse(" \n\t ").unwrap().is_empty());
}

#[test]
fn aliases_count_per_type() {
    let parser = setup();
    let plan = parser
        .parse("Person that works at the Company")
        .unwrap();
    let aliases: Vec<_> = plan.origins.iter().map(|o| o.alias.as_str()).collect();
    assert_eq!(aliases, vec!["n1_0", "r1_0", "n2_0"]);
    let plan = parser.parse("Person or Person or Person").unwrap();
    let aliases: Vec<_> = plan.origins.iter().map(|o| o.alias.as_str()).collect();
    assert_eq!(aliases, vec!["n1_0", "n1_1", "n1_2"]);
}

#[test]
fn every_parse_starts_from_zero() {
    let parser = setup();
    let first = parser.parse("Person or Person").unwrap();
    let second = parser.parse("Person or Person").unwrap();
    assert_eq!(first, second);

    let mut context = ParseContext::new();
    let first = parser.parse_with("Person or Person", &mut context).unwrap();
    let second = parser.parse_with("Person", &mut context).unwrap();
    assert_eq!(first.origins[1].alias, "n1_1");
    assert_eq!(second.origins[0].alias, "n1_0", "parse_with resets the context");
}

#[test]
fn plan_serializes_for_the_executor() {
    let parser = setup();
    let json = parser.parse("Person").unwrap().to_json();
    assert_eq!(
        json,
        serde_json::json!({
            "conditions": [],
            "origins": [{"type_id": 1, "type": "node", "alias": "n1_0"}],
            "patterns": [],
            "results": [{"alias": "n1_0", "properties": null}]
        })
    );
}
