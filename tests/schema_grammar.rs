use sylva_query::grammar::Grammar;
use sylva_query::parser::QueryParser;
use sylva_query::schema::{NodeType, RelationshipType, Schema, TypeKind};
use sylva_query::QueryError;

fn social() -> Schema {
    Schema::new()
        .with_node_type(NodeType::new(1, "Person").plural("People").property("name"))
        .with_node_type(NodeType::new(2, "Company").property("name"))
        .with_relationship_type(RelationshipType::new(1, "works at", 1, 2))
}

fn inconsistency(schema: &Schema) -> String {
    match Grammar::assemble(schema) {
        Err(QueryError::SchemaInconsistency(message)) => message,
        Err(other) => panic!("expected a schema inconsistency, got {other}"),
        Ok(_) => panic!("schema should have been rejected"),
    }
}

#[test]
fn schema_from_json() {
    let schema = Schema::from_json(
        r#"{
            "node_types": [
                {"id": 1, "name": "Person", "plural_name": "People", "properties": [{"key": "name"}]},
                {"id": 2, "name": "Company", "properties": [{"key": "name"}]}
            ],
            "relationship_types": [{"id": 1, "name": "works at", "source": 1, "target": 2}]
        }"#,
    )
    .unwrap();
    assert_eq!(schema, social());
    assert_eq!(schema.node_type(2).map(|t| t.name.as_str()), Some("Company"));
    assert!(schema.relationship_type(2).is_none());
}

#[test]
fn malformed_json_is_a_json_error() {
    assert!(matches!(
        Schema::from_json("{\"node_types\": [{\"id\": \"one\"}]}"),
        Err(QueryError::Json(_))
    ));
}

#[test]
fn rejects_empty_names() {
    let schema = Schema::new().with_node_type(NodeType::new(1, " "));
    assert!(inconsistency(&schema).contains("empty"));
    let schema = Schema::new().with_node_type(NodeType::new(1, "Person").property(""));
    assert!(inconsistency(&schema).contains("property key"));
}

#[test]
fn rejects_unnormalized_whitespace() {
    let schema = Schema::new().with_node_type(NodeType::new(1, "Account  Holder"));
    assert!(inconsistency(&schema).contains("whitespace"));
}

#[test]
fn rejects_duplicates() {
    let schema = Schema::new()
        .with_node_type(NodeType::new(1, "Person"))
        .with_node_type(NodeType::new(1, "Company"));
    assert!(inconsistency(&schema).contains("more than once"));
    let schema =
        Schema::new().with_node_type(NodeType::new(1, "Person").property("name").property("name"));
    assert!(inconsistency(&schema).contains("more than once"));
}

#[test]
fn rejects_unknown_endpoints() {
    let schema = social().with_relationship_type(RelationshipType::new(2, "owns", 1, 7));
    assert!(inconsistency(&schema).contains("unknown node type id 7"));
}

#[test]
fn same_id_for_node_and_relationship_is_fine() {
    let grammar = Grammar::assemble(&social()).unwrap();
    assert_eq!(grammar.rule(TypeKind::Node, 1).unwrap().name(), "Person");
    assert_eq!(grammar.rule(TypeKind::Relationship, 1).unwrap().name(), "works at");
    assert!(grammar.rule(TypeKind::Node, 99).is_none());
}

#[test]
fn parsed_types_resolve_by_kind_and_id() {
    let parser = QueryParser::new(&social()).unwrap();
    let plan = parser.parse("Person that works at the Company").unwrap();
    let origins: Vec<_> = plan.origins.iter().map(|o| (o.kind, o.type_id)).collect();
    assert_eq!(
        origins,
        vec![
            (TypeKind::Node, 1),
            (TypeKind::Relationship, 1),
            (TypeKind::Node, 2),
        ]
    );
    assert_eq!(plan.patterns[0].relation.alias, "r1_0");
}

#[test]
fn rules_follow_declaration_order() {
    let grammar = Grammar::assemble(&social()).unwrap();
    let names: Vec<_> = grammar.node_rules().iter().map(|r| r.rule_name()).collect();
    assert_eq!(names, vec!["n1", "n2"]);
    assert_eq!(grammar.rules(TypeKind::Relationship)[0].rule_name(), "r1");
}

#[test]
fn describe_lists_every_rule() {
    let text = Grammar::assemble(&social()).unwrap().describe();
    for expected in [
        "n1 = ",
        "n2_property0 = ",
        "r1_facet = ",
        "n_types = n1_facet | n2_facet",
        "r_types = r1_facet",
        "dict = ",
        "\"istartswith\"",
    ] {
        assert!(text.contains(expected), "missing {expected:?} in\n{text}");
    }
}

#[test]
fn empty_schema_assembles() {
    let grammar = Grammar::assemble(&Schema::new()).unwrap();
    assert!(grammar.node_rules().is_empty());
    assert!(grammar.describe().contains("n_types = ~anything"));
}

#[test]
fn ambiguous_names_go_to_the_first_type() {
    let schema = Schema::new()
        .with_node_type(NodeType::new(1, "Person").property("name"))
        .with_node_type(NodeType::new(2, "person").property("nickname"));
    let grammar = Grammar::assemble(&schema).unwrap();
    let ambiguity = grammar
        .ambiguities()
        .into_iter()
        .find(|a| a.variant == "Person")
        .unwrap();
    assert_eq!(ambiguity.type_ids, vec![1, 2]);
    assert_eq!(ambiguity.kind, TypeKind::Node);

    let parser = QueryParser::new(&schema).unwrap();
    assert_eq!(parser.parse("Person").unwrap().origins[0].type_id, 1);
    // the second type still wins where it consumes more
    let plan = parser.parse("person with the nickname Al").unwrap();
    assert_eq!(plan.origins[0].type_id, 2);
}

#[test]
fn longer_type_names_win() {
    let schema = Schema::new()
        .with_node_type(NodeType::new(1, "Account"))
        .with_node_type(NodeType::new(2, "Account Holder"));
    let parser = QueryParser::new(&schema).unwrap();
    assert_eq!(parser.parse("Account Holder").unwrap().origins[0].type_id, 2);
    assert_eq!(parser.parse("accounts").unwrap().origins[0].type_id, 1);
    assert!(Grammar::assemble(&schema).unwrap().ambiguities().is_empty());
}
