// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Builder-level validation and AST value semantics: variant narrowing,
//! scope checks at composition points, immutable value equality, and the
//! serde representation.

use chrono::NaiveDate;
use typeql::{
    match_, or, parse, var, AggregateMethod, Query, TypeQLError, Value, Variable,
};

#[test]
fn builder_output_is_indistinguishable_from_parsing() {
    let built: Query = match_([var("x").isa("movie").has("title", var("t")).into()])
        .get_vars(["t"])
        .unwrap()
        .into();
    let parsed = parse("match $x isa movie, has title $t; get $t;").unwrap();
    assert_eq!(built, parsed);
    assert_eq!(built.to_string(), parsed.to_string());
}

#[test]
fn constraint_order_does_not_affect_equality() {
    let has_first = match_([var("x").has("name", "Pichu").isa("pokemon").into()])
        .get()
        .unwrap();
    let isa_first = match_([var("x").isa("pokemon").has("name", "Pichu").into()])
        .get()
        .unwrap();
    assert_eq!(has_first, isa_first);
}

#[test]
fn narrowing_to_the_wrong_variant_reports_invalid_casting() {
    let query = parse("match $x isa movie; get;").unwrap();
    let err = query.into_insert().unwrap_err();
    assert_eq!(
        err,
        TypeQLError::InvalidCasting {
            from: "get query",
            to: "insert query",
        }
    );
}

#[test]
fn narrowing_to_the_right_variant_succeeds() {
    let query = parse("match $x isa movie; get;").unwrap();
    assert!(query.is_get());
    assert!(query.into_get().is_ok());
}

#[test]
fn filter_variable_must_be_bound_in_match() {
    let err = match_([var("x").isa("movie").into()])
        .get_vars(["y"])
        .unwrap_err();
    assert_eq!(
        err,
        TypeQLError::OutOfScopeVariable {
            variable: "$y".to_owned(),
        }
    );
}

#[test]
fn filter_deduplicates_preserving_order() {
    let get = match_([var("x").isa("movie").has("title", var("t")).into()])
        .get_vars(["t", "x", "t"])
        .unwrap();
    assert_eq!(
        get.filter,
        vec![Variable::named_concept("t"), Variable::named_concept("x")]
    );
}

#[test]
fn sort_variable_must_be_retrieved() {
    let err = match_([var("x").isa("movie").has("rating", var("r")).into()])
        .get_vars(["x"])
        .unwrap()
        .sort(Variable::named_concept("r"), None)
        .unwrap_err();
    assert_eq!(
        err,
        TypeQLError::OutOfScopeVariable {
            variable: "$r".to_owned(),
        }
    );
}

#[test]
fn aggregate_requires_a_variable_except_count() {
    let get = match_([var("x").isa("movie").into()]).get().unwrap();
    let err = get.clone().aggregate(AggregateMethod::Max, None).unwrap_err();
    assert_eq!(
        err,
        TypeQLError::MissingAggregateVariable {
            method: AggregateMethod::Max,
        }
    );
    assert!(get.aggregate(AggregateMethod::Count, None).is_ok());
}

#[test]
fn aggregate_variable_must_be_in_scope() {
    let get = match_([var("x").isa("movie").into()]).get().unwrap();
    let err = get.max(Variable::named_concept("z")).unwrap_err();
    assert_eq!(
        err,
        TypeQLError::OutOfScopeVariable {
            variable: "$z".to_owned(),
        }
    );
}

#[test]
fn conflicting_isa_constraints_are_rejected_at_assembly() {
    let err = match_([var("x").isa("movie").isa("person").into()])
        .get()
        .unwrap_err();
    assert_eq!(
        err,
        TypeQLError::RepeatedConstraint {
            head: "$x".to_owned(),
            constraint: "isa",
        }
    );
}

#[test]
fn identical_constraints_deduplicate_silently() {
    let get = match_([var("x").isa("movie").isa("movie").into()])
        .get()
        .unwrap();
    assert_eq!(get.match_clause.statements()[0].constraints().len(), 1);
}

#[test]
fn disjunction_requires_two_branches() {
    let err = or([var("x").isa("movie").into()]).unwrap_err();
    assert_eq!(err, TypeQLError::MissingDisjunctionBranches);
}

#[test]
fn sub_millisecond_datetimes_are_rejected_by_the_value_constructor() {
    let datetime = NaiveDate::from_ymd_opt(1000, 11, 12)
        .unwrap()
        .and_hms_nano_opt(13, 14, 15, 123_450_000)
        .unwrap();
    let err = Value::datetime(datetime).unwrap_err();
    assert!(matches!(err, TypeQLError::InvalidDateTimeNanos { .. }));
}

#[test]
fn millisecond_datetimes_are_accepted() {
    let datetime = NaiveDate::from_ymd_opt(1000, 11, 12)
        .unwrap()
        .and_hms_milli_opt(13, 14, 15, 123)
        .unwrap();
    assert!(Value::datetime(datetime).is_ok());
}

#[test]
fn named_concept_and_value_variables_differ() {
    let concept = match_([var("x").eq(var("y")).into()]).get().unwrap();
    let value = match_([var("x").eq(typeql::val_var("y")).into()]).get().unwrap();
    assert_ne!(concept, value);
}

#[test]
fn anonymous_variables_compare_structurally() {
    let first = parse("insert $_ isa movie;").unwrap();
    let second = parse("insert $_ isa movie;").unwrap();
    assert_eq!(first, second);
}

#[test]
fn queries_serialize_through_serde() {
    let queries = [
        "match $x isa movie, has title $t; get $t;",
        "define all-movies-are-drama sub rule, when { $x isa movie; }, then { $x has genre \"drama\"; };",
        "compute cluster in [movie, person], using k-core, where k=10;",
    ];
    for text in queries {
        let parsed = parse(text).unwrap();
        let json = serde_json::to_string(&parsed).unwrap();
        let decoded: Query = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, decoded);
    }
}

#[test]
fn insert_requires_at_least_one_statement() {
    let err = typeql::insert([]).unwrap_err();
    assert_eq!(err, TypeQLError::MissingStatements);
}

#[test]
fn empty_in_condition_equals_no_condition() {
    let bare = typeql::compute().count();
    let scoped = typeql::compute().count().in_(Vec::new());
    assert_eq!(bare, scoped);
}

#[test]
fn insert_rejects_type_statements() {
    use typeql::{type_, Statement};
    let err = typeql::insert([Statement::Type(type_("person").sub("entity"))]).unwrap_err();
    assert_eq!(err, TypeQLError::IllegalTypeStatement);
}

#[test]
fn library_constants_are_exposed() {
    assert_eq!(typeql::CRATE_NAME, "typeql");
    assert!(!typeql::VERSION.is_empty());
}
