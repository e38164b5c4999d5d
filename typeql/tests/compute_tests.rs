// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! The compute method/condition/algorithm/argument matrix, exercised through
//! both the parser and the builder.

#[path = "testutils/mod.rs"]
mod testutils;

use testutils::assert_print_equivalence;
use typeql::{
    compute, parse, ArgumentValue, ComputeAlgorithm, ComputeArgument, ComputeMethod, ComputeParam,
    ComputeReason, Label, Query, TypeQLError,
};

fn labels(names: &[&str]) -> Vec<Label> {
    names.iter().map(|name| Label::new(*name)).collect()
}

#[test]
fn count_round_trips() {
    assert_print_equivalence("compute count;");
    assert_print_equivalence("compute count in [movie, person];");
}

#[test]
fn count_in_one_type_prints_bare() {
    assert_print_equivalence("compute count in movie;");
}

#[test]
fn cluster_with_connected_component() {
    assert_print_equivalence("compute cluster in [movie, person], using connected-component;");
}

#[test]
fn cluster_with_size_argument() {
    let parsed = parse("compute cluster in [movie, person], using connected-component, where [size = 10];")
        .unwrap();
    let expected = compute()
        .cluster()
        .in_(labels(&["movie", "person"]))
        .using(ComputeAlgorithm::ConnectedComponent)
        .unwrap()
        .where_(vec![ComputeArgument::size(10)])
        .unwrap();

    assert_eq!(Query::Compute(expected), parsed);
}

#[test]
fn repeated_size_argument_keeps_the_last() {
    let parsed = parse(
        "compute cluster in [movie, person], using connected-component, where [size = 10, size = 15];",
    )
    .unwrap();
    let expected = compute()
        .cluster()
        .in_(labels(&["movie", "person"]))
        .using(ComputeAlgorithm::ConnectedComponent)
        .unwrap()
        .where_(vec![ComputeArgument::size(10), ComputeArgument::size(15)])
        .unwrap();

    assert_eq!(Query::Compute(expected.clone()), parsed);
    assert_eq!(expected.arguments, vec![ComputeArgument::size(15)]);
}

#[test]
fn cluster_with_k_core() {
    assert_print_equivalence("compute cluster in [movie, person], using k-core;");
}

#[test]
fn repeated_k_argument_keeps_the_last() {
    let parsed =
        parse("compute cluster in [movie, person], using k-core, where [k = 5, k = 10];").unwrap();
    let expected = compute()
        .cluster()
        .in_(labels(&["movie", "person"]))
        .using(ComputeAlgorithm::KCore)
        .unwrap()
        .where_(vec![ComputeArgument::k(10)])
        .unwrap();

    assert_eq!(Query::Compute(expected), parsed);
}

#[test]
fn omitting_using_defaults_to_connected_component() {
    let parsed = parse("compute cluster in [movie, person];")
        .unwrap()
        .into_compute()
        .unwrap();
    assert_eq!(parsed.algorithm, None);
    assert_eq!(
        parsed.effective_algorithm(),
        Some(ComputeAlgorithm::ConnectedComponent)
    );
    assert!(parsed.arguments.is_empty());
}

#[test]
fn k_core_supplies_default_arguments() {
    let cluster = parse("compute cluster using k-core;")
        .unwrap()
        .into_compute()
        .unwrap();
    assert_eq!(cluster.argument(ComputeParam::K), Some(ArgumentValue::Long(2)));

    let centrality = parse("compute centrality using k-core;")
        .unwrap()
        .into_compute()
        .unwrap();
    assert_eq!(
        centrality.argument(ComputeParam::MinK),
        Some(ArgumentValue::Long(2))
    );
    assert_eq!(centrality.argument(ComputeParam::Size), None);
}

#[test]
fn centrality_with_degree() {
    assert_print_equivalence("compute centrality in movie, using degree;");
}

#[test]
fn centrality_with_min_k() {
    assert_print_equivalence("compute centrality in movie, using k-core, where min-k=3;");
}

#[test]
fn statistics_round_trip() {
    assert_print_equivalence("compute max of person, in movie;");
    assert_print_equivalence("compute mean of person, in movie;");
    assert_print_equivalence("compute median of person, in movie;");
    assert_print_equivalence("compute min of movie, in person;");
    assert_print_equivalence("compute std of movie;");
    assert_print_equivalence("compute sum of movie, in person;");
}

#[test]
fn path_round_trip() {
    assert_print_equivalence("compute path from V1, to V2, in person;");
    assert_print_equivalence("compute path from V1, to V2, in [person, marriage];");
}

#[test]
fn statistics_without_of_are_rejected() {
    let err = parse("compute max in movie;").unwrap_err();
    assert!(matches!(
        err,
        TypeQLError::InvalidCompute {
            method: ComputeMethod::Max,
            reason: ComputeReason::MissingCondition { .. },
        }
    ));
}

#[test]
fn path_without_both_endpoints_is_rejected() {
    let err = parse("compute path from V1;").unwrap_err();
    match err {
        TypeQLError::InvalidCompute {
            method: ComputeMethod::Path,
            reason: ComputeReason::MissingCondition { required },
        } => {
            assert_eq!(required.len(), 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn cluster_rejects_degree() {
    let err = parse("compute cluster in movie, using degree;").unwrap_err();
    assert!(matches!(
        err,
        TypeQLError::InvalidCompute {
            method: ComputeMethod::Cluster,
            reason: ComputeReason::InvalidAlgorithm { .. },
        }
    ));
}

#[test]
fn cluster_rejects_k_under_connected_component() {
    let err = parse("compute cluster in movie, where k = 10;").unwrap_err();
    assert!(matches!(
        err,
        TypeQLError::InvalidCompute {
            method: ComputeMethod::Cluster,
            reason: ComputeReason::InvalidArgument {
                param: ComputeParam::K,
                ..
            },
        }
    ));
}

#[test]
fn count_rejects_of() {
    let err = parse("compute count of movie;").unwrap_err();
    assert!(matches!(
        err,
        TypeQLError::InvalidCompute {
            method: ComputeMethod::Count,
            reason: ComputeReason::InvalidCondition { .. },
        }
    ));
}

#[test]
fn statistics_reject_from() {
    let err = parse("compute max of person, from V1;").unwrap_err();
    assert!(matches!(
        err,
        TypeQLError::InvalidCompute {
            method: ComputeMethod::Max,
            ..
        }
    ));
}

#[test]
fn unknown_method_is_unrecognised() {
    let err = parse("compute hello;").unwrap_err();
    assert_eq!(
        err,
        TypeQLError::UnrecognisedToken {
            token: "hello".to_owned(),
            context: "compute method",
        }
    );
}

#[test]
fn unknown_algorithm_is_unrecognised() {
    let err = parse("compute cluster using page-rank;").unwrap_err();
    assert_eq!(
        err,
        TypeQLError::UnrecognisedToken {
            token: "page-rank".to_owned(),
            context: "compute algorithm",
        }
    );
}

#[test]
fn unknown_argument_is_unrecognised() {
    let err = parse("compute cluster using k-core, where depth = 3;").unwrap_err();
    assert_eq!(
        err,
        TypeQLError::UnrecognisedToken {
            token: "depth".to_owned(),
            context: "compute argument",
        }
    );
}

#[test]
fn builder_where_before_using_follows_the_effective_algorithm() {
    // under the default connected-component algorithm, `size` is accepted
    let query = compute()
        .cluster()
        .where_(vec![ComputeArgument::size(5)])
        .unwrap()
        .validated()
        .unwrap();
    assert_eq!(query.arguments.len(), 1);

    // but `k` belongs to k-core only
    let err = compute()
        .cluster()
        .where_(vec![ComputeArgument::k(5)])
        .unwrap_err();
    assert!(matches!(
        err,
        TypeQLError::InvalidCompute {
            reason: ComputeReason::InvalidArgument { .. },
            ..
        }
    ));
}

#[test]
fn contains_argument_takes_a_concept_id() {
    let parsed = parse("compute cluster in movie, where contains = V123;")
        .unwrap()
        .into_compute()
        .unwrap();
    assert_eq!(
        parsed.argument(ComputeParam::Contains),
        Some(ArgumentValue::Id("V123".to_owned()))
    );
}

#[test]
fn builder_and_parser_agree_on_full_cluster_query() {
    let text = "compute cluster in [movie, person], using k-core, where k=10;";
    let built = compute()
        .cluster()
        .in_(labels(&["movie", "person"]))
        .using(ComputeAlgorithm::KCore)
        .unwrap()
        .where_(vec![ComputeArgument::k(10)])
        .unwrap()
        .validated()
        .unwrap();
    assert_eq!(text, Query::Compute(built.clone()).to_string());
    assert_eq!(Query::Compute(built), parse(text).unwrap());
}
