// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Structural validation of constructed ASTs: statement constraint
//! compatibility, rule well-formedness, `get` filter scoping, and the
//! compute method/algorithm/argument matrix.
//!
//! The compute matrix is data, not code: the validator consults a static
//! table, so admitting a new method or algorithm is a table change.

use std::collections::HashMap;

use log::debug;
use once_cell::sync::Lazy;

use crate::ast::{
    ComputeQuery, Conjunction, GetQuery, HasAttribute, MatchClause, Negation, Pattern, Statement,
    TypeStatement, Variable,
};
use crate::ast::Constraint;
use crate::error::{ComputeReason, RuleReason, TypeQLError};
use crate::token::{
    AggregateMethod, ComputeAlgorithm, ComputeCondition, ComputeMethod, ComputeParam,
};

// STATEMENT CONSTRAINT COMPATIBILITY =======================================

/// Constraint kinds that may appear at most once on a statement.
fn exclusive_kind(constraint: &Constraint) -> Option<&'static str> {
    match constraint {
        Constraint::Isa { .. } => Some("isa"),
        Constraint::Sub { .. } => Some("sub"),
        Constraint::ValueType(_) => Some("value"),
        Constraint::Regex(_) => Some("regex"),
        Constraint::Id(_) => Some("id"),
        _ => None,
    }
}

fn validate_constraint_list(head: &Variable, constraints: &[Constraint]) -> Result<(), TypeQLError> {
    let mut seen: Vec<&'static str> = Vec::new();
    for constraint in constraints {
        if let Some(kind) = exclusive_kind(constraint) {
            if seen.contains(&kind) {
                return Err(TypeQLError::RepeatedConstraint {
                    head: head.to_string(),
                    constraint: kind,
                });
            }
            seen.push(kind);
        }
    }
    Ok(())
}

pub(crate) fn validate_statement(statement: &Statement) -> Result<(), TypeQLError> {
    validate_constraint_list(statement.head(), statement.constraints())
}

/// Validates every statement reachable from a match block.
pub(crate) fn validate_match(clause: &MatchClause) -> Result<(), TypeQLError> {
    for statement in clause.statements() {
        validate_statement(statement)?;
    }
    Ok(())
}

/// `insert` and `delete` bodies accept one or more instance statements.
pub(crate) fn validate_instance_statements(statements: &[Statement]) -> Result<(), TypeQLError> {
    if statements.is_empty() {
        return Err(TypeQLError::MissingStatements);
    }
    for statement in statements {
        if statement.is_type() {
            return Err(TypeQLError::IllegalTypeStatement);
        }
        validate_statement(statement)?;
    }
    Ok(())
}

/// Validates the type statements of a `define`/`undefine`, running the rule
/// checks on any statement that carries a `when` or `then` body.
pub(crate) fn validate_definables(statements: &[TypeStatement]) -> Result<(), TypeQLError> {
    if statements.is_empty() {
        return Err(TypeQLError::MissingStatements);
    }
    for statement in statements {
        validate_constraint_list(&statement.head, &statement.constraints)?;
        if statement.when().is_some() || statement.then().is_some() {
            let label = rule_label(statement);
            validate_rule(&label, statement)?;
        }
    }
    Ok(())
}

fn rule_label(statement: &TypeStatement) -> String {
    match &statement.head {
        Variable::Label(label) => label.name.clone(),
        other => other.to_string(),
    }
}

// RULE VALIDATION ==========================================================

fn invalid_rule(label: &str, reason: RuleReason) -> TypeQLError {
    TypeQLError::InvalidRule {
        label: label.to_owned(),
        reason,
    }
}

/// Negations at the top of a pattern, not descending into negated bodies.
fn find_negations<'a>(pattern: &'a Pattern, out: &mut Vec<&'a Negation>) {
    match pattern {
        Pattern::Negation(negation) => out.push(negation),
        Pattern::Statement(_) => {}
        Pattern::Conjunction(conjunction) => {
            for inner in &conjunction.patterns {
                find_negations(inner, out);
            }
        }
        Pattern::Disjunction(disjunction) => {
            for inner in &disjunction.patterns {
                find_negations(inner, out);
            }
        }
    }
}

fn when_named_variables(when: &Conjunction) -> Vec<&Variable> {
    let mut vars: Vec<&Variable> = Vec::new();
    for pattern in &when.patterns {
        for var in pattern.named_variables() {
            if !vars.contains(&var) {
                vars.push(var);
            }
        }
    }
    vars
}

/// Runs the full rule well-formedness check described by the language
/// reference: a non-empty `when` with no nested negation, and a `then` that
/// is a single inferable statement bound by the `when`.
pub(crate) fn validate_rule(label: &str, statement: &TypeStatement) -> Result<(), TypeQLError> {
    debug!("validating rule '{}'", label);

    let then = match statement.then() {
        Some(then) => then,
        None => return Err(invalid_rule(label, RuleReason::BadThenShape)),
    };
    let when = match statement.when() {
        Some(when) => when,
        None => return Err(invalid_rule(label, RuleReason::MissingWhen)),
    };
    if when.patterns.is_empty() {
        return Err(invalid_rule(label, RuleReason::MissingWhen));
    }

    let mut negations = Vec::new();
    for pattern in &when.patterns {
        find_negations(pattern, &mut negations);
    }
    for negation in negations {
        let mut nested = Vec::new();
        find_negations(&negation.pattern, &mut nested);
        if !nested.is_empty() {
            return Err(invalid_rule(label, RuleReason::NestedNegation));
        }
    }

    if then.is_type() {
        return Err(invalid_rule(label, RuleReason::BadThenShape));
    }

    let constraints = then.constraints();
    let has_list = then.has_constraints();
    let relation = then.relation();
    let isa = then.isa();

    let single_has = constraints.len() == 1 && has_list.len() == 1;
    let isa_relation = constraints.len() == 2 && relation.is_some() && isa.is_some();
    if !single_has && !isa_relation {
        return Err(invalid_rule(label, RuleReason::BadThenShape));
    }

    if single_has {
        let has = has_list[0];
        if has.attribute_type.is_some() {
            let names_concept_var = match &has.attribute {
                HasAttribute::Variable(var) => var.is_named_concept(),
                HasAttribute::Statement(attribute) => attribute.head.is_named_concept(),
            };
            if names_concept_var {
                return Err(invalid_rule(label, RuleReason::ThenHasVariableShape));
            }
        }
    }

    let bound = when_named_variables(when);
    for var in then.variables() {
        if var.is_named() && !bound.contains(&var) {
            return Err(invalid_rule(label, RuleReason::ThenUnboundVariable));
        }
    }

    if let Some(relation) = relation {
        if relation
            .role_players
            .iter()
            .any(|role_player| role_player.role_type.is_none())
        {
            return Err(invalid_rule(label, RuleReason::ThenImplicitRole));
        }
        if then.head().is_named() {
            return Err(invalid_rule(label, RuleReason::ThenNamedRelation));
        }
    }

    Ok(())
}

// GET / AGGREGATE SCOPING ==================================================

/// A non-empty filter must retrieve named concept variables bound in the
/// match block.
pub(crate) fn validate_filter(
    clause: &MatchClause,
    filter: &[Variable],
) -> Result<(), TypeQLError> {
    let bound = clause.named_concept_variables();
    for var in filter {
        if !var.is_named_concept() || !bound.contains(&var) {
            return Err(TypeQLError::OutOfScopeVariable {
                variable: var.to_string(),
            });
        }
    }
    Ok(())
}

pub(crate) fn validate_sort(get: &GetQuery, variable: &Variable) -> Result<(), TypeQLError> {
    if !get.scope_variables().contains(&variable) {
        return Err(TypeQLError::OutOfScopeVariable {
            variable: variable.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn validate_group(get: &GetQuery, variable: &Variable) -> Result<(), TypeQLError> {
    validate_sort(get, variable)
}

pub(crate) fn validate_aggregate(
    get: &GetQuery,
    method: AggregateMethod,
    variable: Option<&Variable>,
) -> Result<(), TypeQLError> {
    match variable {
        None if method != AggregateMethod::Count => {
            Err(TypeQLError::MissingAggregateVariable { method })
        }
        None => Ok(()),
        Some(var) => validate_sort(get, var),
    }
}

// COMPUTE MATRIX ===========================================================

struct ComputeSpec {
    required: &'static [ComputeCondition],
    accepts_from_to: bool,
    accepts_of: bool,
    algorithms: &'static [ComputeAlgorithm],
    default_algorithm: Option<ComputeAlgorithm>,
    arguments: &'static [(ComputeAlgorithm, &'static [ComputeParam])],
    argument_defaults: &'static [(ComputeAlgorithm, &'static [(ComputeParam, i64)])],
}

const STATISTIC_SPEC: ComputeSpec = ComputeSpec {
    required: &[ComputeCondition::Of],
    accepts_from_to: false,
    accepts_of: true,
    algorithms: &[],
    default_algorithm: None,
    arguments: &[],
    argument_defaults: &[],
};

static COMPUTE_MATRIX: Lazy<HashMap<ComputeMethod, ComputeSpec>> = Lazy::new(|| {
    let mut matrix = HashMap::new();
    matrix.insert(
        ComputeMethod::Count,
        ComputeSpec {
            required: &[],
            accepts_from_to: false,
            accepts_of: false,
            algorithms: &[],
            default_algorithm: None,
            arguments: &[],
            argument_defaults: &[],
        },
    );
    for method in [
        ComputeMethod::Max,
        ComputeMethod::Min,
        ComputeMethod::Mean,
        ComputeMethod::Median,
        ComputeMethod::Sum,
        ComputeMethod::Std,
    ] {
        matrix.insert(method, STATISTIC_SPEC);
    }
    matrix.insert(
        ComputeMethod::Path,
        ComputeSpec {
            required: &[ComputeCondition::From, ComputeCondition::To],
            accepts_from_to: true,
            accepts_of: false,
            algorithms: &[],
            default_algorithm: None,
            arguments: &[],
            argument_defaults: &[],
        },
    );
    matrix.insert(
        ComputeMethod::Centrality,
        ComputeSpec {
            required: &[],
            accepts_from_to: false,
            accepts_of: true,
            algorithms: &[ComputeAlgorithm::Degree, ComputeAlgorithm::KCore],
            default_algorithm: Some(ComputeAlgorithm::Degree),
            arguments: &[(ComputeAlgorithm::KCore, &[ComputeParam::MinK])],
            argument_defaults: &[(ComputeAlgorithm::KCore, &[(ComputeParam::MinK, 2)])],
        },
    );
    matrix.insert(
        ComputeMethod::Cluster,
        ComputeSpec {
            required: &[],
            accepts_from_to: false,
            accepts_of: false,
            algorithms: &[
                ComputeAlgorithm::ConnectedComponent,
                ComputeAlgorithm::KCore,
            ],
            default_algorithm: Some(ComputeAlgorithm::ConnectedComponent),
            arguments: &[
                (ComputeAlgorithm::KCore, &[ComputeParam::K]),
                (
                    ComputeAlgorithm::ConnectedComponent,
                    &[ComputeParam::Size, ComputeParam::Contains],
                ),
            ],
            argument_defaults: &[(ComputeAlgorithm::KCore, &[(ComputeParam::K, 2)])],
        },
    );
    matrix
});

fn spec(method: ComputeMethod) -> &'static ComputeSpec {
    COMPUTE_MATRIX
        .get(&method)
        .unwrap_or_else(|| unreachable!("every compute method has a matrix row"))
}

fn invalid_compute(method: ComputeMethod, reason: ComputeReason) -> TypeQLError {
    TypeQLError::InvalidCompute { method, reason }
}

pub(crate) fn default_algorithm(method: ComputeMethod) -> Option<ComputeAlgorithm> {
    spec(method).default_algorithm
}

fn accepted_params(method: ComputeMethod, algorithm: ComputeAlgorithm) -> &'static [ComputeParam] {
    spec(method)
        .arguments
        .iter()
        .find(|(candidate, _)| *candidate == algorithm)
        .map(|(_, params)| *params)
        .unwrap_or(&[])
}

pub(crate) fn default_argument(
    method: ComputeMethod,
    algorithm: ComputeAlgorithm,
    param: ComputeParam,
) -> Option<i64> {
    spec(method)
        .argument_defaults
        .iter()
        .find(|(candidate, _)| *candidate == algorithm)
        .and_then(|(_, defaults)| {
            defaults
                .iter()
                .find(|(candidate, _)| *candidate == param)
                .map(|(_, value)| *value)
        })
}

pub(crate) fn validate_compute_algorithm(
    method: ComputeMethod,
    algorithm: ComputeAlgorithm,
) -> Result<(), TypeQLError> {
    let allowed = spec(method).algorithms;
    if !allowed.contains(&algorithm) {
        return Err(invalid_compute(
            method,
            ComputeReason::InvalidAlgorithm {
                allowed: allowed.to_vec(),
            },
        ));
    }
    Ok(())
}

pub(crate) fn validate_compute_argument(
    method: ComputeMethod,
    algorithm: Option<ComputeAlgorithm>,
    param: ComputeParam,
) -> Result<(), TypeQLError> {
    let allowed = algorithm
        .map(|algorithm| accepted_params(method, algorithm))
        .unwrap_or(&[]);
    if !allowed.contains(&param) {
        return Err(invalid_compute(
            method,
            ComputeReason::InvalidArgument {
                param,
                allowed: allowed.to_vec(),
            },
        ));
    }
    Ok(())
}

/// The full matrix check run when a compute query is assembled.
pub(crate) fn validate_compute(query: &ComputeQuery) -> Result<(), TypeQLError> {
    let method = query.method;
    let spec = spec(method);
    debug!("validating compute {} query", method);

    if (query.from_id.is_some() || query.to_id.is_some()) && !spec.accepts_from_to {
        let condition = if query.from_id.is_some() {
            ComputeCondition::From
        } else {
            ComputeCondition::To
        };
        return Err(invalid_compute(
            method,
            ComputeReason::InvalidCondition { condition },
        ));
    }
    if query.of_types.is_some() && !spec.accepts_of {
        return Err(invalid_compute(
            method,
            ComputeReason::InvalidCondition {
                condition: ComputeCondition::Of,
            },
        ));
    }

    if let Some(algorithm) = query.algorithm {
        validate_compute_algorithm(method, algorithm)?;
    }
    for argument in &query.arguments {
        validate_compute_argument(method, query.effective_algorithm(), argument.param)?;
    }

    let missing = spec.required.iter().any(|condition| match condition {
        ComputeCondition::Of => query.of_types.is_none(),
        ComputeCondition::From => query.from_id.is_none(),
        ComputeCondition::To => query.to_id.is_none(),
        _ => false,
    });
    if missing {
        return Err(invalid_compute(
            method,
            ComputeReason::MissingCondition {
                required: spec.required.to_vec(),
            },
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ComputeArgument;

    #[test]
    fn count_accepts_no_algorithm() {
        let err = validate_compute_algorithm(ComputeMethod::Count, ComputeAlgorithm::Degree)
            .unwrap_err();
        assert!(matches!(
            err,
            TypeQLError::InvalidCompute {
                reason: ComputeReason::InvalidAlgorithm { .. },
                ..
            }
        ));
    }

    #[test]
    fn cluster_defaults_to_connected_component() {
        assert_eq!(
            default_algorithm(ComputeMethod::Cluster),
            Some(ComputeAlgorithm::ConnectedComponent)
        );
        assert_eq!(default_argument(ComputeMethod::Cluster, ComputeAlgorithm::KCore, ComputeParam::K), Some(2));
    }

    #[test]
    fn statistics_require_of() {
        let query = ComputeQuery::new(ComputeMethod::Max);
        let err = validate_compute(&query).unwrap_err();
        assert_eq!(
            err,
            TypeQLError::InvalidCompute {
                method: ComputeMethod::Max,
                reason: ComputeReason::MissingCondition {
                    required: vec![ComputeCondition::Of]
                },
            }
        );
    }

    #[test]
    fn centrality_rejects_k_under_k_core() {
        let query = ComputeQuery::new(ComputeMethod::Centrality)
            .using(ComputeAlgorithm::KCore)
            .unwrap();
        let err = query.where_(vec![ComputeArgument::k(3)]).unwrap_err();
        assert!(matches!(
            err,
            TypeQLError::InvalidCompute {
                reason: ComputeReason::InvalidArgument { .. },
                ..
            }
        ));
    }
}
