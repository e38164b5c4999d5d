// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error taxonomy for the language library. Every failure is reported
//! through [`TypeQLError`]; nothing in the library panics on bad input.

use std::fmt;

use thiserror::Error;

use crate::token::{
    AggregateMethod, ComputeAlgorithm, ComputeCondition, ComputeMethod, ComputeParam,
};

/// All errors produced by parsing, validation, and the builder API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeQLError {
    #[error("syntax error at line {line}, column {column}:\n{snippet}")]
    Syntax {
        line: usize,
        column: usize,
        snippet: String,
    },
    #[error("the query string is empty or contains only whitespace")]
    EmptyInput,
    #[error("more than one query was provided where exactly one was expected")]
    MultipleQueries,
    #[error("invalid definition of rule '{label}': {reason}")]
    InvalidRule { label: String, reason: RuleReason },
    #[error("invalid compute {method} query: {reason}")]
    InvalidCompute {
        method: ComputeMethod,
        reason: ComputeReason,
    },
    #[error("invalid casting of {from} to {to}")]
    InvalidCasting {
        from: &'static str,
        to: &'static str,
    },
    #[error("date-time '{value}' has sub-millisecond precision")]
    InvalidDateTimeNanos { value: String },
    #[error("unrecognised {context} '{token}'")]
    UnrecognisedToken {
        token: String,
        context: &'static str,
    },
    #[error("the variable '{variable}' is out of scope of the query")]
    OutOfScopeVariable { variable: String },
    #[error("the statement '{head}' declares more than one '{constraint}' constraint")]
    RepeatedConstraint {
        head: String,
        constraint: &'static str,
    },
    #[error("a disjunction requires at least two branches")]
    MissingDisjunctionBranches,
    #[error("the query requires at least one statement")]
    MissingStatements,
    #[error("aggregate method '{method}' requires a variable argument")]
    MissingAggregateVariable { method: AggregateMethod },
    #[error("expected an instance statement but found a type statement")]
    IllegalTypeStatement,
}

/// Reasons a rule definition is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleReason {
    MissingWhen,
    NestedNegation,
    BadThenShape,
    ThenHasVariableShape,
    ThenUnboundVariable,
    ThenImplicitRole,
    ThenNamedRelation,
}

impl fmt::Display for RuleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            RuleReason::MissingWhen => "the 'when' body is missing or contains no patterns",
            RuleReason::NestedNegation => {
                "the 'when' body contains a negation nested inside another negation"
            }
            RuleReason::BadThenShape => {
                "the 'then' body must be a single statement with exactly one 'has' constraint, \
                 or exactly one 'isa' and one relation constraint"
            }
            RuleReason::ThenHasVariableShape => {
                "a 'then' 'has' may not name both an attribute type and a concept variable"
            }
            RuleReason::ThenUnboundVariable => {
                "every named variable in 'then' must also appear in 'when'"
            }
            RuleReason::ThenImplicitRole => {
                "every role player in a 'then' relation must name its role type"
            }
            RuleReason::ThenNamedRelation => {
                "a relation in 'then' may not be bound to a named variable"
            }
        };
        f.write_str(message)
    }
}

/// Reasons a compute query is rejected by the method/algorithm matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputeReason {
    MissingCondition { required: Vec<ComputeCondition> },
    InvalidAlgorithm { allowed: Vec<ComputeAlgorithm> },
    InvalidArgument { param: ComputeParam, allowed: Vec<ComputeParam> },
    InvalidCondition { condition: ComputeCondition },
}

impl fmt::Display for ComputeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeReason::MissingCondition { required } => {
                write!(f, "missing required condition(s) {}", join(required))
            }
            ComputeReason::InvalidAlgorithm { allowed } => {
                write!(f, "the algorithm is not accepted; allowed: {}", join(allowed))
            }
            ComputeReason::InvalidArgument { param, allowed } => {
                write!(
                    f,
                    "argument '{}' is not accepted by the algorithm; allowed: {}",
                    param,
                    join(allowed)
                )
            }
            ComputeReason::InvalidCondition { condition } => {
                write!(f, "condition '{}' is not accepted by the method", condition)
            }
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    let rendered: Vec<String> = items.iter().map(T::to_string).collect();
    format!("[{}]", rendered.join(", "))
}

/// Builds a [`TypeQLError::Syntax`] whose snippet shows the offending source
/// line with a caret underlining the failure column. Whitespace in the line
/// is preserved verbatim so the caret stays aligned.
pub(crate) fn syntax_error(source: &str, line: usize, column: usize) -> TypeQLError {
    let text = source.lines().nth(line.saturating_sub(1)).unwrap_or("");
    let mut snippet = String::with_capacity(text.len() + column + 1);
    snippet.push_str(text);
    snippet.push('\n');
    for _ in 1..column {
        snippet.push(' ');
    }
    snippet.push('^');
    TypeQLError::Syntax {
        line,
        column,
        snippet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_alignment_preserves_whitespace() {
        let err = syntax_error("match $x isa ", 1, 14);
        match err {
            TypeQLError::Syntax { snippet, .. } => {
                assert_eq!(snippet, "match $x isa \n             ^");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn caret_on_later_line() {
        let err = syntax_error("match\n$x is", 2, 4);
        match err {
            TypeQLError::Syntax { snippet, line, .. } => {
                assert_eq!(line, 2);
                assert_eq!(snippet, "$x is\n   ^");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
