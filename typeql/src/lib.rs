// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! TypeQL language library: the pipeline from query text to a validated,
//! canonical AST and back.
//!
//! # Features
//!
//! - **Parsing**: [`parse`] for a single query, [`parse_list`] for a lazy
//!   sequence, [`parse_pattern`]/[`parse_patterns`] for pattern fragments
//! - **Validation**: structurally ill-formed ASTs (bad rules, invalid
//!   compute conditions, out-of-scope filters) are rejected at construction
//! - **Printing**: `Query::to_string` is the canonical pretty rendering and
//!   `Query::to_compact_string` the single-line one; both parse back to an
//!   equal AST
//! - **Building**: [`var`], [`type_`], [`rel`], [`match_`], [`rule`],
//!   [`compute`] and friends assemble queries without going through text
//!
//! # Usage
//!
//! ```rust
//! use typeql::{match_, parse, var, Pattern, Query};
//!
//! let parsed = parse("match $x isa movie; get;").unwrap();
//! let built = match_([Pattern::from(var("x").isa("movie"))]).get().unwrap();
//! assert_eq!(parsed, Query::Get(built));
//! ```
//!
//! The library performs no I/O and executes nothing; it only turns strings
//! into structured values and back.

mod ast;
mod builder;
mod error;
mod lexer;
mod parser;
mod pretty_printer;
mod token;
mod validator;

pub use ast::{
    AggregateQuery, ArgumentValue, AttributeStatement, Comparable, ComputeArgument, ComputeQuery,
    Conjunction, Constraint, DefineQuery, DeleteQuery, Disjunction, GetQuery, GroupAggregateQuery,
    GroupQuery, HasAttribute, HasConstraint, InsertQuery, Label, MatchClause, Negation, Pattern,
    Query, RelationConstraint, RelationStatement, RolePlayer, Sorting, Statement, ThingStatement,
    TypeRef, TypeStatement, UndefineQuery, Value, ValueOperation, Variable,
};
pub use builder::{
    and, compute, contains, define, eq, gt, gte, insert, like, lt, lte, match_, neq, not, or, rel,
    rel_typed, rule, type_, undefine, val_var, var, var_anon, ComputeBuilder, HasArg, RuleBuilder,
    RuleWhenBuilder, UnboundVariable,
};
pub use error::{ComputeReason, RuleReason, TypeQLError};
pub use parser::{PatternIterator, QueryIterator};
pub use token::{
    AggregateMethod, Comparator, ComputeAlgorithm, ComputeCondition, ComputeMethod, ComputeParam,
    Keyword, Order, ValueType,
};

/// Parses exactly one query; fails with [`TypeQLError::MultipleQueries`] if
/// the input contains more.
pub fn parse(query: &str) -> Result<Query, TypeQLError> {
    parser::parse_query(query)
}

/// Lazily parses zero or more queries in order. The returned iterator
/// parses one query per step, so inputs of tens of thousands of queries
/// consume constant stack.
pub fn parse_list(queries: &str) -> Result<QueryIterator, TypeQLError> {
    parser::parse_query_list(queries)
}

/// Parses one pattern, either `{ ... };` or a bare statement.
pub fn parse_pattern(pattern: &str) -> Result<Pattern, TypeQLError> {
    parser::parse_pattern(pattern)
}

/// Lazily parses a sequence of patterns.
pub fn parse_patterns(patterns: &str) -> Result<PatternIterator, TypeQLError> {
    parser::parse_pattern_list(patterns)
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
