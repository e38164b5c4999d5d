// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Closed vocabulary of the TypeQL language: reserved words, comparators,
//! value types, and the compute-query enumerations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every reserved word of the language, including the dash words
/// (`k-core`, `min-k`, `connected-component`) which lex as single tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyword {
    // commands
    Match,
    Get,
    Define,
    Undefine,
    Insert,
    Delete,
    Compute,
    // schema and instance properties
    Isa,
    IsaX,
    Sub,
    SubX,
    Abstract,
    As,
    Has,
    Key,
    Plays,
    Relates,
    Value,
    Regex,
    When,
    Then,
    Type,
    Id,
    // modifiers
    Sort,
    Offset,
    Limit,
    Group,
    Asc,
    Desc,
    // pattern connectives
    Or,
    Not,
    // aggregate / compute methods
    Count,
    Max,
    Min,
    Mean,
    Median,
    Sum,
    Std,
    Path,
    Centrality,
    Cluster,
    // compute conditions
    From,
    To,
    Of,
    In,
    Using,
    Where,
    // compute algorithms and parameters
    Degree,
    KCore,
    ConnectedComponent,
    MinK,
    K,
    Size,
    Contains,
    Like,
    // value types
    Long,
    Double,
    StringType,
    Boolean,
    Datetime,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Match => "match",
            Keyword::Get => "get",
            Keyword::Define => "define",
            Keyword::Undefine => "undefine",
            Keyword::Insert => "insert",
            Keyword::Delete => "delete",
            Keyword::Compute => "compute",
            Keyword::Isa => "isa",
            Keyword::IsaX => "isa!",
            Keyword::Sub => "sub",
            Keyword::SubX => "sub!",
            Keyword::Abstract => "abstract",
            Keyword::As => "as",
            Keyword::Has => "has",
            Keyword::Key => "key",
            Keyword::Plays => "plays",
            Keyword::Relates => "relates",
            Keyword::Value => "value",
            Keyword::Regex => "regex",
            Keyword::When => "when",
            Keyword::Then => "then",
            Keyword::Type => "type",
            Keyword::Id => "id",
            Keyword::Sort => "sort",
            Keyword::Offset => "offset",
            Keyword::Limit => "limit",
            Keyword::Group => "group",
            Keyword::Asc => "asc",
            Keyword::Desc => "desc",
            Keyword::Or => "or",
            Keyword::Not => "not",
            Keyword::Count => "count",
            Keyword::Max => "max",
            Keyword::Min => "min",
            Keyword::Mean => "mean",
            Keyword::Median => "median",
            Keyword::Sum => "sum",
            Keyword::Std => "std",
            Keyword::Path => "path",
            Keyword::Centrality => "centrality",
            Keyword::Cluster => "cluster",
            Keyword::From => "from",
            Keyword::To => "to",
            Keyword::Of => "of",
            Keyword::In => "in",
            Keyword::Using => "using",
            Keyword::Where => "where",
            Keyword::Degree => "degree",
            Keyword::KCore => "k-core",
            Keyword::ConnectedComponent => "connected-component",
            Keyword::MinK => "min-k",
            Keyword::K => "k",
            Keyword::Size => "size",
            Keyword::Contains => "contains",
            Keyword::Like => "like",
            Keyword::Long => "long",
            Keyword::Double => "double",
            Keyword::StringType => "string",
            Keyword::Boolean => "boolean",
            Keyword::Datetime => "datetime",
        }
    }

    pub fn of(word: &str) -> Option<Keyword> {
        let keyword = match word {
            "match" => Keyword::Match,
            "get" => Keyword::Get,
            "define" => Keyword::Define,
            "undefine" => Keyword::Undefine,
            "insert" => Keyword::Insert,
            "delete" => Keyword::Delete,
            "compute" => Keyword::Compute,
            "isa" => Keyword::Isa,
            "isa!" => Keyword::IsaX,
            "sub" => Keyword::Sub,
            "sub!" => Keyword::SubX,
            "abstract" => Keyword::Abstract,
            "as" => Keyword::As,
            "has" => Keyword::Has,
            "key" => Keyword::Key,
            "plays" => Keyword::Plays,
            "relates" => Keyword::Relates,
            "value" => Keyword::Value,
            "regex" => Keyword::Regex,
            "when" => Keyword::When,
            "then" => Keyword::Then,
            "type" => Keyword::Type,
            "id" => Keyword::Id,
            "sort" => Keyword::Sort,
            "offset" => Keyword::Offset,
            "limit" => Keyword::Limit,
            "group" => Keyword::Group,
            "asc" => Keyword::Asc,
            "desc" => Keyword::Desc,
            "or" => Keyword::Or,
            "not" => Keyword::Not,
            "count" => Keyword::Count,
            "max" => Keyword::Max,
            "min" => Keyword::Min,
            "mean" => Keyword::Mean,
            "median" => Keyword::Median,
            "sum" => Keyword::Sum,
            "std" => Keyword::Std,
            "path" => Keyword::Path,
            "centrality" => Keyword::Centrality,
            "cluster" => Keyword::Cluster,
            "from" => Keyword::From,
            "to" => Keyword::To,
            "of" => Keyword::Of,
            "in" => Keyword::In,
            "using" => Keyword::Using,
            "where" => Keyword::Where,
            "degree" => Keyword::Degree,
            "k-core" => Keyword::KCore,
            "connected-component" => Keyword::ConnectedComponent,
            "min-k" => Keyword::MinK,
            "k" => Keyword::K,
            "size" => Keyword::Size,
            "contains" => Keyword::Contains,
            "like" => Keyword::Like,
            "long" => Keyword::Long,
            "double" => Keyword::Double,
            "string" => Keyword::StringType,
            "boolean" => Keyword::Boolean,
            "datetime" => Keyword::Datetime,
            _ => return None,
        };
        Some(keyword)
    }

    /// Keywords that the grammar also accepts as plain type labels, so that
    /// schemas may name a type `count` or `size` without quoting.
    pub fn is_unreserved(&self) -> bool {
        matches!(
            self,
            Keyword::Value
                | Keyword::Min
                | Keyword::Max
                | Keyword::Median
                | Keyword::Mean
                | Keyword::Std
                | Keyword::Sum
                | Keyword::Count
                | Keyword::Path
                | Keyword::Cluster
                | Keyword::From
                | Keyword::To
                | Keyword::Of
                | Keyword::In
                | Keyword::Degree
                | Keyword::KCore
                | Keyword::ConnectedComponent
                | Keyword::MinK
                | Keyword::K
                | Keyword::Contains
                | Keyword::Size
                | Keyword::Where
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value comparators. `=` and `!=` are lexed separately but normalise to
/// `==` and `!==` when the AST is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Contains,
    Like,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Eq => "==",
            Comparator::Neq => "!==",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Contains => "contains",
            Comparator::Like => "like",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort order in a `get` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate methods over a `get` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateMethod {
    Count,
    Max,
    Min,
    Mean,
    Median,
    Sum,
    Std,
}

impl AggregateMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateMethod::Count => "count",
            AggregateMethod::Max => "max",
            AggregateMethod::Min => "min",
            AggregateMethod::Mean => "mean",
            AggregateMethod::Median => "median",
            AggregateMethod::Sum => "sum",
            AggregateMethod::Std => "std",
        }
    }

    pub fn of(word: &str) -> Option<AggregateMethod> {
        match word {
            "count" => Some(AggregateMethod::Count),
            "max" => Some(AggregateMethod::Max),
            "min" => Some(AggregateMethod::Min),
            "mean" => Some(AggregateMethod::Mean),
            "median" => Some(AggregateMethod::Median),
            "sum" => Some(AggregateMethod::Sum),
            "std" => Some(AggregateMethod::Std),
            _ => None,
        }
    }
}

impl fmt::Display for AggregateMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value type of an attribute type, declared with `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Boolean,
    Datetime,
    Double,
    Long,
    String,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Datetime => "datetime",
            ValueType::Double => "double",
            ValueType::Long => "long",
            ValueType::String => "string",
        }
    }

    pub fn of(word: &str) -> Option<ValueType> {
        match word {
            "boolean" => Some(ValueType::Boolean),
            "datetime" => Some(ValueType::Datetime),
            "double" => Some(ValueType::Double),
            "long" => Some(ValueType::Long),
            "string" => Some(ValueType::String),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute query methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComputeMethod {
    Count,
    Max,
    Min,
    Mean,
    Median,
    Sum,
    Std,
    Path,
    Centrality,
    Cluster,
}

impl ComputeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeMethod::Count => "count",
            ComputeMethod::Max => "max",
            ComputeMethod::Min => "min",
            ComputeMethod::Mean => "mean",
            ComputeMethod::Median => "median",
            ComputeMethod::Sum => "sum",
            ComputeMethod::Std => "std",
            ComputeMethod::Path => "path",
            ComputeMethod::Centrality => "centrality",
            ComputeMethod::Cluster => "cluster",
        }
    }

    pub fn of(word: &str) -> Option<ComputeMethod> {
        match word {
            "count" => Some(ComputeMethod::Count),
            "max" => Some(ComputeMethod::Max),
            "min" => Some(ComputeMethod::Min),
            "mean" => Some(ComputeMethod::Mean),
            "median" => Some(ComputeMethod::Median),
            "sum" => Some(ComputeMethod::Sum),
            "std" => Some(ComputeMethod::Std),
            "path" => Some(ComputeMethod::Path),
            "centrality" => Some(ComputeMethod::Centrality),
            "cluster" => Some(ComputeMethod::Cluster),
            _ => None,
        }
    }
}

impl fmt::Display for ComputeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conditions that can appear after a compute method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputeCondition {
    From,
    To,
    Of,
    In,
    Using,
    Where,
}

impl ComputeCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeCondition::From => "from",
            ComputeCondition::To => "to",
            ComputeCondition::Of => "of",
            ComputeCondition::In => "in",
            ComputeCondition::Using => "using",
            ComputeCondition::Where => "where",
        }
    }
}

impl fmt::Display for ComputeCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute algorithms selected with `using`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComputeAlgorithm {
    Degree,
    KCore,
    ConnectedComponent,
}

impl ComputeAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeAlgorithm::Degree => "degree",
            ComputeAlgorithm::KCore => "k-core",
            ComputeAlgorithm::ConnectedComponent => "connected-component",
        }
    }

    pub fn of(word: &str) -> Option<ComputeAlgorithm> {
        match word {
            "degree" => Some(ComputeAlgorithm::Degree),
            "k-core" => Some(ComputeAlgorithm::KCore),
            "connected-component" => Some(ComputeAlgorithm::ConnectedComponent),
            _ => None,
        }
    }
}

impl fmt::Display for ComputeAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute argument parameters given in a `where` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComputeParam {
    MinK,
    K,
    Size,
    Contains,
}

impl ComputeParam {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeParam::MinK => "min-k",
            ComputeParam::K => "k",
            ComputeParam::Size => "size",
            ComputeParam::Contains => "contains",
        }
    }
}

impl fmt::Display for ComputeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
