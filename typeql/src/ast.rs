// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Abstract syntax tree for TypeQL: variables, constraints, statements,
//! patterns, and the query variants. AST values are immutable once
//! constructed; the consuming builder methods always return a new value.
//! Equality is structural throughout so that a parsed query compares equal
//! to the same query assembled through the builder API.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::TypeQLError;
use crate::token::{
    AggregateMethod, Comparator, ComputeAlgorithm, ComputeMethod, ComputeParam, Order, ValueType,
};
use crate::validator;

// VARIABLES ================================================================

/// A type label, optionally scoped by its owning relation type
/// (`marriage:spouse`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub scope: Option<String>,
    pub name: String,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Label {
        Label {
            scope: None,
            name: name.into(),
        }
    }

    pub fn scoped(scope: impl Into<String>, name: impl Into<String>) -> Label {
        Label {
            scope: Some(scope.into()),
            name: name.into(),
        }
    }
}

impl From<&str> for Label {
    fn from(text: &str) -> Label {
        match text.split_once(':') {
            Some((scope, name)) => Label::scoped(scope, name),
            None => Label::new(text),
        }
    }
}

impl From<String> for Label {
    fn from(text: String) -> Label {
        Label::from(text.as_str())
    }
}

/// A variable reference. Named concept variables (`$x`) and named value
/// variables (`?x`) with the same name are distinct. Anonymous variables
/// compare equal structurally; their distinctness is positional within an
/// AST, which keeps round-trip equality intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    NamedConcept(String),
    NamedValue(String),
    Label(Label),
    Anonymous { visible: bool },
}

impl Variable {
    pub fn named_concept(name: impl Into<String>) -> Variable {
        Variable::NamedConcept(name.into())
    }

    pub fn named_value(name: impl Into<String>) -> Variable {
        Variable::NamedValue(name.into())
    }

    pub fn label(label: impl Into<Label>) -> Variable {
        Variable::Label(label.into())
    }

    /// A syntactically visible anonymous variable, `$_`.
    pub fn anonymous() -> Variable {
        Variable::Anonymous { visible: true }
    }

    /// An anonymous variable that occupies an AST slot but never prints.
    pub fn hidden() -> Variable {
        Variable::Anonymous { visible: false }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Variable::NamedConcept(_) | Variable::NamedValue(_))
    }

    pub fn is_named_concept(&self) -> bool {
        matches!(self, Variable::NamedConcept(_))
    }

    pub fn is_named_value(&self) -> bool {
        matches!(self, Variable::NamedValue(_))
    }

    pub fn is_label(&self) -> bool {
        matches!(self, Variable::Label(_))
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Variable::Anonymous { .. })
    }

    pub fn is_visible(&self) -> bool {
        match self {
            Variable::Anonymous { visible } => *visible,
            _ => true,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Variable::NamedConcept(name) | Variable::NamedValue(name) => Some(name),
            _ => None,
        }
    }
}

/// Either a type label or a variable standing in for a type, as accepted by
/// `isa`, `sub`, `plays`, `relates` and role slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeRef {
    Label(Label),
    Variable(Variable),
}

impl TypeRef {
    pub fn variable(&self) -> Option<&Variable> {
        match self {
            TypeRef::Variable(var) => Some(var),
            TypeRef::Label(_) => None,
        }
    }

    pub fn label(&self) -> Option<&Label> {
        match self {
            TypeRef::Label(label) => Some(label),
            TypeRef::Variable(_) => None,
        }
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Variable {
        Variable::named_concept(name)
    }
}

impl From<&str> for TypeRef {
    fn from(text: &str) -> TypeRef {
        TypeRef::Label(Label::from(text))
    }
}

impl From<Label> for TypeRef {
    fn from(label: Label) -> TypeRef {
        TypeRef::Label(label)
    }
}

impl From<Variable> for TypeRef {
    fn from(var: Variable) -> TypeRef {
        TypeRef::Variable(var)
    }
}

// VALUES ===================================================================

/// A literal value. Date-only literals are lifted to midnight at
/// construction, so a single date-time kind covers both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Long(i64),
    Double(f64),
    Boolean(bool),
    String(String),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Builds a date-time value, rejecting sub-millisecond precision.
    pub fn datetime(value: NaiveDateTime) -> Result<Value, TypeQLError> {
        if value.nanosecond() % 1_000_000 != 0 {
            return Err(TypeQLError::InvalidDateTimeNanos {
                value: value.to_string(),
            });
        }
        Ok(Value::DateTime(value))
    }

    /// Builds a date-time value at midnight of the given date.
    pub fn date(value: NaiveDate) -> Value {
        Value::DateTime(value.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Value {
        Value::Double(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::String(value)
    }
}

/// The right-hand side of a comparison: a literal or a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Comparable {
    Value(Value),
    Variable(Variable),
}

impl From<Value> for Comparable {
    fn from(value: Value) -> Comparable {
        Comparable::Value(value)
    }
}

impl From<i64> for Comparable {
    fn from(value: i64) -> Comparable {
        Comparable::Value(Value::Long(value))
    }
}

impl From<f64> for Comparable {
    fn from(value: f64) -> Comparable {
        Comparable::Value(Value::Double(value))
    }
}

impl From<bool> for Comparable {
    fn from(value: bool) -> Comparable {
        Comparable::Value(Value::Boolean(value))
    }
}

impl From<&str> for Comparable {
    fn from(value: &str) -> Comparable {
        Comparable::Value(Value::String(value.to_owned()))
    }
}

impl From<String> for Comparable {
    fn from(value: String) -> Comparable {
        Comparable::Value(Value::String(value))
    }
}

impl From<Variable> for Comparable {
    fn from(var: Variable) -> Comparable {
        Comparable::Variable(var)
    }
}

/// A value operation attached to an attribute: either a direct assignment
/// (`$t "Spy"`) or a comparison (`$t < "Juno"`, `$n contains "ar"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueOperation {
    Assignment(Value),
    Comparison {
        comparator: Comparator,
        rhs: Comparable,
    },
}

impl ValueOperation {
    pub fn comparison(comparator: Comparator, rhs: impl Into<Comparable>) -> ValueOperation {
        ValueOperation::Comparison {
            comparator,
            rhs: rhs.into(),
        }
    }
}

// CONSTRAINTS ==============================================================

/// A `has` constraint on an instance: `has title $t`, `has title "Spy"`,
/// `has release-date >= $r`. A literal or predicate attribute side is held
/// as an anonymous attribute statement carrying the value operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HasConstraint {
    pub attribute_type: Option<String>,
    pub attribute: HasAttribute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HasAttribute {
    Variable(Variable),
    Statement(Box<AttributeStatement>),
}

impl HasConstraint {
    pub fn with_variable(attribute_type: impl Into<String>, var: Variable) -> HasConstraint {
        HasConstraint {
            attribute_type: Some(attribute_type.into()),
            attribute: HasAttribute::Variable(var),
        }
    }

    pub fn with_operation(
        attribute_type: impl Into<String>,
        operation: ValueOperation,
    ) -> HasConstraint {
        HasConstraint {
            attribute_type: Some(attribute_type.into()),
            attribute: HasAttribute::Statement(Box::new(AttributeStatement::anonymous(operation))),
        }
    }
}

/// One role player inside a relation tuple. A missing role type is resolved
/// later by the query engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolePlayer {
    pub role_type: Option<TypeRef>,
    pub player: Variable,
}

/// The relation tuple constraint, `(actor: $x, $y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationConstraint {
    pub role_players: Vec<RolePlayer>,
}

/// A single predicate attached to a statement's head variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    Isa { type_ref: TypeRef, exact: bool },
    Sub { type_ref: TypeRef, exact: bool },
    Abstract,
    Label(Label),
    Owns { attribute_type: TypeRef, is_key: bool },
    Plays { role: TypeRef },
    Relates { role: TypeRef, overridden: Option<TypeRef> },
    ValueType(ValueType),
    Regex(String),
    When(Conjunction),
    Then(Box<Statement>),
    Has(HasConstraint),
    Value(ValueOperation),
    Relation(RelationConstraint),
    NeqVar(Variable),
    Id(String),
}

impl Constraint {
    /// The variables referenced by this constraint, including those inside a
    /// nested attribute statement or rule body.
    pub fn variables(&self) -> Vec<&Variable> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a Variable>) {
        match self {
            Constraint::Isa { type_ref, .. }
            | Constraint::Sub { type_ref, .. }
            | Constraint::Owns {
                attribute_type: type_ref,
                ..
            }
            | Constraint::Plays { role: type_ref } => {
                if let Some(var) = type_ref.variable() {
                    out.push(var);
                }
            }
            Constraint::Relates { role, overridden } => {
                if let Some(var) = role.variable() {
                    out.push(var);
                }
                if let Some(var) = overridden.as_ref().and_then(TypeRef::variable) {
                    out.push(var);
                }
            }
            Constraint::Has(has) => match &has.attribute {
                HasAttribute::Variable(var) => out.push(var),
                HasAttribute::Statement(statement) => {
                    out.extend(statement.variables());
                }
            },
            Constraint::Value(op) => {
                if let ValueOperation::Comparison {
                    rhs: Comparable::Variable(var),
                    ..
                } = op
                {
                    out.push(var);
                }
            }
            Constraint::Relation(relation) => {
                for role_player in &relation.role_players {
                    if let Some(var) = role_player.role_type.as_ref().and_then(TypeRef::variable) {
                        out.push(var);
                    }
                    out.push(&role_player.player);
                }
            }
            Constraint::NeqVar(var) => out.push(var),
            Constraint::When(conjunction) => {
                for statement in conjunction_statements(conjunction) {
                    out.extend(statement.variables());
                }
            }
            Constraint::Then(statement) => out.extend(statement.variables()),
            Constraint::Abstract
            | Constraint::Label(_)
            | Constraint::ValueType(_)
            | Constraint::Regex(_)
            | Constraint::Id(_) => {}
        }
    }
}

fn conjunction_statements(conjunction: &Conjunction) -> Vec<&Statement> {
    conjunction
        .patterns
        .iter()
        .flat_map(Pattern::statements)
        .collect()
}

// STATEMENTS ===============================================================

macro_rules! statement_variant {
    ($name:ident) => {
        #[derive(Debug, Clone, Serialize, Deserialize)]
        pub struct $name {
            pub head: Variable,
            pub constraints: Vec<Constraint>,
        }

        // Constraints are an ordered set: order determines printing but not
        // equality, so a statement assembled `has` first compares equal to
        // its canonically printed and re-parsed form.
        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.head == other.head
                    && self.constraints.len() == other.constraints.len()
                    && self
                        .constraints
                        .iter()
                        .all(|constraint| other.constraints.contains(constraint))
            }
        }

        impl $name {
            pub fn new(head: Variable) -> $name {
                $name {
                    head,
                    constraints: Vec::new(),
                }
            }

            /// Appends a constraint, keeping the collection ordered and
            /// duplicate-free.
            pub fn constrain(mut self, constraint: Constraint) -> $name {
                if !self.constraints.contains(&constraint) {
                    self.constraints.push(constraint);
                }
                self
            }

            pub fn variables(&self) -> Vec<&Variable> {
                let mut vars = vec![&self.head];
                for constraint in &self.constraints {
                    vars.extend(constraint.variables());
                }
                vars
            }
        }
    };
}

statement_variant!(TypeStatement);
statement_variant!(ThingStatement);
statement_variant!(RelationStatement);
statement_variant!(AttributeStatement);

impl AttributeStatement {
    /// The hidden-headed attribute statement produced by the `has`
    /// shorthand, e.g. the attribute side of `has name "Alice"`.
    pub fn anonymous(operation: ValueOperation) -> AttributeStatement {
        AttributeStatement::new(Variable::hidden()).constrain(Constraint::Value(operation))
    }

    pub fn value_operation(&self) -> Option<&ValueOperation> {
        self.constraints.iter().find_map(|constraint| match constraint {
            Constraint::Value(op) => Some(op),
            _ => None,
        })
    }
}

impl TypeStatement {
    pub fn when(&self) -> Option<&Conjunction> {
        self.constraints.iter().find_map(|constraint| match constraint {
            Constraint::When(conjunction) => Some(conjunction),
            _ => None,
        })
    }

    pub fn then(&self) -> Option<&Statement> {
        self.constraints.iter().find_map(|constraint| match constraint {
            Constraint::Then(statement) => Some(statement.as_ref()),
            _ => None,
        })
    }
}

/// A statement binds one head variable to its constraints. The variant
/// records which grammar production produced it and drives both printing
/// and validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Type(TypeStatement),
    Thing(ThingStatement),
    Relation(RelationStatement),
    Attribute(AttributeStatement),
}

impl Statement {
    pub fn head(&self) -> &Variable {
        match self {
            Statement::Type(s) => &s.head,
            Statement::Thing(s) => &s.head,
            Statement::Relation(s) => &s.head,
            Statement::Attribute(s) => &s.head,
        }
    }

    pub fn constraints(&self) -> &[Constraint] {
        match self {
            Statement::Type(s) => &s.constraints,
            Statement::Thing(s) => &s.constraints,
            Statement::Relation(s) => &s.constraints,
            Statement::Attribute(s) => &s.constraints,
        }
    }

    pub fn variables(&self) -> Vec<&Variable> {
        match self {
            Statement::Type(s) => s.variables(),
            Statement::Thing(s) => s.variables(),
            Statement::Relation(s) => s.variables(),
            Statement::Attribute(s) => s.variables(),
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Statement::Type(_))
    }

    pub fn has_constraints(&self) -> Vec<&HasConstraint> {
        self.constraints()
            .iter()
            .filter_map(|constraint| match constraint {
                Constraint::Has(has) => Some(has),
                _ => None,
            })
            .collect()
    }

    pub fn isa(&self) -> Option<&Constraint> {
        self.constraints()
            .iter()
            .find(|constraint| matches!(constraint, Constraint::Isa { .. }))
    }

    pub fn relation(&self) -> Option<&RelationConstraint> {
        self.constraints()
            .iter()
            .find_map(|constraint| match constraint {
                Constraint::Relation(relation) => Some(relation),
                _ => None,
            })
    }
}

impl From<TypeStatement> for Statement {
    fn from(statement: TypeStatement) -> Statement {
        Statement::Type(statement)
    }
}

impl From<ThingStatement> for Statement {
    fn from(statement: ThingStatement) -> Statement {
        Statement::Thing(statement)
    }
}

impl From<RelationStatement> for Statement {
    fn from(statement: RelationStatement) -> Statement {
        Statement::Relation(statement)
    }
}

impl From<AttributeStatement> for Statement {
    fn from(statement: AttributeStatement) -> Statement {
        Statement::Attribute(statement)
    }
}

// PATTERNS =================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conjunction {
    pub patterns: Vec<Pattern>,
}

impl Conjunction {
    pub fn new(patterns: Vec<Pattern>) -> Conjunction {
        Conjunction { patterns }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disjunction {
    pub patterns: Vec<Pattern>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Negation {
    pub pattern: Pattern,
}

/// A pattern is a recursive composition of statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    Conjunction(Conjunction),
    Disjunction(Disjunction),
    Negation(Box<Negation>),
    Statement(Statement),
}

impl Pattern {
    /// All statements reachable in this pattern, in source order.
    pub fn statements(&self) -> Vec<&Statement> {
        match self {
            Pattern::Statement(statement) => vec![statement],
            Pattern::Conjunction(conjunction) => conjunction
                .patterns
                .iter()
                .flat_map(Pattern::statements)
                .collect(),
            Pattern::Disjunction(disjunction) => disjunction
                .patterns
                .iter()
                .flat_map(Pattern::statements)
                .collect(),
            Pattern::Negation(negation) => negation.pattern.statements(),
        }
    }

    pub fn named_variables(&self) -> Vec<&Variable> {
        let mut vars: Vec<&Variable> = Vec::new();
        for statement in self.statements() {
            for var in statement.variables() {
                if var.is_named() && !vars.contains(&var) {
                    vars.push(var);
                }
            }
        }
        vars
    }
}

impl From<Statement> for Pattern {
    fn from(statement: Statement) -> Pattern {
        Pattern::Statement(statement)
    }
}

impl From<TypeStatement> for Pattern {
    fn from(statement: TypeStatement) -> Pattern {
        Pattern::Statement(Statement::Type(statement))
    }
}

impl From<ThingStatement> for Pattern {
    fn from(statement: ThingStatement) -> Pattern {
        Pattern::Statement(Statement::Thing(statement))
    }
}

impl From<RelationStatement> for Pattern {
    fn from(statement: RelationStatement) -> Pattern {
        Pattern::Statement(Statement::Relation(statement))
    }
}

impl From<AttributeStatement> for Pattern {
    fn from(statement: AttributeStatement) -> Pattern {
        Pattern::Statement(Statement::Attribute(statement))
    }
}

impl From<Conjunction> for Pattern {
    fn from(conjunction: Conjunction) -> Pattern {
        Pattern::Conjunction(conjunction)
    }
}

impl From<Disjunction> for Pattern {
    fn from(disjunction: Disjunction) -> Pattern {
        Pattern::Disjunction(disjunction)
    }
}

impl From<Negation> for Pattern {
    fn from(negation: Negation) -> Pattern {
        Pattern::Negation(Box::new(negation))
    }
}

// MATCH CLAUSE AND QUERIES =================================================

/// The conjunction of patterns constraining a query's solution set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchClause {
    pub patterns: Conjunction,
}

impl MatchClause {
    pub fn new(patterns: Vec<Pattern>) -> MatchClause {
        MatchClause {
            patterns: Conjunction::new(patterns),
        }
    }

    pub fn statements(&self) -> Vec<&Statement> {
        conjunction_statements(&self.patterns)
    }

    /// The named concept variables occurring anywhere in the match block,
    /// deduplicated in order of first occurrence.
    pub fn named_concept_variables(&self) -> Vec<&Variable> {
        let mut vars: Vec<&Variable> = Vec::new();
        for pattern in &self.patterns.patterns {
            for var in pattern.named_variables() {
                if var.is_named_concept() && !vars.contains(&var) {
                    vars.push(var);
                }
            }
        }
        vars
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefineQuery {
    pub statements: Vec<TypeStatement>,
}

impl DefineQuery {
    pub fn new(statements: Vec<TypeStatement>) -> Result<DefineQuery, TypeQLError> {
        validator::validate_definables(&statements)?;
        Ok(DefineQuery { statements })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndefineQuery {
    pub statements: Vec<TypeStatement>,
}

impl UndefineQuery {
    pub fn new(statements: Vec<TypeStatement>) -> Result<UndefineQuery, TypeQLError> {
        validator::validate_definables(&statements)?;
        Ok(UndefineQuery { statements })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertQuery {
    pub match_clause: Option<MatchClause>,
    pub statements: Vec<Statement>,
}

impl InsertQuery {
    pub fn new(
        match_clause: Option<MatchClause>,
        statements: Vec<Statement>,
    ) -> Result<InsertQuery, TypeQLError> {
        validator::validate_instance_statements(&statements)?;
        if let Some(clause) = &match_clause {
            validator::validate_match(clause)?;
        }
        Ok(InsertQuery {
            match_clause,
            statements,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteQuery {
    pub match_clause: MatchClause,
    pub statements: Vec<Statement>,
}

impl DeleteQuery {
    pub fn new(
        match_clause: MatchClause,
        statements: Vec<Statement>,
    ) -> Result<DeleteQuery, TypeQLError> {
        validator::validate_instance_statements(&statements)?;
        validator::validate_match(&match_clause)?;
        Ok(DeleteQuery {
            match_clause,
            statements,
        })
    }
}

/// The sort modifier of a `get` query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sorting {
    pub variable: Variable,
    pub order: Option<Order>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetQuery {
    pub match_clause: MatchClause,
    /// Ordered, deduplicated retrieved variables; empty means every named
    /// concept variable of the match block.
    pub filter: Vec<Variable>,
    pub sorting: Option<Sorting>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl GetQuery {
    pub fn new(match_clause: MatchClause, filter: Vec<Variable>) -> Result<GetQuery, TypeQLError> {
        validator::validate_match(&match_clause)?;
        let mut deduplicated: Vec<Variable> = Vec::new();
        for var in filter {
            if !deduplicated.contains(&var) {
                deduplicated.push(var);
            }
        }
        validator::validate_filter(&match_clause, &deduplicated)?;
        Ok(GetQuery {
            match_clause,
            filter: deduplicated,
            sorting: None,
            offset: None,
            limit: None,
        })
    }

    /// The variables retrievable from this query: the filter when present,
    /// otherwise every named concept variable of the match block.
    pub fn scope_variables(&self) -> Vec<&Variable> {
        if self.filter.is_empty() {
            self.match_clause.named_concept_variables()
        } else {
            self.filter.iter().collect()
        }
    }

    pub fn sort(mut self, variable: Variable, order: Option<Order>) -> Result<GetQuery, TypeQLError> {
        validator::validate_sort(&self, &variable)?;
        self.sorting = Some(Sorting { variable, order });
        Ok(self)
    }

    pub fn offset(mut self, offset: u64) -> GetQuery {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> GetQuery {
        self.limit = Some(limit);
        self
    }

    pub fn count(self) -> AggregateQuery {
        AggregateQuery {
            get: self,
            method: AggregateMethod::Count,
            variable: None,
        }
    }

    pub fn aggregate(
        self,
        method: AggregateMethod,
        variable: Option<Variable>,
    ) -> Result<AggregateQuery, TypeQLError> {
        validator::validate_aggregate(&self, method, variable.as_ref())?;
        Ok(AggregateQuery {
            get: self,
            method,
            variable,
        })
    }

    pub fn max(self, variable: Variable) -> Result<AggregateQuery, TypeQLError> {
        self.aggregate(AggregateMethod::Max, Some(variable))
    }

    pub fn min(self, variable: Variable) -> Result<AggregateQuery, TypeQLError> {
        self.aggregate(AggregateMethod::Min, Some(variable))
    }

    pub fn mean(self, variable: Variable) -> Result<AggregateQuery, TypeQLError> {
        self.aggregate(AggregateMethod::Mean, Some(variable))
    }

    pub fn median(self, variable: Variable) -> Result<AggregateQuery, TypeQLError> {
        self.aggregate(AggregateMethod::Median, Some(variable))
    }

    pub fn sum(self, variable: Variable) -> Result<AggregateQuery, TypeQLError> {
        self.aggregate(AggregateMethod::Sum, Some(variable))
    }

    pub fn std(self, variable: Variable) -> Result<AggregateQuery, TypeQLError> {
        self.aggregate(AggregateMethod::Std, Some(variable))
    }

    pub fn group(self, variable: Variable) -> Result<GroupQuery, TypeQLError> {
        validator::validate_group(&self, &variable)?;
        Ok(GroupQuery {
            get: self,
            variable,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateQuery {
    pub get: GetQuery,
    pub method: AggregateMethod,
    pub variable: Option<Variable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupQuery {
    pub get: GetQuery,
    pub variable: Variable,
}

impl GroupQuery {
    pub fn count(self) -> GroupAggregateQuery {
        GroupAggregateQuery {
            group: self,
            method: AggregateMethod::Count,
            variable: None,
        }
    }

    pub fn aggregate(
        self,
        method: AggregateMethod,
        variable: Option<Variable>,
    ) -> Result<GroupAggregateQuery, TypeQLError> {
        validator::validate_aggregate(&self.get, method, variable.as_ref())?;
        Ok(GroupAggregateQuery {
            group: self,
            method,
            variable,
        })
    }

    pub fn max(self, variable: Variable) -> Result<GroupAggregateQuery, TypeQLError> {
        self.aggregate(AggregateMethod::Max, Some(variable))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAggregateQuery {
    pub group: GroupQuery,
    pub method: AggregateMethod,
    pub variable: Option<Variable>,
}

// COMPUTE ==================================================================

/// A compute argument value: an integer for `min-k`/`k`/`size`, a concept
/// id for `contains`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgumentValue {
    Long(i64),
    Id(String),
}

/// One `where` argument, `param = value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeArgument {
    pub param: ComputeParam,
    pub value: ArgumentValue,
}

impl ComputeArgument {
    pub fn min_k(value: i64) -> ComputeArgument {
        ComputeArgument {
            param: ComputeParam::MinK,
            value: ArgumentValue::Long(value),
        }
    }

    pub fn k(value: i64) -> ComputeArgument {
        ComputeArgument {
            param: ComputeParam::K,
            value: ArgumentValue::Long(value),
        }
    }

    pub fn size(value: i64) -> ComputeArgument {
        ComputeArgument {
            param: ComputeParam::Size,
            value: ArgumentValue::Long(value),
        }
    }

    pub fn contains(id: impl Into<String>) -> ComputeArgument {
        ComputeArgument {
            param: ComputeParam::Contains,
            value: ArgumentValue::Id(id.into()),
        }
    }
}

/// An analytics query over the graph. The condition fields record exactly
/// what the user wrote; accessors apply the per-method defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeQuery {
    pub method: ComputeMethod,
    pub from_id: Option<String>,
    pub to_id: Option<String>,
    pub of_types: Option<Vec<Label>>,
    pub in_types: Option<Vec<Label>>,
    pub algorithm: Option<ComputeAlgorithm>,
    /// Insertion-ordered `where` arguments; a repeated parameter keeps only
    /// its last occurrence.
    pub arguments: Vec<ComputeArgument>,
}

impl ComputeQuery {
    pub fn new(method: ComputeMethod) -> ComputeQuery {
        ComputeQuery {
            method,
            from_id: None,
            to_id: None,
            of_types: None,
            in_types: None,
            algorithm: None,
            arguments: Vec::new(),
        }
    }

    pub fn from(mut self, id: impl Into<String>) -> ComputeQuery {
        self.from_id = Some(id.into());
        self
    }

    pub fn to(mut self, id: impl Into<String>) -> ComputeQuery {
        self.to_id = Some(id.into());
        self
    }

    /// An empty type set means "no scoping condition" and is recorded as
    /// such, so `count` and `count in []` build equal queries.
    pub fn of(mut self, types: Vec<Label>) -> ComputeQuery {
        self.of_types = if types.is_empty() { None } else { Some(types) };
        self
    }

    pub fn in_(mut self, types: Vec<Label>) -> ComputeQuery {
        self.in_types = if types.is_empty() { None } else { Some(types) };
        self
    }

    /// Selects the algorithm, validating it against the method.
    pub fn using(mut self, algorithm: ComputeAlgorithm) -> Result<ComputeQuery, TypeQLError> {
        validator::validate_compute_algorithm(self.method, algorithm)?;
        self.algorithm = Some(algorithm);
        self.validated_where()?;
        Ok(self)
    }

    /// Adds `where` arguments, validating each against the effective
    /// algorithm. A repeated parameter replaces the earlier occurrence and
    /// moves to the end, mirroring insertion-order map semantics.
    pub fn where_(mut self, args: Vec<ComputeArgument>) -> Result<ComputeQuery, TypeQLError> {
        for arg in args {
            validator::validate_compute_argument(self.method, self.effective_algorithm(), arg.param)?;
            self.arguments.retain(|existing| existing.param != arg.param);
            self.arguments.push(arg);
        }
        Ok(self)
    }

    fn validated_where(&self) -> Result<(), TypeQLError> {
        for arg in &self.arguments {
            validator::validate_compute_argument(self.method, self.effective_algorithm(), arg.param)?;
        }
        Ok(())
    }

    /// The algorithm in effect: the explicit one, or the method default.
    pub fn effective_algorithm(&self) -> Option<ComputeAlgorithm> {
        self.algorithm
            .or_else(|| validator::default_algorithm(self.method))
    }

    /// Looks up an argument, falling back to the default the effective
    /// algorithm supplies (`min-k = 2`, `k = 2` under `k-core`).
    pub fn argument(&self, param: ComputeParam) -> Option<ArgumentValue> {
        self.arguments
            .iter()
            .find(|arg| arg.param == param)
            .map(|arg| arg.value.clone())
            .or_else(|| {
                validator::default_argument(self.method, self.effective_algorithm()?, param)
                    .map(ArgumentValue::Long)
            })
    }

    /// Runs the full method/condition/algorithm/argument matrix check and
    /// returns the query unchanged when it passes.
    pub fn validated(self) -> Result<ComputeQuery, TypeQLError> {
        validator::validate_compute(&self)?;
        Ok(self)
    }
}

// QUERY ====================================================================

/// A complete TypeQL query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    Define(DefineQuery),
    Undefine(UndefineQuery),
    Insert(InsertQuery),
    Delete(DeleteQuery),
    Get(GetQuery),
    Aggregate(AggregateQuery),
    Group(GroupQuery),
    GroupAggregate(GroupAggregateQuery),
    Compute(ComputeQuery),
}

macro_rules! narrow {
    ($is:ident, $into:ident, $variant:ident, $target:ty, $name:literal) => {
        pub fn $is(&self) -> bool {
            matches!(self, Query::$variant(_))
        }

        /// Narrows to the variant, reporting an invalid cast otherwise.
        pub fn $into(self) -> Result<$target, TypeQLError> {
            match self {
                Query::$variant(query) => Ok(query),
                other => Err(TypeQLError::InvalidCasting {
                    from: other.variant_name(),
                    to: $name,
                }),
            }
        }
    };
}

impl Query {
    pub fn variant_name(&self) -> &'static str {
        match self {
            Query::Define(_) => "define query",
            Query::Undefine(_) => "undefine query",
            Query::Insert(_) => "insert query",
            Query::Delete(_) => "delete query",
            Query::Get(_) => "get query",
            Query::Aggregate(_) => "get aggregate query",
            Query::Group(_) => "get group query",
            Query::GroupAggregate(_) => "get group aggregate query",
            Query::Compute(_) => "compute query",
        }
    }

    narrow!(is_define, into_define, Define, DefineQuery, "define query");
    narrow!(is_undefine, into_undefine, Undefine, UndefineQuery, "undefine query");
    narrow!(is_insert, into_insert, Insert, InsertQuery, "insert query");
    narrow!(is_delete, into_delete, Delete, DeleteQuery, "delete query");
    narrow!(is_get, into_get, Get, GetQuery, "get query");
    narrow!(is_aggregate, into_aggregate, Aggregate, AggregateQuery, "get aggregate query");
    narrow!(is_group, into_group, Group, GroupQuery, "get group query");
    narrow!(
        is_group_aggregate,
        into_group_aggregate,
        GroupAggregate,
        GroupAggregateQuery,
        "get group aggregate query"
    );
    narrow!(is_compute, into_compute, Compute, ComputeQuery, "compute query");
}

impl From<DefineQuery> for Query {
    fn from(query: DefineQuery) -> Query {
        Query::Define(query)
    }
}

impl From<GetQuery> for Query {
    fn from(query: GetQuery) -> Query {
        Query::Get(query)
    }
}

impl From<InsertQuery> for Query {
    fn from(query: InsertQuery) -> Query {
        Query::Insert(query)
    }
}

impl From<ComputeQuery> for Query {
    fn from(query: ComputeQuery) -> Query {
        Query::Compute(query)
    }
}

impl From<UndefineQuery> for Query {
    fn from(query: UndefineQuery) -> Query {
        Query::Undefine(query)
    }
}

impl From<DeleteQuery> for Query {
    fn from(query: DeleteQuery) -> Query {
        Query::Delete(query)
    }
}

impl From<AggregateQuery> for Query {
    fn from(query: AggregateQuery) -> Query {
        Query::Aggregate(query)
    }
}

impl From<GroupQuery> for Query {
    fn from(query: GroupQuery) -> Query {
        Query::Group(query)
    }
}

impl From<GroupAggregateQuery> for Query {
    fn from(query: GroupAggregateQuery) -> Query {
        Query::GroupAggregate(query)
    }
}
