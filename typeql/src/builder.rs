// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Programmatic query construction mirroring the AST. The surface is a set
//! of free functions (`var`, `type_`, `rel`, `match_`, `and`, `or`, `not`,
//! `rule`, `compute`, the predicate constructors) plus fluent consuming
//! methods on the statement types. A query assembled here is
//! indistinguishable from the same query parsed from text, and every step
//! that crosses a validation boundary runs the corresponding validator
//! checks.

use crate::ast::{
    AttributeStatement, Comparable, Conjunction, Constraint, ComputeQuery, DefineQuery,
    DeleteQuery, Disjunction, GetQuery, HasConstraint, InsertQuery, Label, MatchClause, Negation,
    Pattern, RelationConstraint, RelationStatement, RolePlayer, Statement, ThingStatement,
    TypeRef, TypeStatement, UndefineQuery, Value, ValueOperation, Variable,
};
use crate::error::TypeQLError;
use crate::token::{Comparator, ComputeMethod, ValueType};
use crate::validator;

// VARIABLES ================================================================

/// A variable that has not yet been bound into a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UnboundVariable {
    variable: Variable,
}

/// A named concept variable, `$name`.
pub fn var(name: impl Into<String>) -> UnboundVariable {
    UnboundVariable {
        variable: Variable::named_concept(name),
    }
}

/// The visible anonymous variable, `$_`.
pub fn var_anon() -> UnboundVariable {
    UnboundVariable {
        variable: Variable::anonymous(),
    }
}

/// A named value variable, `?name`.
pub fn val_var(name: impl Into<String>) -> UnboundVariable {
    UnboundVariable {
        variable: Variable::named_value(name),
    }
}

impl From<UnboundVariable> for Variable {
    fn from(unbound: UnboundVariable) -> Variable {
        unbound.variable
    }
}

impl From<UnboundVariable> for TypeRef {
    fn from(unbound: UnboundVariable) -> TypeRef {
        TypeRef::Variable(unbound.variable)
    }
}

impl From<UnboundVariable> for Comparable {
    fn from(unbound: UnboundVariable) -> Comparable {
        Comparable::Variable(unbound.variable)
    }
}

/// The attribute side accepted by `has`: a literal, a predicate, or a
/// variable.
#[derive(Debug, Clone, PartialEq)]
pub enum HasArg {
    Value(Value),
    Operation(ValueOperation),
    Variable(Variable),
}

impl From<i64> for HasArg {
    fn from(value: i64) -> HasArg {
        HasArg::Value(Value::Long(value))
    }
}

impl From<f64> for HasArg {
    fn from(value: f64) -> HasArg {
        HasArg::Value(Value::Double(value))
    }
}

impl From<bool> for HasArg {
    fn from(value: bool) -> HasArg {
        HasArg::Value(Value::Boolean(value))
    }
}

impl From<&str> for HasArg {
    fn from(value: &str) -> HasArg {
        HasArg::Value(Value::String(value.to_owned()))
    }
}

impl From<String> for HasArg {
    fn from(value: String) -> HasArg {
        HasArg::Value(Value::String(value))
    }
}

impl From<Value> for HasArg {
    fn from(value: Value) -> HasArg {
        HasArg::Value(value)
    }
}

impl From<ValueOperation> for HasArg {
    fn from(operation: ValueOperation) -> HasArg {
        HasArg::Operation(operation)
    }
}

impl From<UnboundVariable> for HasArg {
    fn from(unbound: UnboundVariable) -> HasArg {
        HasArg::Variable(unbound.variable)
    }
}

fn has_constraint(attribute_type: impl Into<String>, arg: HasArg) -> Constraint {
    match arg {
        HasArg::Variable(variable) => {
            Constraint::Has(HasConstraint::with_variable(attribute_type, variable))
        }
        HasArg::Value(value) => Constraint::Has(HasConstraint::with_operation(
            attribute_type,
            ValueOperation::Assignment(value),
        )),
        HasArg::Operation(operation) => {
            Constraint::Has(HasConstraint::with_operation(attribute_type, operation))
        }
    }
}

impl UnboundVariable {
    // instance statements ---------------------------------------------------

    pub fn isa(self, type_ref: impl Into<TypeRef>) -> ThingStatement {
        ThingStatement::new(self.variable).constrain(Constraint::Isa {
            type_ref: type_ref.into(),
            exact: false,
        })
    }

    pub fn isa_exact(self, type_ref: impl Into<TypeRef>) -> ThingStatement {
        ThingStatement::new(self.variable).constrain(Constraint::Isa {
            type_ref: type_ref.into(),
            exact: true,
        })
    }

    pub fn id(self, id: impl Into<String>) -> ThingStatement {
        ThingStatement::new(self.variable).constrain(Constraint::Id(id.into()))
    }

    pub fn has(self, attribute_type: impl Into<String>, arg: impl Into<HasArg>) -> ThingStatement {
        ThingStatement::new(self.variable).constrain(has_constraint(attribute_type, arg.into()))
    }

    /// A direct value assignment, `$t "Spy"`.
    pub fn val(self, value: impl Into<Value>) -> AttributeStatement {
        AttributeStatement::new(self.variable)
            .constrain(Constraint::Value(ValueOperation::Assignment(value.into())))
    }

    fn comparison(self, comparator: Comparator, rhs: impl Into<Comparable>) -> AttributeStatement {
        AttributeStatement::new(self.variable).constrain(Constraint::Value(
            ValueOperation::comparison(comparator, rhs),
        ))
    }

    pub fn eq(self, rhs: impl Into<Comparable>) -> AttributeStatement {
        self.comparison(Comparator::Eq, rhs)
    }

    /// `!==` against a variable binds the two concept variables apart;
    /// against a value it is an inequality comparison.
    pub fn neq(self, rhs: impl Into<Comparable>) -> Statement {
        match rhs.into() {
            Comparable::Variable(other) => Statement::Thing(
                ThingStatement::new(self.variable).constrain(Constraint::NeqVar(other)),
            ),
            rhs => Statement::Attribute(self.comparison(Comparator::Neq, rhs)),
        }
    }

    pub fn lt(self, rhs: impl Into<Comparable>) -> AttributeStatement {
        self.comparison(Comparator::Lt, rhs)
    }

    pub fn lte(self, rhs: impl Into<Comparable>) -> AttributeStatement {
        self.comparison(Comparator::Lte, rhs)
    }

    pub fn gt(self, rhs: impl Into<Comparable>) -> AttributeStatement {
        self.comparison(Comparator::Gt, rhs)
    }

    pub fn gte(self, rhs: impl Into<Comparable>) -> AttributeStatement {
        self.comparison(Comparator::Gte, rhs)
    }

    pub fn contains(self, rhs: impl Into<Comparable>) -> AttributeStatement {
        self.comparison(Comparator::Contains, rhs)
    }

    pub fn like(self, pattern: impl Into<String>) -> AttributeStatement {
        self.comparison(Comparator::Like, Value::String(pattern.into()))
    }

    pub fn rel(self, player: impl Into<Variable>) -> RelationStatement {
        RelationStatement::new(self.variable)
            .constrain(Constraint::Relation(RelationConstraint {
                role_players: Vec::new(),
            }))
            .rel(player)
    }

    // type statements -------------------------------------------------------

    pub fn sub(self, type_ref: impl Into<TypeRef>) -> TypeStatement {
        TypeStatement::new(self.variable).constrain(Constraint::Sub {
            type_ref: type_ref.into(),
            exact: false,
        })
    }

    pub fn sub_exact(self, type_ref: impl Into<TypeRef>) -> TypeStatement {
        TypeStatement::new(self.variable).constrain(Constraint::Sub {
            type_ref: type_ref.into(),
            exact: true,
        })
    }

    pub fn plays(self, role: impl Into<TypeRef>) -> TypeStatement {
        TypeStatement::new(self.variable).constrain(Constraint::Plays { role: role.into() })
    }

    pub fn relates(self, role: impl Into<TypeRef>) -> TypeStatement {
        TypeStatement::new(self.variable).constrain(Constraint::Relates {
            role: role.into(),
            overridden: None,
        })
    }

    pub fn value_type(self, value_type: ValueType) -> TypeStatement {
        TypeStatement::new(self.variable).constrain(Constraint::ValueType(value_type))
    }

    pub fn regex(self, pattern: impl Into<String>) -> TypeStatement {
        TypeStatement::new(self.variable).constrain(Constraint::Regex(pattern.into()))
    }

    pub fn type_label(self, label: impl Into<Label>) -> TypeStatement {
        TypeStatement::new(self.variable).constrain(Constraint::Label(label.into()))
    }

    pub fn owns(self, attribute_type: impl Into<TypeRef>) -> TypeStatement {
        TypeStatement::new(self.variable).constrain(Constraint::Owns {
            attribute_type: attribute_type.into(),
            is_key: false,
        })
    }

    pub fn key(self, attribute_type: impl Into<TypeRef>) -> TypeStatement {
        TypeStatement::new(self.variable).constrain(Constraint::Owns {
            attribute_type: attribute_type.into(),
            is_key: true,
        })
    }
}

// STATEMENT CHAINING =======================================================

impl ThingStatement {
    pub fn isa(self, type_ref: impl Into<TypeRef>) -> ThingStatement {
        self.constrain(Constraint::Isa {
            type_ref: type_ref.into(),
            exact: false,
        })
    }

    pub fn isa_exact(self, type_ref: impl Into<TypeRef>) -> ThingStatement {
        self.constrain(Constraint::Isa {
            type_ref: type_ref.into(),
            exact: true,
        })
    }

    pub fn has(self, attribute_type: impl Into<String>, arg: impl Into<HasArg>) -> ThingStatement {
        self.constrain(has_constraint(attribute_type, arg.into()))
    }
}

impl AttributeStatement {
    pub fn isa(self, type_ref: impl Into<TypeRef>) -> AttributeStatement {
        self.constrain(Constraint::Isa {
            type_ref: type_ref.into(),
            exact: false,
        })
    }

    pub fn has(
        self,
        attribute_type: impl Into<String>,
        arg: impl Into<HasArg>,
    ) -> AttributeStatement {
        self.constrain(has_constraint(attribute_type, arg.into()))
    }
}

impl RelationStatement {
    /// Appends an un-roled player to the relation tuple.
    pub fn rel(self, player: impl Into<Variable>) -> RelationStatement {
        self.append_player(RolePlayer {
            role_type: None,
            player: player.into(),
        })
    }

    /// Appends a role-typed player to the relation tuple.
    pub fn rel_typed(
        self,
        role: impl Into<TypeRef>,
        player: impl Into<Variable>,
    ) -> RelationStatement {
        self.append_player(RolePlayer {
            role_type: Some(role.into()),
            player: player.into(),
        })
    }

    fn append_player(mut self, role_player: RolePlayer) -> RelationStatement {
        for constraint in &mut self.constraints {
            if let Constraint::Relation(relation) = constraint {
                relation.role_players.push(role_player);
                return self;
            }
        }
        self.constrain(Constraint::Relation(RelationConstraint {
            role_players: vec![role_player],
        }))
    }

    pub fn isa(self, type_ref: impl Into<TypeRef>) -> RelationStatement {
        self.constrain(Constraint::Isa {
            type_ref: type_ref.into(),
            exact: false,
        })
    }

    pub fn has(
        self,
        attribute_type: impl Into<String>,
        arg: impl Into<HasArg>,
    ) -> RelationStatement {
        self.constrain(has_constraint(attribute_type, arg.into()))
    }
}

impl TypeStatement {
    pub fn sub(self, type_ref: impl Into<TypeRef>) -> TypeStatement {
        self.constrain(Constraint::Sub {
            type_ref: type_ref.into(),
            exact: false,
        })
    }

    pub fn sub_exact(self, type_ref: impl Into<TypeRef>) -> TypeStatement {
        self.constrain(Constraint::Sub {
            type_ref: type_ref.into(),
            exact: true,
        })
    }

    pub fn abstract_(self) -> TypeStatement {
        self.constrain(Constraint::Abstract)
    }

    pub fn owns(self, attribute_type: impl Into<TypeRef>) -> TypeStatement {
        self.constrain(Constraint::Owns {
            attribute_type: attribute_type.into(),
            is_key: false,
        })
    }

    pub fn key(self, attribute_type: impl Into<TypeRef>) -> TypeStatement {
        self.constrain(Constraint::Owns {
            attribute_type: attribute_type.into(),
            is_key: true,
        })
    }

    pub fn plays(self, role: impl Into<TypeRef>) -> TypeStatement {
        self.constrain(Constraint::Plays { role: role.into() })
    }

    pub fn relates(self, role: impl Into<TypeRef>) -> TypeStatement {
        self.constrain(Constraint::Relates {
            role: role.into(),
            overridden: None,
        })
    }

    pub fn relates_as(
        self,
        role: impl Into<TypeRef>,
        overridden: impl Into<TypeRef>,
    ) -> TypeStatement {
        self.constrain(Constraint::Relates {
            role: role.into(),
            overridden: Some(overridden.into()),
        })
    }

    pub fn value_type(self, value_type: ValueType) -> TypeStatement {
        self.constrain(Constraint::ValueType(value_type))
    }

    pub fn regex(self, pattern: impl Into<String>) -> TypeStatement {
        self.constrain(Constraint::Regex(pattern.into()))
    }
}

// ROOT CONSTRUCTORS ========================================================

/// A type statement headed by a label, `type_("person").sub("entity")`.
pub fn type_(label: impl Into<Label>) -> TypeStatement {
    TypeStatement::new(Variable::Label(label.into()))
}

/// A relation tuple with a hidden head, `rel("x").rel_typed("actor", "y")`.
pub fn rel(player: impl Into<Variable>) -> RelationStatement {
    RelationStatement::new(Variable::hidden())
        .constrain(Constraint::Relation(RelationConstraint {
            role_players: Vec::new(),
        }))
        .rel(player)
}

/// A role-typed relation tuple with a hidden head.
pub fn rel_typed(role: impl Into<TypeRef>, player: impl Into<Variable>) -> RelationStatement {
    RelationStatement::new(Variable::hidden())
        .constrain(Constraint::Relation(RelationConstraint {
            role_players: Vec::new(),
        }))
        .rel_typed(role, player)
}

// PATTERN COMPOSITION ======================================================

/// Conjunction of patterns; a single pattern is returned unchanged.
pub fn and(patterns: impl IntoIterator<Item = Pattern>) -> Pattern {
    let mut patterns: Vec<Pattern> = patterns.into_iter().collect();
    if patterns.len() == 1 {
        patterns.remove(0)
    } else {
        Pattern::Conjunction(Conjunction::new(patterns))
    }
}

/// Disjunction of at least two branches.
pub fn or(patterns: impl IntoIterator<Item = Pattern>) -> Result<Pattern, TypeQLError> {
    let patterns: Vec<Pattern> = patterns.into_iter().collect();
    if patterns.len() < 2 {
        return Err(TypeQLError::MissingDisjunctionBranches);
    }
    Ok(Pattern::Disjunction(Disjunction { patterns }))
}

pub fn not(pattern: impl Into<Pattern>) -> Pattern {
    Pattern::Negation(Box::new(Negation {
        pattern: pattern.into(),
    }))
}

// QUERY ROOTS ==============================================================

/// Starts a match block; finish with `get`, `get_vars`, `insert`, or
/// `delete`.
pub fn match_(patterns: impl IntoIterator<Item = Pattern>) -> MatchClause {
    MatchClause::new(patterns.into_iter().collect())
}

impl MatchClause {
    /// `get;` retrieving every named concept variable.
    pub fn get(self) -> Result<GetQuery, TypeQLError> {
        GetQuery::new(self, Vec::new())
    }

    /// `get $x, $y;` with an explicit filter.
    pub fn get_vars(
        self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<GetQuery, TypeQLError> {
        let filter = names
            .into_iter()
            .map(|name| Variable::named_concept(name))
            .collect();
        GetQuery::new(self, filter)
    }

    pub fn insert(
        self,
        statements: impl IntoIterator<Item = Statement>,
    ) -> Result<InsertQuery, TypeQLError> {
        InsertQuery::new(Some(self), statements.into_iter().collect())
    }

    pub fn delete(
        self,
        statements: impl IntoIterator<Item = Statement>,
    ) -> Result<DeleteQuery, TypeQLError> {
        DeleteQuery::new(self, statements.into_iter().collect())
    }
}

pub fn insert(statements: impl IntoIterator<Item = Statement>) -> Result<InsertQuery, TypeQLError> {
    InsertQuery::new(None, statements.into_iter().collect())
}

pub fn define(
    statements: impl IntoIterator<Item = TypeStatement>,
) -> Result<DefineQuery, TypeQLError> {
    DefineQuery::new(statements.into_iter().collect())
}

pub fn undefine(
    statements: impl IntoIterator<Item = TypeStatement>,
) -> Result<UndefineQuery, TypeQLError> {
    UndefineQuery::new(statements.into_iter().collect())
}

// RULES ====================================================================

/// Starts a rule definition; `when` then `then` yield the validated type
/// statement `label sub rule, when { .. }, then { .. }`.
pub fn rule(label: impl Into<String>) -> RuleBuilder {
    RuleBuilder {
        label: label.into(),
    }
}

pub struct RuleBuilder {
    label: String,
}

impl RuleBuilder {
    pub fn when(self, pattern: impl Into<Pattern>) -> RuleWhenBuilder {
        let when = match pattern.into() {
            Pattern::Conjunction(conjunction) => conjunction,
            other => Conjunction::new(vec![other]),
        };
        RuleWhenBuilder {
            label: self.label,
            when,
        }
    }
}

pub struct RuleWhenBuilder {
    label: String,
    when: Conjunction,
}

impl RuleWhenBuilder {
    /// Completes the rule, running the full rule validation.
    pub fn then(self, statement: impl Into<Statement>) -> Result<TypeStatement, TypeQLError> {
        let statement = TypeStatement::new(Variable::Label(Label::new(self.label.clone())))
            .constrain(Constraint::Sub {
                type_ref: TypeRef::from("rule"),
                exact: false,
            })
            .constrain(Constraint::When(self.when))
            .constrain(Constraint::Then(Box::new(statement.into())));
        validator::validate_rule(&self.label, &statement)?;
        Ok(statement)
    }
}

// COMPUTE ==================================================================

/// Starts a compute query, `compute().cluster()`.
pub fn compute() -> ComputeBuilder {
    ComputeBuilder
}

pub struct ComputeBuilder;

impl ComputeBuilder {
    pub fn count(self) -> ComputeQuery {
        ComputeQuery::new(ComputeMethod::Count)
    }

    pub fn max(self) -> ComputeQuery {
        ComputeQuery::new(ComputeMethod::Max)
    }

    pub fn min(self) -> ComputeQuery {
        ComputeQuery::new(ComputeMethod::Min)
    }

    pub fn mean(self) -> ComputeQuery {
        ComputeQuery::new(ComputeMethod::Mean)
    }

    pub fn median(self) -> ComputeQuery {
        ComputeQuery::new(ComputeMethod::Median)
    }

    pub fn sum(self) -> ComputeQuery {
        ComputeQuery::new(ComputeMethod::Sum)
    }

    pub fn std(self) -> ComputeQuery {
        ComputeQuery::new(ComputeMethod::Std)
    }

    pub fn path(self) -> ComputeQuery {
        ComputeQuery::new(ComputeMethod::Path)
    }

    pub fn centrality(self) -> ComputeQuery {
        ComputeQuery::new(ComputeMethod::Centrality)
    }

    pub fn cluster(self) -> ComputeQuery {
        ComputeQuery::new(ComputeMethod::Cluster)
    }
}

// VALUE PREDICATES =========================================================

pub fn eq(rhs: impl Into<Comparable>) -> ValueOperation {
    ValueOperation::comparison(Comparator::Eq, rhs)
}

pub fn neq(rhs: impl Into<Comparable>) -> ValueOperation {
    ValueOperation::comparison(Comparator::Neq, rhs)
}

pub fn lt(rhs: impl Into<Comparable>) -> ValueOperation {
    ValueOperation::comparison(Comparator::Lt, rhs)
}

pub fn lte(rhs: impl Into<Comparable>) -> ValueOperation {
    ValueOperation::comparison(Comparator::Lte, rhs)
}

pub fn gt(rhs: impl Into<Comparable>) -> ValueOperation {
    ValueOperation::comparison(Comparator::Gt, rhs)
}

pub fn gte(rhs: impl Into<Comparable>) -> ValueOperation {
    ValueOperation::comparison(Comparator::Gte, rhs)
}

pub fn contains(rhs: impl Into<Comparable>) -> ValueOperation {
    ValueOperation::comparison(Comparator::Contains, rhs)
}

pub fn like(pattern: impl Into<String>) -> ValueOperation {
    ValueOperation::comparison(Comparator::Like, Value::String(pattern.into()))
}
