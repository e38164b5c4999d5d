// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Deterministic serialization of the AST back to query text. Printing is
//! the inverse of parsing: for any validated AST, both the pretty and the
//! compact rendering parse back to an equal AST. Strings always print
//! double-quoted, instance constraints print in canonical order (`isa`
//! before `has`), and date-times print milliseconds only when non-zero.

use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::ast::{
    AggregateQuery, ArgumentValue, AttributeStatement, Comparable, ComputeQuery, Conjunction,
    Constraint, DefineQuery, DeleteQuery, GetQuery, GroupAggregateQuery, GroupQuery, HasAttribute,
    HasConstraint, InsertQuery, Label, MatchClause, Pattern, Query, RelationStatement, Statement,
    ThingStatement, TypeRef, TypeStatement, UndefineQuery, Value, ValueOperation, Variable,
};

// LEAF RENDERING ===========================================================

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}:{}", scope, self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::NamedConcept(name) => write!(f, "${}", name),
            Variable::NamedValue(name) => write!(f, "?{}", name),
            Variable::Label(label) => label.fmt(f),
            Variable::Anonymous { visible: true } => f.write_str("$_"),
            Variable::Anonymous { visible: false } => Ok(()),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Label(label) => label.fmt(f),
            TypeRef::Variable(var) => var.fmt(f),
        }
    }
}

/// Wraps a string value in double quotes, escaping bare quotes while
/// leaving existing escape sequences untouched.
fn quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    let mut escaped = false;
    for c in text.chars() {
        if escaped {
            out.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                out.push('\\');
                escaped = true;
            }
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Years above 9999 print with a `+`, negative years with a `-`, and years
/// in [0, 9999] zero-pad to four digits. Seconds print only when the time
/// has seconds or milliseconds, milliseconds only when non-zero.
fn format_datetime(value: &NaiveDateTime) -> String {
    let year = value.year();
    let year_text = if year > 9999 {
        format!("+{}", year)
    } else if year < 0 {
        format!("-{:04}", -year)
    } else {
        format!("{:04}", year)
    };
    let mut out = format!(
        "{}-{:02}-{:02}T{:02}:{:02}",
        year_text,
        value.month(),
        value.day(),
        value.hour(),
        value.minute()
    );
    let second = value.second();
    let milli = value.nanosecond() / 1_000_000;
    if second > 0 || milli > 0 {
        out.push_str(&format!(":{:02}", second));
    }
    if milli > 0 {
        out.push_str(&format!(".{:03}", milli));
    }
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Long(value) => write!(f, "{}", value),
            Value::Double(value) => {
                let text = value.to_string();
                if text.contains('.') || text.contains('e') || text.contains('E') {
                    f.write_str(&text)
                } else {
                    write!(f, "{}.0", text)
                }
            }
            Value::Boolean(value) => write!(f, "{}", value),
            Value::String(value) => f.write_str(&quoted(value)),
            Value::DateTime(value) => f.write_str(&format_datetime(value)),
        }
    }
}

impl fmt::Display for Comparable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparable::Value(value) => value.fmt(f),
            Comparable::Variable(var) => var.fmt(f),
        }
    }
}

impl fmt::Display for ValueOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueOperation::Assignment(value) => value.fmt(f),
            ValueOperation::Comparison { comparator, rhs } => {
                write!(f, "{} {}", comparator, rhs)
            }
        }
    }
}

// STATEMENT RENDERING ======================================================

fn has_str(has: &HasConstraint) -> String {
    let attribute = match &has.attribute {
        HasAttribute::Variable(var) => var.to_string(),
        HasAttribute::Statement(statement) => match statement.value_operation() {
            Some(op) => op.to_string(),
            None => statement.to_string(),
        },
    };
    match &has.attribute_type {
        Some(attribute_type) => format!("has {} {}", attribute_type, attribute),
        None => format!("has {}", attribute),
    }
}

fn isa_str(type_ref: &TypeRef, exact: bool) -> String {
    format!("isa{} {}", if exact { "!" } else { "" }, type_ref)
}

fn thing_statement_str(statement: &ThingStatement) -> String {
    let mut parts: Vec<String> = Vec::new();
    // instance constraints print in grammar order: the core first, then the
    // attribute list in insertion order
    for constraint in &statement.constraints {
        match constraint {
            Constraint::Isa { type_ref, exact } => parts.insert(0, isa_str(type_ref, *exact)),
            Constraint::Id(id) => parts.insert(0, format!("id {}", id)),
            Constraint::NeqVar(var) => parts.insert(0, format!("!== {}", var)),
            _ => {}
        }
    }
    for constraint in &statement.constraints {
        if let Constraint::Has(has) = constraint {
            parts.push(has_str(has));
        }
    }
    format!("{} {}", statement.head, parts.join(", "))
}

fn relation_statement_str(statement: &RelationStatement) -> String {
    let mut out = String::new();
    if statement.head.is_visible() {
        out.push_str(&statement.head.to_string());
        out.push(' ');
    }
    for constraint in &statement.constraints {
        if let Constraint::Relation(relation) = constraint {
            let players: Vec<String> = relation
                .role_players
                .iter()
                .map(|role_player| match &role_player.role_type {
                    Some(role) => format!("{}: {}", role, role_player.player),
                    None => role_player.player.to_string(),
                })
                .collect();
            out.push('(');
            out.push_str(&players.join(", "));
            out.push(')');
        }
    }
    for constraint in &statement.constraints {
        if let Constraint::Isa { type_ref, exact } = constraint {
            out.push(' ');
            out.push_str(&isa_str(type_ref, *exact));
        }
    }
    for constraint in &statement.constraints {
        if let Constraint::Has(has) = constraint {
            out.push_str(", ");
            out.push_str(&has_str(has));
        }
    }
    out
}

fn attribute_statement_str(statement: &AttributeStatement) -> String {
    let mut out = String::new();
    if statement.head.is_visible() {
        out.push_str(&statement.head.to_string());
    }
    if let Some(op) = statement.value_operation() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&op.to_string());
    }
    for constraint in &statement.constraints {
        if let Constraint::Isa { type_ref, exact } = constraint {
            out.push(' ');
            out.push_str(&isa_str(type_ref, *exact));
        }
    }
    for constraint in &statement.constraints {
        if let Constraint::Has(has) = constraint {
            out.push_str(", ");
            out.push_str(&has_str(has));
        }
    }
    out
}

/// Renders a conjunction as a braced block. In pretty mode a block with
/// more than one pattern breaks across lines with a two-space indent.
fn conjunction_block(conjunction: &Conjunction, pretty: bool) -> String {
    if !pretty || conjunction.patterns.len() <= 1 {
        let inner: Vec<String> = conjunction
            .patterns
            .iter()
            .map(|pattern| format!("{};", pattern_str(pattern, false)))
            .collect();
        format!("{{ {} }}", inner.join(" "))
    } else {
        let mut out = String::from("{\n");
        for pattern in &conjunction.patterns {
            out.push_str("  ");
            out.push_str(&pattern_str(pattern, pretty));
            out.push_str(";\n");
        }
        out.push('}');
        out
    }
}

fn type_property_str(constraint: &Constraint, pretty: bool) -> Option<String> {
    let text = match constraint {
        Constraint::Label(label) => format!("type {}", label),
        Constraint::Sub { type_ref, exact } => {
            format!("sub{} {}", if *exact { "!" } else { "" }, type_ref)
        }
        Constraint::Abstract => "abstract".to_owned(),
        Constraint::Owns {
            attribute_type,
            is_key,
        } => format!("{} {}", if *is_key { "key" } else { "has" }, attribute_type),
        Constraint::Plays { role } => format!("plays {}", role),
        Constraint::Relates { role, overridden } => match overridden {
            Some(overridden) => format!("relates {} as {}", role, overridden),
            None => format!("relates {}", role),
        },
        Constraint::ValueType(value_type) => format!("value {}", value_type),
        Constraint::Regex(pattern) => format!("regex {}", quoted(pattern)),
        Constraint::When(when) => format!("when {}", conjunction_block(when, pretty)),
        Constraint::Then(then) => format!("then {{ {}; }}", statement_str(then, false)),
        _ => return None,
    };
    Some(text)
}

fn type_statement_str(statement: &TypeStatement, pretty: bool) -> String {
    let properties: Vec<String> = statement
        .constraints
        .iter()
        .filter_map(|constraint| type_property_str(constraint, pretty))
        .collect();
    if properties.is_empty() {
        statement.head.to_string()
    } else {
        format!("{} {}", statement.head, properties.join(", "))
    }
}

pub(crate) fn statement_str(statement: &Statement, pretty: bool) -> String {
    match statement {
        Statement::Type(statement) => type_statement_str(statement, pretty),
        Statement::Thing(statement) => thing_statement_str(statement),
        Statement::Relation(statement) => relation_statement_str(statement),
        Statement::Attribute(statement) => attribute_statement_str(statement),
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&statement_str(self, true))
    }
}

impl fmt::Display for TypeStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&type_statement_str(self, true))
    }
}

impl fmt::Display for ThingStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&thing_statement_str(self))
    }
}

impl fmt::Display for RelationStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&relation_statement_str(self))
    }
}

impl fmt::Display for AttributeStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&attribute_statement_str(self))
    }
}

// PATTERN RENDERING ========================================================

fn pattern_str(pattern: &Pattern, pretty: bool) -> String {
    match pattern {
        Pattern::Statement(statement) => statement_str(statement, pretty),
        Pattern::Conjunction(conjunction) => conjunction_block(conjunction, false),
        Pattern::Disjunction(disjunction) => {
            let branches: Vec<String> = disjunction
                .patterns
                .iter()
                .map(|branch| match branch {
                    Pattern::Conjunction(conjunction) => conjunction_block(conjunction, false),
                    other => format!("{{ {}; }}", pattern_str(other, false)),
                })
                .collect();
            branches.join(" or ")
        }
        Pattern::Negation(negation) => match &negation.pattern {
            Pattern::Conjunction(conjunction) => {
                format!("not {}", conjunction_block(conjunction, false))
            }
            other => format!("not {{ {}; }}", pattern_str(other, false)),
        },
    }
}

// A standalone pattern prints with its terminating `;` so the rendering
// feeds straight back into `parse_pattern`.
impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};", pattern_str(self, true))
    }
}

// QUERY RENDERING ==========================================================

fn match_str(clause: &MatchClause, pretty: bool) -> String {
    let patterns: Vec<String> = clause
        .patterns
        .patterns
        .iter()
        .map(|pattern| format!("{};", pattern_str(pattern, pretty)))
        .collect();
    if pretty && patterns.len() > 1 {
        format!("match\n{}", patterns.join("\n"))
    } else {
        format!("match {}", patterns.join(" "))
    }
}

fn clause_separator(pretty: bool) -> &'static str {
    if pretty {
        "\n"
    } else {
        " "
    }
}

fn statement_block(keyword: &str, statements: Vec<String>, pretty: bool) -> String {
    if pretty && statements.len() > 1 {
        format!("{}\n{}", keyword, statements.join("\n"))
    } else {
        format!("{} {}", keyword, statements.join(" "))
    }
}

fn get_query_str(query: &GetQuery, pretty: bool) -> String {
    let mut out = match_str(&query.match_clause, pretty);
    if pretty && query.match_clause.patterns.patterns.len() > 1 {
        out.push('\n');
    } else {
        out.push(' ');
    }
    out.push_str("get");
    if !query.filter.is_empty() {
        let vars: Vec<String> = query.filter.iter().map(Variable::to_string).collect();
        out.push(' ');
        out.push_str(&vars.join(", "));
    }
    out.push(';');
    if let Some(sorting) = &query.sorting {
        out.push_str(&format!(" sort {}", sorting.variable));
        if let Some(order) = sorting.order {
            out.push_str(&format!(" {}", order));
        }
        out.push(';');
    }
    if let Some(offset) = query.offset {
        out.push_str(&format!(" offset {};", offset));
    }
    if let Some(limit) = query.limit {
        out.push_str(&format!(" limit {};", limit));
    }
    out
}

fn insert_query_str(query: &InsertQuery, pretty: bool) -> String {
    let statements: Vec<String> = query
        .statements
        .iter()
        .map(|statement| format!("{};", statement_str(statement, pretty)))
        .collect();
    let body = statement_block("insert", statements, pretty);
    match &query.match_clause {
        Some(clause) => format!(
            "{}{}{}",
            match_str(clause, pretty),
            clause_separator(pretty),
            body
        ),
        None => body,
    }
}

fn delete_query_str(query: &DeleteQuery, pretty: bool) -> String {
    let statements: Vec<String> = query
        .statements
        .iter()
        .map(|statement| format!("{};", statement_str(statement, pretty)))
        .collect();
    format!(
        "{}{}{}",
        match_str(&query.match_clause, pretty),
        clause_separator(pretty),
        statement_block("delete", statements, pretty)
    )
}

fn definable_str(keyword: &str, statements: &[TypeStatement], pretty: bool) -> String {
    let statements: Vec<String> = statements
        .iter()
        .map(|statement| format!("{};", type_statement_str(statement, pretty)))
        .collect();
    statement_block(keyword, statements, pretty)
}

fn aggregate_tail(method: crate::token::AggregateMethod, variable: &Option<Variable>) -> String {
    match variable {
        Some(var) => format!(" {} {};", method, var),
        None => format!(" {};", method),
    }
}

fn compute_labels_str(labels: &[Label]) -> String {
    if labels.len() == 1 {
        labels[0].to_string()
    } else {
        let rendered: Vec<String> = labels.iter().map(Label::to_string).collect();
        format!("[{}]", rendered.join(", "))
    }
}

fn compute_query_str(query: &ComputeQuery) -> String {
    let mut conditions: Vec<String> = Vec::new();
    if let Some(from) = &query.from_id {
        conditions.push(format!("from {}", from));
    }
    if let Some(to) = &query.to_id {
        conditions.push(format!("to {}", to));
    }
    if let Some(of_types) = &query.of_types {
        if !of_types.is_empty() {
            conditions.push(format!("of {}", compute_labels_str(of_types)));
        }
    }
    if let Some(in_types) = &query.in_types {
        if !in_types.is_empty() {
            conditions.push(format!("in {}", compute_labels_str(in_types)));
        }
    }
    if let Some(algorithm) = query.algorithm {
        conditions.push(format!("using {}", algorithm));
    }
    if !query.arguments.is_empty() {
        let args: Vec<String> = query
            .arguments
            .iter()
            .map(|arg| {
                let value = match &arg.value {
                    ArgumentValue::Long(value) => value.to_string(),
                    ArgumentValue::Id(id) => id.clone(),
                };
                format!("{}={}", arg.param, value)
            })
            .collect();
        if args.len() == 1 {
            conditions.push(format!("where {}", args[0]));
        } else {
            conditions.push(format!("where [{}]", args.join(", ")));
        }
    }
    let mut out = format!("compute {}", query.method);
    if !conditions.is_empty() {
        out.push(' ');
        out.push_str(&conditions.join(", "));
    }
    out.push(';');
    out
}

fn query_str(query: &Query, pretty: bool) -> String {
    match query {
        Query::Define(DefineQuery { statements }) => definable_str("define", statements, pretty),
        Query::Undefine(UndefineQuery { statements }) => {
            definable_str("undefine", statements, pretty)
        }
        Query::Insert(query) => insert_query_str(query, pretty),
        Query::Delete(query) => delete_query_str(query, pretty),
        Query::Get(query) => get_query_str(query, pretty),
        Query::Aggregate(AggregateQuery {
            get,
            method,
            variable,
        }) => format!("{}{}", get_query_str(get, pretty), aggregate_tail(*method, variable)),
        Query::Group(GroupQuery { get, variable }) => {
            format!("{} group {};", get_query_str(get, pretty), variable)
        }
        Query::GroupAggregate(GroupAggregateQuery {
            group,
            method,
            variable,
        }) => format!(
            "{} group {};{}",
            get_query_str(&group.get, pretty),
            group.variable,
            aggregate_tail(*method, variable)
        ),
        Query::Compute(query) => compute_query_str(query),
    }
}

impl Query {
    /// The canonical pretty rendering; `Display`/`to_string` use this.
    pub fn to_pretty_string(&self) -> String {
        query_str(self, true)
    }

    /// A single-line rendering that parses back to the same AST.
    pub fn to_compact_string(&self) -> String {
        query_str(self, false)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&query_str(self, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn datetime_formatting() {
        let datetime = |y, mo, d, h, mi, s, ms| {
            NaiveDate::from_ymd_opt(y, mo, d)
                .unwrap()
                .and_hms_milli_opt(h, mi, s, ms)
                .unwrap()
        };
        assert_eq!(format_datetime(&datetime(867, 1, 1, 0, 0, 0, 0)), "0867-01-01T00:00");
        assert_eq!(
            format_datetime(&datetime(1000, 11, 12, 13, 14, 15, 100)),
            "1000-11-12T13:14:15.100"
        );
        assert_eq!(
            format_datetime(&datetime(1000, 11, 12, 13, 14, 15, 0)),
            "1000-11-12T13:14:15"
        );
        assert_eq!(
            format_datetime(&datetime(12345, 12, 25, 0, 0, 0, 0)),
            "+12345-12-25T00:00"
        );
        assert_eq!(
            format_datetime(&datetime(-3200, 1, 1, 0, 0, 0, 0)),
            "-3200-01-01T00:00"
        );
    }

    #[test]
    fn doubles_keep_a_decimal_point() {
        assert_eq!(Value::Double(9.0).to_string(), "9.0");
        assert_eq!(Value::Double(8.5).to_string(), "8.5");
    }

    #[test]
    fn strings_quote_and_escape() {
        assert_eq!(Value::String("alice/bob".into()).to_string(), "\"alice/bob\"");
        assert_eq!(Value::String(r"\d".into()).to_string(), "\"\\d\"");
        assert_eq!(Value::String("say \"hi\"".into()).to_string(), "\"say \\\"hi\\\"\"");
    }
}
