// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Parser for TypeQL over the lexer's token stream. Free parsing functions
//! combine with nom; alternatives backtrack freely, and every primitive
//! failure records a high-water mark of the furthest token reached so a
//! failed parse can point its diagnostic at the right spot. Semantic errors
//! raised while assembling AST nodes travel as non-recoverable failures, so
//! they surface unchanged instead of turning into syntax errors.

use std::cell::Cell;

use log::debug;
use nom::{
    branch::alt,
    combinator::{map, opt},
    multi::{many0, many1, separated_list0, separated_list1},
    sequence::{preceded, terminated},
    IResult,
};

use crate::ast::{
    AttributeStatement, Comparable, ComputeArgument, ComputeQuery, Conjunction, Constraint,
    DefineQuery, DeleteQuery, Disjunction, GetQuery, HasConstraint, InsertQuery, Label,
    MatchClause, Negation, Pattern, Query, RelationStatement, RolePlayer, Statement,
    ThingStatement, TypeRef, TypeStatement, UndefineQuery, Value, ValueOperation, Variable,
};
use crate::error::{self, TypeQLError};
use crate::lexer::{tokenize, SpannedToken, Token};
use crate::token::{
    AggregateMethod, Comparator, ComputeAlgorithm, ComputeMethod, ComputeParam, Keyword, Order,
    ValueType,
};

type Tokens<'a> = &'a [SpannedToken];

/// Parser-side error: either a plain positional failure (rendered as a
/// syntax error from the high-water mark) or a semantic error carried to
/// the caller unchanged.
#[derive(Debug)]
struct PError {
    semantic: Option<TypeQLError>,
}

impl<'a> nom::error::ParseError<Tokens<'a>> for PError {
    fn from_error_kind(input: Tokens<'a>, _kind: nom::error::ErrorKind) -> Self {
        note_failure(input);
        PError { semantic: None }
    }

    fn append(_input: Tokens<'a>, _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'a, T> = IResult<Tokens<'a>, T, PError>;

thread_local! {
    /// Smallest number of unconsumed tokens seen at any failure, i.e. the
    /// furthest the parse progressed before failing.
    static FURTHEST_REMAINING: Cell<usize> = const { Cell::new(usize::MAX) };
}

fn note_failure(input: Tokens<'_>) {
    FURTHEST_REMAINING.with(|cell| cell.set(cell.get().min(input.len())));
}

fn reset_failures() {
    FURTHEST_REMAINING.with(|cell| cell.set(usize::MAX));
}

fn furthest_index(total: usize) -> usize {
    FURTHEST_REMAINING.with(|cell| {
        let remaining = cell.get();
        if remaining == usize::MAX || remaining > total {
            0
        } else {
            total - remaining
        }
    })
}

fn fail<T>(input: Tokens<'_>) -> PResult<'_, T> {
    note_failure(input);
    Err(nom::Err::Error(PError { semantic: None }))
}

fn semantic_err<'a, T>(error: TypeQLError) -> PResult<'a, T> {
    Err(nom::Err::Failure(PError {
        semantic: Some(error),
    }))
}

/// Runs a parser over a token slice, turning a failure into either its
/// semantic error or a caret-rendered syntax error at the furthest token.
fn run<'a, T>(
    source: &str,
    tokens: Tokens<'a>,
    parser: impl FnOnce(Tokens<'a>) -> PResult<'a, T>,
) -> Result<(Tokens<'a>, T), TypeQLError> {
    reset_failures();
    match parser(tokens) {
        Ok(ok) => Ok(ok),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            if let Some(semantic) = e.semantic {
                return Err(semantic);
            }
            let index = furthest_index(tokens.len()).min(tokens.len().saturating_sub(1));
            let spanned = &tokens[index];
            Err(error::syntax_error(source, spanned.line, spanned.column))
        }
        Err(nom::Err::Incomplete(_)) => {
            let spanned = &tokens[tokens.len().saturating_sub(1)];
            Err(error::syntax_error(source, spanned.line, spanned.column))
        }
    }
}

fn only_eof(tokens: &[SpannedToken]) -> bool {
    tokens.len() == 1 && tokens[0].token == Token::Eof
}

// ENTRY POINTS =============================================================

/// Parses exactly one query; trailing content is rejected.
pub fn parse_query(source: &str) -> Result<Query, TypeQLError> {
    debug!("parsing single query");
    let tokens = tokenize(source)?;
    if only_eof(&tokens) {
        return Err(TypeQLError::EmptyInput);
    }
    let (rest, query) = run(source, &tokens, query)?;
    match rest.first().map(|spanned| &spanned.token) {
        Some(Token::Eof) | None => Ok(query),
        Some(Token::Keyword(
            Keyword::Match | Keyword::Insert | Keyword::Define | Keyword::Undefine | Keyword::Compute,
        )) => Err(TypeQLError::MultipleQueries),
        Some(_) => {
            let spanned = &rest[0];
            Err(error::syntax_error(source, spanned.line, spanned.column))
        }
    }
}

/// Lazily parses a sequence of queries. Lexing happens up front; each call
/// to `next` parses one query, so arbitrarily long inputs consume constant
/// stack.
pub fn parse_query_list(source: &str) -> Result<QueryIterator, TypeQLError> {
    let tokens = tokenize(source)?;
    if only_eof(&tokens) {
        return Err(TypeQLError::EmptyInput);
    }
    Ok(QueryIterator {
        source: source.to_owned(),
        tokens,
        position: 0,
        failed: false,
    })
}

/// Parses exactly one pattern: a braced block or a bare statement, either
/// way terminated by `;`.
pub fn parse_pattern(source: &str) -> Result<Pattern, TypeQLError> {
    let tokens = tokenize(source)?;
    if only_eof(&tokens) {
        return Err(TypeQLError::EmptyInput);
    }
    let (rest, parsed) = run(source, &tokens, pattern)?;
    match rest.first().map(|spanned| &spanned.token) {
        Some(Token::Eof) | None => Ok(parsed),
        Some(_) => {
            let spanned = &rest[0];
            Err(error::syntax_error(source, spanned.line, spanned.column))
        }
    }
}

/// Lazily parses a sequence of patterns.
pub fn parse_pattern_list(source: &str) -> Result<PatternIterator, TypeQLError> {
    let tokens = tokenize(source)?;
    if only_eof(&tokens) {
        return Err(TypeQLError::EmptyInput);
    }
    Ok(PatternIterator {
        source: source.to_owned(),
        tokens,
        position: 0,
        failed: false,
    })
}

/// Iterator over the queries of a multi-query input.
#[derive(Debug)]
pub struct QueryIterator {
    source: String,
    tokens: Vec<SpannedToken>,
    position: usize,
    failed: bool,
}

impl Iterator for QueryIterator {
    type Item = Result<Query, TypeQLError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let tokens = &self.tokens[self.position..];
        if tokens.is_empty() || tokens[0].token == Token::Eof {
            return None;
        }
        match run(&self.source, tokens, query) {
            Ok((rest, parsed)) => {
                self.position = self.tokens.len() - rest.len();
                Some(Ok(parsed))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Iterator over the patterns of a multi-pattern input.
pub struct PatternIterator {
    source: String,
    tokens: Vec<SpannedToken>,
    position: usize,
    failed: bool,
}

impl Iterator for PatternIterator {
    type Item = Result<Pattern, TypeQLError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let tokens = &self.tokens[self.position..];
        if tokens.is_empty() || tokens[0].token == Token::Eof {
            return None;
        }
        match run(&self.source, tokens, pattern) {
            Ok((rest, parsed)) => {
                self.position = self.tokens.len() - rest.len();
                Some(Ok(parsed))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

// PRIMITIVES ===============================================================

fn tok<'a>(expected: Token) -> impl Fn(Tokens<'a>) -> PResult<'a, ()> {
    move |input: Tokens<'a>| match input.first() {
        Some(spanned) if spanned.token == expected => Ok((&input[1..], ())),
        _ => fail(input),
    }
}

fn kw<'a>(keyword: Keyword) -> impl Fn(Tokens<'a>) -> PResult<'a, ()> {
    tok(Token::Keyword(keyword))
}

fn peek_token(input: Tokens<'_>) -> Option<&Token> {
    input.first().map(|spanned| &spanned.token)
}

fn peek_keyword(input: Tokens<'_>) -> Option<Keyword> {
    match peek_token(input) {
        Some(Token::Keyword(keyword)) => Some(*keyword),
        _ => None,
    }
}

fn ident(input: Tokens<'_>) -> PResult<'_, String> {
    match input.first() {
        Some(SpannedToken {
            token: Token::Ident(name),
            ..
        }) => Ok((&input[1..], name.clone())),
        _ => fail(input),
    }
}

/// A label component: an identifier, or an unreserved keyword usable as a
/// type name.
fn label_part(input: Tokens<'_>) -> PResult<'_, String> {
    match input.first() {
        Some(SpannedToken {
            token: Token::Ident(name),
            ..
        }) => Ok((&input[1..], name.clone())),
        Some(SpannedToken {
            token: Token::Keyword(keyword),
            ..
        }) if keyword.is_unreserved() => Ok((&input[1..], keyword.as_str().to_owned())),
        _ => fail(input),
    }
}

/// `scope:name` or a bare label.
fn type_label(input: Tokens<'_>) -> PResult<'_, Label> {
    let (input, first) = label_part(input)?;
    if let Ok((rest, _)) = tok(Token::Colon)(input) {
        if let Ok((rest, second)) = label_part(rest) {
            return Ok((rest, Label::scoped(first, second)));
        }
    }
    Ok((input, Label::new(first)))
}

/// `$name` or `$_`.
fn concept_var(input: Tokens<'_>) -> PResult<'_, Variable> {
    match input.first() {
        Some(SpannedToken {
            token: Token::Var(name),
            ..
        }) => Ok((&input[1..], Variable::named_concept(name.clone()))),
        Some(SpannedToken {
            token: Token::AnonVar,
            ..
        }) => Ok((&input[1..], Variable::anonymous())),
        _ => fail(input),
    }
}

fn named_concept_var(input: Tokens<'_>) -> PResult<'_, Variable> {
    match input.first() {
        Some(SpannedToken {
            token: Token::Var(name),
            ..
        }) => Ok((&input[1..], Variable::named_concept(name.clone()))),
        _ => fail(input),
    }
}

/// A named variable usable inside a value comparison: `$x` or `?x`.
fn comparison_var(input: Tokens<'_>) -> PResult<'_, Variable> {
    match input.first() {
        Some(SpannedToken {
            token: Token::Var(name),
            ..
        }) => Ok((&input[1..], Variable::named_concept(name.clone()))),
        Some(SpannedToken {
            token: Token::ValueVar(name),
            ..
        }) => Ok((&input[1..], Variable::named_value(name.clone()))),
        _ => fail(input),
    }
}

/// A variable that may head an attribute statement.
fn attribute_head_var(input: Tokens<'_>) -> PResult<'_, Variable> {
    match input.first() {
        Some(SpannedToken {
            token: Token::Var(name),
            ..
        }) => Ok((&input[1..], Variable::named_concept(name.clone()))),
        Some(SpannedToken {
            token: Token::ValueVar(name),
            ..
        }) => Ok((&input[1..], Variable::named_value(name.clone()))),
        Some(SpannedToken {
            token: Token::AnonVar,
            ..
        }) => Ok((&input[1..], Variable::anonymous())),
        _ => fail(input),
    }
}

fn type_ref(input: Tokens<'_>) -> PResult<'_, TypeRef> {
    if let Ok((rest, var)) = concept_var(input) {
        return Ok((rest, TypeRef::Variable(var)));
    }
    let (rest, label) = type_label(input)?;
    Ok((rest, TypeRef::Label(label)))
}

fn string_lit(input: Tokens<'_>) -> PResult<'_, String> {
    match input.first() {
        Some(SpannedToken {
            token: Token::StringLit(text),
            ..
        }) => Ok((&input[1..], text.clone())),
        _ => fail(input),
    }
}

fn integer_lit(input: Tokens<'_>) -> PResult<'_, i64> {
    match input.first() {
        Some(SpannedToken {
            token: Token::LongLit(value),
            ..
        }) => Ok((&input[1..], *value)),
        _ => fail(input),
    }
}

fn value_lit(input: Tokens<'_>) -> PResult<'_, Value> {
    let value = match peek_token(input) {
        Some(Token::StringLit(text)) => Value::String(text.clone()),
        Some(Token::LongLit(value)) => Value::Long(*value),
        Some(Token::DoubleLit(value)) => Value::Double(*value),
        Some(Token::BoolLit(value)) => Value::Boolean(*value),
        Some(Token::DateTimeLit(value)) => Value::DateTime(*value),
        _ => return fail(input),
    };
    Ok((&input[1..], value))
}

/// Regex-valued strings keep their escapes except `\/`, which unescapes to
/// a plain slash.
fn unescape_regex(text: &str) -> String {
    text.replace("\\/", "/")
}

// VALUE OPERATIONS =========================================================

fn comparator(input: Tokens<'_>) -> PResult<'_, Comparator> {
    let comparator = match peek_token(input) {
        // `=` and `==` both mean equality
        Some(Token::Eq) | Some(Token::Assign) => Comparator::Eq,
        Some(Token::Neq) => Comparator::Neq,
        Some(Token::Lt) => Comparator::Lt,
        Some(Token::Lte) => Comparator::Lte,
        Some(Token::Gt) => Comparator::Gt,
        Some(Token::Gte) => Comparator::Gte,
        _ => return fail(input),
    };
    Ok((&input[1..], comparator))
}

fn comparable(input: Tokens<'_>) -> PResult<'_, Comparable> {
    if let Ok((rest, value)) = value_lit(input) {
        return Ok((rest, Comparable::Value(value)));
    }
    let (rest, var) = comparison_var(input)?;
    Ok((rest, Comparable::Variable(var)))
}

fn operation(input: Tokens<'_>) -> PResult<'_, ValueOperation> {
    if let Ok((rest, cmp)) = comparator(input) {
        let (rest, rhs) = comparable(rest)?;
        return Ok((
            rest,
            ValueOperation::Comparison {
                comparator: cmp,
                rhs,
            },
        ));
    }
    if let Ok((rest, _)) = kw(Keyword::Contains)(input) {
        let (rest, rhs) = comparable_containable(rest)?;
        return Ok((
            rest,
            ValueOperation::Comparison {
                comparator: Comparator::Contains,
                rhs,
            },
        ));
    }
    if let Ok((rest, _)) = kw(Keyword::Like)(input) {
        let (rest, pattern) = string_lit(rest)?;
        return Ok((
            rest,
            ValueOperation::Comparison {
                comparator: Comparator::Like,
                rhs: Comparable::Value(Value::String(unescape_regex(&pattern))),
            },
        ));
    }
    let (rest, value) = value_lit(input)?;
    Ok((rest, ValueOperation::Assignment(value)))
}

fn comparable_containable(input: Tokens<'_>) -> PResult<'_, Comparable> {
    if let Ok((rest, text)) = string_lit(input) {
        return Ok((rest, Comparable::Value(Value::String(text))));
    }
    let (rest, var) = comparison_var(input)?;
    Ok((rest, Comparable::Variable(var)))
}

// STATEMENTS ===============================================================

/// `has <attribute-type> (<variable> | <operation>)` on an instance. The
/// attribute-only ownership form belongs to type statements and fails
/// here, which lets the statement alternatives disambiguate.
fn has_attribute(input: Tokens<'_>) -> PResult<'_, Constraint> {
    let (input, _) = kw(Keyword::Has)(input)?;
    let (input, attribute_type) = label_part(input)?;
    if let Ok((rest, var)) = comparison_var(input) {
        return Ok((
            rest,
            Constraint::Has(HasConstraint::with_variable(attribute_type, var)),
        ));
    }
    let (input, op) = operation(input)?;
    Ok((
        input,
        Constraint::Has(HasConstraint::with_operation(attribute_type, op)),
    ))
}

fn isa_clause(input: Tokens<'_>) -> PResult<'_, Constraint> {
    let (input, exact) = if let Ok((rest, _)) = kw(Keyword::Isa)(input) {
        (rest, false)
    } else {
        let (rest, _) = kw(Keyword::IsaX)(input)?;
        (rest, true)
    };
    let (input, target) = type_ref(input)?;
    Ok((
        input,
        Constraint::Isa {
            type_ref: target,
            exact,
        },
    ))
}

fn thing_statement(input: Tokens<'_>) -> PResult<'_, Statement> {
    let (input, head) = concept_var(input)?;

    // `$x !== $y`
    if let Ok((rest, _)) = tok(Token::Neq)(input) {
        if let Ok((rest, other)) = named_concept_var(rest) {
            let statement = ThingStatement::new(head).constrain(Constraint::NeqVar(other));
            return Ok((rest, Statement::Thing(statement)));
        }
    }

    let mut statement = ThingStatement::new(head);
    let (input, core) = opt(alt((isa_clause, id_clause)))(input)?;
    let has_core = core.is_some();
    if let Some(constraint) = core {
        statement = statement.constrain(constraint);
    }

    let (input, attributes) = if has_core {
        many0(preceded(tok(Token::Comma), has_attribute))(input)?
    } else {
        separated_list1(tok(Token::Comma), has_attribute)(input)?
    };
    for constraint in attributes {
        statement = statement.constrain(constraint);
    }
    Ok((input, Statement::Thing(statement)))
}

fn id_clause(input: Tokens<'_>) -> PResult<'_, Constraint> {
    let (input, _) = kw(Keyword::Id)(input)?;
    let (input, id) = ident(input)?;
    Ok((input, Constraint::Id(id)))
}

fn role_player(input: Tokens<'_>) -> PResult<'_, RolePlayer> {
    let (input, role_type) = opt(terminated(type_ref, tok(Token::Colon)))(input)?;
    let (input, player) = concept_var(input)?;
    Ok((input, RolePlayer { role_type, player }))
}

fn relation_statement(input: Tokens<'_>) -> PResult<'_, Statement> {
    let (input, head) = opt(concept_var)(input)?;
    let (input, _) = tok(Token::ParenOpen)(input)?;
    let (input, role_players) = separated_list1(tok(Token::Comma), role_player)(input)?;
    let (input, _) = tok(Token::ParenClose)(input)?;

    let mut statement = RelationStatement::new(head.unwrap_or_else(Variable::hidden)).constrain(
        Constraint::Relation(crate::ast::RelationConstraint { role_players }),
    );
    let (input, isa) = opt(isa_clause)(input)?;
    if let Some(constraint) = isa {
        statement = statement.constrain(constraint);
    }
    let (input, attributes) = many0(preceded(tok(Token::Comma), has_attribute))(input)?;
    for constraint in attributes {
        statement = statement.constrain(constraint);
    }
    Ok((input, Statement::Relation(statement)))
}

fn attribute_statement(input: Tokens<'_>) -> PResult<'_, Statement> {
    let (input, head) = opt(attribute_head_var)(input)?;
    let (input, op) = operation(input)?;
    let mut statement = AttributeStatement::new(head.unwrap_or_else(Variable::hidden))
        .constrain(Constraint::Value(op));
    let (input, isa) = opt(isa_clause)(input)?;
    if let Some(constraint) = isa {
        statement = statement.constrain(constraint);
    }
    let (input, attributes) = many0(preceded(tok(Token::Comma), has_attribute))(input)?;
    for constraint in attributes {
        statement = statement.constrain(constraint);
    }
    Ok((input, Statement::Attribute(statement)))
}

fn type_statement(input: Tokens<'_>) -> PResult<'_, TypeStatement> {
    let (input, head) = if let Ok((rest, var)) = concept_var(input) {
        (rest, var)
    } else {
        let (rest, label) = type_label(input)?;
        (rest, Variable::Label(label))
    };
    let head_name = match &head {
        Variable::Label(label) => label.name.clone(),
        other => other.to_string(),
    };
    let (input, properties) = separated_list1(tok(Token::Comma), |tokens| {
        type_property(tokens, &head_name)
    })(input)?;
    let mut statement = TypeStatement::new(head);
    for constraint in properties {
        statement = statement.constrain(constraint);
    }
    Ok((input, statement))
}

fn type_property<'a>(input: Tokens<'a>, head_name: &str) -> PResult<'a, Constraint> {
    match peek_keyword(input) {
        Some(sub @ (Keyword::Sub | Keyword::SubX)) => {
            let (input, target) = type_ref(&input[1..])?;
            Ok((
                input,
                Constraint::Sub {
                    type_ref: target,
                    exact: sub == Keyword::SubX,
                },
            ))
        }
        Some(Keyword::Abstract) => Ok((&input[1..], Constraint::Abstract)),
        Some(ownership @ (Keyword::Has | Keyword::Key)) => {
            let (input, attribute_type) = type_ref(&input[1..])?;
            Ok((
                input,
                Constraint::Owns {
                    attribute_type,
                    is_key: ownership == Keyword::Key,
                },
            ))
        }
        Some(Keyword::Plays) => {
            let (input, role) = type_ref(&input[1..])?;
            Ok((input, Constraint::Plays { role }))
        }
        Some(Keyword::Relates) => {
            let (input, role) = type_ref(&input[1..])?;
            let (input, overridden) = opt(preceded(kw(Keyword::As), type_ref))(input)?;
            Ok((input, Constraint::Relates { role, overridden }))
        }
        Some(Keyword::Value) => {
            let input_after = &input[1..];
            match peek_token(input_after) {
                Some(Token::Keyword(keyword)) => match ValueType::of(keyword.as_str()) {
                    Some(value_type) => Ok((&input_after[1..], Constraint::ValueType(value_type))),
                    None => fail(input_after),
                },
                Some(Token::Ident(name)) => semantic_err(TypeQLError::UnrecognisedToken {
                    token: name.clone(),
                    context: "value type",
                }),
                _ => fail(input_after),
            }
        }
        Some(Keyword::Regex) => {
            let (input, pattern) = string_lit(&input[1..])?;
            Ok((input, Constraint::Regex(unescape_regex(&pattern))))
        }
        Some(Keyword::When) => {
            let (input, _) = tok(Token::CurlyOpen)(&input[1..])?;
            let (input, patterns) = many1(pattern)(input)?;
            let (input, _) = tok(Token::CurlyClose)(input)?;
            Ok((input, Constraint::When(Conjunction::new(patterns))))
        }
        Some(Keyword::Then) => {
            let (input, _) = tok(Token::CurlyOpen)(&input[1..])?;
            let (input, mut statements) =
                many1(terminated(statement_instance, tok(Token::Semicolon)))(input)?;
            let (input, _) = tok(Token::CurlyClose)(input)?;
            if statements.len() != 1 {
                return semantic_err(TypeQLError::InvalidRule {
                    label: head_name.to_owned(),
                    reason: crate::error::RuleReason::BadThenShape,
                });
            }
            Ok((
                input,
                Constraint::Then(Box::new(statements.remove(0))),
            ))
        }
        Some(Keyword::Type) => {
            let (input, label) = type_label(&input[1..])?;
            Ok((input, Constraint::Label(label)))
        }
        _ => fail(input),
    }
}

fn statement(input: Tokens<'_>) -> PResult<'_, Statement> {
    alt((
        relation_statement,
        thing_statement,
        attribute_statement,
        map(type_statement, Statement::Type),
    ))(input)
}

fn statement_instance(input: Tokens<'_>) -> PResult<'_, Statement> {
    alt((relation_statement, thing_statement, attribute_statement))(input)
}

// PATTERNS =================================================================

fn and_collapse(mut patterns: Vec<Pattern>) -> Pattern {
    if patterns.len() == 1 {
        patterns.remove(0)
    } else {
        Pattern::Conjunction(Conjunction::new(patterns))
    }
}

fn braced_patterns(input: Tokens<'_>) -> PResult<'_, Vec<Pattern>> {
    let (input, _) = tok(Token::CurlyOpen)(input)?;
    let (input, patterns) = many1(pattern)(input)?;
    let (input, _) = tok(Token::CurlyClose)(input)?;
    Ok((input, patterns))
}

fn pattern(input: Tokens<'_>) -> PResult<'_, Pattern> {
    match peek_token(input) {
        Some(Token::Keyword(Keyword::Not)) => {
            let (input, patterns) = braced_patterns(&input[1..])?;
            let (input, _) = tok(Token::Semicolon)(input)?;
            Ok((
                input,
                Pattern::Negation(Box::new(Negation {
                    pattern: and_collapse(patterns),
                })),
            ))
        }
        Some(Token::CurlyOpen) => {
            let (input, first) = braced_patterns(input)?;
            let (input, others) = many0(preceded(kw(Keyword::Or), braced_patterns))(input)?;
            let (input, _) = tok(Token::Semicolon)(input)?;
            if others.is_empty() {
                Ok((input, and_collapse(first)))
            } else {
                let mut branches = vec![and_collapse(first)];
                branches.extend(others.into_iter().map(and_collapse));
                Ok((input, Pattern::Disjunction(Disjunction { patterns: branches })))
            }
        }
        _ => {
            let (input, parsed) = terminated(statement, tok(Token::Semicolon))(input)?;
            Ok((input, Pattern::Statement(parsed)))
        }
    }
}

// QUERIES ==================================================================

fn query(input: Tokens<'_>) -> PResult<'_, Query> {
    match peek_keyword(input) {
        Some(Keyword::Match) => query_match(input),
        Some(Keyword::Define) => query_define(input),
        Some(Keyword::Undefine) => query_undefine(input),
        Some(Keyword::Insert) => query_insert(input),
        Some(Keyword::Compute) => query_compute(input),
        _ => fail(input),
    }
}

fn query_define(input: Tokens<'_>) -> PResult<'_, Query> {
    let (input, _) = kw(Keyword::Define)(input)?;
    let (input, statements) =
        many1(terminated(type_statement, tok(Token::Semicolon)))(input)?;
    match DefineQuery::new(statements) {
        Ok(query) => Ok((input, Query::Define(query))),
        Err(e) => semantic_err(e),
    }
}

fn query_undefine(input: Tokens<'_>) -> PResult<'_, Query> {
    let (input, _) = kw(Keyword::Undefine)(input)?;
    let (input, statements) =
        many1(terminated(type_statement, tok(Token::Semicolon)))(input)?;
    match UndefineQuery::new(statements) {
        Ok(query) => Ok((input, Query::Undefine(query))),
        Err(e) => semantic_err(e),
    }
}

fn instance_statements(input: Tokens<'_>) -> PResult<'_, Vec<Statement>> {
    many1(terminated(statement_instance, tok(Token::Semicolon)))(input)
}

fn query_insert(input: Tokens<'_>) -> PResult<'_, Query> {
    let (input, _) = kw(Keyword::Insert)(input)?;
    let (input, statements) = instance_statements(input)?;
    match InsertQuery::new(None, statements) {
        Ok(query) => Ok((input, Query::Insert(query))),
        Err(e) => semantic_err(e),
    }
}

fn query_match(input: Tokens<'_>) -> PResult<'_, Query> {
    let (input, _) = kw(Keyword::Match)(input)?;
    let (input, patterns) = many1(pattern)(input)?;
    let clause = MatchClause::new(patterns);
    match peek_keyword(input) {
        Some(Keyword::Get) => query_get_tail(clause, input),
        Some(Keyword::Insert) => {
            let (input, statements) = instance_statements(&input[1..])?;
            match InsertQuery::new(Some(clause), statements) {
                Ok(query) => Ok((input, Query::Insert(query))),
                Err(e) => semantic_err(e),
            }
        }
        Some(Keyword::Delete) => {
            let (input, statements) = instance_statements(&input[1..])?;
            match DeleteQuery::new(clause, statements) {
                Ok(query) => Ok((input, Query::Delete(query))),
                Err(e) => semantic_err(e),
            }
        }
        _ => fail(input),
    }
}

fn query_get_tail<'a>(clause: MatchClause, input: Tokens<'a>) -> PResult<'a, Query> {
    let (input, _) = kw(Keyword::Get)(input)?;
    let (input, filter) = separated_list0(tok(Token::Comma), named_concept_var)(input)?;
    let (input, _) = tok(Token::Semicolon)(input)?;

    let mut get = match GetQuery::new(clause, filter) {
        Ok(get) => get,
        Err(e) => return semantic_err(e),
    };

    let (input, sorting) = opt(sort_clause)(input)?;
    if let Some((variable, order)) = sorting {
        get = match get.sort(variable, order) {
            Ok(get) => get,
            Err(e) => return semantic_err(e),
        };
    }
    let (input, offset) = opt(offset_clause)(input)?;
    if let Some(offset) = offset {
        get = get.offset(offset);
    }
    let (input, limit) = opt(limit_clause)(input)?;
    if let Some(limit) = limit {
        get = get.limit(limit);
    }

    // aggregate or group tail
    if let Some(keyword) = peek_keyword(input) {
        if let Some(method) = aggregate_method(keyword) {
            let (input, variable) = opt(named_concept_var)(&input[1..])?;
            let (input, _) = tok(Token::Semicolon)(input)?;
            return match get.aggregate(method, variable) {
                Ok(aggregate) => Ok((input, Query::Aggregate(aggregate))),
                Err(e) => semantic_err(e),
            };
        }
        if keyword == Keyword::Group {
            let (input, variable) = named_concept_var(&input[1..])?;
            let (input, _) = tok(Token::Semicolon)(input)?;
            let group = match get.group(variable) {
                Ok(group) => group,
                Err(e) => return semantic_err(e),
            };
            if let Some(keyword) = peek_keyword(input) {
                if let Some(method) = aggregate_method(keyword) {
                    let (input, variable) = opt(named_concept_var)(&input[1..])?;
                    let (input, _) = tok(Token::Semicolon)(input)?;
                    return match group.aggregate(method, variable) {
                        Ok(aggregate) => Ok((input, Query::GroupAggregate(aggregate))),
                        Err(e) => semantic_err(e),
                    };
                }
            }
            return Ok((input, Query::Group(group)));
        }
    }
    Ok((input, Query::Get(get)))
}

fn aggregate_method(keyword: Keyword) -> Option<AggregateMethod> {
    AggregateMethod::of(keyword.as_str())
}

fn sort_clause(input: Tokens<'_>) -> PResult<'_, (Variable, Option<Order>)> {
    let (input, _) = kw(Keyword::Sort)(input)?;
    let (input, variable) = named_concept_var(input)?;
    let (input, order) = opt(order)(input)?;
    let (input, _) = tok(Token::Semicolon)(input)?;
    Ok((input, (variable, order)))
}

fn order(input: Tokens<'_>) -> PResult<'_, Order> {
    match peek_keyword(input) {
        Some(Keyword::Asc) => Ok((&input[1..], Order::Asc)),
        Some(Keyword::Desc) => Ok((&input[1..], Order::Desc)),
        _ => fail(input),
    }
}

fn offset_clause(input: Tokens<'_>) -> PResult<'_, u64> {
    let (input, _) = kw(Keyword::Offset)(input)?;
    let (input, value) = integer_lit(input)?;
    if value < 0 {
        return fail(input);
    }
    let (input, _) = tok(Token::Semicolon)(input)?;
    Ok((input, value as u64))
}

fn limit_clause(input: Tokens<'_>) -> PResult<'_, u64> {
    let (input, _) = kw(Keyword::Limit)(input)?;
    let (input, value) = integer_lit(input)?;
    if value < 0 {
        return fail(input);
    }
    let (input, _) = tok(Token::Semicolon)(input)?;
    Ok((input, value as u64))
}

// COMPUTE ==================================================================

enum ComputeConditionAst {
    From(String),
    To(String),
    Of(Vec<Label>),
    In(Vec<Label>),
    Using(ComputeAlgorithm),
    Where(Vec<ComputeArgument>),
}

fn query_compute(input: Tokens<'_>) -> PResult<'_, Query> {
    let (input, _) = kw(Keyword::Compute)(input)?;
    let (input, method) = compute_method(input)?;
    let (input, conditions) =
        separated_list0(tok(Token::Comma), compute_condition)(input)?;
    let (input, _) = tok(Token::Semicolon)(input)?;

    let mut query = ComputeQuery::new(method);
    let mut usings = Vec::new();
    let mut wheres = Vec::new();
    for condition in conditions {
        match condition {
            ComputeConditionAst::From(id) => query = query.from(id),
            ComputeConditionAst::To(id) => query = query.to(id),
            ComputeConditionAst::Of(types) => query = query.of(types),
            ComputeConditionAst::In(types) => query = query.in_(types),
            ComputeConditionAst::Using(algorithm) => usings.push(algorithm),
            ComputeConditionAst::Where(args) => wheres.push(args),
        }
    }
    // the algorithm governs which arguments are accepted, so apply `using`
    // conditions before `where` conditions regardless of written order
    for algorithm in usings {
        query = match query.using(algorithm) {
            Ok(query) => query,
            Err(e) => return semantic_err(e),
        };
    }
    for args in wheres {
        query = match query.where_(args) {
            Ok(query) => query,
            Err(e) => return semantic_err(e),
        };
    }
    match query.validated() {
        Ok(query) => Ok((input, Query::Compute(query))),
        Err(e) => semantic_err(e),
    }
}

fn compute_method(input: Tokens<'_>) -> PResult<'_, ComputeMethod> {
    match peek_token(input) {
        Some(Token::Keyword(keyword)) => match ComputeMethod::of(keyword.as_str()) {
            Some(method) => Ok((&input[1..], method)),
            None => fail(input),
        },
        Some(Token::Ident(name)) => semantic_err(TypeQLError::UnrecognisedToken {
            token: name.clone(),
            context: "compute method",
        }),
        _ => fail(input),
    }
}

fn compute_condition(input: Tokens<'_>) -> PResult<'_, ComputeConditionAst> {
    match peek_keyword(input) {
        Some(Keyword::From) => {
            let (input, id) = ident(&input[1..])?;
            Ok((input, ComputeConditionAst::From(id)))
        }
        Some(Keyword::To) => {
            let (input, id) = ident(&input[1..])?;
            Ok((input, ComputeConditionAst::To(id)))
        }
        Some(Keyword::Of) => {
            let (input, types) = compute_labels(&input[1..])?;
            Ok((input, ComputeConditionAst::Of(types)))
        }
        Some(Keyword::In) => {
            let (input, types) = compute_labels(&input[1..])?;
            Ok((input, ComputeConditionAst::In(types)))
        }
        Some(Keyword::Using) => {
            let (input, algorithm) = compute_algorithm(&input[1..])?;
            Ok((input, ComputeConditionAst::Using(algorithm)))
        }
        Some(Keyword::Where) => {
            let (input, args) = compute_args(&input[1..])?;
            Ok((input, ComputeConditionAst::Where(args)))
        }
        _ => fail(input),
    }
}

fn compute_algorithm(input: Tokens<'_>) -> PResult<'_, ComputeAlgorithm> {
    match peek_token(input) {
        Some(Token::Keyword(keyword)) => match ComputeAlgorithm::of(keyword.as_str()) {
            Some(algorithm) => Ok((&input[1..], algorithm)),
            None => fail(input),
        },
        Some(Token::Ident(name)) => semantic_err(TypeQLError::UnrecognisedToken {
            token: name.clone(),
            context: "compute algorithm",
        }),
        _ => fail(input),
    }
}

fn compute_labels(input: Tokens<'_>) -> PResult<'_, Vec<Label>> {
    if let Ok((rest, _)) = tok(Token::SquareOpen)(input) {
        let (rest, labels) = separated_list1(tok(Token::Comma), type_label)(rest)?;
        let (rest, _) = tok(Token::SquareClose)(rest)?;
        return Ok((rest, labels));
    }
    let (rest, label) = type_label(input)?;
    Ok((rest, vec![label]))
}

fn compute_args(input: Tokens<'_>) -> PResult<'_, Vec<ComputeArgument>> {
    if let Ok((rest, _)) = tok(Token::SquareOpen)(input) {
        let (rest, args) = separated_list1(tok(Token::Comma), compute_arg)(rest)?;
        let (rest, _) = tok(Token::SquareClose)(rest)?;
        return Ok((rest, args));
    }
    let (rest, arg) = compute_arg(input)?;
    Ok((rest, vec![arg]))
}

fn compute_arg(input: Tokens<'_>) -> PResult<'_, ComputeArgument> {
    let param = match peek_token(input) {
        Some(Token::Keyword(Keyword::MinK)) => ComputeParam::MinK,
        Some(Token::Keyword(Keyword::K)) => ComputeParam::K,
        Some(Token::Keyword(Keyword::Size)) => ComputeParam::Size,
        Some(Token::Keyword(Keyword::Contains)) => ComputeParam::Contains,
        Some(Token::Ident(name)) => {
            return semantic_err(TypeQLError::UnrecognisedToken {
                token: name.clone(),
                context: "compute argument",
            })
        }
        _ => return fail(input),
    };
    let input = &input[1..];
    let (input, _) = tok(Token::Assign)(input)?;
    match param {
        ComputeParam::Contains => {
            let (input, id) = ident(input)?;
            Ok((input, ComputeArgument::contains(id)))
        }
        ComputeParam::MinK => {
            let (input, value) = integer_lit(input)?;
            Ok((input, ComputeArgument::min_k(value)))
        }
        ComputeParam::K => {
            let (input, value) = integer_lit(input)?;
            Ok((input, ComputeArgument::k(value)))
        }
        ComputeParam::Size => {
            let (input, value) = integer_lit(input)?;
            Ok((input, ComputeArgument::size(value)))
        }
    }
}
