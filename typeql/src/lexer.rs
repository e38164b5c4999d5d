// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lexer for TypeQL. A hybrid approach: nom sub-parsers recognise each
//! token class, while the main loop tracks line and column so every token
//! carries its source position. Whitespace and `#` comments are consumed
//! and dropped. Parser order matters: date-times before reals before
//! integers (a date literal starts with digits), words before punctuation,
//! and multi-character operators before their single-character prefixes.

use chrono::{NaiveDate, NaiveDateTime};
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1, take_while_m_n},
    character::complete::char,
    combinator::opt,
    IResult,
};

use crate::error::{self, TypeQLError};
use crate::token::Keyword;

/// One lexical token of the language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Ident(String),
    /// `$name`
    Var(String),
    /// `?name`
    ValueVar(String),
    /// `$_`
    AnonVar,
    /// String literal with its interior escape sequences preserved.
    StringLit(String),
    LongLit(i64),
    DoubleLit(f64),
    BoolLit(bool),
    DateTimeLit(NaiveDateTime),
    Semicolon,
    Comma,
    Colon,
    CurlyOpen,
    CurlyClose,
    SquareOpen,
    SquareClose,
    ParenOpen,
    ParenClose,
    /// `=`
    Assign,
    /// `==`
    Eq,
    /// `!==` (and its `!=` synonym)
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Whitespace,
    Comment,
    Eof,
}

/// A token with the line and column (1-based) where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

/// Splits the input into spanned tokens, appending an `Eof` token at the
/// end-of-input position so the parser can point diagnostics past the last
/// character.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, TypeQLError> {
    let mut rest = input;
    let mut line = 1usize;
    let mut column = 1usize;
    let mut tokens = Vec::new();

    while !rest.is_empty() {
        match token(rest) {
            Ok((next, tok)) => {
                // a sub-parser must consume input or report an error
                if next.len() == rest.len() {
                    return Err(error::syntax_error(input, line, column));
                }
                if !matches!(tok, Token::Whitespace | Token::Comment) {
                    tokens.push(SpannedToken {
                        token: tok,
                        line,
                        column,
                    });
                }
                let consumed = &rest[..rest.len() - next.len()];
                for c in consumed.chars() {
                    if c == '\n' {
                        line += 1;
                        column = 1;
                    } else {
                        column += 1;
                    }
                }
                rest = next;
            }
            Err(_) => return Err(error::syntax_error(input, line, column)),
        }
    }
    tokens.push(SpannedToken {
        token: Token::Eof,
        line,
        column,
    });
    Ok(tokens)
}

fn token(input: &str) -> IResult<&str, Token> {
    alt((
        whitespace,
        comment,
        date_time_literal,
        real_literal,
        integer_literal,
        string_literal,
        variable,
        word,
        punctuation,
    ))(input)
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn whitespace(input: &str) -> IResult<&str, Token> {
    let (rest, _) = take_while1(|c: char| c.is_whitespace())(input)?;
    Ok((rest, Token::Whitespace))
}

fn comment(input: &str) -> IResult<&str, Token> {
    let (rest, _) = char('#')(input)?;
    let (rest, _) = take_while(|c| c != '\n')(rest)?;
    Ok((rest, Token::Comment))
}

fn two_digits(input: &str) -> IResult<&str, u32> {
    let (rest, digits) = take_while_m_n(2, 2, is_digit)(input)?;
    Ok((rest, digits.parse().unwrap_or(0)))
}

fn lex_failure<T>(input: &str) -> IResult<&str, T> {
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Verify,
    )))
}

/// `(+|-)?YYYY-MM-DD(THH:MM(:SS(.fff)?)?)?` with at most millisecond
/// precision; a date without a time component lifts to midnight.
fn date_time_literal(input: &str) -> IResult<&str, Token> {
    let (rest, sign) = opt(alt((char('+'), char('-'))))(input)?;
    let (rest, year_digits) = take_while1(is_digit)(rest)?;
    if year_digits.len() < 4 {
        return lex_failure(input);
    }
    let (rest, _) = char('-')(rest)?;
    let (rest, month) = two_digits(rest)?;
    let (rest, _) = char('-')(rest)?;
    let (rest, day) = two_digits(rest)?;

    let year: i32 = match year_digits.parse::<i32>() {
        Ok(year) if sign == Some('-') => -year,
        Ok(year) => year,
        Err(_) => return lex_failure(input),
    };
    let date = match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => return lex_failure(input),
    };

    let (rest, time) = opt(time_component)(rest)?;
    let (hour, minute, second, milli) = time.unwrap_or((0, 0, 0, 0));
    let date_time = match date.and_hms_milli_opt(hour, minute, second, milli) {
        Some(date_time) => date_time,
        None => return lex_failure(input),
    };
    Ok((rest, Token::DateTimeLit(date_time)))
}

fn time_component(input: &str) -> IResult<&str, (u32, u32, u32, u32)> {
    let (rest, _) = char('T')(input)?;
    let (rest, hour) = two_digits(rest)?;
    let (rest, _) = char(':')(rest)?;
    let (rest, minute) = two_digits(rest)?;
    let (rest, seconds) = opt(seconds_component)(rest)?;
    let (second, milli) = seconds.unwrap_or((0, 0));
    Ok((rest, (hour, minute, second, milli)))
}

fn seconds_component(input: &str) -> IResult<&str, (u32, u32)> {
    let (rest, _) = char(':')(input)?;
    let (rest, second) = two_digits(rest)?;
    let (rest, fraction) = opt(fraction_component)(rest)?;
    Ok((rest, (second, fraction.unwrap_or(0))))
}

fn fraction_component(input: &str) -> IResult<&str, u32> {
    let (rest, _) = char('.')(input)?;
    let (rest, digits) = take_while1(is_digit)(rest)?;
    // the grammar stops at millisecond resolution
    if digits.len() > 3 {
        return lex_failure(input);
    }
    let mut milli: u32 = digits.parse().unwrap_or(0);
    for _ in digits.len()..3 {
        milli *= 10;
    }
    Ok((rest, milli))
}

fn real_literal(input: &str) -> IResult<&str, Token> {
    let (rest, sign) = opt(char('-'))(input)?;
    let (rest, whole) = take_while1(is_digit)(rest)?;
    let (rest, _) = char('.')(rest)?;
    let (rest, frac) = take_while1(is_digit)(rest)?;
    let text = format!(
        "{}{}.{}",
        if sign.is_some() { "-" } else { "" },
        whole,
        frac
    );
    match text.parse::<f64>() {
        Ok(value) => Ok((rest, Token::DoubleLit(value))),
        Err(_) => lex_failure(input),
    }
}

fn integer_literal(input: &str) -> IResult<&str, Token> {
    let (rest, sign) = opt(char('-'))(input)?;
    let (rest, digits) = take_while1(is_digit)(rest)?;
    let text = format!("{}{}", if sign.is_some() { "-" } else { "" }, digits);
    match text.parse::<i64>() {
        Ok(value) => Ok((rest, Token::LongLit(value))),
        Err(_) => lex_failure(input),
    }
}

/// Single- or double-quoted; interior escapes (`\\`, `\'`, `\"`, `\n`,
/// `\r`, `\t`, `\/`) are preserved verbatim in the token so regex escapes
/// survive the round trip.
fn string_literal(input: &str) -> IResult<&str, Token> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, c @ ('"' | '\''))) => c,
        _ => return lex_failure(input),
    };
    let mut escaped = false;
    for (index, c) in chars {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            let interior = &input[1..index];
            return Ok((&input[index + 1..], Token::StringLit(interior.to_owned())));
        }
    }
    lex_failure(input)
}

fn variable(input: &str) -> IResult<&str, Token> {
    if let Ok((rest, _)) = char::<&str, nom::error::Error<&str>>('$')(input) {
        let (rest, name) = take_while1(is_ident_char)(rest)?;
        if name == "_" {
            return Ok((rest, Token::AnonVar));
        }
        return Ok((rest, Token::Var(name.to_owned())));
    }
    let (rest, _) = char('?')(input)?;
    let (rest, name) = take_while1(is_ident_char)(rest)?;
    Ok((rest, Token::ValueVar(name.to_owned())))
}

fn word(input: &str) -> IResult<&str, Token> {
    let mut chars = input.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => {}
        _ => return lex_failure(input),
    }
    let (rest, text) = take_while1(is_ident_char)(input)?;
    match text {
        "true" => return Ok((rest, Token::BoolLit(true))),
        "false" => return Ok((rest, Token::BoolLit(false))),
        _ => {}
    }
    if let Some(keyword) = Keyword::of(text) {
        // `sub!` and `isa!` are single tokens
        if keyword == Keyword::Sub && rest.starts_with('!') {
            return Ok((&rest[1..], Token::Keyword(Keyword::SubX)));
        }
        if keyword == Keyword::Isa && rest.starts_with('!') {
            return Ok((&rest[1..], Token::Keyword(Keyword::IsaX)));
        }
        return Ok((rest, Token::Keyword(keyword)));
    }
    Ok((rest, Token::Ident(text.to_owned())))
}

fn punctuation(input: &str) -> IResult<&str, Token> {
    for (text, token) in [
        ("!==", Token::Neq),
        ("!=", Token::Neq),
        ("==", Token::Eq),
        ("<=", Token::Lte),
        (">=", Token::Gte),
        (";", Token::Semicolon),
        (",", Token::Comma),
        (":", Token::Colon),
        ("{", Token::CurlyOpen),
        ("}", Token::CurlyClose),
        ("[", Token::SquareOpen),
        ("]", Token::SquareClose),
        ("(", Token::ParenOpen),
        (")", Token::ParenClose),
        ("<", Token::Lt),
        (">", Token::Gt),
        ("=", Token::Assign),
    ] {
        if let Some(rest) = input.strip_prefix(text) {
            return Ok((rest, token));
        }
    }
    lex_failure(input)
}
