use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    combinator::{opt, recognize},
    error::{Error, ErrorKind},
    sequence::pair,
    IResult,
};

use crate::ast::{Node, Program, Value};
use crate::LispError;

/// Characters that may start a symbol or call name: letters plus punctuation
/// and symbol characters (`≤`, `€`, and friends included), excluding the
/// parentheses that delimit calls. Outside ASCII anything printable that is
/// not a digit qualifies. Digits may appear in a symbol but not start one (a
/// leading digit starts a number instead).
fn is_symbol_start(c: char) -> bool {
    if c == '(' || c == ')' {
        return false;
    }
    c.is_alphabetic()
        || c.is_ascii_punctuation()
        || (!c.is_ascii() && !c.is_whitespace() && !c.is_control() && !c.is_numeric())
}

fn is_symbol_char(c: char) -> bool {
    is_symbol_start(c) || c.is_numeric()
}

/// Skip any amount of whitespace. `multispace0` only knows the ASCII four,
/// so this goes through `char::is_whitespace` instead.
fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while(char::is_whitespace)(input)
}

/// Promote a recoverable error to a failure so that `alt` in callers does not
/// mask it once an opening delimiter has committed us to a branch.
fn commit(err: nom::Err<Error<&str>>) -> nom::Err<Error<&str>> {
    match err {
        nom::Err::Error(e) => nom::Err::Failure(e),
        other => other,
    }
}

/// Convert nom parsing errors to user-friendly messages
fn parse_error_to_message(input: &str, error: nom::Err<Error<&str>>) -> String {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            if e.input.is_empty() {
                // Ran off the end of the input inside a delimited form. An
                // odd number of quotes means a string never closed.
                if input.bytes().filter(|&b| b == b'"').count() % 2 == 1 {
                    "unterminated string literal".to_string()
                } else {
                    "missing closing parenthesis before end of input".to_string()
                }
            } else {
                match e.code {
                    ErrorKind::TakeWhile1 => {
                        format!("invalid symbol at position {}", position)
                    }
                    _ => {
                        let near: String = e.input.chars().take(10).collect();
                        format!("invalid syntax near '{}'", near)
                    }
                }
            }
        }
        nom::Err::Incomplete(_) => "incomplete input".to_string(),
    }
}

/// Parse an integer literal (decimal, optional leading minus)
fn parse_number(input: &str) -> IResult<&str, Node> {
    let (input, number_str) = recognize(pair(
        opt(char('-')),
        take_while1(|c: char| c.is_ascii_digit()),
    ))(input)?;

    match number_str.parse::<i64>() {
        Ok(n) => Ok((input, Node::Literal(Value::Int(n)))),
        Err(_) => Err(nom::Err::Error(Error::new(input, ErrorKind::Digit))),
    }
}

/// Parse a symbol reference. The reserved name `nil` reads as a literal.
fn parse_symbol(input: &str) -> IResult<&str, Node> {
    match input.chars().next() {
        Some(c) if is_symbol_start(c) => {}
        _ => return Err(nom::Err::Error(Error::new(input, ErrorKind::TakeWhile1))),
    }
    let (input, name) = take_while1(is_symbol_char)(input)?;

    if name == "nil" {
        Ok((input, Node::Literal(Value::Nil)))
    } else {
        Ok((input, Node::Symbol(name.to_string())))
    }
}

/// Parse a string literal with backslash escapes: `\n` and `\t` decode to
/// newline and tab, any other escaped character is taken verbatim.
fn parse_string(input: &str) -> IResult<&str, Node> {
    let (input, _) = char('"')(input)?;
    let mut text = String::new();
    let mut remaining = input;

    loop {
        let mut chars = remaining.chars();
        match chars.next() {
            None => {
                // End of input before the closing quote
                return Err(nom::Err::Failure(Error::new(remaining, ErrorKind::Char)));
            }
            Some('"') => {
                remaining = &remaining[1..];
                return Ok((remaining, Node::Literal(Value::Str(text))));
            }
            Some('\\') => match chars.next() {
                None => {
                    return Err(nom::Err::Failure(Error::new(remaining, ErrorKind::Char)));
                }
                Some(escaped) => {
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        c => c,
                    });
                    remaining = &remaining[1 + escaped.len_utf8()..];
                }
            },
            Some(ch) => {
                text.push(ch);
                remaining = &remaining[ch.len_utf8()..];
            }
        }
    }
}

/// Parse a call: `(` name arg* `)`. Arguments are parsed recursively until a
/// closing parenthesis is peeked; running out of input first is an error.
fn parse_call(input: &str) -> IResult<&str, Node> {
    let (input, _) = char('(')(input)?;
    let (input, _) = whitespace(input)?;
    let (mut input, name) = take_while1(is_symbol_char)(input).map_err(commit)?;

    let mut args = Vec::new();
    loop {
        let (rest, _) = whitespace(input)?;
        match rest.chars().next() {
            Some(')') => {
                return Ok((
                    &rest[1..],
                    Node::Call {
                        name: name.to_string(),
                        args,
                    },
                ));
            }
            None => {
                return Err(nom::Err::Failure(Error::new(rest, ErrorKind::Char)));
            }
            Some(_) => {
                let (rest, node) = parse_expr(rest).map_err(commit)?;
                args.push(node);
                input = rest;
            }
        }
    }
}

/// Parse a single expression, skipping leading whitespace
fn parse_expr(input: &str) -> IResult<&str, Node> {
    let (input, _) = whitespace(input)?;
    nom::branch::alt((parse_call, parse_string, parse_number, parse_symbol))(input)
}

/// Read a whole program: expressions separated by whitespace until end of
/// input. A clean end of input is not an error; the first syntax error aborts
/// the whole parse and no partial program is returned.
pub fn parse(input: &str) -> Result<Program, LispError> {
    let mut program = Program::new();
    let mut rest = input;

    loop {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        match parse_expr(trimmed) {
            Ok((remaining, node)) => {
                program.push(node);
                rest = remaining;
            }
            Err(e) => return Err(LispError::ParseError(parse_error_to_message(input, e))),
        }
    }

    Ok(program)
}
