//! Flex declaration strings.
//!
//! A declaration list configures a container or an item in CSS syntax:
//!
//! ```text
//! flex-direction: column; flex-wrap: wrap; gap: 4 8; justify-content: spaceBetween
//! flex-grow: 2; align-self: center; flex-ignore: false
//! ```
//!
//! Unknown properties and bad values are errors; nothing is applied unless
//! the whole list parses.

use logos::Logos;

use super::style::{FlexItemStyle, FlexStyle, KeywordError};

/// Token produced by the declaration lexer.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    /// Number, possibly negative or fractional.
    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,

    /// Property name or keyword.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*")]
    Ident,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,
}

/// Errors from declaration parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeclarationError {
    #[error("unexpected character at position {0}")]
    Lex(usize),
    #[error("unexpected token at position {position}: {message}")]
    UnexpectedToken { position: usize, message: String },
    #[error("unknown property: {0}")]
    UnknownProperty(String),
    #[error("invalid value for {property}: {message}")]
    InvalidValue { property: String, message: String },
    #[error(transparent)]
    Keyword(#[from] KeywordError),
}

/// A single value in a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclValue {
    Number(f64),
    Ident(String),
}

/// `property: value value ...`
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub values: Vec<DeclValue>,
}

/// Split `input` into declarations without interpreting properties.
pub fn parse_declarations(input: &str) -> Result<Vec<Declaration>, DeclarationError> {
    let mut lexer = Token::lexer(input);
    let mut out = Vec::new();
    let mut current: Option<Declaration> = None;
    let mut seen_colon = false;

    while let Some(result) = lexer.next() {
        let position = lexer.span().start;
        let token = result.map_err(|()| DeclarationError::Lex(position))?;
        let text = lexer.slice();
        match (token, current.is_some(), seen_colon) {
            (Token::Semicolon, false, _) => {}
            (Token::Semicolon, true, true) => {
                out.extend(current.take());
                seen_colon = false;
            }
            (Token::Ident, false, _) => {
                current = Some(Declaration {
                    property: text.to_ascii_lowercase(),
                    values: Vec::new(),
                });
            }
            (Token::Colon, true, false) => seen_colon = true,
            (kind @ (Token::Ident | Token::Number), true, true) => {
                if let Some(decl) = current.as_mut() {
                    let value = if kind == Token::Number {
                        DeclValue::Number(text.parse::<f64>().map_err(|e| DeclarationError::InvalidValue {
                            property: decl.property.clone(),
                            message: e.to_string(),
                        })?)
                    } else {
                        DeclValue::Ident(text.to_owned())
                    };
                    decl.values.push(value);
                }
            }
            (token, ..) => {
                return Err(DeclarationError::UnexpectedToken {
                    position,
                    message: format!("{token:?} `{text}`"),
                })
            }
        }
    }
    match current {
        Some(decl) if seen_colon => out.push(decl),
        Some(decl) => {
            return Err(DeclarationError::UnexpectedToken {
                position: input.len(),
                message: format!("expected `:` after `{}`", decl.property),
            })
        }
        None => {}
    }
    Ok(out)
}

fn single<'a>(decl: &'a Declaration) -> Result<&'a DeclValue, DeclarationError> {
    match decl.values.as_slice() {
        [value] => Ok(value),
        values => Err(DeclarationError::InvalidValue {
            property: decl.property.clone(),
            message: format!("expected 1 value, got {}", values.len()),
        }),
    }
}

fn keyword<T>(decl: &Declaration) -> Result<T, DeclarationError>
where
    T: std::str::FromStr<Err = KeywordError>,
{
    match single(decl)? {
        DeclValue::Ident(name) => Ok(name.parse()?),
        DeclValue::Number(n) => Err(DeclarationError::InvalidValue {
            property: decl.property.clone(),
            message: format!("expected keyword, got {n}"),
        }),
    }
}

fn number(value: &DeclValue, property: &str) -> Result<f64, DeclarationError> {
    match value {
        DeclValue::Number(n) => Ok(*n),
        DeclValue::Ident(name) => Err(DeclarationError::InvalidValue {
            property: property.to_owned(),
            message: format!("expected number, got `{name}`"),
        }),
    }
}

fn boolean(decl: &Declaration) -> Result<bool, DeclarationError> {
    match single(decl)? {
        DeclValue::Ident(name) if name.eq_ignore_ascii_case("true") => Ok(true),
        DeclValue::Ident(name) if name.eq_ignore_ascii_case("false") => Ok(false),
        DeclValue::Number(n) => Ok(*n != 0.0),
        DeclValue::Ident(name) => Err(DeclarationError::InvalidValue {
            property: decl.property.clone(),
            message: format!("expected true|false, got `{name}`"),
        }),
    }
}

/// Apply container declarations on top of `base`.
pub fn parse_flex_style(input: &str, base: FlexStyle) -> Result<FlexStyle, DeclarationError> {
    let mut style = base;
    for decl in parse_declarations(input)? {
        style = match decl.property.as_str() {
            "flex-direction" | "direction" => style.direction(keyword(&decl)?),
            "flex-wrap" | "wrap" => style.wrap(keyword(&decl)?),
            "justify-content" => style.justify_content(keyword(&decl)?),
            "align-items" => style.align_items(keyword(&decl)?),
            "align-content" => style.align_content(keyword(&decl)?),
            "row-gap" => style.row_gap(number(single(&decl)?, &decl.property)?),
            "column-gap" => style.column_gap(number(single(&decl)?, &decl.property)?),
            "gap" => match decl.values.as_slice() {
                [both] => style.gap(number(both, "gap")?),
                [row, column] => style.row_gap(number(row, "gap")?).column_gap(number(column, "gap")?),
                values => {
                    return Err(DeclarationError::InvalidValue {
                        property: "gap".into(),
                        message: format!("expected 1-2 values, got {}", values.len()),
                    })
                }
            },
            other => return Err(DeclarationError::UnknownProperty(other.to_owned())),
        };
    }
    Ok(style)
}

/// Apply item declarations on top of `base`.
pub fn parse_flex_item_style(input: &str, base: FlexItemStyle) -> Result<FlexItemStyle, DeclarationError> {
    let mut style = base;
    for decl in parse_declarations(input)? {
        style = match decl.property.as_str() {
            "flex-grow" | "grow" => style.grow(number(single(&decl)?, &decl.property)?),
            "align-self" => style.align_self(keyword(&decl)?),
            "flex-ignore" | "ignore-flex" => style.ignore_flex(boolean(&decl)?),
            other => return Err(DeclarationError::UnknownProperty(other.to_owned())),
        };
    }
    Ok(style)
}
