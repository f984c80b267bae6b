//! Recursive-descent parser turning a token stream into an AST of
//! unresolved references. Literal classification (number vs boolean vs
//! cell-reference pattern) happens here; anchoring `.`/`..` and expanding
//! globs is deferred to resolution, which needs the node's schema.

use std::fmt;

use crate::lexer::{tokenize, Token, TokenKind, TokenizerError};

/// One half of a `col::row` cell-reference pattern, still unresolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RefPattern {
    pub column: String,
    pub row: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Bool(bool),
    Ref(RefPattern),
    Call(String, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub pos: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.pos, self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<TokenizerError> for ParseError {
    fn from(e: TokenizerError) -> Self {
        ParseError { message: e.message, pos: e.pos }
    }
}

pub fn parse(src: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(src)?;
    let mut pos = 0;
    let expr = parse_expr(&tokens, &mut pos)?;
    if pos != tokens.len() {
        return Err(ParseError {
            message: "trailing tokens after expression".into(),
            pos: tokens[pos].pos,
        });
    }
    Ok(expr)
}

fn parse_expr(tokens: &[Token], pos: &mut usize) -> Result<Expr, ParseError> {
    let tok = tokens.get(*pos).ok_or_else(|| ParseError {
        message: "unexpected end of input".into(),
        pos: tokens.last().map(|t| t.pos + t.text.len()).unwrap_or(0),
    })?;
    match tok.kind {
        TokenKind::LParen => parse_call(tokens, pos),
        TokenKind::RParen => Err(ParseError { message: "unexpected ')'".into(), pos: tok.pos }),
        TokenKind::Atom => {
            *pos += 1;
            Ok(classify_atom(&tok.text))
        }
    }
}

fn parse_call(tokens: &[Token], pos: &mut usize) -> Result<Expr, ParseError> {
    let open = &tokens[*pos];
    *pos += 1;
    let name_tok = tokens.get(*pos).ok_or_else(|| ParseError {
        message: "expected function name after '('".into(),
        pos: open.pos,
    })?;
    if name_tok.kind != TokenKind::Atom {
        return Err(ParseError { message: "expected function name".into(), pos: name_tok.pos });
    }
    let name = name_tok.text.clone();
    *pos += 1;

    let mut args = Vec::new();
    loop {
        let next = tokens.get(*pos).ok_or_else(|| ParseError {
            message: "unterminated call, expected ')'".into(),
            pos: open.pos,
        })?;
        if next.kind == TokenKind::RParen {
            *pos += 1;
            break;
        }
        args.push(parse_expr(tokens, pos)?);
    }
    Ok(Expr::Call(name, args))
}

fn classify_atom(text: &str) -> Expr {
    if text == "true" || text == "false" {
        return Expr::Bool(text == "true");
    }
    if let Ok(n) = text.parse::<f64>() {
        return Expr::Number(n);
    }
    if let Some((col, row)) = text.split_once("::") {
        return Expr::Ref(RefPattern { column: col.to_string(), row: row.to_string() });
    }
    // Bare atoms with no `::` separator are treated as malformed references
    // rather than silently coerced; resolution reports the precise error.
    Expr::Ref(RefPattern { column: text.to_string(), row: String::new() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_call_with_literal_and_ref_args() {
        let expr = parse("(Sum 1 ../c1::.)").unwrap();
        assert_eq!(
            expr,
            Expr::Call(
                "Sum".into(),
                vec![
                    Expr::Number(1.0),
                    Expr::Ref(RefPattern { column: "../c1".into(), row: ".".into() })
                ]
            )
        );
    }

    #[test]
    fn parses_nested_calls() {
        let expr = parse("(If (Gt a::1 0) true false)").unwrap();
        match expr {
            Expr::Call(name, args) => {
                assert_eq!(name, "If");
                assert_eq!(args.len(), 3);
                assert!(matches!(args[0], Expr::Call(..)));
                assert_eq!(args[1], Expr::Bool(true));
            }
            _ => panic!("expected call"),
        }
    }

    #[test]
    fn unterminated_call_is_parse_error() {
        let err = parse("(Sum 1 2").unwrap_err();
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn trailing_tokens_after_expression_is_parse_error() {
        let err = parse("(Sum 1) (Sum 2)").unwrap_err();
        assert!(err.message.contains("trailing"));
    }
}
