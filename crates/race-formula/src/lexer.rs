//! Tokenizer for the S-expression formula language: `(FuncName arg …)`.

use std::fmt;

fn is_atom_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'.' | b':' | b'*' | b'{' | b'}' | b',' | b'_' | b'-' | b'/')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    Atom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenizerError {
    pub message: String,
    pub pos: usize,
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tokenizer error at {}: {}", self.pos, self.message)
    }
}

impl std::error::Error for TokenizerError {}

pub fn tokenize(src: &str) -> Result<Vec<Token>, TokenizerError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b'(' => {
                tokens.push(Token { kind: TokenKind::LParen, text: "(".into(), pos: i });
                i += 1;
            }
            b')' => {
                tokens.push(Token { kind: TokenKind::RParen, text: ")".into(), pos: i });
                i += 1;
            }
            _ => {
                if !is_atom_char(c) {
                    return Err(TokenizerError {
                        message: format!("unexpected character {:?}", c as char),
                        pos: i,
                    });
                }
                let start = i;
                while i < bytes.len() && is_atom_char(bytes[i]) {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Atom,
                    text: src[start..i].to_string(),
                    pos: start,
                });
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_nested_call() {
        let tokens = tokenize("(Sum a::1 (Avg b::* c::*))").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::LParen,
                TokenKind::Atom,
                TokenKind::Atom,
                TokenKind::LParen,
                TokenKind::Atom,
                TokenKind::Atom,
                TokenKind::Atom,
                TokenKind::RParen,
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn rejects_stray_control_character() {
        let err = tokenize("(Sum \x01)").unwrap_err();
        assert_eq!(err.pos, 5);
    }
}
