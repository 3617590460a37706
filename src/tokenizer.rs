// A minimal JS-like lexer for the argument positions inside a stache tag.
//
// Stands in for the "generic JavaScript tokenizer" collaborator named in §1 as
// out of scope: it recognizes identifiers/keywords, numbers, strings, the
// boolean and null literals, and punctuators, with one token of lookahead.
// It is not a full ECMAScript tokenizer — no regex literals, no template
// strings, no Unicode identifier escapes, no automatic semicolon insertion.

/// The classification of a lexed token.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Identifier,
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    /// A single-character punctuator, e.g. `-`, `=`, `.`, `[`.
    Punctuator(char),
}

/// A token together with the source range it was lexed from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset range `[start, end)` within the scanned input.
    pub start: usize,
    pub end: usize,
}

impl Token {
    /// The literal source text of this token.
    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start..self.end]
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

pub(crate) fn is_identifier_continue(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

/// Skips JS-insignificant whitespace (space, tab, CR, LF) starting at `pos`.
pub(crate) fn skip_whitespace(input: &str, pos: usize) -> usize {
    let mut i = pos;
    let bytes = input.as_bytes();
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\r' | b'\n') {
        i += 1;
    }
    i
}

/// Lexes exactly one token at `pos` (which must not be inside whitespace;
/// callers call `skip_whitespace` first). Returns `None` at end of input or
/// when no shape matches.
pub(crate) fn next_token(input: &str, pos: usize) -> Option<Token> {
    let rest = &input[pos..];
    let mut chars = rest.char_indices();
    let (_, first) = chars.next()?;

    if first == '"' || first == '\'' {
        return lex_string(input, pos, first);
    }

    if first.is_ascii_digit() {
        return Some(lex_number(input, pos));
    }

    // A leading `.` immediately followed by a digit starts a NUMBER token
    // (e.g. `.5`), not a punctuator — the argument scanner's PATH/NUMBER
    // disambiguation depends on this case existing (§4.1 "Argument scanner").
    if first == '.' && rest.as_bytes().get(1).is_some_and(u8::is_ascii_digit) {
        return Some(lex_number(input, pos));
    }

    if is_identifier_start(first) {
        let mut end = pos + first.len_utf8();
        for (i, c) in chars {
            if is_identifier_continue(c) {
                end = pos + i + c.len_utf8();
            } else {
                break;
            }
        }
        let word = &input[pos..end];
        let kind = match word {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            "null" => TokenKind::Null,
            _ => TokenKind::Identifier,
        };
        return Some(Token {
            kind,
            start: pos,
            end,
        });
    }

    // Single-character punctuator.
    Some(Token {
        kind: TokenKind::Punctuator(first),
        start: pos,
        end: pos + first.len_utf8(),
    })
}

/// Lexes a NUMBER token at `pos`, which points at either a leading digit
/// (`3`, `3.5`) or a leading `.` followed by a digit (`.5`) — the caller
/// (`next_token`) has already verified one of those two shapes.
fn lex_number(input: &str, pos: usize) -> Token {
    let bytes = input.as_bytes();
    let mut end = pos;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' && end + 1 < bytes.len() && bytes[end + 1].is_ascii_digit() {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    let text = &input[pos..end];
    // `f64`'s parser accepts a bare leading `.` (no integer part), so no
    // "0" padding is needed for the `.5` shape.
    let value: f64 = text.parse().unwrap_or(f64::NAN);
    Token {
        kind: TokenKind::Number(value),
        start: pos,
        end,
    }
}

/// Lexes a quoted string starting at `pos` (which points at the opening
/// quote). Handles backslash escapes without interpreting them — the raw
/// decoding (including the §4.1/§9 newline-family substitution) happens in
/// `stache::args::decode_string`, which receives the token's raw source text.
fn lex_string(input: &str, pos: usize, quote: char) -> Option<Token> {
    let bytes = input.as_bytes();
    let mut i = pos + 1;
    let mut escaped = false;
    loop {
        if i >= bytes.len() {
            return None; // unterminated string — caller reports the error
        }
        let c = input[i..].chars().next().unwrap();
        if escaped {
            escaped = false;
            i += c.len_utf8();
            continue;
        }
        if c == '\\' {
            escaped = true;
            i += c.len_utf8();
            continue;
        }
        if c == quote {
            i += c.len_utf8();
            break;
        }
        i += c.len_utf8();
    }
    Some(Token {
        kind: TokenKind::String(input[pos..i].to_string()),
        start: pos,
        end: i,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_identifier() {
        let tok = next_token("foo_bar baz", 0).unwrap();
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert_eq!(tok.text("foo_bar baz"), "foo_bar");
    }

    #[test]
    fn lexes_keyword_literals() {
        assert_eq!(next_token("true", 0).unwrap().kind, TokenKind::Boolean(true));
        assert_eq!(next_token("false", 0).unwrap().kind, TokenKind::Boolean(false));
        assert_eq!(next_token("null", 0).unwrap().kind, TokenKind::Null);
    }

    #[test]
    fn lexes_number() {
        let tok = next_token("3.14)", 0).unwrap();
        assert_eq!(tok.kind, TokenKind::Number(3.14));
        assert_eq!(tok.text("3.14)"), "3.14");
    }

    #[test]
    fn lexes_integer_without_fraction() {
        let tok = next_token("42 ", 0).unwrap();
        assert_eq!(tok.kind, TokenKind::Number(42.0));
    }

    #[test]
    fn lexes_leading_dot_decimal() {
        let tok = next_token(".5}}", 0).unwrap();
        assert_eq!(tok.kind, TokenKind::Number(0.5));
        assert_eq!(tok.text(".5}}"), ".5");
    }

    #[test]
    fn lone_dot_without_a_following_digit_is_a_punctuator() {
        let tok = next_token(".foo", 0).unwrap();
        assert_eq!(tok.kind, TokenKind::Punctuator('.'));
    }

    #[test]
    fn lexes_double_quoted_string_with_escape() {
        let src = r#""a\"b" rest"#;
        let tok = next_token(src, 0).unwrap();
        assert_eq!(tok.text(src), r#""a\"b""#);
    }

    #[test]
    fn lexes_single_quoted_string() {
        let src = "'it''s' rest";
        // Not a real escape form, but quote must still close at first
        // unescaped matching quote character.
        let tok = next_token("'abc' rest", 0).unwrap();
        assert_eq!(tok.text("'abc' rest"), "'abc'");
        let _ = src;
    }

    #[test]
    fn lexes_punctuator() {
        let tok = next_token("-3", 0).unwrap();
        assert_eq!(tok.kind, TokenKind::Punctuator('-'));
    }

    #[test]
    fn skip_whitespace_stops_at_nonspace() {
        assert_eq!(skip_whitespace("   x", 0), 3);
        assert_eq!(skip_whitespace("x", 0), 0);
    }
}
