// Argument scanning (§4.1 "Argument scanner") and string-literal decoding.

use super::path::scan_path;
use super::{ArgValue, Argument};
use crate::error::{CompileError, Located, Location};
use crate::tokenizer::{self, TokenKind};

/// Scans one argument at `pos`. When `allow_keyword` is true and the
/// argument takes the `name=value` form, the recursive value scan is
/// performed with `allow_keyword = false` (§4.1: "recursively scan the
/// value argument (with keyword forbidden at that depth)").
pub(crate) fn scan_argument(
    input: &str,
    pos: usize,
    allow_keyword: bool,
    source_name: Option<&str>,
) -> crate::error::Result<(Argument, usize)> {
    let rest = &input[pos..];
    let next_char = rest.chars().next();

    // A leading `.` or `[`, when the token is not a numeric literal, starts
    // a path (§4.1 "Argument scanner"): `[` never begins a number, but `.`
    // does when immediately followed by a digit (`.5`), so that shape falls
    // through to the NUMBER handling below instead.
    let dot_starts_a_number =
        next_char == Some('.') && rest.as_bytes().get(1).is_some_and(u8::is_ascii_digit);
    if matches!(next_char, Some('.') | Some('[')) && !dot_starts_a_number {
        let (path, end) = scan_path(input, pos, source_name)?;
        return Ok((Argument::positional(ArgValue::Path(path)), end));
    }

    let tok = tokenizer::next_token(input, pos).ok_or_else(|| {
        lex_error("Expected an argument", input, pos, source_name)
    })?;

    match tok.kind {
        TokenKind::Punctuator('-') => {
            let num_tok = tokenizer::next_token(input, tok.end).ok_or_else(|| {
                lex_error("Expected a number after unary -", input, tok.end, source_name)
            })?;
            match num_tok.kind {
                TokenKind::Number(v) => Ok((
                    Argument::positional(ArgValue::Number(-v)),
                    num_tok.end,
                )),
                _ => Err(lex_error(
                    "Expected a number after unary -",
                    input,
                    tok.end,
                    source_name,
                )),
            }
        }
        TokenKind::Boolean(b) => Ok((Argument::positional(ArgValue::Boolean(b)), tok.end)),
        TokenKind::Null => Ok((Argument::positional(ArgValue::Null), tok.end)),
        TokenKind::Number(v) => Ok((Argument::positional(ArgValue::Number(v)), tok.end)),
        TokenKind::String(raw) => {
            let decoded = decode_string(&raw).map_err(|_| {
                lex_error("Invalid string literal", input, pos, source_name)
            })?;
            Ok((Argument::positional(ArgValue::String(decoded)), tok.end))
        }
        TokenKind::Identifier => {
            if allow_keyword {
                let after_word = tokenizer::skip_whitespace(input, tok.end);
                if input[after_word..].starts_with('=') && !input[after_word..].starts_with("==") {
                    let name = tok.text(input).to_string();
                    let value_pos = after_word + 1;
                    let value_pos = tokenizer::skip_whitespace(input, value_pos);
                    let (value_arg, end) =
                        scan_argument(input, value_pos, false, source_name)?;
                    return Ok((Argument::keyword(name, value_arg.value), end));
                }
            }
            // Not a keyword: this identifier starts a path.
            let (path, end) = scan_path(input, pos, source_name)?;
            Ok((Argument::positional(ArgValue::Path(path)), end))
        }
        TokenKind::Punctuator(_) => Err(lex_error(
            "Unexpected token in argument position",
            input,
            pos,
            source_name,
        )),
    }
}

/// Decodes a quoted string token's raw source text (including its
/// delimiters) per §4.1/§9:
///
/// 1. A single-quoted outer form is normalized to double-quoted by swapping
///    just the delimiter characters (not re-escaping the body).
/// 2. Line-continuation characters (`\r`, `\n`, U+2028, U+2029) are replaced
///    with the literal letter `n` — not the escape sequence `\n` — which is
///    a documented quirk (§9 "String-escape quirk", REDESIGN FLAG R2): it
///    happens to produce valid JSON only because a preceding backslash (a
///    JS line-continuation) turns the substitution into the two-character
///    escape `\n`; a bare raw newline not preceded by `\` becomes a literal
///    `n` character in the decoded string. Reproduced byte-for-byte rather
///    than fixed, per R2.
/// 3. The result is parsed as a JSON string.
pub(crate) fn decode_string(raw: &str) -> Result<String, serde_json::Error> {
    let mut chars: Vec<char> = raw.chars().collect();
    if chars.first() == Some(&'\'') {
        if let Some(first) = chars.first_mut() {
            *first = '"';
        }
        if chars.len() > 1 {
            if let Some(last) = chars.last_mut() {
                *last = '"';
            }
        }
    }
    let normalized: String = chars
        .into_iter()
        .map(|c| match c {
            '\r' | '\n' | '\u{2028}' | '\u{2029}' => 'n',
            other => other,
        })
        .collect();
    serde_json::from_str::<String>(&normalized)
}

fn lex_error(message: &str, input: &str, pos: usize, source_name: Option<&str>) -> CompileError {
    CompileError::Lex {
        message: message.to_string(),
        at: Located::new(Location::from_offset(input, pos), source_name),
    }
}
