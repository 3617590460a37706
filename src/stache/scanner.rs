// StacheScanner (§4.1): parses exactly one stache tag at a given input
// offset, dispatching on its opening sigil.

use super::args::scan_argument;
use super::path::scan_path;
use super::{Argument, StacheTag};
use crate::error::{CompileError, Located, Location};
use crate::tokenizer::{self, TokenKind};

/// The result of a successful scan: the tag itself plus the bookkeeping
/// fields (`charPos`/`charLength` in §4.1) the caller uses to advance past
/// the consumed text. `TemplateParser` strips these before embedding the
/// tag in the tree (§4.2 step 2).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScannedTag {
    pub tag: StacheTag,
    pub char_pos: usize,
    pub char_length: usize,
}

/// Parses exactly one stache tag at `pos`. `pos` must point at the opening
/// `{{`. Consumes `[pos, end)` and returns a `ScannedTag` carrying `end -
/// pos` as `char_length`, or fails with a located `CompileError`.
pub fn parse_stache_tag(
    input: &str,
    pos: usize,
    source_name: Option<&str>,
) -> crate::error::Result<ScannedTag> {
    if !input[pos..].starts_with("{{") {
        return Err(lex_error("Unknown stache tag", input, pos, source_name));
    }
    let after_open = pos + 2;

    if let Some(end) = try_match_else(input, after_open) {
        return Ok(ScannedTag {
            tag: StacheTag::Else,
            char_pos: pos,
            char_length: end - pos,
        });
    }

    let rest = &input[after_open..];
    if rest.starts_with('{') {
        let (tag, end) = parse_with_args(input, after_open + 1, true, source_name)?;
        return finish(tag, pos, end, input, source_name);
    }
    if rest.starts_with('!') {
        let (value, end) = parse_comment_body(input, after_open + 1, source_name)?;
        return finish(StacheTag::Comment(value), pos, end, input, source_name);
    }
    if rest.starts_with('>') {
        let (path, args, end) = parse_path_and_args(input, after_open + 1, false, source_name)?;
        return finish(StacheTag::Inclusion { path, args }, pos, end, input, source_name);
    }
    if rest.starts_with('#') {
        let (path, args, end) = parse_path_and_args(input, after_open + 1, false, source_name)?;
        return finish(
            StacheTag::BlockOpen {
                path,
                args,
                content: Vec::new(),
                else_content: None,
            },
            pos,
            end,
            input,
            source_name,
        );
    }
    if rest.starts_with('/') {
        let (path, end) = parse_block_close(input, after_open + 1, source_name)?;
        return finish(StacheTag::BlockClose { path }, pos, end, input, source_name);
    }

    // No sigil matched: a plain DOUBLE mustache.
    let (path, args, end) = parse_path_and_args(input, after_open, false, source_name)?;
    finish(StacheTag::Double { path, args }, pos, end, input, source_name)
}

fn finish(
    tag: StacheTag,
    pos: usize,
    end: usize,
    input: &str,
    source_name: Option<&str>,
) -> crate::error::Result<ScannedTag> {
    if let StacheTag::Inclusion { .. } = &tag {
        if tag.positional_arg_count() > 1 {
            return Err(CompileError::TooManyPositionalArgs {
                at: Located::new(Location::from_offset(input, pos), source_name),
            });
        }
    }
    Ok(ScannedTag {
        tag,
        char_pos: pos,
        char_length: end - pos,
    })
}

/// Returns the position just past `}}` if `{{ ... else ... }}` matches
/// starting right after the opening `{{` (i.e. at `after_open`), with the
/// `else` keyword read as a standalone identifier token (so `elseValue`
/// does not match). Tried before `DOUBLE` per §4.1's dispatch ordering.
fn try_match_else(input: &str, after_open: usize) -> Option<usize> {
    let ws_end = tokenizer::skip_whitespace(input, after_open);
    let tok = tokenizer::next_token(input, ws_end)?;
    if tok.kind != TokenKind::Identifier || tok.text(input) != "else" {
        return None;
    }
    let close_start = tokenizer::skip_whitespace(input, tok.end);
    if input[close_start..].starts_with("}}") {
        Some(close_start + 2)
    } else {
        None
    }
}

fn parse_comment_body(
    input: &str,
    pos: usize,
    source_name: Option<&str>,
) -> crate::error::Result<(String, usize)> {
    match input[pos..].find("}}") {
        Some(rel) => Ok((input[pos..pos + rel].to_string(), pos + rel + 2)),
        None => Err(lex_error("Unclosed comment", input, pos, source_name)),
    }
}

fn parse_block_close(
    input: &str,
    pos: usize,
    source_name: Option<&str>,
) -> crate::error::Result<(super::Path, usize)> {
    let pos = tokenizer::skip_whitespace(input, pos);
    let (path, pos) = scan_path(input, pos, source_name)?;
    let pos = tokenizer::skip_whitespace(input, pos);
    if !input[pos..].starts_with("}}") {
        return Err(lex_error("Expected }}", input, pos, source_name));
    }
    Ok((path, pos + 2))
}

/// Shared body for `DOUBLE`/`TRIPLE`: a `Path` followed by a run of
/// arguments, but the compiler never needs a bare `{{{`/`}}}` construct
/// without a callee, so this is only called from `parse_with_args`'s triple
/// branch; kept as a free function for symmetry with `parse_path_and_args`.
fn parse_with_args(
    input: &str,
    pos: usize,
    is_triple: bool,
    source_name: Option<&str>,
) -> crate::error::Result<(StacheTag, usize)> {
    let (path, args, end) = parse_path_and_args(input, pos, is_triple, source_name)?;
    Ok((StacheTag::Triple { path, args }, end))
}

/// Parses `Path args...` followed by the appropriate close marker (`}}` or,
/// for TRIPLE, `}}}`). Shared by `DOUBLE`, `TRIPLE`, `INCLUSION`, and
/// `BLOCKOPEN` (§4.1 "Body parsing per kind").
fn parse_path_and_args(
    input: &str,
    pos: usize,
    is_triple: bool,
    source_name: Option<&str>,
) -> crate::error::Result<(super::Path, Vec<Argument>, usize)> {
    let pos = tokenizer::skip_whitespace(input, pos);
    let (path, mut pos) = scan_path(input, pos, source_name)?;
    let close = if is_triple { "}}}" } else { "}}" };
    let close_err = if is_triple { "Expected }}}" } else { "Expected }}" };

    let mut args = Vec::new();
    loop {
        pos = tokenizer::skip_whitespace(input, pos);
        if input[pos..].starts_with(close) {
            pos += close.len();
            break;
        }
        if input[pos..].starts_with('}') {
            return Err(lex_error(close_err, input, pos, source_name));
        }
        let (arg, next) = scan_argument(input, pos, true, source_name)?;
        args.push(arg);
        pos = next;

        // Between successive arguments, a whitespace character or the close
        // marker is required.
        let ok = pos >= input.len()
            || matches!(input.as_bytes()[pos], b' ' | b'\t' | b'\r' | b'\n')
            || input[pos..].starts_with(close);
        if !ok {
            return Err(lex_error(close_err, input, pos, source_name));
        }
    }
    Ok((path, args, pos))
}

fn lex_error(message: &str, input: &str, pos: usize, source_name: Option<&str>) -> CompileError {
    CompileError::Lex {
        message: message.to_string(),
        at: Located::new(Location::from_offset(input, pos), source_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stache::ArgValue;

    fn scan(s: &str) -> ScannedTag {
        parse_stache_tag(s, 0, None).unwrap()
    }

    #[test]
    fn double_mustache_consumes_exactly_its_span() {
        let scanned = scan("{{name}}");
        assert_eq!(scanned.char_length, "{{name}}".len());
        match scanned.tag {
            StacheTag::Double { path, args } => {
                assert_eq!(path.0, vec!["name"]);
                assert!(args.is_empty());
            }
            _ => panic!("expected double"),
        }
    }

    #[test]
    fn round_trip_consumes_exact_span_with_surrounding_text() {
        let s = "{{foo.bar baz=1}}";
        let surrounded = format!("X   {s}Y");
        let scanned = parse_stache_tag(&surrounded, 4, None).unwrap();
        assert_eq!(scanned.char_length, s.len());
    }

    #[test]
    fn triple_mustache() {
        let scanned = scan("{{{html}}}");
        assert_eq!(scanned.char_length, "{{{html}}}".len());
        assert!(matches!(scanned.tag, StacheTag::Triple { .. }));
    }

    #[test]
    fn comment_tag_absorbs_body() {
        let scanned = scan("{{! a comment }}");
        match scanned.tag {
            StacheTag::Comment(v) => assert_eq!(v, " a comment "),
            _ => panic!("expected comment"),
        }
    }

    #[test]
    fn unclosed_comment_errors() {
        assert!(parse_stache_tag("{{! no close", 0, None).is_err());
    }

    #[test]
    fn else_is_recognized_before_double() {
        let scanned = scan("{{else}}");
        assert_eq!(scanned.tag, StacheTag::Else);
    }

    #[test]
    fn else_with_whitespace() {
        let scanned = scan("{{ else }}");
        assert_eq!(scanned.tag, StacheTag::Else);
    }

    #[test]
    fn inclusion_single_positional_arg_ok() {
        let scanned = scan(r#"{{> widget name="x"}}"#);
        match scanned.tag {
            StacheTag::Inclusion { path, args } => {
                assert_eq!(path.0, vec!["widget"]);
                assert_eq!(args.len(), 1);
                assert_eq!(args[0].name.as_deref(), Some("name"));
            }
            _ => panic!("expected inclusion"),
        }
    }

    #[test]
    fn inclusion_two_positional_args_errors() {
        let err = parse_stache_tag("{{> widget a b}}", 0, None).unwrap_err();
        assert!(matches!(err, CompileError::TooManyPositionalArgs { .. }));
    }

    #[test]
    fn block_open_and_close_paths_parsed() {
        let scanned = scan("{{#if x}}");
        match scanned.tag {
            StacheTag::BlockOpen { path, args, .. } => {
                assert_eq!(path.0, vec!["if"]);
                assert_eq!(args.len(), 1);
            }
            _ => panic!("expected block open"),
        }
        let scanned = scan("{{/if}}");
        match scanned.tag {
            StacheTag::BlockClose { path } => assert_eq!(path.0, vec!["if"]),
            _ => panic!("expected block close"),
        }
    }

    #[test]
    fn negative_number_argument() {
        let scanned = scan("{{foo -3}}");
        match scanned.tag {
            StacheTag::Double { args, .. } => {
                assert_eq!(args[0].value, ArgValue::Number(-3.0));
            }
            _ => panic!("expected double"),
        }
    }

    #[test]
    fn leading_dot_decimal_argument() {
        let scanned = scan("{{foo .5}}");
        match scanned.tag {
            StacheTag::Double { args, .. } => {
                assert_eq!(args[0].value, ArgValue::Number(0.5));
            }
            _ => panic!("expected double"),
        }
    }

    #[test]
    fn keyword_then_positional_argument_order_preserved() {
        let scanned = scan("{{foo bar=baz qux}}");
        match scanned.tag {
            StacheTag::Double { args, .. } => {
                assert_eq!(args.len(), 2);
                assert_eq!(args[0].name.as_deref(), Some("bar"));
                assert!(args[1].name.is_none());
            }
            _ => panic!("expected double"),
        }
    }

    #[test]
    fn bracketed_path_segment() {
        let scanned = scan("{{[weird key]}}");
        match scanned.tag {
            StacheTag::Double { path, .. } => assert_eq!(path.0, vec!["weird key"]),
            _ => panic!("expected double"),
        }
    }

    #[test]
    fn lone_brace_before_close_is_expected_close_error() {
        let err = parse_stache_tag("{{foo}", 0, None).unwrap_err();
        assert!(matches!(err, CompileError::Lex { .. }));
    }

    #[test]
    fn unknown_opener_errors() {
        let err = parse_stache_tag("not a tag", 0, None).unwrap_err();
        assert!(matches!(err, CompileError::Lex { .. }));
    }
}
