// Path scanning (§4.1 "Path scanner").
//
// A path is a non-empty ordered list of segment strings. The leading
// dot-run (`.`, `..`, `../..`, `./`, ...) is collapsed into a single
// ancestor-depth segment; everything after it is either a bracketed
// arbitrary string (`[weird key]`) or an identifier from the JS-like
// tokenizer.

use crate::error::{CompileError, Located, Location};
use crate::tokenizer::{self, TokenKind};

/// An ordered, non-empty sequence of path segments (§3 Paths).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path(pub Vec<String>);

impl Path {
    /// Segment-join by comma, used to compare a block's open and close
    /// paths for equality (§3 invariant, §4.2 step 5).
    pub(crate) fn comma_join(&self) -> String {
        self.0.join(",")
    }

    pub(crate) fn segments(&self) -> &[String] {
        &self.0
    }
}

/// Scans one path starting at `pos`. Returns the path and the position just
/// past its last character.
pub(crate) fn scan_path(
    input: &str,
    pos: usize,
    source_name: Option<&str>,
) -> crate::error::Result<(Path, usize)> {
    let mut segments: Vec<String> = Vec::new();
    let mut pos = pos;

    // Leading dot-run: `[./]+`.
    let dot_run_end = {
        let bytes = input.as_bytes();
        let mut i = pos;
        while i < bytes.len() && matches!(bytes[i], b'.' | b'/') {
            i += 1;
        }
        i
    };

    let mut more_segments_follow = true;
    if dot_run_end > pos {
        let run = &input[pos..dot_run_end];
        let ends_with_slash = run.ends_with('/');
        let parts: Vec<&str> = run.split('/').collect();
        // A trailing `/` produces one extra empty element from `split`;
        // drop it since it's the separator before further segments, not a
        // dot token of its own.
        let dot_tokens: Vec<&str> = if ends_with_slash {
            parts[..parts.len() - 1].to_vec()
        } else {
            parts
        };

        if dot_tokens.is_empty() || !matches!(dot_tokens[0], "." | "..") {
            return Err(lex_error(
                "Expected . or .. at start of path",
                input,
                pos,
                source_name,
            ));
        }
        let mut ancestor_depth: usize = if dot_tokens[0] == ".." { 1 } else { 0 };
        for tok in &dot_tokens[1..] {
            if *tok != ".." {
                return Err(lex_error(
                    "Expected .. in ancestor path",
                    input,
                    pos,
                    source_name,
                ));
            }
            ancestor_depth += 1;
        }
        segments.push(format!(".{}", ".".repeat(ancestor_depth)));
        pos = dot_run_end;
        more_segments_follow = ends_with_slash;
    }

    if segments.is_empty() || more_segments_follow {
        loop {
            let (segment, next_pos, is_first) =
                scan_segment(input, pos, segments.is_empty(), source_name)?;
            // `this` as the very first segment collapses to the `.` marker.
            if is_first && segment == "this" {
                segments.push(".".to_string());
            } else {
                segments.push(segment);
            }
            pos = next_pos;

            // A single `.` or `/` separates segments; its absence ends the path.
            if pos < input.len() && matches!(input.as_bytes()[pos], b'.' | b'/') {
                pos += 1;
                continue;
            }
            break;
        }
    }

    if segments.is_empty() {
        return Err(lex_error("Expected a path", input, pos, source_name));
    }

    Ok((Path(segments), pos))
}

/// Scans one non-dot-run path segment: either a bracketed arbitrary string
/// or an identifier. Returns `(segment, pos_after, is_first_segment)`.
fn scan_segment(
    input: &str,
    pos: usize,
    is_first: bool,
    source_name: Option<&str>,
) -> crate::error::Result<(String, usize, bool)> {
    if input[pos..].starts_with('[') {
        let rest = &input[pos + 1..];
        match rest.find(']') {
            Some(rel_end) => {
                let body = &rest[..rel_end];
                if is_first && body.is_empty() {
                    return Err(lex_error(
                        "The first segment of a path may not be an empty bracketed string",
                        input,
                        pos,
                        source_name,
                    ));
                }
                Ok((body.to_string(), pos + 1 + rel_end + 1, is_first))
            }
            None => Err(lex_error(
                "Unterminated bracketed path segment",
                input,
                pos,
                source_name,
            )),
        }
    } else {
        match tokenizer::next_token(input, pos) {
            Some(tok) => {
                let word = match tok.kind {
                    TokenKind::Identifier => tok.text(input).to_string(),
                    TokenKind::Boolean(_) | TokenKind::Null if !is_first => {
                        tok.text(input).to_string()
                    }
                    _ => {
                        return Err(lex_error(
                            "Expected an identifier in path segment",
                            input,
                            pos,
                            source_name,
                        ))
                    }
                };
                Ok((word, tok.end, is_first))
            }
            None => Err(lex_error(
                "Expected an identifier in path segment",
                input,
                pos,
                source_name,
            )),
        }
    }
}

fn lex_error(message: &str, input: &str, pos: usize, source_name: Option<&str>) -> CompileError {
    CompileError::Lex {
        message: message.to_string(),
        at: Located::new(Location::from_offset(input, pos), source_name),
    }
}
