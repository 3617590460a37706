// TemplateParser (§4.2): drives the internal HTML fragment tokenizer
// (`fragment`) and interleaves it with the StacheScanner (`stache`),
// handling block-tag content recursion, `{{else}}` alternates, and
// matching open/close block names.

pub(crate) mod cursor;
pub(crate) mod fragment;

use cursor::Cursor;
use fragment::{StacheCallback, TextMode};

use crate::error::{CompileError, Located, Location, Result};
use crate::stache::{parse_stache_tag, StacheTag};
use crate::tokenizer;
use crate::tree::Node;

/// Parses a full stache-tagged HTML source into the intermediate tree
/// (§4.2 contract: `parse(input) → tree`).
pub(crate) fn parse(input: &str, source_name: Option<&str>) -> Result<Vec<Node>> {
    let mut callback = TemplateCallback { source_name };
    let mut cursor = Cursor::new(input, source_name);
    fragment::parse_children(&mut cursor, TextMode::Normal, &|_| false, &mut callback)
}

/// Implements `getSpecialTag` (§4.2 "Integration"): invoked by the fragment
/// tokenizer every time it sees `{{`.
struct TemplateCallback<'s> {
    source_name: Option<&'s str>,
}

impl<'s> StacheCallback for TemplateCallback<'s> {
    fn on_special(&mut self, cursor: &mut Cursor<'_>, text_mode: TextMode) -> Result<Option<Node>> {
        if !cursor.starts_with("{{") {
            return Ok(None);
        }
        let start = cursor.pos;
        let scanned = parse_stache_tag(cursor.input, cursor.pos, self.source_name)?;
        cursor.advance(scanned.char_length);

        match scanned.tag {
            StacheTag::Else => Err(self.unexpected(cursor.input, start, "{{else}}")),
            StacheTag::BlockClose { path } => {
                Err(self.unexpected(cursor.input, start, &format!("{{{{/{}}}}}", path.comma_join())))
            }
            // The tag is consumed but produces no tree node.
            StacheTag::Comment(_) => Ok(None),
            StacheTag::BlockOpen { path, args, .. } => {
                let opener = path.comma_join();
                let content =
                    fragment::parse_children(cursor, text_mode, &is_block_boundary, self)?;
                if cursor.at_end() {
                    return Err(CompileError::UnclosedBlock {
                        opened: opener,
                        at: Located::new(Location::from_offset(cursor.input, cursor.pos), self.source_name),
                    });
                }

                let after_content = cursor.pos;
                let next = parse_stache_tag(cursor.input, cursor.pos, self.source_name)?;
                let (else_content, close_tag, close_pos) = if matches!(next.tag, StacheTag::Else) {
                    cursor.advance(next.char_length);
                    let else_nodes =
                        fragment::parse_children(cursor, text_mode, &is_block_boundary, self)?;
                    if cursor.at_end() {
                        return Err(CompileError::UnclosedBlock {
                            opened: opener,
                            at: Located::new(
                                Location::from_offset(cursor.input, cursor.pos),
                                self.source_name,
                            ),
                        });
                    }
                    let close_pos = cursor.pos;
                    let close = parse_stache_tag(cursor.input, cursor.pos, self.source_name)?;
                    (Some(else_nodes), close, close_pos)
                } else {
                    (None, next, after_content)
                };
                cursor.advance(close_tag.char_length);

                match close_tag.tag {
                    StacheTag::BlockClose { path: close_path } => {
                        let closed = close_path.comma_join();
                        if closed != opener {
                            return Err(CompileError::BlockMismatch {
                                opened: opener,
                                closed,
                                at: Located::new(
                                    Location::from_offset(cursor.input, close_pos),
                                    self.source_name,
                                ),
                            });
                        }
                    }
                    _ => {
                        return Err(self.unexpected(
                            cursor.input,
                            close_pos,
                            &format!("expected {{{{/{opener}}}}}"),
                        ))
                    }
                }

                Ok(Some(Node::Special(StacheTag::BlockOpen {
                    path,
                    args,
                    content,
                    else_content,
                })))
            }
            other => Ok(Some(Node::Special(other))),
        }
    }
}

impl<'s> TemplateCallback<'s> {
    fn unexpected(&self, input: &str, pos: usize, what: &str) -> CompileError {
        CompileError::UnexpectedTag {
            message: format!("unexpected {what}"),
            at: Located::new(Location::from_offset(input, pos), self.source_name),
        }
    }
}

/// `shouldStop` predicate for block-content sub-parses (§4.2 step 5): true
/// when the upcoming input is `{{`, optional whitespace, then `/` or the
/// word `else` at a token boundary.
fn is_block_boundary(cursor: &Cursor<'_>) -> bool {
    let rest = cursor.rest();
    if !rest.starts_with("{{") {
        return false;
    }
    let ws_end = tokenizer::skip_whitespace(rest, 2);
    let tail = &rest[ws_end..];
    if tail.starts_with('/') {
        return true;
    }
    if let Some(after_else) = tail.strip_prefix("else") {
        return after_else
            .chars()
            .next()
            .is_none_or(|c| !tokenizer::is_identifier_continue(c));
    }
    false
}
