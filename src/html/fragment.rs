// A minimal HTML fragment tokenizer standing in for the out-of-scope
// `parseFragment` collaborator (§1, REDESIGN FLAG R3). It recognizes tags,
// attributes, comments, and character references, and hands off to a
// caller-supplied closure the moment it sees `{{` — the hook
// `TemplateParser::parse` (§4.2) uses to interleave stache-tag scanning.
//
// Deliberately thin: no DOCTYPE, no foreign content, no HTML5
// error-recovery modes. The spec treats the fragment parser as an external
// collaborator, not a subject of this core.

use std::sync::LazyLock;

use regex::Regex;

use super::cursor::Cursor;
use crate::error::Result;
use crate::tree::{AttrValue, Node, Tag, VOID_ELEMENTS};

/// Whether the cursor is inside RCDATA content (`<textarea>`/`<title>`):
/// character references are still resolved and stache tags still fire, but
/// no nested tags are recognized (§4.2 step 6, §9 "RCDATA").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextMode {
    Normal,
    Rcdata,
}

/// Called whenever the tokenizer sees `{{` at the cursor. Implementations
/// consume the stache tag (advancing the cursor) and return the tree node
/// to embed, or `None` when the tag produced nothing (a `COMMENT`).
/// `text_mode` carries the ambient RCDATA/Normal state at the call site
/// (§4.2 step 6), since `{{#block}}` recursion must propagate it into the
/// block's nested sub-parse.
pub(crate) trait StacheCallback {
    fn on_special(&mut self, cursor: &mut Cursor<'_>, text_mode: TextMode) -> Result<Option<Node>>;
}

impl<F> StacheCallback for F
where
    F: FnMut(&mut Cursor<'_>, TextMode) -> Result<Option<Node>>,
{
    fn on_special(&mut self, cursor: &mut Cursor<'_>, text_mode: TextMode) -> Result<Option<Node>> {
        self(cursor, text_mode)
    }
}

/// Parses a run of sibling nodes starting at the cursor's current position,
/// stopping at end of input or as soon as `should_stop` returns true.
pub(crate) fn parse_children(
    cursor: &mut Cursor<'_>,
    text_mode: TextMode,
    should_stop: &dyn Fn(&Cursor<'_>) -> bool,
    on_special: &mut dyn StacheCallback,
) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    loop {
        if cursor.at_end() || should_stop(cursor) {
            break;
        }
        if cursor.starts_with("{{") {
            if let Some(node) = on_special.on_special(cursor, text_mode)? {
                nodes.push(node);
            }
            continue;
        }
        if text_mode == TextMode::Normal && cursor.starts_with("<!--") {
            nodes.push(parse_comment(cursor));
            continue;
        }
        if text_mode == TextMode::Normal && starts_tag(cursor) {
            nodes.push(parse_tag(cursor, on_special)?);
            continue;
        }
        nodes.push(scan_one_text_node(cursor, should_stop));
    }
    Ok(nodes)
}

fn starts_tag(cursor: &Cursor<'_>) -> bool {
    let rest = cursor.rest();
    rest.starts_with('<')
        && rest
            .as_bytes()
            .get(1)
            .is_some_and(|b| b.is_ascii_alphabetic())
}

fn parse_comment(cursor: &mut Cursor<'_>) -> Node {
    let start = cursor.pos + 4;
    let body_end = cursor.input[start..]
        .find("-->")
        .map(|rel| start + rel)
        .unwrap_or(cursor.input.len());
    let text = cursor.input[start..body_end].to_string();
    cursor.pos = (body_end + 3).min(cursor.input.len());
    Node::Comment(text)
}

fn parse_tag(cursor: &mut Cursor<'_>, on_special: &mut dyn StacheCallback) -> Result<Node> {
    cursor.advance(1); // '<'
    let name = scan_name(cursor);
    let mut tag = Tag::new(name.clone());

    loop {
        skip_ws(cursor);
        if cursor.starts_with("/>") {
            cursor.advance(2);
            return Ok(Node::Tag(tag));
        }
        if cursor.starts_with('>') {
            cursor.advance(1);
            break;
        }
        if cursor.starts_with("{{") {
            match on_special.on_special(cursor, TextMode::Normal)? {
                Some(Node::Special(stache)) => tag.specials.push(stache),
                Some(_) | None => {}
            }
            continue;
        }
        if cursor.at_end() {
            return Err(cursor.fatal(format!("Unclosed tag <{name}>")));
        }
        parse_attribute(cursor, &mut tag, on_special)?;
    }

    let is_void = VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(&name));
    if is_void {
        return Ok(Node::Tag(tag));
    }

    let text_mode = if tag.is_rcdata() {
        TextMode::Rcdata
    } else {
        TextMode::Normal
    };
    let closing = closing_tag_matcher(&name);
    tag.children = parse_children(cursor, text_mode, &closing, on_special)?;

    if cursor.rest().to_ascii_lowercase().starts_with(&format!("</{}", name.to_ascii_lowercase())) {
        cursor.advance(2 + name.len());
        skip_ws(cursor);
        if cursor.starts_with('>') {
            cursor.advance(1);
        }
    }
    // An unclosed tag at end of input is accepted permissively (R3: no
    // HTML5 error-recovery modes); the children collected so far stand.

    Ok(Node::Tag(tag))
}

fn closing_tag_matcher(name: &str) -> impl Fn(&Cursor<'_>) -> bool + '_ {
    move |cursor: &Cursor<'_>| {
        let rest = cursor.rest();
        if !rest.starts_with("</") {
            return false;
        }
        let candidate = &rest[2..];
        candidate.len() >= name.len()
            && candidate[..name.len()].eq_ignore_ascii_case(name)
            && candidate[name.len()..]
                .chars()
                .next()
                .is_none_or(|c| c == '>' || c.is_whitespace())
    }
}

fn parse_attribute(
    cursor: &mut Cursor<'_>,
    tag: &mut Tag,
    on_special: &mut dyn StacheCallback,
) -> Result<()> {
    let name = scan_attr_name(cursor);
    if name.is_empty() {
        // Stray character that isn't whitespace, `/`, `>`, or the start of
        // `{{`; skip it to make forward progress rather than looping.
        cursor.advance(1);
        return Ok(());
    }
    skip_ws(cursor);
    if !cursor.starts_with('=') {
        tag.attrs.push((name, AttrValue::Text(String::new())));
        return Ok(());
    }
    cursor.advance(1);
    skip_ws(cursor);
    let value = parse_attr_value(cursor, on_special)?;
    tag.attrs.push((name, value));
    Ok(())
}

fn parse_attr_value(
    cursor: &mut Cursor<'_>,
    on_special: &mut dyn StacheCallback,
) -> Result<AttrValue> {
    let quote = cursor.peek().filter(|c| *c == '"' || *c == '\'');
    let mut parts = Vec::new();
    if let Some(q) = quote {
        cursor.advance(1);
        loop {
            if cursor.at_end() {
                return Err(cursor.fatal("Unclosed attribute value"));
            }
            if cursor.peek() == Some(q) {
                cursor.advance(1);
                break;
            }
            if cursor.starts_with("{{") {
                if let Some(Node::Special(stache)) = on_special.on_special(cursor, TextMode::Normal)? {
                    parts.push(AttrValue::Special(stache));
                }
                continue;
            }
            parts.push(scan_attr_text_chunk(cursor, |c| c == q));
        }
    } else {
        loop {
            if cursor.at_end() || cursor.peek().is_some_and(|c| c.is_whitespace() || c == '>') {
                break;
            }
            if cursor.starts_with("{{") {
                if let Some(Node::Special(stache)) = on_special.on_special(cursor, TextMode::Normal)? {
                    parts.push(AttrValue::Special(stache));
                }
                continue;
            }
            parts.push(scan_attr_text_chunk(cursor, |c| {
                c.is_whitespace() || c == '>'
            }));
        }
    }
    Ok(collapse_parts(parts))
}

fn collapse_parts(parts: Vec<AttrValue>) -> AttrValue {
    match parts.len() {
        0 => AttrValue::Text(String::new()),
        1 => parts.into_iter().next().unwrap(),
        _ => AttrValue::List(parts),
    }
}

/// Scans a run of attribute-value text up to (not including) the next `{{`
/// or `stop` character, decoding any character references within it.
fn scan_attr_text_chunk(cursor: &mut Cursor<'_>, stop: impl Fn(char) -> bool) -> AttrValue {
    let rest = cursor.rest();
    let mut end = rest.len();
    for (i, c) in rest.char_indices() {
        if c == '&' || stop(c) || rest[i..].starts_with("{{") {
            end = i;
            break;
        }
    }
    // Ensure forward progress and handle a leading char-ref.
    if end == 0 {
        if let Some((node, consumed)) = try_char_ref(rest) {
            cursor.advance(consumed);
            return match node {
                Node::CharRef { html, decoded } => AttrValue::CharRef { html, decoded },
                _ => unreachable!(),
            };
        }
        // Not a char-ref: emit the bare `&` (or whatever stop didn't catch)
        // as literal text and advance one character.
        let ch = rest.chars().next().unwrap();
        cursor.advance(ch.len_utf8());
        return AttrValue::Text(ch.to_string());
    }
    let text = rest[..end].to_string();
    cursor.advance(end);
    AttrValue::Text(text)
}

fn scan_name(cursor: &mut Cursor<'_>) -> String {
    let rest = cursor.rest();
    let end = rest
        .char_indices()
        .find(|(_, c)| c.is_whitespace() || matches!(c, '/' | '>'))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    let name = rest[..end].to_string();
    cursor.advance(end);
    name
}

fn scan_attr_name(cursor: &mut Cursor<'_>) -> String {
    let rest = cursor.rest();
    let end = rest
        .char_indices()
        .find(|(_, c)| c.is_whitespace() || matches!(c, '=' | '/' | '>'))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    let name = rest[..end].to_string();
    cursor.advance(end);
    name
}

fn skip_ws(cursor: &mut Cursor<'_>) {
    let rest = cursor.rest();
    let end = rest
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    cursor.advance(end);
}

/// Scans exactly one text/char-ref node's worth of input: a run of literal
/// characters up to the next `&`, `<`, `{{`, or `should_stop` boundary, or
/// (if the run is empty) a single decoded character reference.
fn scan_one_text_node(cursor: &mut Cursor<'_>, should_stop: &dyn Fn(&Cursor<'_>) -> bool) -> Node {
    let rest = cursor.rest();
    let mut end = rest.len();
    for (i, c) in rest.char_indices() {
        if i > 0 {
            let mut probe = Cursor {
                input: cursor.input,
                pos: cursor.pos + i,
                source_name: cursor.source_name,
            };
            if should_stop(&probe) {
                end = i;
                break;
            }
            let _ = &mut probe;
        }
        if c == '&' || c == '<' || rest[i..].starts_with("{{") {
            end = i;
            break;
        }
    }
    if end == 0 {
        if let Some((node, consumed)) = try_char_ref(rest) {
            cursor.advance(consumed);
            return node;
        }
        let ch = rest.chars().next().unwrap();
        cursor.advance(ch.len_utf8());
        return Node::Text(ch.to_string());
    }
    let text = rest[..end].to_string();
    cursor.advance(end);
    Node::Text(text)
}

/// Recognizes a leading named or numeric character reference (`&amp;`,
/// `&#39;`, `&#x27;`) and decodes it via `html-escape`. Returns the node and
/// the number of bytes consumed, or `None` if `rest` doesn't start with a
/// well-formed reference (in which case the `&` is emitted literally).
fn try_char_ref(rest: &str) -> Option<(Node, usize)> {
    static CHAR_REF: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);").unwrap());
    let m = CHAR_REF.find(rest)?;
    let html = m.as_str().to_string();
    let decoded = html_escape::decode_html_entities(&html).into_owned();
    Some((
        Node::CharRef {
            html,
            decoded,
        },
        m.end(),
    ))
}
