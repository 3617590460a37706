// CodeEmitter (§4.6): serializes a fully specialized tree (no `Special`
// nodes remain) into target JS source text.
//
// Two context-dependent serialization rules, both load-bearing for the
// spec's testable properties (§8):
//   - A *forest* (the document root, or a block's captured content/else
//     content) collapses to a bare expression when it has exactly one
//     element, and only bracket-wraps into `[<codes>]` otherwise (scenario 1).
//   - A tag's children are always emitted as separate, comma-joined
//     arguments to `UI.Tag.<name>(...)`, never array-bracket-wrapped,
//     regardless of count.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CompileError, Result};
use crate::render::to_html;
use crate::stache::Path;
use crate::tree::{AttrValue, Node, Tag};

/// Emits a node forest as one JS expression, applying the singleton-collapse
/// rule (§8 scenario 1).
pub(crate) fn code_gen_forest(nodes: &[Node]) -> Result<String> {
    let codes: Vec<String> = nodes.iter().map(emit_node).collect::<Result<_>>()?;
    Ok(match codes.len() {
        1 => codes.into_iter().next().unwrap(),
        _ => format!("[{}]", codes.join(", ")),
    })
}

fn emit_node(node: &Node) -> Result<String> {
    match node {
        Node::Text(_) | Node::Raw(_) | Node::CharRef { .. } | Node::Comment(_) => {
            let html = to_html(std::slice::from_ref(node))?;
            Ok(string_literal(&html))
        }
        Node::Tag(tag) => emit_tag(tag),
        Node::EmitCode(src) => Ok(src.clone()),
        Node::Special(_) => Err(CompileError::Invariant(
            "codegen reached an unspecialized Special node".to_string(),
        )),
    }
}

fn emit_tag(tag: &Tag) -> Result<String> {
    if !tag.specials.is_empty() {
        return Err(CompileError::Invariant(format!(
            "codegen reached tag <{}> with unspecialized $specials",
            tag.name
        )));
    }
    let mut args = Vec::new();
    if let Some(attrs) = emit_attrs(tag)? {
        args.push(attrs);
    }
    for child in &tag.children {
        args.push(emit_node(child)?);
    }
    Ok(format!("UI.Tag.{}({})", tag.name, args.join(", ")))
}

fn emit_attrs(tag: &Tag) -> Result<Option<String>> {
    if tag.attrs.is_empty() && tag.dynamic.is_empty() {
        return Ok(None);
    }
    let mut entries: Vec<String> = Vec::new();
    for (name, value) in &tag.attrs {
        let code = emit_attr_value(value)?;
        entries.push(format!("{}: {}", bare_or_quoted_attr_key(name), code));
    }
    if !tag.dynamic.is_empty() {
        entries.push(format!("$dynamic: [{}]", tag.dynamic.join(", ")));
    }
    Ok(Some(format!("{{{}}}", entries.join(", "))))
}

fn emit_attr_value(value: &AttrValue) -> Result<String> {
    match value {
        AttrValue::Text(s) => Ok(string_literal(s)),
        AttrValue::CharRef { decoded, .. } => Ok(string_literal(decoded)),
        AttrValue::EmitCode(src) => Ok(src.clone()),
        AttrValue::List(parts) => {
            let codes: Vec<String> = parts.iter().map(emit_attr_value).collect::<Result<_>>()?;
            Ok(format!("[{}]", codes.join(", ")))
        }
        AttrValue::Special(_) => Err(CompileError::Invariant(
            "codegen reached an unspecialized Special attribute value".to_string(),
        )),
    }
}

/// Whether `key` is a valid bare JS identifier, used to decide between
/// `foo: ...` and `"foo-bar": ...` in an emitted object literal (§4.6
/// "object-literal attribute keys").
pub(crate) fn bare_or_quoted_attr_key(key: &str) -> String {
    static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());
    if BARE_KEY.is_match(key) {
        key.to_string()
    } else {
        string_literal(key)
    }
}

/// JSON-string-literal codec (§4.6/§4.8): `serde_json` already escapes
/// control characters and quotes; U+2028/U+2029 additionally need escaping
/// since they are valid-but-unterminated-statement characters in JS string
/// literals, which JSON does not treat specially.
pub(crate) fn string_literal(s: &str) -> String {
    let json = serde_json::to_string(s).expect("string serialization cannot fail");
    json.replace('\u{2028}', r" ").replace('\u{2029}', r" ")
}

/// Renders a JS number literal from an argument's `Number` value (§4.1/§4.6).
/// Integral values drop the trailing `.0` (`3` not `3.0`); the stache
/// tokenizer only ever lexes non-negative decimals, with the sign folded in
/// separately (§4.1 "Unary minus"), so this never needs exponential form.
pub(crate) fn format_number(n: f64) -> String {
    if n == n.trunc() && n.is_finite() {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Generates the runtime lookup expression for a path (§4.4 "Path code
/// generation"): `codeGenPath([s0, s1, …])` emits `self.lookup(<literal
/// s0>)` for length 1; longer paths wrap that base in `Spacebars.dot(…,
/// <literal s1>, <literal s2>, …)` (§8 scenarios 2 and 3). The first segment
/// is always passed through `self.lookup` as its literal string, including
/// the `.`/`this` marker and pure-dot ancestor runs (`..`, `...`, ...) —
/// `self.lookup` alone resolves those per §6's runtime contract, with no
/// separate ancestor-walking call.
pub(crate) fn code_gen_path(path: &Path) -> String {
    let segments = path.segments();
    let first = &segments[0];
    let rest = &segments[1..];

    let base = format!("self.lookup({})", string_literal(first));

    if rest.is_empty() {
        base
    } else {
        format!("Spacebars.dot({base}, {})", join_string_literals(rest))
    }
}

fn join_string_literals(segments: &[String]) -> String {
    segments
        .iter()
        .map(|s| string_literal(s))
        .collect::<Vec<_>>()
        .join(", ")
}
