// Renders a (fully static) slice of the intermediate tree back to literal
// HTML text. Used by the optimizer to fuse runs of static markup into a
// single `Raw` node (§4.3), and by the code emitter to serialize the static
// node kinds (`Text`/`Raw`/`CharRef`/`Comment`) that can still appear inside
// an unoptimized `<textarea>`/`<title>` subtree (§4.4, §9 "RCDATA").
//
// Stands in for the source's `toHTML` collaborator.

use crate::error::{CompileError, Result};
use crate::tree::{AttrValue, Node, Tag, VOID_ELEMENTS};

/// Serializes `nodes` to HTML. Fails with `CompileError::Invariant` if any
/// node is still `Special` or `EmitCode` — both are bugs in the caller, not
/// malformed input (the optimizer only ever calls this on runs already
/// proven free of specials).
pub(crate) fn to_html(nodes: &[Node]) -> Result<String> {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node)?;
    }
    Ok(out)
}

fn write_node(out: &mut String, node: &Node) -> Result<()> {
    match node {
        Node::Text(s) => out.push_str(&html_escape::encode_text(s)),
        Node::Raw(s) => out.push_str(s),
        Node::CharRef { html, .. } => out.push_str(html),
        Node::Comment(s) => {
            out.push_str("<!--");
            out.push_str(s);
            out.push_str("-->");
        }
        Node::Tag(tag) => write_tag(out, tag)?,
        Node::Special(_) => {
            return Err(CompileError::Invariant(
                "render::to_html reached a Special node".to_string(),
            ))
        }
        Node::EmitCode(_) => {
            return Err(CompileError::Invariant(
                "render::to_html reached an EmitCode node".to_string(),
            ))
        }
    }
    Ok(())
}

fn write_tag(out: &mut String, tag: &Tag) -> Result<()> {
    out.push('<');
    out.push_str(&tag.name);
    for (name, value) in &tag.attrs {
        out.push(' ');
        out.push_str(name);
        let rendered = render_attr_value(value)?;
        if !(rendered.is_empty() && matches!(value, AttrValue::Text(v) if v.is_empty())) {
            out.push_str("=\"");
            out.push_str(&rendered);
            out.push('"');
        }
    }
    let is_void = VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(&tag.name));
    if is_void {
        out.push_str(">");
        return Ok(());
    }
    out.push('>');
    for child in &tag.children {
        write_node(out, child)?;
    }
    out.push_str("</");
    out.push_str(&tag.name);
    out.push('>');
    Ok(())
}

fn render_attr_value(value: &AttrValue) -> Result<String> {
    match value {
        AttrValue::Text(s) => Ok(html_escape::encode_double_quoted_attribute(s).into_owned()),
        AttrValue::CharRef { html, .. } => Ok(html.clone()),
        AttrValue::List(parts) => {
            let mut out = String::new();
            for part in parts {
                out.push_str(&render_attr_value(part)?);
            }
            Ok(out)
        }
        AttrValue::Special(_) => Err(CompileError::Invariant(
            "render::to_html reached a Special attribute value".to_string(),
        )),
        AttrValue::EmitCode(_) => Err(CompileError::Invariant(
            "render::to_html reached an EmitCode attribute value".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_text_escaped() {
        let out = to_html(&[Node::Text("a & b < c".to_string())]).unwrap();
        assert_eq!(out, "a &amp; b &lt; c");
    }

    #[test]
    fn renders_raw_unescaped() {
        let out = to_html(&[Node::Raw("<b>x</b>".to_string())]).unwrap();
        assert_eq!(out, "<b>x</b>");
    }

    #[test]
    fn renders_char_ref_as_original_markup() {
        let out = to_html(&[Node::CharRef {
            html: "&amp;".to_string(),
            decoded: "&".to_string(),
        }])
        .unwrap();
        assert_eq!(out, "&amp;");
    }

    #[test]
    fn renders_comment() {
        let out = to_html(&[Node::Comment(" hi ".to_string())]).unwrap();
        assert_eq!(out, "<!-- hi -->");
    }

    #[test]
    fn renders_tag_with_attrs_and_children() {
        let mut tag = Tag::new("a");
        tag.attrs.push(("href".to_string(), AttrValue::Text("x&y".to_string())));
        tag.children.push(Node::Text("hi".to_string()));
        let out = to_html(&[Node::Tag(tag)]).unwrap();
        assert_eq!(out, r#"<a href="x&amp;y">hi</a>"#);
    }

    #[test]
    fn void_element_has_no_closing_tag() {
        let out = to_html(&[Node::Tag(Tag::new("br"))]).unwrap();
        assert_eq!(out, "<br>");
    }

    #[test]
    fn boolean_attribute_has_no_equals() {
        let mut tag = Tag::new("input");
        tag.attrs.push(("disabled".to_string(), AttrValue::Text(String::new())));
        let out = to_html(&[Node::Tag(tag)]).unwrap();
        assert_eq!(out, "<input disabled>");
    }

    #[test]
    fn special_node_is_an_invariant_violation() {
        use crate::stache::{Path, StacheTag};
        let special = Node::Special(StacheTag::Double {
            path: Path(vec!["x".to_string()]),
            args: vec![],
        });
        let err = to_html(&[special]).unwrap_err();
        assert!(matches!(err, CompileError::Invariant(_)));
    }
}
