// Specializer (§4.4/§4.5): rewrites every remaining `Special`/dynamic-attr
// node into `EmitCode` target source. Runs after the optimizer, on whatever
// the optimizer left untouched — the static runs it already fused never
// reach here, since a fused `Raw`/`Text` node has nothing left to specialize.
//
// Block content (`BlockOpen.content`/`else_content`) is specialized and
// code-generated directly into the `UI.block(function () { return ...; })`
// thunk source, rather than being optimized first — `codeGen(subtree)`,
// not the full `compile` pipeline, per §4.3's silence on block content.

use crate::codegen::{bare_or_quoted_attr_key, code_gen_forest, code_gen_path, format_number, string_literal};
use crate::error::{CompileError, Result};
use crate::stache::{Argument, ArgValue, Path, StacheTag};
use crate::tree::{AttrValue, Node, Tag};

/// Built-in component names a single-segment callee path may resolve to
/// directly, bypassing the `Template[...] || self.lookup(...)` fallback
/// (§4.4 "Component resolution for inclusion/block").
const KNOWN_COMPONENTS: &[(&str, &str)] = &[
    ("content", "__content"),
    ("elseContent", "__elseContent"),
    ("if", "UI.If"),
    ("unless", "UI.Unless"),
    ("with", "UI.With"),
    ("each", "UI.Each"),
];

/// Specializes a node forest.
pub(crate) fn specialize(nodes: &[Node]) -> Result<Vec<Node>> {
    nodes.iter().map(specialize_node).collect()
}

fn specialize_node(node: &Node) -> Result<Node> {
    match node {
        Node::Text(_) | Node::Raw(_) | Node::CharRef { .. } | Node::Comment(_) | Node::EmitCode(_) => {
            Ok(node.clone())
        }
        Node::Tag(tag) => Ok(Node::Tag(specialize_tag(tag)?)),
        Node::Special(stache) => Ok(Node::EmitCode(specialize_stache(stache)?)),
    }
}

fn specialize_tag(tag: &Tag) -> Result<Tag> {
    let mut out = tag.clone();
    out.children = specialize(&tag.children)?;

    let mut new_attrs = Vec::with_capacity(tag.attrs.len());
    for (name, value) in &tag.attrs {
        new_attrs.push((name.clone(), specialize_attr_value(value)?));
    }
    out.attrs = new_attrs;

    let mut dynamic = Vec::with_capacity(tag.specials.len());
    for stache in &tag.specials {
        dynamic.push(format!("function () {{ return {}; }}", attr_mustache_call(stache)?));
    }
    out.dynamic = dynamic;
    out.specials = Vec::new();
    Ok(out)
}

fn specialize_attr_value(value: &AttrValue) -> Result<AttrValue> {
    match value {
        AttrValue::Text(_) | AttrValue::CharRef { .. } | AttrValue::EmitCode(_) => Ok(value.clone()),
        AttrValue::Special(stache) => Ok(AttrValue::EmitCode(format!(
            "function () {{ return {}; }}",
            mustache_call(stache)?
        ))),
        AttrValue::List(parts) => {
            if !value.is_special() {
                return Ok(value.clone());
            }
            let mut codes = Vec::with_capacity(parts.len());
            for part in parts {
                codes.push(match part {
                    AttrValue::Text(s) => string_literal(s),
                    AttrValue::CharRef { decoded, .. } => string_literal(decoded),
                    AttrValue::Special(stache) => mustache_call(stache)?,
                    AttrValue::EmitCode(src) => src.clone(),
                    AttrValue::List(_) => {
                        return Err(CompileError::Invariant(
                            "nested attribute value List in specializer".to_string(),
                        ))
                    }
                });
            }
            Ok(AttrValue::EmitCode(format!(
                "function () {{ return [{}].join(\"\"); }}",
                codes.join(", ")
            )))
        }
    }
}

/// `Spacebars.mustache(...)` — the per-key attribute rewrite (§4.5 bullet 2:
/// `Special(tag)` in an ordinary attribute value "becomes `EmitCode("function
/// () { return Spacebars.mustache(<…>); }")`"), shared with the `DOUBLE` tree
/// rewrite in `specialize_stache` since both build the same call shape.
fn mustache_call(stache: &StacheTag) -> Result<String> {
    match stache {
        StacheTag::Double { path, args } | StacheTag::Triple { path, args } => {
            Ok(format!("Spacebars.mustache({})", mustache_call_args(path, args)?))
        }
        other => Err(CompileError::Invariant(format!(
            "unexpected stache kind in attribute position: {other:?}"
        ))),
    }
}

/// `Spacebars.attrMustache` is the whole-attribute-set counterpart used only
/// for `$specials`→`$dynamic` dynamics (§4.5 bullet 4, e.g. `<div
/// {{attrs}}>`), never for a per-key attribute value.
fn attr_mustache_call(stache: &StacheTag) -> Result<String> {
    match stache {
        StacheTag::Double { path, args } | StacheTag::Triple { path, args } => {
            Ok(format!("Spacebars.attrMustache({})", mustache_call_args(path, args)?))
        }
        other => Err(CompileError::Invariant(format!(
            "unexpected stache kind in attribute position: {other:?}"
        ))),
    }
}

/// Every stache-kind rewrite is itself wrapped in a `function () { return
/// …; }` thunk (§4.4 "Rewrites by stache kind") — the node's position in the
/// tree (a tag child, or the document root) is re-evaluated by the runtime
/// on every reactive invalidation, not computed once at specialize time.
fn specialize_stache(stache: &StacheTag) -> Result<String> {
    let call = match stache {
        StacheTag::Double { .. } => mustache_call(stache)?,
        StacheTag::Triple { path, args } => format!(
            "Spacebars.makeRaw(Spacebars.mustache({}))",
            mustache_call_args(path, args)?
        ),
        StacheTag::Inclusion { path, args } => include_call(path, args)?,
        StacheTag::BlockOpen {
            path,
            args,
            content,
            else_content,
        } => block_call(path, args, content, else_content.as_deref())?,
        other => {
            return Err(CompileError::Invariant(format!(
                "a {other:?} tag reached the specializer — the template parser should have consumed it"
            )))
        }
    };
    Ok(format!("function () {{ return {call}; }}"))
}

/// Builds `<pathCode>, <positionalCode>..., Spacebars.kw({...})?` — the
/// shared call-argument shape for `Spacebars.mustache`/`attrMustache`
/// (§4.4 "Argument codegen").
fn mustache_call_args(path: &Path, args: &[Argument]) -> Result<String> {
    let mut parts = vec![code_gen_path(path)];
    for arg in args.iter().filter(|a| !a.is_keyword()) {
        parts.push(arg_value_code(&arg.value));
    }
    let keyword_literal = keyword_object_literal(args);
    if let Some(literal) = keyword_literal {
        parts.push(format!("Spacebars.kw({literal})"));
    }
    Ok(parts.join(", "))
}

fn arg_value_code(value: &ArgValue) -> String {
    match value {
        ArgValue::Path(path) => code_gen_path(path),
        ArgValue::String(s) => string_literal(s),
        ArgValue::Number(n) => format_number(*n),
        ArgValue::Boolean(b) => b.to_string(),
        ArgValue::Null => "null".to_string(),
    }
}

fn keyword_object_literal(args: &[Argument]) -> Option<String> {
    let entries: Vec<String> = args
        .iter()
        .filter(|a| a.is_keyword())
        .map(|a| {
            format!(
                "{}: {}",
                bare_or_quoted_attr_key(a.name.as_deref().unwrap()),
                arg_value_code(&a.value)
            )
        })
        .collect();
    if entries.is_empty() {
        None
    } else {
        Some(format!("{{{}}}", entries.join(", ")))
    }
}

/// Resolves an `INCLUSION`/`BLOCKOPEN` callee path to a component reference
/// (§4.4 "Component resolution for inclusion/block"): a known built-in name
/// maps to its literal runtime reference; a plain (non-built-in)
/// single-segment path falls back to a runtime template-or-helper lookup;
/// anything else (multi-segment, ancestor-relative) is a dynamic path
/// lookup expression.
fn code_gen_component(path: &Path) -> String {
    let segments = path.segments();
    if segments.len() == 1 && segments[0] != "." && !segments[0].starts_with('.') {
        let name = &segments[0];
        if let Some((_, mapped)) = KNOWN_COMPONENTS.iter().find(|(k, _)| k == name) {
            return (*mapped).to_string();
        }
        return format!(
            "(Template[{}] || {})",
            string_literal(name),
            code_gen_path(path)
        );
    }
    code_gen_path(path)
}

/// Argument code for a single positional argument feeding `Spacebars.call`
/// (§4.4 "When a PATH argument appears among inclusion arguments..."): a
/// path is emitted bare — `Spacebars.call` itself decides whether to invoke
/// it as a helper — and a literal is emitted as its literal form.
fn include_positional_arg_code(arg: &Argument) -> String {
    match &arg.value {
        ArgValue::Path(path) => code_gen_path(path),
        other => arg_value_code(other),
    }
}

/// Builds the `data` entry for an inclusion/block object literal (§4.4
/// "positional arguments are assigned to a synthetic data key"): a single
/// positional path argument is deferred into `Spacebars.call` so it is
/// re-evaluated as a reactive subcomputation (§9 "Reactive boundary"); a
/// single positional literal needs no deferral; two or more positional
/// arguments are combined into one `Spacebars.call(<first>, <rest>)` thunk.
fn inclusion_data_code(args: &[Argument]) -> Option<String> {
    let positional: Vec<&Argument> = args.iter().filter(|a| !a.is_keyword()).collect();
    match positional.len() {
        0 => None,
        1 => {
            let arg = positional[0];
            Some(match &arg.value {
                ArgValue::Path(path) => format!(
                    "function () {{ return Spacebars.call({}); }}",
                    code_gen_path(path)
                ),
                other => arg_value_code(other),
            })
        }
        _ => {
            let codes: Vec<String> = positional.iter().map(|a| include_positional_arg_code(a)).collect();
            Some(format!(
                "function () {{ return Spacebars.call({}); }}",
                codes.join(", ")
            ))
        }
    }
}

/// Builds the plain object literal passed as `Spacebars.include`'s second
/// argument: keyword args become literal-name keys, positional args the
/// synthetic `data` key, and (for `BlockOpen`) the captured content
/// fragments become `__content`/`__elseContent` (§4.4). Not
/// `Spacebars.kw(...)` — the runtime contract in §6 takes a plain options
/// object here, unlike the keyword-argument map passed to
/// `Spacebars.mustache`/`attrMustache`.
fn inclusion_args_object(
    args: &[Argument],
    content: Option<&[Node]>,
    else_content: Option<&[Node]>,
) -> Result<Option<String>> {
    let mut entries = Vec::new();
    if let Some(content_nodes) = content {
        entries.push(format!(
            "__content: UI.block(function () {{ return {}; }})",
            code_gen_subtree(content_nodes)?
        ));
    }
    if let Some(else_nodes) = else_content {
        entries.push(format!(
            "__elseContent: UI.block(function () {{ return {}; }})",
            code_gen_subtree(else_nodes)?
        ));
    }
    for arg in args.iter().filter(|a| a.is_keyword()) {
        entries.push(format!(
            "{}: {}",
            bare_or_quoted_attr_key(arg.name.as_deref().unwrap()),
            arg_value_code(&arg.value)
        ));
    }
    if let Some(data) = inclusion_data_code(args) {
        entries.push(format!("data: {data}"));
    }
    if entries.is_empty() {
        Ok(None)
    } else {
        Ok(Some(format!("{{{}}}", entries.join(", "))))
    }
}

fn include_call(path: &Path, args: &[Argument]) -> Result<String> {
    let component = code_gen_component(path);
    Ok(match inclusion_args_object(args, None, None)? {
        Some(obj) => format!("Spacebars.include({component}, {obj})"),
        None => format!("Spacebars.include({component})"),
    })
}

fn block_call(
    path: &Path,
    args: &[Argument],
    content: &[Node],
    else_content: Option<&[Node]>,
) -> Result<String> {
    let component = code_gen_component(path);
    let obj = inclusion_args_object(args, Some(content), else_content)?
        .expect("a block always carries at least its __content entry");
    Ok(format!("Spacebars.include({component}, {obj})"))
}

/// `codeGen(subtree)` (§4.3's public contract, reused here rather than the
/// full `compile` pipeline): specialize, then emit — no optimizer pass.
fn code_gen_subtree(nodes: &[Node]) -> Result<String> {
    let specialized = specialize(nodes)?;
    code_gen_forest(&specialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(name: &str) -> StacheTag {
        StacheTag::Double {
            path: Path(vec![name.to_string()]),
            args: vec![],
        }
    }

    #[test]
    fn double_mustache_specializes_to_mustache_call() {
        let nodes = vec![Node::Special(double("name"))];
        let out = specialize(&nodes).unwrap();
        assert_eq!(
            out,
            vec![Node::EmitCode(
                r#"function () { return Spacebars.mustache(self.lookup("name")); }"#.to_string()
            )]
        );
    }

    #[test]
    fn triple_mustache_wraps_in_make_raw() {
        let nodes = vec![Node::Special(StacheTag::Triple {
            path: Path(vec!["html".to_string()]),
            args: vec![],
        })];
        let out = specialize(&nodes).unwrap();
        assert_eq!(
            out,
            vec![Node::EmitCode(
                r#"function () { return Spacebars.makeRaw(Spacebars.mustache(self.lookup("html"))); }"#
                    .to_string()
            )]
        );
    }

    #[test]
    fn inclusion_with_keyword_args_builds_data_thunk() {
        let nodes = vec![Node::Special(StacheTag::Inclusion {
            path: Path(vec!["widget".to_string()]),
            args: vec![Argument::keyword("name".to_string(), ArgValue::String("x".to_string()))],
        })];
        let out = specialize(&nodes).unwrap();
        assert_eq!(
            out,
            vec![Node::EmitCode(
                r#"function () { return Spacebars.include((Template["widget"] || self.lookup("widget")), {name: "x"}); }"#
                    .to_string()
            )]
        );
    }

    #[test]
    fn plain_inclusion_has_no_data_argument() {
        let nodes = vec![Node::Special(StacheTag::Inclusion {
            path: Path(vec!["widget".to_string()]),
            args: vec![],
        })];
        let out = specialize(&nodes).unwrap();
        assert_eq!(
            out,
            vec![Node::EmitCode(
                r#"function () { return Spacebars.include((Template["widget"] || self.lookup("widget"))); }"#
                    .to_string()
            )]
        );
    }

    #[test]
    fn if_block_resolves_to_ui_if_with_content_and_else() {
        let nodes = vec![Node::Special(StacheTag::BlockOpen {
            path: Path(vec!["if".to_string()]),
            args: vec![Argument::positional(ArgValue::Path(Path(vec!["ready".to_string()])))],
            content: vec![Node::Text("yes".to_string())],
            else_content: Some(vec![Node::Text("no".to_string())]),
        })];
        let out = specialize(&nodes).unwrap();
        match &out[0] {
            Node::EmitCode(src) => {
                assert!(src.starts_with("function () { return Spacebars.include(UI.If, {"));
                assert!(src.contains(r#"data: function () { return Spacebars.call(self.lookup("ready")); }"#));
                assert!(src.contains(r#"__content: UI.block(function () { return "yes"; })"#));
                assert!(src.contains(r#"__elseContent: UI.block(function () { return "no"; })"#));
            }
            _ => panic!("expected EmitCode"),
        }
    }

    #[test]
    fn custom_block_helper_resolves_to_template_fallback() {
        let nodes = vec![Node::Special(StacheTag::BlockOpen {
            path: Path(vec!["myHelper".to_string()]),
            args: vec![],
            content: vec![Node::Text("x".to_string())],
            else_content: None,
        })];
        let out = specialize(&nodes).unwrap();
        match &out[0] {
            Node::EmitCode(src) => assert!(src.starts_with(
                r#"function () { return Spacebars.include((Template["myHelper"] || self.lookup("myHelper")),"#
            )),
            _ => panic!("expected EmitCode"),
        }
    }

    #[test]
    fn whole_tag_dynamic_attrs_become_dynamic_thunks() {
        let mut tag = Tag::new("div");
        tag.specials.push(double("attrs"));
        let out = specialize_tag(&tag).unwrap();
        assert!(out.specials.is_empty());
        assert_eq!(out.dynamic.len(), 1);
        assert_eq!(
            out.dynamic[0],
            r#"function () { return Spacebars.attrMustache(self.lookup("attrs")); }"#
        );
    }

    #[test]
    fn whole_attribute_special_value_becomes_mustache_not_attr_mustache() {
        let value = AttrValue::Special(double("status"));
        let out = specialize_attr_value(&value).unwrap();
        assert_eq!(
            out,
            AttrValue::EmitCode(
                r#"function () { return Spacebars.mustache(self.lookup("status")); }"#.to_string()
            )
        );
    }

    #[test]
    fn dynamic_attribute_value_list_collapses_to_one_thunk() {
        let value = AttrValue::List(vec![
            AttrValue::Text("a ".to_string()),
            AttrValue::Special(double("b")),
        ]);
        let out = specialize_attr_value(&value).unwrap();
        assert_eq!(
            out,
            AttrValue::EmitCode(
                r#"function () { return ["a ", Spacebars.mustache(self.lookup("b"))].join(""); }"#
                    .to_string()
            )
        );
    }

    #[test]
    fn static_attribute_list_is_left_untouched() {
        let value = AttrValue::List(vec![
            AttrValue::Text("a".to_string()),
            AttrValue::Text("b".to_string()),
        ]);
        assert_eq!(specialize_attr_value(&value).unwrap(), value);
    }
}
