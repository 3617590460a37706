// Optimizer (§4.3): fuses maximal runs of fully-static tree structure into a
// single pre-rendered `Raw` (or, when the fused markup contains neither `&`
// nor `<`, a plain `Text`) node, so the code emitter never has to emit
// per-node `UI.Tag.xxx(...)` calls for markup with nothing dynamic in it.
//
// A node is "static" when neither it nor anything nested inside it still
// carries a `Special` — a `BlockOpen`/`Double`/etc. awaiting specialization,
// or a tag with pending `specials`/dynamic attribute values. Block content
// (`BlockOpen.content`/`else_content`) is never touched here: per §4.3 it is
// only ever optimized indirectly, through the specializer's own recursive
// `codeGen` call on that subtree.

use crate::render::to_html;
use crate::tree::{is_pure_chars, AttrValue, Node, Tag};

/// Rewrites a forest, fusing adjacent static runs into `Raw`/`Text` nodes.
pub(crate) fn optimize(nodes: &[Node]) -> Vec<Node> {
    optimize_array_parts(nodes)
}

/// Buffers consecutive static nodes and renders each run as one node;
/// non-static nodes are optimized in place and pushed through individually
/// (§4.3 "Procedure on an array of nodes").
fn optimize_array_parts(nodes: &[Node]) -> Vec<Node> {
    let mut out = Vec::new();
    let mut run: Vec<&Node> = Vec::new();

    let flush = |run: &mut Vec<&Node>, out: &mut Vec<Node>| {
        if run.is_empty() {
            return;
        }
        out.push(fuse_static_run(run));
        run.clear();
    };

    for node in nodes {
        if is_static_node(node) {
            run.push(node);
        } else {
            flush(&mut run, &mut out);
            out.push(optimize_node(node));
        }
    }
    flush(&mut run, &mut out);
    out
}

/// Renders a run of already-proven-static nodes to HTML and wraps the
/// result, demoting to `Text` when the rendered markup is pure characters
/// (§4.3 "Raw/Text demotion").
fn fuse_static_run(run: &[&Node]) -> Node {
    let owned: Vec<Node> = run.iter().map(|n| (*n).clone()).collect();
    // `to_html` only fails on Special/EmitCode, both excluded by
    // `is_static_node`; an error here is a bug in that predicate.
    let html = to_html(&owned).expect("optimizer: fused run was not actually static");
    if is_pure_chars(&html) {
        Node::Text(html)
    } else {
        Node::Raw(html)
    }
}

/// Whether `node` (and everything nested inside it) is free of any pending
/// `Special`.
fn is_static_node(node: &Node) -> bool {
    match node {
        Node::Text(_) | Node::Raw(_) | Node::CharRef { .. } | Node::Comment(_) => true,
        Node::Special(_) | Node::EmitCode(_) => false,
        Node::Tag(tag) => is_static_tag(tag),
    }
}

fn is_static_tag(tag: &Tag) -> bool {
    if !tag.specials.is_empty() {
        return false;
    }
    if tag.attrs.iter().any(|(_, v)| v.is_special()) {
        return false;
    }
    tag.children.iter().all(is_static_node)
}

/// Optimizes a single non-static node: a `Tag` recurses into its own
/// children (unless RCDATA, whose children the optimizer never touches —
/// §9 "RCDATA"); any other (already non-static, i.e. `Special`) node is
/// returned unchanged.
fn optimize_node(node: &Node) -> Node {
    match node {
        Node::Tag(tag) => Node::Tag(optimize_tag(tag)),
        other => other.clone(),
    }
}

fn optimize_tag(tag: &Tag) -> Tag {
    let mut out = tag.clone();
    if !tag.is_rcdata() {
        out.children = optimize_array_parts(&tag.children);
    }
    out.attrs = tag
        .attrs
        .iter()
        .map(|(name, value)| (name.clone(), optimize_attr_value(value)))
        .collect();
    out
}

/// Attribute values are never fused across parts (§4.3 only speaks of
/// fusing sibling *nodes*); a `List` part's own sub-values are left as-is
/// since the specializer, not the optimizer, rewrites `Special` attribute
/// parts.
fn optimize_attr_value(value: &AttrValue) -> AttrValue {
    value.clone()
}
