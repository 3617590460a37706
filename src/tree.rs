// The intermediate tree shared by the HTML parser, optimizer, specializer,
// and code emitter (§3).
//
// Modeled as a tagged sum rather than the source's prototype chains: `Node`
// is the tree's only node type, `Tag` a struct carrying an ordered attribute
// list and a children vector. Where the source threads synthetic map keys
// (`$specials`, `$dynamic`) through a generic attrs object, `Tag` exposes
// them as dedicated fields instead.

use crate::stache::StacheTag;

/// HTML5 element names recognized by the fragment tokenizer and the
/// optimizer's RCDATA/TEXTAREA special case (§9 "Global tag registry").
/// Closed rather than a mutable runtime registry: compilation never needs to
/// register a new tag name, only decide RCDATA propagation for a handful of
/// well-known ones. Unrecognized names are still accepted and emitted.
pub const RCDATA_ELEMENTS: &[&str] = &["textarea", "title"];

/// Elements with no content and no closing tag, shared by the fragment
/// tokenizer (§4.2/R3) and `render::to_html` (§4.3's `toHTML` collaborator).
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// A node in the intermediate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Plain text, demoted from `Raw` when it contains neither `&` nor `<`.
    Text(String),
    /// Pre-rendered literal HTML, as produced by the optimizer.
    Raw(String),
    /// A decoded character reference, carrying both the original markup and
    /// the decoded string.
    CharRef { html: String, decoded: String },
    /// An HTML comment, carried through parsing but dropped at render time.
    Comment(String),
    /// An element with attributes and children.
    Tag(Tag),
    /// A stache tag awaiting specialization.
    Special(StacheTag),
    /// Verbatim target source, only ever produced by the specializer.
    EmitCode(String),
}

/// An attribute value: a scalar or a list of scalars (e.g. `class="a {{b}}"`
/// decomposes into a list of literal and dynamic parts).
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    CharRef { html: String, decoded: String },
    Special(StacheTag),
    EmitCode(String),
    List(Vec<AttrValue>),
}

impl AttrValue {
    pub(crate) fn is_special(&self) -> bool {
        match self {
            AttrValue::Special(_) => true,
            AttrValue::List(parts) => parts.iter().any(AttrValue::is_special),
            _ => false,
        }
    }
}

/// An HTML element. Attributes are kept in an ordered `Vec` (not a map)
/// because codegen's bare-vs-quoted key emission and golden-test output
/// must be deterministic and follow source order (§9 Polymorphic tree
/// nodes).
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub attrs: Vec<(String, AttrValue)>,
    /// Whole-attribute-set dynamics, e.g. `<div {{attrs}}>` (the source's
    /// synthetic `$specials` key). Populated by the HTML parser, consumed by
    /// the specializer into `dynamic`.
    pub specials: Vec<StacheTag>,
    /// Specialized form of `specials`: each entry is the source of a
    /// `function () { return Spacebars.attrMustache(...); }` thunk (the
    /// source's synthetic `$dynamic` key). Empty until the specializer runs.
    pub dynamic: Vec<String>,
    pub children: Vec<Node>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Tag {
            name: name.into(),
            attrs: Vec::new(),
            specials: Vec::new(),
            dynamic: Vec::new(),
            children: Vec::new(),
        }
    }

    pub(crate) fn is_rcdata(&self) -> bool {
        RCDATA_ELEMENTS
            .iter()
            .any(|n| n.eq_ignore_ascii_case(&self.name))
    }
}

/// `v` contains neither `&` nor `<` — the optimizer's test (§4.3) for
/// demoting a `Raw` HTML string down to a plain string.
pub(crate) fn is_pure_chars(v: &str) -> bool {
    !v.contains('&') && !v.contains('<')
}
