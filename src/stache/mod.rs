// The stache-tag data model (§3 StacheTag/Path/Argument) and the
// StacheScanner (§4.1) that parses one into the other.

pub(crate) mod args;
pub(crate) mod path;
pub(crate) mod scanner;

use crate::tree::Node;

pub use path::Path;
pub(crate) use scanner::{parse_stache_tag, ScannedTag};

/// A single stache-tag argument, optionally named (§3 Arguments).
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// `Some(name)` when this was written as `name=value`.
    pub name: Option<String>,
    pub value: ArgValue,
}

impl Argument {
    pub(crate) fn positional(value: ArgValue) -> Self {
        Argument { name: None, value }
    }

    pub(crate) fn keyword(name: String, value: ArgValue) -> Self {
        Argument {
            name: Some(name),
            value,
        }
    }

    pub fn is_keyword(&self) -> bool {
        self.name.is_some()
    }
}

/// The value carried by an `Argument` (§3).
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Path(Path),
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

/// A parsed stache tag (§3 StacheTag). `BlockClose`, `Else`, and `Comment`
/// are consumed entirely by the `TemplateParser` and never survive into the
/// tree; only `Double`, `Triple`, `Inclusion`, and `BlockOpen` are ever
/// wrapped in `Node::Special`.
#[derive(Debug, Clone, PartialEq)]
pub enum StacheTag {
    /// `{{path args...}}` — escaped interpolation or helper call.
    Double { path: Path, args: Vec<Argument> },
    /// `{{{path args...}}}` — unescaped interpolation.
    Triple { path: Path, args: Vec<Argument> },
    /// `{{> path args...}}` — partial / component inclusion.
    Inclusion { path: Path, args: Vec<Argument> },
    /// `{{#path args...}} content {{else}} elseContent {{/path}}`.
    BlockOpen {
        path: Path,
        args: Vec<Argument>,
        content: Vec<Node>,
        else_content: Option<Vec<Node>>,
    },
    /// `{{/path}}` — consumed by the parser when it closes a block.
    BlockClose { path: Path },
    /// `{{else}}` — consumed by the parser inside a block.
    Else,
    /// `{{! ... }}` — absorbed and discarded by the parser.
    Comment(String),
}

impl StacheTag {
    /// Number of positional (unnamed) arguments, used to enforce the
    /// inclusion-tag "at most one positional argument" invariant (§3, §4.1).
    pub(crate) fn positional_arg_count(&self) -> usize {
        match self {
            StacheTag::Double { args, .. }
            | StacheTag::Triple { args, .. }
            | StacheTag::Inclusion { args, .. }
            | StacheTag::BlockOpen { args, .. } => {
                args.iter().filter(|a| !a.is_keyword()).count()
            }
            _ => 0,
        }
    }
}
