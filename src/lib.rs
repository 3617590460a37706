// stachec — compiles a Handlebars/mustache-like templating language embedded
// in HTML into JS-shaped render source.
//
// Pipeline:
//   HTML+stache source → parse (html::parse) → intermediate tree →
//   optimize (optimizer::optimize) → specialize (specializer::specialize) →
//   emit (codegen::code_gen_forest) → wrapped render-function source
//
// Reference implementation this architecture is modeled on: Meteor's
// spacebars-compiler (StacheScanner → TemplateParser → Optimizer →
// Specializer → CodeEmitter pipeline).

mod codegen;
mod error;
mod html;
mod optimizer;
mod render;
mod specializer;
mod stache;
mod tokenizer;
mod tree;

pub use error::CompileError;
pub use stache::{Argument, ArgValue, Path, StacheTag};
pub use tree::{AttrValue, Node, Tag};

/// Options threaded through every public entry point (§4.8 "Ambient
/// configuration"). Builder-style, mirroring the optional/defaulted fields
/// common across this crate's pipeline stages.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Included in error messages' `"... in <sourceName>"` suffix (§6).
    source_name: Option<String>,
    /// Whether `compile` runs the optimizer pass. Defaults to `true`;
    /// disabling it is mainly useful for inspecting unfused codegen output.
    optimize: bool,
    /// Whether `compile` emits the template wrapper, binding `__content`/
    /// `__elseContent` off `self` (§4.6/§6 `options.isTemplate`). Defaults to
    /// `false`, the plain-expression wrapper.
    is_template: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        CompileOptions {
            source_name: None,
            optimize: true,
            is_template: false,
        }
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_template(mut self, is_template: bool) -> Self {
        self.is_template = is_template;
        self
    }
}

fn source_name(options: Option<&CompileOptions>) -> Option<&str> {
    options.and_then(|o| o.source_name.as_deref())
}

/// Parses `input` into the intermediate tree (§4.2 `parse(input) → tree`).
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(len = input.len())))]
pub fn parse(input: &str, options: Option<&CompileOptions>) -> Result<Vec<Node>, CompileError> {
    html::parse(input, source_name(options))
}

/// Specializes and emits a tree, without optimizing it first — the same
/// operation the specializer itself uses to code-gen a block's captured
/// content (§4.3, §4.4).
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub fn code_gen(tree: &[Node], _options: Option<&CompileOptions>) -> Result<String, CompileError> {
    let specialized = specializer::specialize(tree)?;
    codegen::code_gen_forest(&specialized)
}

/// Parses exactly one stache tag at `pos` (§4.1), stripping the scanner's
/// internal bookkeeping (`charPos`/`charLength`) before returning it.
pub fn parse_stache_tag(
    input: &str,
    pos: usize,
    options: Option<&CompileOptions>,
) -> Result<StacheTag, CompileError> {
    stache::parse_stache_tag(input, pos, source_name(options)).map(|scanned| scanned.tag)
}

/// Compiles a stache-tagged HTML template into JS render-function source.
///
/// # Examples
///
/// ```
/// let src = stachec::compile("<p>Hello, {{name}}!</p>", None).unwrap();
/// assert!(src.contains("Spacebars.mustache"));
/// ```
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(len = input.len())))]
pub fn compile(input: &str, options: Option<&CompileOptions>) -> Result<String, CompileError> {
    let tree = parse(input, options)?;
    let tree = if options.map(|o| o.optimize).unwrap_or(true) {
        optimizer::optimize(&tree)
    } else {
        tree
    };
    let specialized = specializer::specialize(&tree)?;
    let body = codegen::code_gen_forest(&specialized)?;
    let preamble = if options.map(|o| o.is_template).unwrap_or(false) {
        "var self = this;\n  var __content = self.__content,\n      __elseContent = self.__elseContent;"
    } else {
        "var self = this;"
    };
    Ok(beautify(&format!(
        "(function () {{\n  {preamble}\n  return {body};\n}})"
    )))
}

/// Trailing-semicolon stripping — the only beautification this crate
/// performs (REDESIGN FLAG R4: no real pretty-printer/beautifier).
fn beautify(src: &str) -> String {
    src.trim_end().trim_end_matches(';').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_plain_text() {
        let out = compile("Hello", None).unwrap();
        assert!(out.contains(r#""Hello""#));
        assert!(out.starts_with("(function () {"));
    }

    #[test]
    fn compile_interpolation() {
        let out = compile("Hi {{name}}", None).unwrap();
        assert!(out.contains("Spacebars.mustache"));
        assert!(out.contains(r#"self.lookup("name")"#));
    }

    #[test]
    fn compile_static_markup_is_optimized_into_one_raw_string() {
        let out = compile("<p>hi</p>", None).unwrap();
        assert!(out.contains(r#""<p>hi</p>""#));
        assert!(!out.contains("UI.Tag.p"));
    }

    #[test]
    fn compile_without_optimizer_emits_tag_calls() {
        let options = CompileOptions::new().with_optimize(false);
        let out = compile("<p>hi</p>", Some(&options)).unwrap();
        assert!(out.contains("UI.Tag.p"));
    }

    #[test]
    fn compile_with_is_template_binds_content_slots() {
        let options = CompileOptions::new().with_template(true);
        let out = compile("hi {{name}}", Some(&options)).unwrap();
        assert!(out.contains("var __content = self.__content"));
        assert!(out.contains("__elseContent = self.__elseContent"));
    }

    #[test]
    fn compile_without_is_template_omits_content_slots() {
        let out = compile("hi", None).unwrap();
        assert!(!out.contains("__content"));
    }

    #[test]
    fn compile_if_else_block() {
        let out = compile("{{#if ready}}yes{{else}}no{{/if}}", None).unwrap();
        assert!(out.contains("UI.If"));
        assert!(out.contains("elseContent"));
    }

    #[test]
    fn compile_reports_source_name_in_errors() {
        let options = CompileOptions::new().with_source_name("widget.html");
        let err = compile("{{else}}", Some(&options)).unwrap_err();
        assert!(err.to_string().contains("in widget.html"));
    }

    #[test]
    fn parse_stache_tag_strips_bookkeeping() {
        let tag = parse_stache_tag("{{name}}", 0, None).unwrap();
        assert!(matches!(tag, StacheTag::Double { .. }));
    }

    #[test]
    fn code_gen_skips_optimization() {
        let tree = parse("<p>hi</p>", None).unwrap();
        let out = code_gen(&tree, None).unwrap();
        assert!(out.contains("UI.Tag.p"));
    }

    #[test]
    fn beautify_strips_trailing_semicolon() {
        assert_eq!(beautify("foo;"), "foo");
        assert_eq!(beautify("foo"), "foo");
    }
}
