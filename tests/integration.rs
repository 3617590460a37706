// End-to-end API tests for stachec.

use pretty_assertions::assert_eq;

use stachec::{compile, parse, CompileOptions};

#[test]
fn empty_input_compiles_to_empty_forest() {
    let src = compile("", None).unwrap();
    assert_eq!(src, "(function () {\n  var self = this;\n  return [];\n})");
}

#[test]
fn plain_text_round_trips_as_a_bare_string() {
    let src = compile("Hello, world!", None).unwrap();
    assert!(src.contains(r#""Hello, world!""#));
}

#[test]
fn static_document_collapses_to_one_raw_node() {
    let src = compile("<h1>Hello</h1><p>World</p>", None).unwrap();
    assert!(src.contains(r#""<h1>Hello</h1><p>World</p>""#));
}

#[test]
fn interpolation_produces_a_mustache_call() {
    let src = compile("<p>Hi {{name}}!</p>", None).unwrap();
    assert!(src.contains(r#"Spacebars.mustache(self.lookup("name"))"#));
    // The surrounding markup keeps the tag call since it is no longer static.
    assert!(src.contains("UI.Tag.p"));
}

#[test]
fn unescaped_triple_mustache_wraps_in_make_raw() {
    let src = compile("{{{rawHtml}}}", None).unwrap();
    assert!(src.contains(r#"Spacebars.makeRaw(Spacebars.mustache(self.lookup("rawHtml")))"#));
}

#[test]
fn each_block_over_a_helper_path() {
    let src = compile("<ul>{{#each items}}<li>{{this}}</li>{{/each}}</ul>", None).unwrap();
    assert!(src.contains("UI.Each"));
    assert!(src.contains(r#"data: function () { return Spacebars.call(self.lookup("items")); }"#));
}

#[test]
fn inclusion_with_named_argument() {
    let src = compile(r#"{{> userCard name="Ada"}}"#, None).unwrap();
    assert!(src.contains(r#"Spacebars.include((Template["userCard"] || self.lookup("userCard"))"#));
    assert!(src.contains(r#"{name: "Ada"}"#));
}

#[test]
fn is_template_option_binds_content_slots_off_self() {
    let options = CompileOptions::new().with_template(true);
    let src = compile("<div>{{> card}}</div>", Some(&options)).unwrap();
    assert!(src.contains("var __content = self.__content,"));
    assert!(src.contains("__elseContent = self.__elseContent;"));
}

#[test]
fn dynamic_class_attribute_collapses_to_one_thunk() {
    let src = compile(r#"<div class="item {{status}}">x</div>"#, None).unwrap();
    assert!(src.contains(r#"Spacebars.mustache(self.lookup("status"))"#));
    assert!(!src.contains("Spacebars.attrMustache"));
}

#[test]
fn mismatched_block_close_is_a_compile_error() {
    let err = compile("{{#if a}}x{{/unless}}", None).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("a found unless"));
}

#[test]
fn unclosed_block_is_a_compile_error() {
    let err = compile("{{#if a}}x", None).unwrap_err();
    assert!(err.to_string().contains("Unclosed block"));
}

#[test]
fn source_name_option_flows_into_error_messages() {
    let options = CompileOptions::new().with_source_name("card.html");
    let err = compile("{{/unopened}}", Some(&options)).unwrap_err();
    assert!(err.to_string().ends_with("in card.html"));
}

#[test]
fn parse_then_inspect_tree_shape() {
    let tree = parse("<b>{{x}}</b>", None).unwrap();
    assert_eq!(tree.len(), 1);
}

#[test]
fn html_comments_survive_into_markup_but_stache_comments_are_absorbed() {
    let src = compile("<!-- note -->{{! hidden }}visible", None).unwrap();
    // HTML comments are literal markup and render through untouched; stache
    // `{{! ... }}` comments are consumed by the parser and leave no trace.
    assert!(src.contains("<!-- note -->visible"));
    assert!(!src.contains("hidden"));
}
