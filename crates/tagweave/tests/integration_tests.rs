/*
 * integration_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Integration tests for tagweave using test fixtures.
 */

use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tagweave::{
    Engine, FileSystemResolver, RenderContext, RenderError, RenderOptions, TemplateError, Value,
};

/// Helper to get the path to test fixtures
fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join("test-fixtures").join(name)
}

fn render_fixture(name: &str, context: &mut RenderContext) -> Result<String, RenderError> {
    Engine::new(FileSystemResolver).render(fixture_path(name), context)
}

fn render_ok(name: &str, context: &mut RenderContext) -> String {
    render_fixture(name, context).unwrap_or_else(|e| panic!("failed to render {}: {}", name, e))
}

fn render_err(name: &str, context: &mut RenderContext) -> RenderError {
    match render_fixture(name, context) {
        Ok(output) => panic!("expected {} to fail, got {:?}", name, output),
        Err(e) => e,
    }
}

#[test]
fn test_for_loop() {
    let output = render_ok("loop.html", &mut RenderContext::new());
    assert_eq!(output, "012");
}

#[test]
fn test_render_is_idempotent() {
    let mut context = RenderContext::new();
    let first = render_ok("loop.html", &mut context);
    let second = render_ok("loop.html", &mut context);
    assert_eq!(first, second);
}

#[test]
fn test_attrs_mapping() {
    let output = render_ok("attrs.html", &mut RenderContext::new());
    assert_eq!(output, "<div class=\"x\" checked>content</div>");
}

#[test]
fn test_attrs_keyword_form() {
    let mut context = RenderContext::new();
    context.insert("field", "agree");
    context.insert("done", true);
    context.insert("label", "Say \"yes\"");
    let output = render_ok("keyword_attrs.html", &mut context);
    assert_eq!(
        output,
        "<input type=\"checkbox\" name=\"agree\" checked title=\"Say &quot;yes&quot;\"/>"
    );
}

#[test]
fn test_attrs_inside_loop() {
    let context_json = serde_json::json!({
        "rows": [
            {"name": "a", "n": 1},
            {"name": "b", "n": 2}
        ]
    });
    let mut context = RenderContext::from_json(&context_json).unwrap();
    let output = render_ok("table.html", &mut context);
    assert_eq!(
        output,
        "<table><tr class=\"odd\"><td>a</td><td>1</td></tr>\
         <tr class=\"even\"><td>b</td><td>2</td></tr></table>"
    );
}

#[test]
fn test_document_without_control_tags_round_trips() {
    let source = std::fs::read_to_string(fixture_path("plain.html")).unwrap();
    let output = render_ok("plain.html", &mut RenderContext::new());
    // only the trailing newline is whitespace-only text
    assert_eq!(output, source.trim_end());
}

#[test]
fn test_undefined_name_reports_tag_line() {
    let err = render_err("undefined_name.html", &mut RenderContext::new());
    assert!(matches!(
        &err.error,
        TemplateError::Execution { message } if message == "NameError: name 'missing_total' is not defined"
    ));
    assert_eq!(err.line(), Some(4));
    assert_eq!(err.text, "<py expr=\"missing_total\"/>");

    let report = err.to_string();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "NameError: name 'missing_total' is not defined");
    assert!(lines[1].starts_with("Line 4 in document "));
    assert!(lines[1].ends_with("undefined_name.html"));
    assert_eq!(lines[2], "<py expr=\"missing_total\"/>");
}

#[test]
fn test_unmatched_close() {
    let mut context = RenderContext::new();
    context.insert("xs", vec![1i64]);
    let err = render_err("unmatched_close.html", &mut context);
    assert!(matches!(err.error, TemplateError::UnmatchedClose { .. }));
    assert_eq!(err.line(), Some(3));
}

#[test]
fn test_unclosed_block() {
    let err = render_err("unclosed.html", &mut RenderContext::new());
    assert!(matches!(
        err.error,
        TemplateError::UnclosedBlock { line: 3, .. }
    ));
    assert_eq!(err.line(), Some(3));
    assert_eq!(err.text, "<py code=\"if show:\">");
}

#[test]
fn test_forbidden_name() {
    let err = render_err("forbidden.html", &mut RenderContext::new());
    assert!(matches!(
        &err.error,
        TemplateError::ForbiddenName { name } if name == "__import__"
    ));
    assert_eq!(err.line(), Some(2));
}

#[test]
fn test_if_elif_else() {
    let grade = |score: i64| {
        let mut context = RenderContext::new();
        context.insert("score", score);
        render_ok("grades.html", &mut context)
    };
    assert_eq!(grade(95), "A");
    assert_eq!(grade(85), "B");
    assert_eq!(grade(10), "C");
}

#[test]
fn test_while_with_break_and_continue() {
    let mut context = RenderContext::new();
    let output = render_ok("while_loop.html", &mut context);
    assert_eq!(output, "1,\n3,\n5,\n7,\n");
    assert_eq!(context.get("n"), Some(&Value::Int(9)));
}

#[test]
fn test_multiline_fragment_error_maps_to_tag() {
    let err = render_err("multiline_error.html", &mut RenderContext::new());
    assert!(matches!(
        &err.error,
        TemplateError::Execution { message } if message.starts_with("NameError")
    ));
    assert_eq!(err.line(), Some(2));
    assert!(err.text.starts_with("<py code=\"x = 1"));
}

#[test]
fn test_include_shares_context() {
    let mut context = RenderContext::new();
    context.insert("title", "home");
    context.insert("body", "text");
    let output = render_ok("page.html", &mut context);
    assert_eq!(output, "<html><header>HOME</header><main>text</main></html>");
}

#[test]
fn test_self_include_is_a_cycle() {
    let err = render_err("self_include.html", &mut RenderContext::new());
    let TemplateError::IncludeCycle { chain } = &err.error else {
        panic!("expected an include cycle, got {:?}", err.error);
    };
    assert_eq!(chain.len(), 2);
    assert!(chain.iter().all(|p| p.ends_with("self_include.html")));
    assert_eq!(err.line(), Some(2));
}

#[test]
fn test_transitive_include_cycle() {
    let err = render_err("cycle_a.html", &mut RenderContext::new());
    assert!(matches!(err.error, TemplateError::IncludeFailure { .. }));
    let TemplateError::IncludeCycle { chain } = err.root_cause() else {
        panic!("expected an include cycle, got {:?}", err.root_cause());
    };
    let names: Vec<&str> = chain
        .iter()
        .map(|p| p.rsplit(['/', '\\']).next().unwrap_or(p))
        .collect();
    assert_eq!(names, vec!["cycle_a.html", "cycle_b.html", "cycle_a.html"]);
}

#[test]
fn test_diagnostic_for_runtime_error() {
    let err = render_err("undefined_name.html", &mut RenderContext::new());
    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.code.as_deref(), Some("T-4-2"));
    assert_eq!(diagnostic.title, "Execution Failure");
    assert!(diagnostic.location.is_some());
    assert!(err.report().contains("missing_total"));
}

#[test]
fn test_options_from_yaml() {
    let yaml = std::fs::read_to_string(fixture_path("options.yaml")).unwrap();
    let options = RenderOptions::from_yaml_str(&yaml).unwrap();
    assert_eq!(options.max_include_depth, 8);
    let engine = Engine::with_options(FileSystemResolver, options);

    let mut context = RenderContext::new();
    context.insert("words", vec!["a", "b"]);
    let output = engine
        .render(fixture_path("custom_tag.html"), &mut context)
        .unwrap();
    assert_eq!(output, "<span>a</span><span>b</span>");

    let err = engine
        .render_str("inline.html", "<tw expr=\"open_file('x')\"/>", &mut context)
        .unwrap_err();
    assert!(matches!(
        &err.error,
        TemplateError::ForbiddenName { name } if name == "open_file"
    ));
}

#[test]
fn test_compiled_listing() {
    let engine = Engine::new(FileSystemResolver);
    let program = engine
        .compile(fixture_path("grades.html"), &mut RenderContext::new())
        .unwrap();
    insta::assert_snapshot!(program.source(), @r#"
    if score >= 90:
        print("""A""", end="")
    elif score >= 80:
        print("""B""", end="")
    else:
        print("""C""", end="")
    "#);
}
