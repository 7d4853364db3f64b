//! Integration tests for template composition

use fragment_composer::{EngineConfig, ParamTable, Renderer, TemplateError, Value};
use pretty_assertions::assert_eq;

fn renderer(templates: &[(&str, &str)]) -> Renderer {
    renderer_with_config(templates, EngineConfig::default())
}

fn renderer_with_config(templates: &[(&str, &str)], config: EngineConfig) -> Renderer {
    let renderer = Renderer::new(config);
    for (id, source) in templates {
        renderer.register(*id, *source);
    }
    renderer
}

#[test]
fn test_master_page_scenario() {
    let r = renderer(&[
        (
            "master",
            "<html><title>{{title}}</title><body>{{content}}</body></html>",
        ),
        ("page", "% rebase('master', title='Hello')\n<p>Hi</p>"),
    ]);

    let html = r.render("page", &ParamTable::new()).expect("Should render");
    assert_eq!(html, "<html><title>Hello</title><body><p>Hi</p></body></html>");
}

#[test]
fn test_substitutions_in_source_order() {
    let r = renderer(&[("t", "{{a}}-{{b}}-{{a}}")]);
    let params = ParamTable::new().with("a", "x").with("b", 2);
    let first = r.render("t", &params).expect("Should render");
    let second = r.render("t", &params).expect("Should render");
    assert_eq!(first, "x-2-x");
    assert_eq!(first, second);
}

#[test]
fn test_no_rebase_is_literal_text() {
    let source = "<ul>\n<li>Projects</li>\n</ul>\n";
    let r = renderer(&[("t", source)]);
    assert_eq!(r.render("t", &ParamTable::new()).expect("Should render"), source);
}

#[test]
fn test_unknown_fragment_not_found() {
    let r = renderer(&[]);
    let err = r.render("root", &ParamTable::new()).expect_err("Should fail");
    assert!(matches!(err, TemplateError::NotFound { id } if id == "root"));
}

#[test]
fn test_unknown_parent_not_found() {
    let r = renderer(&[("page", "% rebase('nowhere')\nbody")]);
    let err = r.render("page", &ParamTable::new()).expect_err("Should fail");
    assert!(matches!(err, TemplateError::NotFound { id } if id == "nowhere"));
}

#[test]
fn test_unresolved_reference_is_error_not_empty() {
    let r = renderer(&[("t", "<title>{{ title }}</title>")]);
    let err = r.render("t", &ParamTable::new()).expect_err("Should fail");
    assert!(matches!(
        err,
        TemplateError::UnresolvedReference { name, template } if name == "title" && template == "t"
    ));
}

#[test]
fn test_unresolved_in_layout_names_layout() {
    let r = renderer(&[
        ("master", "{{ heading }}{{ content }}"),
        ("page", "% rebase('master')\nbody"),
    ]);
    let err = r.render("page", &ParamTable::new()).expect_err("Should fail");
    assert!(matches!(
        err,
        TemplateError::UnresolvedReference { name, template } if name == "heading" && template == "master"
    ));
}

#[test]
fn test_duplicate_rebase_is_malformed() {
    let r = renderer(&[
        ("a", "{{content}}"),
        ("page", "% rebase('a')\n% rebase('a')\nbody"),
    ]);
    let err = r.render("page", &ParamTable::new()).expect_err("Should fail");
    match err {
        TemplateError::Malformed { template, errors } => {
            assert_eq!(template, "page");
            assert_eq!(errors.len(), 1);
            assert!(errors[0].message.contains("duplicate rebase"));
        }
        other => panic!("Expected Malformed, got {:?}", other),
    }
}

/// Build a chain t0 -> t1 -> ... -> tk where each template wraps its child
fn chain(k: usize) -> Vec<(String, String)> {
    let mut templates = Vec::new();
    for i in 0..k {
        templates.push((format!("t{}", i), format!("% rebase('t{}')\n{}({{{{content}}}})", i + 1, i)));
    }
    templates[0].1 = "% rebase('t1')\nleaf".to_string();
    templates.push((format!("t{}", k), format!("{}({{{{content}}}})", k)));
    templates
}

fn chain_renderer(k: usize, max_depth: usize) -> Renderer {
    let templates = chain(k);
    let r = Renderer::new(EngineConfig::default().with_max_depth(max_depth));
    for (id, source) in templates {
        r.register(id, source);
    }
    r
}

#[test]
fn test_rebase_chain_up_to_max_depth() {
    let r = chain_renderer(4, 4);
    let out = r.render("t0", &ParamTable::new()).expect("Should render");
    assert_eq!(out, "4(3(2(1(leaf))))");
}

#[test]
fn test_rebase_chain_beyond_max_depth() {
    let r = chain_renderer(5, 4);
    let err = r.render("t0", &ParamTable::new()).expect_err("Should fail");
    assert!(matches!(err, TemplateError::TemplateCycle { limit: 4, .. }));
}

#[test]
fn test_self_rebase_is_cycle() {
    let r = renderer(&[("loop", "% rebase('loop')\nx")]);
    let err = r.render("loop", &ParamTable::new()).expect_err("Should fail");
    assert!(matches!(err, TemplateError::TemplateCycle { .. }));
}

#[test]
fn test_parameter_precedence() {
    // rebase argument > render parameter > layout default
    let r = renderer(&[
        (
            "master",
            "% setdefault('title', 'layout')\n% setdefault('lang', 'layout')\n% setdefault('theme', 'layout')\n{{title}}|{{lang}}|{{theme}}",
        ),
        ("page", "% rebase('master', title='child')\n"),
    ]);
    let params = ParamTable::new().with("title", "caller").with("lang", "caller");
    let out = r.render("page", &params).expect("Should render");
    assert_eq!(out, "child|caller|layout");
}

#[test]
fn test_globals_are_lowest_precedence() {
    let config = EngineConfig::default().with_globals(
        ParamTable::new().with("site", "global").with("footer", "global"),
    );
    let r = renderer_with_config(
        &[("t", "% setdefault('site', 'layout')\n{{site}}|{{footer}}")],
        config,
    );
    assert_eq!(r.render("t", &ParamTable::new()).expect("Should render"), "layout|global");
}

#[test]
fn test_rebase_arguments_see_child_parameters() {
    let r = renderer(&[
        ("master", "<title>{{title}}</title>{{content}}"),
        ("page", "% rebase('master', title='Project ' + project)\nbody"),
    ]);
    let out = r
        .render("page", &ParamTable::new().with("project", "OpenTTD"))
        .expect("Should render");
    assert_eq!(out, "<title>Project OpenTTD</title>body");
}

#[test]
fn test_child_content_is_not_escaped_but_params_are() {
    let r = renderer(&[
        ("master", "<title>{{title}}</title>{{content}}"),
        ("page", "% rebase('master', title='<Fish & Chips>')\n<b>menu</b>"),
    ]);
    let out = r.render("page", &ParamTable::new()).expect("Should render");
    assert_eq!(out, "<title>&lt;Fish &amp; Chips&gt;</title><b>menu</b>");
}

#[test]
fn test_custom_content_name() {
    let config = EngineConfig::default().with_content_name("base");
    let r = renderer_with_config(
        &[
            ("layout", "<main>{{base}}</main>"),
            ("page", "% rebase('layout')\ntext"),
        ],
        config,
    );
    assert_eq!(r.render("page", &ParamTable::new()).expect("Should render"), "<main>text</main>");
}

#[test]
fn test_conditionals() {
    let r = renderer(&[(
        "t",
        "% if user and admin:\nadmin {{user}}\n% elif user:\nuser {{user}}\n% else:\nguest\n% end\n",
    )]);
    let guest = r.render("t", &ParamTable::new().with("user", "").with("admin", false));
    assert_eq!(guest.expect("Should render"), "guest\n");

    let user = r.render("t", &ParamTable::new().with("user", "alice").with("admin", false));
    assert_eq!(user.expect("Should render"), "user alice\n");

    let admin = r.render("t", &ParamTable::new().with("user", "bob").with("admin", true));
    assert_eq!(admin.expect("Should render"), "admin bob\n");
}

#[test]
fn test_loop_over_list() {
    let r = renderer(&[(
        "t",
        "<ul>\n% for lang in languages:\n  <li>{{lang}}</li>\n% end\n</ul>\n",
    )]);
    let params = ParamTable::new().with("languages", vec!["nl_NL", "de_DE", "fr_FR"]);
    let out = r.render("t", &params).expect("Should render");
    assert_eq!(
        out,
        "<ul>\n  <li>nl_NL</li>\n  <li>de_DE</li>\n  <li>fr_FR</li>\n</ul>\n"
    );
}

#[test]
fn test_code_block_directives() {
    let r = renderer(&[
        ("master", "{{title}}:{{content}}"),
        (
            "page",
            "<%\n  setdefault('title', 'Untitled')\n  rebase('master', title=title)\n%>\nbody",
        ),
    ]);
    assert_eq!(r.render("page", &ParamTable::new()).expect("Should render"), "Untitled:body");
}

#[test]
fn test_include_inside_loop_sees_item() {
    let r = renderer(&[
        ("row", "<tr><td>{{name}}</td><td>{{count}}</td></tr>"),
        (
            "table",
            "% for name in projects:\n% include('row', count=0)\n% end\n",
        ),
    ]);
    let params = ParamTable::new().with("projects", vec!["openttd", "opengfx"]);
    let out = r.render("table", &params).expect("Should render");
    assert_eq!(
        out,
        "<tr><td>openttd</td><td>0</td></tr><tr><td>opengfx</td><td>0</td></tr>"
    );
}

#[test]
fn test_include_output_is_not_escaped() {
    let r = renderer(&[
        ("link", "<a href=\"/\">{{label}}</a>"),
        ("t", "% include('link', label='Home & away')\n"),
    ]);
    let out = r.render("t", &ParamTable::new()).expect("Should render");
    assert_eq!(out, "<a href=\"/\">Home &amp; away</a>");
}

#[test]
fn test_included_template_may_rebase() {
    let r = renderer(&[
        ("card", "<div>{{content}}</div>"),
        ("item", "% rebase('card')\nitem"),
        ("t", "[\n% include('item')\n]"),
    ]);
    assert_eq!(r.render("t", &ParamTable::new()).expect("Should render"), "[\n<div>item</div>]");
}

#[test]
fn test_recursive_include_is_cycle() {
    let r = renderer(&[("t", "% include('t')\n")]);
    let err = r.render("t", &ParamTable::new()).expect_err("Should fail");
    match err {
        TemplateError::TemplateCycle { chain, limit } => {
            assert_eq!(limit, 10);
            assert!(chain.starts_with("t -> t -> t"));
        }
        other => panic!("Expected TemplateCycle, got {:?}", other),
    }
}

#[test]
fn test_defined_and_get_helpers() {
    let r = renderer(&[(
        "t",
        "{{ get('user', 'anonymous') }}|{{ defined('user') }}",
    )]);
    assert_eq!(
        r.render("t", &ParamTable::new()).expect("Should render"),
        "anonymous|false"
    );
    assert_eq!(
        r.render("t", &ParamTable::new().with("user", "alice"))
            .expect("Should render"),
        "alice|true"
    );
}

#[test]
fn test_number_and_bool_values_render() {
    let r = renderer(&[("t", "{{count}} {{ratio}} {{done}}")]);
    let params = ParamTable::new()
        .with("count", 12)
        .with("ratio", 0.5)
        .with("done", true);
    assert_eq!(r.render("t", &params).expect("Should render"), "12 0.5 true");
}

#[test]
fn test_reregistering_layout_changes_output() {
    let r = renderer(&[
        ("master", "A{{content}}"),
        ("page", "% rebase('master')\nx"),
    ]);
    assert_eq!(r.render("page", &ParamTable::new()).expect("Should render"), "Ax");
    r.register("master", "B{{content}}");
    assert_eq!(r.render("page", &ParamTable::new()).expect("Should render"), "Bx");
}

#[test]
fn test_params_from_toml() {
    let params = ParamTable::from_toml_str("title = \"Projects\"\ncount = 2\n").expect("Should parse");
    assert_eq!(params.get("count"), Some(&Value::Number(2.0)));
    let r = renderer(&[("t", "{{title}} ({{count}})")]);
    assert_eq!(r.render("t", &params).expect("Should render"), "Projects (2)");
}

#[test]
fn test_whole_document_snapshot() {
    let r = renderer(&[
        ("master", "<html><title>{{title}}</title><body>{{content}}</body></html>"),
        ("page", "% rebase('master', title=heading)\n<h1>{{heading}}</h1>"),
    ]);
    let html = r
        .render("page", &ParamTable::new().with("heading", "Eints"))
        .expect("Should render");
    insta::assert_snapshot!(html, @"<html><title>Eints</title><body><h1>Eints</h1></body></html>");
}

#[test]
fn test_comment_only_code_lines() {
    let r = renderer(&[
        ("line", "% # just a note\nbody"),
        ("block", "<%\n  # layout defaults\n  setdefault('a', 1)\n%>\n{{a}}"),
    ]);
    assert_eq!(r.render("line", &ParamTable::new()).expect("Should render"), "body");
    assert_eq!(r.render("block", &ParamTable::new()).expect("Should render"), "1");
}

#[test]
fn test_unknown_function_reported_by_name() {
    let r = renderer(&[("t", "<p>{{ shout(x) }}</p>")]);
    let err = r
        .render("t", &ParamTable::new().with("x", "hi"))
        .expect_err("Should fail");
    match err {
        TemplateError::Malformed { template, errors } => {
            assert_eq!(template, "t");
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].message, "unknown function 'shout'");
            assert_eq!(errors[0].span, 6..11);
        }
        other => panic!("Expected Malformed, got {:?}", other),
    }
}

#[test]
fn test_negative_numbers() {
    let r = renderer(&[("t", "{{ -1 }} {{ offset + -2.5 }} {{ -offset < 0 }}")]);
    let out = r
        .render("t", &ParamTable::new().with("offset", 4))
        .expect("Should render");
    assert_eq!(out, "-1 1.5 true");
}
