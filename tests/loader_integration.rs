//! Integration tests rendering templates loaded from disk

use std::path::{Path, PathBuf};

use fragment_composer::{EngineConfig, ParamTable, Renderer, Value};
use pretty_assertions::assert_eq;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

const NAV_GUEST: &str = "<ul class=\"nav\">\n\
<li><a href=\"/\">Home</a></li>\n\
<li><a href=\"/projects\">Projects</a></li>\n\
<li><a href=\"/login\">Login</a></li>\n\
</ul>\n";

const ROOT_BODY: &str = "<h1>Eints translation service</h1>\n\
<p>Eints is a web application for translating strings of software projects.</p>\n\
<ul>\n\
<li><a href=\"/projects\">Projects overview</a></li>\n\
<li><a href=\"/userprofile\">User profile</a></li>\n\
</ul>\n";

fn page(title: &str, site: &str, nav: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>{} - {}</title></head>\n\
         <body>\n{}<div class=\"content\">\n{}</div>\n</body>\n</html>\n",
        title, site, nav, ROOT_BODY
    )
}

#[test]
fn test_load_dir_registers_templates() {
    let renderer = Renderer::new(EngineConfig::default());
    let ids = renderer.load_dir(&fixtures()).expect("Should load fixtures");
    assert_eq!(ids, vec!["base", "main", "partials/nav", "root"]);
    assert!(!renderer.store().contains("notes"));
    assert!(!renderer.store().contains("engine"));
}

#[test]
fn test_render_root_through_two_layouts() {
    let renderer = Renderer::new(EngineConfig::default());
    renderer.load_dir(&fixtures()).expect("Should load fixtures");

    let html = renderer.render("root", &ParamTable::new()).expect("Should render");
    assert_eq!(html, page("Eints root", "Eints", NAV_GUEST));
}

#[test]
fn test_render_root_with_user() {
    let renderer = Renderer::new(EngineConfig::default());
    renderer.load_dir(&fixtures()).expect("Should load fixtures");

    let params = ParamTable::new().with("user", "alice").with("site", "Translate");
    let html = renderer.render("root", &params).expect("Should render");
    let nav = NAV_GUEST.replace(
        "<li><a href=\"/login\">Login</a></li>",
        "<li><a href=\"/logout\">Logout alice</a></li>",
    );
    assert_eq!(html, page("Eints root", "Translate", &nav));
}

#[test]
fn test_config_file_drives_rendering() {
    let config = EngineConfig::from_file(&fixtures().join("engine.toml")).expect("Should load config");
    assert_eq!(config.max_depth, 5);
    assert_eq!(config.extensions, vec!["tpl".to_string()]);
    assert_eq!(config.globals.get("site"), Some(&Value::from("Eints (global)")));

    let renderer = Renderer::new(config);
    renderer.load_dir(&fixtures()).expect("Should load fixtures");

    // The layout default outranks the configured global
    let html = renderer.render("root", &ParamTable::new()).expect("Should render");
    assert_eq!(html, page("Eints root", "Eints", NAV_GUEST));
}

#[test]
fn test_load_from_configured_template_dir() {
    let config = EngineConfig::default().with_template_dir(fixtures());
    let dir = config.template_dir.clone().expect("Should have a template dir");
    let renderer = Renderer::new(config);
    renderer.load_dir(&dir).expect("Should load fixtures");
    assert_eq!(renderer.store().ids(), vec!["base", "main", "partials/nav", "root"]);
}

#[test]
fn test_load_missing_dir_fails() {
    let renderer = Renderer::default();
    let err = renderer
        .load_dir(&fixtures().join("does-not-exist"))
        .expect_err("Should fail");
    assert!(matches!(err, fragment_composer::TemplateError::Load { .. }));
}
