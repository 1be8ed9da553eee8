mod common;

use common::init_tracing;
use std::fs;
use strata::{
    load,
    manifest::{ManifestError, PluginManifest},
};

const FIXTURES: &str = r#"
[[plugin]]
id = "git"
version = "1.0.2"
dependencies = ["base [1.0.0,1.0.1]"]

[[plugin]]
id = "maven"
version = "1.0.2"
dependencies = ["base [1.0.0,1.0.2)"]

[[plugin]]
id = "base"
version = "1.0.0"
"#;

#[test]
fn test_manifest_file_feeds_loader() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plugins.toml");
    fs::write(&path, FIXTURES).unwrap();

    let plugins = PluginManifest::load(&path).unwrap().into_plugins();
    let outcome = load(Vec::new(), plugins, |order: &mut Vec<String>, loaded| {
        order.push(loaded.plugin().id().to_string());
        Ok(())
    });

    outcome.result.unwrap();
    assert_eq!(outcome.context, ["base", "git", "maven"]);
}

#[test]
fn test_missing_manifest_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = PluginManifest::load(&path).unwrap_err();
    let ManifestError::Io { path: reported, .. } = err else {
        panic!("expected an io error");
    };
    assert_eq!(reported, path);
}
