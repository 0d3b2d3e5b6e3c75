//! Integration tests for msggen-cli.
//!
//! These drive scanning, loading, generation and output the way the
//! `msggen` binary does.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use msggen::{GeneratedOutput, MessageRegistry};
use msggen_cli::{
    config::{Config, ConfigManager, CONFIG_FILENAME},
    error::{CliError, LoadError},
    generator::ArtifactGenerator,
    loader::ModelLoader,
    scanner::ModelScanner,
    writer::{stale_files, FileWriter},
};

/// Get the path to test fixtures.
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Create a temporary directory with test files.
fn create_temp_project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

fn generate_from(root: &Path, config: &Config) -> Result<GeneratedOutput, CliError> {
    let files = ModelScanner::new(root).scan()?;
    let receivers = ModelLoader::new().load_all(&files)?;
    ArtifactGenerator::new(config)?.generate(&receivers)
}

fn content<'a>(output: &'a GeneratedOutput, name: &str) -> &'a str {
    &output.get(name).unwrap().content
}

// =============================================================================
// Pipeline
// =============================================================================

#[test]
fn test_fixtures_generate_every_artifact() {
    let output = generate_from(&fixtures_path(), &Config::default()).unwrap();

    let mut names: Vec<_> = output.files.iter().map(|f| f.file_name.as_str()).collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "MessageNames.cpp",
            "MessageNames.h",
            "NetworkProcessMessageReceiver.cpp",
            "NetworkProcessMessages.h",
            "NetworkProcessMessagesReplies.h",
            "WebPageMessageReceiver.cpp",
            "WebPageMessages.h",
            "WebPageMessagesReplies.h",
        ]
    );
}

#[test]
fn test_fixture_dispatch() {
    let output = generate_from(&fixtures_path(), &Config::default()).unwrap();

    let network = content(&output, "NetworkProcessMessageReceiver.cpp");
    assert!(network.starts_with("#include \"config.h\"\n\n#if ENABLE(NETWORK_PROCESS)\n"));
    assert!(network.contains(
        "IPC::handleMessageAsyncWantsConnection<Messages::NetworkProcess::FetchData>(connection, decoder, this, &NetworkProcess::fetchData);"
    ));
    assert!(network.ends_with("#endif // ENABLE(NETWORK_PROCESS)\n"));

    let page = content(&output, "WebPageMessageReceiver.cpp");
    assert!(page.contains(
        "IPC::handleMessageSynchronous<Messages::WebPage::GetTitle>(connection, decoder, replyEncoder, this, &WebPage::getTitle);"
    ));
    assert!(page.contains("#if PLATFORM(COCOA)\n"));
}

#[test]
fn test_registry_follows_scan_order() {
    let files = ModelScanner::new(fixtures_path()).scan().unwrap();
    let receivers = ModelLoader::new().load_all(&files).unwrap();
    let registry = MessageRegistry::build(&receivers).unwrap();

    let page = registry.message("WebPage_SetActive").unwrap();
    let network = registry.message("NetworkProcess_LoadURL").unwrap();
    assert!(page.id < network.id);
    assert!(registry.message("NetworkProcess_FetchDataReply").is_some());
    assert!(registry.message("WebPage_GetTitleReply").is_none());
    assert!(!registry.is_valid_message_id(registry.max_message_id() + 1));
}

#[test]
fn test_filter_limits_receivers() {
    let files = ModelScanner::new(fixtures_path())
        .with_filter("network/**")
        .unwrap()
        .scan()
        .unwrap();
    let receivers = ModelLoader::new().load_all(&files).unwrap();
    let output = ArtifactGenerator::new(&Config::default())
        .unwrap()
        .generate(&receivers)
        .unwrap();

    assert_eq!(output.len(), 5);
    assert!(output.get("WebPageMessages.h").is_none());
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_file_shapes_output() {
    let project = create_temp_project(&[(
        CONFIG_FILENAME,
        r#"
[codegen]
namespace = "WebKit"
indent = "spaces2"

[output]
license_header = "// Copyright (C) Example"
"#,
    )]);
    let config = ConfigManager::load(Some(project.path().join(CONFIG_FILENAME).as_path())).unwrap();
    let output = generate_from(&fixtures_path(), &config).unwrap();

    for file in &output.files {
        assert!(
            file.content.starts_with("// Copyright (C) Example\n\n"),
            "{}",
            file.file_name
        );
    }
    let page = content(&output, "WebPageMessageReceiver.cpp");
    assert!(page.contains("namespace WebKit {"));
    assert!(page.contains("\n  protectedThis"));
}

// =============================================================================
// Failure handling
// =============================================================================

#[test]
fn test_invalid_documents_are_all_reported() {
    let project = create_temp_project(&[
        ("A.messages.json", r#"{ "name": "A", "attributes": ["Bogus"] }"#),
        ("B.messages.json", "not json"),
        ("C.messages.json", r#"{ "name": "C" }"#),
    ]);

    match generate_from(project.path(), &Config::default()) {
        Err(CliError::Load(LoadError::Multiple(errors))) => assert_eq!(errors.len(), 2),
        other => panic!("expected load errors, got {other:?}"),
    }
}

#[test]
fn test_generation_failure_writes_nothing() {
    let project = create_temp_project(&[(
        "Foo.messages.json",
        r#"{ "name": "Foo", "messages": [{ "name": "Bar", "parameters": [{ "name": "v", "type": "Frob<int>" }] }] }"#,
    )]);
    let out = TempDir::new().unwrap();

    let result = generate_from(project.path(), &Config::default())
        .and_then(|output| FileWriter::new(false).write_all(out.path(), &output));

    assert!(matches!(result, Err(CliError::Generate(_))));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_duplicate_receiver_across_documents() {
    let project = create_temp_project(&[
        ("a/Foo.messages.json", r#"{ "name": "Foo" }"#),
        ("b/Foo.messages.json", r#"{ "name": "Foo" }"#),
    ]);

    assert!(matches!(
        generate_from(project.path(), &Config::default()),
        Err(CliError::Generate(msggen::GenerateError::DuplicateReceiver { .. }))
    ));
}

// =============================================================================
// Output
// =============================================================================

#[test]
fn test_write_then_validate() {
    let out = TempDir::new().unwrap();
    let output = generate_from(&fixtures_path(), &Config::default()).unwrap();

    let results = FileWriter::new(false).write_all(out.path(), &output).unwrap();
    assert_eq!(results.len(), output.len());
    assert!(stale_files(out.path(), &output).is_empty());

    let regenerated = generate_from(&fixtures_path(), &Config::default()).unwrap();
    assert!(stale_files(out.path(), &regenerated).is_empty());

    let second = FileWriter::new(false).write_all(out.path(), &regenerated).unwrap();
    assert!(second.iter().all(|r| !r.was_written()));
}

#[test]
fn test_dry_run_writes_nothing() {
    let out = TempDir::new().unwrap();
    let target = out.path().join("generated");
    let output = generate_from(&fixtures_path(), &Config::default()).unwrap();

    let results = FileWriter::new(true).write_all(&target, &output).unwrap();

    assert_eq!(results.len(), output.len());
    assert!(!target.exists());
    assert_eq!(stale_files(&target, &output).len(), output.len());
}

// =============================================================================
// Package
// =============================================================================

#[test]
fn test_package_metadata_has_no_placeholders() {
    assert!(!env!("CARGO_PKG_AUTHORS").contains("example.com"));
    assert!(!env!("CARGO_PKG_REPOSITORY").contains("github.com/example"));
    assert_eq!(env!("CARGO_PKG_NAME"), "msggen-cli");
}
