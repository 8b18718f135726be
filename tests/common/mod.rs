//! Common test utilities for confstore tests

use std::path::PathBuf;
use tempfile::TempDir;

/// Creates a temporary directory holding one file
pub fn create_config_file(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write config file");
    (dir, path)
}

/// Owned argument list from string literals
pub fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Registry slot name unique to the calling test
pub fn unique_slot(test: &str) -> String {
    format!("CONFSTORE_TEST_{}_{}", test, std::process::id())
}

/// Sample JSON configuration
pub const SAMPLE_JSON: &str = r#"{
    "a": 1,
    "name": "service",
    "database": { "url": "postgres://${DB_HOST}/app" }
}"#;

/// Sample TOML configuration
pub const SAMPLE_TOML: &str = r#"
name = "from-toml"
port = 8080
debug = false

[cache]
ttl = 60
"#;

/// A file whose top level is not an object
pub const BAD_EXPORT: &str = r#""just a string""#;
