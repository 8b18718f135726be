//! Configuration file resolution and loading
//!
//! A path resolves to the first existing candidate of:
//! 1. the path itself
//! 2. the path with `.json` or `.toml` appended
//! 3. `index.json` or `index.toml` inside the path
//!
//! Parsed files are kept in a `FileCache` keyed by canonical path, so
//! loading the same file twice reuses the first parse unless the caller
//! asks to bypass the cache.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::store::{lock, value_kind, Layer};

/// Extensions tried when the path itself does not exist
const EXTENSIONS: [&str; 2] = ["json", "toml"];

static GLOBAL_CACHE: Lazy<FileCache> = Lazy::new(FileCache::new);

/// Parsed file contents keyed by canonical path
///
/// Cloning yields another handle to the same entries.
#[derive(Debug, Clone, Default)]
pub struct FileCache {
    entries: Arc<Mutex<HashMap<PathBuf, Value>>>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used by default
    pub fn global() -> &'static FileCache {
        &GLOBAL_CACHE
    }

    pub fn get(&self, path: &Path) -> Option<Value> {
        lock(&self.entries).get(path).cloned()
    }

    pub fn insert(&self, path: PathBuf, value: Value) {
        lock(&self.entries).insert(path, value);
    }

    /// Drop the entry for `path`; returns whether one existed
    pub fn evict(&self, path: &Path) -> bool {
        lock(&self.entries).remove(path).is_some()
    }

    pub fn contains(&self, path: &Path) -> bool {
        lock(&self.entries).contains_key(path)
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A successfully loaded file
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFile {
    /// Top-level keys of the file
    pub contents: Layer,
    /// Canonical path the file was read from
    pub path: PathBuf,
}

/// Resolves and parses configuration files
#[derive(Debug, Clone)]
pub struct FileLoader {
    cache: FileCache,
}

impl Default for FileLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FileLoader {
    /// Loader backed by the process-wide cache
    pub fn new() -> Self {
        Self::with_cache(FileCache::global().clone())
    }

    pub fn with_cache(cache: FileCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    /// Resolve `path` to the canonical path of an existing file
    ///
    /// A candidate that cannot be canonicalized counts as missing.
    pub fn resolve(&self, path: &Path) -> ConfigResult<PathBuf> {
        let candidates = candidates(path);
        for candidate in &candidates {
            match candidate.canonicalize() {
                Ok(resolved) if resolved.is_file() => return Ok(resolved),
                Ok(_) => {}
                Err(e) => tracing::trace!("Skipping {}: {}", candidate.display(), e),
            }
        }

        Err(ConfigError::FileResolution {
            path: path.display().to_string(),
            searched: candidates
                .iter()
                .map(|c| c.display().to_string())
                .collect(),
        })
    }

    /// Resolve and parse `path`, reading it fresh when `bypass_cache` is set
    pub fn load(&self, path: &Path, bypass_cache: bool) -> ConfigResult<LoadedFile> {
        let resolved = self.resolve(path)?;

        if bypass_cache && self.cache.evict(&resolved) {
            tracing::debug!("Evicted cached parse of {}", resolved.display());
        }

        let value = match self.cache.get(&resolved) {
            Some(value) => {
                tracing::trace!("Using cached parse of {}", resolved.display());
                value
            }
            None => {
                let value = parse_file(&resolved)?;
                self.cache.insert(resolved.clone(), value.clone());
                value
            }
        };

        match value {
            Value::Object(contents) => Ok(LoadedFile {
                contents,
                path: resolved,
            }),
            other => Err(ConfigError::InvalidFileExport {
                path: resolved.display().to_string(),
                found: value_kind(&other).to_string(),
            }),
        }
    }
}

fn candidates(path: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![path.to_path_buf()];
    for ext in EXTENSIONS {
        let mut with_ext = OsString::from(path.as_os_str());
        with_ext.push(".");
        with_ext.push(ext);
        candidates.push(PathBuf::from(with_ext));
    }
    for ext in EXTENSIONS {
        candidates.push(path.join(format!("index.{}", ext)));
    }
    candidates
}

/// Parse by extension: `.toml` as TOML, anything else as JSON
fn parse_file(path: &Path) -> ConfigResult<Value> {
    tracing::debug!("Reading configuration file: {}", path.display());
    let content = std::fs::read_to_string(path)?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let parsed = if is_toml {
        toml::from_str::<Value>(&content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| ConfigError::FileParse {
        path: path.display().to_string(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn loader() -> FileLoader {
        FileLoader::with_cache(FileCache::new())
    }

    #[test]
    fn test_resolve_missing_file() {
        let err = loader().resolve(Path::new("non-existent.js")).unwrap_err();

        match err {
            ConfigError::FileResolution { path, searched } => {
                assert_eq!(path, "non-existent.js");
                assert_eq!(searched.len(), 5);
                assert!(searched.contains(&"non-existent.js.json".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_dangling_link_is_resolution_error() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("broken.json");
        std::os::unix::fs::symlink(dir.path().join("gone.json"), &link).unwrap();

        let err = loader().load(&link, false).unwrap_err();

        assert!(matches!(err, ConfigError::FileResolution { .. }));
    }

    #[test]
    fn test_resolve_appends_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.json"), "{}").unwrap();

        let resolved = loader().resolve(&dir.path().join("app")).unwrap();

        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("app.json"));
    }

    #[test]
    fn test_resolve_directory_index() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.toml"), "a = 1").unwrap();

        let resolved = loader().resolve(dir.path()).unwrap();

        assert!(resolved.ends_with("index.toml"));
    }

    #[test]
    fn test_load_json_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"a": 1, "name": "svc"}"#).unwrap();

        let loaded = loader().load(&path, false).unwrap();

        assert_eq!(loaded.contents.get("a"), Some(&json!(1)));
        assert_eq!(loaded.contents.get("name"), Some(&json!("svc")));
        assert_eq!(loaded.path, path.canonicalize().unwrap());
    }

    #[test]
    fn test_load_toml_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            port = 8080
            debug = true

            [database]
            url = "postgres://localhost"
            "#,
        )
        .unwrap();

        let loaded = loader().load(&path, false).unwrap();

        assert_eq!(loaded.contents.get("port"), Some(&json!(8080)));
        assert_eq!(loaded.contents.get("debug"), Some(&json!(true)));
        assert_eq!(
            loaded.contents.get("database"),
            Some(&json!({"url": "postgres://localhost"}))
        );
    }

    #[test]
    fn test_load_rejects_non_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad-export.json");
        fs::write(&path, r#"["not", "an", "object"]"#).unwrap();

        let err = loader().load(&path, false).unwrap_err();

        match err {
            ConfigError::InvalidFileExport { found, .. } => assert_eq!(found, "array"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = loader().load(&path, false).unwrap_err();

        assert!(matches!(err, ConfigError::FileParse { .. }));
    }

    #[test]
    fn test_load_reuses_cached_parse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"version": 1}"#).unwrap();

        let loader = loader();
        loader.load(&path, false).unwrap();
        assert_eq!(loader.cache().len(), 1);

        fs::write(&path, r#"{"version": 2}"#).unwrap();

        let cached = loader.load(&path, false).unwrap();
        assert_eq!(cached.contents.get("version"), Some(&json!(1)));

        let fresh = loader.load(&path, true).unwrap();
        assert_eq!(fresh.contents.get("version"), Some(&json!(2)));
    }

    #[test]
    fn test_cache_evict() {
        let cache = FileCache::new();
        let path = PathBuf::from("/tmp/x.json");
        cache.insert(path.clone(), json!({}));

        assert!(cache.contains(&path));
        assert!(cache.evict(&path));
        assert!(!cache.evict(&path));
        assert!(cache.is_empty());
    }
}
