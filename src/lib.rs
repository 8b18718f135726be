//! confstore - Layered configuration store
//!
//! Collects configuration from several sources into named layers and looks
//! keys up by layer precedence:
//! - **file** - JSON or TOML files merged by `load_file`
//! - **env** - environment variables, optionally filtered and renamed
//! - **argv** - command-line flags and options
//! - **custom** - values written with `set`
//!
//! Layers registered later win, and `set` can add new layers on top.
//!
//! ## Features
//!
//! - Prefix/pattern environment extraction with camelCase keys
//! - `${VAR}` interpolation with escaping and strict/lenient modes
//! - Optional storage shared between stores through a named registry slot
//! - Store options loadable from XDG paths and `CONFSTORE_*` variables
//!
//! ```
//! use confstore::{ConfigStore, StoreOptions};
//!
//! let mut store = ConfigStore::new(StoreOptions::default());
//! store.set("port", 8080, None);
//! store.set("port", 9090, Some("override"));
//! assert_eq!(store.get("port"), Some(serde_json::json!(9090)));
//! ```

pub mod config;
pub mod error;
pub mod sources;
pub mod store;

pub use config::{load_options, ArgOptions, EnvOptions, InterpolateOptions, StoreOptions};
pub use error::{ConfigError, ConfigResult, ErrorInfo};
pub use sources::{parse_arguments, EnvSource, FileCache, FileLoader, LoadedFile, ParsedArguments};
pub use store::{ConfigStore, Layer, Storage, StorageRegistry};
