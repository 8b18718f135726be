//! Layered storage for configuration values
//!
//! Provides the named layers, their precedence order, the registry of
//! shared storages, and the `ConfigStore` built on top of them.

pub mod config_store;
pub mod layer;
pub mod storage;

pub use config_store::ConfigStore;
pub use layer::{
    is_truthy, value_kind, Layer, ARGV_LAYER, BUILTIN_LAYERS, CUSTOM_LAYER, ENV_LAYER, FILE_LAYER,
};
pub(crate) use storage::lock;
pub use storage::{SharedStorage, Storage, StorageRegistry};
