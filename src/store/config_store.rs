//! The layered configuration store
//!
//! Layers are searched from the most recently registered down, so with the
//! built-in order `file`, `env`, `argv`, `custom` a custom value shadows an
//! argument, which shadows the environment, which shadows a file. Layers
//! created through `set` land on top of all of them.

use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::layer::{Layer, ARGV_LAYER, ENV_LAYER, FILE_LAYER};
use super::storage::{lock, SharedStorage, Storage, StorageRegistry};
use crate::config::interpolate::{interpolate_layer, InterpolateOptions};
use crate::config::{load_options, ArgOptions, EnvOptions, StoreOptions};
use crate::error::ConfigResult;
use crate::sources::{env, parse_arguments, EnvSource, FileLoader, LoadedFile, ProcessEnv};

/// Layered configuration store
///
/// Clones share the same storage.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    options: StoreOptions,
    storage: SharedStorage,
    loader: FileLoader,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

impl ConfigStore {
    /// Create a store; shared storage comes from the global registry
    pub fn new(options: StoreOptions) -> Self {
        Self::with_registry(options, StorageRegistry::global())
    }

    /// Create a store whose shared storage comes from `registry`
    ///
    /// Attaching to an existing slot keeps its contents.
    pub fn with_registry(options: StoreOptions, registry: &StorageRegistry) -> Self {
        let storage = if options.use_shared_storage {
            let storage = registry.attach(&options.storage_variable_name);
            lock(&storage).ensure_builtin();
            storage
        } else {
            Arc::new(Mutex::new(Storage::new()))
        };

        Self {
            options,
            storage,
            loader: FileLoader::new(),
        }
    }

    /// Create a store from options found in the options files and environment
    ///
    /// See [`load_options`] for the search order.
    pub fn from_options_files(override_path: Option<&str>) -> anyhow::Result<Self> {
        let options = load_options(override_path)?;
        tracing::debug!(
            shared = options.use_shared_storage,
            slot = options.storage_variable_name.as_str(),
            "Creating store from options files"
        );
        Ok(Self::new(options))
    }

    /// Use `loader` for file loads instead of the process-wide one
    pub fn with_loader(mut self, loader: FileLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn is_shared(&self) -> bool {
        self.options.use_shared_storage
    }

    /// Handle to the underlying storage
    pub fn storage(&self) -> SharedStorage {
        Arc::clone(&self.storage)
    }

    /// Parse arguments into the `argv` layer
    ///
    /// `args` defaults to the process arguments without the program name and
    /// `options` to the construction-time argument defaults. Flags are written
    /// before options, so an option overrides a flag of the same name.
    pub fn import_arguments(
        &mut self,
        args: Option<&[String]>,
        options: Option<&ArgOptions>,
    ) -> ConfigResult<&mut Self> {
        let process_args: Vec<String>;
        let args = match args {
            Some(args) => args,
            None => {
                process_args = std::env::args().skip(1).collect();
                &process_args
            }
        };
        let options = options
            .or(self.options.argument_defaults.as_ref())
            .cloned()
            .unwrap_or_default();

        let parsed = parse_arguments(args, &options)?;
        tracing::debug!(
            flags = parsed.flags.len(),
            options = parsed.options.len(),
            "Importing arguments"
        );

        {
            let mut storage = lock(&self.storage);
            let layer = storage.ensure_layer(ARGV_LAYER);
            layer.extend(parsed.flags);
            layer.extend(parsed.options);
        }
        Ok(self)
    }

    /// Import the process environment into the `env` layer
    ///
    /// See [`ConfigStore::import_environment_from`].
    pub fn import_environment(&mut self, options: Option<&EnvOptions>) -> ConfigResult<&mut Self> {
        self.import_environment_from(options, &ProcessEnv)
    }

    /// Replace the `env` layer with variables from `source`
    ///
    /// With options (given here or at construction) the layer holds the
    /// extracted, renamed variables. Without, it is a copy of every variable
    /// under its own name.
    pub fn import_environment_from(
        &mut self,
        options: Option<&EnvOptions>,
        source: &dyn EnvSource,
    ) -> ConfigResult<&mut Self> {
        let layer = match options.or(self.options.environment_defaults.as_ref()) {
            Some(options) => env::extract(options, source)?,
            None => env::snapshot(source),
        };
        tracing::debug!(count = layer.len(), "Importing environment");

        lock(&self.storage).replace_layer(ENV_LAYER, layer);
        Ok(self)
    }

    /// Load a file and merge its keys into the `file` layer
    ///
    /// `callback` runs before this returns, with either the loaded file or
    /// the error. On error no layer is touched.
    pub fn load_file<P, F>(&mut self, path: P, callback: F) -> &mut Self
    where
        P: AsRef<Path>,
        F: FnOnce(ConfigResult<LoadedFile>),
    {
        let result = self.try_load_file(path.as_ref());
        if let Err(e) = &result {
            tracing::warn!("Failed to load {}: {}", path.as_ref().display(), e);
        }
        callback(result);
        self
    }

    /// Load a file and merge its keys into the `file` layer
    ///
    /// Keys in the file overwrite keys already in the layer; other keys are
    /// kept. Cached parses are bypassed when the store was built with
    /// `cache_disabled`.
    pub fn try_load_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<LoadedFile> {
        let loaded = self
            .loader
            .load(path.as_ref(), self.options.cache_disabled)?;
        tracing::debug!(
            keys = loaded.contents.len(),
            "Loaded configuration file {}",
            loaded.path.display()
        );

        lock(&self.storage)
            .ensure_layer(FILE_LAYER)
            .extend(loaded.contents.clone());
        Ok(loaded)
    }

    /// Substitute `${VAR}` references in every string of every layer
    ///
    /// In strict mode (the default) the first unresolved reference aborts
    /// the pass; values already visited keep their rewritten form.
    ///
    /// Each layer is rewritten on a copy with the storage unlocked, so a
    /// converter may read the store.
    pub fn interpolate(&mut self, options: Option<&InterpolateOptions>) -> ConfigResult<&mut Self> {
        let defaults = InterpolateOptions::default();
        let options = options.unwrap_or(&defaults);
        let source = options.source();

        for name in self.layer_names() {
            let Some(mut layer) = self.layer(&name) else {
                continue;
            };
            tracing::trace!(layer = name.as_str(), "Interpolating layer");
            let result = interpolate_layer(&mut layer, source, options);
            lock(&self.storage).ensure_layer(&name).extend(layer);
            result?;
        }
        Ok(self)
    }

    /// Look `key` up across layers, most recently registered first
    ///
    /// Falsy values (`""`, `0`, `false`, `null`) count as absent, so they
    /// neither match nor hide a value in an earlier layer.
    pub fn get(&self, key: &str) -> Option<Value> {
        lock(&self.storage).get(key).cloned()
    }

    /// Write `value` under `key` in `layer` (default `custom`)
    ///
    /// A new layer is registered on top of the existing ones.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>, layer: Option<&str>) {
        lock(&self.storage).set(key, value.into(), layer);
    }

    /// Empty every layer, keeping layer names and order
    pub fn clear(&mut self) {
        lock(&self.storage).clear();
    }

    /// Copy of the layer `name`
    pub fn layer(&self, name: &str) -> Option<Layer> {
        lock(&self.storage).layer(name).cloned()
    }

    /// Layer names, lowest precedence first
    pub fn layer_names(&self) -> Vec<String> {
        lock(&self.storage).order().to_vec()
    }
}
