//! Layer storage and the registry of shared storages
//!
//! A `Storage` keeps its layers and their registration order together so a
//! new layer and its order entry are always added in one step. Stores that
//! opt into sharing obtain their storage from a `StorageRegistry` slot;
//! every store attached to the same slot sees the same layers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use serde_json::Value;

use super::layer::{is_truthy, Layer, BUILTIN_LAYERS, CUSTOM_LAYER};

/// Storage handle shared between stores
pub type SharedStorage = Arc<Mutex<Storage>>;

/// Lock a storage, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Named layers plus their registration order
#[derive(Debug, Clone)]
pub struct Storage {
    layers: HashMap<String, Layer>,
    order: Vec<String>,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage {
    /// Create a storage holding the empty built-in layers
    pub fn new() -> Self {
        let mut storage = Self {
            layers: HashMap::new(),
            order: Vec::with_capacity(BUILTIN_LAYERS.len()),
        };
        storage.ensure_builtin();
        storage
    }

    /// Make sure every built-in layer exists
    pub fn ensure_builtin(&mut self) {
        for name in BUILTIN_LAYERS {
            self.ensure_layer(name);
        }
    }

    /// Get a layer for writing, registering it first if it is new
    pub fn ensure_layer(&mut self, name: &str) -> &mut Layer {
        if !self.layers.contains_key(name) {
            tracing::debug!(layer = name, "Registering layer");
            self.order.push(name.to_string());
        }
        self.layers.entry(name.to_string()).or_default()
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    /// Replace a layer's whole contents
    pub fn replace_layer(&mut self, name: &str, layer: Layer) {
        *self.ensure_layer(name) = layer;
    }

    /// Layer names, lowest precedence first
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Look `key` up from the most recently registered layer down
    ///
    /// Falsy values are skipped, so a `""`, `0` or `false` in a later layer
    /// does not hide a truthy value in an earlier one.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.order
            .iter()
            .rev()
            .filter_map(|name| self.layers.get(name))
            .filter_map(|layer| layer.get(key))
            .find(|value| is_truthy(value))
    }

    /// Write `value` under `key` in `layer`, default `custom`
    pub fn set(&mut self, key: impl Into<String>, value: Value, layer: Option<&str>) {
        self.ensure_layer(layer.unwrap_or(CUSTOM_LAYER))
            .insert(key.into(), value);
    }

    /// Empty every layer, keeping names and order
    pub fn clear(&mut self) {
        for name in &self.order {
            if let Some(layer) = self.layers.get_mut(name) {
                layer.clear();
            }
        }
    }
}

static GLOBAL_REGISTRY: Lazy<StorageRegistry> = Lazy::new(StorageRegistry::new);

/// Named slots of shared storage
///
/// Cloning a registry yields another handle to the same slots.
#[derive(Debug, Clone, Default)]
pub struct StorageRegistry {
    slots: Arc<Mutex<HashMap<String, SharedStorage>>>,
}

impl StorageRegistry {
    /// Create an empty registry, isolated from every other
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> &'static StorageRegistry {
        &GLOBAL_REGISTRY
    }

    /// Get the storage in slot `name`, creating it on first use
    pub fn attach(&self, name: &str) -> SharedStorage {
        let mut slots = lock(&self.slots);
        let storage = slots.entry(name.to_string()).or_insert_with(|| {
            tracing::debug!(slot = name, "Creating shared storage");
            Arc::new(Mutex::new(Storage::new()))
        });
        Arc::clone(storage)
    }

    /// Remove slot `name`; stores already attached keep their handle
    pub fn detach(&self, name: &str) -> Option<SharedStorage> {
        lock(&self.slots).remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        lock(&self.slots).contains_key(name)
    }
}
