//! Option types for the configuration store and its sources

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default name of the shared storage slot
pub const DEFAULT_STORAGE_NAME: &str = "CONFIG_STORAGE";

/// Options fixed at store construction
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StoreOptions {
    /// Share storage with every store constructed under the same name
    #[serde(default)]
    pub use_shared_storage: bool,

    /// Registry slot used when `use_shared_storage` is set
    #[serde(default = "default_storage_name")]
    pub storage_variable_name: String,

    /// Always read files fresh instead of reusing a cached parse
    #[serde(default)]
    pub cache_disabled: bool,

    /// Options used by `import_environment` when none are given
    #[serde(default)]
    pub environment_defaults: Option<EnvOptions>,

    /// Options used by `import_arguments` when none are given
    #[serde(default)]
    pub argument_defaults: Option<ArgOptions>,
}

fn default_storage_name() -> String {
    DEFAULT_STORAGE_NAME.to_string()
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            use_shared_storage: false,
            storage_variable_name: default_storage_name(),
            environment_defaults: None,
            argument_defaults: None,
            cache_disabled: false,
        }
    }
}

impl StoreOptions {
    /// Options for a store attached to the shared slot `name`
    pub fn shared(name: impl Into<String>) -> Self {
        Self {
            use_shared_storage: true,
            storage_variable_name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_environment(mut self, options: EnvOptions) -> Self {
        self.environment_defaults = Some(options);
        self
    }

    pub fn with_arguments(mut self, options: ArgOptions) -> Self {
        self.argument_defaults = Some(options);
        self
    }

    pub fn with_cache_disabled(mut self, disabled: bool) -> Self {
        self.cache_disabled = disabled;
        self
    }
}

/// Environment extraction options
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EnvOptions {
    /// Prefix stripped from matching variable names
    #[serde(default)]
    pub prefix: Option<String>,

    /// Regular expression a variable name must match to be kept
    #[serde(default, rename = "match")]
    pub match_pattern: Option<String>,

    /// Coerce values to booleans and numbers where they parse
    #[serde(default)]
    pub initialize: bool,

    /// Word separator in variable names
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

fn default_delimiter() -> String {
    "_".to_string()
}

impl Default for EnvOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            match_pattern: None,
            initialize: false,
            delimiter: default_delimiter(),
        }
    }
}

impl EnvOptions {
    /// Keep variables starting with `prefix`
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Default::default()
        }
    }

    pub fn with_match(mut self, pattern: impl Into<String>) -> Self {
        self.match_pattern = Some(pattern.into());
        self
    }

    pub fn with_initialize(mut self, initialize: bool) -> Self {
        self.initialize = initialize;
        self
    }
}

/// Argument parsing options
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ArgOptions {
    /// Names that take a value from the following argument
    #[serde(default)]
    pub options: Vec<String>,

    /// Convert `--log-level` style names to `logLevel`
    #[serde(default = "default_camel_case")]
    pub camel_case: bool,

    /// Raw name to canonical name, e.g. `v` -> `verbose`
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

fn default_camel_case() -> bool {
    true
}

impl Default for ArgOptions {
    fn default() -> Self {
        Self {
            options: vec![],
            aliases: HashMap::new(),
            camel_case: default_camel_case(),
        }
    }
}

impl ArgOptions {
    /// Declare a name that consumes the next argument
    pub fn with_option(mut self, name: impl Into<String>) -> Self {
        self.options.push(name.into());
        self
    }

    /// Map `alias` to `name`
    pub fn with_alias(mut self, alias: impl Into<String>, name: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), name.into());
        self
    }
}
