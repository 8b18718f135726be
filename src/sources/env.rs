//! Environment variable extraction
//!
//! Builds a flat layer from environment variables selected by prefix or
//! pattern. The prefix and its delimiter are stripped and the remainder is
//! camel-cased, so with prefix `sa` the variable `sa_mock_var` becomes the
//! key `mockVar`.

use std::collections::HashMap;

use heck::ToLowerCamelCase;
use regex::Regex;
use serde_json::{Number, Value};

use crate::config::EnvOptions;
use crate::error::ConfigResult;
use crate::store::Layer;

/// Source of environment variables, so tests need not touch the process
#[cfg_attr(test, mockall::automock)]
pub trait EnvSource {
    /// Value of variable `name`
    fn get(&self, name: &str) -> Option<String>;

    /// Every variable as `(name, value)`
    fn vars(&self) -> Vec<(String, String)>;
}

/// The live process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn vars(&self) -> Vec<(String, String)> {
        std::env::vars().collect()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }

    fn vars(&self) -> Vec<(String, String)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// Copy every variable into a layer as strings, keys untouched
pub fn snapshot(source: &dyn EnvSource) -> Layer {
    source
        .vars()
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect()
}

/// Extract the variables selected by `options` into a layer
///
/// A variable is kept when it matches `match_pattern`; without a pattern it
/// must start with `prefix` (ignoring case); with neither, all are kept.
pub fn extract(options: &EnvOptions, source: &dyn EnvSource) -> ConfigResult<Layer> {
    let pattern = options
        .match_pattern
        .as_deref()
        .map(Regex::new)
        .transpose()?;
    let prefix = options.prefix.as_deref();

    let mut vars = source.vars();
    vars.sort();

    let mut layer = Layer::new();
    for (name, raw) in vars {
        let keep = match (&pattern, prefix) {
            (Some(re), _) => re.is_match(&name),
            (None, Some(prefix)) => strip_prefix_ignore_case(&name, prefix).is_some(),
            (None, None) => true,
        };
        if !keep {
            continue;
        }

        let key = transform_key(&name, prefix, &options.delimiter);
        if key.is_empty() {
            continue;
        }

        let value = if options.initialize {
            native_value(&raw)
        } else {
            Value::String(raw)
        };
        layer.insert(key, value);
    }

    tracing::debug!(count = layer.len(), "Extracted environment variables");
    Ok(layer)
}

fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let head = name.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &name[prefix.len()..])
}

/// `sa_mock_var` with prefix `sa` -> `mockVar`
fn transform_key(name: &str, prefix: Option<&str>, delimiter: &str) -> String {
    let mut rest = name;
    if let Some(stripped) = prefix.and_then(|p| strip_prefix_ignore_case(name, p)) {
        rest = stripped;
        if !delimiter.is_empty() {
            rest = rest.strip_prefix(delimiter).unwrap_or(rest);
        }
    }
    camel_case(&rest.to_lowercase(), delimiter)
}

/// Join `delimiter`-separated words as camelCase; an empty delimiter keeps the name
fn camel_case(input: &str, delimiter: &str) -> String {
    if delimiter.is_empty() {
        return input.to_string();
    }

    input
        .split(delimiter)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lower_camel_case()
}

/// Coerce `true`/`false` and numeric strings
fn native_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    Value::String(raw.to_string())
}
