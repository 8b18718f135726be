//! Configuration value interpolation
//!
//! Replaces `${VAR}` references in string values with environment values:
//! - `${VAR}` - substituted with the value of `VAR`
//! - `\${VAR}` - left as the literal `${VAR}` when escaping is enabled
//!
//! Strings nested inside objects and arrays are rewritten too.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::sources::{EnvSource, ProcessEnv};
use crate::store::Layer;

/// Matches `${NAME}` with an optional leading escape marker
static REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\\)?\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid regex"));

/// Maps a resolved variable value to its final value
pub type Converter = Arc<dyn Fn(&str) -> Value + Send + Sync>;

/// Options for an interpolation pass
#[derive(Clone)]
pub struct InterpolateOptions {
    /// Substitution source; the process environment when `None`
    pub environment: Option<HashMap<String, String>>,
    /// Leave `\${VAR}` as the literal `${VAR}`
    pub escaping: bool,
    /// Applied to each resolved variable value
    pub convert: Option<Converter>,
    /// Fail on references with no value instead of leaving them in place
    pub strict: bool,
}

impl Default for InterpolateOptions {
    fn default() -> Self {
        Self {
            environment: None,
            escaping: true,
            convert: None,
            strict: true,
        }
    }
}

impl fmt::Debug for InterpolateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpolateOptions")
            .field("environment", &self.environment)
            .field("escaping", &self.escaping)
            .field("convert", &self.convert.as_ref().map(|_| "<fn>"))
            .field("strict", &self.strict)
            .finish()
    }
}

impl InterpolateOptions {
    /// Options that leave unresolved references in place
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Default::default()
        }
    }

    pub fn with_environment(mut self, environment: HashMap<String, String>) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn with_escaping(mut self, escaping: bool) -> Self {
        self.escaping = escaping;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_convert<F>(mut self, convert: F) -> Self
    where
        F: Fn(&str) -> Value + Send + Sync + 'static,
    {
        self.convert = Some(Arc::new(convert));
        self
    }

    /// The substitution source these options select
    pub fn source(&self) -> &dyn EnvSource {
        match &self.environment {
            Some(environment) => environment,
            None => &ProcessEnv,
        }
    }
}

/// Outcome of scanning one string
struct Scanned {
    text: String,
    /// Converted value when the string is a single resolved reference
    single: Option<Value>,
}

/// Substitute references in `input`; `None` when nothing changed
///
/// `key` names the value being rewritten, for error messages.
pub fn interpolate_string(
    input: &str,
    key: &str,
    env: &dyn EnvSource,
    options: &InterpolateOptions,
) -> ConfigResult<Option<String>> {
    Ok(scan(input, key, env, options)?.map(|scanned| scanned.text))
}

fn scan(
    input: &str,
    key: &str,
    env: &dyn EnvSource,
    options: &InterpolateOptions,
) -> ConfigResult<Option<Scanned>> {
    // Quick check: no `${` means no reference
    if !input.contains("${") {
        return Ok(None);
    }

    let mut text = String::with_capacity(input.len());
    let mut last = 0;
    let mut changed = false;
    let mut single = None;

    for caps in REFERENCE_RE.captures_iter(input) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let name = &caps[2];
        let escaped = caps.get(1).is_some();

        text.push_str(&input[last..whole.start()]);
        last = whole.end();

        if escaped && options.escaping {
            // Drop the marker, keep the reference literally
            text.push_str(&whole.as_str()[1..]);
            changed = true;
            continue;
        }
        if escaped {
            text.push('\\');
        }

        match env.get(name) {
            Some(value) => {
                tracing::trace!(key, name, "Substituted reference");
                match &options.convert {
                    Some(convert) => {
                        let converted = convert(&value);
                        text.push_str(&splice(&converted));
                        if whole.start() == 0 && whole.end() == input.len() {
                            single = Some(converted);
                        }
                    }
                    None => text.push_str(&value),
                }
                changed = true;
            }
            None if options.strict => {
                return Err(ConfigError::UnresolvedReference {
                    name: name.to_string(),
                    key: key.to_string(),
                });
            }
            None => {
                tracing::debug!(key, name, "Leaving unresolved reference");
                text.push_str("${");
                text.push_str(name);
                text.push('}');
            }
        }
    }

    if !changed {
        return Ok(None);
    }
    text.push_str(&input[last..]);
    Ok(Some(Scanned { text, single }))
}

/// Text form of a converted value spliced into a longer string
fn splice(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Interpolate a value in place, descending into objects and arrays
pub fn interpolate_value(
    value: &mut Value,
    key: &str,
    env: &dyn EnvSource,
    options: &InterpolateOptions,
) -> ConfigResult<()> {
    match value {
        Value::String(s) => {
            if let Some(scanned) = scan(s, key, env, options)? {
                *value = scanned
                    .single
                    .unwrap_or(Value::String(scanned.text));
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                interpolate_value(item, &format!("{}[{}]", key, i), env, options)?;
            }
        }
        Value::Object(map) => {
            for (k, item) in map.iter_mut() {
                interpolate_value(item, &format!("{}.{}", key, k), env, options)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Interpolate every value of a layer in place
pub fn interpolate_layer(
    layer: &mut Layer,
    env: &dyn EnvSource,
    options: &InterpolateOptions,
) -> ConfigResult<()> {
    for (key, value) in layer.iter_mut() {
        interpolate_value(value, key, env, options)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn run(input: &str, options: &InterpolateOptions) -> ConfigResult<Option<String>> {
        interpolate_string(input, "key", options.source(), options)
    }

    #[test]
    fn test_interpolate_bracketed_var() {
        let options = InterpolateOptions::default().with_environment(env_of(&[("NAME", "world")]));

        let result = run("Hello ${NAME}!", &options).unwrap();
        assert_eq!(result.as_deref(), Some("Hello world!"));
    }

    #[test]
    fn test_interpolate_adjacent_vars() {
        let options = InterpolateOptions::default()
            .with_environment(env_of(&[("A", "foo"), ("B", "bar")]));

        let result = run("${A}${B}", &options).unwrap();
        assert_eq!(result.as_deref(), Some("foobar"));
    }

    #[test]
    fn test_interpolate_no_vars() {
        let options = InterpolateOptions::default().with_environment(HashMap::new());

        assert_eq!(run("No variables here", &options).unwrap(), None);
        // Only the bracketed form is a reference
        assert_eq!(run("Price: $100 and $HOME", &options).unwrap(), None);
    }

    #[test]
    fn test_interpolate_process_env() {
        std::env::set_var("CONFSTORE_TEST_INTERP_VAR", "from-process");

        let result = run("${CONFSTORE_TEST_INTERP_VAR}", &InterpolateOptions::default());

        std::env::remove_var("CONFSTORE_TEST_INTERP_VAR");

        assert_eq!(result.unwrap().as_deref(), Some("from-process"));
    }

    #[test]
    fn test_strict_missing_var_fails() {
        let options = InterpolateOptions::default().with_environment(HashMap::new());

        let err = run("${MISSING_VAR}", &options).unwrap_err();
        match err {
            ConfigError::UnresolvedReference { name, key } => {
                assert_eq!(name, "MISSING_VAR");
                assert_eq!(key, "key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lenient_missing_var_is_kept() {
        let options = InterpolateOptions::lenient()
            .with_environment(env_of(&[("FOUND", "yes")]));

        let result = run("${FOUND} ${MISSING_VAR}", &options).unwrap();
        assert_eq!(result.as_deref(), Some("yes ${MISSING_VAR}"));

        // Nothing resolved means nothing changed
        assert_eq!(run("${MISSING_VAR}", &options).unwrap(), None);
    }

    #[test]
    fn test_escaped_reference_is_literal() {
        let options = InterpolateOptions::default().with_environment(env_of(&[("VAR", "value")]));

        let result = run(r"\${VAR} is ${VAR}", &options).unwrap();
        assert_eq!(result.as_deref(), Some("${VAR} is value"));
    }

    #[test]
    fn test_escaped_reference_skips_strict_check() {
        let options = InterpolateOptions::default().with_environment(HashMap::new());

        let result = run(r"\${UNSET}", &options).unwrap();
        assert_eq!(result.as_deref(), Some("${UNSET}"));
    }

    #[test]
    fn test_escaping_disabled_substitutes() {
        let options = InterpolateOptions::default()
            .with_environment(env_of(&[("VAR", "value")]))
            .with_escaping(false);

        let result = run(r"\${VAR}", &options).unwrap();
        assert_eq!(result.as_deref(), Some(r"\value"));
    }

    #[test]
    fn test_convert_applies_to_substituted_values() {
        let options = InterpolateOptions::default()
            .with_environment(env_of(&[("PORT", "8080")]))
            .with_convert(|s| s.parse::<u64>().map(Value::from).unwrap_or_else(|_| json!(s)));

        let mut port = json!("${PORT}");
        interpolate_value(&mut port, "port", options.source(), &options).unwrap();
        assert_eq!(port, json!(8080));

        let mut url = json!("http://host:${PORT}");
        interpolate_value(&mut url, "url", options.source(), &options).unwrap();
        assert_eq!(url, json!("http://host:8080"));
    }

    #[test]
    fn test_convert_sees_only_variable_values() {
        let options = InterpolateOptions::default()
            .with_environment(env_of(&[("NAME", "svc"), ("ENV", "prod")]))
            .with_convert(|s| json!(s.to_uppercase()));

        let mut value = json!("prefix-${NAME}.${ENV}");
        interpolate_value(&mut value, "url", options.source(), &options).unwrap();
        assert_eq!(value, json!("prefix-SVC.PROD"));

        // Escaped references are not variable values
        let mut escaped = json!(r"\${NAME}");
        interpolate_value(&mut escaped, "raw", options.source(), &options).unwrap();
        assert_eq!(escaped, json!("${NAME}"));
    }

    #[test]
    fn test_convert_skips_unsubstituted_values() {
        let options = InterpolateOptions::default()
            .with_environment(HashMap::new())
            .with_convert(|_| json!("converted"));

        let mut plain = json!("plain");
        interpolate_value(&mut plain, "plain", options.source(), &options).unwrap();
        assert_eq!(plain, json!("plain"));
    }

    #[test]
    fn test_interpolate_nested_values() {
        let options = InterpolateOptions::default().with_environment(env_of(&[("HOST", "db")]));
        let mut value = json!({
            "database": {"url": "postgres://${HOST}/app"},
            "hosts": ["${HOST}", 5],
        });

        interpolate_value(&mut value, "root", options.source(), &options).unwrap();

        assert_eq!(
            value,
            json!({
                "database": {"url": "postgres://db/app"},
                "hosts": ["db", 5],
            })
        );
    }

    #[test]
    fn test_nested_error_names_path() {
        let options = InterpolateOptions::default().with_environment(HashMap::new());
        let mut value = json!({"servers": ["${NOPE}"]});

        let err = interpolate_value(&mut value, "cfg", options.source(), &options).unwrap_err();
        assert!(err.to_string().contains("cfg.servers[0]"));
    }

    #[test]
    fn test_interpolate_layer() {
        let options = InterpolateOptions::default().with_environment(env_of(&[("var_ref", "var-ref-value")]));
        let mut layer = Layer::new();
        layer.insert("mockVar".to_string(), json!("${var_ref}"));
        layer.insert("count".to_string(), json!(3));

        interpolate_layer(&mut layer, options.source(), &options).unwrap();

        assert_eq!(layer.get("mockVar"), Some(&json!("var-ref-value")));
        assert_eq!(layer.get("count"), Some(&json!(3)));
    }

    #[test]
    fn test_debug_hides_converter() {
        let options = InterpolateOptions::default().with_convert(|s| json!(s));

        let debug = format!("{:?}", options);
        assert!(debug.contains("<fn>"));
        assert!(debug.contains("strict: true"));
    }
}
