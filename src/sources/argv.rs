//! Command-line argument parsing
//!
//! Splits an argument list into boolean flags and valued options:
//! - `--name=value` and `-n=value` - option
//! - `--name value` / `-n value` - option when `name` is declared in `ArgOptions::options`
//! - `--name` - flag set to `true`, `--no-name` - flag set to `false`
//! - `-abc` - flags `a`, `b` and `c`
//! - `--` - everything after it is left unparsed

use heck::ToLowerCamelCase;
use serde_json::Value;

use crate::config::ArgOptions;
use crate::error::{ConfigError, ConfigResult};
use crate::store::Layer;

/// Result of parsing an argument list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArguments {
    /// Boolean switches
    pub flags: Layer,
    /// Named values
    pub options: Layer,
    /// Positional arguments and everything after `--`
    pub unparsed: Vec<String>,
}

/// Parse `args` (without the program name) according to `options`
pub fn parse_arguments<S: AsRef<str>>(
    args: &[S],
    options: &ArgOptions,
) -> ConfigResult<ParsedArguments> {
    let parser = Parser { options };
    let mut parsed = ParsedArguments::default();
    let mut iter = args.iter().map(|s| s.as_ref()).peekable();

    while let Some(arg) = iter.next() {
        if arg == "--" {
            parsed.unparsed.extend(iter.by_ref().map(str::to_string));
            break;
        }

        if let Some(long) = arg.strip_prefix("--") {
            if let Some((name, value)) = long.split_once('=') {
                parsed
                    .options
                    .insert(parser.key(name), Value::String(value.to_string()));
            } else if parser.takes_value(long) {
                let value = match iter.next_if(|next| !looks_like_flag(next)) {
                    Some(value) => value,
                    None => return Err(missing_value(arg)),
                };
                parsed
                    .options
                    .insert(parser.key(long), Value::String(value.to_string()));
            } else if let Some(negated) = long.strip_prefix("no-") {
                parsed.flags.insert(parser.key(negated), Value::Bool(false));
            } else {
                parsed.flags.insert(parser.key(long), Value::Bool(true));
            }
            continue;
        }

        if looks_like_flag(arg) {
            let short = &arg[1..];
            if let Some((name, value)) = short.split_once('=') {
                parsed
                    .options
                    .insert(parser.key(name), Value::String(value.to_string()));
                continue;
            }

            let mut chars = short.chars().peekable();
            while let Some(c) = chars.next() {
                let name = c.to_string();
                let last = chars.peek().is_none();
                if last && parser.takes_value(&name) {
                    let value = match iter.next_if(|next| !looks_like_flag(next)) {
                        Some(value) => value,
                        None => return Err(missing_value(arg)),
                    };
                    parsed
                        .options
                        .insert(parser.key(&name), Value::String(value.to_string()));
                } else {
                    parsed.flags.insert(parser.key(&name), Value::Bool(true));
                }
            }
            continue;
        }

        parsed.unparsed.push(arg.to_string());
    }

    tracing::trace!(
        flags = parsed.flags.len(),
        options = parsed.options.len(),
        unparsed = parsed.unparsed.len(),
        "Parsed arguments"
    );
    Ok(parsed)
}

struct Parser<'a> {
    options: &'a ArgOptions,
}

impl Parser<'_> {
    fn canonical<'n>(&'n self, name: &'n str) -> &'n str {
        self.options
            .aliases
            .get(name)
            .map(String::as_str)
            .unwrap_or(name)
    }

    fn key(&self, name: &str) -> String {
        let name = self.canonical(name);
        if self.options.camel_case {
            name.to_lower_camel_case()
        } else {
            name.to_string()
        }
    }

    fn takes_value(&self, name: &str) -> bool {
        let canonical = self.canonical(name);
        self.options
            .options
            .iter()
            .any(|declared| declared == name || declared == canonical)
    }
}

/// `-x` or `--x`, but not `-`, `-5` or `-.5`
fn looks_like_flag(arg: &str) -> bool {
    match arg.strip_prefix('-') {
        Some(rest) => rest
            .chars()
            .next()
            .is_some_and(|c| !c.is_ascii_digit() && c != '.'),
        None => false,
    }
}

fn missing_value(arg: &str) -> ConfigError {
    ConfigError::Argument(format!("missing value for {}", arg))
}
