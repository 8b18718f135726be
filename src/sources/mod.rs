//! Configuration sources
//!
//! Turns command-line arguments, environment variables and files into
//! flat layers for the store.

pub mod argv;
pub mod env;
pub mod file;

pub use argv::{parse_arguments, ParsedArguments};
#[cfg(test)]
pub use env::MockEnvSource;
pub use env::{EnvSource, ProcessEnv};
pub use file::{FileCache, FileLoader, LoadedFile};
