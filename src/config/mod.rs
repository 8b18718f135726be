//! Options and interpolation for confstore
//!
//! Provides the store options with XDG-compliant layered loading, and
//! `${VAR}` interpolation over configuration values.

pub mod interpolate;
pub mod loader;
pub mod model;

pub use interpolate::{interpolate_layer, interpolate_value, Converter, InterpolateOptions};
pub use loader::{find_options_files, load_options, options_paths};
pub use model::*;
