// src/config/mod.rs

//! Configuration for autoclave.
//!
//! Responsibilities:
//! - Define the raw (TOML/CLI) and validated data models (`model.rs`).
//! - Load an optional config file and overlay CLI flags (`loader.rs`).
//! - Validate and resolve everything a run needs (`validate.rs`).
//!
//! The validated [`Config`] is built once at startup and is read-only for
//! the rest of the process.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{Capture, Config, ExitCodeList, RawConfig, SignalSpec};
pub use validate::{default_output_prefix, parse_signal, prepare_log_dir};
