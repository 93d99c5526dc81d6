#![allow(dead_code)]

pub use autoclave_test_utils::builders;
pub use autoclave_test_utils::fake_backend;
pub use autoclave_test_utils::{init_tracing, sh, with_timeout};

use std::path::Path;

/// Sorted file names in `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("reading test dir")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// `<dir>/<name>` as a `String`, for log prefixes.
pub fn prefix_in(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().into_owned()
}
