//! Command handlers

pub mod block;
pub mod tree;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read and parse a JSON input file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}
