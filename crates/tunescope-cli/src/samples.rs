// SPDX-License-Identifier: GPL-3.0-or-later
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

/// Write `data` as pretty JSON to `sample_data_<name>.json` inside `dir`.
pub fn save_sample(dir: &Path, name: &str, data: &Value) -> Result<PathBuf> {
    let path = dir.join(format!("sample_data_{name}.json"));
    let json = serde_json::to_string_pretty(data)?;
    fs::write(&path, json)
        .with_context(|| format!("failed to write sample data to {}", path.display()))?;

    debug!(target: "cli", path = %path.display(), "sample data saved");
    Ok(path)
}
