//! Result artifacts.
//!
//! A lookup result is written to `<dir>/<formula-cid>.json` as a JSON array
//! of justification units.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::error::LookupError;
use crate::types::JustificationUnit;

/// Path of the artifact for a formula.
pub fn artifact_path(dir: &Path, formula: &str) -> PathBuf {
    dir.join(format!("{formula}.json"))
}

/// Write a lookup result, creating `dir` if needed.
pub async fn write_result(
    dir: &Path,
    formula: &str,
    units: &[JustificationUnit],
) -> Result<PathBuf, LookupError> {
    fs::create_dir_all(dir).await?;

    let path = artifact_path(dir, formula);
    let json = serde_json::to_vec(units)?;
    fs::write(&path, json).await?;

    info!(path = %path.display(), alternatives = units.len(), "Wrote lookup result");
    Ok(path)
}

/// Read back a result artifact.
pub async fn read_result(path: &Path) -> Result<Vec<JustificationUnit>, LookupError> {
    let content = fs::read(path).await?;
    Ok(serde_json::from_slice(&content)?)
}
