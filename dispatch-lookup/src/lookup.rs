//! Lookup entry point: assertion list in, result artifact out.

use std::path::{Path, PathBuf};

use dispatch_core::link::parse_cid;
use dispatch_core::{ObjectStore, StoreError};
use tracing::info;

use crate::error::LookupError;
use crate::ingest::build_index;
use crate::resolve::resolve;
use crate::sink::write_result;
use crate::types::JustificationUnit;

/// Outcome of a completed lookup.
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub formula: String,
    pub units: Vec<JustificationUnit>,
    pub artifact: PathBuf,
}

/// Read a JSON array of assertion CIDs.
pub async fn load_assertion_list(path: &Path) -> Result<Vec<String>, LookupError> {
    let content = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|e| LookupError::AssertionList {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Reject targets that are not CIDs; the target names the artifact file.
fn check_target(formula: &str) -> Result<(), LookupError> {
    parse_cid(formula).map_err(|e| StoreError::InvalidCid {
        cid: formula.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Justify `formula` from the given candidate assertions.
pub async fn lookup_candidates<S: ObjectStore + ?Sized>(
    store: &S,
    formula: &str,
    candidates: &[String],
) -> Result<Vec<JustificationUnit>, LookupError> {
    check_target(formula)?;
    let index = build_index(store, candidates).await?;
    let units: Vec<JustificationUnit> = resolve(formula, &index).into_iter().collect();

    info!(formula = %formula, alternatives = units.len(), "Resolved justifications");
    Ok(units)
}

/// Justify `formula` from the assertions listed in `assertion_list` and
/// write the result to `<output_dir>/<formula>.json`.
///
/// Nothing is written unless ingestion and resolution both succeed.
pub async fn lookup<S: ObjectStore + ?Sized>(
    store: &S,
    formula: &str,
    assertion_list: &Path,
    output_dir: &Path,
) -> Result<LookupOutcome, LookupError> {
    check_target(formula)?;
    let candidates = load_assertion_list(assertion_list).await?;
    let units = lookup_candidates(store, formula, &candidates).await?;
    let artifact = write_result(output_dir, formula, &units).await?;

    Ok(LookupOutcome {
        formula: formula.to_string(),
        units,
        artifact,
    })
}
