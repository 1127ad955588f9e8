//! JSON state export for simulation snapshots.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use serde::Serialize;

use crate::simulation::TubuleDiagnostics;

/// Full state export structure
#[derive(Debug, Clone, Serialize)]
pub struct StateExport<'a> {
    /// Export timestamp
    pub exported_at: String,
    /// Export version for compatibility
    pub version: &'static str,
    /// Diagnostics snapshot
    pub state: &'a TubuleDiagnostics,
}

impl<'a> StateExport<'a> {
    fn now(state: &'a TubuleDiagnostics) -> Self {
        Self {
            exported_at: Local::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
            state,
        }
    }
}

/// Export current simulation state to JSON
///
/// Creates the exports directory if it doesn't exist.
/// Filename is auto-generated with timestamp: `state_YYYYMMDD_HHMMSS.json`
///
/// Returns the path to the saved JSON file.
pub fn export_state_json(state: &TubuleDiagnostics) -> Result<PathBuf> {
    let dir = PathBuf::from("exports");
    std::fs::create_dir_all(&dir)?;

    let filename = format!("state_{}.json", Local::now().format("%Y%m%d_%H%M%S"));
    let path = dir.join(filename);
    export_state_json_to(state, &path)?;
    Ok(path)
}

/// Export state to a specific file
pub fn export_state_json_to<P: AsRef<Path>>(state: &TubuleDiagnostics, path: P) -> Result<()> {
    let export = StateExport::now(state);

    let file = std::fs::File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &export)?;

    log::info!("JSON state exported: {}", path.as_ref().display());
    Ok(())
}
