use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::app::{SimulationConfig, ViewConfig};

/// Layout and view tunables. Every field is optional in the file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct LayoutConfig {
    pub(crate) simulation: SimulationConfig,
    pub(crate) view: ViewConfig,
}

pub(crate) fn load_layout_config(path: &Path) -> Result<LayoutConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read layout config {}", path.display()))?;
    let config: LayoutConfig = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse layout config {}", path.display()))?;

    log::info!("loaded layout config from {}", path.display());
    Ok(LayoutConfig {
        simulation: config.simulation.sanitized(),
        view: config.view.sanitized(),
    })
}
