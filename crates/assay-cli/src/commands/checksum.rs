//! Checksum command implementation

use std::path::Path;

use anyhow::{Context, Result};

pub fn cmd_checksum(path: &Path) -> Result<()> {
    let digest = assay_core::checksum::checksum_file(path)
        .with_context(|| format!("Failed to hash {}", path.display()))?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
