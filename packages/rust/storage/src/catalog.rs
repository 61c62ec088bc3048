//! Category catalog loader (JSON array of `{id, name, slug}`).

use std::path::Path;

use articlesmith_shared::{ArticleSmithError, CatalogEntry, Result};

/// Load the external category catalog.
///
/// The catalog is configuration data: a missing or malformed file is a config
/// error, since no article can be categorised without it.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ArticleSmithError::config(format!(
            "cannot read category catalog {}: {e}",
            path.display()
        ))
    })?;

    let entries: Vec<CatalogEntry> = serde_json::from_str(&content).map_err(|e| {
        ArticleSmithError::config(format!(
            "invalid category catalog {}: {e}",
            path.display()
        ))
    })?;

    tracing::debug!(path = %path.display(), entries = entries.len(), "loaded category catalog");
    Ok(entries)
}
