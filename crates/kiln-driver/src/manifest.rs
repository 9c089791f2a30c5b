//! JSON manifest loading.
//!
//! A manifest is a JSON array of assemblies:
//!
//! ```json
//! [
//!   { "name": "game", "rootPath": "src" },
//!   { "name": "engine", "rootPath": "engine/src" }
//! ]
//! ```

use std::path::Path;

use crate::files::AssemblyInfo;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest")]
    Io(#[from] std::io::Error),

    #[error("malformed manifest")]
    Json(#[from] serde_json::Error),
}

pub fn load_manifest(path: &Path) -> Result<Vec<AssemblyInfo>, ManifestError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
