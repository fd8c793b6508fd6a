use std::path::{Path, PathBuf};

use uuid::Uuid;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const RAOS_DIR: &str = ".raos";
pub const REQUIREMENTS_DIR: &str = ".raos/requirements";
pub const CONFIG_FILE: &str = ".raos/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn requirements_dir(root: &Path) -> PathBuf {
    root.join(REQUIREMENTS_DIR)
}

pub fn requirement_file(root: &Path, id: Uuid) -> PathBuf {
    requirements_dir(root).join(format!("{id}.yaml"))
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}
