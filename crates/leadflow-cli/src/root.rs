use leadflow_core::config::CONFIG_FILE;
use std::path::{Path, PathBuf};

/// Resolve the config file path.
///
/// Priority:
/// 1. `--config` flag / `LEADFLOW_CONFIG` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `leadflow.yaml`
/// 3. Fall back to `cwd/leadflow.yaml` (which may not exist yet)
pub fn resolve_config(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd).unwrap_or_else(|| cwd.join(CONFIG_FILE))
}

fn find_upward(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?.to_path_buf();
    }
}
