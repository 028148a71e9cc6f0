use quadra_core::paths::QUADRA_DIR;
use std::path::{Path, PathBuf};

/// Resolve the club root directory.
///
/// Priority:
/// 1. `--root` flag / `QUADRA_ROOT` env var (passed in as `explicit`)
/// 2. Nearest ancestor of the cwd containing `.quadra/`
/// 3. Nearest ancestor of the cwd containing `.git/`
/// 4. The cwd itself
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, QUADRA_DIR)
        .or_else(|| find_upward(&cwd, ".git"))
        .unwrap_or(cwd)
}

fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}
