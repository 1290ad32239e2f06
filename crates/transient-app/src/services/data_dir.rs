// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "transient";
const STORE_DIR: &str = "objects";

/// Return the default application data directory.  Nothing is created here;
/// the store creates its own layout on open.
pub fn data_dir() -> PathBuf {
    resolve(
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

/// Where the directory store keeps objects under `base`.
pub fn store_dir(base: &Path) -> PathBuf {
    base.join(STORE_DIR)
}

fn resolve(xdg: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    let base = match (xdg, home) {
        (Some(xdg), _) if !xdg.as_os_str().is_empty() => xdg,
        (_, Some(home)) => home.join(".local").join("share"),
        // Last resort
        _ => std::env::temp_dir(),
    };
    base.join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_wins_over_home() {
        let dir = resolve(Some("/xdg".into()), Some("/home/op".into()));
        assert_eq!(dir, PathBuf::from("/xdg/transient"));
    }

    #[test]
    fn home_fallback_uses_local_share() {
        let dir = resolve(Some(PathBuf::new()), Some("/home/op".into()));
        assert_eq!(dir, PathBuf::from("/home/op/.local/share/transient"));
    }

    #[test]
    fn store_lives_under_base() {
        assert_eq!(store_dir(Path::new("/srv/t")), PathBuf::from("/srv/t/objects"));
    }
}
