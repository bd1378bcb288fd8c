//! Install-tree post-processing.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Sorted entries of a directory.
fn entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to read {}", dir.display()))?;
    paths.sort();
    Ok(paths)
}

/// MSVC name for a GNU-style static library: `libavcodec.a` -> `avcodec.lib`.
pub fn msvc_lib_name(file_name: &str) -> Option<String> {
    let stem = file_name.strip_prefix("lib")?.strip_suffix(".a")?;
    if stem.is_empty() {
        return None;
    }
    Some(format!("{stem}.lib"))
}

/// Rename every `lib*.a` in `lib_dir` to its MSVC name. Returns the renames performed.
pub fn rename_static_libs(lib_dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut renamed = Vec::new();
    for path in entries(lib_dir)? {
        if !path.is_file() {
            continue;
        }
        let Some(new_name) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(msvc_lib_name)
        else {
            continue;
        };
        let dest = lib_dir.join(new_name);
        std::fs::rename(&path, &dest)
            .with_context(|| format!("Failed to rename {}", path.display()))?;
        renamed.push((path, dest));
    }
    Ok(renamed)
}

/// Boost installs headers as `include/boost-1_xx/boost`. Move the first such
/// tree to `include/boost` and drop the versioned directory.
///
/// Returns the move performed, or `None` when there was nothing to hoist.
pub fn hoist_boost_headers(include_dir: &Path) -> Result<Option<(PathBuf, PathBuf)>> {
    if !include_dir.is_dir() {
        return Ok(None);
    }

    for versioned in entries(include_dir)? {
        let is_versioned = versioned
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("boost-"));
        let src = versioned.join("boost");
        if !is_versioned || !src.is_dir() {
            continue;
        }

        let dest = include_dir.join("boost");
        if dest.exists() {
            std::fs::remove_dir_all(&dest)
                .with_context(|| format!("Failed to replace {}", dest.display()))?;
        }
        std::fs::rename(&src, &dest)
            .with_context(|| format!("Failed to move {} to {}", src.display(), dest.display()))?;
        std::fs::remove_dir_all(&versioned)
            .with_context(|| format!("Failed to remove {}", versioned.display()))?;
        return Ok(Some((src, dest)));
    }
    Ok(None)
}
