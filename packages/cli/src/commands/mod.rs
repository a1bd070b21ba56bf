pub mod export;
pub mod format;
pub mod generate;
pub mod init;
pub mod stream;

pub use export::{export, ExportArgs};
pub use format::{format, FormatArgs};
pub use generate::{generate, GenerateArgs};
pub use init::{init, InitArgs};
pub use stream::{stream, StreamArgs};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Resolve `path` against the working directory
pub(crate) fn resolve(cwd: &str, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        PathBuf::from(cwd).join(path)
    }
}

pub(crate) fn read_input(cwd: &str, path: &Path) -> Result<String> {
    let full = resolve(cwd, path);
    std::fs::read_to_string(&full).with_context(|| format!("failed to read {}", full.display()))
}

pub(crate) fn write_output(cwd: &str, path: &Path, contents: &[u8]) -> Result<PathBuf> {
    let full = resolve(cwd, path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&full, contents).with_context(|| format!("failed to write {}", full.display()))?;
    Ok(full)
}
