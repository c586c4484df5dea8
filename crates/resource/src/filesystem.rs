//! Loads resources relative to a base directory.
//!
//! Paths that would leave the base directory, absolute paths and `..`
//! components are rejected, so a font name taken from user input can only
//! reach files inside the configured font directory.

use marginalia_traits::{ResourceError, ResourceProvider, SharedResourceData};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
pub struct FilesystemResourceProvider {
    base_path: PathBuf,
    /// `None` when the base directory does not exist (yet).
    canonical_base: Option<PathBuf>,
}

impl FilesystemResourceProvider {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        let base = base_path.as_ref().to_path_buf();
        let canonical = base.canonicalize().ok();
        Self {
            base_path: base,
            canonical_base: canonical,
        }
    }

    /// Splits a file path into a provider rooted at its parent directory and
    /// the file name to load from it.
    pub fn for_file<P: AsRef<Path>>(file: P) -> Option<(Self, String)> {
        let file = file.as_ref();
        let name = file.file_name()?.to_str()?.to_string();
        let parent = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Some((Self::new(parent), name))
    }

    pub fn base(&self) -> &Path {
        &self.base_path
    }

    fn resolve_path_safe(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        if relative.is_absolute() {
            return None;
        }
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return None;
        }

        let full_path = self.base_path.join(relative);
        match (full_path.canonicalize(), &self.canonical_base) {
            (Ok(canonical), Some(base)) if canonical.starts_with(base) => Some(canonical),
            // Symlink pointing outside the base directory.
            (Ok(_), Some(_)) => None,
            _ => Some(full_path),
        }
    }
}

impl ResourceProvider for FilesystemResourceProvider {
    fn load(&self, path: &str) -> Result<SharedResourceData, ResourceError> {
        let full_path = self.resolve_path_safe(path).ok_or_else(|| {
            log::warn!("Refusing to load '{}' outside {}", path, self.base_path.display());
            ResourceError::NotFound(format!("{} (path traversal blocked)", path))
        })?;

        std::fs::read(&full_path).map(Arc::new).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound(path.to_string())
            } else {
                ResourceError::LoadFailed {
                    path: path.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve_path_safe(path)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    fn base_path(&self) -> Option<&str> {
        self.base_path.to_str()
    }

    fn name(&self) -> &'static str {
        "FilesystemResourceProvider"
    }
}
