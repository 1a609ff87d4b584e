//! Application-bundled resources (images and other static files served
//! under `localhost`).

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use navpane_types::Result;

/// A read-only namespace of bundled files keyed by absolute path.
pub trait ResourceBundle: Send + Sync {
    fn read(&self, path: &str) -> Result<Vec<u8>>;
}

/// Normalize a bundle path into its segments.
///
/// Empty and `.` segments are dropped; `..` is rejected so a path can never
/// leave the bundle root.
fn segments(path: &str) -> io::Result<Vec<&str>> {
    let mut out = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {},
            ".." => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("path `{path}` escapes the bundle root"),
                ));
            },
            s => out.push(s),
        }
    }
    Ok(out)
}

fn normalize(path: &str) -> io::Result<String> {
    Ok(format!("/{}", segments(path)?.join("/")))
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no bundled resource `{path}`"))
}

// -------------------------------------------------------------------
// In-memory bundle
// -------------------------------------------------------------------

/// Bundle held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBundle {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: &str, data: impl Into<Vec<u8>>) -> Result<()> {
        self.files.insert(normalize(path)?, data.into());
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert). Paths that fail to normalize
    /// are skipped with a warning.
    pub fn with(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        if let Err(e) = self.insert(path, data) {
            log::warn!("skipping bundled resource: {e}");
        }
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ResourceBundle for MemoryBundle {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let key = normalize(path)?;
        self.files
            .get(&key)
            .cloned()
            .ok_or_else(|| not_found(path).into())
    }
}

// -------------------------------------------------------------------
// Directory bundle
// -------------------------------------------------------------------

/// Bundle rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct DirBundle {
    root: PathBuf,
}

impl DirBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceBundle for DirBundle {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let segs = segments(path)?;
        if segs.is_empty() {
            return Err(not_found(path).into());
        }
        let mut full = self.root.clone();
        full.extend(segs);
        Ok(std::fs::read(full)?)
    }
}
