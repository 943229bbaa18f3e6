use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::BuildError;

/// The `-importcfg` file shared by every compile and the final link.
///
/// Each import path maps to exactly one archive; registering a path again
/// replaces its archive but keeps its original position.
#[derive(Debug, Clone)]
pub struct ImportConfig {
  path: PathBuf,
  entries: Vec<(String, PathBuf)>,
  index: HashMap<String, usize>,
}

impl ImportConfig {
  pub fn new(path: PathBuf) -> Self {
    Self {
      path,
      entries: Vec::new(),
      index: HashMap::new(),
    }
  }

  /// Location the configuration is written to.
  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn register(
    &mut self,
    import_path: &str,
    archive: &Path,
  ) {
    match self.index.get(import_path) {
      Some(&pos) => self.entries[pos].1 = archive.to_path_buf(),
      None => {
        self.index.insert(import_path.to_string(), self.entries.len());
        self.entries.push((import_path.to_string(), archive.to_path_buf()));
      },
    }
  }

  pub fn archive_for(
    &self,
    import_path: &str,
  ) -> Option<&Path> {
    self.index.get(import_path).map(|&pos| self.entries[pos].1.as_path())
  }

  pub fn entries(&self) -> impl Iterator<Item = (&str, &Path)> {
    self.entries.iter().map(|(import, archive)| (import.as_str(), archive.as_path()))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// `packagefile <import>=<archive>` lines.
  pub fn render(&self) -> String {
    let mut out = String::new();
    for (import_path, archive) in &self.entries {
      out.push_str(&format!("packagefile {}={}\n", import_path, archive.display()));
    }
    out
  }

  /// Write the configuration, replacing any previous file.
  pub fn flush(&self) -> Result<(), BuildError> {
    std::fs::write(&self.path, self.render()).map_err(|e| BuildError::io(&self.path, e))
  }
}
