//! Functions for locating and loading gplan.toml.

use std::path::{Path, PathBuf};

use crate::project::config::ProjectToml;
use crate::project::errors::ProjectError;

/// The project configuration filename.
pub const PROJECT_FILE: &str = "gplan.toml";

/// Search upward from `start` to find a directory containing gplan.toml.
///
/// Returns the directory, not the file itself.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
  let mut current = if start.is_file() {
    start.parent()?.to_path_buf()
  } else {
    start.to_path_buf()
  };

  loop {
    if current.join(PROJECT_FILE).is_file() {
      return Some(current);
    }

    if !current.pop() {
      return None;
    }
  }
}

/// Load and parse a gplan.toml file.
pub fn load_project_toml(toml_path: &Path) -> Result<ProjectToml, ProjectError> {
  let content = std::fs::read_to_string(toml_path).map_err(|e| ProjectError::IoError {
    path: toml_path.to_path_buf(),
    source: e,
  })?;

  toml::from_str(&content).map_err(|e| ProjectError::TomlParseError {
    path: toml_path.to_path_buf(),
    message: e.to_string(),
  })
}

/// Load the configuration named on the command line, or the one found
/// upward from `input`. Returns the directory relative paths resolve against.
pub fn discover_project(
  input: &Path,
  explicit: Option<&Path>,
) -> Result<Option<(PathBuf, ProjectToml)>, ProjectError> {
  if let Some(path) = explicit {
    let toml = load_project_toml(path)?;
    let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
    return Ok(Some((root, toml)));
  }

  match find_project_root(input) {
    Some(root) => {
      let toml = load_project_toml(&root.join(PROJECT_FILE))?;
      Ok(Some((root, toml)))
    },
    None => Ok(None),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  #[test]
  fn test_find_project_root_in_parent_dir() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("cmd").join("server");
    fs::create_dir_all(&nested).unwrap();
    fs::write(temp.path().join(PROJECT_FILE), "[build]\n").unwrap();

    assert_eq!(find_project_root(&nested), Some(temp.path().to_path_buf()));
  }

  #[test]
  fn test_find_project_root_from_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(PROJECT_FILE), "").unwrap();
    fs::write(temp.path().join("main.go"), "package main\n").unwrap();

    assert_eq!(
      find_project_root(&temp.path().join("main.go")),
      Some(temp.path().to_path_buf())
    );
  }

  #[test]
  fn test_load_invalid_toml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(PROJECT_FILE);
    fs::write(&path, "[build\n").unwrap();

    assert!(matches!(
      load_project_toml(&path),
      Err(ProjectError::TomlParseError { .. })
    ));
  }

  #[test]
  fn test_load_missing_file() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
      load_project_toml(&temp.path().join(PROJECT_FILE)),
      Err(ProjectError::IoError { .. })
    ));
  }

  #[test]
  fn test_discover_explicit_file() {
    let temp = TempDir::new().unwrap();
    let cfg = temp.path().join("ci.toml");
    fs::write(&cfg, "[build]\ngoos = \"windows\"\n").unwrap();

    let (root, toml) = discover_project(temp.path(), Some(&cfg)).unwrap().unwrap();
    assert_eq!(root, temp.path());
    assert_eq!(toml.build.goos.as_deref(), Some("windows"));
  }
}
