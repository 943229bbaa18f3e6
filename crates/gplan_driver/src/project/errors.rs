//! Error types for loading and resolving gplan.toml.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ProjectError {
  /// I/O error while reading a file.
  IoError { path: PathBuf, source: std::io::Error },

  /// Failed to parse gplan.toml.
  TomlParseError { path: PathBuf, message: String },

  /// The package directory or file to build does not exist.
  InputNotFound { path: PathBuf },

  /// GOROOT is not a directory.
  GorootNotFound { path: PathBuf },

  /// GOOS is not one the toolchain knows.
  UnknownGoos { value: String },

  /// GOARCH is not one the toolchain knows.
  UnknownGoarch { value: String },
}

impl fmt::Display for ProjectError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      ProjectError::IoError { path, source } => {
        write!(f, "failed to read '{}': {}", path.display(), source)
      },

      ProjectError::TomlParseError { path, message } => {
        write!(f, "failed to parse '{}': {}", path.display(), message)
      },

      ProjectError::InputNotFound { path } => {
        write!(f, "input package not found: '{}'", path.display())
      },

      ProjectError::GorootNotFound { path } => {
        write!(f, "GOROOT not found: '{}'", path.display())
      },

      ProjectError::UnknownGoos { value } => {
        write!(f, "unsupported GOOS '{}'", value)
      },

      ProjectError::UnknownGoarch { value } => {
        write!(f, "unsupported GOARCH '{}'", value)
      },
    }
  }
}

impl std::error::Error for ProjectError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ProjectError::IoError { source, .. } => Some(source),
      _ => None,
    }
  }
}
