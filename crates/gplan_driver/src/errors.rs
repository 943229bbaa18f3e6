//! Errors raised while resolving the import graph or generating the plan.
//!
//! Every variant is fatal: no partial plan is produced once one is returned.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum BuildError {
  /// An import path matched none of the search locations.
  ImportNotFound { import_path: String, importer: PathBuf },

  /// Several package clauses in one directory and none has the expected name.
  AmbiguousPackage {
    import_path: String,
    dir: PathBuf,
    candidates: Vec<String>,
  },

  /// No usable package clause in the directory.
  EmptyPackage { import_path: String, dir: PathBuf },

  /// Every `.go` file of the package was rejected by build constraints.
  NoCompilableSources { import_path: String },

  /// Import cycle, listed from the first package on the cycle back to itself.
  ImportCycle { cycle: Vec<String> },

  /// I/O error while reading a file or directory.
  Io { path: PathBuf, source: std::io::Error },

  /// Syntax error in a file header or build constraint.
  Scan { path: PathBuf, message: String },

  /// A generated command failed when executed.
  CommandFailed { command: String, status: Option<i32> },
}

impl BuildError {
  pub(crate) fn io(
    path: impl Into<PathBuf>,
    source: std::io::Error,
  ) -> Self {
    BuildError::Io {
      path: path.into(),
      source,
    }
  }
}

impl fmt::Display for BuildError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      BuildError::ImportNotFound { import_path, importer } => {
        write!(
          f,
          "import \"{}\" not found in standard locations (imported from '{}')",
          import_path,
          importer.display()
        )
      },

      BuildError::AmbiguousPackage {
        import_path,
        dir,
        candidates,
      } => {
        write!(
          f,
          "more than one package found in '{}' for import \"{}\": {}",
          dir.display(),
          import_path,
          candidates.join(", ")
        )
      },

      BuildError::EmptyPackage { import_path, dir } => {
        write!(
          f,
          "import \"{}\" had no matching packages in expected directory '{}'",
          import_path,
          dir.display()
        )
      },

      BuildError::NoCompilableSources { import_path } => {
        write!(
          f,
          "no .go files to compile in package {}, check build tags and update vendored dependencies",
          import_path
        )
      },

      BuildError::ImportCycle { cycle } => {
        write!(f, "import cycle not allowed: {}", cycle.join(" -> "))
      },

      BuildError::Io { path, source } => {
        write!(f, "failed to read '{}': {}", path.display(), source)
      },

      BuildError::Scan { path, message } => {
        write!(f, "failed to parse '{}': {}", path.display(), message)
      },

      BuildError::CommandFailed { command, status } => match status {
        Some(code) => write!(f, "command `{}` exited with status {}", command, code),
        None => write!(f, "command `{}` was terminated by a signal", command),
      },
    }
  }
}

impl std::error::Error for BuildError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      BuildError::Io { source, .. } => Some(source),
      _ => None,
    }
  }
}
