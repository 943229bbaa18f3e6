//! Mapping an import path to a directory on disk.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use gplan_config::BuildEnv;
use regex::Regex;

use crate::gomod::{ModuleInfo, Rewrite};
use crate::paths::{join_import_path, std_archive_dir, std_src_dir};

/// Imports that never correspond to a package directory.
pub const PSEUDO_IMPORTS: &[&str] = &["unsafe", "C"];

fn version_suffix() -> &'static Regex {
  static VERSION_SUFFIX: OnceLock<Regex> = OnceLock::new();
  VERSION_SUFFIX.get_or_init(|| Regex::new(r"/v([0-9]+)/?$").expect("version suffix regex"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
  /// Source directory to scan.
  Source { dir: PathBuf, internal: bool },
  /// Standard library package with a precompiled archive.
  StdArchive { dir: PathBuf, archive: PathBuf },
  /// `unsafe` or `C`.
  Pseudo,
}

impl Location {
  pub fn describe(&self) -> String {
    match self {
      Location::Source { dir, internal: true } => format!("{} (GOROOT)", dir.display()),
      Location::Source { dir, internal: false } => dir.display().to_string(),
      Location::StdArchive { archive, .. } => format!("{} (precompiled)", archive.display()),
      Location::Pseudo => "pseudo-package".to_string(),
    }
  }
}

/// Search context for one build: target, module and build root.
#[derive(Debug, Clone)]
pub struct Locator {
  module: Option<ModuleInfo>,
  /// Module root when a go.mod was found, the build root otherwise.
  vendor_base: PathBuf,
  search_path: Vec<PathBuf>,
  std_archives: PathBuf,
  std_src: PathBuf,
}

impl Locator {
  pub fn new(
    env: &BuildEnv,
    build_root: &Path,
    module: Option<ModuleInfo>,
  ) -> Self {
    let vendor_base = module
      .as_ref()
      .map(|m| m.root.clone())
      .unwrap_or_else(|| build_root.to_path_buf());

    Self {
      module,
      vendor_base,
      search_path: env.search_path.clone(),
      std_archives: std_archive_dir(env),
      std_src: std_src_dir(env),
    }
  }

  /// First matching location for `import_path`, or `None` when nothing matches.
  pub fn locate(
    &self,
    import_path: &str,
  ) -> Option<Location> {
    if PSEUDO_IMPORTS.contains(&import_path) {
      return Some(Location::Pseudo);
    }

    if let Some(found) = self.locate_once(import_path) {
      return Some(found);
    }

    let suffix = version_suffix().find(import_path)?;
    self.locate(&import_path[..suffix.start()])
  }

  fn locate_once(
    &self,
    import_path: &str,
  ) -> Option<Location> {
    let mut lookup = import_path.to_string();

    if let Some(module) = &self.module {
      match module.rewrite(import_path) {
        Some(Rewrite::Dir(dir)) if dir.is_dir() => return Some(Location::Source { dir, internal: false }),
        Some(Rewrite::ImportPath(rewritten)) => lookup = rewritten,
        _ => {},
      }

      if let Some(dir) = module.local_dir(&lookup) {
        if dir.is_dir() {
          return Some(Location::Source { dir, internal: false });
        }
      }
    }

    let vendored = join_import_path(&self.vendor_base.join("vendor"), &lookup);
    if vendored.is_dir() {
      return Some(Location::Source {
        dir: vendored,
        internal: false,
      });
    }

    for search_dir in &self.search_path {
      let candidate = join_import_path(search_dir, &lookup);
      if candidate.is_dir() {
        return Some(Location::Source {
          dir: candidate,
          internal: false,
        });
      }
    }

    let archive = join_import_path(&self.std_archives, &format!("{}.a", lookup));
    if archive.is_file() {
      return Some(Location::StdArchive {
        dir: join_import_path(&self.std_src, &lookup),
        archive,
      });
    }

    let std_vendored = join_import_path(&self.std_src.join("vendor"), &lookup);
    if std_vendored.is_dir() {
      return Some(Location::Source {
        dir: std_vendored,
        internal: true,
      });
    }

    let std_dir = join_import_path(&self.std_src, &lookup);
    if std_dir.is_dir() {
      return Some(Location::Source {
        dir: std_dir,
        internal: true,
      });
    }

    None
  }
}
