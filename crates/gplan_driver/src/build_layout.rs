use std::io;
use std::path::{Path, PathBuf};

use crate::paths::hash_string;

/// Name of the executable produced by the final link step.
pub const EXECUTABLE_NAME: &str = "a.out";

/// Build output directory structure.
///
/// Every artifact lives directly in the build directory; per-package names
/// are derived from a hash of the import path, so they stay the same across
/// runs and old archives can be reused.
///
/// ```text
/// {base}/
///   importcfg                    packagefile <import>=<archive> lines
///   commands.json                the generated plan
///   go_asm.h                     header written by `compile -asmhdr`
///   <hash>.a                     package archive
///   symabis_<hash>               `asm -gensymabis` output
///   <hash>_<file.s>.o            assembled object
///   a.out                        final executable
/// ```
#[derive(Debug, Clone)]
pub struct BuildLayout {
  base: PathBuf,
}

impl BuildLayout {
  pub fn new(build_dir: &Path) -> Self {
    Self {
      base: build_dir.to_path_buf(),
    }
  }

  pub fn base(&self) -> &Path {
    &self.base
  }

  pub fn archive_for(
    &self,
    import_path: &str,
  ) -> PathBuf {
    self.base.join(format!("{}.a", hash_string(import_path)))
  }

  pub fn symabis_for(
    &self,
    import_path: &str,
  ) -> PathBuf {
    self.base.join(format!("symabis_{}", hash_string(import_path)))
  }

  pub fn asm_object_for(
    &self,
    import_path: &str,
    asm_file: &str,
  ) -> PathBuf {
    self.base.join(format!("{}_{}.o", hash_string(import_path), asm_file))
  }

  pub fn asm_header(&self) -> PathBuf {
    self.base.join("go_asm.h")
  }

  pub fn importcfg(&self) -> PathBuf {
    self.base.join("importcfg")
  }

  pub fn commands_json(&self) -> PathBuf {
    self.base.join("commands.json")
  }

  pub fn executable(&self) -> PathBuf {
    self.base.join(EXECUTABLE_NAME)
  }

  pub fn create_dirs(&self) -> io::Result<()> {
    std::fs::create_dir_all(&self.base)
  }
}

/// Build identifier handed to `compile -buildid`.
pub fn build_id(import_path: &str) -> String {
  hash_string(import_path)
}
