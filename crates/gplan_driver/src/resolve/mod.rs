//! Import graph discovery.
//!
//! Discovery walks imports depth-first from the root package, scanning only
//! the headers of source files. Every directory becomes exactly one node.
//! A second pass drops cached archives whose dependencies are not cached.

pub mod cache;
pub mod graph;
pub mod locate;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gplan_config::{BuildEnv, DebugTrace, GplanConfig};
use gplan_log::{log_dbg, log_info, log_trc, phase_warn, trace_dbg};
use gplan_scan::{scan_header, FileHeader, TagMatcher};

use crate::build_layout::BuildLayout;
use crate::errors::BuildError;
use crate::gomod;
use crate::paths::std_archive_dir;

pub use cache::{check_cached_archive, invalidate_stale};
pub use graph::{PackageGraph, PackageId, PackageNode};
pub use locate::{Location, Locator};

/// Import path given to the root package.
pub const ROOT_IMPORT_PATH: &str = "main";

/// Source extensions the Go toolchain knows about but this planner never compiles.
const UNSUPPORTED_SOURCE_EXTS: &[&str] = &[
  "c", "h", "cc", "cpp", "cxx", "hh", "hpp", "hxx", "m", "f", "for", "f90", "swig", "swigcxx", "syso",
];

/// Resolve the import graph rooted at `root_input` (a package directory or a
/// single `.go` file).
pub fn resolve_graph(
  root_input: &Path,
  build_dir: &Path,
  env: &BuildEnv,
  config: &GplanConfig,
) -> Result<PackageGraph, BuildError> {
  let root_input = canonical(root_input)?;
  let metadata = std::fs::metadata(&root_input).map_err(|e| BuildError::io(&root_input, e))?;

  let (build_root, single_file) = if metadata.is_dir() {
    (root_input.clone(), None)
  } else {
    let parent = root_input.parent().map(Path::to_path_buf).unwrap_or_default();
    (parent, Some(root_input.clone()))
  };

  let module = match gomod::load_module(&build_root) {
    Ok(module) => module,
    Err(e) => {
      phase_warn!(config, "ignoring go.mod: {}", e);
      None
    },
  };

  if let Some(module) = &module {
    trace_dbg!(
      config,
      DebugTrace::Resolve,
      "module {} at {}",
      module.module_path,
      module.root.display()
    );
  }

  let precompiled_std = std_archive_dir(env).is_dir();
  trace_dbg!(
    config,
    DebugTrace::Resolve,
    "precompiled standard library: {}",
    precompiled_std
  );

  let mut resolver = Resolver {
    config,
    matcher: TagMatcher::new(env),
    locator: Locator::new(env, &build_root, module),
    layout: BuildLayout::new(build_dir),
    graph: PackageGraph::new(precompiled_std),
    stack: Vec::new(),
  };

  let target = PackageTarget {
    import_path: ROOT_IMPORT_PATH.to_string(),
    dir: build_root,
    internal: false,
    cached_archive: None,
  };
  resolver.visit(target, single_file.as_deref())?;

  let mut graph = resolver.graph;
  for import_path in invalidate_stale(&mut graph) {
    trace_dbg!(config, DebugTrace::Cache, "{} has a stale dependency", import_path);
  }

  Ok(graph)
}

fn canonical(path: &Path) -> Result<PathBuf, BuildError> {
  std::fs::canonicalize(path).map_err(|e| BuildError::io(path, e))
}

/// A located package waiting to be scanned.
struct PackageTarget {
  import_path: String,
  dir: PathBuf,
  internal: bool,
  cached_archive: Option<PathBuf>,
}

/// The chosen package of a directory after filtering.
#[derive(Debug, Default)]
struct ScannedPackage {
  name: String,
  go_files: Vec<String>,
  asm_files: Vec<String>,
  imports: Vec<String>,
}

struct SourceFile {
  name: String,
  src: String,
  header: FileHeader,
}

struct Resolver<'a> {
  config: &'a GplanConfig,
  matcher: TagMatcher,
  locator: Locator,
  layout: BuildLayout,
  graph: PackageGraph,
  /// Directories currently being discovered, with their import paths.
  stack: Vec<(PathBuf, String)>,
}

impl<'a> Resolver<'a> {
  fn visit(
    &mut self,
    target: PackageTarget,
    single_file: Option<&Path>,
  ) -> Result<PackageId, BuildError> {
    if let Some(pos) = self.stack.iter().position(|(dir, _)| *dir == target.dir) {
      let mut cycle: Vec<String> = self.stack[pos..].iter().map(|(_, path)| path.clone()).collect();
      cycle.push(target.import_path);
      return Err(BuildError::ImportCycle { cycle });
    }

    if let Some(id) = self.graph.get_by_dir(&target.dir) {
      self.graph.add_alias(id, &target.import_path);
      return Ok(id);
    }

    let is_root = self.graph.is_empty();
    let scanned = self.scan_package(&target, is_root, single_file)?;

    log_info!(
      self.config,
      "parsing {} ({}) with {} source files",
      target.import_path,
      target.dir.display(),
      scanned.go_files.len() + scanned.asm_files.len()
    );

    let cached_archive = if is_root {
      None
    } else {
      target
        .cached_archive
        .or_else(|| check_cached_archive(&self.layout, &target.import_path, &target.dir))
    };

    if let Some(archive) = &cached_archive {
      trace_dbg!(
        self.config,
        DebugTrace::Cache,
        "{} is up to date ({})",
        target.import_path,
        archive.display()
      );
    }

    let id = self.graph.register(PackageNode {
      dir: target.dir.clone(),
      import_path: target.import_path.clone(),
      name: scanned.name,
      internal: target.internal,
      go_files: scanned.go_files,
      asm_files: scanned.asm_files,
      cached_archive,
      imports: Vec::new(),
      aliases: Vec::new(),
    });

    self.stack.push((target.dir.clone(), target.import_path.clone()));
    for import_path in &scanned.imports {
      log_trc!(self.config, "{} imports {}", target.import_path, import_path);
      if let Some(dep) = self.resolve_import(import_path, &target.dir)? {
        self.graph.add_import(id, dep);
      }
    }
    self.stack.pop();

    Ok(id)
  }

  /// Locate one import and make sure it has a node; `None` for imports that
  /// get no node (pseudo-packages, and GOROOT sources when archives exist).
  fn resolve_import(
    &mut self,
    import_path: &str,
    importer: &Path,
  ) -> Result<Option<PackageId>, BuildError> {
    let location = self
      .locator
      .locate(import_path)
      .ok_or_else(|| BuildError::ImportNotFound {
        import_path: import_path.to_string(),
        importer: importer.to_path_buf(),
      })?;

    trace_dbg!(
      self.config,
      DebugTrace::Resolve,
      "\"{}\" -> {}",
      import_path,
      location.describe()
    );

    match location {
      Location::Pseudo => Ok(None),

      Location::StdArchive { dir, archive } => {
        if let Some(id) = self.graph.get_by_dir(&dir) {
          self.graph.add_alias(id, import_path);
          return Ok(Some(id));
        }

        let name = import_path.rsplit('/').next().unwrap_or(import_path).to_string();
        let id = self.graph.register(PackageNode {
          dir,
          import_path: import_path.to_string(),
          name,
          internal: true,
          go_files: Vec::new(),
          asm_files: Vec::new(),
          cached_archive: Some(archive),
          imports: Vec::new(),
          aliases: Vec::new(),
        });
        Ok(Some(id))
      },

      Location::Source { internal: true, .. } if self.graph.precompiled_std() => {
        log_dbg!(
          self.config,
          "{} has no archive, leaving it to the standard library registration",
          import_path
        );
        Ok(None)
      },

      Location::Source { dir, internal } => {
        let dir = canonical(&dir)?;
        let target = PackageTarget {
          import_path: import_path.to_string(),
          dir,
          internal,
          cached_archive: None,
        };
        self.visit(target, None).map(Some)
      },
    }
  }

  fn read_source(
    &self,
    path: &Path,
  ) -> Result<String, BuildError> {
    let bytes = std::fs::read(path).map_err(|e| BuildError::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
  }

  fn scan_package(
    &self,
    target: &PackageTarget,
    is_root: bool,
    single_file: Option<&Path>,
  ) -> Result<ScannedPackage, BuildError> {
    let mut go_sources: Vec<SourceFile> = Vec::new();
    let mut asm_names: Vec<String> = Vec::new();

    match single_file {
      Some(file) => {
        let src = self.read_source(file)?;
        let header = self.parse_header(file, &src)?;
        let name = file
          .file_name()
          .map(|n| n.to_string_lossy().into_owned())
          .unwrap_or_default();
        go_sources.push(SourceFile {
          name,
          src,
          header: FileHeader {
            package: ROOT_IMPORT_PATH.to_string(),
            imports: header.imports,
          },
        });
      },
      None => {
        for name in list_files(&target.dir)? {
          match extension(&name).as_deref() {
            Some("go") => {
              let path = target.dir.join(&name);
              let src = self.read_source(&path)?;
              let header = self.parse_header(&path, &src)?;
              go_sources.push(SourceFile { name, src, header });
            },
            Some("s") => asm_names.push(name),
            Some(ext) if UNSUPPORTED_SOURCE_EXTS.contains(&ext) => {
              if target.internal {
                log_dbg!(self.config, "skipping {} in {}", name, target.import_path);
              } else {
                phase_warn!(
                  self.config,
                  "unsupported source file {}, ignoring",
                  target.dir.join(&name).display()
                );
              }
            },
            _ => {},
          }
        }
      },
    }

    let files = self.choose_package(target, is_root, go_sources)?;
    let mut scanned = ScannedPackage::default();

    for file in files {
      scanned.name = file.header.package.clone();
      if !self.admit(target, &file.name, &file.src)? {
        continue;
      }

      for import in file.header.imports {
        if !scanned.imports.contains(&import.path) {
          scanned.imports.push(import.path);
        }
      }
      scanned.go_files.push(file.name);
    }

    for name in asm_names {
      let src = self.read_source(&target.dir.join(&name))?;
      if self.admit(target, &name, &src)? {
        scanned.asm_files.push(name);
      }
    }

    Ok(scanned)
  }

  fn parse_header(
    &self,
    path: &Path,
    src: &str,
  ) -> Result<FileHeader, BuildError> {
    scan_header(src).map_err(|e| BuildError::Scan {
      path: path.to_path_buf(),
      message: e.to_string(),
    })
  }

  /// Group files by package clause and keep the one this import refers to.
  fn choose_package(
    &self,
    target: &PackageTarget,
    is_root: bool,
    files: Vec<SourceFile>,
  ) -> Result<Vec<SourceFile>, BuildError> {
    let mut by_name: BTreeMap<String, Vec<SourceFile>> = BTreeMap::new();
    for file in files {
      let package = file.header.package.clone();
      if (!is_root && package == "main") || package.ends_with("_test") {
        continue;
      }
      by_name.entry(package).or_default().push(file);
    }

    if by_name.len() > 1 {
      let expected = if is_root {
        ROOT_IMPORT_PATH
      } else {
        target.import_path.rsplit('/').next().unwrap_or(&target.import_path)
      };

      return match by_name.remove(expected) {
        Some(files) => Ok(files),
        None => Err(BuildError::AmbiguousPackage {
          import_path: target.import_path.clone(),
          dir: target.dir.clone(),
          candidates: by_name.into_keys().collect(),
        }),
      };
    }

    by_name
      .into_values()
      .next()
      .ok_or_else(|| BuildError::EmptyPackage {
        import_path: target.import_path.clone(),
        dir: target.dir.clone(),
      })
  }

  /// File admission: name rules, test files, then header constraints.
  fn admit(
    &self,
    target: &PackageTarget,
    name: &str,
    src: &str,
  ) -> Result<bool, BuildError> {
    let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
    if stem.ends_with("_test") {
      return Ok(false);
    }

    let ok = self.matcher.match_file(name, src).map_err(|e| BuildError::Scan {
      path: target.dir.join(name),
      message: e.to_string(),
    })?;

    if !ok {
      trace_dbg!(
        self.config,
        DebugTrace::Scan,
        "{}: excluded by build constraints",
        target.dir.join(name).display()
      );
    }

    Ok(ok)
  }
}

/// Regular file names in `dir`, sorted.
fn list_files(dir: &Path) -> Result<Vec<String>, BuildError> {
  let entries = std::fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;

  let mut names = Vec::new();
  for entry in entries {
    let entry = entry.map_err(|e| BuildError::io(dir, e))?;
    if entry.path().is_file() {
      names.push(entry.file_name().to_string_lossy().into_owned());
    }
  }

  names.sort();
  Ok(names)
}

fn extension(name: &str) -> Option<String> {
  Path::new(name)
    .extension()
    .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}
