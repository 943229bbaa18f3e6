//! Turning a resolved package graph into `go tool` invocations.
//!
//! Packages are visited in post-order so every dependency is registered in
//! the import configuration before the first compile that needs it.

pub mod command;
pub mod importcfg;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use gplan_config::{BuildEnv, DebugTrace, GplanConfig};
use gplan_log::{log_info, trace_dbg};
use walkdir::WalkDir;

use crate::build_layout::{build_id, BuildLayout};
use crate::errors::BuildError;
use crate::paths::{std_archive_dir, std_include_dir};
use crate::resolve::{PackageGraph, PackageId, PackageNode};

pub use command::{Tool, ToolCommand};
pub use importcfg::ImportConfig;

/// Everything needed to build the root package, minus the final link.
#[derive(Debug, Clone)]
pub struct BuildPlan {
  pub import_cfg: ImportConfig,
  pub commands: Vec<ToolCommand>,
  /// Archives handed to the linker.
  pub link_archives: Vec<PathBuf>,
}

pub fn generate_plan(
  graph: &PackageGraph,
  build_dir: &Path,
  env: &BuildEnv,
  config: &GplanConfig,
) -> Result<BuildPlan, BuildError> {
  let layout = BuildLayout::new(build_dir);
  layout.create_dirs().map_err(|e| BuildError::io(build_dir, e))?;

  let import_cfg = ImportConfig::new(layout.importcfg());
  import_cfg.flush()?;

  let mut planner = Planner {
    graph,
    env,
    config,
    layout,
    visited: HashSet::new(),
    plan: BuildPlan {
      import_cfg,
      commands: Vec::new(),
      link_archives: Vec::new(),
    },
  };

  if !graph.is_empty() {
    planner.visit(graph.root(), true)?;
  }

  if graph.precompiled_std() {
    register_std_archives(&mut planner.plan.import_cfg, &std_archive_dir(env), config)?;
  }

  planner.plan.import_cfg.flush()?;
  Ok(planner.plan)
}

/// Register every archive of the precompiled standard library.
pub fn register_std_archives(
  import_cfg: &mut ImportConfig,
  archive_dir: &Path,
  config: &GplanConfig,
) -> Result<usize, BuildError> {
  let mut count = 0;

  for entry in WalkDir::new(archive_dir).sort_by_file_name() {
    let entry = entry.map_err(|e| {
      let path = e.path().unwrap_or(archive_dir).to_path_buf();
      BuildError::io(path, e.into())
    })?;

    if !entry.file_type().is_file() || entry.path().extension().map_or(true, |ext| ext != "a") {
      continue;
    }

    let relative = match entry.path().strip_prefix(archive_dir) {
      Ok(relative) => relative.with_extension(""),
      Err(_) => continue,
    };
    let import_path = relative
      .components()
      .map(|c| c.as_os_str().to_string_lossy())
      .collect::<Vec<_>>()
      .join("/");

    import_cfg.register(&import_path, entry.path());
    count += 1;
  }

  trace_dbg!(
    config,
    DebugTrace::Plan,
    "registered {} standard library archives from {}",
    count,
    archive_dir.display()
  );

  Ok(count)
}

struct Planner<'a> {
  graph: &'a PackageGraph,
  env: &'a BuildEnv,
  config: &'a GplanConfig,
  layout: BuildLayout,
  visited: HashSet<PackageId>,
  plan: BuildPlan,
}

impl<'a> Planner<'a> {
  fn visit(
    &mut self,
    id: PackageId,
    is_root: bool,
  ) -> Result<(), BuildError> {
    if !self.visited.insert(id) {
      return Ok(());
    }

    let graph = self.graph;
    let node = graph.get(id);

    for dep in &node.imports {
      self.visit(*dep, false)?;
    }

    let archive = self.layout.archive_for(&node.import_path);
    if is_root {
      self.plan.link_archives.push(archive.clone());
    }

    log_info!(
      self.config,
      "processing {} ({}) internal = {}, cached = {}",
      node.import_path,
      node.dir.display(),
      node.internal,
      node.is_cached()
    );

    let registered = node.cached_archive.as_deref().unwrap_or(archive.as_path());
    self.plan.import_cfg.register(&node.import_path, registered);
    for alias in &node.aliases {
      self.plan.import_cfg.register(alias, registered);
    }

    if node.is_cached() {
      return Ok(());
    }

    if node.go_files.is_empty() {
      return Err(BuildError::NoCompilableSources {
        import_path: node.import_path.clone(),
      });
    }

    let symabis = self.layout.symabis_for(&node.import_path);
    if node.has_assembly() {
      let files: Vec<PathBuf> = node.asm_files.iter().map(|f| node.dir.join(f)).collect();
      let command = self
        .asm_base(node)
        .arg("-gensymabis")
        .arg("-o")
        .path_arg(&symabis);
      let command = self.runtime_asm_flag(node, command);
      self.push(files.iter().fold(command, |cmd, f| cmd.path_arg(f)));
    }

    let compile = self.compile_command(node, &archive, &symabis);
    self.push(compile);

    if node.has_assembly() {
      let mut objects = Vec::with_capacity(node.asm_files.len());
      for asm_file in &node.asm_files {
        let object = self.layout.asm_object_for(&node.import_path, asm_file);
        let command = self.asm_base(node).arg("-o").path_arg(&object);
        let command = self.runtime_asm_flag(node, command).path_arg(&node.dir.join(asm_file));
        self.push(command);
        objects.push(object);
      }

      let pack = ToolCommand::new(Tool::Pack).arg("r").path_arg(&archive);
      self.push(objects.iter().fold(pack, |cmd, o| cmd.path_arg(o)));
    }

    Ok(())
  }

  fn push(
    &mut self,
    command: ToolCommand,
  ) {
    trace_dbg!(self.config, DebugTrace::Plan, "{}", command);
    self.plan.commands.push(command);
  }

  /// Flags shared by the symbol pre-pass and the per-file assembly.
  fn asm_base(
    &self,
    node: &PackageNode,
  ) -> ToolCommand {
    ToolCommand::new(Tool::Asm)
      .arg("-p")
      .arg(node.import_path.as_str())
      .arg("-I")
      .path_arg(self.layout.base())
      .arg("-I")
      .path_arg(&std_include_dir(self.env))
      .arg("-D")
      .arg(format!("GOOS_{}", self.env.goos))
      .arg("-D")
      .arg(format!("GOARCH_{}", self.env.goarch))
  }

  fn runtime_asm_flag(
    &self,
    node: &PackageNode,
    command: ToolCommand,
  ) -> ToolCommand {
    if node.internal {
      command.arg("-compiling-runtime")
    } else {
      command
    }
  }

  fn compile_command(
    &self,
    node: &PackageNode,
    archive: &Path,
    symabis: &Path,
  ) -> ToolCommand {
    let mut command = ToolCommand::new(Tool::Compile)
      .arg("-o")
      .path_arg(archive)
      .arg("-p")
      .arg(node.import_path.as_str())
      .arg("-buildid")
      .arg(build_id(&node.import_path))
      .arg("-importcfg")
      .path_arg(self.plan.import_cfg.path());

    if is_runtime_package(node) {
      command = command.args(["-std", "-+"]);
    }

    if node.has_assembly() {
      command = command
        .arg("-symabis")
        .path_arg(symabis)
        .arg("-asmhdr")
        .path_arg(&self.layout.asm_header());
    } else if !node.internal {
      command = command.arg("-complete");
    }

    node.go_paths().iter().fold(command, |cmd, f| cmd.path_arg(f))
  }
}

/// Distribution packages compiled as part of the runtime.
fn is_runtime_package(node: &PackageNode) -> bool {
  node.internal && node.import_path.starts_with("runtime") && node.import_path != "runtime/trace"
}
