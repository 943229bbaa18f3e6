pub mod build_layout;
pub mod errors;
pub mod gomod;
pub mod link;
pub mod output;
pub mod paths;
pub mod plan;
pub mod project;
pub mod resolve;

use std::path::{Path, PathBuf};

use gplan_config::{BuildEnv, DumpKind, GplanConfig};
use gplan_log::{log_dbg, phase_log, phase_ok};

pub use build_layout::BuildLayout;
pub use errors::BuildError;
pub use link::compose_link;
pub use plan::{generate_plan, BuildPlan, ImportConfig, Tool, ToolCommand};
pub use resolve::{resolve_graph, PackageGraph, PackageId, PackageNode};

/// Result of planning: the graph it was derived from and the full command list.
#[derive(Debug, Clone)]
pub struct PlannedBuild {
  pub graph: PackageGraph,
  pub plan: BuildPlan,
  pub layout: BuildLayout,
}

/// Resolve, plan and link without printing or executing anything.
pub fn plan_build(
  input: &Path,
  build_dir: &Path,
  env: &BuildEnv,
  config: &GplanConfig,
) -> Result<PlannedBuild, BuildError> {
  let build_dir = absolute(build_dir)?;

  phase_log!(config, "Resolving imports of {} for {}", input.display(), env.platform());
  let graph = resolve_graph(input, &build_dir, env, config)?;
  log_dbg!(config, "resolved {} packages", graph.len());

  phase_log!(config, "Generating commands in {}", build_dir.display());
  let mut plan = generate_plan(&graph, &build_dir, env, config)?;

  let layout = BuildLayout::new(&build_dir);
  compose_link(&mut plan, &layout, config);

  Ok(PlannedBuild { graph, plan, layout })
}

/// Plan the build, then print, record and optionally execute the commands.
pub fn run_build(
  input: &Path,
  build_dir: &Path,
  env: &BuildEnv,
  config: &GplanConfig,
) -> Result<PlannedBuild, BuildError> {
  let planned = plan_build(input, build_dir, env, config)?;

  if config.wants_dump(DumpKind::Packages) {
    output::print_package_table(&planned.graph);
  }

  if config.wants_dump(DumpKind::ImportCfg) {
    output::print_import_config(&planned.plan.import_cfg, config);
  }

  let json = output::emit_commands(&planned.plan.commands, &planned.layout, config)?;
  phase_ok!(
    config,
    "{} commands written to {}",
    planned.plan.commands.len(),
    json.display()
  );

  Ok(planned)
}

fn absolute(path: &Path) -> Result<PathBuf, BuildError> {
  if path.is_absolute() {
    return Ok(path.to_path_buf());
  }

  let cwd = std::env::current_dir().map_err(|e| BuildError::io(path, e))?;
  Ok(cwd.join(path))
}
