use gplan_config::{DebugTrace, GplanConfig};
use gplan_log::trace_dbg;

use crate::build_layout::BuildLayout;
use crate::plan::{BuildPlan, Tool, ToolCommand};

/// The final `link` invocation producing the executable.
pub fn link_command(
  plan: &BuildPlan,
  layout: &BuildLayout,
) -> ToolCommand {
  let command = ToolCommand::new(Tool::Link)
    .arg("-o")
    .path_arg(&layout.executable())
    .arg("-buildmode=exe")
    .arg("-importcfg")
    .path_arg(plan.import_cfg.path());

  plan
    .link_archives
    .iter()
    .fold(command, |cmd, archive| cmd.path_arg(archive))
}

/// Append the link step to `plan`.
pub fn compose_link(
  plan: &mut BuildPlan,
  layout: &BuildLayout,
  config: &GplanConfig,
) {
  let command = link_command(plan, layout);
  trace_dbg!(config, DebugTrace::Link, "{}", command);
  plan.commands.push(command);
}
