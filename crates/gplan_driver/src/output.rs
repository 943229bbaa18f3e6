//! Emitting a finished plan: console listing, `commands.json`, optional
//! execution and debugging dumps.

use std::path::{Path, PathBuf};
use std::process::Command;

use ascii_table::AsciiTable;
use gplan_config::{DebugTrace, GplanConfig};
use gplan_log::{phase_log, trace_dbg};
use serde::Serialize;

use crate::build_layout::BuildLayout;
use crate::errors::BuildError;
use crate::plan::{ImportConfig, ToolCommand};
use crate::resolve::PackageGraph;

/// Environment variable that turns on execution, as `--execute` does.
pub const EXECUTE_ENV_VAR: &str = "ALSO_EXECUTE_COMMANDS";

/// Print every command, running each one right after it is printed when
/// execution is enabled, then write `commands.json`.
pub fn emit_commands(
  commands: &[ToolCommand],
  layout: &BuildLayout,
  config: &GplanConfig,
) -> Result<PathBuf, BuildError> {
  for command in commands {
    println!("Command: {}", command);

    if config.execute {
      run_command(command, layout.base(), config)?;
    }
  }

  write_commands_json(commands, &layout.commands_json())
}

/// Write the plan as a JSON array of argv arrays.
pub fn write_commands_json(
  commands: &[ToolCommand],
  path: &Path,
) -> Result<PathBuf, BuildError> {
  let mut out = Vec::new();
  let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
  let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
  commands
    .serialize(&mut serializer)
    .map_err(|e| BuildError::io(path, e.into()))?;

  std::fs::write(path, out).map_err(|e| BuildError::io(path, e))?;
  Ok(path.to_path_buf())
}

/// Run `<go> tool <argv...>` inside the build directory.
pub fn run_command(
  command: &ToolCommand,
  build_dir: &Path,
  config: &GplanConfig,
) -> Result<(), BuildError> {
  trace_dbg!(config, DebugTrace::Exec, "{} tool {}", config.go_tool, command);

  let status = Command::new(&config.go_tool)
    .arg("tool")
    .args(command.argv())
    .current_dir(build_dir)
    .status()
    .map_err(|e| BuildError::io(&config.go_tool, e))?;

  if !status.success() {
    return Err(BuildError::CommandFailed {
      command: command.to_string(),
      status: status.code(),
    });
  }

  Ok(())
}

/// Rows of the `--dump packages` table, in build order.
pub fn package_rows(graph: &PackageGraph) -> Vec<Vec<String>> {
  graph
    .topological_order()
    .into_iter()
    .map(|id| {
      let node = graph.get(id);
      let imports: Vec<&str> = node
        .imports
        .iter()
        .map(|dep| graph.get(*dep).import_path.as_str())
        .collect();

      vec![
        node.import_path.clone(),
        node.name.clone(),
        if node.internal { "yes" } else { "no" }.to_string(),
        (node.go_files.len() + node.asm_files.len()).to_string(),
        match &node.cached_archive {
          Some(archive) => archive.display().to_string(),
          None => "-".to_string(),
        },
        imports.join(" "),
      ]
    })
    .collect()
}

pub fn print_package_table(graph: &PackageGraph) {
  let mut ascii_table = AsciiTable::default();
  ascii_table.column(0).set_header("Import Path");
  ascii_table.column(1).set_header("Name");
  ascii_table.column(2).set_header("GOROOT");
  ascii_table.column(3).set_header("Files");
  ascii_table.column(4).set_header("Cached Archive");
  ascii_table.column(5).set_header("Imports");

  ascii_table.print(package_rows(graph));
}

pub fn print_import_config(
  import_cfg: &ImportConfig,
  config: &GplanConfig,
) {
  phase_log!(config, "{} ({} packages)", import_cfg.path().display(), import_cfg.len());
  print!("{}", import_cfg.render());
}
