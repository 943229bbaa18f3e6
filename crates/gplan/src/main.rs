mod cli;

use std::error::Error;

use clap::Parser as ClapParser;
use colored::Colorize;
use gplan_config::{BuildEnv, GplanConfig};
use gplan_driver::output::EXECUTE_ENV_VAR;
use gplan_driver::project::{discover_project, resolve_settings, CliOverrides};
use gplan_driver::run_build;

use cli::Cli;

fn parse_cli_to_config(cli: &Cli) -> GplanConfig {
  let mut config = GplanConfig::new_basic(
    cli.debug,
    cli.debug_trace.iter().copied().map(Into::into).collect(),
    cli.quiet,
    cli.verbose,
  );

  config.dump = cli.dump.iter().copied().map(Into::into).collect();
  config.go_tool = cli.go_tool.clone();
  config.execute = cli.execute || std::env::var(EXECUTE_ENV_VAR).map_or(false, |v| !v.is_empty());

  config
}

fn cli_overrides(cli: &Cli) -> CliOverrides {
  CliOverrides {
    build_dir: cli.build_dir.clone(),
    tags: cli.all_tags(),
    goos: cli.goos.clone(),
    goarch: cli.goarch.clone(),
    goroot: cli.goroot.clone(),
    gopath: if cli.gopath.is_empty() {
      None
    } else {
      Some(cli.gopath.clone())
    },
    cgo: cli.cgo_override(),
    go_minor: cli.go_minor,
  }
}

fn run(
  cli: &Cli,
  config: &GplanConfig,
) -> Result<(), Box<dyn Error>> {
  let cwd = std::env::current_dir()?;
  let project = discover_project(&cwd.join(&cli.input), cli.config.as_deref())?;
  let settings = resolve_settings(&cli.input, project, &cli_overrides(cli), BuildEnv::from_env(), &cwd)?;

  run_build(&settings.input, &settings.build_dir, &settings.env, config)?;
  Ok(())
}

fn main() {
  let cli = Cli::parse();
  let config = parse_cli_to_config(&cli);

  if let Err(err) = run(&cli, &config) {
    eprintln!("{} {}", "Error:".red().bold(), err);
    std::process::exit(1);
  }
}
