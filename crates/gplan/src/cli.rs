use std::path::PathBuf;

use clap::{ColorChoice, Parser, ValueEnum};
use gplan_config::{DebugTrace, DumpKind};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum DumpKindCli {
  /// Table of resolved packages
  Packages,
  /// Final import configuration
  Importcfg,
}

impl From<DumpKindCli> for DumpKind {
  fn from(value: DumpKindCli) -> DumpKind {
    match value {
      DumpKindCli::Packages => DumpKind::Packages,
      DumpKindCli::Importcfg => DumpKind::ImportCfg,
    }
  }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum DebugTraceCli {
  Resolve,
  Scan,
  Cache,
  Plan,
  Link,
  Exec,
}

impl From<DebugTraceCli> for DebugTrace {
  fn from(value: DebugTraceCli) -> DebugTrace {
    match value {
      DebugTraceCli::Resolve => DebugTrace::Resolve,
      DebugTraceCli::Scan => DebugTrace::Scan,
      DebugTraceCli::Cache => DebugTrace::Cache,
      DebugTraceCli::Plan => DebugTrace::Plan,
      DebugTraceCli::Link => DebugTrace::Link,
      DebugTraceCli::Exec => DebugTrace::Exec,
    }
  }
}

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(
  name = "gplan",
  version,
  about = "Plan the go tool invocations that build a Go package",
  color = ColorChoice::Auto
)]
pub struct Cli {
  /// Package directory, or a single .go file holding package main
  pub input: PathBuf,

  /// Build directory (default: out_dir from gplan.toml, else ./build)
  pub build_dir: Option<PathBuf>,

  /// Build tags as `tag1,tag2` (same as --tags)
  #[arg(value_delimiter = ',')]
  pub tag_list: Vec<String>,

  /// Build tags, comma separated
  #[arg(long, value_delimiter = ',')]
  pub tags: Vec<String>,

  /// Target operating system
  #[arg(long)]
  pub goos: Option<String>,

  /// Target architecture
  #[arg(long)]
  pub goarch: Option<String>,

  /// Go installation to take the standard library from
  #[arg(long)]
  pub goroot: Option<PathBuf>,

  /// Package search directory (can be repeated)
  #[arg(long, action = clap::ArgAction::Append)]
  pub gopath: Vec<PathBuf>,

  /// Satisfy the `cgo` build tag
  #[arg(long)]
  pub cgo: bool,

  /// Do not satisfy the `cgo` build tag (overrides CGO_ENABLED and TOML)
  #[arg(long, conflicts_with = "cgo")]
  pub no_cgo: bool,

  /// Highest go1.N release tag to satisfy
  #[arg(long)]
  pub go_minor: Option<u32>,

  /// Explicit gplan.toml (overrides upward search)
  #[arg(long)]
  pub config: Option<PathBuf>,

  /// Run each command through `go tool` after printing it
  #[arg(long)]
  pub execute: bool,

  /// Go binary used with --execute
  #[arg(long, default_value = "go")]
  pub go_tool: String,

  /// Print internal planner state
  #[arg(long, value_enum, action = clap::ArgAction::Append)]
  pub dump: Vec<DumpKindCli>,

  /// Enable internal debug mode
  #[arg(long, default_value = "false")]
  pub debug: bool,

  /// Enable debug tracing for planner components
  #[arg(long, value_enum, action = clap::ArgAction::Append)]
  pub debug_trace: Vec<DebugTraceCli>,

  /// Don't print any output except the commands
  #[arg(long, short = 'q', default_value = "false")]
  pub quiet: bool,

  /// Use verbose output
  #[arg(long, short, action = clap::ArgAction::Count)]
  pub verbose: u8,
}

impl Cli {
  /// Tags from `--tags` and the positional list, in that order.
  pub fn all_tags(&self) -> Option<Vec<String>> {
    if self.tags.is_empty() && self.tag_list.is_empty() {
      return None;
    }

    Some(self.tags.iter().chain(self.tag_list.iter()).cloned().collect())
  }

  pub fn cgo_override(&self) -> Option<bool> {
    if self.cgo {
      Some(true)
    } else if self.no_cgo {
      Some(false)
    } else {
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_legacy_positional_tags() {
    let cli = Cli::try_parse_from(["gplan", "./cmd/app", "out", "netgo,osusergo"]).unwrap();
    assert_eq!(cli.input, PathBuf::from("./cmd/app"));
    assert_eq!(cli.build_dir, Some(PathBuf::from("out")));
    assert_eq!(cli.all_tags(), Some(vec!["netgo".to_string(), "osusergo".to_string()]));
  }

  #[test]
  fn test_flags() {
    let cli = Cli::try_parse_from([
      "gplan",
      "main.go",
      "--tags",
      "a,b",
      "--goos",
      "linux",
      "--gopath",
      "/one",
      "--gopath",
      "/two",
      "--no-cgo",
      "--dump",
      "packages",
      "--debug-trace",
      "cache",
      "-vv",
    ])
    .unwrap();

    assert_eq!(cli.build_dir, None);
    assert_eq!(cli.all_tags(), Some(vec!["a".to_string(), "b".to_string()]));
    assert_eq!(cli.goos.as_deref(), Some("linux"));
    assert_eq!(cli.gopath.len(), 2);
    assert_eq!(cli.cgo_override(), Some(false));
    assert_eq!(cli.dump, vec![DumpKindCli::Packages]);
    assert_eq!(cli.debug_trace, vec![DebugTraceCli::Cache]);
    assert_eq!(cli.verbose, 2);
  }

  #[test]
  fn test_cgo_flags_conflict() {
    assert!(Cli::try_parse_from(["gplan", ".", "--cgo", "--no-cgo"]).is_err());
  }
}
