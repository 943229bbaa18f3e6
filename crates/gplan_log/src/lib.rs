//! Stderr logging for the gplan build planner.
//!
//! Stdout carries the generated commands (and `--dump` output), so every
//! message here goes to stderr:
//!
//! - `phase_log!` marks a planning step (resolving, generating, writing),
//!   `phase_ok!` its result and `phase_warn!` a recoverable problem such as
//!   an unreadable `go.mod`. `--quiet` hides all three.
//! - `log_info!`, `log_dbg!` and `log_trc!` follow `-v`, `-vv` and `-vvv`.
//! - `trace_dbg!` follows `--debug-trace <component>` (or `--debug`).

use std::fmt;

use colored::Colorize;
use gplan_config::{DebugTrace, GplanConfig};

/// Verbosity a `log_*` message needs before it is printed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
  Info = 1,
  Debug = 2,
  Trace = 3,
}

impl Verbosity {
  fn prefix(self) -> &'static str {
    match self {
      Verbosity::Info => "info",
      Verbosity::Debug => "debug",
      Verbosity::Trace => "trace",
    }
  }
}

/// Kind of phase line; picks the arrow colour and indentation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PhaseKind {
  Step,
  Done,
  Warning,
}

/// `-v` count after `--quiet` and `--debug` are applied.
pub fn effective_verbose(config: &GplanConfig) -> u8 {
  if config.quiet {
    return 0;
  }

  // --debug implies -vv.
  if config.debug && config.verbose < 2 {
    return 2;
  }

  config.verbose
}

pub fn verbosity_enabled(
  config: &GplanConfig,
  level: Verbosity,
) -> bool {
  effective_verbose(config) >= level as u8
}

pub fn debug_trace_enabled(
  config: &GplanConfig,
  trace: DebugTrace,
) -> bool {
  !config.quiet && (config.debug || config.debug_trace.contains(&trace))
}

/// Component label printed in `debug[...]` lines.
pub fn trace_name(trace: DebugTrace) -> &'static str {
  match trace {
    DebugTrace::Resolve => "resolve",
    DebugTrace::Scan => "scan",
    DebugTrace::Cache => "cache",
    DebugTrace::Plan => "plan",
    DebugTrace::Link => "link",
    DebugTrace::Exec => "exec",
  }
}

fn phase_line(
  kind: PhaseKind,
  message: fmt::Arguments<'_>,
) -> String {
  match kind {
    PhaseKind::Step => format!("    {} {}", "-->".bright_green().bold(), message),
    PhaseKind::Done => format!("{} {}", "-->".bright_green().bold(), message),
    PhaseKind::Warning => format!("{} {}", "-->".bright_yellow().bold(), message),
  }
}

#[doc(hidden)]
pub fn emit_phase(
  config: &GplanConfig,
  kind: PhaseKind,
  message: fmt::Arguments<'_>,
) {
  if !config.quiet {
    eprintln!("{}", phase_line(kind, message));
  }
}

#[doc(hidden)]
pub fn emit_verbose(
  config: &GplanConfig,
  level: Verbosity,
  message: fmt::Arguments<'_>,
) {
  if verbosity_enabled(config, level) {
    eprintln!("{}: {}", level.prefix(), message);
  }
}

#[doc(hidden)]
pub fn emit_trace(
  config: &GplanConfig,
  trace: DebugTrace,
  message: fmt::Arguments<'_>,
) {
  if debug_trace_enabled(config, trace) {
    eprintln!("debug[{}]: {}", trace_name(trace), message);
  }
}

/// Announce a planning step.
///
/// ```ignore
/// phase_log!(config, "Resolving imports of {} for {}", input.display(), env.platform());
/// //     --> Resolving imports of ./cmd/app for linux/amd64
/// ```
#[macro_export]
macro_rules! phase_log {
  ($config:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
    $crate::emit_phase($config, $crate::PhaseKind::Step, format_args!($fmt $(, $arg)*))
  };
}

#[macro_export]
macro_rules! phase_ok {
  ($config:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
    $crate::emit_phase($config, $crate::PhaseKind::Done, format_args!($fmt $(, $arg)*))
  };
}

/// ```ignore
/// phase_warn!(config, "ignoring go.mod: {}", e);
/// ```
#[macro_export]
macro_rules! phase_warn {
  ($config:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
    $crate::emit_phase($config, $crate::PhaseKind::Warning, format_args!($fmt $(, $arg)*))
  };
}

/// Debug line for one planner component.
///
/// ```ignore
/// trace_dbg!(config, DebugTrace::Cache, "{} has a stale dependency", import_path);
/// // debug[cache]: example.com/app/a has a stale dependency
/// ```
#[macro_export]
macro_rules! trace_dbg {
  ($config:expr, $trace:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
    $crate::emit_trace($config, $trace, format_args!($fmt $(, $arg)*))
  };
}

#[macro_export]
macro_rules! log_info {
  ($config:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
    $crate::emit_verbose($config, $crate::Verbosity::Info, format_args!($fmt $(, $arg)*))
  };
}

#[macro_export]
macro_rules! log_dbg {
  ($config:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
    $crate::emit_verbose($config, $crate::Verbosity::Debug, format_args!($fmt $(, $arg)*))
  };
}

#[macro_export]
macro_rules! log_trc {
  ($config:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
    $crate::emit_verbose($config, $crate::Verbosity::Trace, format_args!($fmt $(, $arg)*))
  };
}
