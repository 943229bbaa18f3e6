use std::fmt;
use std::path::Path;

use serde::Serialize;

/// A `go tool` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
  Asm,
  Compile,
  Pack,
  Link,
}

impl Tool {
  pub fn name(self) -> &'static str {
    match self {
      Tool::Asm => "asm",
      Tool::Compile => "compile",
      Tool::Pack => "pack",
      Tool::Link => "link",
    }
  }
}

impl fmt::Display for Tool {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// One toolchain invocation, serialized as its argv array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "Vec<String>")]
pub struct ToolCommand {
  pub tool: Tool,
  pub args: Vec<String>,
}

impl ToolCommand {
  pub fn new(tool: Tool) -> Self {
    Self { tool, args: Vec::new() }
  }

  pub fn arg(
    mut self,
    arg: impl Into<String>,
  ) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn path_arg(
    self,
    path: &Path,
  ) -> Self {
    self.arg(path.to_string_lossy())
  }

  pub fn args<I, S>(
    mut self,
    args: I,
  ) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  /// `[tool, args...]`, as passed after `go tool`.
  pub fn argv(&self) -> Vec<String> {
    let mut argv = Vec::with_capacity(self.args.len() + 1);
    argv.push(self.tool.name().to_string());
    argv.extend(self.args.iter().cloned());
    argv
  }

  /// The first argument following `flag`, if present.
  pub fn flag_value(
    &self,
    flag: &str,
  ) -> Option<&str> {
    let pos = self.args.iter().position(|a| a == flag)?;
    self.args.get(pos + 1).map(String::as_str)
  }

  pub fn has_flag(
    &self,
    flag: &str,
  ) -> bool {
    self.args.iter().any(|a| a == flag)
  }
}

impl From<ToolCommand> for Vec<String> {
  fn from(command: ToolCommand) -> Self {
    command.argv()
  }
}

impl fmt::Display for ToolCommand {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{}", self.argv().join(" "))
  }
}
