//! Raw configuration types for gplan.toml parsing.
//!
//! Every field is optional; the `resolve` module layers these values between
//! the command line and the environment.

use serde::Deserialize;

/// Root structure of gplan.toml.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectToml {
  #[serde(default)]
  pub build: BuildTomlConfig,
}

/// The `[build]` section.
#[derive(Debug, Deserialize)]
pub struct BuildTomlConfig {
  /// Build directory relative to the project root. Default: "build".
  #[serde(default = "default_out_dir")]
  pub out_dir: String,

  /// Extra build tags.
  #[serde(default)]
  pub tags: Vec<String>,

  pub goos: Option<String>,

  pub goarch: Option<String>,

  /// GOROOT, relative to the project root or absolute.
  pub goroot: Option<String>,

  /// Search path entries, relative to the project root or absolute.
  #[serde(default)]
  pub gopath: Vec<String>,

  /// Enable the `cgo` build tag.
  pub cgo: Option<bool>,

  /// Highest `go1.N` release tag to satisfy.
  pub go_minor: Option<u32>,
}

impl Default for BuildTomlConfig {
  fn default() -> Self {
    Self {
      out_dir: default_out_dir(),
      tags: Vec::new(),
      goos: None,
      goarch: None,
      goroot: None,
      gopath: Vec::new(),
      cgo: None,
      go_minor: None,
    }
  }
}

fn default_out_dir() -> String {
  "build".to_string()
}
