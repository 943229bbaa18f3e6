use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Operating systems the Go toolchain knows about (`go tool dist list`).
pub const KNOWN_OS: &[&str] = &[
  "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux", "nacl", "netbsd",
  "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

/// Subset of `KNOWN_OS` satisfying the `unix` build tag.
pub const UNIX_OS: &[&str] = &[
  "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux", "netbsd", "openbsd",
  "solaris",
];

pub const KNOWN_ARCH: &[&str] = &[
  "386",
  "amd64",
  "amd64p32",
  "arm",
  "armbe",
  "arm64",
  "arm64be",
  "loong64",
  "mips",
  "mipsle",
  "mips64",
  "mips64le",
  "mips64p32",
  "mips64p32le",
  "ppc",
  "ppc64",
  "ppc64le",
  "riscv",
  "riscv64",
  "s390",
  "s390x",
  "sparc",
  "sparc64",
  "wasm",
];

/// Highest `go1.N` release tag enabled when nothing else is configured.
pub const DEFAULT_GO_MINOR: u32 = 22;

pub const DEFAULT_GOROOT: &str = "/usr/local/go";

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DumpKind {
  /// Table of resolved packages
  Packages,
  /// Final import configuration
  ImportCfg,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugTrace {
  Resolve,
  Scan,
  Cache,
  Plan,
  Link,
  Exec,
}

/// Target description every resolution and planning call receives.
///
/// Nothing in the workspace reads these values from the process environment
/// after construction, so two environments can be planned side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEnv {
  pub goos: String,
  pub goarch: String,
  pub goroot: PathBuf,
  /// GOPATH entries, searched in order.
  pub search_path: Vec<PathBuf>,
  /// User build tags.
  pub tags: Vec<String>,
  pub cgo_enabled: bool,
  /// Minor version of the targeted Go release; enables `go1.1`..`go1.<minor>`.
  pub go_minor: u32,
}

impl Default for BuildEnv {
  fn default() -> Self {
    Self {
      goos: host_os().to_string(),
      goarch: host_arch().to_string(),
      goroot: PathBuf::from(DEFAULT_GOROOT),
      search_path: Vec::new(),
      tags: Vec::new(),
      cgo_enabled: false,
      go_minor: DEFAULT_GO_MINOR,
    }
  }
}

impl BuildEnv {
  /// Seed an environment from `GOOS`, `GOARCH`, `GOROOT`, `GOPATH` and `CGO_ENABLED`.
  pub fn from_env() -> Self {
    Self::from_vars(|key| std::env::var(key).ok())
  }

  pub fn from_vars<F>(lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let mut env = Self::default();
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(goos) = non_empty("GOOS") {
      env.goos = goos;
    }

    if let Some(goarch) = non_empty("GOARCH") {
      env.goarch = goarch;
    }

    if let Some(goroot) = non_empty("GOROOT") {
      env.goroot = PathBuf::from(goroot);
    }

    env.search_path = match non_empty("GOPATH") {
      Some(gopath) => std::env::split_paths(&gopath).collect(),
      None => non_empty("HOME").map(|home| vec![PathBuf::from(home).join("go")]).unwrap_or_default(),
    };

    if let Some(cgo) = non_empty("CGO_ENABLED") {
      env.cgo_enabled = cgo.trim() == "1";
    }

    env
  }

  /// `<goos>_<goarch>`, the name of the precompiled archive directory.
  pub fn platform(&self) -> String {
    format!("{}_{}", self.goos, self.goarch)
  }
}

/// GOOS of the machine running the planner.
pub fn host_os() -> &'static str {
  match std::env::consts::OS {
    "macos" => "darwin",
    other => other,
  }
}

/// GOARCH of the machine running the planner.
pub fn host_arch() -> &'static str {
  match std::env::consts::ARCH {
    "x86_64" => "amd64",
    "x86" => "386",
    "aarch64" => "arm64",
    "powerpc64" => "ppc64",
    "loongarch64" => "loong64",
    "wasm32" => "wasm",
    other => other,
  }
}

#[derive(Debug, Clone)]
pub struct GplanConfig {
  pub debug: bool,
  pub debug_trace: Vec<DebugTrace>,
  pub quiet: bool,
  pub verbose: u8,
  pub dump: Vec<DumpKind>,
  /// Run every generated command through `<go_tool> tool ...` after planning.
  pub execute: bool,
  pub go_tool: String,
}

impl Default for GplanConfig {
  fn default() -> Self {
    Self {
      debug: false,
      debug_trace: Vec::new(),
      quiet: false,
      verbose: 0,
      dump: Vec::new(),
      execute: false,
      go_tool: "go".to_string(),
    }
  }
}

impl GplanConfig {
  pub fn new_basic(
    debug: bool,
    debug_trace: Vec<DebugTrace>,
    quiet: bool,
    verbose: u8,
  ) -> Self {
    Self {
      debug,
      debug_trace,
      quiet,
      verbose,
      ..Self::default()
    }
  }

  /// Configuration used by tests and library callers that want no output.
  pub fn silent() -> Self {
    Self::new_basic(false, Vec::new(), true, 0)
  }

  pub fn wants_dump(
    &self,
    kind: DumpKind,
  ) -> bool {
    self.dump.contains(&kind)
  }
}
