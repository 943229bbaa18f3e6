use std::collections::HashSet;

use gplan_config::{BuildEnv, KNOWN_ARCH, KNOWN_OS, UNIX_OS};

use crate::constraint::{parse_go_build, parse_plus_build};
use crate::scanner::{scan_constraints, ScanError};

/// Decides which files take part in a build for one target.
#[derive(Debug, Clone)]
pub struct TagMatcher {
  goos: String,
  goarch: String,
  cgo_enabled: bool,
  go_minor: u32,
  tags: HashSet<String>,
}

impl TagMatcher {
  pub fn new(env: &BuildEnv) -> Self {
    Self {
      goos: env.goos.clone(),
      goarch: env.goarch.clone(),
      cgo_enabled: env.cgo_enabled,
      go_minor: env.go_minor,
      tags: env.tags.iter().filter(|t| !t.is_empty()).cloned().collect(),
    }
  }

  pub fn match_tag(
    &self,
    name: &str,
  ) -> bool {
    if name.is_empty() {
      return false;
    }

    if self.tags.contains(name) || name == self.goos || name == self.goarch {
      return true;
    }

    match name {
      "linux" => self.goos == "android",
      "solaris" => self.goos == "illumos",
      "darwin" => self.goos == "ios",
      "unix" => UNIX_OS.contains(&self.goos.as_str()),
      "cgo" => self.cgo_enabled,
      "gc" => true,
      _ => self.is_release_tag(name),
    }
  }

  fn is_release_tag(
    &self,
    name: &str,
  ) -> bool {
    name
      .strip_prefix("go1.")
      .and_then(|minor| minor.parse::<u32>().ok())
      .map(|minor| minor >= 1 && minor <= self.go_minor)
      .unwrap_or(false)
  }

  /// Check the `_GOOS`, `_GOARCH` and `_GOOS_GOARCH` file name suffixes.
  pub fn good_os_arch_file(
    &self,
    file_name: &str,
  ) -> bool {
    let stem = file_name.split('.').next().unwrap_or(file_name);

    let stem = match stem.find('_') {
      Some(idx) => &stem[idx..],
      None => return true,
    };

    let mut parts: Vec<&str> = stem.split('_').collect();
    if parts.last() == Some(&"test") {
      parts.pop();
    }

    let n = parts.len();
    if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
      return self.match_tag(parts[n - 1]) && self.match_tag(parts[n - 2]);
    }

    if n >= 1 && (KNOWN_OS.contains(&parts[n - 1]) || KNOWN_ARCH.contains(&parts[n - 1])) {
      return self.match_tag(parts[n - 1]);
    }

    true
  }

  /// File name checks that need no file content.
  pub fn match_name(
    &self,
    file_name: &str,
  ) -> bool {
    if file_name.starts_with('_') || file_name.starts_with('.') {
      return false;
    }

    self.good_os_arch_file(file_name)
  }

  /// Evaluate the constraint comments in a source file header.
  pub fn should_build(
    &self,
    src: &str,
  ) -> Result<bool, ScanError> {
    let lines = scan_constraints(src)?;
    let ok = |tag: &str| self.match_tag(tag);

    if let Some(go_build) = &lines.go_build {
      let expr = parse_go_build(&go_build.text).map_err(|e| ScanError {
        line: go_build.line,
        message: e.to_string(),
      })?;
      return Ok(expr.eval(&ok));
    }

    for plus_build in &lines.plus_build {
      let expr = parse_plus_build(&plus_build.text).map_err(|e| ScanError {
        line: plus_build.line,
        message: e.to_string(),
      })?;
      if !expr.eval(&ok) {
        return Ok(false);
      }
    }

    Ok(true)
  }

  /// Full admission check: name rules first, then header constraints.
  pub fn match_file(
    &self,
    file_name: &str,
    src: &str,
  ) -> Result<bool, ScanError> {
    if !self.match_name(file_name) {
      return Ok(false);
    }

    self.should_build(src)
  }
}
