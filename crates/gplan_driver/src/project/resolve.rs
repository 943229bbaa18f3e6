//! Layering of command line, gplan.toml and environment into one target.

use std::path::{Path, PathBuf};

use gplan_config::{BuildEnv, KNOWN_ARCH, KNOWN_OS};

use crate::project::config::ProjectToml;
use crate::project::errors::ProjectError;

/// Everything a planning run needs, validated.
#[derive(Debug, Clone)]
pub struct Settings {
  /// Absolute path of the package directory or `.go` file to build.
  pub input: PathBuf,

  /// Absolute build directory.
  pub build_dir: PathBuf,

  pub env: BuildEnv,
}

/// CLI values; each `Some` wins over gplan.toml.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
  pub build_dir: Option<PathBuf>,
  pub tags: Option<Vec<String>>,
  pub goos: Option<String>,
  pub goarch: Option<String>,
  pub goroot: Option<PathBuf>,
  pub gopath: Option<Vec<PathBuf>>,
  pub cgo: Option<bool>,
  pub go_minor: Option<u32>,
}

/// Resolve the settings for building `input`.
///
/// # Arguments
/// * `input` - Package directory or file, relative to `cwd` or absolute.
/// * `project` - Loaded gplan.toml and the directory it lives in, if any.
/// * `overrides` - Command line values.
/// * `base` - Environment seeded from `GO*` variables and host defaults.
/// * `cwd` - Directory relative command line paths are taken from.
pub fn resolve_settings(
  input: &Path,
  project: Option<(PathBuf, ProjectToml)>,
  overrides: &CliOverrides,
  base: BuildEnv,
  cwd: &Path,
) -> Result<Settings, ProjectError> {
  let input = resolve_path(cwd, input);
  if !input.exists() {
    return Err(ProjectError::InputNotFound { path: input });
  }

  let (root, toml) = match project {
    Some((root, toml)) => (resolve_path(cwd, root), toml),
    None => (cwd.to_path_buf(), ProjectToml::default()),
  };
  let build = toml.build;

  let mut env = base;

  if let Some(goos) = overrides.goos.clone().or(build.goos) {
    env.goos = goos;
  }
  if !KNOWN_OS.contains(&env.goos.as_str()) {
    return Err(ProjectError::UnknownGoos { value: env.goos });
  }

  if let Some(goarch) = overrides.goarch.clone().or(build.goarch) {
    env.goarch = goarch;
  }
  if !KNOWN_ARCH.contains(&env.goarch.as_str()) {
    return Err(ProjectError::UnknownGoarch { value: env.goarch });
  }

  if let Some(goroot) = &overrides.goroot {
    env.goroot = resolve_path(cwd, goroot);
  } else if let Some(goroot) = &build.goroot {
    env.goroot = resolve_path(&root, goroot);
  }
  if !env.goroot.is_dir() {
    return Err(ProjectError::GorootNotFound { path: env.goroot });
  }

  if let Some(gopath) = &overrides.gopath {
    env.search_path = gopath.iter().map(|p| resolve_path(cwd, p)).collect();
  } else if !build.gopath.is_empty() {
    env.search_path = build.gopath.iter().map(|p| resolve_path(&root, p)).collect();
  }

  env.tags = overrides
    .tags
    .clone()
    .unwrap_or(build.tags)
    .into_iter()
    .map(|t| t.trim().to_string())
    .filter(|t| !t.is_empty())
    .collect();

  if let Some(cgo) = overrides.cgo.or(build.cgo) {
    env.cgo_enabled = cgo;
  }

  if let Some(minor) = overrides.go_minor.or(build.go_minor) {
    env.go_minor = minor;
  }

  let build_dir = match &overrides.build_dir {
    Some(dir) => resolve_path(cwd, dir),
    None => resolve_path(&root, &build.out_dir),
  };

  Ok(Settings { input, build_dir, env })
}

/// Resolve a path that may be relative to `base`.
fn resolve_path<P: AsRef<Path>>(
  base: &Path,
  path: P,
) -> PathBuf {
  let path = path.as_ref();
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    base.join(path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::project::config::BuildTomlConfig;
  use std::fs;
  use tempfile::TempDir;

  fn base_env(goroot: &Path) -> BuildEnv {
    BuildEnv {
      goos: "linux".to_string(),
      goarch: "amd64".to_string(),
      goroot: goroot.to_path_buf(),
      search_path: vec![PathBuf::from("/env/gopath")],
      ..BuildEnv::default()
    }
  }

  fn setup() -> (TempDir, PathBuf, PathBuf) {
    let temp = TempDir::new().unwrap();
    let goroot = temp.path().join("goroot");
    let app = temp.path().join("app");
    fs::create_dir_all(&goroot).unwrap();
    fs::create_dir_all(&app).unwrap();
    (temp, goroot, app)
  }

  #[test]
  fn test_environment_used_without_project() {
    let (temp, goroot, _app) = setup();

    let settings = resolve_settings(
      Path::new("app"),
      None,
      &CliOverrides::default(),
      base_env(&goroot),
      temp.path(),
    )
    .unwrap();

    assert_eq!(settings.input, temp.path().join("app"));
    assert_eq!(settings.build_dir, temp.path().join("build"));
    assert_eq!(settings.env.goos, "linux");
    assert_eq!(settings.env.search_path, vec![PathBuf::from("/env/gopath")]);
  }

  #[test]
  fn test_toml_overrides_environment() {
    let (temp, goroot, app) = setup();
    let toml = ProjectToml {
      build: BuildTomlConfig {
        out_dir: "out".to_string(),
        goarch: Some("arm64".to_string()),
        gopath: vec!["deps".to_string()],
        tags: vec!["netgo".to_string()],
        cgo: Some(true),
        ..BuildTomlConfig::default()
      },
    };

    let settings = resolve_settings(
      &app,
      Some((app.clone(), toml)),
      &CliOverrides::default(),
      base_env(&goroot),
      temp.path(),
    )
    .unwrap();

    assert_eq!(settings.build_dir, app.join("out"));
    assert_eq!(settings.env.goarch, "arm64");
    assert_eq!(settings.env.search_path, vec![app.join("deps")]);
    assert_eq!(settings.env.tags, vec!["netgo".to_string()]);
    assert!(settings.env.cgo_enabled);
  }

  #[test]
  fn test_cli_overrides_toml() {
    let (temp, goroot, app) = setup();
    let toml = ProjectToml {
      build: BuildTomlConfig {
        goos: Some("darwin".to_string()),
        tags: vec!["from_toml".to_string()],
        ..BuildTomlConfig::default()
      },
    };
    let overrides = CliOverrides {
      build_dir: Some(PathBuf::from("/tmp/elsewhere")),
      goos: Some("windows".to_string()),
      tags: Some(vec!["a".to_string(), " ".to_string(), "b".to_string()]),
      ..CliOverrides::default()
    };

    let settings = resolve_settings(&app, Some((app.clone(), toml)), &overrides, base_env(&goroot), temp.path()).unwrap();

    assert_eq!(settings.build_dir, PathBuf::from("/tmp/elsewhere"));
    assert_eq!(settings.env.goos, "windows");
    assert_eq!(settings.env.tags, vec!["a".to_string(), "b".to_string()]);
  }

  #[test]
  fn test_validation_errors() {
    let (temp, goroot, app) = setup();

    let bad_os = CliOverrides {
      goos: Some("beos".to_string()),
      ..CliOverrides::default()
    };
    assert!(matches!(
      resolve_settings(&app, None, &bad_os, base_env(&goroot), temp.path()),
      Err(ProjectError::UnknownGoos { .. })
    ));

    let bad_arch = CliOverrides {
      goarch: Some("z80".to_string()),
      ..CliOverrides::default()
    };
    assert!(matches!(
      resolve_settings(&app, None, &bad_arch, base_env(&goroot), temp.path()),
      Err(ProjectError::UnknownGoarch { .. })
    ));

    let missing_root = CliOverrides {
      goroot: Some(temp.path().join("nope")),
      ..CliOverrides::default()
    };
    assert!(matches!(
      resolve_settings(&app, None, &missing_root, base_env(&goroot), temp.path()),
      Err(ProjectError::GorootNotFound { .. })
    ));

    assert!(matches!(
      resolve_settings(
        &temp.path().join("missing"),
        None,
        &CliOverrides::default(),
        base_env(&goroot),
        temp.path()
      ),
      Err(ProjectError::InputNotFound { .. })
    ));
  }
}
