#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use gplan_config::{BuildEnv, GplanConfig};
use gplan_driver::{plan_build, BuildError, PlannedBuild, Tool, ToolCommand};
use tempfile::TempDir;

/// A throwaway tree holding a fake GOROOT, a GOPATH, a module and a build dir.
pub struct Workspace {
  _temp: TempDir,
  pub root: PathBuf,
  pub env: BuildEnv,
}

impl Workspace {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let root = fs::canonicalize(temp.path()).unwrap();
    fs::create_dir_all(root.join("goroot/src")).unwrap();

    let env = BuildEnv {
      goos: "linux".to_string(),
      goarch: "amd64".to_string(),
      goroot: root.join("goroot"),
      search_path: vec![root.join("gopath")],
      tags: Vec::new(),
      cgo_enabled: false,
      go_minor: 22,
    };

    Self { _temp: temp, root, env }
  }

  pub fn path(
    &self,
    rel: &str,
  ) -> PathBuf {
    self.root.join(rel)
  }

  pub fn write(
    &self,
    rel: &str,
    content: &str,
  ) -> PathBuf {
    let path = self.path(rel);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
  }

  /// A Go source file with the given package clause and imports.
  pub fn go_file(
    &self,
    rel: &str,
    package: &str,
    imports: &[&str],
  ) -> PathBuf {
    let mut src = format!("package {}\n\n", package);
    if !imports.is_empty() {
      src.push_str("import (\n");
      for import in imports {
        src.push_str(&format!("\t\"{}\"\n", import));
      }
      src.push_str(")\n");
    }
    src.push_str("\nfunc init() {}\n");
    self.write(rel, &src)
  }

  pub fn module(
    &self,
    dir: &str,
    module_path: &str,
  ) {
    self.write(&format!("{}/go.mod", dir), &format!("module {}\n\ngo 1.22\n", module_path));
  }

  /// Create `$GOROOT/pkg/linux_amd64/<import>.a` for each import path.
  pub fn precompile_std(
    &self,
    imports: &[&str],
  ) {
    for import in imports {
      self.write(&format!("goroot/pkg/linux_amd64/{}.a", import), "!<arch>\n");
    }
  }

  pub fn build_dir(&self) -> PathBuf {
    self.path("build")
  }

  pub fn plan(
    &self,
    input: &str,
  ) -> Result<PlannedBuild, BuildError> {
    plan_build(&self.path(input), &self.build_dir(), &self.env, &GplanConfig::silent())
  }

  /// Create the archive `compile` would have written for `import_path`.
  pub fn fake_archive(
    &self,
    planned: &PlannedBuild,
    import_path: &str,
  ) -> PathBuf {
    let archive = planned.layout.archive_for(import_path);
    fs::write(&archive, "!<arch>\n").unwrap();
    set_mtime(&archive, SystemTime::now());
    archive
  }

  /// Move every file in `dir` into the past.
  pub fn age_dir(
    &self,
    rel: &str,
  ) {
    let past = SystemTime::now() - Duration::from_secs(3600);
    for entry in fs::read_dir(self.path(rel)).unwrap() {
      let path = entry.unwrap().path();
      if path.is_file() {
        set_mtime(&path, past);
      }
    }
  }

  /// Move a file into the future, as an edit after the last build would.
  pub fn touch_future(
    &self,
    rel: &str,
  ) {
    set_mtime(&self.path(rel), SystemTime::now() + Duration::from_secs(3600));
  }
}

pub fn set_mtime(
  path: &Path,
  time: SystemTime,
) {
  File::options().write(true).open(path).unwrap().set_modified(time).unwrap();
}

/// Import paths passed to `compile -p`, in command order.
pub fn compiled(commands: &[ToolCommand]) -> Vec<String> {
  commands
    .iter()
    .filter(|c| c.tool == Tool::Compile)
    .filter_map(|c| c.flag_value("-p").map(str::to_string))
    .collect()
}

pub fn tools(commands: &[ToolCommand]) -> Vec<Tool> {
  commands.iter().map(|c| c.tool).collect()
}

pub fn position(
  list: &[String],
  item: &str,
) -> usize {
  list
    .iter()
    .position(|x| x == item)
    .unwrap_or_else(|| panic!("{} not in {:?}", item, list))
}
