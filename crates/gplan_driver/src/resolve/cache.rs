//! Reuse of archives left in the build directory by an earlier run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::build_layout::BuildLayout;
use crate::resolve::graph::{PackageGraph, PackageId};

/// The archive for `import_path` if it exists and nothing in `dir` is newer.
///
/// Unreadable directories or entries make the archive unusable rather than
/// failing the build.
pub fn check_cached_archive(
  layout: &BuildLayout,
  import_path: &str,
  dir: &Path,
) -> Option<PathBuf> {
  let archive = layout.archive_for(import_path);
  let built_at = std::fs::metadata(&archive).and_then(|m| m.modified()).ok()?;

  let entries = std::fs::read_dir(dir).ok()?;
  for entry in entries {
    let modified = match entry.and_then(|e| e.metadata()).and_then(|m| m.modified()) {
      Ok(modified) => modified,
      Err(_) => continue,
    };

    if modified > built_at {
      return None;
    }
  }

  Some(archive)
}

/// Drop cached archives of every package with a non-cached dependency.
///
/// Returns the import paths that lost their cache, in post-order.
pub fn invalidate_stale(graph: &mut PackageGraph) -> Vec<String> {
  let mut memo = HashMap::new();
  let mut invalidated = Vec::new();

  if !graph.is_empty() {
    let root = graph.root();
    visit(graph, root, &mut memo, &mut invalidated);
  }

  invalidated
}

fn visit(
  graph: &mut PackageGraph,
  id: PackageId,
  memo: &mut HashMap<PackageId, bool>,
  invalidated: &mut Vec<String>,
) -> bool {
  if let Some(cached) = memo.get(&id) {
    return *cached;
  }

  let imports = graph.get(id).imports.clone();
  let mut deps_cached = true;
  for dep in imports {
    // Every dependency is visited, even after one is found stale.
    if !visit(graph, dep, memo, invalidated) {
      deps_cached = false;
    }
  }

  let node = graph.get_mut(id);
  if !deps_cached && node.cached_archive.take().is_some() {
    invalidated.push(node.import_path.clone());
  }

  let cached = node.is_cached();
  memo.insert(id, cached);
  cached
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resolve::graph::PackageNode;
  use std::fs::{self, File};
  use std::time::{Duration, SystemTime};
  use tempfile::TempDir;

  fn set_mtime(
    path: &Path,
    time: SystemTime,
  ) {
    File::options().write(true).open(path).unwrap().set_modified(time).unwrap();
  }

  #[test]
  fn test_missing_archive_is_not_cached() {
    let temp = TempDir::new().unwrap();
    let layout = BuildLayout::new(&temp.path().join("build"));
    assert_eq!(check_cached_archive(&layout, "example.com/lib", temp.path()), None);
  }

  #[test]
  fn test_archive_newer_than_sources_is_cached() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("lib");
    let build = temp.path().join("build");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(&build).unwrap();

    let layout = BuildLayout::new(&build);
    let archive = layout.archive_for("example.com/lib");
    fs::write(src.join("lib.go"), "package lib\n").unwrap();
    fs::write(&archive, b"!<arch>\n").unwrap();

    let now = SystemTime::now();
    set_mtime(&src.join("lib.go"), now - Duration::from_secs(60));
    set_mtime(&archive, now);
    assert_eq!(check_cached_archive(&layout, "example.com/lib", &src), Some(archive.clone()));

    set_mtime(&src.join("lib.go"), now + Duration::from_secs(60));
    assert_eq!(check_cached_archive(&layout, "example.com/lib", &src), None);
  }

  fn node(
    name: &str,
    cached: bool,
  ) -> PackageNode {
    PackageNode {
      dir: PathBuf::from(format!("/src/{}", name)),
      import_path: name.to_string(),
      name: name.to_string(),
      internal: false,
      go_files: vec![format!("{}.go", name)],
      asm_files: vec![],
      cached_archive: cached.then(|| PathBuf::from(format!("/build/{}.a", name))),
      imports: vec![],
      aliases: vec![],
    }
  }

  #[test]
  fn test_invalidation_propagates_to_all_dependents() {
    // main -> {a, b}; a -> c; b -> d; c is stale
    let mut graph = PackageGraph::new(false);
    let main = graph.register(node("main", false));
    let a = graph.register(node("a", true));
    let b = graph.register(node("b", true));
    let c = graph.register(node("c", false));
    let d = graph.register(node("d", true));
    graph.add_import(main, a);
    graph.add_import(main, b);
    graph.add_import(a, c);
    graph.add_import(b, d);

    let invalidated = invalidate_stale(&mut graph);

    assert_eq!(invalidated, vec!["a".to_string()]);
    assert!(!graph.get(a).is_cached());
    assert!(graph.get(b).is_cached());
    assert!(graph.get(d).is_cached());
  }

  #[test]
  fn test_invalidation_is_transitive() {
    // main -> a -> b -> c; only c is stale
    let mut graph = PackageGraph::new(false);
    let main = graph.register(node("main", false));
    let a = graph.register(node("a", true));
    let b = graph.register(node("b", true));
    let c = graph.register(node("c", false));
    graph.add_import(main, a);
    graph.add_import(a, b);
    graph.add_import(b, c);

    let invalidated = invalidate_stale(&mut graph);

    assert_eq!(invalidated, vec!["b".to_string(), "a".to_string()]);
    assert!(graph.iter().all(|(_, n)| !n.is_cached()));
  }
}
