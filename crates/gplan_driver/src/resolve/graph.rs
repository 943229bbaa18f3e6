use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Index of a package in its [`PackageGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(u32);

impl PackageId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

/// One resolved package directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNode {
  pub dir: PathBuf,
  /// Path used by importers; `main` for the root.
  pub import_path: String,
  pub name: String,
  /// Part of the Go distribution.
  pub internal: bool,
  pub go_files: Vec<String>,
  pub asm_files: Vec<String>,
  /// Archive that can be reused instead of compiling.
  pub cached_archive: Option<PathBuf>,
  pub imports: Vec<PackageId>,
  /// Other import paths that resolved to the same directory.
  pub aliases: Vec<String>,
}

impl PackageNode {
  pub fn is_cached(&self) -> bool {
    self.cached_archive.is_some()
  }

  pub fn has_assembly(&self) -> bool {
    !self.asm_files.is_empty()
  }

  /// Absolute paths of the admitted `.go` files.
  pub fn go_paths(&self) -> Vec<PathBuf> {
    self.go_files.iter().map(|f| self.dir.join(f)).collect()
  }
}

/// Deduplicated import graph rooted at the package being built.
///
/// The first registered package is the root.
#[derive(Debug, Clone)]
pub struct PackageGraph {
  nodes: Vec<PackageNode>,
  by_dir: HashMap<PathBuf, PackageId>,
  precompiled_std: bool,
}

impl PackageGraph {
  pub fn new(precompiled_std: bool) -> Self {
    Self {
      nodes: Vec::new(),
      by_dir: HashMap::new(),
      precompiled_std,
    }
  }

  /// Add a node, or return the one already registered for its directory.
  pub fn register(
    &mut self,
    node: PackageNode,
  ) -> PackageId {
    if let Some(id) = self.by_dir.get(&node.dir) {
      return *id;
    }

    let id = PackageId(self.nodes.len() as u32);
    self.by_dir.insert(node.dir.clone(), id);
    self.nodes.push(node);
    id
  }

  /// Record a dependency edge; repeated edges are ignored.
  pub fn add_import(
    &mut self,
    from: PackageId,
    to: PackageId,
  ) {
    let imports = &mut self.nodes[from.index()].imports;
    if !imports.contains(&to) {
      imports.push(to);
    }
  }

  /// Remember that `import_path` also names `id`.
  pub fn add_alias(
    &mut self,
    id: PackageId,
    import_path: &str,
  ) {
    let node = &mut self.nodes[id.index()];
    if node.import_path != import_path && !node.aliases.iter().any(|a| a == import_path) {
      node.aliases.push(import_path.to_string());
    }
  }

  pub fn root(&self) -> PackageId {
    PackageId(0)
  }

  pub fn precompiled_std(&self) -> bool {
    self.precompiled_std
  }

  pub fn get(
    &self,
    id: PackageId,
  ) -> &PackageNode {
    &self.nodes[id.index()]
  }

  pub fn get_mut(
    &mut self,
    id: PackageId,
  ) -> &mut PackageNode {
    &mut self.nodes[id.index()]
  }

  pub fn get_by_dir(
    &self,
    dir: &Path,
  ) -> Option<PackageId> {
    self.by_dir.get(dir).copied()
  }

  pub fn find_by_import_path(
    &self,
    import_path: &str,
  ) -> Option<PackageId> {
    self.iter().find(|(_, n)| n.import_path == import_path).map(|(id, _)| id)
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (PackageId, &PackageNode)> {
    self.nodes.iter().enumerate().map(|(i, n)| (PackageId(i as u32), n))
  }

  /// Packages reachable from the root, dependencies first.
  pub fn topological_order(&self) -> Vec<PackageId> {
    let mut result = Vec::new();
    let mut visited = HashSet::new();

    if !self.nodes.is_empty() {
      self.topo_visit(self.root(), &mut visited, &mut result);
    }

    result
  }

  fn topo_visit(
    &self,
    id: PackageId,
    visited: &mut HashSet<PackageId>,
    result: &mut Vec<PackageId>,
  ) {
    if !visited.insert(id) {
      return;
    }

    for dep in &self.get(id).imports {
      self.topo_visit(*dep, visited, result);
    }

    result.push(id);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn node(dir: &str) -> PackageNode {
    PackageNode {
      dir: PathBuf::from(dir),
      import_path: dir.trim_start_matches('/').to_string(),
      name: dir.rsplit('/').next().unwrap_or(dir).to_string(),
      internal: false,
      go_files: vec!["a.go".to_string()],
      asm_files: vec![],
      cached_archive: None,
      imports: vec![],
      aliases: vec![],
    }
  }

  #[test]
  fn test_register_dedups_by_dir() {
    let mut graph = PackageGraph::new(false);
    let a = graph.register(node("/a"));
    let again = graph.register(node("/a"));
    assert_eq!(a, again);
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.get_by_dir(Path::new("/a")), Some(a));
  }

  #[test]
  fn test_add_import_ignores_duplicates() {
    let mut graph = PackageGraph::new(false);
    let a = graph.register(node("/a"));
    let b = graph.register(node("/b"));
    graph.add_import(a, b);
    graph.add_import(a, b);
    assert_eq!(graph.get(a).imports, vec![b]);
  }

  #[test]
  fn test_add_alias_skips_own_path_and_repeats() {
    let mut graph = PackageGraph::new(false);
    let lib = graph.register(node("/lib"));
    graph.add_alias(lib, "lib");
    graph.add_alias(lib, "lib/v2");
    graph.add_alias(lib, "lib/v2");
    assert_eq!(graph.get(lib).aliases, vec!["lib/v2".to_string()]);
  }

  #[test]
  fn test_topological_order_shared_dependency() {
    // main -> {a, b}, a -> c, b -> c
    let mut graph = PackageGraph::new(false);
    let main = graph.register(node("/main"));
    let a = graph.register(node("/a"));
    let b = graph.register(node("/b"));
    let c = graph.register(node("/c"));
    graph.add_import(main, a);
    graph.add_import(main, b);
    graph.add_import(a, c);
    graph.add_import(b, c);
    assert_eq!(graph.root(), main);

    assert_eq!(graph.topological_order(), vec![c, a, b, main]);
  }

  #[test]
  fn test_go_paths_are_absolute() {
    let n = node("/src/lib");
    assert_eq!(n.go_paths(), vec![PathBuf::from("/src/lib/a.go")]);
    assert!(!n.has_assembly());
    assert!(!n.is_cached());
  }
}
