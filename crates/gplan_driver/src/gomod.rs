//! Reading the nearest `go.mod`.
//!
//! Only the `module` directive and the `replace` table are consumed; version
//! requirements are never looked at.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::paths::join_import_path;

/// The module descriptor filename.
pub const MODULE_FILE: &str = "go.mod";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceTarget {
  /// Local directory, as written (relative to the module root or absolute).
  Dir(PathBuf),
  /// Another module path.
  Module { path: String, version: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
  pub old_path: String,
  pub old_version: Option<String>,
  pub target: ReplaceTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoMod {
  pub module_path: String,
  pub replaces: Vec<Replace>,
}

#[derive(Debug)]
pub enum GoModError {
  Io { path: PathBuf, source: std::io::Error },
  Parse { line: usize, message: String },
}

impl fmt::Display for GoModError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      GoModError::Io { path, source } => write!(f, "failed to read '{}': {}", path.display(), source),
      GoModError::Parse { line, message } => write!(f, "{}:{}: {}", MODULE_FILE, line, message),
    }
  }
}

impl std::error::Error for GoModError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      GoModError::Io { source, .. } => Some(source),
      GoModError::Parse { .. } => None,
    }
  }
}

/// Outcome of applying a `replace` rule to an import path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
  Dir(PathBuf),
  ImportPath(String),
}

/// A parsed module together with the directory holding its `go.mod`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
  pub root: PathBuf,
  pub module_path: String,
  pub replaces: Vec<Replace>,
}

impl ModuleInfo {
  /// Apply the `replace` rule with the longest matching old path.
  ///
  /// Only one rule is ever applied; the result is not fed back through the table.
  pub fn rewrite(
    &self,
    import_path: &str,
  ) -> Option<Rewrite> {
    let (replace, suffix) = self
      .replaces
      .iter()
      .filter_map(|r| strip_path_prefix(import_path, &r.old_path).map(|suffix| (r, suffix)))
      .max_by_key(|(r, _)| r.old_path.len())?;

    match &replace.target {
      ReplaceTarget::Dir(dir) => {
        let base = if dir.is_absolute() { dir.clone() } else { self.root.join(dir) };
        Some(Rewrite::Dir(join_import_path(&base, suffix)))
      },
      ReplaceTarget::Module { path, .. } => {
        if suffix.is_empty() {
          Some(Rewrite::ImportPath(path.clone()))
        } else {
          Some(Rewrite::ImportPath(format!("{}/{}", path, suffix)))
        }
      },
    }
  }

  /// Directory inside this module for an import path under the module path.
  pub fn local_dir(
    &self,
    import_path: &str,
  ) -> Option<PathBuf> {
    strip_path_prefix(import_path, &self.module_path).map(|suffix| join_import_path(&self.root, suffix))
  }
}

/// `Some(rest)` when `path` is `prefix` or lies below it.
fn strip_path_prefix<'a>(
  path: &'a str,
  prefix: &str,
) -> Option<&'a str> {
  if prefix.is_empty() {
    return None;
  }

  let rest = path.strip_prefix(prefix)?;
  if rest.is_empty() {
    Some(rest)
  } else {
    rest.strip_prefix('/')
  }
}

/// Search upward from `start` for a directory containing go.mod.
pub fn find_module_root(start: &Path) -> Option<PathBuf> {
  let mut current = if start.is_file() {
    start.parent()?.to_path_buf()
  } else {
    start.to_path_buf()
  };

  loop {
    if current.join(MODULE_FILE).is_file() {
      return Some(current);
    }

    if !current.pop() {
      return None;
    }
  }
}

/// Find and parse the go.mod enclosing `start`.
///
/// `Ok(None)` means there is no go.mod at all.
pub fn load_module(start: &Path) -> Result<Option<ModuleInfo>, GoModError> {
  let root = match find_module_root(start) {
    Some(root) => root,
    None => return Ok(None),
  };

  let path = root.join(MODULE_FILE);
  let content = std::fs::read_to_string(&path).map_err(|e| GoModError::Io {
    path: path.clone(),
    source: e,
  })?;

  let parsed = parse_go_mod(&content)?;

  Ok(Some(ModuleInfo {
    root,
    module_path: parsed.module_path,
    replaces: parsed.replaces,
  }))
}

fn parse_error(
  line: usize,
  message: impl Into<String>,
) -> GoModError {
  GoModError::Parse {
    line,
    message: message.into(),
  }
}

/// Split a go.mod line into tokens, dropping `//` comments and unquoting strings.
fn tokenize(
  line: &str,
  line_no: usize,
) -> Result<Vec<String>, GoModError> {
  let mut tokens = Vec::new();
  let mut chars = line.chars().peekable();

  while let Some(&c) = chars.peek() {
    if c.is_whitespace() {
      chars.next();
      continue;
    }

    if c == '/' {
      chars.next();
      if chars.peek() == Some(&'/') {
        break;
      }
      let mut token = String::from('/');
      while let Some(&n) = chars.peek() {
        if n.is_whitespace() {
          break;
        }
        token.push(n);
        chars.next();
      }
      tokens.push(token);
      continue;
    }

    if c == '"' || c == '`' {
      chars.next();
      let mut token = String::new();
      let mut closed = false;
      while let Some(n) = chars.next() {
        if n == c {
          closed = true;
          break;
        }
        if n == '\\' && c == '"' {
          match chars.next() {
            Some(escaped) => token.push(escaped),
            None => break,
          }
          continue;
        }
        token.push(n);
      }
      if !closed {
        return Err(parse_error(line_no, "unterminated quoted string"));
      }
      tokens.push(token);
      continue;
    }

    let mut token = String::new();
    while let Some(&n) = chars.peek() {
      if n.is_whitespace() || n == '"' || n == '`' {
        break;
      }
      if n == '/' && token.ends_with('/') {
        // `//` starts a comment even without a leading space.
        token.pop();
        if !token.is_empty() {
          tokens.push(token);
        }
        return Ok(tokens);
      }
      token.push(n);
      chars.next();
    }
    tokens.push(token);
  }

  Ok(tokens)
}

fn is_dir_target(path: &str) -> bool {
  path.starts_with("./") || path.starts_with("../") || path == "." || path == ".." || Path::new(path).is_absolute()
}

fn parse_replace(
  args: &[String],
  line: usize,
) -> Result<Replace, GoModError> {
  let arrow = args
    .iter()
    .position(|a| a == "=>")
    .ok_or_else(|| parse_error(line, "replace directive is missing '=>'"))?;

  let (old, new) = (&args[..arrow], &args[arrow + 1..]);

  let (old_path, old_version) = match old {
    [path] => (path.clone(), None),
    [path, version] => (path.clone(), Some(version.clone())),
    _ => return Err(parse_error(line, "usage: replace module/path [v1.2.3] => other/module v1.4")),
  };

  let target = match new {
    [path] if is_dir_target(path) => ReplaceTarget::Dir(PathBuf::from(path)),
    [path] => {
      return Err(parse_error(
        line,
        format!("replacement module '{}' needs a version (or use a ./ directory path)", path),
      ))
    },
    [path, version] if !is_dir_target(path) => ReplaceTarget::Module {
      path: path.clone(),
      version: version.clone(),
    },
    [path, _] => return Err(parse_error(line, format!("replacement directory '{}' cannot have a version", path))),
    _ => return Err(parse_error(line, "usage: replace module/path [v1.2.3] => other/module v1.4")),
  };

  Ok(Replace {
    old_path,
    old_version,
    target,
  })
}

/// Parse the content of a go.mod file.
pub fn parse_go_mod(content: &str) -> Result<GoMod, GoModError> {
  let mut module_path: Option<String> = None;
  let mut replaces = Vec::new();
  let mut block: Option<(String, usize)> = None;

  for (idx, raw) in content.lines().enumerate() {
    let line_no = idx + 1;
    let tokens = tokenize(raw, line_no)?;
    if tokens.is_empty() {
      continue;
    }

    if let Some((verb, _)) = &block {
      if tokens.len() == 1 && tokens[0] == ")" {
        block = None;
        continue;
      }

      match verb.as_str() {
        "replace" => replaces.push(parse_replace(&tokens, line_no)?),
        "module" => return Err(parse_error(line_no, "module directive cannot be a block")),
        _ => {},
      }
      continue;
    }

    let verb = tokens[0].as_str();
    let args = &tokens[1..];

    if args.len() == 1 && args[0] == "(" {
      block = Some((verb.to_string(), line_no));
      continue;
    }

    match verb {
      "module" => {
        if module_path.is_some() {
          return Err(parse_error(line_no, "repeated module directive"));
        }
        match args {
          [path] if !path.is_empty() => module_path = Some(path.clone()),
          _ => return Err(parse_error(line_no, "usage: module module/path")),
        }
      },
      "replace" => replaces.push(parse_replace(args, line_no)?),
      // go, toolchain, require, exclude, retract, godebug, tool, ignore and
      // any directive added by later Go releases.
      _ => {},
    }
  }

  if let Some((verb, line)) = block {
    return Err(parse_error(line, format!("unterminated {} block", verb)));
  }

  let module_path = module_path.ok_or_else(|| parse_error(1, "no module directive found"))?;

  Ok(GoMod {
    module_path,
    replaces,
  })
}
