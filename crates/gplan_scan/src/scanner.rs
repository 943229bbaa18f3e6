//! Header scanner for Go source files.
//!
//! Only the package clause and the import declarations are read; scanning
//! stops at the first top-level token that is not part of an import.

use std::fmt;

use crate::constraint::{is_go_build, is_plus_build};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
  /// Explicit local name (`_`, `.`, or an identifier), if any.
  pub alias: Option<String>,
  pub path: String,
  pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileHeader {
  pub package: String,
  pub imports: Vec<ImportSpec>,
}

/// One constraint comment and the 1-based line it sits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintLine {
  pub line: usize,
  pub text: String,
}

/// Constraint comments found in the leading comment block of a file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConstraintLines {
  pub go_build: Option<ConstraintLine>,
  /// `// +build` lines located before the last blank line of the header.
  pub plus_build: Vec<ConstraintLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
  pub line: usize,
  pub message: String,
}

impl fmt::Display for ScanError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "line {}: {}", self.line, self.message)
  }
}

impl std::error::Error for ScanError {}

/// Collect the build constraint comments of a source file.
///
/// Works for Go and assembly sources alike. The header is the run of blank
/// lines and comments before the first other text; `//go:build` may appear
/// anywhere in it, `// +build` only before its last blank line.
pub fn scan_constraints(src: &str) -> Result<ConstraintLines, ScanError> {
  let src = strip_bom(src);
  let mut lines = ConstraintLines::default();
  let mut eligible_lines = 0usize;
  let mut ended = false;
  let mut in_block = false;
  let mut header: Vec<&str> = Vec::new();

  'lines: for (idx, raw) in src.lines().enumerate() {
    let mut line = raw.trim();

    if line.is_empty() && !ended {
      eligible_lines = header.len() + 1;
      header.push(line);
      continue;
    }

    if !line.starts_with("//") {
      ended = true;
    }

    if !in_block && is_go_build(line) {
      if lines.go_build.is_some() {
        return Err(ScanError {
          line: idx + 1,
          message: "multiple //go:build comments".to_string(),
        });
      }
      lines.go_build = Some(ConstraintLine {
        line: idx + 1,
        text: line.to_string(),
      });
    }

    header.push(line);

    while !line.is_empty() {
      if in_block {
        match line.find("*/") {
          Some(end) => {
            in_block = false;
            line = line[end + 2..].trim();
            continue;
          },
          None => continue 'lines,
        }
      }

      if line.starts_with("//") {
        continue 'lines;
      }

      if let Some(rest) = line.strip_prefix("/*") {
        in_block = true;
        line = rest.trim();
        continue;
      }

      break 'lines;
    }
  }

  lines.plus_build = header[..eligible_lines]
    .iter()
    .enumerate()
    .filter(|(_, line)| is_plus_build(line))
    .map(|(idx, line)| ConstraintLine {
      line: idx + 1,
      text: line.to_string(),
    })
    .collect();

  Ok(lines)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
  Ident(String),
  Str(String),
  LParen,
  RParen,
  Semi,
  Dot,
  Other(char),
}

struct Lexer<'a> {
  src: &'a str,
  pos: usize,
  line: usize,
}

impl<'a> Lexer<'a> {
  fn new(src: &'a str) -> Self {
    Self { src, pos: 0, line: 1 }
  }

  fn peek_char(&self) -> Option<char> {
    self.src[self.pos..].chars().next()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek_char()?;
    self.pos += c.len_utf8();
    if c == '\n' {
      self.line += 1;
    }
    Some(c)
  }

  fn error(
    &self,
    message: impl Into<String>,
  ) -> ScanError {
    ScanError {
      line: self.line,
      message: message.into(),
    }
  }

  fn skip_trivia(&mut self) -> Result<(), ScanError> {
    loop {
      let rest = &self.src[self.pos..];

      if rest.starts_with("//") {
        while let Some(c) = self.peek_char() {
          if c == '\n' {
            break;
          }
          self.bump();
        }
      } else if rest.starts_with("/*") {
        let start_line = self.line;
        self.bump();
        self.bump();
        loop {
          if self.src[self.pos..].starts_with("*/") {
            self.bump();
            self.bump();
            break;
          }
          if self.bump().is_none() {
            return Err(ScanError {
              line: start_line,
              message: "comment not terminated".to_string(),
            });
          }
        }
      } else if matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
        self.bump();
      } else {
        return Ok(());
      }
    }
  }

  fn next_token(&mut self) -> Result<Option<Token>, ScanError> {
    self.skip_trivia()?;

    let c = match self.bump() {
      Some(c) => c,
      None => return Ok(None),
    };

    let token = match c {
      '(' => Token::LParen,
      ')' => Token::RParen,
      ';' => Token::Semi,
      '.' => Token::Dot,
      '"' => Token::Str(self.interpreted_string()?),
      '`' => Token::Str(self.raw_string()?),
      c if c.is_alphabetic() || c == '_' => {
        let start = self.pos - c.len_utf8();
        while matches!(self.peek_char(), Some(n) if n.is_alphanumeric() || n == '_') {
          self.bump();
        }
        Token::Ident(self.src[start..self.pos].to_string())
      },
      other => Token::Other(other),
    };

    Ok(Some(token))
  }

  fn interpreted_string(&mut self) -> Result<String, ScanError> {
    let mut value = String::new();
    loop {
      match self.bump() {
        Some('"') => return Ok(value),
        Some('\\') => {
          let escaped = match self.bump() {
            Some('\\') => '\\',
            Some('"') => '"',
            Some('n') => '\n',
            Some('t') => '\t',
            Some(other) => return Err(self.error(format!("unsupported escape '\\{}' in import path", other))),
            None => return Err(self.error("string literal not terminated")),
          };
          value.push(escaped);
        },
        Some('\n') | None => return Err(self.error("string literal not terminated")),
        Some(c) => value.push(c),
      }
    }
  }

  fn raw_string(&mut self) -> Result<String, ScanError> {
    let mut value = String::new();
    loop {
      match self.bump() {
        Some('`') => return Ok(value),
        Some('\r') => {},
        Some(c) => value.push(c),
        None => return Err(self.error("raw string literal not terminated")),
      }
    }
  }
}

struct HeaderParser<'a> {
  lexer: Lexer<'a>,
  lookahead: Option<Token>,
}

impl<'a> HeaderParser<'a> {
  fn peek(&mut self) -> Result<Option<&Token>, ScanError> {
    if self.lookahead.is_none() {
      self.lookahead = self.lexer.next_token()?;
    }
    Ok(self.lookahead.as_ref())
  }

  fn next(&mut self) -> Result<Option<Token>, ScanError> {
    match self.lookahead.take() {
      Some(token) => Ok(Some(token)),
      None => self.lexer.next_token(),
    }
  }

  fn skip_semis(&mut self) -> Result<(), ScanError> {
    while self.peek()? == Some(&Token::Semi) {
      self.next()?;
    }
    Ok(())
  }

  fn package_clause(&mut self) -> Result<String, ScanError> {
    match self.next()? {
      Some(Token::Ident(kw)) if kw == "package" => {},
      _ => return Err(self.lexer.error("expected 'package'")),
    }

    match self.next()? {
      Some(Token::Ident(name)) if name != "_" => Ok(name),
      _ => Err(self.lexer.error("expected package name")),
    }
  }

  fn import_spec(&mut self) -> Result<ImportSpec, ScanError> {
    let alias = match self.peek()? {
      Some(Token::Ident(_)) | Some(Token::Dot) => match self.next()? {
        Some(Token::Ident(name)) => Some(name),
        _ => Some(".".to_string()),
      },
      _ => None,
    };

    let line = self.lexer.line;
    match self.next()? {
      Some(Token::Str(path)) if !path.is_empty() => Ok(ImportSpec { alias, path, line }),
      Some(Token::Str(_)) => Err(self.lexer.error("empty import path")),
      _ => Err(self.lexer.error("expected import path")),
    }
  }

  fn imports(&mut self) -> Result<Vec<ImportSpec>, ScanError> {
    let mut imports = Vec::new();

    loop {
      self.skip_semis()?;

      match self.peek()? {
        Some(Token::Ident(kw)) if kw == "import" => {
          self.next()?;
        },
        _ => return Ok(imports),
      }

      if self.peek()? == Some(&Token::LParen) {
        self.next()?;
        loop {
          self.skip_semis()?;
          match self.peek()? {
            Some(Token::RParen) => {
              self.next()?;
              break;
            },
            Some(_) => imports.push(self.import_spec()?),
            None => return Err(self.lexer.error("unterminated import block")),
          }
        }
      } else {
        imports.push(self.import_spec()?);
      }
    }
  }
}

/// Editors on some platforms prefix files with a byte order mark.
fn strip_bom(src: &str) -> &str {
  src.strip_prefix('\u{feff}').unwrap_or(src)
}

/// Scan the package clause and import declarations of a Go file.
pub fn scan_header(src: &str) -> Result<FileHeader, ScanError> {
  let mut parser = HeaderParser {
    lexer: Lexer::new(strip_bom(src)),
    lookahead: None,
  };

  let package = parser.package_clause()?;
  let imports = parser.imports()?;

  Ok(FileHeader { package, imports })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn paths(header: &FileHeader) -> Vec<&str> {
    header.imports.iter().map(|i| i.path.as_str()).collect()
  }

  fn texts(lines: &[ConstraintLine]) -> Vec<&str> {
    lines.iter().map(|l| l.text.as_str()).collect()
  }

  #[test]
  fn test_scan_grouped_and_single_imports() {
    let src = r#"// Package demo does things.
package demo

import "fmt"

import (
	"os"
	str "strings"
	_ "embed"
	. "math"
	`path/filepath`
)

func main() { fmt.Println(os.Args) }
"#;
    let header = scan_header(src).unwrap();
    assert_eq!(header.package, "demo");
    assert_eq!(paths(&header), vec!["fmt", "os", "strings", "embed", "math", "path/filepath"]);
    assert_eq!(header.imports[2].alias.as_deref(), Some("str"));
    assert_eq!(header.imports[3].alias.as_deref(), Some("_"));
    assert_eq!(header.imports[4].alias.as_deref(), Some("."));
    assert_eq!(header.imports[0].line, 4);
  }

  #[test]
  fn test_scan_semicolon_separated() {
    let header = scan_header("package x; import \"a\"; import (\"b\"; \"c\")").unwrap();
    assert_eq!(paths(&header), vec!["a", "b", "c"]);
  }

  #[test]
  fn test_scan_stops_at_first_declaration() {
    let src = "package x\n\nvar s = `import \"nope\"`\n\nimport \"late\"\n";
    let header = scan_header(src).unwrap();
    assert!(header.imports.is_empty());
  }

  #[test]
  fn test_scan_comments_everywhere() {
    let src = "/* lead */ package /* mid */ cgodemo // trailing\n/*\n#include <stdio.h>\n*/\nimport \"C\"\n";
    let header = scan_header(src).unwrap();
    assert_eq!(header.package, "cgodemo");
    assert_eq!(paths(&header), vec!["C"]);
  }

  #[test]
  fn test_scan_errors() {
    assert!(scan_header("func main() {}").is_err());
    assert!(scan_header("package main\nimport (\n\"fmt\"\n").is_err());
    assert!(scan_header("package main\nimport \"fmt\n\"").is_err());
    assert!(scan_header("package main\nimport fmt").is_err());
    assert!(scan_header("package main /* never closed").is_err());
  }

  #[test]
  fn test_constraints_go_build_and_plus_build() {
    let src = "// Copyright\n\n//go:build linux\n// +build linux\n\npackage x\n";
    let lines = scan_constraints(src).unwrap();
    let go_build = lines.go_build.unwrap();
    assert_eq!(go_build.text, "//go:build linux");
    assert_eq!(go_build.line, 3);
    assert_eq!(texts(&lines.plus_build), vec!["// +build linux"]);
    assert_eq!(lines.plus_build[0].line, 4);
  }

  #[test]
  fn test_constraints_plus_build_needs_blank_line() {
    let src = "// +build ignore\npackage x\n";
    let lines = scan_constraints(src).unwrap();
    assert!(lines.plus_build.is_empty());
  }

  #[test]
  fn test_constraints_stop_at_code() {
    let src = "package x\n\n//go:build linux\n";
    let lines = scan_constraints(src).unwrap();
    assert!(lines.go_build.is_none());
  }

  #[test]
  fn test_constraints_inside_block_comment_ignored() {
    let src = "/*\n//go:build linux\n*/\n\npackage x\n";
    let lines = scan_constraints(src).unwrap();
    assert!(lines.go_build.is_none());
  }

  #[test]
  fn test_constraints_multiple_go_build_rejected() {
    let src = "//go:build linux\n//go:build darwin\n\npackage x\n";
    assert!(scan_constraints(src).is_err());
  }

  #[test]
  fn test_constraints_assembly_header() {
    let src = "// +build amd64\n\n#include \"textflag.h\"\n\nTEXT ·add(SB),NOSPLIT,$0\n";
    let lines = scan_constraints(src).unwrap();
    assert_eq!(texts(&lines.plus_build), vec!["// +build amd64"]);
  }

  #[test]
  fn test_byte_order_mark_is_skipped() {
    let header = scan_header("\u{feff}package main\n\nimport \"fmt\"\n").unwrap();
    assert_eq!(header.package, "main");
    assert_eq!(paths(&header), vec!["fmt"]);

    let lines = scan_constraints("\u{feff}//go:build linux\n\npackage main\n").unwrap();
    assert_eq!(lines.go_build.map(|l| l.text).as_deref(), Some("//go:build linux"));
  }
}
