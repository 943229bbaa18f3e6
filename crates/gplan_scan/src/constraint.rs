//! Build constraint expressions.
//!
//! Two syntaxes exist in Go sources:
//!
//! ```text
//! //go:build linux && (amd64 || arm64) && !purego
//! // +build linux,amd64 linux,arm64
//! ```
//!
//! Both parse into the same [`Expr`] tree.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
  Tag(String),
  Not(Box<Expr>),
  And(Box<Expr>, Box<Expr>),
  Or(Box<Expr>, Box<Expr>),
}

impl Expr {
  pub fn eval<F>(
    &self,
    ok: &F,
  ) -> bool
  where
    F: Fn(&str) -> bool,
  {
    match self {
      Expr::Tag(tag) => ok(tag),
      Expr::Not(inner) => !inner.eval(ok),
      Expr::And(lhs, rhs) => lhs.eval(ok) && rhs.eval(ok),
      Expr::Or(lhs, rhs) => lhs.eval(ok) || rhs.eval(ok),
    }
  }

  fn and(
    lhs: Option<Expr>,
    rhs: Expr,
  ) -> Expr {
    match lhs {
      Some(lhs) => Expr::And(Box::new(lhs), Box::new(rhs)),
      None => rhs,
    }
  }

  fn or(
    lhs: Option<Expr>,
    rhs: Expr,
  ) -> Expr {
    match lhs {
      Some(lhs) => Expr::Or(Box::new(lhs), Box::new(rhs)),
      None => rhs,
    }
  }
}

impl fmt::Display for Expr {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      Expr::Tag(tag) => write!(f, "{}", tag),
      Expr::Not(inner) => match inner.as_ref() {
        Expr::Tag(_) | Expr::Not(_) => write!(f, "!{}", inner),
        _ => write!(f, "!({})", inner),
      },
      Expr::And(lhs, rhs) => {
        write_operand(f, lhs, matches!(lhs.as_ref(), Expr::Or(..)))?;
        write!(f, " && ")?;
        write_operand(f, rhs, matches!(rhs.as_ref(), Expr::Or(..)))
      },
      Expr::Or(lhs, rhs) => {
        write!(f, "{} || {}", lhs, rhs)
      },
    }
  }
}

fn write_operand(
  f: &mut fmt::Formatter<'_>,
  expr: &Expr,
  parens: bool,
) -> fmt::Result {
  if parens {
    write!(f, "({})", expr)
  } else {
    write!(f, "{}", expr)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintError {
  pub message: String,
}

impl fmt::Display for ConstraintError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "invalid build constraint: {}", self.message)
  }
}

impl std::error::Error for ConstraintError {}

fn error(message: impl Into<String>) -> ConstraintError {
  ConstraintError {
    message: message.into(),
  }
}

/// Reports whether `line` is a `//go:build` comment.
pub fn is_go_build(line: &str) -> bool {
  match line.strip_prefix("//go:build") {
    Some(rest) => rest.is_empty() || rest.starts_with(|c: char| c == ' ' || c == '\t'),
    None => false,
  }
}

/// Reports whether `line` is a legacy `// +build` comment.
pub fn is_plus_build(line: &str) -> bool {
  match line.strip_prefix("//") {
    Some(rest) => rest.split_whitespace().next() == Some("+build"),
    None => false,
  }
}

fn is_valid_tag(tag: &str) -> bool {
  !tag.is_empty() && tag.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

/// Parse a `//go:build` line.
pub fn parse_go_build(line: &str) -> Result<Expr, ConstraintError> {
  let text = line
    .trim()
    .strip_prefix("//go:build")
    .ok_or_else(|| error("not a //go:build line"))?;

  let tokens = tokenize(text)?;
  if tokens.is_empty() {
    return Err(error("empty //go:build expression"));
  }

  let mut parser = ExprParser { tokens, pos: 0 };
  let expr = parser.parse_or()?;

  if let Some(token) = parser.tokens.get(parser.pos) {
    return Err(error(format!("unexpected {} in //go:build line", token)));
  }

  Ok(expr)
}

/// Parse a `// +build` line: space-separated alternatives of comma-separated terms.
pub fn parse_plus_build(line: &str) -> Result<Expr, ConstraintError> {
  let text = line
    .trim()
    .strip_prefix("//")
    .map(str::trim_start)
    .and_then(|rest| rest.strip_prefix("+build"))
    .ok_or_else(|| error("not a +build line"))?;

  let mut result: Option<Expr> = None;

  for clause in text.split_whitespace() {
    let mut conj: Option<Expr> = None;

    for term in clause.split(',') {
      let (negated, tag) = match term.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, term),
      };

      if tag.starts_with('!') || !is_valid_tag(tag) {
        return Err(error(format!("invalid term '{}' in +build line", term)));
      }

      let atom = Expr::Tag(tag.to_string());
      let atom = if negated { Expr::Not(Box::new(atom)) } else { atom };
      conj = Some(Expr::and(conj, atom));
    }

    if let Some(conj) = conj {
      result = Some(Expr::or(result, conj));
    }
  }

  // A bare `// +build` line never matches.
  Ok(result.unwrap_or_else(|| Expr::Tag("ignore".to_string())))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
  Tag(String),
  Not,
  And,
  Or,
  LParen,
  RParen,
}

impl fmt::Display for Token {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      Token::Tag(tag) => write!(f, "tag '{}'", tag),
      Token::Not => write!(f, "'!'"),
      Token::And => write!(f, "'&&'"),
      Token::Or => write!(f, "'||'"),
      Token::LParen => write!(f, "'('"),
      Token::RParen => write!(f, "')'"),
    }
  }
}

fn tokenize(text: &str) -> Result<Vec<Token>, ConstraintError> {
  let mut tokens = Vec::new();
  let mut chars = text.char_indices().peekable();

  while let Some((start, c)) = chars.next() {
    match c {
      ' ' | '\t' => {},
      '(' => tokens.push(Token::LParen),
      ')' => tokens.push(Token::RParen),
      '!' => tokens.push(Token::Not),
      '&' | '|' => match chars.next() {
        Some((_, next)) if next == c => tokens.push(if c == '&' { Token::And } else { Token::Or }),
        _ => return Err(error(format!("expected '{0}{0}'", c))),
      },
      c if c.is_alphanumeric() || c == '_' || c == '.' => {
        let mut end = start + c.len_utf8();
        while let Some(&(idx, next)) = chars.peek() {
          if next.is_alphanumeric() || next == '_' || next == '.' {
            end = idx + next.len_utf8();
            chars.next();
          } else {
            break;
          }
        }
        tokens.push(Token::Tag(text[start..end].to_string()));
      },
      other => return Err(error(format!("unexpected character '{}'", other))),
    }
  }

  Ok(tokens)
}

struct ExprParser {
  tokens: Vec<Token>,
  pos: usize,
}

impl ExprParser {
  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn parse_or(&mut self) -> Result<Expr, ConstraintError> {
    let mut lhs = self.parse_and()?;
    while self.peek() == Some(&Token::Or) {
      self.pos += 1;
      let rhs = self.parse_and()?;
      lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
  }

  fn parse_and(&mut self) -> Result<Expr, ConstraintError> {
    let mut lhs = self.parse_not()?;
    while self.peek() == Some(&Token::And) {
      self.pos += 1;
      let rhs = self.parse_not()?;
      lhs = Expr::And(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
  }

  fn parse_not(&mut self) -> Result<Expr, ConstraintError> {
    if self.peek() == Some(&Token::Not) {
      self.pos += 1;
      let inner = self.parse_not()?;
      return Ok(Expr::Not(Box::new(inner)));
    }
    self.parse_atom()
  }

  fn parse_atom(&mut self) -> Result<Expr, ConstraintError> {
    let token = self.tokens.get(self.pos).cloned();
    self.pos += 1;

    match token {
      Some(Token::Tag(tag)) => Ok(Expr::Tag(tag)),
      Some(Token::LParen) => {
        let inner = self.parse_or()?;
        if self.peek() != Some(&Token::RParen) {
          return Err(error("missing ')'"));
        }
        self.pos += 1;
        Ok(inner)
      },
      Some(other) => Err(error(format!("unexpected {}", other))),
      None => Err(error("unexpected end of expression")),
    }
  }
}
