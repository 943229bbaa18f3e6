//! Reading just enough of a Go source file to plan a build: the package
//! clause, the import declarations and the build constraints.

pub mod constraint;
pub mod matcher;
pub mod scanner;

pub use constraint::{parse_go_build, parse_plus_build, ConstraintError, Expr};
pub use matcher::TagMatcher;
pub use scanner::{scan_constraints, scan_header, ConstraintLine, ConstraintLines, FileHeader, ImportSpec, ScanError};
