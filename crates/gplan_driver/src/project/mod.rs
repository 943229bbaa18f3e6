//! Project discovery, loading, and resolution.
//!
//! This module provides functionality to:
//! - Find `gplan.toml` by searching upward from the input package
//! - Parse the TOML configuration
//! - Layer command line values, the TOML file and the environment
//! - Validate the target platform and GOROOT
//!
//! # Example
//!
//! ```ignore
//! use gplan_driver::project::{discover_project, resolve_settings, CliOverrides};
//!
//! let cwd = std::env::current_dir()?;
//! let project = discover_project(&input, None)?;
//! let settings = resolve_settings(&input, project, &CliOverrides::default(), BuildEnv::from_env(), &cwd)?;
//! println!("building for {}", settings.env.platform());
//! ```

pub mod config;
pub mod errors;
pub mod find;
pub mod resolve;

pub use config::ProjectToml;
pub use errors::ProjectError;
pub use find::{discover_project, find_project_root, load_project_toml, PROJECT_FILE};
pub use resolve::{resolve_settings, CliOverrides, Settings};
