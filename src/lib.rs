//! # hbind Core Library
//!
//! This crate contains the logic behind the `hbind` tool, which registers an existing
//! Houdini installation as a package in a local package repository without copying it.
//!
//! Binding reads three facts from the installation tree: the version encoded in the
//! directory name (`hfs19.5.493`), the bundled Python `{major}.{minor}`, and the
//! user-facing executables in `bin/` and `houdini/sbin/`. These are combined into a
//! [`PackageDescriptor`] and handed to a [`PackageRegistry`].
//!
//! ## Modules Overview
//! - [`version`] – Version from the installation directory name
//! - [`interpreter`] – Bundled Python version detection
//! - [`tools`] – Executable discovery
//! - [`package`] – Package descriptors and requirements
//! - [`environment`] – Environment setup hooks and their shell rendering
//! - [`registry`] – Registry interface and the local filesystem repository
//! - [`link`] – Linking package roots to the installation
//! - [`bind`] – The bind itself
//! - [`config`] – `hbind.toml` and global directories
//! - [`logging`] – tracing subscriber setup
//! - [`util`] – Variant and version helpers


pub mod error;
pub mod version;
pub mod interpreter;
pub mod tools;
pub mod package;
pub mod environment;
pub mod registry;
pub mod link;
pub mod bind;
pub mod config;
pub mod logging;
pub mod util;

pub use error::*;
pub use version::*;
pub use interpreter::*;
pub use tools::*;
pub use package::*;
pub use environment::{EnvOp, EnvironmentHooks, render_posix};
pub use registry::*;
pub use link::*;
pub use bind::*;
pub use config::Config;
pub use util::*;
