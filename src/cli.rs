use std::path::PathBuf;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct CLI {
    /// Increase log output (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,
    /// Use this config file instead of the default `hbind.toml`
    #[clap(long, global = true, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,
    #[command(subcommand)]
    pub(crate) command: HbindCommand,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum HbindCommand {
    /// Registers an existing Houdini installation as a package
    Bind {
        /// The Houdini installation ($HFS), e.g. `/opt/hfs19.5.493`
        #[clap(value_name = "PATH")]
        hfs: PathBuf,
        /// Only use the major.minor version number
        #[clap(long, conflicts_with = "full_version")]
        major_minor_only: bool,
        /// Keep the full version even when the config truncates it
        #[clap(long)]
        full_version: bool,
        /// Register under this package name
        #[clap(long)]
        name: Option<String>,
        /// Package repository to register in
        #[clap(long, value_name = "DIR")]
        packages_path: Option<PathBuf>,
        /// Replace the version if it is already registered
        #[clap(long)]
        force: bool,
    },
    /// Shows the package that would be registered, without registering it
    Inspect {
        /// The Houdini installation ($HFS)
        #[clap(value_name = "PATH")]
        hfs: PathBuf,
        /// Only use the major.minor version number
        #[clap(long, conflicts_with = "full_version")]
        major_minor_only: bool,
        /// Keep the full version even when the config truncates it
        #[clap(long)]
        full_version: bool,
        /// Print JSON instead of TOML
        #[clap(long)]
        json: bool,
    },
    /// Lists registered versions
    List {
        /// Only list this package. Defaults to all
        #[clap(long)]
        name: Option<String>,
        /// Package repository to read
        #[clap(long, value_name = "DIR")]
        packages_path: Option<PathBuf>,
    },
    /// Manage `hbind.toml`
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum ConfigCommand {
    /// Writes a config file with default values
    Init {
        /// Overwrite an existing file
        #[clap(long)]
        force: bool,
    },
    /// Prints the effective configuration
    Show,
}

/// Collapses the paired version flags into an override of the config value.
pub fn version_override(major_minor_only: bool, full_version: bool) -> Option<bool> {
    match (major_minor_only, full_version) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
