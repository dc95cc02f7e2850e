use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use hbind::config::{default_config_path, Config};
use hbind::{bind, describe, LocalRepository};
use crate::cli::{version_override, ConfigCommand, HbindCommand, CLI};

pub fn execute(cli: CLI) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    match cli.command {
        HbindCommand::Bind { hfs, major_minor_only, full_version, name, packages_path, force } => {
            let config = Config::load_or_default(&config_path)?;
            let truncate = version_override(major_minor_only, full_version);
            execute_bind(&config, &hfs, truncate, name, packages_path, force)
        }
        HbindCommand::Inspect { hfs, major_minor_only, full_version, json } => {
            let config = Config::load_or_default(&config_path)?;
            let truncate = version_override(major_minor_only, full_version);
            execute_inspect(&config, &hfs, truncate, json)
        }
        HbindCommand::List { name, packages_path } => {
            let config = Config::load_or_default(&config_path)?;
            execute_list(&config, name, packages_path)
        }
        HbindCommand::Config { action } => {
            execute_config(&config_path, action)
        }
    }
}

pub fn execute_bind(
    config: &Config,
    hfs: &Path,
    major_minor_only: Option<bool>,
    name: Option<String>,
    packages_path: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let mut options = config.bind_options();
    if let Some(major_minor_only) = major_minor_only {
        options.major_minor_only = major_minor_only;
    }
    if let Some(name) = name {
        options.package_name = name;
    }
    let packages_path = match packages_path {
        Some(path) => path,
        None => config.packages_path()?,
    };

    let repo = LocalRepository::new(packages_path).force(force);
    let outcome = bind(hfs, &options, &repo)
        .with_context(|| format!("Failed to bind {}", hfs.display()))?;

    let descriptor = &outcome.descriptor;
    println!(
        "{} {}-{}",
        "Bound".green().bold(),
        descriptor.name(),
        descriptor.version()
    );
    println!("  requires: {}", descriptor.requires());
    println!("  tools:    {}", descriptor.tools().join(" "));
    for variant in &outcome.installed {
        println!("  installed: {}", variant.root.display());
    }
    Ok(())
}

pub fn execute_inspect(
    config: &Config,
    hfs: &Path,
    major_minor_only: Option<bool>,
    json: bool,
) -> Result<()> {
    let mut options = config.bind_options();
    if let Some(major_minor_only) = major_minor_only {
        options.major_minor_only = major_minor_only;
    }

    let descriptor = describe(hfs, &options)
        .with_context(|| format!("Failed to inspect {}", hfs.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
    } else {
        print!("{}", descriptor.to_toml()?);
    }
    Ok(())
}

pub fn execute_list(config: &Config, name: Option<String>, packages_path: Option<PathBuf>) -> Result<()> {
    let packages_path = match packages_path {
        Some(path) => path,
        None => config.packages_path()?,
    };
    let repo = LocalRepository::new(packages_path);
    let names = match name {
        Some(name) => vec![name],
        None => repo.packages()?,
    };

    let mut found = false;
    for name in &names {
        for version in repo.list(name)? {
            println!("{name}-{version}");
            found = true;
        }
    }
    if !found {
        println!("No packages registered in {}", repo.root().display());
    }
    Ok(())
}

pub fn execute_config(config_path: &Path, action: ConfigCommand) -> Result<()> {
    match action {
        ConfigCommand::Init { force } => {
            if config_path.exists() && !force {
                bail!("{} already exists. Use --force to overwrite it.", config_path.display());
            }
            Config::default().save(config_path)?;
            println!("{} {}", "Created".green().bold(), config_path.display());
        }
        ConfigCommand::Show => {
            let config = Config::load_or_default(config_path)?;
            println!("# {}", config_path.display());
            print!("{}", toml::to_string_pretty(&config)?);
            if let Ok(packages_path) = config.packages_path() {
                println!("# packages_path resolves to {}", packages_path.display());
            }
        }
    }
    Ok(())
}
