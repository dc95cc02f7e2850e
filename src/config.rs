use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use crate::bind::{BindOptions, DEFAULT_DESCRIPTION, DEFAULT_PACKAGE_NAME, DEFAULT_PYTHON_PACKAGE};

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE: &str = "hbind.toml";

/// Contents of `hbind.toml`. Every field is optional in the file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Name the bound package is registered under.
    pub package_name: String,
    /// Repository to register packages in; defaults to `<data dir>/packages`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages_path: Option<PathBuf>,
    /// Name of the interpreter package the bound package requires.
    pub python_package: String,
    pub description: String,
    /// Register `{major}.{minor}` versions unless the command line says otherwise.
    pub major_minor_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            package_name: DEFAULT_PACKAGE_NAME.to_string(),
            packages_path: None,
            python_package: DEFAULT_PYTHON_PACKAGE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            major_minor_only: false,
        }
    }
}

impl Config {
    /// Loads a config file.
    ///
    /// # Errors
    /// Returns an error if the file can't be read or deserialized.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Loads a config file, falling back to defaults when it does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Config> {
        if path.as_ref().exists() {
            Config::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Saves the config in pretty TOML format, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create config dir {}", parent.display()))?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// The configured repository, or the default one in the data directory.
    pub fn packages_path(&self) -> Result<PathBuf> {
        match &self.packages_path {
            Some(path) => Ok(path.clone()),
            None => Ok(get_global_data_dir()?.join("packages")),
        }
    }

    /// Bind options for this config.
    pub fn bind_options(&self) -> BindOptions {
        BindOptions {
            package_name: self.package_name.clone(),
            major_minor_only: self.major_minor_only,
            python_package: self.python_package.clone(),
            description: self.description.clone(),
        }
    }
}

/// Default location of `hbind.toml`.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_global_config_dir()?.join(CONFIG_FILE))
}

pub fn get_global_config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

pub fn get_global_data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("org", "hbind", "hbind")
        .ok_or_else(|| anyhow!("Could not get project directories"))
}
