use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used across the library.
pub type Result<T> = std::result::Result<T, BindError>;

/// Everything that can abort a bind.
///
/// Version parsing has no variant here: it accepts any directory name and
/// never fails.
#[derive(Debug, Error)]
pub enum BindError {
    /// The bundled interpreter is missing or its resolved filename carries no version.
    #[error("could not determine python version for {}", path.display())]
    InterpreterNotFound { path: PathBuf },

    /// One of the tool directories is absent from the installation tree.
    #[error("tool directory {} does not exist", path.display())]
    DirectoryNotFound { path: PathBuf },

    /// No requirement on the interpreter package was declared.
    #[error("package {package} declares no requirement on {dependency}")]
    MissingDependencyDeclaration { package: String, dependency: String },

    /// A variant with the same name and version is already registered.
    #[error("package {name}-{version} is already registered at {}", path.display())]
    PackageExists { name: String, version: String, path: PathBuf },

    /// The name or version cannot be used as a directory in the repository.
    #[error("cannot register {name}-{version}: {reason}")]
    InvalidPackagePath { name: String, version: String, reason: String },

    /// The registry refused the descriptor.
    #[error("registry error: {0}")]
    Registry(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize package definition: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("failed to parse {}: {source}", path.display())]
    TomlDeserialize {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

impl BindError {
    /// Wraps an [`std::io::Error`] with the path it happened on.
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        BindError::Io {
            path: path.into(),
            source,
        }
    }
}
