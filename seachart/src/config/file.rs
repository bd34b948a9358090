//! Configuration file handling for ~/.seachart/config.ini.
//!
//! Settings structs live in [`super::settings`], defaults in
//! [`super::defaults`], parsing in [`super::parser`], and serialization in
//! [`super::writer`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::defaults::CONFIG_DIR_NAME;
use super::settings::ConfigFile;

/// Errors reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A setting is present but unusable.
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Settings from `~/.seachart/config.ini`, or defaults when it is absent.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Settings from `path`, or defaults when it is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        match Ini::load_from_file(path) {
            Ok(ini) => super::parser::parse_ini(&ini),
            Err(ini::Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigFileError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write the annotated INI form to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        let write_error = |source| ConfigFileError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(path, self.to_ini_string()).map_err(write_error)
    }

    /// Render the configuration as commented INI text.
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }
}

/// Get the path to the config directory (~/.seachart).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Get the path to the config file (~/.seachart/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PRELOAD_LIMIT;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("nonexistent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.viewport.preload_limit, DEFAULT_PRELOAD_LIMIT);
    }

    #[test]
    fn test_load_invalid_value() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[tier1]\npayload_encoding = zstd\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("tier1.payload_encoding"));
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");
        ConfigFile::default().save_to(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unreadable_path_is_read_error() {
        let temp = TempDir::new().unwrap();
        let err = ConfigFile::load_from(temp.path()).unwrap_err();
        assert!(matches!(err, ConfigFileError::Read { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_save_into_file_parent_is_write_error() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let err = ConfigFile::default()
            .save_to(&blocker.join("config.ini"))
            .unwrap_err();
        assert!(matches!(err, ConfigFileError::Write { .. }));
    }

    #[test]
    fn test_config_paths() {
        assert!(config_file_path().starts_with(config_directory()));
        assert!(config_directory().ends_with(CONFIG_DIR_NAME));
    }
}
