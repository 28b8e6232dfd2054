//! Server configuration model loaded from a YAML file.
//!
//! Relative paths inside the file (database, web UI directory) resolve
//! against the directory containing the file itself, so a config shipped
//! next to its data keeps working regardless of the process working
//! directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{HomefinError, Result};

/// Root configuration for the homefin server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database location.
    pub database: DatabaseConfig,
    /// Listen address and static asset settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Map of username to plaintext password; synced into the store at startup.
    #[serde(default)]
    pub allowed_users: BTreeMap<String, String>,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the server binds.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port the server binds.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the static web UI.
    #[serde(default = "default_webgui_dir")]
    pub webgui_dir: PathBuf,
}

fn default_host() -> String {
    constants::DEFAULT_HOST.to_owned()
}

const fn default_port() -> u16 {
    constants::DEFAULT_PORT
}

fn default_webgui_dir() -> PathBuf {
    PathBuf::from(constants::DEFAULT_WEBGUI_DIR)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webgui_dir: default_webgui_dir(),
        }
    }
}

impl Config {
    /// Loads and validates a configuration file.
    ///
    /// After loading, `database.path` and `server.webgui_dir` are absolute
    /// with respect to the file's parent directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read, is not valid YAML,
    /// or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| HomefinError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_yaml::from_str(&raw)?;
        config.validate()?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.database.path = resolve(base, &config.database.path);
        config.server.webgui_dir = resolve(base, &config.server.webgui_dir);

        tracing::debug!(
            database = %config.database.path.display(),
            users = config.allowed_users.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(HomefinError::Config {
                message: "database.path must not be empty".into(),
            });
        }
        if self.server.port == 0 {
            return Err(HomefinError::Config {
                message: "server.port must be between 1 and 65535".into(),
            });
        }
        if self.allowed_users.is_empty() {
            return Err(HomefinError::Config {
                message: "at least one user must be configured in allowed_users".into(),
            });
        }
        Ok(())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&path).expect("create config");
        file.write_all(contents.as_bytes()).expect("write config");
        path
    }

    #[test]
    fn loads_full_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(
            dir.path(),
            "database:\n  path: db/test.sqlite3\nserver:\n  host: 127.0.0.1\n  port: 9000\nallowed_users:\n  admin: secret\n",
        );

        let config = Config::load(&path).expect("load");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.path, dir.path().join("db/test.sqlite3"));
        assert_eq!(config.allowed_users.get("admin").map(String::as_str), Some("secret"));
    }

    #[test]
    fn server_section_is_optional() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(
            dir.path(),
            "database:\n  path: test.sqlite3\nallowed_users:\n  admin: secret\n",
        );

        let config = Config::load(&path).expect("load");
        assert_eq!(config.server.host, constants::DEFAULT_HOST);
        assert_eq!(config.server.port, constants::DEFAULT_PORT);
        assert_eq!(
            config.server.webgui_dir,
            dir.path().join(constants::DEFAULT_WEBGUI_DIR)
        );
    }

    #[test]
    fn absolute_database_path_is_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(
            dir.path(),
            "database:\n  path: /var/lib/homefin/db.sqlite3\nallowed_users:\n  admin: secret\n",
        );

        let config = Config::load(&path).expect("load");
        assert_eq!(
            config.database.path,
            PathBuf::from("/var/lib/homefin/db.sqlite3")
        );
    }

    #[test]
    fn rejects_empty_allowed_users() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(dir.path(), "database:\n  path: test.sqlite3\n");

        let err = Config::load(&path).expect_err("must fail");
        assert!(err.to_string().contains("allowed_users"));
    }

    #[test]
    fn rejects_port_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(
            dir.path(),
            "database:\n  path: test.sqlite3\nserver:\n  port: 0\nallowed_users:\n  admin: secret\n",
        );

        let err = Config::load(&path).expect_err("must fail");
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::load(Path::new("/nonexistent/config.yaml")).expect_err("must fail");
        assert!(matches!(err, HomefinError::Io { .. }));
    }
}
