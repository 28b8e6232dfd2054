//! Runtime identity resolution from the container environment.
//!
//! `PUID`, `PGID`, and `UMASK` select the account the server runs as; unset
//! or empty variables fall back to the documented defaults, and malformed
//! values abort startup before any system state is touched.

use std::path::PathBuf;

use homefin_common::constants::{
    DEFAULT_CONFIG_PATH, DEFAULT_GID, DEFAULT_UID, DEFAULT_UMASK, ENV_CONFIG_PATH, ENV_PGID,
    ENV_PUID, ENV_UMASK,
};
use homefin_common::error::{HomefinError, Result};

/// The (uid, gid, umask) triple the server process will run under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeIdentity {
    /// Numeric user id for the runtime account.
    pub uid: u32,
    /// Numeric group id for the runtime account.
    pub gid: u32,
    /// File-creation mask applied before the exec.
    pub umask: u32,
}

impl RuntimeIdentity {
    /// Resolves the identity from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a set variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::resolve(|name| std::env::var(name).ok())
    }

    /// Resolves the identity through `lookup`, which plays the role of the
    /// environment. Unset (`None`) and empty values fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when a present, non-empty value does not parse as a
    /// decimal id or an octal mask.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            uid: parse_id(ENV_PUID, lookup(ENV_PUID), DEFAULT_UID)?,
            gid: parse_id(ENV_PGID, lookup(ENV_PGID), DEFAULT_GID)?,
            umask: parse_umask(lookup(ENV_UMASK))?,
        })
    }
}

/// Resolves the server configuration path from `lookup`; unset or empty
/// falls back to the bundled sample configuration.
pub fn resolve_config_path(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    match lookup(ENV_CONFIG_PATH) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

fn parse_id(name: &str, value: Option<String>, default: u32) -> Result<u32> {
    match value {
        None => Ok(default),
        Some(raw) if raw.is_empty() => Ok(default),
        Some(raw) => raw.parse().map_err(|_| HomefinError::Config {
            message: format!("{name} must be a numeric id, got {raw:?}"),
        }),
    }
}

fn parse_umask(value: Option<String>) -> Result<u32> {
    match value {
        None => Ok(DEFAULT_UMASK),
        Some(raw) if raw.is_empty() => Ok(DEFAULT_UMASK),
        Some(raw) => u32::from_str_radix(&raw, 8).map_err(|_| HomefinError::Config {
            message: format!("UMASK must be an octal mask, got {raw:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        let identity = RuntimeIdentity::resolve(|_| None).expect("resolve");
        assert_eq!(
            identity,
            RuntimeIdentity {
                uid: 1000,
                gid: 1000,
                umask: 0o022,
            }
        );
    }

    #[test]
    fn empty_variables_fall_back_to_defaults() {
        let lookup = env_of(&[("PUID", ""), ("PGID", ""), ("UMASK", "")]);
        let identity = RuntimeIdentity::resolve(lookup).expect("resolve");
        assert_eq!(identity.uid, 1000);
        assert_eq!(identity.gid, 1000);
        assert_eq!(identity.umask, 0o022);
    }

    #[test]
    fn set_variables_override_defaults() {
        let lookup = env_of(&[("PUID", "2000"), ("PGID", "2000"), ("UMASK", "027")]);
        let identity = RuntimeIdentity::resolve(lookup).expect("resolve");
        assert_eq!(
            identity,
            RuntimeIdentity {
                uid: 2000,
                gid: 2000,
                umask: 0o027,
            }
        );
    }

    #[test]
    fn malformed_ids_are_rejected() {
        let err = RuntimeIdentity::resolve(env_of(&[("PUID", "abc")]))
            .expect_err("must reject non-numeric uid");
        assert!(err.to_string().contains("PUID"));

        let err = RuntimeIdentity::resolve(env_of(&[("PGID", "-5")]))
            .expect_err("must reject negative gid");
        assert!(err.to_string().contains("PGID"));
    }

    #[test]
    fn malformed_umask_is_rejected() {
        let err = RuntimeIdentity::resolve(env_of(&[("UMASK", "9f")]))
            .expect_err("must reject non-octal mask");
        assert!(err.to_string().contains("UMASK"));
    }

    #[test]
    fn config_path_defaults_to_the_sample() {
        assert_eq!(
            resolve_config_path(|_| None),
            PathBuf::from("sample/config.yaml")
        );
        assert_eq!(
            resolve_config_path(env_of(&[("CONFIG_PATH", "")])),
            PathBuf::from("sample/config.yaml")
        );
    }

    #[test]
    fn config_path_honors_the_environment() {
        assert_eq!(
            resolve_config_path(env_of(&[("CONFIG_PATH", "/data/myconf.yaml")])),
            PathBuf::from("/data/myconf.yaml")
        );
    }
}
