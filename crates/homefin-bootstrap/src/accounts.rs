//! Idempotent provisioning of the `abc` runtime account.
//!
//! The account database is reconciled, not blindly mutated: existing
//! entries are kept (a warning notes id mismatches), and creation only
//! happens when the name is absent. Creation goes through the platform's
//! account tools, preferring shadow-utils and falling back to the busybox
//! applets found on Alpine-style images.

use std::path::Path;

use homefin_common::constants::{RUNTIME_GROUP, RUNTIME_HOME, RUNTIME_USER};
use homefin_common::error::{HomefinError, Result};

use crate::identity::RuntimeIdentity;

/// Shell assigned to the runtime user so it cannot log in.
const NOLOGIN_SHELL: &str = "/bin/false";

/// Access to the operating system account database.
///
/// The production implementation consults `getgrnam`/`getpwnam` and shells
/// out to the account tools; tests substitute an in-memory fake.
pub trait Accounts {
    /// Returns the gid of the named group, if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be read.
    fn group_by_name(&self, name: &str) -> Result<Option<u32>>;

    /// Returns the uid of the named user, if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be read.
    fn user_by_name(&self, name: &str) -> Result<Option<u32>>;

    /// Creates a group with the given gid.
    ///
    /// # Errors
    ///
    /// Returns an error when creation fails.
    fn create_group(&mut self, name: &str, gid: u32) -> Result<()>;

    /// Creates a no-login user with the given uid, primary group, and home.
    ///
    /// # Errors
    ///
    /// Returns an error when creation fails.
    fn create_user(&mut self, name: &str, uid: u32, group: &str, home: &Path) -> Result<()>;
}

/// Ensures the `abc` group and user exist for the resolved identity.
///
/// Missing entries are created; present ones are left untouched, with a
/// warning when their ids differ from the requested ones.
///
/// # Errors
///
/// Returns an error when the account database cannot be read or an entry
/// cannot be created. Creation failure is fatal to startup.
pub fn ensure_runtime_account(
    accounts: &mut impl Accounts,
    identity: &RuntimeIdentity,
) -> Result<()> {
    match accounts.group_by_name(RUNTIME_GROUP)? {
        Some(gid) if gid == identity.gid => {
            tracing::debug!(group = RUNTIME_GROUP, gid, "group already present");
        }
        Some(gid) => {
            tracing::warn!(
                group = RUNTIME_GROUP,
                wanted = identity.gid,
                found = gid,
                "group exists with a different gid; keeping the existing entry"
            );
        }
        None => {
            accounts.create_group(RUNTIME_GROUP, identity.gid)?;
            tracing::info!(group = RUNTIME_GROUP, gid = identity.gid, "created group");
        }
    }

    match accounts.user_by_name(RUNTIME_USER)? {
        Some(uid) if uid == identity.uid => {
            tracing::debug!(user = RUNTIME_USER, uid, "user already present");
        }
        Some(uid) => {
            tracing::warn!(
                user = RUNTIME_USER,
                wanted = identity.uid,
                found = uid,
                "user exists with a different uid; keeping the existing entry"
            );
        }
        None => {
            accounts.create_user(
                RUNTIME_USER,
                identity.uid,
                RUNTIME_GROUP,
                Path::new(RUNTIME_HOME),
            )?;
            tracing::info!(user = RUNTIME_USER, uid = identity.uid, "created user");
        }
    }

    Ok(())
}

/// [`Accounts`] backed by the real account database and tools.
#[derive(Debug, Default)]
pub struct SystemAccounts;

impl Accounts for SystemAccounts {
    fn group_by_name(&self, name: &str) -> Result<Option<u32>> {
        let group = nix::unistd::Group::from_name(name).map_err(|errno| HomefinError::Account {
            message: format!("reading group database for {name:?}: {errno}"),
        })?;
        Ok(group.map(|g| g.gid.as_raw()))
    }

    fn user_by_name(&self, name: &str) -> Result<Option<u32>> {
        let user = nix::unistd::User::from_name(name).map_err(|errno| HomefinError::Account {
            message: format!("reading user database for {name:?}: {errno}"),
        })?;
        Ok(user.map(|u| u.uid.as_raw()))
    }

    #[cfg(target_os = "linux")]
    fn create_group(&mut self, name: &str, gid: u32) -> Result<()> {
        if let Ok(tool) = which::which("groupadd") {
            run_tool(&tool, &["-g", &gid.to_string(), name])
        } else if let Ok(tool) = which::which("addgroup") {
            run_tool(&tool, &["-g", &gid.to_string(), name])
        } else {
            Err(HomefinError::NotFound {
                kind: "account tool",
                id: "groupadd or addgroup".into(),
            })
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn create_group(&mut self, _name: &str, _gid: u32) -> Result<()> {
        Err(HomefinError::Unsupported {
            message: "group creation is only implemented on Linux".into(),
        })
    }

    #[cfg(target_os = "linux")]
    fn create_user(&mut self, name: &str, uid: u32, group: &str, home: &Path) -> Result<()> {
        let home = home.display().to_string();
        if let Ok(tool) = which::which("useradd") {
            run_tool(
                &tool,
                &[
                    "-u",
                    &uid.to_string(),
                    "-g",
                    group,
                    "-d",
                    &home,
                    "-s",
                    NOLOGIN_SHELL,
                    "-M",
                    name,
                ],
            )
        } else if let Ok(tool) = which::which("adduser") {
            run_tool(
                &tool,
                &[
                    "-D",
                    "-H",
                    "-u",
                    &uid.to_string(),
                    "-G",
                    group,
                    "-h",
                    &home,
                    "-s",
                    NOLOGIN_SHELL,
                    name,
                ],
            )
        } else {
            Err(HomefinError::NotFound {
                kind: "account tool",
                id: "useradd or adduser".into(),
            })
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn create_user(&mut self, _name: &str, _uid: u32, _group: &str, _home: &Path) -> Result<()> {
        Err(HomefinError::Unsupported {
            message: "user creation is only implemented on Linux".into(),
        })
    }
}

#[cfg(target_os = "linux")]
fn run_tool(tool: &Path, args: &[&str]) -> Result<()> {
    let output = std::process::Command::new(tool)
        .args(args)
        .output()
        .map_err(|e| HomefinError::Io {
            path: tool.to_path_buf(),
            source: e,
        })?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(HomefinError::Account {
            message: format!(
                "{} {} exited with {}: {}",
                tool.display(),
                args.join(" "),
                output.status,
                stderr.trim()
            ),
        })
    }
}
