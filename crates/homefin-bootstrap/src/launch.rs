//! Privilege drop and hand-off to the server binary.
//!
//! The exec is one-way: on success the entrypoint process is replaced in
//! place, the server inherits PID 1 duties, and the container's exit code
//! becomes the server's.

use std::convert::Infallible;
use std::ffi::CString;
use std::path::Path;

use homefin_common::constants::SERVER_BIN_NAME;
use homefin_common::error::{HomefinError, Result};

use crate::identity::RuntimeIdentity;

/// Applies the file-creation mask to this process. The mask is a process
/// attribute, so it survives the exec into the server.
#[cfg(target_os = "linux")]
pub fn apply_umask(mask: u32) {
    let _ = nix::sys::stat::umask(nix::sys::stat::Mode::from_bits_truncate(mask));
}

/// Applies the file-creation mask to this process. No-op off Linux.
#[cfg(not(target_os = "linux"))]
pub fn apply_umask(_mask: u32) {}

/// Builds the argv the entrypoint hands off to.
#[must_use]
pub fn server_command(config_path: &Path) -> Vec<String> {
    vec![
        SERVER_BIN_NAME.to_owned(),
        "--config".to_owned(),
        config_path.display().to_string(),
    ]
}

/// Switches to the runtime identity and replaces this process with
/// `command`, resolved through `PATH`.
///
/// # Errors
///
/// Returns an error when an argument contains a NUL byte, a privilege
/// transition is refused, or the exec itself fails. On success this
/// function does not return.
#[cfg(target_os = "linux")]
pub fn exec_as(identity: &RuntimeIdentity, command: &[String]) -> Result<Infallible> {
    use nix::unistd::{Gid, Uid, execvp, setgid, setgroups, setuid};

    let argv = to_cstrings(command)?;
    let program = argv.first().ok_or_else(|| HomefinError::Config {
        message: "exec command is empty".into(),
    })?;

    let gid = Gid::from_raw(identity.gid);
    let uid = Uid::from_raw(identity.uid);

    // Supplementary groups and gid must change before uid; after setuid
    // the process may no longer alter either.
    setgroups(&[gid]).map_err(|errno| privilege_error("setgroups", errno))?;
    setgid(gid).map_err(|errno| privilege_error("setgid", errno))?;
    setuid(uid).map_err(|errno| privilege_error("setuid", errno))?;

    tracing::info!(
        uid = identity.uid,
        gid = identity.gid,
        command = %command.join(" "),
        "replacing process with the server"
    );
    execvp(program, &argv).map_err(|errno| HomefinError::Privilege {
        message: format!("execvp {:?} failed: {errno}", command[0]),
    })
}

/// Switches to the runtime identity and replaces this process with
/// `command`. Only implemented on Linux.
///
/// # Errors
///
/// Always returns `Unsupported` off Linux (after validating the argv).
#[cfg(not(target_os = "linux"))]
pub fn exec_as(_identity: &RuntimeIdentity, command: &[String]) -> Result<Infallible> {
    let _ = to_cstrings(command)?;
    Err(HomefinError::Unsupported {
        message: "privilege drop and exec are only implemented on Linux".into(),
    })
}

#[cfg(target_os = "linux")]
fn privilege_error(call: &str, errno: nix::errno::Errno) -> HomefinError {
    HomefinError::Privilege {
        message: format!("{call} failed: {errno}"),
    }
}

fn to_cstrings(command: &[String]) -> Result<Vec<CString>> {
    command
        .iter()
        .map(|arg| {
            CString::new(arg.as_str()).map_err(|_| HomefinError::Config {
                message: format!("argument {arg:?} contains a NUL byte"),
            })
        })
        .collect()
}
