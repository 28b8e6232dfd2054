//! Container entrypoint binary.
//!
//! Runs the linear bootstrap sequence and ends by exec'ing
//! `homefin-server`; on success this process ceases to exist.

use std::path::Path;

use homefin_bootstrap::accounts::{SystemAccounts, ensure_runtime_account};
use homefin_bootstrap::identity::{RuntimeIdentity, resolve_config_path};
use homefin_bootstrap::{launch, ownership};
use homefin_common::constants::DATA_DIR;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let identity = RuntimeIdentity::from_env()?;
    let mask = format!("{:03o}", identity.umask);
    tracing::info!(
        uid = identity.uid,
        gid = identity.gid,
        umask = %mask,
        "resolved runtime identity"
    );

    let mut accounts = SystemAccounts;
    ensure_runtime_account(&mut accounts, &identity)?;

    launch::apply_umask(identity.umask);

    let report = ownership::reown_tree(Path::new(DATA_DIR), identity.uid, identity.gid);
    if report.is_clean() {
        tracing::info!(changed = report.changed, "data directory ownership applied");
    } else {
        tracing::warn!(
            changed = report.changed,
            failed = report.failures.len(),
            "data directory ownership applied partially; continuing"
        );
        for (path, error) in &report.failures {
            tracing::debug!(path = %path.display(), %error, "ownership change failed");
        }
    }

    let config_path = resolve_config_path(|name| std::env::var(name).ok());
    let command = launch::server_command(&config_path);
    match launch::exec_as(&identity, &command)? {}
}
