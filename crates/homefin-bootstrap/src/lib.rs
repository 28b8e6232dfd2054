//! Container bootstrap for the homefin server.
//!
//! Startup is a strictly linear sequence: resolve the runtime identity from
//! `PUID`/`PGID`/`UMASK`, reconcile the `abc` account, apply the umask,
//! re-own the mounted data directory (best effort), then drop privileges
//! and exec `homefin-server`. The entrypoint never supervises the server;
//! the exec replaces it entirely.

pub mod accounts;
pub mod identity;
pub mod launch;
pub mod ownership;

pub use accounts::{Accounts, SystemAccounts, ensure_runtime_account};
pub use identity::{RuntimeIdentity, resolve_config_path};
pub use ownership::{OwnershipReport, reown_tree};
