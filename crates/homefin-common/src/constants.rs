//! System-wide constants and default values.

/// Application name used in CLI output and log messages.
pub const APP_NAME: &str = "homefin";

/// Binary name of the HTTP server, as invoked by the entrypoint.
pub const SERVER_BIN_NAME: &str = "homefin-server";

/// Name of the unprivileged runtime user the entrypoint provisions.
pub const RUNTIME_USER: &str = "abc";

/// Name of the unprivileged runtime group the entrypoint provisions.
pub const RUNTIME_GROUP: &str = "abc";

/// Home directory assigned to the runtime user.
pub const RUNTIME_HOME: &str = "/app";

/// Mounted directory holding persisted configuration and application state.
pub const DATA_DIR: &str = "/data";

/// Environment variable overriding the runtime user id.
pub const ENV_PUID: &str = "PUID";

/// Environment variable overriding the runtime group id.
pub const ENV_PGID: &str = "PGID";

/// Environment variable overriding the file-creation mask.
pub const ENV_UMASK: &str = "UMASK";

/// Environment variable pointing at the server configuration file.
pub const ENV_CONFIG_PATH: &str = "CONFIG_PATH";

/// User id used when `PUID` is unset or empty.
pub const DEFAULT_UID: u32 = 1000;

/// Group id used when `PGID` is unset or empty.
pub const DEFAULT_GID: u32 = 1000;

/// File-creation mask used when `UMASK` is unset or empty.
pub const DEFAULT_UMASK: u32 = 0o022;

/// Configuration path used when `CONFIG_PATH` is unset or empty.
pub const DEFAULT_CONFIG_PATH: &str = "sample/config.yaml";

/// Address the server binds when the configuration omits one.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Port the server binds when the configuration omits one.
pub const DEFAULT_PORT: u16 = 8000;

/// Static web UI directory relative to the configuration file.
pub const DEFAULT_WEBGUI_DIR: &str = "webgui";

/// HTTP header carrying the session token.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Lifetime of a login session in days.
pub const SESSION_TTL_DAYS: i64 = 30;

/// Number of random bytes in a session token (hex-encoded on the wire).
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Settings key tracking the next invoice number to issue.
pub const NEXT_INVOICE_NUMBER_KEY: &str = "next_invoice_number";
