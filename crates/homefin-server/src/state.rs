//! Shared application state.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::num::NonZeroU32;

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use homefin_db::Store;

/// Login attempts allowed per client address per minute.
const LOGIN_ATTEMPTS_PER_MINUTE: u32 = 5;

/// Per-address rate limiter guarding the login route.
pub type LoginLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// State shared by every request handler via `Arc`.
pub struct AppState {
    /// Application database.
    pub store: Store,
    /// Username to bcrypt hash, synced from the config file at startup.
    pub users: BTreeMap<String, Vec<u8>>,
    /// Keyed limiter for login attempts.
    pub login_limiter: LoginLimiter,
}

impl AppState {
    /// Builds the shared state around an opened store and the user table
    /// loaded at startup.
    #[must_use]
    pub fn new(store: Store, users: BTreeMap<String, Vec<u8>>) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(LOGIN_ATTEMPTS_PER_MINUTE).unwrap_or(NonZeroU32::MIN),
        );
        Self {
            store,
            users,
            login_limiter: RateLimiter::keyed(quota),
        }
    }
}
