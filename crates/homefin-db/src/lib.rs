//! SQLite persistence for the homefin server.
//!
//! The [`Store`] type owns a connection pool over the single application
//! database and exposes typed reads and writes for every record the server
//! keeps: login users and their sessions, the three invoice addresses, daily
//! time entries, loose settings, and the email configuration. Schema setup
//! runs on open and tolerates databases written by older releases.

pub mod error;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
pub use store::{EmailSettings, Store};
