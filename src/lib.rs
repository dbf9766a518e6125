//! Session-scoped advisory locks on Microsoft SQL Server.
//!
//! Coordinates a single long-running operation (typically a schema migration)
//! across independent processes that share one database. The lock is backed by
//! `sp_getapplock` in `Session` mode, so the hold lives in the server's own
//! session model: it survives transaction boundaries and is released
//! automatically when the holding connection terminates.
//!
//! This crate performs exactly one store round trip per call and never retries
//! internally; retry and backoff policy belongs to the caller, which must reuse
//! the same connection for acquire and release of one logical attempt.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use mssql_sessionlock::{connect_client, LockAttempt, MssqlLockService, SessionLockService};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let mut client = connect_client().await?;
//!     let service = MssqlLockService::new("dbo", "DATABASECHANGELOGLOCK");
//!
//!     match service.try_acquire(&mut client, Duration::from_secs(5)).await? {
//!         LockAttempt::Acquired { .. } => {
//!             // critical section
//!             service.release(&mut client).await?;
//!         }
//!         LockAttempt::Busy { .. } => {
//!             if let Some(holder) = service.current_holder(&mut client).await? {
//!                 println!("held by {} since {}", holder.locked_by, holder.since);
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod lock;
pub mod name;

pub use config::LockConfig;
pub use error::LockError;
pub use lock::{
    connect_client, LockAttempt, LockHolder, MssqlClient, MssqlLockService, ResultCodes,
    SessionLockService,
};
pub use name::LockName;
