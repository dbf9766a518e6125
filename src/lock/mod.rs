//! Session-scoped advisory locking.
//!
//! The lock is a capability of one database session: acquire and release for a
//! logical attempt must run on the same connection, and the server drops the
//! hold automatically when that session ends. Every operation here is a single
//! blocking round trip; retry and backoff loops belong to the caller.

mod connect;
mod mssql;
mod outcome;

pub use connect::{connect_client, MssqlClient};
pub use mssql::MssqlLockService;
pub use outcome::ResultCodes;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::LockError;
use crate::name::LockName;

/// Outcome of a single acquisition attempt.
///
/// Fatal conditions are reported as [`LockError`], not a variant here. The raw
/// store result code is retained on both variants for diagnostics; `Busy`
/// deliberately collapses the store's timed-out / cancelled / deadlock-victim
/// sub-codes into one "not granted" outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockAttempt {
    Acquired { code: i32 },
    Busy { code: i32 },
}

impl LockAttempt {
    pub fn is_acquired(&self) -> bool {
        matches!(self, LockAttempt::Acquired { .. })
    }

    pub fn raw_code(&self) -> i32 {
        match self {
            LockAttempt::Acquired { code } | LockAttempt::Busy { code } => *code,
        }
    }
}

/// Snapshot of who holds the named lock, observed from server catalog views.
///
/// Best effort only: the query may race with concurrent acquire and release.
/// `since` is the holding session's login time; the server does not track a
/// per-lock acquisition timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockHolder {
    pub locked_by: String,
    pub since: DateTime<Utc>,
}

/// One named session lock on a specific backing-store dialect.
///
/// Implementations own the dialect's statement texts and result-code
/// boundaries; the connection is caller-supplied and taken exclusively for the
/// duration of each call.
pub trait SessionLockService<C>: Send + Sync {
    /// Attempt to acquire the lock once, waiting at most `timeout`.
    fn try_acquire(
        &self,
        conn: &mut C,
        timeout: Duration,
    ) -> impl Future<Output = Result<LockAttempt, LockError>> + Send;

    /// Release the lock held by `conn`'s session.
    ///
    /// Must be called on the same connection that acquired the lock; releasing
    /// a lock the session does not hold is an error, never a silent success.
    fn release(&self, conn: &mut C) -> impl Future<Output = Result<(), LockError>> + Send;

    /// Query who currently holds the lock, if anyone.
    ///
    /// Read-only; may use any connection, not just the lock-holding one.
    fn current_holder(
        &self,
        conn: &mut C,
    ) -> impl Future<Output = Result<Option<LockHolder>, LockError>> + Send;

    fn lock_name(&self) -> &LockName;
}
