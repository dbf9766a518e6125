//! SQL Server session locks via `sp_getapplock`.
//!
//! A lock obtained with `sp_getapplock` in `Session` mode is released
//! explicitly by `sp_releaseapplock` or implicitly when the session
//! terminates; commits and rollbacks do not touch it.

use std::time::Duration;

use chrono::NaiveDateTime;
use tiberius::ToSql;
use tracing::debug;

use crate::config::LockConfig;
use crate::error::LockError;
use crate::lock::connect::MssqlClient;
use crate::lock::outcome::ResultCodes;
use crate::lock::{LockAttempt, LockHolder, SessionLockService};
use crate::name::LockName;

const SQL_GET_LOCK: &str = "DECLARE @i int; \
     EXEC @i = sp_getapplock @Resource = @P1, @LockMode = 'Exclusive', \
     @LockOwner = 'Session', @LockTimeout = @P2; \
     SELECT @i;";

const SQL_RELEASE_LOCK: &str = "DECLARE @i int; \
     EXEC @i = sp_releaseapplock @Resource = @P1, @LockOwner = 'Session'; \
     SELECT @i;";

const SQL_LOCK_INFO: &str = "SELECT s.session_id, l.resource_description, s.login_time, s.host_name \
     FROM sys.dm_tran_locks l \
     INNER JOIN sys.dm_exec_sessions s ON s.session_id = l.request_session_id \
     WHERE l.request_owner_type = 'SESSION' \
     AND l.resource_description LIKE @P1";

/// Session lock on one named resource, SQL Server dialect.
pub struct MssqlLockService {
    name: LockName,
    codes: ResultCodes,
}

impl MssqlLockService {
    pub fn new(schema: &str, table: &str) -> Self {
        Self::with_name(LockName::resolve(schema, table))
    }

    pub fn with_name(name: LockName) -> Self {
        Self {
            name,
            codes: ResultCodes::MSSQL,
        }
    }

    /// Build a service from configuration, or `None` when session locking is
    /// disabled there.
    pub fn from_config(cfg: &LockConfig) -> Option<Self> {
        if cfg.disable_session_locking {
            return None;
        }
        Some(Self::with_name(cfg.lock_name()))
    }

    /// Run a statement that yields a single nullable integer result.
    async fn int_result(
        client: &mut MssqlClient,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> Result<Option<i32>, LockError> {
        let row = client.query(sql, params).await?.into_row().await?;
        Ok(row.and_then(|row| row.get::<i32, _>(0)))
    }
}

impl SessionLockService<MssqlClient> for MssqlLockService {
    async fn try_acquire(
        &self,
        conn: &mut MssqlClient,
        timeout: Duration,
    ) -> Result<LockAttempt, LockError> {
        let name = self.name.as_str();
        let timeout_ms = timeout_to_millis(timeout);
        debug!(lock = name, timeout_ms, "requesting application lock");

        let code = Self::int_result(conn, SQL_GET_LOCK, &[&name, &timeout_ms]).await?;
        let attempt = self.codes.classify_acquire("sp_getapplock()", code)?;
        match attempt {
            LockAttempt::Acquired { code } => {
                debug!(lock = name, code, "application lock acquired")
            }
            LockAttempt::Busy { code } => {
                debug!(lock = name, code, "application lock held elsewhere")
            }
        }
        Ok(attempt)
    }

    async fn release(&self, conn: &mut MssqlClient) -> Result<(), LockError> {
        let name = self.name.as_str();
        let code = Self::int_result(conn, SQL_RELEASE_LOCK, &[&name]).await?;
        self.codes.classify_release("sp_releaseapplock()", code)?;
        debug!(lock = name, "application lock released");
        Ok(())
    }

    async fn current_holder(
        &self,
        conn: &mut MssqlClient,
    ) -> Result<Option<LockHolder>, LockError> {
        // The catalog reports applock resources as "principal:[NAME]:(hash)",
        // so the name is matched as a substring.
        let pattern = format!("%{}%", self.name.as_str());
        let row = conn
            .query(SQL_LOCK_INFO, &[&pattern])
            .await?
            .into_row()
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        // A row whose resource description is NULL or blank does not evidence
        // a hold; treat it the same as no row.
        let resource = row.get::<&str, _>("resource_description");
        if resource.map_or(true, |r| r.trim().is_empty()) {
            return Ok(None);
        }

        let session_id = row.get::<i16, _>("session_id").unwrap_or_default();
        let host = row.get::<&str, _>("host_name");
        let since = row
            .get::<NaiveDateTime, _>("login_time")
            .unwrap_or_default()
            .and_utc();

        Ok(Some(LockHolder {
            locked_by: holder_identity(host, session_id),
            since,
        }))
    }

    fn lock_name(&self) -> &LockName {
        &self.name
    }
}

/// `@LockTimeout` is in milliseconds; saturate rather than wrap for absurd
/// caller-supplied durations.
fn timeout_to_millis(timeout: Duration) -> i32 {
    i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX)
}

/// The session's host name when it reports one, else a synthetic identity
/// from the session id.
fn holder_identity(host: Option<&str>, session_id: i16) -> String {
    match host {
        Some(host) if !host.trim().is_empty() => host.to_string(),
        _ => format!("session_id#{session_id}"),
    }
}
