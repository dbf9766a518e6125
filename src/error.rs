use thiserror::Error;

/// Failures surfaced by lock operations.
///
/// Contention is not an error; `try_acquire` reports it as
/// [`LockAttempt::Busy`](crate::lock::LockAttempt). These variants cover
/// protocol-level failures (the store primitive returned a null, out-of-range,
/// or non-zero result) and transport failures, which pass through unchanged.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("{primitive} returned NULL")]
    NullResult { primitive: &'static str },
    #[error("{primitive} returned {code}")]
    Fatal { primitive: &'static str, code: i32 },
    #[error("{primitive} returned {}, expected 0", .code.map_or_else(|| "NULL".to_string(), |c| c.to_string()))]
    ReleaseFailed {
        primitive: &'static str,
        code: Option<i32>,
    },
    #[error("sql server error: {0}")]
    Sql(#[from] tiberius::error::Error),
}
