//! Result-code classification shared by acquire and release.

use crate::error::LockError;
use crate::lock::LockAttempt;

/// Dialect-specific result-code boundaries, carried as data so call sites
/// never hardcode them.
#[derive(Debug, Clone, Copy)]
pub struct ResultCodes {
    /// Codes strictly below this are store-reported fatal conditions.
    pub fatal_below: i32,
    /// Codes at or above this mean the lock was granted; codes between
    /// `fatal_below` and this mean not granted (timed out, cancelled, or
    /// chosen as deadlock victim).
    pub acquired_at_or_above: i32,
    /// The single code that signals a clean release.
    pub release_ok: i32,
}

impl ResultCodes {
    /// `sp_getapplock` / `sp_releaseapplock` contract: >= 0 granted,
    /// -1..=-3 not granted, < -3 fatal, 0 released.
    pub const MSSQL: ResultCodes = ResultCodes {
        fatal_below: -3,
        acquired_at_or_above: 0,
        release_ok: 0,
    };

    /// Map a raw acquire result onto acquired / busy / fatal.
    pub fn classify_acquire(
        &self,
        primitive: &'static str,
        code: Option<i32>,
    ) -> Result<LockAttempt, LockError> {
        match code {
            None => Err(LockError::NullResult { primitive }),
            Some(code) if code < self.fatal_below => Err(LockError::Fatal { primitive, code }),
            Some(code) if code < self.acquired_at_or_above => Ok(LockAttempt::Busy { code }),
            Some(code) => Ok(LockAttempt::Acquired { code }),
        }
    }

    /// A release is clean only when the store returns exactly `release_ok`.
    pub fn classify_release(
        &self,
        primitive: &'static str,
        code: Option<i32>,
    ) -> Result<(), LockError> {
        match code {
            Some(code) if code == self.release_ok => Ok(()),
            code => Err(LockError::ReleaseFailed { primitive, code }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODES: ResultCodes = ResultCodes::MSSQL;

    #[test]
    fn null_acquire_result_is_fatal() {
        let err = CODES.classify_acquire("sp_getapplock()", None).unwrap_err();
        assert!(matches!(err, LockError::NullResult { .. }));
        assert_eq!(err.to_string(), "sp_getapplock() returned NULL");
    }

    #[test]
    fn acquire_codes_below_minus_three_are_fatal_with_raw_code() {
        let err = CODES
            .classify_acquire("sp_getapplock()", Some(-5))
            .unwrap_err();
        assert!(matches!(err, LockError::Fatal { code: -5, .. }));
        assert_eq!(err.to_string(), "sp_getapplock() returned -5");
    }

    #[test]
    fn acquire_codes_minus_three_to_minus_one_are_busy() {
        for code in [-3, -2, -1] {
            let attempt = CODES.classify_acquire("sp_getapplock()", Some(code)).unwrap();
            assert_eq!(attempt, LockAttempt::Busy { code });
            assert!(!attempt.is_acquired());
            assert_eq!(attempt.raw_code(), code);
        }
    }

    #[test]
    fn non_negative_acquire_codes_are_granted() {
        for code in [0, 1] {
            let attempt = CODES.classify_acquire("sp_getapplock()", Some(code)).unwrap();
            assert_eq!(attempt, LockAttempt::Acquired { code });
            assert!(attempt.is_acquired());
        }
    }

    #[test]
    fn release_is_clean_only_on_zero() {
        assert!(CODES.classify_release("sp_releaseapplock()", Some(0)).is_ok());

        let err = CODES
            .classify_release("sp_releaseapplock()", Some(1))
            .unwrap_err();
        assert!(matches!(err, LockError::ReleaseFailed { code: Some(1), .. }));
        assert_eq!(err.to_string(), "sp_releaseapplock() returned 1, expected 0");
    }

    #[test]
    fn null_release_result_is_reported_as_null() {
        let err = CODES
            .classify_release("sp_releaseapplock()", None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "sp_releaseapplock() returned NULL, expected 0"
        );
    }

    #[test]
    fn negative_release_codes_are_failures() {
        let err = CODES
            .classify_release("sp_releaseapplock()", Some(-999))
            .unwrap_err();
        assert!(matches!(
            err,
            LockError::ReleaseFailed {
                code: Some(-999),
                ..
            }
        ));
    }
}
