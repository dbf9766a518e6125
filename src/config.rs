use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::name::LockName;

/// Lock service configuration.
///
/// The disable toggle is threaded through construction
/// ([`MssqlLockService::from_config`](crate::lock::MssqlLockService::from_config));
/// there is no process-wide mutable state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Schema the migration bookkeeping tables live in.
    pub default_schema: String,
    /// Name of the changelog lock table; together with the schema it derives
    /// the advisory lock resource name.
    pub lock_table: String,
    /// Per-attempt wait for `sp_getapplock`, in seconds.
    pub acquire_timeout_secs: u64,
    /// When true, session locking is opted out and no service is constructed.
    pub disable_session_locking: bool,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            default_schema: "dbo".to_string(),
            lock_table: "DATABASECHANGELOGLOCK".to_string(),
            acquire_timeout_secs: 5,
            disable_session_locking: false,
        }
    }
}

impl LockConfig {
    /// Load configuration from a file, overlaid with `SESSIONLOCK_`-prefixed
    /// environment variables (`SESSIONLOCK_LOCK_TABLE` overrides `lock_table`,
    /// and so on).
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let path = config_path
            .to_str()
            .with_context(|| format!("non-UTF-8 configuration path {}", config_path.display()))?;
        // No key separator: every field is flat, so the remainder after the
        // prefix is the field name itself.
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(true))
            .add_source(config::Environment::with_prefix("SESSIONLOCK"))
            .build()
            .with_context(|| {
                format!(
                    "failed to load configuration from {}",
                    config_path.display()
                )
            })?;
        let cfg: LockConfig = settings.try_deserialize().with_context(|| {
            format!(
                "failed to deserialize configuration from {}",
                config_path.display()
            )
        })?;
        Ok(cfg)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn lock_name(&self) -> LockName {
        LockName::resolve(&self.default_schema, &self.lock_table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_the_changelog_lock_table() {
        let cfg = LockConfig::default();
        assert_eq!(cfg.default_schema, "dbo");
        assert_eq!(cfg.lock_table, "DATABASECHANGELOGLOCK");
        assert_eq!(cfg.acquire_timeout(), Duration::from_secs(5));
        assert!(!cfg.disable_session_locking);
    }

    #[test]
    fn load_reads_file_values_and_applies_env_overrides() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sessionlock.toml");
        std::fs::write(
            &path,
            "default_schema = \"migrations\"\nacquire_timeout_secs = 9\n",
        )?;

        std::env::set_var("SESSIONLOCK_LOCK_TABLE", "OVERRIDDEN");
        let cfg = LockConfig::load(&path);
        std::env::remove_var("SESSIONLOCK_LOCK_TABLE");

        let cfg = cfg?;
        assert_eq!(cfg.default_schema, "migrations");
        assert_eq!(cfg.acquire_timeout_secs, 9);
        assert_eq!(cfg.lock_table, "OVERRIDDEN");
        assert!(!cfg.disable_session_locking);
        Ok(())
    }

    #[test]
    fn load_fails_on_missing_file() {
        let err = LockConfig::load(Path::new("/nonexistent/sessionlock.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to load configuration"));
    }

    #[test]
    fn lock_name_is_derived_from_schema_and_table() {
        let cfg = LockConfig {
            default_schema: "migrations".to_string(),
            lock_table: "changelog_lock".to_string(),
            ..LockConfig::default()
        };
        assert_eq!(cfg.lock_name().as_str(), "MIGRATIONS.CHANGELOG_LOCK");
    }
}
