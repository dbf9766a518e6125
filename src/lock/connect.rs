use anyhow::{Context, Result};
use tiberius::{AuthMethod, Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

/// Caller-owned SQL Server session. The advisory lock is scoped to exactly
/// one of these; dropping it closes the session and releases any hold.
pub type MssqlClient = Client<Compat<TcpStream>>;

/// SQL Server connection configuration, built once from environment variables.
#[derive(Clone)]
struct MssqlConfig {
    host: String,
    port: u16,
    user: String,
    password: String,
    database: String,
    encryption: TdsEncryption,
}

#[derive(Clone, Copy, Debug)]
enum TdsEncryption {
    Off,
    Required,
}

impl TdsEncryption {
    fn from_env() -> Self {
        let value = std::env::var("MSSQL_ENCRYPT").unwrap_or_else(|_| "off".to_string());
        Self::from_str(value.as_str())
    }

    fn from_str(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "require" | "required" | "on" | "true" => Self::Required,
            _ => Self::Off,
        }
    }

    fn level(self) -> EncryptionLevel {
        match self {
            TdsEncryption::Off => EncryptionLevel::NotSupported,
            TdsEncryption::Required => EncryptionLevel::Required,
        }
    }
}

impl MssqlConfig {
    fn from_env() -> Self {
        let host = std::env::var("MSSQL_HOST").unwrap_or_else(|_| "localhost".to_string());
        let port = std::env::var("MSSQL_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(1433);
        let user = std::env::var("MSSQL_USER").unwrap_or_else(|_| "sa".to_string());
        let password = std::env::var("MSSQL_PASSWORD").unwrap_or_default();
        let database = std::env::var("MSSQL_DATABASE").unwrap_or_else(|_| "master".to_string());

        Self {
            host,
            port,
            user,
            password,
            database,
            encryption: TdsEncryption::from_env(),
        }
    }

    fn get() -> &'static Self {
        use std::sync::OnceLock;
        static CONFIG: OnceLock<MssqlConfig> = OnceLock::new();
        CONFIG.get_or_init(Self::from_env)
    }

    fn to_tiberius(&self) -> Config {
        let mut config = Config::new();
        config.host(&self.host);
        config.port(self.port);
        config.database(&self.database);
        config.authentication(AuthMethod::sql_server(&self.user, &self.password));
        config.encryption(self.encryption.level());
        if matches!(self.encryption, TdsEncryption::Required) {
            config.trust_cert();
        }
        config
    }
}

/// Open a fresh SQL Server session from environment configuration.
///
/// Each call returns an independent session; a lock acquired on one client
/// must be released on that same client.
pub async fn connect_client() -> Result<MssqlClient> {
    let config = MssqlConfig::get().to_tiberius();
    let addr = config.get_addr();

    debug!(addr = %addr, encryption = ?MssqlConfig::get().encryption, "connecting to SQL Server");
    let tcp = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to reach SQL Server at {addr}"))?;
    tcp.set_nodelay(true)
        .context("failed to set TCP_NODELAY on SQL Server connection")?;

    let client = Client::connect(config, tcp.compat_write())
        .await
        .context("SQL Server login failed")?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encryption_parser_handles_supported_and_unknown_values() {
        assert!(matches!(TdsEncryption::from_str("off"), TdsEncryption::Off));
        assert!(matches!(
            TdsEncryption::from_str("require"),
            TdsEncryption::Required
        ));
        assert!(matches!(
            TdsEncryption::from_str("REQUIRED"),
            TdsEncryption::Required
        ));
        assert!(matches!(
            TdsEncryption::from_str("unknown-value"),
            TdsEncryption::Off
        ));
    }

    #[test]
    fn config_from_env_has_usable_defaults() {
        let cfg = MssqlConfig::from_env();
        assert!(!cfg.host.is_empty());
        assert!(cfg.port > 0);
        assert!(!cfg.database.is_empty());
    }
}
