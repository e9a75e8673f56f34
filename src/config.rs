use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;

/// DATABASE_URL未設定時に使う組み込みストア
pub const DEFAULT_DATABASE_URL: &str = "sqlite://lending.db";

/// 設定エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported database URL scheme: {0} (expected postgres://, postgresql:// or sqlite:)")]
    UnsupportedDatabaseUrl(String),
}

/// サーバー設定
///
/// プロセス起動時に1回だけ構築し、以降は不変のまま明示的に渡す。
/// 各項目はコマンドライン引数、環境変数（`.env` を含む）の順で解決される。
#[derive(Parser, Debug, Clone)]
#[clap(name = "container-lending")]
#[clap(about = "Container lending backend for the LINE LIFF front-end")]
pub struct ServerConfig {
    /// Database connection URL (postgres://... or sqlite://...)
    #[clap(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// LIFF application ID injected into the /liff page
    #[clap(long, env = "LIFF_ID")]
    pub liff_id: Option<String>,

    /// Listen host
    #[clap(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Listen port
    #[clap(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Maximum number of pooled database connections
    #[clap(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// 空文字列は未設定として扱う
    pub fn liff_id(&self) -> Option<&str> {
        self.liff_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn database_backend(&self) -> Result<DatabaseBackend, ConfigError> {
        DatabaseBackend::from_url(&self.database_url)
    }
}

/// 永続化エンジン
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    /// ネットワーク越しのPostgreSQL（クラウド環境）
    Postgres,
    /// ファイルベースの組み込みSQLite（ローカル環境）
    Sqlite,
}

impl DatabaseBackend {
    /// URLのスキームからエンジンを判定する
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(DatabaseBackend::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(DatabaseBackend::Sqlite)
        } else {
            Err(ConfigError::UnsupportedDatabaseUrl(mask_database_url(url)))
        }
    }
}

/// ログ出力用にURL中のパスワードを伏せる
pub fn mask_database_url(database_url: &str) -> String {
    match url::Url::parse(database_url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            if parsed.set_password(Some("****")).is_ok() {
                parsed.to_string()
            } else {
                database_url.to_string()
            }
        }
        _ => database_url.to_string(),
    }
}
