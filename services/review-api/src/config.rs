//! サーバー設定
//!
//! 環境変数から読み込む。
//! - `PORT`: リッスンポート（デフォルト: 8000）
//! - `BIND_ADDR`: リッスンアドレス（デフォルト: 0.0.0.0）
//! - `REVIEWS_CSV_PATH`: 初期データCSVのパス（デフォルト: data/reviews.csv）

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

/// ポート環境変数名
pub const PORT_ENV: &str = "PORT";

/// リッスンアドレス環境変数名
pub const BIND_ADDR_ENV: &str = "BIND_ADDR";

/// 初期データCSVパス環境変数名
pub const REVIEWS_CSV_PATH_ENV: &str = "REVIEWS_CSV_PATH";

/// デフォルトのポート
const DEFAULT_PORT: u16 = 8000;

/// デフォルトの初期データCSVパス
const DEFAULT_REVIEWS_CSV_PATH: &str = "data/reviews.csv";

/// 設定のエラー型
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid PORT: {0}")]
    InvalidPort(String),

    #[error("Invalid BIND_ADDR: {0}")]
    InvalidBindAddr(String),
}

/// サーバー設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// リッスンアドレス
    pub bind_addr: IpAddr,
    /// リッスンポート
    pub port: u16,
    /// 初期データCSVのパス
    pub reviews_csv_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            reviews_csv_path: PathBuf::from(DEFAULT_REVIEWS_CSV_PATH),
        }
    }
}

impl ServerConfig {
    /// プロセスの環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 未設定・空文字の項目はデフォルト値を使う。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let port = match lookup(PORT_ENV) {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(value))?,
            None => defaults.port,
        };

        let bind_addr = match lookup(BIND_ADDR_ENV) {
            Some(value) => value
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidBindAddr(value))?,
            None => defaults.bind_addr,
        };

        let reviews_csv_path = lookup(REVIEWS_CSV_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or(defaults.reviews_csv_path);

        Ok(Self {
            bind_addr,
            port,
            reviews_csv_path,
        })
    }

    /// リッスンするソケットアドレス
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}
