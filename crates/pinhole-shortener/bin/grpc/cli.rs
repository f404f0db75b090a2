use clap::{ArgAction, Parser, ValueEnum};
use pinhole_core::UrlUniqueness;
use pinhole_shortener::service::{DEFAULT_CODE_LENGTH, DEFAULT_MAX_ATTEMPTS};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "PINHOLE_SHORTENER_GRPC_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "PINHOLE_SHORTENER_STORAGE_BACKEND";
pub const SQLITE_URL_ENV: &str = "PINHOLE_SHORTENER_SQLITE_URL";
pub const URL_UNIQUENESS_ENV: &str = "PINHOLE_SHORTENER_URL_UNIQUENESS";
pub const CODE_LENGTH_ENV: &str = "PINHOLE_SHORTENER_CODE_LENGTH";
pub const MAX_ATTEMPTS_ENV: &str = "PINHOLE_SHORTENER_MAX_ATTEMPTS";
pub const REUSE_EXISTING_ALIAS_ENV: &str = "PINHOLE_SHORTENER_REUSE_EXISTING_ALIAS";
pub const REQUEST_TIMEOUT_MS_ENV: &str = "PINHOLE_SHORTENER_REQUEST_TIMEOUT_MS";
pub const LOG_FORMAT_ENV: &str = "PINHOLE_SHORTENER_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:50051";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "sqlite")]
    Sqlite,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UrlUniquenessArg {
    Enforced,
    Relaxed,
}

impl From<UrlUniquenessArg> for UrlUniqueness {
    fn from(value: UrlUniquenessArg) -> Self {
        match value {
            UrlUniquenessArg::Enforced => UrlUniqueness::Enforced,
            UrlUniquenessArg::Relaxed => UrlUniqueness::Relaxed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "pinhole-shortener-grpc-server")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    /// e.g. `sqlite://pinhole.db`
    #[arg(long, env = SQLITE_URL_ENV, required_if_eq("storage", "sqlite"))]
    pub sqlite_url: Option<String>,

    #[arg(
        long,
        env = URL_UNIQUENESS_ENV,
        value_enum,
        default_value_t = UrlUniquenessArg::Enforced
    )]
    pub url_uniqueness: UrlUniquenessArg,

    #[arg(long, env = CODE_LENGTH_ENV, default_value_t = DEFAULT_CODE_LENGTH)]
    pub code_length: usize,

    #[arg(long, env = MAX_ATTEMPTS_ENV, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: usize,

    /// Return the alias already issued for a URL instead of minting another.
    #[arg(
        long,
        env = REUSE_EXISTING_ALIAS_ENV,
        action = ArgAction::Set,
        default_value_t = true
    )]
    pub reuse_existing_alias: bool,

    /// Per-request deadline in milliseconds, 0 disables it.
    #[arg(long, env = REQUEST_TIMEOUT_MS_ENV, default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    pub request_timeout_ms: u64,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl CLI {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}
