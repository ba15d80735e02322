use log::warn;
use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const REVIEWS_FILE_NAME: &str = "reviews.xlsx";

/// Runtime settings, read from the environment at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Listen port (`PORT`)
    pub port: u16,

    /// Directory holding the tabular sources (`DATA_DIR`)
    pub data_dir: PathBuf,

    /// Directory served under `/static` (`STATIC_DIR`)
    pub static_dir: PathBuf,

    /// Review workbook (`REVIEWS_FILE`), defaults to `<data_dir>/reviews.xlsx`
    pub reviews_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys take their defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("invalid PORT '{raw}', using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let data_dir = PathBuf::from(lookup("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()));
        let static_dir =
            PathBuf::from(lookup("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.into()));
        let reviews_file = lookup("REVIEWS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(REVIEWS_FILE_NAME));

        Self {
            port,
            data_dir,
            static_dir,
            reviews_file,
        }
    }

    /// All interfaces on the configured port
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}
