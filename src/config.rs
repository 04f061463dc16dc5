use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub address: IpAddr,
    /// Period between `time` events on each stream.
    pub tick_interval: Duration,
    /// Served at `/` when the directory exists.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: DEFAULT_PORT,
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            tick_interval: DEFAULT_TICK_INTERVAL,
            static_dir: PathBuf::from("public"),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset or unparseable values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();

        let port = lookup("PORT")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.port);

        let address = lookup("ADDRESS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.address);

        let tick_interval = lookup("TICK_INTERVAL_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick_interval);

        let static_dir = lookup("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        ServerConfig {
            port,
            address,
            tick_interval,
            static_dir,
        }
    }
}
