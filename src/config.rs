use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use anyhow::{Context, Result, ensure};

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// The directory static assets are served from.
    pub static_dir: PathBuf,
    /// Path to the JSON user roster. When unset a single demo user is seeded.
    pub users_file: Option<PathBuf>,
    /// Whether session cookies carry the `Secure` attribute.
    pub secure_cookies: bool,
    /// Sustained `/xhr` requests per second allowed for one client address.
    pub rate_limit_per_second: u64,
    /// The rate limiter burst size.
    pub rate_limit_burst: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            static_dir: PathBuf::from("."),
            users_file: None,
            secure_cookies: false,
            rate_limit_per_second: 20,
            rate_limit_burst: 50,
        }
    }
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let bind_addr = match env::var("BIND_ADDR") {
            Ok(addr) => addr
                .parse()
                .with_context(|| format!("Invalid BIND_ADDR: {}", addr))?,
            Err(_) => defaults.bind_addr,
        };

        let is_production = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string()) == "production";

        let rate_limit_per_second: u64 = env::var("RATE_LIMIT_PER_SECOND")
            .unwrap_or_else(|_| defaults.rate_limit_per_second.to_string())
            .parse()
            .context("Invalid RATE_LIMIT_PER_SECOND")?;
        ensure!(rate_limit_per_second > 0, "RATE_LIMIT_PER_SECOND must be positive");

        Ok(Self {
            bind_addr,
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            users_file: env::var("USERS_FILE").ok().map(PathBuf::from),
            secure_cookies: is_production,
            rate_limit_per_second,
            rate_limit_burst: env::var("RATE_LIMIT_BURST")
                .unwrap_or_else(|_| defaults.rate_limit_burst.to_string())
                .parse()
                .context("Invalid RATE_LIMIT_BURST")?,
        })
    }

    /// Milliseconds between two replenished rate limiter permits.
    pub fn rate_limit_interval_ms(&self) -> u64 {
        (1000 / self.rate_limit_per_second.max(1)).max(1)
    }
}
