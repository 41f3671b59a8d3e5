// Application configuration, loaded from environment variables and CLI flags.

use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_STATUS_URL: &str = "http://127.0.0.1:5000/api/status";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Full URL of the bot backend's status endpoint.
    pub status_url: String,
    /// Fixed delay between poll cycles.
    pub poll_interval: Duration,
    /// Whole-request timeout. `None` leaves it to the transport.
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    /// Address and port for the dashboard API.
    pub bind_addr: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            status_url: DEFAULT_STATUS_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: None,
            connect_timeout: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `STATUS_URL` - status endpoint (default: `http://127.0.0.1:5000/api/status`)
    /// - `POLL_INTERVAL_SECS` - seconds between polls (default: 30)
    /// - `POLL_TIMEOUT_SECS` - request timeout in seconds (default: none)
    /// - `CONNECT_TIMEOUT_SECS` - connect timeout in seconds (default: none)
    /// - `PORT` - dashboard API port (default: 3001)
    /// - `BIND_ADDR` - dashboard API bind address (default: `0.0.0.0`)
    ///
    /// CLI flags (take precedence over the environment):
    /// - `--status-url <URL>`
    /// - `--interval <SECS>`
    /// - `--timeout <SECS>`
    /// - `--port <PORT>`
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// Build a config from CLI args and an environment lookup.
    pub fn from_sources(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();

        let status_url = Self::parse_cli_value(args, "--status-url")
            .or_else(|| env("STATUS_URL"))
            .unwrap_or(defaults.status_url);

        let poll_interval = Self::lookup_secs(args, Some("--interval"), &env, "POLL_INTERVAL_SECS")
            .unwrap_or(defaults.poll_interval);

        let request_timeout = Self::lookup_secs(args, Some("--timeout"), &env, "POLL_TIMEOUT_SECS");
        let connect_timeout = Self::lookup_secs(args, None, &env, "CONNECT_TIMEOUT_SECS");

        let port = Self::lookup(args, Some("--port"), &env, "PORT").unwrap_or(defaults.port);

        let bind_addr = env("BIND_ADDR").unwrap_or(defaults.bind_addr);

        Config {
            status_url,
            poll_interval,
            request_timeout,
            connect_timeout,
            bind_addr,
            port,
        }
    }

    /// Reject values the poller cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.poll_interval.is_zero() {
            return Err(AppError::Config(
                "poll interval must be greater than zero".into(),
            ));
        }
        if !(self.status_url.starts_with("http://") || self.status_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "status URL must be http(s): {}",
                self.status_url
            )));
        }
        Ok(())
    }

    /// Socket address string for the dashboard API listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// CLI flag wins over env var; unparseable values are ignored with a warning.
    fn lookup<T: std::str::FromStr>(
        args: &[String],
        flag: Option<&str>,
        env: &impl Fn(&str) -> Option<String>,
        key: &str,
    ) -> Option<T> {
        let cli = flag.and_then(|f| Some((f, Self::parse_cli_value(args, f)?)));
        let (source, raw) = match cli {
            Some(found) => found,
            None => (key, env(key)?),
        };
        match raw.trim().parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid value for {source}: {raw:?}");
                None
            }
        }
    }

    fn lookup_secs(
        args: &[String],
        flag: Option<&str>,
        env: &impl Fn(&str) -> Option<String>,
        key: &str,
    ) -> Option<Duration> {
        Self::lookup::<u64>(args, flag, env, key).map(Duration::from_secs)
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}
