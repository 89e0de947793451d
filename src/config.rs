use crate::error::{Result, TwintailError};
use crate::i18n;
use std::net::IpAddr;

pub const DEFAULT_PORT: u16 = 8077;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_TAILSCALE_BIN: &str = "tailscale";

/// Runtime configuration for the console and CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: IpAddr,
    pub port: u16,
    pub tailscale_bin: String,
    pub default_lang: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
            tailscale_bin: DEFAULT_TAILSCALE_BIN.to_string(),
            default_lang: i18n::DEFAULT_LANG.to_string(),
        }
    }
}

/// Values given on the command line; `None` keeps the environment value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub tailscale_bin: Option<String>,
}

impl Config {
    /// Read `TWINTAIL_BIND`, `PORT`, `TAILSCALE_BIN` and `TWINTAIL_LANG`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(bind) = non_empty(lookup("TWINTAIL_BIND")) {
            config.bind = parse_bind(&bind)?;
        }
        if let Some(port) = non_empty(lookup("PORT")) {
            config.port = port
                .parse()
                .map_err(|_| TwintailError::InvalidInput(format!("Invalid PORT: '{}'", port)))?;
        }
        if let Some(bin) = non_empty(lookup("TAILSCALE_BIN")) {
            config.tailscale_bin = bin;
        }
        if let Some(lang) = non_empty(lookup("TWINTAIL_LANG")) {
            if !i18n::is_supported(&lang) {
                return Err(TwintailError::InvalidInput(format!(
                    "Unsupported TWINTAIL_LANG: '{}' (expected one of: {})",
                    lang,
                    i18n::SUPPORTED_LANGUAGES.join(", ")
                )));
            }
            config.default_lang = lang;
        }

        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if let Some(bind) = overrides.bind {
            self.bind = parse_bind(&bind)?;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(bin) = overrides.tailscale_bin {
            self.tailscale_bin = bin;
        }
        Ok(self)
    }

    pub fn listen_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::new(self.bind, self.port)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_bind(value: &str) -> Result<IpAddr> {
    value
        .parse()
        .map_err(|_| TwintailError::InvalidInput(format!("Invalid bind address: '{}'", value)))
}
