use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use tracing::Level;

use crate::optimizer::PackingConfig;

/// Complete application configuration, loaded from environment variables or default values.
///
/// Logging is configured separately through [`LogConfig`], because it has to be
/// in place before the warnings emitted here can be recorded.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            optimizer: OptimizerConfig::from_env(),
        }
    }
}

/// Configuration for the log output.
#[derive(Clone, Debug)]
pub struct LogConfig {
    level: Level,
}

impl LogConfig {
    const LEVEL_VAR: &'static str = "AFIT_PACKER_LOG_LEVEL";
    const DEFAULT_LEVEL: Level = Level::INFO;

    /// Reads the log level. Runs before any subscriber exists, so problems
    /// go to stderr directly.
    pub fn from_env() -> Self {
        let level = match env_string(Self::LEVEL_VAR) {
            Some(raw) => match Level::from_str(&raw) {
                Ok(level) => level,
                Err(err) => {
                    eprintln!(
                        "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                        Self::LEVEL_VAR,
                        raw,
                        err,
                        Self::DEFAULT_LEVEL
                    );
                    Self::DEFAULT_LEVEL
                }
            },
            None => Self::DEFAULT_LEVEL,
        };
        Self { level }
    }

    /// Maximum level passed to the subscriber.
    pub fn level(&self) -> Level {
        self.level
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let default_ip = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        let host_value =
            env_string("AFIT_PACKER_API_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                tracing::warn!(
                    "Could not parse AFIT_PACKER_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (default_ip, Self::DEFAULT_HOST.to_string())
            }
        };

        let port = match env_string("AFIT_PACKER_API_PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    tracing::warn!(
                        "AFIT_PACKER_API_PORT must not be 0. Using {}.",
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    tracing::warn!(
                        "Could not parse AFIT_PACKER_API_PORT ('{}'): {}. Using {}.",
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Configuration for the packing engine.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    packing: PackingConfig,
}

impl OptimizerConfig {
    const STOP_WHEN_FULL_VAR: &'static str = "AFIT_PACKER_STOP_WHEN_FULL";
    const COLLAPSE_CUBE_VAR: &'static str = "AFIT_PACKER_COLLAPSE_CUBE";
    const MAX_UNITS_VAR: &'static str = "AFIT_PACKER_MAX_UNITS";

    fn from_env() -> Self {
        let stop_when_fully_packed = env_string(Self::STOP_WHEN_FULL_VAR)
            .and_then(|raw| parse_bool(&raw, Self::STOP_WHEN_FULL_VAR))
            .unwrap_or(PackingConfig::DEFAULT_STOP_WHEN_FULLY_PACKED);

        let collapse_cube_orientations = env_string(Self::COLLAPSE_CUBE_VAR)
            .and_then(|raw| parse_bool(&raw, Self::COLLAPSE_CUBE_VAR))
            .unwrap_or(PackingConfig::DEFAULT_COLLAPSE_CUBE_ORIENTATIONS);

        let max_units = load_usize_with_warning(
            Self::MAX_UNITS_VAR,
            PackingConfig::DEFAULT_MAX_UNITS,
            |value| value > 0,
            "must be greater than 0",
        );

        let packing = PackingConfig::builder()
            .stop_when_fully_packed(stop_when_fully_packed)
            .collapse_cube_orientations(collapse_cube_orientations)
            .max_units(max_units)
            .build();

        Self { packing }
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }
}

impl From<PackingConfig> for OptimizerConfig {
    fn from(packing: PackingConfig) -> Self {
        Self { packing }
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            eprintln!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            tracing::warn!(
                "Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name,
                other
            );
            None
        }
    }
}

fn parse_usize(raw: &str, validator: impl Fn(usize) -> bool) -> Result<usize, String> {
    let value = raw.parse::<usize>().map_err(|err| err.to_string())?;
    if validator(value) {
        Ok(value)
    } else {
        Err(format!("{} is out of range", value))
    }
}

fn load_usize_with_warning(
    var_name: &str,
    default: usize,
    validator: impl Fn(usize) -> bool,
    invalid_hint: &str,
) -> usize {
    match env_string(var_name) {
        Some(raw) => match parse_usize(&raw, validator) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    "{} contains invalid value '{}' ({}): {}. Using {}.",
                    var_name,
                    raw,
                    err,
                    invalid_hint,
                    default
                );
                default
            }
        },
        None => default,
    }
}
