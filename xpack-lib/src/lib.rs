use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Archive written by `build` when no output is given.
pub const DEFAULT_OUTPUT: &str = "extension.xpi";

/// Output value that routes the archive to standard output.
pub const STDOUT_SENTINEL: &str = "-";

/// Host used when the destination names only a port.
pub const DEFAULT_HOST: &str = "localhost";

/// Port the auto-installer listens on by default.
pub const DEFAULT_PORT: u16 = 8888;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory to package. Falls back to the current working directory.
    pub dir: Option<String>,
    pub config: Option<String>,
    pub output: Option<String>,
    pub destination: Option<String>,
    pub skip: Option<Vec<String>>,
    pub dry: Option<bool>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DestinationError {
    #[error("invalid port '{0}' in destination")]
    InvalidPort(String),

    #[error("missing host in destination '{0}'")]
    EmptyHost(String),
}

/// Where the auto-installer listener is reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub host: String,
    pub port: u16,
}

impl Destination {
    /// URL the archive is POSTed to.
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

impl Default for Destination {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl FromStr for Destination {
    type Err = DestinationError;

    /// Accepts `PORT` or `HOST:PORT`. Only the first colon separates host from port.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = match s.split_once(':') {
            Some((host, port)) => (host, port),
            None => (DEFAULT_HOST, s),
        };

        if host.is_empty() {
            return Err(DestinationError::EmptyHost(s.to_string()));
        }

        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| DestinationError::InvalidPort(port.to_string()))?;

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
