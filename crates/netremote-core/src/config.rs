//! Engine configuration and protocol defaults.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default TCP listen port.
pub const DEFAULT_PORT: u16 = 3382;
/// Concurrently served TCP clients; further accepts are closed immediately.
pub const DEFAULT_MAX_CLIENTS: usize = 4;
/// Interval of the dead-peer sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(1000);
/// Default serial line rate.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Engine configuration covering both transports.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub tcp_port: u16,
    pub max_clients: usize,
    pub sweep_interval: Duration,
    /// Serial device path; `None` leaves the serial transport disabled.
    pub serial_port: Option<String>,
    pub baud_rate: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            tcp_port: DEFAULT_PORT,
            max_clients: DEFAULT_MAX_CLIENTS,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            serial_port: None,
            baud_rate: DEFAULT_BAUD,
        }
    }
}

impl RemoteConfig {
    /// Load configuration from `NETREMOTE_*` environment variables, falling
    /// back to the defaults above. Unparseable values fall back too.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let tcp_port = env::var("NETREMOTE_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.tcp_port);
        let serial_port = env::var("NETREMOTE_SERIAL_PORT").ok().filter(|v| !v.is_empty());
        let baud_rate = env::var("NETREMOTE_BAUD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.baud_rate);
        Self {
            tcp_port,
            serial_port,
            baud_rate,
            ..defaults
        }
    }

    /// Listen on all interfaces at the configured port.
    pub fn tcp(&self) -> crate::server::TcpServerConfig {
        crate::server::TcpServerConfig {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.tcp_port),
            max_clients: self.max_clients,
            sweep_interval: self.sweep_interval,
        }
    }

    pub fn serial(&self) -> Option<crate::serial::SerialConfig> {
        self.serial_port.as_ref().map(|port| crate::serial::SerialConfig {
            port: port.clone(),
            baud_rate: self.baud_rate,
        })
    }
}
