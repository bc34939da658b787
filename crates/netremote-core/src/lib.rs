//! Remote-control protocol engine for a software radio.
//!
//! Clients speak a small JSON command protocol (`get`/`set`/`exe` against
//! named radio properties) over either a TCP socket server or a single
//! serial link. Both transports share the same framing, codec and dispatch
//! pipeline; the radio itself is reached through the [`control::RadioControl`]
//! trait and is never owned by this crate.

pub mod config;
pub mod control;
pub mod dispatch;
pub mod protocol;
pub mod serial;
pub mod server;

pub use config::RemoteConfig;
pub use control::RadioControl;
pub use dispatch::{dispatch_frame, Outcome};
pub use serial::{SerialConfig, SerialHandle, SerialRemote};
pub use server::{RemoteServer, ServerHandle, TcpServerConfig};

/// Product name reported in the MOTD frame sent to every new connection.
pub const PRODUCT_NAME: &str = "Net Remote";

/// Product version reported in the MOTD frame.
pub const PRODUCT_VERSION: &str = env!("CARGO_PKG_VERSION");
