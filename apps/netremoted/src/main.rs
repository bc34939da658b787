//! Standalone remote-control daemon wired to an in-memory radio.
//!
//! The engine normally embeds in a host radio application; this binary runs
//! it against [`MockRadio`] so the protocol can be exercised end to end from
//! any TCP or serial client.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use netremote_core::control::MockRadio;
use netremote_core::serial::{available_ports, SerialConfig, SerialRemote};
use netremote_core::server::{RemoteServer, TcpServerConfig};
use netremote_core::RadioControl;
use tokio::signal;
use tracing::{error, info};

mod telemetry;

#[derive(Debug, Parser)]
#[command(name = "netremoted", author, version, about = "JSON remote-control server for a software radio")]
struct Cli {
    /// Address to bind the TCP listener to.
    #[arg(long, env = "NETREMOTE_LISTEN_ADDR", default_value = "0.0.0.0:3382")]
    listen_addr: String,

    /// Maximum concurrently served TCP clients.
    #[arg(long, env = "NETREMOTE_MAX_CLIENTS", default_value_t = 4)]
    max_clients: usize,

    /// Dead-peer sweep interval in milliseconds.
    #[arg(long, env = "NETREMOTE_SWEEP_MS", default_value_t = 1000)]
    sweep_ms: u64,

    /// Serial device to serve in addition to TCP (e.g. /dev/ttyUSB0).
    #[arg(long, env = "NETREMOTE_SERIAL_PORT")]
    serial_port: Option<String>,

    /// Serial line rate.
    #[arg(long, env = "NETREMOTE_BAUD", default_value_t = 115_200)]
    baud: u32,

    /// List detected serial ports and exit.
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init()?;
    let cli = Cli::parse();

    if cli.list_ports {
        for port in available_ports().context("serial port enumeration failed")? {
            println!("{port}");
        }
        return Ok(());
    }

    let tcp_config = TcpServerConfig {
        bind: cli
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address: {}", cli.listen_addr))?,
        max_clients: cli.max_clients,
        sweep_interval: Duration::from_millis(cli.sweep_ms),
    };

    let radio: Arc<dyn RadioControl> = Arc::new(MockRadio::new());

    let server = RemoteServer::bind(tcp_config, radio.clone())
        .await
        .context("failed to start TCP server")?;
    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server.run());

    let serial_handle = cli.serial_port.as_ref().map(|port| {
        let serial = SerialRemote::new(
            SerialConfig {
                port: port.clone(),
                baud_rate: cli.baud,
            },
            radio.clone(),
        );
        let handle = serial.handle();
        let task = tokio::spawn(serial.run());
        (handle, task)
    });

    info!("netremoted running; ctrl-c to stop");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
        result = &mut server_task => {
            match result {
                Ok(Err(err)) => error!(error = %err, "TCP server failed"),
                Ok(Ok(())) => info!("TCP server exited"),
                Err(err) => error!(error = %err, "TCP server task panicked"),
            }
        }
    }

    server_handle.stop();
    if let Some((handle, task)) = serial_handle {
        handle.stop();
        match task.await {
            Ok(Err(err)) => error!(error = %err, "serial transport failed"),
            Ok(Ok(())) => {}
            Err(err) => error!(error = %err, "serial task panicked"),
        }
    }
    if !server_task.is_finished() {
        let _ = server_task.await;
    }

    Ok(())
}
