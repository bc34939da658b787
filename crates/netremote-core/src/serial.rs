//! Serial transport: one point-to-point session over a serial line.
//!
//! Same framing and dispatch pipeline as the TCP server, minus the client
//! cap and the liveness sweep. The pump is generic over the byte stream so
//! the session logic is exercised in tests over an in-memory duplex.

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_BAUD;
use crate::control::RadioControl;
use crate::dispatch::{dispatch_frame, Outcome};
use crate::protocol::{codec, Feed, FrameAssembler};

const READ_BUFFER: usize = 4096;

#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: String,
    pub baud_rate: u32,
}

impl SerialConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD,
        }
    }
}

#[derive(Debug, Error)]
pub enum SerialError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: tokio_serial::Error,
    },
    #[error("serial port enumeration failed: {0}")]
    Enumerate(#[source] tokio_serial::Error),
    #[error("serial I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Names of the serial ports present on this machine, ascending.
pub fn available_ports() -> Result<Vec<String>, SerialError> {
    let mut names: Vec<String> = tokio_serial::available_ports()
        .map_err(SerialError::Enumerate)?
        .into_iter()
        .map(|port| port.port_name)
        .collect();
    names.sort();
    Ok(names)
}

pub struct SerialRemote {
    config: SerialConfig,
    control: Arc<dyn RadioControl>,
    stop: watch::Sender<bool>,
}

/// Clonable stop handle for the serial run.
#[derive(Clone)]
pub struct SerialHandle {
    stop: watch::Sender<bool>,
}

impl SerialHandle {
    /// Idempotent; the running pump closes the port and returns.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }
}

impl SerialRemote {
    pub fn new(config: SerialConfig, control: Arc<dyn RadioControl>) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            config,
            control,
            stop,
        }
    }

    pub fn handle(&self) -> SerialHandle {
        SerialHandle {
            stop: self.stop.clone(),
        }
    }

    /// Open the port and serve it until [`SerialHandle::stop`], an `exe
    /// close`, or a port failure. Open failures are the owner's to surface;
    /// no client ever sees them.
    pub async fn run(self) -> Result<(), SerialError> {
        let port = tokio_serial::new(&self.config.port, self.config.baud_rate)
            .open_native_async()
            .map_err(|source| SerialError::Open {
                port: self.config.port.clone(),
                source,
            })?;
        info!(port = %self.config.port, baud = self.config.baud_rate, "serial remote started");
        let result = pump(port, self.control.as_ref(), self.stop.subscribe()).await;
        info!(port = %self.config.port, "serial remote stopped");
        result
    }
}

/// Session loop shared with tests: MOTD first, then accumulate, dispatch and
/// reply one frame at a time. Garbage frames are discarded without a reply
/// and the session keeps going.
async fn pump<S>(
    mut stream: S,
    control: &dyn RadioControl,
    mut stop_rx: watch::Receiver<bool>,
) -> Result<(), SerialError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(codec::motd().as_bytes()).await?;

    let mut assembler = FrameAssembler::new();
    let mut buf = [0u8; READ_BUFFER];
    loop {
        tokio::select! {
            _ = async { stop_rx.wait_for(|stopped| *stopped).await.map(|_| ()) } => return Ok(()),
            read = stream.read(&mut buf) => {
                let n = read?;
                if n == 0 {
                    debug!("serial stream ended");
                    return Ok(());
                }
                let chunk = String::from_utf8_lossy(&buf[..n]);
                match assembler.feed(&chunk) {
                    Feed::Pending => {}
                    Feed::Overflow => warn!("serial frame overflowed; resynchronising"),
                    Feed::Frame(frame) => match dispatch_frame(&frame, control) {
                        Outcome::Reply(response) => {
                            stream.write_all(codec::encode(&response).as_bytes()).await?;
                        }
                        Outcome::Silent | Outcome::Garbage => {}
                        Outcome::CloseSession => {
                            debug!("serial session closed by client");
                            return Ok(());
                        }
                    },
                }
            }
        }
    }
}
