//! Raw TCP backend.
//!
//! Most network label printers accept a raw job stream on port 9100. The
//! connection is opened per job and closed after the last byte.

use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{info, instrument, warn};

use super::{PrintBackend, PrintJob};
use crate::error::LabelError;

/// Default raw printing port
pub const DEFAULT_PORT: u16 = 9100;

#[derive(Debug, Clone)]
pub struct TcpBackend {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpBackend {
    /// Parse `host` or `host:port`.
    pub fn new(target: &str) -> Result<Self, LabelError> {
        let target = target.trim_end_matches('/');
        let (host, port) = match target.rsplit_once(':') {
            Some((host, port)) if !host.ends_with(':') => {
                let port = port
                    .parse()
                    .map_err(|_| LabelError::Config(format!("Invalid printer port: {}", port)))?;
                (host, port)
            }
            _ => (target, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(LabelError::Config(format!("Invalid printer address: {}", target)));
        }

        Ok(Self {
            host: host.trim_start_matches('[').trim_end_matches(']').to_string(),
            port,
            timeout: Duration::from_secs(5),
        })
    }

    /// Set connect and write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn failed(&self, message: String) -> LabelError {
        LabelError::Dispatch {
            backend: "tcp",
            message,
            artifact: None,
        }
    }

    fn connect(&self) -> Result<TcpStream, LabelError> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| self.failed(format!("cannot resolve {}: {}", self.host, e)))?
            .collect();

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    warn!(error = %e, %addr, "Connect failed");
                    last_error = Some(e);
                }
            }
        }

        Err(self.failed(match last_error {
            Some(e) => format!("Connection failed: {}:{}: {}", self.host, self.port, e),
            None => format!("no address for {}", self.host),
        }))
    }
}

impl PrintBackend for TcpBackend {
    fn name(&self) -> &'static str {
        "tcp"
    }

    #[instrument(skip(self, job), fields(host = %self.host, port = self.port, data_len = job.bytes.len()))]
    fn dispatch(&self, job: &PrintJob<'_>) -> Result<(), LabelError> {
        info!("Connecting to printer");
        let mut stream = self.connect()?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(|e| self.failed(format!("cannot set timeout: {}", e)))?;

        stream
            .write_all(job.bytes)
            .map_err(|e| self.failed(format!("Write failed: {}", e)))?;
        stream
            .flush()
            .map_err(|e| self.failed(format!("Flush failed: {}", e)))?;

        info!("Print job sent successfully");
        Ok(())
    }
}
