use thiserror::Error;
use tracing::*;

use crate::{config::ServerConfig, payload::Payload};

pub mod tcp;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("transport is not connected")]
    NotConnected,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Synchronous-style byte stream to the upload server
#[async_trait::async_trait]
pub trait Transport: Send {
    async fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError>;

    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Next response line without its line terminator, `None` once the peer has closed
    async fn read_line(&mut self) -> Result<Option<String>, TransportError>;

    /// Drop the connection, if any
    async fn close(&mut self);
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("connection to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        source: TransportError,
    },

    #[error("writing request to {host}:{port} failed: {source}")]
    Write {
        host: String,
        port: u16,
        source: TransportError,
    },
}

/// What came back from a send that counts as delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Status code parsed from the first response line, if it looked like one
    pub status: Option<u16>,
    /// Number of response lines drained before the connection closed
    pub response_lines: usize,
}

/// Build the full HTTP/1.1 POST request carrying `body`
pub fn build_request(server: &ServerConfig, body: &str) -> String {
    format!(
        "POST {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Content-Type: application/x-www-form-urlencoded\r\n\
         Content-Length: {len}\r\n\
         \r\n\
         {body}",
        path = server.path,
        host = server.host,
        len = body.len(),
    )
}

/// Pull the status code out of `HTTP/1.x <code> <reason>`
pub fn parse_status_line(line: &str) -> Option<u16> {
    let mut parts = line.split_whitespace();
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

/// Posts payloads to the configured server over a [`Transport`]
#[derive(Debug)]
pub struct TransmissionClient<T: Transport> {
    transport: T,
    server: ServerConfig,
}

impl<T: Transport> TransmissionClient<T> {
    pub fn new(transport: T, server: ServerConfig) -> Self {
        Self { transport, server }
    }

    /// Connect, write the request and drain the response.
    ///
    /// A connection plus a completed write counts as delivered. The response is logged line by
    /// line but its status never turns a send into a failure.
    pub async fn send_payload(&mut self, payload: &Payload) -> Result<Delivery, SendError> {
        let ServerConfig { host, port, .. } = &self.server;
        let (host, port) = (host.clone(), *port);

        info!("Attempting to connect to server {host}:{port}...");
        if let Err(source) = self.transport.connect(&host, port).await {
            self.transport.close().await;
            return Err(SendError::Connect { host, port, source });
        }
        info!("Connected to server");

        let body = payload.to_form_body();
        let request = build_request(&self.server, &body);
        debug!("POST body: {body}");

        if let Err(source) = self.transport.write_all(request.as_bytes()).await {
            self.transport.close().await;
            return Err(SendError::Write { host, port, source });
        }

        let delivery = self.drain_response().await;
        self.transport.close().await;
        info!("Data sent");

        Ok(delivery)
    }

    async fn drain_response(&mut self) -> Delivery {
        let mut delivery = Delivery {
            status: None,
            response_lines: 0,
        };

        loop {
            match self.transport.read_line().await {
                Ok(Some(line)) => {
                    if delivery.response_lines == 0 {
                        delivery.status = parse_status_line(&line);
                    }
                    delivery.response_lines += 1;
                    info!("{line}");
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("Stopped reading server response: {err}");
                    break;
                }
            }
        }

        match delivery.status {
            Some(status) if !(200..300).contains(&status) => {
                warn!("Server answered with status {status}, payload still counted as sent");
            }
            None => warn!("Server response carried no recognizable status line"),
            _ => {}
        }

        delivery
    }
}
