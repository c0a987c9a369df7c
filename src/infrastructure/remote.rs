//! JSON-lines release client over TCP, optionally wrapped in TLS.
//!
//! Each request is one JSON object on one line; the remote answers with one
//! line holding a `RemoteResponse`.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{ClientConnection, StreamOwned};
use tracing::debug;

use crate::application::Channel;
use crate::domain::{RemoteCallError, RemoteRequest, RemoteResponse};
use crate::infrastructure::traits::{ReleaseClient, ReleaseClientFactory};

/// Remote operations such as install may run for minutes.
const READ_TIMEOUT: Duration = Duration::from_secs(300);
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
pub struct TcpReleaseClientFactory;

impl ReleaseClientFactory for TcpReleaseClientFactory {
    fn connect(&self, channel: &Channel) -> Result<Box<dyn ReleaseClient>, RemoteCallError> {
        Ok(Box::new(TcpReleaseClient::connect(channel)?))
    }
}

enum Transport {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Transport::Plain(s) => s.read(buf),
            Transport::Tls(s) => s.read(buf),
        }
    }
}

impl Write for Transport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Transport::Plain(s) => s.write(buf),
            Transport::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Transport::Plain(s) => s.flush(),
            Transport::Tls(s) => s.flush(),
        }
    }
}

pub struct TcpReleaseClient {
    stream: BufReader<Transport>,
}

impl TcpReleaseClient {
    pub fn connect(channel: &Channel) -> Result<Self, RemoteCallError> {
        let unavailable =
            |e: &dyn std::fmt::Display| RemoteCallError::unavailable(format!("{}: {}", channel.address, e));

        let tcp = TcpStream::connect(&channel.address).map_err(|e| unavailable(&e))?;
        tcp.set_read_timeout(Some(READ_TIMEOUT))
            .map_err(|e| unavailable(&e))?;
        tcp.set_write_timeout(Some(WRITE_TIMEOUT))
            .map_err(|e| unavailable(&e))?;

        let transport = match &channel.credential {
            None => Transport::Plain(tcp),
            Some(credential) => {
                let name = ServerName::try_from(host_of(&channel.address).to_string())
                    .map_err(|e| unavailable(&e))?;
                let conn = ClientConnection::new(credential.client_config(), name)
                    .map_err(|e| unavailable(&e))?;
                Transport::Tls(Box::new(StreamOwned::new(conn, tcp)))
            }
        };
        debug!(
            "Connected to {} ({})",
            channel.address,
            if channel.is_secure() { "tls" } else { "plain" }
        );
        Ok(Self {
            stream: BufReader::new(transport),
        })
    }
}

impl ReleaseClient for TcpReleaseClient {
    fn call(&mut self, request: &RemoteRequest) -> Result<String, RemoteCallError> {
        let io_err = |e: io::Error| RemoteCallError::unavailable(e.to_string());

        let msg = serde_json::to_string(request)
            .map_err(|e| RemoteCallError::unavailable(format!("cannot encode request: {}", e)))?;
        debug!("remote call: {}", request.operation);

        let writer = self.stream.get_mut();
        writeln!(writer, "{}", msg).map_err(io_err)?;
        writer.flush().map_err(io_err)?;

        let mut line = String::new();
        self.stream.read_line(&mut line).map_err(io_err)?;
        if line.is_empty() {
            return Err(RemoteCallError::unavailable("empty response from remote"));
        }

        let response: RemoteResponse = serde_json::from_str(&line).map_err(|e| {
            RemoteCallError::unavailable(format!("invalid response from remote: {}", e))
        })?;
        response.into_result()
    }
}

/// Host part of `host:port`, without IPv6 brackets.
fn host_of(address: &str) -> &str {
    let host = match address.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => address,
    };
    host.trim_start_matches('[').trim_end_matches(']')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RemoteErrorKind;
    use std::collections::BTreeMap;
    use std::net::TcpListener;

    fn serve_one(response: &'static str) -> (String, std::thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            writeln!(stream, "{}", response).unwrap();
            stream.flush().unwrap();
            line
        });
        (address, handle)
    }

    fn plain(address: String) -> Channel {
        Channel {
            address,
            credential: None,
        }
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("localhost:44134"), "localhost");
        assert_eq!(host_of("[::1]:44134"), "::1");
        assert_eq!(host_of("tiller.example"), "tiller.example");
    }

    #[test]
    fn test_call_sends_request_line_and_returns_body() {
        let (address, handle) = serve_one(r#"{"status":"ok","body":"NAME\tREVISION"}"#);

        let mut client = TcpReleaseClient::connect(&plain(address)).unwrap();
        let body = client
            .call(&RemoteRequest::new("list", Vec::new(), BTreeMap::new()))
            .unwrap();

        assert_eq!(body, "NAME\tREVISION");
        let sent = handle.join().unwrap();
        assert!(sent.contains(r#""operation":"list""#));
    }

    #[test]
    fn test_call_error_response() {
        let (address, handle) =
            serve_one(r#"{"status":"error","code":"not_found","description":"release not found"}"#);

        let mut client = TcpReleaseClient::connect(&plain(address)).unwrap();
        let err = client
            .call(&RemoteRequest::new("status", vec!["x".to_string()], BTreeMap::new()))
            .unwrap_err();

        assert_eq!(err.kind, RemoteErrorKind::NotFound);
        assert_eq!(err.description, "release not found");
        handle.join().unwrap();
    }

    #[test]
    fn test_connect_refused_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = TcpReleaseClient::connect(&plain(address)).err().unwrap();

        assert_eq!(err.kind, RemoteErrorKind::Unavailable);
    }
}
