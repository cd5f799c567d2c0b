//! Minimal HTTP/1.1 server shared by the scan gateway and the health responder.
//!
//! One request per connection (`Connection: close`). Connections are capped
//! by a semaphore, headers and bodies are read under a deadline, and bodies
//! larger than the configured limit are rejected with `413` before they are
//! buffered.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bytes::Bytes;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use scanward_core::pipeline::BoxFuture;

/// Upper bound for the request line plus all headers.
const MAX_HEADER_BYTES: usize = 16 * 1024;

/// A parsed HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Request {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    /// JSON response. Serialization failures degrade to a bare 500.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(e) => {
                warn!(error = %e, "failed to serialize response body");
                Self::message(500, "internal error")
            }
        }
    }

    /// `{"message": ...}` error body.
    pub fn message(status: u16, message: impl Into<String>) -> Self {
        let body = serde_json::json!({ "message": message.into() });
        Self {
            status,
            content_type: "application/json",
            body: body.to_string().into_bytes(),
        }
    }

    /// Serialize status line, headers and body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            reason_phrase(self.status),
            self.content_type,
            self.body.len()
        )
        .into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Why a request could not be read.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadError {
    /// Peer closed before sending a request line.
    Closed,
    Malformed(String),
    TooLarge { limit: usize },
    Timeout,
    Io(String),
}

impl ReadError {
    /// Response to send back, if the connection is still usable.
    pub fn response(&self) -> Option<Response> {
        match self {
            Self::Closed | Self::Io(_) => None,
            Self::Malformed(reason) => Some(Response::message(400, reason.clone())),
            Self::TooLarge { limit } => Some(Response::message(
                413,
                format!("request body exceeds {limit} bytes"),
            )),
            Self::Timeout => Some(Response::message(408, "request read timed out")),
        }
    }
}

/// Read one request, bounded by `max_body` bytes and `deadline`.
pub async fn read_request<R>(
    stream: R,
    max_body: usize,
    deadline: Duration,
) -> Result<Request, ReadError>
where
    R: AsyncRead + Unpin,
{
    tokio::time::timeout(deadline, read_request_inner(stream, max_body))
        .await
        .map_err(|_| ReadError::Timeout)?
}

async fn read_request_inner<R>(stream: R, max_body: usize) -> Result<Request, ReadError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut consumed = 0usize;

    let request_line = read_header_line(&mut reader, &mut consumed).await?;
    if request_line.is_empty() {
        return Err(ReadError::Closed);
    }
    let mut parts = request_line.split_whitespace();
    let (method, path) = match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(path), Some(version)) if version.starts_with("HTTP/1.") => {
            (method.to_owned(), path.to_owned())
        }
        _ => return Err(ReadError::Malformed("invalid request line".to_owned())),
    };

    let mut headers = Vec::new();
    loop {
        let line = read_header_line(&mut reader, &mut consumed).await?;
        if line.is_empty() {
            break;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ReadError::Malformed(format!("invalid header line: {line}")))?;
        headers.push((name.trim().to_owned(), value.trim().to_owned()));
    }

    let mut request = Request {
        method,
        path,
        headers,
        body: Bytes::new(),
    };

    if request
        .header("transfer-encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
    {
        return Err(ReadError::Malformed(
            "chunked transfer encoding is not supported".to_owned(),
        ));
    }

    let length = match request.header("content-length") {
        Some(v) => v
            .parse::<usize>()
            .map_err(|_| ReadError::Malformed("invalid content-length".to_owned()))?,
        None => 0,
    };
    if length > max_body {
        return Err(ReadError::TooLarge { limit: max_body });
    }

    // Grows with the bytes actually received, not the declared length.
    let mut body = Vec::new();
    let received = (&mut reader)
        .take(length as u64)
        .read_to_end(&mut body)
        .await
        .map_err(|e| ReadError::Io(e.to_string()))?;
    if received < length {
        return Err(ReadError::Malformed(format!(
            "body truncated: expected {} bytes, received {}",
            length, received
        )));
    }
    request.body = Bytes::from(body);
    Ok(request)
}

/// Read a CRLF-terminated line, trimmed. Returns an empty string at EOF.
async fn read_header_line<R>(
    reader: &mut BufReader<R>,
    consumed: &mut usize,
) -> Result<String, ReadError>
where
    R: AsyncRead + Unpin,
{
    let mut line = String::new();
    let limit = (MAX_HEADER_BYTES - *consumed) as u64 + 1;
    let n = (&mut *reader)
        .take(limit)
        .read_line(&mut line)
        .await
        .map_err(|e| ReadError::Io(e.to_string()))?;
    *consumed += n;
    if *consumed > MAX_HEADER_BYTES {
        return Err(ReadError::Malformed("request headers too large".to_owned()));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

/// Request handler plugged into an [`HttpServer`].
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: Request) -> BoxFuture<'_, Response>;
}

/// Connection limits for an [`HttpServer`].
#[derive(Debug, Clone, Copy)]
pub struct ServerLimits {
    pub max_connections: usize,
    pub max_body: usize,
    pub read_timeout: Duration,
}

/// Accept loop bound to one listener.
pub struct HttpServer {
    name: &'static str,
    listener: TcpListener,
    limits: ServerLimits,
    handler: Arc<dyn Handler>,
}

impl HttpServer {
    /// Bind to `addr` (port 0 picks an ephemeral port).
    pub async fn bind(
        name: &'static str,
        addr: &str,
        limits: ServerLimits,
        handler: Arc<dyn Handler>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("{} failed to bind {}: {}", name, addr, e))?;
        Ok(Self {
            name,
            listener,
            limits,
            handler,
        })
    }

    /// Address actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `cancel` fires. In-flight connections finish on their own.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let addr = self.local_addr()?;
        info!(server = self.name, listen_addr = %addr, "http server listening");

        let semaphore = Arc::new(Semaphore::new(self.limits.max_connections));

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!(server = self.name, error = %e, "accept failed");
                            continue;
                        }
                    };

                    let Ok(permit) = Arc::clone(&semaphore).try_acquire_owned() else {
                        warn!(server = self.name, %peer, "max connections reached, rejecting");
                        tokio::spawn(reject_busy(stream));
                        continue;
                    };

                    let handler = Arc::clone(&self.handler);
                    let limits = self.limits;
                    let name = self.name;
                    tokio::spawn(async move {
                        serve_connection(stream, handler, limits).await;
                        debug!(server = name, %peer, "connection closed");
                        drop(permit);
                    });
                }
                _ = cancel.cancelled() => {
                    info!(server = self.name, "http server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

async fn serve_connection(mut stream: TcpStream, handler: Arc<dyn Handler>, limits: ServerLimits) {
    let (read_half, mut write_half) = stream.split();
    let response = match read_request(read_half, limits.max_body, limits.read_timeout).await {
        Ok(request) => handler.handle(request).await,
        Err(e) => match e.response() {
            Some(response) => {
                debug!(error = ?e, "rejecting request");
                response
            }
            None => return,
        },
    };

    if let Err(e) = write_half.write_all(&response.to_bytes()).await {
        debug!(error = %e, "failed to write response");
        return;
    }
    let _ = write_half.shutdown().await;
}

async fn reject_busy(mut stream: TcpStream) {
    let response = Response::message(503, "too many concurrent connections");
    let _ = stream.write_all(&response.to_bytes()).await;
    let _ = stream.shutdown().await;
}
