use crate::catalog::VideoCatalog;
use crate::stream::{AsciiStream, RenderOptions};
use crate::{MAX_WIDTH, MIN_WIDTH};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Width used when the client omits the parameter or sends garbage
const DEFAULT_WIDTH: u32 = 100;

/// Upper bound on request head size; anything larger is rejected
const MAX_REQUEST_BYTES: usize = 8192;

/// HTTP server exposing the video catalog and the ASCII frame streams.
///
/// The HTTP layer is deliberately minimal: GET-only, two routes, hand-parsed
/// request head, close-delimited streaming bodies. Each connection gets its
/// own task and, for stream routes, its own exclusively-owned decoder.
pub struct Server {
    catalog: Arc<VideoCatalog>,
    server_url: String,
}

/// Catalog listing returned on `/`
#[derive(Debug, Serialize)]
struct CatalogResponse {
    available_videos: Vec<String>,
    instructions: String,
}

/// JSON error body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// The parts of a request head the routes care about
#[derive(Debug, PartialEq, Eq)]
struct Request {
    method: String,
    path: String,
    query: HashMap<String, String>,
    user_agent: String,
}

impl Server {
    pub fn new(catalog: VideoCatalog, server_url: String) -> Self {
        Self {
            catalog: Arc::new(catalog),
            server_url,
        }
    }

    /// Bind and serve forever
    pub async fn run(self, addr: &str) -> crate::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("Listening on {}", addr);
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener
    pub async fn serve(self, listener: TcpListener) -> crate::Result<()> {
        loop {
            let (socket, peer) = listener.accept().await?;
            debug!("Connection from {}", peer);

            let catalog = Arc::clone(&self.catalog);
            let server_url = self.server_url.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(socket, catalog, server_url).await {
                    debug!("Connection from {} ended: {}", peer, e);
                }
            });
        }
    }
}

async fn handle_connection(
    mut socket: TcpStream,
    catalog: Arc<VideoCatalog>,
    server_url: String,
) -> std::io::Result<()> {
    let request = match read_request(&mut socket).await? {
        Some(request) => request,
        None => return Ok(()), // client sent nothing parseable
    };

    debug!("{} {} (ua: {})", request.method, request.path, request.user_agent);

    if request.method != "GET" {
        return write_plain(&mut socket, "405 Method Not Allowed", "Method not allowed.\n").await;
    }

    if request.path == "/" {
        let body = CatalogResponse {
            available_videos: catalog.names(),
            instructions: format!(
                "Use curl to stream a video: curl {}/<video_name>?width=100&color=true",
                server_url
            ),
        };
        return write_json(&mut socket, "200 OK", &body).await;
    }

    // Single path segment names a video; anything nested is unknown.
    let name = request.path.trim_start_matches('/');
    if name.is_empty() || name.contains('/') {
        let body = ErrorResponse {
            error: format!("Video '{}' not found.", name),
        };
        return write_json(&mut socket, "404 Not Found", &body).await;
    }

    if !is_curl_agent(&request.user_agent) {
        return write_plain(&mut socket, "403 Forbidden", "Access denied. Only curl allowed.").await;
    }

    let Some(video_path) = catalog.get(name) else {
        let body = ErrorResponse {
            error: format!("Video '{}' not found.", name),
        };
        return write_json(&mut socket, "404 Not Found", &body).await;
    };

    let options = RenderOptions {
        width: parse_width(request.query.get("width").map(String::as_str)),
        color: parse_bool(request.query.get("color").map(String::as_str), true),
    };

    let mut stream = match AsciiStream::open(video_path, options) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Failed to open stream for '{}': {}", name, e);
            let body = ErrorResponse {
                error: e.to_string(),
            };
            return write_json(&mut socket, "500 Internal Server Error", &body).await;
        }
    };

    // Headers first; from here on errors can only end the stream, not change
    // the status.
    socket
        .write_all(
            b"HTTP/1.1 200 OK\r\n\
              Content-Type: text/plain; charset=utf-8\r\n\
              Connection: close\r\n\r\n",
        )
        .await?;

    while let Some(chunk) = stream.next_chunk().await {
        if let Err(e) = socket.write_all(chunk.as_bytes()).await {
            // Consumer went away; dropping the stream releases the decoder.
            debug!("Client disconnected mid-stream: {}", e);
            break;
        }
    }

    socket.flush().await
}

/// Read and parse the request head. Returns `None` for unparseable input.
async fn read_request(socket: &mut TcpStream) -> std::io::Result<Option<Request>> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if buf.len() > MAX_REQUEST_BYTES {
            debug!("Request head exceeded {} bytes, dropping", MAX_REQUEST_BYTES);
            return Ok(None);
        }
    }

    let head = String::from_utf8_lossy(&buf);
    Ok(parse_request_head(&head))
}

/// Parse a request head (request line plus headers) into a [`Request`]
fn parse_request_head(head: &str) -> Option<Request> {
    let mut lines = head.lines();
    let request_line = lines.next()?;

    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?;
    parts.next()?; // HTTP version, present but unused

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), parse_query(query)),
        None => (target.to_string(), HashMap::new()),
    };

    let mut user_agent = String::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case("user-agent") {
                user_agent = value.trim().to_string();
            }
        }
    }

    Some(Request {
        method,
        path,
        query,
        user_agent,
    })
}

/// Parse a query string into key/value pairs (no percent-decoding; video
/// names and the two recognized parameters are plain ASCII)
fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Width parameter: integer in `[MIN_WIDTH, MAX_WIDTH]`, anything else (absent,
/// unparseable, out of range) falls back to the default
fn parse_width(param: Option<&str>) -> u32 {
    match param.and_then(|value| value.parse::<u32>().ok()) {
        Some(width) if (MIN_WIDTH..=MAX_WIDTH).contains(&width) => width,
        _ => DEFAULT_WIDTH,
    }
}

/// Boolean parameter: `1/true/yes/on` and `0/false/no/off`, case-insensitive;
/// anything else yields the default
fn parse_bool(param: Option<&str>, default: bool) -> bool {
    match param {
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        None => default,
    }
}

/// Only terminal-emulating curl clients may consume a stream
fn is_curl_agent(user_agent: &str) -> bool {
    user_agent.to_ascii_lowercase().contains("curl")
}

async fn write_plain(socket: &mut TcpStream, status: &str, body: &str) -> std::io::Result<()> {
    write_response(socket, status, "text/plain; charset=utf-8", body.as_bytes()).await
}

async fn write_json<T: Serialize>(
    socket: &mut TcpStream,
    status: &str,
    body: &T,
) -> std::io::Result<()> {
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    write_response(socket, status, "application/json", &bytes).await
}

async fn write_response(
    socket: &mut TcpStream,
    status: &str,
    content_type: &str,
    body: &[u8],
) -> std::io::Result<()> {
    let header = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    socket.write_all(header.as_bytes()).await?;
    socket.write_all(body).await?;
    socket.flush().await
}
