//! Minimal HTTP/1.1 client.
//!
//! Plain HTTP over `std::net::TcpStream`, and HTTPS when built with the
//! `tls-rustls` feature. One request per connection (`Connection: close`).

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use navpane_types::params::{Params, encode_pairs};
use navpane_types::{Address, resolve};

/// Maximum number of redirects to follow.
pub const MAX_REDIRECTS: u8 = 5;

/// Headroom allowed on top of the body limit for status line and headers.
const HEADER_ALLOWANCE: usize = 16 * 1024;

/// Transport limits and identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub max_body_bytes: usize,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(15),
            max_body_bytes: 8 * 1024 * 1024,
            user_agent: concat!("navpane/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Transport-level failures.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("unsupported scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("HTTPS is not available in this build")]
    TlsUnavailable,

    #[cfg(feature = "tls-rustls")]
    #[error("TLS error: {0}")]
    Tls(String),

    #[error("DNS resolution failed for {host}")]
    Dns {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("no addresses for {0}")]
    NoAddress(String),

    #[error("TCP connect failed")]
    Connect(#[source] io::Error),

    #[error("connection I/O failed")]
    Io(#[source] io::Error),

    #[error("malformed HTTP response: {0}")]
    Malformed(String),

    #[error("response body exceeds {0} bytes")]
    TooLarge(usize),

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("bad redirect Location `{0}`")]
    BadRedirect(String),
}

/// Convenience alias for HTTP operations.
pub type HttpResult<T> = std::result::Result<T, HttpError>;

/// A parsed HTTP response.
#[derive(Debug)]
pub struct HttpResponse {
    /// Address that produced this response after redirects.
    pub address: String,
    pub status_code: u16,
    /// Headers as (lowercase name, value) pairs.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Request method and payload.
#[derive(Debug, Clone)]
enum Method {
    Get,
    Post { body: Vec<u8>, content_type: &'static str },
}

impl Method {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post { .. } => "POST",
        }
    }
}

trait Transport: Read + Write {}

impl<T: Read + Write> Transport for T {}

// -------------------------------------------------------------------
// Client
// -------------------------------------------------------------------

/// Blocking HTTP client with bounded timeouts and body size.
pub struct HttpClient {
    settings: HttpSettings,
    #[cfg(feature = "tls-rustls")]
    tls: crate::tls::TlsConnector,
}

impl HttpClient {
    pub fn new(settings: HttpSettings) -> Self {
        Self {
            settings,
            #[cfg(feature = "tls-rustls")]
            tls: crate::tls::TlsConnector::new(),
        }
    }

    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    /// GET, following redirects.
    pub fn get(&self, address: &Address) -> HttpResult<HttpResponse> {
        self.execute(address, Method::Get)
    }

    /// POST `params` as an `application/x-www-form-urlencoded` body.
    ///
    /// 301, 302 and 303 redirects continue as GET; 307 and 308 repeat the
    /// POST.
    pub fn post_form(&self, address: &Address, params: &Params) -> HttpResult<HttpResponse> {
        let method = Method::Post {
            body: encode_pairs(params).into_bytes(),
            content_type: "application/x-www-form-urlencoded",
        };
        self.execute(address, method)
    }

    fn execute(&self, address: &Address, mut method: Method) -> HttpResult<HttpResponse> {
        let mut current = address.clone();
        for _ in 0..=MAX_REDIRECTS {
            check_scheme(&current)?;
            log::debug!("HTTP {} {current}", method.as_str());
            let resp = self.do_request(&current, &method)?;

            if is_redirect(resp.status_code)
                && let Some(location) = resp.header("location")
            {
                let next = resolve(location, &current)
                    .map_err(|_| HttpError::BadRedirect(location.to_string()))?;
                log::debug!("{} redirect to {next}", resp.status_code);
                if matches!(resp.status_code, 301 | 302 | 303) {
                    method = Method::Get;
                }
                current = next;
                continue;
            }

            return Ok(HttpResponse {
                address: current.to_string(),
                ..resp
            });
        }
        Err(HttpError::TooManyRedirects)
    }

    /// Connect, optionally upgrade to TLS, send, read and parse.
    fn do_request(&self, address: &Address, method: &Method) -> HttpResult<HttpResponse> {
        let is_https = address.scheme == "https";
        let port = address.port.unwrap_or(if is_https { 443 } else { 80 });
        let tcp = self.tcp_connect(&address.host, port)?;

        let mut stream: Box<dyn Transport> = if is_https {
            self.wrap_tls(tcp, &address.host)?
        } else {
            Box::new(tcp)
        };

        self.send_request(&mut stream, address, method, is_https)?;
        let raw = self.read_response(&mut stream)?;
        parse_response(&raw, self.settings.max_body_bytes)
    }

    #[cfg(feature = "tls-rustls")]
    fn wrap_tls(&self, tcp: TcpStream, host: &str) -> HttpResult<Box<dyn Transport>> {
        Ok(Box::new(self.tls.connect(tcp, host)?))
    }

    #[cfg(not(feature = "tls-rustls"))]
    fn wrap_tls(&self, _tcp: TcpStream, _host: &str) -> HttpResult<Box<dyn Transport>> {
        Err(HttpError::TlsUnavailable)
    }

    /// Open a TCP connection with the configured timeouts.
    fn tcp_connect(&self, host: &str, port: u16) -> HttpResult<TcpStream> {
        let addr = format!("{host}:{port}")
            .to_socket_addrs()
            .map_err(|source| HttpError::Dns {
                host: host.to_string(),
                source,
            })?
            .next()
            .ok_or_else(|| HttpError::NoAddress(format!("{host}:{port}")))?;

        let stream = TcpStream::connect_timeout(&addr, self.settings.connect_timeout)
            .map_err(HttpError::Connect)?;
        stream
            .set_read_timeout(Some(self.settings.read_timeout))
            .map_err(HttpError::Io)?;
        Ok(stream)
    }

    fn send_request(
        &self,
        stream: &mut impl Write,
        address: &Address,
        method: &Method,
        is_https: bool,
    ) -> HttpResult<()> {
        let default_port: u16 = if is_https { 443 } else { 80 };
        let host_header = match address.port {
            Some(p) if p != default_port => format!("{}:{p}", address.host),
            _ => address.host.clone(),
        };

        let mut target = if address.path.is_empty() {
            "/".to_string()
        } else {
            address.path.clone()
        };
        if let Some(ref q) = address.query {
            target.push('?');
            target.push_str(q);
        }

        let mut request = format!(
            "{} {target} HTTP/1.1\r\n\
             Host: {host_header}\r\n\
             User-Agent: {}\r\n\
             Accept: */*\r\n\
             Connection: close\r\n",
            method.as_str(),
            self.settings.user_agent,
        );
        let body: &[u8] = match method {
            Method::Get => &[],
            Method::Post { body, content_type } => {
                request.push_str(&format!(
                    "Content-Type: {content_type}\r\nContent-Length: {}\r\n",
                    body.len()
                ));
                body.as_slice()
            },
        };
        request.push_str("\r\n");

        stream.write_all(request.as_bytes()).map_err(HttpError::Io)?;
        stream.write_all(body).map_err(HttpError::Io)?;
        stream.flush().map_err(HttpError::Io)
    }

    /// Read until EOF or until the read timeout fires.
    fn read_response(&self, stream: &mut impl Read) -> HttpResult<Vec<u8>> {
        let limit = self.settings.max_body_bytes + HEADER_ALLOWANCE;
        let mut buf = Vec::with_capacity(8192);
        let mut chunk = [0u8; 8192];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    if buf.len() + n > limit {
                        return Err(HttpError::TooLarge(self.settings.max_body_bytes));
                    }
                    buf.extend_from_slice(&chunk[..n]);
                },
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut =>
                {
                    break;
                },
                Err(e) => return Err(HttpError::Io(e)),
            }
        }
        Ok(buf)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(HttpSettings::default())
    }
}

fn check_scheme(address: &Address) -> HttpResult<()> {
    match address.scheme.as_str() {
        "http" | "https" => Ok(()),
        other => Err(HttpError::UnsupportedScheme(other.to_string())),
    }
}

// -------------------------------------------------------------------
// Response parsing
// -------------------------------------------------------------------

/// Parse raw bytes into status code, headers, and body.
pub fn parse_response(data: &[u8], max_body: usize) -> HttpResult<HttpResponse> {
    let header_end = find_subsequence(data, b"\r\n\r\n")
        .ok_or_else(|| HttpError::Malformed("no header terminator".to_string()))?;

    let header_str = std::str::from_utf8(&data[..header_end])
        .map_err(|_| HttpError::Malformed("non-UTF-8 headers".to_string()))?;
    let mut lines = header_str.split("\r\n");

    let status_line = lines
        .next()
        .ok_or_else(|| HttpError::Malformed("empty response".to_string()))?;
    let status_code = parse_status_line(status_line)?;

    let mut headers = Vec::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_lowercase(), value.trim().to_string()));
        }
    }

    let raw_body = &data[header_end + 4..];
    let body = if find_header(&headers, "transfer-encoding").is_some_and(|v| v.contains("chunked"))
    {
        decode_chunked(raw_body, max_body)?
    } else if let Some(cl) = find_header(&headers, "content-length") {
        let len: usize = cl
            .parse()
            .map_err(|_| HttpError::Malformed(format!("bad Content-Length `{cl}`")))?;
        if len > max_body {
            return Err(HttpError::TooLarge(max_body));
        }
        raw_body[..raw_body.len().min(len)].to_vec()
    } else {
        raw_body.to_vec()
    };

    if body.len() > max_body {
        return Err(HttpError::TooLarge(max_body));
    }

    Ok(HttpResponse {
        address: String::new(),
        status_code,
        headers,
        body,
    })
}

/// `HTTP/1.x NNN reason`.
fn parse_status_line(line: &str) -> HttpResult<u16> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or("");
    if !version.starts_with("HTTP/") {
        return Err(HttpError::Malformed(format!("bad status line `{line}`")));
    }
    parts
        .next()
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| HttpError::Malformed(format!("bad status code in `{line}`")))
}

/// Case-insensitive header lookup.
fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    let name_lower = name.to_lowercase();
    headers
        .iter()
        .find(|(k, _)| k == &name_lower)
        .map(|(_, v)| v.as_str())
}

/// Decode a chunked transfer-encoded body.
fn decode_chunked(data: &[u8], max_body: usize) -> HttpResult<Vec<u8>> {
    let mut result = Vec::new();
    let mut pos = 0;

    while let Some(i) = find_subsequence(&data[pos..], b"\r\n") {
        let line_end = pos + i;
        let size_line = std::str::from_utf8(&data[pos..line_end])
            .map_err(|_| HttpError::Malformed("bad chunk size".to_string()))?;
        // Chunk extensions follow `;`.
        let size_str = size_line.split(';').next().unwrap_or("").trim();
        let chunk_size = usize::from_str_radix(size_str, 16)
            .map_err(|_| HttpError::Malformed(format!("bad chunk size `{size_str}`")))?;

        if chunk_size == 0 {
            break;
        }
        match result.len().checked_add(chunk_size) {
            Some(total) if total <= max_body => {},
            _ => return Err(HttpError::TooLarge(max_body)),
        }

        let chunk_start = line_end + 2;
        let chunk_end = chunk_start
            .checked_add(chunk_size)
            .ok_or_else(|| HttpError::Malformed("chunk size overflows".to_string()))?;
        if chunk_end > data.len() {
            // Truncated final chunk.
            result.extend_from_slice(&data[chunk_start..]);
            break;
        }
        result.extend_from_slice(&data[chunk_start..chunk_end]);
        pos = (chunk_end + 2).min(data.len());
    }

    Ok(result)
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
