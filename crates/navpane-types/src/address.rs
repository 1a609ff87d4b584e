//! Absolute addresses (`scheme://authority/path?query#fragment`).
//!
//! Parsing is deliberately strict: anything the navigation layer hands to a
//! loader must be a syntactically valid absolute URI. Relative links go
//! through [`crate::resolve::resolve`] first.

use std::fmt;

use crate::error::{NavError, Result};

/// The reserved host that marks an address as application-internal.
pub const LOCAL_HOST: &str = "localhost";

/// A parsed absolute address.
///
/// Components are stored exactly as they appeared in the input, so the
/// [`Display`](fmt::Display) form reproduces the parsed string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    /// Scheme, e.g. `"http"`.
    pub scheme: String,
    /// Optional `user[:password]` before the host.
    pub userinfo: Option<String>,
    /// Host, possibly empty (`file:///x`) or a bracketed IPv6 literal.
    pub host: String,
    /// Explicit port, if any.
    pub port: Option<u16>,
    /// Path, possibly empty. Starts with `/` when present.
    pub path: String,
    /// Query without the leading `?`.
    pub query: Option<String>,
    /// Fragment without the leading `#`.
    pub fragment: Option<String>,
}

impl Address {
    /// Parse an absolute address.
    ///
    /// Fails with [`NavError::MalformedAddress`] when the input is not of
    /// the form `scheme://authority[path][?query][#fragment]` or contains
    /// characters that may not appear in a URI.
    pub fn parse(input: &str) -> Result<Self> {
        validate_characters(input)?;

        let (scheme, rest) = input
            .split_once("://")
            .ok_or_else(|| NavError::malformed(input, "missing `://`"))?;
        validate_scheme(input, scheme)?;

        let (rest, fragment) = match rest.find('#') {
            Some(i) => {
                let frag = &rest[i + 1..];
                if frag.contains('#') {
                    return Err(NavError::malformed(input, "more than one `#`"));
                }
                (&rest[..i], Some(frag.to_string()))
            },
            None => (rest, None),
        };

        let (rest, query) = match rest.find('?') {
            Some(i) => (&rest[..i], Some(rest[i + 1..].to_string())),
            None => (rest, None),
        };

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };

        let (userinfo, host_port) = match authority.rfind('@') {
            Some(i) => (Some(authority[..i].to_string()), &authority[i + 1..]),
            None => (None, authority),
        };

        let (host, port) = split_host_port(input, host_port)?;

        Ok(Self {
            scheme: scheme.to_string(),
            userinfo,
            host: host.to_string(),
            port,
            path: path.to_string(),
            query,
            fragment,
        })
    }

    /// `true` when the host is exactly `localhost` (case-sensitive).
    pub fn is_local(&self) -> bool {
        self.host == LOCAL_HOST
    }

    /// `scheme://host[:port]`.
    pub fn origin(&self) -> String {
        let mut s = format!("{}://{}", self.scheme, self.host);
        if let Some(port) = self.port {
            s.push_str(&format!(":{port}"));
        }
        s
    }

    /// The path with percent-escapes decoded (lossy on invalid UTF-8).
    pub fn decoded_path(&self) -> String {
        percent_encoding::percent_decode_str(&self.path)
            .decode_utf8_lossy()
            .into_owned()
    }

    /// The query string, or `""` when absent.
    pub fn query_str(&self) -> &str {
        self.query.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        if let Some(ref info) = self.userinfo {
            write!(f, "{info}@")?;
        }
        write!(f, "{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        write!(f, "{}", self.path)?;
        if let Some(ref q) = self.query {
            write!(f, "?{q}")?;
        }
        if let Some(ref frag) = self.fragment {
            write!(f, "#{frag}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Address {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Reject whitespace, control characters, characters excluded from URIs,
/// and malformed percent-escapes.
fn validate_characters(input: &str) -> Result<()> {
    if input.is_empty() {
        return Err(NavError::malformed(input, "empty address"));
    }
    let bytes = input.as_bytes();
    for (i, ch) in input.char_indices() {
        match ch {
            c if c.is_whitespace() || c.is_control() => {
                return Err(NavError::malformed(
                    input,
                    format!("illegal character at index {i}"),
                ));
            },
            '<' | '>' | '"' | '{' | '}' | '|' | '\\' | '^' | '`' => {
                return Err(NavError::malformed(
                    input,
                    format!("illegal character `{ch}` at index {i}"),
                ));
            },
            '%' => {
                let valid = bytes.len() > i + 2
                    && bytes[i + 1].is_ascii_hexdigit()
                    && bytes[i + 2].is_ascii_hexdigit();
                if !valid {
                    return Err(NavError::malformed(
                        input,
                        format!("malformed escape pair at index {i}"),
                    ));
                }
            },
            _ => {},
        }
    }
    Ok(())
}

fn validate_scheme(input: &str, scheme: &str) -> Result<()> {
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(NavError::malformed(input, "illegal scheme"))
    }
}

/// Split `host[:port]`, handling bracketed IPv6 literals.
fn split_host_port<'a>(input: &str, host_port: &'a str) -> Result<(&'a str, Option<u16>)> {
    let (host, port_str) = if host_port.starts_with('[') {
        let close = host_port
            .find(']')
            .ok_or_else(|| NavError::malformed(input, "unterminated IPv6 literal"))?;
        let rest = &host_port[close + 1..];
        match rest.strip_prefix(':') {
            Some(port) => (&host_port[..=close], Some(port)),
            None if rest.is_empty() => (&host_port[..=close], None),
            None => return Err(NavError::malformed(input, "junk after IPv6 literal")),
        }
    } else {
        match host_port.rfind(':') {
            Some(i) => (&host_port[..i], Some(&host_port[i + 1..])),
            None => (host_port, None),
        }
    };

    let port = match port_str {
        Some(p) => Some(
            p.parse::<u16>()
                .map_err(|_| NavError::malformed(input, format!("illegal port `{p}`")))?,
        ),
        None => None,
    };
    Ok((host, port))
}
