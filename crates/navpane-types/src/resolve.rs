//! Link resolution against the address of the current document.
//!
//! The rules are applied in order, each to the possibly already rewritten
//! link:
//!
//! 1. `//host/...` gets the context scheme.
//! 2. `/path` gets the context origin.
//! 3. `#frag` gets the context origin and path.
//! 4. Anything still lacking `://` gets the context origin plus a base
//!    directory. The last path segment is treated as a file (and dropped)
//!    only if it contains a `.`.

use crate::address::Address;
use crate::error::Result;

/// Resolve `link` against `context`, producing an absolute [`Address`].
pub fn resolve(link: &str, context: &Address) -> Result<Address> {
    let mut link = link.to_string();

    if link.starts_with("//") {
        link = format!("{}:{link}", context.scheme);
    }
    if link.starts_with('/') {
        link = format!("{}{link}", context.origin());
    }
    if link.starts_with('#') {
        link = format!("{}{}{link}", context.origin(), context.path);
    }
    if !link.contains("://") {
        link = format!("{}{link}", relative_base(context));
    }

    log::debug!("resolved link against {context} -> {link}");
    Address::parse(&link)
}

/// Origin plus the directory a bare-relative link is resolved into,
/// always ending in `/`.
fn relative_base(context: &Address) -> String {
    let mut base = context.origin();
    let path = context.path.as_str();
    match path.rfind('/') {
        Some(i) if path[i..].contains('.') => base.push_str(&path[..i]),
        _ => base.push_str(path),
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base
}
