//! Error types for navpane.

use std::error::Error as StdError;
use std::io;

/// Boxed lower-level cause attached to a [`NavError`].
pub type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// Errors produced by the navigation layer.
///
/// None of these are fatal to the process: the navigation controller turns
/// document failures into error pages and image failures into the
/// placeholder image.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("malformed address `{input}`: {reason}")]
    MalformedAddress { input: String, reason: String },

    #[error(
        "no page is bound to path `{path}`. Registered scan targets are: {}",
        format_registered(.registered)
    )]
    NoRouteBound {
        path: String,
        registered: Vec<String>,
    },

    #[error("unable to retrieve data from {address}: {reason}")]
    UnreachableResource {
        address: String,
        reason: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("image unavailable at {address}: {reason}")]
    ImageUnavailable {
        address: String,
        reason: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("scan of `{locator}` failed: {cause}")]
    ScanFailure { locator: String, cause: String },

    #[error("render failure: {0}")]
    RenderFailure(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl NavError {
    /// Shorthand for [`NavError::MalformedAddress`].
    pub fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedAddress {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`NavError::UnreachableResource`] without a cause.
    pub fn unreachable(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnreachableResource {
            address: address.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Shorthand for [`NavError::ImageUnavailable`] without a cause.
    pub fn image_unavailable(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ImageUnavailable {
            address: address.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Attach a lower-level cause to a resource error.
    ///
    /// Variants without a cause slot are returned unchanged.
    pub fn with_source(mut self, cause: impl Into<BoxedCause>) -> Self {
        match &mut self {
            Self::UnreachableResource { source, .. } | Self::ImageUnavailable { source, .. } => {
                *source = Some(cause.into());
            },
            _ => {},
        }
        self
    }

    /// Messages of this error followed by each error in its source chain.
    pub fn chain(&self) -> Vec<String> {
        let mut out = vec![self.to_string()];
        let mut cur = self.source();
        while let Some(err) = cur {
            out.push(err.to_string());
            cur = err.source();
        }
        out
    }
}

fn format_registered(registered: &[String]) -> String {
    if registered.is_empty() {
        return "(none)".to_string();
    }
    registered
        .iter()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, NavError>;
