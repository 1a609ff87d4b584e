//! Resource loaders for navpane.
//!
//! A [`ResourceLoader`] turns an absolute [`Address`] into document bytes or
//! a decoded image. The navigation layer holds two of them and picks one by
//! host: [`InternalLoader`] for `localhost`, and an external loader
//! ([`ExternalLoader`] or [`BlockLoader`]) for everything else.

pub mod block;
pub mod bundle;
pub mod external;
pub mod http;
pub mod image;
pub mod internal;
#[cfg(feature = "tls-rustls")]
pub mod tls;

use navpane_types::{Address, Image, Params, Result};

pub use block::BlockLoader;
pub use bundle::{DirBundle, MemoryBundle, ResourceBundle};
pub use external::ExternalLoader;
pub use http::{HttpClient, HttpSettings};
pub use image::decode_image;
pub use internal::InternalLoader;

/// Loader strategy used to obtain documents and images.
///
/// Implementations must not retry; every failure is reported once.
pub trait ResourceLoader: Send + Sync {
    /// Fetch a document.
    fn get(&self, address: &Address) -> Result<Vec<u8>>;

    /// Submit `params` and fetch the resulting document.
    fn post(&self, address: &Address, params: &Params) -> Result<Vec<u8>>;

    /// Fetch and decode an image. Every failure is reported as
    /// [`NavError::ImageUnavailable`](navpane_types::NavError::ImageUnavailable).
    fn read_image(&self, address: &Address) -> Result<Image>;

    /// Short name for log lines.
    fn name(&self) -> &'static str;
}
