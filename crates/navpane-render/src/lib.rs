//! Render pipeline for navpane.
//!
//! Raw document bytes are sanitized, parsed into an editable tree, every
//! hyperlink, form action and image reference is rewritten through the
//! local proxy origin, and the serialized result is handed to a
//! [`DisplaySurface`] together with the shared [`ImageCache`].

pub mod image_cache;
pub mod pipeline;
pub mod proxy;
pub mod sanitize;
pub mod surface;

pub use image_cache::{ImageCache, MISSING_IMAGE_KEY};
pub use pipeline::{DocumentSource, RenderContext, fetch_image, render, render_markup};
pub use proxy::{LINK_PREFIX, PROXY_ORIGIN, link_target, proxy_link};
pub use sanitize::sanitize;
pub use surface::DisplaySurface;
