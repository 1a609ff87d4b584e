//! Navigation controller for navpane.
//!
//! A [`Navigator`] owns the history of a single display surface, turns
//! activation events into documents fetched through the internal or
//! external loader, and renders them. Failures become error pages.
//!
//! ```no_run
//! use navpane_core::NavigatorBuilder;
//! # struct Surface;
//! # impl navpane_render::DisplaySurface for Surface {
//! #     fn set_title(&mut self, _: &str) {}
//! #     fn present(&mut self, _: &str, _: &navpane_render::ImageCache) {}
//! # }
//! # fn main() -> navpane_types::Result<()> {
//! let mut nav = NavigatorBuilder::new()
//!     .title("Demo")
//!     .home("http://localhost/index.html")
//!     .build(Surface)?;
//! nav.launch();
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod controller;
pub mod document;
pub mod error_page;
pub mod event;
pub mod history;

#[cfg(test)]
pub(crate) mod test_utils;

pub use builder::NavigatorBuilder;
pub use config::{NavConfig, NetworkConfig};
pub use controller::{Navigator, NavigatorParts};
pub use document::{Document, Request};
pub use event::{ActivationEvent, EventKind};
pub use history::History;
pub use navpane_route::{BoundPage, Page, PagePackage, RouteBinding};
