//! Internal routing for navpane.
//!
//! Pages are registered through scan targets (a programmatic
//! [`PagePackage`] or an on-disk [`ManifestDir`]) and looked up by exact
//! path in a shared [`RouteRegistry`].

pub mod manifest;
pub mod page;
pub mod registry;
pub mod source;

pub use manifest::ManifestDir;
pub use page::{BindingKind, BoundPage, DEFAULT_BINDING, Page, PageFactory, RouteBinding};
pub use registry::RouteRegistry;
pub use source::{HandlerSource, PagePackage};
