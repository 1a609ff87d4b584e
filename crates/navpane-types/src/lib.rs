//! Foundation types for navpane.
//!
//! Addresses and link resolution, request parameters with form encoding,
//! decoded images, and the shared error taxonomy.

pub mod address;
pub mod error;
pub mod image;
pub mod params;
pub mod resolve;

pub use address::{Address, LOCAL_HOST};
pub use error::{NavError, Result};
pub use image::Image;
pub use params::Params;
pub use resolve::resolve;
