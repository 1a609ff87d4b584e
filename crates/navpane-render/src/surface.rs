//! Boundary to the rich-text widget that paints rendered documents.

use crate::image_cache::ImageCache;

/// A rich-text display that accepts finished markup.
///
/// Every image reference in the presented markup is a key into `images`.
pub trait DisplaySurface {
    fn set_title(&mut self, title: &str);

    fn present(&mut self, markup: &str, images: &ImageCache);
}
